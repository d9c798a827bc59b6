pub mod beat;
pub mod countdown;

pub use beat::{beat_period, clamp_bpm, Metronome, DEFAULT_BPM, MAX_BPM, MIN_BPM};
pub use countdown::{Countdown, CountdownState, PULSE_CHECK_SECS};
