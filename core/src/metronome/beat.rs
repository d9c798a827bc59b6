use crate::feedback::{FeedbackCommand, FeedbackDevice, ImpactStyle};
use crate::telemetry::LogManager;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

pub const MIN_BPM: u32 = 100;
pub const MAX_BPM: u32 = 120;
pub const DEFAULT_BPM: u32 = 110;
pub const BEAT_CUE: &str = "push";

pub fn clamp_bpm(bpm: u32) -> u32 {
    bpm.clamp(MIN_BPM, MAX_BPM)
}

/// 60000 / bpm milliseconds, kept at microsecond precision.
pub fn beat_period(bpm: u32) -> Duration {
    Duration::from_micros(60_000_000 / u64::from(bpm.max(1)))
}

struct MetronomeState {
    bpm: u32,
    timer: Option<JoinHandle<()>>,
}

/// Compression-rate metronome. Each beat fires a heavy impact and an audio
/// tick; every even beat also speaks the push cue.
///
/// `start` and `set_bpm` spawn onto the current Tokio runtime.
pub struct Metronome {
    device: Arc<dyn FeedbackDevice>,
    state: Mutex<MetronomeState>,
    beats: Arc<AtomicU64>,
    timers_cancelled: AtomicU64,
    logger: LogManager,
}

impl Metronome {
    pub fn new(device: Arc<dyn FeedbackDevice>) -> Self {
        Self {
            device,
            state: Mutex::new(MetronomeState {
                bpm: DEFAULT_BPM,
                timer: None,
            }),
            beats: Arc::new(AtomicU64::new(0)),
            timers_cancelled: AtomicU64::new(0),
            logger: LogManager::new("metronome"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetronomeState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn bpm(&self) -> u32 {
        self.lock().bpm
    }

    pub fn is_running(&self) -> bool {
        self.lock().timer.is_some()
    }

    pub fn beat_count(&self) -> u64 {
        self.beats.load(Ordering::SeqCst)
    }

    /// Number of timer handles cancelled over the metronome's lifetime.
    pub fn timers_cancelled(&self) -> u64 {
        self.timers_cancelled.load(Ordering::SeqCst)
    }

    /// Starts beating at `bpm` (clamped), firing once immediately. A running
    /// timer is replaced.
    pub fn start(&self, bpm: u32) {
        let bpm = clamp_bpm(bpm);
        let mut state = self.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
            self.timers_cancelled.fetch_add(1, Ordering::SeqCst);
        }
        state.bpm = bpm;
        self.beats.store(0, Ordering::SeqCst);

        let period = beat_period(bpm);
        let beats = Arc::clone(&self.beats);
        let device = Arc::clone(&self.device);
        state.timer = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let beat = beats.fetch_add(1, Ordering::SeqCst) + 1;
                device.dispatch(FeedbackCommand::Impact(ImpactStyle::Heavy));
                device.dispatch(FeedbackCommand::Tick);
                if beat % 2 == 0 {
                    device.dispatch(FeedbackCommand::Speak {
                        text: BEAT_CUE.to_string(),
                    });
                }
            }
        }));
        self.logger
            .record(&format!("started at {} bpm ({:?} period)", bpm, period));
    }

    /// Cancels the timer, resets the beat count and silences speech.
    /// Returns false when already stopped.
    pub fn stop(&self) -> bool {
        let timer = self.lock().timer.take();
        let Some(timer) = timer else {
            return false;
        };
        timer.abort();
        self.timers_cancelled.fetch_add(1, Ordering::SeqCst);
        self.beats.store(0, Ordering::SeqCst);
        self.device.dispatch(FeedbackCommand::StopSpeech);
        self.logger.record("stopped");
        true
    }

    /// Applies a new rate. A running metronome is stopped and restarted so the
    /// new period counts from now. Returns true when a restart happened.
    pub fn set_bpm(&self, bpm: u32) -> bool {
        let bpm = clamp_bpm(bpm);
        if self.is_running() {
            self.stop();
            self.start(bpm);
            true
        } else {
            self.lock().bpm = bpm;
            false
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        if let Some(timer) = self.lock().timer.take() {
            timer.abort();
        }
    }
}
