pub mod audio;
pub mod device;
pub mod speech;

pub use audio::{chunk_speech, AudioEngine, AudioPlayer};
pub use device::{
    FeedbackCommand, FeedbackDevice, ImpactStyle, LoggingDevice, NotificationKind,
    RecordingDevice,
};
pub use speech::{normalize_transcript, AudioClip, HttpSpeechService, SpeechService};
