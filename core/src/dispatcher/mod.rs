pub mod coordinator;
pub mod session;
pub mod synthesis;

pub use coordinator::{Dispatcher, ProcessOutcome};
pub use session::{
    Corrections, DispatcherResponse, EmergencySession, Guidance, HapticFeedback, HapticKind,
    NextAction, Urgency, VoiceGuidance, VoiceTone,
};
pub use synthesis::{mock_response, GuidanceSynthesizer};
