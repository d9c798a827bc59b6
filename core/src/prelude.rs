use serde::{Deserialize, Serialize};
use std::fmt;

/// Procedure the user is being guided through. Selects prompts, thresholds and
/// guidance tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureMode {
    Airway,
    Cpr,
    Pulse,
    Seizure,
}

impl ProcedureMode {
    pub const ALL: [ProcedureMode; 4] = [
        ProcedureMode::Airway,
        ProcedureMode::Cpr,
        ProcedureMode::Pulse,
        ProcedureMode::Seizure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcedureMode::Airway => "airway",
            ProcedureMode::Cpr => "cpr",
            ProcedureMode::Pulse => "pulse",
            ProcedureMode::Seizure => "seizure",
        }
    }
}

impl fmt::Display for ProcedureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProcedureMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "airway" => Ok(ProcedureMode::Airway),
            "cpr" => Ok(ProcedureMode::Cpr),
            "pulse" => Ok(ProcedureMode::Pulse),
            "seizure" => Ok(ProcedureMode::Seizure),
            other => Err(format!("unknown procedure mode '{other}'")),
        }
    }
}

/// Pixel dimensions of the camera viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImageSize {
    pub width: f32,
    pub height: f32,
}

impl ImageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// A point in viewport pixel space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PixelPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Failures reaching or interpreting the remote vision model.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum VisionError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("no API key configured")]
    MissingApiKey,
    #[error("model refused or truncated the reply: {0}")]
    ModelRefusal(String),
    #[error("unparseable model reply: {0}")]
    Parse(String),
}

/// Misuse of, or races against, the emergency session state machine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("an emergency session is already active")]
    AlreadyActive,
    #[error("an image is already being processed for this session")]
    AlreadyProcessing,
    #[error("no active emergency session")]
    NoActiveSession,
    #[error("the session ended while the image was being processed")]
    SessionEnded,
}

/// Text-to-speech, speech-to-text and playback failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("transcription failed: {0}")]
    Transcription(String),
    #[error("audio playback failed: {0}")]
    Playback(String),
    #[error("playback cancelled")]
    Cancelled,
}

pub type VisionResult<T> = Result<T, VisionError>;
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;
pub type AudioResult<T> = Result<T, AudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedure_mode_parses_case_insensitively() {
        assert_eq!("CPR".parse::<ProcedureMode>(), Ok(ProcedureMode::Cpr));
        assert_eq!(" pulse ".parse::<ProcedureMode>(), Ok(ProcedureMode::Pulse));
        assert!("bandage".parse::<ProcedureMode>().is_err());
    }

    #[test]
    fn pixel_distance_is_euclidean() {
        let a = PixelPoint::new(0.0, 0.0);
        let b = PixelPoint::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
    }
}
