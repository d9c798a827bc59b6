use crate::prelude::ProcedureMode;
use crate::vision::AnalysisResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guidance {
    pub primary: String,
    pub secondary: Option<String>,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Corrections {
    pub position: Option<String>,
    pub technique: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NextAction {
    pub action: String,
    pub timing_secs: u32,
    /// 1 is most pressing, 5 least.
    pub priority: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoiceTone {
    Calm,
    Instructive,
    Urgent,
    Encouraging,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceGuidance {
    pub speak: String,
    pub tone: VoiceTone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HapticKind {
    Impact,
    Notification,
    Pattern,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HapticFeedback {
    pub kind: HapticKind,
    /// Alternating on/off durations in milliseconds.
    pub pattern_ms: Vec<u64>,
}

/// Guidance composed for one capture round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatcherResponse {
    pub guidance: Guidance,
    pub corrections: Option<Corrections>,
    pub next_action: NextAction,
    pub voice_guidance: VoiceGuidance,
    pub haptic_feedback: HapticFeedback,
}

/// The single live emergency interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmergencySession {
    pub session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub mode: ProcedureMode,
    pub is_active: bool,
    pub last_analysis: Option<AnalysisResult>,
    pub last_guidance: Option<DispatcherResponse>,
    pub user_feedback: Option<String>,
}

impl EmergencySession {
    pub fn new(mode: ProcedureMode) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            start_time: Utc::now(),
            mode,
            is_active: true,
            last_analysis: None,
            last_guidance: None,
            user_feedback: None,
        }
    }

    pub fn elapsed_secs(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}
