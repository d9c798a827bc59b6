use crate::prelude::ProcedureMode;
use serde::{Deserialize, Serialize};

/// Which class of remote model a procedure needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Lightweight,
    Accurate,
}

impl ModelTier {
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelTier::Lightweight => "gemini-1.5-flash",
            ModelTier::Accurate => "gemini-1.5-pro",
        }
    }
}

/// Placement-critical procedures get the higher-accuracy tier.
pub fn select_model(mode: ProcedureMode) -> ModelTier {
    match mode {
        ProcedureMode::Cpr | ProcedureMode::Pulse => ModelTier::Accurate,
        ProcedureMode::Airway | ProcedureMode::Seizure => ModelTier::Lightweight,
    }
}

const REPLY_FORMAT: &str = "Respond with a single JSON object and nothing else: \
{\"detections\":[{\"x\":0.0,\"y\":0.0,\"width\":0.0,\"height\":0.0,\"confidence\":0.0,\
\"label\":\"\",\"instruction\":\"\"}],\"overallInstruction\":\"\"}. \
All coordinates are normalized to 0..1 with the origin at the top-left; x and y are the \
center of the region.";

pub fn prompt_for(mode: ProcedureMode) -> String {
    let task = match mode {
        ProcedureMode::Cpr => {
            "You are guiding a bystander performing CPR. Locate the person lying on their back \
             and the center of the chest on the lower half of the sternum where the heel of \
             the hand belongs. Label that region 'Chest' and also report the person's body."
        }
        ProcedureMode::Pulse => {
            "You are guiding a bystander checking for a pulse. Locate the carotid pulse point \
             on the side of the neck, the brachial point on the inner upper arm and the radial \
             point on the thumb side of the wrist. Note if the person is an infant or child, \
             or appears conscious or sitting."
        }
        ProcedureMode::Airway => {
            "You are guiding a bystander opening an airway. Locate the head, chin and forehead \
             of the person and describe the head-tilt chin-lift positioning."
        }
        ProcedureMode::Seizure => {
            "You are guiding a bystander helping someone having a seizure. Identify hazards \
             near the person, the head that needs cushioning and the side they should be \
             rolled onto once movements stop."
        }
    };
    format!("{task} {REPLY_FORMAT}")
}
