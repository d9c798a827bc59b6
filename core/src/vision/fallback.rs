use crate::prelude::ProcedureMode;
use crate::vision::detection::{AnalysisResult, AnalysisSource, Detection};

pub const CPR_FALLBACK_INSTRUCTION: &str =
    "Place the heel of your hand on the center of the chest, between the nipples. Push hard and fast.";
pub const PULSE_FALLBACK_INSTRUCTION: &str =
    "Place two fingers on the side of the neck beside the windpipe and feel for a pulse for 10 seconds.";
pub const AIRWAY_FALLBACK_INSTRUCTION: &str =
    "Tilt the head back gently and lift the chin to open the airway.";
pub const SEIZURE_FALLBACK_INSTRUCTION: &str =
    "Clear the area, cushion the head and do not restrain the person. Time the seizure.";

/// Canned analysis used whenever the remote model cannot be reached or understood.
pub fn fallback_analysis(mode: ProcedureMode) -> AnalysisResult {
    let (detections, instruction) = match mode {
        ProcedureMode::Cpr => (
            vec![Detection::new(
                0.5,
                0.45,
                0.2,
                0.15,
                0.7,
                "Hand Placement",
                "Center of chest, lower half of the breastbone",
            )],
            CPR_FALLBACK_INSTRUCTION,
        ),
        ProcedureMode::Pulse => (
            vec![Detection::new(
                0.55,
                0.3,
                0.1,
                0.1,
                0.6,
                "Carotid Pulse",
                "Two fingers beside the windpipe",
            )],
            PULSE_FALLBACK_INSTRUCTION,
        ),
        ProcedureMode::Airway => (
            vec![
                Detection::new(0.5, 0.25, 0.2, 0.2, 0.6, "Head", "Hand on the forehead"),
                Detection::new(0.5, 0.38, 0.1, 0.08, 0.6, "Chin", "Fingertips under the chin"),
            ],
            AIRWAY_FALLBACK_INSTRUCTION,
        ),
        ProcedureMode::Seizure => (
            vec![Detection::new(
                0.5,
                0.5,
                0.8,
                0.8,
                0.5,
                "Safe Zone",
                "Move hard or sharp objects away",
            )],
            SEIZURE_FALLBACK_INSTRUCTION,
        ),
    };

    AnalysisResult {
        detections,
        overall_instruction: instruction.to_string(),
        raw_text_analysis: None,
        source: AnalysisSource::Fallback,
    }
}
