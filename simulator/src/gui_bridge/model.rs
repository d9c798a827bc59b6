use aidcore::dispatcher::Urgency;
use aidcore::guidance::{AccuracyClassification, Direction, OverlayColor};
use aidcore::prelude::ProcedureMode;
use aidcore::targeting::{PlacementTarget, PulseSite};
use aidcore::vision::Detection;
use serde::{Deserialize, Serialize};

/// What the overlay screen renders for the latest frame.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OverlayModel {
    pub mode: Option<ProcedureMode>,
    pub round: usize,
    pub detections: Vec<Detection>,
    pub target: Option<PlacementTarget>,
    pub classification: Option<AccuracyClassification>,
    pub color: Option<OverlayColor>,
    pub direction: Option<Direction>,
    pub instruction: String,
    pub guidance: String,
    pub urgency: Option<Urgency>,
    pub pulse_site: Option<PulseSite>,
    pub recommended_site: Option<PulseSite>,
    pub beat_count: u64,
    pub countdown_remaining: Option<u32>,
}
