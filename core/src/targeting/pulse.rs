use crate::targeting::target::{PlacementTarget, PositionKind, PulseSite};
use crate::vision::{AnalysisResult, Detection};
use serde::Serialize;

const INFANT_KEYWORDS: [&str; 4] = ["infant", "baby", "child", "toddler"];
const CONSCIOUS_KEYWORDS: [&str; 5] = ["conscious", "awake", "alert", "sitting", "responsive"];

/// Target for the selected site together with the site the scene suggests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PulseResolution {
    pub selected: PulseSite,
    pub target: Option<PlacementTarget>,
    pub recommended: PulseSite,
}

fn find_site(result: &AnalysisResult, site: PulseSite) -> Option<&Detection> {
    let keywords = site.keywords();
    let mut matches = result
        .detections
        .iter()
        .filter(|detection| detection.label_contains_any(keywords));
    let first = matches.clone().next();
    matches
        .find(|detection| site.accepts_y(detection.y))
        .or(first)
}

/// Pulse-check target for the site the user selected. Detections inside the
/// site's vertical band win over keyword-only matches.
pub fn resolve_pulse_target(result: &AnalysisResult, site: PulseSite) -> Option<PlacementTarget> {
    find_site(result, site).map(|detection| {
        PlacementTarget::new(
            detection.x,
            detection.y,
            detection.confidence,
            Some(PositionKind::Pulse(site)),
        )
    })
}

/// Site suggested by the scene. Informational only; never overrides the
/// user's selection.
pub fn determine_recommended_position(result: &AnalysisResult, preferred: PulseSite) -> PulseSite {
    if result.mentions_any(preferred.keywords()) {
        preferred
    } else if result.mentions_any(&INFANT_KEYWORDS) {
        PulseSite::Brachial
    } else if result.mentions_any(&CONSCIOUS_KEYWORDS) {
        PulseSite::Radial
    } else {
        PulseSite::Carotid
    }
}

pub fn resolve_pulse(result: &AnalysisResult, selected: PulseSite) -> PulseResolution {
    PulseResolution {
        selected,
        target: resolve_pulse_target(result, selected),
        recommended: determine_recommended_position(result, selected),
    }
}
