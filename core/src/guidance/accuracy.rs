use crate::prelude::{ImageSize, PixelPoint, ProcedureMode};
use crate::targeting::PlacementTarget;
use serde::{Deserialize, Serialize};

/// Tri-state verdict comparing the live position against the target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyClassification {
    Correct,
    Adjust,
    Incorrect,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayColor {
    Green,
    Yellow,
    Red,
}

impl AccuracyClassification {
    pub fn color(self) -> OverlayColor {
        match self {
            AccuracyClassification::Correct => OverlayColor::Green,
            AccuracyClassification::Adjust => OverlayColor::Yellow,
            AccuracyClassification::Incorrect => OverlayColor::Red,
        }
    }

    /// Lower is better.
    pub fn rank(self) -> u8 {
        match self {
            AccuracyClassification::Correct => 0,
            AccuracyClassification::Adjust => 1,
            AccuracyClassification::Incorrect => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccuracyClassification::Correct => "correct",
            AccuracyClassification::Adjust => "adjust",
            AccuracyClassification::Incorrect => "incorrect",
        }
    }
}

/// Precision class of the placement being checked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlacementCheck {
    Hand,
    Finger,
}

impl PlacementCheck {
    pub fn for_mode(mode: ProcedureMode) -> Self {
        match mode {
            ProcedureMode::Pulse => PlacementCheck::Finger,
            _ => PlacementCheck::Hand,
        }
    }

    /// Multiple of the threshold that still counts as `Adjust`.
    pub fn adjust_multiplier(self) -> f32 {
        match self {
            PlacementCheck::Hand => 2.0,
            PlacementCheck::Finger => 1.5,
        }
    }
}

/// Simulated hand or finger positions in viewport pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LivePositions {
    pub primary: Option<PixelPoint>,
    pub secondary: Option<PixelPoint>,
}

impl LivePositions {
    pub fn single(point: PixelPoint) -> Self {
        Self {
            primary: Some(point),
            secondary: None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PixelPoint> {
        self.primary.iter().chain(self.secondary.iter())
    }
}

pub fn target_pixel(target: &PlacementTarget, image: ImageSize) -> PixelPoint {
    PixelPoint::new(target.x * image.width, target.y * image.height)
}

/// Live position closest to the target and its pixel distance.
pub fn nearest_position(
    target: &PlacementTarget,
    live: &LivePositions,
    image: ImageSize,
) -> Option<(PixelPoint, f32)> {
    let anchor = target_pixel(target, image);
    live.iter()
        .map(|point| (*point, point.distance_to(&anchor)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

pub fn classify(
    target: &PlacementTarget,
    live: &LivePositions,
    image: ImageSize,
    threshold_px: f32,
    check: PlacementCheck,
) -> AccuracyClassification {
    let Some((_, distance)) = nearest_position(target, live, image) else {
        return AccuracyClassification::Incorrect;
    };

    if distance <= threshold_px {
        AccuracyClassification::Correct
    } else if distance <= threshold_px * check.adjust_multiplier() {
        AccuracyClassification::Adjust
    } else {
        AccuracyClassification::Incorrect
    }
}

/// Edge detector for the "placement reached" haptic.
#[derive(Debug, Default)]
pub struct AccuracyTracker {
    previous: Option<AccuracyClassification>,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the classification; true only on a transition into `Correct`.
    pub fn observe(&mut self, classification: AccuracyClassification) -> bool {
        let entered = classification == AccuracyClassification::Correct
            && self.previous != Some(AccuracyClassification::Correct);
        self.previous = Some(classification);
        entered
    }

    pub fn previous(&self) -> Option<AccuracyClassification> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}
