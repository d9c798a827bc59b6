use crate::guidance::accuracy::{
    classify, nearest_position, target_pixel, AccuracyClassification, LivePositions,
    OverlayColor, PlacementCheck,
};
use crate::prelude::{ImageSize, ProcedureMode};
use crate::targeting::PlacementTarget;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Everything the overlay needs for one frame.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacementFeedback {
    pub classification: AccuracyClassification,
    pub color: OverlayColor,
    pub instruction: &'static str,
    pub status_code: String,
    pub direction: Option<Direction>,
}

pub fn instruction_for(mode: ProcedureMode, classification: AccuracyClassification) -> &'static str {
    use AccuracyClassification::*;
    match (mode, classification) {
        (ProcedureMode::Cpr, Correct) => "Perfect position. Keep your arms straight and push.",
        (ProcedureMode::Cpr, Adjust) => "Almost there. Slide your hands toward the center of the chest.",
        (ProcedureMode::Cpr, Incorrect) => "Place the heel of your hand on the center of the chest.",
        (ProcedureMode::Pulse, Correct) => "Good placement. Hold still and feel for 10 seconds.",
        (ProcedureMode::Pulse, Adjust) => "Close. Move your fingers slightly toward the marker.",
        (ProcedureMode::Pulse, Incorrect) => "Move two fingers onto the highlighted pulse point.",
        (ProcedureMode::Airway, Correct) => "Good. Keep the head tilted and the chin lifted.",
        (ProcedureMode::Airway, Adjust) => "Adjust your hand toward the forehead marker.",
        (ProcedureMode::Airway, Incorrect) => "Place one hand on the forehead and two fingers under the chin.",
        (ProcedureMode::Seizure, Correct) => "Good. Keep cushioning the head without holding them down.",
        (ProcedureMode::Seizure, Adjust) => "Move a little closer to support the head.",
        (ProcedureMode::Seizure, Incorrect) => "Stay beside the person and protect the head from hitting anything.",
    }
}

pub fn status_code(mode: ProcedureMode, classification: AccuracyClassification) -> String {
    format!("{}.{}", mode.as_str(), classification.as_str())
}

/// Dominant axis of the offset from the nearest live position to the target.
/// None once the position is within the threshold.
pub fn direction_hint(
    target: &PlacementTarget,
    live: &LivePositions,
    image: ImageSize,
    threshold_px: f32,
) -> Option<Direction> {
    let (point, distance) = nearest_position(target, live, image)?;
    if distance <= threshold_px {
        return None;
    }
    let anchor = target_pixel(target, image);
    let (dx, dy) = (anchor.x - point.x, anchor.y - point.y);
    let direction = if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    };
    Some(direction)
}

pub fn evaluate_placement(
    mode: ProcedureMode,
    target: &PlacementTarget,
    live: &LivePositions,
    image: ImageSize,
    threshold_px: f32,
) -> PlacementFeedback {
    let classification = classify(
        target,
        live,
        image,
        threshold_px,
        PlacementCheck::for_mode(mode),
    );
    PlacementFeedback {
        classification,
        color: classification.color(),
        instruction: instruction_for(mode, classification),
        status_code: status_code(mode, classification),
        direction: direction_hint(target, live, image, threshold_px),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::PixelPoint;

    const IMAGE: ImageSize = ImageSize {
        width: 400.0,
        height: 800.0,
    };

    #[test]
    fn every_mode_has_distinct_text_per_verdict() {
        for mode in ProcedureMode::ALL {
            let texts = [
                instruction_for(mode, AccuracyClassification::Correct),
                instruction_for(mode, AccuracyClassification::Adjust),
                instruction_for(mode, AccuracyClassification::Incorrect),
            ];
            assert!(texts.iter().all(|text| !text.is_empty()));
            assert_ne!(texts[0], texts[1]);
            assert_ne!(texts[1], texts[2]);
        }
    }

    #[test]
    fn direction_points_from_hand_to_target() {
        let target = PlacementTarget::new(0.5, 0.5, 1.0, None);
        let left_of_target = LivePositions::single(PixelPoint::new(100.0, 400.0));
        assert_eq!(
            direction_hint(&target, &left_of_target, IMAGE, 20.0),
            Some(Direction::Right)
        );
        let below = LivePositions::single(PixelPoint::new(200.0, 600.0));
        assert_eq!(direction_hint(&target, &below, IMAGE, 20.0), Some(Direction::Up));
        let on_target = LivePositions::single(PixelPoint::new(205.0, 400.0));
        assert_eq!(direction_hint(&target, &on_target, IMAGE, 20.0), None);
    }

    #[test]
    fn evaluation_uses_finger_precision_for_pulse() {
        let target = PlacementTarget::new(0.5, 0.5, 1.0, None);
        let live = LivePositions::single(PixelPoint::new(240.0, 400.0));
        let cpr = evaluate_placement(ProcedureMode::Cpr, &target, &live, IMAGE, 25.0);
        let pulse = evaluate_placement(ProcedureMode::Pulse, &target, &live, IMAGE, 25.0);
        assert_eq!(cpr.classification, AccuracyClassification::Adjust);
        assert_eq!(cpr.status_code, "cpr.adjust");
        assert_eq!(pulse.classification, AccuracyClassification::Incorrect);
        assert_eq!(pulse.color, OverlayColor::Red);
        assert_eq!(pulse.direction, Some(Direction::Left));
    }
}
