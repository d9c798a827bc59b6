use crate::targeting::target::{PlacementTarget, PositionKind};
use crate::vision::AnalysisResult;
use serde::{Deserialize, Serialize};

const CHEST_KEYWORDS: [&str; 3] = ["chest", "sternum", "hand"];
const LYING_KEYWORDS: [&str; 4] = ["lying", "supine", "on back", "floor"];
const UPRIGHT_KEYWORDS: [&str; 4] = ["sitting", "seated", "standing", "upright"];
const BODY_KEYWORDS: [&str; 5] = ["body", "chest", "person", "torso", "patient"];

/// Coarse orientation guess from detection labels. Not a geometric check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoseAssessment {
    LyingDown,
    NotLyingDown,
    Unknown,
}

pub fn assess_pose(result: &AnalysisResult) -> PoseAssessment {
    if result.mentions_any(&LYING_KEYWORDS) {
        PoseAssessment::LyingDown
    } else if result.mentions_any(&UPRIGHT_KEYWORDS) {
        PoseAssessment::NotLyingDown
    } else if result.mentions_any(&BODY_KEYWORDS) {
        PoseAssessment::LyingDown
    } else {
        PoseAssessment::Unknown
    }
}

/// Chest-compression target: the first chest/sternum/hand detection verbatim,
/// otherwise the centroid of every detection.
pub fn resolve_chest_target(result: &AnalysisResult) -> Option<PlacementTarget> {
    if result.detections.is_empty() {
        return None;
    }
    if assess_pose(result) == PoseAssessment::NotLyingDown {
        return None;
    }

    if let Some(detection) = result
        .detections
        .iter()
        .find(|detection| detection.label_contains_any(&CHEST_KEYWORDS))
    {
        return Some(PlacementTarget::new(
            detection.x,
            detection.y,
            detection.confidence,
            Some(PositionKind::Chest),
        ));
    }

    let count = result.detections.len() as f32;
    let (sum_x, sum_y, sum_conf) = result
        .detections
        .iter()
        .fold((0.0, 0.0, 0.0), |(x, y, c), d| (x + d.x, y + d.y, c + d.confidence));
    Some(PlacementTarget::new(
        sum_x / count,
        sum_y / count,
        sum_conf / count,
        Some(PositionKind::Chest),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::Detection;

    fn detection(x: f32, y: f32, label: &str) -> Detection {
        Detection::new(x, y, 0.1, 0.1, 0.8, label, "")
    }

    #[test]
    fn matching_label_is_used_verbatim() {
        for label in ["Chest", "lower sternum", "Hand Placement"] {
            let result = AnalysisResult::new(
                vec![
                    detection(0.1, 0.9, "Head"),
                    detection(0.42, 0.58, label),
                    detection(0.9, 0.1, "Chest again"),
                ],
                "",
            );
            let target = resolve_chest_target(&result).unwrap();
            assert_eq!((target.x, target.y), (0.42, 0.58), "{label}");
            assert_eq!(target.kind, Some(PositionKind::Chest));
        }
    }

    #[test]
    fn empty_analysis_has_no_target() {
        assert_eq!(resolve_chest_target(&AnalysisResult::new(Vec::new(), "")), None);
    }

    #[test]
    fn unmatched_labels_resolve_to_centroid() {
        let result = AnalysisResult::new(
            vec![
                detection(0.2, 0.4, "Shoulder"),
                detection(0.6, 0.6, "Arm"),
                detection(0.4, 0.8, "Hip"),
            ],
            "",
        );
        let target = resolve_chest_target(&result).unwrap();
        assert!((target.x - 0.4).abs() < 1e-6);
        assert!((target.y - 0.6).abs() < 1e-6);
    }

    #[test]
    fn upright_person_has_no_chest_target() {
        let result = AnalysisResult::new(
            vec![detection(0.5, 0.5, "Person sitting"), detection(0.5, 0.4, "Chest")],
            "",
        );
        assert_eq!(assess_pose(&result), PoseAssessment::NotLyingDown);
        assert_eq!(resolve_chest_target(&result), None);
    }

    #[test]
    fn pose_heuristic_prefers_explicit_lying_cue() {
        let lying = AnalysisResult::new(vec![detection(0.5, 0.5, "Person lying supine")], "");
        assert_eq!(assess_pose(&lying), PoseAssessment::LyingDown);
        let body = AnalysisResult::new(vec![detection(0.5, 0.5, "Torso")], "");
        assert_eq!(assess_pose(&body), PoseAssessment::LyingDown);
        let unknown = AnalysisResult::new(vec![detection(0.5, 0.5, "Shoe")], "");
        assert_eq!(assess_pose(&unknown), PoseAssessment::Unknown);
    }
}
