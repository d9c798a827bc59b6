use serde::{Deserialize, Serialize};

/// One candidate body part or location reported by the vision model.
///
/// Coordinates and extents are normalized to the viewport (`0.0..=1.0`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub label: String,
    pub instruction: String,
}

impl Detection {
    pub fn new(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        confidence: f32,
        label: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            x: unit(x),
            y: unit(y),
            width: unit(width),
            height: unit(height),
            confidence: unit(confidence),
            label: label.into(),
            instruction: instruction.into(),
        }
    }

    /// Case-insensitive substring match against the label.
    pub fn label_contains(&self, keyword: &str) -> bool {
        self.label.to_lowercase().contains(&keyword.to_lowercase())
    }

    /// Keywords are expected in lowercase.
    pub fn label_contains_any(&self, keywords: &[&str]) -> bool {
        let label = self.label.to_lowercase();
        keywords.iter().any(|keyword| label.contains(keyword))
    }
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Where an analysis came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    #[default]
    Model,
    Fallback,
}

/// Output of one capture analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    /// In model output order, which is not a priority order.
    pub detections: Vec<Detection>,
    pub overall_instruction: String,
    pub raw_text_analysis: Option<String>,
    #[serde(default)]
    pub source: AnalysisSource,
}

impl AnalysisResult {
    pub fn new(detections: Vec<Detection>, overall_instruction: impl Into<String>) -> Self {
        Self {
            detections,
            overall_instruction: overall_instruction.into(),
            raw_text_analysis: None,
            source: AnalysisSource::Model,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == AnalysisSource::Fallback
    }

    /// True when any detection label contains any of the keywords.
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        self.detections
            .iter()
            .any(|detection| detection.label_contains_any(keywords))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_clamps_to_unit_range() {
        let detection = Detection::new(1.4, -0.2, 0.5, f32::NAN, 2.0, "Chest", "");
        assert_eq!(detection.x, 1.0);
        assert_eq!(detection.y, 0.0);
        assert_eq!(detection.height, 0.0);
        assert_eq!(detection.confidence, 1.0);
    }

    #[test]
    fn label_matching_ignores_case() {
        let detection = Detection::new(0.5, 0.5, 0.1, 0.1, 0.9, "Lower STERNUM", "");
        assert!(detection.label_contains("sternum"));
        assert!(detection.label_contains_any(&["neck", "sternum"]));
        assert!(!detection.label_contains_any(&["wrist"]));
    }
}
