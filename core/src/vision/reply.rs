use crate::prelude::{VisionError, VisionResult};
use crate::vision::detection::{AnalysisResult, Detection};
use serde::Deserialize;

/// Finish reasons that mean the model blocked or cut off its answer.
const REFUSAL_REASONS: [&str; 6] = [
    "SAFETY",
    "MAX_TOKENS",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

/// Text reply from the remote model plus its completion metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub finish_reason: Option<String>,
    pub block_reason: Option<String>,
}

impl ModelReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: Some("STOP".into()),
            block_reason: None,
        }
    }

    pub fn check_complete(&self) -> VisionResult<()> {
        if let Some(reason) = &self.block_reason {
            return Err(VisionError::ModelRefusal(format!("prompt blocked: {reason}")));
        }
        match self.finish_reason.as_deref() {
            Some(reason) if REFUSAL_REASONS.contains(&reason.to_ascii_uppercase().as_str()) => {
                Err(VisionError::ModelRefusal(reason.to_string()))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    detections: Vec<RawDetection>,
    #[serde(default, alias = "overallInstruction")]
    overall_instruction: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    x: Option<f32>,
    y: Option<f32>,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    label: String,
    #[serde(default)]
    instruction: String,
}

/// Span from the first `{` to the last `}` of the reply.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_analysis(reply: &ModelReply) -> VisionResult<AnalysisResult> {
    reply.check_complete()?;

    let json = extract_json_object(&reply.text)
        .ok_or_else(|| VisionError::Parse("no JSON object in reply".into()))?;
    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|err| VisionError::Parse(err.to_string()))?;

    let detections: Vec<Detection> = raw
        .detections
        .into_iter()
        .filter_map(|raw| {
            let (x, y) = (raw.x?, raw.y?);
            Some(Detection::new(
                x,
                y,
                raw.width,
                raw.height,
                raw.confidence,
                raw.label,
                raw.instruction,
            ))
        })
        .collect();

    let overall_instruction = raw
        .overall_instruction
        .filter(|text| !text.trim().is_empty())
        .or_else(|| {
            detections
                .iter()
                .map(|d| d.instruction.clone())
                .find(|text| !text.trim().is_empty())
        })
        .unwrap_or_default();

    let mut result = AnalysisResult::new(detections, overall_instruction);
    result.raw_text_analysis = Some(reply.text.clone());
    Ok(result)
}
