use crate::config::ServiceConfig;
use crate::prelude::{VisionError, VisionResult};
use crate::vision::prompts::ModelTier;
use crate::vision::reply::ModelReply;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;

/// One prompt-plus-image request to the remote model.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub model: ModelTier,
    pub prompt: String,
    pub image_jpeg: Vec<u8>,
}

/// Sends a vision request and returns the model's raw reply. Implementations
/// make exactly one outbound call and never retry.
pub trait VisionTransport: Send + Sync {
    fn generate(
        &self,
        request: VisionRequest,
    ) -> impl Future<Output = VisionResult<ModelReply>> + Send;
}

/// `generateContent`-style HTTP transport.
pub struct HttpVisionTransport {
    client: reqwest::Client,
    config: ServiceConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl HttpVisionTransport {
    pub fn new(config: ServiceConfig) -> VisionResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| VisionError::Network(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, model: ModelTier) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.vision_base_url.trim_end_matches('/'),
            model.model_id()
        )
    }
}

pub fn request_body(request: &VisionRequest) -> serde_json::Value {
    json!({
        "contents": [{
            "parts": [
                { "text": request.prompt },
                {
                    "inline_data": {
                        "mime_type": "image/jpeg",
                        "data": BASE64.encode(&request.image_jpeg),
                    }
                }
            ]
        }],
        "generationConfig": {
            "temperature": 0.2,
            "maxOutputTokens": 1024,
        }
    })
}

fn into_reply(response: GenerateResponse) -> ModelReply {
    let block_reason = response.prompt_feedback.and_then(|fb| fb.block_reason);
    let candidate = response.candidates.into_iter().next();
    let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());
    let text = candidate
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    ModelReply {
        text,
        finish_reason,
        block_reason,
    }
}

impl VisionTransport for HttpVisionTransport {
    async fn generate(&self, request: VisionRequest) -> VisionResult<ModelReply> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(VisionError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint(request.model))
            .query(&[("key", api_key)])
            .json(&request_body(&request))
            .send()
            .await
            .map_err(|err| VisionError::Network(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(VisionError::Network(format!("{}: {}", status, text)));
        }

        let body = response
            .json::<GenerateResponse>()
            .await
            .map_err(|err| VisionError::Parse(err.to_string()))?;
        Ok(into_reply(body))
    }
}
