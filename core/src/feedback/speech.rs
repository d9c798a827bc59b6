use crate::config::ServiceConfig;
use crate::prelude::{AudioError, AudioResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use std::future::Future;

/// Encoded audio ready for playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Playable `data:` URI for players that only accept URIs.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, BASE64.encode(&self.bytes))
    }
}

/// Remote text-to-speech and speech-to-text.
pub trait SpeechService: Send + Sync + 'static {
    fn synthesize(&self, text: &str) -> impl Future<Output = AudioResult<AudioClip>> + Send;

    fn transcribe(
        &self,
        audio: Vec<u8>,
        mime: &str,
    ) -> impl Future<Output = AudioResult<String>> + Send;
}

/// Empty or "silence" transcripts become the empty string.
pub fn normalize_transcript(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed
        .trim_matches(|c: char| c == '[' || c == ']' || c == '(' || c == ')' || c == '.')
        .trim();
    if bare.is_empty() || bare.eq_ignore_ascii_case("silence") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

pub struct HttpSpeechService {
    client: reqwest::Client,
    config: ServiceConfig,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl HttpSpeechService {
    pub fn new(config: ServiceConfig) -> AudioResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| AudioError::Synthesis(err.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.speech_base_url.trim_end_matches('/'), path)
    }
}

impl SpeechService for HttpSpeechService {
    async fn synthesize(&self, text: &str) -> AudioResult<AudioClip> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AudioError::Synthesis("no API key configured".into()))?;

        let response = self
            .client
            .post(self.url("audio/speech"))
            .bearer_auth(key)
            .json(&json!({
                "model": "tts-1",
                "voice": "alloy",
                "input": text,
                "response_format": "mp3",
            }))
            .send()
            .await
            .map_err(|err| AudioError::Synthesis(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AudioError::Synthesis(format!("status {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| AudioError::Synthesis(err.to_string()))?;
        Ok(AudioClip::new(bytes.to_vec(), "audio/mpeg"))
    }

    async fn transcribe(&self, audio: Vec<u8>, mime: &str) -> AudioResult<String> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AudioError::Transcription("no API key configured".into()))?;

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("speech")
            .mime_str(mime)
            .map_err(|err| AudioError::Transcription(err.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .part("file", part);

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(key)
            .multipart(form)
            .send()
            .await
            .map_err(|err| AudioError::Transcription(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AudioError::Transcription(format!(
                "status {}",
                response.status()
            )));
        }
        let body = response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|err| AudioError::Transcription(err.to_string()))?;
        Ok(normalize_transcript(&body.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_transcripts_are_empty() {
        assert_eq!(normalize_transcript(""), "");
        assert_eq!(normalize_transcript("  "), "");
        assert_eq!(normalize_transcript("[Silence]"), "");
        assert_eq!(normalize_transcript("silence."), "");
        assert_eq!(normalize_transcript(" he is not breathing "), "he is not breathing");
    }

    #[test]
    fn clip_renders_data_uri() {
        let clip = AudioClip::new(vec![1, 2, 3], "audio/mpeg");
        assert_eq!(clip.data_uri(), "data:audio/mpeg;base64,AQID");
    }

    #[tokio::test]
    async fn missing_key_skips_remote_calls() {
        let service = HttpSpeechService::new(ServiceConfig::default()).unwrap();
        assert!(matches!(
            service.synthesize("hello").await,
            Err(AudioError::Synthesis(_))
        ));
        assert!(matches!(
            service.transcribe(vec![0; 4], "audio/m4a").await,
            Err(AudioError::Transcription(_))
        ));
    }
}
