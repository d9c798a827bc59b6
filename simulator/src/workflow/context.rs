use crate::devices::{ConsoleDevice, ConsolePlayer};
use crate::workflow::config::WorkflowConfig;
use aidcore::config::ServiceConfig;
use aidcore::dispatcher::Dispatcher;
use aidcore::feedback::{AudioEngine, HttpSpeechService};
use aidcore::metronome::{Countdown, Metronome};
use aidcore::vision::{HttpVisionTransport, VisionClient};
use anyhow::Context;
use std::sync::Arc;

pub type SpeechEngine = AudioEngine<HttpSpeechService, ConsolePlayer>;

/// Owns the single dispatcher, metronome, countdown and audio engine of the app.
pub struct AppContext {
    pub device: Arc<ConsoleDevice>,
    pub dispatcher: Dispatcher<HttpVisionTransport>,
    pub metronome: Metronome,
    pub countdown: Countdown,
    /// Present only when a speech API key is configured.
    pub audio: Option<SpeechEngine>,
}

impl AppContext {
    pub fn new(
        services: ServiceConfig,
        workflow: &WorkflowConfig,
        quiet: bool,
    ) -> anyhow::Result<Self> {
        let device = Arc::new(ConsoleDevice::new(quiet));

        let transport = HttpVisionTransport::new(services.clone())
            .context("building vision transport")?;
        let dispatcher = Dispatcher::new(VisionClient::new(transport), device.clone());

        let audio: Option<SpeechEngine> = if services.has_api_key() {
            let speech =
                HttpSpeechService::new(services).context("building speech service")?;
            Some(AudioEngine::with_buffering(
                speech,
                ConsolePlayer::default(),
                workflow.speech_lookahead,
                workflow.speech_chunk_chars,
            ))
        } else {
            None
        };

        // Synthesized speech replaces the device voice rather than doubling it.
        let dispatcher = if audio.is_some() {
            dispatcher.without_device_speech()
        } else {
            dispatcher
        };

        Ok(Self {
            metronome: Metronome::new(device.clone()),
            countdown: Countdown::new(device.clone()),
            device,
            dispatcher,
            audio,
        })
    }
}
