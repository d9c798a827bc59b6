use aidcore::feedback::{
    AudioClip, AudioPlayer, FeedbackCommand, FeedbackDevice, RecordingDevice,
};
use aidcore::prelude::AudioResult;
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Prints device commands to the console and keeps them for the run report.
#[derive(Default)]
pub struct ConsoleDevice {
    recorded: RecordingDevice,
    quiet: bool,
}

impl ConsoleDevice {
    pub fn new(quiet: bool) -> Self {
        Self {
            recorded: RecordingDevice::new(),
            quiet,
        }
    }

    pub fn recorded(&self) -> &RecordingDevice {
        &self.recorded
    }
}

impl FeedbackDevice for ConsoleDevice {
    fn dispatch(&self, command: FeedbackCommand) {
        if !self.quiet {
            match &command {
                FeedbackCommand::Speak { text } => println!("[VOICE] {}", text),
                FeedbackCommand::Impact(style) => println!("[HAPTIC] impact {:?}", style),
                FeedbackCommand::Notify(kind) => println!("[HAPTIC] notify {:?}", kind),
                FeedbackCommand::HapticPattern { pattern_ms } => {
                    println!("[HAPTIC] pattern {:?}", pattern_ms)
                }
                other => info!("device: {:?}", other),
            }
        }
        self.recorded.dispatch(command);
    }
}

/// Stand-in speaker: "plays" a clip by waiting roughly as long as it would last.
#[derive(Default)]
pub struct ConsolePlayer {
    stopped: AtomicBool,
}

const BYTES_PER_MS: usize = 16;
const MAX_CLIP: Duration = Duration::from_secs(5);

impl AudioPlayer for ConsolePlayer {
    async fn play(&self, clip: AudioClip) -> AudioResult<()> {
        self.stopped.store(false, Ordering::SeqCst);
        let length = Duration::from_millis((clip.bytes.len() / BYTES_PER_MS) as u64).min(MAX_CLIP);
        println!("[AUDIO] {} ({} bytes, ~{:?})", clip.mime, clip.bytes.len(), length);

        let step = Duration::from_millis(50);
        let mut elapsed = Duration::ZERO;
        while elapsed < length && !self.stopped.load(Ordering::SeqCst) {
            tokio::time::sleep(step).await;
            elapsed += step;
        }
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }
}
