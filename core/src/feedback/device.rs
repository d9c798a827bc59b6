use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImpactStyle {
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
}

/// Discrete command issued to the device's haptic, speech or audio APIs.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum FeedbackCommand {
    Impact(ImpactStyle),
    Notify(NotificationKind),
    HapticPattern { pattern_ms: Vec<u64> },
    Speak { text: String },
    StopSpeech,
    Tick,
    AllowPlaybackInSilentMode,
}

/// Device collaborator. Calls must be cheap and may overlap freely.
pub trait FeedbackDevice: Send + Sync {
    fn dispatch(&self, command: FeedbackCommand);
}

/// Device that only logs what it was asked to do.
#[derive(Debug, Default)]
pub struct LoggingDevice;

impl FeedbackDevice for LoggingDevice {
    fn dispatch(&self, command: FeedbackCommand) {
        debug!("feedback: {:?}", command);
    }
}

/// Keeps every command in order, for assertions and replay.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Mutex<Vec<FeedbackCommand>>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<FeedbackCommand> {
        match self.commands.lock() {
            Ok(commands) => commands.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, predicate: impl Fn(&FeedbackCommand) -> bool) -> usize {
        self.commands().iter().filter(|command| predicate(command)).count()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                FeedbackCommand::Speak { text } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        match self.commands.lock() {
            Ok(mut commands) => commands.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl FeedbackDevice for RecordingDevice {
    fn dispatch(&self, command: FeedbackCommand) {
        match self.commands.lock() {
            Ok(mut commands) => commands.push(command),
            Err(poisoned) => poisoned.into_inner().push(command),
        }
    }
}
