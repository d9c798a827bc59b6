use crate::feedback::{FeedbackCommand, FeedbackDevice, ImpactStyle, NotificationKind};
use crate::telemetry::LogManager;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

pub const PULSE_CHECK_SECS: u32 = 10;
pub const WARNING_WINDOW_SECS: u32 = 5;
pub const COMPLETION_PROMPT: &str = "Time is up. Did you feel a pulse?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownState {
    pub remaining: u32,
    pub finished: bool,
}

fn complete(device: &dyn FeedbackDevice) {
    device.dispatch(FeedbackCommand::Notify(NotificationKind::Success));
    device.dispatch(FeedbackCommand::Speak {
        text: COMPLETION_PROMPT.to_string(),
    });
}

/// One-second countdown used for the pulse check. Light ticks during the last
/// five seconds, a success notification and spoken prompt at zero.
pub struct Countdown {
    device: Arc<dyn FeedbackDevice>,
    timer: Mutex<Option<JoinHandle<()>>>,
    state: Arc<watch::Sender<CountdownState>>,
    logger: LogManager,
}

impl Countdown {
    pub fn new(device: Arc<dyn FeedbackDevice>) -> Self {
        let (state, _) = watch::channel(CountdownState {
            remaining: 0,
            finished: false,
        });
        Self {
            device,
            timer: Mutex::new(None),
            state: Arc::new(state),
            logger: LogManager::new("countdown"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.timer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> CountdownState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .map(|timer| !timer.is_finished())
            .unwrap_or(false)
    }

    pub fn start(&self, seconds: u32) {
        self.stop();
        self.state.send_replace(CountdownState {
            remaining: seconds,
            finished: seconds == 0,
        });
        if seconds == 0 {
            complete(self.device.as_ref());
            self.logger.record("zero-length countdown completed at once");
            return;
        }

        let device = Arc::clone(&self.device);
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            let tick = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + tick, tick);
            let mut remaining = seconds;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                if remaining == 0 {
                    complete(device.as_ref());
                } else if remaining <= WARNING_WINDOW_SECS {
                    device.dispatch(FeedbackCommand::Impact(ImpactStyle::Light));
                }
                state.send_replace(CountdownState {
                    remaining,
                    finished: remaining == 0,
                });
            }
        });
        *self.lock() = Some(handle);
        self.logger.record(&format!("counting down from {}", seconds));
    }

    pub fn start_pulse_check(&self) {
        self.start(PULSE_CHECK_SECS);
    }

    /// Cancels a running countdown. Idempotent.
    pub fn stop(&self) -> bool {
        let Some(timer) = self.lock().take() else {
            return false;
        };
        let was_running = !timer.is_finished();
        timer.abort();
        if was_running {
            self.logger.record("cancelled");
        }
        was_running
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        if let Some(timer) = self.lock().take() {
            timer.abort();
        }
    }
}
