use crate::dispatcher::session::{DispatcherResponse, EmergencySession};
use crate::dispatcher::synthesis::GuidanceSynthesizer;
use crate::feedback::{FeedbackCommand, FeedbackDevice};
use crate::prelude::{CoordinatorError, CoordinatorResult, ProcedureMode};
use crate::telemetry::{LogManager, MetricsRecorder};
use crate::vision::{AnalysisResult, VisionClient, VisionTransport};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Result of one capture round.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub session_id: Uuid,
    pub analysis: AnalysisResult,
    pub response: DispatcherResponse,
    /// False when the voice line repeated the previous round and was skipped.
    pub spoken: bool,
}

#[derive(Default)]
struct Slot {
    session: Option<EmergencySession>,
    processing: bool,
    teardown_pending: bool,
}

/// Sequences capture analysis, guidance synthesis and device feedback for the
/// single live emergency session.
///
/// ```text
/// Idle --start_session--> SessionActive --process_image--> Processing
///                              ^                               |
///                              +-------------------------------+
///                                   end_session (deferred while Processing) --> Idle
/// ```
pub struct Dispatcher<T> {
    vision: VisionClient<T>,
    device: Arc<dyn FeedbackDevice>,
    slot: Mutex<Slot>,
    synthesizer: Mutex<GuidanceSynthesizer>,
    metrics: MetricsRecorder,
    logger: LogManager,
    /// When false, voice lines are left to an external audio engine.
    device_speech: bool,
}

/// Clears the processing flag and finishes any deferred teardown, whether the
/// round succeeded or not.
struct InFlight<'a, T> {
    dispatcher: &'a Dispatcher<T>,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        let mut slot = self.dispatcher.lock_slot();
        slot.processing = false;
        if slot.teardown_pending {
            slot.teardown_pending = false;
            if let Some(session) = slot.session.take() {
                self.dispatcher
                    .logger
                    .record(&format!("session {} released after in-flight round", session.session_id));
            }
        }
    }
}

impl<T> Dispatcher<T> {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lock_synthesizer(&self) -> MutexGuard<'_, GuidanceSynthesizer> {
        match self.synthesizer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<T: VisionTransport> Dispatcher<T> {
    pub fn new(vision: VisionClient<T>, device: Arc<dyn FeedbackDevice>) -> Self {
        Self {
            vision,
            device,
            slot: Mutex::new(Slot::default()),
            synthesizer: Mutex::new(GuidanceSynthesizer::new()),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("dispatcher"),
            device_speech: true,
        }
    }

    /// Stops the dispatcher from issuing `Speak` commands. Use when a
    /// synthesized voice plays the guidance, so each line is voiced once.
    pub fn without_device_speech(mut self) -> Self {
        self.device_speech = false;
        self
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn vision(&self) -> &VisionClient<T> {
        &self.vision
    }

    /// Snapshot of the session slot, including an ended session awaiting release.
    pub fn session(&self) -> Option<EmergencySession> {
        self.lock_slot().session.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.lock_slot().processing
    }

    fn fail(&self, err: CoordinatorError) -> CoordinatorError {
        self.metrics.record_error();
        self.logger.degrade(&err.to_string());
        err
    }

    pub fn start_session(&self, mode: ProcedureMode) -> CoordinatorResult<EmergencySession> {
        let session = {
            let mut slot = self.lock_slot();
            if slot.session.is_some() {
                return Err(self.fail(CoordinatorError::AlreadyActive));
            }
            let session = EmergencySession::new(mode);
            slot.session = Some(session.clone());
            slot.teardown_pending = false;
            session
        };

        self.lock_synthesizer().reset();
        self.device
            .dispatch(FeedbackCommand::AllowPlaybackInSilentMode);
        self.logger
            .record(&format!("session {} started in {} mode", session.session_id, mode));
        Ok(session)
    }

    fn ensure_active(&self) -> CoordinatorResult<()> {
        let active = self
            .lock_slot()
            .session
            .as_ref()
            .map(|session| session.is_active)
            .unwrap_or(false);
        if active {
            Ok(())
        } else {
            Err(self.fail(CoordinatorError::SessionEnded))
        }
    }

    /// Runs one capture round. At most one round is in flight per session.
    pub async fn process_image(
        &self,
        image_jpeg: &[u8],
        user_feedback: Option<String>,
    ) -> CoordinatorResult<ProcessOutcome> {
        let (session_id, mode) = {
            let mut slot = self.lock_slot();
            let Some(session) = slot.session.as_ref() else {
                return Err(self.fail(CoordinatorError::NoActiveSession));
            };
            let (session_id, mode, active) = (session.session_id, session.mode, session.is_active);
            if slot.processing {
                return Err(self.fail(CoordinatorError::AlreadyProcessing));
            }
            if !active {
                return Err(self.fail(CoordinatorError::SessionEnded));
            }
            slot.processing = true;
            (session_id, mode)
        };
        let _in_flight = InFlight { dispatcher: self };

        let analysis = self.vision.analyze(image_jpeg, mode).await;
        if analysis.is_fallback() {
            self.metrics.record_fallback();
        }
        self.ensure_active()?;

        let (response, spoken) = {
            let mut synthesizer = self.lock_synthesizer();
            let response = synthesizer.synthesize(&analysis, mode);
            let spoken = synthesizer.should_speak(&response.voice_guidance.speak);
            (response, spoken)
        };

        {
            let mut slot = self.lock_slot();
            let Some(session) = slot.session.as_mut().filter(|s| s.is_active) else {
                return Err(self.fail(CoordinatorError::SessionEnded));
            };
            session.last_analysis = Some(analysis.clone());
            session.last_guidance = Some(response.clone());
            if user_feedback.is_some() {
                session.user_feedback = user_feedback;
            }
        }

        self.device.dispatch(FeedbackCommand::HapticPattern {
            pattern_ms: response.haptic_feedback.pattern_ms.clone(),
        });
        if spoken && self.device_speech {
            self.device.dispatch(FeedbackCommand::Speak {
                text: response.voice_guidance.speak.clone(),
            });
        }

        self.metrics.record_processed();
        self.logger.record(&format!(
            "session {} round: {} ({:?})",
            session_id, response.guidance.primary, response.guidance.urgency
        ));

        Ok(ProcessOutcome {
            session_id,
            analysis,
            response,
            spoken,
        })
    }

    /// Marks the session inactive at once; the slot is released now, or when
    /// the in-flight round finishes. Returns the ended session, or None when
    /// there was nothing to end.
    pub fn end_session(&self) -> Option<EmergencySession> {
        let ended = {
            let mut slot = self.lock_slot();
            let processing = slot.processing;
            let session = slot.session.as_mut()?;
            if !session.is_active {
                return None;
            }
            session.is_active = false;
            let snapshot = session.clone();
            if processing {
                slot.teardown_pending = true;
            } else {
                slot.session = None;
            }
            snapshot
        };

        self.device.dispatch(FeedbackCommand::StopSpeech);
        self.logger
            .record(&format!("session {} ended", ended.session_id));
        Some(ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::RecordingDevice;
    use crate::prelude::{VisionError, VisionResult};
    use crate::vision::client::tests::ScriptedTransport;
    use crate::vision::fallback::CPR_FALLBACK_INSTRUCTION;
    use crate::vision::{ModelReply, VisionRequest};
    use tokio::sync::Notify;

    const CHEST_REPLY: &str = "{\"detections\":[{\"x\":0.5,\"y\":0.55,\"width\":0.2,\
        \"height\":0.2,\"confidence\":0.9,\"label\":\"Chest\",\"instruction\":\"Center here\"}],\
        \"overallInstruction\":\"Start compressions now\"}";

    fn dispatcher(transport: ScriptedTransport) -> (Arc<RecordingDevice>, Dispatcher<ScriptedTransport>) {
        let device = Arc::new(RecordingDevice::new());
        let dispatcher = Dispatcher::new(VisionClient::new(transport), device.clone());
        (device, dispatcher)
    }

    /// Holds each request until released, to interleave end_session.
    struct GatedTransport {
        entered: Notify,
        release: Notify,
    }

    impl VisionTransport for GatedTransport {
        async fn generate(&self, _request: VisionRequest) -> VisionResult<ModelReply> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(ModelReply::text(CHEST_REPLY))
        }
    }

    #[tokio::test]
    async fn round_updates_session_and_drives_feedback() {
        let (device, dispatcher) = dispatcher(ScriptedTransport::replying(CHEST_REPLY));
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();

        let outcome = dispatcher
            .process_image(b"jpeg", Some("he is not breathing".into()))
            .await
            .unwrap();
        assert_eq!(outcome.response.guidance.primary, "Start compressions now");
        assert!(outcome.spoken);

        let session = dispatcher.session().unwrap();
        assert_eq!(session.last_guidance, Some(outcome.response.clone()));
        assert_eq!(session.user_feedback.as_deref(), Some("he is not breathing"));
        assert_eq!(device.spoken(), vec!["Start compressions now".to_string()]);
        assert_eq!(
            device.count(|c| matches!(c, FeedbackCommand::HapticPattern { .. })),
            1
        );
        assert_eq!(dispatcher.metrics().snapshot().processed, 1);
        assert!(!dispatcher.is_processing());
    }

    #[tokio::test]
    async fn identical_guidance_is_not_repeated_aloud() {
        let (device, dispatcher) = dispatcher(ScriptedTransport::replying(CHEST_REPLY));
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();
        assert!(dispatcher.process_image(b"a", None).await.unwrap().spoken);
        assert!(!dispatcher.process_image(b"b", None).await.unwrap().spoken);
        assert_eq!(device.spoken().len(), 1);
    }

    #[tokio::test]
    async fn external_voice_leaves_speech_off_the_device() {
        let device = Arc::new(RecordingDevice::new());
        let dispatcher = Dispatcher::new(
            VisionClient::new(ScriptedTransport::replying(CHEST_REPLY)),
            device.clone(),
        )
        .without_device_speech();
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();

        let outcome = dispatcher.process_image(b"jpeg", None).await.unwrap();
        assert!(outcome.spoken);
        assert_eq!(outcome.response.voice_guidance.speak, "Start compressions now");
        assert!(device.spoken().is_empty());
        assert_eq!(
            device.count(|c| matches!(c, FeedbackCommand::HapticPattern { .. })),
            1
        );
    }

    #[tokio::test]
    async fn network_failure_degrades_to_fallback_guidance() {
        let (_, dispatcher) = dispatcher(ScriptedTransport::failing(VisionError::Network(
            "offline".into(),
        )));
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();
        let outcome = dispatcher.process_image(b"jpeg", None).await.unwrap();
        assert_eq!(outcome.analysis.overall_instruction, CPR_FALLBACK_INSTRUCTION);
        assert_eq!(dispatcher.metrics().snapshot().fallbacks, 1);
    }

    #[tokio::test]
    async fn misuse_is_reported() {
        let (_, dispatcher) = dispatcher(ScriptedTransport::replying(CHEST_REPLY));
        assert_eq!(
            dispatcher.process_image(b"jpeg", None).await.unwrap_err(),
            CoordinatorError::NoActiveSession
        );
        dispatcher.start_session(ProcedureMode::Pulse).unwrap();
        assert_eq!(
            dispatcher.start_session(ProcedureMode::Cpr).unwrap_err(),
            CoordinatorError::AlreadyActive
        );
        assert!(dispatcher.end_session().is_some());
        assert!(dispatcher.end_session().is_none());
        assert!(dispatcher.session().is_none());
        assert_eq!(dispatcher.metrics().snapshot().errors, 2);
    }

    #[tokio::test]
    async fn new_session_resets_repetition_tracking() {
        let (device, dispatcher) = dispatcher(ScriptedTransport::replying(CHEST_REPLY));
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();
        dispatcher.process_image(b"a", None).await.unwrap();
        dispatcher.end_session();
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();
        assert!(dispatcher.process_image(b"b", None).await.unwrap().spoken);
        assert_eq!(device.spoken().len(), 2);
    }

    #[tokio::test]
    async fn end_during_round_defers_release_until_round_finishes() {
        let device = Arc::new(RecordingDevice::new());
        let dispatcher = Arc::new(Dispatcher::new(
            VisionClient::new(GatedTransport {
                entered: Notify::new(),
                release: Notify::new(),
            }),
            device.clone(),
        ));
        dispatcher.start_session(ProcedureMode::Cpr).unwrap();

        let round = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.process_image(b"jpeg", None).await })
        };
        dispatcher.vision().transport().entered.notified().await;

        assert_eq!(
            dispatcher.process_image(b"again", None).await.unwrap_err(),
            CoordinatorError::AlreadyProcessing
        );

        let ended = dispatcher.end_session().unwrap();
        assert!(!ended.is_active);
        let pending = dispatcher.session().expect("slot held while round in flight");
        assert!(!pending.is_active);
        assert_eq!(
            dispatcher.start_session(ProcedureMode::Cpr).unwrap_err(),
            CoordinatorError::AlreadyActive
        );

        dispatcher.vision().transport().release.notify_one();
        let result = round.await.unwrap();
        assert_eq!(result.unwrap_err(), CoordinatorError::SessionEnded);
        assert!(dispatcher.session().is_none());
        assert!(!dispatcher.is_processing());
        assert!(device.spoken().is_empty());

        dispatcher.start_session(ProcedureMode::Pulse).unwrap();
    }
}
