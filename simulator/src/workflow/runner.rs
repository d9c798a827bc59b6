use crate::generator::capture::load_capture;
use crate::generator::hands::HandSimulator;
use crate::gui_bridge::bridge::GuiBridge;
use crate::gui_bridge::model::OverlayModel;
use crate::workflow::config::WorkflowConfig;
use crate::workflow::context::AppContext;
use aidcore::feedback::{FeedbackCommand, FeedbackDevice, ImpactStyle};
use aidcore::guidance::{evaluate_placement, AccuracyClassification, AccuracyTracker};
use aidcore::prelude::{AudioError, ImageSize, ProcedureMode};
use aidcore::targeting::{resolve_chest_target, resolve_pulse, PlacementTarget, PulseSite};
use aidcore::telemetry::MetricsSnapshot;
use aidcore::vision::AnalysisResult;
use anyhow::Context;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RoundReport {
    pub round: usize,
    pub guidance: String,
    pub spoken: bool,
    pub target: Option<PlacementTarget>,
    pub classification: Option<AccuracyClassification>,
    pub status_code: Option<String>,
    pub pulse_site: Option<PulseSite>,
    pub recommended_site: Option<PulseSite>,
    pub placement_reached: bool,
}

pub struct WorkflowResult {
    pub rounds: Vec<RoundReport>,
    pub metrics: MetricsSnapshot,
    pub beats: u64,
    pub placement_haptics: usize,
}

/// Target resolution per mode; airway and seizure guidance has no single point.
fn resolve_target(
    mode: ProcedureMode,
    analysis: &AnalysisResult,
    site: PulseSite,
) -> (Option<PlacementTarget>, Option<PulseSite>) {
    match mode {
        ProcedureMode::Cpr => (resolve_chest_target(analysis), None),
        ProcedureMode::Pulse => {
            let resolution = resolve_pulse(analysis, site);
            (resolution.target, Some(resolution.recommended))
        }
        ProcedureMode::Airway | ProcedureMode::Seizure => (None, None),
    }
}

pub struct Runner {
    config: WorkflowConfig,
    context: Arc<AppContext>,
    bridge: Arc<GuiBridge>,
}

impl Runner {
    pub fn new(config: WorkflowConfig, context: Arc<AppContext>, bridge: Arc<GuiBridge>) -> Self {
        Self {
            config,
            context,
            bridge,
        }
    }

    pub async fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let config = &self.config;
        let ctx = &self.context;
        let image_size = ImageSize::new(config.viewport_width, config.viewport_height);
        let capture = load_capture(config.image.as_deref())?;

        ctx.dispatcher
            .start_session(config.mode)
            .context("starting emergency session")?;
        match config.mode {
            ProcedureMode::Cpr => ctx.metronome.start(config.bpm),
            ProcedureMode::Pulse => ctx.countdown.start_pulse_check(),
            _ => {}
        }

        let outcome = self.run_rounds(&capture, image_size).await;

        let beats = ctx.metronome.beat_count();
        ctx.metronome.stop();
        ctx.countdown.stop();
        if let Some(audio) = &ctx.audio {
            audio.clear();
        }
        ctx.dispatcher.end_session();

        let (rounds, placement_haptics) = outcome?;
        Ok(WorkflowResult {
            rounds,
            metrics: ctx.dispatcher.metrics().snapshot(),
            beats,
            placement_haptics,
        })
    }

    async fn run_rounds(
        &self,
        capture: &[u8],
        image_size: ImageSize,
    ) -> anyhow::Result<(Vec<RoundReport>, usize)> {
        let config = &self.config;
        let ctx = &self.context;
        let mut tracker = AccuracyTracker::new();
        let mut hands = HandSimulator::new(
            config.seed,
            config.start_offset_px,
            config.approach,
            config.jitter_px,
        );
        if config.mode == ProcedureMode::Cpr {
            hands = hands.two_handed();
        }
        let mut site = config.pulse_site;
        let mut last_target: Option<PlacementTarget> = None;
        let mut reports = Vec::with_capacity(config.rounds);
        let mut placement_haptics = 0;

        for round in 1..=config.rounds {
            let outcome = ctx
                .dispatcher
                .process_image(capture, None)
                .await
                .with_context(|| format!("processing round {}", round))?;

            let (target, recommended_site) = resolve_target(config.mode, &outcome.analysis, site);
            // A lost or replaced target starts a fresh approach.
            if target != last_target {
                tracker.reset();
                last_target = target;
            }
            let live = hands.next_frame(target.as_ref(), image_size);
            let placement = target.as_ref().map(|target| {
                evaluate_placement(config.mode, target, &live, image_size, config.threshold_px())
            });

            let placement_reached = placement
                .as_ref()
                .map(|feedback| tracker.observe(feedback.classification))
                .unwrap_or(false);
            if placement_reached {
                ctx.device
                    .dispatch(FeedbackCommand::Impact(ImpactStyle::Light));
                placement_haptics += 1;
            }

            if outcome.spoken {
                if let Some(audio) = &ctx.audio {
                    match audio
                        .speak_buffered(&outcome.response.voice_guidance.speak)
                        .await
                    {
                        Ok(_) | Err(AudioError::Cancelled) => {}
                        Err(err) => {
                            warn!("synthesized voice unavailable, using device speech: {}", err);
                            ctx.device.dispatch(FeedbackCommand::Speak {
                                text: outcome.response.voice_guidance.speak.clone(),
                            });
                        }
                    }
                }
            }

            let pulse_site = (config.mode == ProcedureMode::Pulse).then_some(site);
            self.bridge.publish(&OverlayModel {
                mode: Some(config.mode),
                round,
                detections: outcome.analysis.detections.clone(),
                target,
                classification: placement.as_ref().map(|p| p.classification),
                color: placement.as_ref().map(|p| p.color),
                direction: placement.as_ref().and_then(|p| p.direction),
                instruction: placement
                    .as_ref()
                    .map(|p| p.instruction.to_string())
                    .unwrap_or_else(|| outcome.response.guidance.primary.clone()),
                guidance: outcome.response.guidance.primary.clone(),
                urgency: Some(outcome.response.guidance.urgency),
                pulse_site,
                recommended_site,
                beat_count: ctx.metronome.beat_count(),
                countdown_remaining: (config.mode == ProcedureMode::Pulse)
                    .then(|| ctx.countdown.state().remaining),
            })?;

            reports.push(RoundReport {
                round,
                guidance: outcome.response.guidance.primary.clone(),
                spoken: outcome.spoken,
                target,
                classification: placement.as_ref().map(|p| p.classification),
                status_code: placement.map(|p| p.status_code),
                pulse_site,
                recommended_site,
                placement_reached,
            });

            if config.cycle_pulse_sites {
                site = site.next();
            }
            if round < config.rounds && config.round_interval_ms > 0 {
                tokio::time::sleep(Duration::from_millis(config.round_interval_ms)).await;
            }
        }

        Ok((reports, placement_haptics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidcore::config::ServiceConfig;

    fn runner(config: WorkflowConfig) -> Runner {
        let context = AppContext::new(ServiceConfig::default(), &config, true).unwrap();
        Runner::new(config, Arc::new(context), Arc::new(GuiBridge::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn offline_cpr_run_converges_on_fallback_target() {
        let config = WorkflowConfig {
            jitter_px: 0.0,
            ..WorkflowConfig::from_args(ProcedureMode::Cpr, 6, 110, 9)
        };
        let runner = runner(config);
        let result = runner.execute().await.unwrap();

        assert_eq!(result.rounds.len(), 6);
        assert!(result
            .rounds
            .iter()
            .all(|r| r.target.map(|t| (t.x, t.y)) == Some((0.5, 0.45))));
        assert_eq!(
            result.rounds.last().unwrap().classification,
            Some(AccuracyClassification::Correct)
        );
        assert_eq!(result.placement_haptics, 1);
        assert_eq!(result.metrics.fallbacks, 6);
        assert!(result.beats > 0);
        assert!(result.rounds[0].spoken);
        assert!(!result.rounds[1].spoken);
        assert_eq!(result.rounds[0].guidance, "Push hard and fast in the center of the chest.");

        assert!(runner.context.dispatcher.session().is_none());
        assert!(!runner.context.metronome.is_running());
        assert_eq!(runner.bridge.snapshot().round, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_run_cycles_sites_and_reports_recommendation() {
        let mut config = WorkflowConfig::from_args(ProcedureMode::Pulse, 3, 110, 1);
        config.cycle_pulse_sites = true;
        let runner = runner(config);
        let result = runner.execute().await.unwrap();

        let sites: Vec<_> = result.rounds.iter().map(|r| r.pulse_site).collect();
        assert_eq!(
            sites,
            vec![
                Some(PulseSite::Carotid),
                Some(PulseSite::Brachial),
                Some(PulseSite::Radial)
            ]
        );
        assert!(result.rounds[0].target.is_some());
        assert!(result.rounds[1].target.is_none());
        assert!(result
            .rounds
            .iter()
            .all(|r| r.recommended_site.is_some()));
        assert_eq!(result.beats, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn returning_to_a_site_fires_the_placement_haptic_again() {
        let mut config = WorkflowConfig::from_args(ProcedureMode::Pulse, 4, 110, 2);
        config.cycle_pulse_sites = true;
        config.start_offset_px = 0.0;
        config.jitter_px = 0.0;
        let runner = runner(config);
        let result = runner.execute().await.unwrap();

        let reached: Vec<_> = result.rounds.iter().map(|r| r.placement_reached).collect();
        assert_eq!(reached, vec![true, false, false, true]);
        assert_eq!(
            result.rounds[3].classification,
            Some(AccuracyClassification::Correct)
        );
        assert_eq!(result.placement_haptics, 2);
        assert_eq!(
            runner
                .context
                .device
                .recorded()
                .count(|c| *c == FeedbackCommand::Impact(ImpactStyle::Light)),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn offline_run_voices_each_new_line_once_on_the_device() {
        let runner = runner(WorkflowConfig::from_args(ProcedureMode::Seizure, 3, 110, 4));
        runner.execute().await.unwrap();
        assert_eq!(runner.context.device.recorded().spoken().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn seizure_run_has_no_placement_target() {
        let runner = runner(WorkflowConfig::from_args(ProcedureMode::Seizure, 2, 110, 0));
        let result = runner.execute().await.unwrap();
        assert!(result.rounds.iter().all(|r| r.classification.is_none()));
        assert_eq!(result.placement_haptics, 0);
    }
}
