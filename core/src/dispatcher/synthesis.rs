use crate::dispatcher::session::{
    Corrections, DispatcherResponse, Guidance, HapticFeedback, HapticKind, NextAction, Urgency,
    VoiceGuidance, VoiceTone,
};
use crate::prelude::ProcedureMode;
use crate::vision::AnalysisResult;

pub const GENERIC_VOICE: &str = "Stay calm and follow the instructions on screen.";

fn next_action_for(mode: ProcedureMode) -> NextAction {
    let (action, timing_secs, priority) = match mode {
        ProcedureMode::Cpr => ("Continue chest compressions", 120, 1),
        ProcedureMode::Pulse => ("Feel for a pulse", 10, 1),
        ProcedureMode::Airway => ("Check for breathing", 10, 2),
        ProcedureMode::Seizure => ("Time the seizure and keep the area clear", 300, 2),
    };
    NextAction {
        action: action.to_string(),
        timing_secs,
        priority,
    }
}

/// Canned guidance used when the analysis itself came from the fallback table.
pub fn mock_response(mode: ProcedureMode) -> DispatcherResponse {
    let (primary, secondary, urgency, technique, tone, pattern_ms): (
        &str,
        &str,
        Urgency,
        &str,
        VoiceTone,
        Vec<u64>,
    ) = match mode {
        ProcedureMode::Cpr => (
            "Push hard and fast in the center of the chest.",
            "Let the chest rise fully between compressions.",
            Urgency::Critical,
            "Lock your elbows and keep your shoulders over your hands.",
            VoiceTone::Urgent,
            vec![100, 50, 100],
        ),
        ProcedureMode::Pulse => (
            "Feel for a pulse on the side of the neck for 10 seconds.",
            "Use two fingers, not your thumb.",
            Urgency::High,
            "Press gently; pressing too hard can hide a weak pulse.",
            VoiceTone::Calm,
            vec![50],
        ),
        ProcedureMode::Airway => (
            "Tilt the head back and lift the chin.",
            "Look, listen and feel for breathing.",
            Urgency::High,
            "Lift the bony part of the chin, not the soft tissue.",
            VoiceTone::Instructive,
            vec![80, 40, 80],
        ),
        ProcedureMode::Seizure => (
            "Keep the person safe and do not hold them down.",
            "Roll them onto their side once the shaking stops.",
            Urgency::Medium,
            "Never put anything in their mouth.",
            VoiceTone::Calm,
            vec![60],
        ),
    };

    DispatcherResponse {
        guidance: Guidance {
            primary: primary.to_string(),
            secondary: Some(secondary.to_string()),
            urgency,
        },
        corrections: Some(Corrections {
            position: None,
            technique: Some(technique.to_string()),
        }),
        next_action: next_action_for(mode),
        voice_guidance: VoiceGuidance {
            speak: primary.to_string(),
            tone,
        },
        haptic_feedback: HapticFeedback {
            kind: HapticKind::Pattern,
            pattern_ms,
        },
    }
}

/// Turns analyses into guidance, tracking per-session step and the last
/// spoken line.
#[derive(Debug, Default)]
pub struct GuidanceSynthesizer {
    step: u32,
    last_spoken: Option<String>,
}

impl GuidanceSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.last_spoken = None;
    }

    pub fn synthesize(&mut self, analysis: &AnalysisResult, mode: ProcedureMode) -> DispatcherResponse {
        self.step += 1;
        if analysis.is_fallback() {
            return mock_response(mode);
        }

        let primary = analysis.overall_instruction.trim().to_string();
        let speak = if primary.is_empty() {
            GENERIC_VOICE.to_string()
        } else {
            primary.clone()
        };
        let secondary = analysis
            .detections
            .iter()
            .map(|detection| detection.instruction.trim())
            .find(|text| !text.is_empty() && *text != primary)
            .map(str::to_string);

        DispatcherResponse {
            guidance: Guidance {
                primary,
                secondary,
                urgency: Urgency::Medium,
            },
            corrections: None,
            next_action: next_action_for(mode),
            voice_guidance: VoiceGuidance {
                speak,
                tone: VoiceTone::Instructive,
            },
            haptic_feedback: HapticFeedback {
                kind: HapticKind::Impact,
                pattern_ms: vec![50],
            },
        }
    }

    /// False when the text repeats the previous spoken line.
    pub fn should_speak(&mut self, text: &str) -> bool {
        if self.last_spoken.as_deref() == Some(text) {
            return false;
        }
        self.last_spoken = Some(text.to_string());
        true
    }
}
