use aidcore::prelude::ProcedureMode;
use aidcore::targeting::PulseSite;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub mode: ProcedureMode,
    pub rounds: usize,
    /// JPEG to send for every round; a synthetic frame when unset.
    pub image: Option<PathBuf>,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub hand_threshold_px: f32,
    pub finger_threshold_px: f32,
    pub bpm: u32,
    pub pulse_site: PulseSite,
    pub cycle_pulse_sites: bool,
    pub start_offset_px: f32,
    /// Fraction of the remaining distance the simulated hand closes per round.
    pub approach: f32,
    pub jitter_px: f32,
    pub seed: u64,
    pub round_interval_ms: u64,
    pub speech_lookahead: usize,
    pub speech_chunk_chars: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            mode: ProcedureMode::Cpr,
            rounds: 5,
            image: None,
            viewport_width: 390.0,
            viewport_height: 844.0,
            hand_threshold_px: 40.0,
            finger_threshold_px: 20.0,
            bpm: 110,
            pulse_site: PulseSite::Carotid,
            cycle_pulse_sites: false,
            start_offset_px: 160.0,
            approach: 0.5,
            jitter_px: 6.0,
            seed: 0,
            round_interval_ms: 1_000,
            speech_lookahead: 2,
            speech_chunk_chars: 180,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(mode: ProcedureMode, rounds: usize, bpm: u32, seed: u64) -> Self {
        Self {
            mode,
            rounds,
            bpm,
            seed,
            ..Default::default()
        }
    }

    /// Pixel threshold for the placement check the mode uses.
    pub fn threshold_px(&self) -> f32 {
        match self.mode {
            ProcedureMode::Pulse => self.finger_threshold_px,
            _ => self.hand_threshold_px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_keeps_defaults() {
        let cfg = WorkflowConfig::from_args(ProcedureMode::Pulse, 3, 115, 7);
        assert_eq!(cfg.rounds, 3);
        assert_eq!(cfg.threshold_px(), cfg.finger_threshold_px);
        assert_eq!(cfg.viewport_width, 390.0);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"mode: pulse\nrounds: 2\npulse_site: radial\nbpm: 100\n")
            .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();
        assert_eq!(cfg.mode, ProcedureMode::Pulse);
        assert_eq!(cfg.pulse_site, PulseSite::Radial);
        assert_eq!(cfg.hand_threshold_px, 40.0);
    }

    #[test]
    fn config_load_reports_bad_mode() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"mode: bandage\n").unwrap();
        let path = temp.into_temp_path();
        let err = WorkflowConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("parsing workflow config"));
    }
}
