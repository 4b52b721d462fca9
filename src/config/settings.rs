//! Runtime configuration settings

use crate::analysis::AnalysisConfig;
use crate::error::{ChordlineError, Result};
use std::path::PathBuf;

/// Runtime settings for a chordline run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input audio file
    pub input: PathBuf,
    /// JSON timeline output path (None = stdout table only)
    pub output: Option<PathBuf>,
    /// Engine configuration (front end, thresholds, gate)
    pub analysis: AnalysisConfig,
    /// Show progress bar
    pub show_progress: bool,
    /// Print the timeline table
    pub print_timeline: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Result<Self> {
        let mut analysis = AnalysisConfig {
            front_end: cli.front_end,
            multi_band: cli.multi_band,
            gate_enabled: !cli.no_gate,
            ..AnalysisConfig::default()
        };

        if let Some(min_confidence) = cli.min_confidence {
            if !(0.0..=1.0).contains(&min_confidence) {
                return Err(ChordlineError::ConfigError(format!(
                    "--min-confidence must be in [0, 1], got {}",
                    min_confidence
                )));
            }
            analysis.min_confidence = min_confidence;
        }

        if let Some(vote_window) = cli.vote_window {
            if vote_window <= 0.0 {
                return Err(ChordlineError::ConfigError(format!(
                    "--vote-window must be positive, got {}",
                    vote_window
                )));
            }
            analysis.vote_window_ms = vote_window;
        }

        if let Some(min_stability) = cli.min_stability {
            if min_stability == 0 {
                return Err(ChordlineError::ConfigError(
                    "--min-stability must be at least 1".to_string(),
                ));
            }
            analysis.min_stability = min_stability;
        }

        if let Some(tolerance) = cli.harmonic_tolerance {
            if !(0.0..=0.5).contains(&tolerance) {
                return Err(ChordlineError::ConfigError(format!(
                    "--harmonic-tolerance must be in [0, 0.5], got {}",
                    tolerance
                )));
            }
            analysis.harmonic_tolerance = tolerance;
        }

        Ok(Self {
            input: cli.input.clone(),
            output: cli.output.clone(),
            analysis,
            show_progress: !cli.quiet,
            print_timeline: !cli.quiet,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            output: None,
            analysis: AnalysisConfig::default(),
            show_progress: true,
            print_timeline: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_reach_analysis_config() {
        let cli = Cli::parse_from([
            "chordline",
            "-i",
            "track.wav",
            "--front-end",
            "chroma",
            "--no-gate",
            "--min-confidence",
            "0.8",
        ]);
        let settings = Settings::from_cli(&cli).expect("valid settings");
        assert!(!settings.analysis.gate_enabled);
        assert_eq!(settings.analysis.min_confidence, 0.8);
    }

    #[test]
    fn test_out_of_range_confidence_is_rejected() {
        let cli = Cli::parse_from(["chordline", "-i", "x.wav", "--min-confidence", "1.5"]);
        assert!(Settings::from_cli(&cli).is_err());
    }

    #[test]
    fn test_zero_stability_is_rejected() {
        let cli = Cli::parse_from(["chordline", "-i", "x.wav", "--min-stability", "0"]);
        assert!(Settings::from_cli(&cli).is_err());
    }
}
