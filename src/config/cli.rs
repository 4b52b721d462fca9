//! CLI argument parsing and configuration

use crate::types::FrontEnd;
use clap::Parser;
use std::path::PathBuf;

/// chordline - real-time chord recognition for audio files
///
/// Streams an audio file through the chord-recognition engine frame by
/// frame and prints the confirmed chord timeline. Optionally writes the
/// timeline as JSON.
#[derive(Parser, Debug)]
#[command(name = "chordline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input audio file
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Write the chord timeline as JSON to this path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pitch-information front end
    #[arg(long, value_enum, default_value = "peaks")]
    pub front_end: FrontEnd,

    /// Match bass/mid/treble sub-bands independently
    #[arg(long, default_value = "false")]
    pub multi_band: bool,

    /// Disable the onset/beat sampling gate (match every frame)
    #[arg(long, default_value = "false")]
    pub no_gate: bool,

    /// Minimum candidate confidence for a stabilizer vote
    #[arg(long, value_name = "0..1")]
    pub min_confidence: Option<f32>,

    /// Sliding vote window in milliseconds
    #[arg(long, value_name = "MS")]
    pub vote_window: Option<f64>,

    /// Favorable ticks before a chord change is confirmed
    #[arg(long, value_name = "N")]
    pub min_stability: Option<u32>,

    /// Harmonic-rejection ratio tolerance
    #[arg(long, value_name = "0..1")]
    pub harmonic_tolerance: Option<f32>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bar and timeline table)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
