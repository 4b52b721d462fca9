//! chordline - Real-Time Musical Chord Recognition
//!
//! Analyzes a stream of magnitude spectra and reports the most likely chord
//! being played, updated many times per second. The engine is frame-driven
//! and synchronous: one `SpectralFrame` in, at most one `ChordEvent` out.
//! A CLI binary drives the same engine offline over audio files.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `audio`: Audio decoding (symphonia) and STFT framing for the offline driver
//! - `analysis`: Peak extraction, pitch classification, chroma folding,
//!   chord matching, temporal stabilization, and the sampling gate
//! - `engine`: The `ChordEngine` tying the stages together
//! - `pipeline`: Offline orchestration (decode -> frames -> engine -> timeline)
//! - `export`: JSON timeline output
//!
//! # Example
//!
//! ```no_run
//! use chordline::analysis::AnalysisConfig;
//! use chordline::engine::ChordEngine;
//! use chordline::types::SpectralFrame;
//!
//! let mut engine = ChordEngine::new(AnalysisConfig::default());
//! let frame = SpectralFrame::new(vec![0.0; 1024], 22050, 0.0);
//! if let Some(event) = engine.process(&frame) {
//!     println!("now playing: {}", event.name);
//! }
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod types;

// Re-export key types at crate root
pub use engine::ChordEngine;
pub use error::{ChordlineError, Result};
pub use types::{ChordCandidate, ChordEvent, ChromaVector, PitchClass, SpectralFrame};
