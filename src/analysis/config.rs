//! Configuration parameters for chord analysis
//!
//! Every empirically-tuned threshold in the pipeline is a field here rather
//! than a hard-coded constant; the source material disagrees on the exact
//! values, so they are caller-tunable with documented defaults.

use crate::types::FrontEnd;

/// Analysis configuration parameters
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    // Front end
    /// Pitch-information front end (default: Peaks)
    pub front_end: FrontEnd,

    // Peak extraction
    /// Absolute amplitude a bin must exceed to be a peak candidate
    /// (default: 0.02; lower values trade false positives for sensitivity)
    pub peak_amplitude_threshold: f32,

    /// Minimum prominence above the flanking local minima (default: 0.01)
    pub peak_prominence_floor: f32,

    /// Musical band accepted by the peak extractor in Hz (default: 60-3000)
    pub peak_min_hz: f32,
    pub peak_max_hz: f32,

    /// Relative error tolerance when testing a frequency ratio against an
    /// integer harmonic (default: 0.08; source variants use 0.05-0.15)
    pub harmonic_tolerance: f32,

    /// Maximum fundamentals retained per frame (default: 6, range 6-8)
    pub max_fundamentals: usize,

    // Chroma aggregation
    /// Band folded into the chroma vector in Hz (default: 65-1000)
    pub chroma_min_hz: f32,
    pub chroma_max_hz: f32,

    /// Normalized chroma energy at or above which a pitch class counts as
    /// active for set-based matching (default: 0.5)
    pub chroma_active_threshold: f32,

    // Matching
    /// Minimum confidence for a candidate to cast a stabilizer vote
    /// (default: 0.75)
    pub min_confidence: f32,

    /// Enable the partial set-match strategy (default: true)
    pub partial_match_enabled: bool,

    /// Match the frame per frequency sub-band (bass/mid/treble) instead of
    /// whole-spectrum (default: false)
    pub multi_band: bool,

    // Stabilization
    /// Sliding vote window in milliseconds (default: 800, range 500-1000)
    pub vote_window_ms: f64,

    /// Dominance ratio a challenger needs to replace the stable chord
    /// (default: 0.6)
    pub dominance_threshold: f32,

    /// Favorable ticks before a chord is reported as confirmed (default: 5)
    pub min_stability: u32,

    // Sampling gate
    /// Run the onset/beat sampling gate; when false the matcher runs every
    /// frame (default: true)
    pub gate_enabled: bool,

    /// Normalized spectral-flux threshold for onset firing (default: 0.12)
    pub flux_threshold: f32,

    /// Minimum time between onsets in milliseconds (default: 50)
    pub onset_cooldown_ms: f64,

    /// RMS floor for beat-tracking energy crossings (default: 0.05)
    pub beat_rms_floor: f32,

    /// Refractory period between beat events in milliseconds (default: 250)
    pub beat_refractory_ms: f64,

    /// Trailing window of beat events kept for tempo estimation in
    /// milliseconds (default: 5000, range 4000-6000)
    pub beat_window_ms: f64,

    /// Fixed polling interval used when no tempo is known, in milliseconds
    /// (default: 500)
    pub fallback_poll_ms: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            front_end: FrontEnd::Peaks,
            peak_amplitude_threshold: 0.02,
            peak_prominence_floor: 0.01,
            peak_min_hz: 60.0,
            peak_max_hz: 3000.0,
            harmonic_tolerance: 0.08,
            max_fundamentals: 6,
            chroma_min_hz: 65.0,
            chroma_max_hz: 1000.0,
            chroma_active_threshold: 0.5,
            min_confidence: 0.75,
            partial_match_enabled: true,
            multi_band: false,
            vote_window_ms: 800.0,
            dominance_threshold: 0.6,
            min_stability: 5,
            gate_enabled: true,
            flux_threshold: 0.12,
            onset_cooldown_ms: 50.0,
            beat_rms_floor: 0.05,
            beat_refractory_ms: 250.0,
            beat_window_ms: 5000.0,
            fallback_poll_ms: 500.0,
        }
    }
}
