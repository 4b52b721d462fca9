//! Core data types for chordline
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};

// =============================================================================
// Musical primitives
// =============================================================================

/// The 12 pitch classes in Western music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C#/Db
    D,
    Ds, // D#/Eb
    E,
    F,
    Fs, // F#/Gb
    G,
    Gs, // G#/Ab
    A,
    As, // A#/Bb
    B,
}

impl PitchClass {
    /// All 12 pitch classes in index order (0 = C, ..., 11 = B)
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Convert from numeric index (0 = C, 1 = C#, ..., 11 = B), wrapping mod 12
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 12) as usize]
    }

    /// Convert to numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn to_index(self) -> u8 {
        match self {
            PitchClass::C => 0,
            PitchClass::Cs => 1,
            PitchClass::D => 2,
            PitchClass::Ds => 3,
            PitchClass::E => 4,
            PitchClass::F => 5,
            PitchClass::Fs => 6,
            PitchClass::G => 7,
            PitchClass::Gs => 8,
            PitchClass::A => 9,
            PitchClass::As => 10,
            PitchClass::B => 11,
        }
    }

    /// Standard notation (e.g., "C", "F#", "A#")
    pub fn to_standard_notation(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Semitone distance from `root` up to `self`, in [0, 12)
    pub fn interval_from(self, root: PitchClass) -> u8 {
        (self.to_index() + 12 - root.to_index()) % 12
    }
}

/// A pitch-classified note derived from a detected fundamental
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchedNote {
    /// Pitch class (octave-independent)
    pub pitch_class: PitchClass,
    /// Octave in scientific pitch notation (A4 = 440 Hz is octave 4)
    pub octave: i32,
    /// The detected frequency this note was derived from
    pub frequency_hz: f32,
}

// =============================================================================
// Spectral input
// =============================================================================

/// One magnitude spectrum from the external capture boundary
///
/// Immutable once produced; one per analysis tick. Amplitudes are linear and
/// non-negative. `bins[i]` covers frequency `i * sample_rate / (2 * bins.len())`.
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    /// Per-bin magnitude, DC first
    pub bins: Vec<f32>,
    /// Sample rate of the source signal in Hz
    pub sample_rate: u32,
    /// Monotonic timestamp in milliseconds
    pub timestamp_ms: f64,
}

impl SpectralFrame {
    pub fn new(bins: Vec<f32>, sample_rate: u32, timestamp_ms: f64) -> Self {
        Self {
            bins,
            sample_rate,
            timestamp_ms,
        }
    }

    /// Center frequency of a bin in Hz
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / (2.0 * self.bins.len() as f32)
    }

    /// Root mean square of the bin magnitudes
    pub fn rms(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        (self.bins.iter().map(|b| b * b).sum::<f32>() / self.bins.len() as f32).sqrt()
    }
}

/// A local maximum in one spectral frame
///
/// A finite, re-derived set per frame, never accumulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    pub frequency_hz: f32,
    pub amplitude: f32,
    pub bin_index: usize,
    /// Amplitude above the higher of the two flanking local minima
    pub prominence: f32,
}

// =============================================================================
// Chroma
// =============================================================================

/// Octave-folded pitch-class energy distribution
///
/// Index = pitch class (0 = C). After normalization the max element is either
/// 0 (silence) or 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromaVector(pub [f32; 12]);

impl ChromaVector {
    pub fn zero() -> Self {
        Self([0.0; 12])
    }

    /// Normalize by the max element. Idempotent; all-zero stays all-zero.
    pub fn normalized(mut self) -> Self {
        let max = self.0.iter().cloned().fold(0.0f32, f32::max);
        if max > 0.0 {
            for v in &mut self.0 {
                *v /= max;
            }
        }
        self
    }

    pub fn is_silent(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    /// Pitch classes whose energy is at or above `threshold`
    pub fn active_classes(&self, threshold: f32) -> Vec<PitchClass> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, &v)| v >= threshold)
            .map(|(i, _)| PitchClass::from_index(i as u8))
            .collect()
    }

    /// Cosine similarity with another chroma vector; 0 if either is silent
    pub fn cosine_similarity(&self, other: &ChromaVector) -> f32 {
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let norm_a: f32 = self.0.iter().map(|a| a * a).sum::<f32>().sqrt();
        let norm_b: f32 = other.0.iter().map(|b| b * b).sum::<f32>().sqrt();
        if norm_a > 0.0 && norm_b > 0.0 {
            dot / (norm_a * norm_b)
        } else {
            0.0
        }
    }
}

// =============================================================================
// Chords
// =============================================================================

/// Chord qualities in the recognition vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Dominant7,
    Major7,
    Minor7,
    Sus2,
    Sus4,
    /// Fallback: a single pitch class reported when no chord qualifies
    SingleNote,
}

impl ChordQuality {
    /// Display suffix appended to the root name ("" for major, "m" for minor, ...)
    pub fn suffix(self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::SingleNote => "",
        }
    }
}

/// Frequency band tag for the multi-band matcher variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandTag {
    Bass,
    Mid,
    Treble,
}

/// One scored chord hypothesis, produced per analysis tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordCandidate {
    /// Display label, root + quality suffix (e.g. "C", "Am", "G7")
    pub name: String,
    pub root: PitchClass,
    pub quality: ChordQuality,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Pitch classes the candidate was derived from
    pub notes: Vec<PitchClass>,
    /// Set for sub-band candidates in multi-band mode
    pub band: Option<BandTag>,
}

impl ChordCandidate {
    pub fn new(root: PitchClass, quality: ChordQuality, confidence: f32) -> Self {
        Self {
            name: format!("{}{}", root.to_standard_notation(), quality.suffix()),
            root,
            quality,
            confidence,
            notes: Vec::new(),
            band: None,
        }
    }

    pub fn with_notes(mut self, notes: Vec<PitchClass>) -> Self {
        self.notes = notes;
        self
    }
}

/// A confirmed chord emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Display label of the confirmed chord
    pub name: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
    /// Pitch classes supporting the chord
    pub pitch_classes: Vec<PitchClass>,
    /// Frame timestamp the confirmation happened at, in milliseconds
    pub timestamp_ms: f64,
    /// Per-band sub-chords when multi-band matching produced a composite
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bands: Vec<ChordCandidate>,
}

// =============================================================================
// Audio buffer (offline driver input)
// =============================================================================

/// Decoded audio samples ready for spectral framing
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// =============================================================================
// Front-end selection
// =============================================================================

/// Pitch-information front end, selected at configuration time
///
/// Neither front end dominates in all signal conditions: peak picking keeps
/// per-note detail, chroma folding is robust to dense or inharmonic spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FrontEnd {
    /// Discrete peak picking with harmonic rejection
    Peaks,
    /// Octave-folded chroma aggregation
    Chroma,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_index_round_trip() {
        for i in 0..12u8 {
            assert_eq!(PitchClass::from_index(i).to_index(), i);
        }
    }

    #[test]
    fn test_interval_wraps_around_octave() {
        assert_eq!(PitchClass::C.interval_from(PitchClass::A), 3);
        assert_eq!(PitchClass::E.interval_from(PitchClass::C), 4);
        assert_eq!(PitchClass::C.interval_from(PitchClass::C), 0);
    }

    #[test]
    fn test_chroma_normalization_is_idempotent() {
        let mut raw = [0.0f32; 12];
        raw[0] = 2.0;
        raw[4] = 1.0;
        raw[7] = 1.5;
        let once = ChromaVector(raw).normalized();
        let twice = once.normalized();
        assert_eq!(once, twice);
        assert_eq!(once.0[0], 1.0);
    }

    #[test]
    fn test_chroma_normalization_keeps_silence_silent() {
        let silent = ChromaVector::zero().normalized();
        assert!(silent.is_silent());
    }

    #[test]
    fn test_candidate_name_includes_quality_suffix() {
        let c = ChordCandidate::new(PitchClass::A, ChordQuality::Minor, 0.9);
        assert_eq!(c.name, "Am");
        let g7 = ChordCandidate::new(PitchClass::G, ChordQuality::Dominant7, 0.8);
        assert_eq!(g7.name, "G7");
    }

    #[test]
    fn test_bin_frequency_matches_fft_layout() {
        let frame = SpectralFrame::new(vec![0.0; 1024], 44100, 0.0);
        assert!((frame.bin_frequency(1) - 21.53).abs() < 0.01);
        assert_eq!(frame.bin_frequency(0), 0.0);
    }
}
