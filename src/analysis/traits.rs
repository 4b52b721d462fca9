//! Analysis trait abstractions
//!
//! The front-end trait makes the two pitch-information strategies
//! interchangeable behind one interface. Which one runs is decided at
//! configuration time, never inferred from the data at runtime.

use crate::analysis::chroma::ChromaAggregator;
use crate::analysis::config::AnalysisConfig;
use crate::analysis::peaks::PeakExtractor;
use crate::types::{ChromaVector, FrontEnd, PitchedNote, SpectralFrame};

use crate::analysis::pitch;

/// Pitch information extracted from one frame, in either representation
#[derive(Debug, Clone)]
pub enum PitchInformation {
    /// Discrete notes with detection strengths, frequency ascending
    Notes(Vec<(PitchedNote, f32)>),
    /// Octave-folded normalized energy
    Chroma(ChromaVector),
}

impl PitchInformation {
    /// True when the frame carried no usable pitch evidence
    pub fn is_empty(&self) -> bool {
        match self {
            PitchInformation::Notes(notes) => notes.is_empty(),
            PitchInformation::Chroma(chroma) => chroma.is_silent(),
        }
    }
}

/// A pitch-information front end
pub trait PitchFrontEnd: Send + Sync {
    /// Extract pitch information from one full frame
    fn extract(&self, frame: &SpectralFrame) -> PitchInformation;

    /// Extract pitch information restricted to a frequency sub-band
    fn extract_band(&self, frame: &SpectralFrame, lo_hz: f32, hi_hz: f32) -> PitchInformation;

    /// Get the name of this front end (for logging)
    fn name(&self) -> &'static str;
}

/// Peak-picking front end: fundamentals classified into notes
pub struct PeakFrontEnd {
    extractor: PeakExtractor,
}

impl PeakFrontEnd {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            extractor: PeakExtractor::new(config),
        }
    }
}

impl PitchFrontEnd for PeakFrontEnd {
    fn extract(&self, frame: &SpectralFrame) -> PitchInformation {
        let notes = self
            .extractor
            .extract(frame)
            .into_iter()
            .map(|peak| (pitch::classify(peak.frequency_hz), peak.amplitude))
            .collect();
        PitchInformation::Notes(notes)
    }

    fn extract_band(&self, frame: &SpectralFrame, lo_hz: f32, hi_hz: f32) -> PitchInformation {
        let notes = self
            .extractor
            .extract_in_band(frame, lo_hz, hi_hz)
            .into_iter()
            .map(|peak| (pitch::classify(peak.frequency_hz), peak.amplitude))
            .collect();
        PitchInformation::Notes(notes)
    }

    fn name(&self) -> &'static str {
        "peaks"
    }
}

/// Chroma-folding front end
pub struct ChromaFrontEnd {
    aggregator: ChromaAggregator,
}

impl ChromaFrontEnd {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            aggregator: ChromaAggregator::new(config),
        }
    }
}

impl PitchFrontEnd for ChromaFrontEnd {
    fn extract(&self, frame: &SpectralFrame) -> PitchInformation {
        PitchInformation::Chroma(self.aggregator.aggregate(frame))
    }

    fn extract_band(&self, frame: &SpectralFrame, lo_hz: f32, hi_hz: f32) -> PitchInformation {
        PitchInformation::Chroma(self.aggregator.aggregate_band(frame, lo_hz, hi_hz))
    }

    fn name(&self) -> &'static str {
        "chroma"
    }
}

/// Build the configured front end
pub fn make_front_end(config: &AnalysisConfig) -> Box<dyn PitchFrontEnd> {
    match config.front_end {
        FrontEnd::Peaks => Box::new(PeakFrontEnd::new(config)),
        FrontEnd::Chroma => Box::new(ChromaFrontEnd::new(config)),
    }
}
