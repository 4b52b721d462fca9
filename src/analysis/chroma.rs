//! Chroma aggregation
//!
//! Folds a full magnitude spectrum into a 12-bin pitch-class energy vector,
//! bypassing discrete peak picking. Coarser than peak extraction but
//! phase-insensitive and robust to inharmonicity and dense spectra, at the
//! cost of per-note amplitude and octave detail.

use crate::analysis::config::AnalysisConfig;
use crate::analysis::pitch;
use crate::types::{ChromaVector, SpectralFrame};

/// Folds spectral frames into normalized chroma vectors
#[derive(Debug, Clone)]
pub struct ChromaAggregator {
    min_hz: f32,
    max_hz: f32,
}

impl ChromaAggregator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            min_hz: config.chroma_min_hz,
            max_hz: config.chroma_max_hz,
        }
    }

    /// Aggregate one frame into a max-normalized chroma vector.
    ///
    /// An all-zero spectrum (or one with no in-band energy) yields the
    /// all-zero vector; the caller treats that as silence.
    pub fn aggregate(&self, frame: &SpectralFrame) -> ChromaVector {
        let mut chroma = ChromaVector::zero();

        for (bin, &amplitude) in frame.bins.iter().enumerate() {
            if !(amplitude.is_finite() && amplitude > 0.0) {
                continue;
            }
            let freq = frame.bin_frequency(bin);
            if freq <= 0.0 || freq < self.min_hz || freq > self.max_hz {
                continue;
            }
            let midi = pitch::midi_number(freq).round() as i32;
            chroma.0[midi.rem_euclid(12) as usize] += amplitude;
        }

        chroma.normalized()
    }

    /// Fold only the bins of a frequency sub-band, for multi-band matching.
    /// The band replaces the configured range: a treble band above the
    /// whole-spectrum chroma ceiling is still folded when asked for.
    pub fn aggregate_band(&self, frame: &SpectralFrame, lo_hz: f32, hi_hz: f32) -> ChromaVector {
        let band = ChromaAggregator {
            min_hz: lo_hz,
            max_hz: hi_hz,
        };
        band.aggregate(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PitchClass;

    fn aggregator() -> ChromaAggregator {
        ChromaAggregator::new(&AnalysisConfig::default())
    }

    fn frame_with_tones(len: usize, sample_rate: u32, tones: &[(f32, f32)]) -> SpectralFrame {
        let mut bins = vec![0.0f32; len];
        for &(hz, amp) in tones {
            let bin = (hz * 2.0 * len as f32 / sample_rate as f32).round() as usize;
            bins[bin] += amp;
        }
        SpectralFrame::new(bins, sample_rate, 0.0)
    }

    #[test]
    fn test_silent_frame_folds_to_zero_vector() {
        let frame = SpectralFrame::new(vec![0.0; 2048], 44100, 0.0);
        assert!(aggregator().aggregate(&frame).is_silent());
    }

    #[test]
    fn test_triad_activates_its_pitch_classes() {
        // C3, E3, G3
        let frame = frame_with_tones(
            8192,
            44100,
            &[(130.81, 1.0), (164.81, 0.8), (196.0, 0.9)],
        );
        let chroma = aggregator().aggregate(&frame);
        let active = chroma.active_classes(0.5);
        assert!(active.contains(&PitchClass::C));
        assert!(active.contains(&PitchClass::E));
        assert!(active.contains(&PitchClass::G));
    }

    #[test]
    fn test_octaves_fold_to_one_pitch_class() {
        let frame = frame_with_tones(8192, 44100, &[(110.0, 0.5), (220.0, 0.5), (440.0, 0.5)]);
        let chroma = aggregator().aggregate(&frame);
        assert_eq!(chroma.0[PitchClass::A.to_index() as usize], 1.0);
        let active = chroma.active_classes(0.5);
        assert_eq!(active, vec![PitchClass::A]);
    }

    #[test]
    fn test_out_of_band_energy_is_ignored() {
        // 2 kHz is above the default 1 kHz chroma ceiling
        let frame = frame_with_tones(8192, 44100, &[(2000.0, 1.0)]);
        assert!(aggregator().aggregate(&frame).is_silent());
    }

    #[test]
    fn test_max_element_is_one_after_aggregation() {
        let frame = frame_with_tones(8192, 44100, &[(261.63, 0.3), (329.63, 0.2)]);
        let chroma = aggregator().aggregate(&frame);
        let max = chroma.0.iter().cloned().fold(0.0f32, f32::max);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_band_restricted_fold_excludes_other_bands() {
        let frame = frame_with_tones(8192, 44100, &[(110.0, 1.0), (660.0, 1.0)]);
        let bass = aggregator().aggregate_band(&frame, 0.0, 250.0);
        let active = bass.active_classes(0.5);
        assert_eq!(active, vec![PitchClass::A]);
    }
}
