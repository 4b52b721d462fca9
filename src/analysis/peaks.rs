//! Spectral peak and fundamental extraction
//!
//! Finds local maxima in a magnitude spectrum, filters them by amplitude,
//! band, and prominence, then greedily removes harmonic duplicates so only
//! plausible fundamentals remain. This is a heuristic DSP stage: dense
//! spectra with many true simultaneous fundamentals rely entirely on the
//! harmonic-rejection pass, with no correctness guarantee.

use crate::analysis::config::AnalysisConfig;
use crate::types::{SpectralFrame, SpectralPeak};
use tracing::trace;

/// Extracts candidate fundamental frequencies from spectral frames
#[derive(Debug, Clone)]
pub struct PeakExtractor {
    amplitude_threshold: f32,
    prominence_floor: f32,
    min_hz: f32,
    max_hz: f32,
    harmonic_tolerance: f32,
    max_fundamentals: usize,
}

impl PeakExtractor {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            amplitude_threshold: config.peak_amplitude_threshold,
            prominence_floor: config.peak_prominence_floor,
            min_hz: config.peak_min_hz,
            max_hz: config.peak_max_hz,
            harmonic_tolerance: config.harmonic_tolerance,
            max_fundamentals: config.max_fundamentals,
        }
    }

    /// Extract fundamentals from one frame, sorted ascending by frequency.
    ///
    /// An empty result means "no detection", not an error.
    pub fn extract(&self, frame: &SpectralFrame) -> Vec<SpectralPeak> {
        self.extract_in_band(frame, self.min_hz, self.max_hz)
    }

    /// Extract fundamentals restricted to a frequency sub-band. Harmonic
    /// rejection runs against the band's own candidates only, so a chord in
    /// one band is not swallowed as overtones of another band's notes.
    pub fn extract_in_band(&self, frame: &SpectralFrame, lo_hz: f32, hi_hz: f32) -> Vec<SpectralPeak> {
        let lo = lo_hz.max(self.min_hz);
        let hi = hi_hz.min(self.max_hz);
        let mut candidates = self.find_peaks(frame);
        candidates.retain(|p| p.frequency_hz >= lo && p.frequency_hz < hi);
        let fundamentals = self.reject_harmonics(candidates);
        trace!("extracted {} fundamentals in {:.0}-{:.0} Hz", fundamentals.len(), lo, hi);
        fundamentals
    }

    /// Local maxima above the amplitude threshold, band-limited, with
    /// sufficient prominence; sorted by amplitude descending.
    fn find_peaks(&self, frame: &SpectralFrame) -> Vec<SpectralPeak> {
        let bins = &frame.bins;
        if bins.len() < 5 {
            return Vec::new();
        }

        let mut peaks = Vec::new();
        for i in 2..bins.len() - 2 {
            let amp = bins[i];
            if !amp.is_finite() || amp <= self.amplitude_threshold {
                continue;
            }
            // 2-sided local maximum over a window of 2
            if amp <= bins[i - 1] || amp <= bins[i - 2] || amp <= bins[i + 1] || amp <= bins[i + 2]
            {
                continue;
            }

            let freq = frame.bin_frequency(i);
            if freq < self.min_hz || freq > self.max_hz {
                continue;
            }

            let left_min = bins[i - 1].min(bins[i - 2]);
            let right_min = bins[i + 1].min(bins[i + 2]);
            let prominence = amp - left_min.max(right_min);
            if prominence < self.prominence_floor {
                continue;
            }

            peaks.push(SpectralPeak {
                frequency_hz: freq,
                amplitude: amp,
                bin_index: i,
                prominence,
            });
        }

        peaks.sort_by(|a, b| {
            b.amplitude
                .partial_cmp(&a.amplitude)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        peaks
    }

    /// Greedily accept fundamentals from amplitude-sorted candidates,
    /// treating integer frequency ratios as harmonic duplicates and always
    /// preferring the lowest plausible fundamental of a harmonic family.
    fn reject_harmonics(&self, candidates: Vec<SpectralPeak>) -> Vec<SpectralPeak> {
        let mut fundamentals: Vec<SpectralPeak> = Vec::new();

        for candidate in candidates {
            if fundamentals.len() >= self.max_fundamentals {
                break;
            }

            let mut related_to: Option<usize> = None;
            for (idx, existing) in fundamentals.iter().enumerate() {
                if self.is_harmonic_pair(candidate.frequency_hz, existing.frequency_hz) {
                    related_to = Some(idx);
                    break;
                }
            }

            match related_to {
                Some(idx) if candidate.frequency_hz < fundamentals[idx].frequency_hz => {
                    // The quieter, lower peak is the more plausible fundamental
                    fundamentals[idx] = candidate;
                }
                Some(_) => {} // overtone of an accepted fundamental
                None => fundamentals.push(candidate),
            }
        }

        fundamentals.sort_by(|a, b| {
            a.frequency_hz
                .partial_cmp(&b.frequency_hz)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        fundamentals
    }

    /// True when the higher/lower frequency ratio is within tolerance of an
    /// integer (including 1: near-coincident peaks collapse to one)
    fn is_harmonic_pair(&self, a_hz: f32, b_hz: f32) -> bool {
        let (lo, hi) = if a_hz < b_hz { (a_hz, b_hz) } else { (b_hz, a_hz) };
        if lo <= 0.0 {
            return false;
        }
        let ratio = hi / lo;
        let nearest = ratio.round();
        nearest >= 1.0 && (ratio / nearest - 1.0).abs() <= self.harmonic_tolerance
    }
}
