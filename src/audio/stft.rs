//! STFT frame source
//!
//! Turns a decoded audio buffer into the stream of magnitude spectra the
//! engine consumes, one Hann-windowed 2048-point FFT per hop.

use crate::types::{AudioBuffer, SpectralFrame};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT window length in samples
pub const FFT_SIZE: usize = 2048;

/// Hop between consecutive frames in samples
pub const HOP_SIZE: usize = 1024;

/// Iterator of spectral frames over an audio buffer
pub struct SpectralFrames<'a> {
    samples: &'a [f32],
    sample_rate: u32,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    pos: usize,
}

impl<'a> SpectralFrames<'a> {
    pub fn new(buffer: &'a AudioBuffer) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            samples: &buffer.samples,
            sample_rate: buffer.sample_rate,
            window: hann_window(FFT_SIZE),
            fft: planner.plan_fft_forward(FFT_SIZE),
            pos: 0,
        }
    }

    /// Total number of frames this source will yield
    pub fn frame_count(&self) -> usize {
        if self.samples.len() < FFT_SIZE {
            0
        } else {
            (self.samples.len() - FFT_SIZE) / HOP_SIZE + 1
        }
    }
}

impl Iterator for SpectralFrames<'_> {
    type Item = SpectralFrame;

    fn next(&mut self) -> Option<SpectralFrame> {
        if self.pos + FFT_SIZE > self.samples.len() {
            return None;
        }

        let mut buffer: Vec<Complex<f32>> = self.samples[self.pos..self.pos + FFT_SIZE]
            .iter()
            .enumerate()
            .map(|(i, &s)| Complex::new(s * self.window[i], 0.0))
            .collect();
        self.fft.process(&mut buffer);

        // Normalize magnitudes by half the window length so a full-scale
        // sine lands near 1.0 regardless of FFT size
        let scale = 2.0 / FFT_SIZE as f32;
        let bins: Vec<f32> = buffer[..FFT_SIZE / 2].iter().map(|c| c.norm() * scale).collect();

        let timestamp_ms = self.pos as f64 / self.sample_rate as f64 * 1000.0;
        self.pos += HOP_SIZE;

        Some(SpectralFrame::new(bins, self.sample_rate, timestamp_ms))
    }
}

fn hann_window(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine_buffer(freq: f32, duration_secs: f32, sample_rate: u32) -> AudioBuffer {
        let n = (duration_secs * sample_rate as f32) as usize;
        let samples = (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.8)
            .collect();
        AudioBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_too_short_buffer_yields_no_frames() {
        let buffer = AudioBuffer::new(vec![0.0; FFT_SIZE - 1], 22050);
        let mut frames = SpectralFrames::new(&buffer);
        assert_eq!(frames.frame_count(), 0);
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_frame_count_matches_iteration() {
        let buffer = sine_buffer(440.0, 1.0, 22050);
        let frames = SpectralFrames::new(&buffer);
        let expected = frames.frame_count();
        assert_eq!(frames.count(), expected);
    }

    #[test]
    fn test_sine_peaks_at_its_own_bin() {
        let buffer = sine_buffer(440.0, 1.0, 22050);
        let frame = SpectralFrames::new(&buffer).nth(3).expect("frame");

        let (peak_bin, _) = frame
            .bins
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        let peak_freq = frame.bin_frequency(peak_bin);
        assert!((peak_freq - 440.0).abs() < 22.0, "peaked at {peak_freq}");
    }

    #[test]
    fn test_timestamps_advance_by_hop() {
        let buffer = sine_buffer(440.0, 1.0, 22050);
        let frames: Vec<_> = SpectralFrames::new(&buffer).take(3).collect();
        let hop_ms = HOP_SIZE as f64 / 22050.0 * 1000.0;
        assert_eq!(frames[0].timestamp_ms, 0.0);
        assert!((frames[1].timestamp_ms - hop_ms).abs() < 1e-6);
        assert!((frames[2].timestamp_ms - 2.0 * hop_ms).abs() < 1e-6);
    }
}
