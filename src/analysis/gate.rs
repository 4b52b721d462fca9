//! Onset/beat sampling gate
//!
//! Bounds the matcher's invocation rate without missing chord changes. The
//! matcher runs when a spectral-flux onset fires, when the beat-derived
//! sampling interval elapses, or (with no usable tempo) when the fixed
//! polling interval elapses.

use crate::analysis::config::AnalysisConfig;
use crate::types::SpectralFrame;
use std::collections::VecDeque;
use tracing::trace;

/// Tempo clamp range in BPM
const BPM_MIN: f64 = 40.0;
const BPM_MAX: f64 = 200.0;

/// Tempo used when beat tracking has gone stale
const BPM_DEFAULT: f64 = 120.0;

/// Beat silence after which the tempo estimate is discarded
const BEAT_STALE_MS: f64 = 2500.0;

/// Decides which frames are worth matching
#[derive(Debug)]
pub struct SamplingGate {
    enabled: bool,
    flux_threshold: f32,
    onset_cooldown_ms: f64,
    rms_floor: f32,
    refractory_ms: f64,
    beat_window_ms: f64,
    fallback_poll_ms: f64,

    prev_bins: Option<Vec<f32>>,
    last_onset_ms: Option<f64>,
    beat_events: VecDeque<f64>,
    last_beat_ms: Option<f64>,
    last_sample_ms: Option<f64>,
    bpm: f64,
}

impl SamplingGate {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            enabled: config.gate_enabled,
            flux_threshold: config.flux_threshold,
            onset_cooldown_ms: config.onset_cooldown_ms,
            rms_floor: config.beat_rms_floor,
            refractory_ms: config.beat_refractory_ms,
            beat_window_ms: config.beat_window_ms,
            fallback_poll_ms: config.fallback_poll_ms,
            prev_bins: None,
            last_onset_ms: None,
            beat_events: VecDeque::new(),
            last_beat_ms: None,
            last_sample_ms: None,
            bpm: BPM_DEFAULT,
        }
    }

    /// Inspect one frame and decide whether the matcher should run on it
    pub fn should_sample(&mut self, frame: &SpectralFrame) -> bool {
        if !self.enabled {
            return true;
        }
        let now = frame.timestamp_ms;

        let onset = self.detect_onset(frame, now);
        self.track_beat(frame, now);

        let interval = self.sampling_interval_ms(now);
        let due = match self.last_sample_ms {
            Some(last) => now - last >= interval,
            None => true,
        };

        let sample = onset || due;
        if sample {
            self.last_sample_ms = Some(now);
        }
        sample
    }

    /// Positive-only spectral flux vs. the previous frame, normalized by
    /// bin count; fires subject to the onset cooldown
    fn detect_onset(&mut self, frame: &SpectralFrame, now: f64) -> bool {
        let flux = match &self.prev_bins {
            Some(prev) if prev.len() == frame.bins.len() && !frame.bins.is_empty() => {
                let rise: f32 = frame
                    .bins
                    .iter()
                    .zip(prev.iter())
                    .map(|(cur, old)| (cur - old).max(0.0))
                    .sum();
                rise / frame.bins.len() as f32
            }
            _ => 0.0,
        };
        self.prev_bins = Some(frame.bins.clone());

        if flux <= self.flux_threshold {
            return false;
        }
        let cooled = match self.last_onset_ms {
            Some(last) => now - last >= self.onset_cooldown_ms,
            None => true,
        };
        if cooled {
            trace!("onset fired (flux {:.3})", flux);
            self.last_onset_ms = Some(now);
        }
        cooled
    }

    /// Track energy-threshold crossings and refresh the tempo estimate from
    /// the median of consecutive beat intervals
    fn track_beat(&mut self, frame: &SpectralFrame, now: f64) {
        if frame.rms() > self.rms_floor {
            let refractory_over = match self.last_beat_ms {
                Some(last) => now - last >= self.refractory_ms,
                None => true,
            };
            if refractory_over {
                self.beat_events.push_back(now);
                self.last_beat_ms = Some(now);
            }
        }

        let horizon = now - self.beat_window_ms;
        while let Some(&front) = self.beat_events.front() {
            if front < horizon {
                self.beat_events.pop_front();
            } else {
                break;
            }
        }

        let timestamps: Vec<f64> = self.beat_events.iter().copied().collect();
        if let Some(bpm) = median_interval_bpm(&timestamps) {
            self.bpm = bpm;
        }
    }

    /// The beat-derived interval while tempo is fresh, else fixed polling
    fn sampling_interval_ms(&mut self, now: f64) -> f64 {
        match self.last_beat_ms {
            Some(last) if now - last <= BEAT_STALE_MS => 60_000.0 / self.bpm,
            _ => {
                self.bpm = BPM_DEFAULT;
                self.fallback_poll_ms
            }
        }
    }

    /// Current tempo estimate in BPM
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn reset(&mut self) {
        self.prev_bins = None;
        self.last_onset_ms = None;
        self.beat_events.clear();
        self.last_beat_ms = None;
        self.last_sample_ms = None;
        self.bpm = BPM_DEFAULT;
    }
}

/// BPM from the median consecutive interval of beat timestamps, clamped to
/// [40, 200]. The median (not mean) keeps a single missed or spurious beat
/// from skewing the estimate. Returns None for fewer than two timestamps.
pub fn median_interval_bpm(timestamps_ms: &[f64]) -> Option<f64> {
    if timestamps_ms.len() < 2 {
        return None;
    }
    let mut sorted = timestamps_ms.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut intervals: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    intervals.retain(|&i| i > 0.0);
    if intervals.is_empty() {
        return None;
    }
    intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] + intervals[mid]) / 2.0
    } else {
        intervals[mid]
    };

    Some((60_000.0 / median).clamp(BPM_MIN, BPM_MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> SamplingGate {
        SamplingGate::new(&AnalysisConfig::default())
    }

    fn quiet_frame(t: f64) -> SpectralFrame {
        SpectralFrame::new(vec![0.0; 256], 44100, t)
    }

    fn loud_frame(t: f64) -> SpectralFrame {
        SpectralFrame::new(vec![0.5; 256], 44100, t)
    }

    #[test]
    fn test_median_bpm_is_robust_to_one_outlier() {
        // One spurious short gap must not skew the estimate off 120 BPM
        let bpm = median_interval_bpm(&[0.0, 500.0, 1000.0, 1520.0, 1500.0]).unwrap();
        assert!((bpm - 120.0).abs() < 1.0, "got {bpm}");
    }

    #[test]
    fn test_median_bpm_clamps_extremes() {
        assert_eq!(median_interval_bpm(&[0.0, 10.0]).unwrap(), BPM_MAX);
        assert_eq!(median_interval_bpm(&[0.0, 10_000.0]).unwrap(), BPM_MIN);
    }

    #[test]
    fn test_median_bpm_needs_two_events() {
        assert!(median_interval_bpm(&[]).is_none());
        assert!(median_interval_bpm(&[100.0]).is_none());
    }

    #[test]
    fn test_disabled_gate_samples_every_frame() {
        let mut config = AnalysisConfig::default();
        config.gate_enabled = false;
        let mut gate = SamplingGate::new(&config);
        for tick in 0..20 {
            assert!(gate.should_sample(&quiet_frame(tick as f64 * 16.0)));
        }
    }

    #[test]
    fn test_first_frame_always_samples() {
        assert!(gate().should_sample(&quiet_frame(0.0)));
    }

    #[test]
    fn test_quiet_stream_falls_back_to_fixed_polling() {
        let mut gate = gate();
        assert!(gate.should_sample(&quiet_frame(0.0)));
        // 16 ms frame cadence: nothing due before the 500 ms fallback poll
        let mut sampled = Vec::new();
        for tick in 1..40 {
            let t = tick as f64 * 16.0;
            if gate.should_sample(&quiet_frame(t)) {
                sampled.push(t);
            }
        }
        assert_eq!(sampled.len(), 1);
        assert!(sampled[0] >= 500.0);
    }

    #[test]
    fn test_onset_fires_on_energy_rise() {
        let mut gate = gate();
        gate.should_sample(&quiet_frame(0.0));
        gate.should_sample(&quiet_frame(16.0));
        // Sudden broadband rise well above the flux threshold
        assert!(gate.should_sample(&loud_frame(32.0)));
    }

    #[test]
    fn test_onset_cooldown_suppresses_double_fire() {
        let mut gate = gate();
        gate.should_sample(&quiet_frame(0.0));
        assert!(gate.should_sample(&loud_frame(16.0)));
        // Another rise inside the 50 ms cooldown: flux alone must not sample
        let mut hotter = loud_frame(32.0);
        for bin in hotter.bins.iter_mut() {
            *bin = 1.0;
        }
        assert!(!gate.should_sample(&hotter));
    }

    #[test]
    fn test_beat_cadence_drives_sampling_interval() {
        let mut gate = gate();
        // Loud pulses every 500 ms with quiet frames between build a 120 BPM
        // estimate
        let mut t = 0.0;
        for _ in 0..8 {
            gate.should_sample(&loud_frame(t));
            for k in 1..31 {
                gate.should_sample(&quiet_frame(t + k as f64 * 16.0));
            }
            t += 500.0;
        }
        assert!((gate.bpm() - 120.0).abs() < 10.0, "bpm {}", gate.bpm());
    }
}
