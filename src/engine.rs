//! Chord recognition engine
//!
//! Owns every piece of mutable pipeline state and exposes the single
//! synchronous entry point: one spectral frame in, at most one chord event
//! out. Single-threaded and frame-driven; the cadence of ticks belongs to
//! the caller, all timing logic works off the frame timestamps.

use crate::analysis::chroma::ChromaAggregator;
use crate::analysis::config::AnalysisConfig;
use crate::analysis::matcher::{tag_band, ChordMatcher, MatchOutcome};
use crate::analysis::stabilizer::ChordStabilizer;
use crate::analysis::traits::{make_front_end, PitchFrontEnd, PitchInformation};
use crate::analysis::SamplingGate;
use crate::types::{BandTag, ChordCandidate, ChordEvent, ChromaVector, SpectralFrame};
use tracing::{debug, trace};

/// Sub-band edges for multi-band matching, in Hz
const BANDS: [(BandTag, f32, f32); 3] = [
    (BandTag::Bass, 20.0, 250.0),
    (BandTag::Mid, 250.0, 1000.0),
    (BandTag::Treble, 1000.0, 3000.0),
];

/// Cosine distance below which the spectrum counts as unchanged
const CHANGE_DISTANCE: f32 = 0.15;

/// Consecutive changed ticks required before the matcher is re-invoked
const CHANGE_RUN: u32 = 3;

/// The chord recognition pipeline behind one `process` call
pub struct ChordEngine {
    config: AnalysisConfig,
    front_end: Box<dyn PitchFrontEnd>,
    matcher: ChordMatcher,
    stabilizer: ChordStabilizer,
    gate: SamplingGate,

    /// Chroma fold used by the change gate, independent of the front end
    change_chroma: ChromaAggregator,
    /// Chroma at the last real matcher invocation
    reference_chroma: Option<ChromaVector>,
    changed_run: u32,
    /// Matcher output reused while the spectrum is quiescent
    cached: Option<TickOutcome>,
}

/// Matcher result of one sampled tick
#[derive(Debug, Clone, Default)]
struct TickOutcome {
    /// The candidate that votes (above the confidence gate)
    accepted: Option<ChordCandidate>,
    /// Per-band candidates in multi-band mode
    bands: Vec<ChordCandidate>,
}

impl ChordEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        let front_end = make_front_end(&config);
        debug!("chord engine using {} front end", front_end.name());
        Self {
            matcher: ChordMatcher::new(&config),
            stabilizer: ChordStabilizer::new(
                config.vote_window_ms,
                config.dominance_threshold,
                config.min_stability,
            ),
            gate: SamplingGate::new(&config),
            change_chroma: ChromaAggregator::new(&config),
            reference_chroma: None,
            changed_run: 0,
            cached: None,
            front_end,
            config,
        }
    }

    /// Process one frame. Returns a ChordEvent when the confirmed chord
    /// changes; `None` means "nothing new this tick" (skipped by the gate,
    /// no evidence, or the reported chord is unchanged). Never fails.
    pub fn process(&mut self, frame: &SpectralFrame) -> Option<ChordEvent> {
        if !self.gate.should_sample(frame) {
            return None;
        }

        let outcome = if self.matcher_due(frame) {
            let outcome = self.run_matcher(frame);
            self.cached = Some(outcome.clone());
            outcome
        } else {
            trace!("spectrum quiescent, reusing cached match");
            self.cached.clone().unwrap_or_default()
        };

        let vote = outcome.accepted.clone();
        let mut event = self.stabilizer.observe(vote, frame.timestamp_ms)?;
        if !outcome.bands.is_empty() {
            event.bands = outcome.bands;
        }
        Some(event)
    }

    /// Change gate: skip re-matching while the chroma stays within
    /// `CHANGE_DISTANCE` of the last matched frame. An optimization only;
    /// disabled together with the sampling gate.
    fn matcher_due(&mut self, frame: &SpectralFrame) -> bool {
        if !self.config.gate_enabled || self.cached.is_none() {
            return true;
        }
        let current = self.change_chroma.aggregate(frame);
        let Some(reference) = &self.reference_chroma else {
            return true;
        };

        let distance = 1.0 - current.cosine_similarity(reference);
        if distance > CHANGE_DISTANCE {
            self.changed_run += 1;
        } else {
            self.changed_run = 0;
        }
        self.changed_run >= CHANGE_RUN
    }

    fn run_matcher(&mut self, frame: &SpectralFrame) -> TickOutcome {
        self.reference_chroma = Some(self.change_chroma.aggregate(frame));
        self.changed_run = 0;

        if self.config.multi_band {
            self.run_matcher_multi_band(frame)
        } else {
            let info = self.front_end.extract(frame);
            let outcome = self.match_pitch_information(&info);
            TickOutcome {
                accepted: self.accept(outcome.best),
                bands: Vec::new(),
            }
        }
    }

    /// Match each frequency sub-band independently; the strongest band
    /// candidate votes, all qualifying bands ride along on the event.
    fn run_matcher_multi_band(&mut self, frame: &SpectralFrame) -> TickOutcome {
        let mut bands: Vec<ChordCandidate> = Vec::new();
        for &(tag, lo, hi) in &BANDS {
            let info = self.front_end.extract_band(frame, lo, hi);
            if info.is_empty() {
                continue;
            }
            if let Some(best) = self.match_pitch_information(&info).best {
                bands.push(tag_band(best, tag));
            }
        }

        let primary = bands
            .iter()
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .cloned();
        let bands = if bands.len() > 1 { bands } else { Vec::new() };

        TickOutcome {
            accepted: self.accept(primary),
            bands,
        }
    }

    fn match_pitch_information(&self, info: &PitchInformation) -> MatchOutcome {
        match info {
            PitchInformation::Notes(notes) => {
                let classes: Vec<_> = notes
                    .iter()
                    .map(|(note, strength)| (note.pitch_class, *strength))
                    .collect();
                self.matcher.match_notes(&classes)
            }
            PitchInformation::Chroma(chroma) => self
                .matcher
                .match_chroma(chroma, self.config.chroma_active_threshold),
        }
    }

    /// The confidence gate: only candidates at or above `min_confidence`
    /// cast stabilizer votes; weaker ones (including the single-note
    /// fallback) surface in diagnostics only.
    fn accept(&self, candidate: Option<ChordCandidate>) -> Option<ChordCandidate> {
        candidate.filter(|c| c.confidence >= self.config.min_confidence)
    }

    /// The chord currently reported downstream, if any
    pub fn current_chord(&self) -> Option<&str> {
        self.stabilizer.reported()
    }

    /// Current tempo estimate of the sampling gate in BPM
    pub fn bpm(&self) -> f64 {
        self.gate.bpm()
    }

    /// Reset all mutable state, as on stream start/stop or mode toggle
    pub fn reset(&mut self) {
        self.stabilizer.reset();
        self.gate.reset();
        self.reference_chroma = None;
        self.changed_run = 0;
        self.cached = None;
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrontEnd;

    /// Frame with tones at the given frequencies, all equal amplitude
    fn frame_with_tones(freqs: &[f32], amp: f32, t: f64) -> SpectralFrame {
        let len = 4096;
        let sample_rate = 44100;
        let mut bins = vec![0.0f32; len];
        for &hz in freqs {
            let bin = (hz * 2.0 * len as f32 / sample_rate as f32).round() as usize;
            bins[bin] = amp;
        }
        SpectralFrame::new(bins, sample_rate, t)
    }

    fn engine_without_gate(front_end: FrontEnd) -> ChordEngine {
        let config = AnalysisConfig {
            front_end,
            gate_enabled: false,
            ..AnalysisConfig::default()
        };
        ChordEngine::new(config)
    }

    const C_MAJOR: [f32; 3] = [261.63, 329.63, 392.0]; // C4 E4 G4
    const G_MAJOR: [f32; 3] = [196.0, 246.94, 293.66]; // G3 B3 D4

    #[test]
    fn test_sustained_triad_confirms_chord() {
        let mut engine = engine_without_gate(FrontEnd::Peaks);
        let mut confirmed = None;
        for tick in 0..10 {
            let frame = frame_with_tones(&C_MAJOR, 0.8, tick as f64 * 100.0);
            if let Some(event) = engine.process(&frame) {
                confirmed = Some(event);
            }
        }
        let event = confirmed.expect("C major should confirm");
        assert_eq!(event.name, "C");
        assert!(event.confidence >= 0.85);
        assert_eq!(engine.current_chord(), Some("C"));
    }

    #[test]
    fn test_chroma_front_end_confirms_chord() {
        let mut engine = engine_without_gate(FrontEnd::Chroma);
        let mut confirmed = None;
        for tick in 0..10 {
            let frame = frame_with_tones(&C_MAJOR, 0.8, tick as f64 * 100.0);
            if let Some(event) = engine.process(&frame) {
                confirmed = Some(event);
            }
        }
        assert_eq!(confirmed.expect("confirm").name, "C");
    }

    #[test]
    fn test_silent_stream_never_emits_or_panics() {
        let mut engine = engine_without_gate(FrontEnd::Peaks);
        for tick in 0..20 {
            let frame = SpectralFrame::new(vec![0.0; 4096], 44100, tick as f64 * 100.0);
            assert!(engine.process(&frame).is_none());
        }
        assert_eq!(engine.current_chord(), None);
    }

    #[test]
    fn test_chord_change_emits_second_event() {
        let mut engine = engine_without_gate(FrontEnd::Peaks);
        let mut t = 0.0;
        let mut events = Vec::new();
        for _ in 0..10 {
            if let Some(e) = engine.process(&frame_with_tones(&C_MAJOR, 0.8, t)) {
                events.push(e);
            }
            t += 100.0;
        }
        for _ in 0..20 {
            if let Some(e) = engine.process(&frame_with_tones(&G_MAJOR, 0.8, t)) {
                events.push(e);
            }
            t += 100.0;
        }
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "C");
        assert_eq!(events[1].name, "G");
    }

    #[test]
    fn test_silence_after_chord_decays_to_none() {
        let mut engine = engine_without_gate(FrontEnd::Peaks);
        let mut t = 0.0;
        for _ in 0..10 {
            engine.process(&frame_with_tones(&C_MAJOR, 0.8, t));
            t += 100.0;
        }
        assert_eq!(engine.current_chord(), Some("C"));

        // Sustained silence: the vote window empties and the chord decays
        for _ in 0..15 {
            engine.process(&SpectralFrame::new(vec![0.0; 4096], 44100, t));
            t += 100.0;
        }
        assert_eq!(engine.current_chord(), None);
    }

    #[test]
    fn test_reset_clears_reported_chord() {
        let mut engine = engine_without_gate(FrontEnd::Peaks);
        for tick in 0..10 {
            engine.process(&frame_with_tones(&C_MAJOR, 0.8, tick as f64 * 100.0));
        }
        assert!(engine.current_chord().is_some());
        engine.reset();
        assert_eq!(engine.current_chord(), None);
    }

    #[test]
    fn test_multi_band_event_carries_sub_chords() {
        let config = AnalysisConfig {
            gate_enabled: false,
            multi_band: true,
            ..AnalysisConfig::default()
        };
        let mut engine = ChordEngine::new(config);

        // A low triad in the bass band and a high one in the mid band
        let freqs = [
            110.0, 138.59, 164.81, // A2 C#3 E3 (bass)
            523.25, 659.26, 783.99, // C5 E5 G5 (mid)
        ];
        let mut confirmed = None;
        for tick in 0..10 {
            let frame = frame_with_tones(&freqs, 0.8, tick as f64 * 100.0);
            if let Some(event) = engine.process(&frame) {
                confirmed = Some(event);
            }
        }
        let event = confirmed.expect("composite event");
        assert!(event.bands.len() >= 2);
        assert!(event.bands.iter().any(|b| b.band == Some(BandTag::Bass)));
        assert!(event.bands.iter().any(|b| b.band == Some(BandTag::Mid)));
    }
}
