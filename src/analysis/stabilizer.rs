//! Temporal chord stabilization
//!
//! Smooths frame-to-frame matcher noise with a sliding voting window and
//! hysteresis. A chord change is only reported when a challenger dominates
//! the recent weighted votes AND has stayed on top for `min_stability`
//! ticks; single-frame outliers never flip the reported chord. Absence of
//! input stalls vote accumulation and the window empties, decaying the
//! stable chord back to silence.

use crate::types::{ChordCandidate, ChordEvent};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Stability counter ceiling; long-sustained chords stop counting here
const STABILITY_CAP: u32 = 20;

/// One weighted vote in the sliding window
#[derive(Debug, Clone)]
struct Vote {
    name: String,
    timestamp_ms: f64,
    weight: f32,
}

/// The stabilizer's externally visible state
///
/// `leading` is the chord currently winning the vote window (the Tentative
/// or Stable chord of the state machine); `reported` is what downstream
/// consumers last saw confirmed.
#[derive(Debug, Clone, Default)]
pub struct StableChordState {
    pub leading: Option<String>,
    pub confidence: f32,
    pub stability: u32,
    pub last_change_ms: f64,
    pub reported: Option<String>,
}

/// Sliding-window vote stabilizer
#[derive(Debug)]
pub struct ChordStabilizer {
    window_ms: f64,
    dominance_threshold: f32,
    min_stability: u32,
    votes: VecDeque<Vote>,
    /// Most recent candidate per chord name, for event payloads
    last_seen: HashMap<String, ChordCandidate>,
    state: StableChordState,
}

impl ChordStabilizer {
    pub fn new(window_ms: f64, dominance_threshold: f32, min_stability: u32) -> Self {
        Self {
            window_ms,
            dominance_threshold,
            min_stability,
            votes: VecDeque::new(),
            last_seen: HashMap::new(),
            state: StableChordState::default(),
        }
    }

    /// Record one tick. `candidate` is the matcher's accepted candidate for
    /// this tick, already filtered by the confidence gate; `None` means the
    /// tick produced no vote. Returns a ChordEvent when the confirmed chord
    /// changes.
    pub fn observe(
        &mut self,
        candidate: Option<ChordCandidate>,
        timestamp_ms: f64,
    ) -> Option<ChordEvent> {
        self.evict(timestamp_ms);

        if let Some(candidate) = candidate {
            self.votes.push_back(Vote {
                name: candidate.name.clone(),
                timestamp_ms,
                weight: candidate.confidence,
            });
            self.last_seen.insert(candidate.name.clone(), candidate);
        }

        let Some((best_name, best_weight, total_weight)) = self.tally() else {
            // Window emptied: decay back to no chord
            if self.state.leading.is_some() || self.state.reported.is_some() {
                debug!("vote window empty, decaying to no chord");
                self.state = StableChordState {
                    last_change_ms: timestamp_ms,
                    ..Default::default()
                };
            }
            return None;
        };

        let dominance = best_weight / total_weight;

        if self.state.leading.as_deref() == Some(best_name.as_str()) {
            self.state.stability = (self.state.stability + 1).min(STABILITY_CAP);
            self.state.confidence = self.state.confidence.max(best_weight_of_tick(
                &self.votes,
                &best_name,
                timestamp_ms,
            ));
        } else if dominance >= self.dominance_threshold {
            debug!(
                "leading chord {} -> {} (dominance {:.2})",
                self.state.leading.as_deref().unwrap_or("-"),
                best_name,
                dominance
            );
            self.state.leading = Some(best_name.clone());
            self.state.stability = 1;
            self.state.confidence = self
                .last_seen
                .get(&best_name)
                .map(|c| c.confidence)
                .unwrap_or(dominance);
            self.state.last_change_ms = timestamp_ms;
        }
        // Below-dominance challengers are recorded in the window only; the
        // previously stable chord keeps being reported unchanged.

        self.confirm(timestamp_ms)
    }

    /// Promote the leading chord to reported once it has held for
    /// `min_stability` ticks
    fn confirm(&mut self, timestamp_ms: f64) -> Option<ChordEvent> {
        let leading = self.state.leading.clone()?;
        if self.state.stability < self.min_stability {
            return None;
        }
        if self.state.reported.as_deref() == Some(leading.as_str()) {
            return None;
        }

        self.state.reported = Some(leading.clone());
        let candidate = self.last_seen.get(&leading);
        Some(ChordEvent {
            name: leading,
            confidence: self.state.confidence,
            pitch_classes: candidate.map(|c| c.notes.clone()).unwrap_or_default(),
            timestamp_ms,
            bands: Vec::new(),
        })
    }

    fn evict(&mut self, now_ms: f64) {
        let horizon = now_ms - self.window_ms;
        while let Some(front) = self.votes.front() {
            if front.timestamp_ms < horizon {
                self.votes.pop_front();
            } else {
                break;
            }
        }
    }

    /// Sum weights per chord name; returns (best name, best weight, total)
    fn tally(&self) -> Option<(String, f32, f32)> {
        if self.votes.is_empty() {
            return None;
        }
        let mut sums: HashMap<&str, f32> = HashMap::new();
        let mut total = 0.0f32;
        for vote in &self.votes {
            *sums.entry(vote.name.as_str()).or_insert(0.0) += vote.weight;
            total += vote.weight;
        }
        let (name, weight) = sums
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;
        Some((name.to_string(), weight, total))
    }

    /// The chord currently reported downstream, if any
    pub fn reported(&self) -> Option<&str> {
        self.state.reported.as_deref()
    }

    pub fn state(&self) -> &StableChordState {
        &self.state
    }

    /// Reset on stream start/stop or mode toggle
    pub fn reset(&mut self) {
        self.votes.clear();
        self.last_seen.clear();
        self.state = StableChordState::default();
    }
}

/// The strongest single vote this tick cast for `name`, as the confidence
/// floor-raiser for a sustained chord
fn best_weight_of_tick(votes: &VecDeque<Vote>, name: &str, timestamp_ms: f64) -> f32 {
    votes
        .iter()
        .rev()
        .take_while(|v| v.timestamp_ms >= timestamp_ms)
        .filter(|v| v.name == name)
        .map(|v| v.weight)
        .fold(0.0, f32::max)
}
