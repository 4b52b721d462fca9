//! Chord matching
//!
//! Scores a set of active pitch classes (or a chroma vector) against the
//! vocabulary. Strategies are tried in priority order, first success wins:
//!
//! 1. exact unordered-set lookup
//! 2. root-relative interval-pattern match
//! 3. partial set match
//! 4. chroma template cosine similarity (chroma front end only)
//! 5. strongest-single-note fallback
//!
//! Ambiguous audio degrades to the fallback; the matcher never fails hard.

use crate::analysis::config::AnalysisConfig;
use crate::analysis::vocabulary::{ChordVocabulary, VocabularyChord};
use crate::types::{BandTag, ChordCandidate, ChordQuality, ChromaVector, PitchClass};

/// Fraction of a pattern's intervals that must be present for an
/// interval-pattern match
const PATTERN_COVERAGE: f32 = 0.75;

/// Confidence of the single-note fallback
const FALLBACK_CONFIDENCE: f32 = 0.35;

/// Cap applied to chroma-similarity confidence
const CHROMA_CONFIDENCE_CAP: f32 = 0.95;

/// Matcher result: the best candidate plus the ranked list behind it
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub best: Option<ChordCandidate>,
    /// Qualifying candidates of the winning strategy, confidence descending
    pub ranked: Vec<ChordCandidate>,
}

impl MatchOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn single(candidate: ChordCandidate) -> Self {
        Self {
            best: Some(candidate.clone()),
            ranked: vec![candidate],
        }
    }
}

/// Scores pitch-class evidence against the chord vocabulary
#[derive(Debug)]
pub struct ChordMatcher {
    vocab: ChordVocabulary,
    min_confidence: f32,
    partial_enabled: bool,
}

impl ChordMatcher {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            vocab: ChordVocabulary::new(),
            min_confidence: config.min_confidence,
            partial_enabled: config.partial_match_enabled,
        }
    }

    /// Match a list of (pitch class, strength) pairs in supply order.
    ///
    /// Fewer than two distinct pitch classes is insufficient evidence and
    /// yields no candidate at all (not even the fallback).
    pub fn match_notes(&self, notes: &[(PitchClass, f32)]) -> MatchOutcome {
        let merged = merge_notes(notes);
        if merged.len() < 2 {
            return MatchOutcome::none();
        }
        let classes: Vec<PitchClass> = merged.iter().map(|(c, _)| *c).collect();

        if let Some(outcome) = self.exact_match(&classes) {
            return outcome;
        }
        if let Some(outcome) = self.interval_pattern_match(&classes) {
            return outcome;
        }
        if self.partial_enabled {
            if let Some(outcome) = self.partial_match(&classes) {
                return outcome;
            }
        }
        self.fallback(&merged)
    }

    /// Match a normalized chroma vector (chroma front end).
    ///
    /// The set strategies run on the dominant pitch classes first; the
    /// template-similarity strategy only applies here.
    pub fn match_chroma(&self, chroma: &ChromaVector, active_threshold: f32) -> MatchOutcome {
        let dominant = dominant_classes(chroma, active_threshold);
        if dominant.len() < 2 {
            return MatchOutcome::none();
        }
        let classes: Vec<PitchClass> = dominant.iter().map(|(c, _)| *c).collect();

        if let Some(outcome) = self.exact_match(&classes) {
            return outcome;
        }
        if let Some(outcome) = self.interval_pattern_match(&classes) {
            return outcome;
        }
        if self.partial_enabled {
            if let Some(outcome) = self.partial_match(&classes) {
                return outcome;
            }
        }
        if let Some(outcome) = self.chroma_template_match(chroma, &classes) {
            return outcome;
        }
        self.fallback(&dominant)
    }

    /// Strategy 1: the unique sorted pitch-class set, looked up verbatim
    fn exact_match(&self, classes: &[PitchClass]) -> Option<MatchOutcome> {
        let chord = self.vocab.lookup_exact(classes)?;
        let candidate = ChordCandidate::new(chord.root, chord.quality, chord.base_confidence)
            .with_notes(classes.to_vec());
        Some(MatchOutcome::single(candidate))
    }

    /// Strategy 2: every supplied pitch class as candidate root, compared
    /// against each vocabulary interval pattern; roots iterated in supply
    /// order, first qualifying match wins.
    fn interval_pattern_match(&self, classes: &[PitchClass]) -> Option<MatchOutcome> {
        let mut qualifying = Vec::new();
        let mut best: Option<ChordCandidate> = None;

        for &root in classes {
            let intervals: Vec<u8> = classes.iter().map(|c| c.interval_from(root)).collect();

            for pattern in self.vocab.patterns() {
                let present = pattern
                    .intervals
                    .iter()
                    .filter(|off| intervals.contains(*off))
                    .count();
                let fraction = present as f32 / pattern.intervals.len() as f32;
                if fraction >= PATTERN_COVERAGE {
                    let candidate = ChordCandidate::new(
                        root,
                        pattern.quality,
                        pattern.base_confidence * fraction,
                    )
                    .with_notes(classes.to_vec());
                    if best.is_none() {
                        best = Some(candidate.clone());
                    }
                    qualifying.push(candidate);
                }
            }
        }

        let best = best?;
        qualifying.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Some(MatchOutcome {
            best: Some(best),
            ranked: qualifying,
        })
    }

    /// Strategy 3: overlap with each vocabulary chord; 2 of 3 notes for
    /// triads, 3 of 4 for sevenths.
    fn partial_match(&self, classes: &[PitchClass]) -> Option<MatchOutcome> {
        let mut qualifying: Vec<ChordCandidate> = Vec::new();

        for chord in self.vocab.chords() {
            let overlap = chord
                .classes
                .iter()
                .filter(|c| classes.contains(*c))
                .count();
            let size = chord.classes.len();
            let required = if size >= 4 { 3 } else { 2 };
            if overlap < required {
                continue;
            }
            let confidence = chord.base_confidence * 0.7 * (overlap as f32 / size as f32);
            qualifying.push(
                ChordCandidate::new(chord.root, chord.quality, confidence)
                    .with_notes(classes.to_vec()),
            );
        }

        if qualifying.is_empty() {
            return None;
        }
        qualifying.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Some(MatchOutcome {
            best: Some(qualifying[0].clone()),
            ranked: qualifying,
        })
    }

    /// Strategy 4: cosine similarity against each chord's binary template,
    /// blended with the note-overlap ratio and gated at `min_confidence`.
    fn chroma_template_match(
        &self,
        chroma: &ChromaVector,
        classes: &[PitchClass],
    ) -> Option<MatchOutcome> {
        let mut qualifying: Vec<ChordCandidate> = Vec::new();

        for chord in self.vocab.chords() {
            let confidence = self.template_confidence(chroma, classes, chord);
            if confidence >= self.min_confidence {
                qualifying.push(
                    ChordCandidate::new(chord.root, chord.quality, confidence)
                        .with_notes(classes.to_vec()),
                );
            }
        }

        if qualifying.is_empty() {
            return None;
        }
        qualifying.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Some(MatchOutcome {
            best: Some(qualifying[0].clone()),
            ranked: qualifying,
        })
    }

    fn template_confidence(
        &self,
        chroma: &ChromaVector,
        classes: &[PitchClass],
        chord: &VocabularyChord,
    ) -> f32 {
        let chroma_match = chroma.cosine_similarity(&chord.template);
        let overlap = chord
            .classes
            .iter()
            .filter(|c| classes.contains(*c))
            .count();
        let note_match = overlap as f32 / chord.classes.len() as f32;
        (0.7 * chroma_match + 0.3 * note_match).min(CHROMA_CONFIDENCE_CAP)
    }

    /// Strategy 5: report the strongest detected note as a bare pitch-class
    /// "chord" carrying the full note set, at low fixed confidence.
    fn fallback(&self, notes: &[(PitchClass, f32)]) -> MatchOutcome {
        let strongest = notes
            .iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        match strongest {
            Some(&(class, _)) => {
                let candidate =
                    ChordCandidate::new(class, ChordQuality::SingleNote, FALLBACK_CONFIDENCE)
                        .with_notes(notes.iter().map(|(c, _)| *c).collect());
                MatchOutcome::single(candidate)
            }
            None => MatchOutcome::none(),
        }
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }
}

/// Tag a candidate with the sub-band it was matched in
pub fn tag_band(mut candidate: ChordCandidate, band: BandTag) -> ChordCandidate {
    candidate.band = Some(band);
    candidate
}

/// Merge duplicate pitch classes, preserving first-encounter order and
/// summing strengths
fn merge_notes(notes: &[(PitchClass, f32)]) -> Vec<(PitchClass, f32)> {
    let mut merged: Vec<(PitchClass, f32)> = Vec::new();
    for &(class, strength) in notes {
        match merged.iter_mut().find(|(c, _)| *c == class) {
            Some(entry) => entry.1 += strength,
            None => merged.push((class, strength)),
        }
    }
    merged
}

/// Active pitch classes of a chroma vector, energy descending
fn dominant_classes(chroma: &ChromaVector, threshold: f32) -> Vec<(PitchClass, f32)> {
    let mut active: Vec<(PitchClass, f32)> = chroma
        .0
        .iter()
        .enumerate()
        .filter(|(_, &v)| v >= threshold)
        .map(|(i, &v)| (PitchClass::from_index(i as u8), v))
        .collect();
    active.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    active
}
