//! Chord vocabulary
//!
//! One canonical table of root-relative interval patterns. Exact-set keys,
//! partial-match sets, and binary chroma templates are all generated from
//! this single source, so the matching strategies can never drift apart.

use crate::types::{ChordQuality, ChromaVector, PitchClass};
use std::collections::HashMap;

/// One quality in the recognition vocabulary
#[derive(Debug, Clone, Copy)]
pub struct PatternEntry {
    pub quality: ChordQuality,
    /// Root-relative semitone intervals, root first
    pub intervals: &'static [u8],
    /// Confidence assigned to a full match of this pattern
    pub base_confidence: f32,
    /// Whether the exact-set lookup table includes this quality
    pub exact: bool,
}

/// The fixed recognition vocabulary: triads, sevenths, suspensions
pub const PATTERNS: [PatternEntry; 7] = [
    PatternEntry {
        quality: ChordQuality::Major,
        intervals: &[0, 4, 7],
        base_confidence: 0.9,
        exact: true,
    },
    PatternEntry {
        quality: ChordQuality::Minor,
        intervals: &[0, 3, 7],
        base_confidence: 0.9,
        exact: true,
    },
    PatternEntry {
        quality: ChordQuality::Major7,
        intervals: &[0, 4, 7, 11],
        base_confidence: 0.8,
        exact: true,
    },
    PatternEntry {
        quality: ChordQuality::Minor7,
        intervals: &[0, 3, 7, 10],
        base_confidence: 0.78,
        exact: true,
    },
    PatternEntry {
        quality: ChordQuality::Dominant7,
        intervals: &[0, 4, 7, 10],
        base_confidence: 0.78,
        exact: true,
    },
    PatternEntry {
        quality: ChordQuality::Sus2,
        intervals: &[0, 2, 7],
        base_confidence: 0.85,
        exact: false,
    },
    PatternEntry {
        quality: ChordQuality::Sus4,
        intervals: &[0, 5, 7],
        base_confidence: 0.85,
        exact: false,
    },
];

/// One concrete chord (root x quality), expanded from a pattern
#[derive(Debug, Clone)]
pub struct VocabularyChord {
    pub root: PitchClass,
    pub quality: ChordQuality,
    pub base_confidence: f32,
    /// Chord tones as pitch classes
    pub classes: Vec<PitchClass>,
    /// Binary chroma template: 1.0 at chord tones
    pub template: ChromaVector,
}

/// Precomputed lookup structures for all 12 roots x vocabulary qualities
#[derive(Debug)]
pub struct ChordVocabulary {
    chords: Vec<VocabularyChord>,
    /// Sorted pitch-class index set -> index into `chords`
    exact: HashMap<Vec<u8>, usize>,
}

impl ChordVocabulary {
    pub fn new() -> Self {
        let mut chords = Vec::with_capacity(PATTERNS.len() * 12);
        let mut exact = HashMap::new();

        for pattern in &PATTERNS {
            for root_idx in 0..12u8 {
                let root = PitchClass::from_index(root_idx);
                let classes: Vec<PitchClass> = pattern
                    .intervals
                    .iter()
                    .map(|&off| PitchClass::from_index(root_idx + off))
                    .collect();

                let mut template = ChromaVector::zero();
                for class in &classes {
                    template.0[class.to_index() as usize] = 1.0;
                }

                let idx = chords.len();
                chords.push(VocabularyChord {
                    root,
                    quality: pattern.quality,
                    base_confidence: pattern.base_confidence,
                    classes,
                    template,
                });

                if pattern.exact {
                    exact.insert(Self::set_key(&chords[idx].classes), idx);
                }
            }
        }

        Self { chords, exact }
    }

    /// Canonical key for an unordered pitch-class set
    fn set_key(classes: &[PitchClass]) -> Vec<u8> {
        let mut key: Vec<u8> = classes.iter().map(|c| c.to_index()).collect();
        key.sort_unstable();
        key.dedup();
        key
    }

    /// Exact unordered-set lookup (triads and sevenths only)
    pub fn lookup_exact(&self, classes: &[PitchClass]) -> Option<&VocabularyChord> {
        self.exact
            .get(&Self::set_key(classes))
            .map(|&idx| &self.chords[idx])
    }

    /// All concrete chords, for partial-set and template matching
    pub fn chords(&self) -> &[VocabularyChord] {
        &self.chords
    }

    /// The base interval patterns, for root-relative matching
    pub fn patterns(&self) -> &'static [PatternEntry] {
        &PATTERNS
    }
}

impl Default for ChordVocabulary {
    fn default() -> Self {
        Self::new()
    }
}
