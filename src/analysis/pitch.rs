//! Pitch classification
//!
//! Pure functions mapping a fundamental frequency to a pitch class and
//! octave under equal temperament referenced to A4 = 440 Hz.

use crate::types::{PitchClass, PitchedNote};

/// Reference pitch in Hz (A4)
pub const A4_HZ: f32 = 440.0;

/// MIDI note number of the reference pitch
const A4_MIDI: f32 = 69.0;

/// Semitone offset from A4 (fractional)
///
/// Callers must filter non-positive or non-finite frequencies; the peak
/// extractor and chroma aggregator guarantee this for pipeline input.
pub fn note_number(frequency_hz: f32) -> f32 {
    debug_assert!(frequency_hz > 0.0 && frequency_hz.is_finite());
    12.0 * (frequency_hz / A4_HZ).log2()
}

/// MIDI-style note number (69 = A4), used by the chroma front end
pub fn midi_number(frequency_hz: f32) -> f32 {
    A4_MIDI + note_number(frequency_hz)
}

/// Pitch class of a frequency, octave-folded
pub fn pitch_class_of(frequency_hz: f32) -> PitchClass {
    let semis = note_number(frequency_hz).round() as i32;
    PitchClass::from_index((semis + 9).rem_euclid(12) as u8)
}

/// Classify a frequency into a pitched note
///
/// Both fields derive from the same rounded semitone offset, so a note a
/// hair below an octave boundary cannot land in one octave with the other
/// octave's pitch class. Octaves follow the A-rooted banding of the
/// note-number formula: A4 and the C above it share octave 4.
pub fn classify(frequency_hz: f32) -> PitchedNote {
    let semis = note_number(frequency_hz).round() as i32;
    PitchedNote {
        pitch_class: PitchClass::from_index((semis + 9).rem_euclid(12) as u8),
        octave: semis.div_euclid(12) + 4,
        frequency_hz,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pitch_is_a4() {
        let note = classify(A4_HZ);
        assert_eq!(note.pitch_class, PitchClass::A);
        assert_eq!(note.octave, 4);
    }

    #[test]
    fn test_semitone_round_trip() {
        // Every integer semitone offset in [-48, +48] maps back to the
        // expected pitch class and octave band.
        for k in -48i32..=48 {
            let freq = A4_HZ * 2f32.powf(k as f32 / 12.0);
            let note = classify(freq);

            let expected_pc = PitchClass::from_index((9 + k).rem_euclid(12) as u8);
            assert_eq!(note.pitch_class, expected_pc, "offset {k}");

            let expected_octave = k.div_euclid(12) + 4;
            assert_eq!(note.octave, expected_octave, "offset {k}");
        }
    }

    #[test]
    fn test_slightly_detuned_frequency_snaps_to_nearest_semitone() {
        // 30 cents sharp of A4 still classifies as A
        let detuned = A4_HZ * 2f32.powf(0.3 / 12.0);
        assert_eq!(pitch_class_of(detuned), PitchClass::A);
    }

    #[test]
    fn test_midi_number_matches_convention() {
        assert!((midi_number(440.0) - 69.0).abs() < 1e-4);
        assert!((midi_number(261.626) - 60.0).abs() < 0.01); // C4
    }

    #[test]
    fn test_octave_halving_drops_twelve_semitones() {
        let a3 = classify(220.0);
        assert_eq!(a3.pitch_class, PitchClass::A);
        assert_eq!(a3.octave, 3);
    }
}
