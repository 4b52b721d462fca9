//! Integration tests for the chordline pipeline
//!
//! These tests verify the full decode -> STFT -> engine -> timeline path
//! on synthesized audio.

use chordline::analysis::AnalysisConfig;
use chordline::config::Settings;
use chordline::types::FrontEnd;
use chordline::{export, pipeline};
use std::f32::consts::PI;
use std::path::Path;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 22050;

/// Generate a WAV file of summed sine tones
///
/// Creates a mono 16-bit WAV at the analysis sample rate so decoding does
/// not resample.
fn generate_chord_wav(path: &Path, frequencies: &[f32], duration_secs: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");

    let num_samples = (duration_secs * SAMPLE_RATE as f32) as usize;
    let amplitude = 0.25f32; // per-tone amplitude, headroom for summing

    for i in 0..num_samples {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample: f32 = frequencies
            .iter()
            .map(|&f| (2.0 * PI * f * t).sin() * amplitude)
            .sum();
        let sample_i16 = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer.write_sample(sample_i16).expect("Failed to write sample");
    }

    writer.finalize().expect("Failed to finalize WAV");
}

/// Generate a WAV file of two chords back to back
fn generate_progression_wav(path: &Path, first: &[f32], second: &[f32], secs_each: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");
    let num_samples = (secs_each * SAMPLE_RATE as f32) as usize;
    let amplitude = 0.25f32;

    for frequencies in [first, second] {
        for i in 0..num_samples {
            let t = i as f32 / SAMPLE_RATE as f32;
            let sample: f32 = frequencies
                .iter()
                .map(|&f| (2.0 * PI * f * t).sin() * amplitude)
                .sum();
            let sample_i16 = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
            writer.write_sample(sample_i16).expect("Failed to write sample");
        }
    }

    writer.finalize().expect("Failed to finalize WAV");
}

fn generate_silence_wav(path: &Path, duration_secs: f32) {
    generate_chord_wav(path, &[], duration_secs);
}

/// Test settings: progress bars off, sampling gate off so every frame votes
fn create_test_settings(input: &Path, output: Option<&Path>) -> Settings {
    Settings {
        input: input.to_path_buf(),
        output: output.map(|p| p.to_path_buf()),
        analysis: AnalysisConfig {
            gate_enabled: false,
            ..AnalysisConfig::default()
        },
        show_progress: false,
        print_timeline: false,
    }
}

const C_MAJOR: [f32; 3] = [261.63, 329.63, 392.0]; // C4 E4 G4
const G_MAJOR: [f32; 3] = [196.0, 246.94, 293.66]; // G3 B3 D4

#[test]
fn test_c_major_file_yields_c_timeline() {
    let dir = TempDir::new().expect("temp dir");
    let wav = dir.path().join("c_major.wav");
    generate_chord_wav(&wav, &C_MAJOR, 5.0);

    let settings = create_test_settings(&wav, None);
    let result = pipeline::run(&settings).expect("pipeline should succeed");

    assert!(!result.spans.is_empty(), "expected at least one chord span");
    assert_eq!(result.spans[0].name, "C");
    assert!(result.spans[0].confidence >= 0.85);
    assert!(result.frames_processed > 50);
}

#[test]
fn test_chroma_front_end_detects_the_same_chord() {
    let dir = TempDir::new().expect("temp dir");
    let wav = dir.path().join("c_major.wav");
    generate_chord_wav(&wav, &C_MAJOR, 5.0);

    let mut settings = create_test_settings(&wav, None);
    settings.analysis.front_end = FrontEnd::Chroma;
    let result = pipeline::run(&settings).expect("pipeline should succeed");

    assert!(!result.spans.is_empty());
    assert_eq!(result.spans[0].name, "C");
}

#[test]
fn test_silent_file_yields_empty_timeline() {
    let dir = TempDir::new().expect("temp dir");
    let wav = dir.path().join("silence.wav");
    generate_silence_wav(&wav, 4.0);

    let settings = create_test_settings(&wav, None);
    let result = pipeline::run(&settings).expect("silence must not fail");

    assert!(result.spans.is_empty());
    assert!(result.frames_processed > 0);
}

#[test]
fn test_chord_change_produces_two_spans() {
    let dir = TempDir::new().expect("temp dir");
    let wav = dir.path().join("c_to_g.wav");
    generate_progression_wav(&wav, &C_MAJOR, &G_MAJOR, 4.0);

    let settings = create_test_settings(&wav, None);
    let result = pipeline::run(&settings).expect("pipeline should succeed");

    assert_eq!(result.spans.len(), 2, "spans: {:?}", result.spans);
    assert_eq!(result.spans[0].name, "C");
    assert_eq!(result.spans[1].name, "G");
    // The change must be confirmed reasonably close to the actual boundary
    assert!(result.spans[1].start_ms > 3900.0);
    assert!(result.spans[1].start_ms < 6000.0);
}

#[test]
fn test_json_export_round_trips() {
    let dir = TempDir::new().expect("temp dir");
    let wav = dir.path().join("c_major.wav");
    let json_path = dir.path().join("timeline.json");
    generate_chord_wav(&wav, &C_MAJOR, 5.0);

    let settings = create_test_settings(&wav, Some(&json_path));
    let result = pipeline::run(&settings).expect("pipeline should succeed");

    let timeline = export::read_timeline(&json_path).expect("readable export");
    assert_eq!(timeline.version, "1.0");
    assert_eq!(timeline.metadata.chord_count, result.spans.len());
    assert_eq!(timeline.chords[0].name, "C");
    assert!((timeline.duration_seconds - result.duration_seconds).abs() < 1e-9);
}

#[test]
fn test_gated_run_still_confirms_sustained_chord() {
    let dir = TempDir::new().expect("temp dir");
    let wav = dir.path().join("c_major.wav");
    generate_chord_wav(&wav, &C_MAJOR, 6.0);

    let mut settings = create_test_settings(&wav, None);
    settings.analysis.gate_enabled = true;
    let result = pipeline::run(&settings).expect("pipeline should succeed");

    assert!(!result.spans.is_empty(), "gate must not starve the matcher");
    assert_eq!(result.spans[0].name, "C");
}

#[test]
fn test_missing_input_fails_with_recoverable_error() {
    let settings = create_test_settings(Path::new("/nonexistent/audio.wav"), None);
    let err = pipeline::run(&settings).unwrap_err();
    assert!(err.is_recoverable());
}
