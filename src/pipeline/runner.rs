//! Offline pipeline orchestration
//!
//! Coordinates decode, spectral framing, frame-by-frame engine ticks, and
//! export. The engine itself is strictly frame-serial; this driver just
//! feeds it and collects the confirmed chord timeline.

use crate::audio;
use crate::audio::stft::SpectralFrames;
use crate::config::Settings;
use crate::engine::ChordEngine;
use crate::error::{ChordlineError, Result};
use crate::export;
use crate::types::{ChordEvent, PitchClass};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// One confirmed chord span in the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChordSpan {
    /// Chord label (e.g. "C", "Am", "G7")
    pub name: String,
    /// Confidence at confirmation time
    pub confidence: f32,
    /// Pitch classes supporting the chord
    pub pitch_classes: Vec<PitchClass>,
    /// Span start in milliseconds
    pub start_ms: f64,
    /// Span end in milliseconds (next change or end of audio)
    pub end_ms: f64,
}

/// Result of one pipeline run
#[derive(Debug)]
pub struct TimelineResult {
    /// Confirmed chord spans in order
    pub spans: Vec<ChordSpan>,
    /// Raw chord events as emitted by the engine
    pub events: Vec<ChordEvent>,
    /// Frames fed to the engine
    pub frames_processed: usize,
    /// Audio duration in seconds
    pub duration_seconds: f64,
}

/// Run the full analysis pipeline on the configured input file
pub fn run(settings: &Settings) -> Result<TimelineResult> {
    let pipeline_start = Instant::now();

    if !settings.input.exists() {
        return Err(ChordlineError::FileNotFound(settings.input.clone()));
    }

    // Phase 1: Decode
    let decode_start = Instant::now();
    info!("Decoding {}", settings.input.display());
    let buffer = audio::decode(&settings.input)?;
    info!(
        "Decoded {:.2}s of audio in {:.2}s",
        buffer.duration,
        decode_start.elapsed().as_secs_f64()
    );

    // Phase 2: Frame-by-frame analysis
    let analysis_start = Instant::now();
    let mut engine = ChordEngine::new(settings.analysis.clone());
    let frames = SpectralFrames::new(&buffer);
    let total_frames = frames.frame_count();

    let progress_bar = if settings.show_progress && total_frames > 0 {
        let pb = ProgressBar::new(total_frames as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut events: Vec<ChordEvent> = Vec::new();
    let mut frames_processed = 0usize;

    for frame in frames {
        if let Some(event) = engine.process(&frame) {
            debug!(
                "{:>8.1} ms  {} (confidence {:.2})",
                event.timestamp_ms, event.name, event.confidence
            );
            if let Some(ref pb) = progress_bar {
                pb.set_message(event.name.clone());
            }
            events.push(event);
        }
        frames_processed += 1;
        if let Some(ref pb) = progress_bar {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    info!(
        "Analyzed {} frames in {:.2}s, {} chord changes",
        frames_processed,
        analysis_start.elapsed().as_secs_f64(),
        events.len()
    );

    let spans = spans_from_events(&events, buffer.duration * 1000.0);
    let result = TimelineResult {
        spans,
        events,
        frames_processed,
        duration_seconds: buffer.duration,
    };

    // Phase 3: Export
    if let Some(ref output) = settings.output {
        export::write_json(&result, &settings.input, output)?;
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(result)
}

/// Collapse the event stream into contiguous spans; each span ends where
/// the next confirmed chord begins, the last one at end of audio
fn spans_from_events(events: &[ChordEvent], total_ms: f64) -> Vec<ChordSpan> {
    let mut spans: Vec<ChordSpan> = Vec::with_capacity(events.len());
    for (i, event) in events.iter().enumerate() {
        let end_ms = events
            .get(i + 1)
            .map(|next| next.timestamp_ms)
            .unwrap_or(total_ms);
        spans.push(ChordSpan {
            name: event.name.clone(),
            confidence: event.confidence,
            pitch_classes: event.pitch_classes.clone(),
            start_ms: event.timestamp_ms,
            end_ms,
        });
    }
    spans
}

/// Print the confirmed chord timeline as a table
pub fn print_timeline(result: &TimelineResult) {
    if result.spans.is_empty() {
        println!("No chords detected.");
        return;
    }

    println!();
    println!("{:>10}  {:>10}  {:<8} {:>6}", "start", "end", "chord", "conf");
    println!("{}", "-".repeat(40));
    for span in &result.spans {
        println!(
            "{:>9.2}s  {:>9.2}s  {:<8} {:>5.2}",
            span.start_ms / 1000.0,
            span.end_ms / 1000.0,
            span.name,
            span.confidence
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, t: f64) -> ChordEvent {
        ChordEvent {
            name: name.to_string(),
            confidence: 0.9,
            pitch_classes: vec![],
            timestamp_ms: t,
            bands: vec![],
        }
    }

    #[test]
    fn test_spans_cover_until_next_change() {
        let events = vec![event("C", 500.0), event("G", 2000.0)];
        let spans = spans_from_events(&events, 4000.0);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "C");
        assert_eq!(spans[0].end_ms, 2000.0);
        assert_eq!(spans[1].name, "G");
        assert_eq!(spans[1].end_ms, 4000.0);
    }

    #[test]
    fn test_no_events_yield_no_spans() {
        assert!(spans_from_events(&[], 1000.0).is_empty());
    }
}
