//! JSON export for interoperability with other tools

use crate::error::{ChordlineError, Result};
use crate::pipeline::runner::{ChordSpan, TimelineResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Serialize, Deserialize)]
pub struct TimelineJson {
    /// Schema version for forward compatibility
    pub version: String,
    /// Export metadata
    pub metadata: ExportMetadata,
    /// Source audio file path
    pub source: String,
    /// Audio duration in seconds
    pub duration_seconds: f64,
    /// Confirmed chord spans in order
    pub chords: Vec<ChordSpan>,
}

/// Export metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// chordline version that generated this file
    pub generator_version: String,
    /// Timestamp of export
    pub exported_at: String,
    /// Number of chord spans
    pub chord_count: usize,
}

/// Write a chord timeline to a JSON file
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
/// This prevents data corruption if the write is interrupted.
pub fn write_json(result: &TimelineResult, source: &Path, output_path: &Path) -> Result<()> {
    // Write to temp file in same directory (ensures same filesystem for atomic rename)
    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| ChordlineError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    let writer = BufWriter::new(file);

    let output = TimelineJson {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            chord_count: result.spans.len(),
        },
        source: source.to_string_lossy().to_string(),
        duration_seconds: result.duration_seconds,
        chords: result.spans.clone(),
    };

    serde_json::to_writer_pretty(writer, &output).map_err(|e| {
        // Clean up temp file on error
        let _ = std::fs::remove_file(&temp_path);
        ChordlineError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    // Atomic rename: either succeeds completely or fails without modifying target
    std::fs::rename(&temp_path, output_path).map_err(|e| {
        // Clean up temp file on error
        let _ = std::fs::remove_file(&temp_path);
        ChordlineError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!(
        "Wrote {} chord spans to {}",
        result.spans.len(),
        output_path.display()
    );

    Ok(())
}

/// Read a previously exported timeline
pub fn read_timeline(json_path: &Path) -> Result<TimelineJson> {
    let file = File::open(json_path).map_err(|e| ChordlineError::OutputError {
        path: json_path.to_path_buf(),
        reason: format!("Failed to open timeline: {}", e),
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| ChordlineError::OutputError {
        path: json_path.to_path_buf(),
        reason: format!("Failed to parse timeline: {}", e),
    })
}
