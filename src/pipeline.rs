//! One-pass conversion orchestration.
//!
//! Discovery picks the input recording, then a run flows
//! extract -> map -> serialize with nothing carried over between runs.
//! Identical inputs and parameters reproduce the output byte for byte.

use crate::container::FILE_EXTENSION;
use crate::core::extract::extract;
use crate::core::observation::{map_to_observations, write_collection, SignalCode};
use crate::core::timebase::SamplingContext;
use crate::error::{BridgeError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Everything a single conversion run needs.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Path to the input recording.
    pub input: PathBuf,
    /// Path the observation collection is written to.
    pub output: PathBuf,
    /// Device group in the recording, e.g. `98:D3:21:FC:8B:12`.
    pub device_id: String,
    /// Channel dataset name, e.g. `channel_2`.
    pub channel: String,
    /// Sequence-number dataset name, e.g. `nSeq`.
    pub index_field: String,
    /// Sampling rate, base instant and time-base policy.
    pub sampling: SamplingContext,
    /// Subject reference stamped on every record, e.g. `Patient/1`.
    pub subject: String,
    /// Signal code/unit descriptor.
    pub code: SignalCode,
}

/// Summary of a completed conversion.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub samples_read: usize,
    pub observations_written: usize,
    pub bytes_written: u64,
    pub output_path: PathBuf,
}

impl ConversionReport {
    /// Human-readable summary for the CLI.
    pub fn summary(&self) -> String {
        format!(
            "Conversion {}\n  Samples read: {}\n  Observations written: {}\n  Output: {:?} ({} bytes)",
            self.run_id, self.samples_read, self.observations_written, self.output_path,
            self.bytes_written
        )
    }
}

/// Select the input recording from a data directory.
///
/// Picks the lexicographically first `*.bsr` file; any further
/// candidates are reported on stderr but left unread. Fails with
/// `NotFound` when the directory is missing or holds no recording.
pub fn discover_container(dir: &Path) -> Result<PathBuf> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            BridgeError::NotFound(format!("data directory {dir:?}"))
        } else {
            BridgeError::Io(format!("reading {dir:?}: {e}"))
        }
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext == FILE_EXTENSION)
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    match candidates.split_first() {
        None => Err(BridgeError::NotFound(format!(
            "no .{FILE_EXTENSION} recording in {dir:?}"
        ))),
        Some((first, rest)) => {
            for skipped in rest {
                eprintln!("Note: skipping additional recording {skipped:?}");
            }
            Ok(first.clone())
        }
    }
}

/// Run the full pipeline: extract, map, serialize.
///
/// The output sink is only touched after the entire collection has been
/// built and rendered, so a failing run never leaves partial output.
pub fn run(request: &ConversionRequest) -> Result<ConversionReport> {
    let started_at = Utc::now();

    let channel = extract(
        &request.input,
        &request.device_id,
        &request.channel,
        &request.index_field,
    )?;
    let samples_read = channel.len();

    let observations =
        map_to_observations(&channel, &request.sampling, &request.subject, &request.code)?;
    let bytes_written = write_collection(&observations, &request.output)?;

    Ok(ConversionReport {
        run_id: Uuid::new_v4(),
        started_at,
        samples_read,
        observations_written: observations.len(),
        bytes_written,
        output_path: request.output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_empty_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_container(dir.path()).unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)), "{err}");
    }

    #[test]
    fn test_discover_missing_directory_is_not_found() {
        let err = discover_container(Path::new("/nonexistent/data")).unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)), "{err}");
    }

    #[test]
    fn test_discover_ignores_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a recording").unwrap();
        std::fs::write(dir.path().join("b_session.bsr"), "").unwrap();
        std::fs::write(dir.path().join("a_session.bsr"), "").unwrap();

        let found = discover_container(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "a_session.bsr");
    }
}
