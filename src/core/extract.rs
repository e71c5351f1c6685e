//! Signal extraction: one channel plus its sequence numbers, aligned.

use crate::container::Recording;
use crate::error::{BridgeError, Result};
use std::path::Path;

/// Name of the raw-data subgroup within a device group.
pub const RAW_GROUP: &str = "raw";

/// A channel's sample values and the device sequence numbers that
/// accompany them. The two vectors always have equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelData {
    /// Sample values in signal units (millivolts for ECG).
    pub samples: Vec<f64>,
    /// Device-reported sequence numbers, non-decreasing, may wrap.
    pub indices: Vec<i64>,
}

impl ChannelData {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the channel holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Extract a channel and its sequence numbers from a recording.
///
/// The channel is looked up in the group `"<device_id>/raw"`. Samples are
/// decoded to `f64` and sequence numbers to `i64` regardless of the
/// stored width. Fails with `NotFound` when the file, group or either
/// dataset is absent, and with `Format` when the datasets disagree in
/// length. The container handle is released before this returns, on every
/// path.
pub fn extract(
    container_path: &Path,
    device_id: &str,
    channel_name: &str,
    index_field: &str,
) -> Result<ChannelData> {
    let recording = Recording::open(container_path)?;
    let group_path = format!("{device_id}/{RAW_GROUP}");
    let group = recording.group(&group_path)?;

    let samples = group.dataset(channel_name)?.as_f64();
    let indices = group.dataset(index_field)?.as_i64()?;

    if samples.len() != indices.len() {
        return Err(BridgeError::Format(format!(
            "channel '{channel_name}' has {} samples but '{index_field}' has {} entries",
            samples.len(),
            indices.len()
        )));
    }

    Ok(ChannelData { samples, indices })
}
