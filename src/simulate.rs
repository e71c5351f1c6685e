//! Deterministic synthetic ECG recordings.
//!
//! The generator produces a plausible millivolt-scale trace: slow
//! respiratory baseline wander, a T-wave-ish oscillation, and a
//! triangular QRS spike once per beat at 72 bpm. It is fully
//! deterministic so generated recordings can serve as reproducible
//! fixtures for demos and tests.

use crate::container::RecordingWriter;
use crate::core::extract::RAW_GROUP;
use crate::error::{BridgeError, Result};
use std::f64::consts::TAU;
use std::path::Path;

/// Simulated heart rate in beats per minute.
const HEART_RATE_BPM: f64 = 72.0;

/// QRS spike amplitude in millivolts.
const QRS_AMPLITUDE_MV: f64 = 1.1;

/// Fraction of a beat occupied by the QRS spike.
const QRS_WIDTH: f64 = 0.04;

/// Generate `n` samples of synthetic ECG at the given rate.
pub fn generate(rate_hz: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64 / rate_hz;
            let wander = 0.04 * (TAU * 0.25 * t).sin();
            let t_wave = 0.12 * (TAU * HEART_RATE_BPM / 60.0 * t - 1.8).sin().max(0.0);
            let beat_phase = (t * HEART_RATE_BPM / 60.0).fract();
            let qrs = if beat_phase < QRS_WIDTH {
                QRS_AMPLITUDE_MV * (1.0 - (beat_phase / QRS_WIDTH - 0.5).abs() * 2.0)
            } else {
                0.0
            };
            wander + t_wave + qrs
        })
        .collect()
}

/// Generate a recording and write it under `<device_id>/raw`.
///
/// The channel gets the synthetic trace as `f64` and the index field a
/// contiguous `u32` counter starting at 0, mirroring what the
/// acquisition hardware reports. Returns the number of samples written.
pub fn write_recording(
    path: &Path,
    device_id: &str,
    channel: &str,
    index_field: &str,
    rate_hz: f64,
    duration_secs: f64,
) -> Result<usize> {
    if !rate_hz.is_finite() || rate_hz <= 0.0 {
        return Err(BridgeError::InvalidParameter(format!(
            "sampling_rate_hz must be > 0 (got {rate_hz})"
        )));
    }
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(BridgeError::InvalidParameter(format!(
            "duration_secs must be > 0 (got {duration_secs})"
        )));
    }

    let n = ((rate_hz * duration_secs) as usize).max(1);
    let samples = generate(rate_hz, n);
    let indices: Vec<u32> = (0..n as u32).collect();

    let mut writer = RecordingWriter::new();
    let group = writer.group(&format!("{device_id}/{RAW_GROUP}"));
    group.dataset_f64(channel, &samples);
    group.dataset_u32(index_field, &indices);
    writer.write_to(path)?;

    Ok(n)
}
