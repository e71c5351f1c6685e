//! Heart-rate statistics for the HTTP interface.
//!
//! This is deliberately simple glue around the conversion core: a
//! validity filter, a mean, and a threshold classification, matching the
//! clinical dashboard the endpoints feed.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Lower bound of the physiologically plausible band, in bpm.
pub const MIN_VALID_BPM: f64 = 30.0;

/// Upper bound of the physiologically plausible band, in bpm.
pub const MAX_VALID_BPM: f64 = 200.0;

/// Averages above this are classified high.
const HIGH_THRESHOLD_BPM: f64 = 100.0;

/// Averages below this are classified low.
const LOW_THRESHOLD_BPM: f64 = 60.0;

/// Column index of the heart-rate channel (A2) in OpenSignals text
/// exports.
pub const HEART_RATE_COLUMN: usize = 6;

/// Classification of an average heart rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartRateStatus {
    Low,
    Normal,
    High,
}

impl fmt::Display for HeartRateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeartRateStatus::Low => write!(f, "low"),
            HeartRateStatus::Normal => write!(f, "normal"),
            HeartRateStatus::High => write!(f, "high"),
        }
    }
}

/// Result of analyzing a heart-rate series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartRateAnalysis {
    pub average_heart_rate: f64,
    pub status: HeartRateStatus,
    pub message: String,
}

/// Keep only readings inside the plausible band.
pub fn filter_valid(rates: &[f64]) -> Vec<f64> {
    rates
        .iter()
        .copied()
        .filter(|r| (MIN_VALID_BPM..=MAX_VALID_BPM).contains(r))
        .collect()
}

/// Average and classify a heart-rate series.
///
/// Fails with `InvalidParameter` on an empty series; callers filter with
/// [`filter_valid`] first.
pub fn analyze(rates: &[f64]) -> Result<HeartRateAnalysis> {
    if rates.is_empty() {
        return Err(BridgeError::InvalidParameter(
            "no heart rate data provided".to_string(),
        ));
    }

    let average = rates.mean();
    let status = if average > HIGH_THRESHOLD_BPM {
        HeartRateStatus::High
    } else if average < LOW_THRESHOLD_BPM {
        HeartRateStatus::Low
    } else {
        HeartRateStatus::Normal
    };

    Ok(HeartRateAnalysis {
        average_heart_rate: average,
        status,
        message: format!(
            "The average heart rate is {average:.2}, which is considered {status}."
        ),
    })
}

/// Parse one column out of a tab-separated OpenSignals export.
///
/// Lines starting with `#` and blank lines are skipped. Fails with
/// `Format` when a data line is missing the column or holds a
/// non-numeric field.
pub fn parse_tabular_column(text: &str, column: usize) -> Result<Vec<f64>> {
    let mut values = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let field = line.split('\t').nth(column).ok_or_else(|| {
            BridgeError::Format(format!(
                "line {}: missing column {}",
                number + 1,
                column + 1
            ))
        })?;
        let value: f64 = field.trim().parse().map_err(|_| {
            BridgeError::Format(format!(
                "line {}: '{}' is not numeric",
                number + 1,
                field.trim()
            ))
        })?;
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_out_of_band_readings() {
        let rates = vec![10.0, 30.0, 72.0, 200.0, 250.0, -5.0];
        assert_eq!(filter_valid(&rates), vec![30.0, 72.0, 200.0]);
    }

    #[test]
    fn test_classification_thresholds() {
        assert_eq!(analyze(&[72.0]).unwrap().status, HeartRateStatus::Normal);
        assert_eq!(analyze(&[59.0]).unwrap().status, HeartRateStatus::Low);
        assert_eq!(analyze(&[101.0]).unwrap().status, HeartRateStatus::High);
        // Boundaries are inclusive on the normal side.
        assert_eq!(analyze(&[60.0]).unwrap().status, HeartRateStatus::Normal);
        assert_eq!(analyze(&[100.0]).unwrap().status, HeartRateStatus::Normal);
    }

    #[test]
    fn test_message_wording() {
        let analysis = analyze(&[80.0, 90.0]).unwrap();
        assert_eq!(analysis.average_heart_rate, 85.0);
        assert_eq!(
            analysis.message,
            "The average heart rate is 85.00, which is considered normal."
        );
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let err = analyze(&[]).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParameter(_)), "{err}");
    }

    #[test]
    fn test_tabular_parsing_skips_comments() {
        let text = "# OpenSignals header\n\
                    # device: 98:D3:21:FC:8B:12\n\
                    0\t1\t0\t0\t0\t0\t72.5\n\
                    \n\
                    1\t1\t0\t0\t0\t0\t73.0\n";
        let values = parse_tabular_column(text, HEART_RATE_COLUMN).unwrap();
        assert_eq!(values, vec![72.5, 73.0]);
    }

    #[test]
    fn test_tabular_parsing_missing_column() {
        let err = parse_tabular_column("1\t2\t3\n", HEART_RATE_COLUMN).unwrap_err();
        assert!(matches!(err, BridgeError::Format(_)), "{err}");
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_tabular_parsing_non_numeric_field() {
        let err = parse_tabular_column("0\t0\t0\t0\t0\t0\tabc\n", HEART_RATE_COLUMN).unwrap_err();
        assert!(matches!(err, BridgeError::Format(_)), "{err}");
        assert!(err.to_string().contains("abc"));
    }
}
