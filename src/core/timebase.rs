//! Sampling context and per-sample timestamp derivation.
//!
//! A recording carries no wall-clock timestamps, only device sequence
//! numbers. The sampling context turns a sequence number into an absolute
//! UTC instant: `base + counter / rate_hz`. Which counter is used and how
//! the base instant is chosen are both explicit, configurable policies
//! because the historical tooling disagreed on them.

use crate::error::{BridgeError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// How the base instant (the wall-clock time of counter 0) is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimestampPolicy {
    /// An absolute instant supplied by the caller.
    Absolute { base: DateTime<Utc> },
    /// Midnight UTC of a fixed calendar date. This reproduces the legacy
    /// convention of stamping every run onto one agreed-upon date.
    FixedDate { date: NaiveDate },
}

impl TimestampPolicy {
    /// Resolve the policy to the base instant.
    pub fn base_instant(&self) -> DateTime<Utc> {
        match self {
            TimestampPolicy::Absolute { base } => *base,
            TimestampPolicy::FixedDate { date } => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// Which counter elapsed time is derived from.
///
/// `DeviceSequence` uses the device-reported sequence number, which stays
/// correct when the device drops samples (the gap shows up in the
/// timestamps). `SamplePosition` uses the array position and assumes a
/// gapless recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    #[default]
    DeviceSequence,
    SamplePosition,
}

/// Sampling rate, base instant and time-base policy for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingContext {
    rate_hz: f64,
    base: DateTime<Utc>,
    time_base: TimeBase,
}

impl SamplingContext {
    /// Create a context. Fails with `InvalidParameter` unless
    /// `rate_hz > 0` and finite.
    pub fn new(rate_hz: f64, base: DateTime<Utc>) -> Result<Self> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return Err(BridgeError::InvalidParameter(format!(
                "sampling_rate_hz must be > 0 (got {rate_hz})"
            )));
        }
        Ok(Self {
            rate_hz,
            base,
            time_base: TimeBase::default(),
        })
    }

    /// Select the elapsed-time counter.
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn base(&self) -> DateTime<Utc> {
        self.base
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Absolute instant of the sample at array `position` whose device
    /// counter is `index`. Elapsed time is rounded to whole microseconds.
    pub fn instant_for(&self, index: i64, position: usize) -> DateTime<Utc> {
        let steps = match self.time_base {
            TimeBase::DeviceSequence => index as f64,
            TimeBase::SamplePosition => position as f64,
        };
        let micros = (steps * 1_000_000.0 / self.rate_hz).round() as i64;
        self.base + Duration::microseconds(micros)
    }
}

/// Render an instant in the output schema's format: RFC 3339 UTC with
/// millisecond precision and a `Z` suffix.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DateTime<Utc> {
        "2024-12-23T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_rate_must_be_positive_and_finite() {
        for rate in [0.0, -1.0, -100.0, f64::NAN, f64::INFINITY] {
            let err = SamplingContext::new(rate, base()).unwrap_err();
            assert!(matches!(err, BridgeError::InvalidParameter(_)), "{rate}");
        }
        assert!(SamplingContext::new(100.0, base()).is_ok());
    }

    #[test]
    fn test_device_sequence_time_base() {
        let ctx = SamplingContext::new(100.0, base()).unwrap();

        assert_eq!(format_instant(ctx.instant_for(0, 0)), "2024-12-23T00:00:00.000Z");
        assert_eq!(format_instant(ctx.instant_for(1, 1)), "2024-12-23T00:00:00.010Z");
        assert_eq!(format_instant(ctx.instant_for(2, 2)), "2024-12-23T00:00:00.020Z");

        // A gap in the sequence numbers shows up as a gap in time, even
        // though the array positions are contiguous.
        assert_eq!(
            format_instant(ctx.instant_for(250, 3)),
            "2024-12-23T00:00:02.500Z"
        );
    }

    #[test]
    fn test_sample_position_time_base_ignores_indices() {
        let ctx = SamplingContext::new(100.0, base())
            .unwrap()
            .with_time_base(TimeBase::SamplePosition);

        // Device counter says 250, but position 3 wins under this policy.
        assert_eq!(
            format_instant(ctx.instant_for(250, 3)),
            "2024-12-23T00:00:00.030Z"
        );
    }

    #[test]
    fn test_elapsed_matches_index_delta_over_rate() {
        let ctx = SamplingContext::new(250.0, base()).unwrap();
        let a = ctx.instant_for(10, 0);
        let b = ctx.instant_for(35, 1);
        // (35 - 10) / 250 Hz = 100 ms
        assert_eq!((b - a).num_milliseconds(), 100);
    }

    #[test]
    fn test_fixed_date_policy_resolves_to_midnight_utc() {
        let policy = TimestampPolicy::FixedDate {
            date: NaiveDate::from_ymd_opt(2024, 12, 23).unwrap(),
        };
        assert_eq!(format_instant(policy.base_instant()), "2024-12-23T00:00:00.000Z");

        let policy = TimestampPolicy::Absolute {
            base: "2025-03-01T14:30:00Z".parse().unwrap(),
        };
        assert_eq!(format_instant(policy.base_instant()), "2025-03-01T14:30:00.000Z");
    }

    #[test]
    fn test_policy_serde_round_trip() {
        let policy = TimestampPolicy::FixedDate {
            date: NaiveDate::from_ymd_opt(2024, 12, 23).unwrap(),
        };
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("fixed_date"));
        let back: TimestampPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
