use crate::domain::model::Timestamp;
use crate::utils::error::{IngestError, Result};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `2024-01-01T00:00:00.123456Z`; the fraction is left out on whole seconds.
    IsoMicrosZ,
    /// `2024-01-01T00:00:00Z`
    IsoSecondsZ,
    /// `2024-01-01T00:00:00.123000+00:00`; the fraction is left out on whole seconds.
    IsoOffset,
}

impl TimestampFormat {
    pub fn render(self, when: DateTime<Utc>) -> String {
        let base = when.format("%Y-%m-%dT%H:%M:%S");
        let micros = when.nanosecond() % 1_000_000_000 / 1_000;
        let fraction = if micros == 0 {
            String::new()
        } else {
            format!(".{:06}", micros)
        };

        match self {
            TimestampFormat::IsoMicrosZ => format!("{}{}Z", base, fraction),
            TimestampFormat::IsoSecondsZ => format!("{}Z", base),
            TimestampFormat::IsoOffset => format!("{}{}+00:00", base, fraction),
        }
    }
}

impl Timestamp {
    pub fn at(name: impl Into<String>, when: DateTime<Utc>, format: TimestampFormat) -> Self {
        Timestamp::new(name, format.render(when))
    }

    pub fn now(name: impl Into<String>, format: TimestampFormat) -> Self {
        Timestamp::at(name, Utc::now(), format)
    }
}

/// Converts fractional epoch seconds (Kinesis `approximateArrivalTimestamp`)
/// to a UTC instant, rounded to the microsecond.
pub fn from_epoch_seconds(seconds: f64) -> Result<DateTime<Utc>> {
    if !seconds.is_finite() {
        return Err(IngestError::DecodeError {
            message: format!("arrival timestamp is not a finite number: {}", seconds),
        });
    }

    let micros = (seconds * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros).ok_or_else(|| IngestError::DecodeError {
        message: format!("arrival timestamp out of range: {}", seconds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_render_whole_seconds() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(TimestampFormat::IsoMicrosZ.render(when), "2024-01-01T00:00:00Z");
        assert_eq!(TimestampFormat::IsoSecondsZ.render(when), "2024-01-01T00:00:00Z");
        assert_eq!(TimestampFormat::IsoOffset.render(when), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_render_fractional_seconds() {
        let when = Utc.with_ymd_and_hms(2025, 4, 12, 9, 30, 5).unwrap()
            + chrono::Duration::microseconds(123_000);
        assert_eq!(
            TimestampFormat::IsoMicrosZ.render(when),
            "2025-04-12T09:30:05.123000Z"
        );
        assert_eq!(TimestampFormat::IsoSecondsZ.render(when), "2025-04-12T09:30:05Z");
        assert_eq!(
            TimestampFormat::IsoOffset.render(when),
            "2025-04-12T09:30:05.123000+00:00"
        );
    }

    #[test]
    fn test_from_epoch_seconds() {
        let when = from_epoch_seconds(1_704_067_200.5).unwrap();
        assert_eq!(
            TimestampFormat::IsoOffset.render(when),
            "2024-01-01T00:00:00.500000+00:00"
        );
        assert!(from_epoch_seconds(f64::NAN).is_err());
    }

    #[test]
    fn test_timestamp_at() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let stamp = Timestamp::at("kafka_time", when, TimestampFormat::IsoSecondsZ);
        assert_eq!(stamp, Timestamp::new("kafka_time", "2024-01-01T00:00:00Z"));
    }
}
