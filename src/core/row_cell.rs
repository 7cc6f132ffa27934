use crate::domain::model::RowMutation;
use crate::domain::ports::RowCellSink;
use crate::utils::error::{IngestError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const DEFAULT_COLUMN_FAMILY: &str = "cf1";
pub const MESSAGE_QUALIFIER: &[u8] = b"message";

/// Picks the cell timestamp for a message. Runners report a missing or
/// sentinel event time for unbounded reads; those fall back to `now`.
pub fn resolve_event_time(event_time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match event_time {
        Some(t) if t != DateTime::<Utc>::MIN_UTC && t != DateTime::<Utc>::MAX_UTC => t,
        _ => now,
    }
}

impl RowMutation {
    /// Builds a write of `payload` under `cf1:message` keyed by a fresh random row key.
    pub fn from_message(payload: &[u8], event_time: DateTime<Utc>) -> Self {
        Self::with_row_key(Uuid::new_v4().as_bytes().to_vec(), payload, event_time)
    }

    pub fn with_row_key(row_key: Vec<u8>, payload: &[u8], event_time: DateTime<Utc>) -> Self {
        let micros = event_time.timestamp_micros();
        Self {
            row_key,
            column_family: DEFAULT_COLUMN_FAMILY.to_string(),
            qualifier: MESSAGE_QUALIFIER.to_vec(),
            value: payload.to_vec(),
            // 儲存端只接受毫秒精度
            timestamp_micros: micros - micros.rem_euclid(1_000),
        }
    }
}

/// Handles one message taken off the topic: checks it is UTF-8, then writes it as a single cell.
pub async fn process_message<S: RowCellSink + ?Sized>(
    payload: &[u8],
    event_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    sink: &S,
) -> Result<RowMutation> {
    let text = std::str::from_utf8(payload).map_err(|e| IngestError::DecodeError {
        message: format!("message is not valid UTF-8: {}", e),
    })?;
    tracing::info!("Received message: {}", text);

    let row = RowMutation::from_message(text.as_bytes(), resolve_event_time(event_time, now));
    sink.write_row(&row).await?;
    tracing::debug!("Wrote {} byte cell at {}", row.value.len(), row.timestamp_micros);
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockRowSink {
        rows: Arc<Mutex<Vec<RowMutation>>>,
    }

    #[async_trait]
    impl RowCellSink for MockRowSink {
        async fn write_row(&self, row: &RowMutation) -> Result<()> {
            self.rows.lock().await.push(row.clone());
            Ok(())
        }
    }

    #[test]
    fn test_resolve_event_time_falls_back_on_sentinels() {
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let event = Utc.with_ymd_and_hms(2025, 4, 1, 11, 59, 0).unwrap();

        assert_eq!(resolve_event_time(Some(event), now), event);
        assert_eq!(resolve_event_time(None, now), now);
        assert_eq!(resolve_event_time(Some(DateTime::<Utc>::MIN_UTC), now), now);
        assert_eq!(resolve_event_time(Some(DateTime::<Utc>::MAX_UTC), now), now);
    }

    #[test]
    fn test_mutation_truncates_to_millis() {
        let when = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let row = RowMutation::with_row_key(vec![1, 2], b"{}", when);

        assert_eq!(row.timestamp_micros % 1_000, 0);
        assert_eq!(row.timestamp_micros, when.timestamp_micros() - 456);
        assert_eq!(row.column_family, "cf1");
        assert_eq!(row.qualifier, b"message".to_vec());
    }

    #[tokio::test]
    async fn test_process_message_writes_one_cell() {
        let sink = MockRowSink::default();
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 12, 0, 0).unwrap();
        let payload = br#"{"Humidity":"55","kafka_time":"2025-04-01T11:59:59Z"}"#;

        let row = process_message(payload, None, now, &sink).await.unwrap();

        let rows = sink.rows.lock().await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, payload.to_vec());
        assert_eq!(rows[0].row_key.len(), 16);
        assert_eq!(row.timestamp_micros, now.timestamp_micros());
    }

    #[tokio::test]
    async fn test_process_message_rejects_invalid_utf8() {
        let sink = MockRowSink::default();
        let err = process_message(&[0xff, 0xfe], None, Utc::now(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::DecodeError { .. }));
        assert!(sink.rows.lock().await.is_empty());
    }
}
