use std::pin::pin;

use mongodb::bson::{Document, RawDocumentBuf};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

use super::{Millis, SlowQueryMetrics};
use crate::error::SamplerError;

// ─── Configuration ───────────────────────────────────────────────

/// Profiler field holding the operation duration in milliseconds.
pub const MILLIS_FIELD: &str = "millis";

// ─── Public entry point ──────────────────────────────────────────

/// Fold a stream of raw profiler entries into the three gauges.
///
/// Entries that do not decode as a document are skipped and not counted.
/// A stream error aborts the fold and discards whatever was summed.
pub async fn aggregate<S, E>(records: S) -> Result<SlowQueryMetrics, SamplerError>
where
    S: Stream<Item = Result<RawDocumentBuf, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let mut records = pin!(records);
    let mut acc = Accumulator::default();

    while let Some(record) = records.next().await {
        let raw = record.map_err(|err| SamplerError::Cursor {
            source: Box::new(err),
        })?;

        match Document::try_from(&*raw) {
            Ok(doc) => acc.push(Millis::from(doc.get(MILLIS_FIELD))),
            Err(err) => {
                acc.skipped += 1;
                debug!(error = %err, "skipping undecodable profile entry");
            }
        }
    }

    Ok(acc.finish())
}

// ─── Internal state ──────────────────────────────────────────────

/// Running totals for the current window.
#[derive(Debug, Default)]
struct Accumulator {
    count: u64,
    total_ms: f64,
    skipped: u64,
}

impl Accumulator {
    fn push(&mut self, millis: Millis) {
        self.count += 1;
        self.total_ms += millis.as_f64();
    }

    fn finish(self) -> SlowQueryMetrics {
        if self.skipped > 0 {
            debug!(skipped = self.skipped, "some profile entries were skipped");
        }
        if self.count == 0 {
            return SlowQueryMetrics::empty();
        }

        SlowQueryMetrics {
            count: self.count,
            total_time: self.total_ms,
            average_time: self.total_ms / self.count as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use mongodb::bson::{doc, Bson};

    use super::*;

    fn entry(millis: impl Into<Bson>) -> Result<RawDocumentBuf, io::Error> {
        let millis: Bson = millis.into();
        let doc = doc! { "op": "query", "ns": "app.orders", "millis": millis };
        RawDocumentBuf::from_document(&doc).map_err(io::Error::other)
    }

    /// Valid framing, but element type 0x20 does not exist.
    fn malformed() -> Result<RawDocumentBuf, io::Error> {
        RawDocumentBuf::from_bytes(vec![8, 0, 0, 0, 0x20, b'a', 0, 0]).map_err(io::Error::other)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[tokio::test]
    async fn empty_window_yields_zeroes() -> Result<(), SamplerError> {
        let records = tokio_stream::iter(Vec::<Result<RawDocumentBuf, io::Error>>::new());
        let metrics = aggregate(records).await?;
        assert_eq!(metrics, SlowQueryMetrics::empty());
        assert_eq!(metrics.average_time.to_bits(), 0.0_f64.to_bits());
        Ok(())
    }

    #[tokio::test]
    async fn mixed_numeric_shapes_are_summed() -> Result<(), SamplerError> {
        let records = tokio_stream::iter(vec![
            entry(50_i32),
            entry(120_i64),
            entry(75.5_f64),
        ]);
        let metrics = aggregate(records).await?;

        assert_eq!(metrics.count, 3);
        assert!(close(metrics.total_time, 245.5));
        assert!(close(metrics.average_time, 245.5 / 3.0));
        Ok(())
    }

    #[tokio::test]
    async fn unrecognised_duration_still_counts() -> Result<(), SamplerError> {
        let records = tokio_stream::iter(vec![entry("slow")]);
        let metrics = aggregate(records).await?;

        assert_eq!(metrics.count, 1);
        assert_eq!(metrics.total_time, 0.0);
        assert_eq!(metrics.average_time, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_duration_still_counts() -> Result<(), SamplerError> {
        let bare = RawDocumentBuf::from_document(&doc! { "op": "command" })
            .map_err(io::Error::other);
        let records = tokio_stream::iter(vec![bare, entry(10_i32)]);
        let metrics = aggregate(records).await?;

        assert_eq!(metrics.count, 2);
        assert!(close(metrics.total_time, 10.0));
        assert!(close(metrics.average_time, 5.0));
        Ok(())
    }

    #[tokio::test]
    async fn undecodable_entry_is_skipped() -> Result<(), SamplerError> {
        let records = tokio_stream::iter(vec![entry(40_i32), malformed(), entry(20_i64)]);
        let metrics = aggregate(records).await?;

        assert_eq!(metrics.count, 2);
        assert!(close(metrics.total_time, 60.0));
        assert!(close(metrics.average_time, 30.0));
        Ok(())
    }

    #[tokio::test]
    async fn only_undecodable_entries_means_zero_average() -> Result<(), SamplerError> {
        let records = tokio_stream::iter(vec![malformed(), malformed()]);
        let metrics = aggregate(records).await?;
        assert_eq!(metrics, SlowQueryMetrics::empty());
        Ok(())
    }

    #[tokio::test]
    async fn stream_error_discards_partial_sums() {
        let records = tokio_stream::iter(vec![
            entry(50_i32),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
            entry(70_i32),
        ]);

        let result = aggregate(records).await;
        assert!(matches!(result, Err(SamplerError::Cursor { .. })));
    }
}
