//! Metrics sink
//!
//! Append-only per-event metrics emission. One record is produced for every
//! processed event; the CSV sink mirrors that to a file with a fixed header
//! for easy offline inspection, and the null sink discards records in tests.

use sdk::errors::EngineError;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// CSV header, one column per metrics field
const HEADER: &str = "timestamp,loop_iteration_time,events_processed,buy_ratio,avg_buy_score";

/// One metrics record per processed event
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsRecord {
    /// RFC 3339 emission time
    pub timestamp: String,
    /// Wall-clock seconds spent on this event
    pub loop_iteration_time: f64,
    /// Always 1 for per-event records
    pub events_processed: u32,
    /// 1.0 for a BUY decision, 0.0 otherwise
    pub buy_ratio: f64,
    /// The event's buy score
    pub avg_buy_score: f64,
}

/// Sink for per-event metrics records
pub trait MetricsSink: Send + Sync {
    /// Append one record
    fn record(&self, record: &MetricsRecord) -> Result<(), EngineError>;
}

/// CSV-file metrics sink
///
/// Writes the header when creating a new file and appends one row per
/// record. The writer is mutex-guarded; the pipeline is single-writer, but
/// the sink does not rely on that.
pub struct CsvMetricsSink {
    path: PathBuf,
    guard: Mutex<()>,
}

impl CsvMetricsSink {
    /// Open (or create with header) the CSV file at `path`
    pub fn new(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            let mut file = std::fs::File::create(path).map_err(|e| {
                EngineError::Metrics(format!("failed to create {}: {}", path.display(), e))
            })?;
            writeln!(file, "{}", HEADER)
                .map_err(|e| EngineError::Metrics(format!("failed to write header: {}", e)))?;
        }
        Ok(Self {
            path: path.to_path_buf(),
            guard: Mutex::new(()),
        })
    }
}

impl MetricsSink for CsvMetricsSink {
    fn record(&self, record: &MetricsRecord) -> Result<(), EngineError> {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| EngineError::Metrics("metrics writer lock poisoned".to_string()))?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                EngineError::Metrics(format!("failed to open {}: {}", self.path.display(), e))
            })?;

        writeln!(
            file,
            "{},{},{},{},{}",
            record.timestamp,
            record.loop_iteration_time,
            record.events_processed,
            record.buy_ratio,
            record.avg_buy_score
        )
        .map_err(|e| EngineError::Metrics(format!("failed to append record: {}", e)))?;

        Ok(())
    }
}

/// Sink that discards every record; used in tests and the one-shot CLI path
#[derive(Default)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn record(&self, _record: &MetricsRecord) -> Result<(), EngineError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: &str, score: f64) -> MetricsRecord {
        MetricsRecord {
            timestamp: ts.to_string(),
            loop_iteration_time: 0.123,
            events_processed: 1,
            buy_ratio: 1.0,
            avg_buy_score: score,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        let sink = CsvMetricsSink::new(&path).unwrap();
        sink.record(&sample("2026-01-01T00:00:00Z", 0.9)).unwrap();
        drop(sink);

        // Reopening an existing file must not duplicate the header
        let sink = CsvMetricsSink::new(&path).unwrap();
        sink.record(&sample("2026-01-01T00:00:01Z", 0.4)).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("2026-01-01T00:00:00Z,0.123,1,1,0.9"));
    }

    #[test]
    fn test_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let sink = CsvMetricsSink::new(&path).unwrap();

        for i in 0..5 {
            sink.record(&sample(&format!("t{}", i), 0.5)).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 6);
    }

    #[test]
    fn test_null_sink_accepts_everything() {
        let sink = NullMetricsSink;
        assert!(sink.record(&sample("t", 0.0)).is_ok());
    }
}
