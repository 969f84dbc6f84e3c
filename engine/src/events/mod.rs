//! Purchase-intent events
//!
//! Event records are immutable once ingested and consumed exactly once by
//! the orchestrator. The file loader tolerates individually malformed
//! elements: a bad entry is skipped with a logged warning and the rest of
//! the sequence continues, matching the per-event validation policy.

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// A single purchase-intent event (e.g. "item added to cart")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub product_id: String,
    pub user_id: String,
    pub price: f64,
    /// Unix timestamp (seconds)
    pub timestamp: f64,
}

/// Load events from a JSON array file.
///
/// Malformed elements are skipped with a warning; a missing or non-array
/// file is an [`EngineError::EventSource`].
pub fn load_events(path: &Path) -> Result<Vec<Event>, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        EngineError::EventSource(format!("failed to read {}: {}", path.display(), e))
    })?;

    let raw: Vec<serde_json::Value> = serde_json::from_str(&contents).map_err(|e| {
        EngineError::EventSource(format!("failed to parse {}: {}", path.display(), e))
    })?;

    let total = raw.len();
    let mut events = Vec::with_capacity(total);
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<Event>(value) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!("Skipping malformed event at index {}: {}", index, e);
            }
        }
    }

    if events.len() < total {
        warn!(
            "Loaded {}/{} events from {} ({} skipped)",
            events.len(),
            total,
            path.display(),
            total - events.len()
        );
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_events_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_well_formed_events() {
        let file = write_events_file(
            r#"[
                {"event_id": "evt_1", "type": "cart_add", "product_id": "prod_1001",
                 "user_id": "user_001", "price": 129.99, "timestamp": 1700000000.0},
                {"event_id": "evt_2", "type": "cart_add", "product_id": "prod_1002",
                 "user_id": "user_001", "price": 59.5, "timestamp": 1700000060.0}
            ]"#,
        );

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, "evt_1");
        assert_eq!(events[1].price, 59.5);
    }

    #[test]
    fn test_malformed_element_is_skipped() {
        let file = write_events_file(
            r#"[
                {"event_id": "evt_1", "type": "cart_add", "product_id": "p",
                 "user_id": "u", "price": 10.0, "timestamp": 0.0},
                {"event_id": "evt_bad", "price": "not a number"},
                {"event_id": "evt_3", "type": "cart_add", "product_id": "p",
                 "user_id": "u", "price": 20.0, "timestamp": 0.0}
            ]"#,
        );

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_id, "evt_1");
        assert_eq!(events[1].event_id, "evt_3");
    }

    #[test]
    fn test_missing_file_is_source_error() {
        let err = load_events(Path::new("/nonexistent/events.json")).unwrap_err();
        assert!(matches!(err, EngineError::EventSource(_)));
    }

    #[test]
    fn test_non_array_is_source_error() {
        let file = write_events_file(r#"{"not": "an array"}"#);
        let err = load_events(file.path()).unwrap_err();
        assert!(matches!(err, EngineError::EventSource(_)));
    }
}
