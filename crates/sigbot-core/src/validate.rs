//! Ingestion-side payload validation.
//!
//! Presence-only: element values are not type checked here. A `confidence`
//! of `"high"` is accepted and persisted; the reporter applies the strict
//! type filter later.

use serde_json::Value;

use crate::{errors::Error, Result};

const REQUIRED_KEYS: [&str; 3] = ["symbol", "action", "confidence"];

/// Parse and structurally check a candidate payload.
///
/// On success the parsed document is returned untouched (no normalization).
/// Failures are `Error::Schema` with one of: `invalid json`, `no signals[]`,
/// `missing <key>`. Keys are checked in order across the whole list, so only
/// the first missing key is reported.
pub fn validate_payload(candidate: &str) -> Result<Value> {
    let doc: Value = serde_json::from_str(candidate)
        .map_err(|e| Error::Schema(format!("invalid json: {e}")))?;

    let Some(signals) = doc.get("signals").and_then(Value::as_array) else {
        return Err(Error::Schema("no signals[]".to_string()));
    };

    for key in REQUIRED_KEYS {
        let present = signals
            .iter()
            .all(|s| s.as_object().is_some_and(|o| o.contains_key(key)));
        if !present {
            return Err(Error::Schema(format!("missing {key}")));
        }
    }

    Ok(doc)
}
