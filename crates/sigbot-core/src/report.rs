//! Consumption side: strict reading of `predictions.json` and table rendering.
//!
//! Unlike ingestion, elements are type checked here. Elements that fail the
//! check are dropped silently; only an empty result is an error.

use std::{cmp::Ordering, path::PathBuf};

use serde_json::Value;

use crate::domain::{Signal, SignalDocument};

const HEADERS: [&str; 3] = ["symbol", "action", "confidence"];
const UNKNOWN: &str = "?";

/// Reporter failures. Each maps to a stable exit code that scripts branch on.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("missing file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("schema error: 'signals' list missing")]
    Schema,

    #[error("no valid signals found")]
    NoSignals,
}

impl ReportError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::MissingFile(_) => 3,
            ReportError::InvalidJson(_) => 4,
            ReportError::Schema => 5,
            ReportError::NoSignals => 6,
        }
    }
}

/// Read and strictly validate the artifact at `path`.
pub fn load_signals(path: &std::path::Path) -> Result<SignalDocument, ReportError> {
    if !path.exists() {
        return Err(ReportError::MissingFile(path.to_path_buf()));
    }
    let txt =
        std::fs::read_to_string(path).map_err(|e| ReportError::InvalidJson(e.to_string()))?;
    parse_signals(&txt)
}

/// Strict validation of an artifact body. Signals keep their input order.
pub fn parse_signals(txt: &str) -> Result<SignalDocument, ReportError> {
    let doc: Value =
        serde_json::from_str(txt).map_err(|e| ReportError::InvalidJson(e.to_string()))?;

    let Some(raw) = doc.get("signals").and_then(Value::as_array) else {
        return Err(ReportError::Schema);
    };

    let signals: Vec<Signal> = raw.iter().filter_map(strict_signal).collect();
    if signals.is_empty() {
        return Err(ReportError::NoSignals);
    }

    Ok(SignalDocument {
        version: header_field(&doc, "version"),
        timestamp: header_field(&doc, "timestamp"),
        signals,
    })
}

fn strict_signal(v: &Value) -> Option<Signal> {
    let obj = v.as_object()?;
    let symbol = obj.get("symbol")?.as_str()?;
    let action = obj.get("action")?.as_str()?;
    let confidence = numeric(obj.get("confidence")?)?;
    Some(Signal {
        symbol: symbol.to_string(),
        action: action.to_lowercase(),
        confidence,
    })
}

/// Numbers, plus booleans as 1/0: downstream consumers have always counted
/// `true`/`false` as numeric confidence. No range check.
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn header_field(doc: &Value, key: &str) -> String {
    match doc.get(key) {
        None => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Stable sort by confidence, highest first. Ties keep input order.
pub fn rank(signals: &mut [Signal]) {
    signals.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
}

/// Render the full report: header line, column titles, separator, rows.
pub fn render(doc: &SignalDocument) -> String {
    let mut signals = doc.signals.clone();
    rank(&mut signals);

    let rows: Vec<[String; 3]> = signals
        .iter()
        .map(|s| {
            [
                s.symbol.clone(),
                s.action.clone(),
                format!("{:.2}", s.confidence),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 3);
    lines.push(format!(
        "predictions: version={}  timestamp={}",
        doc.version, doc.timestamp
    ));
    lines.push(format_row(&HEADERS, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        lines.push(format_row(row, &widths));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn format_row<S: AsRef<str>>(cols: &[S], widths: &[usize]) -> String {
    cols.iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<w$}", c.as_ref(), w = *w))
        .collect::<Vec<_>>()
        .join(" | ")
}
