/// One unit returned by the message source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteUpdate {
    /// Telegram `update_id`; strictly increasing per bot.
    pub sequence_id: i64,
    /// Chat id rendered as text (Telegram sends numbers, `@channel` names are strings).
    /// Empty when the update carried no message/chat.
    pub chat_id: String,
    /// Message text, empty for non-text messages.
    pub text: String,
}

/// A single trading signal as rendered by the reporter.
///
/// Ingestion never builds these: the validated payload is persisted as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub symbol: String,
    pub action: String,
    pub confidence: f64,
}

/// The canonical artifact shape, as consumed by the reporter.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalDocument {
    pub version: String,
    pub timestamp: String,
    pub signals: Vec<Signal>,
}

/// Outcome column of the activity log.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Fail,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "OK",
            Outcome::Fail => "FAIL",
        }
    }
}

/// One append-only activity log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityLogEntry {
    pub outcome: Outcome,
    pub detail: String,
}

impl ActivityLogEntry {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Ok,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail,
            detail: detail.into(),
        }
    }

    /// `OK <detail>` / `FAIL <detail>`, newlines flattened so one attempt is one line.
    pub fn to_line(&self) -> String {
        let detail = self.detail.replace(['\r', '\n'], " ");
        format!("{} {}", self.outcome.as_str(), detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_format() {
        assert_eq!(
            ActivityLogEntry::ok("wrote predictions.json").to_line(),
            "OK wrote predictions.json"
        );
        assert_eq!(
            ActivityLogEntry::fail("invalid json: EOF while parsing\nat line 1").to_line(),
            "FAIL invalid json: EOF while parsing at line 1"
        );
    }
}
