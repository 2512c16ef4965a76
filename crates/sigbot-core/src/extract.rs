//! Best-effort extraction of an embedded JSON payload from chat text.

const FENCE_OPEN: &str = "```json";
const FENCE: &str = "```";

/// Pull a JSON candidate out of free text.
///
/// First match wins:
/// 1. a fenced ` ```json ` block: everything up to the next fence (or end of
///    text), trimmed;
/// 2. the whole text, trimmed, when it starts with `{` and ends with `}`.
///
/// `None` means "no payload here" and the message is skipped. An empty fenced
/// block also yields `None`; it never falls through to rule 2.
/// The result is not parsed.
pub fn extract_json(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }

    if let Some((_, after)) = text.split_once(FENCE_OPEN) {
        let body = after.split_once(FENCE).map_or(after, |(b, _)| b).trim();
        return (!body.is_empty()).then(|| body.to_string());
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Some(trimmed.to_string());
    }

    None
}
