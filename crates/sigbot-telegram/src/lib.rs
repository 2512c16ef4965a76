//! Telegram Bot API adapter (reqwest).
//!
//! Implements the `sigbot-core` `UpdateSource` (`getUpdates`) and `Notifier`
//! (`sendMessage`) ports against the raw HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use sigbot_core::{
    config::Config,
    domain::RemoteUpdate,
    errors::Error,
    ports::{Notifier, UpdateSource},
    Result,
};

const USER_AGENT: &str = "tg-poller/1.0";

#[derive(Clone, Debug)]
pub struct TelegramClient {
    api_base: Url,
    token: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| Error::Config(format!("invalid Telegram API base {api_base:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            api_base,
            token: token.into(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(&cfg.api_base, cfg.bot_token.clone(), cfg.request_timeout)
    }

    /// `<base>/bot<token>/<method>`, with the token percent-encoded as a path segment.
    pub fn method_url(&self, method: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        let base = url.to_string();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Telegram API base cannot be a base: {base}")))?
            .pop_if_empty()
            .push(&format!("bot{}", self.token))
            .push(method);
        Ok(url)
    }

    async fn read_json(resp: reqwest::Response, method: &str) -> Result<Value> {
        let bytes = resp.bytes().await.map_err(|e| map_transport(method, e))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Transport(format!("malformed {method} response: {e}")))
    }
}

fn map_transport(method: &str, e: reqwest::Error) -> Error {
    // The token is part of the URL; keep it out of error text.
    let e = e.without_url();
    if e.is_timeout() {
        Error::Transport(format!("{method} timed out: {e}"))
    } else {
        Error::Transport(format!("{method} request failed: {e}"))
    }
}

/// Query parameters for a one-shot (non long-polling) `getUpdates`.
pub fn get_updates_query(offset: i64) -> Vec<(&'static str, String)> {
    let mut q = vec![
        ("timeout", "0".to_string()),
        ("allowed_updates", r#"["message"]"#.to_string()),
    ];
    if offset > 0 {
        q.push(("offset", offset.to_string()));
    }
    q
}

/// Interpret a `getUpdates` body.
///
/// `ok != true` is a source failure. Entries that are not objects are
/// skipped; missing fields fall back to `update_id = 0`, empty chat and text.
pub fn parse_updates(body: &Value) -> Result<Vec<RemoteUpdate>> {
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let detail = body
            .get("description")
            .and_then(Value::as_str)
            .map(|d| format!(": {d}"))
            .unwrap_or_default();
        return Err(Error::SourceProtocol(format!("getUpdates not ok{detail}")));
    }

    let entries = match body.get("result") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(xs)) => xs,
        Some(_) => {
            return Err(Error::Transport(
                "malformed getUpdates response: result is not a list".to_string(),
            ))
        }
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            tracing::warn!("skipping non-object update entry");
            continue;
        };
        let message = obj.get("message");
        out.push(RemoteUpdate {
            sequence_id: obj.get("update_id").and_then(Value::as_i64).unwrap_or(0),
            chat_id: message
                .and_then(|m| m.get("chat"))
                .and_then(|c| c.get("id"))
                .map(chat_id_text)
                .unwrap_or_default(),
            text: message
                .and_then(|m| m.get("text"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        });
    }
    Ok(out)
}

fn chat_id_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch(&self, offset: i64) -> Result<Vec<RemoteUpdate>> {
        let url = self.method_url("getUpdates")?;
        let resp = self
            .http
            .get(url)
            .query(&get_updates_query(offset))
            .send()
            .await
            .map_err(|e| map_transport("getUpdates", e))?;

        let status = resp.status();
        let body = Self::read_json(resp, "getUpdates").await?;
        let updates = parse_updates(&body)?;
        tracing::debug!(%status, offset, count = updates.len(), "getUpdates");
        Ok(updates)
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = self.method_url("sendMessage")?;
        let resp = self
            .http
            .post(url)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| map_transport("sendMessage", e))?;

        let body = Self::read_json(resp, "sendMessage").await?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(Error::External(format!(
                "sendMessage not ok: {}",
                body.get("description")
                    .and_then(Value::as_str)
                    .unwrap_or("no description")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_token() {
        let c = TelegramClient::new("https://api.telegram.org", "123:abc", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            c.method_url("getUpdates").unwrap().as_str(),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }

    #[test]
    fn method_url_keeps_base_path() {
        let c = TelegramClient::new("http://localhost:8081/tg/", "t", Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            c.method_url("sendMessage").unwrap().as_str(),
            "http://localhost:8081/tg/bott/sendMessage"
        );
    }

    #[test]
    fn invalid_base_is_config_error() {
        let err = TelegramClient::new("not a url", "t", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn query_omits_offset_when_zero() {
        assert_eq!(
            get_updates_query(0),
            vec![
                ("timeout", "0".to_string()),
                ("allowed_updates", "[\"message\"]".to_string()),
            ]
        );
        assert_eq!(get_updates_query(57).last(), Some(&("offset", "57".to_string())));
    }

    #[test]
    fn parses_messages_and_chat_ids() {
        let body = json!({
            "ok": true,
            "result": [
                {"update_id": 100, "message": {"chat": {"id": -100123}, "text": "{\"signals\":[]}"}},
                {"update_id": 101, "message": {"chat": {"id": "@feed"}, "text": "hi"}},
                {"update_id": 102, "message": {"chat": {"id": 7}, "photo": []}},
                {"update_id": 103, "edited_message": {"chat": {"id": 7}, "text": "x"}},
                "garbage"
            ]
        });
        let updates = parse_updates(&body).unwrap();
        assert_eq!(
            updates,
            vec![
                RemoteUpdate {
                    sequence_id: 100,
                    chat_id: "-100123".into(),
                    text: "{\"signals\":[]}".into()
                },
                RemoteUpdate {
                    sequence_id: 101,
                    chat_id: "@feed".into(),
                    text: "hi".into()
                },
                RemoteUpdate {
                    sequence_id: 102,
                    chat_id: "7".into(),
                    text: String::new()
                },
                RemoteUpdate {
                    sequence_id: 103,
                    chat_id: String::new(),
                    text: String::new()
                },
            ]
        );
    }

    #[test]
    fn missing_result_is_empty() {
        assert!(parse_updates(&json!({"ok": true})).unwrap().is_empty());
    }

    #[test]
    fn not_ok_is_source_protocol_error() {
        let err = parse_updates(&json!({"ok": false, "error_code": 401, "description": "Unauthorized"}))
            .unwrap_err();
        assert!(matches!(err, Error::SourceProtocol(ref m) if m == "getUpdates not ok: Unauthorized"));

        let err = parse_updates(&json!({"result": []})).unwrap_err();
        assert!(matches!(err, Error::SourceProtocol(_)));
    }

    #[test]
    fn non_list_result_is_malformed() {
        let err = parse_updates(&json!({"ok": true, "result": {"update_id": 1}})).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }

    #[tokio::test]
    async fn silent_source_times_out_as_transport_error() {
        // Connections land in the backlog but nobody ever answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let c = TelegramClient::new(&base, "t", Duration::from_millis(300)).unwrap();

        let err = c.fetch(5).await.unwrap_err();
        assert!(matches!(err, Error::Transport(ref m) if m.contains("timed out")), "{err:?}");
        drop(listener);
    }

    #[test]
    fn cannot_be_a_base_url_is_config_error() {
        let c = TelegramClient::new("mailto:bot@example.com", "t", Duration::from_secs(1)).unwrap();
        let err = c.method_url("getUpdates").unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("mailto:bot@example.com")));
    }

    #[tokio::test]
    async fn unreachable_source_is_transport_error() {
        // Nothing listens on the discard port locally.
        let c = TelegramClient::new("http://127.0.0.1:9", "t", Duration::from_millis(500)).unwrap();
        let err = c.fetch(0).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)), "{err:?}");
        assert!(!err.to_string().contains("bott"));
    }
}
