use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 25;

/// Fixed file layout under `<SIGBOT_HOME>/artifacts`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    /// Staging area for atomic replaces; must live on the same filesystem as `dir`.
    pub staging_dir: PathBuf,
    pub predictions: PathBuf,
    pub state: PathBuf,
    pub activity_log: PathBuf,
}

impl ArtifactPaths {
    pub fn under(home: &Path) -> Self {
        let dir = home.join("artifacts");
        Self {
            staging_dir: dir.join("tmp"),
            predictions: dir.join("predictions.json"),
            state: dir.join("tg_state.json"),
            activity_log: dir.join("poll_tg.log"),
            dir,
        }
    }

    /// Resolve from `SIGBOT_HOME`, falling back to `$HOME/ai_bot`, then to a
    /// relative `ai_bot`.
    fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Self {
        let home = get("SIGBOT_HOME")
            .and_then(non_empty)
            .map(PathBuf::from)
            .or_else(|| {
                get("HOME")
                    .and_then(non_empty)
                    .map(|h| PathBuf::from(h).join("ai_bot"))
            })
            .unwrap_or_else(|| PathBuf::from("ai_bot"));
        Self::under(&home)
    }

    /// Create the artifacts and staging directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::create_dir_all(&self.staging_dir)?;
        Ok(())
    }
}

/// Typed poller configuration, passed explicitly into each component.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub notify_on_update: bool,
    pub paths: ArtifactPaths,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(&|k| env::var(k).ok())
    }

    pub fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = required(get, "BOT_TOKEN")?;
        let chat_id = required(get, "CHAT_ID")?;

        let api_base = get("TELEGRAM_API_BASE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        let request_timeout = Duration::from_secs(
            get("POLL_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS),
        );
        let notify_on_update = get("NOTIFY_ON_UPDATE")
            .map(|s| parse_bool(&s))
            .unwrap_or(false);

        Ok(Self {
            bot_token,
            chat_id,
            api_base,
            request_timeout,
            notify_on_update,
            paths: ArtifactPaths::from_lookup(get),
        })
    }
}

/// Reporter configuration. Nothing here is required.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub paths: ArtifactPaths,
    /// Shell command run before reading the artifact (`REPORT_REFRESH_CMD`).
    pub refresh_cmd: Option<String>,
}

impl ReportConfig {
    pub fn load() -> Self {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(&|k| env::var(k).ok())
    }

    pub fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Self {
        Self {
            paths: ArtifactPaths::from_lookup(get),
            refresh_cmd: get("REPORT_REFRESH_CMD").and_then(non_empty),
        }
    }
}

fn required(get: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key)
        .map(|v| v.trim().to_string())
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("missing env {key}")))
}

/// Load `KEY=VALUE` pairs from a dotenv file without overriding the environment.
pub fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }
        out.push((key.to_string(), val));
    }
    out
}

pub fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_token_is_config_error() {
        let get = lookup(&[("CHAT_ID", "42"), ("HOME", "/home/u")]);
        let err = Config::from_lookup(&get).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m == "missing env BOT_TOKEN"));
    }

    #[test]
    fn blank_chat_id_counts_as_missing() {
        let get = lookup(&[("BOT_TOKEN", "t"), ("CHAT_ID", "  "), ("HOME", "/home/u")]);
        let err = Config::from_lookup(&get).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m == "missing env CHAT_ID"));
    }

    #[test]
    fn defaults_and_layout() {
        let get = lookup(&[("BOT_TOKEN", "t"), ("CHAT_ID", "42"), ("HOME", "/home/u")]);
        let cfg = Config::from_lookup(&get).unwrap();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.request_timeout, Duration::from_secs(25));
        assert!(!cfg.notify_on_update);
        assert_eq!(
            cfg.paths.predictions,
            PathBuf::from("/home/u/ai_bot/artifacts/predictions.json")
        );
        assert_eq!(
            cfg.paths.state,
            PathBuf::from("/home/u/ai_bot/artifacts/tg_state.json")
        );
        assert_eq!(
            cfg.paths.activity_log,
            PathBuf::from("/home/u/ai_bot/artifacts/poll_tg.log")
        );
        assert_eq!(
            cfg.paths.staging_dir,
            PathBuf::from("/home/u/ai_bot/artifacts/tmp")
        );
    }

    #[test]
    fn overrides_apply() {
        let get = lookup(&[
            ("BOT_TOKEN", "t"),
            ("CHAT_ID", "42"),
            ("SIGBOT_HOME", "/srv/bot"),
            ("TELEGRAM_API_BASE", "http://localhost:8081/"),
            ("POLL_TIMEOUT_SECS", "5"),
            ("NOTIFY_ON_UPDATE", "yes"),
        ]);
        let cfg = Config::from_lookup(&get).unwrap();
        assert_eq!(cfg.api_base, "http://localhost:8081");
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
        assert!(cfg.notify_on_update);
        assert_eq!(cfg.paths.dir, PathBuf::from("/srv/bot/artifacts"));
    }

    #[test]
    fn report_config_needs_no_environment() {
        let cfg = ReportConfig::from_lookup(&lookup(&[]));
        assert_eq!(cfg.paths.predictions, PathBuf::from("ai_bot/artifacts/predictions.json"));
        assert_eq!(cfg.refresh_cmd, None);
    }

    #[test]
    fn report_config_reads_refresh_command() {
        let get = lookup(&[("SIGBOT_HOME", "/srv/bot"), ("REPORT_REFRESH_CMD", "./pull.sh")]);
        let cfg = ReportConfig::from_lookup(&get);
        assert_eq!(cfg.paths.dir, PathBuf::from("/srv/bot/artifacts"));
        assert_eq!(cfg.refresh_cmd.as_deref(), Some("./pull.sh"));

        let blank = ReportConfig::from_lookup(&lookup(&[("REPORT_REFRESH_CMD", "  ")]));
        assert_eq!(blank.refresh_cmd, None);
    }

    #[test]
    fn dotenv_parsing_skips_comments_and_strips_quotes() {
        let parsed = parse_dotenv("# comment\n\nBOT_TOKEN = \"abc\"\nbroken line\nCHAT_ID='42'\n=x\n");
        assert_eq!(
            parsed,
            vec![
                ("BOT_TOKEN".to_string(), "abc".to_string()),
                ("CHAT_ID".to_string(), "42".to_string()),
            ]
        );
    }
}
