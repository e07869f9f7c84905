//! CLI configuration: flags, then environment, then defaults.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use subnet_core::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_START_DELAY_SECS, DEFAULT_VALIDATION_PERIOD_SECS,
};
use subnet_validator::ValidatorConfig;

pub const DEFAULT_PUBLIC_URI: &str = "http://127.0.0.1:9650";
pub const ENV_PUBLIC_URI: &str = "SUBNET_PUBLIC_URI";
pub const ENV_PRIVATE_KEY_PATH: &str = "SUBNET_PRIVATE_KEY_PATH";

#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Node HTTP endpoint.
    pub public_uri: String,
    /// Hex-encoded secret key file.
    pub private_key_path: PathBuf,
    pub request_timeout: Duration,
    pub enable_prompt: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        let private_key_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".subnet-cli")
            .join("key.hex");

        Self {
            public_uri: DEFAULT_PUBLIC_URI.to_string(),
            private_key_path,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            enable_prompt: true,
        }
    }
}

impl CliConfig {
    /// Merge flag values over `env` lookups over defaults.
    pub fn resolve(
        public_uri: Option<String>,
        private_key_path: Option<PathBuf>,
        request_timeout: Option<&str>,
        enable_prompt: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let request_timeout = match request_timeout {
            Some(s) => parse_duration(s).with_context(|| format!("invalid --request-timeout {s:?}"))?,
            None => defaults.request_timeout,
        };
        Ok(Self {
            public_uri: public_uri
                .or_else(|| env(ENV_PUBLIC_URI))
                .unwrap_or(defaults.public_uri),
            private_key_path: private_key_path
                .or_else(|| env(ENV_PRIVATE_KEY_PATH).map(PathBuf::from))
                .unwrap_or(defaults.private_key_path),
            request_timeout,
            enable_prompt,
        })
    }

    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            request_timeout: self.request_timeout,
            enable_prompt: self.enable_prompt,
        }
    }
}

/// `90`, `90s`, `2m` or `1h`. A bare number is seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (digits, scale) = match s.char_indices().last() {
        Some((i, 's')) => (&s[..i], 1),
        Some((i, 'm')) => (&s[..i], 60),
        Some((i, 'h')) => (&s[..i], 3_600),
        Some(_) => (s, 1),
        None => bail!("empty duration"),
    };
    let n: u64 = digits.parse().context("duration must be a whole number")?;
    let secs = n.checked_mul(scale).context("duration overflow")?;
    if secs == 0 {
        bail!("duration must be positive");
    }
    Ok(Duration::from_secs(secs))
}

/// Fill in missing RFC3339 window bounds: start defaults to shortly after
/// `now`, end to a fixed period after start.
///
/// Unparseable values are passed through untouched for the request parser
/// to reject.
pub fn default_window(
    start: Option<String>,
    end: Option<String>,
    now: DateTime<Utc>,
) -> (String, String) {
    let start =
        start.unwrap_or_else(|| rfc3339(now + chrono::Duration::seconds(DEFAULT_START_DELAY_SECS)));
    let end = end.unwrap_or_else(|| {
        let from = DateTime::parse_from_rfc3339(&start)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(now + chrono::Duration::seconds(DEFAULT_START_DELAY_SECS));
        rfc3339(from + chrono::Duration::seconds(DEFAULT_VALIDATION_PERIOD_SECS))
    });
    (start, end)
}

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults() {
        let cfg = CliConfig::resolve(None, None, None, true, no_env).unwrap();
        assert_eq!(cfg.public_uri, DEFAULT_PUBLIC_URI);
        assert!(cfg.private_key_path.ends_with(".subnet-cli/key.hex"));
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
        assert!(cfg.enable_prompt);
    }

    #[test]
    fn env_fills_missing_flags() {
        let env = |k: &str| match k {
            ENV_PUBLIC_URI => Some("http://node:9650".to_string()),
            ENV_PRIVATE_KEY_PATH => Some("/keys/a.hex".to_string()),
            _ => None,
        };
        let cfg = CliConfig::resolve(None, None, None, false, env).unwrap();
        assert_eq!(cfg.public_uri, "http://node:9650");
        assert_eq!(cfg.private_key_path, PathBuf::from("/keys/a.hex"));
        assert!(!cfg.validator_config().enable_prompt);
    }

    #[test]
    fn flags_beat_env() {
        let env = |_: &str| Some("from-env".to_string());
        let cfg = CliConfig::resolve(
            Some("http://flag".into()),
            Some(PathBuf::from("/flag.hex")),
            Some("2m"),
            true,
            env,
        )
        .unwrap();
        assert_eq!(cfg.public_uri, "http://flag");
        assert_eq!(cfg.private_key_path, PathBuf::from("/flag.hex"));
        assert_eq!(cfg.validator_config().request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3_600));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("-5").is_err());
    }

    #[test]
    fn bad_timeout_flag() {
        assert!(CliConfig::resolve(None, None, Some("soon"), true, no_env).is_err());
    }

    #[test]
    fn window_defaults_from_now() {
        let now = DateTime::from_timestamp(1_893_456_000, 0).unwrap();
        let (start, end) = default_window(None, None, now);
        assert_eq!(start, "2030-01-01T00:01:00Z");
        assert_eq!(end, "2030-02-20T00:01:00Z");
    }

    #[test]
    fn window_end_follows_given_start() {
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let (start, end) = default_window(Some("2030-01-01T00:00:00Z".into()), None, now);
        assert_eq!(start, "2030-01-01T00:00:00Z");
        assert_eq!(end, "2030-02-20T00:00:00Z");
    }

    #[test]
    fn window_keeps_explicit_values() {
        let now = DateTime::from_timestamp(0, 0).unwrap();
        let (start, end) = default_window(Some("garbage".into()), Some("also".into()), now);
        assert_eq!((start.as_str(), end.as_str()), ("garbage", "also"));
    }
}
