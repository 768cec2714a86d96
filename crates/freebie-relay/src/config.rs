//! Runtime configuration: a TOML file overridden by `FREEBIE_*` variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use freebie_core::filter::ListingFilter;
use serde::Deserialize;

use crate::{Error, Result, engine::EngineSettings};

/// Everything the `freebie` binary needs to run.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
  #[serde(default)]
  pub discord_token:         String,
  #[serde(default = "default_discord_api_url")]
  pub discord_api_url:       String,
  #[serde(default = "default_store_path")]
  pub store_path:            PathBuf,
  #[serde(default = "default_source_base_url")]
  pub source_base_url:       String,
  #[serde(default = "default_poll_interval_secs")]
  pub poll_interval_secs:    u64,
  /// How many of the newest listing ids each destination keeps records for.
  #[serde(default = "default_retention_window")]
  pub retention_window:      usize,
  #[serde(default = "default_timeout_secs")]
  pub fetch_timeout_secs:    u64,
  #[serde(default = "default_timeout_secs")]
  pub delivery_timeout_secs: u64,
  #[serde(default = "default_host")]
  pub host:                  String,
  #[serde(default = "default_port")]
  pub port:                  u16,
  #[serde(default = "default_api_enabled")]
  pub api_enabled:           bool,
  #[serde(default)]
  pub auth_username:         String,
  /// argon2 PHC string; see `freebie --hash-password`.
  #[serde(default)]
  pub auth_password_hash:    String,
}

fn default_discord_api_url() -> String { "https://discord.com/api/v10".to_owned() }
fn default_store_path() -> PathBuf { PathBuf::from("data/freebie.db") }
fn default_source_base_url() -> String { "https://www.gamerpower.com/api".to_owned() }
fn default_poll_interval_secs() -> u64 { 900 }
fn default_retention_window() -> usize { 200 }
fn default_timeout_secs() -> u64 { 15 }
fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_api_enabled() -> bool { true }

impl RelayConfig {
  /// Read `path` (if it exists) and the environment, then validate.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("FREEBIE").try_parsing(true))
      .build()?;

    let mut cfg: RelayConfig = settings.try_deserialize()?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<()> {
    if self.discord_token.trim().is_empty() {
      return Err(Error::Config("discord_token must be set".into()));
    }
    if self.poll_interval_secs == 0 {
      return Err(Error::Config("poll_interval_secs must be greater than zero".into()));
    }
    if self.retention_window == 0 {
      return Err(Error::Config("retention_window must be greater than zero".into()));
    }
    if self.fetch_timeout_secs == 0 || self.delivery_timeout_secs == 0 {
      return Err(Error::Config("timeouts must be greater than zero".into()));
    }
    if self.api_enabled
      && (self.auth_username.trim().is_empty() || self.auth_password_hash.trim().is_empty())
    {
      return Err(Error::Config(
        "auth_username and auth_password_hash are required when the API is enabled".into(),
      ));
    }
    Ok(())
  }

  pub fn poll_interval(&self) -> Duration { Duration::from_secs(self.poll_interval_secs) }

  /// The engine knobs derived from this config. Polling always asks for
  /// the newest giveaways first.
  pub fn engine_settings(&self) -> EngineSettings {
    EngineSettings {
      retention_window: self.retention_window,
      filter:           ListingFilter::newest_first(),
      fetch_timeout:    Duration::from_secs(self.fetch_timeout_secs),
      delivery_timeout: Duration::from_secs(self.delivery_timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use freebie_core::filter::SortBy;

  use super::*;

  fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
  }

  const MINIMAL: &str = r#"
discord_token      = "abc"
auth_username      = "admin"
auth_password_hash = "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA"
"#;

  #[test]
  fn defaults_fill_missing_keys() {
    let file = write_config(MINIMAL);
    let cfg = RelayConfig::load(file.path()).unwrap();

    assert_eq!(cfg.discord_api_url, "https://discord.com/api/v10");
    assert_eq!(cfg.source_base_url, "https://www.gamerpower.com/api");
    assert_eq!(cfg.poll_interval(), Duration::from_secs(900));
    assert_eq!(cfg.retention_window, 200);
    assert_eq!(cfg.port, 8080);
    assert!(cfg.api_enabled);

    let settings = cfg.engine_settings();
    assert_eq!(settings.filter, ListingFilter::newest_first());
    assert_eq!(settings.fetch_timeout, Duration::from_secs(15));
  }

  #[test]
  fn file_values_override_defaults() {
    let file = write_config(&format!(
      "{MINIMAL}\npoll_interval_secs = 60\nretention_window = 50\n"
    ));
    let cfg = RelayConfig::load(file.path()).unwrap();

    assert_eq!(cfg.poll_interval_secs, 60);
    assert_eq!(cfg.retention_window, 50);
  }

  #[test]
  fn missing_token_is_fatal() {
    let file = write_config("auth_username = \"a\"\nauth_password_hash = \"h\"\n");
    let err = RelayConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, Error::Config(ref m) if m.contains("discord_token")));
  }

  #[test]
  fn zero_interval_and_window_are_rejected() {
    let file = write_config(&format!("{MINIMAL}\npoll_interval_secs = 0\n"));
    assert!(matches!(RelayConfig::load(file.path()), Err(Error::Config(_))));

    let file = write_config(&format!("{MINIMAL}\nretention_window = 0\n"));
    assert!(matches!(RelayConfig::load(file.path()), Err(Error::Config(_))));
  }

  #[test]
  fn polling_is_always_newest_first() {
    // A leftover sort key from an older config has no effect.
    let file = write_config(&format!("{MINIMAL}\npoll_sort = \"value\"\n"));
    let cfg = RelayConfig::load(file.path()).unwrap();
    assert_eq!(cfg.engine_settings().filter.sort, Some(SortBy::Date));
  }

  #[test]
  fn api_credentials_required_only_when_enabled() {
    let file = write_config("discord_token = \"abc\"\n");
    assert!(RelayConfig::load(file.path()).is_err());

    let file = write_config("discord_token = \"abc\"\napi_enabled = false\n");
    assert!(RelayConfig::load(file.path()).is_ok());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(
      expand_tilde(Path::new("~/freebie/db.sqlite")),
      PathBuf::from(home).join("freebie/db.sqlite")
    );
    assert_eq!(expand_tilde(Path::new("data/x.db")), PathBuf::from("data/x.db"));
  }
}
