use crate::exchange::huobi::DEFAULT_BASE_URL;
use crate::models::Credentials;
use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

pub const PLACEHOLDER_ACCESS_KEY: &str = "your_access_key";
pub const PLACEHOLDER_SECRET_KEY: &str = "your_secret_key";

const TEMPLATE: &str = r#"# Huobi API credentials. Replace both placeholders before running.
ACCESS_KEY = "your_access_key"
SECRET_KEY = "your_secret_key"

# Optional settings.
# base_url = "https://api-aws.huobi.pro"
# timeout_secs = 10
# quote_currency = "usdt"

# [log]
# dir = "logs"
# file = "firstfill.log"
# max_bytes = 10485760
# max_files = 1
"#;

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub dir: String,
    pub file: String,
    /// Rotated copies kept next to the live file.
    pub max_files: usize,
    /// Size at which the live file is rotated.
    pub max_bytes: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: String,
    pub timeout_secs: u64,
    pub quote_currency: String,
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize)]
struct LogConfigFile {
    dir: Option<String>,
    file: Option<String>,
    max_files: Option<usize>,
    max_bytes: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "ACCESS_KEY")]
    access_key: Option<String>,
    #[serde(rename = "SECRET_KEY")]
    secret_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    quote_currency: Option<String>,
    log: Option<LogConfigFile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: Credentials {
                access_key: String::new(),
                secret_key: String::new(),
            },
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            quote_currency: "usdt".to_string(),
            log: LogConfig {
                dir: "logs".to_string(),
                file: "firstfill.log".to_string(),
                max_files: 1,
                max_bytes: 10 * 1024 * 1024,
            },
        }
    }
}

impl Config {
    /// Writes the credential template when `path` does not exist yet.
    /// Returns true if a template was written.
    pub fn ensure_template(path: &str) -> Result<bool> {
        let path = Path::new(path);
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|err| Error::config(format!("config dir create failed: {err}")))?;
            }
        }
        fs::write(path, TEMPLATE)
            .map_err(|err| Error::config(format!("failed to write config template: {err}")))?;
        Ok(true)
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| Error::config(format!("failed to read config {path}: {err}")))?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|err| Error::config(format!("failed to parse config {path}: {err}")))?;
        let mut config = Config::from_file(file);
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(file: ConfigFile) -> Self {
        let mut config = Config::default();

        if let Some(value) = file.access_key {
            config.credentials.access_key = value;
        }
        if let Some(value) = file.secret_key {
            config.credentials.secret_key = value;
        }
        if let Some(value) = file.base_url {
            config.base_url = value;
        }
        if let Some(value) = file.timeout_secs {
            config.timeout_secs = value;
        }
        if let Some(value) = file.quote_currency {
            config.quote_currency = value;
        }

        if let Some(log) = file.log {
            if let Some(value) = log.dir {
                config.log.dir = value;
            }
            if let Some(value) = log.file {
                config.log.file = value;
            }
            if let Some(value) = log.max_files {
                config.log.max_files = value;
            }
            if let Some(value) = log.max_bytes {
                config.log.max_bytes = value;
            }
        }

        config
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = read_string_env("FIRSTFILL_ACCESS_KEY")? {
            self.credentials.access_key = value;
        }
        if let Some(value) = read_string_env("FIRSTFILL_SECRET_KEY")? {
            self.credentials.secret_key = value;
        }
        if let Some(value) = read_string_env("FIRSTFILL_BASE_URL")? {
            self.base_url = value;
        }
        if let Some(value) = read_u64_env("FIRSTFILL_TIMEOUT_SECS")? {
            self.timeout_secs = value;
        }
        if let Some(value) = read_string_env("FIRSTFILL_QUOTE_CURRENCY")? {
            self.quote_currency = value;
        }
        if let Some(value) = read_string_env("FIRSTFILL_LOG_DIR")? {
            self.log.dir = value;
        }
        if let Some(value) = read_u64_env("FIRSTFILL_LOG_MAX_FILES")? {
            self.log.max_files = value as usize;
        }
        if let Some(value) = read_u64_env("FIRSTFILL_LOG_MAX_BYTES")? {
            self.log.max_bytes = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value, placeholder) in [
            (
                "ACCESS_KEY",
                &self.credentials.access_key,
                PLACEHOLDER_ACCESS_KEY,
            ),
            (
                "SECRET_KEY",
                &self.credentials.secret_key,
                PLACEHOLDER_SECRET_KEY,
            ),
        ] {
            let value = value.trim();
            if value.is_empty() || value == placeholder {
                return Err(Error::config(format!("{name} must be filled in")));
            }
        }

        let base_url = self.base_url.trim();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(Error::config("base_url must be an http(s) url"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be positive"));
        }
        if self.quote_currency.is_empty()
            || !self
                .quote_currency
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
        {
            return Err(Error::config(
                "quote_currency must be lowercase alphanumeric",
            ));
        }
        if self.log.file.trim().is_empty() {
            return Err(Error::config("log.file must be set"));
        }
        if self.log.max_files == 0 {
            return Err(Error::config("log.max_files must be at least 1"));
        }
        if self.log.max_bytes == 0 {
            return Err(Error::config("log.max_bytes must be positive"));
        }
        Ok(())
    }
}

fn read_string_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(Error::config(format!("failed to read {key}: {err}"))),
    }
}

fn read_u64_env(key: &str) -> Result<Option<u64>> {
    match read_string_env(key)? {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| Error::config(format!("{key} must be u64: {err}"))),
        None => Ok(None),
    }
}
