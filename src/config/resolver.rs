//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`STUDBOOK_API_URL`, `STUDBOOK_TOKEN_FILE`)
//! 3. config.kdl
//! 4. Built-in defaults
//!
//! Environment lookups go through a caller-supplied function so resolution can
//! be tested without touching the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::schema::{OutputFormat, StudbookConfig};
use crate::view::Orientation;
use crate::{Error, Result};

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "STUDBOOK_API_URL";
/// Environment variable overriding the token file location.
pub const TOKEN_FILE_ENV: &str = "STUDBOOK_TOKEN_FILE";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "STUDBOOK_DATA_DIR";

/// API base URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
/// Request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Token file name inside the data directory.
pub const TOKEN_FILE_NAME: &str = "token";
/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.kdl";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl at the given path
    ConfigFile(PathBuf),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile(path) => write!(f, "file:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_url: Resolved<String>,
    pub request_timeout_secs: Resolved<u64>,
    pub token_file: Resolved<PathBuf>,
    pub layout: Resolved<Orientation>,
    pub output_format: Resolved<OutputFormat>,
}

impl ResolvedConfig {
    pub fn api_url(&self) -> &str {
        &self.api_url.value
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.value)
    }

    pub fn token_file(&self) -> &Path {
        &self.token_file.value
    }

    pub fn layout(&self) -> Orientation {
        self.layout.value
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub token_file: Option<PathBuf>,
    pub layout: Option<Orientation>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    pub fn with_layout(mut self, layout: Orientation) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Directory holding the persisted token.
///
/// `STUDBOOK_DATA_DIR` if set, otherwise `studbook` under the platform data dir.
pub fn data_dir(env: impl Fn(&str) -> Option<String>) -> Result<PathBuf> {
    if let Some(dir) = env(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_dir()
        .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;
    Ok(base.join("studbook"))
}

/// Default location of config.kdl under the platform config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("studbook").join(CONFIG_FILE_NAME))
}

/// Resolve configuration with full precedence chain.
///
/// `file` is the parsed config.kdl found at `file_path` (if any).
pub fn resolve_config(
    file: &StudbookConfig,
    file_path: Option<&Path>,
    overrides: &ConfigOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let from_file =
        || ValueSource::ConfigFile(file_path.map(Path::to_path_buf).unwrap_or_default());
    let env_value = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    let api_url = if let Some(ref url) = overrides.api_url {
        Resolved::new(url.clone(), ValueSource::CliFlag)
    } else if let Some(url) = env_value(API_URL_ENV) {
        Resolved::new(url, ValueSource::EnvVar(API_URL_ENV.to_string()))
    } else if let Some(ref url) = file.api_url {
        Resolved::new(url.clone(), from_file())
    } else {
        Resolved::new(DEFAULT_API_URL.to_string(), ValueSource::Default)
    };
    if !(api_url.value.starts_with("http://") || api_url.value.starts_with("https://")) {
        return Err(Error::Config(format!(
            "API URL must start with http:// or https:// ({}): {}",
            api_url.source, api_url.value
        )));
    }

    let request_timeout_secs = match file.request_timeout_secs {
        Some(secs) => Resolved::new(secs, from_file()),
        None => Resolved::new(DEFAULT_TIMEOUT_SECS, ValueSource::Default),
    };

    let token_file = if let Some(ref path) = overrides.token_file {
        Resolved::new(path.clone(), ValueSource::CliFlag)
    } else if let Some(path) = env_value(TOKEN_FILE_ENV) {
        Resolved::new(PathBuf::from(path), ValueSource::EnvVar(TOKEN_FILE_ENV.to_string()))
    } else if let Some(ref path) = file.token_file {
        Resolved::new(PathBuf::from(path), from_file())
    } else {
        Resolved::new(data_dir(&env)?.join(TOKEN_FILE_NAME), ValueSource::Default)
    };

    let layout = if let Some(layout) = overrides.layout {
        Resolved::new(layout, ValueSource::CliFlag)
    } else if let Some(layout) = file.layout {
        Resolved::new(layout, from_file())
    } else {
        Resolved::new(Orientation::default(), ValueSource::Default)
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = file.output_format {
        Resolved::new(format, from_file())
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    Ok(ResolvedConfig {
        api_url,
        request_timeout_secs,
        token_file,
        layout,
        output_format,
    })
}

/// Load config.kdl and resolve against the process environment.
///
/// An explicitly given `config_path` must exist; the default location may be absent.
pub fn load_and_resolve(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!("Config file not found: {}", path.display())));
            }
            Some(path.to_path_buf())
        }
        None => default_config_path(),
    };

    let file = match &path {
        Some(path) => StudbookConfig::load(path)?,
        None => StudbookConfig::new(),
    };

    resolve_config(&file, path.as_deref(), overrides, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn file_config() -> StudbookConfig {
        StudbookConfig {
            api_url: Some("https://file.example.com".to_string()),
            request_timeout_secs: Some(12),
            token_file: Some("/from/file/token".to_string()),
            layout: Some(Orientation::TopToBottom),
            output_format: Some(OutputFormat::Human),
        }
    }

    #[test]
    fn test_defaults() {
        let env = env_from(&[(DATA_DIR_ENV, "/data")]);
        let resolved =
            resolve_config(&StudbookConfig::new(), None, &ConfigOverrides::new(), env).unwrap();

        assert_eq!(resolved.api_url(), DEFAULT_API_URL);
        assert_eq!(resolved.api_url.source, ValueSource::Default);
        assert_eq!(resolved.timeout(), Duration::from_secs(30));
        assert_eq!(resolved.token_file(), Path::new("/data/token"));
        assert_eq!(resolved.layout(), Orientation::LeftToRight);
        assert_eq!(resolved.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_file_beats_defaults() {
        let path = Path::new("/etc/studbook/config.kdl");
        let resolved = resolve_config(
            &file_config(),
            Some(path),
            &ConfigOverrides::new(),
            env_from(&[]),
        )
        .unwrap();

        assert_eq!(resolved.api_url(), "https://file.example.com");
        assert_eq!(resolved.api_url.source, ValueSource::ConfigFile(path.to_path_buf()));
        assert_eq!(resolved.request_timeout_secs.value, 12);
        assert_eq!(resolved.token_file(), Path::new("/from/file/token"));
        assert_eq!(resolved.layout(), Orientation::TopToBottom);
    }

    #[test]
    fn test_env_beats_file() {
        let env = env_from(&[
            (API_URL_ENV, "http://env:8000"),
            (TOKEN_FILE_ENV, "/from/env/token"),
        ]);
        let resolved =
            resolve_config(&file_config(), None, &ConfigOverrides::new(), env).unwrap();

        assert_eq!(resolved.api_url(), "http://env:8000");
        assert_eq!(
            resolved.api_url.source,
            ValueSource::EnvVar(API_URL_ENV.to_string())
        );
        assert_eq!(resolved.token_file(), Path::new("/from/env/token"));
    }

    #[test]
    fn test_flag_beats_env() {
        let env = env_from(&[(API_URL_ENV, "http://env:8000")]);
        let overrides = ConfigOverrides::new()
            .with_api_url("http://flag:8000")
            .with_token_file("/flag/token")
            .with_layout(Orientation::LeftToRight)
            .with_output_format(OutputFormat::Json);
        let resolved = resolve_config(&file_config(), None, &overrides, env).unwrap();

        assert_eq!(resolved.api_url(), "http://flag:8000");
        assert_eq!(resolved.api_url.source, ValueSource::CliFlag);
        assert_eq!(resolved.token_file(), Path::new("/flag/token"));
        assert_eq!(resolved.layout(), Orientation::LeftToRight);
        assert_eq!(resolved.output_format(), OutputFormat::Json);
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let env = env_from(&[(API_URL_ENV, "  "), (DATA_DIR_ENV, "/data")]);
        let resolved =
            resolve_config(&StudbookConfig::new(), None, &ConfigOverrides::new(), env).unwrap();
        assert_eq!(resolved.api_url.source, ValueSource::Default);
    }

    #[test]
    fn test_bad_url_rejected() {
        let overrides = ConfigOverrides::new().with_api_url("ftp://nope");
        let err = resolve_config(&StudbookConfig::new(), None, &overrides, env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("cli")));
    }

    #[test]
    fn test_data_dir_env_override() {
        let dir = data_dir(env_from(&[(DATA_DIR_ENV, "/tmp/sb")])).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/sb"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = load_and_resolve(
            Some(Path::new("/definitely/not/here/config.kdl")),
            &ConfigOverrides::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(ValueSource::CliFlag.to_string(), "cli");
        assert_eq!(ValueSource::EnvVar("X".into()).to_string(), "env:X");
        assert_eq!(ValueSource::Default.to_string(), "default");
    }
}
