//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/planzajec/config.toml` by default. Command-line flags
//! override the file.
//!
//! The `credentials` value supports secret references:
//! - `pass::path/in/store`: resolved via `pass show`
//! - `env::VAR_NAME`: resolved from the environment
//! - plain text: used as-is

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use planzajec_core::{ExportOptions, OutputFormat};
use planzajec_upstream::{CallParams, DEFAULT_BASE_URL, ReplayConfig, UpstreamConfig};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Configuration for the planzajec client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Schedule service settings.
    pub upstream: UpstreamSettings,

    /// Credentials forwarded to the schedule service.
    pub auth: AuthSettings,

    /// Output settings.
    pub export: ExportSettings,
}

/// Schedule service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamSettings {
    pub base_url: String,

    /// User agent; the built-in `planzajec/<version>` when unset.
    pub user_agent: Option<String>,

    pub max_concurrent_requests: usize,

    pub timeout_secs: u64,

    /// IANA timezone the service's local times are read in.
    pub timezone: String,

    /// Directory of recorded responses; enables offline replay.
    pub replay_dir: Option<PathBuf>,

    pub replay_delay_ms: u64,

    /// Call the service when a recording is missing.
    pub replay_passthrough: bool,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            max_concurrent_requests: UpstreamConfig::DEFAULT_MAX_CONCURRENT_REQUESTS,
            timeout_secs: UpstreamConfig::DEFAULT_TIMEOUT_SECS,
            timezone: planzajec_core::DEFAULT_TIMEZONE.to_string(),
            replay_dir: None,
            replay_delay_ms: 0,
            replay_passthrough: false,
        }
    }
}

impl UpstreamSettings {
    /// Converts to the upstream client configuration.
    pub fn to_upstream_config(&self) -> Result<UpstreamConfig, String> {
        let mut config = UpstreamConfig::new(&self.base_url)
            .map_err(|e| e.to_string())?
            .with_max_concurrent_requests(self.max_concurrent_requests)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_timezone(&self.timezone);

        if let Some(ref user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }

        if let Some(ref dir) = self.replay_dir {
            config = config.with_replay(
                ReplayConfig::new(dir)
                    .with_delay(Duration::from_millis(self.replay_delay_ms))
                    .with_passthrough(self.replay_passthrough),
            );
        }

        Ok(config)
    }
}

/// Credentials forwarded to the schedule service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// `user:password` (supports `pass::` and `env::` prefixes).
    pub credentials: Option<String>,

    /// `X-Forwarded-For` value.
    pub forwarded_for: Option<String>,
}

impl AuthSettings {
    /// Resolves the credentials and builds the per-call parameters.
    pub fn call_params(&self) -> Result<CallParams, String> {
        let mut params = CallParams::new();

        if let Some(ref raw) = self.credentials {
            let credentials = crate::secret::resolve(raw)
                .map_err(|e| format!("failed to resolve credentials: {}", e))?;
            params = params.with_basic_auth(encode_basic_auth(&credentials)?);
        }

        if let Some(ref forwarded_for) = self.forwarded_for {
            params = params.with_forwarded_for(forwarded_for);
        }

        Ok(params)
    }
}

/// Encodes `user:password` for an `Authorization: Basic` header.
pub fn encode_basic_auth(credentials: &str) -> Result<String, String> {
    match credentials.split_once(':') {
        Some((user, _)) if !user.is_empty() => Ok(BASE64.encode(credentials)),
        _ => Err("credentials must have the form user:password".to_string()),
    }
}

/// Output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: OutputFormat,

    /// Subjects left out of ics and table output.
    pub hidden_subjects: Vec<String>,

    /// Maximum subject length in table output (truncated with ellipsis).
    pub max_subject_length: Option<usize>,
}

impl ExportSettings {
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            hidden_subjects: self.hidden_subjects.clone(),
            max_subject_length: self.max_subject_length,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("planzajec")
            .join("config.toml")
    }

    /// Applies command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        self.debug |= cli.debug;

        if let Some(format) = cli.format {
            self.export.format = format;
        }
        if !cli.hide_subject.is_empty() {
            self.export.hidden_subjects = cli.hide_subject.clone();
        }
        if cli.max_subject_length.is_some() {
            self.export.max_subject_length = cli.max_subject_length;
        }

        if cli.auth.is_some() {
            self.auth.credentials = cli.auth.clone();
        }
        if cli.forwarded_for.is_some() {
            self.auth.forwarded_for = cli.forwarded_for.clone();
        }

        if cli.replay_dir.is_some() {
            self.upstream.replay_dir = cli.replay_dir.clone();
        }
        if let Some(max) = cli.max_concurrent_requests {
            self.upstream.max_concurrent_requests = max;
        }
    }
}
