//! Configuration commands.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", ClientConfig::default_path().display());
    println!("{}", toml_str);
    Ok(())
}

/// Validate the configuration without calling the schedule service.
pub fn validate(config: &ClientConfig) -> ClientResult<()> {
    check(config)?;
    println!("Configuration is valid.");
    Ok(())
}

fn check(config: &ClientConfig) -> ClientResult<()> {
    let upstream = config
        .upstream
        .to_upstream_config()
        .map_err(ClientError::Config)?;
    upstream
        .validate()
        .map_err(|e| ClientError::Config(e.to_string()))?;

    let params = config
        .auth
        .call_params()
        .map_err(|e| ClientError::Config(format!("invalid credentials: {}", e)))?;
    if params.basic_auth.is_none() {
        tracing::debug!("No credentials configured, requests are sent without authorization");
    }
    Ok(())
}

/// Show the configuration file path.
pub fn path() -> ClientResult<()> {
    println!("config: {}", ClientConfig::default_path().display());
    Ok(())
}
