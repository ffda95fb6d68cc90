//! Secret references in configuration values.
//!
//! A value may point at a secret stored elsewhere:
//!
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - `env::VAR_NAME`: the value of `$VAR_NAME`
//!
//! Anything else is taken literally.

use std::process::Command;

use thiserror::Error;

/// A secret reference that could not be resolved.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("failed to run `pass show {path}`: {source}")]
    PassSpawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`pass show {path}` failed ({status}): {stderr}")]
    PassFailed {
        path: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("`pass show {path}` produced no output")]
    PassEmpty { path: String },

    #[error("environment variable `{0}` is not set")]
    EnvMissing(String),
}

/// Resolves a value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, SecretError> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var).map_err(|_| SecretError::EnvMissing(var.to_string()))
    } else {
        Ok(value.to_string())
    }
}

fn resolve_pass(path: &str) -> Result<String, SecretError> {
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|source| SecretError::PassSpawn {
            path: path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(SecretError::PassFailed {
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| SecretError::PassEmpty {
            path: path.to_string(),
        })
}
