//! Error types for upstream schedule operations.
//!
//! Every failure surfaced by the client is an [`UpstreamError`] carrying an
//! [`UpstreamErrorCode`]. Callers branch on the code: unauthorized and
//! cancelled calls are expected outcomes and must not be logged as errors.

use std::fmt;
use thiserror::Error;

/// The category of an upstream error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorCode {
    /// The upstream rejected the forwarded credentials (HTTP 401).
    Unauthorized,
    /// The caller cancelled the operation.
    Cancelled,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// The upstream answered with a status other than 200 or 401.
    UnexpectedStatus,
    /// The response body could not be decoded as a schedule document.
    InvalidResponse,
    /// The document decoded but does not describe the requested entity,
    /// or one of its rows or periods is malformed.
    ValidationFailed,
    /// Caller-supplied arguments were rejected before contacting upstream.
    InvalidInput,
    /// Configuration error - invalid concurrency bound, timezone, etc.
    ConfigurationError,
}

impl UpstreamErrorCode {
    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Cancelled => "cancelled",
            Self::NetworkError => "network_error",
            Self::UnexpectedStatus => "unexpected_status",
            Self::InvalidResponse => "invalid_response",
            Self::ValidationFailed => "validation_failed",
            Self::InvalidInput => "invalid_input",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for UpstreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to the upstream schedule service.
#[derive(Debug, Error)]
pub struct UpstreamError {
    code: UpstreamErrorCode,
    message: String,
    /// The upstream URL involved, when known.
    url: Option<String>,
    /// The HTTP status received, when known.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UpstreamError {
    /// Creates a new upstream error with the given code and message.
    pub fn new(code: UpstreamErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            url: None,
            status: None,
            source: None,
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized() -> Self {
        Self::new(
            UpstreamErrorCode::Unauthorized,
            "upstream rejected the credentials",
        )
        .with_status(401)
    }

    /// Creates a cancellation error.
    pub fn cancelled() -> Self {
        Self::new(UpstreamErrorCode::Cancelled, "operation cancelled")
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorCode::NetworkError, message)
    }

    /// Creates an unexpected status error.
    pub fn unexpected_status(status: u16) -> Self {
        Self::new(
            UpstreamErrorCode::UnexpectedStatus,
            format!("unexpected status code: {}", status),
        )
        .with_status(status)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorCode::InvalidResponse, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorCode::ValidationFailed, message)
    }

    /// Creates an input validation error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorCode::InvalidInput, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorCode::ConfigurationError, message)
    }

    /// Sets the upstream URL for this error.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the HTTP status for this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> UpstreamErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == UpstreamErrorCode::Unauthorized
    }

    pub fn is_cancelled(&self) -> bool {
        self.code == UpstreamErrorCode::Cancelled
    }

    /// Returns false for outcomes that are not application errors.
    pub fn should_log(&self) -> bool {
        !self.is_unauthorized() && !self.is_cancelled()
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, ": {}", source)?;
        }
        if let Some(ref url) = self.url {
            write!(f, " ({})", url)?;
        }
        Ok(())
    }
}

/// A specialized Result type for upstream operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;
