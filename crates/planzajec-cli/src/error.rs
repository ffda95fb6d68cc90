//! Client error types.

use std::fmt;

use planzajec_upstream::UpstreamError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Exit code of an interrupted command, as a shell reports SIGINT.
pub const EXIT_CANCELLED: u8 = 130;

/// Errors that can occur in the client.
#[derive(Debug)]
pub enum ClientError {
    /// Configuration error.
    Config(String),
    /// Upstream call failed.
    Upstream(UpstreamError),
    /// Rendering output failed.
    Output(String),
    /// IO error.
    Io(std::io::Error),
}

impl ClientError {
    /// Returns true if the command was interrupted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Upstream(e) if e.is_cancelled())
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_cancelled() {
            EXIT_CANCELLED
        } else {
            1
        }
    }

    /// Advice printed in place of the error, when the cause is on the user's side.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Upstream(e) if e.is_unauthorized() => Some(
                "the schedule service rejected the credentials; pass --auth user:password \
                 or set `credentials` in the [auth] section of config.toml",
            ),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Upstream(err) => write!(f, "upstream error: {}", err),
            Self::Output(msg) => write!(f, "output error: {}", msg),
            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Upstream(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UpstreamError> for ClientError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(format!("failed to serialize JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(ClientError::from(UpstreamError::cancelled()).exit_code(), 130);
        assert_eq!(ClientError::from(UpstreamError::unauthorized()).exit_code(), 1);
        assert_eq!(ClientError::Config("bad".into()).exit_code(), 1);
    }

    #[test]
    fn unauthorized_has_hint() {
        assert!(ClientError::from(UpstreamError::unauthorized()).hint().is_some());
        assert!(
            ClientError::from(UpstreamError::network("connection reset"))
                .hint()
                .is_none()
        );
    }
}
