//! Command implementations.
//!
//! Fetching commands return their rendered output; `main` prints it.

pub mod config;
pub mod groupings;
pub mod headers;
pub mod schedule;

use planzajec_upstream::{CallParams, UekClient};
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// What every fetching command needs.
#[derive(Debug, Clone)]
pub struct Session {
    pub client: UekClient,
    pub params: CallParams,
    pub cancel: CancellationToken,
}

impl Session {
    /// Builds the client and resolves credentials from the configuration.
    pub fn from_config(config: &ClientConfig, cancel: CancellationToken) -> ClientResult<Self> {
        let upstream = config
            .upstream
            .to_upstream_config()
            .map_err(ClientError::Config)?;
        let client = UekClient::new(upstream)?;
        let params = config.auth.call_params().map_err(ClientError::Config)?;

        Ok(Self {
            client,
            params,
            cancel,
        })
    }
}
