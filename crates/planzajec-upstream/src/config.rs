//! Upstream client configuration.

use std::path::PathBuf;
use std::time::Duration;

use planzajec_core::{DEFAULT_TIMEZONE, ScheduleCalendar};
use url::Url;

use crate::error::{UpstreamError, UpstreamResult};

/// Address of the public schedule service.
pub const DEFAULT_BASE_URL: &str = "https://planzajec.uek.krakow.pl/index.php";

/// Where recorded responses are read from instead of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Directory holding recorded `.xml` responses.
    pub dir: PathBuf,
    /// Artificial latency before each replayed response.
    pub delay: Duration,
    /// Fall back to the network when no recording exists.
    pub passthrough: bool,
}

impl ReplayConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            delay: Duration::ZERO,
            passthrough: false,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }
}

/// Configuration for [`UekClient`](crate::UekClient).
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the schedule service; query strings are appended to it.
    pub base_url: Url,

    /// Maximum number of upstream requests in flight, process-wide.
    pub max_concurrent_requests: usize,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// IANA name of the calendar all upstream timestamps are read in.
    pub timezone: String,

    /// Serve recorded responses instead of calling the service.
    pub replay: Option<ReplayConfig>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            max_concurrent_requests: Self::DEFAULT_MAX_CONCURRENT_REQUESTS,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("planzajec/{}", env!("CARGO_PKG_VERSION")),
            timezone: DEFAULT_TIMEZONE.to_string(),
            replay: None,
        }
    }
}

impl UpstreamConfig {
    /// The upstream tolerates a single request at a time.
    pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1;

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration pointing at the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> UpstreamResult<Self> {
        let base_url = Url::parse(base_url.as_ref()).map_err(|e| {
            UpstreamError::configuration(format!("invalid base URL {:?}", base_url.as_ref()))
                .with_source(e)
        })?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    pub fn with_max_concurrent_requests(mut self, max: usize) -> Self {
        self.max_concurrent_requests = max;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_replay(mut self, replay: ReplayConfig) -> Self {
        self.replay = Some(replay);
        self
    }

    /// Returns the base URL without a query string.
    pub fn base_url_str(&self) -> &str {
        self.base_url.as_str()
    }

    /// Checks the settings a client cannot be built without.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the concurrency bound is zero or the
    /// timezone is unknown.
    pub fn validate(&self) -> UpstreamResult<ScheduleCalendar> {
        if self.max_concurrent_requests < 1 {
            return Err(UpstreamError::configuration(
                "max concurrent requests should be greater than 0",
            ));
        }

        ScheduleCalendar::new(&self.timezone).map_err(|e| {
            UpstreamError::configuration("failed to load timezone data").with_source(e)
        })
    }
}
