//! Offline transport serving recorded upstream responses.
//!
//! Each recording is a file named after the sorted query parameters of the
//! request URL, so the same query always maps to the same file no matter
//! how its parameters were ordered.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};
use url::Url;

use crate::config::ReplayConfig;
use crate::error::{UpstreamError, UpstreamResult};
use crate::transport::{BoxFuture, RawResponse, Transport, UpstreamRequest};

/// Characters that cannot appear in a recording file name.
const UNSAFE_PUNCTUATION: [char; 5] = ['/', '?', '&', '=', ':'];

/// Derives the recording file name for an upstream URL.
///
/// Every query parameter becomes `<key><values>` (values sorted and
/// concatenated), the parts are sorted and joined with `___`, URL
/// punctuation is replaced by `_`, and `.xml` is appended.
pub fn recording_file_name(url: &str) -> Result<String, url::ParseError> {
    let parsed = Url::parse(url)?;

    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in parsed.query_pairs() {
        params
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    let mut parts: Vec<String> = params
        .into_iter()
        .map(|(key, mut values)| {
            values.sort();
            format!("{}{}", key, values.concat())
        })
        .collect();
    parts.sort();

    let name = parts
        .join("___")
        .replace("://", "_")
        .replace(UNSAFE_PUNCTUATION, "_");
    Ok(format!("{}.xml", name))
}

/// Serves responses from a directory of recordings.
pub struct ReplayTransport {
    dir: PathBuf,
    delay: Duration,
    passthrough: Option<Arc<dyn Transport>>,
}

impl ReplayTransport {
    /// Creates a replay transport without passthrough.
    pub fn new(config: &ReplayConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            delay: config.delay,
            passthrough: None,
        }
    }

    /// Forwards requests without a recording to `transport`.
    pub fn with_passthrough(mut self, transport: Arc<dyn Transport>) -> Self {
        self.passthrough = Some(transport);
        self
    }

    /// Returns the directory recordings are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the recording path for an upstream URL.
    pub fn recording_path(&self, url: &str) -> UpstreamResult<PathBuf> {
        let file_name = recording_file_name(url).map_err(|e| {
            UpstreamError::invalid_input("cannot derive recording name")
                .with_source(e)
                .with_url(url)
        })?;
        Ok(self.dir.join(file_name))
    }
}

impl Transport for ReplayTransport {
    fn name(&self) -> &str {
        "replay"
    }

    fn get(&self, request: UpstreamRequest) -> BoxFuture<'_, UpstreamResult<RawResponse>> {
        Box::pin(async move {
            let path = self.recording_path(&request.url)?;

            match tokio::fs::read_to_string(&path).await {
                Ok(body) => {
                    trace!(path = %path.display(), "Replaying recorded response");
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    Ok(RawResponse::ok(body))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => match &self.passthrough {
                    Some(transport) => {
                        debug!(path = %path.display(), "No recording, passing through");
                        transport.get(request).await
                    }
                    None => Err(UpstreamError::network(format!(
                        "no recorded response at {}",
                        path.display()
                    ))
                    .with_source(e)
                    .with_url(&request.url)),
                },
                Err(e) => Err(UpstreamError::network(format!(
                    "failed to open recorded response {}",
                    path.display()
                ))
                .with_source(e)
                .with_url(&request.url)),
            }
        })
    }
}
