//! Client for the UEK schedule service.
//!
//! This crate talks to the upstream XML endpoint and turns its documents
//! into [`planzajec_core`] schedules:
//!
//! - [`transport`]: one GET against the upstream, over HTTP or replayed from
//!   recordings ([`replay`])
//! - [`client`]: the rate-limited [`UekClient`] and its per-entity operations
//! - [`xml`] and [`builder`]: decoding and normalization of documents
//! - [`aggregate`]: concurrent fetch and merge of several entities
//!
//! # Example
//!
//! ```no_run
//! use planzajec_core::ScheduleType;
//! use planzajec_upstream::{CallParams, UekClient, UpstreamConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), planzajec_upstream::UpstreamError> {
//! let client = UekClient::new(UpstreamConfig::default())?;
//! let (aggregate, periods) = client
//!     .fetch_aggregate_schedule(
//!         &CallParams::new(),
//!         ScheduleType::Group,
//!         &[12345],
//!         0,
//!         &CancellationToken::new(),
//!     )
//!     .await?;
//! println!("{} classes in {} periods", aggregate.items.len(), periods.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod replay;
pub mod transport;
pub mod xml;

#[cfg(test)]
mod testing;

pub use aggregate::validate_ids;
pub use builder::{DocumentError, build_schedule, extract_periods};
pub use client::{CallParams, UekClient};
pub use config::{DEFAULT_BASE_URL, ReplayConfig, UpstreamConfig};
pub use error::{UpstreamError, UpstreamErrorCode, UpstreamResult};
pub use replay::{ReplayTransport, recording_file_name};
pub use transport::{BoxFuture, HttpTransport, RawResponse, Transport, UpstreamRequest};
pub use xml::{DecodeError, ScheduleDocument, parse_document};
