//! Chunked, retry-capable retrieval of intracranial EEG time-series from
//! remote dataset services.
//!
//! Remote iEEG portals cap how much data one call may return, both by
//! clip duration and by channel count. This crate resolves a channel
//! selection against a dataset, splits an oversized request into
//! service-legal chunks along one axis, fetches each chunk with bounded
//! retry against a flaky service, and reassembles the results into a
//! single time-ordered, channel-ordered matrix with its sample rate.
//!
//! The remote service is abstracted behind the [`remote`] capability
//! traits, so the pipeline runs unchanged against a networked client or
//! an in-memory test double.
//!
//! # Examples
//!
//! ```
//! use ieeg_retriever::{CredentialSource, RetrievalConfig};
//!
//! let config = RetrievalConfig::new(
//!     "pattnaik",
//!     CredentialSource::File("pat_ieeglogin.bin".into()),
//!     "HUP172_phaseII",
//!     402_580_000_000,
//!     402_800_000_000,
//! )
//! .with_select(vec!["LE10".into(), "LE11".into(), "LH01".into(), "LH02".into()]);
//! assert_eq!(config.dataset_name, "HUP172_phaseII");
//!
//! // With a remote implementation in hand:
//! // let series = ieeg_retriever::retrieve(&client, &config)?;
//! ```

mod assemble;
mod fetch;
mod pipeline;
mod plan;
mod select;

pub mod labels;
pub mod persist;
pub mod remote;
pub mod types;

// Re-export the data model and the individual pipeline stages.
pub use types::*;

pub use assemble::assemble;
pub use fetch::fetch_chunk;
pub use plan::plan_chunks;
pub use remote::{FailureKind, IeegDataset, IeegRemote, IeegSession, RemoteError};
pub use select::{resolve_channels, ResolvedChannels};

/// Retrieves a time-series from a remote dataset per the configuration.
///
/// Returns the assembled [`RetrievedSeries`] directly, or `None` when the
/// configuration names an output target (the series is then written there
/// instead).
///
/// Any failure — connection retries exhausted, unknown channel labels, a
/// request the planner cannot make service-legal, a chunk that never
/// fetched, an inconsistent result set — aborts the whole call; a partial
/// series is never returned.
pub fn retrieve<R: IeegRemote>(
    remote: &R,
    config: &RetrievalConfig,
) -> Result<Option<RetrievedSeries>, RetrievalError> {
    pipeline::retrieve(remote, config)
}
