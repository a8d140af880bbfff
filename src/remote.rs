use ndarray::Array2;
use thiserror::Error;

/// How a remote failure should be treated by retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Temporary condition (network hiccup, throttling); worth retrying.
    Transient,
    /// Definitive failure (bad credentials, unknown dataset); retrying cannot help.
    Permanent,
}

/// Error reported by a remote capability implementation.
///
/// Carries a [`FailureKind`] so the retry logic can distinguish conditions
/// worth waiting out from definitive failures. Implementations that cannot
/// classify a failure should report it as transient; the bounded attempt
/// count still guarantees termination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    kind: FailureKind,
    message: String,
}

impl RemoteError {
    /// A failure worth retrying.
    pub fn transient(message: impl Into<String>) -> Self {
        RemoteError {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    /// A failure that no amount of retrying will fix.
    pub fn permanent(message: impl Into<String>) -> Self {
        RemoteError {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

/// Entry point to a remote dataset service.
///
/// The retrieval pipeline is written against these three traits rather than
/// any specific client library; any networked or in-memory implementation
/// satisfying them works. See `demos/basic_usage.rs` for a synthetic
/// implementation.
pub trait IeegRemote {
    type Session: IeegSession;

    /// Authenticates and opens a session. May fail transiently.
    fn open_session(&self, username: &str, credential: &str) -> Result<Self::Session, RemoteError>;
}

/// An authenticated session, able to open named datasets.
pub trait IeegSession {
    type Dataset: IeegDataset;

    fn open_dataset(&self, name: &str) -> Result<Self::Dataset, RemoteError>;
}

/// An open dataset handle.
///
/// The order of [`channel_labels`](IeegDataset::channel_labels) defines the
/// numeric channel ids `0..n-1` used by [`fetch`](IeegDataset::fetch).
pub trait IeegDataset {
    /// Full channel label list in dataset-assigned order.
    fn channel_labels(&self) -> Result<Vec<String>, RemoteError>;

    /// Fetches one block of signal data.
    ///
    /// Returns a matrix with one row per sample and one column per entry of
    /// `channel_ids`, in the given order.
    fn fetch(
        &self,
        start_usec: u64,
        duration_usec: u64,
        channel_ids: &[usize],
    ) -> Result<Array2<f64>, RemoteError>;

    /// Sample rate of the named channel, in Hz.
    fn sample_rate(&self, channel_label: &str) -> Result<f64, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(RemoteError::transient("timed out").is_transient());
        assert!(!RemoteError::permanent("no such dataset").is_transient());
        assert_eq!(
            RemoteError::permanent("no such dataset").kind(),
            FailureKind::Permanent
        );
    }

    #[test]
    fn display_is_the_message() {
        let err = RemoteError::transient("connection reset");
        assert_eq!(err.to_string(), "connection reset");
    }
}
