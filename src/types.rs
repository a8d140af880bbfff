use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::remote::RemoteError;

// Per-call limits imposed by the remote service and the sizes used when
// splitting an oversized request (microseconds / channel counts).
pub const MAX_CLIP_DURATION_USEC: u64 = 120_000_000;
pub const MAX_CHANNELS_PER_CALL: usize = 100;
pub const TIME_CHUNK_USEC: u64 = 60_000_000;
pub const CHANNEL_CHUNK: usize = 20;

// Default retry behavior against a flaky service.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Half-open time window `[start_usec, stop_usec)` in microseconds.
///
/// Constructed through [`TimeRange::new`], which rejects empty or inverted
/// windows, so a `TimeRange` always has a positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start_usec: u64,
    stop_usec: u64,
}

impl TimeRange {
    pub fn new(start_usec: u64, stop_usec: u64) -> Result<Self, RetrievalError> {
        if stop_usec <= start_usec {
            return Err(RetrievalError::InvalidInput(format!(
                "time range [{}, {}) us is empty or inverted",
                start_usec, stop_usec
            )));
        }
        Ok(TimeRange {
            start_usec,
            stop_usec,
        })
    }

    pub fn start_usec(&self) -> u64 {
        self.start_usec
    }

    pub fn stop_usec(&self) -> u64 {
        self.stop_usec
    }

    pub fn duration_usec(&self) -> u64 {
        self.stop_usec - self.start_usec
    }

    /// Duration in seconds, for logging and summaries.
    pub fn duration_secs(&self) -> f64 {
        self.duration_usec() as f64 / 1e6
    }
}

/// One entry of a channel specification: a label as reported by the
/// dataset, or a numeric id (the label's position in the dataset's
/// channel list).
///
/// Deserializes untagged, so a JSON config may say `["LA1", "LA2"]` or
/// `[0, 1]`. A list mixing both kinds is rejected during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Electrode {
    Id(usize),
    Label(String),
}

impl From<usize> for Electrode {
    fn from(id: usize) -> Self {
        Electrode::Id(id)
    }
}

impl From<&str> for Electrode {
    fn from(label: &str) -> Self {
        Electrode::Label(label.to_string())
    }
}

impl From<String> for Electrode {
    fn from(label: String) -> Self {
        Electrode::Label(label)
    }
}

/// Whether a [`ChannelSpec`] names the channels to keep or to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Select,
    Ignore,
}

/// A caller-supplied channel selection: a list of electrodes plus a mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub electrodes: Vec<Electrode>,
    pub mode: SelectionMode,
}

impl ChannelSpec {
    pub fn select(electrodes: Vec<Electrode>) -> Self {
        ChannelSpec {
            electrodes,
            mode: SelectionMode::Select,
        }
    }

    pub fn ignore(electrodes: Vec<Electrode>) -> Self {
        ChannelSpec {
            electrodes,
            mode: SelectionMode::Ignore,
        }
    }
}

/// One service-legal unit of work: a time window plus the channel ids to
/// fetch for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRequest {
    pub range: TimeRange,
    pub channel_ids: Vec<usize>,
}

impl ChunkRequest {
    pub fn num_channels(&self) -> usize {
        self.channel_ids.len()
    }
}

/// Which axis the planner split a request along.
///
/// The assembler concatenates chunk results along the matching matrix axis:
/// samples for `Time`, channels for `Channel` (and for the trivial `None`
/// single-chunk case).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    None,
    Time,
    Channel,
}

/// Ordered chunk requests plus the axis they were split along.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub chunks: Vec<ChunkRequest>,
    pub axis: SplitAxis,
}

impl ChunkPlan {
    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }
}

/// Per-call limits of the remote service and the sizes used when splitting.
///
/// Each chunk size must be positive and no larger than its corresponding
/// limit. The defaults mirror the service's documented request caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceLimits {
    pub max_duration_usec: u64,
    pub max_channels: usize,
    pub time_chunk_usec: u64,
    pub channel_chunk: usize,
}

impl Default for ServiceLimits {
    fn default() -> Self {
        ServiceLimits {
            max_duration_usec: MAX_CLIP_DURATION_USEC,
            max_channels: MAX_CHANNELS_PER_CALL,
            time_chunk_usec: TIME_CHUNK_USEC,
            channel_chunk: CHANNEL_CHUNK,
        }
    }
}

/// Bounded-retry policy for remote calls.
///
/// Applies to session acquisition and to every chunk fetch. Only transient
/// failures are retried; a permanent failure aborts immediately regardless
/// of the attempts remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of calls allowed, including the first one.
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Where the service credential comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Read from a file at connection time (re-read on every attempt).
    File(PathBuf),
    /// Supplied directly.
    Inline(String),
}

impl CredentialSource {
    pub(crate) fn resolve(&self) -> Result<String, RemoteError> {
        match self {
            CredentialSource::Inline(secret) => Ok(secret.clone()),
            CredentialSource::File(path) => fs::read_to_string(path).map_err(|err| {
                RemoteError::permanent(format!(
                    "could not read credential file '{}': {}",
                    path.display(),
                    err
                ))
            }),
        }
    }
}

/// Everything a retrieval call needs besides the remote capability itself.
///
/// Exactly one of `select_electrodes` / `ignore_electrodes` may be set;
/// neither means "all channels". When `clean_channel_labels` is set, the
/// dataset's labels and any label electrodes in the spec are normalized
/// with [`crate::labels::clean_labels`] before resolution.
///
/// # Examples
///
/// ```
/// use ieeg_retriever::{CredentialSource, RetrievalConfig};
///
/// let config = RetrievalConfig::new(
///     "pattnaik",
///     CredentialSource::File("pat_ieeglogin.bin".into()),
///     "HUP172_phaseII",
///     402_580_000_000,
///     402_800_000_000,
/// )
/// .with_select(vec!["LE10".into(), "LE11".into(), "LH01".into()]);
///
/// assert!(config.output_target.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub username: String,
    pub credential_source: CredentialSource,
    pub dataset_name: String,
    pub start_usec: u64,
    pub stop_usec: u64,
    #[serde(default)]
    pub select_electrodes: Option<Vec<Electrode>>,
    #[serde(default)]
    pub ignore_electrodes: Option<Vec<Electrode>>,
    #[serde(default)]
    pub clean_channel_labels: bool,
    #[serde(default)]
    pub remove_substring: Option<String>,
    #[serde(default)]
    pub split_delimiter: Option<String>,
    /// If set, the retrieved series is written here and the pipeline
    /// returns no value.
    #[serde(default)]
    pub output_target: Option<PathBuf>,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl RetrievalConfig {
    pub fn new(
        username: impl Into<String>,
        credential_source: CredentialSource,
        dataset_name: impl Into<String>,
        start_usec: u64,
        stop_usec: u64,
    ) -> Self {
        RetrievalConfig {
            username: username.into(),
            credential_source,
            dataset_name: dataset_name.into(),
            start_usec,
            stop_usec,
            select_electrodes: None,
            ignore_electrodes: None,
            clean_channel_labels: false,
            remove_substring: None,
            split_delimiter: None,
            output_target: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, RetrievalError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            RetrievalError::InvalidInput(format!(
                "could not read config file '{}': {}",
                path.display(),
                err
            ))
        })?;
        serde_json::from_str(&text).map_err(|err| {
            RetrievalError::InvalidInput(format!(
                "could not parse config file '{}': {}",
                path.display(),
                err
            ))
        })
    }

    pub fn with_select(mut self, electrodes: Vec<Electrode>) -> Self {
        self.select_electrodes = Some(electrodes);
        self
    }

    pub fn with_ignore(mut self, electrodes: Vec<Electrode>) -> Self {
        self.ignore_electrodes = Some(electrodes);
        self
    }

    pub fn with_cleaning(
        mut self,
        remove_substring: Option<String>,
        split_delimiter: Option<String>,
    ) -> Self {
        self.clean_channel_labels = true;
        self.remove_substring = remove_substring;
        self.split_delimiter = split_delimiter;
        self
    }

    pub fn with_output_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_target = Some(path.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), RetrievalError> {
        if self.select_electrodes.is_some() && self.ignore_electrodes.is_some() {
            return Err(RetrievalError::InvalidInput(
                "select_electrodes and ignore_electrodes cannot both be set".to_string(),
            ));
        }
        // Range validity is re-checked by TimeRange::new; checking here keeps
        // the failure ahead of any credential read.
        if self.stop_usec <= self.start_usec {
            return Err(RetrievalError::InvalidInput(format!(
                "time range [{}, {}) us is empty or inverted",
                self.start_usec, self.stop_usec
            )));
        }
        Ok(())
    }

    pub(crate) fn channel_spec(&self) -> Option<ChannelSpec> {
        if let Some(electrodes) = &self.select_electrodes {
            Some(ChannelSpec::select(electrodes.clone()))
        } else {
            self.ignore_electrodes
                .as_ref()
                .map(|electrodes| ChannelSpec::ignore(electrodes.clone()))
        }
    }
}

/// Final output of a retrieval: the assembled signal matrix plus the
/// channel identity and sample-rate metadata that describe it.
///
/// Rows are samples in chronological order; columns are the resolved
/// channels in resolution order. The sample rate is the single value
/// shared by every channel in the series.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedSeries {
    pub data: Array2<f64>,
    pub channel_ids: Vec<usize>,
    pub channel_names: Vec<String>,
    /// Sample rate in Hz, uniform across all channels.
    pub sample_rate: f64,
}

impl RetrievedSeries {
    pub fn num_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_channels(&self) -> usize {
        self.data.ncols()
    }

    /// Duration of the series in seconds.
    ///
    /// Returns 0.0 for an empty series.
    pub fn duration_secs(&self) -> f64 {
        if self.num_samples() == 0 {
            0.0
        } else {
            self.num_samples() as f64 / self.sample_rate
        }
    }
}

/// Fatal error conditions of a retrieval call.
///
/// Every variant aborts the whole retrieval; retries happen below this
/// level and are visible to the caller only as elapsed time.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Session or dataset acquisition failed for good.
    #[error("failed to open dataset '{dataset}' after {attempts} attempt(s): {source}")]
    Connection {
        dataset: String,
        attempts: u32,
        #[source]
        source: RemoteError,
    },

    /// A requested label does not exist in the dataset. Raised before any
    /// data is fetched.
    #[error("channel label(s) not in dataset: {}", .labels.join(", "))]
    UnknownChannel { labels: Vec<String> },

    /// The request itself is malformed (empty range, mixed spec, over both
    /// service limits at once, ...). Raised before any network call.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// One chunk exhausted its retry budget or hit a permanent failure.
    #[error(
        "failed to fetch chunk [{start_usec}, {stop_usec}) us ({channels} channel(s)) \
         after {attempts} attempt(s): {source}"
    )]
    ChunkFetch {
        start_usec: u64,
        stop_usec: u64,
        channels: usize,
        attempts: u32,
        #[source]
        source: RemoteError,
    },

    /// Chunk results could not be combined into one consistent series.
    #[error("assembly failed: {0}")]
    Assembly(String),

    /// The series could not be written to the configured output target.
    #[error("failed to write series to '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
