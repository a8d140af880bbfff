use log::warn;
use ndarray::Array2;
use std::thread;

use crate::remote::{IeegDataset, RemoteError};
use crate::types::{ChunkRequest, RetrievalError, RetryPolicy};

/// Terminal outcome of a bounded-retry loop: the last error and how many
/// calls were made before giving up.
pub(crate) struct AttemptFailure {
    pub attempts: u32,
    pub error: RemoteError,
}

/// Runs `op` until it succeeds, a permanent failure occurs, or the attempt
/// budget is exhausted, sleeping `policy.delay` between attempts.
///
/// Transient failures are retried; the first permanent failure is returned
/// immediately with the attempts made so far. `what` labels the operation
/// in retry logs.
pub(crate) fn with_retry<T, F>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, AttemptFailure>
where
    F: FnMut() -> Result<T, RemoteError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < max_attempts => {
                warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    what, attempt, max_attempts, error, policy.delay
                );
                thread::sleep(policy.delay);
            }
            Err(error) => return Err(AttemptFailure { attempts: attempt, error }),
        }
    }
}

/// Fetches one planned chunk from the dataset, retrying per `policy`.
///
/// Returns the raw block on the first success. Exhausting the attempt
/// budget (or hitting a permanent failure) yields
/// [`RetrievalError::ChunkFetch`] identifying the chunk's time range and
/// channel count.
pub fn fetch_chunk<D: IeegDataset>(
    dataset: &D,
    request: &ChunkRequest,
    policy: &RetryPolicy,
) -> Result<Array2<f64>, RetrievalError> {
    let what = format!(
        "fetch of [{}, {}) us ({} channel(s))",
        request.range.start_usec(),
        request.range.stop_usec(),
        request.num_channels()
    );
    with_retry(policy, &what, || {
        dataset.fetch(
            request.range.start_usec(),
            request.range.duration_usec(),
            &request.channel_ids,
        )
    })
    .map_err(|failure| RetrievalError::ChunkFetch {
        start_usec: request.range.start_usec(),
        stop_usec: request.range.stop_usec(),
        channels: request.num_channels(),
        attempts: failure.attempts,
        source: failure.error,
    })
}
