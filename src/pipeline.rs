use log::{debug, info};

use crate::assemble::assemble;
use crate::fetch::{fetch_chunk, with_retry};
use crate::labels::clean_label;
use crate::plan::plan_chunks;
use crate::remote::{IeegDataset, IeegRemote, IeegSession};
use crate::select::{resolve_channels, ResolvedChannels};
use crate::types::{
    ChannelSpec, Electrode, RetrievalConfig, RetrievalError, RetrievedSeries, ServiceLimits,
    TimeRange,
};
use crate::persist;

/// Runs one full retrieval: connect, resolve channels, plan, fetch every
/// chunk in order, assemble, and either return the series or write it to
/// the configured output target (returning `None`).
///
/// Progresses through connecting, channel resolution, planning, fetching
/// and assembly strictly in that order; the first failure at any stage
/// aborts the whole call with the matching [`RetrievalError`]. Chunks are
/// fetched sequentially in plan order, so the assembled series is
/// deterministic.
pub fn retrieve<R: IeegRemote>(
    remote: &R,
    config: &RetrievalConfig,
) -> Result<Option<RetrievedSeries>, RetrievalError> {
    config.validate()?;
    let range = TimeRange::new(config.start_usec, config.stop_usec)?;

    // Connecting. Session and dataset acquisition share the chunk-fetch
    // retry policy; the credential is re-read on every attempt.
    let what = format!("open of dataset '{}'", config.dataset_name);
    let (dataset, mut all_labels) = with_retry(&config.retry, &what, || {
        let credential = config.credential_source.resolve()?;
        let session = remote.open_session(&config.username, &credential)?;
        let dataset = session.open_dataset(&config.dataset_name)?;
        let labels = dataset.channel_labels()?;
        Ok((dataset, labels))
    })
    .map_err(|failure| RetrievalError::Connection {
        dataset: config.dataset_name.clone(),
        attempts: failure.attempts,
        source: failure.error,
    })?;
    info!(
        "connected to dataset '{}' ({} channels)",
        config.dataset_name,
        all_labels.len()
    );

    // Resolving channels, after optional label cleaning of both the
    // dataset's labels and the caller's spec.
    let mut spec = config.channel_spec();
    if config.clean_channel_labels {
        let remove = config.remove_substring.as_deref();
        let delimiter = config.split_delimiter.as_deref();
        for label in &mut all_labels {
            *label = clean_label(label, remove, delimiter);
        }
        spec = spec.map(|spec| clean_spec(spec, remove, delimiter));
        info!(
            "cleaned channel labels (remove: {:?}, delimiter: {:?})",
            config.remove_substring, config.split_delimiter
        );
    }
    let ResolvedChannels { ids, names } = resolve_channels(&all_labels, spec.as_ref())?;
    info!("resolved {} of {} channels", ids.len(), all_labels.len());

    // Planning against the service's fixed per-call limits.
    let plan = plan_chunks(range, &ids, &ServiceLimits::default())?;
    info!(
        "planned {} chunk(s) over {:.1} s (split axis: {:?})",
        plan.num_chunks(),
        range.duration_secs(),
        plan.axis
    );

    // Fetching, strictly sequential in plan order. The first chunk that
    // exhausts its retries aborts the retrieval; no partial series is
    // ever produced.
    let mut blocks = Vec::with_capacity(plan.num_chunks());
    for (index, chunk) in plan.chunks.iter().enumerate() {
        debug!(
            "fetching chunk {}/{}: [{}, {}) us, {} channel(s)",
            index + 1,
            plan.num_chunks(),
            chunk.range.start_usec(),
            chunk.range.stop_usec(),
            chunk.num_channels()
        );
        blocks.push(fetch_chunk(&dataset, chunk, &config.retry)?);
    }

    // Assembling, then pairing with the sample rate shared by the
    // selection.
    let data = assemble(&blocks, plan.axis)?;
    let sample_rate = read_sample_rate(&dataset, &names)?;
    let series = RetrievedSeries {
        data,
        channel_ids: ids,
        channel_names: names,
        sample_rate,
    };
    info!(
        "retrieved {} samples x {} channels at {} Hz from '{}'",
        series.num_samples(),
        series.num_channels(),
        series.sample_rate,
        config.dataset_name
    );

    match &config.output_target {
        Some(path) => {
            persist::write_series(path, &series).map_err(|source| RetrievalError::Output {
                path: path.clone(),
                source,
            })?;
            info!("series written to '{}'", path.display());
            Ok(None)
        }
        None => Ok(Some(series)),
    }
}

/// Helper to clean the label electrodes of a spec; numeric ids are left
/// alone.
fn clean_spec(spec: ChannelSpec, remove: Option<&str>, delimiter: Option<&str>) -> ChannelSpec {
    let electrodes = spec
        .electrodes
        .into_iter()
        .map(|electrode| match electrode {
            Electrode::Label(label) => Electrode::Label(clean_label(&label, remove, delimiter)),
            id => id,
        })
        .collect();
    ChannelSpec {
        electrodes,
        mode: spec.mode,
    }
}

/// Reads the sample rate of every resolved channel and checks they agree.
///
/// A disagreement across the selection means the series cannot carry one
/// scalar rate, which is a fatal inconsistency. Rates within 0.01 Hz of
/// each other are considered equal.
fn read_sample_rate<D: IeegDataset>(
    dataset: &D,
    names: &[String],
) -> Result<f64, RetrievalError> {
    let mut rate: Option<(f64, &str)> = None;
    for name in names {
        let current = dataset.sample_rate(name).map_err(|err| {
            RetrievalError::Assembly(format!(
                "could not read the sample rate of '{}': {}",
                name, err
            ))
        })?;
        match rate {
            None => rate = Some((current, name.as_str())),
            Some((first, first_name)) if (first - current).abs() > 0.01 => {
                return Err(RetrievalError::Assembly(format!(
                    "sample rate mismatch: '{}' is {} Hz but '{}' is {} Hz",
                    first_name, first, name, current
                )));
            }
            Some(_) => {}
        }
    }
    match rate {
        Some((value, _)) => Ok(value),
        None => Err(RetrievalError::Assembly(
            "no channels to read a sample rate from".to_string(),
        )),
    }
}
