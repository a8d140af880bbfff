use ieeg_retriever::{
    labels, persist, retrieve, CredentialSource, IeegDataset, IeegRemote, IeegSession,
    RemoteError, RetrievalConfig, RetryPolicy,
};
use ndarray::Array2;
use std::cell::Cell;
use std::error::Error;
use std::f64::consts::PI;
use std::time::Duration;

const SAMPLE_RATE_HZ: f64 = 500.0;

/// In-memory stand-in for a remote iEEG portal: two depth electrodes of
/// eight contacts each plus an EKG lead, synthesized sine waves, and a
/// couple of simulated outages so the retry path is exercised.
struct SyntheticPortal;

struct SyntheticSession;

struct SyntheticDataset {
    labels: Vec<String>,
    remaining_outages: Cell<u32>,
}

impl IeegRemote for SyntheticPortal {
    type Session = SyntheticSession;

    fn open_session(&self, _username: &str, _credential: &str) -> Result<SyntheticSession, RemoteError> {
        Ok(SyntheticSession)
    }
}

impl IeegSession for SyntheticSession {
    type Dataset = SyntheticDataset;

    fn open_dataset(&self, _name: &str) -> Result<SyntheticDataset, RemoteError> {
        let mut labels: Vec<String> = (1..=8).map(|c| format!("LA{}", c)).collect();
        labels.extend((1..=8).map(|c| format!("LB{}", c)));
        labels.push("EKG1".to_string());
        Ok(SyntheticDataset {
            labels,
            remaining_outages: Cell::new(2),
        })
    }
}

impl IeegDataset for SyntheticDataset {
    fn channel_labels(&self) -> Result<Vec<String>, RemoteError> {
        Ok(self.labels.clone())
    }

    fn fetch(
        &self,
        start_usec: u64,
        duration_usec: u64,
        channel_ids: &[usize],
    ) -> Result<Array2<f64>, RemoteError> {
        if self.remaining_outages.get() > 0 {
            self.remaining_outages.set(self.remaining_outages.get() - 1);
            return Err(RemoteError::transient("simulated gateway timeout"));
        }
        if let Some(&bad) = channel_ids.iter().find(|&&id| id >= self.labels.len()) {
            return Err(RemoteError::permanent(format!("channel id {} out of range", bad)));
        }

        let num_samples = (duration_usec as f64 * SAMPLE_RATE_HZ / 1e6).round() as usize;
        Ok(Array2::from_shape_fn(
            (num_samples, channel_ids.len()),
            |(row, col)| {
                let t = start_usec as f64 / 1e6 + row as f64 / SAMPLE_RATE_HZ;
                let freq = 4.0 + channel_ids[col] as f64;
                (2.0 * PI * freq * t).sin() * 50.0
            },
        ))
    }

    fn sample_rate(&self, _channel_label: &str) -> Result<f64, RemoteError> {
        Ok(SAMPLE_RATE_HZ)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // 130 seconds is over the per-call duration cap, so this retrieval is
    // split into three time chunks behind the scenes.
    let config = RetrievalConfig::new(
        "demo_user",
        CredentialSource::Inline("demo_secret".into()),
        "SYNTH_PHASE_II",
        0,
        130_000_000,
    )
    .with_ignore(vec!["EKG1".into()])
    .with_retry(RetryPolicy::new(5, Duration::from_millis(100)));

    let series = retrieve(&SyntheticPortal, &config)?
        .ok_or("expected a series when no output target is set")?;

    println!("Retrieved series:");
    println!("  Samples:  {}", series.num_samples());
    println!("  Channels: {}", series.num_channels());
    println!("  Rate:     {} Hz", series.sample_rate);
    println!("  Duration: {:.1} seconds", series.duration_secs());

    println!("\nChannels:");
    for (id, name) in series.channel_ids.iter().zip(&series.channel_names).take(5) {
        println!("  {}: {}", id, name);
    }
    if series.num_channels() > 5 {
        println!("  ... and {} more", series.num_channels() - 5);
    }

    // Tidy the column names the way downstream analysis expects them.
    let (cleaned, keep) = labels::clean_channels(&series.channel_names);
    let kept = keep.iter().filter(|&&k| k).count();
    println!("\nCleaned names: {:?} ...", &cleaned[..3.min(cleaned.len())]);
    println!("Intracranial channels kept: {}/{}", kept, keep.len());

    // Round-trip the series through the binary container format.
    let out = std::env::temp_dir().join("basic_usage.series");
    persist::write_series(&out, &series)?;
    let reloaded = persist::read_series(&out)?;
    std::fs::remove_file(&out)?;
    println!(
        "\nPersistence round-trip: {} samples x {} channels match: {}",
        reloaded.num_samples(),
        reloaded.num_channels(),
        reloaded == series
    );

    Ok(())
}
