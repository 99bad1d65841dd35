//! Per-planet net-signal extraction from raw pixel-frame files.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::data::loader::read_pixel_frames;
use crate::data::model::RawSignalMatrix;

// ---------------------------------------------------------------------------
// Channel configuration
// ---------------------------------------------------------------------------

/// Fixed per-instrument constants of one signal channel.
///
/// The exposure stream alternates exposure/background frames, so the net
/// time series is exactly half the per-file frame count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalChannel {
    /// Instrument name, used in logs.
    pub name: &'static str,
    /// File name of the frame dump inside each planet directory.
    pub file_name: &'static str,
    /// Detector pixel count each frame sum is divided by.
    pub pixel_divisor: f32,
    /// Net-signal length: half the per-file frame count.
    pub net_samples: usize,
}

/// Wide-band infrared spectrometer channel (32×356 pixel grid,
/// 11250 frames per file).
pub const AIRS_CH0: SignalChannel = SignalChannel {
    name: "AIRS-CH0",
    file_name: "AIRS-CH0_signal_0.parquet",
    pixel_divisor: (32 * 356) as f32,
    net_samples: 5625,
};

/// Narrow-band guidance photometer channel (32×32 pixel grid,
/// 135000 frames per file).
pub const FGS1: SignalChannel = SignalChannel {
    name: "FGS1",
    file_name: "FGS1_signal_0.parquet",
    pixel_divisor: 1024.0,
    net_samples: 67500,
};

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Reduces per-planet pixel-frame files to one net-signal row per planet.
///
/// Two instances are used in practice, one per instrument channel; the
/// algorithm is identical, only the constants differ.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    channel: SignalChannel,
}

impl SignalExtractor {
    pub fn new(channel: SignalChannel) -> Self {
        SignalExtractor { channel }
    }

    pub fn channel(&self) -> &SignalChannel {
        &self.channel
    }

    /// Extract the net-signal matrix for `planet_ids`, in input order.
    ///
    /// Reads `<dataset_dir>/<planet_id>/<file_name>` for each planet.  The
    /// output matrix is NaN-filled up front; the first unreadable or
    /// malformed file aborts the whole batch with the planet and path named.
    pub fn extract(&self, dataset_dir: &Path, planet_ids: &[u64]) -> Result<RawSignalMatrix> {
        let mut raw = RawSignalMatrix::filled_nan(planet_ids.len(), self.channel.net_samples);

        log::info!(
            "extracting {} net signals for {} planets from {}",
            self.channel.name,
            planet_ids.len(),
            dataset_dir.display()
        );

        for (i, &planet_id) in planet_ids.iter().enumerate() {
            let path = dataset_dir
                .join(planet_id.to_string())
                .join(self.channel.file_name);
            let net = self
                .net_signal(&path)
                .with_context(|| format!("planet {planet_id}: {}", path.display()))?;
            raw.row_mut(i).copy_from_slice(&net);
            log::debug!(
                "planet {planet_id}: {} {} frames reduced to {} net samples",
                2 * self.channel.net_samples,
                self.channel.name,
                self.channel.net_samples
            );
        }

        Ok(raw)
    }

    /// One planet: frame pixel sums → mean signal → exposure/background
    /// pair differences.
    fn net_signal(&self, path: &Path) -> Result<Vec<f32>> {
        let frames = read_pixel_frames(path)?;
        if frames.n_frames != 2 * self.channel.net_samples {
            bail!(
                "expected {} frames, found {}",
                2 * self.channel.net_samples,
                frames.n_frames
            );
        }

        let mut mean_signal = Vec::with_capacity(frames.n_frames);
        for f in 0..frames.n_frames {
            let sum: i64 = frames.frame(f).iter().map(|&v| v as i64).sum();
            mean_signal.push(sum as f32 / self.channel.pixel_divisor);
        }

        Ok(pair_difference(&mean_signal))
    }
}

/// Frame-pair difference: exposure (odd position) minus background (even
/// position), one net point per pair.
fn pair_difference(mean_signal: &[f32]) -> Vec<f32> {
    mean_signal
        .chunks_exact(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}
