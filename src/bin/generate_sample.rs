//! Generate a miniature synthetic transit dataset and run the full pipeline
//! over it: signal extraction, feature building, scoring.
//!
//! Real challenge files weigh hundreds of megabytes per planet; the sample
//! uses scaled-down channel geometry so the whole dataset stays a few
//! kilobytes while exercising the same code paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use exolight::data::loader::load_table;
use exolight::features::{TransitWindows, build_features_with};
use exolight::score::{ScoreConfig, ScoreEvaluator};
use exolight::signal::{SignalChannel, SignalExtractor};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Scaled-down channel geometry
// ---------------------------------------------------------------------------

const N_PIXELS: usize = 8;

const DEMO_AIRS: SignalChannel = SignalChannel {
    name: "AIRS-CH0",
    file_name: "AIRS-CH0_signal_0.parquet",
    pixel_divisor: N_PIXELS as f32,
    net_samples: 30,
};

const DEMO_FGS: SignalChannel = SignalChannel {
    name: "FGS1",
    file_name: "FGS1_signal_0.parquet",
    pixel_divisor: N_PIXELS as f32,
    net_samples: 90,
};

const DEMO_AIRS_WINDOWS: TransitWindows = TransitWindows {
    before: 0..9,
    obscured: 11..19,
    after_start: 21,
};

const DEMO_FGS_WINDOWS: TransitWindows = TransitWindows {
    before: 0..27,
    obscured: 33..57,
    after_start: 63,
};

const N_WAVELENGTHS: usize = 4;
const BASE_LEVEL: f64 = 2000.0;

// ---------------------------------------------------------------------------
// Sensor-file synthesis
// ---------------------------------------------------------------------------

/// Stellar brightness at net-sample index `t`: a flat baseline with a box
/// dip of the given depth across the obscured window.
fn brightness(t: usize, windows: &TransitWindows, depth: f64) -> f64 {
    if windows.obscured.contains(&t) {
        BASE_LEVEL * (1.0 - depth)
    } else {
        BASE_LEVEL
    }
}

/// Write one planet's frame dump: alternating background/exposure frames
/// whose pair difference recovers the light curve.
fn write_signal_file(
    path: &Path,
    channel: &SignalChannel,
    windows: &TransitWindows,
    depth: f64,
    rng: &mut SimpleRng,
) -> Result<()> {
    let n_frames = 2 * channel.net_samples;
    let mut pixel_columns: Vec<Vec<i32>> = (0..N_PIXELS)
        .map(|_| Vec::with_capacity(n_frames))
        .collect();

    for t in 0..channel.net_samples {
        let signal = brightness(t, windows, depth) / N_PIXELS as f64;
        for column in &mut pixel_columns {
            // Same per-pixel background in both frames of the pair, so the
            // pair difference recovers the signal share.
            let background = 100.0 + rng.gauss(0.0, 1.0);
            column.push(background.round() as i32);
            column.push((background + signal).round() as i32);
        }
    }

    let fields: Vec<Field> = (0..N_PIXELS)
        .map(|p| Field::new(format!("pixel_{p}"), DataType::Int32, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = pixel_columns
        .into_iter()
        .map(|column| Arc::new(Int32Array::from(column)) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("creating record batch")?;

    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Table synthesis
// ---------------------------------------------------------------------------

/// Ground-truth spectrum: the transit depth with a mild wavelength slope.
fn truth_spectrum(depth: f64) -> Vec<f64> {
    (0..N_WAVELENGTHS)
        .map(|w| depth * (1.0 + 0.02 * w as f64))
        .collect()
}

fn write_tables(dir: &Path, planet_ids: &[u64], depths: &[f64], rng: &mut SimpleRng) -> Result<()> {
    let mut solution = csv::Writer::from_path(dir.join("solution.csv"))?;
    let mut submission = csv::Writer::from_path(dir.join("submission.csv"))?;

    let mut header = vec!["planet_id".to_string()];
    header.extend((1..=N_WAVELENGTHS).map(|w| format!("wl_{w}")));
    solution.write_record(&header)?;
    header.extend((1..=N_WAVELENGTHS).map(|w| format!("sigma_{w}")));
    submission.write_record(&header)?;

    for (&id, &depth) in planet_ids.iter().zip(depths) {
        let truth = truth_spectrum(depth);

        let mut solution_row = vec![id.to_string()];
        solution_row.extend(truth.iter().map(|v| v.to_string()));
        solution.write_record(&solution_row)?;

        // A decent but imperfect participant: small error, honest sigma.
        let mut submission_row = vec![id.to_string()];
        submission_row.extend(
            truth
                .iter()
                .map(|v| (v + rng.gauss(0.0, 0.0002)).max(0.0).to_string()),
        );
        submission_row.extend(truth.iter().map(|_| "0.0005".to_string()));
        submission.write_record(&submission_row)?;
    }

    solution.flush()?;
    submission.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    let out_dir = PathBuf::from("sample_data");
    let planet_ids: Vec<u64> = vec![100100, 100200, 100300];
    let depths = [0.010, 0.022, 0.005];

    for (&id, &depth) in planet_ids.iter().zip(&depths) {
        let planet_dir = out_dir.join(id.to_string());
        fs::create_dir_all(&planet_dir)
            .with_context(|| format!("creating {}", planet_dir.display()))?;
        write_signal_file(
            &planet_dir.join(DEMO_AIRS.file_name),
            &DEMO_AIRS,
            &DEMO_AIRS_WINDOWS,
            depth,
            &mut rng,
        )?;
        write_signal_file(
            &planet_dir.join(DEMO_FGS.file_name),
            &DEMO_FGS,
            &DEMO_FGS_WINDOWS,
            depth,
            &mut rng,
        )?;
    }
    write_tables(&out_dir, &planet_ids, &depths, &mut rng)?;
    println!(
        "Wrote {} planets to {}",
        planet_ids.len(),
        out_dir.display()
    );

    // Run the pipeline back over what we just wrote.
    let a_raw = SignalExtractor::new(DEMO_AIRS).extract(&out_dir, &planet_ids)?;
    let f_raw = SignalExtractor::new(DEMO_FGS).extract(&out_dir, &planet_ids)?;
    let features = build_features_with(&a_raw, &f_raw, &DEMO_AIRS_WINDOWS, &DEMO_FGS_WINDOWS);
    features.write_csv(&out_dir.join("features.csv"), &planet_ids)?;

    println!("planet_id  a_relative_reduction  f_relative_reduction");
    for (i, id) in planet_ids.iter().enumerate() {
        println!(
            "{id}     {:+.6}             {:+.6}",
            features.a_relative_reduction[i], features.f_relative_reduction[i]
        );
    }

    let solution = load_table(&out_dir.join("solution.csv"))?;
    let submission = load_table(&out_dir.join("submission.csv"))?;
    let evaluator = ScoreEvaluator::new(ScoreConfig {
        naive_mean: 0.012,
        naive_sigma: 0.01,
        sigma_true: 0.0005,
    });
    let score = evaluator.evaluate(&solution, &submission)?;
    println!("submission score: {score:.4}");

    Ok(())
}
