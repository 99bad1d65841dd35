//! End-to-end pipeline tests over real parquet fixtures in a temp directory:
//! frame files → extraction → features, and table files → scoring.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use exolight::data::loader::load_table;
use exolight::features::{TransitWindows, build_features_with};
use exolight::score::{ScoreConfig, ScoreEvaluator};
use exolight::signal::{SignalChannel, SignalExtractor};

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("exolight-{tag}-{}", std::process::id()));
    fs::remove_dir_all(&dir).ok();
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write a pixel-frame parquet file from per-pixel columns.
fn write_frames(path: &Path, pixel_columns: &[Vec<i32>]) {
    let fields: Vec<Field> = (0..pixel_columns.len())
        .map(|p| Field::new(format!("pixel_{p}"), DataType::Int32, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = pixel_columns
        .iter()
        .map(|column| Arc::new(Int32Array::from(column.clone())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).unwrap();

    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

const TEST_CHANNEL: SignalChannel = SignalChannel {
    name: "AIRS-CH0",
    file_name: "AIRS-CH0_signal_0.parquet",
    pixel_divisor: 2.0,
    net_samples: 2,
};

#[test]
fn extract_matches_hand_computed_net_signal() {
    let dir = temp_dir("net-signal");
    let planet_dir = dir.join("7");
    fs::create_dir_all(&planet_dir).unwrap();

    // Frames: [1,2] [5,6] [10,20] [30,40]; pixel sums 3, 11, 30, 70;
    // means (divisor 2) 1.5, 5.5, 15, 35; net = [4, 20].
    write_frames(
        &planet_dir.join(TEST_CHANNEL.file_name),
        &[vec![1, 5, 10, 30], vec![2, 6, 20, 40]],
    );

    let raw = SignalExtractor::new(TEST_CHANNEL)
        .extract(&dir, &[7])
        .unwrap();
    assert_eq!(raw.n_entities(), 1);
    assert_eq!(raw.n_samples(), 2);
    assert_eq!(raw.row(0), &[4.0, 20.0]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn extract_output_shape_tracks_planet_count() {
    let dir = temp_dir("shape");
    for id in [1u64, 2, 3] {
        let planet_dir = dir.join(id.to_string());
        fs::create_dir_all(&planet_dir).unwrap();
        write_frames(
            &planet_dir.join(TEST_CHANNEL.file_name),
            &[vec![1, 1, 1, 1], vec![1, 1, 1, 1]],
        );
    }

    let raw = SignalExtractor::new(TEST_CHANNEL)
        .extract(&dir, &[1, 2, 3])
        .unwrap();
    assert_eq!(raw.n_entities(), 3);
    assert_eq!(raw.n_samples(), TEST_CHANNEL.net_samples);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn extract_rejects_wrong_frame_count() {
    let dir = temp_dir("frame-count");
    let planet_dir = dir.join("9");
    fs::create_dir_all(&planet_dir).unwrap();
    // 6 frames, but the channel expects 4.
    write_frames(
        &planet_dir.join(TEST_CHANNEL.file_name),
        &[vec![1; 6], vec![1; 6]],
    );

    let err = SignalExtractor::new(TEST_CHANNEL)
        .extract(&dir, &[9])
        .unwrap_err();
    let msg = format!("{err:#}");
    assert!(msg.contains("planet 9"), "unexpected error: {msg}");
    assert!(msg.contains("expected 4 frames"), "unexpected error: {msg}");

    fs::remove_dir_all(&dir).ok();
}

// ---------------------------------------------------------------------------
// Full pipeline: synthetic transits → features → score
// ---------------------------------------------------------------------------

const PIPE_AIRS: SignalChannel = SignalChannel {
    name: "AIRS-CH0",
    file_name: "AIRS-CH0_signal_0.parquet",
    pixel_divisor: 4.0,
    net_samples: 12,
};

const PIPE_FGS: SignalChannel = SignalChannel {
    name: "FGS1",
    file_name: "FGS1_signal_0.parquet",
    pixel_divisor: 4.0,
    net_samples: 24,
};

const PIPE_AIRS_WINDOWS: TransitWindows = TransitWindows {
    before: 0..4,
    obscured: 5..9,
    after_start: 10,
};

const PIPE_FGS_WINDOWS: TransitWindows = TransitWindows {
    before: 0..8,
    obscured: 10..18,
    after_start: 20,
};

/// Noise-free frame pairs for a box transit: background 10 counts per pixel,
/// exposure adds `level` (full) or `level·(1-depth)` (in transit).
fn transit_frames(
    channel: &SignalChannel,
    windows: &TransitWindows,
    level: i32,
    dipped: i32,
) -> Vec<Vec<i32>> {
    let n_pixels = channel.pixel_divisor as usize;
    let mut columns = vec![Vec::new(); n_pixels];
    for t in 0..channel.net_samples {
        let signal = if windows.obscured.contains(&t) {
            dipped
        } else {
            level
        };
        for column in &mut columns {
            column.push(10);
            column.push(10 + signal);
        }
    }
    columns
}

#[test]
fn pipeline_recovers_transit_depths() {
    let dir = temp_dir("pipeline");
    let planet_ids = [11u64, 12];
    // Per-pixel in-transit levels: planet 11 dips 100→75 (depth 0.25),
    // planet 12 dips 100→90 (depth 0.10).
    let dips = [75, 90];

    for (&id, &dipped) in planet_ids.iter().zip(&dips) {
        let planet_dir = dir.join(id.to_string());
        fs::create_dir_all(&planet_dir).unwrap();
        write_frames(
            &planet_dir.join(PIPE_AIRS.file_name),
            &transit_frames(&PIPE_AIRS, &PIPE_AIRS_WINDOWS, 100, dipped),
        );
        write_frames(
            &planet_dir.join(PIPE_FGS.file_name),
            &transit_frames(&PIPE_FGS, &PIPE_FGS_WINDOWS, 100, dipped),
        );
    }

    let a_raw = SignalExtractor::new(PIPE_AIRS)
        .extract(&dir, &planet_ids)
        .unwrap();
    let f_raw = SignalExtractor::new(PIPE_FGS)
        .extract(&dir, &planet_ids)
        .unwrap();
    let features = build_features_with(&a_raw, &f_raw, &PIPE_AIRS_WINDOWS, &PIPE_FGS_WINDOWS);

    assert_eq!(features.len(), 2);
    assert!((features.a_relative_reduction[0] - 0.25).abs() < 1e-9);
    assert!((features.f_relative_reduction[0] - 0.25).abs() < 1e-9);
    assert!((features.a_relative_reduction[1] - 0.10).abs() < 1e-9);
    assert!((features.f_relative_reduction[1] - 0.10).abs() < 1e-9);

    // Export and reload the feature table.
    let features_path = dir.join("features.csv");
    features.write_csv(&features_path, &planet_ids).unwrap();
    let reloaded = load_table(&features_path).unwrap();
    assert_eq!(
        reloaded.columns,
        vec!["planet_id", "a_relative_reduction", "f_relative_reduction"]
    );
    assert_eq!(reloaded.n_rows(), 2);

    fs::remove_dir_all(&dir).ok();
}

// ---------------------------------------------------------------------------
// Table loading and scoring
// ---------------------------------------------------------------------------

/// Write the same small solution table as parquet.
fn write_solution_parquet(path: &Path) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("planet_id", DataType::Int64, false),
        Field::new("wl_1", DataType::Float64, false),
        Field::new("wl_2", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(vec![7, 8])) as ArrayRef,
            Arc::new(Float64Array::from(vec![0.01, 0.03])) as ArrayRef,
            Arc::new(Float64Array::from(vec![0.02, 0.04])) as ArrayRef,
        ],
    )
    .unwrap();
    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

#[test]
fn csv_and_parquet_loaders_agree() {
    let dir = temp_dir("formats");
    let csv_path = dir.join("solution.csv");
    let parquet_path = dir.join("solution.parquet");
    fs::write(&csv_path, "planet_id,wl_1,wl_2\n7,0.01,0.02\n8,0.03,0.04\n").unwrap();
    write_solution_parquet(&parquet_path);

    let from_csv = load_table(&csv_path).unwrap();
    let from_parquet = load_table(&parquet_path).unwrap();
    assert_eq!(from_csv.columns, from_parquet.columns);
    assert_eq!(from_csv.rows, from_parquet.rows);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn scoring_from_loaded_tables() {
    let dir = temp_dir("scoring");
    let solution_path = dir.join("solution.csv");
    let submission_path = dir.join("submission.csv");
    fs::write(&solution_path, "planet_id,wl_1,wl_2\n7,0.01,0.02\n8,0.03,0.04\n").unwrap();
    // Exact means with sigma equal to sigma_true: a perfect submission.
    fs::write(
        &submission_path,
        "planet_id,wl_1,wl_2,sigma_1,sigma_2\n7,0.01,0.02,0.001,0.001\n8,0.03,0.04,0.001,0.001\n",
    )
    .unwrap();

    let solution = load_table(&solution_path).unwrap();
    let submission = load_table(&submission_path).unwrap();

    let calibration_path = dir.join("calibration.json");
    fs::write(
        &calibration_path,
        r#"{ "naive_mean": 0.02, "naive_sigma": 0.05, "sigma_true": 0.001 }"#,
    )
    .unwrap();
    let config = ScoreConfig::from_path(&calibration_path).unwrap();

    let score = ScoreEvaluator::new(config)
        .evaluate(&solution, &submission)
        .unwrap();
    assert!((score - 1.0).abs() < 1e-12);

    fs::remove_dir_all(&dir).ok();
}
