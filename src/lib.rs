//! Scoring metric and light-curve preprocessing for a spectroscopy-based
//! exoplanet transit challenge.
//!
//! Three independent pieces, sequenced by the caller:
//!
//! * [`score::ScoreEvaluator`] – validates a participant submission against
//!   a ground-truth solution and computes a Gaussian log-likelihood ratio
//!   score clipped to `[0, 1]`.
//! * [`signal::SignalExtractor`] – reduces per-planet pixel-frame parquet
//!   files to net-signal rows, one configured instance per instrument
//!   channel ([`signal::AIRS_CH0`], [`signal::FGS1`]).
//! * [`features::build_features`] – derives the two transit-depth ratio
//!   features consumed by a downstream model.
//!
//! Everything is synchronous and deterministic; the only I/O is reading the
//! caller-named table and sensor files.

pub mod data;
pub mod features;
pub mod score;
pub mod signal;
pub mod stats;

pub use data::model::{CellValue, FeatureTable, RawSignalMatrix, Table};
pub use features::build_features;
pub use score::{ScoreConfig, ScoreEvaluator, ValidationError};
pub use signal::{AIRS_CH0, FGS1, SignalChannel, SignalExtractor};
