//! Data layer: core types and file loading.
//!
//! ```text
//!  solution.csv / submission.parquet     <planet_id>/AIRS-CH0_signal_0.parquet
//!        │                                     │
//!        ▼                                     ▼
//!   ┌────────┐                           ┌────────┐
//!   │ loader │ → Table                   │ loader │ → PixelFrames
//!   └────────┘                           └────────┘
//!        │                                     │
//!        ▼                                     ▼
//!   ScoreEvaluator                   SignalExtractor → RawSignalMatrix
//! ```

pub mod loader;
pub mod model;
