//! Transit-depth ratio features from the raw net-signal matrices.

use std::ops::Range;

use crate::data::model::{FeatureTable, RawSignalMatrix};
use crate::stats::mean;

// ---------------------------------------------------------------------------
// Transit windows
// ---------------------------------------------------------------------------

/// Fixed index windows partitioning one channel's sample axis around the
/// known transit timing: an in-transit window flanked by two baselines.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitWindows {
    /// Baseline window before ingress.
    pub before: Range<usize>,
    /// In-transit (obscured) window.
    pub obscured: Range<usize>,
    /// Start of the baseline window after egress; runs to the end of the row.
    pub after_start: usize,
}

/// Windows for the wide-band AIRS-CH0 net signal (5625 samples).
pub const AIRS_CH0_WINDOWS: TransitWindows = TransitWindows {
    before: 0..1708,
    obscured: 1958..3666,
    after_start: 3916,
};

/// Windows for the narrow-band FGS1 net signal (67500 samples).
pub const FGS1_WINDOWS: TransitWindows = TransitWindows {
    before: 0..20500,
    obscured: 23500..44000,
    after_start: 47000,
};

// ---------------------------------------------------------------------------
// Feature building
// ---------------------------------------------------------------------------

/// Fractional brightness dip of one net-signal row during transit.
///
/// The baseline is the plain average of the two flanking window means, not
/// a sample-count-weighted mean.  A zero baseline propagates NaN or an
/// infinity; callers must handle it.
pub fn relative_reduction(row: &[f32], windows: &TransitWindows) -> f64 {
    let unobscured =
        (mean(&row[windows.before.clone()]) + mean(&row[windows.after_start..])) / 2.0;
    let obscured = mean(&row[windows.obscured.clone()]);
    (unobscured - obscured) / unobscured
}

/// Derive the two per-planet ratio features from the raw signal matrices,
/// using the known transit windows of each instrument channel.
///
/// Rows of both matrices must be aligned to the same planet order; this is
/// the caller's responsibility and is not cross-checked here.
pub fn build_features(a_raw: &RawSignalMatrix, f_raw: &RawSignalMatrix) -> FeatureTable {
    build_features_with(a_raw, f_raw, &AIRS_CH0_WINDOWS, &FGS1_WINDOWS)
}

/// [`build_features`] with explicit windows, for scaled-down data.
pub fn build_features_with(
    a_raw: &RawSignalMatrix,
    f_raw: &RawSignalMatrix,
    a_windows: &TransitWindows,
    f_windows: &TransitWindows,
) -> FeatureTable {
    let n = a_raw.n_entities();
    let mut a_relative_reduction = Vec::with_capacity(n);
    let mut f_relative_reduction = Vec::with_capacity(n);
    for i in 0..n {
        a_relative_reduction.push(relative_reduction(a_raw.row(i), a_windows));
        f_relative_reduction.push(relative_reduction(f_raw.row(i), f_windows));
    }
    FeatureTable {
        a_relative_reduction,
        f_relative_reduction,
    }
}
