use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// CellValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell mirroring common dataframe dtypes.
///
/// Solution and submission tables are numeric apart from the identifier
/// column, but a malformed submission can carry anything; keeping cells
/// dynamically typed lets validation name the offending column instead of
/// failing at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Interpret the cell as an `f64` for numeric processing.
    /// `Null` converts to NaN, matching a missing value in a numeric column.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Null => Some(f64::NAN),
            _ => None,
        }
    }

    /// Whether the cell may appear in a numeric column.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CellValue::Float(_) | CellValue::Integer(_) | CellValue::Null
        )
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – one loaded solution / submission table
// ---------------------------------------------------------------------------

/// A rectangular table: ordered column names plus row-major cells.
///
/// Column order is load-bearing: a submission's first W columns are
/// predicted means and its last W are predicted sigmas.  Rows of the
/// solution and submission correspond positionally; no join is performed.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Table { columns, rows }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// A copy of the table without the named column.
    /// A missing column is not an error; the table comes back unchanged.
    pub fn drop_column(&self, name: &str) -> Table {
        let Some(drop_idx) = self.column_index(name) else {
            return self.clone();
        };
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != drop_idx)
            .map(|(_, c)| c.clone())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != drop_idx)
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect();
        Table { columns, rows }
    }

    /// True when every cell of the column holds a numeric value.
    pub fn column_is_numeric(&self, col: usize) -> bool {
        self.rows.iter().all(|row| row[col].is_numeric())
    }
}

// ---------------------------------------------------------------------------
// PixelFrames – one planet's raw exposure stream
// ---------------------------------------------------------------------------

/// A 2-D integer pixel-frame dump: `n_frames` rows of `n_pixels` detector
/// counts, row-major.  Frames alternate exposure/background readings.
#[derive(Debug, Clone)]
pub struct PixelFrames {
    pub n_frames: usize,
    pub n_pixels: usize,
    pub data: Vec<i32>,
}

impl PixelFrames {
    pub fn frame(&self, i: usize) -> &[i32] {
        &self.data[i * self.n_pixels..(i + 1) * self.n_pixels]
    }
}

// ---------------------------------------------------------------------------
// RawSignalMatrix – per-planet net-signal rows
// ---------------------------------------------------------------------------

/// Row-major `entity × samples` matrix of 32-bit floats.
///
/// Fresh matrices are NaN-filled so rows never written by the extractor are
/// visible downstream instead of silently reading as zero.
#[derive(Debug, Clone)]
pub struct RawSignalMatrix {
    n_entities: usize,
    n_samples: usize,
    values: Vec<f32>,
}

impl RawSignalMatrix {
    pub fn filled_nan(n_entities: usize, n_samples: usize) -> Self {
        RawSignalMatrix {
            n_entities,
            n_samples,
            values: vec![f32::NAN; n_entities * n_samples],
        }
    }

    pub fn n_entities(&self) -> usize {
        self.n_entities
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn row(&self, entity: usize) -> &[f32] {
        &self.values[entity * self.n_samples..(entity + 1) * self.n_samples]
    }

    pub fn row_mut(&mut self, entity: usize) -> &mut [f32] {
        &mut self.values[entity * self.n_samples..(entity + 1) * self.n_samples]
    }
}

// ---------------------------------------------------------------------------
// FeatureTable – the two per-planet transit-depth features
// ---------------------------------------------------------------------------

/// Per-planet ratio features, row-aligned to the extraction order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub a_relative_reduction: Vec<f64>,
    pub f_relative_reduction: Vec<f64>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.a_relative_reduction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_relative_reduction.is_empty()
    }

    /// Write the features as CSV with the planet-id column restored, for the
    /// downstream model.  `planet_ids` must be the extraction-order ids.
    pub fn write_csv(&self, path: &Path, planet_ids: &[u64]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(["planet_id", "a_relative_reduction", "f_relative_reduction"])?;
        for (i, id) in planet_ids.iter().enumerate() {
            writer.write_record([
                id.to_string(),
                self.a_relative_reduction[i].to_string(),
                self.f_relative_reduction[i].to_string(),
            ])?;
        }
        writer.flush().context("flushing feature CSV")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::new(
            vec!["planet_id".into(), "wl_1".into(), "wl_2".into()],
            vec![
                vec![
                    CellValue::Integer(7),
                    CellValue::Float(0.01),
                    CellValue::Float(0.02),
                ],
                vec![
                    CellValue::Integer(8),
                    CellValue::Float(0.03),
                    CellValue::Float(0.04),
                ],
            ],
        )
    }

    #[test]
    fn drop_column_removes_cells() {
        let t = sample_table().drop_column("planet_id");
        assert_eq!(t.columns, vec!["wl_1", "wl_2"]);
        assert_eq!(
            t.rows[0],
            vec![CellValue::Float(0.01), CellValue::Float(0.02)]
        );
        assert_eq!(t.n_rows(), 2);
    }

    #[test]
    fn drop_missing_column_is_noop() {
        let t = sample_table().drop_column("no_such_column");
        assert_eq!(t.n_cols(), 3);
    }

    #[test]
    fn column_numeric_check() {
        let mut t = sample_table();
        assert!(t.column_is_numeric(1));
        t.rows[1][1] = CellValue::String("oops".into());
        assert!(!t.column_is_numeric(1));
    }

    #[test]
    fn null_cell_is_numeric_nan() {
        assert!(CellValue::Null.is_numeric());
        assert!(CellValue::Null.as_f64().unwrap().is_nan());
        assert_eq!(CellValue::String("x".into()).as_f64(), None);
    }

    #[test]
    fn raw_matrix_starts_as_nan() {
        let m = RawSignalMatrix::filled_nan(2, 3);
        assert_eq!(m.n_entities(), 2);
        assert_eq!(m.n_samples(), 3);
        assert!(m.row(1).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn raw_matrix_rows_are_disjoint() {
        let mut m = RawSignalMatrix::filled_nan(2, 2);
        m.row_mut(0).copy_from_slice(&[1.0, 2.0]);
        m.row_mut(1).copy_from_slice(&[3.0, 4.0]);
        assert_eq!(m.row(0), &[1.0, 2.0]);
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn pixel_frames_indexing() {
        let frames = PixelFrames {
            n_frames: 2,
            n_pixels: 3,
            data: vec![1, 2, 3, 4, 5, 6],
        };
        assert_eq!(frames.frame(0), &[1, 2, 3]);
        assert_eq!(frames.frame(1), &[4, 5, 6]);
    }
}
