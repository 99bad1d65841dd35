use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    LargeStringArray, StringArray, UInt8Array, UInt16Array, UInt32Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{CellValue, PixelFrames, Table};

// ---------------------------------------------------------------------------
// Table loading
// ---------------------------------------------------------------------------

/// Load a solution or submission table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – scalar columns, one row per planet (recommended)
/// * `.csv`     – header row with column names, cells typed by inspection
///
/// Column order is preserved exactly as stored; it carries the mean/sigma
/// split of a submission.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_table_parquet(path),
        "csv" => load_table_csv(path),
        other => bail!("Unsupported table extension: .{other}"),
    }
}

// -- CSV --

fn load_table_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != columns.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, got {}",
                columns.len(),
                record.len()
            );
        }
        rows.push(record.iter().map(guess_cell).collect());
    }

    Ok(Table::new(columns, rows))
}

/// Type a raw CSV field the way a dataframe reader would.
fn guess_cell(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// -- Parquet --

fn load_table_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| scalar_cell(col, row))
                .collect();
            rows.push(cells);
        }
    }

    Ok(Table::new(columns, rows))
}

/// Extract a single scalar cell from an Arrow column at a given row.
fn scalar_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_any().downcast_ref::<StringArray>().unwrap();
            CellValue::String(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let arr = col.as_any().downcast_ref::<LargeStringArray>().unwrap();
            CellValue::String(arr.value(row).to_string())
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            CellValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            CellValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            CellValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            CellValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            CellValue::Bool(arr.value(row))
        }
        _ => CellValue::String(format!("{:?}", col.data_type())),
    }
}

// ---------------------------------------------------------------------------
// Pixel-frame loading
// ---------------------------------------------------------------------------

/// Read a per-planet pixel-frame file: a 2-D integer parquet table with one
/// row per exposure frame and one column per detector pixel.
///
/// Columns may be stored in any of the common integer widths; everything is
/// cast to `i32` as the reference preprocessing does.
pub fn read_pixel_frames(path: &Path) -> Result<PixelFrames> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let n_pixels = builder.schema().fields().len();
    let reader = builder.build().context("building parquet reader")?;

    let mut data: Vec<i32> = Vec::new();
    let mut n_frames = 0usize;
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let n_rows = batch.num_rows();
        let base = data.len();
        data.resize(base + n_rows * n_pixels, 0);
        for (c, col) in batch.columns().iter().enumerate() {
            fill_pixel_column(col, &mut data[base..], c, n_pixels)
                .with_context(|| format!("pixel column {c} of {}", path.display()))?;
        }
        n_frames += n_rows;
    }

    Ok(PixelFrames {
        n_frames,
        n_pixels,
        data,
    })
}

/// Scatter one Arrow pixel column into the row-major frame buffer.
fn fill_pixel_column(col: &Arc<dyn Array>, out: &mut [i32], c: usize, stride: usize) -> Result<()> {
    if col.null_count() > 0 {
        bail!("null pixel values");
    }
    match col.data_type() {
        DataType::Int16 => {
            let arr = col.as_any().downcast_ref::<Int16Array>().unwrap();
            for r in 0..arr.len() {
                out[r * stride + c] = arr.value(r) as i32;
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            for r in 0..arr.len() {
                out[r * stride + c] = arr.value(r);
            }
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            for r in 0..arr.len() {
                out[r * stride + c] = arr.value(r) as i32;
            }
        }
        DataType::UInt8 => {
            let arr = col.as_any().downcast_ref::<UInt8Array>().unwrap();
            for r in 0..arr.len() {
                out[r * stride + c] = arr.value(r) as i32;
            }
        }
        DataType::UInt16 => {
            let arr = col.as_any().downcast_ref::<UInt16Array>().unwrap();
            for r in 0..arr.len() {
                out[r * stride + c] = arr.value(r) as i32;
            }
        }
        DataType::UInt32 => {
            let arr = col.as_any().downcast_ref::<UInt32Array>().unwrap();
            for r in 0..arr.len() {
                out[r * stride + c] = arr.value(r) as i32;
            }
        }
        other => bail!("pixel column has non-integer type {other:?}"),
    }
    Ok(())
}
