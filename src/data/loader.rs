use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use log::{debug, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use serde_json::Value as JsonValue;

use super::filter::drop_incomplete;
use super::model::{validate_columns, Channel, Dataset, PartialRow, CHANNEL_COUNT};
use super::source::{json_kind, DataSource};
use crate::error::{FaultError, Result};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and normalize a sensor table from any accepted source.
///
/// Required columns are validated, then rows with a missing value in any
/// channel are dropped.
pub fn load(source: DataSource) -> Result<Dataset> {
    let kind = source.kind();
    let partial = match source {
        DataSource::Path(path) => load_file(&path)?,
        DataSource::Table(batch) => batch_rows(&batch)?,
        DataSource::Mapping(columns) => mapping_rows(columns)?,
        DataSource::Array(rows) => array_rows(rows)?,
    };

    let total = partial.len();
    let rows = drop_incomplete(partial);
    if rows.len() < total {
        warn!(
            "Dropped {} of {total} rows with missing values",
            total - rows.len()
        );
    }
    debug!("Loaded {} rows from {kind} source", rows.len());

    Ok(Dataset::from_rows(rows))
}

/// Read a sensor file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row naming `vp1`, `vp2`, `vp3` (other columns ignored)
/// * `.json`    – `[{ "vp1": ..., "vp2": ..., "vp3": ... }, ...]`
/// * `.parquet` – numeric `vp1`, `vp2`, `vp3` columns
pub fn load_file(path: &Path) -> Result<Vec<PartialRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(FaultError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Only the three channel columns are read; empty cells and the usual
/// missing markers (`NA`, `NaN`, `null`, ...) become missing values.
fn load_csv(path: &Path) -> Result<Vec<PartialRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    validate_columns(&headers)?;
    let indices = Channel::ALL.map(|ch| {
        headers
            .iter()
            .position(|h| h == ch.name())
            .unwrap_or_default()
    });

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let mut row: PartialRow = [None; CHANNEL_COUNT];
        for (slot, (&idx, ch)) in row.iter_mut().zip(indices.iter().zip(Channel::ALL)) {
            *slot = parse_cell(record.get(idx).unwrap_or(""), ch.name(), row_no)?;
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Cell texts read as missing, the same set `pandas.read_csv` uses.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s)
}

fn parse_cell(raw: &str, column: &str, row: usize) -> Result<Option<f64>> {
    let s = raw.trim();
    if is_missing_marker(s) {
        return Ok(None);
    }
    s.parse::<f64>()
        .map(Some)
        .map_err(|_| FaultError::InvalidValue {
            column: column.to_string(),
            row,
            value: s.to_string(),
        })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "vp1": 101.5, "vp2": 99.8, "vp3": null },
///   ...
/// ]
/// ```
///
/// A top-level object of column arrays is accepted as well.
fn load_json(path: &Path) -> Result<Vec<PartialRow>> {
    let text = std::fs::read_to_string(path)?;
    let root: JsonValue = serde_json::from_str(&text)?;

    match root {
        JsonValue::Array(records) => records_rows(&records),
        obj @ JsonValue::Object(_) => match DataSource::try_from(obj)? {
            DataSource::Mapping(columns) => mapping_rows(columns),
            other => Err(FaultError::UnsupportedSource(other.kind().to_string())),
        },
        other => Err(FaultError::UnsupportedSource(format!(
            "JSON document is {}, expected an array of records",
            json_kind(&other)
        ))),
    }
}

fn records_rows(records: &[JsonValue]) -> Result<Vec<PartialRow>> {
    let mut columns: BTreeSet<&str> = BTreeSet::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| {
            FaultError::UnsupportedSource(format!(
                "record {i} is {}, expected an object",
                json_kind(rec)
            ))
        })?;
        columns.extend(obj.keys().map(String::as_str));
        objects.push(obj);
    }
    let columns: Vec<&str> = columns.into_iter().collect();
    validate_columns(&columns)?;

    let mut rows = Vec::with_capacity(objects.len());
    for (row_no, obj) in objects.into_iter().enumerate() {
        let mut row: PartialRow = [None; CHANNEL_COUNT];
        for (slot, ch) in row.iter_mut().zip(Channel::ALL) {
            *slot = match obj.get(ch.name()) {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::Number(n)) => n.as_f64(),
                Some(other) => {
                    return Err(FaultError::InvalidValue {
                        column: ch.name().to_string(),
                        row: row_no,
                        value: other.to_string(),
                    })
                }
            };
        }
        rows.push(row);
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with numeric `vp1`, `vp2`, `vp3` columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<PartialRow>> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let schema = builder.schema().clone();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    validate_columns(&names)?;

    // Only decode the channel columns.
    let roots: Vec<usize> = Channel::ALL
        .iter()
        .filter_map(|ch| schema.index_of(ch.name()).ok())
        .collect();
    let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
    let reader = builder.with_projection(mask).build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        rows.extend(batch_rows(&batch)?);
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// In-memory shapes
// ---------------------------------------------------------------------------

/// Rows of an Arrow table. Nulls become missing values.
pub fn batch_rows(batch: &RecordBatch) -> Result<Vec<PartialRow>> {
    let schema = batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    validate_columns(&names)?;

    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(CHANNEL_COUNT);
    for ch in Channel::ALL {
        let idx = schema.index_of(ch.name())?;
        columns.push(numeric_column(batch.column(idx), ch.name())?);
    }

    Ok((0..batch.num_rows())
        .map(|row| [columns[0][row], columns[1][row], columns[2][row]])
        .collect())
}

/// Read a numeric Arrow column as `f64`.
///
/// Integer, unsigned, float, decimal and boolean columns are cast to
/// `Float64`; anything else is rejected.
fn numeric_column(col: &ArrayRef, name: &str) -> Result<Vec<Option<f64>>> {
    let data_type = col.data_type();
    if !(data_type.is_numeric() || matches!(data_type, DataType::Boolean | DataType::Null)) {
        return Err(FaultError::UnsupportedColumnType {
            column: name.to_string(),
            data_type: format!("{data_type:?}"),
        });
    }
    let floats = cast(col, &DataType::Float64)?;
    Ok(floats.as_primitive::<Float64Type>().iter().collect())
}

/// Rows of a column mapping. Every column must have the same length.
fn mapping_rows(mut columns: BTreeMap<String, Vec<Option<f64>>>) -> Result<Vec<PartialRow>> {
    let names: Vec<&String> = columns.keys().collect();
    validate_columns(&names)?;

    if let Some((reference, first)) = columns.iter().next() {
        let expected = first.len();
        if let Some((column, values)) = columns.iter().find(|(_, v)| v.len() != expected) {
            return Err(FaultError::RaggedColumns {
                column: column.clone(),
                got: values.len(),
                reference: reference.clone(),
                expected,
            });
        }
    }

    let mut channel_values = Channel::ALL.map(|ch| {
        columns
            .remove(ch.name())
            .unwrap_or_default()
            .into_iter()
    });
    let n_rows = channel_values[0].len();

    let mut rows = Vec::with_capacity(n_rows);
    for _ in 0..n_rows {
        let mut row: PartialRow = [None; CHANNEL_COUNT];
        for (slot, values) in row.iter_mut().zip(channel_values.iter_mut()) {
            *slot = values.next().flatten();
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Rows of a raw 2-D array, columns taken by position.
///
/// A short row is padded with missing values (and later dropped); a row
/// with more than three values is rejected.
fn array_rows(rows: Vec<Vec<Option<f64>>>) -> Result<Vec<PartialRow>> {
    rows.into_iter()
        .enumerate()
        .map(|(row_no, values)| {
            if values.len() > CHANNEL_COUNT {
                return Err(FaultError::ShapeMismatch {
                    row: row_no,
                    got: values.len(),
                    expected: CHANNEL_COUNT,
                });
            }
            let mut row: PartialRow = [None; CHANNEL_COUNT];
            for (slot, value) in row.iter_mut().zip(values) {
                *slot = value;
            }
            Ok(row)
        })
        .collect()
}
