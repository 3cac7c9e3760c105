use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use serde_json::Value as JsonValue;

use super::model::{Channel, Row};
use crate::error::{FaultError, Result};

// ---------------------------------------------------------------------------
// DataSource – the accepted input shapes
// ---------------------------------------------------------------------------

/// Where the sensor table comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A tabular file (`.csv`, `.json`, `.parquet`).
    Path(PathBuf),
    /// An in-memory Arrow table. Channel columns may be any integer,
    /// unsigned, float, decimal or boolean type; nulls are missing values.
    Table(RecordBatch),
    /// Column name → values; `None` marks a missing value.
    Mapping(BTreeMap<String, Vec<Option<f64>>>),
    /// Row-major values whose columns are, by position, `vp1`, `vp2`, `vp3`.
    /// Short rows count as having missing trailing values.
    Array(Vec<Vec<Option<f64>>>),
}

impl DataSource {
    /// Short name of the shape, used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DataSource::Path(_) => "path",
            DataSource::Table(_) => "table",
            DataSource::Mapping(_) => "mapping",
            DataSource::Array(_) => "array",
        }
    }

    /// Build an array source from complete rows.
    pub fn from_rows(rows: &[Row]) -> Self {
        DataSource::Array(
            rows.iter()
                .map(|row| row.iter().copied().map(Some).collect())
                .collect(),
        )
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        DataSource::Path(path)
    }
}

impl From<&Path> for DataSource {
    fn from(path: &Path) -> Self {
        DataSource::Path(path.to_path_buf())
    }
}

impl From<RecordBatch> for DataSource {
    fn from(batch: RecordBatch) -> Self {
        DataSource::Table(batch)
    }
}

impl From<BTreeMap<String, Vec<Option<f64>>>> for DataSource {
    fn from(columns: BTreeMap<String, Vec<Option<f64>>>) -> Self {
        DataSource::Mapping(columns)
    }
}

impl From<Vec<Vec<Option<f64>>>> for DataSource {
    fn from(rows: Vec<Vec<Option<f64>>>) -> Self {
        DataSource::Array(rows)
    }
}

// ---------------------------------------------------------------------------
// Dynamic resolution from JSON
// ---------------------------------------------------------------------------

/// Resolve a dynamically-typed value:
///
/// * string → [`DataSource::Path`]
/// * object of arrays → [`DataSource::Mapping`]
/// * array of arrays → [`DataSource::Array`]
///
/// Anything else is rejected with [`FaultError::UnsupportedSource`].
impl TryFrom<JsonValue> for DataSource {
    type Error = FaultError;

    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::String(path) => Ok(DataSource::Path(PathBuf::from(path))),
            JsonValue::Object(obj) => {
                let mut columns = BTreeMap::new();
                for (name, col) in obj {
                    let cells = col.as_array().ok_or_else(|| {
                        FaultError::UnsupportedSource(format!(
                            "column '{name}' is {}, expected an array",
                            json_kind(&col)
                        ))
                    })?;
                    let values = cells
                        .iter()
                        .enumerate()
                        .map(|(row, cell)| json_cell(cell, &name, row))
                        .collect::<Result<Vec<_>>>()?;
                    columns.insert(name, values);
                }
                Ok(DataSource::Mapping(columns))
            }
            JsonValue::Array(rows) => {
                let mut out = Vec::with_capacity(rows.len());
                for (row_no, row) in rows.iter().enumerate() {
                    let cells = row.as_array().ok_or_else(|| {
                        FaultError::UnsupportedSource(format!(
                            "row {row_no} is {}, expected an array",
                            json_kind(row)
                        ))
                    })?;
                    let values = cells
                        .iter()
                        .enumerate()
                        .map(|(j, cell)| json_cell(cell, &positional_name(j), row_no))
                        .collect::<Result<Vec<_>>>()?;
                    out.push(values);
                }
                Ok(DataSource::Array(out))
            }
            other => Err(FaultError::UnsupportedSource(json_kind(&other).to_string())),
        }
    }
}

fn positional_name(j: usize) -> String {
    Channel::ALL
        .get(j)
        .map(|ch| ch.name().to_string())
        .unwrap_or_else(|| format!("#{j}"))
}

fn json_cell(cell: &JsonValue, column: &str, row: usize) -> Result<Option<f64>> {
    match cell {
        JsonValue::Null => Ok(None),
        JsonValue::Number(n) => Ok(n.as_f64()),
        other => Err(FaultError::InvalidValue {
            column: column.to_string(),
            row,
            value: other.to_string(),
        }),
    }
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn number_is_unsupported() {
        let err = DataSource::try_from(json!(42)).unwrap_err();
        assert!(matches!(err, FaultError::UnsupportedSource(ref kind) if kind == "number"));
    }

    #[test]
    fn bool_is_unsupported() {
        assert!(matches!(
            DataSource::try_from(json!(true)),
            Err(FaultError::UnsupportedSource(_))
        ));
    }

    #[test]
    fn string_becomes_path() {
        let src = DataSource::try_from(json!("readings.csv")).unwrap();
        assert!(matches!(src, DataSource::Path(ref p) if p == Path::new("readings.csv")));
    }

    #[test]
    fn object_becomes_mapping_with_nulls() {
        let src = DataSource::try_from(json!({
            "vp1": [1.0, null],
            "vp2": [2.0, 3.0],
        }))
        .unwrap();
        let DataSource::Mapping(cols) = src else {
            panic!("expected mapping");
        };
        assert_eq!(cols["vp1"], vec![Some(1.0), None]);
        assert_eq!(cols["vp2"], vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn array_becomes_rows() {
        let src = DataSource::try_from(json!([[1, 2, 3], [4, null, 6]])).unwrap();
        let DataSource::Array(rows) = src else {
            panic!("expected array");
        };
        assert_eq!(rows[1], vec![Some(4.0), None, Some(6.0)]);
    }

    #[test]
    fn text_cell_is_invalid_value() {
        let err = DataSource::try_from(json!([[1, "x", 3]])).unwrap_err();
        match err {
            FaultError::InvalidValue { column, row, .. } => {
                assert_eq!(column, "vp2");
                assert_eq!(row, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
