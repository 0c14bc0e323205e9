use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array,
    Int64Array, Int8Array, StringArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Column, ColumnKind, Dataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, comma separated (the usual Kaggle export)
/// * `.json`    – `[{ "Age": 33, "Level": "Low", ... }, ...]`
/// * `.parquet` – flat schema of primitive columns
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            read_csv(file)
        }
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text)
        }
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Parse a CSV table with a header row from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        bail!("CSV has no header row");
    }

    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        // Row numbers in messages are 1-based data rows, header excluded.
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            cells.push(record.get(col_idx).unwrap_or("").trim().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw)
        .map(|(name, cells)| infer_column(name, &cells))
        .collect();
    Dataset::new(columns)
}

/// Cells pandas reads as missing by default.
const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

fn is_na(s: &str) -> bool {
    s.is_empty() || NA_TOKENS.contains(&s)
}

/// Infer the dtype of a column of raw text cells.
///
/// Empty cells and NA tokens are nulls.  Integer beats float beats bool beats
/// text; an all-null column reads as float, like pandas' NaN column.
fn infer_column(name: String, cells: &[String]) -> Column {
    let present = || cells.iter().filter(|c| !is_na(c));

    let kind = if present().next().is_none() {
        ColumnKind::Float
    } else if present().all(|c| c.parse::<i64>().is_ok()) {
        ColumnKind::Integer
    } else if present().all(|c| c.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if present().all(|c| parse_bool(c).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    };

    let values = cells.iter().map(|c| parse_cell(c, kind)).collect();
    Column { name, kind, values }
}

fn parse_cell(s: &str, kind: ColumnKind) -> CellValue {
    if is_na(s) {
        return CellValue::Null;
    }
    // Every branch is guaranteed by `infer_column`; fall back to text anyway.
    let parsed = match kind {
        ColumnKind::Integer => s.parse().ok().map(CellValue::Integer),
        ColumnKind::Float => s.parse().ok().map(CellValue::Float),
        ColumnKind::Bool => parse_bool(s).map(CellValue::Bool),
        ColumnKind::Text => None,
    };
    parsed.unwrap_or_else(|| CellValue::Text(s.to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Patient Id": "P1", "Age": 33, "Level": "Low" },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance across records; keys missing from
/// a record are null.
pub fn parse_json(text: &str) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values: Vec<CellValue> = records
                .iter()
                .map(|rec| rec.get(&name).map_or(CellValue::Null, json_to_cell))
                .collect();
            let kind = unify_kind(&values);
            Column {
                name,
                kind,
                values: coerce(values, kind),
            }
        })
        .collect();
    Dataset::new(columns)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

/// Pick one kind for a column of already-typed cells.
fn unify_kind(values: &[CellValue]) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for v in values {
        let k = match v {
            CellValue::Null => continue,
            CellValue::Integer(_) => ColumnKind::Integer,
            CellValue::Float(_) => ColumnKind::Float,
            CellValue::Bool(_) => ColumnKind::Bool,
            CellValue::Text(_) => ColumnKind::Text,
        };
        kind = Some(match (kind, k) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Integer), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
            _ => ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Float)
}

fn coerce(values: Vec<CellValue>, kind: ColumnKind) -> Vec<CellValue> {
    values
        .into_iter()
        .map(|v| match (kind, v) {
            (_, CellValue::Null) => CellValue::Null,
            (ColumnKind::Float, CellValue::Integer(i)) => CellValue::Float(i as f64),
            (ColumnKind::Text, v @ CellValue::Text(_)) => v,
            (ColumnKind::Text, v) => CellValue::Text(v.to_string()),
            (_, v) => v,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with a flat schema.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).  Categorical (dictionary) columns are
/// decoded to their values; temporal and nested columns are kept as their
/// formatted text.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut raw: Vec<Vec<CellValue>> = vec![Vec::new(); schema.fields().len()];
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, cells) in raw.iter_mut().enumerate() {
            let name = schema.field(col_idx).name();
            let values = extract_column(batch.column(col_idx))
                .with_context(|| format!("reading parquet column '{name}'"))?;
            cells.extend(values);
        }
    }

    let columns = schema
        .fields()
        .iter()
        .zip(raw)
        .map(|(field, values)| {
            let kind = unify_kind(&values);
            Column {
                name: field.name().clone(),
                kind,
                values: coerce(values, kind),
            }
        })
        .collect();
    Dataset::new(columns)
}

/// Convert one Arrow column into cells.
fn extract_column(col: &ArrayRef) -> Result<Vec<CellValue>> {
    if let DataType::Dictionary(_, value_type) = col.data_type() {
        let decoded = cast(col.as_ref(), value_type).context("decoding dictionary column")?;
        return extract_column(&decoded);
    }
    if is_primitive(col.data_type()) {
        return Ok((0..col.len()).map(|row| extract_cell(col, row)).collect());
    }

    let options = FormatOptions::default();
    let formatter =
        ArrayFormatter::try_new(col.as_ref(), &options).context("formatting column values")?;
    Ok((0..col.len())
        .map(|row| {
            if col.is_null(row) {
                CellValue::Null
            } else {
                CellValue::Text(formatter.value(row).to_string())
            }
        })
        .collect())
}

fn is_primitive(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::LargeUtf8
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
    )
}

/// Float cell, with NaN read as missing like pandas does.
fn float_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(v)
    }
}

/// Extract a single cell of an `is_primitive` column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    macro_rules! int_cell {
        ($ty:ty) => {
            col.as_any()
                .downcast_ref::<$ty>()
                .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row) as i64))
        };
    }
    match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .map_or(CellValue::Null, |s| CellValue::Text(s.value(row).to_string())),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => int_cell!(Int8Array),
        DataType::Int16 => int_cell!(Int16Array),
        DataType::Int32 => int_cell!(Int32Array),
        DataType::Int64 => int_cell!(Int64Array),
        DataType::UInt8 => int_cell!(UInt8Array),
        DataType::UInt16 => int_cell!(UInt16Array),
        DataType::UInt32 => int_cell!(UInt32Array),
        // Values past i64::MAX widen the column to float instead of wrapping.
        DataType::UInt64 => col
            .as_any()
            .downcast_ref::<UInt64Array>()
            .map_or(CellValue::Null, |a| {
                let v = a.value(row);
                i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
            }),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |a| float_cell(a.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| float_cell(a.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        _ => CellValue::Null,
    }
}
