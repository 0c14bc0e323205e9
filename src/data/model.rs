use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the common Pandas dtypes.
/// Used as a key in `BTreeMap` / `BTreeSet` / `HashMap` downstream, so
/// equality, ordering and hashing must all agree.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so CellValue can live in ordered collections --

// Equality follows `Ord`: floats compare by `total_cmp`, so NaN equals itself.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                Text(_) => 3,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Mixed numerics compare by value; the integer sorts first on a tie
            // so the ordering stays consistent with `Eq`.
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (Text(a), Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write_float(f, *v),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

/// `2.0` for integral values, scientific notation for very small or very
/// large magnitudes, otherwise the shortest round-trip form.
fn write_float(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    let magnitude = v.abs();
    if !v.is_finite() {
        write!(f, "{v}")
    } else if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        write!(f, "{v:e}")
    } else if v.fract() == 0.0 {
        write!(f, "{v:.1}")
    } else {
        write!(f, "{v}")
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for numeric statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ColumnKind – inferred dtype of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    /// Integer and float columns take part in correlation.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    /// Kinds offered in the feature selector (`int64`, `float64`, `object`).
    pub fn is_feature(self) -> bool {
        !matches!(self, ColumnKind::Bool)
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Bool => "bool",
            ColumnKind::Text => "object",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Column / Dataset
// ---------------------------------------------------------------------------

/// One named column of the table.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Row-aligned numeric view; `None` for nulls and non-numeric cells.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(CellValue::as_f64).collect()
    }

    /// Finite numeric values, nulls dropped.
    pub fn finite_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter_map(CellValue::as_f64)
            .filter(|v| v.is_finite())
            .collect()
    }

    pub fn non_null(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_null())
    }

    pub fn distinct_count(&self) -> usize {
        self.non_null().collect::<BTreeSet<_>>().len()
    }
}

/// The uploaded table: named, typed columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, rejecting columns of unequal length.
    pub fn new(columns: Vec<Column>) -> anyhow::Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.values.len();
            if let Some(bad) = columns.iter().find(|c| c.values.len() != rows) {
                anyhow::bail!(
                    "column '{}' has {} values but '{}' has {rows}",
                    bad.name,
                    bad.values.len(),
                    first.name
                );
            }
        }
        Ok(Dataset { columns })
    }

    /// `(rows, columns)`, like `DataFrame.shape`.
    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.columns.len())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.kind.is_numeric()).collect()
    }

    /// First `n` rows, each as a slice of cell references in column order.
    pub fn head(&self, n: usize) -> Vec<Vec<&CellValue>> {
        (0..n.min(self.len()))
            .map(|row| self.columns.iter().map(|c| &c.values[row]).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column {
                name: "Age".into(),
                kind: ColumnKind::Integer,
                values: vec![CellValue::Integer(33), CellValue::Integer(17), CellValue::Null],
            },
            Column {
                name: "Level".into(),
                kind: ColumnKind::Text,
                values: vec![
                    CellValue::Text("Low".into()),
                    CellValue::Text("High".into()),
                    CellValue::Text("Low".into()),
                ],
            },
        ])
        .unwrap()
    }

    #[test]
    fn shape_and_lookup() {
        let ds = sample();
        assert_eq!(ds.shape(), (3, 2));
        assert!(ds.has_column("Level"));
        assert!(!ds.has_column("level"));
        assert_eq!(ds.numeric_columns().len(), 1);
        assert_eq!(ds.column("Level").unwrap().distinct_count(), 2);
    }

    #[test]
    fn head_is_clamped_to_row_count() {
        let ds = sample();
        let rows = ds.head(10);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], &CellValue::Integer(17));
        assert_eq!(rows[1][1].to_string(), "High");
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let err = Dataset::new(vec![
            Column {
                name: "a".into(),
                kind: ColumnKind::Integer,
                values: vec![CellValue::Integer(1)],
            },
            Column {
                name: "b".into(),
                kind: ColumnKind::Integer,
                values: vec![],
            },
        ])
        .unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn display_formats_like_a_table_cell() {
        assert_eq!(CellValue::Float(2.0).to_string(), "2.0");
        assert_eq!(CellValue::Float(0.125).to_string(), "0.125");
        assert_eq!(CellValue::Float(1234.5).to_string(), "1234.5");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn display_keeps_small_and_large_floats_distinct() {
        assert_eq!(CellValue::Float(0.00001).to_string(), "1e-5");
        assert_eq!(CellValue::Float(0.00002).to_string(), "2e-5");
        assert_eq!(CellValue::Float(0.00012).to_string(), "0.00012");
        assert_eq!(CellValue::Float(1e15).to_string(), "1e15");
        assert_eq!(CellValue::Float(0.0).to_string(), "0.0");
        assert_eq!(CellValue::Float(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn equality_and_hash_agree_with_ordering() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        fn hash_of(v: &CellValue) -> u64 {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        }

        let nan = CellValue::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_eq!(hash_of(&nan), hash_of(&nan.clone()));
        assert_eq!(nan.cmp(&nan.clone()), std::cmp::Ordering::Equal);

        // total_cmp separates the zeros, so equality must too.
        assert_ne!(CellValue::Float(0.0), CellValue::Float(-0.0));
        assert_ne!(CellValue::Integer(2), CellValue::Float(2.0));
    }

    #[test]
    fn mixed_numerics_order_by_value() {
        assert!(CellValue::Integer(1) < CellValue::Float(1.5));
        assert!(CellValue::Float(0.5) < CellValue::Integer(1));
        assert!(CellValue::Integer(2) < CellValue::Float(2.0));
        assert!(CellValue::Null < CellValue::Bool(false));
        assert!(CellValue::Integer(99) < CellValue::Text("a".into()));
    }
}
