use std::collections::HashMap;

use thiserror::Error;

use super::model::{CellValue, Column, Dataset};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a chart cannot be built from a column.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChartError {
    #[error("column '{0}' not found")]
    UnknownColumn(String),
    #[error("column '{0}' has no values to plot")]
    EmptyColumn(String),
    #[error("column '{column}' has {count} distinct values (limit {limit})")]
    TooManyCategories {
        column: String,
        count: usize,
        limit: usize,
    },
}

// ---------------------------------------------------------------------------
// Value counts
// ---------------------------------------------------------------------------

/// Non-null values with their counts, most frequent first.
/// Ties keep the order of first appearance.
pub fn value_counts(column: &Column) -> Vec<(CellValue, usize)> {
    let mut counts = counts_in_appearance_order(column);
    // sort_by is stable, so equal counts stay in appearance order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn counts_in_appearance_order(column: &Column) -> Vec<(CellValue, usize)> {
    let mut index: HashMap<&CellValue, usize> = HashMap::new();
    let mut counts: Vec<(CellValue, usize)> = Vec::new();
    for value in column.non_null() {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value.clone(), 1));
            }
        }
    }
    counts
}

/// Each count's share of the total, in `[0, 1]`.
pub fn proportions(counts: &[(CellValue, usize)]) -> Vec<f64> {
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    counts
        .iter()
        .map(|(_, c)| *c as f64 / total as f64)
        .collect()
}

// ---------------------------------------------------------------------------
// Category counts (count plot)
// ---------------------------------------------------------------------------

/// Bar heights for a count plot of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryCounts {
    pub column: String,
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

impl CategoryCounts {
    /// Numeric columns are ordered by value, others by first appearance.
    pub fn compute(column: &Column, max_categories: usize) -> Result<Self, ChartError> {
        let mut counts = counts_in_appearance_order(column);
        if counts.is_empty() {
            return Err(ChartError::EmptyColumn(column.name.clone()));
        }
        if counts.len() > max_categories {
            return Err(ChartError::TooManyCategories {
                column: column.name.clone(),
                count: counts.len(),
                limit: max_categories,
            });
        }
        if column.kind.is_numeric() {
            counts.sort_by(|a, b| a.0.cmp(&b.0));
        }
        let (labels, counts): (Vec<String>, Vec<usize>) = counts
            .into_iter()
            .map(|(value, count)| (value.to_string(), count))
            .unzip();
        Ok(CategoryCounts {
            column: column.name.clone(),
            labels,
            counts,
        })
    }

    /// Look the column up by name first.
    pub fn for_feature(
        dataset: &Dataset,
        name: &str,
        max_categories: usize,
    ) -> Result<Self, ChartError> {
        let column = dataset
            .column(name)
            .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
        Self::compute(column, max_categories)
    }
}

// ---------------------------------------------------------------------------
// Histogram + KDE
// ---------------------------------------------------------------------------

/// Equal-width histogram, numpy semantics: the last bin is closed on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` edges, ascending.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// `None` when there is nothing finite to bin or `bins` is zero.
    pub fn compute(values: &[f64], bins: usize) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return None;
        }
        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (lo, hi) = if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        };
        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for v in finite {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Some(Histogram { edges, counts })
    }

    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }

    pub fn centers(&self) -> impl Iterator<Item = f64> + '_ {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

/// Gaussian kernel density estimate evaluated on `grid`, Scott's bandwidth.
///
/// Returns `None` for fewer than two values or zero variance.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let std = sample_std(values)?;
    if std <= 0.0 || !std.is_finite() {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = std * n.powf(-0.2);
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        grid.iter()
            .map(|&x| {
                let sum: f64 = values
                    .iter()
                    .map(|&v| {
                        let z = (x - v) / bandwidth;
                        (-0.5 * z * z).exp()
                    })
                    .sum();
                sum * norm
            })
            .collect(),
    )
}

/// Histogram of a numeric column together with a count-scaled KDE curve.
#[derive(Debug, Clone)]
pub struct Distribution {
    pub column: String,
    pub histogram: Histogram,
    /// `(x, count-scaled density)` points; empty when no KDE could be fit.
    pub kde: Vec<[f64; 2]>,
}

impl Distribution {
    const KDE_POINTS: usize = 200;

    pub fn compute(column: &Column, bins: usize) -> Option<Self> {
        let values = column.finite_values();
        let histogram = Histogram::compute(&values, bins)?;

        // The curve is clipped to the binned range.
        let lo = histogram.edges[0];
        let hi = histogram.edges[histogram.edges.len() - 1];
        let step = (hi - lo) / (Self::KDE_POINTS - 1) as f64;
        let grid: Vec<f64> = (0..Self::KDE_POINTS).map(|i| lo + step * i as f64).collect();
        let scale = values.len() as f64 * histogram.bin_width();
        let kde = gaussian_kde(&values, &grid)
            .map(|density| {
                grid.iter()
                    .zip(density)
                    .map(|(&x, d)| [x, d * scale])
                    .collect()
            })
            .unwrap_or_default();

        Some(Distribution {
            column: column.name.clone(),
            histogram,
            kde,
        })
    }
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson correlation over the rows where both series are present.
/// `NaN` for fewer than two such rows or zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    // A constant series has no defined correlation, at any scale.
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in &pairs {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = var_x.sqrt() * var_y.sqrt();
    if denominator == 0.0 {
        f64::NAN
    } else {
        (cov / denominator).clamp(-1.0, 1.0)
    }
}

/// Square correlation matrix over the numeric columns of a dataset.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major, `labels.len()²` entries.
    pub values: Vec<f64>,
}

impl CorrelationMatrix {
    /// Pairwise-complete Pearson correlation of every numeric column pair.
    pub fn compute(dataset: &Dataset) -> Self {
        let columns = dataset.numeric_columns();
        let series: Vec<Vec<Option<f64>>> = columns.iter().map(|c| c.numeric_values()).collect();
        let n = series.len();

        let mut values = vec![f64::NAN; n * n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&series[i], &series[j]);
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        CorrelationMatrix {
            labels: columns.iter().map(|c| c.name.clone()).collect(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.len() + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ColumnKind;

    fn text_column(name: &str, values: &[&str]) -> Column {
        Column {
            name: name.into(),
            kind: ColumnKind::Text,
            values: values
                .iter()
                .map(|v| {
                    if v.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(v.to_string())
                    }
                })
                .collect(),
        }
    }

    fn int_column(name: &str, values: &[Option<i64>]) -> Column {
        Column {
            name: name.into(),
            kind: ColumnKind::Integer,
            values: values
                .iter()
                .map(|v| v.map_or(CellValue::Null, CellValue::Integer))
                .collect(),
        }
    }

    #[test]
    fn value_counts_sort_by_frequency_then_appearance() {
        let col = text_column("Level", &["Low", "High", "Medium", "High", "", "Medium", "Low", "High"]);
        let counts = value_counts(&col);
        let labels: Vec<String> = counts.iter().map(|(v, _)| v.to_string()).collect();
        assert_eq!(labels, vec!["High", "Low", "Medium"]);
        assert_eq!(counts[0].1, 3);

        let shares = proportions(&counts);
        assert!((shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((shares[0] - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn proportions_of_nothing_are_zero() {
        assert!(proportions(&[]).is_empty());
    }

    #[test]
    fn category_counts_order_numeric_by_value() {
        let col = int_column("Smoking", &[Some(3), Some(1), Some(3), None, Some(2)]);
        let cc = CategoryCounts::compute(&col, 10).unwrap();
        assert_eq!(cc.labels, vec!["1", "2", "3"]);
        assert_eq!(cc.counts, vec![1, 1, 2]);
    }

    #[test]
    fn category_counts_keep_text_in_appearance_order() {
        let col = text_column("Gender", &["M", "F", "F", "M", "X"]);
        let cc = CategoryCounts::compute(&col, 10).unwrap();
        assert_eq!(cc.labels, vec!["M", "F", "X"]);
    }

    #[test]
    fn category_counts_report_unplottable_columns() {
        let empty = text_column("Notes", &["", ""]);
        assert_eq!(
            CategoryCounts::compute(&empty, 10),
            Err(ChartError::EmptyColumn("Notes".into()))
        );

        let wide = int_column("Id", &[Some(1), Some(2), Some(3)]);
        let err = CategoryCounts::compute(&wide, 2).unwrap_err();
        assert!(matches!(err, ChartError::TooManyCategories { count: 3, limit: 2, .. }));

        let ds = Dataset::new(vec![wide]).unwrap();
        assert_eq!(
            CategoryCounts::for_feature(&ds, "Nope", 10),
            Err(ChartError::UnknownColumn("Nope".into()))
        );
    }

    #[test]
    fn histogram_closes_the_last_bin() {
        let h = Histogram::compute(&[0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
        assert_eq!(h.centers().collect::<Vec<_>>(), vec![0.5, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn histogram_of_a_constant_spans_one_unit() {
        let h = Histogram::compute(&[7.0, 7.0, f64::NAN], 2).unwrap();
        assert_eq!(h.edges, vec![6.5, 7.0, 7.5]);
        assert_eq!(h.total(), 2);
        assert!(Histogram::compute(&[f64::NAN], 5).is_none());
        assert!(Histogram::compute(&[1.0], 0).is_none());
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let grid: Vec<f64> = (0..2001).map(|i| -10.0 + i as f64 * 0.015).collect();
        let density = gaussian_kde(&values, &grid).unwrap();
        let area: f64 = density.iter().sum::<f64>() * 0.015;
        assert!((area - 1.0).abs() < 0.01, "area = {area}");

        assert!(gaussian_kde(&[1.0], &grid).is_none());
        assert!(gaussian_kde(&[2.0, 2.0, 2.0], &grid).is_none());
    }

    #[test]
    fn distribution_scales_kde_to_counts() {
        let ages: Vec<Option<i64>> = (14..74).map(Some).collect();
        let col = int_column("Age", &ages);
        let dist = Distribution::compute(&col, 20).unwrap();
        assert_eq!(dist.histogram.counts.len(), 20);
        assert_eq!(dist.histogram.total(), 60);
        let peak = dist.kde.iter().map(|p| p[1]).fold(0.0, f64::max);
        // Uniform ages, 3 per bin: the curve should sit near the bar tops.
        assert!(peak > 1.5 && peak < 4.5, "peak = {peak}");
    }

    #[test]
    fn pearson_uses_pairwise_complete_rows() {
        let x = [Some(1.0), Some(2.0), Some(3.0), None, Some(5.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(100.0), None];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);

        let z = [Some(3.0), Some(2.0), Some(1.0), None, None];
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);

        let flat = [Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0)];
        assert!(pearson(&x, &flat).is_nan());
        assert!(pearson(&[Some(1.0)], &[Some(2.0)]).is_nan());
    }

    #[test]
    fn pearson_is_scale_invariant() {
        let x = [Some(1e-7), Some(2e-7), Some(3e-7)];
        let y = [Some(2e-7), Some(4e-7), Some(6e-7)];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-9);

        let down = [Some(3e-9), Some(2e-9), Some(1e-9)];
        assert!((pearson(&x, &down) + 1.0).abs() < 1e-9);

        let flat = [Some(1e-9), Some(1e-9), Some(1e-9)];
        assert!(pearson(&x, &flat).is_nan());
    }

    #[test]
    fn correlation_matrix_skips_non_numeric_columns() {
        let ds = Dataset::new(vec![
            int_column("a", &[Some(1), Some(2), Some(3)]),
            text_column("label", &["x", "y", "z"]),
            int_column("b", &[Some(3), Some(1), Some(2)]),
            Column {
                name: "flag".into(),
                kind: ColumnKind::Bool,
                values: vec![CellValue::Bool(true), CellValue::Bool(false), CellValue::Bool(true)],
            },
        ])
        .unwrap();
        let corr = CorrelationMatrix::compute(&ds);
        assert_eq!(corr.labels, vec!["a", "b"]);
        assert_eq!(corr.len(), 2);
        assert!((corr.get(0, 0) - 1.0).abs() < 1e-12);
        assert_eq!(corr.get(0, 1), corr.get(1, 0));
        assert!((corr.get(0, 1) + 0.5).abs() < 1e-12);
    }
}
