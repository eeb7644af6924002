//! Pivot Aggregation
//!
//! Groups table rows by row and column pivots and aggregates the displayed
//! columns within each cell.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::SecondsFormat;

use crate::domain::chart::{Aggregate, CellValue, ChartType, TableRow, ViewConfig};

fn cmp_cells(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::String(x), CellValue::String(y)) => x.cmp(y),
        (CellValue::Float(x), CellValue::Float(y)) => x.total_cmp(y),
        (CellValue::Date(x), CellValue::Date(y)) => x.cmp(y),
        _ => a.column_type().as_str().cmp(b.column_type().as_str()),
    }
}

/// Values of the pivot columns identifying one row or series.
#[derive(Debug, Clone, Default)]
pub struct PivotKey(Vec<CellValue>);

impl PivotKey {
    /// Build a key from pivot values.
    #[must_use]
    pub const fn new(values: Vec<CellValue>) -> Self {
        Self(values)
    }

    /// Pivot values in pivot order.
    #[must_use]
    pub fn values(&self) -> &[CellValue] {
        &self.0
    }
}

impl PartialEq for PivotKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PivotKey {}

impl PartialOrd for PivotKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PivotKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| cmp_cells(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.0.len().cmp(&other.0.len()))
    }
}

impl fmt::Display for PivotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            match value {
                CellValue::String(s) => f.write_str(s)?,
                CellValue::Float(v) => write!(f, "{v}")?,
                CellValue::Date(d) => f.write_str(&d.to_rfc3339_opts(SecondsFormat::Secs, true))?,
            }
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn aggregate(kind: Aggregate, values: &[CellValue]) -> Option<f64> {
    let floats = || values.iter().filter_map(CellValue::as_f64);
    match kind {
        Aggregate::Avg => {
            let (sum, n) = floats().fold((0.0, 0_u32), |(s, n), v| (s + v, n + 1));
            (n > 0).then(|| sum / f64::from(n))
        }
        Aggregate::Sum => Some(floats().sum()),
        Aggregate::Count => Some(values.len() as f64),
        Aggregate::DistinctCount => {
            let mut sorted: Vec<&CellValue> = values.iter().collect();
            sorted.sort_by(|a, b| cmp_cells(a, b));
            sorted.dedup_by(|a, b| cmp_cells(a, b).is_eq());
            Some(sorted.len() as f64)
        }
        Aggregate::Last => values.last().and_then(CellValue::as_f64),
        Aggregate::High => floats().reduce(f64::max),
        Aggregate::Low => floats().reduce(f64::min),
    }
}

/// Aggregated chart data produced by a render.
#[derive(Debug, Clone, Default)]
pub struct PivotView {
    chart_type: ChartType,
    row_keys: Vec<PivotKey>,
    column_keys: Vec<PivotKey>,
    cells: BTreeMap<(PivotKey, PivotKey, String), f64>,
    source_rows: usize,
}

impl PivotView {
    /// Aggregate `rows` according to `config`.
    ///
    /// `columns` lists the displayed columns; pivot columns must exist in
    /// every row.
    #[must_use]
    pub fn build(config: &ViewConfig, columns: &[String], rows: &[TableRow]) -> Self {
        let key_of = |row: &TableRow, pivots: &[String]| {
            PivotKey::new(
                pivots
                    .iter()
                    .filter_map(|p| row.get(p).cloned())
                    .collect(),
            )
        };

        let mut groups: BTreeMap<(PivotKey, PivotKey, String), Vec<CellValue>> = BTreeMap::new();
        for row in rows {
            let row_key = key_of(row, &config.row_pivots);
            let column_key = key_of(row, &config.column_pivots);
            for column in columns {
                if let Some(value) = row.get(column) {
                    groups
                        .entry((row_key.clone(), column_key.clone(), column.clone()))
                        .or_default()
                        .push(value.clone());
                }
            }
        }

        let mut row_keys: Vec<PivotKey> = groups.keys().map(|(r, _, _)| r.clone()).collect();
        row_keys.dedup();
        let mut column_keys: Vec<PivotKey> = groups.keys().map(|(_, c, _)| c.clone()).collect();
        column_keys.sort();
        column_keys.dedup();

        let cells = groups
            .into_iter()
            .filter_map(|(key, values)| {
                aggregate(config.aggregate_for(&key.2), &values).map(|v| (key, v))
            })
            .collect();

        Self {
            chart_type: config.chart_type,
            row_keys,
            column_keys,
            cells,
            source_rows: rows.len(),
        }
    }

    /// Chart type the view was rendered for.
    #[must_use]
    pub const fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// Distinct row pivot keys, ascending.
    #[must_use]
    pub fn row_keys(&self) -> &[PivotKey] {
        &self.row_keys
    }

    /// Distinct column pivot keys (one per series), ascending.
    #[must_use]
    pub fn column_keys(&self) -> &[PivotKey] {
        &self.column_keys
    }

    /// Number of table rows the view was built from.
    #[must_use]
    pub const fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Aggregated value of one cell.
    #[must_use]
    pub fn value(&self, row_key: &PivotKey, column_key: &PivotKey, column: &str) -> Option<f64> {
        self.cells
            .get(&(row_key.clone(), column_key.clone(), column.to_string()))
            .copied()
    }

    /// Points of one series, ordered by row key.
    #[must_use]
    pub fn series(&self, column_key: &PivotKey, column: &str) -> Vec<(PivotKey, f64)> {
        self.row_keys
            .iter()
            .filter_map(|row_key| {
                self.value(row_key, column_key, column)
                    .map(|v| (row_key.clone(), v))
            })
            .collect()
    }

    /// Points of the series for a single string pivot value, such as a stock.
    #[must_use]
    pub fn series_for(&self, split: &str, column: &str) -> Vec<(PivotKey, f64)> {
        self.series(
            &PivotKey::new(vec![CellValue::String(split.to_string())]),
            column,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn floats(values: &[f64]) -> Vec<CellValue> {
        values.iter().copied().map(CellValue::Float).collect()
    }

    #[test_case(Aggregate::Avg => Some(2.0))]
    #[test_case(Aggregate::Sum => Some(6.0))]
    #[test_case(Aggregate::Count => Some(3.0))]
    #[test_case(Aggregate::DistinctCount => Some(2.0))]
    #[test_case(Aggregate::Last => Some(1.0))]
    #[test_case(Aggregate::High => Some(4.0))]
    #[test_case(Aggregate::Low => Some(1.0))]
    fn aggregates_over_floats(kind: Aggregate) -> Option<f64> {
        aggregate(kind, &floats(&[1.0, 4.0, 1.0]))
    }

    #[test]
    fn avg_of_strings_is_empty() {
        let values = vec![CellValue::String("a".to_string())];
        assert_eq!(aggregate(Aggregate::Avg, &values), None);
        assert_eq!(aggregate(Aggregate::DistinctCount, &values), Some(1.0));
    }

    #[test]
    fn pivot_keys_order_by_value() {
        let a = PivotKey::new(floats(&[2.0]));
        let b = PivotKey::new(floats(&[10.0]));
        assert!(a < b);
        assert_eq!(a, PivotKey::new(floats(&[2.0])));
    }

    #[test]
    fn pivot_key_display() {
        let key = PivotKey::new(vec![
            CellValue::String("ABC".to_string()),
            CellValue::Float(1.5),
        ]);
        assert_eq!(key.to_string(), "ABC|1.5");
    }
}
