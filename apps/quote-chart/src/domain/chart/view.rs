//! Chart View Configuration
//!
//! Declarative configuration of a chart surface: chart type, pivots,
//! displayed columns and per-column aggregates. Surfaces receive it as a set
//! of named attributes whose values are JSON strings, except `view`, which
//! carries the bare chart type name.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::row::{STOCK, TIMESTAMP, TOP_ASK_PRICE, TOP_BID_PRICE};

/// Chart type attribute.
pub const ATTR_VIEW: &str = "view";
/// Column pivots attribute.
pub const ATTR_COLUMN_PIVOTS: &str = "column-pivots";
/// Row pivots attribute.
pub const ATTR_ROW_PIVOTS: &str = "row-pivots";
/// Displayed columns attribute.
pub const ATTR_COLUMNS: &str = "columns";
/// Aggregates attribute.
pub const ATTR_AGGREGATES: &str = "aggregates";

// =============================================================================
// Chart Types and Aggregates
// =============================================================================

/// Kind of chart drawn by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartType {
    /// Continuous line chart.
    #[default]
    #[serde(rename = "y_line")]
    YLine,
    /// Vertical bar chart.
    #[serde(rename = "y_bar")]
    YBar,
    /// Scatter chart.
    #[serde(rename = "y_scatter")]
    YScatter,
    /// Plain data grid.
    #[serde(rename = "datagrid")]
    DataGrid,
}

impl ChartType {
    /// Attribute value for this chart type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::YLine => "y_line",
            Self::YBar => "y_bar",
            Self::YScatter => "y_scatter",
            Self::DataGrid => "datagrid",
        }
    }
}

impl FromStr for ChartType {
    type Err = ViewConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "y_line" => Ok(Self::YLine),
            "y_bar" => Ok(Self::YBar),
            "y_scatter" => Ok(Self::YScatter),
            "datagrid" => Ok(Self::DataGrid),
            other => Err(ViewConfigError::UnknownChartType(other.to_string())),
        }
    }
}

/// Aggregation applied to a column within a pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Aggregate {
    /// Arithmetic mean.
    #[serde(rename = "avg")]
    Avg,
    /// Sum.
    #[serde(rename = "sum")]
    Sum,
    /// Number of values.
    #[serde(rename = "count")]
    Count,
    /// Number of distinct values.
    #[serde(rename = "distinct count")]
    DistinctCount,
    /// Most recently appended value.
    #[serde(rename = "last")]
    Last,
    /// Maximum.
    #[serde(rename = "high")]
    High,
    /// Minimum.
    #[serde(rename = "low")]
    Low,
}

impl Aggregate {
    /// Aggregate name as written in the `aggregates` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Count => "count",
            Self::DistinctCount => "distinct count",
            Self::Last => "last",
            Self::High => "high",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// View Config
// =============================================================================

/// Complete surface configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewConfig {
    /// Chart type.
    pub chart_type: ChartType,
    /// Columns whose values split the chart into series.
    pub column_pivots: Vec<String>,
    /// Columns whose values group rows along the x axis.
    pub row_pivots: Vec<String>,
    /// Columns drawn.
    pub columns: Vec<String>,
    /// Aggregate per column.
    pub aggregates: BTreeMap<String, Aggregate>,
}

impl ViewConfig {
    /// Line chart of the best ask price per stock over time.
    #[must_use]
    pub fn quote_chart() -> Self {
        Self {
            chart_type: ChartType::YLine,
            column_pivots: vec![STOCK.to_string()],
            row_pivots: vec![TIMESTAMP.to_string()],
            columns: vec![TOP_ASK_PRICE.to_string()],
            aggregates: BTreeMap::from([
                (STOCK.to_string(), Aggregate::DistinctCount),
                (TOP_ASK_PRICE.to_string(), Aggregate::Avg),
                (TOP_BID_PRICE.to_string(), Aggregate::Avg),
                (TIMESTAMP.to_string(), Aggregate::DistinctCount),
            ]),
        }
    }

    /// Encode as `(attribute, value)` pairs in application order.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be JSON-encoded.
    pub fn to_attributes(&self) -> Result<Vec<(&'static str, String)>, ViewConfigError> {
        Ok(vec![
            (ATTR_VIEW, self.chart_type.as_str().to_string()),
            (ATTR_COLUMN_PIVOTS, encode(ATTR_COLUMN_PIVOTS, &self.column_pivots)?),
            (ATTR_ROW_PIVOTS, encode(ATTR_ROW_PIVOTS, &self.row_pivots)?),
            (ATTR_COLUMNS, encode(ATTR_COLUMNS, &self.columns)?),
            (ATTR_AGGREGATES, encode(ATTR_AGGREGATES, &self.aggregates)?),
        ])
    }

    /// Apply a single attribute.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown attributes or undecodable values.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), ViewConfigError> {
        match name {
            ATTR_VIEW => self.chart_type = value.parse()?,
            ATTR_COLUMN_PIVOTS => self.column_pivots = decode(name, value)?,
            ATTR_ROW_PIVOTS => self.row_pivots = decode(name, value)?,
            ATTR_COLUMNS => self.columns = decode(name, value)?,
            ATTR_AGGREGATES => self.aggregates = decode(name, value)?,
            other => return Err(ViewConfigError::UnknownAttribute(other.to_string())),
        }
        Ok(())
    }

    /// Aggregate for a column, defaulting to `last` when unconfigured.
    #[must_use]
    pub fn aggregate_for(&self, column: &str) -> Aggregate {
        self.aggregates
            .get(column)
            .copied()
            .unwrap_or(Aggregate::Last)
    }
}

fn encode<T: Serialize>(name: &str, value: &T) -> Result<String, ViewConfigError> {
    serde_json::to_string(value).map_err(|source| ViewConfigError::InvalidValue {
        attribute: name.to_string(),
        source,
    })
}

fn decode<T: for<'de> Deserialize<'de>>(name: &str, value: &str) -> Result<T, ViewConfigError> {
    serde_json::from_str(value).map_err(|source| ViewConfigError::InvalidValue {
        attribute: name.to_string(),
        source,
    })
}

/// View configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ViewConfigError {
    /// Attribute name not recognised.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
    /// Chart type not recognised.
    #[error("unknown chart type: {0}")]
    UnknownChartType(String),
    /// Attribute value is not valid JSON of the expected shape.
    #[error("invalid value for attribute {attribute}: {source}")]
    InvalidValue {
        /// Attribute name.
        attribute: String,
        /// Decode error.
        #[source]
        source: serde_json::Error,
    },
}
