//! Headless Chart Surface
//!
//! A [`ChartSurface`] that keeps its configuration and bound table in memory
//! and renders to a [`PivotView`] instead of pixels. Used by the binary to
//! report what the chart shows and by tests to observe the binding.

mod pivot;

pub use pivot::{PivotKey, PivotView};

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::application::ports::{ChartSurface, SurfaceError, TablePort};
use crate::domain::chart::ViewConfig;

#[derive(Default)]
struct ViewerState {
    config: ViewConfig,
    attributes: BTreeMap<String, String>,
    table: Option<Arc<dyn TablePort>>,
    changes: Option<watch::Receiver<u64>>,
}

/// In-memory chart surface.
#[derive(Default)]
pub struct HeadlessViewer {
    state: RwLock<ViewerState>,
}

impl HeadlessViewer {
    /// Create an unconfigured viewer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value of an attribute as last set.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.state.read().attributes.get(name).cloned()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> ViewConfig {
        self.state.read().config.clone()
    }

    /// Whether a table is bound.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.read().table.is_some()
    }

    /// Whether the bound table changed since the last render.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.state
            .read()
            .changes
            .as_ref()
            .is_some_and(|rx| rx.has_changed().unwrap_or(false))
    }

    /// Aggregate the bound table's current contents.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::NotLoaded`] without a bound table, or the
    /// table's error if it cannot be read.
    pub fn render(&self) -> Result<PivotView, SurfaceError> {
        let mut state = self.state.write();
        let Some(table) = state.table.clone() else {
            return Err(SurfaceError::NotLoaded);
        };

        if let Some(rx) = state.changes.as_mut() {
            rx.mark_unchanged();
        }

        let rows = table.rows()?;
        let columns = if state.config.columns.is_empty() {
            table
                .schema()
                .columns()
                .iter()
                .map(|c| c.name.clone())
                .collect()
        } else {
            state.config.columns.clone()
        };

        let view = PivotView::build(&state.config, &columns, &rows);
        tracing::trace!(
            rows = view.source_rows(),
            series = view.column_keys().len(),
            "Rendered chart"
        );
        Ok(view)
    }
}

impl ChartSurface for HeadlessViewer {
    fn set_attribute(&self, name: &str, value: &str) -> Result<(), SurfaceError> {
        let mut state = self.state.write();
        state.config.set_attribute(name, value)?;
        state.attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, table: Arc<dyn TablePort>) -> Result<(), SurfaceError> {
        let mut state = self.state.write();
        state.changes = Some(table.subscribe());
        state.table = Some(table);
        Ok(())
    }

    fn unload(&self) {
        let mut state = self.state.write();
        state.table = None;
        state.changes = None;
    }
}

impl std::fmt::Debug for HeadlessViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("HeadlessViewer")
            .field("attributes", &state.attributes)
            .field("loaded", &state.table.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chart::{
        ATTR_AGGREGATES, ATTR_VIEW, CellValue, ChartRow, ChartType, TOP_ASK_PRICE, TableRow,
        chart_schema,
    };
    use crate::infrastructure::table::ColumnarTable;
    use chrono::{TimeZone, Utc};

    fn row(stock: &str, minute: u32, ask: f64) -> TableRow {
        TableRow::from(ChartRow {
            stock: stock.to_string(),
            top_ask_price: ask,
            top_bid_price: 0.0,
            timestamp: Utc.with_ymd_and_hms(2023, 1, 1, 0, minute, 0).unwrap(),
        })
    }

    fn configured_viewer() -> HeadlessViewer {
        let viewer = HeadlessViewer::new();
        for (name, value) in ViewConfig::quote_chart().to_attributes().unwrap() {
            viewer.set_attribute(name, &value).unwrap();
        }
        viewer
    }

    #[test]
    fn render_without_table_fails() {
        assert!(matches!(
            HeadlessViewer::new().render(),
            Err(SurfaceError::NotLoaded)
        ));
    }

    #[test]
    fn set_attribute_records_value_and_config() {
        let viewer = HeadlessViewer::new();
        viewer.set_attribute(ATTR_VIEW, "y_bar").unwrap();

        assert_eq!(viewer.attribute(ATTR_VIEW).as_deref(), Some("y_bar"));
        assert_eq!(viewer.config().chart_type, ChartType::YBar);
    }

    #[test]
    fn invalid_attribute_is_not_recorded() {
        let viewer = HeadlessViewer::new();
        let result = viewer.set_attribute(ATTR_AGGREGATES, "not json");

        assert!(matches!(result, Err(SurfaceError::InvalidAttribute(_))));
        assert!(viewer.attribute(ATTR_AGGREGATES).is_none());
    }

    #[test]
    fn render_averages_ask_per_timestamp_and_stock() {
        let viewer = configured_viewer();
        let table = Arc::new(ColumnarTable::new(chart_schema()).unwrap());
        viewer.load(table.clone()).unwrap();

        table
            .update(vec![
                row("ABC", 0, 10.0),
                row("ABC", 0, 20.0),
                row("DEF", 0, 5.0),
                row("ABC", 1, 11.0),
            ])
            .unwrap();

        let view = viewer.render().unwrap();

        assert_eq!(view.source_rows(), 4);
        assert_eq!(view.row_keys().len(), 2);
        assert_eq!(view.column_keys().len(), 2);

        let abc: Vec<f64> = view
            .series_for("ABC", TOP_ASK_PRICE)
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(abc, vec![15.0, 11.0]);

        let def = view.series_for("DEF", TOP_ASK_PRICE);
        assert_eq!(def.len(), 1);
        assert_eq!(
            def[0].0.values(),
            &[CellValue::Date(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap())]
        );
    }

    #[test]
    fn pending_changes_cleared_by_render() {
        let viewer = configured_viewer();
        let table = Arc::new(ColumnarTable::new(chart_schema()).unwrap());
        viewer.load(table.clone()).unwrap();
        assert!(!viewer.has_pending_changes());

        table.update(vec![row("ABC", 0, 1.0)]).unwrap();
        assert!(viewer.has_pending_changes());

        viewer.render().unwrap();
        assert!(!viewer.has_pending_changes());
    }

    #[test]
    fn unload_detaches_table() {
        let viewer = configured_viewer();
        viewer
            .load(Arc::new(ColumnarTable::new(chart_schema()).unwrap()))
            .unwrap();

        viewer.unload();

        assert!(!viewer.is_loaded());
        assert!(matches!(viewer.render(), Err(SurfaceError::NotLoaded)));
    }
}
