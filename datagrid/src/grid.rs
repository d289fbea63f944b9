//! FILENAME: datagrid/src/grid.rs
//! The grid controller: axis reassignment protocol and refresh pipeline.
//!
//! `DataGrid` is the explicit in-memory owner of the pivot configuration.
//! Every mutation (drag move, filter commit, aggregator change, external
//! config push) goes through a method here and triggers a full rebuild:
//! Query Builder -> engine stream -> Matrix Assembler -> Renderer. Nothing
//! is patched incrementally and the render plan is regenerated from
//! scratch each time, so rerunning a refresh with an unchanged
//! configuration yields an identical plan.
//!
//! `refresh` takes `&mut self`: refreshes on one grid instance are
//! serialized by construction and cannot interleave.

use pivot_engine::{
    pivot_sql, render, value_list_sql, Aggregator, Axis, AxisAssignment, AxisConfig, Datum,
    FilterSet, MatrixBuilder, PivotError, RenderPlan, ResultMatrix,
};
use serde::{Deserialize, Serialize};

use crate::engine::QueryEngine;
use crate::error::GridError;
use crate::schema::{candidate_attributes, table_columns};

/// One entry of the filter popup list: a distinct attribute value and how
/// many backing rows carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: Datum,
    pub count: i64,
}

/// An interactive pivot grid over one backing table.
pub struct DataGrid<E: QueryEngine> {
    engine: E,
    table: String,
    assignment: AxisAssignment,
    filters: FilterSet,
    aggregator: Aggregator,
    plan: RenderPlan,
}

impl<E: QueryEngine> DataGrid<E> {
    /// Creates a grid over `table` with every attribute Unused. A missing
    /// table yields a grid with no attributes and an empty plan.
    pub fn new(engine: E, table: impl Into<String>) -> Result<Self, GridError> {
        let mut grid = DataGrid {
            engine,
            table: table.into(),
            assignment: AxisAssignment::default(),
            filters: FilterSet::default(),
            aggregator: Aggregator::default(),
            plan: RenderPlan::default(),
        };
        grid.initialize()?;
        Ok(grid)
    }

    /// Re-reads the live schema and reconciles the assignment with it:
    /// attributes that disappeared leave their axis, new columns join as
    /// Unused. Call after loading data into the backing table.
    pub fn initialize(&mut self) -> Result<(), GridError> {
        let attrs = self.live_attributes()?;
        self.assignment.sync_schema(&attrs);
        Ok(())
    }

    fn live_attributes(&self) -> Result<Vec<String>, GridError> {
        Ok(match table_columns(&self.engine, &self.table)? {
            Some(columns) => candidate_attributes(&columns),
            None => Vec::new(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn assignment(&self) -> &AxisAssignment {
        &self.assignment
    }

    pub fn aggregator(&self) -> Aggregator {
        self.aggregator
    }

    /// The most recently rendered plan. Retained unchanged when a refresh
    /// fails, so a configuration or engine error never blanks the view.
    pub fn plan(&self) -> &RenderPlan {
        &self.plan
    }

    /// Whether `attr` carries a committed filter (the UI's italic marker).
    pub fn is_filtered(&self, attr: &str) -> bool {
        self.filters.is_filtered(attr)
    }

    /// The configuration payload emitted to the host whenever assignment
    /// changes locally, and accepted back via [`DataGrid::apply_axis_config`].
    pub fn axis_config(&self) -> AxisConfig {
        AxisConfig::of(&self.assignment)
    }

    // ========================================================================
    // REASSIGNMENT PROTOCOL
    // ========================================================================

    /// UI-driven move: puts `name` on `axis` at ordinal `position` (the
    /// host derives the position from the drop location) and refreshes.
    pub fn move_attribute(
        &mut self,
        name: &str,
        axis: Axis,
        position: usize,
    ) -> Result<&RenderPlan, GridError> {
        self.assignment.move_to(name, axis, position)?;
        self.refresh()
    }

    /// External config push for the row axis; refreshes only on change.
    /// Returns whether anything changed.
    pub fn set_row_axis(&mut self, names: &[String]) -> Result<bool, GridError> {
        if !self.assignment.set_row_axis(names) {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// External config push for the column axis; refreshes only on change.
    pub fn set_col_axis(&mut self, names: &[String]) -> Result<bool, GridError> {
        if !self.assignment.set_col_axis(names) {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }

    /// Applies a persisted configuration to both axes, refreshing once if
    /// either changed.
    pub fn apply_axis_config(&mut self, config: &AxisConfig) -> Result<bool, GridError> {
        let row_changed = self.assignment.set_row_axis(&config.row_axis);
        let col_changed = self.assignment.set_col_axis(&config.col_axis);
        if row_changed || col_changed {
            self.refresh()?;
        }
        Ok(row_changed || col_changed)
    }

    pub fn set_aggregator(&mut self, aggregator: Aggregator) -> Result<&RenderPlan, GridError> {
        self.aggregator = aggregator;
        self.refresh()
    }

    /// Filter commit: `Some(values)` installs an allow-list for `attr`,
    /// `None` means "all selected" and clears the filter. (A cancelled
    /// filter popup never reaches the grid; cancel is a host-side no-op.)
    pub fn apply_filter(
        &mut self,
        attr: &str,
        selection: Option<Vec<Datum>>,
    ) -> Result<&RenderPlan, GridError> {
        if self.assignment.role_of(attr).is_none() {
            return Err(PivotError::UnknownAttribute(attr.to_string()).into());
        }
        self.filters.apply(attr, selection);
        self.refresh()
    }

    // ========================================================================
    // REFRESH PIPELINE
    // ========================================================================

    /// Runs the full pipeline and installs the new plan. On any failure the
    /// previous plan stays in place and the error propagates; nothing is
    /// retried and a partial matrix is never rendered.
    pub fn refresh(&mut self) -> Result<&RenderPlan, GridError> {
        let matrix = self.query_matrix()?;
        self.plan = render(&matrix);
        log::debug!(
            "refreshed `{}`: {} row keys x {} col keys",
            self.table,
            matrix.row_keys.len(),
            matrix.col_keys.len()
        );
        Ok(&self.plan)
    }

    /// Builds and executes the pivot query, assembling the result matrix.
    /// A missing table short-circuits to an empty matrix.
    pub fn query_matrix(&self) -> Result<ResultMatrix, GridError> {
        let row_attrs = self.assignment.row_attrs().to_vec();
        let col_attrs = self.assignment.col_attrs().to_vec();
        // Only a missing table bails out; a table with no discrete columns
        // still runs the grand-total query over its measure.
        let schema_attrs = match table_columns(&self.engine, &self.table)? {
            Some(columns) => candidate_attributes(&columns),
            None => return Ok(MatrixBuilder::new(row_attrs, col_attrs).finish()),
        };

        let sql = pivot_sql(
            &self.table,
            &row_attrs,
            &col_attrs,
            self.aggregator,
            &self.filters,
            &schema_attrs,
        )?;
        log::debug!("pivot query: {}", sql);

        let mut builder = MatrixBuilder::new(row_attrs, col_attrs);
        let mut ingest_error: Option<PivotError> = None;
        self.engine.execute(&sql, &[], &mut |names, row| {
            if ingest_error.is_none() {
                if let Err(e) = builder.ingest(names, row) {
                    ingest_error = Some(e);
                }
            }
        })?;
        if let Some(e) = ingest_error {
            return Err(e.into());
        }
        Ok(builder.finish())
    }

    // ========================================================================
    // FILTER POPUP SUPPORT
    // ========================================================================

    /// Distinct values and row counts for one attribute, ordered ascending.
    /// Drives the filter popup list; independent of the main pivot query.
    pub fn value_list(&self, attr: &str) -> Result<Vec<ValueCount>, GridError> {
        let schema_attrs = self.live_attributes()?;
        let sql = value_list_sql(&self.table, attr, &schema_attrs)?;
        let mut list = Vec::new();
        self.engine.execute(&sql, &[], &mut |_, row| {
            let count = match row.get(1) {
                Some(Datum::Integer(n)) => *n,
                _ => 0,
            };
            if let Some(value) = row.first() {
                list.push(ValueCount {
                    value: value.clone(),
                    count,
                });
            }
        })?;
        Ok(list)
    }
}
