//! FILENAME: datagrid/src/lib.rs
//! SQLite-backed interactive pivot grid.
//!
//! Hosts embed a [`DataGrid`] per backing table. The grid owns the axis
//! assignment, filter set, and aggregator; every explicit mutation reruns
//! the pivot-engine pipeline (query -> stream -> matrix -> render plan)
//! and the host paints the resulting [`pivot_engine::RenderPlan`].
//! The embedded engine is reached only through the [`QueryEngine`] trait;
//! [`SqliteEngine`] is the bundled default.

pub mod engine;
pub mod error;
pub mod grid;
pub mod schema;

pub use engine::{QueryEngine, SqliteEngine};
pub use error::GridError;
pub use grid::{DataGrid, ValueCount};
pub use schema::{candidate_attributes, table_columns, ColumnDef};
