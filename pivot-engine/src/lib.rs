//! FILENAME: pivot-engine/src/lib.rs
//! Pivot cross-tabulation core.
//!
//! This crate turns an axis/filter/aggregator configuration into an
//! aggregation query, assembles the streamed result rows into a sparse
//! two-dimensional matrix, and derives a merged-header rendering plan
//! from that matrix. It knows nothing about the backing database or
//! the UI; hosts drive it through plain function calls.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot view IS)
//! - `query`: SQL generation (HOW we ask the engine)
//! - `matrix`: Streaming result assembly (HOW we collect)
//! - `span`: Merged-cell span computation (HOW headers collapse)
//! - `render`: Renderable output for the frontend (WHAT we display)

pub mod definition;
pub mod error;
pub mod matrix;
pub mod query;
pub mod render;
pub mod span;

pub use definition::{Aggregator, Axis, AxisAssignment, AxisConfig, Datum, FilterSet, Key};
pub use error::PivotError;
pub use matrix::{totals_key, MatrixBuilder, ResultMatrix, TOTALS_LABEL};
pub use query::{pivot_sql, quote_ident, quote_literal, value_list_sql, VALUE_COLUMN};
pub use render::{render, BodyCell, BodyRow, HeaderCell, HeaderKind, RenderPlan};
pub use span::span_size;
