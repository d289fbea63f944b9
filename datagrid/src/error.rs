//! FILENAME: datagrid/src/error.rs

use pivot_engine::PivotError;
use thiserror::Error;

/// Failures surfaced by the grid host layer.
///
/// `Config` aborts a refresh before any query runs; `Sqlite` covers engine
/// failures including mid-stream ones, after which the partial matrix is
/// discarded and the previous render plan stays in place.
#[derive(Error, Debug)]
pub enum GridError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("configuration error: {0}")]
    Config(#[from] PivotError),
}
