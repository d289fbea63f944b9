//! FILENAME: pivot-engine/src/matrix.rs
//! Streaming assembly of the sparse two-dimensional result matrix.
//!
//! The assembler consumes aggregation rows one at a time, in the order the
//! engine emits them. Row keys arrive pre-sorted (the query orders by the
//! full grouping tuple, row attributes first), so a new row group simply
//! begins whenever the projected row key differs from the last one. Column
//! keys are NOT sorted across row groups and are merged positionally into
//! a sorted arena with explicit insert-and-shift semantics.

use serde::{Deserialize, Serialize};
use smallvec::smallvec;

use crate::definition::{Datum, Key};
use crate::error::PivotError;
use crate::query::VALUE_COLUMN;

/// Label of the synthetic key used when an axis has no attributes.
pub const TOTALS_LABEL: &str = "Totals";

/// The single-element `["Totals"]` key.
pub fn totals_key() -> Key {
    smallvec![Datum::Text(TOTALS_LABEL.to_string())]
}

/// The settled cross-tabulation result.
///
/// Invariants: `row_keys` and `col_keys` are sorted ascending and unique,
/// and every `values[i]` has exactly `col_keys.len()` entries. An absent
/// cell (`None`) means no group matched that row/column pair; it is
/// distinct from a present NULL aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    pub row_attrs: Vec<String>,
    pub col_attrs: Vec<String>,
    pub row_keys: Vec<Key>,
    pub col_keys: Vec<Key>,
    pub values: Vec<Vec<Option<Datum>>>,
}

impl ResultMatrix {
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }

    pub fn value(&self, row: usize, col: usize) -> Option<&Datum> {
        self.values.get(row)?.get(col)?.as_ref()
    }
}

/// Incremental matrix builder fed by the engine's row callbacks.
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    row_attrs: Vec<String>,
    col_attrs: Vec<String>,
    row_keys: Vec<Key>,
    col_keys: Vec<Key>,
    values: Vec<Vec<Option<Datum>>>,
}

impl MatrixBuilder {
    pub fn new(row_attrs: Vec<String>, col_attrs: Vec<String>) -> Self {
        MatrixBuilder {
            row_attrs,
            col_attrs,
            row_keys: Vec::new(),
            col_keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Consumes one result row as delivered by the engine: projects it onto
    /// the row and column attributes (falling back to the synthetic Totals
    /// key for an empty axis), pulls out the aggregate, and records it.
    pub fn ingest(&mut self, column_names: &[String], row: &[Datum]) -> Result<(), PivotError> {
        let row_key = if self.row_attrs.is_empty() {
            totals_key()
        } else {
            project(&self.row_attrs, column_names, row)?
        };
        let col_key = if self.col_attrs.is_empty() {
            totals_key()
        } else {
            project(&self.col_attrs, column_names, row)?
        };
        let value_index = column_names
            .iter()
            .position(|name| name == VALUE_COLUMN)
            .ok_or_else(|| PivotError::MalformedRow(format!("no `{}` column", VALUE_COLUMN)))?;
        let value = row
            .get(value_index)
            .cloned()
            .ok_or_else(|| PivotError::MalformedRow("row shorter than column list".to_string()))?;
        self.record(row_key, col_key, value);
        Ok(())
    }

    /// Records one aggregate at the (row key, column key) coordinate.
    ///
    /// A new row group starts whenever `row_key` differs from the last
    /// appended key. The column key is resolved with a linear scan for the
    /// first existing key >= the incoming one: strictly greater means a
    /// fresh column is inserted there and backfilled with `None` in every
    /// row; equal reuses the index; no match appends at the end.
    pub fn record(&mut self, row_key: Key, col_key: Key, value: Datum) {
        if self.row_keys.last() != Some(&row_key) {
            self.row_keys.push(row_key);
            self.values.push(vec![None; self.col_keys.len()]);
        }

        let col_index = match self.col_keys.iter().position(|k| *k >= col_key) {
            None => {
                self.col_keys.push(col_key);
                for row in &mut self.values {
                    row.push(None);
                }
                self.col_keys.len() - 1
            }
            Some(i) if self.col_keys[i] == col_key => i,
            Some(i) => {
                self.col_keys.insert(i, col_key);
                for row in &mut self.values {
                    row.insert(i, None);
                }
                i
            }
        };

        let row_index = self.row_keys.len() - 1;
        self.values[row_index][col_index] = Some(value);
    }

    /// Finalizes the matrix once the row stream has ended.
    pub fn finish(self) -> ResultMatrix {
        ResultMatrix {
            row_attrs: self.row_attrs,
            col_attrs: self.col_attrs,
            row_keys: self.row_keys,
            col_keys: self.col_keys,
            values: self.values,
        }
    }
}

fn project(attrs: &[String], column_names: &[String], row: &[Datum]) -> Result<Key, PivotError> {
    attrs
        .iter()
        .map(|attr| {
            let index = column_names
                .iter()
                .position(|name| name == attr)
                .ok_or_else(|| PivotError::UnknownAttribute(attr.clone()))?;
            row.get(index)
                .cloned()
                .ok_or_else(|| PivotError::MalformedRow("row shorter than column list".to_string()))
        })
        .collect()
}
