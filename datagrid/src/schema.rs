//! FILENAME: datagrid/src/schema.rs
//! Live schema introspection for the backing table.
//!
//! Axis candidates are the table's discrete columns: anything declared as
//! a REAL/floating type is excluded, leaving the implicit numeric `value`
//! column as the only aggregated measure.

use pivot_engine::Datum;
use serde::{Deserialize, Serialize};

use crate::engine::QueryEngine;
use crate::error::GridError;

/// One column of the backing table, as declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub decl_type: String,
}

/// Fetches the live column list for `table`, or `None` if the table does
/// not exist yet (a grid over a missing table renders empty, not an error).
pub fn table_columns(
    engine: &dyn QueryEngine,
    table: &str,
) -> Result<Option<Vec<ColumnDef>>, GridError> {
    let mut exists = false;
    engine.execute(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
        &[Datum::Text(table.to_string())],
        &mut |_, _| exists = true,
    )?;
    if !exists {
        return Ok(None);
    }

    let mut columns = Vec::new();
    engine.execute(
        "SELECT name, type FROM pragma_table_info(?1)",
        &[Datum::Text(table.to_string())],
        &mut |_, row| {
            // Rows that do not carry both pragma columns are skipped; the
            // engine behind the trait is not necessarily SQLite.
            if let (Some(Datum::Text(name)), Some(decl)) = (row.first(), row.get(1)) {
                columns.push(ColumnDef {
                    name: name.clone(),
                    decl_type: decl.to_string(),
                });
            }
        },
    )?;
    Ok(Some(columns))
}

/// Filters the column list down to axis candidates: every column whose
/// declared type is not a floating/REAL type.
pub fn candidate_attributes(columns: &[ColumnDef]) -> Vec<String> {
    columns
        .iter()
        .filter(|col| {
            let decl = col.decl_type.to_ascii_uppercase();
            !decl.ends_with("REAL") && !decl.contains("FLOA") && !decl.contains("DOUB")
        })
        .map(|col| col.name.clone())
        .collect()
}
