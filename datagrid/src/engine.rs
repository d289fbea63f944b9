//! FILENAME: datagrid/src/engine.rs
//! The backing query engine contract and its SQLite adapter.
//!
//! The core depends only on this contract: execute a statement with
//! optional bind parameters and stream result rows, in emission order,
//! through a callback that also sees the statement's column names.
//! Returning `Ok(())` is the end-of-results signal; a mid-stream failure
//! surfaces as `Err` and the caller discards whatever it assembled.

use pivot_engine::Datum;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};

use crate::error::GridError;

/// Serialized request/response channel to the embedded engine.
pub trait QueryEngine {
    /// Executes `sql`, invoking `on_row` once per result row with the
    /// statement's column names and the row's values.
    fn execute(
        &self,
        sql: &str,
        params: &[Datum],
        on_row: &mut dyn FnMut(&[String], &[Datum]),
    ) -> Result<(), GridError>;
}

/// The default adapter over an embedded SQLite database.
pub struct SqliteEngine {
    conn: Connection,
}

impl SqliteEngine {
    pub fn open(path: &str) -> Result<Self, GridError> {
        Ok(SqliteEngine {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, GridError> {
        Ok(SqliteEngine {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Direct access for hosts that load data themselves.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl QueryEngine for SqliteEngine {
    fn execute(
        &self,
        sql: &str,
        params: &[Datum],
        on_row: &mut dyn FnMut(&[String], &[Datum]),
    ) -> Result<(), GridError> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = column_names.len();

        let bound: Vec<Value> = params.iter().map(datum_to_value).collect();
        let mut rows = stmt.query(params_from_iter(bound))?;
        let mut buffer: Vec<Datum> = Vec::with_capacity(column_count);
        while let Some(row) = rows.next()? {
            buffer.clear();
            for index in 0..column_count {
                buffer.push(datum_from_value(row.get_ref(index)?));
            }
            on_row(&column_names, &buffer);
        }
        Ok(())
    }
}

fn datum_to_value(datum: &Datum) -> Value {
    match datum {
        Datum::Null => Value::Null,
        Datum::Integer(i) => Value::Integer(*i),
        Datum::Real(x) => Value::Real(*x),
        Datum::Text(s) => Value::Text(s.clone()),
    }
}

fn datum_from_value(value: ValueRef<'_>) -> Datum {
    match value {
        ValueRef::Null => Datum::Null,
        ValueRef::Integer(i) => Datum::Integer(i),
        ValueRef::Real(x) => Datum::Real(x),
        ValueRef::Text(t) => Datum::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Datum::Text(String::from_utf8_lossy(b).into_owned()),
    }
}
