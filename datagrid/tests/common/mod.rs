//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for datagrid integration tests.

use datagrid::{DataGrid, SqliteEngine};

/// Sales fixture: three discrete columns plus the aggregated REAL `value`.
pub struct SalesFixture;

impl SalesFixture {
    pub fn schema() -> &'static str {
        "CREATE TABLE sales (region TEXT, product TEXT, quarter TEXT, value REAL)"
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64)> {
        vec![
            ("east", "bolt", "Q1", 10.0),
            ("east", "bolt", "Q2", 20.0),
            ("east", "nut", "Q1", 5.0),
            ("west", "bolt", "Q1", 30.0),
            ("west", "nut", "Q2", 40.0),
            ("west", "nut", "Q2", 2.0),
        ]
    }
}

/// Creates a grid over an in-memory database loaded with the sales fixture.
pub fn sales_grid() -> DataGrid<SqliteEngine> {
    let _ = env_logger::builder().is_test(true).try_init();
    let engine = SqliteEngine::open_in_memory().unwrap();
    engine.connection().execute_batch(SalesFixture::schema()).unwrap();
    {
        let conn = engine.connection();
        let mut stmt = conn
            .prepare("INSERT INTO sales VALUES (?1, ?2, ?3, ?4)")
            .unwrap();
        for (region, product, quarter, value) in SalesFixture::data() {
            stmt.execute(rusqlite::params![region, product, quarter, value])
                .unwrap();
        }
    }
    DataGrid::new(engine, "sales").unwrap()
}

/// Shorthand for building owned name lists.
pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
