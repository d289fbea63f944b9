//! FILENAME: tests/test_pivot.rs
//! End-to-end pivot tests over an in-memory SQLite database.

mod common;

use std::cell::Cell;

use common::{names, sales_grid, SalesFixture};
use datagrid::{DataGrid, GridError, QueryEngine, SqliteEngine};
use pivot_engine::{totals_key, Aggregator, Axis, AxisConfig, Datum, HeaderKind, Key, RenderPlan};

fn key(parts: &[&str]) -> Key {
    parts.iter().map(|p| Datum::Text(p.to_string())).collect()
}

// ============================================================================
// MATRIX ASSEMBLY
// ============================================================================

#[test]
fn test_sum_matrix_rows_by_columns() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    grid.set_col_axis(&names(&["product"])).unwrap();

    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.row_keys, vec![key(&["east"]), key(&["west"])]);
    assert_eq!(matrix.col_keys, vec![key(&["bolt"]), key(&["nut"])]);
    assert_eq!(matrix.value(0, 0), Some(&Datum::Real(30.0)));
    assert_eq!(matrix.value(0, 1), Some(&Datum::Real(5.0)));
    assert_eq!(matrix.value(1, 0), Some(&Datum::Real(30.0)));
    assert_eq!(matrix.value(1, 1), Some(&Datum::Real(42.0)));
}

#[test]
fn test_product_by_quarter_sums() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["product"])).unwrap();
    grid.set_col_axis(&names(&["quarter"])).unwrap();

    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.row_keys, vec![key(&["bolt"]), key(&["nut"])]);
    assert_eq!(matrix.col_keys, vec![key(&["Q1"]), key(&["Q2"])]);
    assert_eq!(matrix.value(0, 1), Some(&Datum::Real(20.0)));
    assert_eq!(matrix.value(1, 0), Some(&Datum::Real(5.0)));
    assert_eq!(matrix.value(1, 1), Some(&Datum::Real(42.0)));

    let plan = grid.refresh().unwrap();
    assert_eq!(plan.rows.len(), 2);
    assert_eq!(plan.rows[0].cells.len(), 2);
}

#[test]
fn test_multi_level_column_keys_merge_out_of_order() {
    let mut grid = sales_grid();
    // Column axis (product, quarter): row groups discover column keys in
    // different orders, exercising insert-and-backfill.
    grid.set_row_axis(&names(&["region"])).unwrap();
    grid.set_col_axis(&names(&["product", "quarter"])).unwrap();

    let matrix = grid.query_matrix().unwrap();
    assert_eq!(
        matrix.col_keys,
        vec![
            key(&["bolt", "Q1"]),
            key(&["bolt", "Q2"]),
            key(&["nut", "Q1"]),
            key(&["nut", "Q2"]),
        ]
    );
    // east has no (nut, Q2); west has neither (bolt, Q2) nor (nut, Q1).
    assert_eq!(matrix.value(0, 3), None);
    assert_eq!(matrix.value(1, 1), None);
    assert_eq!(matrix.value(1, 2), None);
    for row in &matrix.values {
        assert_eq!(row.len(), matrix.col_keys.len());
    }
}

#[test]
fn test_no_axes_is_grand_total() {
    let grid = sales_grid();
    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.row_keys, vec![totals_key()]);
    assert_eq!(matrix.col_keys, vec![totals_key()]);
    assert_eq!(matrix.value(0, 0), Some(&Datum::Real(107.0)));
}

// ============================================================================
// FILTERS
// ============================================================================

#[test]
fn test_filter_removes_rows_from_matrix() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    grid.apply_filter("region", Some(vec![Datum::Text("east".into())]))
        .unwrap();

    assert!(grid.is_filtered("region"));
    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.row_keys, vec![key(&["east"])]);
    assert_eq!(matrix.value(0, 0), Some(&Datum::Real(35.0)));
}

#[test]
fn test_filter_applies_to_unused_attribute() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    // quarter is Unused but its filter still constrains the aggregate.
    grid.apply_filter("quarter", Some(vec![Datum::Text("Q1".into())]))
        .unwrap();

    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.value(0, 0), Some(&Datum::Real(15.0)));
    assert_eq!(matrix.value(1, 0), Some(&Datum::Real(30.0)));
}

#[test]
fn test_clearing_filter_restores_rows() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    grid.apply_filter("region", Some(vec![Datum::Text("east".into())]))
        .unwrap();
    grid.apply_filter("region", None).unwrap();

    assert!(!grid.is_filtered("region"));
    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.row_keys.len(), 2);
}

// ============================================================================
// AGGREGATORS
// ============================================================================

#[test]
fn test_count_and_avg() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();

    grid.set_aggregator(Aggregator::Count).unwrap();
    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.value(0, 0), Some(&Datum::Integer(3)));

    grid.set_aggregator(Aggregator::Avg).unwrap();
    let matrix = grid.query_matrix().unwrap();
    assert_eq!(matrix.value(1, 0), Some(&Datum::Real(24.0)));
}

// ============================================================================
// REASSIGNMENT PROTOCOL
// ============================================================================

#[test]
fn test_move_attribute_inserts_at_position() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["product"])).unwrap();
    grid.move_attribute("region", Axis::Row, 0).unwrap();
    assert_eq!(
        grid.assignment().row_attrs(),
        names(&["region", "product"]).as_slice()
    );
}

#[test]
fn test_identical_push_is_noop() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    assert!(!grid.set_row_axis(&names(&["region"])).unwrap());
    assert!(grid.set_row_axis(&names(&["product", "region"])).unwrap());
}

#[test]
fn test_push_skips_unknown_attributes() {
    let mut grid = sales_grid();
    assert!(grid
        .set_col_axis(&names(&["ghost", "quarter"]))
        .unwrap());
    assert_eq!(
        grid.assignment().col_attrs(),
        names(&["quarter"]).as_slice()
    );
}

#[test]
fn test_apply_axis_config_round_trip() {
    let mut grid = sales_grid();
    let config = AxisConfig {
        row_axis: names(&["region"]),
        col_axis: names(&["product"]),
    };
    assert!(grid.apply_axis_config(&config).unwrap());
    assert_eq!(grid.axis_config(), config);
    assert!(!grid.apply_axis_config(&config).unwrap());
}

#[test]
fn test_config_and_plan_survive_json() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    grid.set_col_axis(&names(&["quarter"])).unwrap();

    // Both payloads cross the host boundary as JSON: the config for
    // persistence, the plan for display.
    let config = grid.axis_config();
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(serde_json::from_str::<AxisConfig>(&json).unwrap(), config);

    let plan = grid.refresh().unwrap().clone();
    let json = serde_json::to_string(&plan).unwrap();
    assert_eq!(serde_json::from_str::<RenderPlan>(&json).unwrap(), plan);
}

// ============================================================================
// REFRESH SEMANTICS
// ============================================================================

#[test]
fn test_refresh_is_idempotent() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    grid.set_col_axis(&names(&["quarter"])).unwrap();
    grid.apply_filter("product", Some(vec![Datum::Text("nut".into())]))
        .unwrap();

    let first = grid.refresh().unwrap().clone();
    let second = grid.refresh().unwrap().clone();
    assert_eq!(first, second);
}

/// Delegates to SQLite until told to fail, then errors on every statement.
struct FlakyEngine {
    inner: SqliteEngine,
    fail: Cell<bool>,
}

impl QueryEngine for FlakyEngine {
    fn execute(
        &self,
        sql: &str,
        params: &[Datum],
        on_row: &mut dyn FnMut(&[String], &[Datum]),
    ) -> Result<(), GridError> {
        if self.fail.get() {
            return self.inner.execute("SELECT gone FROM nowhere", params, on_row);
        }
        self.inner.execute(sql, params, on_row)
    }
}

#[test]
fn test_failed_refresh_retains_previous_plan() {
    let inner = SqliteEngine::open_in_memory().unwrap();
    inner.connection().execute_batch(SalesFixture::schema()).unwrap();
    {
        let conn = inner.connection();
        let mut stmt = conn
            .prepare("INSERT INTO sales VALUES (?1, ?2, ?3, ?4)")
            .unwrap();
        for (region, product, quarter, value) in SalesFixture::data() {
            stmt.execute(rusqlite::params![region, product, quarter, value])
                .unwrap();
        }
    }
    let engine = FlakyEngine {
        inner,
        fail: Cell::new(false),
    };
    let mut grid = DataGrid::new(engine, "sales").unwrap();
    grid.set_row_axis(&names(&["region"])).unwrap();
    let good = grid.plan().clone();
    assert!(!good.rows.is_empty());

    grid.engine().fail.set(true);
    assert!(matches!(grid.refresh(), Err(GridError::Sqlite(_))));
    assert_eq!(grid.plan(), &good);

    // Once the engine recovers, the same configuration rebuilds the same plan.
    grid.engine().fail.set(false);
    assert_eq!(grid.refresh().unwrap(), &good);
}

#[test]
fn test_dropped_table_empties_plan_only_on_refresh() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region"])).unwrap();
    let good = grid.plan().clone();
    assert!(!good.rows.is_empty());

    let engine: &SqliteEngine = grid.engine();
    engine.connection().execute_batch("DROP TABLE sales").unwrap();
    // Schema is gone: the grid renders empty rather than erroring, but it
    // only does so through an explicit refresh.
    assert_eq!(grid.plan(), &good);
    let plan = grid.refresh().unwrap();
    assert!(plan.rows.is_empty());
}

// ============================================================================
// RENDER PLAN OVER LIVE DATA
// ============================================================================

#[test]
fn test_plan_headers_over_live_data() {
    let mut grid = sales_grid();
    grid.set_row_axis(&names(&["region", "product"])).unwrap();
    grid.set_col_axis(&names(&["quarter"])).unwrap();
    let plan = grid.refresh().unwrap();

    let header = &plan.column_header_rows[0];
    assert_eq!(header[0].kind, HeaderKind::Corner);
    assert_eq!(header[0].col_span, 2);
    assert_eq!(header[1].label, "quarter");
    let label_row = plan.row_label_row.as_ref().unwrap();
    assert_eq!(label_row[0].label, "region");
    assert_eq!(label_row[1].label, "product");
    // east spans its two products.
    assert_eq!(plan.rows[0].headers[0].label, "east");
    assert_eq!(plan.rows[0].headers[0].row_span, 2);
}

#[test]
fn test_value_list_feeds_filter_popup() {
    let grid = sales_grid();
    let list = grid.value_list("quarter").unwrap();
    let labels: Vec<String> = list.iter().map(|v| v.value.to_string()).collect();
    assert_eq!(labels, vec!["Q1", "Q2"]);
    assert_eq!(list[0].count + list[1].count, 6);
}

#[test]
fn test_grid_generic_over_engine() {
    // DataGrid only sees the QueryEngine trait; the concrete type is the
    // host's choice.
    fn assert_grid(_grid: &DataGrid<SqliteEngine>) {}
    assert_grid(&sales_grid());
}
