//! FILENAME: pivot-engine/src/query.rs
//! SQL generation for the pivot aggregation and the filter value lists.
//!
//! Attribute names come from the schema and filter values from previously
//! selected discrete values, so nothing here sees free-text input - but the
//! builder still quotes every identifier and literal itself rather than
//! trusting callers to pre-escape.

use crate::definition::{Aggregator, Datum, FilterSet};
use crate::error::PivotError;

/// The implicit measure column aggregated in every pivot query.
pub const VALUE_COLUMN: &str = "value";

/// Double-quotes an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a literal for use in an IN clause: numbers unquoted, text
/// single-quoted with embedded quotes doubled. Non-finite reals have no
/// SQL spelling and degrade to NULL (which matches nothing).
pub fn quote_literal(value: &Datum) -> String {
    match value {
        Datum::Null => "NULL".to_string(),
        Datum::Integer(i) => i.to_string(),
        Datum::Real(x) if x.is_finite() => x.to_string(),
        Datum::Real(_) => "NULL".to_string(),
        Datum::Text(s) => format!("'{}'", s.replace('\'', "''")),
    }
}

fn check_attr(attr: &str, schema_attrs: &[String]) -> Result<(), PivotError> {
    if schema_attrs.iter().any(|a| a == attr) {
        Ok(())
    } else {
        Err(PivotError::UnknownAttribute(attr.to_string()))
    }
}

/// Builds the WHERE clause from the filter set.
///
/// Filtered attributes are visited in schema order so the generated SQL is
/// deterministic for a given configuration. A filter left over for an
/// attribute no longer in the schema is simply not reached. An empty
/// allow-list (user deselected everything) matches no rows.
fn where_clause(filters: &FilterSet, schema_attrs: &[String]) -> String {
    let mut clause = String::from("1 = 1");
    for attr in schema_attrs {
        if let Some(values) = filters.allowed(attr) {
            if values.is_empty() {
                clause.push_str(" AND 1 = 0");
            } else {
                let list: Vec<String> = values.iter().map(quote_literal).collect();
                clause.push_str(&format!(" AND {} IN ({})", quote_ident(attr), list.join(", ")));
            }
        }
    }
    clause
}

/// Builds the pivot aggregation query.
///
/// Groups by row attributes then column attributes (in that order), selects
/// each grouping attribute plus `aggregator(value)`, and orders ascending by
/// the full grouping tuple so rows arrive pre-sorted for the assembler.
/// With no attributes on either axis the query degenerates to a single
/// grand-total aggregate with no GROUP BY.
pub fn pivot_sql(
    table: &str,
    row_attrs: &[String],
    col_attrs: &[String],
    aggregator: Aggregator,
    filters: &FilterSet,
    schema_attrs: &[String],
) -> Result<String, PivotError> {
    let mut group_attrs: Vec<&String> = Vec::with_capacity(row_attrs.len() + col_attrs.len());
    for attr in row_attrs.iter().chain(col_attrs) {
        check_attr(attr, schema_attrs)?;
        group_attrs.push(attr);
    }

    let filter = where_clause(filters, schema_attrs);
    let measure = format!("{}({})", aggregator.as_sql(), quote_ident(VALUE_COLUMN));

    if group_attrs.is_empty() {
        return Ok(format!(
            "SELECT {} AS {} FROM {} WHERE {}",
            measure,
            VALUE_COLUMN,
            quote_ident(table),
            filter
        ));
    }

    let attrs = group_attrs
        .iter()
        .map(|a| quote_ident(a))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(
        "SELECT {attrs}, {measure} AS {value} FROM {table} WHERE {filter} GROUP BY {attrs} ORDER BY {attrs}",
        attrs = attrs,
        measure = measure,
        value = VALUE_COLUMN,
        table = quote_ident(table),
        filter = filter,
    ))
}

/// Builds the distinct-values-with-counts query that feeds the filter
/// popup for one attribute. Independent of the main pivot query.
pub fn value_list_sql(
    table: &str,
    attr: &str,
    schema_attrs: &[String],
) -> Result<String, PivotError> {
    check_attr(attr, schema_attrs)?;
    let ident = quote_ident(attr);
    Ok(format!(
        "SELECT {ident} AS {value}, count(1) AS value_count FROM {table} GROUP BY {ident} ORDER BY {ident}",
        ident = ident,
        value = VALUE_COLUMN,
        table = quote_ident(table),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_group_and_order_by_row_attrs_then_col_attrs() {
        let schema = names(&["G1", "G2", "G3"]);
        let sql = pivot_sql(
            "t",
            &names(&["G2"]),
            &names(&["G1"]),
            Aggregator::Sum,
            &FilterSet::default(),
            &schema,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT \"G2\", \"G1\", SUM(\"value\") AS value FROM \"t\" \
             WHERE 1 = 1 GROUP BY \"G2\", \"G1\" ORDER BY \"G2\", \"G1\""
        );
    }

    #[test]
    fn test_grand_total_has_no_grouping() {
        let sql = pivot_sql(
            "t",
            &[],
            &[],
            Aggregator::Avg,
            &FilterSet::default(),
            &names(&["G1"]),
        )
        .unwrap();
        assert_eq!(sql, "SELECT AVG(\"value\") AS value FROM \"t\" WHERE 1 = 1");
    }

    #[test]
    fn test_filter_becomes_in_clause() {
        let schema = names(&["G1", "G2"]);
        let mut filters = FilterSet::default();
        filters.apply("G1", Some(vec![Datum::Text("A".into())]));
        let sql = pivot_sql(
            "t",
            &names(&["G1"]),
            &[],
            Aggregator::Sum,
            &filters,
            &schema,
        )
        .unwrap();
        assert!(sql.contains("WHERE 1 = 1 AND \"G1\" IN ('A')"), "{}", sql);
    }

    #[test]
    fn test_numeric_filter_values_are_unquoted() {
        let schema = names(&["G1"]);
        let mut filters = FilterSet::default();
        filters.apply("G1", Some(vec![Datum::Integer(3), Datum::Real(2.5)]));
        let sql = pivot_sql("t", &[], &[], Aggregator::Sum, &filters, &schema).unwrap();
        assert!(sql.contains("\"G1\" IN (3, 2.5)"), "{}", sql);
    }

    #[test]
    fn test_empty_allow_list_matches_nothing() {
        let schema = names(&["G1"]);
        let mut filters = FilterSet::default();
        filters.apply("G1", Some(vec![]));
        let sql = pivot_sql("t", &[], &[], Aggregator::Sum, &filters, &schema).unwrap();
        assert!(sql.contains("WHERE 1 = 1 AND 1 = 0"), "{}", sql);
    }

    #[test]
    fn test_identifiers_and_literals_are_escaped() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(
            quote_literal(&Datum::Text("O'Brien".into())),
            "'O''Brien'"
        );
        assert_eq!(quote_literal(&Datum::Real(f64::NAN)), "NULL");
    }

    #[test]
    fn test_unknown_attribute_is_a_configuration_error() {
        let err = pivot_sql(
            "t",
            &names(&["ghost"]),
            &[],
            Aggregator::Sum,
            &FilterSet::default(),
            &names(&["G1"]),
        )
        .unwrap_err();
        assert_eq!(err, PivotError::UnknownAttribute("ghost".to_string()));
    }

    #[test]
    fn test_value_list_sql_shape() {
        let sql = value_list_sql("sales", "region", &names(&["region"])).unwrap();
        assert_eq!(
            sql,
            "SELECT \"region\" AS value, count(1) AS value_count FROM \"sales\" \
             GROUP BY \"region\" ORDER BY \"region\""
        );
        assert!(value_list_sql("sales", "ghost", &names(&["region"])).is_err());
    }
}
