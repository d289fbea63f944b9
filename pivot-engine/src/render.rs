//! FILENAME: pivot-engine/src/render.rs
//! Renderable output for the frontend - WHAT we display.
//!
//! A `RenderPlan` is a deterministic function of the settled matrix: header
//! rows for column-attribute levels (outer to inner) with merged cells
//! sized by the span calculator, an optional row-label header row, and one
//! body row per row key. It is derived fresh from every matrix and never
//! retained across refreshes.

use serde::{Deserialize, Serialize};

use crate::definition::Datum;
use crate::matrix::{ResultMatrix, TOTALS_LABEL};
use crate::span::span_size;

// ============================================================================
// PLAN CELLS
// ============================================================================

/// What a header cell is, so the frontend can style each kind on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderKind {
    /// The empty corner spanning row-attribute columns x column levels.
    Corner,
    /// Names an attribute on an axis.
    AxisLabel,
    /// One (merged) column-key value.
    ColumnKey,
    /// One (merged) row-key value.
    RowKey,
    /// The "Totals" label shown when an axis has no attributes.
    TotalLabel,
    /// Structural filler with no content.
    Blank,
}

/// A merged header cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderCell {
    pub label: String,
    pub kind: HeaderKind,
    pub col_span: u16,
    pub row_span: u16,
}

impl HeaderCell {
    fn new(label: String, kind: HeaderKind) -> Self {
        HeaderCell {
            label,
            kind,
            col_span: 1,
            row_span: 1,
        }
    }

    fn corner(col_span: u16, row_span: u16) -> Self {
        HeaderCell {
            label: String::new(),
            kind: HeaderKind::Corner,
            col_span,
            row_span,
        }
    }

    fn axis_label(label: &str) -> Self {
        HeaderCell::new(label.to_string(), HeaderKind::AxisLabel)
    }

    fn blank() -> Self {
        HeaderCell::new(String::new(), HeaderKind::Blank)
    }

    fn total_label() -> Self {
        HeaderCell::new(TOTALS_LABEL.to_string(), HeaderKind::TotalLabel)
    }
}

/// One value cell: display text plus the raw aggregate kept as metadata
/// for downstream interaction. `raw: None` is an absent group and renders
/// blank, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyCell {
    pub text: String,
    pub raw: Option<Datum>,
}

/// One body row: merged row-header cells followed by one cell per column key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyRow {
    pub headers: Vec<HeaderCell>,
    pub cells: Vec<BodyCell>,
}

/// The complete table rendering plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// One header row per column-attribute level, outer to inner.
    pub column_header_rows: Vec<Vec<HeaderCell>>,
    /// The row naming each row attribute, present iff row attributes exist.
    pub row_label_row: Option<Vec<HeaderCell>>,
    /// One row per row key.
    pub rows: Vec<BodyRow>,
}

// ============================================================================
// VALUE FORMATTING
// ============================================================================

/// Comma-groups an integer: 1234567 -> "1,234,567".
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Display text for an aggregate: finite numerics as zero-decimal,
/// comma-grouped integers; everything else as literal text (NULL blank).
pub fn format_value(value: &Datum) -> String {
    match value {
        Datum::Null => String::new(),
        Datum::Integer(i) => group_thousands(*i),
        Datum::Real(x) if x.is_finite() => group_thousands(x.round() as i64),
        Datum::Real(x) => x.to_string(),
        Datum::Text(s) => s.clone(),
    }
}

// ============================================================================
// PLAN GENERATION
// ============================================================================

/// Maps the settled matrix to its rendering plan.
///
/// An empty matrix (no schema, or no rows matched) short-circuits to an
/// empty plan rather than an error.
pub fn render(matrix: &ResultMatrix) -> RenderPlan {
    if matrix.is_empty() {
        return RenderPlan::default();
    }

    let row_levels = matrix.row_attrs.len();
    let col_levels = matrix.col_attrs.len();
    let mut plan = RenderPlan::default();

    // The first few rows are for column headers. The outermost carries the
    // corner cell when row attributes exist; the innermost level's cells
    // reach down over the row-label row.
    for (level, attr) in matrix.col_attrs.iter().enumerate() {
        let mut cells = Vec::new();
        if level == 0 && row_levels > 0 {
            cells.push(HeaderCell::corner(row_levels as u16, col_levels as u16));
        }
        cells.push(HeaderCell::axis_label(attr));
        for index in 0..matrix.col_keys.len() {
            if let Some(span) = span_size(&matrix.col_keys, index, level) {
                let mut cell = HeaderCell::new(
                    matrix.col_keys[index][level].to_string(),
                    HeaderKind::ColumnKey,
                );
                cell.col_span = span as u16;
                if level + 1 == col_levels && row_levels > 0 {
                    cell.row_span = 2;
                }
                cells.push(cell);
            }
        }
        plan.column_header_rows.push(cells);
    }

    // Then a row naming the row attributes, closed off by the Totals label
    // when there is no column axis to label the single data column.
    if row_levels > 0 {
        let mut cells: Vec<HeaderCell> =
            matrix.row_attrs.iter().map(|a| HeaderCell::axis_label(a)).collect();
        if col_levels == 0 {
            cells.push(HeaderCell::total_label());
        } else {
            cells.push(HeaderCell::blank());
        }
        plan.row_label_row = Some(cells);
    }

    // Now the data rows, with their merged row headers.
    for (index, row_key) in matrix.row_keys.iter().enumerate() {
        let mut headers = Vec::new();
        for (level, part) in row_key.iter().enumerate() {
            if let Some(span) = span_size(&matrix.row_keys, index, level) {
                let kind = if row_levels == 0 {
                    HeaderKind::TotalLabel
                } else {
                    HeaderKind::RowKey
                };
                let mut cell = HeaderCell::new(part.to_string(), kind);
                cell.row_span = span as u16;
                if level + 1 == row_levels && col_levels > 0 {
                    cell.col_span = 2;
                }
                headers.push(cell);
            }
        }
        let cells = matrix.values[index]
            .iter()
            .map(|value| BodyCell {
                text: value.as_ref().map(format_value).unwrap_or_default(),
                raw: value.clone(),
            })
            .collect();
        plan.rows.push(BodyRow { headers, cells });
    }

    plan
}
