//! FILENAME: pivot-engine/src/definition.rs
//! Pivot grid configuration - the serializable description of a pivot view.
//!
//! This module contains all the types needed to DESCRIBE a pivot view.
//! These structures are designed to be:
//! - Serializable (for host-side persistence of the configuration)
//! - Mutated only by explicit user actions or an external configuration push
//! - The single source of truth for axis membership (never read back from UI)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::PivotError;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for the implicit `value` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Aggregator {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl Aggregator {
    /// All selectable aggregators, in the order the host presents them.
    pub const ALL: [Aggregator; 5] = [
        Aggregator::Avg,
        Aggregator::Count,
        Aggregator::Max,
        Aggregator::Min,
        Aggregator::Sum,
    ];

    /// The SQL function name.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Aggregator::Sum => "SUM",
            Aggregator::Avg => "AVG",
            Aggregator::Count => "COUNT",
            Aggregator::Min => "MIN",
            Aggregator::Max => "MAX",
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Aggregator::Sum
    }
}

impl FromStr for Aggregator {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SUM" => Ok(Aggregator::Sum),
            "AVG" => Ok(Aggregator::Avg),
            "COUNT" => Ok(Aggregator::Count),
            "MIN" => Ok(Aggregator::Min),
            "MAX" => Ok(Aggregator::Max),
            _ => Err(PivotError::UnknownAggregator(s.to_string())),
        }
    }
}

// ============================================================================
// AXIS ROLES
// ============================================================================

/// The role an attribute currently occupies in the pivot layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Unused,
    Row,
    Column,
}

impl Default for Axis {
    fn default() -> Self {
        Axis::Unused
    }
}

// ============================================================================
// LITERAL VALUES AND COMPOSITE KEYS
// ============================================================================

/// A discrete value as it comes back from (or is bound into) the engine.
///
/// Ordering is total and explicit rather than delegated to the engine:
/// NULL sorts first, then numerics compared by value (integers and reals
/// interleave), then text. `PartialEq` is derived from that ordering, so
/// `Integer(3) == Real(3.0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Datum {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Datum {
    fn rank(&self) -> u8 {
        match self {
            Datum::Null => 0,
            Datum::Integer(_) | Datum::Real(_) => 1,
            Datum::Text(_) => 2,
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            Datum::Integer(i) => *i as f64,
            Datum::Real(x) => *x,
            _ => f64::NAN,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Datum::Integer(_) | Datum::Real(_))
    }
}

impl Ord for Datum {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Datum::Null, Datum::Null) => Ordering::Equal,
            (Datum::Integer(a), Datum::Integer(b)) => a.cmp(b),
            (Datum::Text(a), Datum::Text(b)) => a.cmp(b),
            (a, b) if a.rank() == 1 && b.rank() == 1 => a.as_f64().total_cmp(&b.as_f64()),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Datum {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Datum {}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => Ok(()),
            Datum::Integer(i) => write!(f, "{}", i),
            Datum::Real(x) => write!(f, "{}", x),
            Datum::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Composite key identifying one row or column group: one value per
/// attribute on the axis, in the axis's current attribute order.
///
/// Keys compare lexicographically element-by-element with sequence length
/// as the tiebreak, which is exactly what the derived slice ordering does.
pub type Key = SmallVec<[Datum; 4]>;

// ============================================================================
// AXIS ASSIGNMENT
// ============================================================================

/// Which axis every known attribute currently occupies.
///
/// Invariant: every known attribute has exactly one role. The row and
/// column orders are disjoint sub-sequences of `attributes`; anything in
/// neither is Unused. Role changes are atomic - an attribute is removed
/// from its old axis and inserted into the new one in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisAssignment {
    /// All known attributes, in schema order.
    attributes: Vec<String>,

    /// Attributes on the row axis, outer to inner.
    row_order: Vec<String>,

    /// Attributes on the column axis, outer to inner.
    col_order: Vec<String>,
}

impl AxisAssignment {
    /// Creates an assignment with every attribute Unused.
    pub fn new(attributes: Vec<String>) -> Self {
        AxisAssignment {
            attributes,
            row_order: Vec::new(),
            col_order: Vec::new(),
        }
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn row_attrs(&self) -> &[String] {
        &self.row_order
    }

    pub fn col_attrs(&self) -> &[String] {
        &self.col_order
    }

    /// Attributes currently on no axis, in schema order.
    pub fn unused_attrs(&self) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|a| !self.row_order.contains(a) && !self.col_order.contains(a))
            .cloned()
            .collect()
    }

    /// The current role of `name`, or None if the attribute is unknown.
    pub fn role_of(&self, name: &str) -> Option<Axis> {
        if self.row_order.iter().any(|a| a == name) {
            Some(Axis::Row)
        } else if self.col_order.iter().any(|a| a == name) {
            Some(Axis::Column)
        } else if self.attributes.iter().any(|a| a == name) {
            Some(Axis::Unused)
        } else {
            None
        }
    }

    /// UI-driven move: relocates `name` to `axis`, inserted at `position`
    /// within that axis's order (clamped to the end). The drop location
    /// math that chooses `position` is the host's business.
    pub fn move_to(&mut self, name: &str, axis: Axis, position: usize) -> Result<(), PivotError> {
        if !self.attributes.iter().any(|a| a == name) {
            return Err(PivotError::UnknownAttribute(name.to_string()));
        }
        self.row_order.retain(|a| a != name);
        self.col_order.retain(|a| a != name);
        let order = match axis {
            Axis::Row => &mut self.row_order,
            Axis::Column => &mut self.col_order,
            Axis::Unused => return Ok(()),
        };
        let position = position.min(order.len());
        order.insert(position, name.to_string());
        Ok(())
    }

    /// External config push for the row axis. Returns whether anything
    /// changed (callers refresh only on `true`).
    pub fn set_row_axis(&mut self, names: &[String]) -> bool {
        self.assign(names, true)
    }

    /// External config push for the column axis.
    pub fn set_col_axis(&mut self, names: &[String]) -> bool {
        self.assign(names, false)
    }

    /// Push semantics: if `names` already equals the current order, no-op.
    /// Otherwise reset the axis and reassign, in the given order, exactly
    /// the named attributes that exist - unknown names are skipped, and a
    /// name currently on the other axis is pulled over. New attribute
    /// entries are never invented here.
    fn assign(&mut self, names: &[String], is_row: bool) -> bool {
        let current = if is_row { &self.row_order } else { &self.col_order };
        if current.as_slice() == names {
            return false;
        }
        let kept: Vec<String> = names
            .iter()
            .filter(|n| self.attributes.contains(n))
            .cloned()
            .collect();
        if is_row {
            self.row_order.clear();
            self.col_order.retain(|a| !kept.contains(a));
            self.row_order = kept;
        } else {
            self.col_order.clear();
            self.row_order.retain(|a| !kept.contains(a));
            self.col_order = kept;
        }
        true
    }

    /// Reconciles the assignment with the live schema: attributes that
    /// disappeared are dropped from every axis, new ones join as Unused.
    pub fn sync_schema(&mut self, live: &[String]) {
        self.attributes = live.to_vec();
        self.row_order.retain(|a| live.contains(a));
        self.col_order.retain(|a| live.contains(a));
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// Per-attribute value-inclusion filters.
///
/// An entry holds the explicit allow-list committed from the filter popup;
/// absence of an entry means "all values included". Filters apply to an
/// attribute regardless of its current axis role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    allowed: FxHashMap<String, Vec<Datum>>,
}

impl FilterSet {
    /// Commits a filter selection: `Some(values)` installs an allow-list,
    /// `None` ("all selected") removes the filter entirely.
    pub fn apply(&mut self, attr: &str, selection: Option<Vec<Datum>>) {
        match selection {
            Some(values) => {
                self.allowed.insert(attr.to_string(), values);
            }
            None => {
                self.allowed.remove(attr);
            }
        }
    }

    /// The committed allow-list for `attr`, if any.
    pub fn allowed(&self, attr: &str) -> Option<&[Datum]> {
        self.allowed.get(attr).map(|v| v.as_slice())
    }

    /// Whether `attr` carries a filter (drives the UI's "filtered" marker).
    pub fn is_filtered(&self, attr: &str) -> bool {
        self.allowed.contains_key(attr)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

// ============================================================================
// EXTERNAL CONFIGURATION PAYLOAD
// ============================================================================

/// The axis configuration exchanged with the host's persistence layer:
/// ordered attribute-name lists for both axes. Emitted whenever a local
/// interaction changes the assignment, and accepted as an authoritative
/// override going the other way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub row_axis: Vec<String>,
    pub col_axis: Vec<String>,
}

impl AxisConfig {
    pub fn of(assignment: &AxisAssignment) -> Self {
        AxisConfig {
            row_axis: assignment.row_attrs().to_vec(),
            col_axis: assignment.col_attrs().to_vec(),
        }
    }
}
