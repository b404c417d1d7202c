//! Flattening of raw source tables.
//!
//! A [`RawTable`] may have hierarchical column labels and rows keyed by index
//! levels that sit outside the ordinary columns. [`normalize`] turns it into a
//! [`NormalizedTable`]:
//!
//! 1. Index levels become leading columns, keeping their names.
//! 2. Composite labels are joined with `" - "`, skipping empty parts.
//! 3. Names that still collide get a numeric suffix (`_2`, `_3`, ...).
//! 4. Cells are coerced to JSON-safe scalars: missing values and non-finite
//!    floats become null, dates and timestamps become strings.
//!
//! ```rust,ignore
//! let table = normalize(&raw)?;
//! assert_eq!(table.columns(), ["team", "Performance - Gls", "Performance - Ast"]);
//! ```

use std::collections::HashSet;
use tracing::debug;

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::{ColumnLabel, NormalizedTable, RawTable, RawValue, Scalar};

/// Joins the parts of a composite label.
pub const SEPARATOR: &str = " - ";

/// Flatten one column label. Flat labels and kept parts are not rewritten.
pub fn flatten_label(label: &ColumnLabel) -> String {
    match label {
        ColumnLabel::Flat(name) => name.clone(),
        ColumnLabel::Composite(parts) => parts
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(SEPARATOR),
    }
}

/// Column name for an index level, following the usual dataframe convention
/// for unnamed levels.
fn index_level_name(name: &str, position: usize, levels: usize) -> String {
    if !name.trim().is_empty() {
        name.to_string()
    } else if levels == 1 {
        "index".to_string()
    } else {
        format!("level_{}", position)
    }
}

/// Make every name unique, suffixing repeats with `_2`, `_3`, ...
///
/// The first occurrence keeps its name, and a suffixed name never takes a
/// name that appears elsewhere in the input.
pub fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let taken: HashSet<String> = names.iter().cloned().collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        if seen.insert(name.clone()) {
            out.push(name);
            continue;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{}_{}", name, n);
            if !taken.contains(&candidate) && !seen.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        debug!(column = %name, renamed = %renamed, "Disambiguated colliding column name");
        seen.insert(renamed.clone());
        out.push(renamed);
    }
    out
}

/// Coerce a raw cell to a JSON-safe scalar.
pub fn coerce(value: &RawValue) -> Scalar {
    match value {
        RawValue::Missing => Scalar::Null,
        RawValue::Bool(b) => Scalar::Bool(*b),
        RawValue::Int(n) => Scalar::Int(*n),
        RawValue::Float(f) if f.is_finite() => Scalar::Float(*f),
        RawValue::Float(_) => Scalar::Null,
        RawValue::Text(s) => Scalar::Text(s.clone()),
        RawValue::Temporal(t) => Scalar::Text(t.to_string()),
    }
}

/// Flatten a raw table.
pub fn normalize(raw: &RawTable) -> NormalizeResult<NormalizedTable> {
    let levels = raw.index_names.len();
    let width = raw.columns.len();

    for (i, row) in raw.rows.iter().enumerate() {
        if row.index.len() != levels {
            return Err(NormalizeError::IndexWidth {
                row: i,
                expected: levels,
                found: row.index.len(),
            });
        }
        if row.values.len() != width {
            return Err(NormalizeError::RowWidth {
                row: i,
                expected: width,
                found: row.values.len(),
            });
        }
    }

    let index_names = raw
        .index_names
        .iter()
        .enumerate()
        .map(|(i, name)| index_level_name(name, i, levels));
    let data_names = raw.columns.iter().enumerate().map(|(i, label)| {
        let name = flatten_label(label);
        if name.is_empty() {
            format!("unnamed_{}", i)
        } else {
            name
        }
    });
    let columns = dedupe_names(index_names.chain(data_names).collect());

    let rows = raw
        .rows
        .iter()
        .map(|row| row.index.iter().chain(&row.values).map(coerce).collect())
        .collect();

    NormalizedTable::new(columns, rows)
}
