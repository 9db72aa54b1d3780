//! Enrichment: writes lookup values onto the dye plan as new columns
//!
//! This is map semantics, not a relational join. Each primary row receives at
//! most one match, so the row count never changes however many times a key
//! repeats in the auxiliary data.

use std::collections::HashSet;

use crate::consolidate::{ConsolidateError, Dataset, Value};

use super::lookup::LookupTable;

/// Per-call match counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Rows that found their key in the lookup table
    pub matched: usize,
    /// Rows written with the fill value
    pub filled: usize,
}

/// Apply a lookup table to `primary`, writing `output_columns`
///
/// Rows whose key is blank, or absent from `lookup`, get `fill_value` in every
/// output column. Looked-up values that are themselves blank are written as
/// `fill_value` too. Output columns that already exist are overwritten in place,
/// so re-applying the same lookup never duplicates columns.
pub fn apply(
    mut primary: Dataset,
    key_column: &str,
    lookup: &LookupTable,
    output_columns: &[String],
    fill_value: &Value,
) -> Result<(Dataset, MatchStats), ConsolidateError> {
    if output_columns.len() != lookup.value_columns().len() {
        return Err(ConsolidateError::LookupWidthMismatch {
            key_column: lookup.key_column().to_string(),
            values: lookup.value_columns().len(),
            outputs: output_columns.len(),
        });
    }

    let mut seen = HashSet::new();
    for column in output_columns {
        if !seen.insert(column.trim()) {
            return Err(ConsolidateError::DuplicateOutputColumn {
                column: column.trim().to_string(),
            });
        }
    }

    let hits: Vec<Option<&[Value]>> = match primary.column_values(key_column) {
        Some(keys) => keys.map(|key| lookup.get(key)).collect(),
        None => {
            log::warn!(
                "Primary dataset has no '{}' column - every row filled with '{}'",
                key_column,
                fill_value
            );
            vec![None; primary.len()]
        }
    };

    let mut stats = MatchStats::default();
    let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(primary.len()); output_columns.len()];

    for hit in hits {
        match hit {
            Some(values) => {
                stats.matched += 1;
                for (column, value) in columns.iter_mut().zip(values) {
                    if value.is_empty() {
                        column.push(fill_value.clone());
                    } else {
                        column.push(value.clone());
                    }
                }
            }
            None => {
                stats.filled += 1;
                for column in columns.iter_mut() {
                    column.push(fill_value.clone());
                }
            }
        }
    }

    for (name, values) in output_columns.iter().zip(columns) {
        primary.upsert_column(name, values);
    }

    log::debug!(
        "Enriched {:?} on '{}': {} matched, {} filled",
        output_columns,
        key_column,
        stats.matched,
        stats.filled
    );

    Ok((primary, stats))
}

/// Drop rows that repeat an earlier key (first occurrence kept, order preserved)
///
/// Rows with a blank key are all kept. If `key_column` is absent the dataset is
/// returned unchanged.
pub fn dedup_by_key(mut primary: Dataset, key_column: &str) -> Dataset {
    let Some(key_idx) = primary.column_index(key_column) else {
        log::warn!("Cannot deduplicate dye plan: no '{}' column", key_column);
        return primary;
    };

    let before = primary.len();
    let mut seen: HashSet<String> = HashSet::new();
    primary.retain_rows(|row| match row[key_idx].join_key() {
        Some(key) => seen.insert(key),
        None => true,
    });

    let removed = before - primary.len();
    if removed > 0 {
        log::info!(
            "Removed {} dye plan row(s) repeating a '{}' value",
            removed,
            key_column
        );
    }

    primary
}
