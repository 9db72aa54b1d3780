//! Lookup tables built from auxiliary datasets
//!
//! A lookup table maps a normalized join key to the values of the requested
//! columns, with exactly one entry per key. Auxiliary exports routinely list
//! the same production order several times (one row per status update), so
//! the dedup policy decides which row represents the key.

use std::collections::HashMap;

use crate::consolidate::{Dataset, DedupPolicy, Value};

/// Deduplicated key -> value tuple mapping
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    /// Key column in the auxiliary dataset
    key_column: String,
    /// Value columns, in tuple order
    value_columns: Vec<String>,
    /// normalized key -> values (same order as value_columns)
    entries: HashMap<String, Vec<Value>>,
    /// Configured columns that were absent from the auxiliary dataset
    missing_columns: Vec<String>,
    /// Rows whose key had already been seen
    duplicate_count: usize,
}

impl LookupTable {
    /// Create an empty lookup table (every lookup misses)
    pub fn empty(key_column: &str, value_columns: &[String]) -> Self {
        LookupTable {
            key_column: key_column.trim().to_string(),
            value_columns: value_columns.iter().map(|c| c.trim().to_string()).collect(),
            ..Default::default()
        }
    }

    /// Build a lookup table from an auxiliary dataset
    ///
    /// # Arguments
    /// * `auxiliary` - The dataset to read keys and values from
    /// * `key_column` - Column holding the join key
    /// * `value_columns` - Columns to copy, in output order
    /// * `policy` - Which row wins for a repeated key
    ///
    /// # Returns
    /// A table with one entry per distinct key. If the key column or any value
    /// column is absent, the table is empty and `missing_columns` says why;
    /// this is never an error.
    pub fn build(
        auxiliary: &Dataset,
        key_column: &str,
        value_columns: &[String],
        policy: DedupPolicy,
    ) -> Self {
        let mut table = Self::empty(key_column, value_columns);

        let mut missing = Vec::new();
        let key_idx = auxiliary.column_index(key_column);
        if key_idx.is_none() {
            missing.push(table.key_column.clone());
        }

        let mut value_idx = Vec::with_capacity(value_columns.len());
        for column in &table.value_columns {
            match auxiliary.column_index(column) {
                Some(idx) => value_idx.push(idx),
                None => missing.push(column.clone()),
            }
        }

        let Some(key_idx) = key_idx.filter(|_| missing.is_empty()) else {
            log::warn!(
                "Lookup on '{}' degraded: missing column(s) {:?} (available: {:?})",
                table.key_column,
                missing,
                auxiliary.columns()
            );
            table.missing_columns = missing;
            return table;
        };

        for row in auxiliary.rows() {
            let Some(key) = row[key_idx].join_key() else {
                continue;
            };

            let values: Vec<Value> = value_idx.iter().map(|&idx| row[idx].clone()).collect();

            if table.entries.contains_key(&key) {
                table.duplicate_count += 1;
                if policy == DedupPolicy::KeepFirst {
                    continue;
                }
            }
            table.entries.insert(key, values);
        }

        if table.duplicate_count > 0 {
            log::warn!(
                "Lookup on '{}' has {} duplicate key row(s) ({})",
                table.key_column,
                table.duplicate_count,
                policy.label()
            );
        }

        log::info!(
            "Built lookup on '{}' -> {:?}: {} unique entries from {} rows",
            table.key_column,
            table.value_columns,
            table.entries.len(),
            auxiliary.len()
        );

        table
    }

    /// Look up a cell value (normalized the same way keys were)
    pub fn get(&self, key: &Value) -> Option<&[Value]> {
        let key = key.join_key()?;
        self.get_key(&key)
    }

    /// Look up an already-normalized key
    pub fn get_key(&self, key: &str) -> Option<&[Value]> {
        self.entries.get(key).map(|v| v.as_slice())
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Columns that were configured but absent from the source dataset
    pub fn missing_columns(&self) -> &[String] {
        &self.missing_columns
    }

    /// Check if the table is empty because of missing columns
    pub fn is_degraded(&self) -> bool {
        !self.missing_columns.is_empty()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicate_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gre_dataset() -> Dataset {
        Dataset::from_str_rows(
            &["Origin order code", "Receiving status", "Last update DateTime Cmp/Div"],
            &[
                &["P1", "Received", "t1"],
                &["P1", "Pending", "t2"],
                &["P3", "Received", "t3"],
                &["", "Orphan", "t4"],
            ],
        )
    }

    fn cols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_keep_last() {
        let table = LookupTable::build(
            &gre_dataset(),
            "Origin order code",
            &cols(&["Receiving status", "Last update DateTime Cmp/Div"]),
            DedupPolicy::KeepLast,
        );

        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicate_count(), 1);
        assert_eq!(
            table.get(&Value::from("P1")),
            Some(&[Value::from("Pending"), Value::from("t2")][..])
        );
        assert_eq!(table.get(&Value::from("P3")).unwrap()[0], Value::from("Received"));
    }

    #[test]
    fn test_keep_first() {
        let table = LookupTable::build(
            &gre_dataset(),
            "Origin order code",
            &cols(&["Receiving status"]),
            DedupPolicy::KeepFirst,
        );

        assert_eq!(table.get(&Value::from("P1")), Some(&[Value::from("Received")][..]));
    }

    #[test]
    fn test_at_most_one_entry_per_key() {
        let aux = Dataset::from_str_rows(
            &["Prod Order", "Operation"],
            &[&["A", "1"], &["B", "2"], &["A", "3"], &["A", "4"], &["B", "5"]],
        );

        for policy in [DedupPolicy::KeepFirst, DedupPolicy::KeepLast] {
            let table = LookupTable::build(&aux, "Prod Order", &cols(&["Operation"]), policy);
            assert_eq!(table.len(), 2);
            assert_eq!(table.duplicate_count(), 3);
        }
    }

    #[test]
    fn test_blank_keys_are_skipped() {
        let table = LookupTable::build(
            &gre_dataset(),
            "Origin order code",
            &cols(&["Receiving status"]),
            DedupPolicy::KeepLast,
        );
        assert!(table.get(&Value::Empty).is_none());
        assert!(table.get(&Value::from("")).is_none());
    }

    #[test]
    fn test_missing_key_column_degrades_to_empty() {
        let aux = Dataset::from_str_rows(&["Order", "Operation"], &[&["P1", "Dyeing"]]);
        let table = LookupTable::build(&aux, "Prod Order", &cols(&["Operation"]), DedupPolicy::KeepLast);

        assert!(table.is_empty());
        assert!(table.is_degraded());
        assert_eq!(table.missing_columns(), &["Prod Order"]);
        assert_eq!(table.value_columns(), &["Operation"]);
    }

    #[test]
    fn test_missing_value_column_degrades_to_empty() {
        let aux = Dataset::from_str_rows(&["Prod Order", "Status"], &[&["P1", "Dyeing"]]);
        let table = LookupTable::build(&aux, "Prod Order", &cols(&["Operation"]), DedupPolicy::KeepLast);

        assert!(table.is_empty());
        assert_eq!(table.missing_columns(), &["Operation"]);
    }

    #[test]
    fn test_numeric_keys_match_text_keys() {
        let aux = Dataset::from_rows(
            &["Prod Order", "Operation"],
            vec![vec![Value::Number(1001.0), Value::from("Stenter")]],
        );
        let table = LookupTable::build(&aux, "Prod Order", &cols(&["Operation"]), DedupPolicy::KeepLast);

        assert_eq!(table.get(&Value::from(" 1001 ")), Some(&[Value::from("Stenter")][..]));
    }

    #[test]
    fn test_padded_column_names_still_match() {
        let aux = Dataset::from_str_rows(&[" Prod Order ", "Operation "], &[&["P9", "Hank dye"]]);
        let table = LookupTable::build(&aux, "Prod Order", &cols(&[" Operation"]), DedupPolicy::KeepLast);

        assert_eq!(table.len(), 1);
        assert_eq!(table.value_columns(), &["Operation"]);
    }
}
