//! In-memory tabular dataset shared by ingestion, enrichment, and emission

use std::collections::HashSet;

use super::value::Value;

/// Rows × named columns, every row as wide as the column list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given header
    ///
    /// Header names are trimmed. Blank headers become `Unnamed: <index>` and
    /// names that collide after trimming get `.1`, `.2`, ... suffixes so column
    /// names stay unique.
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        Dataset {
            columns: normalize_columns(columns),
            rows: Vec::new(),
        }
    }

    /// Create a dataset from a header and rows
    pub fn from_rows<S: AsRef<str>>(columns: &[S], rows: Vec<Vec<Value>>) -> Self {
        let mut dataset = Dataset::new(columns);
        for row in rows {
            dataset.push_row(row);
        }
        dataset
    }

    /// Append a row, padding with empty cells or truncating to the header width
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows (header excluded)
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Find a column by name; surrounding whitespace in `name` is ignored
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Get a single cell by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Iterate the values of one column, top to bottom
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = &Value>> {
        let col = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| &r[col]))
    }

    /// Overwrite an existing column, or append it when absent
    ///
    /// `values` is resized to the row count, so the dataset never loses or
    /// gains rows through this call.
    pub fn upsert_column(&mut self, name: &str, mut values: Vec<Value>) {
        values.resize(self.rows.len(), Value::Empty);

        match self.column_index(name) {
            Some(col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[col] = value;
                }
            }
            None => {
                self.columns.push(name.trim().to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Keep only rows for which `keep` returns true, preserving order
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Value]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }
}

fn normalize_columns<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut columns = Vec::with_capacity(raw.len());

    for (idx, name) in raw.iter().enumerate() {
        let trimmed = name.as_ref().trim();
        let base = if trimmed.is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            trimmed.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while used.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        used.insert(candidate.clone());
        columns.push(candidate);
    }

    columns
}

#[cfg(test)]
impl Dataset {
    /// Build a dataset from string cells; `""` becomes an empty cell
    pub(crate) fn from_str_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| if c.is_empty() { Value::Empty } else { Value::from(*c) })
                    .collect()
            })
            .collect();
        Dataset::from_rows(columns, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_trimmed() {
        let ds = Dataset::new(&[" Production order ", "Shade"]);
        assert_eq!(ds.columns(), &["Production order", "Shade"]);
        assert!(ds.has_column("Production order"));
        assert!(ds.has_column("  Production order"));
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let ds = Dataset::new(&["Qty", " Qty", "", "Qty.1"]);
        assert_eq!(ds.columns(), &["Qty", "Qty.1", "Unnamed: 2", "Qty.1.1"]);
    }

    #[test]
    fn test_rows_are_padded_to_header_width() {
        let ds = Dataset::from_rows(&["A", "B", "C"], vec![vec![Value::from("x")]]);
        assert_eq!(ds.rows()[0], vec![Value::from("x"), Value::Empty, Value::Empty]);
    }

    #[test]
    fn test_upsert_column_appends_then_overwrites() {
        let mut ds = Dataset::from_str_rows(&["Production order"], &[&["P1"], &["P2"]]);

        ds.upsert_column("Status", vec![Value::from("a"), Value::from("b")]);
        assert_eq!(ds.columns(), &["Production order", "Status"]);

        ds.upsert_column("Status", vec![Value::from("c")]);
        assert_eq!(ds.columns(), &["Production order", "Status"]);
        assert_eq!(ds.get(0, "Status"), Some(&Value::from("c")));
        assert_eq!(ds.get(1, "Status"), Some(&Value::Empty));
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_column_values() {
        let ds = Dataset::from_str_rows(&["K", "V"], &[&["1", "a"], &["2", ""]]);
        let values: Vec<_> = ds.column_values("V").unwrap().cloned().collect();
        assert_eq!(values, vec![Value::from("a"), Value::Empty]);
        assert!(ds.column_values("missing").is_none());
    }

    #[test]
    fn test_retain_rows_preserves_order() {
        let mut ds = Dataset::from_str_rows(&["K"], &[&["a"], &["b"], &["c"]]);
        ds.retain_rows(|row| row[0] != Value::from("b"));
        let keys: Vec<_> = ds.column_values("K").unwrap().map(|v| v.to_string()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
