//! Errors raised by sheet selection, enrichment, and emission

/// Error from consolidation operations
#[derive(Debug, Clone, PartialEq)]
pub enum ConsolidateError {
    /// No sheet name starts with the required prefix
    NoMatchingSheet {
        prefix: String,
        available: Vec<String>,
    },
    /// A configured key or value column is absent from an auxiliary dataset.
    /// Recorded on join reports only; lookups degrade to the fill value instead.
    MissingJoinColumn { role: String, columns: Vec<String> },
    /// Two joins (or one join twice) write the same output column
    DuplicateOutputColumn { column: String },
    /// The sheet to replace is no longer in the workbook being written back
    SheetNotFoundAtEmission { sheet: String },
    /// Not every required file role has been supplied
    NotReady { missing: Vec<String> },
    /// A join references a role with no dataset
    MissingDataset { role: String },
    /// A join's value and output column lists differ in length
    ColumnCountMismatch {
        role: String,
        values: usize,
        outputs: usize,
    },
    /// A lookup table and the output columns it should fill differ in width
    LookupWidthMismatch {
        key_column: String,
        values: usize,
        outputs: usize,
    },
    /// No workflow with this name is configured
    UnknownWorkflow { name: String, available: Vec<String> },
    /// A file was supplied for a role the workflow does not use
    UnknownRole { role: String, expected: Vec<String> },
}

impl std::fmt::Display for ConsolidateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsolidateError::NoMatchingSheet { prefix, available } => {
                write!(
                    f,
                    "No sheet starting with '{}' found (sheets: {})",
                    prefix,
                    available.join(", ")
                )
            }
            ConsolidateError::MissingJoinColumn { role, columns } => {
                write!(
                    f,
                    "'{}' file is missing column(s) {} - every row filled as unknown",
                    role,
                    columns.join(", ")
                )
            }
            ConsolidateError::DuplicateOutputColumn { column } => {
                write!(
                    f,
                    "Output column '{}' is written by more than one join - fix the workflow configuration",
                    column
                )
            }
            ConsolidateError::SheetNotFoundAtEmission { sheet } => {
                write!(f, "Sheet '{}' not found in the workbook being written", sheet)
            }
            ConsolidateError::NotReady { missing } => {
                write!(f, "Missing required file(s): {}", missing.join(", "))
            }
            ConsolidateError::MissingDataset { role } => {
                write!(f, "No dataset supplied for join role '{}'", role)
            }
            ConsolidateError::ColumnCountMismatch {
                role,
                values,
                outputs,
            } => {
                write!(
                    f,
                    "Join '{}' copies {} column(s) but names {} output column(s)",
                    role, values, outputs
                )
            }
            ConsolidateError::LookupWidthMismatch {
                key_column,
                values,
                outputs,
            } => {
                write!(
                    f,
                    "Lookup on '{}' has {} value column(s) but {} output column(s)",
                    key_column, values, outputs
                )
            }
            ConsolidateError::UnknownWorkflow { name, available } => {
                write!(
                    f,
                    "Unknown workflow '{}' (available: {})",
                    name,
                    available.join(", ")
                )
            }
            ConsolidateError::UnknownRole { role, expected } => {
                write!(
                    f,
                    "Unknown file role '{}' (expected one of: {})",
                    role,
                    expected.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ConsolidateError {}

impl ConsolidateError {
    /// Check if this condition stops the run (everything except a degraded join)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ConsolidateError::MissingJoinColumn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_no_matching_sheet() {
        let err = ConsolidateError::NoMatchingSheet {
            prefix: "dye plan".to_string(),
            available: vec!["Summary".to_string(), "Stock".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No sheet starting with 'dye plan' found (sheets: Summary, Stock)"
        );
    }

    #[test]
    fn test_display_width_mismatches() {
        let join = ConsolidateError::ColumnCountMismatch {
            role: "gre".to_string(),
            values: 2,
            outputs: 1,
        };
        assert_eq!(join.to_string(), "Join 'gre' copies 2 column(s) but names 1 output column(s)");

        let lookup = ConsolidateError::LookupWidthMismatch {
            key_column: "Prod Order".to_string(),
            values: 1,
            outputs: 2,
        };
        assert_eq!(
            lookup.to_string(),
            "Lookup on 'Prod Order' has 1 value column(s) but 2 output column(s)"
        );
    }

    #[test]
    fn test_only_missing_column_is_non_fatal() {
        let degraded = ConsolidateError::MissingJoinColumn {
            role: "gre".to_string(),
            columns: vec!["Origin order code".to_string()],
        };
        assert!(!degraded.is_fatal());
        assert!(ConsolidateError::DuplicateOutputColumn { column: "Operation".to_string() }.is_fatal());
    }

    #[test]
    fn test_converts_into_anyhow() {
        let err: anyhow::Error = ConsolidateError::SheetNotFoundAtEmission {
            sheet: "Dye plan 8.22".to_string(),
        }
        .into();
        assert!(matches!(
            err.downcast_ref::<ConsolidateError>(),
            Some(ConsolidateError::SheetNotFoundAtEmission { .. })
        ));
    }
}
