//! Merge orchestrator - runs a workflow's joins against the dye plan in order

use std::collections::{HashMap, HashSet};

use crate::consolidate::{ConsolidateError, Dataset, JoinSpec, Value, Workflow};

use super::enrich::{apply, dedup_by_key};
use super::lookup::LookupTable;

/// Outcome of one join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinReport {
    /// File role the join read from
    pub role: String,
    /// Columns written into the dye plan
    pub output_columns: Vec<String>,
    /// Distinct keys in the lookup table
    pub lookup_entries: usize,
    /// Auxiliary rows dropped as repeated keys
    pub duplicate_keys: usize,
    /// Dye plan rows that found a match
    pub matched: usize,
    /// Dye plan rows written with the fill value
    pub filled: usize,
    /// Set when the lookup degraded because configured columns were absent
    pub warning: Option<ConsolidateError>,
}

/// Final enriched dye plan plus per-join reports
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub dataset: Dataset,
    pub reports: Vec<JoinReport>,
    /// Dye plan rows before the optional dedup guard
    pub rows_before: usize,
    /// Dye plan rows removed by the dedup guard
    pub rows_deduplicated: usize,
}

impl Enrichment {
    /// Joins that ran against a degraded (column-missing) lookup
    pub fn warnings(&self) -> impl Iterator<Item = &ConsolidateError> {
        self.reports.iter().filter_map(|r| r.warning.as_ref())
    }
}

/// Orchestrator for applying a workflow's joins to a dye plan
pub struct MergeOrchestrator;

impl MergeOrchestrator {
    /// Check a workflow's join configuration without touching any data
    ///
    /// # Errors
    /// Returns error if:
    /// - A join's value and output column lists differ in length
    /// - An output column is written twice (within or across joins)
    /// - An output column would overwrite the dye plan's key column
    pub fn validate(workflow: &Workflow) -> Result<(), ConsolidateError> {
        let primary_key = workflow.primary_key.trim();
        let mut seen: HashSet<&str> = HashSet::new();

        for join in &workflow.joins {
            let outputs = join.outputs();
            if outputs.len() != join.value_columns.len() {
                return Err(ConsolidateError::ColumnCountMismatch {
                    role: join.role.clone(),
                    values: join.value_columns.len(),
                    outputs: outputs.len(),
                });
            }

            for column in outputs {
                let column = column.trim();
                if column == primary_key || !seen.insert(column) {
                    return Err(ConsolidateError::DuplicateOutputColumn {
                        column: column.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Run every join of `workflow` against `primary`
    ///
    /// `auxiliaries` is keyed by file role. `ready` is the readiness gate owned
    /// by whoever collected the files; nothing runs until it is true. On any
    /// error no dataset is produced.
    pub fn run(
        workflow: &Workflow,
        primary: Dataset,
        auxiliaries: &HashMap<String, Dataset>,
        ready: bool,
    ) -> Result<Enrichment, ConsolidateError> {
        if !ready {
            let missing = workflow
                .joins
                .iter()
                .filter(|j| !auxiliaries.contains_key(&j.role))
                .map(|j| j.role.clone())
                .collect();
            return Err(ConsolidateError::NotReady { missing });
        }

        Self::validate(workflow)?;

        if let Some(join) = workflow
            .joins
            .iter()
            .find(|j| !auxiliaries.contains_key(&j.role))
        {
            return Err(ConsolidateError::MissingDataset {
                role: join.role.clone(),
            });
        }

        log::info!(
            "Running workflow '{}': {} dye plan rows, {} join(s)",
            workflow.name,
            primary.len(),
            workflow.joins.len()
        );

        let rows_before = primary.len();
        let mut dataset = if workflow.dedup_primary {
            dedup_by_key(primary, &workflow.primary_key)
        } else {
            primary
        };
        let rows_deduplicated = rows_before - dataset.len();

        let fill_value = Value::from(workflow.fill_value.as_str());
        let mut reports = Vec::with_capacity(workflow.joins.len());

        for join in &workflow.joins {
            let auxiliary = &auxiliaries[&join.role];
            let (enriched, report) =
                Self::run_join(dataset, &workflow.primary_key, join, auxiliary, &fill_value)?;
            dataset = enriched;
            reports.push(report);
        }

        log::info!(
            "Workflow '{}' finished: {} rows, {} columns",
            workflow.name,
            dataset.len(),
            dataset.width()
        );

        Ok(Enrichment {
            dataset,
            reports,
            rows_before,
            rows_deduplicated,
        })
    }

    /// Build the lookup for one join and apply it
    fn run_join(
        dataset: Dataset,
        primary_key: &str,
        join: &JoinSpec,
        auxiliary: &Dataset,
        fill_value: &Value,
    ) -> Result<(Dataset, JoinReport), ConsolidateError> {
        let lookup = LookupTable::build(auxiliary, &join.auxiliary_key, &join.value_columns, join.dedup);

        let warning = if lookup.is_degraded() {
            let warning = ConsolidateError::MissingJoinColumn {
                role: join.role.clone(),
                columns: lookup.missing_columns().to_vec(),
            };
            log::warn!("{}", warning);
            Some(warning)
        } else {
            None
        };

        let (dataset, stats) = apply(dataset, primary_key, &lookup, join.outputs(), fill_value)?;

        let report = JoinReport {
            role: join.role.clone(),
            output_columns: join.outputs().iter().map(|c| c.trim().to_string()).collect(),
            lookup_entries: lookup.len(),
            duplicate_keys: lookup.duplicate_count(),
            matched: stats.matched,
            filled: stats.filled,
            warning,
        };

        Ok((dataset, report))
    }
}
