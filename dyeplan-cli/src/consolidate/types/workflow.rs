//! Workflow configuration types: which auxiliary files join onto the dye plan, and how

use serde::{Deserialize, Serialize};

/// Role name of the primary (dye plan) workbook
pub const PRIMARY_ROLE: &str = "dye_plan";

/// Sentinel written when a lookup has no value for a row
pub const DEFAULT_FILL_VALUE: &str = "-";

/// Which row wins when a source table repeats a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Earliest occurrence wins
    KeepFirst,
    /// Latest occurrence wins (default)
    #[default]
    KeepLast,
}

impl DedupPolicy {
    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            DedupPolicy::KeepFirst => "keep first",
            DedupPolicy::KeepLast => "keep last",
        }
    }
}

/// Where the enriched dye plan ends up
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Write back into the original workbook, replacing the dye plan sheet in place
    #[default]
    Replace,
    /// Write a new workbook containing only the enriched sheet
    Standalone,
}

impl OutputMode {
    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            OutputMode::Replace => "replace sheet",
            OutputMode::Standalone => "standalone workbook",
        }
    }
}

/// One lookup join from an auxiliary file onto the dye plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// File role supplying the auxiliary dataset (e.g., "gre", "finishing")
    pub role: String,
    /// Key column in the auxiliary dataset (e.g., "Prod Order")
    pub auxiliary_key: String,
    /// Columns copied out of the auxiliary dataset
    pub value_columns: Vec<String>,
    /// Names the copied columns get in the dye plan; empty means "same as value_columns"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_columns: Vec<String>,
    /// Duplicate key handling in the auxiliary dataset
    #[serde(default)]
    pub dedup: DedupPolicy,
}

impl JoinSpec {
    /// Create a join that copies `value_columns` under their own names
    pub fn new(
        role: impl Into<String>,
        auxiliary_key: impl Into<String>,
        value_columns: &[&str],
        dedup: DedupPolicy,
    ) -> Self {
        JoinSpec {
            role: role.into(),
            auxiliary_key: auxiliary_key.into(),
            value_columns: value_columns.iter().map(|c| c.to_string()).collect(),
            output_columns: Vec::new(),
            dedup,
        }
    }

    /// Create a join that copies one column under a new name
    pub fn renamed(
        role: impl Into<String>,
        auxiliary_key: impl Into<String>,
        value_column: impl Into<String>,
        output_column: impl Into<String>,
        dedup: DedupPolicy,
    ) -> Self {
        JoinSpec {
            role: role.into(),
            auxiliary_key: auxiliary_key.into(),
            value_columns: vec![value_column.into()],
            output_columns: vec![output_column.into()],
            dedup,
        }
    }

    /// Column names this join writes into the dye plan
    pub fn outputs(&self) -> &[String] {
        if self.output_columns.is_empty() {
            &self.value_columns
        } else {
            &self.output_columns
        }
    }
}

/// A named, ordered set of joins applied to one dye plan sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique workflow name (selected with `--workflow`)
    pub name: String,
    /// Short human-readable description
    #[serde(default)]
    pub description: String,
    /// Case-insensitive prefix identifying candidate primary sheets
    #[serde(default = "default_sheet_prefix")]
    pub sheet_prefix: String,
    /// Join key column in the dye plan
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Drop repeated dye plan rows (keep first per key) before joining
    #[serde(default)]
    pub dedup_primary: bool,
    /// Value written when a row has no match
    #[serde(default = "default_fill_value")]
    pub fill_value: String,
    /// Default output mode when the command line does not override it
    #[serde(default)]
    pub output_mode: OutputMode,
    /// Joins, applied in order
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
}

fn default_sheet_prefix() -> String {
    "dye plan".to_string()
}

fn default_primary_key() -> String {
    "Production order".to_string()
}

fn default_fill_value() -> String {
    DEFAULT_FILL_VALUE.to_string()
}

impl Workflow {
    /// Create a workflow with default prefix, key, and fill value
    pub fn new(name: impl Into<String>) -> Self {
        Workflow {
            name: name.into(),
            description: String::new(),
            sheet_prefix: default_sheet_prefix(),
            primary_key: default_primary_key(),
            dedup_primary: false,
            fill_value: default_fill_value(),
            output_mode: OutputMode::default(),
            joins: Vec::new(),
        }
    }

    /// Add a join (applied after the ones already present)
    pub fn add_join(&mut self, join: JoinSpec) {
        self.joins.push(join);
    }

    /// File roles that must be supplied: the dye plan first, then each join's role
    pub fn required_roles(&self) -> Vec<String> {
        let mut roles = vec![PRIMARY_ROLE.to_string()];
        for join in &self.joins {
            if !roles.contains(&join.role) {
                roles.push(join.role.clone());
            }
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs_default_to_value_columns() {
        let join = JoinSpec::new("gre", "Origin order code", &["Receiving status"], DedupPolicy::KeepLast);
        assert_eq!(join.outputs(), &["Receiving status"]);

        let join = JoinSpec::renamed("hank", "Prod Order", "Operation", "Hank_PPO", DedupPolicy::KeepFirst);
        assert_eq!(join.outputs(), &["Hank_PPO"]);
    }

    #[test]
    fn test_required_roles_start_with_primary() {
        let mut workflow = Workflow::new("test");
        workflow.add_join(JoinSpec::new("gre", "Origin order code", &["Receiving status"], DedupPolicy::KeepLast));
        workflow.add_join(JoinSpec::renamed("finishing", "Prod Order", "Operation", "Finishing_PPO", DedupPolicy::KeepLast));
        workflow.add_join(JoinSpec::renamed("finishing", "Prod Order", "Remarks", "Finishing_Remarks", DedupPolicy::KeepLast));

        assert_eq!(workflow.required_roles(), vec!["dye_plan", "gre", "finishing"]);
        assert!(!workflow.required_roles().contains(&"shipment".to_string()));
    }

    #[test]
    fn test_workflow_defaults_from_toml() {
        let workflow: Workflow = toml::from_str(
            r#"
            name = "minimal"

            [[joins]]
            role = "gre"
            auxiliary_key = "Origin order code"
            value_columns = ["Receiving status"]
            "#,
        )
        .unwrap();

        assert_eq!(workflow.sheet_prefix, "dye plan");
        assert_eq!(workflow.primary_key, "Production order");
        assert_eq!(workflow.fill_value, "-");
        assert!(!workflow.dedup_primary);
        assert_eq!(workflow.output_mode, OutputMode::Replace);
        assert_eq!(workflow.joins[0].dedup, DedupPolicy::KeepLast);
    }

    #[test]
    fn test_dedup_policy_serialization() {
        let json = serde_json::to_string(&DedupPolicy::KeepFirst).unwrap();
        assert_eq!(json, "\"keep_first\"");
        let back: DedupPolicy = serde_json::from_str("\"keep_last\"").unwrap();
        assert_eq!(back, DedupPolicy::KeepLast);
    }
}
