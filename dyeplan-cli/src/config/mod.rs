//! Configuration file: styling and workflows
//!
//! Looked up in order: `--config`, `DYEPLAN_CONFIG`, then
//! `<config_dir>/dyeplan-cli/config.toml`. Missing default file means built-ins only.

pub mod presets;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::consolidate::{ConsolidateError, Workflow};
use crate::consolidate::excel::StyleConfig;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "DYEPLAN_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub styling: StyleConfig,
    /// User workflows; a name shared with a built-in replaces it
    pub workflows: Vec<Workflow>,
}

impl Config {
    /// Load configuration, falling back to defaults when no file is found
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.trim().is_empty() {
                return Self::from_file(Path::new(&path));
            }
        }

        match default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using built-in workflows");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!(
            "Loaded config from {} ({} workflow(s))",
            path.display(),
            config.workflows.len()
        );
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Built-in workflows (overridden by name) followed by user-only workflows
    pub fn all_workflows(&self) -> Vec<Workflow> {
        let mut workflows: Vec<Workflow> = presets::builtin_workflows()
            .into_iter()
            .map(|builtin| {
                self.workflows
                    .iter()
                    .find(|w| w.name == builtin.name)
                    .cloned()
                    .unwrap_or(builtin)
            })
            .collect();

        for workflow in &self.workflows {
            if !workflows.iter().any(|w| w.name == workflow.name) {
                workflows.push(workflow.clone());
            }
        }
        workflows
    }

    pub fn find_workflow(&self, name: &str) -> Result<Workflow, ConsolidateError> {
        let workflows = self.all_workflows();
        match workflows.iter().position(|w| w.name == name) {
            Some(idx) => Ok(workflows[idx].clone()),
            None => Err(ConsolidateError::UnknownWorkflow {
                name: name.to_string(),
                available: workflows.into_iter().map(|w| w.name).collect(),
            }),
        }
    }
}

/// Default config file location (~/.config/dyeplan-cli/config.toml on Linux)
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dyeplan-cli").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::{DedupPolicy, OutputMode};

    const SAMPLE: &str = r##"
[styling]
font_family = "Arial"
font_color = "#1F2937"

[[workflows]]
name = "consolidate"
description = "GRE only"

[[workflows.joins]]
role = "gre"
auxiliary_key = "Origin order code"
value_columns = ["Receiving status"]
dedup = "keep_first"

[[workflows]]
name = "shipping"
sheet_prefix = "Dispatch plan"
dedup_primary = true
output_mode = "standalone"

[[workflows.joins]]
role = "shipment"
auxiliary_key = "Prod Order"
value_columns = ["Operation"]
output_columns = ["Shipment_PPO"]
"##;

    #[test]
    fn test_parse_sample_config() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.styling.font_family, "Arial");
        assert_eq!(config.styling.font_size, 11.0);
        assert_eq!(config.workflows.len(), 2);

        let shipping = &config.workflows[1];
        assert_eq!(shipping.sheet_prefix, "Dispatch plan");
        assert_eq!(shipping.output_mode, OutputMode::Standalone);
        assert_eq!(shipping.joins[0].outputs(), &["Shipment_PPO"]);
    }

    #[test]
    fn test_user_workflow_overrides_builtin() {
        let config = Config::from_toml_str(SAMPLE).unwrap();
        let workflow = config.find_workflow("consolidate").unwrap();

        assert_eq!(workflow.description, "GRE only");
        assert_eq!(workflow.joins.len(), 1);
        assert_eq!(workflow.joins[0].dedup, DedupPolicy::KeepFirst);

        let names: Vec<String> = config.all_workflows().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["consolidate", "operations", "shipping"]);
    }

    #[test]
    fn test_empty_config_has_builtins() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.find_workflow("operations").is_ok());
    }

    #[test]
    fn test_unknown_workflow() {
        let err = Config::default().find_workflow("nope").unwrap_err();
        assert_eq!(
            err,
            ConsolidateError::UnknownWorkflow {
                name: "nope".to_string(),
                available: vec!["consolidate".to_string(), "operations".to_string()],
            }
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml_str("[[workflows]]\nname = 3").is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/dyeplan.toml"))).is_err());
    }
}
