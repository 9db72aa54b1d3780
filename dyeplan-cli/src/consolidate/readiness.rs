//! Tracks which workflow files have been supplied
//!
//! Each role holds only the most recently supplied file. The workflow may run
//! once every required role has one.

use std::collections::HashMap;

use chrono::{DateTime, Local};

use super::{ConsolidateError, Workflow, DATETIME_DISPLAY_FORMAT};

/// A file supplied for one role
#[derive(Debug, Clone)]
pub struct SuppliedFile {
    /// File name as given (path or upload name)
    pub name: String,
    pub bytes: Vec<u8>,
    pub supplied_at: DateTime<Local>,
}

/// Supply state of one role, for status display
#[derive(Debug, Clone, PartialEq)]
pub enum RoleStatus {
    Supplied {
        role: String,
        name: String,
        supplied_at: DateTime<Local>,
    },
    Missing {
        role: String,
    },
}

impl RoleStatus {
    pub fn role(&self) -> &str {
        match self {
            RoleStatus::Supplied { role, .. } | RoleStatus::Missing { role } => role,
        }
    }

    pub fn is_supplied(&self) -> bool {
        matches!(self, RoleStatus::Supplied { .. })
    }

    /// Supply time formatted for display, if supplied
    pub fn timestamp(&self) -> Option<String> {
        match self {
            RoleStatus::Supplied { supplied_at, .. } => {
                Some(supplied_at.format(DATETIME_DISPLAY_FORMAT).to_string())
            }
            RoleStatus::Missing { .. } => None,
        }
    }
}

/// Role -> latest supplied file
#[derive(Debug, Clone, Default)]
pub struct ReadinessTracker {
    required: Vec<String>,
    files: HashMap<String, SuppliedFile>,
}

impl ReadinessTracker {
    pub fn new(required: Vec<String>) -> Self {
        ReadinessTracker {
            required,
            files: HashMap::new(),
        }
    }

    /// Track every role `workflow` needs (the dye plan included)
    pub fn for_workflow(workflow: &Workflow) -> Self {
        Self::new(workflow.required_roles())
    }

    /// Record a file for `role`, replacing any earlier one
    pub fn supply(
        &mut self,
        role: &str,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<&SuppliedFile, ConsolidateError> {
        self.supply_at(role, name, bytes, Local::now())
    }

    /// Record a file with an explicit timestamp
    pub fn supply_at(
        &mut self,
        role: &str,
        name: impl Into<String>,
        bytes: Vec<u8>,
        supplied_at: DateTime<Local>,
    ) -> Result<&SuppliedFile, ConsolidateError> {
        if !self.required.iter().any(|r| r == role) {
            return Err(ConsolidateError::UnknownRole {
                role: role.to_string(),
                expected: self.required.clone(),
            });
        }

        let file = SuppliedFile {
            name: name.into(),
            bytes,
            supplied_at,
        };

        if let Some(previous) = self.files.get(role) {
            log::debug!("Role '{}': replacing '{}' with '{}'", role, previous.name, file.name);
        }

        self.files.insert(role.to_string(), file);
        Ok(&self.files[role])
    }

    /// True once every required role has a file
    pub fn is_ready(&self) -> bool {
        self.required.iter().all(|r| self.files.contains_key(r))
    }

    /// Required roles with no file yet, in declaration order
    pub fn missing_roles(&self) -> Vec<String> {
        self.required
            .iter()
            .filter(|r| !self.files.contains_key(*r))
            .cloned()
            .collect()
    }

    pub fn get(&self, role: &str) -> Option<&SuppliedFile> {
        self.files.get(role)
    }

    /// Status of every required role, in declaration order
    pub fn status(&self) -> Vec<RoleStatus> {
        self.required
            .iter()
            .map(|role| match self.files.get(role) {
                Some(file) => RoleStatus::Supplied {
                    role: role.clone(),
                    name: file.name.clone(),
                    supplied_at: file.supplied_at,
                },
                None => RoleStatus::Missing { role: role.clone() },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::{DedupPolicy, JoinSpec};
    use chrono::TimeZone;

    fn workflow() -> Workflow {
        let mut workflow = Workflow::new("test");
        workflow.add_join(JoinSpec::new("gre", "Origin order code", &["Receiving status"], DedupPolicy::KeepLast));
        workflow.add_join(JoinSpec::renamed("finishing", "Prod Order", "Operation", "Finishing_PPO", DedupPolicy::KeepLast));
        workflow
    }

    #[test]
    fn test_ready_only_when_all_roles_supplied() {
        let mut tracker = ReadinessTracker::for_workflow(&workflow());
        assert!(!tracker.is_ready());
        assert_eq!(tracker.missing_roles(), vec!["dye_plan", "gre", "finishing"]);

        tracker.supply("dye_plan", "plan.xlsx", vec![1]).unwrap();
        tracker.supply("gre", "gre.xlsx", vec![2]).unwrap();
        assert!(!tracker.is_ready());
        assert_eq!(tracker.missing_roles(), vec!["finishing"]);

        tracker.supply("finishing", "fin.xlsx", vec![3]).unwrap();
        assert!(tracker.is_ready());
        assert!(tracker.missing_roles().is_empty());
    }

    #[test]
    fn test_resupply_keeps_latest() {
        let mut tracker = ReadinessTracker::for_workflow(&workflow());
        tracker.supply("gre", "old.xlsx", vec![1]).unwrap();
        tracker.supply("gre", "new.xlsx", vec![9, 9]).unwrap();

        let file = tracker.get("gre").unwrap();
        assert_eq!(file.name, "new.xlsx");
        assert_eq!(file.bytes, vec![9, 9]);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut tracker = ReadinessTracker::for_workflow(&workflow());
        let err = tracker.supply("shipment", "ship.xlsx", vec![]).unwrap_err();
        assert!(matches!(err, ConsolidateError::UnknownRole { ref role, .. } if role == "shipment"));
        assert!(tracker.get("shipment").is_none());
    }

    #[test]
    fn test_status_formats_timestamp() {
        let mut tracker = ReadinessTracker::for_workflow(&workflow());
        let at = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        tracker.supply_at("gre", "gre.xlsx", vec![], at).unwrap();

        let status = tracker.status();
        assert_eq!(status.len(), 3);
        assert!(!status[0].is_supplied());
        assert_eq!(status[1].role(), "gre");
        assert_eq!(status[1].timestamp().as_deref(), Some("2024-03-05 14:07:09"));
        assert_eq!(status[2].timestamp(), None);
    }
}
