//! Built-in workflows

use crate::consolidate::{DedupPolicy, JoinSpec, OutputMode, Workflow};

pub const CONSOLIDATE: &str = "consolidate";
pub const OPERATIONS: &str = "operations";

/// GRE receiving status plus Finishing/Packing/Shipment PPO, written back into the source workbook
pub fn consolidate_workflow() -> Workflow {
    let mut workflow = Workflow::new(CONSOLIDATE);
    workflow.description =
        "GRE receiving status + Finishing/Packing/Shipment PPO, replaces the dye plan sheet".to_string();
    workflow.output_mode = OutputMode::Replace;

    workflow.add_join(JoinSpec::new(
        "gre",
        "Origin order code",
        &["Receiving status", "Last update DateTime Cmp/Div"],
        DedupPolicy::KeepLast,
    ));
    for (role, output) in [
        ("finishing", "Finishing_PPO"),
        ("packing", "Packing_PPO"),
        ("shipment", "Shipment_PPO"),
    ] {
        workflow.add_join(JoinSpec::renamed(role, "Prod Order", "Operation", output, DedupPolicy::KeepLast));
    }
    workflow
}

/// GRE receiving status plus Finishing/Hank/Dye/WF PPO, as a standalone styled workbook
pub fn operations_workflow() -> Workflow {
    let mut workflow = Workflow::new(OPERATIONS);
    workflow.description =
        "GRE receiving status + Finishing/Hank/Dye/WF PPO, standalone styled workbook".to_string();
    workflow.dedup_primary = true;
    workflow.output_mode = OutputMode::Standalone;

    workflow.add_join(JoinSpec::new(
        "gre",
        "Origin order code",
        &["Receiving status"],
        DedupPolicy::KeepLast,
    ));
    for (role, output) in [
        ("finishing", "Finishing_PPO"),
        ("hank", "Hank_PPO"),
        ("dye", "Dye_PPO"),
        ("wf", "WF_PPO"),
    ] {
        workflow.add_join(JoinSpec::renamed(role, "Prod Order", "Operation", output, DedupPolicy::KeepFirst));
    }
    workflow
}

pub fn builtin_workflows() -> Vec<Workflow> {
    vec![consolidate_workflow(), operations_workflow()]
}
