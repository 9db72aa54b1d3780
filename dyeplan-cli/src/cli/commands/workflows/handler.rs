//! Workflows command handler

use anyhow::Result;
use colored::*;

use super::WorkflowsCommands;
use crate::config::Config;
use crate::consolidate::{MergeOrchestrator, Workflow};

pub fn handle_workflows_command(args: WorkflowsCommands, config: &Config) -> Result<()> {
    let workflows = match args.name {
        Some(name) => vec![config.find_workflow(&name)?],
        None => config.all_workflows(),
    };

    for workflow in &workflows {
        print_workflow(workflow);
        println!();
    }

    Ok(())
}

fn print_workflow(workflow: &Workflow) {
    println!("{} {}", workflow.name.bright_green().bold(), workflow.description.dimmed());
    println!(
        "  sheet prefix: '{}', key: '{}', fill: '{}', output: {}{}",
        workflow.sheet_prefix,
        workflow.primary_key,
        workflow.fill_value,
        workflow.output_mode.label(),
        if workflow.dedup_primary { ", dedup dye plan" } else { "" }
    );

    for join in &workflow.joins {
        let columns: Vec<String> = join
            .value_columns
            .iter()
            .zip(join.outputs())
            .map(|(value, output)| {
                if value == output { value.clone() } else { format!("{} as {}", value, output) }
            })
            .collect();

        println!(
            "  {:<10} {} -> {} ({})",
            join.role.cyan(),
            join.auxiliary_key,
            columns.join(", "),
            join.dedup.label()
        );
    }

    if let Err(e) = MergeOrchestrator::validate(workflow) {
        println!("  {} {}", "✗".red(), e.to_string().red());
    }
}
