//! Consolidate command handler

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use colored::*;

use super::ConsolidateCommands;
use crate::config::Config;
use crate::consolidate::excel::{
    list_sheets, read_sheet, read_single_sheet_dataset, render_workbook, replace_sheet_in_workbook,
};
use crate::consolidate::{
    ConsolidateError, Dataset, Enrichment, MergeOrchestrator, OutputMode, PRIMARY_ROLE,
    ReadinessTracker, RoleStatus, select_sheet,
};

pub fn handle_consolidate_command(args: ConsolidateCommands, config: &Config) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let workflow = config.find_workflow(&args.workflow)?;
    println!(
        "Workflow: {} {}",
        workflow.name.bright_green().bold(),
        workflow.description.dimmed()
    );

    let mut tracker = ReadinessTracker::for_workflow(&workflow);
    for (role, path) in &args.files {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read '{}' file: {}", role, path.display()))?;
        tracker.supply(role, path.display().to_string(), bytes)?;
    }

    let statuses = tracker.status();
    println!();
    for status in &statuses {
        print_status(status);
    }
    let supplied = statuses.iter().filter(|s| s.is_supplied()).count();
    println!("{}/{} files supplied", supplied, statuses.len());
    println!();

    if !tracker.is_ready() {
        return Err(ConsolidateError::NotReady {
            missing: tracker.missing_roles(),
        }
        .into());
    }

    let primary_file = tracker
        .get(PRIMARY_ROLE)
        .context("Dye plan file missing after readiness check")?;

    let sheets = list_sheets(&primary_file.bytes)
        .with_context(|| format!("Failed to list sheets of {}", primary_file.name))?;
    let selection = select_sheet(&sheets, &workflow.sheet_prefix)?;
    println!("Using sheet: {}", selection.name.cyan());

    let primary = read_sheet(&primary_file.bytes, &selection.name)
        .with_context(|| format!("Failed to read dye plan from {}", primary_file.name))?;
    if !primary.has_column(&workflow.primary_key) {
        println!(
            "{} {}",
            "⚠".yellow(),
            format!(
                "Sheet '{}' has no '{}' column, every looked-up value will be '{}'",
                selection.name, workflow.primary_key, workflow.fill_value
            )
            .yellow()
        );
    }

    let mut auxiliaries: HashMap<String, Dataset> = HashMap::new();
    for join in &workflow.joins {
        if auxiliaries.contains_key(&join.role) {
            continue;
        }
        let Some(file) = tracker.get(&join.role) else {
            continue;
        };
        let dataset = read_single_sheet_dataset(&file.bytes)
            .with_context(|| format!("Failed to read '{}' file: {}", join.role, file.name))?;
        auxiliaries.insert(join.role.clone(), dataset);
    }

    let enrichment = MergeOrchestrator::run(&workflow, primary, &auxiliaries, tracker.is_ready())?;
    print_reports(&enrichment);

    let mode = args.mode.unwrap_or(workflow.output_mode);
    let output = match mode {
        OutputMode::Replace => replace_sheet_in_workbook(
            &primary_file.bytes,
            &selection.name,
            &enrichment.dataset,
            &config.styling,
        )?,
        OutputMode::Standalone => {
            render_workbook(&enrichment.dataset, &selection.name, &config.styling)?
        }
    };

    fs::write(&args.output, output)
        .with_context(|| format!("Failed to write output to: {}", args.output.display()))?;

    println!();
    println!(
        "{} Final rows: {}",
        "Consolidated successfully!".bright_green().bold(),
        enrichment.dataset.len()
    );
    println!(
        "Saved ({}) to: {}",
        mode.label(),
        args.output.display().to_string().bright_green()
    );

    Ok(())
}

fn print_status(status: &RoleStatus) {
    match status {
        RoleStatus::Supplied { role, name, .. } => println!(
            "✅ {} supplied at {} {}",
            role.bold(),
            status.timestamp().unwrap_or_default(),
            format!("({})", name).dimmed()
        ),
        RoleStatus::Missing { role } => println!("❌ {} not supplied", role.bold()),
    }
}

fn print_reports(enrichment: &Enrichment) {
    if enrichment.rows_deduplicated > 0 {
        println!(
            "Removed {} duplicate dye plan row(s) ({} -> {})",
            enrichment.rows_deduplicated,
            enrichment.rows_before,
            enrichment.dataset.len()
        );
    }

    for report in &enrichment.reports {
        println!(
            "  {:<12} {} matched, {} filled, {} lookup keys, {} duplicate rows -> {}",
            report.role,
            report.matched.to_string().green(),
            report.filled.to_string().yellow(),
            report.lookup_entries,
            report.duplicate_keys,
            report.output_columns.join(", ").dimmed()
        );
    }

    for warning in enrichment.warnings() {
        if warning.is_fatal() {
            println!("{} {}", "✗".red(), warning.to_string().red());
        } else {
            println!("{} {}", "⚠".yellow(), warning.to_string().yellow());
        }
    }
}
