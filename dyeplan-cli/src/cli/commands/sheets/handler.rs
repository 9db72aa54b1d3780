//! Sheets command handler

use std::fs;

use anyhow::{Context, Result};
use colored::*;

use super::SheetsCommands;
use crate::consolidate::excel::list_sheets;
use crate::consolidate::{select_sheet, sheet_version};

pub fn handle_sheets_command(args: SheetsCommands) -> Result<()> {
    let bytes = fs::read(&args.workbook)
        .with_context(|| format!("Failed to read workbook: {}", args.workbook.display()))?;
    let sheets = list_sheets(&bytes)?;

    let (selected, candidates) = match select_sheet(&sheets, &args.prefix) {
        Ok(selection) => (Some(selection.index), selection.candidates),
        Err(e) => {
            println!("{}", e.to_string().yellow());
            (None, Vec::new())
        }
    };

    for (idx, name) in sheets.iter().enumerate() {
        let version = sheet_version(name)
            .map(|v| v.iter().map(|n| n.to_string()).collect::<Vec<_>>().join("."))
            .unwrap_or_else(|| "-".to_string());

        if Some(idx) == selected {
            println!("{} {} {}", "→".bright_green(), name.bright_green().bold(), format!("(version {})", version).dimmed());
        } else if candidates.contains(name) {
            println!("  {} {}", name, format!("(version {})", version).dimmed());
        } else {
            println!("  {}", name.dimmed());
        }
    }

    Ok(())
}
