//! `consolidate` command

mod handler;

pub use handler::handle_consolidate_command;

use std::path::PathBuf;

use clap::Args;

use crate::consolidate::OutputMode;

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "Updated_Dye_Plan.xlsx";

#[derive(Args, Debug)]
pub struct ConsolidateCommands {
    /// Workflow to run
    #[arg(short, long, default_value = "consolidate")]
    pub workflow: String,

    /// Input file for a role, as ROLE=PATH (e.g. dye_plan=plan.xlsx); repeatable
    #[arg(short, long = "file", value_name = "ROLE=PATH", value_parser = parse_role_file)]
    pub files: Vec<(String, PathBuf)>,

    /// Output path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Override the workflow's output mode
    #[arg(short, long, value_enum)]
    pub mode: Option<OutputMode>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

fn parse_role_file(s: &str) -> Result<(String, PathBuf), String> {
    let (role, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ROLE=PATH, got '{}'", s))?;

    let role = role.trim();
    if role.is_empty() || path.trim().is_empty() {
        return Err(format!("expected ROLE=PATH, got '{}'", s));
    }
    Ok((role.to_string(), PathBuf::from(path.trim())))
}
