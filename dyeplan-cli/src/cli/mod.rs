//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::consolidate::ConsolidateCommands;
use commands::sheets::SheetsCommands;
use commands::workflows::WorkflowsCommands;

#[derive(Parser)]
#[command(name = "dyeplan-cli", version, about = "Consolidate dye plan workbooks with GRE and PPO exports")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (defaults to $DYEPLAN_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enrich the latest dye plan sheet and write the result
    Consolidate(ConsolidateCommands),
    /// List a workbook's sheets and show which one would be selected
    Sheets(SheetsCommands),
    /// List available workflows and their joins
    Workflows(WorkflowsCommands),
}
