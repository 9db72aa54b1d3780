//! `sheets` command

mod handler;

pub use handler::handle_sheets_command;

use std::path::PathBuf;

use clap::Args;

#[derive(Args, Debug)]
pub struct SheetsCommands {
    /// Workbook to inspect
    pub workbook: PathBuf,

    /// Sheet prefix to match
    #[arg(short, long, default_value = "dye plan")]
    pub prefix: String,
}
