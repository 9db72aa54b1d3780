//! `workflows` command

mod handler;

pub use handler::handle_workflows_command;

use clap::Args;

#[derive(Args, Debug)]
pub struct WorkflowsCommands {
    /// Only show this workflow
    pub name: Option<String>,
}
