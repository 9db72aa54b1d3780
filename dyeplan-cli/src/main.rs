mod cli;
mod config;
mod consolidate;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Consolidate(args) => cli::commands::consolidate::handle_consolidate_command(args, &config),
        Commands::Sheets(args) => cli::commands::sheets::handle_sheets_command(args),
        Commands::Workflows(args) => cli::commands::workflows::handle_workflows_command(args, &config),
    }
}
