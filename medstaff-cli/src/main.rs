use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod commands;

use commands::config::ConfigCommands;
use commands::doctor::DoctorCommands;

/// medstaff - MedStaffConsult storage from the command line
#[derive(Parser)]
#[command(name = "medstaff")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file to load instead of the standard search paths
    #[arg(short, long, global = true, env = "MEDSTAFF_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and write doctors
    Doctor {
        #[command(subcommand)]
        command: DoctorCommands,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Upsert doctor 5 "BEN AISSA" and look it up by name
    Demo,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Doctor { command } => commands::doctor::execute(config_path, command).await,
        Commands::Config { command } => commands::config::execute(config_path, command).await,
        Commands::Demo => commands::demo::execute(config_path).await,
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}
