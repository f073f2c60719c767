use anyhow::Result;
use clap::Subcommand;
use std::path::Path;

use medstaff_store::config::Config;
use medstaff_store::database::sanitize_connection_url;

use super::{load_config, print_json};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration, password masked
    Show {
        /// Print JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(config_path: Option<&Path>, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => {
            let config = masked(load_config(config_path)?);
            if json {
                print_json(&config)
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        }
    }
}

fn masked(mut config: Config) -> Config {
    config.database.connection_string = sanitize_connection_url(&config.database.connection_string);
    config
}
