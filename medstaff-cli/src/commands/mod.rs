pub mod config;
pub mod demo;
pub mod doctor;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use medstaff_store::config::Config;
use medstaff_store::observability::init_tracing;
use medstaff_store::storages::Storages;

/// Load the config from `path` or the standard locations
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    Ok(config)
}

/// Config, logging and storages for commands that touch the store
pub fn open_storages(path: Option<&Path>) -> Result<Storages> {
    let config = load_config(path)?;
    init_tracing(&config)?;
    let storages = Storages::from_config(&config)?;
    Ok(storages)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
