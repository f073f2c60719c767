use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::path::Path;

use medstaff_store::prelude::*;

use super::{open_storages, print_json};

#[derive(Subcommand)]
pub enum DoctorCommands {
    /// Fetch one doctor by UId (prints null when absent)
    Get {
        #[arg(value_name = "UID")]
        uid: i32,
    },
    /// Fetch several doctors; unknown UIds are skipped
    GetMany {
        #[arg(value_name = "UID", required = true, num_args = 1..)]
        uids: Vec<i32>,
    },
    /// Every doctor
    List,
    /// Insert a doctor, or overwrite the one with the same UId
    Set {
        #[arg(long)]
        uid: i32,

        #[arg(long)]
        name: String,
    },
    /// Rename an existing doctor; a missing UId changes nothing
    Update {
        #[arg(long)]
        uid: i32,

        #[arg(long)]
        name: String,
    },
    /// Delete a doctor by UId
    Remove {
        #[arg(value_name = "UID")]
        uid: i32,
    },
    /// Search doctors; all given filters must match
    Find(FindArgs),
}

#[derive(Args, Debug, Default)]
pub struct FindArgs {
    /// Exact name
    #[arg(long)]
    pub name: Option<String>,

    /// SQL LIKE pattern on the name, e.g. "BEN%"
    #[arg(long, value_name = "PATTERN")]
    pub name_like: Option<String>,

    /// Smallest UId, inclusive
    #[arg(long, value_name = "N")]
    pub uid_min: Option<i32>,

    /// Largest UId, inclusive
    #[arg(long, value_name = "N")]
    pub uid_max: Option<i32>,

    /// Maximum number of results
    #[arg(long, value_name = "N")]
    pub limit: Option<u64>,

    /// Results to skip before the first one returned
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub offset: u64,
}

impl FindArgs {
    /// Filters joined with AND, ordered by UId
    pub fn to_query(&self) -> Query {
        let mut predicate = Predicate::all();
        if let Some(name) = &self.name {
            predicate = predicate.and(FilterCondition::eq("Name", name.as_str()));
        }
        if let Some(pattern) = &self.name_like {
            predicate = predicate.and(FilterCondition::like("Name", pattern.as_str()));
        }
        if let Some(min) = self.uid_min {
            predicate = predicate.and(FilterCondition::gte("UId", min));
        }
        if let Some(max) = self.uid_max {
            predicate = predicate.and(FilterCondition::lte("UId", max));
        }

        let query = Query::filter(predicate).order_by("UId", OrderDirection::Ascending);
        match self.limit {
            Some(limit) => query.paginate(Pagination::new(self.offset, limit)),
            None => query,
        }
    }
}

pub async fn execute(config_path: Option<&Path>, command: DoctorCommands) -> Result<()> {
    let storages = open_storages(config_path)?;
    let doctors = &storages.doctors;

    match command {
        DoctorCommands::Get { uid } => {
            let doctor = doctors.get(uid).await?;
            if doctor.is_none() {
                eprintln!("{} doctor {} not found", "Note:".yellow(), uid);
            }
            print_json(&doctor)
        }
        DoctorCommands::GetMany { uids } => print_json(&doctors.get_many(&uids).await?),
        DoctorCommands::List => print_json(&doctors.get_all().await?),
        DoctorCommands::Set { uid, name } => {
            doctors.set(&Doctor::new(uid, name)).await?;
            let stored = doctors
                .get(uid)
                .await?
                .with_context(|| format!("Doctor {} vanished right after being written", uid))?;
            print_json(&stored)
        }
        DoctorCommands::Update { uid, name } => {
            let affected = doctors.update(&Doctor::new(uid, name)).await?;
            print_json(&json!({ "uid": uid, "updated": affected }))
        }
        DoctorCommands::Remove { uid } => {
            let removed = doctors.remove(uid).await?;
            print_json(&json!({ "uid": uid, "removed": removed }))
        }
        DoctorCommands::Find(args) => print_json(&doctors.find(&args.to_query()).await?),
    }
}
