//! # medstaff-store
//!
//! Storage layer for MedStaffConsult: a generic entity repository over MySQL.
//!
//! ## Features
//!
//! - **One contract for every entity**: [`EntityStorage`](repository::EntityStorage)
//!   covers key lookups, full scans, upserts, updates, deletes and filtered queries
//! - **Table-name resolution**: `Doctor` lives in `<schema>.DoctorTable` unless
//!   an explicit name is configured
//! - **Scoped connections**: every operation acquires its own pooled connection
//!   and releases it on every exit path
//! - **Centralized failure logging**: each store failure is logged once, as
//!   critical, with the entity, operation and affected ids
//! - **Layered configuration**: defaults, TOML files and `MEDSTAFF_` environment variables
//!
//! ## Example
//!
//! ```rust,no_run
//! use medstaff_store::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let storages = Storages::from_config(&config)?;
//!
//!     storages.doctors.set(&Doctor::new(5, "BEN AISSA")).await?;
//!     let found = storages
//!         .doctors
//!         .find(&Query::filter(FilterCondition::eq("Name", "BEN AISSA")))
//!         .await?;
//!     println!("{:?}", found);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod observability;
pub mod repository;
pub mod storages;
pub mod table;

/// Commonly used types
pub mod prelude {
    pub use crate::config::{Config, DatabaseConfig, LogFormat, ServiceConfig};
    pub use crate::entity::{Doctor, Entity};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        EntityStorage, FilterCondition, FilterOperator, MySqlRepository, OrderDirection,
        Pagination, Predicate, Query, RepositoryError, RepositoryErrorKind, RepositoryOperation,
        RepositoryResult, Value,
    };
    pub use crate::storages::Storages;
    pub use crate::table::{SuffixTableNameResolver, TableName, TableNameResolver};
}
