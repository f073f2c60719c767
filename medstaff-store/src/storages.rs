//! Composition root
//!
//! Builds the single pool and one repository per entity type. Callers take a
//! clone of the repository they need; repositories are cheap to clone and
//! share the pool.

use sqlx::mysql::MySqlPool;

use crate::config::Config;
use crate::database;
use crate::entity::{Doctor, Entity};
use crate::error::Result;
use crate::repository::MySqlRepository;
use crate::table::{SuffixTableNameResolver, TableNameResolver};

/// Every entity repository of the application
#[derive(Debug, Clone)]
pub struct Storages {
    pool: MySqlPool,
    pub doctors: MySqlRepository<Doctor>,
}

impl Storages {
    /// Build the pool from `config.database` and register every repository.
    ///
    /// No connection is opened here.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let pool = database::connect_lazy(&config.database)?;
        Self::from_pool(pool, config, &SuffixTableNameResolver::default())
    }

    /// Register every repository on an existing pool.
    ///
    /// `[tables]` overrides in `config` take precedence over `resolver`.
    pub fn from_pool(
        pool: MySqlPool,
        config: &Config,
        resolver: &dyn TableNameResolver,
    ) -> Result<Self> {
        let schema = config.database.db_schema.as_str();
        let doctors = repository::<Doctor>(&pool, schema, config, resolver)?;

        tracing::info!(
            schema,
            doctors = %doctors.table(),
            "Storages registered"
        );

        Ok(Self { pool, doctors })
    }

    /// Startup connectivity check with the configured retries
    pub async fn verify(&self, config: &Config) -> Result<()> {
        database::verify_connection(&self.pool, &config.database).await
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn repository<E: Entity>(
    pool: &MySqlPool,
    schema: &str,
    config: &Config,
    resolver: &dyn TableNameResolver,
) -> Result<MySqlRepository<E>> {
    let explicit = config.table_override(E::ENTITY_NAME);
    Ok(MySqlRepository::resolve(pool.clone(), schema, explicit, resolver)?)
}
