//! MySQL implementation of [`EntityStorage`]
//!
//! A [`MySqlRepository`] owns a handle to the driver's pool and the table it
//! resolved at construction. Every operation checks its arguments, acquires
//! its own connection, runs its statements on it and lets the connection go
//! back to the pool when it is dropped, whichever way the call ends.

use std::fmt;
use std::marker::PhantomData;

use sqlx::mysql::{MySqlArguments, MySqlPool};
use sqlx::pool::PoolConnection;
use sqlx::{Arguments, MySql};

use super::error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
use super::query::{Query, Value};
use super::sql::{self, Statement};
use super::traits::{EntityStorage, RepositoryResult};
use crate::entity::Entity;
use crate::table::{InvalidIdentifier, TableName, TableNameResolver};

/// Event id attached to every critical storage failure log line
pub const CRITICAL_EVENT_ID: u32 = 1;

/// [`EntityStorage`] over one MySQL table
pub struct MySqlRepository<E> {
    pool: MySqlPool,
    table: TableName,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for MySqlRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            table: self.table.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for MySqlRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlRepository")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> MySqlRepository<E> {
    /// Repository over an already resolved table. Does no I/O.
    pub fn new(pool: MySqlPool, table: TableName) -> Self {
        Self {
            pool,
            table,
            _entity: PhantomData,
        }
    }

    /// Resolve the table for `E` and build the repository.
    ///
    /// A non-blank `explicit_table` wins over `resolver`.
    pub fn resolve(
        pool: MySqlPool,
        schema: &str,
        explicit_table: Option<&str>,
        resolver: &dyn TableNameResolver,
    ) -> Result<Self, InvalidIdentifier> {
        let table = TableName::resolve::<E>(schema, explicit_table, resolver)?;
        Ok(Self::new(pool, table))
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn acquire(&self, operation: RepositoryOperation) -> RepositoryResult<PoolConnection<MySql>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| RepositoryError::store_unavailable(operation, e.to_string()))
    }

    async fn fetch_optional(
        &self,
        operation: RepositoryOperation,
        statement: Statement,
    ) -> RepositoryResult<Option<E>> {
        let arguments = bind(operation, statement.params)?;
        let mut conn = self.acquire(operation).await?;
        sqlx::query_as_with::<_, E, _>(&statement.sql, arguments)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| RepositoryError::from_sqlx(operation, &e))
    }

    async fn fetch_all(
        &self,
        operation: RepositoryOperation,
        statement: Statement,
    ) -> RepositoryResult<Vec<E>> {
        let arguments = bind(operation, statement.params)?;
        let mut conn = self.acquire(operation).await?;
        sqlx::query_as_with::<_, E, _>(&statement.sql, arguments)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| RepositoryError::from_sqlx(operation, &e))
    }

    /// Run the statements in order on one connection, returning the total
    /// number of affected rows. Nothing is acquired for an empty list, and
    /// every statement is bound before the connection is.
    async fn execute(
        &self,
        operation: RepositoryOperation,
        statements: Vec<Statement>,
    ) -> RepositoryResult<u64> {
        if statements.is_empty() {
            return Ok(0);
        }

        let bound = statements
            .into_iter()
            .map(|statement| {
                bind(operation, statement.params).map(|arguments| (statement.sql, arguments))
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        let mut conn = self.acquire(operation).await?;
        let mut affected = 0;
        for (sql, arguments) in bound {
            let result = sqlx::query_with(&sql, arguments)
                .execute(&mut *conn)
                .await
                .map_err(|e| RepositoryError::from_sqlx(operation, &e))?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }

    fn invalid(&self, operation: RepositoryOperation, err: sql::InvalidStatement, ids: Option<String>) -> RepositoryError {
        self.report(RepositoryError::invalid_argument(operation, err.0), ids)
    }

    /// Attach entity context and log the failure once.
    fn report(&self, err: RepositoryError, ids: Option<String>) -> RepositoryError {
        let err = match ids {
            Some(ids) => err.with_entity(E::ENTITY_NAME, ids),
            None => err.with_entity_type(E::ENTITY_NAME),
        };
        let ids = err.entity_id.as_deref().unwrap_or("-");

        match err.kind {
            RepositoryErrorKind::InvalidArgument => tracing::warn!(
                entity = E::ENTITY_NAME,
                table = %self.table,
                operation = %err.operation,
                ids,
                error = %err.message,
                "rejected {} {} request",
                err.operation,
                E::ENTITY_NAME
            ),
            RepositoryErrorKind::StoreUnavailable | RepositoryErrorKind::QueryExecution => {
                tracing::error!(
                    event_id = CRITICAL_EVENT_ID,
                    severity = "critical",
                    entity = E::ENTITY_NAME,
                    table = %self.table,
                    operation = %err.operation,
                    kind = %err.kind,
                    ids,
                    error = %err.message,
                    "failed to {} {}",
                    err.operation,
                    E::ENTITY_NAME
                )
            }
        }
        err
    }
}

fn join_ids(uids: impl IntoIterator<Item = i32>) -> String {
    uids.into_iter()
        .map(|uid| uid.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn bind(operation: RepositoryOperation, params: Vec<Value>) -> RepositoryResult<MySqlArguments> {
    let mut arguments = MySqlArguments::default();
    for value in params {
        let added = match value {
            Value::String(s) => arguments.add(s),
            Value::Integer(n) => arguments.add(n),
            Value::Float(n) => arguments.add(n),
            Value::Boolean(b) => arguments.add(b),
            Value::Timestamp(ts) => arguments.add(ts),
            Value::Null => arguments.add(Option::<String>::None),
            Value::StringList(_) | Value::IntegerList(_) => {
                return Err(RepositoryError::invalid_argument(
                    operation,
                    "list values must be expanded before binding",
                ));
            }
        };
        added.map_err(|e| {
            RepositoryError::invalid_argument(operation, format!("cannot encode parameter: {}", e))
        })?;
    }
    Ok(arguments)
}

impl<E: Entity> EntityStorage<E> for MySqlRepository<E> {
    async fn get(&self, uid: i32) -> RepositoryResult<Option<E>> {
        let operation = RepositoryOperation::Get;
        self.fetch_optional(operation, sql::select_by_uid(&self.table, uid))
            .await
            .map_err(|err| self.report(err, Some(uid.to_string())))
    }

    async fn get_many(&self, uids: &[i32]) -> RepositoryResult<Vec<E>> {
        let operation = RepositoryOperation::GetMany;
        let ids = || Some(join_ids(uids.iter().copied()));

        let statement = match sql::select_by_uids(&self.table, uids) {
            Ok(Some(statement)) => statement,
            Ok(None) => return Ok(Vec::new()),
            Err(err) => return Err(self.invalid(operation, err, ids())),
        };
        self.fetch_all(operation, statement)
            .await
            .map_err(|err| self.report(err, ids()))
    }

    async fn get_all(&self) -> RepositoryResult<Vec<E>> {
        let operation = RepositoryOperation::GetAll;
        self.fetch_all(operation, sql::select_all(&self.table))
            .await
            .map_err(|err| self.report(err, None))
    }

    async fn set(&self, entity: &E) -> RepositoryResult<()> {
        let operation = RepositoryOperation::Set;
        let ids = || Some(entity.uid().to_string());

        let statements = sql::upsert(&self.table, std::slice::from_ref(entity))
            .map_err(|err| self.invalid(operation, err, ids()))?;
        self.execute(operation, statements)
            .await
            .map(|_| ())
            .map_err(|err| self.report(err, ids()))
    }

    async fn set_many(&self, entities: &[E]) -> RepositoryResult<()> {
        let operation = RepositoryOperation::SetMany;
        let ids = || Some(join_ids(entities.iter().map(E::uid)));

        let statements = sql::upsert(&self.table, entities)
            .map_err(|err| self.invalid(operation, err, ids()))?;
        self.execute(operation, statements)
            .await
            .map(|_| ())
            .map_err(|err| self.report(err, ids()))
    }

    async fn update(&self, entity: &E) -> RepositoryResult<u64> {
        let operation = RepositoryOperation::Update;
        let ids = || Some(entity.uid().to_string());

        let statement = sql::update(&self.table, entity)
            .map_err(|err| self.invalid(operation, err, ids()))?;
        self.execute(operation, vec![statement])
            .await
            .map_err(|err| self.report(err, ids()))
    }

    async fn update_many(&self, entities: &[E]) -> RepositoryResult<u64> {
        let operation = RepositoryOperation::UpdateMany;
        let ids = || Some(join_ids(entities.iter().map(E::uid)));

        let statements = sql::update_many(&self.table, entities)
            .map_err(|err| self.invalid(operation, err, ids()))?;
        self.execute(operation, statements)
            .await
            .map_err(|err| self.report(err, ids()))
    }

    async fn remove(&self, uid: i32) -> RepositoryResult<bool> {
        let operation = RepositoryOperation::Remove;
        self.execute(operation, vec![sql::delete_by_uid(&self.table, uid)])
            .await
            .map(|affected| affected > 0)
            .map_err(|err| self.report(err, Some(uid.to_string())))
    }

    async fn find(&self, query: &Query) -> RepositoryResult<Vec<E>> {
        let operation = RepositoryOperation::Find;
        let statement = sql::select_where::<E>(&self.table, query)
            .map_err(|err| self.invalid(operation, err, None))?;
        self.fetch_all(operation, statement)
            .await
            .map_err(|err| self.report(err, None))
    }
}
