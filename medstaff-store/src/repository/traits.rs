//! Storage contract
//!
//! [`EntityStorage`] is the whole surface consumers see: single and bulk
//! reads, full scans, upserts, updates, deletes and filtered queries. It is
//! implemented once, generically, by
//! [`MySqlRepository`](super::MySqlRepository) and reused for every entity type.
//!
//! Methods use RPITIT (Return Position Impl Trait In Traits) so the futures
//! stay `Send` without `async_trait`.
//!
//! # Example
//!
//! ```rust,ignore
//! use medstaff_store::entity::Doctor;
//! use medstaff_store::repository::{EntityStorage, FilterCondition, Query};
//!
//! async fn rename<S: EntityStorage<Doctor>>(storage: &S, uid: i32, name: &str) -> anyhow::Result<()> {
//!     if let Some(mut doctor) = storage.get(uid).await? {
//!         doctor.name = name.to_string();
//!         doctor.touch();
//!         storage.update(&doctor).await?;
//!     }
//!     let same_name = storage.find(&Query::filter(FilterCondition::eq("Name", name))).await?;
//!     println!("{} doctors named {}", same_name.len(), name);
//!     Ok(())
//! }
//! ```

use std::future::Future;

use super::error::RepositoryError;
use super::query::Query;
use crate::entity::Entity;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Typed storage for one entity collection
///
/// Every call is independent: no state is carried between calls and no
/// transaction spans more than one call. Concurrent writes to the same `UId`
/// race at the store.
pub trait EntityStorage<E: Entity>: Send + Sync {
    /// Fetch by primary key.
    ///
    /// Returns `Ok(None)` when no row matches; absence is not an error.
    fn get(&self, uid: i32) -> impl Future<Output = RepositoryResult<Option<E>>> + Send;

    /// Fetch every entity whose `UId` is in `uids`.
    ///
    /// Ids with no row are silently left out of the result. An empty slice
    /// returns an empty result without touching the store.
    fn get_many(&self, uids: &[i32]) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    /// Every row of the table, in store-defined order
    fn get_all(&self) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    /// Insert the entity, or overwrite the existing row with the same `UId`
    /// (its `CreationDate` is preserved).
    fn set(&self, entity: &E) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Bulk insert-or-upsert. An empty slice succeeds without touching the store.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the same `UId` appears twice in `entities`.
    fn set_many(&self, entities: &[E]) -> impl Future<Output = RepositoryResult<()>> + Send;

    /// Modify the row with the entity's `UId`.
    ///
    /// A missing row is left to the store's native semantics (nothing is
    /// updated). Returns the number of affected rows.
    fn update(&self, entity: &E) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Bulk update. An empty slice succeeds without touching the store.
    fn update_many(&self, entities: &[E]) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Delete by primary key. Idempotent: returns whether a row was removed.
    fn remove(&self, uid: i32) -> impl Future<Output = RepositoryResult<bool>> + Send;

    /// Rows matching a typed predicate.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the query names a column `E` does not declare,
    /// before any store access.
    fn find(&self, query: &Query) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Doctor;
    use crate::repository::error::RepositoryOperation;
    use crate::repository::query::{FilterCondition, FilterOperator, Predicate, Value};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[test]
    fn test_repository_result_type() {
        let ok_result: RepositoryResult<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: RepositoryResult<i32> = Err(RepositoryError::store_unavailable(
            RepositoryOperation::Get,
            "refused",
        ));
        assert!(err_result.is_err());
    }

    // In-memory storage keyed by UId; only equality filters are understood.
    #[derive(Default)]
    struct MemoryStorage {
        rows: Mutex<BTreeMap<i32, Doctor>>,
    }

    fn matches(doctor: &Doctor, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::Condition(FilterCondition {
                field,
                operator: FilterOperator::Equal,
                value,
            }) => match (field.as_str(), value) {
                ("Name", Value::String(name)) => doctor.name == *name,
                ("UId", Value::Integer(uid)) => i64::from(doctor.uid) == *uid,
                _ => false,
            },
            Predicate::And(items) => items.iter().all(|p| matches(doctor, p)),
            Predicate::Or(items) => items.iter().any(|p| matches(doctor, p)),
            Predicate::Not(inner) => !matches(doctor, inner),
            Predicate::Condition(_) => false,
        }
    }

    impl EntityStorage<Doctor> for MemoryStorage {
        async fn get(&self, uid: i32) -> RepositoryResult<Option<Doctor>> {
            Ok(self.rows.lock().unwrap().get(&uid).cloned())
        }

        async fn get_many(&self, uids: &[i32]) -> RepositoryResult<Vec<Doctor>> {
            let rows = self.rows.lock().unwrap();
            Ok(uids.iter().filter_map(|uid| rows.get(uid).cloned()).collect())
        }

        async fn get_all(&self) -> RepositoryResult<Vec<Doctor>> {
            Ok(self.rows.lock().unwrap().values().cloned().collect())
        }

        async fn set(&self, entity: &Doctor) -> RepositoryResult<()> {
            self.rows.lock().unwrap().insert(entity.uid, entity.clone());
            Ok(())
        }

        async fn set_many(&self, entities: &[Doctor]) -> RepositoryResult<()> {
            for entity in entities {
                self.set(entity).await?;
            }
            Ok(())
        }

        async fn update(&self, entity: &Doctor) -> RepositoryResult<u64> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&entity.uid) {
                Some(row) => {
                    *row = entity.clone();
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        async fn update_many(&self, entities: &[Doctor]) -> RepositoryResult<u64> {
            let mut affected = 0;
            for entity in entities {
                affected += self.update(entity).await?;
            }
            Ok(affected)
        }

        async fn remove(&self, uid: i32) -> RepositoryResult<bool> {
            Ok(self.rows.lock().unwrap().remove(&uid).is_some())
        }

        async fn find(&self, query: &Query) -> RepositoryResult<Vec<Doctor>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|d| matches(d, &query.predicate))
                .cloned()
                .collect())
        }
    }

    // Written against the trait only, the way a consumer would use it.
    async fn upsert_then_find<S: EntityStorage<Doctor>>(storage: &S) -> Vec<Doctor> {
        storage.set(&Doctor::new(5, "Ben Aissa")).await.unwrap();
        storage
            .find(&Query::filter(FilterCondition::eq("Name", "Ben Aissa")))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_trait_is_implementable_and_usable_generically() {
        let storage = MemoryStorage::default();
        let found = upsert_then_find(&storage).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uid, 5);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_through_the_trait() {
        let storage = MemoryStorage::default();
        storage.set(&Doctor::new(1, "A")).await.unwrap();

        assert!(storage.remove(1).await.unwrap());
        assert!(!storage.remove(1).await.unwrap());
        assert!(storage.get(1).await.unwrap().is_none());
    }
}
