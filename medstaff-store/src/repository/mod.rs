//! Generic entity repository
//!
//! One storage contract, [`EntityStorage`], implemented once by
//! [`MySqlRepository`] and reused for every [`Entity`](crate::entity::Entity).
//!
//! # Features
//!
//! - **Key lookups**: single and bulk `get`, missing rows are not errors
//! - **Upserts**: `set` / `set_many` through `INSERT ... ON DUPLICATE KEY UPDATE`
//! - **Updates and deletes** by `UId`
//! - **Filtering**: [`Query`] built from [`FilterCondition`]s and [`Predicate`]s,
//!   compiled to a parameterized `WHERE`
//! - **Failure logging**: every store failure is logged once, as critical, at
//!   the repository boundary
//!
//! # Example
//!
//! ```rust,ignore
//! use medstaff_store::entity::Doctor;
//! use medstaff_store::repository::{EntityStorage, FilterCondition, MySqlRepository, Query};
//! use medstaff_store::table::SuffixTableNameResolver;
//!
//! let doctors = MySqlRepository::<Doctor>::resolve(
//!     pool,
//!     "clinic",
//!     None,
//!     &SuffixTableNameResolver::default(),
//! )?;
//!
//! doctors.set(&Doctor::new(5, "BEN AISSA")).await?;
//! let found = doctors
//!     .find(&Query::filter(FilterCondition::eq("Name", "BEN AISSA")))
//!     .await?;
//! ```

mod error;
mod mysql;
pub mod query;
pub mod sql;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use mysql::{MySqlRepository, CRITICAL_EVENT_ID};
pub use query::{
    FilterCondition, FilterOperator, OrderDirection, Pagination, Predicate, Query, Value,
};
pub use traits::{EntityStorage, RepositoryResult};
