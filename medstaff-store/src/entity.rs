//! Entity model
//!
//! [`Entity`] is the capability every stored record provides: a caller-assigned
//! `UId` primary key plus creation and modification timestamps, a fixed column
//! list, and row mapping through [`sqlx::FromRow`] by column name.
//!
//! [`Doctor`] is the concrete entity used by the application.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;

use crate::repository::Value;

/// Primary key column shared by every entity table
pub const UID_COLUMN: &str = "UId";
/// Column set once when the row is first persisted
pub const CREATION_DATE_COLUMN: &str = "CreationDate";
/// Column refreshed on every write
pub const MODIFICATION_DATE_COLUMN: &str = "ModificationDate";

/// A record stored in its own table and keyed by `UId`
///
/// # Example
///
/// ```rust,ignore
/// #[derive(sqlx::FromRow)]
/// struct Nurse {
///     #[sqlx(rename = "UId")]
///     uid: i32,
///     #[sqlx(rename = "Ward")]
///     ward: String,
///     #[sqlx(rename = "CreationDate")]
///     creation_date: DateTime<Utc>,
///     #[sqlx(rename = "ModificationDate")]
///     modification_date: DateTime<Utc>,
/// }
///
/// impl Entity for Nurse {
///     const ENTITY_NAME: &'static str = "Nurse";
///     fn columns() -> &'static [&'static str] {
///         &["UId", "Ward", "CreationDate", "ModificationDate"]
///     }
///     fn uid(&self) -> i32 { self.uid }
///     fn creation_date(&self) -> DateTime<Utc> { self.creation_date }
///     fn modification_date(&self) -> DateTime<Utc> { self.modification_date }
///     fn values(&self) -> Vec<Value> {
///         vec![self.uid.into(), self.ward.clone().into(),
///              self.creation_date.into(), self.modification_date.into()]
///     }
/// }
/// ```
pub trait Entity: for<'r> sqlx::FromRow<'r, MySqlRow> + Send + Sync + Unpin + 'static {
    /// Type name fed to the table-name resolver ("Doctor" -> "DoctorTable")
    const ENTITY_NAME: &'static str;

    /// Every persisted column, in the order [`Entity::values`] yields them.
    /// Must include [`UID_COLUMN`], [`CREATION_DATE_COLUMN`] and
    /// [`MODIFICATION_DATE_COLUMN`].
    fn columns() -> &'static [&'static str];

    fn uid(&self) -> i32;

    fn creation_date(&self) -> DateTime<Utc>;

    fn modification_date(&self) -> DateTime<Utc>;

    /// Column values in [`Entity::columns`] order
    fn values(&self) -> Vec<Value>;
}

/// Resolve a user-supplied field name to the entity's declared column.
///
/// Matching is case-insensitive like MySQL column names.
pub fn column_for<E: Entity>(field: &str) -> Option<&'static str> {
    E::columns()
        .iter()
        .copied()
        .find(|column| column.eq_ignore_ascii_case(field))
}

/// Current time at `DATETIME` precision, so written and re-read values compare equal
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// A doctor registered with the consultancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Doctor {
    #[sqlx(rename = "UId")]
    pub uid: i32,
    #[sqlx(rename = "Name")]
    pub name: String,
    #[sqlx(rename = "CreationDate")]
    pub creation_date: DateTime<Utc>,
    #[sqlx(rename = "ModificationDate")]
    pub modification_date: DateTime<Utc>,
}

impl Doctor {
    /// New record with both timestamps set to now
    pub fn new(uid: i32, name: impl Into<String>) -> Self {
        let now = timestamp_now();
        Self {
            uid,
            name: name.into(),
            creation_date: now,
            modification_date: now,
        }
    }

    /// Refresh the modification date before writing a changed record
    pub fn touch(&mut self) {
        self.modification_date = timestamp_now();
    }
}

impl Entity for Doctor {
    const ENTITY_NAME: &'static str = "Doctor";

    fn columns() -> &'static [&'static str] {
        &[
            UID_COLUMN,
            "Name",
            CREATION_DATE_COLUMN,
            MODIFICATION_DATE_COLUMN,
        ]
    }

    fn uid(&self) -> i32 {
        self.uid
    }

    fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    fn modification_date(&self) -> DateTime<Utc> {
        self.modification_date
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.uid.into(),
            self.name.clone().into(),
            self.creation_date.into(),
            self.modification_date.into(),
        ]
    }
}
