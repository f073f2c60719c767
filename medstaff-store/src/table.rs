//! Table-name resolution
//!
//! A repository resolves its table once, at construction, and uses the
//! resulting [`TableName`] for every statement. The strategy is injected
//! instead of registered globally, so two repositories for the same entity
//! can map to different tables and resolution can be tested on its own.
//!
//! ```rust
//! use medstaff_store::entity::Doctor;
//! use medstaff_store::table::{SuffixTableNameResolver, TableName};
//!
//! let table = TableName::resolve::<Doctor>("clinic", None, &SuffixTableNameResolver::default()).unwrap();
//! assert_eq!(table.qualified(), "clinic.DoctorTable");
//! assert_eq!(table.sql(), "`clinic`.`DoctorTable`");
//! ```

use std::fmt;

use crate::entity::Entity;

/// Suffix appended to the entity name by the default resolver
pub const DEFAULT_TABLE_SUFFIX: &str = "Table";

/// Maps an entity type name to a physical table name.
///
/// Implementations must be pure: the same input always yields the same name.
pub trait TableNameResolver: Send + Sync {
    fn resolve_table_name(&self, entity_name: &str) -> String;
}

impl<F> TableNameResolver for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn resolve_table_name(&self, entity_name: &str) -> String {
        self(entity_name)
    }
}

/// `<EntityName><suffix>`, "Table" by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixTableNameResolver {
    suffix: String,
}

impl SuffixTableNameResolver {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Default for SuffixTableNameResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_SUFFIX)
    }
}

impl TableNameResolver for SuffixTableNameResolver {
    fn resolve_table_name(&self, entity_name: &str) -> String {
        format!("{}{}", entity_name, self.suffix)
    }
}

/// Rejected schema or table identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {role} name '{name}': {reason}")]
pub struct InvalidIdentifier {
    pub role: &'static str,
    pub name: String,
    pub reason: &'static str,
}

/// Fully qualified `schema.table` reference, immutable once resolved
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: String,
    table: String,
}

impl TableName {
    /// Build from already-known names
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self, InvalidIdentifier> {
        let schema = schema.into();
        let table = table.into();
        validate_identifier("schema", &schema)?;
        validate_identifier("table", &table)?;
        Ok(Self { schema, table })
    }

    /// Resolve the table for entity `E`.
    ///
    /// A non-blank `explicit` name wins over the resolver.
    pub fn resolve<E: Entity>(
        schema: &str,
        explicit: Option<&str>,
        resolver: &dyn TableNameResolver,
    ) -> Result<Self, InvalidIdentifier> {
        let table = match explicit.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => resolver.resolve_table_name(E::ENTITY_NAME),
        };
        Self::new(schema.trim(), table)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// `schema.table`, for logs and display
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }

    /// Backtick-quoted form interpolated into statements
    pub fn sql(&self) -> String {
        format!("`{}`.`{}`", self.schema, self.table)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Schema and table names end up inside SQL text, so only plain identifiers pass.
pub fn validate_identifier(role: &'static str, name: &str) -> Result<(), InvalidIdentifier> {
    let fail = |reason| {
        Err(InvalidIdentifier {
            role,
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return fail("must not be empty");
    }
    if name.chars().count() > 64 {
        return fail("longer than 64 characters");
    }
    if name
        .chars()
        .any(|c| c == '`' || c == '.' || c == '\0' || c.is_whitespace())
    {
        return fail("contains a backtick, dot, NUL or whitespace");
    }
    Ok(())
}
