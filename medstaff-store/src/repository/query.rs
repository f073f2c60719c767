//! Typed predicates for [`EntityStorage::find`](super::EntityStorage::find)
//!
//! A [`Query`] is a tree of [`FilterCondition`]s combined with AND / OR / NOT,
//! plus optional ordering and pagination. It is compiled to a parameterized
//! `WHERE` clause: field names are checked against the entity's declared
//! columns and quoted, values are always bound.
//!
//! # Example
//!
//! ```rust
//! use medstaff_store::repository::{FilterCondition, OrderDirection, Pagination, Predicate, Query};
//!
//! // Name = 'Ben Aissa'
//! let by_name = Query::filter(FilterCondition::eq("Name", "Ben Aissa"));
//!
//! // UId >= 10 AND (Name LIKE 'Ben%' OR Name LIKE 'Ali%')
//! let complex = Query::filter(
//!     Predicate::from(FilterCondition::gte("UId", 10))
//!         .and(FilterCondition::like("Name", "Ben%").or(FilterCondition::like("Name", "Ali%"))),
//! )
//! .order_by("UId", OrderDirection::Descending)
//! .paginate(Pagination::first_page(20));
//! # let _ = (by_name, complex);
//! ```

use std::fmt;

use chrono::{DateTime, Utc};

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl OrderDirection {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Pagination parameters for limiting query results
///
/// # Example
///
/// ```rust
/// use medstaff_store::repository::Pagination;
///
/// let page3 = Pagination::page(3, 20);
/// assert_eq!(page3.offset, 40);
/// assert_eq!(page3.limit, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Create pagination for the first page with the given limit
    #[must_use]
    pub const fn first_page(limit: u64) -> Self {
        Self { offset: 0, limit }
    }

    /// Create pagination for a specific page number (1-indexed)
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Not equal to (!=)
    NotEqual,
    /// Greater than (>)
    GreaterThan,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than (<)
    LessThan,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Pattern matching (LIKE)
    Like,
    /// Value is in a list (IN)
    In,
    /// Value is null (IS NULL)
    IsNull,
    /// Value is not null (IS NOT NULL)
    IsNotNull,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::NotEqual => write!(f, "!="),
            Self::GreaterThan => write!(f, ">"),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThan => write!(f, "<"),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Like => write!(f, "LIKE"),
            Self::In => write!(f, "IN"),
            Self::IsNull => write!(f, "IS NULL"),
            Self::IsNotNull => write!(f, "IS NOT NULL"),
        }
    }
}

/// A value bound into a statement
///
/// Used both for filter operands and for the column values an entity
/// writes (see [`Entity::values`](crate::entity::Entity::values)).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// Boolean value
    Boolean(bool),
    /// UTC timestamp
    Timestamp(DateTime<Utc>),
    /// List of string values (for IN operator)
    StringList(Vec<String>),
    /// List of integer values (for IN operator)
    IntegerList(Vec<i64>),
    /// SQL NULL
    Null,
}

impl Value {
    /// Flatten list values into their scalar elements
    pub(crate) fn into_scalars(self) -> Vec<Value> {
        match self {
            Self::StringList(list) => list.into_iter().map(Self::String).collect(),
            Self::IntegerList(list) => list.into_iter().map(Self::Integer).collect(),
            scalar => vec![scalar],
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<Vec<String>> for Value {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<i64>> for Value {
    fn from(list: Vec<i64>) -> Self {
        Self::IntegerList(list)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A single filter condition
///
/// # Example
///
/// ```rust
/// use medstaff_store::repository::FilterCondition;
///
/// let by_name = FilterCondition::eq("Name", "Ben Aissa");
/// let recent = FilterCondition::gte("UId", 100);
/// let pattern = FilterCondition::like("Name", "%aissa%");
/// let unset = FilterCondition::is_null("ModificationDate");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// The column to filter on
    pub field: String,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: Value,
}

impl FilterCondition {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// field = value
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// field != value
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::NotEqual, value.into())
    }

    /// field > value
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::GreaterThan, value.into())
    }

    /// field >= value
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value.into())
    }

    /// field < value
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::LessThan, value.into())
    }

    /// field <= value
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value.into())
    }

    /// field LIKE pattern
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, Value::String(pattern.into()))
    }

    /// field IN (strings)
    pub fn in_strings(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, Value::StringList(values))
    }

    /// field IN (integers)
    pub fn in_integers(field: impl Into<String>, values: Vec<i64>) -> Self {
        Self::new(field, FilterOperator::In, Value::IntegerList(values))
    }

    /// field IS NULL
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNull, Value::Null)
    }

    /// field IS NOT NULL
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::IsNotNull, Value::Null)
    }
}

/// Boolean combination of filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A single comparison
    Condition(FilterCondition),
    /// All of the predicates hold; empty is always true
    And(Vec<Predicate>),
    /// At least one predicate holds; empty is always false
    Or(Vec<Predicate>),
    /// The predicate does not hold
    Not(Box<Predicate>),
}

impl Predicate {
    /// Matches every row
    pub fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Combine with AND, flattening nested ANDs
    #[must_use]
    pub fn and(self, other: impl Into<Predicate>) -> Self {
        match (self, other.into()) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Combine with OR, flattening nested ORs
    #[must_use]
    pub fn or(self, other: impl Into<Predicate>) -> Self {
        match (self, other.into()) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Negate
    #[allow(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Every condition in the tree, depth first
    pub fn conditions(&self) -> Vec<&FilterCondition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a FilterCondition>) {
        match self {
            Self::Condition(condition) => out.push(condition),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_conditions(out);
                }
            }
            Self::Not(inner) => inner.collect_conditions(out),
        }
    }
}

impl From<FilterCondition> for Predicate {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

impl FilterCondition {
    /// Start a predicate: `self AND other`
    #[must_use]
    pub fn and(self, other: impl Into<Predicate>) -> Predicate {
        Predicate::from(self).and(other)
    }

    /// Start a predicate: `self OR other`
    #[must_use]
    pub fn or(self, other: impl Into<Predicate>) -> Predicate {
        Predicate::from(self).or(other)
    }
}

/// A filtered, optionally ordered and paginated query over one entity table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub predicate: Predicate,
    pub order_by: Option<(String, OrderDirection)>,
    pub pagination: Option<Pagination>,
}

impl Query {
    /// Query matching the given predicate
    pub fn filter(predicate: impl Into<Predicate>) -> Self {
        Self {
            predicate: predicate.into(),
            order_by: None,
            pagination: None,
        }
    }

    /// Query matching every row
    pub fn all() -> Self {
        Self::filter(Predicate::all())
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    #[must_use]
    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl From<FilterCondition> for Query {
    fn from(condition: FilterCondition) -> Self {
        Self::filter(condition)
    }
}

impl From<Predicate> for Query {
    fn from(predicate: Predicate) -> Self {
        Self::filter(predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_default() {
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
        assert_eq!(OrderDirection::Ascending.as_sql(), "ASC");
        assert_eq!(OrderDirection::Descending.as_sql(), "DESC");
    }

    #[test]
    fn test_pagination_page() {
        let page1 = Pagination::page(1, 20);
        assert_eq!(page1.offset, 0);

        let page3 = Pagination::page(3, 20);
        assert_eq!(page3.offset, 40);
        assert_eq!(page3.limit, 20);

        // page 0 is treated as page 1
        assert_eq!(Pagination::page(0, 20).offset, 0);
    }

    #[test]
    fn test_pagination_page_saturates() {
        let last = Pagination::page(u64::MAX, 1_000);
        assert_eq!(last.offset, u64::MAX);
        assert_eq!(last.limit, 1_000);
    }

    #[test]
    fn test_filter_operator_display() {
        assert_eq!(format!("{}", FilterOperator::Equal), "=");
        assert_eq!(format!("{}", FilterOperator::NotEqual), "!=");
        assert_eq!(format!("{}", FilterOperator::GreaterThanOrEqual), ">=");
        assert_eq!(format!("{}", FilterOperator::Like), "LIKE");
        assert_eq!(format!("{}", FilterOperator::In), "IN");
        assert_eq!(format!("{}", FilterOperator::IsNotNull), "IS NOT NULL");
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
        assert_eq!(Value::from(5_i32), Value::Integer(5));
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Integer(7));
    }

    #[test]
    fn test_value_into_scalars_expands_lists() {
        let scalars = Value::IntegerList(vec![1, 2]).into_scalars();
        assert_eq!(scalars, vec![Value::Integer(1), Value::Integer(2)]);

        let scalars = Value::from("a").into_scalars();
        assert_eq!(scalars, vec![Value::String("a".to_string())]);
    }

    #[test]
    fn test_filter_condition_constructors() {
        let filter = FilterCondition::eq("Name", "Ben Aissa");
        assert_eq!(filter.field, "Name");
        assert_eq!(filter.operator, FilterOperator::Equal);
        assert_eq!(filter.value, Value::String("Ben Aissa".to_string()));

        let filter = FilterCondition::in_integers("UId", vec![1, 2, 3]);
        assert_eq!(filter.operator, FilterOperator::In);
        assert_eq!(filter.value, Value::IntegerList(vec![1, 2, 3]));

        let filter = FilterCondition::is_null("ModificationDate");
        assert_eq!(filter.value, Value::Null);
    }

    #[test]
    fn test_and_flattens() {
        let predicate = FilterCondition::eq("Name", "a")
            .and(FilterCondition::gt("UId", 1))
            .and(FilterCondition::lt("UId", 9));

        match predicate {
            Predicate::And(items) => assert_eq!(items.len(), 3),
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_or_inside_and_is_kept_nested() {
        let predicate = Predicate::from(FilterCondition::gte("UId", 10))
            .and(FilterCondition::eq("Name", "a").or(FilterCondition::eq("Name", "b")));

        match &predicate {
            Predicate::And(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(&items[1], Predicate::Or(inner) if inner.len() == 2));
            }
            other => panic!("expected And, got {:?}", other),
        }
        assert_eq!(predicate.conditions().len(), 3);
    }

    #[test]
    fn test_query_builder() {
        let query = Query::filter(FilterCondition::eq("Name", "x"))
            .order_by("UId", OrderDirection::Descending)
            .paginate(Pagination::first_page(5));

        assert_eq!(
            query.order_by,
            Some(("UId".to_string(), OrderDirection::Descending))
        );
        assert_eq!(query.pagination, Some(Pagination::new(0, 5)));
        assert_eq!(Query::all().predicate, Predicate::And(Vec::new()));
    }
}
