//! SQL statement construction
//!
//! Pure functions turning storage operations into parameterized MySQL
//! statements. Only the resolved table name and declared column names are
//! interpolated into the text; every value is a `?` placeholder with a
//! matching entry in [`Statement::params`].

use std::collections::HashSet;

use crate::entity::{column_for, Entity, CREATION_DATE_COLUMN, MODIFICATION_DATE_COLUMN, UID_COLUMN};
use crate::table::TableName;

use super::query::{FilterCondition, FilterOperator, Predicate, Query, Value};

/// MySQL rejects prepared statements with more placeholders than this
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

/// Arguments that cannot be turned into a statement
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidStatement(pub String);

type BuildResult<T> = std::result::Result<T, InvalidStatement>;

fn quote(column: &str) -> String {
    format!("`{}`", column)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Columns rewritten by upsert and update: everything but the key and the creation date
fn mutable_columns<E: Entity>() -> impl Iterator<Item = &'static str> {
    E::columns()
        .iter()
        .copied()
        .filter(|c| *c != UID_COLUMN && *c != CREATION_DATE_COLUMN)
}

fn check_columns<E: Entity>() -> BuildResult<()> {
    for required in [UID_COLUMN, CREATION_DATE_COLUMN, MODIFICATION_DATE_COLUMN] {
        if !E::columns().contains(&required) {
            return Err(InvalidStatement(format!(
                "{} does not declare the {} column",
                E::ENTITY_NAME,
                required
            )));
        }
    }
    Ok(())
}

fn entity_values<E: Entity>(entity: &E) -> BuildResult<Vec<Value>> {
    let values = entity.values();
    if values.len() != E::columns().len() {
        return Err(InvalidStatement(format!(
            "{} {} yields {} values for {} columns",
            E::ENTITY_NAME,
            entity.uid(),
            values.len(),
            E::columns().len()
        )));
    }
    Ok(values)
}

/// `SELECT * ... WHERE UId = ?`
pub fn select_by_uid(table: &TableName, uid: i32) -> Statement {
    Statement::new(
        format!("SELECT * FROM {} WHERE {} = ?", table.sql(), quote(UID_COLUMN)),
        vec![Value::from(uid)],
    )
}

/// `SELECT * ... WHERE UId IN (...)`, `None` when there is nothing to fetch.
///
/// Duplicate ids are collapsed, first occurrence wins.
pub fn select_by_uids(table: &TableName, uids: &[i32]) -> BuildResult<Option<Statement>> {
    let mut seen = HashSet::new();
    let params: Vec<Value> = uids
        .iter()
        .filter(|uid| seen.insert(**uid))
        .map(|uid| Value::from(*uid))
        .collect();

    if params.is_empty() {
        return Ok(None);
    }
    if params.len() > MAX_PLACEHOLDERS {
        return Err(InvalidStatement(format!(
            "{} ids exceed the {} placeholder limit",
            params.len(),
            MAX_PLACEHOLDERS
        )));
    }

    Ok(Some(Statement::new(
        format!(
            "SELECT * FROM {} WHERE {} IN ({})",
            table.sql(),
            quote(UID_COLUMN),
            placeholders(params.len())
        ),
        params,
    )))
}

/// `SELECT * FROM table`
pub fn select_all(table: &TableName) -> Statement {
    Statement::new(format!("SELECT * FROM {}", table.sql()), Vec::new())
}

/// Multi-row `INSERT ... ON DUPLICATE KEY UPDATE`.
///
/// Existing rows keep their `CreationDate`. Large batches are split so no
/// statement exceeds [`MAX_PLACEHOLDERS`]. Returns no statements for an empty
/// batch.
pub fn upsert<E: Entity>(table: &TableName, entities: &[E]) -> BuildResult<Vec<Statement>> {
    check_columns::<E>()?;
    ensure_unique_uids(entities)?;

    let columns = E::columns();
    let column_list = columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ");
    let row = format!("({})", placeholders(columns.len()));

    let mut assignments = mutable_columns::<E>()
        .map(|c| format!("{0} = VALUES({0})", quote(c)))
        .collect::<Vec<_>>()
        .join(", ");
    if assignments.is_empty() {
        assignments = format!("{0} = {0}", quote(UID_COLUMN));
    }

    let rows_per_statement = (MAX_PLACEHOLDERS / columns.len()).max(1);
    let mut statements = Vec::new();

    for chunk in entities.chunks(rows_per_statement) {
        let mut params = Vec::with_capacity(chunk.len() * columns.len());
        for entity in chunk {
            params.extend(entity_values(entity)?);
        }
        let rows = vec![row.as_str(); chunk.len()].join(", ");
        statements.push(Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES {} ON DUPLICATE KEY UPDATE {}",
                table.sql(),
                column_list,
                rows,
                assignments
            ),
            params,
        ));
    }

    Ok(statements)
}

/// `UPDATE ... SET <mutable columns> WHERE UId = ?` for one entity
pub fn update<E: Entity>(table: &TableName, entity: &E) -> BuildResult<Statement> {
    check_columns::<E>()?;
    let values = entity_values(entity)?;

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    for (column, value) in E::columns().iter().zip(values) {
        if *column == UID_COLUMN || *column == CREATION_DATE_COLUMN {
            continue;
        }
        assignments.push(format!("{} = ?", quote(column)));
        params.push(value);
    }
    params.push(Value::from(entity.uid()));

    Ok(Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            table.sql(),
            assignments.join(", "),
            quote(UID_COLUMN)
        ),
        params,
    ))
}

/// One `UPDATE` per entity
pub fn update_many<E: Entity>(table: &TableName, entities: &[E]) -> BuildResult<Vec<Statement>> {
    ensure_unique_uids(entities)?;
    entities.iter().map(|entity| update(table, entity)).collect()
}

/// `DELETE ... WHERE UId = ?`
pub fn delete_by_uid(table: &TableName, uid: i32) -> Statement {
    Statement::new(
        format!("DELETE FROM {} WHERE {} = ?", table.sql(), quote(UID_COLUMN)),
        vec![Value::from(uid)],
    )
}

/// `SELECT * ... WHERE <predicate> [ORDER BY ...] [LIMIT ? OFFSET ?]`
pub fn select_where<E: Entity>(table: &TableName, query: &Query) -> BuildResult<Statement> {
    let mut sql = format!("SELECT * FROM {}", table.sql());
    let mut params = Vec::new();

    if !matches!(&query.predicate, Predicate::And(items) if items.is_empty()) {
        let clause = compile_predicate::<E>(&query.predicate, &mut params)?;
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }

    if let Some((field, direction)) = &query.order_by {
        let column = resolve_column::<E>(field)?;
        sql.push_str(&format!(" ORDER BY {} {}", quote(column), direction.as_sql()));
    }

    if let Some(pagination) = query.pagination {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(i64::try_from(pagination.limit).unwrap_or(i64::MAX)));
        params.push(Value::Integer(i64::try_from(pagination.offset).unwrap_or(i64::MAX)));
    }

    if params.len() > MAX_PLACEHOLDERS {
        return Err(InvalidStatement(format!(
            "query binds {} values, above the {} placeholder limit",
            params.len(),
            MAX_PLACEHOLDERS
        )));
    }

    Ok(Statement::new(sql, params))
}

fn resolve_column<E: Entity>(field: &str) -> BuildResult<&'static str> {
    column_for::<E>(field).ok_or_else(|| {
        InvalidStatement(format!("{} has no column named '{}'", E::ENTITY_NAME, field))
    })
}

fn compile_predicate<E: Entity>(predicate: &Predicate, params: &mut Vec<Value>) -> BuildResult<String> {
    match predicate {
        Predicate::Condition(condition) => compile_condition::<E>(condition, params),
        Predicate::And(items) if items.is_empty() => Ok("1 = 1".to_string()),
        Predicate::Or(items) if items.is_empty() => Ok("1 = 0".to_string()),
        Predicate::And(items) => compile_group::<E>(items, " AND ", params),
        Predicate::Or(items) => compile_group::<E>(items, " OR ", params),
        Predicate::Not(inner) => Ok(format!("NOT ({})", compile_predicate::<E>(inner, params)?)),
    }
}

fn compile_group<E: Entity>(
    items: &[Predicate],
    separator: &str,
    params: &mut Vec<Value>,
) -> BuildResult<String> {
    let parts = items
        .iter()
        .map(|item| compile_predicate::<E>(item, params))
        .collect::<BuildResult<Vec<_>>>()?;
    Ok(format!("({})", parts.join(separator)))
}

fn compile_condition<E: Entity>(
    condition: &FilterCondition,
    params: &mut Vec<Value>,
) -> BuildResult<String> {
    let column = quote(resolve_column::<E>(&condition.field)?);
    let value = &condition.value;

    match condition.operator {
        FilterOperator::IsNull => Ok(format!("{} IS NULL", column)),
        FilterOperator::IsNotNull => Ok(format!("{} IS NOT NULL", column)),
        // `= NULL` never matches in SQL, so compare with IS [NOT] NULL
        FilterOperator::Equal if *value == Value::Null => Ok(format!("{} IS NULL", column)),
        FilterOperator::NotEqual if *value == Value::Null => Ok(format!("{} IS NOT NULL", column)),
        FilterOperator::In => {
            let scalars = value.clone().into_scalars();
            if scalars.iter().any(|v| *v == Value::Null) {
                return Err(InvalidStatement(format!(
                    "IN list for '{}' contains NULL",
                    condition.field
                )));
            }
            if scalars.is_empty() {
                return Ok("1 = 0".to_string());
            }
            let marks = placeholders(scalars.len());
            params.extend(scalars);
            Ok(format!("{} IN ({})", column, marks))
        }
        FilterOperator::Like if !matches!(value, Value::String(_)) => Err(InvalidStatement(
            format!("LIKE on '{}' needs a string pattern", condition.field),
        )),
        operator => match value {
            Value::Null | Value::StringList(_) | Value::IntegerList(_) => {
                Err(InvalidStatement(format!(
                    "operator {} on '{}' needs a single non-null value",
                    operator, condition.field
                )))
            }
            scalar => {
                params.push(scalar.clone());
                Ok(format!("{} {} ?", column, operator))
            }
        },
    }
}

fn ensure_unique_uids<E: Entity>(entities: &[E]) -> BuildResult<()> {
    let mut seen = HashSet::with_capacity(entities.len());
    for entity in entities {
        if !seen.insert(entity.uid()) {
            return Err(InvalidStatement(format!(
                "UId {} appears more than once in the batch",
                entity.uid()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Doctor;
    use crate::repository::query::{OrderDirection, Pagination};

    fn table() -> TableName {
        TableName::new("clinic", "DoctorTable").unwrap()
    }

    #[test]
    fn test_select_by_uid() {
        let stmt = select_by_uid(&table(), 5);
        assert_eq!(stmt.sql, "SELECT * FROM `clinic`.`DoctorTable` WHERE `UId` = ?");
        assert_eq!(stmt.params, vec![Value::Integer(5)]);
    }

    #[test]
    fn test_select_by_uids_expands_placeholders() {
        let stmt = select_by_uids(&table(), &[1, 2, 999]).unwrap().unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM `clinic`.`DoctorTable` WHERE `UId` IN (?, ?, ?)"
        );
        assert_eq!(
            stmt.params,
            vec![Value::Integer(1), Value::Integer(2), Value::Integer(999)]
        );
    }

    #[test]
    fn test_select_by_uids_dedupes_and_skips_empty() {
        let stmt = select_by_uids(&table(), &[3, 3, 4]).unwrap().unwrap();
        assert_eq!(stmt.params.len(), 2);

        assert!(select_by_uids(&table(), &[]).unwrap().is_none());
    }

    #[test]
    fn test_select_all() {
        assert_eq!(
            select_all(&table()).sql,
            "SELECT * FROM `clinic`.`DoctorTable`"
        );
    }

    #[test]
    fn test_upsert_single() {
        let doctor = Doctor::new(5, "Ben Aissa");
        let statements = upsert(&table(), std::slice::from_ref(&doctor)).unwrap();

        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0].sql,
            "INSERT INTO `clinic`.`DoctorTable` (`UId`, `Name`, `CreationDate`, `ModificationDate`) \
             VALUES (?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE `Name` = VALUES(`Name`), `ModificationDate` = VALUES(`ModificationDate`)"
        );
        assert_eq!(statements[0].params, doctor.values());
    }

    #[test]
    fn test_upsert_batch_uses_one_statement() {
        let doctors = vec![Doctor::new(1, "A"), Doctor::new(2, "B")];
        let statements = upsert(&table(), &doctors).unwrap();

        assert_eq!(statements.len(), 1);
        assert!(statements[0].sql.contains("VALUES (?, ?, ?, ?), (?, ?, ?, ?) ON"));
        assert_eq!(statements[0].params.len(), 8);
    }

    #[test]
    fn test_upsert_splits_oversized_batches() {
        let per_statement = MAX_PLACEHOLDERS / Doctor::columns().len();
        let doctors: Vec<Doctor> = (0..=per_statement as i32)
            .map(|uid| Doctor::new(uid, "x"))
            .collect();

        let statements = upsert(&table(), &doctors).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1].params.len(), Doctor::columns().len());
    }

    #[test]
    fn test_upsert_empty_batch_yields_nothing() {
        assert!(upsert::<Doctor>(&table(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_uids_rejected() {
        let doctors = vec![Doctor::new(1, "A"), Doctor::new(1, "B")];
        let err = upsert(&table(), &doctors).unwrap_err();
        assert!(err.0.contains("UId 1"));

        assert!(update_many(&table(), &doctors).is_err());
    }

    #[test]
    fn test_update_skips_key_and_creation_date() {
        let doctor = Doctor::new(5, "Ben Aissa");
        let stmt = update(&table(), &doctor).unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE `clinic`.`DoctorTable` SET `Name` = ?, `ModificationDate` = ? WHERE `UId` = ?"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::String("Ben Aissa".to_string()),
                Value::Timestamp(doctor.modification_date),
                Value::Integer(5),
            ]
        );
    }

    #[test]
    fn test_delete_by_uid() {
        let stmt = delete_by_uid(&table(), 7);
        assert_eq!(stmt.sql, "DELETE FROM `clinic`.`DoctorTable` WHERE `UId` = ?");
        assert_eq!(stmt.params, vec![Value::Integer(7)]);
    }

    #[test]
    fn test_find_by_name() {
        let query = Query::filter(FilterCondition::eq("Name", "Ben Aissa"));
        let stmt = select_where::<Doctor>(&table(), &query).unwrap();

        assert_eq!(
            stmt.sql,
            "SELECT * FROM `clinic`.`DoctorTable` WHERE `Name` = ?"
        );
        assert_eq!(stmt.params, vec![Value::String("Ben Aissa".to_string())]);
    }

    #[test]
    fn test_find_composite_predicate() {
        let query = Query::filter(
            Predicate::from(FilterCondition::gte("uid", 10))
                .and(FilterCondition::like("Name", "Ben%").or(FilterCondition::is_null("Name")))
                .and(Predicate::from(FilterCondition::in_integers("UId", vec![10, 11])).not()),
        )
        .order_by("ModificationDate", OrderDirection::Descending)
        .paginate(Pagination::page(2, 10));

        let stmt = select_where::<Doctor>(&table(), &query).unwrap();

        assert_eq!(
            stmt.sql,
            "SELECT * FROM `clinic`.`DoctorTable` WHERE \
             (`UId` >= ? AND (`Name` LIKE ? OR `Name` IS NULL) AND NOT (`UId` IN (?, ?))) \
             ORDER BY `ModificationDate` DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::Integer(10),
                Value::String("Ben%".to_string()),
                Value::Integer(10),
                Value::Integer(11),
                Value::Integer(10),
                Value::Integer(10),
            ]
        );
    }

    #[test]
    fn test_find_all_has_no_where_clause() {
        let stmt = select_where::<Doctor>(&table(), &Query::all()).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `clinic`.`DoctorTable`");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_find_unknown_column_rejected() {
        let query = Query::filter(FilterCondition::eq("Name`; DROP TABLE x; --", "a"));
        let err = select_where::<Doctor>(&table(), &query).unwrap_err();
        assert!(err.0.contains("no column named"));

        let query = Query::all().order_by("Specialty", OrderDirection::Ascending);
        assert!(select_where::<Doctor>(&table(), &query).is_err());
    }

    #[test]
    fn test_find_null_comparisons() {
        let query = Query::filter(FilterCondition::eq("Name", Value::Null));
        let stmt = select_where::<Doctor>(&table(), &query).unwrap();
        assert!(stmt.sql.ends_with("WHERE `Name` IS NULL"));
        assert!(stmt.params.is_empty());

        let query = Query::filter(FilterCondition::gt("UId", Value::Null));
        assert!(select_where::<Doctor>(&table(), &query).is_err());
    }

    #[test]
    fn test_find_empty_in_list_matches_nothing() {
        let query = Query::filter(FilterCondition::in_integers("UId", Vec::new()));
        let stmt = select_where::<Doctor>(&table(), &query).unwrap();
        assert!(stmt.sql.ends_with("WHERE 1 = 0"));
    }

    #[test]
    fn test_find_empty_or_matches_nothing() {
        let stmt = select_where::<Doctor>(&table(), &Query::filter(Predicate::Or(Vec::new()))).unwrap();
        assert!(stmt.sql.ends_with("WHERE 1 = 0"));
    }

    #[test]
    fn test_like_needs_string() {
        let query = Query::filter(FilterCondition::new(
            "Name",
            FilterOperator::Like,
            Value::Integer(3),
        ));
        assert!(select_where::<Doctor>(&table(), &query).is_err());
    }
}
