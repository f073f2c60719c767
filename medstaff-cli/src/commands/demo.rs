use anyhow::Result;
use serde_json::json;
use std::path::Path;

use medstaff_store::prelude::*;

use super::{open_storages, print_json};

pub const DEMO_UID: i32 = 5;
pub const DEMO_NAME: &str = "BEN AISSA";

/// Upsert the demo doctor, then look it up by name
pub async fn execute(config_path: Option<&Path>) -> Result<()> {
    let storages = open_storages(config_path)?;
    let doctors = &storages.doctors;

    doctors.set(&Doctor::new(DEMO_UID, DEMO_NAME)).await?;
    let found = doctors.find(&demo_query()).await?;

    print_json(&json!({
        "table": doctors.table().qualified(),
        "upserted": DEMO_UID,
        "found": found,
    }))
}

fn demo_query() -> Query {
    Query::filter(FilterCondition::eq("Name", DEMO_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_query_matches_demo_name() {
        let query = demo_query();
        assert_eq!(
            query.predicate,
            Predicate::Condition(FilterCondition::eq("Name", "BEN AISSA"))
        );
        assert!(query.order_by.is_none());
    }
}
