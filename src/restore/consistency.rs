// dbrestoretool/src/restore/consistency.rs
use serde_json::{Value, json};
use tracing::info;

use crate::container::ContainerRuntime;
use crate::errors::{RestoreError, Result};
use crate::utils::psql::run_psql_in_container;

pub const ATTRIBUTES_QUERY: &str = "select id, generated from attributes;";

/// Parses one `id|generated` row and marks its payload as deployed.
fn mark_row_deployed(row: &str) -> Result<(i64, String)> {
    let (raw_id, raw_generated) = row.split_once('|').ok_or_else(|| {
        RestoreError::ConsistencyRepair(format!("Unexpected attributes row: {}", row))
    })?;
    let id: i64 = raw_id.trim().parse().map_err(|e| {
        RestoreError::ConsistencyRepair(format!("Invalid attributes id '{}': {}", raw_id, e))
    })?;

    let mut generated: Value = serde_json::from_str(raw_generated).map_err(|e| {
        RestoreError::ConsistencyRepair(format!("Malformed generated JSON for id {}: {}", id, e))
    })?;
    let payload = generated.as_object_mut().ok_or_else(|| {
        RestoreError::ConsistencyRepair(format!("generated for id {} is not a JSON object", id))
    })?;
    payload.insert("deployed_before".to_string(), json!({ "value": true }));

    Ok((id, serde_json::to_string(&generated)?))
}

/// Marks every attributes row as already deployed.
pub fn mark_rows_deployed(rows: &[String]) -> Result<Vec<(i64, String)>> {
    rows.iter().map(|row| mark_row_deployed(row)).collect()
}

/// Single batched update joining `attributes` against a literal value list.
/// `None` when there is nothing to update.
pub fn build_update_statement(values: &[(i64, String)]) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    let literals = values
        .iter()
        .map(|(id, generated)| format!("({}, '{}')", id, generated.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",");
    Some(format!(
        "update attributes as a set generated = b.generated \
         from (values {}) as b(id, generated) \
         where a.id = b.id;",
        literals
    ))
}

/// Flags every cluster's generated attributes with `deployed_before` so the
/// restored platform does not treat already-deployed environments as new.
pub async fn repair_database_consistency(
    runtime: &dyn ContainerRuntime,
    container: &str,
    db: &str,
) -> Result<()> {
    let as_repair_error = |e: RestoreError| match e {
        RestoreError::ConsistencyRepair(_) => e,
        other => RestoreError::ConsistencyRepair(other.to_string()),
    };

    let rows = run_psql_in_container(runtime, container, db, ATTRIBUTES_QUERY)
        .await
        .map_err(as_repair_error)?;
    let values = mark_rows_deployed(&rows).map_err(as_repair_error)?;

    match build_update_statement(&values) {
        Some(statement) => {
            run_psql_in_container(runtime, container, db, &statement)
                .await
                .map_err(as_repair_error)?;
            info!("Marked {} attributes rows of {} as deployed", values.len(), db);
        }
        None => info!("No attributes rows in {}; nothing to mark", db),
    }
    Ok(())
}
