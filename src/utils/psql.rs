// dbrestoretool/src/utils/psql.rs
use crate::container::ContainerRuntime;
use crate::errors::Result;
use crate::utils::argv;

/// Command line that runs one SQL statement against `db` as the postgres
/// superuser, printing unaligned, header-less rows (`a|b|c`).
pub fn psql_command(db: &str, sql: &str) -> Vec<String> {
    let mut command = argv(["sudo", "-u", "postgres", "psql"]);
    command.push(db.to_string());
    command.extend(argv(["--tuples-only", "--no-align", "-c"]));
    command.push(sql.to_string());
    command
}

/// Executes `sql` inside the database container and returns the non-empty
/// output lines, one per row.
pub async fn run_psql_in_container(
    runtime: &dyn ContainerRuntime,
    container: &str,
    db: &str,
    sql: &str,
) -> Result<Vec<String>> {
    let output = runtime
        .run_in_container(container, &psql_command(db, sql))
        .await?;
    Ok(output
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
