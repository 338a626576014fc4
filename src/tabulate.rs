use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::{
    artifact_store::ensure_parent_dir,
    error::{PipelineError, Result},
    flatten::flatten_operation_fields,
    models::{Operation, TableDefinition},
};

pub fn table_name_for(operation_id: &str) -> String {
    operation_id.replace('-', "_")
}

/// One `TEXT` column per flattened field; `None` when the operation has no fields.
pub fn table_definition(operation: &Operation) -> Option<TableDefinition> {
    let fields = flatten_operation_fields(operation);
    if fields.is_empty() {
        return None;
    }
    Some(TableDefinition {
        table_name: table_name_for(&operation.operation_id),
        columns: fields.into_iter().map(|field| field.name).collect(),
    })
}

pub fn create_table_statement(table: &TableDefinition) -> String {
    let columns = table
        .columns
        .iter()
        .map(|column| format!("{} TEXT", quote_ident(column)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({columns})",
        quote_ident(&table.table_name)
    )
}

/// Applies one table per operation with fields. Existing tables are left untouched,
/// so columns from an earlier, differently-shaped run survive.
///
/// Each statement commits on its own: tables created before a failing one stay.
pub fn create_tables(operations: &[Operation], database_path: &Path) -> Result<Vec<TableDefinition>> {
    ensure_parent_dir(database_path)?;
    let conn = Connection::open(database_path).map_err(|err| {
        PipelineError::store(format!("opening {}", database_path.display()), err)
    })?;

    let mut created = Vec::new();
    for operation in operations {
        let Some(table) = table_definition(operation) else {
            continue;
        };
        conn.execute(&create_table_statement(&table), [])
            .map_err(|err| PipelineError::store(format!("creating table {}", table.table_name), err))?;
        info!(
            operation_id = %operation.operation_id,
            table = %table.table_name,
            columns = table.columns.len(),
            "Table ensured"
        );
        created.push(table);
    }

    Ok(created)
}

/// User tables in the store, sorted by name. A missing store has no tables.
pub fn list_tables(database_path: &Path) -> Result<Vec<String>> {
    let Some(conn) = open_read_only(database_path)? else {
        return Ok(Vec::new());
    };
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .map_err(|err| PipelineError::store("listing tables", err))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|err| PipelineError::store("listing tables", err))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|err| PipelineError::store("listing tables", err))
}

/// Column names of `table` in declaration order; empty if the table does not exist.
pub fn list_columns(database_path: &Path, table: &str) -> Result<Vec<String>> {
    let Some(conn) = open_read_only(database_path)? else {
        return Ok(Vec::new());
    };
    let mut stmt = conn
        .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
        .map_err(|err| PipelineError::store(format!("listing columns of {table}"), err))?;
    let rows = stmt
        .query_map([table], |row| row.get::<_, String>(0))
        .map_err(|err| PipelineError::store(format!("listing columns of {table}"), err))?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|err| PipelineError::store(format!("listing columns of {table}"), err))
}

fn open_read_only(database_path: &Path) -> Result<Option<Connection>> {
    if !database_path.exists() {
        return Ok(None);
    }
    Connection::open_with_flags(database_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map(Some)
        .map_err(|err| PipelineError::store(format!("opening {}", database_path.display()), err))
}

fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}
