//! Script generation.
//!
//! The inverse of [`crate::parser`]: renders domains, tables and procedures
//! as canonical DDL and writes them to the `domains/`, `tables/`,
//! `procedures/` layout, one `<NAME>.sql` file per object.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::classifier::ScriptKind;
use crate::error::{ReconcileError, Result};
use crate::schema::{Column, Domain, Procedure, SchemaSnapshot, Table};

/// Renders `CREATE DOMAIN <name> AS <type> [DEFAULT <expr>] [NOT NULL];`.
#[must_use]
pub fn generate_domain_script(domain: &Domain) -> String {
    let mut sql = format!("CREATE DOMAIN {} AS {}", domain.name, domain.data_type);
    push_modifiers(&mut sql, domain.nullable, domain.default.as_deref());
    sql.push(';');
    sql
}

/// Renders a `CREATE TABLE` statement with one column per line.
///
/// Fails if the table has no columns.
pub fn generate_table_script(table: &Table) -> Result<String> {
    if table.columns.is_empty() {
        return Err(ReconcileError::InvalidArgument(format!(
            "table {} has no columns",
            table.name
        )));
    }

    let definitions: Vec<String> = table
        .ordered_columns()
        .into_iter()
        .map(|c| format!("    {}", column_definition(c)))
        .collect();

    Ok(format!(
        "CREATE TABLE {} (\n{}\n);",
        table.name,
        definitions.join(",\n")
    ))
}

/// Renders `CREATE PROCEDURE <name>` followed by the procedure source.
///
/// A terminating `;` is added on its own line unless the source already
/// ends with one. Fails if the source is blank.
pub fn generate_procedure_script(procedure: &Procedure) -> Result<String> {
    if procedure.source_code.trim().is_empty() {
        return Err(ReconcileError::InvalidArgument(format!(
            "procedure {} has no source code",
            procedure.name
        )));
    }

    let mut sql = format!("CREATE PROCEDURE {}\n{}", procedure.name, procedure.source_code);
    if !procedure.source_code.trim_end().ends_with(';') {
        sql.push_str("\n;");
    }
    Ok(sql)
}

/// Renders `<name> <domain-or-type> [DEFAULT <expr>] [NOT NULL]`.
#[must_use]
pub fn column_definition(column: &Column) -> String {
    let mut sql = format!("{} {}", column.name, column.column_type);
    push_modifiers(&mut sql, column.nullable, column.default.as_deref());
    sql
}

fn push_modifiers(sql: &mut String, nullable: bool, default: Option<&str>) {
    if let Some(expr) = default.map(str::trim).filter(|d| !d.is_empty()) {
        sql.push_str(" DEFAULT ");
        sql.push_str(expr);
    }
    if !nullable {
        sql.push_str(" NOT NULL");
    }
}

/// Writes every object of `snapshot` under `output_dir`.
///
/// Sub-directories are only created for non-empty categories. Returns the
/// number of files written.
pub fn save_to_files(output_dir: &Path, snapshot: &SchemaSnapshot) -> Result<usize> {
    if output_dir.as_os_str().is_empty() {
        return Err(ReconcileError::InvalidArgument(
            "output directory must not be empty".to_string(),
        ));
    }

    fs::create_dir_all(output_dir)?;

    let mut total = 0;

    let domains: Vec<(String, String)> = snapshot
        .domains
        .iter()
        .map(|d| (d.name.to_string(), generate_domain_script(d)))
        .collect();
    total += write_category(output_dir, ScriptKind::Domain, &domains)?;

    let tables = snapshot
        .tables
        .iter()
        .map(|t| -> Result<(String, String)> {
            Ok((t.name.to_string(), generate_table_script(t)?))
        })
        .collect::<Result<Vec<_>>>()?;
    total += write_category(output_dir, ScriptKind::Table, &tables)?;

    let procedures = snapshot
        .procedures
        .iter()
        .map(|p| -> Result<(String, String)> {
            Ok((p.name.to_string(), generate_procedure_script(p)?))
        })
        .collect::<Result<Vec<_>>>()?;
    total += write_category(output_dir, ScriptKind::Procedure, &procedures)?;

    info!(files = total, dir = %output_dir.display(), "Saved definition scripts");
    Ok(total)
}

fn write_category(output_dir: &Path, kind: ScriptKind, scripts: &[(String, String)]) -> Result<usize> {
    let Some(subdir) = kind.directory() else {
        return Ok(0);
    };
    if scripts.is_empty() {
        return Ok(0);
    }

    let dir = output_dir.join(subdir);
    fs::create_dir_all(&dir)?;

    for (name, script) in scripts {
        let path = dir.join(format!("{name}.sql"));
        debug!(path = %path.display(), "Writing script");
        fs::write(&path, script)?;
    }

    info!(kind = %kind, count = scripts.len(), dir = %dir.display(), "Saved scripts");
    Ok(scripts.len())
}
