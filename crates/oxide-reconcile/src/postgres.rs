//! PostgreSQL collaborators.
//!
//! Schema objects are read from the system catalogs of `current_schema()`.
//! Catalog spellings are mapped onto the upper-case type names the parser
//! uses, so an unchanged definition set compares equal to what it created.

use std::sync::LazyLock;

use regex::Regex;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use tracing::{debug, info};

use crate::error::{ReconcileError, Result};
use crate::executor::{split_statements, DatabaseProvisioner, StatementExecutor};
use crate::metadata::MetadataSource;
use crate::schema::{Column, ColumnType, Domain, Procedure, Table};

const DOMAINS_SQL: &str = r"
SELECT t.typname::text, format_type(t.typbasetype, t.typtypmod), t.typnotnull, t.typdefault
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE t.typtype = 'd' AND n.nspname = current_schema()
ORDER BY t.typname
";

const COLUMNS_SQL: &str = r"
SELECT c.relname::text,
       a.attname::text,
       CASE WHEN ty.typtype = 'd' THEN ty.typname::text END,
       format_type(a.atttypid, a.atttypmod),
       a.attnotnull,
       pg_get_expr(d.adbin, d.adrelid)
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid
JOIN pg_catalog.pg_type ty ON ty.oid = a.atttypid
LEFT JOIN pg_catalog.pg_attrdef d ON d.adrelid = c.oid AND d.adnum = a.attnum
WHERE c.relkind = 'r'
  AND n.nspname = current_schema()
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY c.relname, a.attnum
";

const PROCEDURES_SQL: &str = r"
SELECT p.proname::text,
       pg_get_function_arguments(p.oid),
       l.lanname::text,
       p.prosrc,
       obj_description(p.oid, 'pg_proc')
FROM pg_catalog.pg_proc p
JOIN pg_catalog.pg_namespace n ON n.oid = p.pronamespace
JOIN pg_catalog.pg_language l ON l.oid = p.prolang
WHERE p.prokind = 'p' AND n.nspname = current_schema()
ORDER BY p.proname
";

/// (table, column, domain, type, not null, default)
type ColumnRow = (String, String, Option<String>, String, bool, Option<String>);

/// Opens a lazily connecting single-connection pool.
///
/// No connection is made until the first query, so a pool can be created
/// for a database that does not exist yet.
pub fn connect_lazy(url: &str) -> Result<PgPool> {
    Ok(PgPoolOptions::new().max_connections(1).connect_lazy(url)?)
}

/// Reads domains, tables and procedures from the PostgreSQL catalogs.
pub struct PgMetadataSource {
    pool: PgPool,
}

impl PgMetadataSource {
    /// Creates a metadata source over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl MetadataSource for PgMetadataSource {
    async fn extract_domains(&self) -> Result<Vec<Domain>> {
        let rows: Vec<(String, String, bool, Option<String>)> =
            sqlx::query_as(DOMAINS_SQL).fetch_all(&self.pool).await?;

        let domains: Vec<Domain> = rows
            .into_iter()
            .map(|(name, data_type, not_null, default)| {
                let mut domain = Domain::new(name.to_uppercase(), canonical_type(&data_type));
                domain.nullable = !not_null;
                domain.default = default.map(|d| strip_default_cast(&d));
                domain
            })
            .collect();

        debug!(count = domains.len(), "Extracted domains");
        Ok(domains)
    }

    async fn extract_tables(&self) -> Result<Vec<Table>> {
        let rows: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL).fetch_all(&self.pool).await?;
        let tables = group_columns(rows);
        debug!(count = tables.len(), "Extracted tables");
        Ok(tables)
    }

    async fn extract_procedures(&self) -> Result<Vec<Procedure>> {
        let rows: Vec<(String, String, String, String, Option<String>)> =
            sqlx::query_as(PROCEDURES_SQL).fetch_all(&self.pool).await?;

        let procedures: Vec<Procedure> = rows
            .into_iter()
            .map(|(name, arguments, language, body, description)| {
                let mut procedure = Procedure::new(
                    name.to_uppercase(),
                    procedure_source(&arguments, &language, &body),
                );
                procedure.description = description;
                procedure
            })
            .collect();

        debug!(count = procedures.len(), "Extracted procedures");
        Ok(procedures)
    }
}

/// Builds tables from catalog rows ordered by table then column number.
fn group_columns(rows: Vec<ColumnRow>) -> Vec<Table> {
    let mut tables: Vec<Table> = Vec::new();

    for (table_name, column_name, domain, data_type, not_null, default) in rows {
        let starts_new = tables
            .last()
            .map_or(true, |t| !t.name.as_str().eq_ignore_ascii_case(&table_name));
        if starts_new {
            tables.push(Table::new(table_name.to_uppercase()));
        }
        let Some(table) = tables.last_mut() else {
            continue;
        };

        let column_type = match domain {
            Some(domain) => ColumnType::Domain(domain.to_uppercase().into()),
            None => ColumnType::Data(canonical_type(&data_type)),
        };
        let mut column = Column::new(column_name.to_uppercase(), column_type).at(table.columns.len());
        column.nullable = !not_null;
        column.default = default.map(|d| strip_default_cast(&d));
        table.columns.push(column);
    }

    tables
}

/// Rebuilds the procedure text that follows `CREATE PROCEDURE <name>`.
fn procedure_source(arguments: &str, language: &str, body: &str) -> String {
    let quote = if body.contains("$$") { "$body$" } else { "$$" };
    format!("({arguments}) LANGUAGE {language} AS {quote}{body}{quote}")
}

/// Maps a `format_type` spelling onto the parser's type names.
///
/// `character varying(100)` becomes `VARCHAR(100)`,
/// `timestamp(3) without time zone` becomes `TIMESTAMP(3)` and
/// `timestamp(3) with time zone` becomes `TIMESTAMP(3) WITH TIME ZONE`. Array
/// types keep a single `[]`. Unknown types are upper-cased as-is.
#[must_use]
pub fn canonical_type(catalog_type: &str) -> String {
    let mut text = catalog_type.trim().to_lowercase();
    let mut array = "";
    while let Some(element) = text.strip_suffix("[]") {
        text = element.trim_end().to_string();
        array = "[]";
    }

    let (name, params) = match (text.find('('), text.find(')')) {
        (Some(open), Some(close)) if open < close => {
            let name = format!("{} {}", text[..open].trim(), text[close + 1..].trim());
            (name.trim().to_string(), text[open..=close].replace(' ', ""))
        }
        _ => (text, String::new()),
    };

    let (base, suffix) = match name.as_str() {
        "character varying" => ("VARCHAR".to_string(), ""),
        "character" | "bpchar" => ("CHAR".to_string(), ""),
        "timestamp without time zone" => ("TIMESTAMP".to_string(), ""),
        "time without time zone" => ("TIME".to_string(), ""),
        "timestamp with time zone" => ("TIMESTAMP".to_string(), " WITH TIME ZONE"),
        "time with time zone" => ("TIME".to_string(), " WITH TIME ZONE"),
        other => (other.to_uppercase(), ""),
    };

    format!("{base}{params}{suffix}{array}")
}

static LITERAL_CAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^('(?:[^']|'')*')::([a-z ]+)$").expect("valid literal cast regex")
});

const NUMERIC_TYPES: &[&str] = &["integer", "bigint", "smallint", "numeric", "real", "double precision"];

/// Removes the cast the catalog attaches to literal defaults.
///
/// `'A'::bpchar` becomes `'A'`; a quoted number cast to a numeric type loses
/// its quotes too. Anything else is returned trimmed.
#[must_use]
pub fn strip_default_cast(expr: &str) -> String {
    let expr = expr.trim();
    let Some(caps) = LITERAL_CAST_RE.captures(expr) else {
        return expr.to_string();
    };

    let literal = &caps[1];
    let inner = &literal[1..literal.len() - 1];
    if NUMERIC_TYPES.contains(&caps[2].trim()) && inner.parse::<f64>().is_ok() {
        inner.to_string()
    } else {
        literal.to_string()
    }
}

/// Runs each statement of a batch in its own transaction.
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Creates an executor over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl StatementExecutor for PgExecutor {
    async fn execute(&self, batch: &str) -> Result<u64> {
        let mut affected = 0;
        for statement in split_statements(batch) {
            debug!(sql = %statement, "Executing SQL");
            let mut tx = self.pool.begin().await?;
            let result = sqlx::query(&statement).execute(&mut *tx).await?;
            tx.commit().await?;
            affected += result.rows_affected();
        }
        Ok(affected)
    }
}

/// Creates databases through the `postgres` maintenance database.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgProvisioner;

impl PgProvisioner {
    /// Creates a new provisioner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DatabaseProvisioner for PgProvisioner {
    async fn create_empty(&self, location: &str) -> Result<()> {
        let options: PgConnectOptions = location.parse()?;
        let database = options
            .get_database()
            .map(str::to_string)
            .ok_or_else(|| {
                ReconcileError::InvalidArgument("database URL has no database name".to_string())
            })?;

        let mut conn = PgConnection::connect_with(&options.clone().database("postgres")).await?;

        let existing: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM pg_database WHERE datname = $1")
            .bind(&database)
            .fetch_optional(&mut conn)
            .await?;
        if existing.is_some() {
            conn.close().await?;
            return Err(ReconcileError::InvalidArgument(format!(
                "database {database} already exists"
            )));
        }

        sqlx::query(&format!("CREATE DATABASE {}", quote_identifier(&database)))
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        info!(database = %database, "Created database");
        Ok(())
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
