//! Declarative schema reconciliation for SQL databases.
//!
//! `oxide-reconcile` keeps a live database schema in line with a directory of
//! SQL definition files:
//! - Domains, tables and procedures are declared as plain `CREATE` scripts
//! - Differences are computed attribute by attribute and applied as `ALTER`
//!   statements; nothing is ever dropped
//! - A live schema can be exported back into the same file layout
//!
//! # Layout
//!
//! ```text
//! definitions/
//!   domains/D_ID.sql       CREATE DOMAIN D_ID AS INTEGER NOT NULL;
//!   tables/USERS.sql       CREATE TABLE USERS (ID D_ID, NAME VARCHAR(100));
//!   procedures/P.sql       CREATE PROCEDURE P ...
//! ```
//!
//! A flat directory of `*.sql` files works too; each file is then classified
//! by the statement it contains.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! use oxide_reconcile::prelude::*;
//!
//! let report = oxide_reconcile::reconcile(
//!     "postgres://localhost/app",
//!     Path::new("definitions"),
//!     ReconcileOptions::new().dry_run(true),
//! )
//! .await?;
//!
//! for statement in &report.statements {
//!     println!("{statement}");
//! }
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Create a database from scratch
//! oxide-reconcile build --database postgres://localhost/app --scripts-dir definitions
//!
//! # Bring an existing database up to date
//! oxide-reconcile reconcile --database postgres://localhost/app --scripts-dir definitions
//!
//! # Write the live schema to disk
//! oxide-reconcile export --database postgres://localhost/app --output-dir definitions
//! ```

use std::path::Path;

pub mod builder;
pub mod classifier;
pub mod comparer;
pub mod error;
pub mod executor;
pub mod exporter;
pub mod generator;
pub mod metadata;
pub mod parser;
pub mod postgres;
pub mod reconciler;
pub mod repository;
pub mod schema;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::{BuildReport, DatabaseBuilder};
    pub use crate::classifier::{classify, ScriptKind};
    pub use crate::comparer::{
        compare_domains, compare_tables, AttributeChange, DomainChanges, TableChanges,
    };
    pub use crate::error::{ReconcileError, Result};
    pub use crate::executor::{DatabaseProvisioner, StatementExecutor};
    pub use crate::exporter::{ExportReport, ScriptExporter};
    pub use crate::generator::{
        generate_domain_script, generate_procedure_script, generate_table_script, save_to_files,
    };
    pub use crate::metadata::MetadataSource;
    pub use crate::parser::{parse_domain, parse_table};
    pub use crate::postgres::{PgExecutor, PgMetadataSource, PgProvisioner};
    pub use crate::reconciler::{ChangeSet, ReconcileOptions, ReconcileReport, SchemaReconciler};
    pub use crate::repository::{
        FsScriptRepository, LoadedScripts, ScriptLayout, ScriptRepository, ScriptSet,
    };
    pub use crate::schema::{
        Column, ColumnType, Domain, ObjectName, Procedure, SchemaSnapshot, Table,
    };
}

use crate::builder::{BuildReport, DatabaseBuilder};
use crate::error::{ReconcileError, Result};
use crate::exporter::{ExportReport, ScriptExporter};
use crate::postgres::{connect_lazy, PgExecutor, PgMetadataSource, PgProvisioner};
use crate::reconciler::{ReconcileOptions, ReconcileReport, SchemaReconciler};
use crate::repository::FsScriptRepository;

/// Creates a new database at `target` and runs every script under
/// `definitions_root` against it.
pub async fn build(target: &str, definitions_root: &Path) -> Result<BuildReport> {
    require_target(target)?;
    let executor = PgExecutor::new(connect_lazy(target)?);
    DatabaseBuilder::new(PgProvisioner::new(), executor, FsScriptRepository::new())
        .build(target, definitions_root)
        .await
}

/// Brings the database at `target` in line with `definitions_root`.
pub async fn reconcile(
    target: &str,
    definitions_root: &Path,
    options: ReconcileOptions,
) -> Result<ReconcileReport> {
    require_target(target)?;
    let pool = connect_lazy(target)?;
    SchemaReconciler::new(
        PgMetadataSource::new(pool.clone()),
        PgExecutor::new(pool),
        FsScriptRepository::new(),
    )
    .options(options)
    .reconcile(definitions_root)
    .await
}

/// Writes the schema of the database at `target` under `output_root`.
pub async fn export(target: &str, output_root: &Path) -> Result<ExportReport> {
    require_target(target)?;
    ScriptExporter::new(PgMetadataSource::new(connect_lazy(target)?))
        .export(output_root)
        .await
}

fn require_target(target: &str) -> Result<()> {
    if target.trim().is_empty() {
        return Err(ReconcileError::InvalidArgument(
            "database URL must not be empty".to_string(),
        ));
    }
    Ok(())
}
