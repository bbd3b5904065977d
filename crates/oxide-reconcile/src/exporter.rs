//! Schema export.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ReconcileError, Result};
use crate::generator::save_to_files;
use crate::metadata::MetadataSource;
use crate::schema::SchemaSnapshot;

/// Outcome of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Domains exported.
    pub domains: usize,
    /// Tables exported.
    pub tables: usize,
    /// Procedures exported.
    pub procedures: usize,
    /// Files written.
    pub files_written: usize,
    /// Root of the written layout.
    pub output_dir: PathBuf,
    /// Objects that could not be rendered.
    pub warnings: Vec<String>,
}

/// Writes the live schema out as definition scripts.
pub struct ScriptExporter<M> {
    metadata: M,
}

impl<M: MetadataSource> ScriptExporter<M> {
    /// Creates a new exporter.
    pub fn new(metadata: M) -> Self {
        Self { metadata }
    }

    /// Extracts the schema and saves it under `output_dir` using the
    /// `domains/`, `tables/`, `procedures/` layout.
    ///
    /// Nothing is written when the database holds no objects.
    pub async fn export(&self, output_dir: &Path) -> Result<ExportReport> {
        if output_dir.as_os_str().is_empty() {
            return Err(ReconcileError::InvalidArgument(
                "output directory must not be empty".to_string(),
            ));
        }

        let mut snapshot = self.metadata.snapshot().await?;
        let mut report = ExportReport {
            output_dir: output_dir.to_path_buf(),
            ..ExportReport::default()
        };

        if snapshot.is_empty() {
            warn!("No schema objects found, nothing to export");
            return Ok(report);
        }

        report.warnings = drop_unrenderable(&mut snapshot);
        report.domains = snapshot.domains.len();
        report.tables = snapshot.tables.len();
        report.procedures = snapshot.procedures.len();
        info!(
            domains = report.domains,
            tables = report.tables,
            procedures = report.procedures,
            "Exporting schema"
        );

        report.files_written = save_to_files(output_dir, &snapshot)?;
        Ok(report)
    }
}

/// Removes tables without columns and procedures without source.
fn drop_unrenderable(snapshot: &mut SchemaSnapshot) -> Vec<String> {
    let mut warnings = Vec::new();

    snapshot.tables.retain(|table| {
        let keep = !table.columns.is_empty();
        if !keep {
            warn!(table = %table.name, "Skipping table without columns");
            warnings.push(format!("table {} has no columns", table.name));
        }
        keep
    });

    snapshot.procedures.retain(|procedure| {
        let keep = !procedure.source_code.trim().is_empty();
        if !keep {
            warn!(procedure = %procedure.name, "Skipping procedure without source");
            warnings.push(format!("procedure {} has no source code", procedure.name));
        }
        keep
    });

    warnings
}
