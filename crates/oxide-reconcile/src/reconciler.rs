//! Schema reconciliation.
//!
//! Brings a live database in line with a definitions directory:
//!
//! 1. Load the definition scripts and parse domains and tables.
//! 2. Extract the existing schema.
//! 3. Compare both sides and build a [`ChangeSet`].
//! 4. Apply the change set one statement batch at a time.
//!
//! Creations reuse the definition script text, alterations are generated by
//! the comparer. Procedures are always re-applied as create-or-replace.
//! Nothing is ever dropped. A domain's base type cannot be altered in place,
//! so a differing domain type is reported as a warning and left as it is.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::comparer::{
    compare_domains, compare_tables, AttributeChange, DomainAlteration, TableAlteration,
};
use crate::error::Result;
use crate::executor::{execute_category, StatementExecutor};
use crate::metadata::MetadataSource;
use crate::parser::{parse_domain, parse_table, procedure_name};
use crate::repository::{ScriptFile, ScriptRepository, ScriptSet};
use crate::schema::{Domain, ObjectName, SchemaSnapshot, Table};

static CREATE_PROCEDURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCREATE\s+PROCEDURE\b").expect("valid procedure regex"));

static REPLACEABLE_PROCEDURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCREATE\s+OR\s+(?:REPLACE|ALTER)\s+PROCEDURE\b")
        .expect("valid replaceable procedure regex")
});

/// Options for a reconciliation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Compute and report the statements without submitting them.
    pub dry_run: bool,
}

impl ReconcileOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }
}

/// A parsed object together with the script that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct Declared<T> {
    /// The parsed object.
    pub object: T,
    /// The definition script.
    pub script: String,
}

/// The schema declared by a definitions directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredSchema {
    /// Parsed domains.
    pub domains: Vec<Declared<Domain>>,
    /// Parsed tables.
    pub tables: Vec<Declared<Table>>,
    /// Procedure scripts, already in create-or-replace form.
    pub procedures: Vec<Declared<ObjectName>>,
    /// Scripts that were left out, one message each.
    pub warnings: Vec<String>,
}

impl DesiredSchema {
    /// Parses every script of `scripts`.
    ///
    /// Scripts that fail to parse are logged and excluded. When two scripts
    /// declare the same name, the first one wins.
    #[must_use]
    pub fn parse(scripts: &ScriptSet) -> Self {
        let mut desired = Self {
            warnings: scripts.warnings.clone(),
            ..Self::default()
        };

        let mut seen = HashSet::new();
        for file in &scripts.domains {
            match parse_domain(&file.content) {
                Ok(domain) => {
                    if desired.accept(&mut seen, file, &domain.name) {
                        desired.domains.push(Declared {
                            object: domain,
                            script: file.content.clone(),
                        });
                    }
                }
                Err(e) => desired.skip(file, &e.to_string()),
            }
        }

        let mut seen = HashSet::new();
        for file in &scripts.tables {
            match parse_table(&file.content) {
                Ok(table) => {
                    if desired.accept(&mut seen, file, &table.name) {
                        desired.tables.push(Declared {
                            object: table,
                            script: file.content.clone(),
                        });
                    }
                }
                Err(e) => desired.skip(file, &e.to_string()),
            }
        }

        let mut seen = HashSet::new();
        for file in &scripts.procedures {
            let Some(name) = procedure_name(&file.content) else {
                desired.skip(file, "no procedure name found");
                continue;
            };
            if desired.accept(&mut seen, file, &name) {
                desired.procedures.push(Declared {
                    object: name,
                    script: create_or_replace(&file.content),
                });
            }
        }

        debug!(
            domains = desired.domains.len(),
            tables = desired.tables.len(),
            procedures = desired.procedures.len(),
            skipped = desired.warnings.len(),
            "Parsed definitions"
        );
        desired
    }

    fn accept(&mut self, seen: &mut HashSet<ObjectName>, file: &ScriptFile, name: &ObjectName) -> bool {
        if seen.insert(name.clone()) {
            return true;
        }
        warn!(name = %name, path = %file.path.display(), "Duplicate definition, keeping the first");
        self.warnings
            .push(format!("{}: duplicate definition of {name}", file.path.display()));
        false
    }

    fn skip(&mut self, file: &ScriptFile, reason: &str) {
        warn!(path = %file.path.display(), reason, "Skipping definition script");
        self.warnings.push(format!("{}: {reason}", file.path.display()));
    }

    fn domain_objects(&self) -> Vec<Domain> {
        self.domains.iter().map(|d| d.object.clone()).collect()
    }

    fn table_objects(&self) -> Vec<Table> {
        self.tables.iter().map(|t| t.object.clone()).collect()
    }
}

/// Rewrites a leading `CREATE PROCEDURE` as `CREATE OR REPLACE PROCEDURE`.
///
/// Scripts already in `CREATE OR REPLACE` or `CREATE OR ALTER` form are
/// returned unchanged.
#[must_use]
pub fn create_or_replace(script: &str) -> String {
    if REPLACEABLE_PROCEDURE_RE.is_match(script) {
        return script.to_string();
    }
    CREATE_PROCEDURE_RE
        .replace(script, "CREATE OR REPLACE PROCEDURE")
        .into_owned()
}

/// Statement batches to apply, grouped by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// `ALTER DOMAIN` statements.
    pub domain_alters: Vec<String>,
    /// Number of domains being altered.
    pub domains_altered: usize,
    /// Domain creation scripts.
    pub domain_creates: Vec<String>,
    /// Table creation scripts.
    pub table_creates: Vec<String>,
    /// Column additions, then column alterations, table by table.
    pub table_alters: Vec<String>,
    /// Number of tables being altered.
    pub tables_altered: usize,
    /// Procedure create-or-replace scripts.
    pub procedures: Vec<String>,
    /// Differences that are reported but not applied.
    pub warnings: Vec<String>,
}

impl ChangeSet {
    /// Computes the changes that turn `existing` into `desired`.
    #[must_use]
    pub fn plan(existing: &SchemaSnapshot, desired: &DesiredSchema) -> Self {
        let domains = compare_domains(&existing.domains, &desired.domain_objects());
        let tables = compare_tables(&existing.tables, &desired.table_objects());

        let mut warnings = Vec::new();
        let domain_alterations: Vec<DomainAlteration> = domains
            .to_alter
            .into_iter()
            .filter_map(|alteration| without_type_change(alteration, &mut warnings))
            .collect();

        Self {
            domain_alters: domain_alterations
                .iter()
                .flat_map(DomainAlteration::statements)
                .collect(),
            domains_altered: domain_alterations.len(),
            domain_creates: domains
                .to_create
                .iter()
                .filter_map(|d| script_for(&desired.domains, &d.name))
                .collect(),
            table_creates: tables
                .to_create
                .iter()
                .filter_map(|t| script_for(&desired.tables, &t.name))
                .collect(),
            table_alters: tables
                .to_alter
                .iter()
                .flat_map(TableAlteration::statements)
                .collect(),
            tables_altered: tables.to_alter.len(),
            procedures: desired.procedures.iter().map(|p| p.script.clone()).collect(),
            warnings,
        }
    }

    /// Phases in application order, with their category names.
    #[must_use]
    pub fn phases(&self) -> [(&'static str, &[String]); 5] {
        [
            ("domain alter", self.domain_alters.as_slice()),
            ("domain create", self.domain_creates.as_slice()),
            ("table create", self.table_creates.as_slice()),
            ("table alter", self.table_alters.as_slice()),
            ("procedure", self.procedures.as_slice()),
        ]
    }

    /// All batches in application order.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.phases()
            .into_iter()
            .flat_map(|(_, batches)| batches.iter().cloned())
            .collect()
    }

    /// Number of batches to apply.
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.phases().iter().map(|(_, batches)| batches.len()).sum()
    }

    /// Returns true if there is nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statement_count() == 0
    }
}

/// Removes a base type change from a domain alteration, recording it in
/// `warnings`. Returns `None` if nothing else is left to apply.
fn without_type_change(
    mut alteration: DomainAlteration,
    warnings: &mut Vec<String>,
) -> Option<DomainAlteration> {
    alteration.changes.retain(|change| match change {
        AttributeChange::Type(declared) => {
            warn!(domain = %alteration.name, declared = %declared, "Domain type differs, not altered");
            warnings.push(format!(
                "domain {}: declared type {declared} differs from the database and cannot be altered in place",
                alteration.name
            ));
            false
        }
        _ => true,
    });
    (!alteration.changes.is_empty()).then_some(alteration)
}

fn script_for<T>(declared: &[Declared<T>], name: &ObjectName) -> Option<String>
where
    T: HasName,
{
    declared
        .iter()
        .find(|d| d.object.name() == name)
        .map(|d| d.script.clone())
}

trait HasName {
    fn name(&self) -> &ObjectName;
}

impl HasName for Domain {
    fn name(&self) -> &ObjectName {
        &self.name
    }
}

impl HasName for Table {
    fn name(&self) -> &ObjectName {
        &self.name
    }
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Domains created.
    pub domains_created: usize,
    /// Domains altered.
    pub domains_altered: usize,
    /// Tables created.
    pub tables_created: usize,
    /// Tables altered.
    pub tables_altered: usize,
    /// Procedures created or replaced.
    pub procedures_replaced: usize,
    /// Batches applied, or planned in dry-run mode, in order.
    pub statements: Vec<String>,
    /// Whether the statements were only planned.
    pub dry_run: bool,
    /// Scripts that were left out and differences that were not applied.
    pub warnings: Vec<String>,
}

impl ReconcileReport {
    fn from_changes(changes: &ChangeSet, dry_run: bool, warnings: Vec<String>) -> Self {
        Self {
            domains_created: changes.domain_creates.len(),
            domains_altered: changes.domains_altered,
            tables_created: changes.table_creates.len(),
            tables_altered: changes.tables_altered,
            procedures_replaced: changes.procedures.len(),
            statements: changes.statements(),
            dry_run,
            warnings,
        }
    }

    /// Total number of objects created, altered or replaced.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.domains_created
            + self.domains_altered
            + self.tables_created
            + self.tables_altered
            + self.procedures_replaced
    }

    /// Returns true if the database already matched the definitions.
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.total_changes() == 0
    }
}

/// Reconciles a live schema against a definitions directory.
pub struct SchemaReconciler<M, E, R> {
    metadata: M,
    executor: E,
    repository: R,
    options: ReconcileOptions,
}

impl<M, E, R> SchemaReconciler<M, E, R>
where
    M: MetadataSource,
    E: StatementExecutor,
    R: ScriptRepository,
{
    /// Creates a new reconciler.
    pub fn new(metadata: M, executor: E, repository: R) -> Self {
        Self {
            metadata,
            executor,
            repository,
            options: ReconcileOptions::default(),
        }
    }

    /// Sets the run options.
    #[must_use]
    pub fn options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the statement executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs one reconciliation against `definitions_root`.
    ///
    /// Parse failures only exclude the affected script. The first execution
    /// failure stops the run with [`crate::error::ReconcileError::Execution`].
    pub async fn reconcile(&self, definitions_root: &Path) -> Result<ReconcileReport> {
        info!(root = %definitions_root.display(), "Reconciling schema");

        let scripts = ScriptSet::from_loaded(self.repository.load(definitions_root)?);
        if scripts.is_empty() {
            warn!(root = %definitions_root.display(), "No definition scripts found");
            return Ok(ReconcileReport {
                dry_run: self.options.dry_run,
                warnings: scripts.warnings,
                ..ReconcileReport::default()
            });
        }

        let desired = DesiredSchema::parse(&scripts);
        let existing = self.metadata.snapshot().await?;
        info!(
            domains = existing.domains.len(),
            tables = existing.tables.len(),
            procedures = existing.procedures.len(),
            "Extracted existing schema"
        );

        let changes = ChangeSet::plan(&existing, &desired);
        let mut warnings = desired.warnings;
        warnings.extend(changes.warnings.iter().cloned());
        let report = ReconcileReport::from_changes(&changes, self.options.dry_run, warnings);

        if changes.is_empty() {
            info!("Schema already in sync");
            return Ok(report);
        }

        if self.options.dry_run {
            info!(statements = changes.statement_count(), "Dry run, statements not applied");
            return Ok(report);
        }

        for (category, batches) in changes.phases() {
            execute_category(&self.executor, category, batches).await?;
        }

        info!(
            domains_created = report.domains_created,
            domains_altered = report.domains_altered,
            tables_created = report.tables_created,
            tables_altered = report.tables_altered,
            procedures = report.procedures_replaced,
            "Reconciliation complete"
        );
        Ok(report)
    }
}
