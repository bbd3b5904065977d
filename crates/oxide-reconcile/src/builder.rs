//! Database bootstrap.
//!
//! Creates an empty database and runs every definition script against it:
//! domains, then tables, then procedures. Scripts are submitted as written;
//! nothing is parsed or compared.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ReconcileError, Result};
use crate::executor::{execute_category, DatabaseProvisioner, StatementExecutor};
use crate::repository::{ScriptFile, ScriptRepository, ScriptSet};

/// Outcome of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Domain scripts executed.
    pub domains: usize,
    /// Table scripts executed.
    pub tables: usize,
    /// Procedure scripts executed.
    pub procedures: usize,
    /// Scripts that were left out.
    pub warnings: Vec<String>,
}

impl BuildReport {
    /// Total number of scripts executed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.domains + self.tables + self.procedures
    }
}

/// Builds a new database from a definitions directory.
pub struct DatabaseBuilder<P, E, R> {
    provisioner: P,
    executor: E,
    repository: R,
}

impl<P, E, R> DatabaseBuilder<P, E, R>
where
    P: DatabaseProvisioner,
    E: StatementExecutor,
    R: ScriptRepository,
{
    /// Creates a new builder.
    pub fn new(provisioner: P, executor: E, repository: R) -> Self {
        Self {
            provisioner,
            executor,
            repository,
        }
    }

    /// Returns the statement executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Creates the database at `location` and applies every script under
    /// `definitions_root`.
    ///
    /// The first failing script aborts the build.
    pub async fn build(&self, location: &str, definitions_root: &Path) -> Result<BuildReport> {
        if location.trim().is_empty() {
            return Err(ReconcileError::InvalidArgument(
                "database location must not be empty".to_string(),
            ));
        }
        if definitions_root.as_os_str().is_empty() {
            return Err(ReconcileError::InvalidArgument(
                "definitions directory must not be empty".to_string(),
            ));
        }
        if !definitions_root.is_dir() {
            return Err(ReconcileError::NotFound(definitions_root.to_path_buf()));
        }

        info!(root = %definitions_root.display(), "Building database");

        self.provisioner.create_empty(location).await?;

        let scripts = ScriptSet::from_loaded(self.repository.load(definitions_root)?);
        let mut report = BuildReport {
            warnings: scripts.warnings.clone(),
            ..BuildReport::default()
        };

        if scripts.is_empty() {
            warn!(root = %definitions_root.display(), "No definition scripts found");
            return Ok(report);
        }

        execute_category(&self.executor, "domain", &contents(&scripts.domains)).await?;
        report.domains = scripts.domains.len();

        execute_category(&self.executor, "table", &contents(&scripts.tables)).await?;
        report.tables = scripts.tables.len();

        execute_category(&self.executor, "procedure", &contents(&scripts.procedures)).await?;
        report.procedures = scripts.procedures.len();

        info!(scripts = report.total(), "Database built");
        Ok(report)
    }
}

fn contents(files: &[ScriptFile]) -> Vec<String> {
    files.iter().map(|f| f.content.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    use crate::repository::LoadedScripts;

    #[derive(Default)]
    struct Recorder {
        created: RefCell<Vec<String>>,
        executed: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl DatabaseProvisioner for &Recorder {
        async fn create_empty(&self, location: &str) -> Result<()> {
            self.created.borrow_mut().push(location.to_string());
            Ok(())
        }
    }

    impl StatementExecutor for &Recorder {
        async fn execute(&self, batch: &str) -> Result<u64> {
            if self.fail_on.is_some_and(|needle| batch.contains(needle)) {
                return Err(ReconcileError::InvalidArgument("rejected".to_string()));
            }
            self.executed.borrow_mut().push(batch.to_string());
            Ok(0)
        }
    }

    struct Fixed(LoadedScripts);

    impl ScriptRepository for Fixed {
        fn load(&self, _root: &Path) -> Result<LoadedScripts> {
            Ok(self.0.clone())
        }
    }

    fn flat(scripts: &[&str]) -> Fixed {
        Fixed(LoadedScripts::flat(
            scripts
                .iter()
                .enumerate()
                .map(|(i, s)| ScriptFile::new(PathBuf::from(format!("{i}.sql")), *s))
                .collect(),
        ))
    }

    #[tokio::test]
    async fn test_build_rejects_blank_arguments() {
        let recorder = Recorder::default();
        let dir = tempfile::tempdir().unwrap();
        let builder = DatabaseBuilder::new(&recorder, &recorder, flat(&[]));

        let err = builder.build("  ", dir.path()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidArgument(_)));

        let err = builder.build("postgres://db", Path::new("")).await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidArgument(_)));

        let err = builder
            .build("postgres://db", &dir.path().join("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound(_)));
        assert!(recorder.created.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_build_runs_categories_in_order() {
        let recorder = Recorder::default();
        let dir = tempfile::tempdir().unwrap();
        let builder = DatabaseBuilder::new(
            &recorder,
            &recorder,
            flat(&[
                "CREATE PROCEDURE P AS BEGIN END;",
                "CREATE TABLE T (ID D_ID);",
                "CREATE DOMAIN D_ID AS INTEGER;",
            ]),
        );

        let report = builder.build("postgres://db/app", dir.path()).await.unwrap();
        assert_eq!(report.total(), 3);
        assert_eq!(*recorder.created.borrow(), vec!["postgres://db/app"]);

        let executed = recorder.executed.borrow();
        assert!(executed[0].starts_with("CREATE DOMAIN"));
        assert!(executed[1].starts_with("CREATE TABLE"));
        assert!(executed[2].starts_with("CREATE PROCEDURE"));
    }

    #[tokio::test]
    async fn test_build_with_no_scripts_still_creates_database() {
        let recorder = Recorder::default();
        let dir = tempfile::tempdir().unwrap();
        let builder = DatabaseBuilder::new(&recorder, &recorder, flat(&[]));

        let report = builder.build("postgres://db/app", dir.path()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert_eq!(recorder.created.borrow().len(), 1);
        assert!(recorder.executed.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_build_stops_at_first_failure() {
        let recorder = Recorder {
            fail_on: Some("T2"),
            ..Recorder::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let builder = DatabaseBuilder::new(
            &recorder,
            &recorder,
            flat(&[
                "CREATE TABLE T1 (ID INTEGER);",
                "CREATE TABLE T2 (ID INTEGER);",
                "CREATE TABLE T3 (ID INTEGER);",
                "CREATE PROCEDURE P AS BEGIN END;",
            ]),
        );

        let err = builder.build("postgres://db/app", dir.path()).await.unwrap_err();
        match err {
            ReconcileError::Execution {
                category,
                succeeded,
                total,
                ..
            } => {
                assert_eq!(category, "table");
                assert_eq!(succeeded, 1);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(recorder.executed.borrow().len(), 1);
    }
}
