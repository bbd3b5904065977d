#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use oxide_reconcile::prelude::*;

/// Records every batch it is asked to run; optionally rejects one.
#[derive(Default)]
pub struct RecordingExecutor {
    pub executed: RefCell<Vec<String>>,
    pub fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl StatementExecutor for RecordingExecutor {
    async fn execute(&self, batch: &str) -> Result<u64> {
        if let Some(needle) = &self.fail_on {
            if batch.contains(needle.as_str()) {
                return Err(ReconcileError::InvalidArgument(format!(
                    "rejected: {batch}"
                )));
            }
        }
        self.executed.borrow_mut().push(batch.to_string());
        Ok(0)
    }
}

/// Records the databases it was asked to create.
#[derive(Default)]
pub struct RecordingProvisioner {
    pub created: RefCell<Vec<String>>,
}

impl DatabaseProvisioner for RecordingProvisioner {
    async fn create_empty(&self, location: &str) -> Result<()> {
        self.created.borrow_mut().push(location.to_string());
        Ok(())
    }
}

/// Serves a fixed snapshot as the existing schema.
pub struct StaticMetadata(pub SchemaSnapshot);

impl MetadataSource for StaticMetadata {
    async fn extract_domains(&self) -> Result<Vec<Domain>> {
        Ok(self.0.domains.clone())
    }

    async fn extract_tables(&self) -> Result<Vec<Table>> {
        Ok(self.0.tables.clone())
    }

    async fn extract_procedures(&self) -> Result<Vec<Procedure>> {
        Ok(self.0.procedures.clone())
    }
}

/// Writes `<root>/<dir>/<name>.sql` for each entry; an empty `dir` writes
/// into the root.
pub fn write_scripts(root: &Path, scripts: &[(&str, &str, &str)]) {
    for (dir, name, content) in scripts {
        let dir = root.join(dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.sql")), content).unwrap();
    }
}

pub const D_ID: &str = "CREATE DOMAIN D_ID AS INTEGER NOT NULL;";
pub const D_NAME: &str = "CREATE DOMAIN D_NAME AS VARCHAR(100) DEFAULT 'unknown';";
pub const USERS: &str = "CREATE TABLE USERS (\n    ID D_ID,\n    NAME D_NAME,\n    PRIMARY KEY (ID)\n);";
pub const GET_USER: &str =
    "CREATE PROCEDURE GET_USER(p_id integer) LANGUAGE sql AS $$ SELECT 1 $$;";
