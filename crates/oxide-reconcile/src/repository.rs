//! Definition script loading.
//!
//! A definitions root either holds `domains/`, `tables/` and `procedures/`
//! sub-directories, or a flat set of `*.sql` files that must be classified.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::classifier::{classify, ScriptKind};
use crate::error::{ReconcileError, Result};

/// One definition script read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    /// Where the script was read from.
    pub path: PathBuf,
    /// Raw script text.
    pub content: String,
}

impl ScriptFile {
    /// Creates a script file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// File name without extension, or the full path if there is none.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_stem().map_or_else(
            || self.path.display().to_string(),
            |stem| stem.to_string_lossy().into_owned(),
        )
    }
}

/// How the scripts of a definitions root are laid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptLayout {
    /// Scripts already grouped by sub-directory.
    Partitioned {
        /// Scripts under `domains/`.
        domains: Vec<ScriptFile>,
        /// Scripts under `tables/`.
        tables: Vec<ScriptFile>,
        /// Scripts under `procedures/`.
        procedures: Vec<ScriptFile>,
    },
    /// One unpartitioned group.
    Flat(Vec<ScriptFile>),
}

/// Scripts as returned by a [`ScriptRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedScripts {
    /// The scripts that were read.
    pub layout: ScriptLayout,
    /// Files that could not be read, one message each.
    pub unreadable: Vec<String>,
}

impl LoadedScripts {
    /// Wraps one unpartitioned group of scripts.
    #[must_use]
    pub fn flat(scripts: Vec<ScriptFile>) -> Self {
        Self {
            layout: ScriptLayout::Flat(scripts),
            unreadable: Vec::new(),
        }
    }

    /// Wraps scripts already grouped by kind.
    #[must_use]
    pub fn partitioned(
        domains: Vec<ScriptFile>,
        tables: Vec<ScriptFile>,
        procedures: Vec<ScriptFile>,
    ) -> Self {
        Self {
            layout: ScriptLayout::Partitioned {
                domains,
                tables,
                procedures,
            },
            unreadable: Vec::new(),
        }
    }
}

/// Source of raw definition scripts.
pub trait ScriptRepository {
    /// Loads every script below `root`.
    fn load(&self, root: &Path) -> Result<LoadedScripts>;
}

/// Reads `*.sql` files from the local file system.
///
/// Only the top level of each directory is read, in file-name order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsScriptRepository;

impl FsScriptRepository {
    /// Creates a new file-system repository.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ScriptRepository for FsScriptRepository {
    fn load(&self, root: &Path) -> Result<LoadedScripts> {
        if root.as_os_str().is_empty() {
            return Err(ReconcileError::InvalidArgument(
                "definitions directory must not be empty".to_string(),
            ));
        }
        if !root.is_dir() {
            return Err(ReconcileError::NotFound(root.to_path_buf()));
        }

        let mut unreadable = Vec::new();
        let domains = read_category(root, ScriptKind::Domain, &mut unreadable)?;
        let tables = read_category(root, ScriptKind::Table, &mut unreadable)?;
        let procedures = read_category(root, ScriptKind::Procedure, &mut unreadable)?;

        let mut loaded = if domains.is_empty() && tables.is_empty() && procedures.is_empty() {
            debug!(root = %root.display(), "No categorized scripts, reading flat directory");
            LoadedScripts::flat(read_sql_files(root, &mut unreadable)?)
        } else {
            LoadedScripts::partitioned(domains, tables, procedures)
        };
        loaded.unreadable = unreadable;
        Ok(loaded)
    }
}

fn read_category(
    root: &Path,
    kind: ScriptKind,
    unreadable: &mut Vec<String>,
) -> Result<Vec<ScriptFile>> {
    let Some(subdir) = kind.directory() else {
        return Ok(Vec::new());
    };

    let dir = root.join(subdir);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let scripts: Vec<ScriptFile> = read_sql_files(&dir, unreadable)?
        .into_iter()
        .filter(|s| !s.content.trim().is_empty())
        .collect();
    debug!(kind = %kind, count = scripts.len(), "Loaded scripts");
    Ok(scripts)
}

/// Reads the `*.sql` files of `dir` in name order. Files that cannot be read
/// are reported in `unreadable` and skipped.
fn read_sql_files(dir: &Path, unreadable: &mut Vec<String>) -> Result<Vec<ScriptFile>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_sql = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if is_sql && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut scripts = Vec::with_capacity(paths.len());
    for path in paths {
        match fs::read_to_string(&path) {
            Ok(content) => scripts.push(ScriptFile { path, content }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable script");
                unreadable.push(format!("{}: unreadable: {e}", path.display()));
            }
        }
    }
    Ok(scripts)
}

/// Scripts grouped by kind, ready for an orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptSet {
    /// Domain scripts.
    pub domains: Vec<ScriptFile>,
    /// Table scripts.
    pub tables: Vec<ScriptFile>,
    /// Procedure scripts.
    pub procedures: Vec<ScriptFile>,
    /// Files that were left out, one message each.
    pub warnings: Vec<String>,
}

impl ScriptSet {
    /// Groups loaded scripts by kind.
    ///
    /// Partitioned scripts are taken as-is. Flat scripts are classified, and
    /// scripts of unknown kind are skipped with a warning. Unreadable files
    /// are carried over as warnings.
    #[must_use]
    pub fn from_loaded(loaded: LoadedScripts) -> Self {
        let LoadedScripts { layout, unreadable } = loaded;
        match layout {
            ScriptLayout::Partitioned {
                domains,
                tables,
                procedures,
            } => Self {
                domains,
                tables,
                procedures,
                warnings: unreadable,
            },
            ScriptLayout::Flat(scripts) => {
                let mut set = Self {
                    warnings: unreadable,
                    ..Self::default()
                };
                for script in scripts {
                    match classify(&script.content) {
                        ScriptKind::Domain => set.domains.push(script),
                        ScriptKind::Table => set.tables.push(script),
                        ScriptKind::Procedure => set.procedures.push(script),
                        ScriptKind::Unknown => {
                            warn!(path = %script.path.display(), "Skipping script of unknown kind");
                            set.warnings.push(format!(
                                "{}: not a domain, table or procedure definition",
                                script.path.display()
                            ));
                        }
                    }
                }
                info!(
                    domains = set.domains.len(),
                    tables = set.tables.len(),
                    procedures = set.procedures.len(),
                    skipped = set.warnings.len(),
                    "Classified flat scripts"
                );
                set
            }
        }
    }

    /// Total number of accepted scripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len() + self.tables.len() + self.procedures.len()
    }

    /// Returns true if no script was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
