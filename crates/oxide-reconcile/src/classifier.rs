//! Script classification.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parser::strip_comments;

static CREATE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCREATE\s+DOMAIN\b").expect("valid regex"));

static CREATE_TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCREATE\s+TABLE\b").expect("valid regex"));

static CREATE_PROCEDURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCREATE\s+(?:OR\s+(?:REPLACE|ALTER)\s+)?PROCEDURE\b").expect("valid regex")
});

/// The kind of object a definition script creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptKind {
    /// `CREATE DOMAIN`.
    Domain,
    /// `CREATE TABLE`.
    Table,
    /// `CREATE PROCEDURE`.
    Procedure,
    /// Anything else.
    Unknown,
}

impl ScriptKind {
    /// Name of the sub-directory holding scripts of this kind.
    #[must_use]
    pub fn directory(&self) -> Option<&'static str> {
        match self {
            Self::Domain => Some("domains"),
            Self::Table => Some("tables"),
            Self::Procedure => Some("procedures"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Domain => "domain",
            Self::Table => "table",
            Self::Procedure => "procedure",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Labels a script by the first `CREATE DOMAIN`, `CREATE TABLE` or
/// `CREATE PROCEDURE` it contains, checked in that order.
#[must_use]
pub fn classify(script: &str) -> ScriptKind {
    let sql = strip_comments(script);
    if sql.is_empty() {
        return ScriptKind::Unknown;
    }

    if CREATE_DOMAIN_RE.is_match(&sql) {
        ScriptKind::Domain
    } else if CREATE_TABLE_RE.is_match(&sql) {
        ScriptKind::Table
    } else if CREATE_PROCEDURE_RE.is_match(&sql) {
        ScriptKind::Procedure
    } else {
        ScriptKind::Unknown
    }
}
