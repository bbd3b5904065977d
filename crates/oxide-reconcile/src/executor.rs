//! Statement execution.
//!
//! The traits here are the seams to the target database. [`split_statements`]
//! breaks a batch into single statements the way an executor must, and
//! [`execute_category`] applies a list of batches one at a time, turning the
//! first failure into a [`ReconcileError::Execution`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, error, info};

use crate::error::{ReconcileError, Result};

/// Applies statement batches to a target database.
#[allow(async_fn_in_trait)]
pub trait StatementExecutor {
    /// Executes one batch and returns the number of affected rows.
    ///
    /// A batch may hold several statements, separated by `;` or by a custom
    /// terminator set with `SET TERM`. Each statement is applied on its own;
    /// the first failure aborts the rest of the batch.
    async fn execute(&self, batch: &str) -> Result<u64>;
}

/// Creates new, empty databases.
#[allow(async_fn_in_trait)]
pub trait DatabaseProvisioner {
    /// Creates an empty database at `location`.
    async fn create_empty(&self, location: &str) -> Result<()>;
}

/// Executes `batches` in order, stopping at the first failure.
///
/// Returns the total number of affected rows. On failure the number of
/// batches that succeeded is logged first, then returned inside the error.
pub async fn execute_category<E: StatementExecutor>(
    executor: &E,
    category: &str,
    batches: &[String],
) -> Result<u64> {
    let total = batches.len();
    let mut affected = 0;

    for (succeeded, batch) in batches.iter().enumerate() {
        debug!(category, sql = %batch, "Executing statement");
        match executor.execute(batch).await {
            Ok(rows) => affected += rows,
            Err(e) => {
                info!(category, succeeded, total, "Statements applied before failure");
                error!(category, error = %e, "Statement failed");
                return Err(ReconcileError::Execution {
                    category: category.to_string(),
                    succeeded,
                    total,
                    source: Box::new(e),
                });
            }
        }
    }

    if total > 0 {
        info!(category, count = total, "Applied statements");
    }
    Ok(affected)
}

static SET_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^SET\s+TERM\s+(\S+)$").expect("valid set term regex"));

/// Splits a batch into individual statements.
///
/// Statements end at the current terminator (`;` unless changed by a
/// `SET TERM <t>` directive). Terminators inside quoted strings, quoted
/// identifiers and `$tag$` bodies are ignored. Comments outside those are
/// dropped. Returned statements are trimmed and carry no terminator;
/// `SET TERM` directives themselves are not returned.
#[must_use]
pub fn split_statements(batch: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut terminator = String::from(";");
    let mut current = String::new();
    let mut i = 0;

    while i < batch.len() {
        let rest = &batch[i..];

        if rest.starts_with("--") {
            i += rest.find('\n').unwrap_or(rest.len());
            continue;
        }
        if rest.starts_with("/*") {
            i += rest[2..].find("*/").map_or(rest.len(), |end| end + 4);
            current.push(' ');
            continue;
        }

        let Some(c) = rest.chars().next() else {
            break;
        };

        let quoted = match c {
            '\'' | '"' => Some(rest[1..].find(c).map_or(rest.len(), |end| end + 2)),
            '$' => dollar_tag(rest)
                .map(|tag| rest[tag.len()..].find(tag).map_or(rest.len(), |end| end + 2 * tag.len())),
            _ => None,
        };
        if let Some(len) = quoted {
            current.push_str(&rest[..len]);
            i += len;
            continue;
        }

        if rest.starts_with(terminator.as_str()) {
            i += terminator.len();
            finish_statement(&mut current, &mut terminator, &mut statements);
            continue;
        }

        current.push(c);
        i += c.len_utf8();
    }

    finish_statement(&mut current, &mut terminator, &mut statements);
    statements
}

fn finish_statement(current: &mut String, terminator: &mut String, statements: &mut Vec<String>) {
    let text = current.trim();
    if !text.is_empty() {
        if let Some(caps) = SET_TERM_RE.captures(text) {
            *terminator = caps[1].to_string();
        } else {
            statements.push(text.to_string());
        }
    }
    current.clear();
}

/// Returns the `$tag$` opener at the start of `text`, if any.
fn dollar_tag(text: &str) -> Option<&str> {
    let body = text.strip_prefix('$')?;
    let tag_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());

    if body[..tag_len].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    body[tag_len..]
        .starts_with('$')
        .then(|| &text[..tag_len + 2])
}
