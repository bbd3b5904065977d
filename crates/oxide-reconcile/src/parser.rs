//! Definition parser.
//!
//! Recovers structured domains and tables from `CREATE DOMAIN` and
//! `CREATE TABLE` scripts. Only the statement shapes produced by the
//! generator (plus the usual hand-written variations) are understood; this is
//! not a general SQL parser.
//!
//! A column type is classified against a fixed lexicon of primitive types.
//! Anything not in the lexicon is treated as a reference to a domain, so a
//! domain named like a primitive type would be misclassified.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::schema::{Column, ColumnType, Domain, ObjectName, Table};

/// Primitive SQL types recognised in column and domain definitions.
const KNOWN_DATA_TYPES: &[&str] = &[
    "INTEGER",
    "INT",
    "BIGINT",
    "SMALLINT",
    "INT128",
    "FLOAT",
    "DOUBLE",
    "DOUBLE PRECISION",
    "REAL",
    "DECIMAL",
    "NUMERIC",
    "DECFLOAT",
    "VARCHAR",
    "CHAR",
    "CHARACTER",
    "CHARACTER VARYING",
    "BINARY",
    "VARBINARY",
    "DATE",
    "TIME",
    "TIMESTAMP",
    "TIME WITH TIME ZONE",
    "TIMESTAMP WITH TIME ZONE",
    "BLOB",
    "BOOLEAN",
    "TEXT",
    "BYTEA",
];

/// Type names spelled with two words.
const TWO_WORD_TYPES: &[(&str, &str)] = &[("DOUBLE", "PRECISION"), ("CHARACTER", "VARYING")];

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bCREATE\s+DOMAIN\s+(\w+)\s+(?:AS\s+)?(.*)").expect("valid domain regex")
});

static TABLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCREATE\s+TABLE\s+(\w+)").expect("valid table name regex")
});

static TABLE_COLUMNS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bCREATE\s+TABLE\s+\w+\s*\((.*)\)").expect("valid table columns regex")
});

static COLUMN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(\w+)\s+(.*)$").expect("valid column regex"));

static TABLE_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(PRIMARY\s+KEY|FOREIGN\s+KEY|CONSTRAINT|CHECK|UNIQUE)\b")
        .expect("valid table clause regex")
});

static LEADING_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\w+)").expect("valid word regex"));

static TIME_ZONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(WITH|WITHOUT)\s+TIME\s+ZONE\b").expect("valid time zone regex")
});

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\s*\[\s*\d*\s*\])+").expect("valid array regex"));

static DEFAULT_KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDEFAULT\s+").expect("valid default regex"));

static NOT_NULL_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^NOT\s+NULL\b").expect("valid not null prefix regex"));

static NOT_NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").expect("valid not null regex"));

static PROCEDURE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCREATE\s+(?:OR\s+(?:ALTER|REPLACE)\s+)?PROCEDURE\s+(\w+)")
        .expect("valid procedure regex")
});

/// Parses a `CREATE DOMAIN` script.
pub fn parse_domain(script: &str) -> Result<Domain> {
    if script.trim().is_empty() {
        return Err(ReconcileError::InvalidArgument(
            "domain script must not be empty".to_string(),
        ));
    }

    let sql = strip_comments(script);
    let caps = DOMAIN_RE
        .captures(&sql)
        .ok_or_else(|| ReconcileError::parse(script, "not a CREATE DOMAIN statement"))?;

    let spec = parse_type_spec(&caps[2])
        .ok_or_else(|| ReconcileError::parse(script, "missing or malformed base type"))?;

    let data_type = spec.data_type();
    let (nullable, default) = parse_modifiers(spec.remainder);

    let mut domain = Domain::new(caps[1].to_uppercase(), data_type);
    domain.nullable = nullable;
    domain.default = default;
    Ok(domain)
}

/// Parses a `CREATE TABLE` script.
///
/// Table-level clauses (`PRIMARY KEY`, `FOREIGN KEY`, `CONSTRAINT`, `CHECK`,
/// `UNIQUE`) are skipped and do not consume a column position.
pub fn parse_table(script: &str) -> Result<Table> {
    if script.trim().is_empty() {
        return Err(ReconcileError::InvalidArgument(
            "table script must not be empty".to_string(),
        ));
    }

    let sql = strip_comments(script);
    let name = TABLE_NAME_RE
        .captures(&sql)
        .map(|caps| caps[1].to_uppercase())
        .ok_or_else(|| ReconcileError::parse(script, "not a CREATE TABLE statement"))?;

    let body = TABLE_COLUMNS_RE
        .captures(&sql)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ReconcileError::parse(script, "missing column list"))?;

    let mut table = Table::new(name);
    for definition in split_column_definitions(&body) {
        let position = table.columns.len();
        if let Some(column) = parse_column_definition(&definition, position) {
            table.columns.push(column);
        }
    }

    if table.columns.is_empty() {
        return Err(ReconcileError::parse(script, "table has no columns"));
    }

    Ok(table)
}

/// Extracts the procedure name from a `CREATE [OR ALTER|OR REPLACE] PROCEDURE` script.
#[must_use]
pub fn procedure_name(script: &str) -> Option<ObjectName> {
    let sql = strip_comments(script);
    PROCEDURE_NAME_RE
        .captures(&sql)
        .map(|caps| ObjectName::new(caps[1].to_uppercase()))
}

/// Removes `--` line comments and `/* */` block comments.
///
/// Comment markers inside single-quoted literals are left alone. The result is
/// trimmed.
#[must_use]
pub fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_literal = false;

    while let Some(c) = chars.next() {
        if in_literal {
            out.push(c);
            if c == '\'' {
                in_literal = false;
            }
            continue;
        }

        match c {
            '\'' => {
                in_literal = true;
                out.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out.trim().to_string()
}

/// Splits the body of a `CREATE TABLE (...)` into individual definitions.
///
/// Commas nested in parentheses (e.g. `DECIMAL(10,2)`) or inside string
/// literals do not split. Blank pieces are dropped.
#[must_use]
pub fn split_column_definitions(body: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut in_literal = false;

    for c in body.chars() {
        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
            current.push(c);
            continue;
        }

        match c {
            '\'' => {
                in_literal = true;
                current.push(c);
            }
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                result.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    result.push(current);

    result
        .into_iter()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Returns true if `name` is a primitive SQL type (case-insensitive).
#[must_use]
pub fn is_known_data_type(name: &str) -> bool {
    let upper = name.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
    KNOWN_DATA_TYPES.contains(&upper.as_str())
}

/// Returns the first and second numeric type parameters of a type such as
/// `DECIMAL(10,2)`.
#[must_use]
pub fn type_parameters(data_type: &str) -> (Option<u32>, Option<u32>) {
    let Some(open) = data_type.find('(') else {
        return (None, None);
    };
    let inner = &data_type[open + 1..];
    let inner = inner.split(')').next().unwrap_or(inner);

    let mut parts = inner.split(',').map(|p| p.trim().parse::<u32>().ok());
    let first = parts.next().flatten();
    let second = parts.next().flatten();
    (first, second)
}

/// Parses one column definition; returns `None` for table-level clauses and
/// definitions that do not look like `<name> <type> ...`.
fn parse_column_definition(definition: &str, position: usize) -> Option<Column> {
    if TABLE_CLAUSE_RE.is_match(definition) {
        debug!(clause = %definition, "Skipping table-level clause");
        return None;
    }

    let Some(caps) = COLUMN_NAME_RE.captures(definition) else {
        debug!(definition = %definition, "Skipping unrecognised column definition");
        return None;
    };
    let name = caps[1].to_uppercase();
    let spec = parse_type_spec(caps.get(2)?.as_str())?;

    let column_type = if spec.array || is_known_data_type(&spec.base) {
        ColumnType::Data(spec.data_type())
    } else {
        ColumnType::Domain(ObjectName::new(spec.base))
    };
    let (nullable, default) = parse_modifiers(spec.remainder);

    Some(Column {
        name: ObjectName::new(name),
        position,
        column_type,
        nullable,
        default,
    })
}

/// A base type with its optional parameter list and suffixes.
struct TypeSpec<'a> {
    base: String,
    params: Option<String>,
    with_time_zone: bool,
    array: bool,
    remainder: &'a str,
}

impl TypeSpec<'_> {
    /// Canonical type text: parameters without whitespace, `WITHOUT TIME ZONE`
    /// dropped and any array dimensions written as a single `[]`.
    fn data_type(&self) -> String {
        let mut text = self.base.clone();
        if let Some(params) = self.params.as_deref().filter(|p| !p.trim().is_empty()) {
            let compact: String = params.chars().filter(|c| !c.is_whitespace()).collect();
            text.push_str(&format!("({compact})"));
        }
        if self.with_time_zone {
            text.push_str(" WITH TIME ZONE");
        }
        if self.array {
            text.push_str("[]");
        }
        text
    }
}

/// Reads `<word>[ <word>][(<params>)][ WITH[OUT] TIME ZONE][[]...]` from the
/// start of `text`. The time zone clause is only read after `TIME` and
/// `TIMESTAMP`.
fn parse_type_spec(text: &str) -> Option<TypeSpec<'_>> {
    let caps = LEADING_WORD_RE.captures(text)?;
    let first = caps.get(1)?;
    let mut base = first.as_str().to_uppercase();
    let mut rest = &text[first.end()..];

    if let Some(next) = LEADING_WORD_RE.captures(rest) {
        let word = next[1].to_uppercase();
        let is_two_word = TWO_WORD_TYPES
            .iter()
            .any(|(a, b)| *a == base && *b == word);
        if is_two_word {
            base = format!("{base} {word}");
            rest = &rest[next.get(0)?.end()..];
        }
    }

    let mut params = None;
    if let Some(after) = rest.trim_start().strip_prefix('(') {
        let close = after.find(')')?;
        params = Some(after[..close].to_string());
        rest = &after[close + 1..];
    }

    let mut with_time_zone = false;
    if base == "TIME" || base == "TIMESTAMP" {
        if let Some(zone) = TIME_ZONE_RE.captures(rest) {
            with_time_zone = zone[1].eq_ignore_ascii_case("WITH");
            rest = &rest[zone.get(0)?.end()..];
        }
    }

    let array = match ARRAY_RE.find(rest) {
        Some(dims) => {
            rest = &rest[dims.end()..];
            true
        }
        None => false,
    };

    Some(TypeSpec {
        base,
        params,
        with_time_zone,
        array,
        remainder: rest,
    })
}

/// Reads `[NOT NULL]` and `[DEFAULT <expr>]` in either order.
fn parse_modifiers(remainder: &str) -> (bool, Option<String>) {
    let Some(keyword) = DEFAULT_KEYWORD_RE.find(remainder) else {
        return (!NOT_NULL_RE.is_match(remainder), None);
    };

    let start = keyword.end();
    let end = start + default_expression_len(&remainder[start..]);
    let value = remainder[start..end].trim();

    let rest = format!("{} {}", &remainder[..keyword.start()], &remainder[end..]);
    let nullable = !NOT_NULL_RE.is_match(&rest);
    let default = (!value.is_empty()).then(|| value.to_string());
    (nullable, default)
}

/// Length of a default expression: up to the first `;` or `NOT NULL` that is
/// outside quotes and parentheses, or the end of `text`.
fn default_expression_len(text: &str) -> usize {
    let mut in_literal = false;
    let mut depth: usize = 0;
    let mut after_word = false;

    for (i, c) in text.char_indices() {
        if in_literal {
            if c == '\'' {
                in_literal = false;
            }
        } else {
            match c {
                '\'' => in_literal = true,
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                ';' if depth == 0 => return i,
                'N' | 'n'
                    if depth == 0 && !after_word && NOT_NULL_PREFIX_RE.is_match(&text[i..]) =>
                {
                    return i;
                }
                _ => {}
            }
        }
        after_word = c.is_alphanumeric() || c == '_';
    }

    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_domain() {
        let domain = parse_domain("CREATE DOMAIN D_ID AS INTEGER NOT NULL;").unwrap();
        assert_eq!(domain.name.as_str(), "D_ID");
        assert_eq!(domain.data_type, "INTEGER");
        assert!(!domain.nullable);
        assert_eq!(domain.default, None);
    }

    #[test]
    fn test_parse_domain_uppercases() {
        let domain = parse_domain("create domain d_name as varchar(100);").unwrap();
        assert_eq!(domain.name.as_str(), "D_NAME");
        assert_eq!(domain.data_type, "VARCHAR(100)");
        assert_eq!(domain.length, Some(100));
        assert_eq!(domain.precision, Some(100));
        assert_eq!(domain.scale, None);
        assert!(domain.nullable);
    }

    #[test]
    fn test_parse_domain_with_precision_and_scale() {
        let domain =
            parse_domain("CREATE DOMAIN D_PRICE AS DECIMAL(10, 2) NOT NULL DEFAULT 0.00;").unwrap();
        assert_eq!(domain.data_type, "DECIMAL(10,2)");
        assert_eq!(domain.precision, Some(10));
        assert_eq!(domain.scale, Some(2));
        assert!(!domain.nullable);
        assert_eq!(domain.default.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_parse_domain_default_before_not_null() {
        let domain = parse_domain("CREATE DOMAIN D_STATUS AS CHAR(1) DEFAULT 'A' NOT NULL;").unwrap();
        assert_eq!(domain.default.as_deref(), Some("'A'"));
        assert!(!domain.nullable);
    }

    #[test]
    fn test_parse_domain_default_expression() {
        let domain =
            parse_domain("CREATE DOMAIN D_CREATED AS TIMESTAMP DEFAULT CURRENT_TIMESTAMP").unwrap();
        assert_eq!(domain.default.as_deref(), Some("CURRENT_TIMESTAMP"));
        assert!(domain.nullable);
    }

    #[test]
    fn test_parse_domain_default_keeps_quoted_semicolon() {
        let domain = parse_domain("CREATE DOMAIN D_SEP AS CHAR(1) DEFAULT ';';").unwrap();
        assert_eq!(domain.default.as_deref(), Some("';'"));
        assert!(domain.nullable);
    }

    #[test]
    fn test_parse_domain_default_literal_mentioning_not_null() {
        let domain =
            parse_domain("CREATE DOMAIN D_NOTE AS VARCHAR(20) DEFAULT 'NOT NULL' NOT NULL;").unwrap();
        assert_eq!(domain.default.as_deref(), Some("'NOT NULL'"));
        assert!(!domain.nullable);

        let domain = parse_domain("CREATE DOMAIN D_NOTE AS VARCHAR(20) DEFAULT 'it''s; fine';").unwrap();
        assert_eq!(domain.default.as_deref(), Some("'it''s; fine'"));
        assert!(domain.nullable);
    }

    #[test]
    fn test_parse_domain_time_zone_types() {
        let domain = parse_domain("CREATE DOMAIN D_AT AS TIMESTAMP WITH TIME ZONE NOT NULL;").unwrap();
        assert_eq!(domain.data_type, "TIMESTAMP WITH TIME ZONE");
        assert!(!domain.nullable);

        let domain = parse_domain("CREATE DOMAIN D_AT AS timestamp(3) with time zone;").unwrap();
        assert_eq!(domain.data_type, "TIMESTAMP(3) WITH TIME ZONE");
        assert_eq!(domain.precision, Some(3));

        let domain = parse_domain("CREATE DOMAIN D_AT AS TIME WITHOUT TIME ZONE;").unwrap();
        assert_eq!(domain.data_type, "TIME");
    }

    #[test]
    fn test_parse_domain_two_word_type() {
        let domain = parse_domain("CREATE DOMAIN D_RATE AS DOUBLE PRECISION NOT NULL;").unwrap();
        assert_eq!(domain.data_type, "DOUBLE PRECISION");
        assert!(!domain.nullable);
    }

    #[test]
    fn test_parse_domain_ignores_comments() {
        let script = "-- identifier domain\n/* multi\n line */\nCREATE DOMAIN D_ID AS INTEGER; -- trailing";
        let domain = parse_domain(script).unwrap();
        assert_eq!(domain.name.as_str(), "D_ID");
        assert!(domain.nullable);
    }

    #[test]
    fn test_parse_domain_empty_is_invalid_argument() {
        assert!(matches!(
            parse_domain("   "),
            Err(ReconcileError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_domain_wrong_shape_is_parse_error() {
        match parse_domain("CREATE TABLE USERS (ID INTEGER);") {
            Err(ReconcileError::Parse { script, .. }) => {
                assert!(script.contains("CREATE TABLE USERS"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_table_basic() {
        let table = parse_table(
            "CREATE TABLE USERS (\n    ID INTEGER NOT NULL,\n    NAME VARCHAR(100)\n);",
        )
        .unwrap();

        assert_eq!(table.name.as_str(), "USERS");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[0].name.as_str(), "ID");
        assert_eq!(table.columns[0].position, 0);
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].column_type.data_type(), Some("VARCHAR(100)"));
        assert_eq!(table.columns[1].position, 1);
        assert!(table.columns[1].nullable);
    }

    #[test]
    fn test_parse_table_domain_reference() {
        let table = parse_table("create table orders (id d_id not null, total d_price)").unwrap();
        assert_eq!(table.name.as_str(), "ORDERS");
        assert_eq!(
            table.columns[0].column_type,
            ColumnType::Domain(ObjectName::new("D_ID"))
        );
        assert!(!table.columns[0].nullable);
        assert_eq!(
            table.columns[1].column_type.domain_name().map(ObjectName::as_str),
            Some("D_PRICE")
        );
    }

    #[test]
    fn test_parse_table_skips_constraints_without_consuming_positions() {
        let table = parse_table(
            "CREATE TABLE ITEMS (
                ID INTEGER NOT NULL,
                CONSTRAINT PK_ITEMS PRIMARY KEY (ID),
                PRICE DECIMAL(10,2) DEFAULT 0 NOT NULL,
                UNIQUE (PRICE),
                QTY INTEGER
            );",
        )
        .unwrap();

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "PRICE", "QTY"]);
        assert_eq!(table.columns[2].position, 2);
        assert_eq!(table.columns[1].default.as_deref(), Some("0"));
        assert!(!table.columns[1].nullable);
    }

    #[test]
    fn test_parse_table_keeps_type_suffixes() {
        let table = parse_table(
            "CREATE TABLE EVENTS (
                AT TIMESTAMP WITH TIME ZONE NOT NULL,
                TAGS TEXT[] DEFAULT '{}',
                GRID INTEGER[3][3],
                IDS D_ID[],
                NOTE VARCHAR(10) DEFAULT 'a;b' NOT NULL
            );",
        )
        .unwrap();

        let types: Vec<&ColumnType> = table.columns.iter().map(|c| &c.column_type).collect();
        assert_eq!(
            types,
            vec![
                &ColumnType::Data("TIMESTAMP WITH TIME ZONE".to_string()),
                &ColumnType::Data("TEXT[]".to_string()),
                &ColumnType::Data("INTEGER[]".to_string()),
                &ColumnType::Data("D_ID[]".to_string()),
                &ColumnType::Data("VARCHAR(10)".to_string()),
            ]
        );
        assert!(!table.columns[0].nullable);
        assert_eq!(table.columns[1].default.as_deref(), Some("'{}'"));
        assert_eq!(table.columns[4].default.as_deref(), Some("'a;b'"));
        assert!(!table.columns[4].nullable);
    }

    #[test]
    fn test_parse_table_default_call_with_parentheses() {
        let table =
            parse_table("CREATE TABLE T (ID BIGINT DEFAULT nextval('t_id_seq') NOT NULL);").unwrap();
        assert_eq!(table.columns[0].default.as_deref(), Some("nextval('t_id_seq')"));
        assert!(!table.columns[0].nullable);
    }

    #[test]
    fn test_parse_table_without_columns_fails() {
        assert!(matches!(
            parse_table("CREATE TABLE EMPTY (PRIMARY KEY (ID));"),
            Err(ReconcileError::Parse { .. })
        ));
        assert!(matches!(
            parse_table("CREATE TABLE BROKEN"),
            Err(ReconcileError::Parse { .. })
        ));
    }

    #[test]
    fn test_split_respects_type_parameters() {
        let parts = split_column_definitions("PRICE DECIMAL(10,2) NOT NULL, QTY INTEGER");
        assert_eq!(parts, vec!["PRICE DECIMAL(10,2) NOT NULL", "QTY INTEGER"]);
    }

    #[test]
    fn test_split_respects_literals() {
        let parts = split_column_definitions("TAGS VARCHAR(20) DEFAULT 'a,b', N INTEGER");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "TAGS VARCHAR(20) DEFAULT 'a,b'");
    }

    #[test]
    fn test_strip_comments_keeps_literals() {
        let sql = "SELECT '--not a comment' /* gone */ FROM T -- gone too\nWHERE 1 = 1";
        let stripped = strip_comments(sql);
        assert!(stripped.contains("'--not a comment'"));
        assert!(!stripped.contains("gone"));
        assert!(stripped.ends_with("WHERE 1 = 1"));
    }

    #[test]
    fn test_known_data_types() {
        assert!(is_known_data_type("integer"));
        assert!(is_known_data_type("Double Precision"));
        assert!(is_known_data_type("timestamp  with time zone"));
        assert!(!is_known_data_type("D_ID"));
    }

    #[test]
    fn test_type_parameters() {
        assert_eq!(type_parameters("NUMERIC(18,4)"), (Some(18), Some(4)));
        assert_eq!(type_parameters("VARCHAR(50)"), (Some(50), None));
        assert_eq!(type_parameters("INTEGER"), (None, None));
    }

    #[test]
    fn test_procedure_name() {
        assert_eq!(
            procedure_name("CREATE PROCEDURE get_user AS BEGIN END;").map(|n| n.to_string()),
            Some("GET_USER".to_string())
        );
        assert!(procedure_name("create or alter procedure P1 as begin end").is_some());
        assert!(procedure_name("SELECT 1").is_none());
    }
}
