//! Schema comparison.
//!
//! Compares the existing schema against the desired one and produces the
//! creations and attribute-level alterations needed to converge them. Objects
//! that exist but are no longer declared are left alone; nothing is dropped.

use std::collections::HashMap;
use std::fmt;

use crate::generator::column_definition;
use crate::schema::{Column, ColumnType, Domain, ObjectName, Table};

/// A single attribute change on a domain or a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChange {
    /// Change the data type.
    Type(String),
    /// Allow NULL values.
    DropNotNull,
    /// Disallow NULL values.
    SetNotNull,
    /// Set or replace the default expression.
    SetDefault(String),
    /// Remove the default expression.
    DropDefault,
}

impl fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(ty) => write!(f, "TYPE {ty}"),
            Self::DropNotNull => f.write_str("DROP NOT NULL"),
            Self::SetNotNull => f.write_str("SET NOT NULL"),
            Self::SetDefault(expr) => write!(f, "SET DEFAULT {expr}"),
            Self::DropDefault => f.write_str("DROP DEFAULT"),
        }
    }
}

/// Alterations for one existing domain.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainAlteration {
    /// Domain name as it exists in the database.
    pub name: ObjectName,
    /// Changes, at most one per attribute.
    pub changes: Vec<AttributeChange>,
}

impl DomainAlteration {
    /// Renders one `ALTER DOMAIN` statement per change.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.changes
            .iter()
            .map(|change| format!("ALTER DOMAIN {} {}", self.name, change))
            .collect()
    }
}

/// Alterations for one existing column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnAlteration {
    /// Column name.
    pub column: ObjectName,
    /// Changes, at most one per attribute.
    pub changes: Vec<AttributeChange>,
}

/// Alterations for one existing table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAlteration {
    /// Table name as it exists in the database.
    pub name: ObjectName,
    /// Declared columns missing from the table.
    pub columns_to_add: Vec<Column>,
    /// Columns whose attributes differ.
    pub columns_to_alter: Vec<ColumnAlteration>,
}

impl TableAlteration {
    /// Renders the statements for this table: column additions first, then
    /// attribute changes.
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        let adds = self
            .columns_to_add
            .iter()
            .map(|column| format!("ALTER TABLE {} ADD {}", self.name, column_definition(column)));

        let alters = self.columns_to_alter.iter().flat_map(|alteration| {
            alteration.changes.iter().map(move |change| {
                format!(
                    "ALTER TABLE {} ALTER COLUMN {} {}",
                    self.name, alteration.column, change
                )
            })
        });

        adds.chain(alters).collect()
    }

    /// Returns true if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns_to_add.is_empty() && self.columns_to_alter.is_empty()
    }
}

/// Result of comparing domains.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainChanges {
    /// Declared domains that do not exist yet.
    pub to_create: Vec<Domain>,
    /// Existing domains that differ from their declaration.
    pub to_alter: Vec<DomainAlteration>,
}

impl DomainChanges {
    /// Returns true if no domain needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_alter.is_empty()
    }
}

/// Result of comparing tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableChanges {
    /// Declared tables that do not exist yet.
    pub to_create: Vec<Table>,
    /// Existing tables that differ from their declaration.
    pub to_alter: Vec<TableAlteration>,
}

impl TableChanges {
    /// Returns true if no table needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_alter.is_empty()
    }
}

/// Compares existing domains against desired ones.
#[must_use]
pub fn compare_domains(existing: &[Domain], desired: &[Domain]) -> DomainChanges {
    let existing_by_name = index_by_name(existing, |d| &d.name);
    let mut changes = DomainChanges::default();

    for domain in desired {
        match existing_by_name.get(&domain.name) {
            None => changes.to_create.push(domain.clone()),
            Some(current) => {
                let attribute_changes = diff_attributes(
                    Some((&current.data_type, &domain.data_type)),
                    (current.nullable, domain.nullable),
                    (current.default.as_deref(), domain.default.as_deref()),
                );
                if !attribute_changes.is_empty() {
                    changes.to_alter.push(DomainAlteration {
                        name: current.name.clone(),
                        changes: attribute_changes,
                    });
                }
            }
        }
    }

    changes
}

/// Compares existing tables against desired ones.
#[must_use]
pub fn compare_tables(existing: &[Table], desired: &[Table]) -> TableChanges {
    let existing_by_name = index_by_name(existing, |t| &t.name);
    let mut changes = TableChanges::default();

    for table in desired {
        match existing_by_name.get(&table.name) {
            None => changes.to_create.push(table.clone()),
            Some(current) => {
                let alteration = diff_table(current, table);
                if !alteration.is_empty() {
                    changes.to_alter.push(alteration);
                }
            }
        }
    }

    changes
}

fn diff_table(existing: &Table, desired: &Table) -> TableAlteration {
    let existing_columns = index_by_name(&existing.columns, |c| &c.name);
    let mut alteration = TableAlteration {
        name: existing.name.clone(),
        columns_to_add: Vec::new(),
        columns_to_alter: Vec::new(),
    };

    for column in desired.ordered_columns() {
        match existing_columns.get(&column.name) {
            None => alteration.columns_to_add.push(column.clone()),
            Some(current) => {
                let changes = diff_column(current, column);
                if !changes.is_empty() {
                    alteration.columns_to_alter.push(ColumnAlteration {
                        column: column.name.clone(),
                        changes,
                    });
                }
            }
        }
    }

    alteration
}

fn diff_column(existing: &Column, desired: &Column) -> Vec<AttributeChange> {
    // Domain bindings are never re-pointed; types are only compared between
    // two raw-typed columns.
    let types = match (&existing.column_type, &desired.column_type) {
        (ColumnType::Data(from), ColumnType::Data(to)) => Some((from, to)),
        _ => None,
    };

    diff_attributes(
        types,
        (existing.nullable, desired.nullable),
        (existing.default.as_deref(), desired.default.as_deref()),
    )
}

fn diff_attributes(
    types: Option<(&String, &String)>,
    nullable: (bool, bool),
    defaults: (Option<&str>, Option<&str>),
) -> Vec<AttributeChange> {
    let mut changes = Vec::new();

    if let Some((from, to)) = types {
        if !from.trim().eq_ignore_ascii_case(to.trim()) {
            changes.push(AttributeChange::Type(to.trim().to_string()));
        }
    }

    match nullable {
        (false, true) => changes.push(AttributeChange::DropNotNull),
        (true, false) => changes.push(AttributeChange::SetNotNull),
        _ => {}
    }

    let (from, to) = defaults;
    if normalize_default(from) != normalize_default(to) {
        match to.map(str::trim).filter(|d| !d.is_empty()) {
            Some(expr) => changes.push(AttributeChange::SetDefault(expr.to_string())),
            None => changes.push(AttributeChange::DropDefault),
        }
    }

    changes
}

/// Normalizes a default expression for comparison: trimmed and upper-cased,
/// with a blank default treated as absent.
#[must_use]
pub fn normalize_default(default: Option<&str>) -> String {
    default.map(|d| d.trim().to_uppercase()).unwrap_or_default()
}

fn index_by_name<'a, T>(
    items: &'a [T],
    name: impl Fn(&'a T) -> &'a ObjectName,
) -> HashMap<&'a ObjectName, &'a T> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(name(item)).or_insert(item);
    }
    map
}
