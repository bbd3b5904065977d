//! Schema representation types.
//!
//! These types describe domains, tables and procedures. They are used for both
//! sides of a comparison: the schema read from the live database and the schema
//! declared by the definition files.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::parser::type_parameters;

/// A case-insensitive object identifier.
///
/// The original spelling is kept for output, while equality, hashing and
/// ordering use the upper-cased key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectName {
    name: String,
    key: String,
}

impl ObjectName {
    /// Creates a new object name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        let key = name.to_uppercase();
        Self { name, key }
    }

    /// Returns the name as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the normalized comparison key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true if the name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for ObjectName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ObjectName {}

impl Hash for ObjectName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for ObjectName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for ObjectName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ObjectName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<ObjectName> for String {
    fn from(name: ObjectName) -> Self {
        name.name
    }
}

/// A named, reusable column type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// Domain name.
    pub name: ObjectName,
    /// Canonical type text, e.g. `VARCHAR(100)`.
    pub data_type: String,
    /// Length (first type parameter), informational.
    pub length: Option<u32>,
    /// Precision (first type parameter), informational.
    pub precision: Option<u32>,
    /// Scale (second type parameter), informational.
    pub scale: Option<u32>,
    /// Whether values may be NULL.
    pub nullable: bool,
    /// Default expression, without the `DEFAULT` keyword.
    pub default: Option<String>,
}

impl Domain {
    /// Creates a nullable domain without a default.
    ///
    /// Length, precision and scale are taken from the type parameters.
    #[must_use]
    pub fn new(name: impl Into<ObjectName>, data_type: impl Into<String>) -> Self {
        let data_type = data_type.into();
        let (first, second) = type_parameters(&data_type);
        Self {
            name: name.into(),
            data_type,
            length: first,
            precision: first,
            scale: second,
            nullable: true,
            default: None,
        }
    }

    /// Sets the domain as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default expression.
    #[must_use]
    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// The declared type of a column: either a domain reference or a raw type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    /// Column bound to a domain.
    Domain(ObjectName),
    /// Column declared with a primitive type.
    Data(String),
}

impl ColumnType {
    /// Returns the referenced domain, if any.
    #[must_use]
    pub fn domain_name(&self) -> Option<&ObjectName> {
        match self {
            Self::Domain(name) => Some(name),
            Self::Data(_) => None,
        }
    }

    /// Returns the raw type text, if any.
    #[must_use]
    pub fn data_type(&self) -> Option<&str> {
        match self {
            Self::Domain(_) => None,
            Self::Data(ty) => Some(ty),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(name) => write!(f, "{name}"),
            Self::Data(ty) => f.write_str(ty),
        }
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: ObjectName,
    /// Zero-based declaration order.
    pub position: usize,
    /// Domain reference or raw type.
    pub column_type: ColumnType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default expression, without the `DEFAULT` keyword.
    pub default: Option<String>,
}

impl Column {
    /// Creates a nullable column with a raw data type.
    #[must_use]
    pub fn with_type(name: impl Into<ObjectName>, data_type: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Data(data_type.into()))
    }

    /// Creates a nullable column bound to a domain.
    #[must_use]
    pub fn with_domain(name: impl Into<ObjectName>, domain: impl Into<ObjectName>) -> Self {
        Self::new(name, ColumnType::Domain(domain.into()))
    }

    /// Creates a nullable column at position 0.
    #[must_use]
    pub fn new(name: impl Into<ObjectName>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            position: 0,
            column_type,
            nullable: true,
            default: None,
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default expression.
    #[must_use]
    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Sets the ordinal position.
    #[must_use]
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }
}

/// A table and its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: ObjectName,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a new table with no columns.
    #[must_use]
    pub fn new(name: impl Into<ObjectName>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column, assigning it the next position.
    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        let position = self.columns.len();
        self.columns.push(column.at(position));
        self
    }

    /// Gets a column by name (case-insensitive).
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        let key = ObjectName::new(name);
        self.columns.iter().find(|c| c.name == key)
    }

    /// Returns the columns ordered by position.
    #[must_use]
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.position);
        columns
    }
}

/// A stored procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    /// Procedure name.
    pub name: ObjectName,
    /// Everything after the `CREATE PROCEDURE <name>` header.
    pub source_code: String,
    /// Optional comment attached to the procedure.
    pub description: Option<String>,
}

impl Procedure {
    /// Creates a new procedure.
    #[must_use]
    pub fn new(name: impl Into<ObjectName>, source_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_code: source_code.into(),
            description: None,
        }
    }
}

/// One side of a comparison: domains, tables and procedures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Domains.
    pub domains: Vec<Domain>,
    /// Tables.
    pub tables: Vec<Table>,
    /// Procedures.
    pub procedures: Vec<Procedure>,
}

impl SchemaSnapshot {
    /// Creates a snapshot from its three parts.
    #[must_use]
    pub fn new(domains: Vec<Domain>, tables: Vec<Table>, procedures: Vec<Procedure>) -> Self {
        Self {
            domains,
            tables,
            procedures,
        }
    }

    /// Total number of objects.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.domains.len() + self.tables.len() + self.procedures.len()
    }

    /// Returns true if the snapshot holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.object_count() == 0
    }
}
