//! Validated SQL building blocks shared by the reconciler and the HTTP driver.
//!
//! Table and column names arrive from spreadsheets, so they are never spliced
//! into a statement as raw text. Every name goes through [`Identifier::parse`],
//! every type keyword through [`SqlType::parse`], and every
//! `Table(Column)` reference through [`ForeignKeySpec::parse`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// MySQL caps identifiers at 64 characters.
pub const MAX_IDENTIFIER_LEN: usize = 64;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex"));

// `DOUBLE`, `VARCHAR(100)`, `DECIMAL(10, 3)`, `INT UNSIGNED`, `DOUBLE PRECISION`
static SQL_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]+(\s+[A-Za-z]+)?\s*(\(\s*\d+\s*(,\s*\d+\s*)?\))?(\s+UNSIGNED)?$")
        .expect("sql type regex")
});

static FOREIGN_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*\(\s*([A-Za-z_][A-Za-z0-9_]*)\s*\)\s*$")
        .expect("foreign key regex")
});

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Identifier must not be empty")]
    Empty,

    #[error("Identifier '{0}' is longer than 64 characters")]
    TooLong(String),

    #[error("Identifier '{0}' may only contain letters, digits and '_' and must not start with a digit")]
    InvalidCharacters(String),

    #[error("'{0}' is not a recognised SQL type")]
    InvalidType(String),

    #[error("Foreign key '{0}' must have the form Table(Column)")]
    InvalidForeignKey(String),
}

/// A table or column name restricted to `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(IdentifierError::TooLong(name.to_string()));
        }
        if !IDENTIFIER_RE.is_match(name) {
            return Err(IdentifierError::InvalidCharacters(name.to_string()));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Backtick-quoted form for use inside a statement.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

/// A column type keyword such as `DOUBLE` or `VARCHAR(32)`.
///
/// The spreadsheet sentinel `STRING` becomes `TEXT` at parse time, so no
/// statement ever carries it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SqlType(String);

impl SqlType {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let keyword = raw.trim();
        if keyword.eq_ignore_ascii_case("STRING") {
            return Ok(Self::text());
        }
        if !SQL_TYPE_RE.is_match(keyword) {
            return Err(IdentifierError::InvalidType(keyword.to_string()));
        }
        let normalized = keyword
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        Ok(Self(normalized))
    }

    pub fn text() -> Self {
        Self("TEXT".to_string())
    }

    pub fn varchar(width: usize) -> Self {
        Self(format!("VARCHAR({})", width))
    }

    pub fn double() -> Self {
        Self("DOUBLE".to_string())
    }

    pub fn bigint() -> Self {
        Self("BIGINT".to_string())
    }

    pub fn boolean() -> Self {
        Self("BOOLEAN".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A `ReferencedTable(ReferencedColumn)` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub table: Identifier,
    pub column: Identifier,
}

impl ForeignKeySpec {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let caps = FOREIGN_KEY_RE
            .captures(raw)
            .ok_or_else(|| IdentifierError::InvalidForeignKey(raw.trim().to_string()))?;
        Ok(Self {
            table: Identifier::parse(&caps[1])?,
            column: Identifier::parse(&caps[2])?,
        })
    }
}

impl fmt::Display for ForeignKeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.table, self.column)
    }
}
