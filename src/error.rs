//! Error types for the pocketsql engine
//!
//! Every variant renders with its category prefix, which is what hosts show
//! in an `Error` record.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SqlError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SqlError {
    /// Statement does not match any recognized grammar
    #[error("SyntaxError: {0}")]
    Syntax(String),

    /// Unknown table/column, or duplicate table on CREATE
    #[error("SchemaError: {0}")]
    Schema(String),

    /// INSERT value group length differs from the resolved column list
    #[error("ArityError: Column count ({expected}) doesn't match value count ({found})")]
    Arity { expected: usize, found: usize },

    /// Recognized but unimplemented statement variant
    #[error("UnsupportedOperationError: {0}")]
    Unsupported(String),
}

impl SqlError {
    pub fn table_not_found(name: &str) -> Self {
        SqlError::Schema(format!("Table '{}' not found", name))
    }

    pub fn table_exists(name: &str) -> Self {
        SqlError::Schema(format!("Table '{}' already exists", name))
    }

    pub fn unknown_column(name: &str) -> Self {
        SqlError::Schema(format!("Unknown column: {}", name))
    }

    /// Category name without the message, e.g. `"SchemaError"`
    pub fn kind(&self) -> &'static str {
        match self {
            SqlError::Syntax(_) => "SyntaxError",
            SqlError::Schema(_) => "SchemaError",
            SqlError::Arity { .. } => "ArityError",
            SqlError::Unsupported(_) => "UnsupportedOperationError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_category() {
        let err = SqlError::table_exists("t");
        assert_eq!(err.to_string(), "SchemaError: Table 't' already exists");
        assert_eq!(err.kind(), "SchemaError");

        let err = SqlError::Arity { expected: 2, found: 3 };
        assert_eq!(
            err.to_string(),
            "ArityError: Column count (2) doesn't match value count (3)"
        );
    }

    #[test]
    fn test_unsupported_prefix() {
        let err = SqlError::Unsupported("Only ADD COLUMN is supported".into());
        assert!(err.to_string().starts_with("UnsupportedOperationError: "));
    }
}
