/// Column metadata for table schemas
use serde::Serialize;

/// Integer type tags eligible for primary-key auto-increment
const INTEGER_TYPES: &[&str] = &["INTEGER", "INT", "BIGINT", "SMALLINT", "TINYINT", "SERIAL"];

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Lowercase column name
    pub name: String,
    /// Declared type tag, uppercase, without precision/length
    pub data_type: String,
    pub primary_key: bool,
    pub not_null: bool,
}

impl Column {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            data_type: normalize_type(data_type),
            primary_key: false,
            not_null: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Integer primary keys get auto-increment values on insert
    pub fn is_auto_increment(&self) -> bool {
        self.primary_key && INTEGER_TYPES.contains(&self.data_type.as_str())
    }
}

/// `varchar(255)` -> `VARCHAR`; an empty tag defaults to `TEXT`
pub fn normalize_type(raw: &str) -> String {
    let base = raw.split('(').next().unwrap_or("").trim();
    if base.is_empty() {
        "TEXT".to_string()
    } else {
        base.to_uppercase()
    }
}
