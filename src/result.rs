//! Per-statement result records handed to the host
//!
//! Records serialize as internally tagged JSON objects:
//! `{"type":"ok","message":…}`, `{"type":"error","message":…,"sql":…}`,
//! `{"type":"table","columns":[…],"rows":[[…]],"row_count":N}`.

use crate::config::truncate_chars;
use crate::error::SqlError;
use crate::sql::{ModificationKind, QueryResult};
use crate::types::Value;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultRecord {
    /// DDL/DML acknowledgment
    Ok { message: String },

    /// The statement failed; `sql` is its full text
    Error { message: String, sql: String },

    /// Tabular output of SELECT, SHOW TABLES, DESCRIBE
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        row_count: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl ResultRecord {
    pub fn ok(message: impl Into<String>) -> Self {
        ResultRecord::Ok { message: message.into() }
    }

    pub fn error(err: &SqlError, sql: &str) -> Self {
        ResultRecord::Error {
            message: err.to_string(),
            sql: sql.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        !self.is_error()
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResultRecord::Error { .. })
    }

    /// Leading `max` characters of the failed statement, if this is an error
    pub fn sql_preview(&self, max: usize) -> Option<&str> {
        match self {
            ResultRecord::Error { sql, .. } => Some(truncate_chars(sql, max)),
            _ => None,
        }
    }
}

impl From<QueryResult> for ResultRecord {
    fn from(result: QueryResult) -> Self {
        match result {
            QueryResult::Select { columns, rows } => {
                let row_count = rows.len();
                let message = (row_count == 0).then(|| "0 rows returned.".to_string());
                ResultRecord::Table { columns, rows, row_count, message }
            }
            QueryResult::Modification { kind, table, affected_rows } => {
                let message = match kind {
                    ModificationKind::Insert => {
                        format!("{} row(s) inserted into '{}'.", affected_rows, table)
                    }
                    ModificationKind::Update => format!("{} row(s) updated.", affected_rows),
                    ModificationKind::Delete => format!("{} row(s) deleted.", affected_rows),
                };
                ResultRecord::Ok { message }
            }
            QueryResult::Definition { message } => ResultRecord::Ok { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modification_messages() {
        let record = ResultRecord::from(QueryResult::Modification {
            kind: ModificationKind::Insert,
            table: "employees".into(),
            affected_rows: 3,
        });
        assert_eq!(record, ResultRecord::ok("3 row(s) inserted into 'employees'."));

        let record = ResultRecord::from(QueryResult::Modification {
            kind: ModificationKind::Delete,
            table: "t".into(),
            affected_rows: 0,
        });
        assert_eq!(record, ResultRecord::ok("0 row(s) deleted."));
    }

    #[test]
    fn test_empty_select_carries_note() {
        let record = ResultRecord::from(QueryResult::Select { columns: vec![], rows: vec![] });
        assert_eq!(
            record,
            ResultRecord::Table {
                columns: vec![],
                rows: vec![],
                row_count: 0,
                message: Some("0 rows returned.".into()),
            }
        );
    }

    #[test]
    fn test_json_shape() {
        let table = ResultRecord::from(QueryResult::Select {
            columns: vec!["id".into(), "name".into()],
            rows: vec![vec![Value::Number(1.0), Value::Null], vec![Value::Number(2.5), "x".into()]],
        });
        assert_eq!(
            serde_json::to_string(&table).unwrap(),
            r#"{"type":"table","columns":["id","name"],"rows":[[1,null],[2.5,"x"]],"row_count":2}"#
        );

        let error = ResultRecord::error(&SqlError::table_not_found("t"), "SELECT * FROM t");
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"type":"error","message":"SchemaError: Table 't' not found","sql":"SELECT * FROM t"}"#
        );
    }

    #[test]
    fn test_sql_preview() {
        let sql = "SELECT ".repeat(20);
        let error = ResultRecord::error(&SqlError::Syntax("bad".into()), &sql);
        assert_eq!(error.sql_preview(80).map(|s| s.chars().count()), Some(80));
        assert!(error.is_error());
        assert_eq!(ResultRecord::ok("fine").sql_preview(80), None);
    }
}
