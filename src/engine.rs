//! Script driver: one catalog, many statements
//!
//! A script is split into statements which run strictly in order. Each
//! statement yields at most one [`ResultRecord`]; a failure becomes an
//! `Error` record and the next statement still runs.

use crate::catalog::Catalog;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::result::ResultRecord;
use crate::sql::{
    parse_statement, split_statements, strip_comments, MutationExecutor, QueryExecutor,
    QueryResult, Statement,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An in-memory SQL engine owning its tables
#[derive(Debug, Default)]
pub struct Engine {
    catalog: Catalog,
    config: EngineConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            catalog: Catalog::new(),
            config,
        }
    }

    /// Run every statement of `script`, collecting one record per statement
    /// that produced output
    pub fn execute(&mut self, script: &str) -> Vec<ResultRecord> {
        let mut records = Vec::new();

        for raw in split_statements(script) {
            let sql = strip_comments(raw);
            if sql.is_empty() {
                continue;
            }

            let record = match self.execute_statement(&sql) {
                Ok(result) => ResultRecord::from(result),
                Err(err) => {
                    warn!(error = %err, sql = %sql, "statement failed");
                    ResultRecord::error(&err, raw)
                }
            };
            records.push(record);
        }

        records
    }

    fn execute_statement(&mut self, sql: &str) -> Result<QueryResult> {
        let statement = parse_statement(sql, self.config.statement_preview_chars)?;
        debug!(kind = statement.kind(), "executing statement");

        match statement {
            Statement::Select(stmt) => {
                QueryExecutor::new(&self.catalog, &self.config).execute_select(&stmt)
            }
            Statement::ShowTables => Ok(QueryExecutor::new(&self.catalog, &self.config).show_tables()),
            Statement::Describe(name) => {
                QueryExecutor::new(&self.catalog, &self.config).describe(&name)
            }
            Statement::CreateTable(stmt) => MutationExecutor::new(&mut self.catalog).create_table(stmt),
            Statement::CreateIndex(stmt) => MutationExecutor::new(&mut self.catalog).create_index(stmt),
            Statement::Insert(stmt) => MutationExecutor::new(&mut self.catalog).insert(stmt),
            Statement::Update(stmt) => MutationExecutor::new(&mut self.catalog).update(stmt),
            Statement::Delete(stmt) => MutationExecutor::new(&mut self.catalog).delete(stmt),
            Statement::DropTable(stmt) => MutationExecutor::new(&mut self.catalog).drop_table(stmt),
            Statement::AlterTable(stmt) => MutationExecutor::new(&mut self.catalog).alter_table(stmt),
        }
    }

    /// Drop every table
    pub fn reset(&mut self) {
        info!(tables = self.catalog.len(), "resetting catalog");
        self.catalog.clear();
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Thread-safe handle: each script runs under one lock
#[derive(Debug, Clone, Default)]
pub struct SharedEngine(Arc<Mutex<Engine>>);

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self(Arc::new(Mutex::new(engine)))
    }

    pub fn execute(&self, script: &str) -> Vec<ResultRecord> {
        self.0.lock().execute(script)
    }

    pub fn reset(&self) {
        self.0.lock().reset();
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut self.0.lock())
    }
}

/// Run a script against a fresh, empty engine
pub fn execute_script(script: &str) -> Vec<ResultRecord> {
    Engine::new().execute(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn test_statements_see_earlier_effects() {
        let mut engine = Engine::new();
        let records = engine.execute(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO t (name) VALUES ('Alice');
             SELECT * FROM t;",
        );
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[2],
            ResultRecord::Table {
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec![Value::Number(1.0), Value::from("Alice")]],
                row_count: 1,
                message: None,
            }
        );
    }

    #[test]
    fn test_error_keeps_raw_statement_text() {
        let records = execute_script("SELCT 1 -- typo");
        assert_eq!(records.len(), 1);
        let ResultRecord::Error { message, sql } = &records[0] else {
            panic!("Expected error")
        };
        assert!(message.starts_with("SyntaxError: unknown statement"));
        assert_eq!(sql, "SELCT 1 -- typo");
    }

    #[test]
    fn test_comment_only_statements_yield_nothing() {
        let records = execute_script("-- nothing here\n; /* nor here */ ;");
        assert!(records.is_empty());
    }

    #[test]
    fn test_reset_and_shared_engine() {
        let shared = SharedEngine::default();
        shared.execute("CREATE TABLE a (x INT); CREATE TABLE b (y INT)");
        assert_eq!(shared.with(|engine| engine.catalog().len()), 2);

        let other = shared.clone();
        other.reset();
        assert!(shared.with(|engine| engine.catalog().is_empty()));
        assert_eq!(
            shared.execute("SHOW TABLES"),
            vec![ResultRecord::ok("No tables. Use CREATE TABLE to start.")]
        );
    }
}
