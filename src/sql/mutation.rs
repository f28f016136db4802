/// Mutation executor - DDL and DML against the catalog
///
/// Every statement validates before it mutates: a failing INSERT appends
/// nothing, a failing UPDATE or DELETE touches no row.
use super::ast::{
    AlterAction, AlterTableStmt, CreateIndexStmt, CreateTableStmt, DeleteStmt, DropTableStmt,
    InsertStmt, Predicate, UpdateStmt,
};
use super::evaluator::{ExprEvaluator, Scope};
use super::executor::{ModificationKind, QueryResult};
use crate::catalog::{Catalog, Table};
use crate::error::{Result, SqlError};
use crate::types::Value;
use ahash::AHashSet;
use tracing::trace;

pub struct MutationExecutor<'a> {
    catalog: &'a mut Catalog,
    evaluator: ExprEvaluator,
}

impl<'a> MutationExecutor<'a> {
    pub fn new(catalog: &'a mut Catalog) -> Self {
        Self {
            catalog,
            evaluator: ExprEvaluator::new(),
        }
    }

    pub fn create_table(&mut self, stmt: CreateTableStmt) -> Result<QueryResult> {
        let table = Table::new(&stmt.table, stmt.columns);
        let name = table.name().to_string();

        if self.catalog.contains(&name) {
            if stmt.if_not_exists {
                return Ok(QueryResult::definition(format!(
                    "Table '{}' already exists, skipped.",
                    name
                )));
            }
            return Err(SqlError::table_exists(&name));
        }

        let mut seen = AHashSet::new();
        if let Some(dup) = table.column_names().find(|c| !seen.insert(*c)) {
            return Err(SqlError::Schema(format!(
                "Duplicate column '{}' in table '{}'",
                dup, name
            )));
        }

        let count = table.columns().len();
        self.catalog.create_table(table)?;
        Ok(QueryResult::definition(format!(
            "Table '{}' created with {} columns.",
            name, count
        )))
    }

    /// Indexes are not maintained; the statement is acknowledged only
    pub fn create_index(&mut self, stmt: CreateIndexStmt) -> Result<QueryResult> {
        trace!(index = ?stmt.index_name, table = ?stmt.table, "index creation ignored");
        Ok(QueryResult::definition("Index created (simulated)"))
    }

    pub fn insert(&mut self, stmt: InsertStmt) -> Result<QueryResult> {
        let table = self.catalog.get_mut(&stmt.table)?;

        // Resolve the target column list against the schema
        let columns: Vec<String> = match &stmt.columns {
            Some(names) => names
                .iter()
                .map(|name| {
                    table
                        .column(name)
                        .map(|c| c.name.clone())
                        .ok_or_else(|| SqlError::unknown_column(name))
                })
                .collect::<Result<_>>()?,
            None => table.column_names().map(String::from).collect(),
        };

        // Arity of every group is checked before anything is evaluated
        if let Some(group) = stmt.values.iter().find(|g| g.len() != columns.len()) {
            return Err(SqlError::Arity {
                expected: columns.len(),
                found: group.len(),
            });
        }

        let mut rows = Vec::with_capacity(stmt.values.len());
        for group in &stmt.values {
            let mut row = table.blank_row();
            for (column, expr) in columns.iter().zip(group) {
                row.set(column.clone(), self.evaluator.eval_operand(expr, &Scope::Empty)?);
            }
            rows.push(row);
        }

        let affected_rows = table.insert_rows(rows);
        Ok(QueryResult::Modification {
            kind: ModificationKind::Insert,
            table: table.name().to_string(),
            affected_rows,
        })
    }

    pub fn update(&mut self, stmt: UpdateStmt) -> Result<QueryResult> {
        let table = self.catalog.get_mut(&stmt.table)?;

        let mut assignments = Vec::with_capacity(stmt.assignments.len());
        for (name, expr) in &stmt.assignments {
            let column = table
                .column(name)
                .ok_or_else(|| SqlError::unknown_column(name))?;
            assignments.push((column.name.clone(), expr));
        }

        // Compute every change first; all values see the row as it was
        let mut changes: Vec<(usize, Vec<Value>)> = Vec::new();
        for (index, row) in table.rows().iter().enumerate() {
            let scope = Scope::Row(row);
            if !row_matches(&self.evaluator, stmt.where_clause.as_ref(), &scope)? {
                continue;
            }
            let values = assignments
                .iter()
                .map(|(_, expr)| self.evaluator.eval_operand(expr, &scope))
                .collect::<Result<Vec<_>>>()?;
            changes.push((index, values));
        }

        let rows = table.rows_mut();
        for (index, values) in &changes {
            for ((column, _), value) in assignments.iter().zip(values) {
                rows[*index].set(column.clone(), value.clone());
            }
        }

        Ok(QueryResult::Modification {
            kind: ModificationKind::Update,
            table: table.name().to_string(),
            affected_rows: changes.len(),
        })
    }

    pub fn delete(&mut self, stmt: DeleteStmt) -> Result<QueryResult> {
        let table = self.catalog.get_mut(&stmt.table)?;

        let mut keep = Vec::with_capacity(table.row_count());
        for row in table.rows() {
            keep.push(!row_matches(&self.evaluator, stmt.where_clause.as_ref(), &Scope::Row(row))?);
        }

        let mut mask = keep.into_iter();
        let affected_rows = table.retain_rows(|_| mask.next().unwrap_or(true));

        Ok(QueryResult::Modification {
            kind: ModificationKind::Delete,
            table: table.name().to_string(),
            affected_rows,
        })
    }

    pub fn drop_table(&mut self, stmt: DropTableStmt) -> Result<QueryResult> {
        if !self.catalog.contains(&stmt.table) && stmt.if_exists {
            return Ok(QueryResult::definition(format!(
                "Table '{}' not found, skipped.",
                stmt.table.to_lowercase()
            )));
        }

        let table = self.catalog.drop_table(&stmt.table)?;
        Ok(QueryResult::definition(format!("Table '{}' dropped.", table.name())))
    }

    pub fn alter_table(&mut self, stmt: AlterTableStmt) -> Result<QueryResult> {
        let table = self.catalog.get_mut(&stmt.table)?;

        match stmt.action {
            AlterAction::AddColumn(column) => {
                let name = column.name.clone();
                table.add_column(column)?;
                Ok(QueryResult::definition(format!(
                    "Column '{}' added to '{}'.",
                    name,
                    table.name()
                )))
            }
        }
    }
}

/// A missing WHERE clause matches every row
fn row_matches(evaluator: &ExprEvaluator, predicate: Option<&Predicate>, scope: &Scope<'_>) -> Result<bool> {
    match predicate {
        Some(predicate) => evaluator.eval_predicate(predicate, scope),
        None => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::parse_statement;
    use crate::types::Row;

    /// Rows of `table` as value lists in schema order
    fn snapshot(table: &Table) -> Vec<Vec<Value>> {
        table
            .rows()
            .iter()
            .map(|row: &Row| {
                table
                    .column_names()
                    .map(|c| row.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect()
    }

    fn run(catalog: &mut Catalog, sql: &str) -> Result<QueryResult> {
        let mut executor = MutationExecutor::new(catalog);
        match parse_statement(sql, 40)? {
            Statement::CreateTable(stmt) => executor.create_table(stmt),
            Statement::CreateIndex(stmt) => executor.create_index(stmt),
            Statement::Insert(stmt) => executor.insert(stmt),
            Statement::Update(stmt) => executor.update(stmt),
            Statement::Delete(stmt) => executor.delete(stmt),
            Statement::DropTable(stmt) => executor.drop_table(stmt),
            Statement::AlterTable(stmt) => executor.alter_table(stmt),
            other => panic!("Not a mutation: {:?}", other),
        }
    }

    fn message(result: QueryResult) -> String {
        match result {
            QueryResult::Definition { message } => message,
            other => panic!("Expected definition, got {:?}", other),
        }
    }

    fn people() -> Catalog {
        let mut catalog = Catalog::new();
        run(&mut catalog, "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INT)").unwrap();
        run(
            &mut catalog,
            "INSERT INTO people (name, age) VALUES ('Ann', 30), ('Bob', 25), ('Cid', NULL)",
        )
        .unwrap();
        catalog
    }

    #[test]
    fn test_create_table_messages() {
        let mut catalog = Catalog::new();
        let created = run(&mut catalog, "CREATE TABLE T (a INT, b VARCHAR(20))").unwrap();
        assert_eq!(message(created), "Table 't' created with 2 columns.");

        let err = run(&mut catalog, "CREATE TABLE t (x TEXT)").unwrap_err();
        assert_eq!(err, SqlError::table_exists("t"));

        let skipped = run(&mut catalog, "CREATE TABLE IF NOT EXISTS t (x TEXT)").unwrap();
        assert_eq!(message(skipped), "Table 't' already exists, skipped.");
        assert_eq!(catalog.get("t").unwrap().columns().len(), 2);

        let dup = run(&mut catalog, "CREATE TABLE d (a INT, A TEXT)").unwrap_err();
        assert!(matches!(dup, SqlError::Schema(_)));
        assert!(!catalog.contains("d"));
    }

    #[test]
    fn test_insert_auto_increment_and_defaults() {
        let catalog = people();
        let table = catalog.get("people").unwrap();
        assert_eq!(
            snapshot(table),
            vec![
                vec![Value::Number(1.0), Value::from("Ann"), Value::Number(30.0)],
                vec![Value::Number(2.0), Value::from("Bob"), Value::Number(25.0)],
                vec![Value::Number(3.0), Value::from("Cid"), Value::Null],
            ]
        );
    }

    #[test]
    fn test_insert_validates_before_appending() {
        let mut catalog = people();
        let err = run(&mut catalog, "INSERT INTO people VALUES (9, 'Dee', 1), (10, 'Eve')").unwrap_err();
        assert_eq!(err, SqlError::Arity { expected: 3, found: 2 });
        assert_eq!(
            err.to_string(),
            "ArityError: Column count (3) doesn't match value count (2)"
        );

        let err = run(&mut catalog, "INSERT INTO people (nick) VALUES ('x')").unwrap_err();
        assert_eq!(err, SqlError::unknown_column("nick"));
        assert_eq!(catalog.get("people").unwrap().row_count(), 3);
    }

    #[test]
    fn test_update_with_expression() {
        let mut catalog = people();
        let result = run(&mut catalog, "UPDATE people SET age = age + 1, name = UPPER(name) WHERE age >= 25").unwrap();
        assert_eq!(result.affected_rows(), 2);

        let rows = snapshot(catalog.get("people").unwrap());
        assert_eq!(rows[0], vec![Value::Number(1.0), Value::from("ANN"), Value::Number(31.0)]);
        assert_eq!(rows[2][1], Value::from("Cid"));

        let err = run(&mut catalog, "UPDATE people SET nick = 'x'").unwrap_err();
        assert_eq!(err, SqlError::unknown_column("nick"));
    }

    #[test]
    fn test_delete_and_monotonic_counter() {
        let mut catalog = people();
        let result = run(&mut catalog, "DELETE FROM people WHERE age IS NULL OR name = 'Ann'").unwrap();
        assert_eq!(result.affected_rows(), 2);

        run(&mut catalog, "INSERT INTO people (name) VALUES ('Dee')").unwrap();
        let rows = snapshot(catalog.get("people").unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], Value::Number(4.0));

        let result = run(&mut catalog, "DELETE FROM people").unwrap();
        assert_eq!(result.affected_rows(), 2);
    }

    #[test]
    fn test_drop_and_alter() {
        let mut catalog = people();
        let added = run(&mut catalog, "ALTER TABLE people ADD COLUMN email TEXT").unwrap();
        assert_eq!(message(added), "Column 'email' added to 'people'.");
        assert_eq!(snapshot(catalog.get("people").unwrap())[0][3], Value::Null);

        assert_eq!(message(run(&mut catalog, "DROP TABLE people").unwrap()), "Table 'people' dropped.");
        assert_eq!(
            message(run(&mut catalog, "DROP TABLE IF EXISTS people").unwrap()),
            "Table 'people' not found, skipped."
        );
        assert_eq!(
            run(&mut catalog, "DROP TABLE people").unwrap_err(),
            SqlError::table_not_found("people")
        );
    }

    #[test]
    fn test_create_index_is_acknowledged() {
        let mut catalog = people();
        let result = run(&mut catalog, "CREATE UNIQUE INDEX idx_name ON people (name)").unwrap();
        assert_eq!(message(result), "Index created (simulated)");
    }
}
