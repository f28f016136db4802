/// Query executor - runs SELECT, SHOW TABLES and DESCRIBE against the catalog
use super::aggregate;
use super::ast::{Expr, OrderByExpr, SelectColumn, SelectStmt, TableRef};
use super::evaluator::{ExprEvaluator, Scope};
use super::join;
use crate::catalog::{Catalog, Table};
use crate::config::EngineConfig;
use crate::error::{Result, SqlError};
use crate::types::{Row, Value};
use ahash::{AHashMap, AHashSet};
use std::cmp::Ordering;
use tracing::trace;

/// Outcome of one statement, before formatting
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// SELECT / SHOW TABLES / DESCRIBE result
    Select {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },

    /// INSERT/UPDATE/DELETE result
    Modification {
        kind: ModificationKind,
        table: String,
        affected_rows: usize,
    },

    /// CREATE/DROP/ALTER acknowledgment
    Definition {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationKind {
    Insert,
    Update,
    Delete,
}

impl QueryResult {
    pub fn affected_rows(&self) -> usize {
        match self {
            QueryResult::Modification { affected_rows, .. } => *affected_rows,
            QueryResult::Select { rows, .. } => rows.len(),
            QueryResult::Definition { .. } => 0,
        }
    }

    pub fn definition(message: impl Into<String>) -> Self {
        QueryResult::Definition { message: message.into() }
    }
}

/// Select list with the columns behind every `t.*` resolved
struct SelectList<'s> {
    columns: &'s [SelectColumn],
    /// lowercase qualifier -> that table's columns
    qualified: AHashMap<String, Vec<String>>,
}

/// One output row with the ORDER BY keys computed for it
struct ProjectedRow {
    row: Row,
    sort_keys: Vec<Value>,
}

pub struct QueryExecutor<'a> {
    catalog: &'a Catalog,
    config: &'a EngineConfig,
    evaluator: ExprEvaluator,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a EngineConfig) -> Self {
        Self {
            catalog,
            config,
            evaluator: ExprEvaluator::new(),
        }
    }

    /// Run the SELECT pipeline: join, filter, group or project, distinct,
    /// sort, paginate
    pub fn execute_select(&self, stmt: &SelectStmt) -> Result<QueryResult> {
        let base = self.catalog.get(&stmt.from.name)?;
        let mut joined_tables = Vec::with_capacity(stmt.joins.len());
        for clause in &stmt.joins {
            joined_tables.push(self.catalog.get(&clause.table.name)?);
        }
        self.validate_columns(stmt, base, &joined_tables)?;
        let list = self.resolve_select_list(stmt, base, &joined_tables)?;

        // Source + joins
        let mut rows: Vec<Row> = base.rows().to_vec();
        let mut columns: Vec<String> = base.column_names().map(String::from).collect();
        for (clause, table) in stmt.joins.iter().zip(&joined_tables) {
            rows = join::join_rows(rows, &columns, table, clause, self.config.join_semantics);
            for name in table.column_names() {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                    columns.push(name.to_string());
                }
            }
            trace!(table = %table.name(), rows = rows.len(), "joined");
        }

        // Filter
        if let Some(predicate) = &stmt.where_clause {
            let mut kept = Vec::with_capacity(rows.len());
            for row in rows {
                if self.evaluator.eval_predicate(predicate, &Scope::Row(&row))? {
                    kept.push(row);
                }
            }
            rows = kept;
            trace!(rows = rows.len(), "filtered");
        }

        // Group or project
        let mut output = if self.is_grouped(stmt) {
            self.project_groups(stmt, &list, &rows)?
        } else {
            self.project_rows(stmt, &list, &rows)?
        };
        trace!(rows = output.len(), "projected");

        if stmt.distinct {
            let mut seen = AHashSet::new();
            output.retain(|p| seen.insert(p.row.values().map(Value::group_key).collect::<Vec<_>>()));
        }

        // Stable sort, left-to-right keys
        if !stmt.order_by.is_empty() {
            output.sort_by(|a, b| compare_sort_keys(&a.sort_keys, &b.sort_keys, &stmt.order_by));
        }

        // Paginate
        let offset = stmt.offset.unwrap_or(0);
        let limit = stmt.limit.unwrap_or(usize::MAX);
        let page: Vec<Row> = output
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|p| p.row)
            .collect();

        Ok(rows_to_result(page))
    }

    fn is_grouped(&self, stmt: &SelectStmt) -> bool {
        stmt.group_by.is_some()
            || stmt.columns.iter().any(|column| match column {
                SelectColumn::Expr { expr, .. } => expr.contains_aggregate(),
                SelectColumn::Star | SelectColumn::QualifiedStar(_) => false,
            })
    }

    /// Select-list and GROUP BY columns must exist in one of the source tables
    fn validate_columns(&self, stmt: &SelectStmt, base: &Table, joined: &[&Table]) -> Result<()> {
        let known = |name: &str| {
            base.has_column(name) || joined.iter().any(|table| table.has_column(name))
        };

        let mut refs = Vec::new();
        for column in &stmt.columns {
            if let SelectColumn::Expr { expr, .. } = column {
                expr.column_refs(&mut refs);
            }
        }
        if let Some(group_by) = &stmt.group_by {
            refs.extend(group_by.iter());
        }

        match refs.into_iter().find(|col| !known(&col.name)) {
            Some(col) => Err(SqlError::unknown_column(&col.name)),
            None => Ok(()),
        }
    }

    /// Map each `t.*` qualifier to its table; a qualifier naming no source
    /// table is a SchemaError
    fn resolve_select_list<'s>(
        &self,
        stmt: &'s SelectStmt,
        base: &Table,
        joined: &[&Table],
    ) -> Result<SelectList<'s>> {
        let sources: Vec<(&TableRef, &Table)> = std::iter::once((&stmt.from, base))
            .chain(stmt.joins.iter().map(|clause| &clause.table).zip(joined.iter().copied()))
            .collect();

        let mut qualified = AHashMap::new();
        for column in &stmt.columns {
            if let SelectColumn::QualifiedStar(qualifier) = column {
                let (_, table) = sources
                    .iter()
                    .find(|(table_ref, _)| table_ref.answers_to(qualifier))
                    .ok_or_else(|| SqlError::table_not_found(qualifier))?;
                qualified.insert(
                    qualifier.to_lowercase(),
                    table.column_names().map(String::from).collect(),
                );
            }
        }

        Ok(SelectList { columns: &stmt.columns, qualified })
    }

    fn project_rows(
        &self,
        stmt: &SelectStmt,
        list: &SelectList<'_>,
        rows: &[Row],
    ) -> Result<Vec<ProjectedRow>> {
        let mut output = Vec::with_capacity(rows.len());

        for source in rows {
            let row = self.project(list, &Scope::Row(source), Some(source))?;
            let sort_keys = self.sort_keys(&stmt.order_by, &Scope::Layered(&row, source))?;
            output.push(ProjectedRow { row, sort_keys });
        }

        Ok(output)
    }

    /// One output row per group. The select list is computed first; HAVING
    /// and ORDER BY then see those values (aliases included) ahead of the
    /// group's first row.
    fn project_groups(
        &self,
        stmt: &SelectStmt,
        list: &SelectList<'_>,
        rows: &[Row],
    ) -> Result<Vec<ProjectedRow>> {
        let keys = stmt.group_by.as_deref().unwrap_or(&[]);
        let groups = aggregate::partition(rows, keys);
        trace!(groups = groups.len(), "grouped");

        let empty = Row::new();
        let mut output = Vec::with_capacity(groups.len());

        for members in &groups {
            let building = Scope::Group { rows: members, computed: &empty };
            let row = self.project(list, &building, members.first().copied())?;

            let scope = Scope::Group { rows: members, computed: &row };
            if let Some(having) = &stmt.having {
                if !self.evaluator.eval_predicate(having, &scope)? {
                    continue;
                }
            }

            let sort_keys = self.sort_keys(&stmt.order_by, &scope)?;
            output.push(ProjectedRow { row, sort_keys });
        }

        Ok(output)
    }

    /// Evaluate the select list; `*` copies every field of `wildcard_source`,
    /// `t.*` only the fields belonging to `t`
    fn project(
        &self,
        list: &SelectList<'_>,
        scope: &Scope<'_>,
        wildcard_source: Option<&Row>,
    ) -> Result<Row> {
        let mut row = Row::with_capacity(list.columns.len());

        for column in list.columns {
            match column {
                SelectColumn::Star => {
                    if let Some(source) = wildcard_source {
                        row.merge(source);
                    }
                }
                SelectColumn::QualifiedStar(qualifier) => {
                    let (Some(source), Some(names)) =
                        (wildcard_source, list.qualified.get(&qualifier.to_lowercase()))
                    else {
                        continue;
                    };
                    for name in names {
                        row.set(name.clone(), source.get(name).cloned().unwrap_or(Value::Null));
                    }
                }
                SelectColumn::Expr { expr, .. } => {
                    let name = column.output_name().unwrap_or_default();
                    row.set(name, self.evaluator.eval(expr, scope)?);
                }
            }
        }

        Ok(row)
    }

    fn sort_keys(&self, order_by: &[OrderByExpr], scope: &Scope<'_>) -> Result<Vec<Value>> {
        order_by
            .iter()
            .map(|item| match &item.expr {
                Expr::Column(col) => Ok(scope.column(&col.name).unwrap_or(Value::Null)),
                expr => self.evaluator.eval(expr, scope),
            })
            .collect()
    }

    /// `table_name`, `rows` for every table, in creation order
    pub fn show_tables(&self) -> QueryResult {
        if self.catalog.is_empty() {
            return QueryResult::definition("No tables. Use CREATE TABLE to start.");
        }

        let rows = self
            .catalog
            .tables()
            .map(|table| {
                vec![
                    Value::Text(table.name().to_string()),
                    Value::Number(table.row_count() as f64),
                ]
            })
            .collect();

        QueryResult::Select {
            columns: vec!["table_name".to_string(), "rows".to_string()],
            rows,
        }
    }

    /// `column`, `type`, `pk`, `notnull` for each column of a table
    pub fn describe(&self, name: &str) -> Result<QueryResult> {
        let table = self.catalog.get(name)?;
        let flag = |set: bool| Value::Text(if set { "YES" } else { "NO" }.to_string());

        let rows = table
            .columns()
            .iter()
            .map(|column| {
                vec![
                    Value::Text(column.name.clone()),
                    Value::Text(column.data_type.clone()),
                    flag(column.primary_key),
                    flag(column.not_null),
                ]
            })
            .collect();

        Ok(QueryResult::Select {
            columns: ["column", "type", "pk", "notnull"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows,
        })
    }
}

fn compare_sort_keys(a: &[Value], b: &[Value], order_by: &[OrderByExpr]) -> Ordering {
    for ((x, y), item) in a.iter().zip(b).zip(order_by) {
        let ordering = x.sort_cmp(y);
        let ordering = if item.asc { ordering } else { ordering.reverse() };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Columns come from the first row; later rows are read by those names
fn rows_to_result(rows: Vec<Row>) -> QueryResult {
    let columns: Vec<String> = match rows.first() {
        Some(first) => first.columns().map(String::from).collect(),
        None => Vec::new(),
    };

    let rows = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|name| row.get(name).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    QueryResult::Select { columns, rows }
}
