//! JOIN operators over materialized row sets.
//!
//! Every operator is a nested loop: join conditions use loose equality,
//! which does not hash consistently across number/text spellings.

use super::ast::{ColumnRef, JoinClause, JoinType};
use crate::catalog::Table;
use crate::config::JoinSemantics;
use crate::types::Row;

/// Equality keys of one join, oriented as (left column, right column)
struct JoinKeys {
    pairs: Vec<(String, String)>,
}

impl JoinKeys {
    /// Orient `a = b` pairs so the column qualified by the joined table
    /// lands on the right. Unqualified pairs are taken as written.
    fn orient(clause: &JoinClause) -> Self {
        let names_right = |col: &ColumnRef| {
            col.table
                .as_deref()
                .map_or(false, |qualifier| clause.table.answers_to(qualifier))
        };

        let pairs = clause
            .on
            .iter()
            .map(|(a, b)| {
                if names_right(a) && !names_right(b) {
                    (b.name.clone(), a.name.clone())
                } else {
                    (a.name.clone(), b.name.clone())
                }
            })
            .collect();

        Self { pairs }
    }

    /// No keys (bare CROSS JOIN) matches every pair of rows
    fn matches(&self, left: &Row, right: &Row) -> bool {
        self.pairs.iter().all(|(l, r)| match (left.get(l), right.get(r)) {
            (Some(a), Some(b)) => a.loose_eq(b) == Some(true),
            _ => false,
        })
    }
}

/// The join type actually executed under the configured semantics
pub fn effective_type(join_type: JoinType, semantics: JoinSemantics) -> JoinType {
    match (semantics, join_type) {
        (JoinSemantics::LeftCompat, JoinType::Right | JoinType::Full | JoinType::Cross) => {
            JoinType::Left
        }
        (_, join_type) => join_type,
    }
}

/// Join `left` (whose columns are `left_columns`) with every row of `right`.
///
/// Matched pairs merge into one row with right-hand fields winning on name
/// collisions. Unmatched outer rows get NULL for the other side's columns.
pub fn join_rows(
    left: Vec<Row>,
    left_columns: &[String],
    right: &Table,
    clause: &JoinClause,
    semantics: JoinSemantics,
) -> Vec<Row> {
    let keys = JoinKeys::orient(clause);

    match effective_type(clause.join_type, semantics) {
        JoinType::Inner | JoinType::Cross => nested_loop(left, right, &keys, false),
        JoinType::Left => nested_loop(left, right, &keys, true),
        JoinType::Right => right_join(&left, left_columns, right, &keys),
        JoinType::Full => full_join(left, left_columns, right, &keys),
    }
}

fn combine_rows(left: &Row, right: &Row) -> Row {
    let mut combined = Row::with_capacity(left.len() + right.len());
    combined.merge(left);
    combined.merge(right);
    combined
}

fn null_left_row(left_columns: &[String], right: &Row) -> Row {
    let mut row = Row::null_filled(left_columns.iter().map(String::as_str));
    row.merge(right);
    row
}

fn nested_loop(left: Vec<Row>, right: &Table, keys: &JoinKeys, keep_unmatched: bool) -> Vec<Row> {
    let mut result = Vec::new();

    for left_row in left {
        let mut matched = false;

        for right_row in right.rows() {
            if keys.matches(&left_row, right_row) {
                result.push(combine_rows(&left_row, right_row));
                matched = true;
            }
        }

        if !matched && keep_unmatched {
            let mut row = left_row;
            row.fill_missing(right.column_names());
            result.push(row);
        }
    }

    result
}

fn right_join(left: &[Row], left_columns: &[String], right: &Table, keys: &JoinKeys) -> Vec<Row> {
    let mut result = Vec::new();

    for right_row in right.rows() {
        let mut matched = false;

        for left_row in left {
            if keys.matches(left_row, right_row) {
                result.push(combine_rows(left_row, right_row));
                matched = true;
            }
        }

        if !matched {
            result.push(null_left_row(left_columns, right_row));
        }
    }

    result
}

fn full_join(left: Vec<Row>, left_columns: &[String], right: &Table, keys: &JoinKeys) -> Vec<Row> {
    let mut result = Vec::new();
    let mut right_matched = vec![false; right.row_count()];

    for left_row in left {
        let mut matched = false;

        for (idx, right_row) in right.rows().iter().enumerate() {
            if keys.matches(&left_row, right_row) {
                result.push(combine_rows(&left_row, right_row));
                matched = true;
                right_matched[idx] = true;
            }
        }

        if !matched {
            let mut row = left_row;
            row.fill_missing(right.column_names());
            result.push(row);
        }
    }

    for (right_row, matched) in right.rows().iter().zip(right_matched) {
        if !matched {
            result.push(null_left_row(left_columns, right_row));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::TableRef;
    use crate::types::{Column, Value};

    fn emp_rows() -> Vec<Row> {
        vec![
            [("name".to_string(), Value::from("Ann")), ("dept_id".to_string(), Value::from(1i64))]
                .into_iter()
                .collect::<Row>(),
            [("name".to_string(), Value::from("Bob")), ("dept_id".to_string(), Value::from(9i64))]
                .into_iter()
                .collect::<Row>(),
        ]
    }

    fn dept_table() -> Table {
        let mut table = Table::new(
            "dept",
            vec![Column::new("id", "INTEGER"), Column::new("title", "TEXT")],
        );
        let rows: Vec<Row> = [(1i64, "Eng"), (2, "HR")]
            .iter()
            .map(|(id, title)| {
                [("id".to_string(), Value::from(*id)), ("title".to_string(), Value::from(*title))]
                    .into_iter()
                    .collect::<Row>()
            })
            .collect();
        table.insert_rows(rows);
        table
    }

    fn clause(join_type: JoinType) -> JoinClause {
        JoinClause {
            join_type,
            table: TableRef { name: "dept".into(), alias: Some("d".into()) },
            // written with the joined table first to exercise orientation
            on: vec![(
                ColumnRef { table: Some("d".into()), name: "id".into() },
                ColumnRef { table: Some("e".into()), name: "dept_id".into() },
            )],
        }
    }

    fn left_columns() -> Vec<String> {
        vec!["name".to_string(), "dept_id".to_string()]
    }

    fn run(join_type: JoinType, semantics: JoinSemantics) -> Vec<Row> {
        join_rows(emp_rows(), &left_columns(), &dept_table(), &clause(join_type), semantics)
    }

    #[test]
    fn test_inner_join() {
        let rows = run(JoinType::Inner, JoinSemantics::Standard);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("title"), Some(&Value::from("Eng")));
    }

    #[test]
    fn test_left_join_null_fills() {
        let rows = run(JoinType::Left, JoinSemantics::Standard);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Value::from("Bob")));
        assert_eq!(rows[1].get("title"), Some(&Value::Null));
        assert_eq!(rows[1].columns().collect::<Vec<_>>(), vec!["name", "dept_id", "id", "title"]);
    }

    #[test]
    fn test_right_and_full_join() {
        let right = run(JoinType::Right, JoinSemantics::Standard);
        assert_eq!(right.len(), 2);
        assert_eq!(right[1].get("title"), Some(&Value::from("HR")));
        assert_eq!(right[1].get("name"), Some(&Value::Null));

        let full = run(JoinType::Full, JoinSemantics::Standard);
        assert_eq!(full.len(), 3);
        assert_eq!(full[2].get("title"), Some(&Value::from("HR")));
    }

    #[test]
    fn test_left_compat_semantics() {
        let rows = run(JoinType::Right, JoinSemantics::LeftCompat);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("name"), Some(&Value::from("Bob")));
    }

    #[test]
    fn test_cross_join_without_condition() {
        let mut cross = clause(JoinType::Cross);
        cross.on.clear();
        let rows = join_rows(emp_rows(), &left_columns(), &dept_table(), &cross, JoinSemantics::Standard);
        assert_eq!(rows.len(), 4);
    }
}
