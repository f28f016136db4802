//! GROUP BY partitioning and aggregate functions.

use super::ast::{ColumnRef, Function};
use crate::types::{Row, Value, ValueKey};
use ahash::{AHashMap, AHashSet};

/// Partition rows by the grouping columns.
///
/// Groups come out in order of first appearance, rows inside a group keep
/// their input order, and NULLs fall into one group. Without grouping
/// columns every row (possibly none) forms a single group.
pub fn partition<'r>(rows: &'r [Row], keys: &[ColumnRef]) -> Vec<Vec<&'r Row>> {
    if keys.is_empty() {
        return vec![rows.iter().collect()];
    }

    let mut index: AHashMap<Vec<ValueKey>, usize> = AHashMap::new();
    let mut groups: Vec<Vec<&Row>> = Vec::new();

    for row in rows {
        let key: Vec<ValueKey> = keys
            .iter()
            .map(|k| row.get(&k.name).map_or(ValueKey::Null, Value::group_key))
            .collect();

        match index.get(&key) {
            Some(&idx) => groups[idx].push(row),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![row]);
            }
        }
    }

    groups
}

/// Drop repeated values, keeping first occurrences (COUNT(DISTINCT x) etc.)
pub fn dedup(values: &mut Vec<Value>) {
    let mut seen = AHashSet::new();
    values.retain(|v| seen.insert(v.group_key()));
}

/// Aggregate one group's argument values.
///
/// - COUNT counts non-NULL values
/// - SUM and AVG read non-numeric values (NULL included) as 0; AVG divides
///   by the number of values, and is NULL for an empty group
/// - MIN and MAX compare numerically: numbers and numeric text take part,
///   NULL and non-numeric text are skipped, and the result is NULL when
///   nothing is left
pub fn compute(func: Function, values: &[Value]) -> Value {
    match func {
        Function::Count => Value::Number(values.iter().filter(|v| !v.is_null()).count() as f64),
        Function::Sum => Value::Number(sum(values)),
        Function::Avg => {
            if values.is_empty() {
                Value::Null
            } else {
                Value::Number(sum(values) / values.len() as f64)
            }
        }
        Function::Min => numeric_extreme(values, f64::min),
        Function::Max => numeric_extreme(values, f64::max),
        _ => Value::Null,
    }
}

fn sum(values: &[Value]) -> f64 {
    values.iter().map(Value::to_number_or_zero).sum()
}

fn numeric_extreme(values: &[Value], pick: fn(f64, f64) -> f64) -> Value {
    values
        .iter()
        .filter_map(Value::as_number)
        .reduce(pick)
        .map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(dept: Value, salary: f64) -> Row {
        [
            ("dept".to_string(), dept),
            ("salary".to_string(), Value::Number(salary)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_partition_keeps_first_appearance_order() {
        let rows = vec![
            row("HR".into(), 1.0),
            row("Eng".into(), 2.0),
            row(Value::Null, 3.0),
            row("HR".into(), 4.0),
            row(Value::Null, 5.0),
        ];
        let groups = partition(&rows, &[ColumnRef::bare("DEPT")]);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][1].get("salary"), Some(&Value::Number(4.0)));
        assert_eq!(groups[2].len(), 2);
    }

    #[test]
    fn test_partition_without_keys_is_one_group() {
        let rows: Vec<Row> = Vec::new();
        let groups = partition(&rows, &[]);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].is_empty());
    }

    #[test]
    fn test_compute() {
        let values = vec![
            Value::Number(10.0),
            Value::Null,
            Value::Text("abc".into()),
            Value::Number(20.0),
        ];
        assert_eq!(compute(Function::Count, &values), Value::Number(3.0));
        assert_eq!(compute(Function::Sum, &values), Value::Number(30.0));
        assert_eq!(compute(Function::Avg, &values), Value::Number(7.5));
        assert_eq!(compute(Function::Min, &values), Value::Number(10.0));
        assert_eq!(compute(Function::Max, &values), Value::Number(20.0));
        assert_eq!(compute(Function::Max, &[Value::Null]), Value::Null);
        assert_eq!(compute(Function::Min, &[Value::from("abc")]), Value::Null);
        assert_eq!(compute(Function::Avg, &[]), Value::Null);
        assert_eq!(compute(Function::Sum, &[]), Value::Number(0.0));
    }

    #[test]
    fn test_min_max_numeric_text() {
        let values = vec![Value::from("5"), Value::from("10"), Value::from("abc")];
        assert_eq!(compute(Function::Max, &values), Value::Number(10.0));
        assert_eq!(compute(Function::Min, &values), Value::Number(5.0));
    }

    #[test]
    fn test_dedup() {
        let mut values = vec![Value::Number(1.0), Value::Number(1.0), Value::Null, Value::Null];
        dedup(&mut values);
        assert_eq!(values, vec![Value::Number(1.0), Value::Null]);
    }
}
