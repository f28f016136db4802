/// Predicate evaluator - WHERE / HAVING conditions
use super::ast::{CompareOp, Predicate};
use super::evaluator::{ExprEvaluator, Scope};
use crate::error::Result;
use std::cmp::Ordering;

impl ExprEvaluator {
    /// Test a condition in a scope.
    ///
    /// The subject of every atomic form is evaluated normally, while
    /// right-hand operands fall back to text for unknown bare identifiers.
    /// A NULL subject or operand makes every atomic form false, negated
    /// forms included.
    pub fn eval_predicate(&self, predicate: &Predicate, scope: &Scope<'_>) -> Result<bool> {
        match predicate {
            Predicate::Or(branches) => {
                for branch in branches {
                    if self.eval_predicate(branch, scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::And(parts) => {
                for part in parts {
                    if !self.eval_predicate(part, scope)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Not(inner) => Ok(!self.eval_predicate(inner, scope)?),
            Predicate::IsNull { expr, negated } => {
                let value = self.eval(expr, scope)?;
                Ok(value.is_null() != *negated)
            }
            Predicate::Between { expr, low, high, negated } => {
                let value = self.eval(expr, scope)?;
                let low = self.eval_operand(low, scope)?;
                let high = self.eval_operand(high, scope)?;
                let inside = match (value.compare(&low), value.compare(&high)) {
                    (Some(lo), Some(hi)) => lo != Ordering::Less && hi != Ordering::Greater,
                    _ => return Ok(false),
                };
                Ok(inside != *negated)
            }
            Predicate::InList { expr, list, negated } => {
                let value = self.eval(expr, scope)?;
                if value.is_null() {
                    return Ok(false);
                }
                let mut found = false;
                for item in list {
                    let item = self.eval_operand(item, scope)?;
                    if value.loose_eq(&item) == Some(true) {
                        found = true;
                        break;
                    }
                }
                Ok(found != *negated)
            }
            Predicate::Like { expr, pattern, negated } => {
                let value = self.eval(expr, scope)?;
                let pattern = self.eval_operand(pattern, scope)?;
                if value.is_null() || pattern.is_null() {
                    return Ok(false);
                }
                Ok(self.like(&value.to_text(), &pattern.to_text()) != *negated)
            }
            Predicate::Compare { left, op, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval_operand(right, scope)?;
                Ok(match op {
                    CompareOp::Eq => left.loose_eq(&right) == Some(true),
                    CompareOp::Ne => left.loose_eq(&right) == Some(false),
                    CompareOp::Lt => left.compare(&right) == Some(Ordering::Less),
                    CompareOp::Gt => left.compare(&right) == Some(Ordering::Greater),
                    CompareOp::Le => matches!(
                        left.compare(&right),
                        Some(Ordering::Less | Ordering::Equal)
                    ),
                    CompareOp::Ge => matches!(
                        left.compare(&right),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                })
            }
            Predicate::Unrecognized(_) => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::{ColumnRef, Expr};
    use crate::types::{Row, Value};

    fn col(name: &str) -> Expr {
        Expr::Column(ColumnRef::bare(name))
    }

    fn lit(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    fn sample() -> Row {
        [
            ("id".to_string(), Value::Number(3.0)),
            ("name".to_string(), Value::Text("Alice".into())),
            ("dept".to_string(), Value::Text("Eng".into())),
            ("age".to_string(), Value::Text("30".into())),
            ("manager".to_string(), Value::Null),
        ]
        .into_iter()
        .collect()
    }

    fn check(predicate: &Predicate) -> bool {
        let row = sample();
        ExprEvaluator::new()
            .eval_predicate(predicate, &Scope::Row(&row))
            .unwrap()
    }

    fn compare(left: Expr, op: CompareOp, right: Expr) -> Predicate {
        Predicate::Compare { left, op, right }
    }

    #[test]
    fn test_null_never_equal() {
        assert!(!check(&compare(col("manager"), CompareOp::Eq, lit(Value::Null))));
        assert!(!check(&compare(col("manager"), CompareOp::Ne, lit(Value::Null))));
        assert!(!check(&compare(col("manager"), CompareOp::Ne, lit("x"))));
        assert!(check(&Predicate::IsNull { expr: col("manager"), negated: false }));
        assert!(!check(&Predicate::IsNull { expr: col("name"), negated: false }));
    }

    #[test]
    fn test_loose_and_ordered_comparison() {
        assert!(check(&compare(col("age"), CompareOp::Eq, lit(30.0))));
        assert!(check(&compare(col("age"), CompareOp::Gt, lit(9.0))));
        assert!(check(&compare(col("id"), CompareOp::Le, lit(3.0))));
        assert!(check(&compare(col("name"), CompareOp::Lt, lit("Bob"))));
        assert!(!check(&compare(col("name"), CompareOp::Gt, lit(1.0))));
    }

    #[test]
    fn test_bare_identifier_operand_reads_as_text() {
        assert!(check(&compare(col("dept"), CompareOp::Eq, col("Eng"))));
        assert!(check(&compare(col("name"), CompareOp::Ne, col("dept"))));
    }

    #[test]
    fn test_between_in_like() {
        let between = |negated| Predicate::Between {
            expr: col("id"),
            low: lit(1.0),
            high: lit(3.0),
            negated,
        };
        assert!(check(&between(false)));
        assert!(!check(&between(true)));

        let in_list = Predicate::InList {
            expr: col("dept"),
            list: vec![lit("HR"), col("Eng")],
            negated: false,
        };
        assert!(check(&in_list));

        let not_in_null = Predicate::InList {
            expr: col("manager"),
            list: vec![lit("x")],
            negated: true,
        };
        assert!(!check(&not_in_null));

        let like = Predicate::Like { expr: col("name"), pattern: lit("al%"), negated: false };
        assert!(check(&like));
    }

    #[test]
    fn test_boolean_structure() {
        let t = compare(col("id"), CompareOp::Eq, lit(3.0));
        let f = compare(col("id"), CompareOp::Eq, lit(4.0));
        assert!(check(&Predicate::Or(vec![f.clone(), t.clone()])));
        assert!(!check(&Predicate::And(vec![t.clone(), f.clone()])));
        assert!(check(&Predicate::Not(Box::new(f))));
        assert!(check(&Predicate::Unrecognized("whatever".into())));
    }
}
