/// Expression evaluator - evaluates expressions against rows and groups
use super::aggregate;
use super::ast::{BinaryOperator, Expr, Function, UnaryOperator};
use crate::error::{Result, SqlError};
use crate::types::{Row, Value};
use ahash::AHashMap;
use parking_lot::RwLock;

/// Compiled LIKE pattern, matched against lowercased text
#[derive(Debug, Clone)]
enum CompiledPattern {
    /// Exact match: "abc" (no wildcards)
    Exact(String),
    /// Prefix match: "abc%"
    Prefix(String),
    /// Suffix match: "%abc"
    Suffix(String),
    /// Contains match: "%abc%"
    Contains(String),
    /// Anything with `_` or several `%`
    Complex(Vec<PatternSegment>),
}

#[derive(Debug, Clone)]
enum PatternSegment {
    Literal(Vec<char>),
    AnyChar,  // _
    AnyChars, // %
}

impl CompiledPattern {
    fn compile(pattern: &str) -> Self {
        let pattern = pattern.to_lowercase();
        let wildcards = pattern.chars().filter(|c| *c == '%').count();

        if !pattern.contains('_') {
            match wildcards {
                0 => return CompiledPattern::Exact(pattern),
                1 => {
                    if let Some(prefix) = pattern.strip_suffix('%') {
                        return CompiledPattern::Prefix(prefix.to_string());
                    }
                    if let Some(suffix) = pattern.strip_prefix('%') {
                        return CompiledPattern::Suffix(suffix.to_string());
                    }
                }
                2 if pattern.len() > 2 => {
                    let inner = pattern.strip_prefix('%').and_then(|p| p.strip_suffix('%'));
                    if let Some(inner) = inner {
                        return CompiledPattern::Contains(inner.to_string());
                    }
                }
                _ => {}
            }
        }

        let mut segments = Vec::new();
        let mut literal = Vec::new();
        for ch in pattern.chars() {
            match ch {
                '%' | '_' => {
                    if !literal.is_empty() {
                        segments.push(PatternSegment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(if ch == '%' {
                        PatternSegment::AnyChars
                    } else {
                        PatternSegment::AnyChar
                    });
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(PatternSegment::Literal(literal));
        }

        CompiledPattern::Complex(segments)
    }

    /// `text` must already be lowercase
    fn matches(&self, text: &str) -> bool {
        match self {
            CompiledPattern::Exact(pattern) => text == pattern,
            CompiledPattern::Prefix(prefix) => text.starts_with(prefix.as_str()),
            CompiledPattern::Suffix(suffix) => text.ends_with(suffix.as_str()),
            CompiledPattern::Contains(substring) => text.contains(substring.as_str()),
            CompiledPattern::Complex(segments) => {
                let chars: Vec<char> = text.chars().collect();
                Self::match_segments(&chars, segments)
            }
        }
    }

    /// Greedy wildcard match that only ever backtracks to the latest `%`,
    /// so it runs in O(text * pattern)
    fn match_segments(text: &[char], segments: &[PatternSegment]) -> bool {
        let (mut t, mut s) = (0, 0);
        // (segment after the latest `%`, text position it currently starts at)
        let mut resume: Option<(usize, usize)> = None;

        while t < text.len() {
            match segments.get(s) {
                Some(PatternSegment::AnyChars) => {
                    s += 1;
                    resume = Some((s, t));
                    continue;
                }
                Some(PatternSegment::AnyChar) => {
                    t += 1;
                    s += 1;
                    continue;
                }
                Some(PatternSegment::Literal(literal)) if text[t..].starts_with(literal) => {
                    t += literal.len();
                    s += 1;
                    continue;
                }
                _ => {}
            }

            // Mismatch: let the latest `%` swallow one more char
            match resume {
                Some((after_star, start)) => {
                    s = after_star;
                    t = start + 1;
                    resume = Some((after_star, t));
                }
                None => return false,
            }
        }

        segments[s..].iter().all(|seg| matches!(seg, PatternSegment::AnyChars))
    }
}

/// Where column references get their values
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// No row at all (INSERT values)
    Empty,
    Row(&'a Row),
    /// A projected row over its source row; the projected side wins
    Layered(&'a Row, &'a Row),
    /// One GROUP BY partition with the values already computed for it
    Group {
        rows: &'a [&'a Row],
        computed: &'a Row,
    },
}

impl<'a> Scope<'a> {
    pub fn column(&self, name: &str) -> Option<Value> {
        match self {
            Scope::Empty => None,
            Scope::Row(row) => row.get(name).cloned(),
            Scope::Layered(top, base) => top.get(name).or_else(|| base.get(name)).cloned(),
            Scope::Group { rows, computed } => computed
                .get(name)
                .or_else(|| rows.first().and_then(|row| row.get(name)))
                .cloned(),
        }
    }
}

pub struct ExprEvaluator {
    /// Pattern cache: pattern string -> compiled pattern
    pattern_cache: RwLock<AHashMap<String, CompiledPattern>>,
}

/// Upper bound on cached LIKE patterns
const PATTERN_CACHE_LIMIT: usize = 256;

impl ExprEvaluator {
    pub fn new() -> Self {
        Self {
            pattern_cache: RwLock::new(AHashMap::new()),
        }
    }

    /// Evaluate an expression in a scope.
    ///
    /// Unknown columns read as NULL. Aggregates need a group scope.
    pub fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> Result<Value> {
        match expr {
            Expr::Column(col) => Ok(scope.column(&col.name).unwrap_or(Value::Null)),
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Wildcard => Err(SqlError::Syntax(
                "'*' is only valid inside COUNT(*)".to_string(),
            )),
            Expr::UnaryOp { op: UnaryOperator::Minus, expr } => {
                let value = self.eval(expr, scope)?;
                Ok(value.as_number().map_or(Value::Null, |n| Value::Number(-n)))
            }
            Expr::BinaryOp { left, op, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                Ok(eval_binary_op(*op, &left, &right))
            }
            Expr::FunctionCall { func, args, distinct } if func.is_aggregate() => match scope {
                Scope::Group { rows, .. } => self.eval_aggregate(*func, args, *distinct, rows),
                _ => Err(SqlError::Syntax(format!(
                    "aggregate function {}() is not allowed here",
                    func.name()
                ))),
            },
            Expr::FunctionCall { func, args, .. } => {
                let values = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(eval_scalar_function(*func, &values))
            }
        }
    }

    /// Evaluate a literal-position operand: a bare identifier that names no
    /// column in scope is read as its own text.
    pub fn eval_operand(&self, expr: &Expr, scope: &Scope<'_>) -> Result<Value> {
        if let Expr::Column(col) = expr {
            if col.table.is_none() {
                return Ok(scope
                    .column(&col.name)
                    .unwrap_or_else(|| Value::Text(col.name.clone())));
            }
        }
        self.eval(expr, scope)
    }

    fn eval_aggregate(
        &self,
        func: Function,
        args: &[Expr],
        distinct: bool,
        rows: &[&Row],
    ) -> Result<Value> {
        let arg = match args.first() {
            // COUNT(*) = group size
            None | Some(Expr::Wildcard) => return Ok(Value::Number(rows.len() as f64)),
            Some(arg) => arg,
        };

        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            values.push(self.eval(arg, &Scope::Row(row))?);
        }
        if distinct {
            aggregate::dedup(&mut values);
        }

        Ok(aggregate::compute(func, &values))
    }

    /// Case-insensitive LIKE, anchored to the whole value
    pub fn like(&self, text: &str, pattern: &str) -> bool {
        let text = text.to_lowercase();

        if let Some(compiled) = self.pattern_cache.read().get(pattern) {
            return compiled.matches(&text);
        }

        let compiled = CompiledPattern::compile(pattern);
        let result = compiled.matches(&text);

        let mut cache = self.pattern_cache.write();
        if cache.len() < PATTERN_CACHE_LIMIT {
            cache.insert(pattern.to_string(), compiled);
        }

        result
    }
}

impl Default for ExprEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// `+ - * /` over numbers; anything non-numeric makes the result NULL.
/// Division by zero follows float semantics (inf / NaN).
fn eval_binary_op(op: BinaryOperator, left: &Value, right: &Value) -> Value {
    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Value::Null;
    };
    Value::Number(match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => a / b,
    })
}

/// Scalar functions over evaluated arguments; NULL in, NULL out
fn eval_scalar_function(func: Function, args: &[Value]) -> Value {
    let first = match args.first() {
        Some(value) => value,
        None => return Value::Null,
    };

    if func == Function::Coalesce {
        return args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null);
    }
    if first.is_null() {
        return Value::Null;
    }

    match func {
        Function::Upper => Value::Text(first.to_text().to_uppercase()),
        Function::Lower => Value::Text(first.to_text().to_lowercase()),
        Function::Length => Value::Number(first.to_text().chars().count() as f64),
        Function::Trim => Value::Text(first.to_text().trim().to_string()),
        Function::Abs => first.as_number().map_or(Value::Null, |n| Value::Number(n.abs())),
        // Numeric result, never a formatted string: ROUND(2.5) is 3, and
        // ROUND(x, 2) keeps only the significant decimals
        Function::Round => {
            let digits = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
            first
                .as_number()
                .map_or(Value::Null, |n| Value::Number(round_to(n, digits as i32)))
        }
        Function::Substr => substring(first, &args[1..]),
        // Aggregates never reach here
        _ => Value::Null,
    }
}

/// Round half away from zero to `digits` decimals
fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

/// SUBSTR(s, start[, len]), 1-based; without a start the value is returned as is
fn substring(value: &Value, args: &[Value]) -> Value {
    let Some(start) = args.first() else {
        return value.clone();
    };
    let Some(start) = start.as_number() else {
        return Value::Null;
    };

    let text = value.to_text();
    let skip = (start.max(1.0) - 1.0) as usize;
    let chars = text.chars().skip(skip);

    let result: String = match args.get(1).map(Value::as_number) {
        None => chars.collect(),
        Some(Some(len)) => chars.take(len.max(0.0) as usize).collect(),
        Some(None) => return Value::Null,
    };
    Value::Text(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::ColumnRef;

    fn row(fields: &[(&str, Value)]) -> Row {
        fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn col(name: &str) -> Expr {
        Expr::Column(ColumnRef::bare(name))
    }

    fn call(func: Function, args: Vec<Expr>) -> Expr {
        Expr::FunctionCall { func, args, distinct: false }
    }

    fn lit(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    #[test]
    fn test_like_patterns() {
        let eval = ExprEvaluator::new();
        assert!(eval.like("Alice", "a%"));
        assert!(eval.like("Alice", "%ICE"));
        assert!(eval.like("Alice", "%li%"));
        assert!(eval.like("Alice", "A_i_e"));
        assert!(eval.like("Alice", "%l%e"));
        assert!(eval.like("", "%"));
        assert!(!eval.like("Alice", "Ali"));
        assert!(!eval.like("Alice", "_lic"));
        assert!(!eval.like("Bob", "%a%"));
        // cached pattern gives the same answer
        assert!(eval.like("alpha", "a%"));
    }

    #[test]
    fn test_like_backtracking() {
        let eval = ExprEvaluator::new();
        assert!(eval.like("abcbcxd", "%bc_d"));
        assert!(!eval.like("abcbcd", "%bc_d"));
        assert!(eval.like("mississippi", "m%iss%pi"));
        assert!(eval.like("aaa", "a%a%a"));
        assert!(!eval.like("aa", "a%a%a"));
        assert!(!eval.like("abc", "a%b_c"));

        // Many `%` over a long non-matching text must finish quickly
        let text = "a".repeat(5_000);
        assert!(!eval.like(&text, "%a%a%a%a%a%a%b"));
        assert!(eval.like(&format!("{}b", text), "%a%a%a%a%a%a%b"));
    }

    #[test]
    fn test_arithmetic() {
        let eval = ExprEvaluator::new();
        let r = row(&[("salary", Value::Number(100.0)), ("name", "x".into())]);
        let scope = Scope::Row(&r);

        let expr = Expr::BinaryOp {
            left: Box::new(col("salary")),
            op: BinaryOperator::Mul,
            right: Box::new(lit(1.5)),
        };
        assert_eq!(eval.eval(&expr, &scope).unwrap(), Value::Number(150.0));

        let div = Expr::BinaryOp {
            left: Box::new(col("salary")),
            op: BinaryOperator::Div,
            right: Box::new(lit(0.0)),
        };
        assert_eq!(eval.eval(&div, &scope).unwrap(), Value::Number(f64::INFINITY));

        let text = Expr::BinaryOp {
            left: Box::new(col("name")),
            op: BinaryOperator::Add,
            right: Box::new(lit(1.0)),
        };
        assert_eq!(eval.eval(&text, &scope).unwrap(), Value::Null);
    }

    #[test]
    fn test_scalar_functions() {
        let eval = ExprEvaluator::new();
        let r = row(&[("name", " Alice ".into()), ("n", Value::Number(-2.346)), ("x", Value::Null)]);
        let scope = Scope::Row(&r);
        let run = |expr: Expr| eval.eval(&expr, &scope).unwrap();

        assert_eq!(run(call(Function::Upper, vec![col("name")])), Value::from(" ALICE "));
        assert_eq!(run(call(Function::Trim, vec![col("name")])), Value::from("Alice"));
        assert_eq!(run(call(Function::Length, vec![col("name")])), Value::Number(7.0));
        assert_eq!(run(call(Function::Abs, vec![col("n")])), Value::Number(2.346));
        assert_eq!(run(call(Function::Round, vec![col("n"), lit(2.0)])), Value::Number(-2.35));
        assert_eq!(run(call(Function::Round, vec![lit(2.5)])), Value::Number(3.0));
        assert_eq!(run(call(Function::Upper, vec![col("x")])), Value::Null);
        assert_eq!(
            run(call(Function::Coalesce, vec![col("x"), col("missing"), lit("d")])),
            Value::from("d")
        );
        assert_eq!(
            run(call(Function::Substr, vec![lit("database"), lit(5.0), lit(3.0)])),
            Value::from("bas")
        );
        assert_eq!(run(call(Function::Substr, vec![lit("database"), lit(5.0)])), Value::from("base"));
        assert_eq!(run(call(Function::Substr, vec![lit("raw")])), Value::from("raw"));
    }

    #[test]
    fn test_operand_fallback_to_text() {
        let eval = ExprEvaluator::new();
        let r = row(&[("dept", "Eng".into())]);
        let scope = Scope::Row(&r);

        assert_eq!(eval.eval_operand(&col("dept"), &scope).unwrap(), Value::from("Eng"));
        assert_eq!(eval.eval_operand(&col("Engineering"), &scope).unwrap(), Value::from("Engineering"));
        assert_eq!(eval.eval(&col("Engineering"), &scope).unwrap(), Value::Null);
    }

    #[test]
    fn test_aggregates_need_group_scope() {
        let eval = ExprEvaluator::new();
        let a = row(&[("salary", Value::Number(10.0))]);
        let b = row(&[("salary", Value::Number(30.0))]);
        let rows = vec![&a, &b];
        let computed = Row::new();
        let group = Scope::Group { rows: &rows, computed: &computed };

        let avg = call(Function::Avg, vec![col("salary")]);
        assert_eq!(eval.eval(&avg, &group).unwrap(), Value::Number(20.0));

        let nested = call(Function::Round, vec![avg.clone(), lit(0.0)]);
        assert_eq!(eval.eval(&nested, &group).unwrap(), Value::Number(20.0));

        let count = call(Function::Count, vec![Expr::Wildcard]);
        assert_eq!(eval.eval(&count, &group).unwrap(), Value::Number(2.0));

        // plain column reads the first row of the group
        assert_eq!(eval.eval(&col("salary"), &group).unwrap(), Value::Number(10.0));

        assert!(matches!(eval.eval(&avg, &Scope::Row(&a)), Err(SqlError::Syntax(_))));
    }
}
