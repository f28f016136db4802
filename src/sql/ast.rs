/// Abstract Syntax Tree for SQL statements
use crate::types::{Column, Value};
use std::fmt;

/// Top-level SQL statement
#[derive(Debug, Clone)]
pub enum Statement {
    CreateTable(CreateTableStmt),
    CreateIndex(CreateIndexStmt),
    Insert(InsertStmt),
    Select(SelectStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    DropTable(DropTableStmt),
    ShowTables,
    Describe(String), // table name
    AlterTable(AlterTableStmt),
}

impl Statement {
    /// Short statement kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::CreateIndex(_) => "CREATE INDEX",
            Statement::Insert(_) => "INSERT",
            Statement::Select(_) => "SELECT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::DropTable(_) => "DROP TABLE",
            Statement::ShowTables => "SHOW TABLES",
            Statement::Describe(_) => "DESCRIBE",
            Statement::AlterTable(_) => "ALTER TABLE",
        }
    }
}

/// SELECT statement
#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub distinct: bool,
    pub columns: Vec<SelectColumn>,
    pub from: TableRef,
    pub joins: Vec<JoinClause>,
    pub where_clause: Option<Predicate>,
    pub group_by: Option<Vec<ColumnRef>>,
    pub having: Option<Predicate>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Table in FROM or JOIN: `table_name [AS alias]`
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// Whether a column qualifier refers to this table
    pub fn answers_to(&self, qualifier: &str) -> bool {
        self.name.eq_ignore_ascii_case(qualifier)
            || self
                .alias
                .as_deref()
                .map_or(false, |alias| alias.eq_ignore_ascii_case(qualifier))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

/// `JOIN table ON a.x = b.y [AND ...]`; `on` is empty for a bare CROSS JOIN
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Vec<(ColumnRef, ColumnRef)>,
}

#[derive(Debug, Clone)]
pub enum SelectColumn {
    /// `*`
    Star,
    /// `t.*`: every column of the table or alias `t`
    QualifiedStar(String),
    /// expression [AS alias]; `text` is the expression as written
    Expr {
        expr: Expr,
        alias: Option<String>,
        text: String,
    },
}

impl SelectColumn {
    /// Output field name: alias, bare column name, or the written expression
    pub fn output_name(&self) -> Option<String> {
        match self {
            SelectColumn::Star | SelectColumn::QualifiedStar(_) => None,
            SelectColumn::Expr { alias: Some(alias), .. } => Some(alias.clone()),
            SelectColumn::Expr { expr: Expr::Column(col), .. } => Some(col.name.to_lowercase()),
            SelectColumn::Expr { text, .. } => Some(text.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub asc: bool, // true = ASC, false = DESC
}

/// INSERT statement
#[derive(Debug, Clone)]
pub struct InsertStmt {
    pub table: String,
    pub columns: Option<Vec<String>>, // None means all columns
    pub values: Vec<Vec<Expr>>,       // one entry per value group
}

/// UPDATE statement
#[derive(Debug, Clone)]
pub struct UpdateStmt {
    pub table: String,
    pub assignments: Vec<(String, Expr)>,
    pub where_clause: Option<Predicate>,
}

/// DELETE statement
#[derive(Debug, Clone)]
pub struct DeleteStmt {
    pub table: String,
    pub where_clause: Option<Predicate>,
}

/// CREATE TABLE statement
#[derive(Debug, Clone)]
pub struct CreateTableStmt {
    pub table: String,
    pub if_not_exists: bool,
    pub columns: Vec<Column>,
}

/// CREATE [UNIQUE] INDEX, acknowledged only
#[derive(Debug, Clone)]
pub struct CreateIndexStmt {
    pub index_name: Option<String>,
    pub table: Option<String>,
}

/// DROP TABLE statement
#[derive(Debug, Clone)]
pub struct DropTableStmt {
    pub table: String,
    pub if_exists: bool,
}

/// ALTER TABLE statement
#[derive(Debug, Clone)]
pub struct AlterTableStmt {
    pub table: String,
    pub action: AlterAction,
}

#[derive(Debug, Clone)]
pub enum AlterAction {
    AddColumn(Column),
}

/// Column reference, optionally qualified (`e.name`), spelled as written.
///
/// Rows are keyed by bare column name, so the qualifier only matters when
/// orienting join conditions. The original spelling is kept because an
/// unresolved identifier in a condition reads as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn bare(name: &str) -> Self {
        Self { table: None, name: name.to_string() }
    }
}

/// Scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Value),
    /// `*` inside COUNT(*)
    Wildcard,
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    FunctionCall {
        func: Function,
        args: Vec<Expr>,
        distinct: bool, // COUNT(DISTINCT column)
    },
}

impl Expr {
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::FunctionCall { func, args, .. } => {
                func.is_aggregate() || args.iter().any(Expr::contains_aggregate)
            }
            Expr::UnaryOp { expr, .. } => expr.contains_aggregate(),
            Expr::BinaryOp { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
            Expr::Column(_) | Expr::Literal(_) | Expr::Wildcard => false,
        }
    }

    /// Every column the expression reads
    pub fn column_refs<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(col) => out.push(col),
            Expr::UnaryOp { expr, .. } => expr.column_refs(out),
            Expr::BinaryOp { left, right, .. } => {
                left.column_refs(out);
                right.column_refs(out);
            }
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.column_refs(out);
                }
            }
            Expr::Literal(_) | Expr::Wildcard => {}
        }
    }
}

/// Canonical text of an expression. Two spellings of the same expression
/// (`count(*)` and `COUNT( * )`) print identically, which lets HAVING and
/// ORDER BY find aggregate values computed for the select list.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(col) => write!(f, "{}", col.name.to_lowercase()),
            Expr::Literal(Value::Text(s)) => write!(f, "'{}'", s),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Wildcard => write!(f, "*"),
            Expr::UnaryOp { op: UnaryOperator::Minus, expr } => write!(f, "-{}", expr),
            Expr::BinaryOp { left, op, right } => write!(f, "({} {} {})", left, op.symbol(), right),
            Expr::FunctionCall { func, args, distinct } => {
                write!(f, "{}(", func.name())?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
}

impl BinaryOperator {
    /// Get operator precedence (higher = tighter binding)
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Sub => 4,
            BinaryOperator::Mul | BinaryOperator::Div => 5,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
        }
    }
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Upper,
    Lower,
    Length,
    Round,
    Abs,
    Trim,
    Substr,
    Coalesce,
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name.to_ascii_uppercase().as_str() {
            "UPPER" => Function::Upper,
            "LOWER" => Function::Lower,
            "LENGTH" | "LEN" => Function::Length,
            "ROUND" => Function::Round,
            "ABS" => Function::Abs,
            "TRIM" => Function::Trim,
            "SUBSTR" | "SUBSTRING" => Function::Substr,
            "COALESCE" => Function::Coalesce,
            "COUNT" => Function::Count,
            "SUM" => Function::Sum,
            "AVG" => Function::Avg,
            "MIN" => Function::Min,
            "MAX" => Function::Max,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Upper => "UPPER",
            Function::Lower => "LOWER",
            Function::Length => "LENGTH",
            Function::Round => "ROUND",
            Function::Abs => "ABS",
            Function::Trim => "TRIM",
            Function::Substr => "SUBSTR",
            Function::Coalesce => "COALESCE",
            Function::Count => "COUNT",
            Function::Sum => "SUM",
            Function::Avg => "AVG",
            Function::Min => "MIN",
            Function::Max => "MAX",
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(
            self,
            Function::Count | Function::Sum | Function::Avg | Function::Min | Function::Max
        )
    }

    /// Accepted argument counts (inclusive)
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Function::Round => (1, 2),
            Function::Substr => (1, 3),
            Function::Coalesce => (1, usize::MAX),
            _ => (1, 1),
        }
    }
}

/// Boolean condition of WHERE / HAVING
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Or(Vec<Predicate>),
    And(Vec<Predicate>),
    Not(Box<Predicate>),
    IsNull {
        expr: Expr,
        negated: bool,
    },
    Between {
        expr: Expr,
        low: Expr,
        high: Expr,
        negated: bool,
    },
    InList {
        expr: Expr,
        list: Vec<Expr>,
        negated: bool,
    },
    Like {
        expr: Expr,
        pattern: Expr,
        negated: bool,
    },
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    /// A condition in no recognized form; always true
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}
