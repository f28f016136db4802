/// pocketsql SQL front end and executors
///
/// Architecture:
/// - Splitter: cuts a script into statements, honoring quotes and comments
/// - Lexer: tokenizes one statement
/// - Parser: classifies the statement and builds its AST
/// - Evaluators: scalar expressions, predicates, aggregates
/// - Executors: the SELECT pipeline and DDL/DML against the catalog

pub mod token;
pub mod lexer;
pub mod splitter;
pub mod ast;
pub mod parser;
pub mod evaluator;
pub mod predicate;
pub mod aggregate;
pub mod join;
pub mod executor;
pub mod mutation;

pub use token::{Token, TokenType};
pub use lexer::Lexer;
pub use splitter::{split_statements, strip_comments};
pub use ast::{Statement, SelectStmt, InsertStmt, CreateTableStmt, Expr, Predicate};
pub use parser::{parse_statement, Parser, StatementKind};
pub use evaluator::{ExprEvaluator, Scope};
pub use executor::{ModificationKind, QueryExecutor, QueryResult};
pub use mutation::MutationExecutor;
