//! pocketsql - an embeddable in-memory SQL engine
//!
//! Hand it a script, get one result record per statement back.
//!
//! ## Architecture
//! - Front end: statement splitter + lexer + recursive-descent parser
//! - Catalog: named tables, insertion-ordered rows, auto-increment counters
//! - Evaluators: scalar expressions, predicates, aggregates
//! - Executors: join -> filter -> group/project -> distinct -> sort -> paginate,
//!   and DDL/DML that validates before it mutates
//!
//! ```
//! use pocketsql::{Engine, ResultRecord};
//!
//! let mut engine = Engine::new();
//! let records = engine.execute(
//!     "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
//!      INSERT INTO t (name) VALUES ('Alice');
//!      SELECT * FROM t;",
//! );
//! assert_eq!(records.len(), 3);
//! assert!(matches!(&records[2], ResultRecord::Table { row_count: 1, .. }));
//! ```

pub mod config;
pub mod types;
pub mod catalog;
pub mod sql;

mod engine;
mod error;
mod result;

pub use catalog::{Catalog, Table};
pub use config::{EngineConfig, JoinSemantics};
pub use engine::{execute_script, Engine, SharedEngine};
pub use error::{Result, SqlError};
pub use result::ResultRecord;
pub use types::{Column, Row, Value};
