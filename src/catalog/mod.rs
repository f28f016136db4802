//! In-memory catalog: table schemas, rows and auto-increment counters

mod registry;
mod table;

pub use registry::Catalog;
pub use table::Table;
