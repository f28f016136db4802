/// Catalog: the process-lifetime map of table name -> table
use super::Table;
use crate::error::{Result, SqlError};
use ahash::AHashMap;

/// Table names are canonicalized to lowercase. Iteration follows creation order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: AHashMap<String, Table>,
    order: Vec<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new table
    pub fn create_table(&mut self, table: Table) -> Result<()> {
        let name = table.name().to_string();
        if self.tables.contains_key(&name) {
            return Err(SqlError::table_exists(&name));
        }
        self.order.push(name.clone());
        self.tables.insert(name, table);
        Ok(())
    }

    /// Drop a table, returning it
    pub fn drop_table(&mut self, name: &str) -> Result<Table> {
        let name = name.to_lowercase();
        let table = self
            .tables
            .remove(&name)
            .ok_or_else(|| SqlError::table_not_found(&name))?;
        self.order.retain(|n| n != &name);
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Result<&Table> {
        let name = name.to_lowercase();
        self.tables
            .get(&name)
            .ok_or_else(|| SqlError::table_not_found(&name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Table> {
        let name = name.to_lowercase();
        self.tables
            .get_mut(&name)
            .ok_or_else(|| SqlError::table_not_found(&name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    /// Tables in creation order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.order.iter().filter_map(|name| self.tables.get(name))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Remove every table
    pub fn clear(&mut self) {
        self.tables.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Column;

    fn table(name: &str) -> Table {
        Table::new(name, vec![Column::new("id", "INTEGER")])
    }

    #[test]
    fn test_create_and_get_case_insensitive() {
        let mut catalog = Catalog::new();
        catalog.create_table(table("Users")).unwrap();
        assert!(catalog.contains("USERS"));
        assert_eq!(catalog.get("users").unwrap().name(), "users");
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut catalog = Catalog::new();
        catalog.create_table(table("t")).unwrap();
        let err = catalog.create_table(table("T")).unwrap_err();
        assert!(matches!(err, SqlError::Schema(_)));
        assert!(err.to_string().contains("'t'"));
    }

    #[test]
    fn test_creation_order_and_clear() {
        let mut catalog = Catalog::new();
        for name in ["b", "a", "c"] {
            catalog.create_table(table(name)).unwrap();
        }
        catalog.drop_table("a").unwrap();
        catalog.create_table(table("a")).unwrap();

        let names: Vec<&str> = catalog.tables().map(|t| t.name()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);

        catalog.clear();
        assert!(catalog.is_empty());
        assert!(catalog.get("b").is_err());
    }
}
