/// Named row: an insertion-ordered mapping from column name to value
use super::Value;

/// Column names compare case-insensitively. Field order is the order keys
/// were first set, which is also the column order of a SELECT result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { fields: Vec::with_capacity(capacity) }
    }

    /// A row holding NULL for every given column
    pub fn null_filled<'a, I>(columns: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        columns
            .into_iter()
            .map(|name| (name.to_string(), Value::Null))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|idx| &self.fields[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Overwrite in place when the key exists, otherwise append
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Merge `other` into this row; its fields win on name collision
    pub fn merge(&mut self, other: &Row) {
        for (name, value) in &other.fields {
            self.set(name.clone(), value.clone());
        }
    }

    /// Add NULL for each listed column the row does not carry yet
    pub fn fill_missing<'a, I>(&mut self, columns: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for name in columns {
            if !self.contains(name) {
                self.fields.push((name.to_string(), Value::Null));
            }
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}
