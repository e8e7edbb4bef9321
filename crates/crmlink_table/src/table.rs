//! Schemaless row container.

use crmlink_codec::{Map, Value};

/// A named list of independent rows.
///
/// Rows do not need to share the same columns. The name is the target
/// entity for bulk writes, or the sheet / document name found on load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularData {
    name: Option<String>,
    rows: Vec<Map>,
}

impl TabularData {
    /// Creates an empty, unnamed table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            rows: Vec::new(),
        }
    }

    /// Creates a table from existing rows.
    #[must_use]
    pub fn from_rows(name: Option<String>, rows: Vec<Map>) -> Self {
        Self { name, rows }
    }

    /// Returns the table name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets or clears the table name.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Returns the rows.
    pub fn rows(&self) -> &[Map] {
        &self.rows
    }

    /// Returns the rows for in-place mutation.
    pub fn rows_mut(&mut self) -> &mut [Map] {
        &mut self.rows
    }

    /// Consumes the table, returning its rows.
    pub fn into_rows(self) -> Vec<Map> {
        self.rows
    }

    /// Appends a row.
    pub fn push(&mut self, row: Map) {
        self.rows.push(row);
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names across all rows, in first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }
        columns
    }

    /// Sets `column` on every row to the value computed from that row.
    ///
    /// ```
    /// use crmlink_codec::{Map, Value};
    /// use crmlink_table::TabularData;
    ///
    /// let mut table = TabularData::from_rows(None, vec![Map::new().with("n", 2)]);
    /// table.lookup("double", |row| {
    ///     Value::from(row.get("n").and_then(Value::as_integer).unwrap_or(0) * 2)
    /// });
    /// assert_eq!(table.rows()[0].get("double"), Some(&Value::Integer(4)));
    /// ```
    pub fn lookup<F>(&mut self, column: &str, mut f: F)
    where
        F: FnMut(&Map) -> Value,
    {
        for row in &mut self.rows {
            let value = f(row);
            row.insert(column, value);
        }
    }
}

impl Extend<Map> for TabularData {
    fn extend<I: IntoIterator<Item = Map>>(&mut self, iter: I) {
        self.rows.extend(iter);
    }
}

impl<'a> IntoIterator for &'a TabularData {
    type Item = &'a Map;
    type IntoIter = std::slice::Iter<'a, Map>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_in_first_seen_order() {
        let table = TabularData::from_rows(
            None,
            vec![
                Map::new().with("b", 1).with("a", 2),
                Map::new().with("c", 3).with("a", 4),
            ],
        );
        assert_eq!(table.columns(), vec!["b", "a", "c"]);
    }

    #[test]
    fn lookup_overwrites_column() {
        let mut table = TabularData::named("account");
        table.push(Map::new().with("name", "a").with("code", 1));
        table.push(Map::new().with("name", "b"));

        table.lookup("code", |row| {
            Value::from(format!("{}!", row.get("name").and_then(Value::as_text).unwrap()))
        });

        assert_eq!(table.rows()[0].get("code"), Some(&Value::from("a!")));
        assert_eq!(table.rows()[1].get("code"), Some(&Value::from("b!")));
    }

    #[test]
    fn rows_are_mutable_in_place() {
        let mut table = TabularData::from_rows(None, vec![Map::new()]);
        table.rows_mut()[0].insert("accountid", "x");
        assert_eq!(table.rows()[0].get("accountid"), Some(&Value::from("x")));
        assert_eq!(table.len(), 1);
    }
}
