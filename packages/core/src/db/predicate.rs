//! WHERE-clause accumulator
//!
//! Each optional filter contributes zero or one predicate plus the values it
//! binds. The final clause AND-joins every predicate; the bound values line
//! up positionally with the `?` placeholders in the order they were pushed.

use libsql::Value;

#[derive(Debug, Default)]
pub struct PredicateBuilder {
    predicates: Vec<String>,
    params: Vec<Value>,
}

impl PredicateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate with its bound values
    pub fn push(&mut self, predicate: impl Into<String>, values: impl IntoIterator<Item = Value>) {
        self.predicates.push(predicate.into());
        self.params.extend(values);
    }

    /// `column = ?` when `value` is present and non-empty
    pub fn eq_text(&mut self, column: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.push(
                format!("\"{}\" = ?", column),
                [Value::Text(value.to_string())],
            );
        }
    }

    /// ` WHERE a AND b ...`, or an empty string when nothing was added
    fn where_clause(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.predicates.join(" AND "))
        }
    }

    /// Consume the builder, returning the clause and its parameters
    pub fn build(self) -> (String, Vec<Value>) {
        let clause = self.where_clause();
        (clause, self.params)
    }
}
