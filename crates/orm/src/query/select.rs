//! Query Builder SELECT operations

use super::builder::QueryBuilder;

impl<M> QueryBuilder<M> {
    /// Add SELECT fields to the query
    pub fn select(mut self, fields: &str) -> Self {
        if fields == "*" {
            self.select_fields.push("*".to_string());
        } else {
            self.select_fields
                .extend(fields.split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()));
        }
        self
    }

    /// Add SELECT DISTINCT to the query
    pub fn select_distinct(mut self, fields: &str) -> Self {
        self.distinct = true;
        self.select(fields)
    }

    /// Add custom SELECT expression, kept verbatim
    pub fn select_raw(mut self, expression: &str) -> Self {
        self.select_fields.push(expression.to_string());
        self
    }

    /// Add a COUNT aggregate
    pub fn select_count(mut self, column: &str, alias: Option<&str>) -> Self {
        let select_expr = match alias {
            Some(alias) => format!("COUNT({}) AS {}", column, alias),
            None => format!("COUNT({})", column),
        };
        self.select_fields.push(select_expr);
        self
    }

    /// Replace the projection
    pub(crate) fn reselect(mut self, fields: Vec<String>) -> Self {
        self.select_fields = fields;
        self.count_subqueries.clear();
        self
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }
}
