//! Query Builder SQL generation
//!
//! Statements are rendered with positional `$n` placeholders. Sub-queries
//! (EXISTS, count columns) render into the same writer, so numbering stays
//! continuous across the whole statement.

use super::builder::QueryBuilder;
use super::types::*;
use crate::backends::DatabaseValue;

#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    pub(crate) sql: String,
    pub(crate) params: Vec<DatabaseValue>,
}

impl SqlWriter {
    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn bind(&mut self, value: DatabaseValue) {
        self.params.push(value);
        let placeholder = format!("${}", self.params.len());
        self.sql.push_str(&placeholder);
    }
}

impl<M> QueryBuilder<M> {
    /// Generate SQL with parameter placeholders and return the bound parameters
    pub fn to_sql_with_params(&self) -> (String, Vec<DatabaseValue>) {
        let mut writer = SqlWriter::default();
        match self.query_type {
            QueryType::Select => self.write_select(&mut writer),
            QueryType::Insert => self.write_insert(&mut writer),
            QueryType::Update => self.write_update(&mut writer),
            QueryType::Delete => self.write_delete(&mut writer),
        }
        (writer.sql, writer.params)
    }

    /// Rendered SQL without the parameters
    pub fn to_sql(&self) -> String {
        self.to_sql_with_params().0
    }

    pub(crate) fn write_select(&self, w: &mut SqlWriter) {
        w.push(if self.distinct { "SELECT DISTINCT " } else { "SELECT " });

        let mut columns = self.select_fields.clone();
        if columns.is_empty() {
            match (self.qualifier(), self.count_subqueries.is_empty()) {
                (Some(table), false) => columns.push(format!("{}.*", table)),
                _ => columns.push("*".to_string()),
            }
        }
        w.push(&columns.join(", "));

        for (query, alias) in &self.count_subqueries {
            w.push(", (");
            query.write_select(w);
            w.push(&format!(") AS {}", alias));
        }

        if let Some(table) = &self.table {
            w.push(" FROM ");
            w.push(table);
            if let Some(alias) = &self.table_alias {
                w.push(&format!(" AS {}", alias));
            }
        }

        for join in &self.joins {
            w.push(&format!(" {} {}", join.join_type, join.table));
            if !join.on_conditions.is_empty() {
                let conditions: Vec<String> = join
                    .on_conditions
                    .iter()
                    .map(|(left, right)| format!("{} = {}", left, right))
                    .collect();
                w.push(" ON ");
                w.push(&conditions.join(" AND "));
            }
        }

        self.write_where(w);

        if !self.group_by.is_empty() {
            w.push(&format!(" GROUP BY {}", self.group_by.join(", ")));
        }

        if !self.having_conditions.is_empty() {
            w.push(" HAVING ");
            write_conjunction(w, self.having_conditions.iter());
        }

        if !self.order_by.is_empty() {
            let order_clauses: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            w.push(&format!(" ORDER BY {}", order_clauses.join(", ")));
        }

        if let Some(limit) = self.limit_count {
            w.push(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset_value {
            w.push(&format!(" OFFSET {}", offset));
        }
    }

    fn write_insert(&self, w: &mut SqlWriter) {
        w.push(&format!("INSERT INTO {}", self.target()));

        if self.set_clauses.is_empty() {
            w.push(" DEFAULT VALUES");
        } else {
            let columns: Vec<&str> = self.set_clauses.iter().map(|c| c.column.as_str()).collect();
            w.push(&format!(" ({}) VALUES (", columns.join(", ")));
            for (i, clause) in self.set_clauses.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                write_value(w, &clause.value);
            }
            w.push(")");
        }

        self.write_returning(w);
    }

    fn write_update(&self, w: &mut SqlWriter) {
        w.push(&format!("UPDATE {} SET ", self.target()));
        for (i, clause) in self.set_clauses.iter().enumerate() {
            if i > 0 {
                w.push(", ");
            }
            w.push(&format!("{} = ", clause.column));
            write_value(w, &clause.value);
        }
        self.write_where(w);
        self.write_returning(w);
    }

    fn write_delete(&self, w: &mut SqlWriter) {
        w.push(&format!("DELETE FROM {}", self.target()));
        self.write_where(w);
    }

    fn write_returning(&self, w: &mut SqlWriter) {
        if !self.returning.is_empty() {
            w.push(&format!(" RETURNING {}", self.returning.join(", ")));
        }
    }

    fn write_where(&self, w: &mut SqlWriter) {
        let scope = self.soft_delete_scope();
        let predicates: Vec<&Predicate> = self.predicates.iter().chain(scope.iter()).collect();
        if predicates.is_empty() {
            return;
        }
        w.push(" WHERE ");
        write_conjunction(w, predicates.into_iter());
    }
}

fn write_conjunction<'p>(w: &mut SqlWriter, predicates: impl Iterator<Item = &'p Predicate>) {
    for (i, predicate) in predicates.enumerate() {
        if i > 0 {
            w.push(" AND ");
        }
        write_predicate(w, predicate);
    }
}

fn write_value(w: &mut SqlWriter, value: &DatabaseValue) {
    if value.is_null() {
        w.push("NULL");
    } else {
        w.bind(value.clone());
    }
}

fn write_predicate(w: &mut SqlWriter, predicate: &Predicate) {
    match predicate {
        Predicate::Compare { column, operator, value } => {
            w.push(&format!("{} {} ", column, operator));
            w.bind(value.clone());
        }
        Predicate::Columns { left, operator, right } => {
            w.push(&format!("{} {} {}", left, operator, right));
        }
        Predicate::In { values, negated, .. } if values.is_empty() => {
            w.push(if *negated { "1 = 1" } else { "1 = 0" });
        }
        Predicate::In { column, values, negated } => {
            w.push(&format!("{} {} (", column, if *negated { "NOT IN" } else { "IN" }));
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    w.push(", ");
                }
                w.bind(value.clone());
            }
            w.push(")");
        }
        Predicate::Null { column, negated } => {
            w.push(&format!("{} IS {}", column, if *negated { "NOT NULL" } else { "NULL" }));
        }
        Predicate::Between { column, low, high } => {
            w.push(&format!("{} BETWEEN ", column));
            w.bind(low.clone());
            w.push(" AND ");
            w.bind(high.clone());
        }
        Predicate::Raw { sql, params } => {
            let mut params = params.iter();
            for ch in sql.chars() {
                if ch != '?' {
                    w.sql.push(ch);
                    continue;
                }
                match params.next() {
                    Some(value) => w.bind(value.clone()),
                    None => w.sql.push('?'),
                }
            }
        }
        Predicate::Exists { query, negated } => {
            w.push(if *negated { "NOT EXISTS (" } else { "EXISTS (" });
            query.write_select(w);
            w.push(")");
        }
        Predicate::SubqueryCompare { query, operator, value } => {
            w.push("(");
            query.write_select(w);
            w.push(&format!(") {} ", operator));
            w.bind(value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_with_params() {
        let (sql, params) = QueryBuilder::<()>::table("posts")
            .where_eq("status", "published")
            .where_in("user_id", vec![1, 2])
            .where_between("score", 10, 20)
            .order_by_desc("created_at")
            .limit(5)
            .offset(10)
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM posts WHERE status = $1 AND user_id IN ($2, $3) \
             AND score BETWEEN $4 AND $5 \
             ORDER BY created_at DESC LIMIT 5 OFFSET 10"
        );
        assert_eq!(params.len(), 5);
        assert_eq!(params[0], DatabaseValue::String("published".into()));
    }

    #[test]
    fn test_empty_in_matches_nothing() {
        let sql = QueryBuilder::<()>::table("posts")
            .where_in("id", Vec::<i64>::new())
            .where_not_in("id", Vec::<i64>::new())
            .to_sql();
        assert_eq!(sql, "SELECT * FROM posts WHERE 1 = 0 AND 1 = 1");
    }

    #[test]
    fn test_raw_placeholders_are_renumbered() {
        let (sql, params) = QueryBuilder::<()>::table("posts")
            .where_eq("a", 1)
            .where_raw("(b > ? OR c < ?)", vec![DatabaseValue::Int32(2), DatabaseValue::Int32(3)])
            .to_sql_with_params();

        assert_eq!(sql, "SELECT * FROM posts WHERE a = $1 AND (b > $2 OR c < $3)");
        assert_eq!(
            params,
            vec![DatabaseValue::Int32(1), DatabaseValue::Int32(2), DatabaseValue::Int32(3)]
        );
    }

    #[test]
    fn test_exists_shares_numbering() {
        let sub = QueryBuilder::<()>::table("comments")
            .select_raw("1")
            .where_column("comments.post_id", QueryOperator::Equal, "posts.id")
            .where_eq("comments.approved", true);

        let (sql, params) = QueryBuilder::<()>::table("posts")
            .where_eq("posts.user_id", 7)
            .where_exists(sub)
            .to_sql_with_params();

        assert_eq!(
            sql,
            "SELECT * FROM posts WHERE posts.user_id = $1 AND EXISTS (SELECT 1 FROM comments \
             WHERE comments.post_id = posts.id AND comments.approved = $2)"
        );
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_joins_group_having() {
        let sql = QueryBuilder::<()>::table("users")
            .select("users.id, COUNT(posts.id) AS total")
            .left_join("posts", "posts.user_id", "users.id")
            .group_by("users.id")
            .having("COUNT(posts.id)", QueryOperator::GreaterThan, 3)
            .to_sql();

        assert_eq!(
            sql,
            "SELECT users.id, COUNT(posts.id) AS total FROM users \
             LEFT JOIN posts ON posts.user_id = users.id \
             GROUP BY users.id HAVING COUNT(posts.id) > $1"
        );
    }
}
