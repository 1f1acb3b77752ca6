//! Naming conventions for tables, foreign keys and pivot tables

/// Simple English pluralization used for conventional table names.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();
    if let Some(stem) = lower.strip_suffix('y') {
        let before = stem.chars().last();
        if matches!(before, Some(c) if !"aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{}es", lower);
    }

    format!("{}s", lower)
}

/// Conventional table name: lower-cased model name, pluralized.
pub fn table_name_for(model_name: &str) -> String {
    pluralize(&model_name.to_lowercase())
}

/// Conventional foreign key: lower-cased model name + `_id`.
pub fn foreign_key_for(model_name: &str) -> String {
    format!("{}_id", model_name.to_lowercase())
}

/// Conventional pivot table for a many-to-many pair.
///
/// Both lower-cased names ordered lexicographically and joined by `_`, so the
/// result does not depend on argument order.
pub fn pivot_table_name(first: &str, second: &str) -> String {
    let mut names = [first.to_lowercase(), second.to_lowercase()];
    names.sort();
    names.join("_")
}

/// Conventional discriminator and id columns of a polymorphic pair
pub fn morph_columns(name: &str) -> (String, String) {
    (format!("{}_type", name), format!("{}_id", name))
}
