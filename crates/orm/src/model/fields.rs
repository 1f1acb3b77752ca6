//! Static field registries
//!
//! Models describe their persisted fields once, as a `&'static [FieldDef]`.
//! The registry is flattened into a [`FieldIndex`] that maps column names,
//! serialization keys and field names to a JSON path inside the model's
//! serialized form.

use std::collections::HashMap;

/// Declaration of one persisted field.
///
/// ```
/// use elif_relations::FieldDef;
///
/// static AUDIT: &[FieldDef] = &[FieldDef::new("created_by").nullable()];
/// static FIELDS: &[FieldDef] = &[
///     FieldDef::new("id"),
///     FieldDef::new("title").column("post_title"),
///     FieldDef::new("audit").embedded(AUDIT).flatten(),
/// ];
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Rust field name
    pub name: &'static str,
    /// Storage tag, the column this field maps to when it differs from the key
    pub column: Option<&'static str>,
    /// Serialization tag, mirrors `#[serde(rename = "...")]`
    pub rename: Option<&'static str>,
    pub nullable: bool,
    /// Sub-structure fields when this field is a struct itself
    pub embedded: Option<&'static [FieldDef]>,
    /// Mirrors `#[serde(flatten)]` on an embedded field
    pub flatten: bool,
}

impl FieldDef {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            column: None,
            rename: None,
            nullable: false,
            embedded: None,
            flatten: false,
        }
    }

    pub const fn column(self, column: &'static str) -> Self {
        Self {
            column: Some(column),
            ..self
        }
    }

    pub const fn rename(self, key: &'static str) -> Self {
        Self {
            rename: Some(key),
            ..self
        }
    }

    pub const fn nullable(self) -> Self {
        Self { nullable: true, ..self }
    }

    pub const fn embedded(self, fields: &'static [FieldDef]) -> Self {
        Self {
            embedded: Some(fields),
            ..self
        }
    }

    pub const fn flatten(self) -> Self {
        Self { flatten: true, ..self }
    }

    /// Key under which serde writes this field
    pub fn json_key(&self) -> &'static str {
        self.rename.unwrap_or(self.name)
    }
}

/// A resolved leaf field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSlot {
    pub name: &'static str,
    /// JSON path from the model root to the value
    pub path: Vec<&'static str>,
    /// Storage column: the storage tag if declared, else the serialization key
    pub column: &'static str,
    pub nullable: bool,
}

/// Lookup index over the leaf fields of a model
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    slots: Vec<FieldSlot>,
    by_tag: HashMap<&'static str, usize>,
    by_key: HashMap<&'static str, usize>,
    by_name: HashMap<String, usize>,
}

impl FieldIndex {
    pub fn build(defs: &'static [FieldDef]) -> Self {
        let mut index = Self::default();
        index.collect(defs, &[]);
        index
    }

    fn collect(&mut self, defs: &'static [FieldDef], prefix: &[&'static str]) {
        for def in defs {
            if let Some(children) = def.embedded {
                let mut nested = prefix.to_vec();
                if !def.flatten {
                    nested.push(def.json_key());
                }
                self.collect(children, &nested);
                continue;
            }

            let mut path = prefix.to_vec();
            path.push(def.json_key());

            let slot = self.slots.len();
            self.slots.push(FieldSlot {
                name: def.name,
                path,
                column: def.column.unwrap_or_else(|| def.json_key()),
                nullable: def.nullable,
            });

            // First declaration wins on collisions.
            if let Some(tag) = def.column {
                self.by_tag.entry(tag).or_insert(slot);
            }
            self.by_key.entry(def.json_key()).or_insert(slot);
            self.by_name.entry(def.name.to_lowercase()).or_insert(slot);
        }
    }

    /// Resolve a logical name: storage tag, then serialization tag, then
    /// case-insensitive field name.
    pub fn resolve(&self, logical: &str) -> Option<&FieldSlot> {
        self.by_tag
            .get(logical)
            .or_else(|| self.by_key.get(logical))
            .or_else(|| self.by_name.get(&logical.to_lowercase()))
            .and_then(|&slot| self.slots.get(slot))
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
