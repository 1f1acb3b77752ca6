//! Per-kind batched loading
//!
//! Records are grouped by type; each (type, node) pair issues one query per
//! key chunk, loads the node's children onto the fetched pool, then attaches
//! the results to the parents.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::debug;

use super::eager_loader::EagerLoadNode;
use super::keys::RelationKey;
use crate::backends::{DatabaseRow, DatabaseValue};
use crate::error::{ModelError, OrmResult};
use crate::model::{ModelMeta, Record};
use crate::query::QueryBuilder;
use crate::relationships::{Loaded, MorphToConfig, PivotConfig, RelationKind, Relationship};
use crate::session::Session;

pub(crate) type LoadFuture<'a> = Pin<Box<dyn Future<Output = OrmResult<()>> + Send + 'a>>;

/// Fetched record tagged with the key linking it to its parent
type Fetched = (RelationKey, Box<dyn Record>);

/// Load `nodes` onto `records`, which may mix model types
pub(crate) fn load_nodes<'a, 'b: 'a>(
    session: &'a Session<'a>,
    nodes: &'a [EagerLoadNode],
    records: &'a mut [&'b mut (dyn Record + 'static)],
) -> LoadFuture<'a> {
    Box::pin(async move {
        if records.is_empty() || nodes.is_empty() {
            return Ok(());
        }

        let mut order: Vec<TypeId> = Vec::new();
        let mut groups: HashMap<TypeId, Vec<&mut (dyn Record + 'static)>> = HashMap::new();
        for record in records.iter_mut() {
            let type_id = record.model_meta().type_id;
            if !groups.contains_key(&type_id) {
                order.push(type_id);
            }
            groups.entry(type_id).or_default().push(&mut **record);
        }

        for type_id in order {
            let Some(mut group) = groups.remove(&type_id) else {
                continue;
            };
            for node in nodes {
                load_node(session, node, &mut group).await?;
            }
        }
        Ok(())
    })
}

async fn load_node(
    session: &Session<'_>,
    node: &EagerLoadNode,
    records: &mut [&mut (dyn Record + 'static)],
) -> OrmResult<()> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let meta = first.model_meta();
    let relationship = session.context().relationship(meta.model_name, &node.name)?;

    match relationship.kind() {
        RelationKind::MorphTo(config) => {
            load_morph_to(session, node, &relationship, config, records).await
        }
        RelationKind::BelongsTo
        | RelationKind::HasOne
        | RelationKind::HasMany
        | RelationKind::BelongsToMany(_)
        | RelationKind::MorphOne(_)
        | RelationKind::MorphMany(_)
        | RelationKind::HasOneThrough(_)
        | RelationKind::HasManyThrough(_) => {
            load_keyed(session, node, &relationship, records).await
        }
    }
}

/// Normalized link key of `record`, with the raw value to bind
pub(crate) fn link_key(record: &dyn Record, field: &str) -> Option<(RelationKey, DatabaseValue)> {
    let value = record.key_value(field)?;
    let key = RelationKey::from_value(&value)?;
    Some((key, value))
}

/// Morph class and link key of `record`
pub(crate) fn morph_link(
    record: &dyn Record,
    config: &MorphToConfig,
    id_field: &str,
) -> Option<(String, RelationKey, DatabaseValue)> {
    let class = record.key_value(&config.type_column)?.as_text()?;
    let (key, value) = link_key(record, id_field)?;
    Some((class, key, value))
}

fn distinct_values<'k>(
    keys: impl Iterator<Item = &'k (RelationKey, DatabaseValue)>,
) -> Vec<DatabaseValue> {
    let mut seen = HashSet::new();
    keys.filter(|(key, _)| seen.insert(key.clone()))
        .map(|(_, value)| value.clone())
        .collect()
}

/// Columns selected under the `pivot_` prefix, with the prefix removed
fn pivot_columns(row: &dyn DatabaseRow) -> Vec<(String, DatabaseValue)> {
    row.columns()
        .into_iter()
        .filter_map(|(name, value)| {
            let column = name.strip_prefix(PivotConfig::PREFIX)?;
            Some((column.to_string(), value))
        })
        .collect()
}

/// Run `base` once per chunk of `values`, filtering `column IN (...)`, and
/// hydrate rows as `meta`, keyed by their `alias` column
#[allow(clippy::too_many_arguments)]
async fn fetch_chunks(
    session: &Session<'_>,
    target: &str,
    base: &QueryBuilder,
    meta: &ModelMeta,
    column: &str,
    alias: &str,
    keep_pivot: bool,
    values: &[DatabaseValue],
) -> OrmResult<Vec<Fetched>> {
    let mut fetched = Vec::new();
    for chunk in values.chunks(session.config().max_batch_size) {
        let (sql, params) = base
            .clone()
            .where_in(column, chunk.iter().cloned())
            .to_sql_with_params();
        let rows = session.query(target, &sql, &params).await?;
        debug!("Eager loaded {}: {} key(s), {} row(s)", target, chunk.len(), rows.len());

        for row in &rows {
            // Rows that cannot be linked back to a parent are dropped.
            let Some(key) = row
                .get_by_name(alias)
                .ok()
                .and_then(|value| RelationKey::from_value(&value))
            else {
                continue;
            };
            let mut record = meta.hydrate(&**row)?;
            if keep_pivot {
                record.set_pivot(pivot_columns(&**row));
            }
            fetched.push((key, record));
        }
    }
    Ok(fetched)
}

/// Fetch related records for every kind except `MorphTo`
pub(crate) async fn fetch_keyed(
    session: &Session<'_>,
    relationship: &Relationship,
    node: Option<&EagerLoadNode>,
    values: &[DatabaseValue],
) -> OrmResult<Vec<Fetched>> {
    let related = relationship.related_meta()?;
    let mut base = relationship.get_query()?;
    if let Some(node) = node {
        base = node.constrain(base);
    }

    fetch_chunks(
        session,
        &relationship.describe(),
        &base,
        related,
        &relationship.match_column()?,
        &relationship.match_alias(),
        matches!(relationship.kind(), RelationKind::BelongsToMany(_)),
        values,
    )
    .await
}

/// Fetch `MorphTo` targets of one morph class
pub(crate) async fn fetch_morph(
    session: &Session<'_>,
    relationship: &Relationship,
    node: Option<&EagerLoadNode>,
    meta: &'static ModelMeta,
    values: &[DatabaseValue],
) -> OrmResult<Vec<Fetched>> {
    let owner_key = relationship.local_key();
    let mut base = QueryBuilder::for_meta(meta);
    for constraint in relationship.constraints() {
        base = constraint.apply(base, &meta.table);
    }
    if let Some(node) = node {
        base = node.constrain(base);
    }

    let target = format!("{}<{}>", relationship.describe(), meta.model_name);
    let column = meta.qualified(owner_key);
    fetch_chunks(session, &target, &base, meta, &column, owner_key, false, values).await
}

pub(crate) fn resolve_morph(session: &Session<'_>, class: &str) -> OrmResult<&'static ModelMeta> {
    session
        .context()
        .morph_type(class)
        .ok_or_else(|| ModelError::UnknownMorphType(class.to_string()))
}

async fn load_children(
    session: &Session<'_>,
    node: &EagerLoadNode,
    fetched: &mut [Box<dyn Record>],
) -> OrmResult<()> {
    if node.children.is_empty() || fetched.is_empty() {
        return Ok(());
    }
    let mut pool: Vec<&mut (dyn Record + 'static)> =
        fetched.iter_mut().map(|record| record.as_mut()).collect();
    load_nodes(session, &node.children, &mut pool).await
}

async fn load_keyed(
    session: &Session<'_>,
    node: &EagerLoadNode,
    relationship: &Relationship,
    records: &mut [&mut (dyn Record + 'static)],
) -> OrmResult<()> {
    let many = relationship.is_many();
    let field = relationship.parent_key_field();
    let links: Vec<Option<(RelationKey, DatabaseValue)>> = records
        .iter()
        .map(|record| link_key(&**record, field))
        .collect();

    let values = distinct_values(links.iter().flatten());
    if values.is_empty() {
        for record in records.iter_mut() {
            record.relations_mut().set(&node.name, Loaded::empty(many));
        }
        return Ok(());
    }

    let (keys, mut pool): (Vec<RelationKey>, Vec<Box<dyn Record>>) =
        fetch_keyed(session, relationship, Some(node), &values).await?.into_iter().unzip();
    load_children(session, node, &mut pool).await?;

    let mut grouped: HashMap<RelationKey, Vec<Arc<dyn Record>>> = HashMap::new();
    for (key, record) in keys.into_iter().zip(pool) {
        grouped.entry(key).or_default().push(Arc::from(record));
    }

    for (record, link) in records.iter_mut().zip(links) {
        let matches = link.and_then(|(key, _)| grouped.get(&key));
        let loaded = match matches {
            Some(related) if many => Loaded::Many(related.clone()),
            Some(related) => Loaded::One(related.first().cloned()),
            None => Loaded::empty(many),
        };
        record.relations_mut().set(&node.name, loaded);
    }
    Ok(())
}

async fn load_morph_to(
    session: &Session<'_>,
    node: &EagerLoadNode,
    relationship: &Relationship,
    config: &MorphToConfig,
    records: &mut [&mut (dyn Record + 'static)],
) -> OrmResult<()> {
    let id_field = relationship.foreign_key();
    let links: Vec<Option<(String, RelationKey, DatabaseValue)>> = records
        .iter()
        .map(|record| morph_link(&**record, config, id_field))
        .collect();

    // Resolve every class before the first query so an unknown one fails
    // the node without partial results.
    let mut classes: Vec<(String, &'static ModelMeta, Vec<(RelationKey, DatabaseValue)>)> =
        Vec::new();
    for (class, key, value) in links.iter().flatten() {
        match classes.iter_mut().find(|(name, _, _)| name == class) {
            Some((_, _, keys)) => keys.push((key.clone(), value.clone())),
            None => {
                let meta = resolve_morph(session, class)?;
                classes.push((class.clone(), meta, vec![(key.clone(), value.clone())]));
            }
        }
    }

    let mut tagged: Vec<(String, RelationKey)> = Vec::new();
    let mut pool: Vec<Box<dyn Record>> = Vec::new();
    for (class, meta, keys) in &classes {
        let values = distinct_values(keys.iter());
        for (key, record) in fetch_morph(session, relationship, Some(node), *meta, &values).await? {
            tagged.push((class.clone(), key));
            pool.push(record);
        }
    }
    load_children(session, node, &mut pool).await?;

    let mut resolved: HashMap<(String, RelationKey), Arc<dyn Record>> = HashMap::new();
    for (tag, record) in tagged.into_iter().zip(pool) {
        resolved.entry(tag).or_insert_with(|| Arc::from(record));
    }

    for (record, link) in records.iter_mut().zip(links) {
        let target = link.and_then(|(class, key, _)| resolved.get(&(class, key)).cloned());
        record.relations_mut().set(&node.name, Loaded::One(target));
    }
    Ok(())
}
