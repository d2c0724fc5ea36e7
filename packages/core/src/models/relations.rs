//! Relationship list helpers shared by the typed variants
//!
//! Every list stores bare ids. Adds are idempotent (a duplicate is a no-op, not
//! an error), removes report whether the list shrank, and only applied changes
//! carry an event.

use crate::events::{Mutation, NodeEvent, Relation, RelationChange};
use crate::models::NodeType;

/// Owner of a relationship list, used to scope events
#[derive(Debug, Clone, Copy)]
pub(crate) struct Owner<'a> {
    pub(crate) node_type: NodeType,
    pub(crate) id: &'a str,
}

impl<'a> Owner<'a> {
    pub(crate) fn new(node_type: NodeType, id: &'a str) -> Self {
        Self { node_type, id }
    }

    pub(crate) fn event(
        &self,
        relation: Relation,
        change: RelationChange,
        target_id: &str,
        kind: Option<&str>,
    ) -> NodeEvent {
        NodeEvent::RelationChanged {
            owner: self.node_type,
            owner_id: self.id.to_string(),
            relation,
            change,
            target_id: target_id.to_string(),
            kind: kind.map(str::to_string),
        }
    }
}

/// Append `target` unless it is blank or already present
pub(crate) fn add_reference(
    list: &mut Vec<String>,
    owner: Owner<'_>,
    relation: Relation,
    target: &str,
) -> Mutation {
    if target.trim().is_empty() {
        tracing::warn!(
            "Rejected empty {} reference on {} {}",
            relation.event_name(),
            owner.node_type,
            owner.id
        );
        return Mutation::unchanged();
    }
    if list.iter().any(|existing| existing == target) {
        return Mutation::unchanged();
    }
    list.push(target.to_string());
    Mutation::applied(owner.event(relation, RelationChange::Added, target, None))
}

/// Remove `target`; applied iff the list got shorter
pub(crate) fn remove_reference(
    list: &mut Vec<String>,
    owner: Owner<'_>,
    relation: Relation,
    target: &str,
) -> Mutation {
    let before = list.len();
    list.retain(|existing| existing != target);
    if list.len() < before {
        Mutation::applied(owner.event(relation, RelationChange::Removed, target, None))
    } else {
        Mutation::unchanged()
    }
}

/// Items stored in keyed detail collections (requirements, constraints, ...)
pub(crate) trait Keyed {
    fn key(&self) -> &str;
}

/// Append a pre-validated item unless another item already has its key
pub(crate) fn add_keyed<T: Keyed>(
    items: &mut Vec<T>,
    owner: Owner<'_>,
    relation: Relation,
    item: T,
    kind: Option<&str>,
) -> Mutation {
    if items.iter().any(|existing| existing.key() == item.key()) {
        return Mutation::unchanged();
    }
    let event = owner.event(relation, RelationChange::Added, item.key(), kind);
    items.push(item);
    Mutation::applied(event)
}

/// Remove every item with `key`; applied iff the collection got shorter
pub(crate) fn remove_keyed<T: Keyed>(
    items: &mut Vec<T>,
    owner: Owner<'_>,
    relation: Relation,
    key: &str,
) -> Mutation {
    let before = items.len();
    items.retain(|existing| existing.key() != key);
    if items.len() < before {
        Mutation::applied(owner.event(relation, RelationChange::Removed, key, None))
    } else {
        Mutation::unchanged()
    }
}

/// Log and reject a malformed payload
pub(crate) fn reject(owner: Owner<'_>, what: &str, reason: &str) -> Mutation {
    tracing::warn!(
        "Rejected {} on {} {}: {}",
        what,
        owner.node_type,
        owner.id,
        reason
    );
    Mutation::unchanged()
}

/// Whether a required text field is present
pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
