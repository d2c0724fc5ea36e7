//! Graph Builder
//!
//! Turns a [`HierarchySnapshot`] into the node/link graph the force-directed
//! view consumes.
//!
//! # Walk
//!
//! root → components → subcomponents → capabilities → functions →
//! specifications → integrations → techniques → applications → inputs → outputs
//!
//! Nodes below the subcomponent level get path-derived ids,
//! `<parent>-<kind>-<id or slug(name)>`, so the same nested record reached
//! through two parents yields two distinct nodes. Typed relationship lists
//! (e.g. `capability.functions`) are filled as children are discovered.

use crate::models::{
    AnyNode, CapabilityNode, Constraint, Dependency, FunctionNode, InputNode, IntegrationNode,
    IoFormat, IoSpec, NodeBase, NodeType, OutputNode, Parameter, Requirement, SecurityLevel,
    SpecificationNode, Standard, StructuralNode, SubcomponentNode,
};
use crate::services::HierarchySnapshot;
use crate::utils::slugify;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

/// Relationship carried by a graph link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Contains,
    HasCapability,
    HasFunction,
    HasSpecification,
    HasIntegration,
    HasTechnique,
    HasApplication,
    HasInput,
    HasOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
}

/// One step of a root-first hierarchy path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
}

impl PathEntry {
    fn from_node(node: &AnyNode) -> Self {
        Self {
            id: node.id().to_string(),
            name: node.name().to_string(),
            node_type: node.node_type(),
        }
    }
}

/// Root-first path from the top of the hierarchy down to `node_id`
///
/// Stops at the first parent that `lookup` cannot resolve, and at any cycle.
pub(crate) fn walk_path<'a, F>(node_id: &str, lookup: F) -> Option<Vec<PathEntry>>
where
    F: Fn(&str) -> Option<&'a AnyNode>,
{
    let target = lookup(node_id)?;
    let mut path = vec![PathEntry::from_node(target)];
    let mut seen: HashSet<&str> = HashSet::from([target.id()]);
    let mut current = target;

    while let Some(parent_id) = current.parent() {
        let Some(parent) = lookup(parent_id) else {
            break;
        };
        if !seen.insert(parent.id()) {
            tracing::warn!("Parent cycle detected at node {}", parent.id());
            break;
        }
        path.push(PathEntry::from_node(parent));
        current = parent;
    }

    path.reverse();
    Some(path)
}

/// Built graph: nodes in discovery order plus parent → child links
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    pub nodes: Vec<AnyNode>,
    pub links: Vec<GraphLink>,
}

impl GraphData {
    pub fn find(&self, node_id: &str) -> Option<&AnyNode> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    /// Root-first `{id, name, type}` entries ending at `node_id`
    pub fn hierarchy_path(&self, node_id: &str) -> Option<Vec<PathEntry>> {
        let index: HashMap<&str, &AnyNode> =
            self.nodes.iter().map(|node| (node.id(), node)).collect();
        walk_path(node_id, |id| index.get(id).copied())
    }

    /// Wire form: `{nodes: [safe records], links: [...]}`
    pub fn to_value(&self) -> Value {
        json!({
            "nodes": self.nodes.iter().map(AnyNode::to_safe_object).collect::<Vec<_>>(),
            "links": self.links,
        })
    }
}

/// One nested level below the subcomponent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tier {
    pub(crate) node_type: NodeType,
    /// Kind fragment used in derived ids
    pub(crate) kind: &'static str,
    pub(crate) link: LinkType,
    /// Collection key on the parent record
    pub(crate) key: &'static str,
    /// Whether a lone object counts as a one-item collection
    pub(crate) accept_single: bool,
}

impl Tier {
    pub(crate) const ALL: [Tier; 8] = [
        Tier::new(
            NodeType::Capability,
            "capability",
            LinkType::HasCapability,
            "capabilities",
            false,
        ),
        Tier::new(
            NodeType::Function,
            "function",
            LinkType::HasFunction,
            "functions",
            false,
        ),
        Tier::new(
            NodeType::Specification,
            "specification",
            LinkType::HasSpecification,
            "specifications",
            true,
        ),
        Tier::new(
            NodeType::Integration,
            "integration",
            LinkType::HasIntegration,
            "integrations",
            false,
        ),
        Tier::new(
            NodeType::Technique,
            "technique",
            LinkType::HasTechnique,
            "techniques",
            true,
        ),
        Tier::new(
            NodeType::Application,
            "application",
            LinkType::HasApplication,
            "applications",
            true,
        ),
        Tier::new(NodeType::Input, "input", LinkType::HasInput, "inputs", true),
        Tier::new(NodeType::Output, "output", LinkType::HasOutput, "outputs", true),
    ];

    const fn new(
        node_type: NodeType,
        kind: &'static str,
        link: LinkType,
        key: &'static str,
        accept_single: bool,
    ) -> Self {
        Self {
            node_type,
            kind,
            link,
            key,
            accept_single,
        }
    }
}

/// Items of a collection field: a list, `{items: [...]}`, or (when allowed) a
/// single object
pub(crate) fn child_items<'a>(record: &'a Value, key: &str, accept_single: bool) -> Vec<&'a Value> {
    match record.get(key) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(map)) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ if accept_single => vec![single],
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Child records of `tier` under `record` that have a `name`
///
/// Specifications may name their integrations under `integration` (object or
/// list), which takes precedence over `integrations`.
pub(crate) fn named_children(record: &Value, tier: Tier) -> Vec<&Value> {
    let items = if tier.node_type == NodeType::Integration {
        match record.get("integration") {
            Some(single @ Value::Object(_)) => vec![single],
            Some(Value::Array(items)) => items.iter().collect(),
            _ => child_items(record, tier.key, tier.accept_single),
        }
    } else {
        child_items(record, tier.key, tier.accept_single)
    };

    items
        .into_iter()
        .filter(|item| item.get("name").and_then(Value::as_str).is_some())
        .collect()
}

fn child_id(parent_id: &str, kind: &str, item: &Value) -> String {
    let suffix = match item.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => slugify(text(item, "name")),
    };
    format!("{}-{}-{}", parent_id, kind, suffix)
}

fn text<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

/// First present key among `keys`
fn field<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key)).filter(|v| !v.is_null())
}

/// Deserialize each element of a list field, skipping entries that do not fit
fn parse_list<T: DeserializeOwned>(record: &Value, key: &str) -> Vec<T> {
    child_items(record, key, false)
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!("Skipping malformed {} entry: {}", key, e);
                None
            }
        })
        .collect()
}

fn parse_field<T: DeserializeOwned>(record: &Value, keys: &[&str]) -> Option<T> {
    field(record, keys).and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn base_record(id: &str, record: &Value, parent: Option<&str>, child_count: usize) -> NodeBase {
    let name = match text(record, "name") {
        "" => id,
        name => name,
    };
    let mut base = NodeBase::with_id(id, name).with_description(text(record, "description"));
    base.parent = parent.map(str::to_string);
    base.expandable = child_count > 0;
    base.has_children = child_count > 0;
    base
}

fn structural(base: NodeBase, node_type: NodeType, child_ids: &[String]) -> Option<AnyNode> {
    let id = base.id.clone();
    match StructuralNode::new(base, node_type) {
        Ok(mut node) => {
            for child in child_ids {
                let _ = node.add_child(child);
            }
            Some(node.into())
        }
        Err(e) => {
            tracing::error!("Cannot build node {}: {}", id, e);
            None
        }
    }
}

/// Typed node for a nested record, with its relationship lists filled
fn typed_node(tier: Tier, base: NodeBase, record: &Value, child_ids: &[String]) -> Option<AnyNode> {
    let parent = base.parent.clone().unwrap_or_default();
    match tier.node_type {
        NodeType::Capability => {
            let mut node = CapabilityNode::new(base);
            for child in child_ids {
                let _ = node.add_function(child);
            }
            let _ = node.add_implementing_subcomponent(&parent);
            if let Some(Value::Object(metrics)) = field(record, &["metrics", "capability_metrics"]) {
                let _ = node.update_metrics(metrics.clone());
            }
            Some(node.into())
        }
        NodeType::Function => {
            let mut node = FunctionNode::new(base);
            for child in child_ids {
                let _ = node.add_specification(child);
            }
            for parameter in parse_list::<Parameter>(record, "parameters") {
                let _ = node.add_parameter(parameter);
            }
            if let Some(signature) = parse_field::<String>(record, &["function_signature", "signature"]) {
                let _ = node.set_signature(Some(signature));
            }
            if let Some(returns) = field(record, &["return_value", "returns"]) {
                let _ = node.set_return_value(Some(returns.clone()));
            }
            Some(node.into())
        }
        NodeType::Specification => {
            let mut node = SpecificationNode::new(base);
            for child in child_ids {
                let _ = node.add_integration(child);
            }
            for requirement in parse_list::<Requirement>(record, "requirements") {
                let _ = node.add_requirement(requirement);
            }
            for standard in parse_list::<Standard>(record, "standards") {
                let _ = node.add_standard(standard);
            }
            if let Some(details) = field(record, &["implementation_details", "implementation"]) {
                let _ = node.set_implementation_details(details.clone());
            }
            Some(node.into())
        }
        NodeType::Integration => {
            let mut node = IntegrationNode::new(base);
            for child in child_ids {
                let _ = node.add_technique(child);
            }
            for constraint in parse_list::<Constraint>(record, "constraints") {
                let _ = node.add_constraint(constraint);
            }
            for dependency in parse_list::<Dependency>(record, "dependencies") {
                let _ = node.add_dependency(dependency);
            }
            if let Some(approach) = field(record, &["integration_approach", "approach"]) {
                let _ = node.set_integration_approach(approach.clone());
            }
            Some(node.into())
        }
        NodeType::Input => {
            let mut node = InputNode::new(base);
            apply_io_fields(record, &mut node.io);
            if let Some(required) = parse_field::<bool>(record, &["required"]) {
                let _ = node.set_required(required);
            }
            if let Some(default_value) = field(record, &["default_value", "default"]) {
                let _ = node.set_default_value(Some(default_value.clone()));
            }
            Some(node.into())
        }
        NodeType::Output => {
            let mut node = OutputNode::new(base);
            apply_io_fields(record, &mut node.io);
            if let Some(frequency) = parse_field(record, &["frequency"]) {
                let _ = node.set_frequency(frequency);
            }
            Some(node.into())
        }
        other => structural(base, other, child_ids),
    }
}

fn apply_io_fields(record: &Value, io: &mut IoSpec) {
    if let Some(io_type) = parse_field::<String>(record, &["io_type"]) {
        io.io_type = io_type;
    }
    if let Some(Value::Object(schema)) = field(record, &["data_schema", "schema"]) {
        io.data_schema = schema.clone();
    }
    if let Some(format) = parse_field::<IoFormat>(record, &["format"]) {
        io.format = format;
    }
    if let Some(sensitive) = parse_field::<bool>(record, &["is_sensitive", "sensitive"]) {
        io.is_sensitive = sensitive;
    }
}

#[derive(Default)]
struct GraphBuilder {
    graph: GraphData,
}

impl GraphBuilder {
    fn link(&mut self, source: &str, target: &str, link_type: LinkType) {
        self.graph.links.push(GraphLink {
            source: source.to_string(),
            target: target.to_string(),
            link_type,
        });
    }

    /// Add the node for `record` at `tier` under `parent_id`, then its subtree
    fn add_tier(&mut self, tier_index: usize, parent_id: &str, record: &Value) {
        let tier = Tier::ALL[tier_index];
        let id = child_id(parent_id, tier.kind, record);

        let next = Tier::ALL.get(tier_index + 1).copied();
        let children = next
            .map(|next| named_children(record, next))
            .unwrap_or_default();
        let child_ids: Vec<String> = match next {
            Some(next) => children
                .iter()
                .map(|child| child_id(&id, next.kind, child))
                .collect(),
            None => Vec::new(),
        };

        let base = base_record(&id, record, Some(parent_id), child_ids.len());
        let Some(node) = typed_node(tier, base, record, &child_ids) else {
            return;
        };
        self.graph.nodes.push(node);
        self.link(parent_id, &id, tier.link);

        for child in children {
            self.add_tier(tier_index + 1, &id, child);
        }
    }
}

/// Resolve a subcomponent's component: explicit `parent`, else the first
/// component id (in id order) contained in the subcomponent id
fn resolve_parent(
    subcomponent_id: &str,
    record: &Value,
    components: &std::collections::BTreeMap<String, Value>,
) -> Option<String> {
    match record.get("parent").and_then(Value::as_str) {
        Some(parent) if !parent.is_empty() => Some(parent.to_string()),
        _ => components
            .keys()
            .find(|component_id| subcomponent_id.contains(component_id.as_str()))
            .cloned(),
    }
}

/// Build the full graph for a snapshot
pub fn build_graph(snapshot: &HierarchySnapshot) -> GraphData {
    let mut builder = GraphBuilder::default();
    let root_id = snapshot.root_id().to_string();

    let placed: Vec<(&String, &Value, String)> = snapshot
        .subcomponents
        .iter()
        .filter_map(|(id, record)| match resolve_parent(id, record, &snapshot.components) {
            Some(parent) => Some((id, record, parent)),
            None => {
                tracing::warn!("Skipping subcomponent {} with no resolvable parent", id);
                None
            }
        })
        .collect();

    // Root
    let component_ids: Vec<String> = snapshot.components.keys().cloned().collect();
    let root_base = base_record(&root_id, &snapshot.root, None, component_ids.len());
    builder
        .graph
        .nodes
        .extend(structural(root_base, NodeType::ComponentGroup, &component_ids));

    // Components
    for (component_id, component) in &snapshot.components {
        let children: Vec<String> = placed
            .iter()
            .filter(|(_, _, parent)| parent == component_id)
            .map(|(id, _, _)| (*id).clone())
            .collect();
        let base = base_record(component_id, component, Some(&root_id), children.len());
        builder
            .graph
            .nodes
            .extend(structural(base, NodeType::Component, &children));
        builder.link(&root_id, component_id, LinkType::Contains);
    }

    // Subcomponents and everything nested below them
    let capability_tier = Tier::ALL[0];
    for (subcomponent_id, record, parent_id) in &placed {
        let capabilities = named_children(record, capability_tier);
        let capability_ids: Vec<String> = capabilities
            .iter()
            .map(|capability| child_id(subcomponent_id, capability_tier.kind, capability))
            .collect();

        let base = base_record(subcomponent_id, record, Some(parent_id), capability_ids.len());
        let mut node = SubcomponentNode::new(base);
        for capability_id in &capability_ids {
            let _ = node.add_capability(capability_id);
        }
        let _ = node.add_implementation(parent_id);
        if let Some(level) =
            parse_field::<SecurityLevel>(record, &["implementationSecurityLevel", "security_level"])
        {
            let _ = node.set_security_level(level);
        }
        builder.graph.nodes.push(node.into());
        builder.link(parent_id, subcomponent_id, LinkType::Contains);

        for capability in capabilities {
            builder.add_tier(0, subcomponent_id, capability);
        }
    }

    tracing::info!(
        "Built graph with {} nodes and {} links",
        builder.graph.nodes.len(),
        builder.graph.links.len()
    );
    builder.graph
}

