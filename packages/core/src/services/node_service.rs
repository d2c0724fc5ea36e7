//! Node Service
//!
//! In-memory owner of a set of nodes plus the event bus their mutations are
//! published on.
//!
//! # Responsibilities
//!
//! - Holding nodes by id (insert, lookup, removal without cascade)
//! - Running mutators and dispatching the events they return
//! - Hierarchy queries over `parent` references
//! - Bulk loading from a built graph and safe export
//!
//! Nodes never publish on their own; [`NodeService::apply`] is the single
//! place where a mutation's events reach subscribers.

use crate::events::{EventBus, Mutation};
use crate::models::{AnyNode, ValidationError};
use crate::services::graph_builder::{build_graph, walk_path, GraphData, PathEntry};
use crate::services::{HierarchySource, NodeServiceError};
use serde_json::Value;
use std::collections::HashMap;

/// Summary of a bulk load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub nodes: usize,
    pub links: usize,
    /// Nodes rejected by `insert` (duplicate id or invalid record)
    pub skipped: usize,
}

/// Owner of nodes and their event bus
#[derive(Debug, Default)]
pub struct NodeService {
    nodes: HashMap<String, AnyNode>,
    /// Insertion order, for deterministic iteration
    order: Vec<String>,
    bus: EventBus,
}

impl NodeService {
    pub fn new(bus: EventBus) -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            bus,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a node
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the node's record is invalid
    /// - `DuplicateNode` if a node with the same id is already held
    pub fn insert(&mut self, node: AnyNode) -> Result<(), NodeServiceError> {
        node.validate()?;
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(NodeServiceError::duplicate_node(id));
        }
        tracing::debug!("Inserted {} node {}", node.node_type(), id);
        self.order.push(id.clone());
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn get(&self, node_id: &str) -> Option<&AnyNode> {
        self.nodes.get(node_id)
    }

    /// Drop a node; its children are left in place as orphans
    pub fn remove(&mut self, node_id: &str) -> Option<AnyNode> {
        let removed = self.nodes.remove(node_id)?;
        self.order.retain(|id| id != node_id);
        Some(removed)
    }

    /// Nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &AnyNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Nodes whose `parent` is `node_id`, in insertion order
    pub fn children_of(&self, node_id: &str) -> Vec<&AnyNode> {
        self.iter()
            .filter(|node| node.parent() == Some(node_id))
            .collect()
    }

    /// Run a mutator on one node and publish its events
    ///
    /// Returns whether the mutation was applied. A mutator that changes the
    /// node's id is rejected with `ValidationFailed`; the held node is left
    /// as it was and nothing is published.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use alignviz_core::models::{AnyNode, FunctionNode, NodeBase};
    /// use alignviz_core::services::NodeService;
    ///
    /// let mut service = NodeService::default();
    /// service.insert(FunctionNode::new(NodeBase::with_id("f1", "Score")).into())?;
    ///
    /// let applied = service.apply("f1", |node| match node {
    ///     AnyNode::Function(function) => function.add_specification("s1"),
    ///     _ => Default::default(),
    /// })?;
    /// assert!(applied);
    /// # Ok::<(), alignviz_core::services::NodeServiceError>(())
    /// ```
    pub fn apply<F>(&mut self, node_id: &str, mutator: F) -> Result<bool, NodeServiceError>
    where
        F: FnOnce(&mut AnyNode) -> Mutation,
    {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| NodeServiceError::node_not_found(node_id))?;

        let mut candidate = node.clone();
        let mutation = mutator(&mut candidate);
        if candidate.id() != node_id {
            tracing::warn!(
                "Rejected mutation of node {}: id changed to {}",
                node_id,
                candidate.id()
            );
            return Err(ValidationError::InvalidId(format!(
                "node id is fixed: {} cannot become {}",
                node_id,
                candidate.id()
            ))
            .into());
        }

        *node = candidate;
        Ok(self.bus.dispatch(mutation))
    }

    /// Root-first path to `node_id` following `parent` references
    pub fn hierarchy_path(&self, node_id: &str) -> Option<Vec<PathEntry>> {
        walk_path(node_id, |id| self.nodes.get(id))
    }

    /// Replace the held nodes with a built graph
    pub fn load_graph(&mut self, graph: GraphData) -> LoadSummary {
        self.nodes.clear();
        self.order.clear();

        let mut summary = LoadSummary {
            links: graph.links.len(),
            ..LoadSummary::default()
        };
        for node in graph.nodes {
            let id = node.id().to_string();
            match self.insert(node) {
                Ok(()) => summary.nodes += 1,
                Err(e) => {
                    tracing::warn!("Skipping node {} during load: {}", id, e);
                    summary.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Loaded {} nodes ({} skipped, {} links)",
            summary.nodes,
            summary.skipped,
            summary.links
        );
        summary
    }

    /// Snapshot `source`, build its graph and load it
    pub async fn load_from_source(
        &mut self,
        source: &dyn HierarchySource,
    ) -> Result<LoadSummary, NodeServiceError> {
        let snapshot = source.snapshot().await?;
        Ok(self.load_graph(build_graph(&snapshot)))
    }

    /// Safe records of every node, in insertion order
    pub fn export_safe(&self) -> Vec<Value> {
        self.iter().map(AnyNode::to_safe_object).collect()
    }
}
