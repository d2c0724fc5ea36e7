//! Visual Properties
//!
//! Render hints derived from node state. Nothing here is part of a node's
//! durable identity; the renderer asks for these on every pass.
//!
//! A [`VisualPropertiesProvider`] may answer for a node. When it declines (or
//! none is installed) [`fallback_visual_properties`] computes the documented
//! default from local flags. The score helpers keep every variant's derived
//! complexity/maturity numbers inside `[0, 100]`.

use crate::models::{NodeBase, NodeType};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Upper bound of every derived score
pub const MAX_SCORE: u32 = 100;

/// Computes render hints for a node on behalf of the renderer
pub trait VisualPropertiesProvider: Send + Sync {
    /// Visual record for `base` as seen by `role`; `None` to use the fallback
    fn node_visual_properties(
        &self,
        base: &NodeBase,
        node_type: NodeType,
        role: &str,
    ) -> Option<Map<String, Value>>;
}

/// Default render hints
///
/// Starts from the node's stored `visualProperties` and overlays state-derived
/// keys: `opacity`, `locked`, `hasPermissionIssue`, `selected`, `highlighted`,
/// `hovered`, `level` and `type`.
pub fn fallback_visual_properties(
    base: &NodeBase,
    node_type: NodeType,
    role: &str,
) -> Map<String, Value> {
    let mut properties = base.visual_properties.clone();
    let opacity = if base.visible { 1.0 } else { 0.3 };

    properties.insert("opacity".to_string(), json!(opacity));
    properties.insert(
        "locked".to_string(),
        json!(base.is_encrypted && !base.is_decrypted()),
    );
    properties.insert(
        "hasPermissionIssue".to_string(),
        json!(!base.has_permission("view", role)),
    );
    properties.insert("selected".to_string(), json!(base.selected));
    properties.insert("highlighted".to_string(), json!(base.highlighted));
    properties.insert("hovered".to_string(), json!(base.hovered));
    properties.insert("level".to_string(), json!(node_type.level()));
    properties.insert("type".to_string(), json!(node_type.as_str()));
    properties
}

/// `min(cap, count * weight)`
pub fn weighted(count: usize, weight: u32, cap: u32) -> u32 {
    let raw = (count as u64).saturating_mul(weight as u64);
    raw.min(cap as u64) as u32
}

/// Bound a summed score to `[0, 100]`
pub fn clamp_score(total: u32) -> u32 {
    total.min(MAX_SCORE)
}

/// Size of a freeform detail blob in bytes of its text form
///
/// Strings count their UTF-8 length, `null` counts as empty, anything else
/// its compact JSON encoding.
pub fn blob_size(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::String(text) => text.len(),
        other => other.to_string().len(),
    }
}

/// Bundled provider: fallback hints plus a per-type color and size
///
/// Radius shrinks with depth so that the root stands out in the force layout.
#[derive(Debug, Clone)]
pub struct TypePalette {
    colors: HashMap<NodeType, String>,
    base_radius: f64,
    radius_step: f64,
}

impl Default for TypePalette {
    fn default() -> Self {
        let colors = [
            (NodeType::ComponentGroup, "#2c3e50"),
            (NodeType::Component, "#2980b9"),
            (NodeType::Subcomponent, "#27ae60"),
            (NodeType::Capability, "#8e44ad"),
            (NodeType::Function, "#d35400"),
            (NodeType::Specification, "#c0392b"),
            (NodeType::Integration, "#16a085"),
            (NodeType::Technique, "#f39c12"),
            (NodeType::Application, "#7f8c8d"),
            (NodeType::Input, "#3498db"),
            (NodeType::Output, "#e67e22"),
        ]
        .into_iter()
        .map(|(node_type, color)| (node_type, color.to_string()))
        .collect();

        Self {
            colors,
            base_radius: 24.0,
            radius_step: 2.0,
        }
    }
}

impl TypePalette {
    /// Override the color of one type
    pub fn with_color(mut self, node_type: NodeType, color: impl Into<String>) -> Self {
        self.colors.insert(node_type, color.into());
        self
    }

    pub fn color(&self, node_type: NodeType) -> Option<&str> {
        self.colors.get(&node_type).map(String::as_str)
    }

    pub fn radius(&self, node_type: NodeType) -> f64 {
        (self.base_radius - self.radius_step * node_type.level() as f64).max(4.0)
    }
}

impl VisualPropertiesProvider for TypePalette {
    fn node_visual_properties(
        &self,
        base: &NodeBase,
        node_type: NodeType,
        role: &str,
    ) -> Option<Map<String, Value>> {
        let mut properties = fallback_visual_properties(base, node_type, role);
        if let Some(color) = self.color(node_type) {
            properties
                .entry("color".to_string())
                .or_insert_with(|| json!(color));
        }
        properties
            .entry("radius".to_string())
            .or_insert_with(|| json!(self.radius(node_type)));
        Some(properties)
    }
}

#[cfg(test)]
mod visualization_test;
