//! Input and output nodes (level 9)
//!
//! Both sit at the leaves of the hierarchy and share the data description in
//! [`IoSpec`]. Inputs know where their data comes from and how it is
//! validated; outputs know where it goes and how often.

use crate::behaviors::NodeBehavior;
use crate::events::{Mutation, NodeEvent, Relation, RelationChange};
use crate::models::relations::{add_keyed, is_blank, reject, remove_keyed, Keyed, Owner};
use crate::models::{NodeBase, NodeType};
use crate::visualization::{clamp_score, weighted, VisualPropertiesProvider};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const INPUT_DETAIL_FIELDS: &[&str] = &["data_schema", "validation_rules", "default_value"];
const OUTPUT_DETAIL_FIELDS: &[&str] = &["data_schema"];

fn default_io_type() -> String {
    "data".to_string()
}

/// Wire format of an input or output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoFormat {
    #[default]
    Json,
    Xml,
    Csv,
    Binary,
    Text,
}

/// How often an output produces data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Realtime,
    Batch,
    Scheduled,
    #[default]
    OnDemand,
}

/// Data description shared by inputs and outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSpec {
    #[serde(default = "default_io_type")]
    pub io_type: String,

    #[serde(default)]
    pub data_schema: Map<String, Value>,

    #[serde(default)]
    pub is_sensitive: bool,

    #[serde(default)]
    pub format: IoFormat,
}

impl Default for IoSpec {
    fn default() -> Self {
        Self {
            io_type: default_io_type(),
            data_schema: Map::new(),
            is_sensitive: false,
            format: IoFormat::default(),
        }
    }
}

impl IoSpec {
    /// Number of declared schema fields
    ///
    /// A JSON-Schema style `properties` object is counted when present,
    /// otherwise the top-level keys.
    pub fn schema_field_count(&self) -> usize {
        match self.data_schema.get("properties") {
            Some(Value::Object(properties)) => properties.len(),
            _ => self.data_schema.len(),
        }
    }
}

fn io_field_changed(owner: Owner<'_>, field: &str, value: Value) -> Mutation {
    Mutation::applied(NodeEvent::FieldChanged {
        scope: Some(owner.node_type),
        node_id: owner.id.to_string(),
        field: field.to_string(),
        value,
    })
}

/// Where an input's data comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConnection {
    pub source_id: String,
    pub connection_type: String,
}

/// Where an output's data goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetConnection {
    pub target_id: String,
    pub connection_type: String,
}

/// Check applied to incoming data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    pub id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl ValidationRule {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expression: None,
        }
    }
}

impl Keyed for ValidationRule {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(flatten)]
    pub io: IoSpec,

    #[serde(default)]
    source_connections: Vec<SourceConnection>,

    #[serde(default)]
    validation_rules: Vec<ValidationRule>,

    #[serde(default)]
    required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_value: Option<Value>,
}

impl InputNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            io: IoSpec::default(),
            source_connections: Vec::new(),
            validation_rules: Vec::new(),
            required: false,
            default_value: None,
        }
    }

    fn owner(&self) -> Owner<'_> {
        Owner::new(NodeType::Input, &self.base.id)
    }

    pub fn source_connections(&self) -> &[SourceConnection] {
        &self.source_connections
    }

    pub fn validation_rules(&self) -> &[ValidationRule] {
        &self.validation_rules
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    /// Connect a source; duplicates are detected by source and type
    pub fn add_source_connection(&mut self, source_id: &str, connection_type: &str) -> Mutation {
        if is_blank(source_id) || is_blank(connection_type) {
            return reject(
                self.owner(),
                "source connection",
                "source id and connection type are required",
            );
        }
        let exists = self.source_connections.iter().any(|connection| {
            connection.source_id == source_id && connection.connection_type == connection_type
        });
        if exists {
            return Mutation::unchanged();
        }

        self.source_connections.push(SourceConnection {
            source_id: source_id.to_string(),
            connection_type: connection_type.to_string(),
        });
        Mutation::applied(self.owner().event(
            Relation::SourceConnection,
            RelationChange::Added,
            source_id,
            Some(connection_type),
        ))
    }

    /// Remove every connection from `source_id`
    pub fn remove_source_connection(&mut self, source_id: &str) -> Mutation {
        let before = self.source_connections.len();
        self.source_connections
            .retain(|connection| connection.source_id != source_id);
        if self.source_connections.len() == before {
            return Mutation::unchanged();
        }
        Mutation::applied(self.owner().event(
            Relation::SourceConnection,
            RelationChange::Removed,
            source_id,
            None,
        ))
    }

    /// Add a validation rule; `id` and `description` are required
    pub fn add_validation_rule(&mut self, rule: ValidationRule) -> Mutation {
        if is_blank(&rule.id) || is_blank(&rule.description) {
            return reject(
                self.owner(),
                "validation rule",
                "id and description are required",
            );
        }
        let owner = Owner::new(NodeType::Input, &self.base.id);
        add_keyed(
            &mut self.validation_rules,
            owner,
            Relation::ValidationRule,
            rule,
            None,
        )
    }

    pub fn remove_validation_rule(&mut self, rule_id: &str) -> Mutation {
        let owner = Owner::new(NodeType::Input, &self.base.id);
        remove_keyed(
            &mut self.validation_rules,
            owner,
            Relation::ValidationRule,
            rule_id,
        )
    }

    pub fn set_data_schema(&mut self, schema: Map<String, Value>) -> Mutation {
        self.io.data_schema = schema;
        io_field_changed(self.owner(), "dataSchema", Value::Object(self.io.data_schema.clone()))
    }

    pub fn set_format(&mut self, format: IoFormat) -> Mutation {
        self.io.format = format;
        io_field_changed(self.owner(), "format", json!(format))
    }

    pub fn set_sensitive(&mut self, sensitive: bool) -> Mutation {
        self.io.is_sensitive = sensitive;
        io_field_changed(self.owner(), "isSensitive", json!(sensitive))
    }

    pub fn set_required(&mut self, required: bool) -> Mutation {
        self.required = required;
        io_field_changed(self.owner(), "required", json!(required))
    }

    pub fn set_default_value(&mut self, value: Option<Value>) -> Mutation {
        self.default_value = value;
        io_field_changed(self.owner(), "defaultValue", json!(self.default_value))
    }

    /// min(50, schema fields x 5) + min(30, rules x 10) + min(20, sources x 5)
    pub fn schema_complexity(&self) -> u32 {
        clamp_score(
            weighted(self.io.schema_field_count(), 5, 50)
                + weighted(self.validation_rules.len(), 10, 30)
                + weighted(self.source_connections.len(), 5, 20),
        )
    }

    pub fn io_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        properties.insert("ioType".to_string(), json!(self.io.io_type));
        properties.insert("format".to_string(), json!(self.io.format));
        properties.insert("isSensitive".to_string(), json!(self.io.is_sensitive));
        properties.insert("required".to_string(), json!(self.required));
        properties.insert(
            "connectionCount".to_string(),
            json!(self.source_connections.len()),
        );
        properties.insert(
            "schemaComplexity".to_string(),
            json!(self.schema_complexity()),
        );
        properties
    }
}

impl NodeBehavior for InputNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Input
    }

    fn detail_fields(&self) -> &'static [&'static str] {
        INPUT_DETAIL_FIELDS
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Input
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputNode {
    #[serde(flatten)]
    pub base: NodeBase,

    #[serde(flatten)]
    pub io: IoSpec,

    #[serde(default)]
    target_connections: Vec<TargetConnection>,

    #[serde(default)]
    frequency: Frequency,
}

impl OutputNode {
    pub fn new(base: NodeBase) -> Self {
        Self {
            base,
            io: IoSpec::default(),
            target_connections: Vec::new(),
            frequency: Frequency::default(),
        }
    }

    fn owner(&self) -> Owner<'_> {
        Owner::new(NodeType::Output, &self.base.id)
    }

    pub fn target_connections(&self) -> &[TargetConnection] {
        &self.target_connections
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// Connect a target; duplicates are detected by target and type
    pub fn add_target_connection(&mut self, target_id: &str, connection_type: &str) -> Mutation {
        if is_blank(target_id) || is_blank(connection_type) {
            return reject(
                self.owner(),
                "target connection",
                "target id and connection type are required",
            );
        }
        let exists = self.target_connections.iter().any(|connection| {
            connection.target_id == target_id && connection.connection_type == connection_type
        });
        if exists {
            return Mutation::unchanged();
        }

        self.target_connections.push(TargetConnection {
            target_id: target_id.to_string(),
            connection_type: connection_type.to_string(),
        });
        Mutation::applied(self.owner().event(
            Relation::TargetConnection,
            RelationChange::Added,
            target_id,
            Some(connection_type),
        ))
    }

    /// Remove every connection to `target_id`
    pub fn remove_target_connection(&mut self, target_id: &str) -> Mutation {
        let before = self.target_connections.len();
        self.target_connections
            .retain(|connection| connection.target_id != target_id);
        if self.target_connections.len() == before {
            return Mutation::unchanged();
        }
        Mutation::applied(self.owner().event(
            Relation::TargetConnection,
            RelationChange::Removed,
            target_id,
            None,
        ))
    }

    pub fn set_data_schema(&mut self, schema: Map<String, Value>) -> Mutation {
        self.io.data_schema = schema;
        io_field_changed(self.owner(), "dataSchema", Value::Object(self.io.data_schema.clone()))
    }

    pub fn set_format(&mut self, format: IoFormat) -> Mutation {
        self.io.format = format;
        io_field_changed(self.owner(), "format", json!(format))
    }

    pub fn set_sensitive(&mut self, sensitive: bool) -> Mutation {
        self.io.is_sensitive = sensitive;
        io_field_changed(self.owner(), "isSensitive", json!(sensitive))
    }

    pub fn set_frequency(&mut self, frequency: Frequency) -> Mutation {
        self.frequency = frequency;
        io_field_changed(self.owner(), "frequency", json!(frequency))
    }

    /// min(50, schema fields x 5) + min(30, targets x 10) + 20 when realtime
    pub fn schema_complexity(&self) -> u32 {
        let realtime = if self.frequency == Frequency::Realtime { 20 } else { 0 };
        clamp_score(
            weighted(self.io.schema_field_count(), 5, 50)
                + weighted(self.target_connections.len(), 10, 30)
                + realtime,
        )
    }

    pub fn io_visual_properties(
        &self,
        provider: Option<&dyn VisualPropertiesProvider>,
        role: &str,
    ) -> Map<String, Value> {
        let mut properties = self.visual_properties(provider, role);
        properties.insert("ioType".to_string(), json!(self.io.io_type));
        properties.insert("format".to_string(), json!(self.io.format));
        properties.insert("isSensitive".to_string(), json!(self.io.is_sensitive));
        properties.insert("frequency".to_string(), json!(self.frequency));
        properties.insert(
            "connectionCount".to_string(),
            json!(self.target_connections.len()),
        );
        properties.insert(
            "schemaComplexity".to_string(),
            json!(self.schema_complexity()),
        );
        properties
    }
}

impl NodeBehavior for OutputNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn node_type(&self) -> NodeType {
        NodeType::Output
    }

    fn detail_fields(&self) -> &'static [&'static str] {
        OUTPUT_DETAIL_FIELDS
    }

    fn accepts_type(node_type: NodeType) -> bool {
        node_type == NodeType::Output
    }
}
