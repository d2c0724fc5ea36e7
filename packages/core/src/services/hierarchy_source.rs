//! Hierarchy Sources
//!
//! Raw alignment data as authored on disk: one root record, one file per
//! component and one file per subcomponent (which nests everything below it).
//!
//! # Layout
//!
//! ```text
//! <data>/ai-alignment.json
//! <data>/components/<component-id>.json
//! <data>/subcomponents/<subcomponent-id>.json
//! ```
//!
//! Sources never fail on a single bad file: unreadable or malformed files are
//! logged and skipped, and a missing root falls back to [`default_root`].

use crate::services::graph_builder::{build_graph, named_children, Tier};
use crate::services::NodeServiceError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const ROOT_FILE: &str = "ai-alignment.json";
const COMPONENTS_DIR: &str = "components";
const SUBCOMPONENTS_DIR: &str = "subcomponents";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Root record used when no root file is available
pub fn default_root() -> Value {
    json!({
        "id": "ai-alignment",
        "name": "AI Alignment",
        "description": "Methods to ensure AI systems remain aligned with human values and intentions.",
        "type": "component_group",
        "components": [
            {
                "id": "technical-safeguards",
                "name": "Technical Safeguards",
                "description": "Engineering approaches to ensure AI systems behave as intended"
            },
            {
                "id": "value-learning",
                "name": "Value Learning",
                "description": "Systems that enable AI to learn and internalize human values"
            },
            {
                "id": "interpretability-tools",
                "name": "Interpretability Tools",
                "description": "Methods to understand AI reasoning and decision-making"
            },
            {
                "id": "oversight-mechanisms",
                "name": "Oversight Mechanisms",
                "description": "Systems for monitoring and evaluating AI behavior"
            }
        ]
    })
}

/// Components embedded in the default root, keyed by id
fn default_components() -> BTreeMap<String, Value> {
    default_root()
        .get("components")
        .and_then(Value::as_array)
        .map(|components| {
            components
                .iter()
                .filter_map(|component| {
                    let id = component.get("id")?.as_str()?;
                    Some((id.to_string(), component.clone()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Everything a graph build needs, loaded in one pass
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchySnapshot {
    pub root: Value,
    /// Component records keyed by id (file stem)
    pub components: BTreeMap<String, Value>,
    /// Subcomponent records keyed by id (file stem)
    pub subcomponents: BTreeMap<String, Value>,
}

impl Default for HierarchySnapshot {
    fn default() -> Self {
        Self {
            root: default_root(),
            components: default_components(),
            subcomponents: BTreeMap::new(),
        }
    }
}

impl HierarchySnapshot {
    pub fn root_id(&self) -> &str {
        self.root
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("ai-alignment")
    }

    /// Raw record for a node id
    ///
    /// Looks at the root, the component and subcomponent files, then searches
    /// nested records by their own `id`, and finally the built graph (where ids
    /// are path-derived). Returns `None` if nothing matches.
    pub fn find_details(&self, node_id: &str) -> Option<Value> {
        if node_id == self.root_id() {
            tracing::debug!("Returning root node details");
            return Some(self.root.clone());
        }
        if let Some(component) = self.components.get(node_id) {
            tracing::debug!("Found component: {}", node_id);
            return Some(component.clone());
        }
        if let Some(subcomponent) = self.subcomponents.get(node_id) {
            tracing::debug!("Found subcomponent: {}", node_id);
            return Some(subcomponent.clone());
        }
        if let Some(nested) = self.find_nested(node_id) {
            return Some(nested.clone());
        }

        let graph = build_graph(self);
        let found = graph.find(node_id).map(|node| node.to_safe_object());
        if found.is_none() {
            tracing::debug!("Node not found: {}", node_id);
        }
        found
    }

    /// Depth-first search below every subcomponent for a record whose `id`
    /// equals `node_id`
    fn find_nested(&self, node_id: &str) -> Option<&Value> {
        self.subcomponents
            .values()
            .find_map(|subcomponent| find_in_tier(subcomponent, 0, node_id))
    }
}

fn find_in_tier<'a>(record: &'a Value, tier: usize, node_id: &str) -> Option<&'a Value> {
    let tier_spec = Tier::ALL.get(tier)?;
    named_children(record, *tier_spec)
        .into_iter()
        .find_map(|child| {
            if child.get("id").and_then(Value::as_str) == Some(node_id) {
                tracing::debug!("Found nested {}: {}", tier_spec.kind, node_id);
                return Some(child);
            }
            find_in_tier(child, tier + 1, node_id)
        })
}

/// Provider of raw hierarchy records
#[async_trait]
pub trait HierarchySource: Send + Sync {
    /// Root record (the component group)
    async fn root(&self) -> Result<Value, NodeServiceError>;

    /// Component records keyed by id
    async fn components(&self) -> Result<BTreeMap<String, Value>, NodeServiceError>;

    /// Subcomponent records keyed by id; each record carries an `id`
    async fn subcomponents(&self) -> Result<BTreeMap<String, Value>, NodeServiceError>;

    /// Load all three in one snapshot
    async fn snapshot(&self) -> Result<HierarchySnapshot, NodeServiceError> {
        Ok(HierarchySnapshot {
            root: self.root().await?,
            components: self.components().await?,
            subcomponents: self.subcomponents().await?,
        })
    }
}

/// Locations of the hierarchy files below a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root_file: PathBuf,
    pub components_dir: PathBuf,
    pub subcomponents_dir: PathBuf,
}

impl DataPaths {
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            root_file: data_dir.join(ROOT_FILE),
            components_dir: data_dir.join(COMPONENTS_DIR),
            subcomponents_dir: data_dir.join(SUBCOMPONENTS_DIR),
        }
    }
}

/// Reads the hierarchy from JSON files on every call
///
/// Nothing is cached, so edits to the data directory show up on the next
/// request.
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    paths: DataPaths,
}

impl JsonDirectorySource {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::with_paths(DataPaths::from_data_dir(data_dir))
    }

    pub fn with_paths(paths: DataPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Load every `*.json` file in `dir`, keyed by file stem, in name order
    async fn load_directory(dir: &Path) -> Result<BTreeMap<String, Value>, NodeServiceError> {
        let mut records = BTreeMap::new();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| NodeServiceError::source_unavailable(dir, e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| NodeServiceError::source_unavailable(dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match load_json_file(&path).await {
                Some(record) => {
                    records.insert(stem.to_string(), record);
                }
                None => tracing::error!("Failed to load file: {}", path.display()),
            }
        }

        tracing::info!("Loaded {} files from {}", records.len(), dir.display());
        Ok(records)
    }
}

#[async_trait]
impl HierarchySource for JsonDirectorySource {
    async fn root(&self) -> Result<Value, NodeServiceError> {
        match load_json_file(&self.paths.root_file).await {
            Some(root) if root.is_object() => Ok(root),
            _ => {
                tracing::warn!(
                    "Using default root data since {} was not found",
                    self.paths.root_file.display()
                );
                Ok(default_root())
            }
        }
    }

    async fn components(&self) -> Result<BTreeMap<String, Value>, NodeServiceError> {
        if !tokio::fs::metadata(&self.paths.components_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            tracing::warn!(
                "Components directory not found: {}",
                self.paths.components_dir.display()
            );
            return Ok(default_components());
        }
        Self::load_directory(&self.paths.components_dir).await
    }

    async fn subcomponents(&self) -> Result<BTreeMap<String, Value>, NodeServiceError> {
        if !tokio::fs::metadata(&self.paths.subcomponents_dir)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
        {
            tracing::warn!(
                "Subcomponents directory not found: {}",
                self.paths.subcomponents_dir.display()
            );
            return Ok(BTreeMap::new());
        }

        let mut records = Self::load_directory(&self.paths.subcomponents_dir).await?;
        for (id, record) in records.iter_mut() {
            if let Value::Object(map) = record {
                map.entry("id".to_string())
                    .or_insert_with(|| Value::String(id.clone()));
            }
        }
        Ok(records)
    }
}

/// Serves a fixed snapshot (tests, embedding)
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    snapshot: HierarchySnapshot,
}

impl InMemorySource {
    pub fn new(snapshot: HierarchySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl HierarchySource for InMemorySource {
    async fn root(&self) -> Result<Value, NodeServiceError> {
        Ok(self.snapshot.root.clone())
    }

    async fn components(&self) -> Result<BTreeMap<String, Value>, NodeServiceError> {
        Ok(self.snapshot.components.clone())
    }

    async fn subcomponents(&self) -> Result<BTreeMap<String, Value>, NodeServiceError> {
        Ok(self.snapshot.subcomponents.clone())
    }
}

/// Read and parse one JSON file; `None` (logged) on any failure
async fn load_json_file(path: &Path) -> Option<Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("File not found: {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::error!("Error reading {}: {}", path.display(), e);
            return None;
        }
    };

    let text = decode_text(&bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        tracing::error!("Empty file: {}", path.display());
        return None;
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!("JSON parsing error in {}: {}", path.display(), e);
            None
        }
    }
}

/// UTF-8 (BOM stripped), falling back to Latin-1 for legacy files
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&byte| byte as char).collect(),
    }
}

