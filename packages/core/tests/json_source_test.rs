//! JSON Directory Source Tests
//!
//! Loads hierarchy data from a temporary data directory and builds the graph
//! the way the server does on each request.

#[cfg(test)]
mod json_source_tests {
    use alignviz_core::{build_graph, HierarchySource, JsonDirectorySource, NodeService, NodeType};
    use anyhow::Result;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
        std::fs::create_dir_all(path.parent().unwrap())?;
        std::fs::write(path, serde_json::to_vec_pretty(value)?)?;
        Ok(())
    }

    /// Data directory with one component and one nested subcomponent
    fn create_data_dir() -> Result<TempDir> {
        let dir = TempDir::new()?;
        let root = dir.path();

        write_json(
            &root.join("ai-alignment.json"),
            &json!({"id": "ai-alignment", "name": "AI Alignment", "type": "component_group"}),
        )?;
        write_json(
            &root.join("components/value-learning.json"),
            &json!({"id": "value-learning", "name": "Value Learning"}),
        )?;
        write_json(
            &root.join("subcomponents/value-learning-reward.json"),
            &json!({
                "name": "Reward Learning",
                "capabilities": [{
                    "name": "Reward Modeling",
                    "functions": [{"name": "Fit Model"}]
                }]
            }),
        )?;
        Ok(dir)
    }

    #[tokio::test]
    async fn test_empty_directory_uses_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let source = JsonDirectorySource::new(dir.path());

        let snapshot = source.snapshot().await?;
        assert_eq!(snapshot.root_id(), "ai-alignment");
        assert_eq!(snapshot.components.len(), 4);
        assert!(snapshot.subcomponents.is_empty());

        let graph = build_graph(&snapshot);
        assert_eq!(graph.nodes.len(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_subcomponent_id_comes_from_file_stem() -> Result<()> {
        let dir = create_data_dir()?;
        let source = JsonDirectorySource::new(dir.path());

        let subcomponents = source.subcomponents().await?;
        assert_eq!(
            subcomponents["value-learning-reward"]["id"],
            "value-learning-reward"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_nested_graph_from_files() -> Result<()> {
        let dir = create_data_dir()?;
        let source = JsonDirectorySource::new(dir.path());
        let snapshot = source.snapshot().await?;
        let graph = build_graph(&snapshot);

        let capability_id = "value-learning-reward-capability-reward-modeling";
        let function_id = format!("{}-function-fit-model", capability_id);

        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.links.len(), 4);
        assert_eq!(
            graph.find(capability_id).map(|node| node.node_type()),
            Some(NodeType::Capability)
        );

        let path = graph
            .hierarchy_path(&function_id)
            .expect("function should be reachable");
        let names: Vec<&str> = path.iter().map(|entry| entry.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["AI Alignment", "Value Learning", "Reward Learning", "Reward Modeling", "Fit Model"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_bom_and_malformed_files() -> Result<()> {
        let dir = create_data_dir()?;
        let components = dir.path().join("components");

        let mut bom = vec![0xEF, 0xBB, 0xBF];
        bom.extend_from_slice(br#"{"id": "oversight", "name": "Oversight"}"#);
        std::fs::write(components.join("oversight.json"), bom)?;
        std::fs::write(components.join("broken.json"), b"{ not json")?;
        std::fs::write(components.join("notes.txt"), b"ignored")?;

        let source = JsonDirectorySource::new(dir.path());
        let loaded = source.components().await?;

        let ids: Vec<&str> = loaded.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["oversight", "value-learning"]);
        assert_eq!(loaded["oversight"]["name"], "Oversight");
        Ok(())
    }

    #[tokio::test]
    async fn test_edits_show_up_on_next_snapshot() -> Result<()> {
        let dir = create_data_dir()?;
        let source = JsonDirectorySource::new(dir.path());
        assert_eq!(source.components().await?.len(), 1);

        write_json(
            &dir.path().join("components/interpretability.json"),
            &json!({"id": "interpretability", "name": "Interpretability"}),
        )?;
        assert_eq!(source.components().await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_service_loads_from_directory() -> Result<()> {
        let dir = create_data_dir()?;
        let source = JsonDirectorySource::new(dir.path());
        let mut service = NodeService::default();

        let summary = service.load_from_source(&source).await?;
        assert_eq!(summary.nodes, 5);
        assert_eq!(summary.skipped, 0);
        assert_eq!(service.children_of("ai-alignment").len(), 1);
        Ok(())
    }
}
