//! Tests for NodeService
//!
//! Ownership rules (duplicate ids, removal without cascade), mutation
//! dispatch and bulk loading.

#[cfg(test)]
mod tests {
    use crate::events::{EventBus, Mutation, WILDCARD};
    use crate::models::{
        AnyNode, CapabilityNode, FunctionNode, NodeBase, NodeType, StructuralNode,
        ValidationError,
    };
    use crate::services::{
        build_graph, HierarchySnapshot, InMemorySource, NodeService, NodeServiceError,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn service_with_tree() -> NodeService {
        let mut service = NodeService::default();
        let root = StructuralNode::new(NodeBase::with_id("root", "Root"), NodeType::ComponentGroup)
            .unwrap();
        service.insert(root.into()).unwrap();
        service
            .insert(CapabilityNode::new(NodeBase::with_id("cap", "Cap").with_parent("root")).into())
            .unwrap();
        service
            .insert(FunctionNode::new(NodeBase::with_id("f1", "F1").with_parent("cap")).into())
            .unwrap();
        service
            .insert(FunctionNode::new(NodeBase::with_id("f2", "F2").with_parent("cap")).into())
            .unwrap();
        service
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut service = service_with_tree();
        let result = service.insert(FunctionNode::new(NodeBase::with_id("f1", "Again")).into());
        assert!(matches!(result, Err(NodeServiceError::DuplicateNode { id }) if id == "f1"));
        assert_eq!(service.len(), 4);
    }

    #[test]
    fn test_insert_validates() {
        let mut service = NodeService::default();
        let result =
            service.insert(FunctionNode::new(NodeBase::with_id("f1", "F").with_parent("f1")).into());
        assert!(matches!(result, Err(NodeServiceError::ValidationFailed(_))));
        assert!(service.is_empty());
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let service = service_with_tree();
        let ids: Vec<&str> = service.iter().map(AnyNode::id).collect();
        assert_eq!(ids, vec!["root", "cap", "f1", "f2"]);

        let children: Vec<&str> = service.children_of("cap").into_iter().map(AnyNode::id).collect();
        assert_eq!(children, vec!["f1", "f2"]);
    }

    #[test]
    fn test_remove_leaves_children_orphaned() {
        let mut service = service_with_tree();
        let removed = service.remove("cap").unwrap();
        assert_eq!(removed.id(), "cap");

        assert!(service.get("f1").is_some());
        assert_eq!(service.get("f1").unwrap().parent(), Some("cap"));
        assert!(service.remove("cap").is_none());

        // Path stops at the missing parent
        let path = service.hierarchy_path("f1").unwrap();
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn test_apply_dispatches_events() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(WILDCARD, move |event| sink.lock().unwrap().push(event.payload()));

        let mut service = NodeService::new(bus);
        service
            .insert(FunctionNode::new(NodeBase::with_id("f1", "F")).into())
            .unwrap();

        let applied = service
            .apply("f1", |node| match node {
                AnyNode::Function(function) => function.add_specification("s1"),
                _ => Mutation::unchanged(),
            })
            .unwrap();
        assert!(applied);

        let again = service
            .apply("f1", |node| match node {
                AnyNode::Function(function) => function.add_specification("s1"),
                _ => Mutation::unchanged(),
            })
            .unwrap();
        assert!(!again);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({"functionId": "f1", "specificationId": "s1"})]
        );
    }

    #[test]
    fn test_apply_unknown_node() {
        let mut service = NodeService::default();
        let result = service.apply("ghost", |node| node.base_mut().set_expanded(true));
        assert!(matches!(result, Err(NodeServiceError::NodeNotFound { .. })));
    }

    #[test]
    fn test_apply_rejects_id_change() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(WILDCARD, move |event| sink.lock().unwrap().push(event.event_name()));

        let mut service = NodeService::new(bus);
        service
            .insert(FunctionNode::new(NodeBase::with_id("f1", "F")).into())
            .unwrap();

        let result = service.apply("f1", |node| {
            node.base_mut().id = "f9".to_string();
            node.base_mut().set_expanded(true)
        });

        assert!(matches!(
            result,
            Err(NodeServiceError::ValidationFailed(ValidationError::InvalidId(_)))
        ));
        let held = service.get("f1").unwrap();
        assert_eq!(held.id(), "f1");
        assert!(!held.base().expanded);
        assert!(service.get("f9").is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_hierarchy_path() {
        let service = service_with_tree();
        let path = service.hierarchy_path("f2").unwrap();
        let ids: Vec<&str> = path.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["root", "cap", "f2"]);
        assert!(service.hierarchy_path("nope").is_none());
    }

    #[test]
    fn test_load_graph_replaces_contents() {
        let mut service = service_with_tree();
        let graph = build_graph(&HierarchySnapshot::default());

        let summary = service.load_graph(graph);

        assert_eq!(summary.nodes, 5);
        assert_eq!(summary.links, 4);
        assert_eq!(summary.skipped, 0);
        assert!(service.get("f1").is_none());
        assert_eq!(service.children_of("ai-alignment").len(), 4);
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let mut service = NodeService::default();
        let source = InMemorySource::new(HierarchySnapshot::default());

        let summary = service.load_from_source(&source).await.unwrap();

        assert_eq!(summary.nodes, 5);
        assert_eq!(service.export_safe()[0]["id"], "ai-alignment");
    }

    #[test]
    fn test_export_safe_strips_ciphertext() {
        use crate::crypto::{CipherConfig, PasswordCipher};

        let cipher = PasswordCipher::new(CipherConfig {
            iterations: 1_000,
            ..CipherConfig::default()
        });
        let mut service = service_with_tree();
        service
            .apply("cap", |node| {
                node.base_mut().encrypt_content(&cipher, "classified", "pw")
            })
            .unwrap();

        let exported = service.export_safe();
        let cap = exported.iter().find(|record| record["id"] == "cap").unwrap();
        assert_eq!(cap["isEncrypted"], true);
        assert!(cap.get("encryptedContent").is_none());
    }
}
