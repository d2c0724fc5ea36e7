//! Tests for graph building, lookups and hierarchy paths

#[cfg(test)]
mod tests {
    use crate::models::{AnyNode, NodeType, SecurityLevel};
    use crate::services::hierarchy_source::decode_text;
    use crate::services::{build_graph, HierarchySnapshot, LinkType};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    const SUB: &str = "value-learning-preference";
    const CAP: &str = "value-learning-preference-capability-rm";
    const FUNC: &str = "value-learning-preference-capability-rm-function-collect-preferences";

    fn nested_subcomponent() -> Value {
        json!({
            "id": SUB,
            "name": "Preference Learning",
            "implementationSecurityLevel": "enhanced",
            "capabilities": [{
                "id": "rm",
                "name": "Reward Modeling",
                "metrics": {"coverage": 0.5},
                "functions": [{
                    "name": "Collect Preferences",
                    "parameters": [{"name": "batch", "type": "int"}, {"name": "broken"}],
                    "specifications": {
                        "name": "Pairwise Spec",
                        "requirements": [{"id": "r1", "description": "Log", "priority": "high"}],
                        "integration": {
                            "name": "RLHF Pipeline",
                            "techniques": [{
                                "name": "PPO",
                                "applications": {"items": [{
                                    "name": "Chat Tuning",
                                    "inputs": [{
                                        "name": "Prompts",
                                        "format": "csv",
                                        "outputs": {"name": "Policy", "frequency": "batch"}
                                    }]
                                }]}
                            }]
                        }
                    }
                }]
            }, {
                "description": "unnamed entries are skipped"
            }]
        })
    }

    fn fixture() -> HierarchySnapshot {
        let mut components = BTreeMap::new();
        components.insert(
            "value-learning".to_string(),
            json!({"id": "value-learning", "name": "Value Learning"}),
        );
        components.insert(
            "oversight".to_string(),
            json!({"id": "oversight", "name": "Oversight"}),
        );

        let mut subcomponents = BTreeMap::new();
        subcomponents.insert(SUB.to_string(), nested_subcomponent());
        subcomponents.insert(
            "orphan".to_string(),
            json!({"id": "orphan", "name": "Orphan"}),
        );

        HierarchySnapshot {
            root: json!({"id": "ai-alignment", "name": "AI Alignment"}),
            components,
            subcomponents,
        }
    }

    #[test]
    fn test_derived_ids_and_link_types() {
        let graph = build_graph(&fixture());

        let expected = [
            ("ai-alignment", NodeType::ComponentGroup),
            ("value-learning", NodeType::Component),
            (SUB, NodeType::Subcomponent),
            (CAP, NodeType::Capability),
            (FUNC, NodeType::Function),
        ];
        for (id, node_type) in expected {
            let node = graph.find(id).unwrap_or_else(|| panic!("missing {}", id));
            assert_eq!(node.node_type(), node_type);
        }

        let spec_id = format!("{}-specification-pairwise-spec", FUNC);
        let integration_id = format!("{}-integration-rlhf-pipeline", spec_id);
        let output_id = format!(
            "{}-technique-ppo-application-chat-tuning-input-prompts-output-policy",
            integration_id
        );
        assert!(graph.find(&spec_id).is_some());
        assert!(graph.find(&integration_id).is_some());
        assert_eq!(graph.find(&output_id).unwrap().level(), 9);

        let link_types: Vec<LinkType> = graph.links.iter().map(|link| link.link_type).collect();
        for expected in [
            LinkType::Contains,
            LinkType::HasCapability,
            LinkType::HasFunction,
            LinkType::HasSpecification,
            LinkType::HasIntegration,
            LinkType::HasTechnique,
            LinkType::HasApplication,
            LinkType::HasInput,
            LinkType::HasOutput,
        ] {
            assert!(link_types.contains(&expected), "no {:?} link", expected);
        }
        assert_eq!(graph.nodes.len(), 12);
        assert_eq!(graph.links.len(), graph.nodes.len() - 1);
    }

    #[test]
    fn test_unresolved_subcomponent_is_skipped() {
        let graph = build_graph(&fixture());
        assert!(graph.find("orphan").is_none());
        assert!(graph.links.iter().all(|link| link.target != "orphan"));
    }

    #[test]
    fn test_explicit_parent_wins_over_inference() {
        let mut snapshot = fixture();
        snapshot.subcomponents.insert(
            "audit-trail".to_string(),
            json!({"id": "audit-trail", "name": "Audit Trail", "parent": "oversight"}),
        );

        let graph = build_graph(&snapshot);
        assert_eq!(graph.find("audit-trail").unwrap().parent(), Some("oversight"));
    }

    #[test]
    fn test_typed_relations_are_filled() {
        let graph = build_graph(&fixture());

        match graph.find(SUB) {
            Some(AnyNode::Subcomponent(sub)) => {
                assert_eq!(sub.capabilities(), [CAP.to_string()]);
                assert_eq!(sub.implements(), ["value-learning".to_string()]);
                assert_eq!(sub.security_level(), SecurityLevel::Enhanced);
            }
            other => panic!("unexpected {:?}", other.map(AnyNode::node_type)),
        }

        match graph.find(CAP) {
            Some(AnyNode::Capability(cap)) => {
                assert_eq!(cap.functions(), [FUNC.to_string()]);
                assert_eq!(cap.implemented_by_subcomponents(), [SUB.to_string()]);
                assert_eq!(cap.capability_metrics()["coverage"], 0.5);
            }
            other => panic!("unexpected {:?}", other.map(AnyNode::node_type)),
        }

        match graph.find(FUNC) {
            Some(AnyNode::Function(function)) => {
                // The parameter without a type is dropped
                assert_eq!(function.parameters().len(), 1);
                assert_eq!(function.specifications().len(), 1);
            }
            other => panic!("unexpected {:?}", other.map(AnyNode::node_type)),
        }
    }

    #[test]
    fn test_expandable_reflects_children() {
        let graph = build_graph(&fixture());
        let root = graph.find("ai-alignment").unwrap().base();
        assert!(root.expandable && root.has_children);

        let oversight = graph.find("oversight").unwrap().base();
        assert!(!oversight.expandable);
        assert!(!oversight.has_children);
    }

    #[test]
    fn test_hierarchy_path_is_root_first() {
        let graph = build_graph(&fixture());
        let path = graph.hierarchy_path(FUNC).unwrap();

        let ids: Vec<&str> = path.iter().map(|entry| entry.id.as_str()).collect();
        assert_eq!(ids, vec!["ai-alignment", "value-learning", SUB, CAP, FUNC]);
        assert_eq!(path[3].name, "Reward Modeling");
        assert_eq!(path[4].node_type, NodeType::Function);

        assert!(graph.hierarchy_path("missing").is_none());
    }

    #[test]
    fn test_to_value_shape() {
        let value = build_graph(&fixture()).to_value();
        assert_eq!(value["nodes"][0]["id"], "ai-alignment");
        assert_eq!(value["nodes"][0]["level"], 0);
        assert_eq!(value["links"][0]["type"], "contains");
    }

    #[test]
    fn test_find_details_lookup_order() {
        let snapshot = fixture();

        assert_eq!(snapshot.find_details("ai-alignment").unwrap()["name"], "AI Alignment");
        assert_eq!(snapshot.find_details("oversight").unwrap()["name"], "Oversight");
        assert_eq!(
            snapshot.find_details(SUB).unwrap()["name"],
            "Preference Learning"
        );

        // Raw nested id
        let raw = snapshot.find_details("rm").unwrap();
        assert_eq!(raw["name"], "Reward Modeling");
        assert!(raw.get("functions").is_some());

        // Path-derived id from the built graph
        let built = snapshot.find_details(FUNC).unwrap();
        assert_eq!(built["type"], "function");

        assert!(snapshot.find_details("nope").is_none());
    }

    #[test]
    fn test_default_snapshot_has_four_components() {
        let snapshot = HierarchySnapshot::default();
        assert_eq!(snapshot.root_id(), "ai-alignment");
        assert_eq!(snapshot.components.len(), 4);

        let graph = build_graph(&snapshot);
        assert_eq!(graph.nodes.len(), 5);
        assert_eq!(graph.links.len(), 4);
    }

    #[test]
    fn test_decode_text_handles_bom_and_latin1() {
        assert_eq!(decode_text(b"\xEF\xBB\xBF{\"a\":1}"), "{\"a\":1}");
        assert_eq!(decode_text(b"caf\xE9"), "café");
    }
}
