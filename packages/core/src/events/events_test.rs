//! Tests for node events and the event bus

#[cfg(test)]
mod tests {
    use crate::events::{
        EventBus, Mutation, NodeEvent, Relation, RelationChange, WILDCARD,
    };
    use crate::models::NodeType;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn relation_event(change: RelationChange) -> NodeEvent {
        NodeEvent::RelationChanged {
            owner: NodeType::Function,
            owner_id: "f1".to_string(),
            relation: Relation::Specification,
            change,
            target_id: "s1".to_string(),
            kind: None,
        }
    }

    fn recorder(bus: &EventBus, name: &str) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(name, move |event| {
            sink.lock().unwrap().push(event.event_name());
        });
        seen
    }

    // ========================================================================
    // Event names and payloads
    // ========================================================================

    #[test]
    fn test_relation_event_name_and_payload() {
        let event = relation_event(RelationChange::Added);
        assert_eq!(event.event_name(), "function:specificationAdded");
        assert_eq!(event.node_id(), "f1");
        assert_eq!(
            event.payload(),
            json!({"functionId": "f1", "specificationId": "s1"})
        );
    }

    #[test]
    fn test_component_group_scope_is_camel_case() {
        let event = NodeEvent::RelationChanged {
            owner: NodeType::ComponentGroup,
            owner_id: "root".to_string(),
            relation: Relation::Child,
            change: RelationChange::Removed,
            target_id: "c1".to_string(),
            kind: None,
        };
        assert_eq!(event.event_name(), "componentGroup:childRemoved");
        assert_eq!(
            event.payload(),
            json!({"componentGroupId": "root", "childId": "c1"})
        );
    }

    #[test]
    fn test_relation_kind_uses_relation_specific_key() {
        let event = NodeEvent::RelationChanged {
            owner: NodeType::Input,
            owner_id: "in1".to_string(),
            relation: Relation::SourceConnection,
            change: RelationChange::Added,
            target_id: "src".to_string(),
            kind: Some("stream".to_string()),
        };
        assert_eq!(event.event_name(), "input:sourceConnectionAdded");
        assert_eq!(event.payload()["connectionType"], "stream");
        assert_eq!(event.payload()["sourceId"], "src");
    }

    #[test]
    fn test_field_changed_names() {
        let base_event = NodeEvent::FieldChanged {
            scope: None,
            node_id: "n1".to_string(),
            field: "expanded".to_string(),
            value: json!(true),
        };
        assert_eq!(base_event.event_name(), "node:expandedChanged");
        assert_eq!(
            base_event.payload(),
            json!({"nodeId": "n1", "field": "expanded", "value": true})
        );

        let scoped = NodeEvent::FieldChanged {
            scope: Some(NodeType::Subcomponent),
            node_id: "sc1".to_string(),
            field: "securityLevel".to_string(),
            value: json!("maximum"),
        };
        assert_eq!(scoped.event_name(), "subcomponent:securityLevelChanged");
    }

    #[test]
    fn test_version_event_payload() {
        let event = NodeEvent::VersionCreated {
            node_id: "n1".to_string(),
            version: 1,
            user_id: "alice".to_string(),
            comment: "initial".to_string(),
        };
        assert_eq!(event.event_name(), "node:versionCreated");
        assert_eq!(
            event.payload(),
            json!({"nodeId": "n1", "version": 1, "userId": "alice", "comment": "initial"})
        );
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    #[test]
    fn test_unchanged_mutation_has_no_events() {
        let mutation = Mutation::unchanged();
        assert!(!mutation.is_applied());
        assert!(mutation.events().is_empty());
    }

    #[test]
    fn test_and_keeps_event_order() {
        let combined = Mutation::applied(relation_event(RelationChange::Added))
            .and(Mutation::unchanged())
            .and(Mutation::applied(relation_event(RelationChange::Removed)));

        assert!(combined.is_applied());
        let names: Vec<String> = combined.events().iter().map(NodeEvent::event_name).collect();
        assert_eq!(
            names,
            vec!["function:specificationAdded", "function:specificationRemoved"]
        );
    }

    // ========================================================================
    // EventBus
    // ========================================================================

    #[test]
    fn test_named_and_wildcard_handlers_receive_event() {
        let bus = EventBus::new();
        let named = recorder(&bus, "function:specificationAdded");
        let other = recorder(&bus, "function:specificationRemoved");
        let all = recorder(&bus, WILDCARD);

        bus.publish(&relation_event(RelationChange::Added));

        assert_eq!(named.lock().unwrap().len(), 1);
        assert!(other.lock().unwrap().is_empty());
        assert_eq!(all.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let sink = count.clone();
        let id = bus.subscribe(WILDCARD, move |_| *sink.lock().unwrap() += 1);

        bus.publish(&relation_event(RelationChange::Added));
        assert!(bus.unsubscribe(WILDCARD, id));
        assert!(!bus.unsubscribe(WILDCARD, id));
        bus.publish(&relation_event(RelationChange::Added));

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_dispatch_publishes_in_order_and_reports_applied() {
        let bus = EventBus::new();
        let all = recorder(&bus, WILDCARD);

        let mutation = Mutation::applied(relation_event(RelationChange::Added))
            .and(Mutation::applied(relation_event(RelationChange::Removed)));
        assert!(bus.dispatch(mutation));
        assert!(!bus.dispatch(Mutation::unchanged()));

        assert_eq!(
            *all.lock().unwrap(),
            vec!["function:specificationAdded", "function:specificationRemoved"]
        );
    }

    #[test]
    fn test_handler_may_subscribe_while_publishing() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        bus.subscribe(WILDCARD, move |_| {
            inner_bus.subscribe("node:expandedChanged", |_| {});
        });

        // Would deadlock if handlers ran under the table lock
        bus.publish(&relation_event(RelationChange::Added));
    }

    #[tokio::test]
    async fn test_stream_receiver_gets_published_events() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe_to_events();

        bus.publish(&relation_event(RelationChange::Added));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event, relation_event(RelationChange::Added));
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(&relation_event(RelationChange::Added));
    }
}
