#[cfg(test)]
mod tests {
    use crate::crypto::{CipherConfig, PasswordCipher};
    use crate::models::{NodeBase, NodeType, Permissions};
    use crate::visualization::{
        blob_size, clamp_score, fallback_visual_properties, weighted, TypePalette,
        VisualPropertiesProvider,
    };
    use serde_json::{json, Map, Value};

    #[test]
    fn test_fallback_reflects_ui_flags() {
        let mut base = NodeBase::with_id("n1", "Node");
        base.visible = false;
        base.selected = true;

        let properties = fallback_visual_properties(&base, NodeType::Function, "viewer");
        assert_eq!(properties["opacity"], 0.3);
        assert_eq!(properties["selected"], true);
        assert_eq!(properties["hovered"], false);
        assert_eq!(properties["locked"], false);
        assert_eq!(properties["hasPermissionIssue"], false);
        assert_eq!(properties["level"], 4);
        assert_eq!(properties["type"], "function");
    }

    #[test]
    fn test_fallback_flags_permission_issue() {
        let mut base = NodeBase::with_id("n1", "Node");
        base.permissions = Permissions::none();
        let properties = fallback_visual_properties(&base, NodeType::Component, "admin");
        assert_eq!(properties["hasPermissionIssue"], true);
    }

    #[test]
    fn test_fallback_locked_until_decrypted() {
        let cipher = PasswordCipher::new(CipherConfig {
            iterations: 1_000,
            ..CipherConfig::default()
        });
        let mut base = NodeBase::with_id("n1", "Node");
        let _ = base.encrypt_content(&cipher, "plan", "pw");
        assert_eq!(
            fallback_visual_properties(&base, NodeType::Capability, "viewer")["locked"],
            true
        );

        let _ = base.decrypt_content(&cipher, "pw");
        assert_eq!(
            fallback_visual_properties(&base, NodeType::Capability, "viewer")["locked"],
            false
        );
    }

    #[test]
    fn test_fallback_keeps_stored_properties() {
        let mut base = NodeBase::with_id("n1", "Node");
        let mut stored = Map::new();
        stored.insert("shape".to_string(), json!("hexagon"));
        let _ = base.update_visual_properties(stored);

        let properties = fallback_visual_properties(&base, NodeType::Input, "viewer");
        assert_eq!(properties["shape"], "hexagon");
    }

    #[test]
    fn test_palette_color_and_radius() {
        let palette = TypePalette::default();
        assert!(palette.color(NodeType::Output).is_some());
        assert_eq!(palette.radius(NodeType::ComponentGroup), 24.0);
        assert_eq!(palette.radius(NodeType::Output), 6.0);
    }

    #[test]
    fn test_palette_does_not_override_stored_color() {
        let mut base = NodeBase::with_id("n1", "Node");
        let mut stored = Map::new();
        stored.insert("color".to_string(), json!("#ff00ff"));
        let _ = base.update_visual_properties(stored);

        let properties = TypePalette::default()
            .node_visual_properties(&base, NodeType::Technique, "viewer")
            .unwrap();
        assert_eq!(properties["color"], "#ff00ff");
        assert_eq!(properties["radius"], 10.0);
    }

    #[test]
    fn test_score_helpers() {
        assert_eq!(weighted(3, 10, 60), 30);
        assert_eq!(weighted(9, 10, 60), 60);
        assert_eq!(weighted(usize::MAX, u32::MAX, 5), 5);
        assert_eq!(clamp_score(140), 100);
        assert_eq!(clamp_score(42), 42);
    }

    #[test]
    fn test_blob_size() {
        assert_eq!(blob_size(&Value::Null), 0);
        assert_eq!(blob_size(&json!("héllo")), 6);
        assert_eq!(blob_size(&json!({"a": 1})), 7);
    }
}
