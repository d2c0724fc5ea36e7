//! HTTP API Tests
//!
//! Drives the router in-process with `tower::ServiceExt::oneshot`.

#[cfg(test)]
mod api_tests {
    use alignviz_core::{HierarchySnapshot, InMemorySource, JsonDirectorySource};
    use alignviz_server::{create_router, AppState};
    use anyhow::Result;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const SUB: &str = "value-learning-reward";
    const CAP: &str = "value-learning-reward-capability-reward-modeling";

    fn fixture() -> HierarchySnapshot {
        let mut snapshot = HierarchySnapshot::default();
        let mut subcomponents = BTreeMap::new();
        subcomponents.insert(
            SUB.to_string(),
            json!({
                "id": SUB,
                "name": "Reward Learning",
                "type": "subcomponent",
                "capabilities": [{"name": "Reward Modeling", "description": "<b>learn</b>"}]
            }),
        );
        snapshot.subcomponents = subcomponents;
        snapshot
    }

    fn app() -> Router {
        create_router(AppState::new(InMemorySource::new(fixture())), None)
    }

    async fn get(app: Router, uri: &str) -> Result<(StatusCode, Vec<u8>)> {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty())?)
            .await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes().to_vec();
        Ok((status, body))
    }

    async fn get_json(app: Router, uri: &str) -> Result<(StatusCode, Value)> {
        let (status, body) = get(app, uri).await?;
        Ok((status, serde_json::from_slice(&body)?))
    }

    #[tokio::test]
    async fn test_health() -> Result<()> {
        let (status, body) = get_json(app(), "/api/health").await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        Ok(())
    }

    #[tokio::test]
    async fn test_graph() -> Result<()> {
        let (status, body) = get_json(app(), "/api/graph").await?;
        assert_eq!(status, StatusCode::OK);

        // root + 4 components + subcomponent + capability
        assert_eq!(body["nodes"].as_array().map(Vec::len), Some(7));
        assert_eq!(body["links"].as_array().map(Vec::len), Some(6));
        assert_eq!(body["nodes"][0]["id"], "ai-alignment");

        let has_capability = body["links"]
            .as_array()
            .unwrap()
            .iter()
            .any(|link| link["target"] == CAP && link["type"] == "has_capability");
        assert!(has_capability);
        Ok(())
    }

    #[tokio::test]
    async fn test_details() -> Result<()> {
        let (status, body) = get_json(app(), &format!("/api/details/{}", SUB)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Reward Learning");

        let (status, body) = get_json(app(), &format!("/api/details/{}", CAP)).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "capability");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_details_is_404() -> Result<()> {
        let (status, body) = get_json(app(), "/api/details/missing").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NODE_NOT_FOUND");
        assert!(body["message"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_details_html_is_escaped() -> Result<()> {
        let (status, body) = get(app(), &format!("/api/details/{}/html", SUB)).await?;
        assert_eq!(status, StatusCode::OK);

        let html = String::from_utf8(body)?;
        assert!(html.contains("Reward Learning"));
        assert!(html.contains("&lt;b&gt;learn&lt;/b&gt;"));
        Ok(())
    }

    #[tokio::test]
    async fn test_hierarchy_path() -> Result<()> {
        let (status, body) = get_json(app(), &format!("/api/hierarchy-path/{}", CAP)).await?;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<&str> = body["path"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| entry["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["ai-alignment", "value-learning", SUB, CAP]);
        assert_eq!(body["path"][3]["type"], "capability");

        let (status, _) = get_json(app(), "/api/hierarchy-path/missing").await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_directory_source_is_reread_per_request() -> Result<()> {
        let dir = TempDir::new()?;
        let components = dir.path().join("components");
        std::fs::create_dir_all(&components)?;
        std::fs::write(
            components.join("oversight.json"),
            br#"{"id": "oversight", "name": "Oversight"}"#,
        )?;

        let app = create_router(AppState::new(JsonDirectorySource::new(dir.path())), None);

        let (_, body) = get_json(app.clone(), "/api/graph").await?;
        assert_eq!(body["nodes"].as_array().map(Vec::len), Some(2));

        std::fs::write(
            components.join("value-learning.json"),
            br#"{"id": "value-learning", "name": "Value Learning"}"#,
        )?;
        let (_, body) = get_json(app, "/api/graph").await?;
        assert_eq!(body["nodes"].as_array().map(Vec::len), Some(3));
        Ok(())
    }
}
