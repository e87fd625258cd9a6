// Copyright 2024 The Kubepod Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::context::Context;
use crate::{routes, swagger};

/// Builds the application: the API routes, the swagger UI and the request id
/// and tracing middleware.
pub fn build(ctx: Arc<Context>) -> Router {
    routes::build()
        .merge(swagger::build())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(ctx)
}

pub async fn run(ctx: Arc<Context>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", ctx.config.host, ctx.config.port);
    let app = build(ctx);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("server stopped");

    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use k8s_openapi::api::core::v1::{Node, Pod};
    use kubepod_resources::error::{Error, Result};
    use kubepod_resources::{Accessor, NodeList, PodList};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    const CLUSTER: &str = "ddi-dev-use1";

    #[derive(Default)]
    struct FakeAccessor {
        namespaces: Mutex<Vec<Option<String>>>,
        delay: Option<Duration>,
    }

    fn node(name: &str) -> Node {
        serde_json::from_value(json!({ "metadata": { "name": name } })).unwrap()
    }

    fn pod(name: &str, namespace: &str) -> Pod {
        serde_json::from_value(json!({ "metadata": { "name": name, "namespace": namespace } })).unwrap()
    }

    fn pods() -> Vec<Pod> {
        vec![pod("web", "default"), pod("coredns", "kube-system"), pod("api", "default")]
    }

    #[async_trait]
    impl Accessor for FakeAccessor {
        async fn list_nodes(&self) -> Result<NodeList> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(NodeList {
                items: vec![node("ip-10-0-0-1.ec2.internal"), node("ip-10-0-0-2.ec2.internal")],
                metadata: Default::default(),
            })
        }

        async fn get_node(&self, name: &str) -> Result<Node> {
            match name {
                "ip-10-0-0-1.ec2.internal" => Ok(node(name)),
                _ => Err(Error::NotFound { kind: "node", name: name.to_string() }),
            }
        }

        async fn list_pods(&self, namespace: Option<&str>) -> Result<PodList> {
            self.namespaces.lock().unwrap().push(namespace.map(String::from));
            let items = pods()
                .into_iter()
                .filter(|pod| namespace.is_none() || pod.metadata.namespace.as_deref() == namespace)
                .collect();
            Ok(PodList { items, metadata: Default::default() })
        }

        async fn get_pod(&self, name: &str, namespace: &str) -> Result<Pod> {
            pods()
                .into_iter()
                .find(|pod| pod.metadata.name.as_deref() == Some(name) && pod.metadata.namespace.as_deref() == Some(namespace))
                .ok_or_else(|| Error::NotFound { kind: "pod", name: format!("{namespace}/{name}") })
        }
    }

    fn config(extra: &[&str]) -> Config {
        let mut args = vec![
            "kubepod",
            "--eks-cluster-name",
            CLUSTER,
            "--aws-arn",
            "arn:aws:iam::123456789012:role/eks-reader",
        ];
        args.extend_from_slice(extra);
        Config::load_from(args).unwrap()
    }

    fn app_with(accessor: Arc<FakeAccessor>, extra: &[&str]) -> Router {
        build(Arc::new(Context::with_accessor(config(extra), accessor)))
    }

    fn app() -> Router {
        app_with(Arc::new(FakeAccessor::default()), &[])
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn get_with_body(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn names(list: &Value) -> Vec<&str> {
        list["items"].as_array().unwrap().iter().map(|item| item["metadata"]["name"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_list_nodes() {
        let (status, body) = get(app(), "/nodes?callerId=c-1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clusterName"], CLUSTER);
        assert_eq!(body["callerId"], "c-1");
        assert_eq!(body["nodes"]["kind"], "NodeList");
        assert_eq!(body["nodes"]["apiVersion"], "v1");
        assert_eq!(names(&body["nodes"]), vec!["ip-10-0-0-1.ec2.internal", "ip-10-0-0-2.ec2.internal"]);
    }

    #[tokio::test]
    async fn test_get_node() {
        let (status, body) = get(app(), "/nodes/ip-10-0-0-1.ec2.internal?callerId=c-2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"]["metadata"]["name"], "ip-10-0-0-1.ec2.internal");
        assert_eq!(body["callerId"], "c-2");
    }

    #[tokio::test]
    async fn test_missing_caller_id_is_invalid() {
        let (status, body) = get(app(), "/nodes").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "Invalid request.");
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().contains("callerId"));
    }

    #[tokio::test]
    async fn test_caller_id_from_json_body() {
        let (status, body) = get_with_body(app(), "/nodes", r#"{"callerId": "c-body"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["callerId"], "c-body");

        let (status, body) =
            get_with_body(app(), "/pods/web?namespace=default", r#"{"callerId": "c-pod"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["callerId"], "c-pod");
        assert_eq!(body["pod"]["metadata"]["name"], "web");
    }

    #[tokio::test]
    async fn test_query_caller_id_wins_over_body() {
        let (status, body) = get_with_body(app(), "/nodes?callerId=c-query", r#"{"callerId": "c-body"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["callerId"], "c-query");
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid() {
        let (status, body) = get_with_body(app(), "/nodes", "callerId=c-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);

        let (status, _) = get_with_body(app(), "/nodes", r#"["c-1"]"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_with_body(app(), "/nodes", r#"{"callerId": 42}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_with_body(app(), "/nodes", r#"{"callerId": ""}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_caller_id_is_invalid() {
        let (status, _) = get(app(), "/pods?callerId=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_names_are_rejected() {
        let (status, _) = get(app(), "/nodes/Not_A_Node?callerId=c-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(app(), "/pods?callerId=c-1&namespace=Kube.System").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_node_is_internal_error_by_default() {
        let (status, body) = get(app(), "/nodes/ip-10-9-9-9.ec2.internal?callerId=c-1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], "Internal server error.");
        assert_eq!(body["code"], 500);
    }

    #[tokio::test]
    async fn test_missing_node_is_not_found_when_enabled() {
        let app = app_with(Arc::new(FakeAccessor::default()), &["--not-found-status"]);
        let (status, body) = get(app, "/nodes/ip-10-9-9-9.ec2.internal?callerId=c-1").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "Resource not found.");
        assert_eq!(body["error"], "node ip-10-9-9-9.ec2.internal not found");
    }

    #[tokio::test]
    async fn test_list_pods_of_namespace() {
        let accessor = Arc::new(FakeAccessor::default());
        let (status, body) = get(app_with(accessor.clone(), &[]), "/pods?callerId=c-1&namespace=default").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body["pods"]), vec!["web", "api"]);
        assert_eq!(*accessor.namespaces.lock().unwrap(), vec![Some("default".to_string())]);
    }

    #[tokio::test]
    async fn test_list_pods_of_all_namespaces() {
        let accessor = Arc::new(FakeAccessor::default());
        let (status, body) = get(app_with(accessor.clone(), &[]), "/pods?callerId=c-1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body["pods"]).len(), 3);
        assert_eq!(*accessor.namespaces.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_get_pod_requires_namespace() {
        let (status, _) = get(app(), "/pods/web?callerId=c-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(app(), "/pods/web?callerId=c-1&namespace=default").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pod"]["metadata"]["namespace"], "default");
    }

    #[tokio::test]
    async fn test_namespaced_routes() {
        let accessor = Arc::new(FakeAccessor::default());
        let (status, body) = get(app_with(accessor.clone(), &[]), "/namespaces/kube-system/pods?callerId=c-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body["pods"]), vec!["coredns"]);
        assert_eq!(*accessor.namespaces.lock().unwrap(), vec![Some("kube-system".to_string())]);

        let (status, body) = get(app(), "/namespaces/default/pods/api?callerId=c-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pod"]["metadata"]["name"], "api");

        let (status, _) = get(app(), "/namespaces/kube-system/pods/api?callerId=c-1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_concurrent_requests_keep_their_caller_id() {
        let app = app();
        let requests = (0..50).map(|i| {
            let app = app.clone();
            async move {
                let (status, body) = get(app, &format!("/nodes?callerId=caller-{i}")).await;
                assert_eq!(status, StatusCode::OK);
                (i, body["callerId"].as_str().unwrap().to_string())
            }
        });

        for (i, caller_id) in futures::future::join_all(requests).await {
            assert_eq!(caller_id, format!("caller-{i}"));
        }
    }

    #[tokio::test]
    async fn test_slow_cluster_exceeds_deadline() {
        let accessor = Arc::new(FakeAccessor { delay: Some(Duration::from_secs(5)), ..Default::default() });
        let (status, body) = get(app_with(accessor, &["--request-timeout", "1"]), "/nodes?callerId=c-1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("deadline"));
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app().oneshot(Request::builder().uri("/nodes?callerId=c-1").body(Body::empty()).unwrap()).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let request = Request::builder().uri("/nodes?callerId=c-1").header("x-request-id", "req-42").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, body) = get(app(), "/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        let paths = body["paths"].as_object().unwrap();
        for path in ["/nodes", "/nodes/{node}", "/pods", "/pods/{pod}", "/namespaces/{namespace}/pods", "/namespaces/{namespace}/pods/{pod}"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert!(body["components"]["schemas"]["ErrorResponse"].is_object());
        assert!(body["paths"]["/nodes"]["get"]["responses"]["400"].is_object());
    }
}
