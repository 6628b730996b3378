use std::sync::Arc;

use run_route_client::credentials::{
    AmbientCredentials, Credential, CredentialError, CredentialProvider, EnvCredentials,
    StaticCredentials,
};
use run_route_client::fetch::{BasicClient, RequestError};
use run_route_client::services::items_api::{ApiError, ItemsApi, NewItem};
use run_route_client::services::run::{Route, RunError, RunPlan, run_routes};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Unavailable;

#[async_trait::async_trait]
impl CredentialProvider for Unavailable {
    async fn credential(&self) -> Result<Credential, CredentialError> {
        Err(CredentialError::NotConfigured("no adc".to_string()))
    }
}

fn api_for(server: &MockServer) -> ItemsApi<BasicClient> {
    ItemsApi::new(
        &server.uri(),
        BasicClient::new(),
        Arc::new(StaticCredentials::new("test-token")),
    )
    .expect("valid base url")
}

fn plan(routes: Vec<Route>, fail_fast: bool) -> RunPlan {
    RunPlan {
        routes,
        item_id: "123".to_string(),
        new_item: new_item(),
        fail_fast,
    }
}

async fn mount_routes(server: &MockServer, items: u16, item: u16, create: u16) {
    Mock::given(method("GET"))
        .and(path("/data/items"))
        .respond_with(ResponseTemplate::new(items).set_body_string("[]"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/item/123"))
        .respond_with(ResponseTemplate::new(item).set_body_string(r#"{"id":"123"}"#))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/data/item"))
        .respond_with(ResponseTemplate::new(create).set_body_string(r#"{"id":"456"}"#))
        .mount(server)
        .await;
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}

fn new_item() -> NewItem {
    NewItem {
        name: "New Learning Module".to_string(),
        duration_minutes: 60,
        category: "Programming".to_string(),
    }
}

#[tokio::test]
async fn test_all_three_routes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/items"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/item/123"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"123"}"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/data/item"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({
            "name": "New Learning Module",
            "durationMinutes": 60,
            "category": "Programming"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"456"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let api = ItemsApi::new(
        &server.uri(),
        BasicClient::new(),
        Arc::new(StaticCredentials::new("test-token")),
    )
    .expect("valid base url");

    assert_eq!(api.list_items().await.unwrap(), "[]");
    assert_eq!(api.get_item("123").await.unwrap(), r#"{"id":"123"}"#);
    assert_eq!(api.create_item(&new_item()).await.unwrap(), r#"{"id":"456"}"#);
}

#[tokio::test]
async fn test_get_sends_no_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let api = ItemsApi::new(
        &server.uri(),
        BasicClient::new(),
        Arc::new(StaticCredentials::new("test-token")),
    )
    .unwrap();
    api.list_items().await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("content-type").is_none());
    assert!(received[0].body.is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/item/7"))
        .respond_with(ResponseTemplate::new(401).set_body_string("missing audience"))
        .mount(&server)
        .await;

    let api = ItemsApi::new(
        &server.uri(),
        BasicClient::new(),
        Arc::new(StaticCredentials::new("test-token")),
    )
    .unwrap();

    match api.get_item("7").await {
        Err(ApiError::Request(RequestError::Status { status, body })) => {
            assert_eq!(status.as_u16(), 401);
            assert_eq!(body, "missing audience");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let api = ItemsApi::new(
        "http://127.0.0.1:1",
        BasicClient::new(),
        Arc::new(StaticCredentials::new("test-token")),
    )
    .unwrap();

    let err = api.list_items().await.unwrap_err();
    assert!(matches!(err, ApiError::Request(RequestError::Transport(_))));
}

#[tokio::test]
async fn test_empty_item_id_is_not_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["all"]"#))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = api.get_item("").await.unwrap_err();

    assert!(matches!(err, ApiError::EmptyItemId));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_environment_token_flows_to_routes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/items"))
        .and(header("authorization", "Bearer from-env"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let env = EnvCredentials::with_lookup("IDENTITY_TOKEN", |_: &str| {
        Some("from-env".to_string())
    });
    let provider = AmbientCredentials::from_sources(env, Arc::new(Unavailable));
    let api = ItemsApi::new(&server.uri(), BasicClient::new(), Arc::new(provider)).unwrap();

    assert_eq!(api.list_items().await.unwrap(), "[]");
}

#[tokio::test]
async fn test_failed_credentials_make_no_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let env = EnvCredentials::with_lookup("IDENTITY_TOKEN", |_: &str| None);
    let provider = AmbientCredentials::from_sources(env, Arc::new(Unavailable));
    let api = ItemsApi::new(&server.uri(), BasicClient::new(), Arc::new(provider)).unwrap();

    let err = api.create_item(&new_item()).await.unwrap_err();
    assert!(matches!(err, ApiError::Credential(_)));
}

#[tokio::test]
async fn test_blank_token_fails_before_any_route() {
    let server = MockServer::start().await;

    let err = ItemsApi::connect(
        &server.uri(),
        BasicClient::new(),
        Arc::new(StaticCredentials::new("")),
    )
    .await
    .err()
    .expect("blank token must be rejected");

    assert!(matches!(
        err,
        ApiError::Credential(CredentialError::NotConfigured(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_continues_after_a_failed_route() {
    let server = MockServer::start().await;
    mount_routes(&server, 200, 500, 201).await;

    let mut out = Vec::new();
    let err = run_routes(&api_for(&server), &plan(Route::ALL.to_vec(), false), &mut out)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Failed { failed: 1, total: 3 }));
    assert_eq!(
        request_paths(&server).await,
        vec![
            "GET /data/items".to_string(),
            "GET /data/item/123".to_string(),
            "POST /data/item".to_string(),
        ]
    );

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("Response for GET /data/items: []"));
    assert!(printed.contains(r#"Response for POST /data/item: {"id":"456"}"#));
    assert!(!printed.contains("Response for GET /data/item/123"));
}

#[tokio::test]
async fn test_fail_fast_stops_at_first_failure() {
    let server = MockServer::start().await;
    mount_routes(&server, 503, 200, 201).await;

    let mut out = Vec::new();
    let err = run_routes(&api_for(&server), &plan(Route::ALL.to_vec(), true), &mut out)
        .await
        .unwrap_err();

    match err {
        RunError::Aborted { label, source } => {
            assert_eq!(label, "GET /data/items");
            assert!(matches!(
                source,
                ApiError::Request(RequestError::Status { .. })
            ));
        }
        other => panic!("expected abort, got {other:?}"),
    }
    assert_eq!(request_paths(&server).await, vec!["GET /data/items".to_string()]);
}

#[tokio::test]
async fn test_single_route_runs_alone() {
    let server = MockServer::start().await;
    mount_routes(&server, 200, 200, 201).await;

    let mut out = Vec::new();
    let calls = run_routes(&api_for(&server), &plan(vec![Route::Create], false), &mut out)
        .await
        .unwrap();

    assert_eq!(calls, 1);
    assert_eq!(request_paths(&server).await, vec!["POST /data/item".to_string()]);
}

#[tokio::test]
async fn test_all_routes_succeed() {
    let server = MockServer::start().await;
    mount_routes(&server, 200, 200, 201).await;

    let mut out = Vec::new();
    let calls = run_routes(&api_for(&server), &plan(Route::ALL.to_vec(), false), &mut out)
        .await
        .unwrap();

    assert_eq!(calls, 3);
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("--- Accessing").count(), 3);
}
