use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use alzar::activity::ActivityLog;
use alzar::embedding::{HashingEmbeddingModel, MockEmbeddingModel, ModelHandle};
use alzar::library::Library;
use alzar::ranker::RankingConfig;
use alzar::server::routing::create_router;
use alzar::server::AppState;
use alzar::store::MemoryStore;

struct TestServer {
  router: Router,
  store: Arc<MemoryStore>,
  _dir: TempDir,
}

fn server_with_model(model: ModelHandle) -> TestServer {
  let dir = TempDir::new().unwrap();
  let store = Arc::new(MemoryStore::new());
  let activity = ActivityLog::new(dir.path().join("activity.jsonl"));
  let library = Library::new(store.clone(), Arc::new(model), RankingConfig::default())
    .with_activity_log(activity.clone());

  let router = create_router(AppState::new(Arc::new(library), activity));
  TestServer { router, store, _dir: dir }
}

fn server() -> TestServer {
  server_with_model(ModelHandle::preloaded(Box::new(HashingEmbeddingModel::new(384))))
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(body) => builder
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };

  let response = router.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, json)
}

fn work(title: &str, emotions: &str, opinion: &str) -> Value {
  json!({
    "title": title,
    "author": format!("author of {title}"),
    "genre": "novel",
    "emotions": emotions,
    "opinion": opinion,
  })
}

#[tokio::test]
async fn test_submit_and_list() {
  let server = server();

  let (status, body) = call(&server.router, "POST", "/works", Some(work("Dune", "awe", "sand"))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["work"]["title"], "Dune");
  assert!(body["transaction_id"].is_string());

  call(&server.router, "POST", "/works", Some(work("Emma", "wit", "matchmaking"))).await;

  let (status, body) = call(&server.router, "GET", "/works?limit=1", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["count"], 1);
  assert_eq!(body["works"][0]["title"], "Emma");
}

#[tokio::test]
async fn test_submit_missing_fields_is_unprocessable() {
  let server = server();

  let (status, body) =
    call(&server.router, "POST", "/works", Some(json!({ "title": "Dune", "opinion": " " }))).await;

  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["key"], "validation_failed");
  assert_eq!(body["errors"][0]["context"]["missing"], json!(["author", "opinion"]));
  assert_eq!(server.store.append_count(), 0);
}

#[tokio::test]
async fn test_recommend_outcomes() {
  let server = server();

  let (status, body) =
    call(&server.router, "POST", "/recommend", Some(json!({ "query": "hope" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["outcome"], "no_data");

  call(&server.router, "POST", "/works", Some(work("Sailor", "loneliness", "lonely seas"))).await;
  call(&server.router, "POST", "/works", Some(work("Comedy", "joy", "a wedding farce"))).await;

  let (_, body) = call(&server.router, "POST", "/recommend", Some(json!({ "query": "" }))).await;
  assert_eq!(body["outcome"], "unranked");
  assert_eq!(body["works"][0]["title"], "Comedy");

  let (_, body) =
    call(&server.router, "POST", "/recommend", Some(json!({ "query": "loneliness" }))).await;
  assert_eq!(body["outcome"], "ranked");
  assert_eq!(body["results"][0]["record"]["title"], "Sailor");
  assert!(body["results"][0]["score"].as_f64().unwrap() > body["results"][1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn test_embedding_failure_is_bad_gateway() {
  let server =
    server_with_model(ModelHandle::preloaded(Box::new(MockEmbeddingModel::new().with_failure_on("hope"))));
  call(&server.router, "POST", "/works", Some(work("Dune", "awe", "sand"))).await;

  let (status, body) =
    call(&server.router, "POST", "/recommend", Some(json!({ "query": "hope" }))).await;
  assert_eq!(status, StatusCode::BAD_GATEWAY);
  assert_eq!(body["errors"][0]["key"], "embedding_failed");
}

#[tokio::test]
async fn test_store_unavailable_is_service_unavailable() {
  let server = server();
  server.store.set_unavailable(true);

  let (status, body) = call(&server.router, "GET", "/works", None).await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body["errors"][0]["key"], "store_unavailable");
}

#[tokio::test]
async fn test_status_version_and_config() {
  let server = server();

  let (status, body) = call(&server.router, "GET", "/status", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["store"], "memory");

  let (_, body) = call(&server.router, "GET", "/version", None).await;
  assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

  let (_, body) = call(&server.router, "GET", "/config", None).await;
  assert_eq!(body["ranking"]["top_k"], 5);
  assert_eq!(body["ranking"]["scoring"]["mode"], "cosine");
  assert_eq!(body["ranking"]["combined_fields"], json!(["genre", "emotions", "opinion"]));
}

#[tokio::test]
async fn test_requests_are_logged() {
  let server = server();
  call(&server.router, "GET", "/version", None).await;
  call(&server.router, "POST", "/works", Some(json!({}))).await;

  let (status, body) = call(&server.router, "GET", "/logs?level=warn", None).await;
  assert_eq!(status, StatusCode::OK);
  let logs = body["logs"].as_array().unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0]["context"]["status_code"], 422);
  assert_eq!(logs[0]["context"]["path"], "/works");

  let (status, _) = call(&server.router, "GET", "/logs?level=loud", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
