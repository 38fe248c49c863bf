//! Router-level envelope tests. No database is contacted: the handle is
//! never established, so `/health` reports `starting`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceExt;

use common_core::error::BANNED;
use common_core::{Ack, AppError};
use common_db::{ConnectionManager, ConnectionSettings, PgConnector};
use common_server::{build_router, ApiError, AppState, Dispatcher, JsonBody, Reply, ValidId};

#[derive(Debug, Deserialize)]
struct Ban {
    user_id: i64,
}

async fn get_order(State(state): State<AppState>, ValidId(id): ValidId) -> Reply<Value> {
    state.dispatcher().dispatch(async move { Ok(json!({ "id": id })) }).await
}

async fn ban_user(State(state): State<AppState>, JsonBody(ban): JsonBody<Ban>) -> Reply<Ack> {
    state
        .dispatcher()
        .dispatch(async move {
            if ban.user_id == 1 {
                return Err(BANNED.into());
            }
            Ok(Ack::default())
        })
        .await
}

async fn secret() -> Result<Reply<Value>, ApiError> {
    Err(AppError::unauthorized().into())
}

async fn slow(State(state): State<AppState>) -> Reply<Ack> {
    state
        .dispatcher()
        .dispatch(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Ack::default())
        })
        .await
}

fn app(dispatcher: Dispatcher) -> Router {
    let settings = ConnectionSettings::parse("postgres@app:secret/127.0.0.1:5432/orders")
        .expect("settings parse");
    let manager = ConnectionManager::new(PgConnector::default(), settings).expect("manager");
    let state = AppState::new(Arc::new(manager), dispatcher);

    let routes = Router::new()
        .route("/orders/{id}", get(get_order))
        .route("/bans", post(ban_user))
        .route("/secret", get(secret))
        .route("/slow", get(slow));

    build_router(state, routes, false)
}

async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn single_key(body: &Value) -> &str {
    let obj = body.as_object().expect("envelope is an object");
    assert_eq!(obj.len(), 1, "envelope must carry exactly one key: {body}");
    obj.keys().next().map(String::as_str).unwrap_or_default()
}

#[tokio::test]
async fn health_reports_starting_before_first_connect() {
    let (status, body) = call(app(Dispatcher::default()), get_req("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single_key(&body), "response");
    assert_eq!(body["response"]["status"], "ok");
    assert_eq!(body["response"]["database"], "starting");
}

#[tokio::test]
async fn success_renders_response_envelope() {
    let (status, body) = call(app(Dispatcher::default()), get_req("/orders/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": {"id": 7}}));
}

#[tokio::test]
async fn invalid_id_is_incorrect_id() {
    for uri in ["/orders/abc", "/orders/0", "/orders/-3"] {
        let (status, body) = call(app(Dispatcher::default()), get_req(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({"error": {"code": 1012, "message": "incorrect id"}}));
    }
}

#[tokio::test]
async fn business_error_renders_error_envelope_with_200() {
    let (status, body) = call(app(Dispatcher::default()), post_json("/bans", r#"{"user_id": 1}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": {"code": 1001, "message": "user banned"}}));
}

#[tokio::test]
async fn command_success_is_acknowledged() {
    let (status, body) = call(app(Dispatcher::default()), post_json("/bans", r#"{"user_id": 2}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"response": {"success": true}}));
}

#[tokio::test]
async fn bad_body_is_incorrect_data() {
    let (status, body) = call(app(Dispatcher::default()), post_json("/bans", "{oops")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single_key(&body), "error");
    assert_eq!(body["error"]["code"], 1021);
}

#[tokio::test]
async fn unauthorized_keeps_http_status() {
    let (status, body) = call(app(Dispatcher::default()), get_req("/secret")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": {"code": 2000, "message": "unauthorized"}}));
}

#[tokio::test(start_paused = true)]
async fn slow_work_renders_timeout_envelope() {
    let dispatcher = Dispatcher::new(Some(Duration::from_secs(2)));
    let (status, body) = call(app(dispatcher), get_req("/slow")).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(single_key(&body), "error");
    assert_eq!(body["error"]["code"], 503);
}
