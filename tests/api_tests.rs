use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use dealer_ops::{
    build_router,
    config::{database::DatabaseConfig, EnvironmentConfig},
    dto::{arb_dto::InitiateArbRequest, vehicle_dto::CreateVehicleRequest},
    state::AppState,
    utils::{
        extract::JsonBody,
        jwt::{generate_impersonation_token, JwtConfig},
    },
};

fn create_test_app() -> Router {
    let config = EnvironmentConfig::for_tests();
    let pool = DatabaseConfig::from_environment(&config)
        .create_lazy_pool()
        .expect("lazy pool");
    let state = AppState::new(pool, config).expect("app state");
    build_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check_reports_database_state() {
    let (status, body) = send(create_test_app(), get("/health")).await;

    // Sin base de datos en los tests el servicio responde degradado
    assert!(status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["status"] == "ok" || body["status"] == "degraded");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_api_requires_token() {
    let (status, body) = send(create_test_app(), get("/api/vehicles")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_api_rejects_malformed_header() {
    let request = Request::builder()
        .uri("/api/reports/sales")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(create_test_app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_rejects_token_signed_with_other_secret() {
    let other = JwtConfig {
        secret: "a-completely-different-secret-of-32-chars".to_string(),
        expiration: 600,
    };
    let (token, _) =
        generate_impersonation_token(Uuid::new_v4(), None, Uuid::new_v4(), &other).unwrap();

    let request = Request::builder()
        .uri("/api/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(create_test_app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (status, _) = send(create_test_app(), get("/api/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// Handlers mínimos con los mismos cuerpos que `/api/vehicles` y `/arb`
fn body_test_app() -> Router {
    Router::new()
        .route(
            "/vehicles",
            post(|JsonBody(_request): JsonBody<CreateVehicleRequest>| async { StatusCode::CREATED }),
        )
        .route(
            "/arb",
            post(|JsonBody(_request): JsonBody<InitiateArbRequest>| async { StatusCode::CREATED }),
        )
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_missing_arb_type_is_bad_request() {
    let (status, body) = send(body_test_app(), post_json("/arb", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["error"].as_str().unwrap().contains("arb_type"));
}

#[tokio::test]
async fn test_unknown_arb_type_is_bad_request() {
    let (status, body) = send(body_test_app(), post_json("/arb", r#"{"arb_type":"Bogus ARB"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Bogus ARB"));
}

#[tokio::test]
async fn test_missing_vin_is_bad_request() {
    let request = post_json("/vehicles", r#"{"year":2019,"make":"Honda","model":"Accord"}"#);
    let (status, body) = send(body_test_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("vin"));
}

#[tokio::test]
async fn test_malformed_json_and_missing_content_type_are_bad_request() {
    let (status, body) = send(body_test_app(), post_json("/arb", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/arb")
        .body(Body::from(r#"{"arb_type":"Sold ARB"}"#))
        .unwrap();
    let (status, body) = send(body_test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(body_test_app(), post_json("/arb", r#"{"arb_type":"Sold ARB"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
}
