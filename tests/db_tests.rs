//! Tests contra Postgres real
//!
//! Se ejecutan sólo si `DATABASE_URL` está definida; sin ella cada test
//! termina sin hacer nada. El schema se aplica con las migraciones del crate
//! y cada test crea sus propios usuarios y VINs, así que pueden correr en
//! paralelo sobre la misma base.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use dealer_ops::{
    build_router,
    config::{database::DatabaseConfig, EnvironmentConfig},
    database::connection::run_migrations,
    state::AppState,
    utils::jwt::{generate_impersonation_token, JwtConfig},
};

struct TestApp {
    app: Router,
    pool: PgPool,
    jwt: JwtConfig,
}

async fn setup() -> Option<TestApp> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };

    let mut config = EnvironmentConfig::for_tests();
    config.database_url = database_url;

    let pool = DatabaseConfig::from_environment(&config)
        .create_pool()
        .await
        .expect("database connection");
    run_migrations(&pool).await.expect("migrations");

    let jwt = JwtConfig::from(&config);
    let state = AppState::new(pool.clone(), config).expect("app state");
    Some(TestApp {
        app: build_router(state),
        pool,
        jwt,
    })
}

/// VIN de 17 caracteres único por llamada
fn unique_vin() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()[..17].to_string()
}

fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        other => other.to_string().parse().expect("decimal number"),
    }
}

impl TestApp {
    async fn create_profile(&self, legacy_role: &str, role_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO profiles (id, email, full_name, role, role_id) VALUES ($1, $2, $3, $4, $5)")
            .bind(id)
            .bind(format!("{}@dealer.test", id))
            .bind("Test User")
            .bind(legacy_role)
            .bind(role_id)
            .execute(&self.pool)
            .await
            .expect("insert profile");
        id
    }

    async fn create_admin(&self) -> String {
        let id = self.create_profile("admin", None).await;
        self.token_for(id)
    }

    fn token_for(&self, user_id: Uuid) -> String {
        // El token de impersonación lleva el mismo `sub` y audiencia que uno normal
        let (token, _) = generate_impersonation_token(user_id, None, Uuid::new_v4(), &self.jwt).expect("token");
        token
    }

    async fn request(&self, method: Method, uri: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn create_vehicle(&self, token: &str, vin: &str) -> Uuid {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/vehicles",
                token,
                Some(json!({
                    "vin": vin,
                    "year": 2019,
                    "make": "Honda",
                    "model": "Accord",
                    "bought_price": "8000.00",
                    "buy_fee": "250.00",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn create_sold_vehicle(&self, token: &str) -> Uuid {
        let id = self.create_vehicle(token, &unique_vin()).await;
        let (status, body) = self
            .request(
                Method::POST,
                &format!("/api/vehicles/{}/sale", id),
                token,
                Some(json!({ "buyer_name": "Jane Buyer", "sale_invoice": "12000.00", "sale_date": "2024-03-01" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["status"], "Sold");
        id
    }

    async fn count(&self, sql: &str, vehicle_id: Uuid) -> i64 {
        let row: (i64,) = sqlx::query_as(sql).bind(vehicle_id).fetch_one(&self.pool).await.expect("count");
        row.0
    }
}

#[tokio::test]
async fn test_duplicate_vin_is_rejected() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;
    let vin = unique_vin();
    t.create_vehicle(&token, &vin).await;

    let (status, body) = t
        .request(
            Method::POST,
            "/api/vehicles",
            &token,
            Some(json!({ "vin": vin.to_lowercase(), "year": 2020, "make": "Toyota", "model": "Camry" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_missing_vin_through_router_is_bad_request() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;

    let (status, body) = t
        .request(
            Method::POST,
            "/api/vehicles",
            &token,
            Some(json!({ "year": 2020, "make": "Toyota", "model": "Camry" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("vin"));
}

#[tokio::test]
async fn test_sold_arb_on_unsold_vehicle_is_rejected() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;
    let id = t.create_vehicle(&token, &unique_vin()).await;

    let (status, _) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb", id),
            &token,
            Some(json!({ "arb_type": "Sold ARB" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .request(Method::POST, &format!("/api/vehicles/{}/arb", id), &token, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let pending = t
        .count("SELECT COUNT(*) FROM vehicle_arb_records WHERE vehicle_id = $1", id)
        .await;
    assert_eq!(pending, 0);
}

#[tokio::test]
async fn test_sold_arb_price_adjustment_creates_one_expense() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;
    let id = t.create_sold_vehicle(&token).await;

    let (status, body) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb", id),
            &token,
            Some(json!({ "arb_type": "Sold ARB", "reason": "Transmission slipping" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["record"]["outcome"], "Pending");
    assert_eq!(body["data"]["vehicle"]["status"], "Pending Arbitration");

    // Un segundo ARB mientras hay uno pendiente
    let (status, _) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb", id),
            &token,
            Some(json!({ "arb_type": "Sold ARB" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb/outcome", id),
            &token,
            Some(json!({ "arb_type": "Sold ARB", "outcome": "Price Adjustment", "adjustment_amount": 500 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["vehicle"]["status"], "Sold");
    assert_eq!(body["data"]["record"]["outcome"], "Price Adjustment");
    assert_eq!(money(&body["data"]["expense"]["cost"]), Decimal::new(500, 0));

    let expenses = t
        .count("SELECT COUNT(*) FROM vehicle_expenses WHERE vehicle_id = $1", id)
        .await;
    assert_eq!(expenses, 1);

    // Ya no queda un registro pendiente que resolver
    let (status, _) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb/outcome", id),
            &token,
            Some(json!({ "arb_type": "Sold ARB", "outcome": "Denied" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let expenses = t
        .count("SELECT COUNT(*) FROM vehicle_expenses WHERE vehicle_id = $1", id)
        .await;
    assert_eq!(expenses, 1);
}

#[tokio::test]
async fn test_buyer_withdrew_clears_sale_fields() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;
    let id = t.create_sold_vehicle(&token).await;

    let (status, _) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb", id),
            &token,
            Some(json!({ "arb_type": "Sold ARB" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb/outcome", id),
            &token,
            Some(json!({
                "outcome": "Buyer Withdrew",
                "transport_cost": "150.00",
                "transport_company": "Fast Haul",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let vehicle = &body["data"]["vehicle"];
    assert_eq!(vehicle["status"], "Pending");
    assert!(vehicle["buyer_name"].is_null());
    assert!(vehicle["sale_invoice"].is_null());
    assert!(vehicle["sale_date"].is_null());
    // La compra no se toca
    assert_eq!(money(&vehicle["bought_price"]), Decimal::new(8000, 0));
    assert_eq!(
        body["data"]["expense"]["description"],
        "ARB Buyer Withdrew - Transport (Fast Haul)"
    );
}

#[tokio::test]
async fn test_inventory_arb_price_adjustment_lowers_bought_price() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;
    let id = t.create_vehicle(&token, &unique_vin()).await;

    let (status, _) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb", id),
            &token,
            Some(json!({ "arb_type": "Inventory ARB" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .request(
            Method::POST,
            &format!("/api/vehicles/{}/arb/outcome", id),
            &token,
            Some(json!({ "outcome": "Price Adjustment", "adjustment_amount": "1000.00" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["vehicle"]["status"], "Pending");
    assert_eq!(money(&body["data"]["vehicle"]["bought_price"]), Decimal::new(7000, 0));
    assert_eq!(money(&body["data"]["vehicle"]["buy_fee"]), Decimal::new(250, 0));
    assert!(body["data"]["expense"].is_null());

    let timeline = t
        .count(
            "SELECT COUNT(*) FROM vehicle_timeline WHERE vehicle_id = $1 AND action LIKE 'Inventory ARB%'",
            id,
        )
        .await;
    assert_eq!(timeline, 2);
}

#[tokio::test]
async fn test_large_import_is_inserted_in_chunks() {
    let Some(t) = setup().await else { return };
    let token = t.create_admin().await;

    let rows: usize = 3_600;
    let mut csv = String::from("VIN,Year,Make,Model,Mileage\n");
    for _ in 0..rows {
        csv.push_str(&format!("{},2018,Toyota,Corolla,42000\n", unique_vin()));
    }
    // Fila inválida: no se importa y se reporta
    csv.push_str(&format!("{},2018,,Corolla,-5\n", unique_vin()));

    let (status, body) = t
        .request(
            Method::POST,
            "/api/vehicles/import",
            &token,
            Some(json!({ "file_name": "big.csv", "format": "csv", "content": csv })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["imported"], rows);
    assert_eq!(body["skipped"], 1);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_null_permission_leaves_do_not_lock_user_out() {
    let Some(t) = setup().await else { return };

    let role_id: (Uuid,) = sqlx::query_as("INSERT INTO roles (name, permissions) VALUES ($1, $2) RETURNING id")
        .bind(format!("Seller {}", Uuid::new_v4()))
        .bind(json!({ "inventory": { "view": true, "edit": null }, "sold": null }))
        .fetch_one(&t.pool)
        .await
        .expect("insert role");
    let seller = t.create_profile("seller", Some(role_id.0)).await;
    let token = t.token_for(seller);

    let (status, body) = t.request(Method::GET, "/api/vehicles", &token, None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, _) = t
        .request(
            Method::POST,
            "/api/vehicles",
            &token,
            Some(json!({ "vin": unique_vin(), "year": 2020, "make": "Toyota", "model": "Camry" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
