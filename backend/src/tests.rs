//! Integration tests for the AutoQuote backend.

use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::{create_router, AppState};

const TEST_PSK: &str = "test-api-key";

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(TEST_PSK.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool.clone()));

        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            notify_window_days: 7,
            overdue_lookback_days: 90,
        };

        let state = AppState {
            repo,
            config: Arc::new(config),
        };

        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            pool,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn delete(&self, path: &str) -> (u16, Value) {
        let resp = self.client.delete(self.url(path)).send().await.unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn revision(&self) -> i64 {
        let (_, body) = self.get("/api/datastore/revision").await;
        body["data"]["revisionId"].as_i64().unwrap()
    }

    async fn create_profile(&self, email: &str) -> String {
        let (status, body) = self
            .post("/api/profiles", json!({ "email": email, "fullName": "Shop Owner" }))
            .await;
        assert_eq!(status, 200);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn subscription(&self, profile_id: &str) -> String {
        let (_, body) = self.get(&format!("/api/profiles/{}", profile_id)).await;
        body["data"]["subscription"].as_str().unwrap().to_string()
    }

    /// Send a webhook the way the processor does: no API key.
    async fn webhook(&self, body: Value) -> (u16, Value) {
        let resp = Client::new()
            .post(self.url("/webhooks/payment"))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status().as_u16(), resp.json().await.unwrap())
    }

    async fn create_client(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/clients",
                json!({ "name": name, "vehicleModel": "Civic", "vehiclePlate": "ABC1D23" }),
            )
            .await;
        assert_eq!(status, 200);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

/// Make every revision bump fail so multi-statement writes must roll back.
async fn block_revision_bumps(pool: &SqlitePool) {
    sqlx::query(
        "CREATE TRIGGER block_revision BEFORE UPDATE ON meta BEGIN SELECT RAISE(ABORT, 'revision locked'); END",
    )
    .execute(pool)
    .await
    .unwrap();
}

fn order(status: &str, email: &str) -> Value {
    json!({ "order_status": status, "Customer": { "email": email } })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_required_for_dashboard() {
    let fixture = TestFixture::new().await;

    let resp = Client::new()
        .get(fixture.url("/api/clients"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let resp = Client::new()
        .get(fixture.url("/api/clients"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = Client::new()
        .get(fixture.url("/api/clients"))
        .bearer_auth(TEST_PSK)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_auth_disabled_without_psk() {
    let fixture = TestFixture::with_psk(None).await;

    let (status, body) = fixture.get("/api/datastore").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert!(body["data"]["schemaVersion"].is_number());
}

// ==================== WEBHOOK ====================

#[tokio::test]
async fn test_webhook_rejects_non_post_methods() {
    let fixture = TestFixture::new().await;
    let profile_id = fixture.create_profile("owner@shop.com").await;
    let before = fixture.revision().await;

    let client = Client::new();
    for method in [
        reqwest::Method::GET,
        reqwest::Method::PUT,
        reqwest::Method::PATCH,
        reqwest::Method::DELETE,
    ] {
        let resp = client
            .request(method.clone(), fixture.url("/webhooks/payment"))
            .json(&order("paid", "owner@shop.com"))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 405, "method {}", method);
        assert_eq!(resp.headers()["allow"], "POST");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
    }

    assert_eq!(fixture.revision().await, before);
    assert_eq!(fixture.subscription(&profile_id).await, "free");
}

#[tokio::test]
async fn test_webhook_rejects_missing_fields() {
    let fixture = TestFixture::new().await;
    let profile_id = fixture.create_profile("owner@shop.com").await;
    let before = fixture.revision().await;

    let payloads = [
        json!({ "Customer": { "email": "owner@shop.com" } }),
        json!({ "order_status": "paid" }),
        json!({ "order_status": "paid", "Customer": {} }),
        json!({ "order_status": "", "Customer": { "email": "owner@shop.com" } }),
    ];
    for payload in payloads {
        let (status, body) = fixture.webhook(payload).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
    }

    let resp = Client::new()
        .post(fixture.url("/webhooks/payment"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    assert_eq!(fixture.revision().await, before);
    assert_eq!(fixture.subscription(&profile_id).await, "free");
}

#[tokio::test]
async fn test_webhook_unknown_email_is_acknowledged() {
    let fixture = TestFixture::new().await;
    fixture.create_profile("owner@shop.com").await;
    let before = fixture.revision().await;

    let (status, body) = fixture.webhook(order("paid", "stranger@else.com")).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["action"], "user_not_found");
    assert_eq!(fixture.revision().await, before);
}

#[tokio::test]
async fn test_webhook_paid_upgrades_once() {
    let fixture = TestFixture::new().await;
    let profile_id = fixture.create_profile("owner@shop.com").await;
    let other_id = fixture.create_profile("other@shop.com").await;
    let before = fixture.revision().await;

    let (status, body) = fixture.webhook(order("paid", "  OWNER@shop.com ")).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["action"], "upgraded");
    assert_eq!(body["data"]["userId"], profile_id.as_str());
    assert_eq!(body["data"]["subscription"], "pro");
    assert_eq!(body["revisionId"].as_i64().unwrap(), before + 1);

    assert_eq!(fixture.subscription(&profile_id).await, "pro");
    assert_eq!(fixture.subscription(&other_id).await, "free");
    assert_eq!(fixture.revision().await, before + 1);
}

#[tokio::test]
async fn test_webhook_refund_and_chargeback_downgrade() {
    let fixture = TestFixture::new().await;
    let profile_id = fixture.create_profile("owner@shop.com").await;

    for status in ["refunded", "chargedback"] {
        fixture.webhook(order("paid", "owner@shop.com")).await;
        assert_eq!(fixture.subscription(&profile_id).await, "pro");

        let (code, body) = fixture.webhook(order(status, "owner@shop.com")).await;
        assert_eq!(code, 200);
        assert_eq!(body["data"]["action"], "downgraded");
        assert_eq!(fixture.subscription(&profile_id).await, "free");
    }
}

#[tokio::test]
async fn test_webhook_ignores_other_statuses() {
    let fixture = TestFixture::new().await;
    let profile_id = fixture.create_profile("owner@shop.com").await;
    let before = fixture.revision().await;

    let (status, body) = fixture
        .webhook(order("waiting_payment", "owner@shop.com"))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["action"], "ignored");
    assert_eq!(fixture.revision().await, before);
    assert_eq!(fixture.subscription(&profile_id).await, "free");
}

#[tokio::test]
async fn test_webhook_database_failure_still_returns_200() {
    let fixture = TestFixture::new().await;
    fixture.create_profile("owner@shop.com").await;

    fixture.pool.close().await;

    let (status, body) = fixture.webhook(order("paid", "owner@shop.com")).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn test_webhook_tier_change_rolls_back_with_revision() {
    let fixture = TestFixture::new().await;
    let profile_id = fixture.create_profile("owner@shop.com").await;

    block_revision_bumps(&fixture.pool).await;

    let (status, body) = fixture.webhook(order("paid", "owner@shop.com")).await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], false);

    // Reported failure means nothing changed.
    assert_eq!(fixture.subscription(&profile_id).await, "free");
}

// ==================== PROFILES ====================

#[tokio::test]
async fn test_profile_email_is_unique() {
    let fixture = TestFixture::new().await;
    fixture.create_profile("owner@shop.com").await;

    let (status, body) = fixture
        .post("/api/profiles", json!({ "email": "Owner@Shop.com" }))
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = fixture
        .post("/api/profiles", json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(status, 400);
}

// ==================== CLIENTS ====================

#[tokio::test]
async fn test_client_crud() {
    let fixture = TestFixture::new().await;
    let before = fixture.revision().await;

    let client_id = fixture.create_client("Maria Souza").await;
    assert_eq!(fixture.revision().await, before + 1);

    let (status, body) = fixture.get(&format!("/api/clients/{}", client_id)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["vehiclePlate"], "ABC1D23");

    let (status, body) = fixture
        .put(
            &format!("/api/clients/{}", client_id),
            json!({ "phone": "+55 11 99999-0000", "expectedVersion": 1 }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["version"], 2);
    assert_eq!(body["data"]["name"], "Maria Souza");
    assert_eq!(body["revisionId"].as_i64().unwrap(), before + 2);

    let (status, body) = fixture
        .put(
            &format!("/api/clients/{}", client_id),
            json!({ "name": "Stale", "expectedVersion": 1 }),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "VERSION_MISMATCH");
    assert_eq!(body["error"]["details"]["currentVersion"], 2);

    let (status, _) = fixture.delete(&format!("/api/clients/{}", client_id)).await;
    assert_eq!(status, 200);

    let (status, body) = fixture.get(&format!("/api/clients/{}", client_id)).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_client_delete_is_atomic() {
    let fixture = TestFixture::new().await;
    let client_id = fixture.create_client("Rafael").await;
    let guarded_id = fixture.create_client("Beatriz").await;

    // A quote row written outside the API still blocks the delete.
    sqlx::query(
        "INSERT INTO quotes (id, client_id, items, discount_cents, status, subtotal_cents, applied_discount_cents, total_cents, fee_cents, net_cents, created_at, updated_at, version) VALUES ('q-1', ?, '[]', 0, 'draft', 0, 0, 0, 0, 0, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z', 1)",
    )
    .bind(&guarded_id)
    .execute(&fixture.pool)
    .await
    .unwrap();

    let (status, body) = fixture.delete(&format!("/api/clients/{}", guarded_id)).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = fixture.delete("/api/clients/no-such-client").await;
    assert_eq!(status, 404);

    block_revision_bumps(&fixture.pool).await;

    let (status, _) = fixture.delete(&format!("/api/clients/{}", client_id)).await;
    assert_eq!(status, 500);

    let (status, _) = fixture.get(&format!("/api/clients/{}", client_id)).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.post("/api/clients", json!({ "name": "  " })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = fixture
        .post("/api/services", json!({ "name": "Alignment", "priceCents": -100 }))
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post(
            "/api/payment-methods",
            json!({ "name": "Card", "feePercent": 120.0 }),
        )
        .await;
    assert_eq!(status, 400);
}

// ==================== QUOTES ====================

#[tokio::test]
async fn test_quote_pricing_and_lifecycle() {
    let fixture = TestFixture::new().await;
    let client_id = fixture.create_client("João Lima").await;

    let (_, service) = fixture
        .post(
            "/api/services",
            json!({ "name": "Brake pad replacement", "priceCents": 18_000, "durationMinutes": 90 }),
        )
        .await;
    let service_id = service["data"]["id"].as_str().unwrap();

    let (_, product) = fixture
        .post(
            "/api/products",
            json!({ "name": "Brake pad set", "priceCents": 12_500, "stock": 8 }),
        )
        .await;
    let product_id = product["data"]["id"].as_str().unwrap();

    let (_, method) = fixture
        .post(
            "/api/payment-methods",
            json!({ "name": "Credit card", "feePercent": 5.0, "maxInstallments": 6 }),
        )
        .await;
    let method_id = method["data"]["id"].as_str().unwrap();

    let (status, body) = fixture
        .post(
            "/api/quotes",
            json!({
                "clientId": client_id,
                "paymentMethodId": method_id,
                "discountCents": 500,
                "items": [
                    { "kind": "service", "referenceId": service_id, "quantity": 1 },
                    { "kind": "product", "referenceId": product_id, "quantity": 2 },
                    { "kind": "custom", "description": "Disposal fee", "quantity": 1, "unitPriceCents": 1_000 }
                ]
            }),
        )
        .await;

    assert_eq!(status, 200);
    let quote = &body["data"];
    assert_eq!(quote["status"], "draft");
    assert_eq!(quote["items"][0]["description"], "Brake pad replacement");
    assert_eq!(quote["items"][1]["unitPriceCents"], 12_500);
    assert_eq!(quote["totals"]["subtotalCents"], 44_000);
    assert_eq!(quote["totals"]["totalCents"], 43_500);
    assert_eq!(quote["totals"]["feeCents"], 2_175);
    assert_eq!(quote["totals"]["netCents"], 41_325);
    let quote_id = quote["id"].as_str().unwrap();

    let (status, body) = fixture
        .put(
            &format!("/api/quotes/{}", quote_id),
            json!({ "status": "sent" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "sent");

    let (status, _) = fixture
        .put(
            &format!("/api/quotes/{}", quote_id),
            json!({ "status": "approved" }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = fixture
        .put(
            &format!("/api/quotes/{}", quote_id),
            json!({ "status": "draft" }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // A client with quotes cannot be removed.
    let (status, body) = fixture.delete(&format!("/api/clients/{}", client_id)).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_quote_rejects_unknown_references() {
    let fixture = TestFixture::new().await;
    let client_id = fixture.create_client("Ana").await;

    let (status, _) = fixture
        .post(
            "/api/quotes",
            json!({
                "clientId": "missing-client",
                "items": [{ "kind": "custom", "description": "Wash", "quantity": 1, "unitPriceCents": 100 }]
            }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post(
            "/api/quotes",
            json!({
                "clientId": client_id,
                "items": [{ "kind": "service", "referenceId": "missing-service", "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post(
            "/api/quotes",
            json!({
                "clientId": client_id,
                "items": [{ "kind": "custom", "description": "Wash", "quantity": 0, "unitPriceCents": 100 }]
            }),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = fixture
        .post("/api/quotes", json!({ "clientId": client_id, "items": [] }))
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_quote_survives_payment_method_deletion() {
    let fixture = TestFixture::new().await;
    let client_id = fixture.create_client("Paula").await;

    let (_, method) = fixture
        .post(
            "/api/payment-methods",
            json!({ "name": "Debit card", "feePercent": 2.0 }),
        )
        .await;
    let method_id = method["data"]["id"].as_str().unwrap().to_string();

    let (_, body) = fixture
        .post(
            "/api/quotes",
            json!({
                "clientId": client_id,
                "paymentMethodId": method_id,
                "notes": "Customer waits on site",
                "items": [{ "kind": "custom", "description": "Oil change", "quantity": 1, "unitPriceCents": 20_000 }]
            }),
        )
        .await;
    let quote_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["totals"]["feeCents"], 400);

    let (status, _) = fixture
        .delete(&format!("/api/payment-methods/{}", method_id))
        .await;
    assert_eq!(status, 200);

    // Lifecycle moves keep the stored totals.
    let (status, body) = fixture
        .put(&format!("/api/quotes/{}", quote_id), json!({ "status": "sent" }))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "sent");
    assert_eq!(body["data"]["totals"]["feeCents"], 400);
    assert_eq!(body["data"]["totals"]["netCents"], 19_600);

    // Explicit null clears optional fields and re-prices without the fee.
    let (status, body) = fixture
        .put(
            &format!("/api/quotes/{}", quote_id),
            json!({ "paymentMethodId": null, "notes": null }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"].get("paymentMethodId").is_none());
    assert!(body["data"].get("notes").is_none());
    assert_eq!(body["data"]["totals"]["feeCents"], 0);
    assert_eq!(body["data"]["totals"]["netCents"], 20_000);
}

// ==================== COSTS & NOTIFICATIONS ====================

#[tokio::test]
async fn test_expense_instances_and_payments() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture
        .post(
            "/api/costs",
            json!({
                "description": "Workshop rent",
                "amountCents": 350_000,
                "recurrence": "monthly",
                "dueDay": 31,
                "startDate": "2026-01-01"
            }),
        )
        .await;
    assert_eq!(status, 200);
    let cost_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = fixture
        .get("/api/costs/instances?from=2026-02-01&to=2026-03-31")
        .await;
    assert_eq!(status, 200);
    let instances = body["data"].as_array().unwrap();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0]["dueDate"], "2026-02-28");
    assert_eq!(instances[0]["paid"], false);

    let instance_id = format!("{}:2026-02-28", cost_id);
    let (status, body) = fixture
        .post(&format!("/api/costs/instances/{}/pay", instance_id), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["paid"], true);
    let paid_at = body["data"]["paidAt"].clone();

    let before = fixture.revision().await;
    let (status, body) = fixture
        .post(&format!("/api/costs/instances/{}/pay", instance_id), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["paidAt"], paid_at);
    assert_eq!(fixture.revision().await, before);

    let (_, body) = fixture
        .get("/api/costs/instances?from=2026-02-01&to=2026-03-31")
        .await;
    assert_eq!(body["data"][0]["paid"], true);
    assert_eq!(body["data"][1]["paid"], false);

    // Not an occurrence of this cost.
    let (status, _) = fixture
        .post(
            &format!("/api/costs/instances/{}:2026-02-27/pay", cost_id),
            json!({}),
        )
        .await;
    assert_eq!(status, 404);

    let (status, body) = fixture
        .delete(&format!("/api/costs/instances/{}/pay", instance_id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["paid"], false);

    let (status, _) = fixture
        .get("/api/costs/instances?from=2026-04-01&to=2026-03-01")
        .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_notifications() {
    let fixture = TestFixture::new().await;
    let today = Utc::now().date_naive();

    let (status, _) = fixture
        .post(
            "/api/costs",
            json!({
                "description": "Electricity",
                "amountCents": 42_000,
                "recurrence": "monthly",
                "dueDay": today.day(),
                "startDate": today
            }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, _) = fixture
        .post(
            "/api/costs",
            json!({
                "description": "Lift maintenance",
                "amountCents": 80_000,
                "recurrence": "once",
                "dueDay": 1,
                "startDate": today - Duration::days(5)
            }),
        )
        .await;
    assert_eq!(status, 200);

    let (status, body) = fixture.get("/api/notifications?days=3").await;
    assert_eq!(status, 200);
    let notifications = body["data"].as_array().unwrap();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0]["kind"], "expenseOverdue");
    assert_eq!(notifications[1]["kind"], "expenseDueSoon");

    let (status, _) = fixture.get("/api/notifications?days=400").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_datastore_snapshot() {
    let fixture = TestFixture::new().await;
    fixture.create_client("Carlos").await;

    let (status, body) = fixture.get("/api/datastore").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["clients"].as_array().unwrap().len(), 1);
    assert!(body["data"]["quotes"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["revisionId"], body["revisionId"]);
}
