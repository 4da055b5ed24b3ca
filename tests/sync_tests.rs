mod common;

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::get,
};
use common::{admin, send, spawn_app, test_config};
use serde_json::{Value, json};
use std::collections::HashMap;
use tokio::net::TcpListener;

const TOKEN: &str = "polar_oat_test";

async fn orders_page(
    headers: HeaderMap,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"));
    if !authorized {
        let body = json!({ "detail": "bad token" });
        return (StatusCode::UNAUTHORIZED, Json(body));
    }

    let items = match q.get("page").map(String::as_str) {
        Some("1") => json!([
            {
                "id": "ord_a",
                "status": "paid",
                "total_amount": 4999,
                "currency": "usd",
                "customer": { "id": "cus_1", "name": "Ada", "email": "ada@example.com" },
                "product": { "id": "prod_1", "name": "Pro" }
            },
            {
                "id": "ord_b",
                "status": "refunded",
                "amount": 1500,
                "customer": { "name": "", "email": "" },
                "user": { "email": "bo@example.com" }
            }
        ]),
        Some("2") => json!([
            { "id": "ord_c", "status": "mystery" },
            { "status": "paid" }
        ]),
        _ => json!([]),
    };
    (
        StatusCode::OK,
        Json(json!({
            "items": items,
            "pagination": { "total_count": 4, "max_page": 2 }
        })),
    )
}

async fn organizations() -> Json<Value> {
    Json(json!({ "items": [{ "id": "org_1", "name": "MeetMind" }] }))
}

/// Serves a two-page `/v1/orders` on an ephemeral port and returns its base URL.
async fn fake_polar() -> String {
    let app = Router::new()
        .route("/v1/orders", get(orders_page))
        .route("/v1/organizations", get(organizations));
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake polar");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });
    format!("http://{addr}")
}

async fn polar_config() -> meetmind::config::Config {
    let mut cfg = test_config();
    cfg.polar.api_base = fake_polar().await.parse().expect("api base url");
    cfg.polar.access_token = Some(TOKEN.to_string());
    cfg.polar.page_limit = 2;
    cfg.polar.max_pages = 5;
    cfg
}

#[tokio::test]
async fn sync_without_token_fails_cleanly() {
    let t = spawn_app("sync-notoken", test_config()).await;

    let resp = send(&t.app, admin("POST", "/api/payments/sync", None)).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = resp.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Orders sync failed");
    assert!(body["timestamp"].as_str().is_some());

    let debug = send(&t.app, admin("GET", "/api/payments/debug", None)).await;
    assert_eq!(debug.status, StatusCode::BAD_REQUEST);
    assert_eq!(debug.json()["error"], "No Polar token configured");
}

#[tokio::test]
async fn sync_creates_then_updates_payments() {
    let t = spawn_app("sync-pages", polar_config().await).await;

    let first = send(&t.app, admin("POST", "/api/payments/sync", None)).await;
    assert_eq!(first.status, StatusCode::OK);
    let first = first.json();
    assert_eq!(first["success"], true);
    assert_eq!(first["stats"]["newPayments"], 3);
    assert_eq!(first["stats"]["updatedPayments"], 0);
    // The order without an id is skipped, not fatal.
    assert_eq!(first["stats"]["skippedDuplicates"], 1);
    assert_eq!(first["debug"]["methods"].as_array().map(Vec::len), Some(2));

    let all = send(&t.app, admin("GET", "/api/payments", None))
        .await
        .json();
    assert_eq!(all["total"], 3);
    let by_order = |id: &str| -> Value {
        all["payments"]
            .as_array()
            .expect("array")
            .iter()
            .find(|p| p["polarOrderId"] == id)
            .cloned()
            .unwrap_or_else(|| panic!("payment for {id}"))
    };

    let ada = by_order("ord_a");
    assert_eq!(ada["status"], "succeeded");
    assert_eq!(ada["amount"], 4999);
    assert_eq!(ada["currency"], "USD");
    assert_eq!(ada["customerName"], "Ada");
    assert_eq!(ada["productName"], "Pro");
    assert_eq!(ada["syncedFromPolar"], true);

    let bo = by_order("ord_b");
    assert_eq!(bo["status"], "refunded");
    assert_eq!(bo["customerName"], "bo@example.com");
    assert_eq!(bo["customerEmail"], "bo@example.com");

    let unknown = by_order("ord_c");
    assert_eq!(unknown["status"], "pending");
    assert_eq!(unknown["amount"], 0);
    assert_eq!(unknown["customerName"], "Unknown Customer");
    assert_eq!(unknown["customerEmail"], "unknown@example.com");
    assert_eq!(unknown["productName"], "Unknown Product");

    let second = send(&t.app, admin("POST", "/api/payments/sync", None))
        .await
        .json();
    assert_eq!(second["stats"]["newPayments"], 0);
    assert_eq!(second["stats"]["updatedPayments"], 3);
    assert_eq!(
        second["message"],
        "Orders sync completed: 0 new, 3 updated, 1 skipped"
    );

    let all = send(&t.app, admin("GET", "/api/payments", None))
        .await
        .json();
    assert_eq!(all["total"], 3);
}

#[tokio::test]
async fn debug_endpoint_reports_what_the_token_sees() {
    let t = spawn_app("sync-debug", polar_config().await).await;

    let resp = send(&t.app, admin("GET", "/api/payments/debug", None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"]["items"][0]["id"], "org_1");
}
