mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{admin, send, spawn_app, test_config};
use meetmind::db::{PaymentCreate, PaymentStatus};
use sqlx::SqlitePool;

fn polar_payment(
    email: &str,
    order_id: Option<&str>,
    subscription_id: Option<&str>,
) -> PaymentCreate {
    let mut create = PaymentCreate::manual("Customer".to_string(), email.to_string(), 1000);
    create.status = PaymentStatus::Succeeded;
    create.polar_order_id = order_id.map(str::to_string);
    create.subscription_id = subscription_id.map(str::to_string);
    create.synced_from_polar = true;
    create
}

#[tokio::test]
async fn cleanup_keeps_the_oldest_row_of_each_duplicate_group() {
    let t = spawn_app("cleanup", test_config()).await;

    let oldest_order = t
        .db
        .create_payment(polar_payment("first@x.io", Some("ord_1"), None))
        .await
        .expect("insert");
    for i in 0..2 {
        t.db.create_payment(polar_payment(&format!("dup{i}@x.io"), Some("ord_1"), None))
            .await
            .expect("insert");
    }

    let oldest_sub = t
        .db
        .create_payment(polar_payment("sub-first@x.io", None, Some("sub_1")))
        .await
        .expect("insert");
    t.db.create_payment(polar_payment("sub-dup@x.io", None, Some("sub_1")))
        .await
        .expect("insert");

    // Unique keys and rows without Polar ids are left alone.
    t.db.create_payment(polar_payment("solo@x.io", Some("ord_2"), None))
        .await
        .expect("insert");
    for _ in 0..2 {
        t.db.create_payment(polar_payment("manual@x.io", None, None))
            .await
            .expect("insert");
    }

    let resp = send(&t.app, admin("POST", "/api/payments/cleanup", None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["stats"]["deletedCount"], 3);
    assert_eq!(body["stats"]["subscriptionGroups"], 1);
    assert_eq!(body["stats"]["orderGroups"], 1);
    assert!(body["stats"]["timestamp"].as_str().is_some());

    let listed = send(&t.app, admin("GET", "/api/payments?limit=500", None))
        .await
        .json();
    assert_eq!(listed["total"], 5);
    let ids: Vec<&str> = listed["payments"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|p| p["id"].as_str())
        .collect();
    assert!(ids.contains(&oldest_order.id.as_str()));
    assert!(ids.contains(&oldest_sub.id.as_str()));

    let again = send(&t.app, admin("POST", "/api/payments/cleanup", None))
        .await
        .json();
    assert_eq!(again["stats"]["deletedCount"], 0);
}

#[tokio::test]
async fn cleanup_keeps_the_earliest_created_at_even_when_inserted_last() {
    let t = spawn_app("cleanup-backdated", test_config()).await;

    let inserted_first = t
        .db
        .create_payment(polar_payment("first@x.io", Some("ord_9"), None))
        .await
        .expect("insert");
    let inserted_last = t
        .db
        .create_payment(polar_payment("last@x.io", Some("ord_9"), None))
        .await
        .expect("insert");

    // The later rowid now carries the older timestamp.
    let pool = SqlitePool::connect(&t.database_url)
        .await
        .expect("open db");
    sqlx::query("UPDATE payments SET created_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::days(30))
        .bind(&inserted_last.id)
        .execute(&pool)
        .await
        .expect("backdate");

    let resp = send(&t.app, admin("POST", "/api/payments/cleanup", None)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["stats"]["deletedCount"], 1);

    let listed = send(&t.app, admin("GET", "/api/payments", None))
        .await
        .json();
    assert_eq!(listed["total"], 1);
    assert_eq!(listed["payments"][0]["id"], inserted_last.id.as_str());
    assert_eq!(listed["payments"][0]["customerEmail"], "last@x.io");
    assert_ne!(listed["payments"][0]["id"], inserted_first.id.as_str());
}
