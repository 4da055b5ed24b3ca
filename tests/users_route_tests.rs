mod common;

use axum::http::StatusCode;
use common::{admin, send, spawn_app, test_config};
use serde_json::json;

#[tokio::test]
async fn user_crud_and_stats() {
    let t = spawn_app("users-crud", test_config()).await;

    let created = send(
        &t.app,
        admin(
            "POST",
            "/api/admin/users",
            Some(json!({ "name": "Ann Lee", "email": "Ann@Example.com" })),
        ),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    let created = created.json();
    assert_eq!(created["email"], "Ann@Example.com");
    assert_eq!(created["emailVerified"], false);
    let id = created["id"].as_str().expect("id").to_string();

    send(
        &t.app,
        admin(
            "POST",
            "/api/admin/users",
            Some(json!({ "name": "Bob Ray", "email": "bob@example.com" })),
        ),
    )
    .await;

    let verified = send(
        &t.app,
        admin(
            "PATCH",
            &format!("/api/admin/users/{id}"),
            Some(json!({ "emailVerified": true, "name": "Ann L." })),
        ),
    )
    .await;
    assert_eq!(verified.status, StatusCode::OK);
    let verified = verified.json();
    assert_eq!(verified["emailVerified"], true);
    assert_eq!(verified["name"], "Ann L.");
    assert_eq!(verified["email"], "Ann@Example.com");

    let stats = send(&t.app, admin("GET", "/api/admin/users/stats", None))
        .await
        .json();
    assert_eq!(stats, json!({ "total": 2, "verified": 1, "unverified": 1 }));

    let search = send(&t.app, admin("GET", "/api/admin/users?search=bob", None))
        .await
        .json();
    assert_eq!(search.as_array().map(Vec::len), Some(1));
    assert_eq!(search[0]["name"], "Bob Ray");

    let fetched = send(
        &t.app,
        admin("GET", &format!("/api/admin/users/{id}"), None),
    )
    .await;
    assert_eq!(fetched.status, StatusCode::OK);

    let deleted = send(
        &t.app,
        admin("DELETE", &format!("/api/admin/users/{id}"), None),
    )
    .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["success"], true);

    let gone = send(
        &t.app,
        admin("GET", &format!("/api/admin/users/{id}"), None),
    )
    .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json()["error"], "User not found");

    let gone = send(
        &t.app,
        admin(
            "PATCH",
            &format!("/api/admin/users/{id}"),
            Some(json!({ "name": "Ghost" })),
        ),
    )
    .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let t = spawn_app("users-conflict", test_config()).await;

    let body = json!({ "name": "Ann", "email": "ann@example.com" });
    let first = send(
        &t.app,
        admin("POST", "/api/admin/users", Some(body.clone())),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);

    let second = send(&t.app, admin("POST", "/api/admin/users", Some(body))).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.json()["error"], "Email already exists");

    let other = send(
        &t.app,
        admin(
            "POST",
            "/api/admin/users",
            Some(json!({ "name": "Bob", "email": "bob@example.com" })),
        ),
    )
    .await
    .json();
    let id = other["id"].as_str().expect("id");
    let clash = send(
        &t.app,
        admin(
            "PATCH",
            &format!("/api/admin/users/{id}"),
            Some(json!({ "email": "ann@example.com" })),
        ),
    )
    .await;
    assert_eq!(clash.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_create_validates_fields() {
    let t = spawn_app("users-invalid", test_config()).await;

    for body in [
        json!({ "email": "ann@example.com" }),
        json!({ "name": "  ", "email": "ann@example.com" }),
        json!({ "name": "Ann", "email": "not-an-email" }),
    ] {
        let resp = send(
            &t.app,
            admin("POST", "/api/admin/users", Some(body.clone())),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn search_treats_like_wildcards_literally() {
    let t = spawn_app("users-wildcards", test_config()).await;

    for (name, email) in [
        ("Ann Lee", "ann@example.com"),
        ("Promo 100% Club", "promo@example.com"),
        ("snake_case", "snake@example.com"),
    ] {
        send(
            &t.app,
            admin(
                "POST",
                "/api/admin/users",
                Some(json!({ "name": name, "email": email })),
            ),
        )
        .await;
    }

    let percent = send(&t.app, admin("GET", "/api/admin/users?search=%25", None))
        .await
        .json();
    assert_eq!(percent.as_array().map(Vec::len), Some(1));
    assert_eq!(percent[0]["name"], "Promo 100% Club");

    let underscore = send(&t.app, admin("GET", "/api/admin/users?search=_", None))
        .await
        .json();
    assert_eq!(underscore.as_array().map(Vec::len), Some(1));
    assert_eq!(underscore[0]["name"], "snake_case");
}
