mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, Utc};
use common::{send, spawn_app, test_config};
use meetmind::db::{SessionCreate, UserCreate};
use serde_json::{Value, json};

const TOKEN: &str = "session-token-abc";

async fn login(
    db: &meetmind::db::DbActorHandle,
    email: &str,
    token: &str,
    ttl: Duration,
) -> String {
    let user = db
        .create_user(UserCreate {
            name: "Ann Lee".to_string(),
            email: email.to_string(),
            image: None,
        })
        .await
        .expect("create user");
    db.create_session(SessionCreate {
        user_id: user.id.clone(),
        token: token.to_string(),
        expires_at: Utc::now() + ttl,
        ip_address: None,
        user_agent: Some("tests".to_string()),
    })
    .await
    .expect("create session");
    user.id
}

fn with_cookie(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "cookie",
            format!("better-auth.session_token={token}.c2lnbmF0dXJl"),
        );
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("failed to build request"),
        None => builder
            .body(Body::empty())
            .expect("failed to build request"),
    }
}

#[tokio::test]
async fn session_routes_reject_anonymous_and_expired_callers() {
    let t = spawn_app("session-401", test_config()).await;
    login(
        &t.db,
        "old@example.com",
        "expired-token",
        Duration::hours(-1),
    )
    .await;

    for uri in ["/api/meetings/report", "/api/agents", "/api/meetings"] {
        let anonymous = send(
            &t.app,
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await;
        assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(anonymous.json(), json!({ "error": "Unauthorized" }));

        let expired = send(&t.app, with_cookie("GET", uri, "expired-token", None)).await;
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn agents_and_meetings_are_scoped_to_the_caller() {
    let t = spawn_app("session-agents", test_config()).await;
    login(&t.db, "ann@example.com", TOKEN, Duration::days(1)).await;
    login(&t.db, "eve@example.com", "other-token", Duration::days(1)).await;

    let bad = send(
        &t.app,
        with_cookie(
            "POST",
            "/api/agents",
            TOKEN,
            Some(json!({ "name": "bad-name!", "instructions": "x" })),
        ),
    )
    .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);

    let agent = send(
        &t.app,
        with_cookie(
            "POST",
            "/api/agents",
            TOKEN,
            Some(json!({ "name": "Sales Coach", "instructions": "Be brief." })),
        ),
    )
    .await;
    assert_eq!(agent.status, StatusCode::OK);
    let agent_id = agent.json()["id"].as_str().expect("id").to_string();

    let meeting = send(
        &t.app,
        with_cookie(
            "POST",
            "/api/meetings",
            TOKEN,
            Some(json!({ "name": "Kickoff", "agentId": agent_id })),
        ),
    )
    .await;
    assert_eq!(meeting.status, StatusCode::OK);
    assert_eq!(meeting.json()["status"], "upcoming");

    // Another user cannot schedule with Ann's agent.
    let foreign = send(
        &t.app,
        with_cookie(
            "POST",
            "/api/meetings",
            "other-token",
            Some(json!({ "name": "Sneaky", "agentId": agent_id })),
        ),
    )
    .await;
    assert_eq!(foreign.status, StatusCode::NOT_FOUND);

    let agents = send(&t.app, with_cookie("GET", "/api/agents", TOKEN, None))
        .await
        .json();
    assert_eq!(agents[0]["meetingCount"], 1);

    let meetings = send(
        &t.app,
        Request::builder()
            .uri("/api/meetings")
            .header("authorization", format!("Bearer {TOKEN}"))
            .body(Body::empty())
            .expect("failed to build request"),
    )
    .await;
    assert_eq!(meetings.status, StatusCode::OK);
    let meetings = meetings.json();
    assert_eq!(meetings.as_array().map(Vec::len), Some(1));
    assert_eq!(meetings[0]["agentName"], "Sales Coach");

    let others = send(
        &t.app,
        with_cookie("GET", "/api/meetings", "other-token", None),
    )
    .await
    .json();
    assert_eq!(others.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn meetings_report_is_a_pdf_attachment() {
    let t = spawn_app("session-report", test_config()).await;
    login(&t.db, "ann@example.com", TOKEN, Duration::days(1)).await;

    let agent = send(
        &t.app,
        with_cookie(
            "POST",
            "/api/agents",
            TOKEN,
            Some(json!({ "name": "Coach", "instructions": "Listen." })),
        ),
    )
    .await
    .json();
    for name in ["Standup", "Retro"] {
        send(
            &t.app,
            with_cookie(
                "POST",
                "/api/meetings",
                TOKEN,
                Some(json!({ "name": name, "agentId": agent["id"] })),
            ),
        )
        .await;
    }

    let report = send(
        &t.app,
        with_cookie("GET", "/api/meetings/report", TOKEN, None),
    )
    .await;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.header("content-type"), "application/pdf");
    assert!(
        report
            .header("content-disposition")
            .starts_with("attachment; filename=\"MeetMind-Meetings-Report-")
    );
    assert_eq!(
        report.header("content-length"),
        report.body.len().to_string()
    );
    assert!(report.body.starts_with(b"%PDF"));
}
