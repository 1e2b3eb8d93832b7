//! HTTP surface tests over the in-memory store: envelope shapes, status
//! codes, and auth gating, driven through the real router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ballot_rpc::router;
use ballot_store::session::{SessionRecord, SessionStore};
use ballot_store::voter::{VoterRecord, VoterStore};
use ballot_store::MemoryStore;
use ballot_types::{TimestampMs, VoterId, VoterRole};

const ADMIN_TOKEN: &str = "admin-token";
const VOTER_TOKEN: &str = "voter-token";
const FAR_FUTURE: u64 = u64::MAX / 2;

fn seed_identity(store: &MemoryStore, id: u64, role: VoterRole, verified: bool, token: &str) {
    store
        .put_voter(&VoterRecord {
            id: VoterId::new(id),
            email: format!("user{id}@example.org"),
            full_name: format!("User {id}"),
            national_id: format!("{id:016}"),
            date_of_birth: "1990-01-01".to_string(),
            address: "1 Main St".to_string(),
            phone: "0800000000".to_string(),
            role,
            is_verified: verified,
            has_voted: false,
            registered_at: TimestampMs::EPOCH,
            last_login: None,
        })
        .unwrap();
    store
        .put_session(&SessionRecord {
            token: token.to_string(),
            voter_id: VoterId::new(id),
            expires_at: TimestampMs::new(FAR_FUTURE),
        })
        .unwrap();
}

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    seed_identity(&store, 1, VoterRole::Admin, true, ADMIN_TOKEN);
    seed_identity(&store, 2, VoterRole::Voter, true, VOTER_TOKEN);
    let router = router(Arc::clone(&store));
    (store, router)
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Stand up an active election with one candidate; returns
/// (election_id, candidate_id).
async fn seed_election(router: &Router) -> (u64, u64) {
    let now = TimestampMs::now().as_millis();
    let (status, body) = send(
        router,
        "POST",
        "/api/admin/elections",
        Some(ADMIN_TOKEN),
        Some(json!({
            "title": "General Election",
            "description": "nationwide",
            "start_date": now - 1_000,
            "end_date": now + 3_600_000,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let election_id = body["data"]["id"].as_u64().unwrap();

    let (status, _) = send(
        router,
        "PUT",
        &format!("/api/admin/elections/{election_id}/status"),
        Some(ADMIN_TOKEN),
        Some(json!({"status": "active"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        router,
        "POST",
        "/api/admin/candidates",
        Some(ADMIN_TOKEN),
        Some(json!({
            "election_id": election_id,
            "name": "Alice",
            "party": "Party A",
            "candidate_number": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let candidate_id = body["data"]["id"].as_u64().unwrap();

    (election_id, candidate_id)
}

#[tokio::test]
async fn registration_returns_created_envelope() {
    let (_store, router) = app();
    let (status, body) = send(
        &router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "email": "new@example.org",
            "full_name": "New Voter",
            "national_id": "9999888877776666",
            "date_of_birth": "1995-05-05",
            "address": "2 Side St",
            "phone": "0811111111",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["is_verified"], json!(false));
    assert_eq!(body["data"]["role"], json!("voter"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (_store, router) = app();
    let payload = json!({
        "email": "dup@example.org",
        "full_name": "Dup",
        "national_id": "1234123412341234",
        "date_of_birth": "1995-05-05",
        "address": "2 Side St",
        "phone": "0811111111",
    });
    let (status, _) = send(&router, "POST", "/api/auth/register", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&router, "POST", "/api/auth/register", None, Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("conflict"));
}

#[tokio::test]
async fn cast_verify_and_double_vote_flow() {
    let (_store, router) = app();
    let (election_id, candidate_id) = seed_election(&router).await;

    let (status, body) = send(
        &router,
        "POST",
        "/api/votes",
        Some(VOTER_TOKEN),
        Some(json!({"election_id": election_id, "candidate_id": candidate_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let vote_hash = body["data"]["vote_hash"].as_str().unwrap().to_string();
    assert_eq!(vote_hash.len(), 64);

    // Anyone may verify by hash, no token required; the body never
    // names the voter.
    let (status, body) = send(
        &router,
        "GET",
        &format!("/api/votes/verify/{vote_hash}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["candidate_name"], json!("Alice"));
    let fields: Vec<&String> = body["data"].as_object().unwrap().keys().collect();
    assert!(fields.iter().all(|k| !k.contains("voter")));

    // Second cast is rejected as a conflict.
    let (status, body) = send(
        &router,
        "POST",
        "/api/votes",
        Some(VOTER_TOKEN),
        Some(json!({"election_id": election_id, "candidate_id": candidate_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("already_voted"));

    let (status, body) = send(
        &router,
        "GET",
        &format!("/api/votes/status/{election_id}"),
        Some(VOTER_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["has_voted"], json!(true));
    assert_eq!(body["data"]["vote_hash"], json!(vote_hash));

    let (status, body) = send(&router, "GET", "/api/votes/history", Some(VOTER_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &router,
        "GET",
        &format!("/api/admin/elections/{election_id}/results"),
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"][0]["vote_count"], json!(1));
    assert_eq!(body["data"]["results"][0]["percentage"], json!("100.00"));
}

#[tokio::test]
async fn casting_requires_authentication_and_verification() {
    let (store, router) = app();
    let (election_id, candidate_id) = seed_election(&router).await;
    let payload = json!({"election_id": election_id, "candidate_id": candidate_id});

    let (status, _) = send(&router, "POST", "/api/votes", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    seed_identity(&store, 3, VoterRole::Voter, false, "unverified-token");
    let (status, body) = send(
        &router,
        "POST",
        "/api/votes",
        Some("unverified-token"),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("forbidden"));
}

#[tokio::test]
async fn admin_routes_reject_plain_voters() {
    let (_store, router) = app();
    let (status, _) = send(&router, "GET", "/api/admin/dashboard", Some(VOTER_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&router, "GET", "/api/admin/dashboard", Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_receipt_hash_is_bad_request() {
    let (_store, router) = app();
    let (status, body) = send(&router, "GET", "/api/votes/verify/not-a-hash", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("invalid_request"));
}

#[tokio::test]
async fn unknown_election_detail_is_not_found() {
    let (_store, router) = app();
    let (status, _) = send(&router, "GET", "/api/elections/999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_user_listing_paginates_and_filters() {
    let (store, router) = app();
    for i in 10..25 {
        seed_identity(&store, i, VoterRole::Voter, i % 2 == 0, &format!("tok-{i}"));
    }
    let (status, body) = send(
        &router,
        "GET",
        "/api/admin/users?page=1&page_size=5",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["voters"].as_array().unwrap().len(), 5);
    // 15 seeded here + the one verified voter from app(); the admin
    // account never appears.
    assert_eq!(body["data"]["total"], json!(16));
    assert_eq!(body["data"]["total_pages"], json!(4));

    let (status, body) = send(
        &router,
        "GET",
        "/api/admin/users?search=user12",
        Some(ADMIN_TOKEN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(1));
}
