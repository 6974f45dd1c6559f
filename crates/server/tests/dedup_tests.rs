//! Integration tests for the dedup-check (instant upload) endpoint.

mod common;

use axum::http::StatusCode;
use common::fixtures::{EMPTY_MD5, multipart_body};
use common::server::{TestServer, post_dedup, post_upload, reply_code};
use depot_metadata::{ContentRepo, CounterRepo, OwnershipRepo};
use serde_json::json;

/// Upload a file as `alice` so the content exists server-side.
async fn seed_alice_upload(server: &TestServer) {
    let body = multipart_body("alice", "a.txt", EMPTY_MD5, 0, b"");
    let (_, reply) = post_upload(&server.router, body).await;
    assert_eq!(reply_code(&reply), "008");
}

fn dedup_request(user: &str, token: &str, md5: &str, filename: &str) -> serde_json::Value {
    json!({
        "user": user,
        "token": token,
        "md5": md5,
        "filename": filename,
    })
}

#[tokio::test]
async fn unknown_hash_requires_full_upload() {
    let server = TestServer::new().await;
    server.sessions.insert("alice", "tok");

    let (status, reply) = post_dedup(
        &server.router,
        dedup_request("alice", "tok", EMPTY_MD5, "a.txt"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply_code(&reply), "007");
}

#[tokio::test]
async fn invalid_token_is_rejected_without_any_check() {
    let server = TestServer::new().await;
    seed_alice_upload(&server).await;
    server.sessions.insert("bob", "bob-token");

    let (status, reply) = post_dedup(
        &server.router,
        dedup_request("bob", "wrong-token", EMPTY_MD5, "a.txt"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply_code(&reply), "111");

    // Nothing was written for bob.
    assert!(
        !server
            .metadata()
            .ownership_exists("bob", EMPTY_MD5, "a.txt")
            .await
            .unwrap()
    );
    let content = server.metadata().get_content(EMPTY_MD5).await.unwrap().unwrap();
    assert_eq!(content.ref_count, 1);
}

#[tokio::test]
async fn second_owner_gets_instant_upload() {
    let server = TestServer::new().await;
    seed_alice_upload(&server).await;
    server.sessions.insert("bob", "tok");

    let (status, reply) = post_dedup(
        &server.router,
        dedup_request("bob", "tok", EMPTY_MD5, "a.txt"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply_code(&reply), "006");

    // Reference count grew, bob owns the file, and no second physical
    // transfer happened.
    let content = server.metadata().get_content(EMPTY_MD5).await.unwrap().unwrap();
    assert_eq!(content.ref_count, 2);
    assert!(
        server
            .metadata()
            .ownership_exists("bob", EMPTY_MD5, "a.txt")
            .await
            .unwrap()
    );
    assert_eq!(server.metadata().get_file_count("bob").await.unwrap(), Some(1));
    assert_eq!(server.gateway.push_count(), 1);
}

#[tokio::test]
async fn re_check_of_owned_file_is_idempotent() {
    let server = TestServer::new().await;
    seed_alice_upload(&server).await;
    server.sessions.insert("alice", "tok");

    let (status, reply) = post_dedup(
        &server.router,
        dedup_request("alice", "tok", EMPTY_MD5, "a.txt"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply_code(&reply), "005");

    // Zero additional writes.
    let content = server.metadata().get_content(EMPTY_MD5).await.unwrap().unwrap();
    assert_eq!(content.ref_count, 1);
    assert_eq!(server.metadata().get_file_count("alice").await.unwrap(), Some(1));
}

#[tokio::test]
async fn same_owner_new_filename_is_instant_upload() {
    let server = TestServer::new().await;
    seed_alice_upload(&server).await;
    server.sessions.insert("alice", "tok");

    let (_, reply) = post_dedup(
        &server.router,
        dedup_request("alice", "tok", EMPTY_MD5, "copy.txt"),
    )
    .await;

    assert_eq!(reply_code(&reply), "006");

    let content = server.metadata().get_content(EMPTY_MD5).await.unwrap().unwrap();
    assert_eq!(content.ref_count, 2);
    assert_eq!(server.metadata().get_file_count("alice").await.unwrap(), Some(2));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let server = TestServer::new().await;

    use axum::body::Body;
    use tower::ServiceExt;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/dedup")
        .header("Content-Type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = server.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply_code(&body), "007");
}

#[tokio::test]
async fn invalid_hash_is_a_bad_request() {
    let server = TestServer::new().await;
    server.sessions.insert("alice", "tok");

    let (status, reply) = post_dedup(
        &server.router,
        dedup_request("alice", "tok", "not-a-hash", "a.txt"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(reply_code(&reply), "007");
}
