#![cfg(all(feature = "sqlite", feature = "migration"))]

use openid4vp_storage::migration::{Migrator, MigratorTrait};
use openid4vp_storage::{
    storage::Error, ExpiredDeletion, ExpiryPolicy, SeaOrmStore, SessionStatus, Storage,
};
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};

// One pooled connection: every test gets its own private in-memory database
// and the store's transactions serialize against it.
async fn store() -> SeaOrmStore {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let conn = Database::connect(options).await.expect("connect");
    Migrator::up(&conn, None).await.expect("migrate");
    SeaOrmStore::new(conn)
}

fn dpop_proof() -> Value {
    json!({"typ": "dpop+jwt", "htm": "POST", "jti": "a87cd7f1"})
}

fn attestation() -> Value {
    json!({"format": "wallet-attestation", "iss": "https://wallet-provider.example.org"})
}

fn statements(tag: &str) -> Vec<String> {
    vec![format!("{tag}-leaf-statement"), format!("{tag}-anchor-statement")]
}

#[tokio::test]
async fn session_round_trips_through_the_database() {
    let store = store().await;

    let created = store
        .init_session("doc-1", dpop_proof(), attestation())
        .await
        .expect("init_session");

    let found = store
        .find_session("doc-1")
        .await
        .expect("find_session")
        .expect("session should exist");
    assert_eq!(found, created);
    assert_eq!(found.status(), SessionStatus::Created);
}

#[tokio::test]
async fn duplicate_session_ids_are_rejected() {
    let store = store().await;

    store
        .init_session("doc-1", dpop_proof(), attestation())
        .await
        .unwrap();
    let err = store
        .init_session("doc-1", json!({"typ": "other"}), json!({}))
        .await
        .expect_err("second init_session should fail");
    assert!(matches!(err, Error::DuplicateSession(ref id) if id == "doc-1"));

    let found = store.find_session("doc-1").await.unwrap().unwrap();
    assert_eq!(found.dpop_proof, dpop_proof());
}

#[tokio::test]
async fn request_then_response_completes_the_flow() {
    let store = store().await;
    store
        .init_session("doc-1", dpop_proof(), attestation())
        .await
        .unwrap();

    let request_object = json!({"aud": "https://wallet.example", "response_type": "vp_token"});
    store
        .update_request_object("doc-1", "nonce-1", Some("state-1"), request_object.clone())
        .await
        .expect("update_request_object");

    let response_object = json!({"vp_token": "eyJhb..."});
    let completed = store
        .update_response_object("nonce-1", Some("state-1"), response_object.clone())
        .await
        .expect("update_response_object");
    assert_eq!(completed.id, "doc-1");
    assert_eq!(completed.status(), SessionStatus::ResponseReceived);
    assert_eq!(completed.request_object, Some(request_object));
    assert_eq!(completed.response_object, Some(response_object));
}

#[tokio::test]
async fn response_correlation_without_state_matches_stateless_sessions_only() {
    let store = store().await;
    store
        .init_session("doc-1", dpop_proof(), attestation())
        .await
        .unwrap();
    store
        .update_request_object("doc-1", "nonce-1", Some("state-1"), json!({}))
        .await
        .unwrap();

    // The stored session carries a state, so a stateless response must not
    // correlate with it.
    let err = store
        .update_response_object("nonce-1", None, json!({}))
        .await
        .expect_err("state mismatch should not correlate");
    assert!(matches!(err, Error::SessionNotFound));
}

#[tokio::test]
async fn response_before_request_object_is_rejected() {
    let store = store().await;
    let session = store
        .init_session("doc-1", dpop_proof(), attestation())
        .await
        .unwrap();

    let err = store
        .update_response_object(&session.nonce, None, json!({}))
        .await
        .expect_err("response must not precede the request object");
    assert!(matches!(err, Error::InvalidTransition));
}

#[tokio::test]
async fn expired_chains_are_invisible_on_the_hot_path() {
    let store = store().await;
    let entity = "https://idp.example";

    store
        .add_chain(entity, statements("old"), OffsetDateTime::now_utc() - Duration::seconds(1))
        .await
        .unwrap();

    assert!(store.find_chain(entity).await.unwrap().is_none());
    assert!(store.has_chain(entity).await.unwrap());
    assert!(store.peek_chain(entity).await.unwrap().is_some());
}

#[tokio::test]
async fn update_chain_replaces_and_add_chain_is_idempotent() {
    let store = store().await;
    let entity = "https://idp.example";
    let exp = OffsetDateTime::now_utc() + Duration::hours(1);

    store.add_chain(entity, statements("v1"), exp).await.unwrap();
    store.add_chain(entity, statements("v1"), exp).await.unwrap();
    let first = store.find_chain(entity).await.unwrap().unwrap();
    assert_eq!(first.chain, statements("v1"));

    store.update_chain(entity, statements("v2"), exp).await.unwrap();
    let second = store.find_chain(entity).await.unwrap().unwrap();
    assert_eq!(second.chain, statements("v2"));
}

#[tokio::test]
async fn delete_expired_reclaims_old_sessions_and_stale_chains() {
    let store = store().await.with_expiry_policy(ExpiryPolicy {
        session_max_age: Duration::ZERO,
        chain_retention: Duration::ZERO,
    });

    store
        .init_session("doc-1", dpop_proof(), attestation())
        .await
        .unwrap();
    store
        .add_chain(
            "https://stale.example",
            statements("stale"),
            OffsetDateTime::now_utc() - Duration::seconds(1),
        )
        .await
        .unwrap();
    store
        .add_chain(
            "https://fresh.example",
            statements("fresh"),
            OffsetDateTime::now_utc() + Duration::hours(1),
        )
        .await
        .unwrap();

    store.delete_expired().await.expect("delete_expired");

    assert!(store.find_session("doc-1").await.unwrap().is_none());
    assert!(!store.has_chain("https://stale.example").await.unwrap());
    assert!(store.has_chain("https://fresh.example").await.unwrap());
}
