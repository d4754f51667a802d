//! Authentication integration tests
//!
//! Exercises user creation, session tokens, and directory search against a
//! real Postgres instance. Ignored by default; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use common::TestDatabase;
use courier::auth::sessions::{authenticate, create_session, prune_expired};
use courier::auth::users::{create_user, get_user_id, search_users, username_exists};
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn created_users_are_found_by_username() {
    let db = TestDatabase::new().await;

    let user = create_user(db.pool(), "alice", "Alice A", "hash").await.unwrap();

    assert!(username_exists(db.pool(), "alice").await.unwrap());
    assert!(!username_exists(db.pool(), "bob").await.unwrap());
    assert_eq!(get_user_id(db.pool(), "alice").await.unwrap(), Some(user.id));
    assert_eq!(get_user_id(db.pool(), "bob").await.unwrap(), None);
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn duplicate_usernames_are_rejected_by_the_constraint() {
    let db = TestDatabase::new().await;

    create_user(db.pool(), "alice", "Alice", "hash").await.unwrap();
    let result = create_user(db.pool(), "alice", "Other Alice", "hash").await;
    assert!(result.is_err());
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn session_tokens_authenticate_until_pruned() {
    let db = TestDatabase::new().await;
    let user = create_user(db.pool(), "alice", "Alice", "hash").await.unwrap();

    let token = create_session(db.pool(), user.id).await.unwrap();

    let authed = authenticate(db.pool(), &token).await.unwrap().unwrap();
    assert_eq!(authed.id, user.id);
    assert_eq!(authed.username, "alice");

    assert!(authenticate(db.pool(), "not-a-token").await.unwrap().is_none());

    // Force the session past its expiry, then prune.
    sqlx::query("UPDATE sessions SET expires_at = NOW() - INTERVAL '1 day'")
        .execute(db.pool())
        .await
        .unwrap();
    assert!(authenticate(db.pool(), &token).await.unwrap().is_none());

    let pruned = prune_expired(db.pool()).await.unwrap();
    assert_eq!(pruned, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn search_matches_either_name_and_excludes_the_requester() {
    let db = TestDatabase::new().await;
    create_user(db.pool(), "alice", "Alice Anderson", "hash").await.unwrap();
    create_user(db.pool(), "bob", "Bob Anderson", "hash").await.unwrap();
    create_user(db.pool(), "carol", "Carol C", "hash").await.unwrap();

    let results = search_users(db.pool(), "alice", "anderson", 20).await.unwrap();
    let names: Vec<_> = results.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["bob"], "requester must be excluded");

    let results = search_users(db.pool(), "alice", "caro", 20).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].display_name, "Carol C");
}
