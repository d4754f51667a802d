//! Message persistence integration tests
//!
//! Exercises append and history-window queries against a real Postgres
//! instance. Ignored by default; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use common::TestDatabase;
use courier::chat::db as chats;
use courier::messaging::db as messages;
use serial_test::serial;

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn append_assigns_storage_timestamps() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let chat_id = chats::resolve_direct(db.pool(), alice, bob).await.unwrap();

    let stored = messages::append(db.pool(), chat_id, alice, "hello").await.unwrap();

    assert_eq!(stored.chat_id, chat_id);
    assert_eq!(stored.sender_id, alice);
    assert_eq!(stored.text, "hello");
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn recent_returns_oldest_first_with_sender_names() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let chat_id = chats::resolve_direct(db.pool(), alice, bob).await.unwrap();

    messages::append(db.pool(), chat_id, alice, "one").await.unwrap();
    messages::append(db.pool(), chat_id, bob, "two").await.unwrap();
    messages::append(db.pool(), chat_id, alice, "three").await.unwrap();

    let history = messages::recent(db.pool(), chat_id, 50).await.unwrap();

    let texts: Vec<_> = history.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    let senders: Vec<_> = history.iter().map(|h| h.from.as_str()).collect();
    assert_eq!(senders, vec!["alice", "bob", "alice"]);
    assert!(history.windows(2).all(|w| w[0].ts <= w[1].ts));
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn recent_keeps_the_newest_window_when_over_the_limit() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let chat_id = chats::resolve_direct(db.pool(), alice, bob).await.unwrap();

    for i in 0..60 {
        messages::append(db.pool(), chat_id, alice, &format!("msg-{i}"))
            .await
            .unwrap();
    }

    let history = messages::recent(db.pool(), chat_id, 50).await.unwrap();

    assert_eq!(history.len(), 50);
    // The oldest ten messages fall out of the window; the newest survive.
    assert_eq!(history.first().unwrap().text, "msg-10");
    assert_eq!(history.last().unwrap().text, "msg-59");
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn recent_is_empty_for_a_chat_with_no_messages() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;
    let chat_id = chats::resolve_direct(db.pool(), alice, bob).await.unwrap();

    let history = messages::recent(db.pool(), chat_id, 50).await.unwrap();
    assert!(history.is_empty());
}
