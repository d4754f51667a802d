//! Dispatcher integration tests
//!
//! Runs the real dispatcher task against a Postgres-backed store with
//! in-process presence entries standing in for live connections. Ignored
//! by default; run with `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestDatabase;
use courier::chat::db as chats;
use courier::realtime::dispatcher;
use courier::realtime::{Address, InboundMessage, Packet, PresenceEntry, PresenceRegistry};
use serial_test::serial;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

/// Stand-in for a live connection: registers presence and hands back the
/// receiving end a writer task would normally drain.
async fn connect(
    presence: &PresenceRegistry,
    user_id: i64,
) -> mpsc::UnboundedReceiver<Packet> {
    let (tx, rx) = mpsc::unbounded_channel();
    let replaced = presence
        .register(
            user_id,
            PresenceEntry {
                conn_id: Uuid::new_v4(),
                tx,
            },
        )
        .await;
    drop(replaced);
    rx
}

/// Spawn the dispatcher and return the queue producer.
fn start_dispatcher(
    pool: PgPool,
    presence: Arc<PresenceRegistry>,
) -> mpsc::Sender<InboundMessage> {
    let (tx, rx) = mpsc::channel(dispatcher::QUEUE_CAPACITY);
    tokio::spawn(dispatcher::run(pool, presence, rx));
    tx
}

async fn next_packet(rx: &mut mpsc::UnboundedReceiver<Packet>) -> Packet {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a packet")
        .expect("presence channel closed")
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn peer_message_delivers_msg_then_chats_to_both_parties() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;

    let presence = Arc::new(PresenceRegistry::new());
    let mut alice_rx = connect(&presence, alice).await;
    let mut bob_rx = connect(&presence, bob).await;
    let inbound_tx = start_dispatcher(db.pool().clone(), Arc::clone(&presence));

    inbound_tx
        .send(InboundMessage {
            sender_id: alice,
            sender_name: "alice".to_string(),
            address: Address::Peer {
                to: "bob".to_string(),
            },
            text: "hello bob".to_string(),
            ts: 1_700_000_000_000,
        })
        .await
        .unwrap();

    // Each present party gets the message first, then a refreshed chat list.
    for rx in [&mut bob_rx, &mut alice_rx] {
        let msg = next_packet(rx).await;
        let Packet::Msg(msg) = msg else {
            panic!("expected msg packet first, got {msg:?}");
        };
        assert_eq!(msg.text, "hello bob");
        assert_eq!(msg.from.as_deref(), Some("alice"));
        assert_eq!(msg.ts, Some(1_700_000_000_000));

        let chats = next_packet(rx).await;
        let Packet::Chats { chats } = chats else {
            panic!("expected chats packet second, got {chats:?}");
        };
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].last_msg, "hello bob");
    }

    // The lazily resolved direct chat is persisted with the message.
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn offline_recipients_still_get_the_message_persisted() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;

    let presence = Arc::new(PresenceRegistry::new());
    let mut alice_rx = connect(&presence, alice).await;
    let inbound_tx = start_dispatcher(db.pool().clone(), Arc::clone(&presence));

    inbound_tx
        .send(InboundMessage {
            sender_id: alice,
            sender_name: "alice".to_string(),
            address: Address::Peer {
                to: "bob".to_string(),
            },
            text: "are you there?".to_string(),
            ts: 1_700_000_000_000,
        })
        .await
        .unwrap();

    // The sender's own echo confirms the packet was processed.
    let msg = next_packet(&mut alice_rx).await;
    assert!(matches!(msg, Packet::Msg(_)));

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1, "messages to offline users must still persist");
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn chat_addressed_message_fans_out_to_the_whole_group() {
    let db = TestDatabase::new().await;
    let owner = db.create_user("owner").await;
    let carol = db.create_user("carol").await;
    let dave = db.create_user("dave").await;
    let chat_id = chats::create_group(db.pool(), owner, "team", &[carol, dave])
        .await
        .unwrap();

    let presence = Arc::new(PresenceRegistry::new());
    let mut carol_rx = connect(&presence, carol).await;
    let mut dave_rx = connect(&presence, dave).await;
    let inbound_tx = start_dispatcher(db.pool().clone(), Arc::clone(&presence));

    inbound_tx
        .send(InboundMessage {
            sender_id: owner,
            sender_name: "owner".to_string(),
            address: Address::Chat { chat_id },
            text: "standup in five".to_string(),
            ts: 1_700_000_000_000,
        })
        .await
        .unwrap();

    for rx in [&mut carol_rx, &mut dave_rx] {
        let msg = next_packet(rx).await;
        let Packet::Msg(msg) = msg else {
            panic!("expected msg packet, got {msg:?}");
        };
        assert_eq!(msg.text, "standup in five");
        assert_eq!(msg.address, Address::Chat { chat_id });
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn non_member_sender_is_rejected_without_persisting() {
    let db = TestDatabase::new().await;
    let owner = db.create_user("owner").await;
    let carol = db.create_user("carol").await;
    let outsider = db.create_user("outsider").await;
    let chat_id = chats::create_group(db.pool(), owner, "team", &[carol])
        .await
        .unwrap();

    let presence = Arc::new(PresenceRegistry::new());
    let mut carol_rx = connect(&presence, carol).await;
    let inbound_tx = start_dispatcher(db.pool().clone(), Arc::clone(&presence));

    inbound_tx
        .send(InboundMessage {
            sender_id: outsider,
            sender_name: "outsider".to_string(),
            address: Address::Chat { chat_id },
            text: "let me in".to_string(),
            ts: 1_700_000_000_000,
        })
        .await
        .unwrap();

    // A legitimate follow-up proves the dispatcher survived the bad packet.
    inbound_tx
        .send(InboundMessage {
            sender_id: owner,
            sender_name: "owner".to_string(),
            address: Address::Chat { chat_id },
            text: "as I was saying".to_string(),
            ts: 1_700_000_000_001,
        })
        .await
        .unwrap();

    let msg = next_packet(&mut carol_rx).await;
    let Packet::Msg(msg) = msg else {
        panic!("expected msg packet, got {msg:?}");
    };
    assert_eq!(msg.text, "as I was saying");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(count, 1, "the outsider's message must not be stored");
}

#[tokio::test]
#[serial]
#[ignore = "requires a Postgres instance"]
async fn replacing_a_connection_supersedes_the_old_one() {
    let db = TestDatabase::new().await;
    let alice = db.create_user("alice").await;
    let bob = db.create_user("bob").await;

    let presence = Arc::new(PresenceRegistry::new());
    let mut stale_rx = connect(&presence, bob).await;
    let mut fresh_rx = connect(&presence, bob).await;
    let inbound_tx = start_dispatcher(db.pool().clone(), Arc::clone(&presence));

    inbound_tx
        .send(InboundMessage {
            sender_id: alice,
            sender_name: "alice".to_string(),
            address: Address::Peer {
                to: "bob".to_string(),
            },
            text: "fresh connection only".to_string(),
            ts: 1_700_000_000_000,
        })
        .await
        .unwrap();

    let msg = next_packet(&mut fresh_rx).await;
    assert!(matches!(msg, Packet::Msg(_)));

    // The superseded entry was dropped at registration time, so its
    // channel is closed and received nothing.
    assert!(stale_rx.recv().await.is_none());
}
