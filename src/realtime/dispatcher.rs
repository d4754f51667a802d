/**
 * Message Dispatcher
 *
 * The single consumer of the shared bounded queue. Every inbound message
 * from every connection funnels through here, one at a time, so all
 * shared-state mutation happens on one path and delivery order matches
 * queue order.
 *
 * Per packet:
 *
 * 1. **Persist** - resolve the chat identity (get-or-create for
 *    peer-addressed messages, membership-checked id for chat-addressed
 *    ones) and append the message.
 * 2. **Resolve recipients** - fresh membership for chat-addressed,
 *    {sender, peer} for peer-addressed (the sender always gets an echo).
 * 3. **Deliver** - under the presence lock, write the message packet and
 *    then a freshly computed chat list to each present recipient.
 *
 * Failures abort only the packet at hand: they are logged, never retried,
 * and never propagated back to the sending connection. A persisted but
 * undelivered message still surfaces via history replay on reconnect.
 */

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::mpsc;

use crate::auth::users;
use crate::chat::db as chats;
use crate::error::ApiError;
use crate::messaging::db as messages;
use crate::realtime::packet::{Address, InboundMessage, MsgPacket, Packet};
use crate::realtime::presence::PresenceRegistry;
use crate::{ChatId, UserId};

/// Capacity of the shared inbound queue. Producers block once it fills,
/// which throttles every connection behind a slow dispatcher.
pub const QUEUE_CAPACITY: usize = 1024;

/// Run the dispatcher until the queue closes at shutdown.
pub async fn run(
    db: PgPool,
    presence: Arc<PresenceRegistry>,
    mut inbound_rx: mpsc::Receiver<InboundMessage>,
) {
    tracing::info!("[Dispatcher] Started");

    while let Some(inbound) = inbound_rx.recv().await {
        if let Err(e) = dispatch(&db, &presence, inbound).await {
            // Abort this packet only; the queue keeps draining.
            tracing::warn!("[Dispatcher] Packet dropped: {}", e);
        }
    }

    tracing::info!("[Dispatcher] Queue closed, shutting down");
}

/// Persist one message and fan it out to present recipients.
async fn dispatch(
    db: &PgPool,
    presence: &PresenceRegistry,
    inbound: InboundMessage,
) -> Result<(), ApiError> {
    let (chat_id, recipients) = resolve(db, &inbound).await?;

    messages::append(db, chat_id, inbound.sender_id, &inbound.text).await?;

    let outbound = Packet::Msg(MsgPacket {
        address: inbound.address.clone(),
        from: Some(inbound.sender_name.clone()),
        text: inbound.text.clone(),
        ts: Some(inbound.ts),
    });

    // Holding the registry lock across the whole delivery step keeps a
    // concurrent disconnect from racing lookup-then-write, and keeps two
    // dispatches from interleaving their chat-list pushes.
    let guard = presence.lock().await;
    for user_id in recipients {
        let Some(tx) = guard.sender(user_id) else {
            continue; // offline; history replay covers it
        };
        if tx.send(outbound.clone()).is_err() {
            continue;
        }
        match chats::summarize(db, user_id).await {
            Ok(list) => {
                let _ = tx.send(Packet::Chats { chats: list });
            }
            Err(e) => {
                tracing::warn!("[Dispatcher] Chat list for user {} failed: {}", user_id, e);
            }
        }
    }

    Ok(())
}

/// Resolve the target chat and its recipient set.
async fn resolve(
    db: &PgPool,
    inbound: &InboundMessage,
) -> Result<(ChatId, Vec<UserId>), ApiError> {
    match &inbound.address {
        Address::Peer { to } => {
            let peer_id = users::get_user_id(db, to)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("unknown recipient '{}'", to)))?;
            if peer_id == inbound.sender_id {
                return Err(ApiError::validation("message addressed to self"));
            }
            let chat_id = chats::resolve_direct(db, inbound.sender_id, peer_id).await?;
            Ok((chat_id, vec![inbound.sender_id, peer_id]))
        }
        Address::Chat { chat_id } => {
            if !chats::is_member(db, *chat_id, inbound.sender_id).await? {
                return Err(ApiError::not_found(format!(
                    "user {} is not a member of chat {}",
                    inbound.sender_id, chat_id
                )));
            }
            // Membership is queried fresh on every dispatch; it may have
            // changed since the chat was created.
            let members = chats::members_of(db, *chat_id).await?;
            Ok((*chat_id, members.into_iter().map(|m| m.user_id).collect()))
        }
    }
}

/// Push a freshly computed chat list to each of the given users that is
/// currently present. Used after out-of-band chat creation.
pub async fn push_chat_lists(db: &PgPool, presence: &PresenceRegistry, user_ids: &[UserId]) {
    let guard = presence.lock().await;
    for &user_id in user_ids {
        let Some(tx) = guard.sender(user_id) else {
            continue;
        };
        match chats::summarize(db, user_id).await {
            Ok(list) => {
                let _ = tx.send(Packet::Chats { chats: list });
            }
            Err(e) => {
                tracing::warn!("[Dispatcher] Chat list for user {} failed: {}", user_id, e);
            }
        }
    }
}
