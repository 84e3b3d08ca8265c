//! WebSocket subscription handler.
//!
//! The first frame is the current value at the subscribed path (or `null`);
//! every later frame is the value after a modification affecting the path.
//! Extraction and JSON serialization happen here, on the connection task, so
//! the store's writer thread never serializes payloads. When the store drops
//! this subscriber (slow consumer or shutdown) the update stream ends and the
//! connection is closed.

use axum::extract::ws::{Message, WebSocket};
use icepeak_store::Subscription;
use tracing::debug;

/// Drive a subscription over an accepted WebSocket until either side closes.
pub async fn serve(mut socket: WebSocket, mut subscription: Subscription) {
    loop {
        tokio::select! {
            update = subscription.next() => match update {
                Some(root) => {
                    let payload = subscription.payload(&root);
                    if socket.send(Message::Text(payload)).await.is_err() {
                        debug!(path = %subscription.path(), "websocket send failed");
                        break;
                    }
                }
                None => {
                    debug!(path = %subscription.path(), "subscription closed by store");
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            },
            incoming = socket.recv() => match incoming {
                // Clients only listen; anything but close/ping is ignored.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    debug!(path = %subscription.path(), "websocket disconnected");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }
    subscription.unsubscribe().await;
}
