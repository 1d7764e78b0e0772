use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::info;

use crate::registry::VideoRelay;

/// Producer side: the embedded device streams binary video frames which
/// are forwarded to the relay as-is, with no framing or timestamp
/// metadata. Text frames are ignored.
pub async fn handle_producer(mut socket: WebSocket, relay: VideoRelay) {
    info!("Video producer connected");

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Binary(frame) => relay.broadcast(frame).await,
            Message::Text(_) => {}
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!("Video producer disconnected");
}

/// Consumer side: register with the relay and forward every frame to the
/// socket until either direction drops. Inbound text is discarded.
pub async fn handle_consumer(socket: WebSocket, relay: VideoRelay) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut frames) = relay.register().await;

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if sender.send(Message::Binary(frame)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                // Consumers only listen; anything else inbound is discarded.
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    relay.unregister(id).await;
}
