//! One WebSocket transport instance.
//!
//! A link is created for every connection attempt and never reused.  It runs
//! as its own Tokio task and reports what happens on the socket to the
//! session actor as [`LinkEvent`]s, tagged with the link's id so the actor
//! can ignore events from links it has already replaced.
//!
//! # Event order
//!
//! ```text
//! success:   Opened, Frame*, [Error], Closed
//! failure:   Error, Closed
//! abandoned: Closed            (handle dropped while still connecting)
//! ```
//!
//! `Closed` is always the last event of a link and is always sent.
//!
//! # Closing
//!
//! There is no explicit close call: dropping the [`LinkHandle`] drops the
//! outbound sender, and the task answers by sending a WebSocket Close frame
//! and finishing.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info};

/// Generation number of a link.  Strictly increasing per session.
pub type LinkId = u64;

/// What a link reports to the session actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The WebSocket handshake completed.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// The socket failed.  Informational; `Closed` follows.
    Error(String),
    /// The link is finished.
    Closed,
}

/// The actor's handle to a running link.
#[derive(Debug)]
pub struct LinkHandle {
    id: LinkId,
    outbound: mpsc::UnboundedSender<String>,
}

impl LinkHandle {
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Queues a text frame for the socket.
    ///
    /// Returns `false` if the link task has already finished.
    pub fn send(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }
}

/// Spawns a link task connecting to `url` and returns its handle.
///
/// Must be called from within a Tokio runtime.
pub fn open(id: LinkId, url: String, events: mpsc::UnboundedSender<(LinkId, LinkEvent)>) -> LinkHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_link(id, url, outbound_rx, events));
    LinkHandle {
        id,
        outbound: outbound_tx,
    }
}

/// Resolves once every sender of `outbound` has been dropped.
async fn abandoned(outbound: &mut mpsc::UnboundedReceiver<String>) {
    while outbound.recv().await.is_some() {
        // Nothing is sent before `Opened`; anything queued that early is discarded.
    }
}

async fn run_link(
    id: LinkId,
    url: String,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<(LinkId, LinkEvent)>,
) {
    // If the actor is gone nobody is listening, and that is fine.
    let emit = |event: LinkEvent| {
        let _ = events.send((id, event));
    };

    debug!("link {id}: connecting to {url}");

    let ws_stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                emit(LinkEvent::Error(format!("failed to connect to {url}: {e}")));
                emit(LinkEvent::Closed);
                return;
            }
        },
        _ = abandoned(&mut outbound) => {
            debug!("link {id}: abandoned while connecting");
            emit(LinkEvent::Closed);
            return;
        }
    };

    info!("link {id}: connected to {url}");
    emit(LinkEvent::Opened);

    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
                        emit(LinkEvent::Error(format!("send failed: {e}")));
                        break;
                    }
                }
                None => {
                    debug!("link {id}: closing on request");
                    // The peer may already be gone; the close is best effort.
                    let _ = ws_tx.close().await;
                    break;
                }
            },

            msg = ws_rx.next() => match msg {
                Some(Ok(WsMessage::Text(text))) => emit(LinkEvent::Frame(text)),
                Some(Ok(WsMessage::Binary(data))) => {
                    debug!("link {id}: ignoring binary frame ({} bytes)", data.len());
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    debug!("link {id}: close frame received: {frame:?}");
                    // Flushes the queued Close reply.  Best effort.
                    let _ = ws_tx.close().await;
                    break;
                }
                // Ping/Pong are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    emit(LinkEvent::Error(e.to_string()));
                    break;
                }
                None => {
                    debug!("link {id}: stream ended");
                    break;
                }
            },
        }
    }

    emit(LinkEvent::Closed);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Receives the next event for `expected_id`, panicking on a mismatch.
    async fn next_event(
        rx: &mut mpsc::UnboundedReceiver<(LinkId, LinkEvent)>,
        expected_id: LinkId,
    ) -> LinkEvent {
        let (id, event) = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for link event")
            .expect("event channel closed");
        assert_eq!(id, expected_id);
        event
    }

    #[tokio::test]
    async fn test_refused_connection_reports_error_then_closed() {
        // Arrange: bind and immediately drop a listener to get a free, closed port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        let _link = open(7, format!("ws://{addr}/nautica-remote"), tx);

        // Assert
        assert!(matches!(next_event(&mut rx, 7).await, LinkEvent::Error(_)));
        assert_eq!(next_event(&mut rx, 7).await, LinkEvent::Closed);
    }

    #[tokio::test]
    async fn test_frames_flow_both_ways_and_drop_closes() {
        // Arrange: a server that echoes one frame, then waits for the close
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let first = ws.next().await.unwrap().unwrap();
            ws.send(first).await.unwrap();
            // Drain until the client closes.
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        });
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        let link = open(1, format!("ws://{addr}/nautica-remote"), tx);
        assert_eq!(next_event(&mut rx, 1).await, LinkEvent::Opened);
        assert!(link.send("{\"id\":\"nr.list\"}".to_string()));

        // Assert: the echo comes back as a frame
        assert_eq!(
            next_event(&mut rx, 1).await,
            LinkEvent::Frame("{\"id\":\"nr.list\"}".to_string())
        );

        // Dropping the handle closes the link.
        drop(link);
        assert_eq!(next_event(&mut rx, 1).await, LinkEvent::Closed);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_peer_close_is_answered_with_close_frame() {
        // Arrange: a server that closes right away and reports what comes back
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            ws.close(None).await.unwrap();
            ws.next().await
        });
        let (tx, mut rx) = mpsc::unbounded_channel();

        // Act
        let _link = open(3, format!("ws://{addr}/nautica-remote"), tx);
        assert_eq!(next_event(&mut rx, 3).await, LinkEvent::Opened);
        assert_eq!(next_event(&mut rx, 3).await, LinkEvent::Closed);

        // Assert: the server saw a completed close handshake, not a bare EOF
        let reply = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("server timed out")
            .unwrap();
        assert!(matches!(reply, Some(Ok(WsMessage::Close(_)))), "got {reply:?}");
    }
}
