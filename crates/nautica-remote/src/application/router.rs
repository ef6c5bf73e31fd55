//! Packet routing: message kind → handler.
//!
//! The router is the session's handler table.  It is plain data plus
//! closures, with no I/O, so it can be exercised directly in unit tests.
//!
//! # Routing rules
//!
//! ```text
//! id == "error"        → every error subscriber, in registration order,
//!                        called with the packet's content
//! id has a handler     → that handler, called once with the full packet
//! otherwise            → Dispatch::Unroutable (caller logs and drops it)
//! ```

use std::collections::HashMap;

use nautica_core::{MessageKind, Packet};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// A packet handler.  Runs on the session task, so it must not block.
pub type Handler = Box<dyn FnMut(&Packet) + Send + 'static>;

/// A callback for the content of inbound `error` packets.
pub type ErrorSubscriber = Box<dyn FnMut(&Value) + Send + 'static>;

/// Errors from handler registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The kind is handled internally and cannot be given a handler.
    #[error("message kind `{0}` is reserved; use on_error to observe it")]
    Reserved(MessageKind),
}

/// What [`Router::dispatch`] did with a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A registered handler ran.
    Handled,
    /// An `error` packet was fanned out to this many subscribers.
    ErrorReported { subscribers: usize },
    /// No handler exists for the packet's kind.
    Unroutable,
}

/// The handler table plus the error subscriber list.
#[derive(Default)]
pub struct Router {
    handlers: HashMap<MessageKind, Handler>,
    error_subscribers: Vec<ErrorSubscriber>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `kind`, replacing any previous handler.
    ///
    /// Returns `true` if a handler was replaced.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Reserved`] for [`MessageKind::Error`].
    pub fn register(&mut self, kind: MessageKind, handler: Handler) -> Result<bool, RouteError> {
        if kind.is_reserved() {
            return Err(RouteError::Reserved(kind));
        }
        let replaced = self.handlers.insert(kind.clone(), handler).is_some();
        if replaced {
            debug!("replaced handler for `{kind}`");
        }
        Ok(replaced)
    }

    /// Adds an error subscriber.  Subscribers accumulate and are never
    /// removed.
    pub fn subscribe_errors(&mut self, subscriber: ErrorSubscriber) {
        self.error_subscribers.push(subscriber);
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn handles(&self, kind: &MessageKind) -> bool {
        self.handlers.contains_key(kind)
    }

    pub fn error_subscriber_count(&self) -> usize {
        self.error_subscribers.len()
    }

    /// Routes one inbound packet.
    pub fn dispatch(&mut self, packet: &Packet) -> Dispatch {
        if packet.id.is_reserved() {
            let content = packet.error_content();
            for subscriber in &mut self.error_subscribers {
                subscriber(&content);
            }
            return Dispatch::ErrorReported {
                subscribers: self.error_subscribers.len(),
            };
        }

        match self.handlers.get_mut(&packet.id) {
            Some(handler) => {
                handler(packet);
                Dispatch::Handled
            }
            None => Dispatch::Unroutable,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Returns a handler that appends every packet it sees to `seen`.
    fn recording(seen: &Arc<Mutex<Vec<Packet>>>) -> Handler {
        let seen = Arc::clone(seen);
        Box::new(move |packet| seen.lock().unwrap().push(packet.clone()))
    }

    #[test]
    fn test_registered_handler_runs_once_with_full_packet() {
        // Arrange
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router
            .register(MessageKind::from("lights.set"), recording(&seen))
            .unwrap();
        let packet = Packet::new("lights.set").with("level", 80);

        // Act
        let outcome = router.dispatch(&packet);

        // Assert
        assert_eq!(outcome, Dispatch::Handled);
        assert_eq!(*seen.lock().unwrap(), vec![packet]);
    }

    #[test]
    fn test_unknown_kind_is_unroutable_and_runs_nothing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.register(MessageKind::List, recording(&seen)).unwrap();

        let outcome = router.dispatch(&Packet::new("mystery"));

        assert_eq!(outcome, Dispatch::Unroutable);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_packet_reaches_every_subscriber_in_order() {
        // Arrange: two subscribers writing into one shared log
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        for name in ["first", "second"] {
            let calls = Arc::clone(&calls);
            router.subscribe_errors(Box::new(move |content| {
                calls.lock().unwrap().push((name, content.clone()));
            }));
        }

        // Act
        let outcome = router.dispatch(&Packet::error("bad-key"));

        // Assert
        assert_eq!(outcome, Dispatch::ErrorReported { subscribers: 2 });
        assert_eq!(
            *calls.lock().unwrap(),
            vec![("first", json!("bad-key")), ("second", json!("bad-key"))]
        );
    }

    #[test]
    fn test_error_packet_without_subscribers_is_still_reported() {
        let mut router = Router::new();
        let outcome = router.dispatch(&Packet::error("x"));
        assert_eq!(outcome, Dispatch::ErrorReported { subscribers: 0 });
    }

    #[test]
    fn test_error_kind_cannot_be_registered() {
        let mut router = Router::new();
        let result = router.register(MessageKind::Error, Box::new(|_| {}));
        assert_eq!(result, Err(RouteError::Reserved(MessageKind::Error)));
        assert!(!router.handles(&MessageKind::Error));
    }

    #[test]
    fn test_error_kind_spelled_as_other_cannot_be_registered() {
        // Arrange
        let mut router = Router::new();
        let kind = MessageKind::Other("error".to_string());

        // Act
        let result = router.register(kind.clone(), Box::new(|_| {}));

        // Assert
        assert_eq!(result, Err(RouteError::Reserved(kind)));
        assert!(!router.handles(&MessageKind::Error));
    }

    #[test]
    fn test_reregistering_replaces_previous_handler() {
        // Arrange
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();

        // Act
        let replaced_first = router.register(MessageKind::List, recording(&first)).unwrap();
        let replaced_second = router.register(MessageKind::List, recording(&second)).unwrap();
        router.dispatch(&Packet::list());

        // Assert
        assert!(!replaced_first);
        assert!(replaced_second);
        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_handler_keeps_state_between_packets() {
        // FnMut handlers may carry their own counters.
        let total = Arc::new(Mutex::new(0));
        let mut router = Router::new();
        let sink = Arc::clone(&total);
        let mut count = 0;
        router
            .register(
                MessageKind::from("tick"),
                Box::new(move |_| {
                    count += 1;
                    *sink.lock().unwrap() = count;
                }),
            )
            .unwrap();

        for _ in 0..3 {
            router.dispatch(&Packet::new("tick"));
        }

        assert_eq!(*total.lock().unwrap(), 3);
    }
}
