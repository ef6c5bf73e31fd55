//! The remote session: one logical connection to a Nautica device.
//!
//! # Single-writer design (for beginners)
//!
//! The session state (connection state, traffic log, handler table, the
//! open transport, the reconnect timer) is owned by exactly one Tokio task,
//! the *actor*.  Nothing else ever mutates it, so no locks are needed:
//!
//! ```text
//! RemoteSession (cloneable handle)
//!     │ Command (unbounded mpsc, never blocks the caller)
//!     ▼
//! SessionActor task ──owns──> Router, TrafficLog, ConnectionState, LinkHandle
//!     ▲                            │ snapshots (watch) / events (broadcast)
//!     │ (LinkId, LinkEvent)        ▼
//! link task(s)                 observers (UI, console)
//! ```
//!
//! The actor handles one message at a time, so handlers always run to
//! completion before the next frame, close, or command is looked at.
//!
//! # Transport generations
//!
//! Every connection attempt gets a fresh link with a higher [`LinkId`].
//! Events tagged with an older id come from a transport that has been
//! replaced and are ignored.  That is what makes a re-entrant `connect()`
//! and a racing reconnect timer safe.

use nautica_core::{decode_packet, encode_packet, MessageKind, Packet};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::{Dispatch, ErrorSubscriber, Handler, RouteError, Router};
use crate::domain::{ConnectionState, SessionConfig, SessionEvent, Target, TrafficLog};
use crate::infrastructure::link::{self, LinkEvent, LinkHandle, LinkId};

/// Errors returned by [`RemoteSession`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session task has shut down; the handle is inert.
    #[error("session has stopped")]
    Stopped,

    /// A handler registration was rejected.
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Requests from handles to the actor.
enum Command {
    Connect(Target),
    Disconnect,
    Send(Packet),
    Register { kind: MessageKind, handler: Handler },
    SubscribeErrors(ErrorSubscriber),
    Shutdown,
}

// ── Public handle ─────────────────────────────────────────────────────────────

/// Handle to a running session.
///
/// Cheap to clone; every clone drives the same session.  All operations
/// return immediately: they queue a request for the session task and the
/// outcome shows up later in [`state`](Self::state),
/// [`traffic`](Self::traffic) and [`subscribe`](Self::subscribe).
///
/// # Example
///
/// ```no_run
/// use nautica_remote::{RemoteSession, SessionConfig, Target};
///
/// # async fn example() -> Result<(), nautica_remote::SessionError> {
/// let session = RemoteSession::spawn(SessionConfig::default());
/// session.on("nr.list", |packet| println!("servers: {:?}", packet.get("servers")))?;
/// session.on_error(|content| eprintln!("device error: {content}"))?;
/// session.connect(Target::authenticated("10.0.0.5", 9000, "K"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RemoteSession {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ConnectionState>,
    traffic: watch::Receiver<TrafficLog>,
    events: broadcast::Sender<SessionEvent>,
}

impl RemoteSession {
    /// Starts a session task on the current Tokio runtime.
    ///
    /// The session starts [`ConnectionState::Idle`] and does nothing until
    /// [`connect`](Self::connect) is called.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(config: SessionConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (traffic_tx, traffic_rx) = watch::channel(TrafficLog::default());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (link_events_tx, link_events_rx) = mpsc::unbounded_channel();
        let (reconnect_tx, reconnect_rx) = mpsc::unbounded_channel();

        let actor = SessionActor {
            config,
            router: Router::new(),
            state: state_tx,
            traffic: traffic_tx,
            events: events_tx.clone(),
            link_events: link_events_tx,
            reconnect_due: reconnect_tx,
            link: None,
            live: 0,
            target: None,
            reconnect: None,
            teardown_requested: false,
        };
        tokio::spawn(actor.run(commands_rx, link_events_rx, reconnect_rx));

        Self {
            commands: commands_tx,
            state: state_rx,
            traffic: traffic_rx,
            events: events_tx,
        }
    }

    fn command(&self, command: Command) -> Result<(), SessionError> {
        self.commands.send(command).map_err(|_| SessionError::Stopped)
    }

    /// Opens a connection to `target`.
    ///
    /// Any existing connection is closed first and any pending reconnect is
    /// cancelled.  Once the socket opens the state becomes
    /// [`ConnectionState::Connected`] and the target's handshake is sent.
    pub fn connect(&self, target: Target) -> Result<(), SessionError> {
        self.command(Command::Connect(target))
    }

    /// Closes the open connection, if any, and cancels any pending
    /// reconnect.  A no-op when nothing is open.
    pub fn disconnect(&self) -> Result<(), SessionError> {
        self.command(Command::Disconnect)
    }

    /// Sends a packet.  Fire-and-forget: there is no acknowledgement.
    ///
    /// Packets sent while not connected are dropped and reported as
    /// [`SessionEvent::SendDropped`].
    pub fn send(&self, packet: Packet) -> Result<(), SessionError> {
        self.command(Command::Send(packet))
    }

    /// Registers the handler for one message kind, replacing any previous
    /// one.
    ///
    /// # Errors
    ///
    /// [`SessionError::Route`] for the reserved `error` kind; use
    /// [`on_error`](Self::on_error) instead.
    ///
    /// # Panics
    ///
    /// Handlers run on the session task.  A panicking handler stops the
    /// session: every handle then returns [`SessionError::Stopped`] and the
    /// last published state is never updated again.
    pub fn on<F>(&self, kind: impl Into<MessageKind>, handler: F) -> Result<(), SessionError>
    where
        F: FnMut(&Packet) + Send + 'static,
    {
        let kind = kind.into();
        if kind.is_reserved() {
            return Err(RouteError::Reserved(kind).into());
        }
        self.command(Command::Register {
            kind,
            handler: Box::new(handler),
        })
    }

    /// Registers a callback for the content of every inbound `error` packet.
    /// Callbacks accumulate and run in registration order.
    ///
    /// A panicking callback stops the session, as for [`on`](Self::on).
    pub fn on_error<F>(&self, callback: F) -> Result<(), SessionError>
    where
        F: FnMut(&Value) + Send + 'static,
    {
        self.command(Command::SubscribeErrors(Box::new(callback)))
    }

    /// Stops the session task, closing any open connection.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.command(Command::Shutdown)
    }

    /// `false` once the session task has stopped.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A receiver that is notified on every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Snapshot of the traffic log of the current connection.
    pub fn traffic(&self) -> TrafficLog {
        self.traffic.borrow().clone()
    }

    /// A receiver that is notified whenever the traffic log changes.
    pub fn watch_traffic(&self) -> watch::Receiver<TrafficLog> {
        self.traffic.clone()
    }

    /// Subscribes to session events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

// ── Actor ─────────────────────────────────────────────────────────────────────

struct SessionActor {
    config: SessionConfig,
    router: Router,
    state: watch::Sender<ConnectionState>,
    traffic: watch::Sender<TrafficLog>,
    events: broadcast::Sender<SessionEvent>,
    /// Handed to every link so it can report back.
    link_events: mpsc::UnboundedSender<(LinkId, LinkEvent)>,
    reconnect_due: mpsc::UnboundedSender<LinkId>,
    /// The transport in use.  `None` once it is released, even if its task
    /// has not reported `Closed` yet.
    link: Option<LinkHandle>,
    /// Id of the newest link; events from any other id are stale.
    live: LinkId,
    /// Last target passed to `connect`, reused by reconnects.
    target: Option<Target>,
    reconnect: Option<JoinHandle<()>>,
    /// Set by `disconnect`; suppresses the reconnect after the close.
    teardown_requested: bool,
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut link_events: mpsc::UnboundedReceiver<(LinkId, LinkEvent)>,
        mut reconnect_due: mpsc::UnboundedReceiver<LinkId>,
    ) {
        debug!("session task started");

        // The actor keeps a sender for both internal channels, so those
        // `recv()` calls never return `None`.
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some((id, event)) = link_events.recv() => self.handle_link_event(id, event),
                Some(id) = reconnect_due.recv() => self.handle_reconnect_due(id),
            }
        }

        self.cancel_reconnect();
        if self.link.take().is_some() {
            self.traffic.send_modify(TrafficLog::clear);
            self.state.send_replace(ConnectionState::Disconnected);
        }
        info!("session stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(target) => self.connect(target),
            Command::Disconnect => self.disconnect(),
            Command::Send(packet) => self.send_packet(packet),
            Command::Register { kind, handler } => {
                if let Err(e) = self.router.register(kind, handler) {
                    warn!("{e}");
                }
            }
            Command::SubscribeErrors(subscriber) => self.router.subscribe_errors(subscriber),
            // Handled by the run loop.
            Command::Shutdown => {}
        }
    }

    fn connect(&mut self, target: Target) {
        self.cancel_reconnect();
        self.teardown_requested = false;

        if let Some(previous) = self.link.take() {
            info!("closing link {} to make way for a new connection", previous.id());
        }
        self.open(target);
    }

    /// Starts a fresh transport for `target`.
    fn open(&mut self, target: Target) {
        self.live += 1;
        let url = target.url();
        info!("connecting to {url} (link {})", self.live);

        // A new transport starts a new traffic lifetime.
        self.traffic.send_if_modified(|log| {
            let had_traffic = !log.is_empty();
            log.clear();
            had_traffic
        });
        self.state.send_replace(ConnectionState::Connecting);
        self.link = Some(link::open(self.live, url, self.link_events.clone()));
        self.target = Some(target);
    }

    fn disconnect(&mut self) {
        self.cancel_reconnect();
        self.teardown_requested = true;

        match self.link.take() {
            Some(link) => info!("disconnecting link {}", link.id()),
            None => debug!("disconnect requested with no open connection"),
        }
    }

    fn send_packet(&mut self, packet: Packet) {
        let connected = *self.state.borrow() == ConnectionState::Connected;
        let link = match self.link.as_ref() {
            Some(link) if connected => link,
            _ => {
                warn!("dropping outbound `{}`: not connected", packet.id);
                self.publish(SessionEvent::SendDropped(packet.id));
                return;
            }
        };

        let frame = match encode_packet(&packet) {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode `{}`: {e}", packet.id);
                return;
            }
        };

        if !link.send(frame.clone()) {
            warn!("link {} has finished; dropping `{}`", link.id(), packet.id);
            return;
        }

        debug!("sent `{}`", packet.id);
        self.traffic.send_modify(|log| log.record_outgoing(frame));
    }

    fn handle_link_event(&mut self, id: LinkId, event: LinkEvent) {
        if id != self.live {
            debug!("ignoring event from superseded link {id}");
            return;
        }

        // A released link is on its way out: only its closing matters.
        let released = self.link.is_none();
        match event {
            LinkEvent::Opened if released => debug!("link {id} opened after release"),
            LinkEvent::Frame(_) if released => debug!("dropping frame from released link {id}"),
            LinkEvent::Opened => self.on_opened(),
            LinkEvent::Frame(text) => self.on_frame(&text),
            LinkEvent::Error(reason) => {
                warn!("transport error on link {id}: {reason}");
                self.publish(SessionEvent::TransportError(reason));
            }
            LinkEvent::Closed => self.on_closed(),
        }
    }

    fn on_opened(&mut self) {
        let Some(target) = self.target.clone() else {
            return;
        };
        let url = target.url();

        self.state.send_replace(ConnectionState::Connected);
        info!("connected to {url}");
        self.publish(SessionEvent::Connected { url });

        self.send_packet(target.handshake());
    }

    fn on_frame(&mut self, text: &str) {
        self.traffic.send_modify(|log| log.record_incoming(text));

        let packet = match decode_packet(text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("dropping malformed frame: {e}");
                self.publish(SessionEvent::MalformedFrame(e.to_string()));
                return;
            }
        };

        match self.router.dispatch(&packet) {
            Dispatch::Handled => debug!("handled `{}`", packet.id),
            Dispatch::ErrorReported { subscribers } => {
                let content = packet.error_content();
                warn!("device reported an error ({subscribers} subscribers): {content}");
                self.publish(SessionEvent::ProtocolError(content));
            }
            Dispatch::Unroutable => {
                warn!("unhandled message `{}`", packet.id);
                self.publish(SessionEvent::Unroutable(packet.id));
            }
        }
    }

    fn on_closed(&mut self) {
        self.link = None;
        self.traffic.send_modify(TrafficLog::clear);
        self.state.send_replace(ConnectionState::Disconnected);

        let reconnecting =
            !self.teardown_requested && self.target.as_ref().is_some_and(Target::reconnects);
        if reconnecting {
            info!(
                "connection closed; reconnecting in {:?}",
                self.config.reconnect_delay
            );
            self.schedule_reconnect();
        } else {
            info!("connection closed");
        }
        self.publish(SessionEvent::Disconnected { reconnecting });
    }

    fn schedule_reconnect(&mut self) {
        self.cancel_reconnect();
        let id = self.live;
        let delay = self.config.reconnect_delay;
        let due = self.reconnect_due.clone();
        self.reconnect = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = due.send(id);
        }));
    }

    fn handle_reconnect_due(&mut self, id: LinkId) {
        // An aborted timer may still have queued its message.
        if id != self.live || self.link.is_some() || self.teardown_requested {
            debug!("ignoring stale reconnect timer for link {id}");
            return;
        }
        self.reconnect = None;
        if let Some(target) = self.target.clone() {
            self.open(target);
        }
    }

    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
