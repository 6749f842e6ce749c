//! Connection supervisor
//!
//! The supervisor is the only owner of connection state and of the
//! transport session. It runs in the network context as a single loop that
//! waits for a control request, the end of a pending connect attempt, or a
//! session event, applies it, then reconciles the actual state towards the
//! operator's intent. At most one session exists at a time: a new one is
//! only started once the previous one has been fully closed.
//!
//! Failures never trigger an automatic retry. The intent is cleared and the
//! state left at `Error` until the operator asks again.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use hu_core::{ConnectionIntent, ConnectionState, Endpoint, SessionId, TransportError};
use hu_protocol::Command;

use crate::control::{ControlHandle, ControlRequest};
use crate::events::{ClientEvent, EventPoster, StateChange};
use crate::router::MessageRouter;
use crate::transport::{SessionEvent, TransportSession};

/// What the supervisor should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Begin a new session
    Start,
    /// Close the current or pending session
    Close,
    /// Nothing to do
    Idle,
}

/// Decide the next action from the intent and the actual state
///
/// `session_alive` is true while a connect attempt or an open session
/// exists, which can briefly disagree with `state` during a transition.
pub fn reconcile(desired: bool, state: ConnectionState, session_alive: bool) -> Action {
    let active = state.is_active() || session_alive;
    match (desired, active) {
        (true, false) => Action::Start,
        (false, true) => Action::Close,
        _ => Action::Idle,
    }
}

type ConnectTask = JoinHandle<Result<TransportSession, TransportError>>;

enum Slot {
    Idle,
    /// The handshake task owns the session until the supervisor joins it
    Connecting {
        id: SessionId,
        endpoint: Endpoint,
        task: ConnectTask,
    },
    Connected(TransportSession),
}

impl Slot {
    fn is_alive(&self) -> bool {
        !matches!(self, Slot::Idle)
    }

    fn current_id(&self) -> Option<SessionId> {
        match self {
            Slot::Idle => None,
            Slot::Connecting { id, .. } => Some(*id),
            Slot::Connected(session) => Some(session.id()),
        }
    }
}

/// Resolve once the pending connect attempt finishes
///
/// Never resolves while no attempt is pending. The caller must take the
/// slot out as soon as this returns, since the task has been joined.
async fn connect_finished(slot: &mut Slot) -> Result<TransportSession, TransportError> {
    match slot {
        Slot::Connecting { endpoint, task, .. } => match task.await {
            Ok(result) => result,
            Err(e) => Err(TransportError::Connect {
                url: endpoint.url(),
                reason: e.to_string(),
            }),
        },
        _ => std::future::pending().await,
    }
}

/// Owns the connection and drives it towards the operator's intent
pub struct ConnectionSupervisor {
    connect_timeout: Option<Duration>,
    intent: Option<ConnectionIntent>,
    state: ConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    poster: EventPoster,
    router: MessageRouter,
    requests: mpsc::UnboundedReceiver<ControlRequest>,
    session_tx: mpsc::UnboundedSender<SessionEvent>,
    session_rx: mpsc::UnboundedReceiver<SessionEvent>,
    slot: Slot,
    next_id: SessionId,
}

/// Create a supervisor together with the control side's handle and event stream
pub fn channel(
    connect_timeout: Option<Duration>,
) -> (
    ConnectionSupervisor,
    ControlHandle,
    mpsc::UnboundedReceiver<ClientEvent>,
) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let (poster, events) = EventPoster::channel();
    let (session_tx, session_rx) = mpsc::unbounded_channel();

    let supervisor = ConnectionSupervisor {
        connect_timeout,
        intent: None,
        state: ConnectionState::Disconnected,
        state_tx,
        router: MessageRouter::new(poster.clone()),
        poster,
        requests: request_rx,
        session_tx,
        session_rx,
        slot: Slot::Idle,
        next_id: SessionId::FIRST,
    };

    (supervisor, ControlHandle::new(request_tx, state_rx), events)
}

impl ConnectionSupervisor {
    /// Run until shut down or until every control handle is dropped
    pub async fn run(mut self) {
        tracing::info!("Connection supervisor started");

        loop {
            self.reconcile().await;

            tokio::select! {
                request = self.requests.recv() => match request {
                    Some(ControlRequest::SetIntent(intent)) => self.set_intent(intent),
                    Some(ControlRequest::ClearIntent) => self.clear_intent(),
                    Some(ControlRequest::Submit(command)) => self.submit(command).await,
                    Some(ControlRequest::Shutdown) | None => break,
                },
                result = connect_finished(&mut self.slot) => self.on_connect_finished(result),
                Some(event) = self.session_rx.recv() => self.on_session_event(event).await,
            }
        }

        self.clear_intent();
        self.reconcile().await;
        tracing::info!("Connection supervisor stopped");
    }

    async fn reconcile(&mut self) {
        let desired = self.intent.as_ref().is_some_and(|i| i.desired);
        match reconcile(desired, self.state, self.slot.is_alive()) {
            Action::Start => self.start(),
            Action::Close => self.close_session().await,
            Action::Idle => {}
        }
    }

    fn set_intent(&mut self, intent: ConnectionIntent) {
        if intent.desired && (self.state.is_active() || self.slot.is_alive()) {
            tracing::debug!(
                "Connect to {} ignored: connection already {}",
                intent.endpoint,
                self.state
            );
            return;
        }
        self.intent = Some(intent);
    }

    fn clear_intent(&mut self) {
        if let Some(intent) = self.intent.as_mut() {
            intent.desired = false;
        }
    }

    fn start(&mut self) {
        let Some(intent) = self.intent.as_ref() else {
            return;
        };
        let endpoint = intent.endpoint.clone();
        let id = self.next_id;
        self.next_id = id.next();

        self.router.reset();
        self.set_state(ConnectionState::Connecting, None);
        self.poster
            .log(format!("Attempting to connect to {}", endpoint.url()));

        let timeout = self.connect_timeout;
        let target = endpoint.clone();
        let task = tokio::spawn(async move { TransportSession::open(id, &target, timeout).await });

        self.slot = Slot::Connecting { id, endpoint, task };
    }

    async fn close_session(&mut self) {
        match std::mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Idle => {}
            Slot::Connecting { id, task, .. } => {
                task.abort();
                // The handshake may have completed before the abort landed
                if let Ok(Ok(session)) = task.await {
                    session.close().await;
                }
                tracing::info!("{}: connect attempt cancelled", id);
                self.poster.log("Connection attempt cancelled");
            }
            Slot::Connected(session) => {
                session.close().await;
                self.poster.log("Disconnected from device");
            }
        }
        self.set_state(ConnectionState::Disconnected, None);
    }

    fn on_connect_finished(&mut self, result: Result<TransportSession, TransportError>) {
        self.slot = Slot::Idle;
        match result {
            Ok(mut session) => {
                self.set_state(ConnectionState::Connected, None);
                self.poster
                    .log(format!("Connected to device at {}", session.endpoint()));
                session.start_receiving(self.session_tx.clone());
                self.slot = Slot::Connected(session);
            }
            Err(e) => {
                self.poster.log(format!("Connection failed: {}", e));
                self.fail(e);
            }
        }
    }

    async fn on_session_event(&mut self, event: SessionEvent) {
        if self.slot.current_id() != Some(event.id()) {
            tracing::debug!("Discarding event from superseded {}", event.id());
            return;
        }

        match event {
            SessionEvent::Frame { text, .. } => self.router.route(&text),
            SessionEvent::Ended { reason, .. } => {
                self.drop_session().await;
                let error = reason.into_error();
                self.poster.log(format!("Connection error: {}", error));
                self.fail(error);
            }
        }
    }

    async fn submit(&mut self, command: Command) {
        let result = match &mut self.slot {
            Slot::Connected(session) => session.send(&command).await,
            _ => {
                tracing::warn!("Cannot send command '{}': not connected", command);
                self.poster
                    .log(format!("Cannot send command '{}': not connected", command));
                return;
            }
        };

        match result {
            Ok(()) => {
                tracing::info!("Sent command: {}", command);
                self.poster.log(format!("Sent command: {}", command));
            }
            Err(e) => {
                self.drop_session().await;
                self.poster.log(e.to_string());
                self.fail(e);
            }
        }
    }

    async fn drop_session(&mut self) {
        if let Slot::Connected(session) = std::mem::replace(&mut self.slot, Slot::Idle) {
            session.close().await;
        }
    }

    fn fail(&mut self, error: TransportError) {
        tracing::error!("Connection error: {}", error);
        self.clear_intent();
        self.set_state(ConnectionState::Error, Some(error.to_string()));
    }

    fn set_state(&mut self, state: ConnectionState, cause: Option<String>) {
        if self.state == state {
            return;
        }
        tracing::info!("Connection state: {} -> {}", self.state, state);
        self.state = state;
        self.state_tx.send_replace(state);
        self.poster
            .post(ClientEvent::State(StateChange { state, cause }));
    }
}
