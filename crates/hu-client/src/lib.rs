//! hu-client: Connection core for the Headsup control client
//!
//! The client is split across two execution contexts. The network context
//! is a single-threaded tokio runtime on its own thread; it hosts the
//! [`ConnectionSupervisor`], which owns the [`TransportSession`] and the
//! [`MessageRouter`]. The control context is whatever drives the operator
//! interface; it holds a [`ControlHandle`] and a stream of [`ClientEvent`]s,
//! usually through a [`ControlPanel`]. The two sides only exchange messages.

pub mod control;
pub mod dispatcher;
pub mod events;
pub mod panel;
pub mod router;
pub mod runtime;
pub mod supervisor;
pub mod transport;

pub use control::{ControlHandle, ControlRequest};
pub use dispatcher::{CommandDispatcher, DispatchError};
pub use events::{ClientEvent, EventPoster, StateChange};
pub use panel::{ConsoleLine, ControlPanel, PanelError};
pub use router::MessageRouter;
pub use runtime::NetworkContext;
pub use supervisor::{reconcile, Action, ConnectionSupervisor};
pub use transport::{SessionEnd, SessionEvent, TransportSession};
