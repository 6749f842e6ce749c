//! The network context
//!
//! A dedicated OS thread running a current-thread tokio runtime that hosts
//! the [`ConnectionSupervisor`](crate::supervisor::ConnectionSupervisor). All
//! socket I/O happens there; the caller only keeps a [`ControlHandle`] and
//! the event receiver.

use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::control::ControlHandle;
use crate::events::ClientEvent;
use crate::supervisor;

const THREAD_NAME: &str = "headsup-network";

/// Owner of the network thread
#[derive(Debug)]
pub struct NetworkContext {
    handle: ControlHandle,
    events: Option<mpsc::UnboundedReceiver<ClientEvent>>,
    thread: Option<JoinHandle<()>>,
}

impl NetworkContext {
    /// Start the network thread and its supervisor
    pub fn spawn(connect_timeout: Option<Duration>) -> io::Result<Self> {
        let (supervisor, handle, events) = supervisor::channel(connect_timeout);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let thread = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(supervisor.run());
                tracing::debug!("Network context finished");
            })?;

        tracing::info!("Network context started");
        Ok(Self {
            handle,
            events: Some(events),
            thread: Some(thread),
        })
    }

    /// A handle for issuing requests
    pub fn handle(&self) -> ControlHandle {
        self.handle.clone()
    }

    /// Take the event receiver; only the first call returns it
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ClientEvent>> {
        self.events.take()
    }

    /// Stop the supervisor and wait for the thread to exit
    ///
    /// Blocks the calling thread; from async code use
    /// [`NetworkContext::shutdown_async`].
    pub fn shutdown(mut self) {
        self.handle.shutdown();
        self.join();
    }

    /// Stop the supervisor and wait for the thread without blocking the runtime
    pub async fn shutdown_async(mut self) {
        self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::error!("Network thread panicked"),
                Err(e) => tracing::error!("Failed to join network thread: {}", e),
            }
        }
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Network thread panicked");
            }
        }
    }
}

impl Drop for NetworkContext {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.handle.shutdown();
            self.join();
        }
    }
}
