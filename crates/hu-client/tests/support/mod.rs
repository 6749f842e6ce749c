//! In-process stand-in for the headset's WebSocket server

#![allow(dead_code)]

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use hu_client::{ClientEvent, StateChange};
use hu_core::{ConnectionState, Endpoint};
use hu_protocol::{Envelope, MessageKind};

pub const WAIT: Duration = Duration::from_secs(5);

/// A WebSocket server accepting client connections on 127.0.0.1
pub struct TestDevice {
    port: u16,
    connections: mpsc::UnboundedReceiver<DeviceConnection>,
    task: JoinHandle<()>,
}

impl TestDevice {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, connections) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                if let Ok(ws) = tokio_tungstenite::accept_async(stream).await {
                    let _ = tx.send(DeviceConnection { ws });
                }
            }
        });

        Self {
            port,
            connections,
            task,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port).unwrap()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the next client connection
    pub async fn accept(&mut self) -> DeviceConnection {
        tokio::time::timeout(WAIT, self.connections.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("device server stopped")
    }

    /// Whether a connection arrived that nobody accepted
    pub fn has_unaccepted(&mut self) -> bool {
        self.connections.try_recv().is_ok()
    }
}

impl Drop for TestDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The device's side of one session
pub struct DeviceConnection {
    ws: WebSocketStream<TcpStream>,
}

impl DeviceConnection {
    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.ws.send(Message::Text(text.into())).await.unwrap();
    }

    pub async fn send_envelope(&mut self, kind: MessageKind, data: &str) {
        let frame = Envelope::new(kind, data).to_frame().unwrap();
        self.send_text(frame).await;
    }

    /// Next text frame, or `None` once the client has closed
    pub async fn recv_text(&mut self) -> Option<String> {
        tokio::time::timeout(WAIT, async {
            loop {
                match self.ws.next().await {
                    Some(Ok(Message::Text(text))) => return Some(text),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return None,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await
        .expect("timed out waiting for a frame")
    }

    /// Drop the TCP connection without a close handshake
    pub fn sever(self) {
        drop(self.ws);
    }

    /// Close with a normal close handshake
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

/// A listener that accepts TCP connections but never answers the handshake
pub struct SilentDevice {
    port: u16,
    task: JoinHandle<()>,
}

impl SilentDevice {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });
        Self { port, task }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new("127.0.0.1", self.port).unwrap()
    }
}

impl Drop for SilentDevice {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A port with nothing listening on it
pub async fn closed_endpoint() -> Endpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Endpoint::new("127.0.0.1", port).unwrap()
}

/// Read events until one matches, returning everything seen including it
pub async fn collect_until<F>(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    mut done: F,
) -> Vec<ClientEvent>
where
    F: FnMut(&ClientEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        let mut seen = Vec::new();
        loop {
            let event = events.recv().await.expect("event stream ended");
            let finished = done(&event);
            seen.push(event);
            if finished {
                return seen;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Read events until the given state is reached
pub async fn wait_for_state(
    events: &mut mpsc::UnboundedReceiver<ClientEvent>,
    state: ConnectionState,
) -> StateChange {
    let seen = collect_until(events, |e| {
        matches!(e, ClientEvent::State(change) if change.state == state)
    })
    .await;
    match seen.into_iter().last() {
        Some(ClientEvent::State(change)) => change,
        other => panic!("unexpected event {:?}", other),
    }
}

/// Read events until a console line satisfies `pred`
pub async fn wait_for_log<F>(events: &mut mpsc::UnboundedReceiver<ClientEvent>, pred: F) -> String
where
    F: Fn(&str) -> bool,
{
    let seen = collect_until(events, |e| matches!(e, ClientEvent::Log(line) if pred(line))).await;
    match seen.into_iter().last() {
        Some(ClientEvent::Log(line)) => line,
        other => panic!("unexpected event {:?}", other),
    }
}

/// State transitions contained in a run of events
pub fn states(events: &[ClientEvent]) -> Vec<ConnectionState> {
    events
        .iter()
        .filter_map(|e| match e {
            ClientEvent::State(change) => Some(change.state),
            _ => None,
        })
        .collect()
}
