//! One WebSocket connection to the device

use std::fmt;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use hu_core::{Endpoint, SessionId, TransportError};
use hu_protocol::Command;

use super::{SessionEnd, SessionEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open WebSocket session
///
/// Owned by exactly one holder at a time: the connect task until it hands
/// the session over, then the supervisor. Closing consumes it.
pub struct TransportSession {
    id: SessionId,
    endpoint: Endpoint,
    sink: SplitSink<WsStream, Message>,
    /// Held until [`TransportSession::start_receiving`] moves it into the reader
    stream: Option<SplitStream<WsStream>>,
    reader: Option<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("receiving", &self.reader.is_some())
            .finish()
    }
}

impl TransportSession {
    /// Perform the WebSocket handshake
    ///
    /// `connect_timeout` bounds the handshake only. `None` waits for the
    /// operating system to give up.
    pub async fn open(
        id: SessionId,
        endpoint: &Endpoint,
        connect_timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let url = endpoint.url();
        tracing::info!("{}: connecting to {}", id, url);

        let handshake = tokio_tungstenite::connect_async(url.as_str());
        let result = match connect_timeout {
            Some(limit) => tokio::time::timeout(limit, handshake).await.map_err(|_| {
                TransportError::ConnectTimeout {
                    url: url.clone(),
                    timeout: limit,
                }
            })?,
            None => handshake.await,
        };

        let (ws, _response) = result.map_err(|e| TransportError::Connect {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!("{}: connected to {}", id, url);
        let (sink, stream) = ws.split();

        Ok(Self {
            id,
            endpoint: endpoint.clone(),
            sink,
            stream: Some(stream),
            reader: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Endpoint this session is connected to
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Spawn the receive loop
    ///
    /// Every text frame is forwarded as [`SessionEvent::Frame`]; the loop
    /// ends with exactly one [`SessionEvent::Ended`] unless the session is
    /// closed locally first. Calling this twice has no effect.
    pub fn start_receiving(&mut self, events: mpsc::UnboundedSender<SessionEvent>) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        let id = self.id;
        let cancel = self.cancel.clone();
        self.reader = Some(tokio::spawn(receive_loop(id, stream, events, cancel)));
    }

    /// Send one command as a text frame
    pub async fn send(&mut self, command: &Command) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        tracing::debug!("{}: sending {}", self.id, command);
        self.sink
            .send(Message::Text(command.as_token().to_string()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    /// Close the session and release the socket
    ///
    /// Stops the receive loop before returning, so no frame from this session
    /// is delivered afterwards. Safe to call on a session whose peer is gone.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(reader) = self.reader.take() {
            if let Err(e) = reader.await {
                tracing::warn!("{}: receive loop ended abnormally: {}", self.id, e);
            }
        }
        if let Err(e) = self.sink.close().await {
            tracing::debug!("{}: close handshake skipped: {}", self.id, e);
        }
        tracing::info!("{}: closed", self.id);
    }
}

async fn receive_loop(
    id: SessionId,
    mut stream: SplitStream<WsStream>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    let reason = loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("{}: receive loop cancelled", id);
                return;
            }
            message = stream.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => {
                let _ = events.send(SessionEvent::Frame { id, text });
            }
            Some(Ok(Message::Binary(bytes))) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let _ = events.send(SessionEvent::Frame { id, text });
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!("{}: device sent close: {:?}", id, frame);
                break SessionEnd::RemoteClosed;
            }
            Some(Ok(_)) => {}
            Some(Err(tungstenite::Error::ConnectionClosed))
            | Some(Err(tungstenite::Error::AlreadyClosed))
            | None => break SessionEnd::RemoteClosed,
            Some(Err(e)) => {
                tracing::warn!("{}: receive failed: {}", id, e);
                break SessionEnd::Failed(TransportError::Receive(e.to_string()));
            }
        }
    };

    if cancel.is_cancelled() {
        return;
    }
    let _ = events.send(SessionEvent::Ended { id, reason });
}
