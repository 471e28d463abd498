//! Liveness-monitored WebSocket connection
//!
//! Reads are bounded by a deadline that only the server's heartbeat probes
//! move. Every probe is answered inline, inside the read that received it,
//! so the caller's read loop is what keeps the connection alive.

use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::{
    endpoint::Endpoint,
    error::{Error, Result},
    heartbeat::{PeerPacedProbes, ProbeHandler},
    timeouts::LivenessConfig,
};

/// Far enough out to act as "never" without overflowing `Instant + Duration`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Liveness of a connection handle.
///
/// A handle only exists once the handshake succeeded, so it starts `Live`.
/// `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Live,
    Dead,
}

/// An established device connection.
///
/// All operations take `&mut self`: heartbeat acknowledgments and caller
/// writes share the one sink and are serialised by ownership. Wrap the
/// handle in a `tokio::sync::Mutex` to share it between tasks.
pub struct Connection<S = MaybeTlsStream<TcpStream>> {
    stream: WebSocketStream<S>,
    endpoint: Endpoint,
    liveness: LivenessConfig,
    deadline: Instant,
    state: LivenessState,
    probe_handler: Box<dyn ProbeHandler>,
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("liveness", &self.liveness)
            .field("deadline", &self.deadline)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Install the liveness monitor on a freshly upgraded stream.
    ///
    /// The stream must have been created with
    /// [`LivenessConfig::websocket_config`] for the message cap to hold.
    pub fn new(stream: WebSocketStream<S>, endpoint: Endpoint, liveness: LivenessConfig) -> Self {
        Self {
            stream,
            endpoint,
            liveness,
            deadline: deadline_after(liveness.ping_wait),
            state: LivenessState::Live,
            probe_handler: Box::new(PeerPacedProbes),
        }
    }

    /// Replace the heartbeat probe strategy.
    #[must_use]
    pub fn with_probe_handler(mut self, handler: impl ProbeHandler + 'static) -> Self {
        self.probe_handler = Box::new(handler);
        self
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    #[must_use]
    pub const fn state(&self) -> LivenessState {
        self.state
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.state == LivenessState::Live
    }

    /// Inbound message cap enforced by the transport.
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.stream.get_config().max_message_size
    }

    /// Receive the next data message.
    ///
    /// Heartbeat probes are handled here and never returned. `Ok(None)`
    /// means the server closed the connection.
    pub async fn recv(&mut self) -> Result<Option<Message>> {
        self.ensure_live()?;

        loop {
            let Ok(next) = timeout_at(self.deadline, self.stream.next()).await else {
                warn!(endpoint = %self.endpoint, "Read deadline elapsed without traffic");
                return Err(self.fault(Error::DeadlineElapsed));
            };

            match next {
                Some(Ok(Message::Ping(payload))) => self.handle_probe(&payload).await?,
                Some(Ok(Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    debug!(endpoint = %self.endpoint, ?frame, "Server initiated close");
                    // Deliver the queued close reply; the server tears down TCP.
                    if let Ok(Err(e)) = timeout(self.liveness.write_wait, self.stream.flush()).await {
                        debug!(endpoint = %self.endpoint, error = %e, "Close reply not delivered");
                    }
                    self.state = LivenessState::Dead;
                    return Ok(None);
                }
                Some(Ok(message)) => return Ok(Some(message)),
                Some(Err(e)) => {
                    let err = Error::from(e);
                    warn!(endpoint = %self.endpoint, error = %err, "Read failed");
                    return Err(self.fault(err));
                }
                None => {
                    debug!(endpoint = %self.endpoint, "Connection closed");
                    self.state = LivenessState::Dead;
                    return Ok(None);
                }
            }
        }
    }

    /// Send a message to the server.
    pub async fn send(&mut self, message: Message) -> Result<()> {
        self.ensure_live()?;

        if let Err(e) = self.stream.send(message).await {
            return Err(self.fault(Error::from(e)));
        }
        Ok(())
    }

    /// Perform the close handshake and release the connection.
    pub async fn close(mut self) -> Result<()> {
        if self.state == LivenessState::Dead {
            return Ok(());
        }
        self.state = LivenessState::Dead;
        self.stream.close(None).await.map_err(Error::from)
    }

    async fn handle_probe(&mut self, payload: &[u8]) -> Result<()> {
        let extension = match self.probe_handler.on_probe(payload) {
            Ok(extension) => extension,
            Err(e) => return Err(self.fault(e)),
        };
        self.deadline = deadline_after(extension);
        debug!(
            endpoint = %self.endpoint,
            extension_secs = extension.as_secs(),
            "Heartbeat probe received"
        );

        let write_wait = self.liveness.write_wait;
        match timeout(write_wait, self.stream.send(Message::Pong(Bytes::new()))).await {
            Ok(Ok(())) => {
                trace!(endpoint = %self.endpoint, "Heartbeat acknowledged");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(endpoint = %self.endpoint, error = %e, "Heartbeat acknowledgment failed");
                Err(self.fault(Error::HeartbeatWrite(e)))
            }
            Err(_) => {
                warn!(endpoint = %self.endpoint, ?write_wait, "Heartbeat acknowledgment timed out");
                Err(self.fault(Error::HeartbeatWriteTimeout(write_wait)))
            }
        }
    }

    fn ensure_live(&self) -> Result<()> {
        match self.state {
            LivenessState::Live => Ok(()),
            LivenessState::Dead => Err(Error::ConnectionDead),
        }
    }

    fn fault(&mut self, err: Error) -> Error {
        self.state = LivenessState::Dead;
        err
    }
}

fn deadline_after(extension: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(extension).unwrap_or(now + FAR_FUTURE)
}
