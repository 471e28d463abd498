//! Timeouts and limits applied to a device connection

use std::time::Duration;

use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

/// Maximum inbound message size accepted from the server.
pub const MAX_MESSAGE_SIZE: usize = 8192;

/// Read deadline installed right after the handshake, before the first probe.
pub const DEFAULT_PING_WAIT: Duration = Duration::from_secs(10);

/// Time allowed to write a heartbeat acknowledgment to the server.
pub const WRITE_WAIT: Duration = Duration::from_secs(4);

/// Upper bound on the WebSocket upgrade, including TCP and TLS setup.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);

/// Liveness settings installed on every established connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    pub max_message_size: usize,
    pub ping_wait: Duration,
    pub write_wait: Duration,
    pub handshake_timeout: Duration,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            ping_wait: DEFAULT_PING_WAIT,
            write_wait: WRITE_WAIT,
            handshake_timeout: HANDSHAKE_TIMEOUT,
        }
    }
}

impl LivenessConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inbound message size cap
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the initial read deadline
    #[must_use]
    pub const fn with_ping_wait(mut self, wait: Duration) -> Self {
        self.ping_wait = wait;
        self
    }

    /// Set the heartbeat acknowledgment write deadline
    #[must_use]
    pub const fn with_write_wait(mut self, wait: Duration) -> Self {
        self.write_wait = wait;
        self
    }

    /// Set the handshake timeout
    #[must_use]
    pub const fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Transport configuration enforcing the message cap.
    ///
    /// A single frame may not exceed the message cap either, so an oversized
    /// payload is refused before it is buffered.
    #[must_use]
    pub fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.max_message_size);
        config.max_frame_size = Some(self.max_message_size);
        config
    }
}
