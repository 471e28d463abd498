//! Connection establishment
//!
//! One attempt, no retries: the caller decides what to do with a failure.

use std::sync::Once;

use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{
        self,
        client::IntoClientRequest,
        http::{header::AUTHORIZATION, HeaderValue},
    },
};
use tracing::{debug, info, warn};

use crate::{
    config::ConnectionConfig,
    connection::Connection,
    endpoint::Endpoint,
    error::{Error, Result},
    timeouts::LivenessConfig,
};

static CRYPTO_PROVIDER: Once = Once::new();

/// `wss://` dials go through rustls, which needs a process-level provider.
/// An application that installed its own first keeps it.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Establish a connection with the default liveness settings.
///
/// Equivalent to `Connector::default().establish(base_url, path, token)`.
pub async fn establish(base_url: &str, path: &str, token: &str) -> Result<Connection> {
    Connector::default().establish(base_url, path, token).await
}

/// Dials device connections with a fixed set of liveness settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Connector {
    liveness: LivenessConfig,
}

impl Connector {
    #[must_use]
    pub const fn new(liveness: LivenessConfig) -> Self {
        Self { liveness }
    }

    /// Upgrade `{ws(s) scheme of base_url}://{host}{path}` with the bearer
    /// `token` and install the liveness monitor on the result.
    ///
    /// Dropping the returned future aborts the handshake.
    pub async fn establish(&self, base_url: &str, path: &str, token: &str) -> Result<Connection> {
        let endpoint = Endpoint::resolve(base_url, path)?;
        let target = endpoint.url();

        let mut request = target
            .as_str()
            .into_client_request()
            .map_err(|e| Error::handshake(&target, e))?;
        let credential = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::handshake(&target, tungstenite::Error::HttpFormat(e.into())))?;
        request.headers_mut().insert(AUTHORIZATION, credential);

        install_crypto_provider();
        debug!(endpoint = %target, "Dialing device connect endpoint");
        let handshake = connect_async_with_config(
            request,
            Some(self.liveness.websocket_config()),
            false,
        );
        let (stream, response) = match timeout(self.liveness.handshake_timeout, handshake).await {
            Ok(Ok(upgraded)) => upgraded,
            Ok(Err(e)) => {
                let err = Error::handshake(&target, e);
                warn!(endpoint = %target, error = %err, "WebSocket handshake failed");
                return Err(err);
            }
            Err(_) => {
                warn!(
                    endpoint = %target,
                    timeout = ?self.liveness.handshake_timeout,
                    "WebSocket handshake timed out"
                );
                return Err(Error::HandshakeTimeout {
                    target,
                    timeout: self.liveness.handshake_timeout,
                });
            }
        };

        info!(endpoint = %target, status = response.status().as_u16(), "Device connection established");
        Ok(Connection::new(stream, endpoint, self.liveness))
    }
}

impl From<&ConnectionConfig> for Connector {
    fn from(config: &ConnectionConfig) -> Self {
        Self::new(LivenessConfig::default().with_handshake_timeout(config.handshake_timeout()))
    }
}
