use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite::{self, error::CapacityError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid server URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("WebSocket handshake with {target} failed: {source}")]
    Handshake {
        target: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("Server rejected WebSocket handshake with {target}: HTTP {status}")]
    Rejected { target: String, status: u16 },

    #[error("WebSocket handshake with {target} timed out after {timeout:?}")]
    HandshakeTimeout { target: String, timeout: Duration },

    #[error("Inbound message of {size} bytes exceeds the {limit} byte limit")]
    OversizedMessage { size: usize, limit: usize },

    #[error("Failed to acknowledge heartbeat: {0}")]
    HeartbeatWrite(#[source] tungstenite::Error),

    #[error("Heartbeat acknowledgment not written within {0:?}")]
    HeartbeatWriteTimeout(Duration),

    #[error("No traffic from peer before the read deadline")]
    DeadlineElapsed,

    #[error("Connection is dead")]
    ConnectionDead,

    #[error("WebSocket error: {0}")]
    WebSocket(tungstenite::Error),
}

impl Error {
    /// Classify a failed upgrade: an HTTP answer other than 101 is a
    /// rejection, everything else is a transport level failure.
    pub(crate) fn handshake(target: &str, err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Http(response) => Self::Rejected {
                target: target.to_string(),
                status: response.status().as_u16(),
            },
            source => Self::Handshake {
                target: target.to_string(),
                source,
            },
        }
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::Capacity(CapacityError::MessageTooLong { size, max_size }) => {
                Self::OversizedMessage {
                    size,
                    limit: max_size,
                }
            }
            other => Self::WebSocket(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::tungstenite::http::Response;

    #[test]
    fn test_capacity_error_maps_to_oversized() {
        let err = Error::from(tungstenite::Error::Capacity(CapacityError::MessageTooLong {
            size: 9000,
            max_size: 8192,
        }));
        assert!(matches!(
            err,
            Error::OversizedMessage {
                size: 9000,
                limit: 8192
            }
        ));
    }

    #[test]
    fn test_other_transport_errors_stay_websocket() {
        let err = Error::from(tungstenite::Error::ConnectionClosed);
        assert!(matches!(err, Error::WebSocket(_)));
    }

    #[test]
    fn test_non_101_response_is_rejection() {
        let response: Response<Option<Vec<u8>>> =
            Response::builder().status(401).body(None).unwrap();
        let err = Error::handshake("ws://localhost/connect", tungstenite::Error::Http(response.into()));
        match err {
            Error::Rejected { target, status } => {
                assert_eq!(target, "ws://localhost/connect");
                assert_eq!(status, 401);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        let err = Error::HeartbeatWriteTimeout(Duration::from_secs(4));
        assert_eq!(err.to_string(), "Heartbeat acknowledgment not written within 4s");
        assert_eq!(
            Error::DeadlineElapsed.to_string(),
            "No traffic from peer before the read deadline"
        );
    }
}
