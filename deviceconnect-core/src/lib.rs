//! Device-side connection bootstrap for the deviceconnect channel.
//!
//! [`establish`] turns an HTTP(S) server URL, a connect path and a bearer
//! token into a live WebSocket [`Connection`] whose liveness is paced by the
//! server's heartbeat probes.

pub mod bootstrap;
pub mod config;
pub mod connect;
pub mod connection;
pub mod endpoint;
pub mod error;
pub mod heartbeat;
pub mod logging;
pub mod timeouts;

pub use self::config::Config;
pub use connect::{establish, Connector};
pub use connection::{Connection, LivenessState};
pub use endpoint::Endpoint;
pub use error::{Error, Result};
pub use heartbeat::{PeerPacedProbes, ProbeHandler};
pub use timeouts::LivenessConfig;

pub use tokio_tungstenite::tungstenite::Message;
