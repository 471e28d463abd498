//! Heartbeat probe handling
//!
//! The server paces liveness: every Ping it sends carries, as a decimal
//! ASCII integer, the number of seconds until it will probe again. The
//! device moves its read deadline that far out and answers with an empty
//! Pong.

use std::time::Duration;

use crate::error::Result;

/// Strategy invoked for every heartbeat probe received on a connection.
///
/// Returns how far past "now" the read deadline should move. Returning an
/// error faults the connection.
pub trait ProbeHandler: Send {
    fn on_probe(&mut self, payload: &[u8]) -> Result<Duration>;
}

impl<F> ProbeHandler for F
where
    F: FnMut(&[u8]) -> Result<Duration> + Send,
{
    fn on_probe(&mut self, payload: &[u8]) -> Result<Duration> {
        self(payload)
    }
}

/// Default handler: the deadline follows the interval the server announces.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerPacedProbes;

impl ProbeHandler for PeerPacedProbes {
    fn on_probe(&mut self, payload: &[u8]) -> Result<Duration> {
        Ok(parse_interval(payload))
    }
}

/// Decode a probe payload into the announced interval.
///
/// Anything that is not a non-negative decimal integer yields zero.
#[must_use]
pub fn parse_interval(payload: &[u8]) -> Duration {
    std::str::from_utf8(payload)
        .ok()
        .and_then(|text| text.parse::<u64>().ok())
        .map_or(Duration::ZERO, Duration::from_secs)
}
