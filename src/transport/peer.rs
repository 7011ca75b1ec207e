// Peer identity and lifecycle state.
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    None,
    Connecting,
    Established,
}

#[derive(Debug, Clone)]
pub struct Peer {
    pub address: String,
    pub last_seen: DateTime<Utc>,
    pub connection_state: ConnectionState,
    pub active: bool,
}

impl Peer {
    pub fn new(address: String) -> Self {
        Self {
            address,
            last_seen: Utc::now(),
            connection_state: ConnectionState::None,
            active: true,
        }
    }
}
