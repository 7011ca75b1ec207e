pub mod frame;
pub mod interfaces;
pub mod peer;
pub mod peer_table;
pub mod tcp;
pub mod transport_layer;
pub mod udp;

pub use peer::{ConnectionState, Peer};
pub use peer_table::PeerTable;
pub use transport_layer::TransportLayer;
