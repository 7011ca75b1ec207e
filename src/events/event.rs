// Event types published by the transport, object, and file layers.
use crate::object::InnerObject;
use crate::transport::Peer;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDirection {
    Sending,
    Receiving,
}

#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub source_ip: String,
    pub type_tag: String,
    pub was_udp: bool,
}

#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// A peer was created, reactivated, or marked inactive.
    PeerChange { peer: Peer, became_active: bool },
    /// Raw framed bytes arrived from a peer, before envelope decoding.
    MessageReceived {
        source_ip: String,
        bytes: Vec<u8>,
        was_udp: bool,
    },
    /// An envelope decoded successfully and its type was found in the registry.
    ObjectReceived {
        metadata: ObjectMetadata,
        object: InnerObject,
    },
    /// A non-fatal per-message problem: malformed envelope or unknown type tag.
    Diagnostic {
        source_ip: Option<String>,
        message: String,
    },
    /// Progress on a single file within a send or receive record.
    FileProgress {
        direction: FileDirection,
        peer_ip: String,
        file_name: String,
        file_length: u64,
        bytes_processed: u64,
    },
    /// A file finished streaming and its receive-side stream was closed.
    FileReceived {
        peer_ip: String,
        file_name: String,
        final_path: PathBuf,
    },
}

impl CoreEvent {
    /// Fraction complete for a `FileProgress` event; `None` for other variants.
    /// Floating-point division; empty files report 1.0 complete.
    pub fn progress_fraction(&self) -> Option<f64> {
        match self {
            CoreEvent::FileProgress {
                file_length,
                bytes_processed,
                ..
            } => Some(if *file_length == 0 {
                1.0
            } else {
                *bytes_processed as f64 / *file_length as f64
            }),
            _ => None,
        }
    }
}
