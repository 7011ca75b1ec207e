// Per-sender state for an inbound transfer: one active record per sender IP (see the
// single-sender assumption recorded in the design ledger).
use crate::file::transfer::FileTransfer;
use std::collections::HashMap;

pub struct ReceiveRecord {
    pub files: HashMap<String, FileTransfer>,
}

impl ReceiveRecord {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }
}

impl Default for ReceiveRecord {
    fn default() -> Self {
        Self::new()
    }
}
