// Known-peers table, guarded by a single mutex shared by reader and writer tasks.
use super::peer::{ConnectionState, Peer};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct PeerTable {
    inner: Arc<Mutex<HashMap<String, Peer>>>,
}

impl PeerTable {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record traffic from `ip`. Creates the peer if unknown, reactivates it if inactive.
    /// Returns the updated peer and whether this call transitioned it to active.
    pub async fn touch(&self, ip: &str) -> (Peer, bool) {
        let mut table = self.inner.lock().await;
        match table.get_mut(ip) {
            Some(peer) => {
                let became_active = !peer.active;
                peer.active = true;
                peer.last_seen = Utc::now();
                (peer.clone(), became_active)
            }
            None => {
                let peer = Peer::new(ip.to_string());
                table.insert(ip.to_string(), peer.clone());
                (peer, true)
            }
        }
    }

    /// Mark `ip` inactive. Returns the peer if it existed and was active (i.e. this call is
    /// the one that should emit `peer-change(false)`).
    pub async fn mark_inactive(&self, ip: &str) -> Option<Peer> {
        let mut table = self.inner.lock().await;
        let peer = table.get_mut(ip)?;
        if !peer.active {
            return None;
        }
        peer.active = false;
        peer.connection_state = ConnectionState::None;
        Some(peer.clone())
    }

    pub async fn set_connection_state(&self, ip: &str, state: ConnectionState) {
        let mut table = self.inner.lock().await;
        table
            .entry(ip.to_string())
            .or_insert_with(|| Peer::new(ip.to_string()))
            .connection_state = state;
    }

    pub async fn get(&self, ip: &str) -> Option<Peer> {
        self.inner.lock().await.get(ip).cloned()
    }

    /// Snapshot of every known address, taken under the lock and released before any I/O.
    pub async fn snapshot_addresses(&self) -> Vec<String> {
        self.inner.lock().await.keys().cloned().collect()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}

impl Default for PeerTable {
    fn default() -> Self {
        Self::new()
    }
}
