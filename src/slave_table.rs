use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tokio::sync::Mutex;

pub type SlaveId = u64;

/// Per-slave bookkeeping visible outside the owning session task: enough
/// for the reply collector to know who is connected, without exposing
/// socket internals (spec §3 "Slave session").
#[derive(Clone, Copy, Debug)]
pub struct SlaveInfo {
    pub last_sent_id: u64,
    pub last_acked_id: u64,
}

/// The process-wide slave table (spec §9): alive exactly as long as the
/// `Master` context that owns it.
pub struct SlaveTable {
    sessions: Mutex<HashMap<SlaveId, SlaveInfo>>,
    next_id: AtomicU64,
}

impl SlaveTable {
    pub fn new() -> Self {
        SlaveTable {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Every accepted connection — including a reconnect — is bound to a
    /// fresh id (spec §4.2 "Disconnect policy").
    pub fn next_slave_id(&self) -> SlaveId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn insert(&self, id: SlaveId) {
        self.sessions.lock().await.insert(
            id,
            SlaveInfo {
                last_sent_id: 0,
                last_acked_id: 0,
            },
        );
    }

    pub async fn update(&self, id: SlaveId, last_sent_id: u64, last_acked_id: u64) {
        if let Some(info) = self.sessions.lock().await.get_mut(&id) {
            info.last_sent_id = last_sent_id;
            info.last_acked_id = last_acked_id;
        }
    }

    pub async fn remove(&self, id: SlaveId) {
        self.sessions.lock().await.remove(&id);
    }

    pub async fn connected_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

impl Default for SlaveTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reconnects_always_get_a_fresh_id() {
        let table = SlaveTable::new();
        let first = table.next_slave_id();
        table.insert(first).await;
        table.remove(first).await;
        let second = table.next_slave_id();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn connected_count_reflects_inserts_and_removes() {
        let table = SlaveTable::new();
        let a = table.next_slave_id();
        let b = table.next_slave_id();
        table.insert(a).await;
        table.insert(b).await;
        assert_eq!(table.connected_count().await, 2);
        table.remove(a).await;
        assert_eq!(table.connected_count().await, 1);
    }
}
