use tokio::time::Instant;

use crate::protocol::Protocol;
use crate::reply_buffer::SlaveId;
use crate::slave_table::SlaveTable;
use crate::wire::Reply;

/// The reply barrier (spec §4.4): waits for replies to command `id` until
/// either the deadline elapses or every connected slave has answered.
///
/// Exposes exactly one operation, `wait_until`, which snapshots the reply
/// buffer into a stable, lock-free array before returning.
pub struct ReplyCollector;

impl ReplyCollector {
    pub async fn wait_until(
        protocol: &Protocol,
        slaves: &SlaveTable,
        id: u64,
        deadline: Instant,
    ) -> Vec<(SlaveId, Reply)> {
        loop {
            let snapshot = protocol.snapshot_replies_for(id).await;
            let connected = slaves.connected_count().await;
            // Zero connected slaves (spec §9 Open Questions) or full
            // quorum both resolve immediately; nothing left to wait for.
            if connected == 0 || snapshot.len() >= connected {
                return snapshot;
            }
            if Instant::now() >= deadline {
                return snapshot;
            }
            tokio::select! {
                _ = protocol.replies_ready() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    return protocol.snapshot_replies_for(id).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn returns_as_soon_as_every_connected_slave_has_replied() {
        let protocol = Arc::new(Protocol::new());
        let slaves = Arc::new(SlaveTable::new());
        let a = slaves.next_slave_id();
        let b = slaves.next_slave_id();
        slaves.insert(a).await;
        slaves.insert(b).await;
        let id = protocol.append("pachi-genmoves", vec!["b pass".to_string()]).await;

        let (p2, s2) = (protocol.clone(), slaves.clone());
        let waiter = tokio::spawn(async move {
            ReplyCollector::wait_until(&p2, &s2, id, Instant::now() + Duration::from_secs(5)).await
        });
        tokio::task::yield_now().await;
        protocol
            .record_reply(a, id, Reply::success(id, vec!["10 10 1 1".to_string()]))
            .await;
        protocol
            .record_reply(b, id, Reply::success(id, vec!["8 8 1 1".to_string()]))
            .await;
        let snapshot = waiter.await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn returns_a_partial_snapshot_once_the_deadline_elapses() {
        tokio::time::pause();
        let protocol = Arc::new(Protocol::new());
        let slaves = Arc::new(SlaveTable::new());
        let a = slaves.next_slave_id();
        let b = slaves.next_slave_id();
        slaves.insert(a).await;
        slaves.insert(b).await;
        let id = protocol.append("pachi-genmoves", vec!["b pass".to_string()]).await;
        protocol
            .record_reply(a, id, Reply::success(id, vec!["10 10 1 1".to_string()]))
            .await;

        let deadline = Instant::now() + Duration::from_millis(100);
        let (p2, s2) = (protocol.clone(), slaves.clone());
        let waiter = tokio::spawn(async move { ReplyCollector::wait_until(&p2, &s2, id, deadline).await });
        tokio::time::advance(Duration::from_millis(150)).await;
        let snapshot = waiter.await.unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn zero_connected_slaves_resolves_immediately() {
        let protocol = Arc::new(Protocol::new());
        let slaves = Arc::new(SlaveTable::new());
        let id = protocol.append("pachi-genmoves", vec!["b pass".to_string()]).await;
        let snapshot =
            ReplyCollector::wait_until(&protocol, &slaves, id, Instant::now() + Duration::from_secs(5))
                .await;
        assert!(snapshot.is_empty());
    }
}
