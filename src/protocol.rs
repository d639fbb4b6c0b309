use tokio::sync::Mutex;
use tokio::sync::Notify;

use crate::error::EngineError;
use crate::registry::CommandEntry;
use crate::registry::Registry;
use crate::reply_buffer::ReplyBuffer;
use crate::reply_buffer::SlaveId;
use crate::wire::Reply;

/// The command registry and reply buffer behind a single exclusive lock
/// (spec §5, "the protocol lock"). Held only for the duration of a
/// mutation or a reply-buffer snapshot read — never across a socket
/// read or a deadline wait.
pub struct Protocol {
    state: Mutex<State>,
    commands_ready: Notify,
    replies_ready: Notify,
}

struct State {
    registry: Registry,
    replies: ReplyBuffer,
}

impl Protocol {
    pub fn new() -> Self {
        Protocol {
            state: Mutex::new(State {
                registry: Registry::new(),
                replies: ReplyBuffer::new(),
            }),
            commands_ready: Notify::new(),
            replies_ready: Notify::new(),
        }
    }

    pub async fn append(&self, verb: impl Into<String>, body: Vec<String>) -> u64 {
        let id = {
            let mut state = self.state.lock().await;
            state.registry.append(verb, body)
        };
        self.commands_ready.notify_waiters();
        id
    }

    pub async fn replace_last(
        &self,
        verb: impl Into<String>,
        body: Vec<String>,
    ) -> Result<u64, EngineError> {
        let id = {
            let mut state = self.state.lock().await;
            state.registry.replace_last(verb, body)?
        };
        self.commands_ready.notify_waiters();
        Ok(id)
    }

    pub async fn supersede_last(&self, verb: impl Into<String>, body: Vec<String>) -> u64 {
        let id = {
            let mut state = self.state.lock().await;
            state.registry.supersede_last(verb, body)
        };
        self.commands_ready.notify_waiters();
        id
    }

    pub async fn tail_id(&self) -> u64 {
        self.state.lock().await.registry.tail_id()
    }

    pub async fn entry(&self, id: u64) -> Option<CommandEntry> {
        self.state.lock().await.registry.get(id).cloned()
    }

    /// Blocks a slave session until there is something new to send: either
    /// the entry right after `last_id`, once it exists (a brand new
    /// command), or a fresh generation of the entry *at* `last_id`, once
    /// one is published (a same-id prior-stats refresh, spec §4.3/§4.5
    /// step 2f). `last_id == 0` with any `last_generation` waits for the
    /// very first command.
    ///
    /// Tail growth always wins over a same-id generation bump: once a
    /// search has been superseded (spec §4.5 step 3), the session moves
    /// straight to the new tail entry rather than waiting on a generation
    /// that will never change again for the retired id.
    pub async fn await_update(&self, last_id: u64, last_generation: u64) -> CommandEntry {
        loop {
            let notified = self.commands_ready.notified();
            {
                let state = self.state.lock().await;
                if state.registry.tail_id() > last_id {
                    if let Some(entry) = state.registry.get(last_id + 1) {
                        return entry.clone();
                    }
                } else if let Some(entry) = state.registry.get(last_id) {
                    if entry.generation != last_generation {
                        return entry.clone();
                    }
                }
            }
            notified.await;
        }
    }

    pub async fn record_reply(&self, slave: SlaveId, id: u64, reply: Reply) {
        {
            let mut state = self.state.lock().await;
            state.replies.record(slave, id, reply);
        }
        self.replies_ready.notify_waiters();
    }

    pub async fn forget_slave(&self, slave: SlaveId) {
        self.state.lock().await.replies.remove(slave);
    }

    pub async fn snapshot_replies_for(&self, id: u64) -> Vec<(SlaveId, Reply)> {
        self.state.lock().await.replies.snapshot_for(id)
    }

    /// A `Notified` future the collector can race against its deadline.
    pub fn replies_ready(&self) -> tokio::sync::futures::Notified<'_> {
        self.replies_ready.notified()
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_replace_then_supersede_preserve_spec_id_semantics() {
        let protocol = Protocol::new();
        let search_id = protocol
            .append("pachi-genmoves", vec!["b pass".to_string()])
            .await;
        let updated_id = protocol
            .replace_last(
                "pachi-genmoves",
                vec!["b pass".to_string(), "A1 10 0.5 0 0".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(updated_id, search_id);
        let play_id = protocol
            .supersede_last("play", vec!["b A1".to_string()])
            .await;
        assert_eq!(play_id, search_id + 1);
    }

    #[tokio::test]
    async fn await_update_resolves_once_the_first_command_is_appended() {
        let protocol = std::sync::Arc::new(Protocol::new());
        let waiter = {
            let protocol = protocol.clone();
            tokio::spawn(async move { protocol.await_update(0, 0).await })
        };
        tokio::task::yield_now().await;
        protocol.append("play", vec!["b D4".to_string()]).await;
        let entry = waiter.await.unwrap();
        assert_eq!(entry.id, 1);
    }

    #[tokio::test]
    async fn await_update_resolves_on_a_same_id_generation_bump() {
        let protocol = std::sync::Arc::new(Protocol::new());
        let id = protocol
            .append("pachi-genmoves", vec!["b pass".to_string()])
            .await;
        let waiter = {
            let protocol = protocol.clone();
            tokio::spawn(async move { protocol.await_update(id, 0).await })
        };
        tokio::task::yield_now().await;
        protocol
            .replace_last(
                "pachi-genmoves",
                vec!["b pass".to_string(), "A1 10 0.5 0 0".to_string()],
            )
            .await
            .unwrap();
        let entry = waiter.await.unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.generation, 1);
    }

    #[tokio::test]
    async fn await_update_prefers_tail_growth_over_a_stale_generation_wait() {
        let protocol = std::sync::Arc::new(Protocol::new());
        let search_id = protocol
            .append("pachi-genmoves", vec!["b pass".to_string()])
            .await;
        let waiter = {
            let protocol = protocol.clone();
            // this session already sent generation 0 of search_id
            tokio::spawn(async move { protocol.await_update(search_id, 0).await })
        };
        tokio::task::yield_now().await;
        protocol.supersede_last("play", vec!["b A1".to_string()]).await;
        let entry = waiter.await.unwrap();
        assert_eq!(entry.id, search_id + 1);
        assert_eq!(entry.verb, "play");
    }
}
