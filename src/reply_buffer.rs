use std::collections::HashMap;

use crate::wire::Reply;

pub type SlaveId = u64;

/// A sparse table of the most recent reply from each slave (spec §3).
///
/// Storage for a slave is overwritten by its next reply; for aggregated
/// operations only replies keyed to the *current* command id count, which
/// is why each entry also records the id it answers.
#[derive(Default)]
pub struct ReplyBuffer {
    latest: HashMap<SlaveId, (u64, Reply)>,
}

impl ReplyBuffer {
    pub fn new() -> Self {
        ReplyBuffer {
            latest: HashMap::new(),
        }
    }

    pub fn record(&mut self, slave: SlaveId, id: u64, reply: Reply) {
        self.latest.insert(slave, (id, reply));
    }

    /// A stable snapshot of every reply currently keyed to `id`, read
    /// without holding any lock (spec §4.4).
    pub fn snapshot_for(&self, id: u64) -> Vec<(SlaveId, Reply)> {
        self.latest
            .iter()
            .filter(|(_, (rid, _))| *rid == id)
            .map(|(slave, (_, reply))| (*slave, reply.clone()))
            .collect()
    }

    pub fn remove(&mut self, slave: SlaveId) {
        self.latest.remove(&slave);
    }
}
