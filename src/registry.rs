use crate::error::EngineError;

/// One entry in the command history (spec §3).
///
/// `retired` is bookkeeping only: it marks an entry logically superseded
/// by a later append, it does not remove it from the log (slaves that
/// already read it keep their acknowledgement, and the log stays the
/// authoritative replay source for reconnects).
///
/// `generation` starts at 0 on append and is bumped by every `replace_last`
/// against this entry. It is the only way a session can tell "the tail
/// still has this id, but its body changed" apart from "nothing changed
/// since I last sent it" — the id alone is insufficient, since a
/// same-id prior-stats refresh (spec §4.3/§4.5 step 2f) is exactly the
/// case where the id does *not* change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEntry {
    pub id: u64,
    pub verb: String,
    pub body: Vec<String>,
    pub retired: bool,
    pub generation: u64,
}

/// The authoritative, ordered command history (spec §3/§4.3).
///
/// Ids are dense and monotonic starting at 1 — the vec index *is* `id - 1`.
#[derive(Default)]
pub struct Registry {
    log: Vec<CommandEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Registry { log: Vec::new() }
    }

    /// Appends a brand new command, returning its freshly assigned id.
    pub fn append(&mut self, verb: impl Into<String>, body: Vec<String>) -> u64 {
        let id = self.log.len() as u64 + 1;
        self.log.push(CommandEntry {
            id,
            verb: verb.into(),
            body,
            retired: false,
            generation: 0,
        });
        id
    }

    /// Mutates the trailing entry in place, keeping its id but bumping its
    /// generation. Used for the intra-loop prior-stat updates of an
    /// in-flight search (spec §4.5 step 2f) where slaves distinguish
    /// "same search, more stats" from "new search" by the unchanged id —
    /// and distinguish "more stats" from "nothing new" by the generation.
    pub fn replace_last(
        &mut self,
        verb: impl Into<String>,
        body: Vec<String>,
    ) -> Result<u64, EngineError> {
        let entry = self.log.last_mut().ok_or_else(|| EngineError::Protocol {
            node: None,
            reason: "replace-last on an empty registry".to_string(),
        })?;
        entry.verb = verb.into();
        entry.body = body;
        entry.generation += 1;
        Ok(entry.id)
    }

    /// Retires the trailing entry and appends a new one with a fresh id.
    /// Used to commit the winning move over a search command (spec §4.5
    /// step 3, §8 scenario 4): late replies tagged with the retired id
    /// are naturally ignored once a session has moved on to the new one.
    pub fn supersede_last(&mut self, verb: impl Into<String>, body: Vec<String>) -> u64 {
        if let Some(last) = self.log.last_mut() {
            last.retired = true;
        }
        self.append(verb, body)
    }

    pub fn tail_id(&self) -> u64 {
        self.log.last().map(|e| e.id).unwrap_or(0)
    }

    pub fn get(&self, id: u64) -> Option<&CommandEntry> {
        if id == 0 {
            return None;
        }
        self.log.get((id - 1) as usize)
    }

    /// The entries from `from_id` (inclusive) to the tail, in order —
    /// the minimal replay suffix for a resyncing session (spec §4.2).
    pub fn suffix_from(&self, from_id: u64) -> &[CommandEntry] {
        if from_id == 0 {
            &self.log[..]
        } else if from_id as usize > self.log.len() {
            &[]
        } else {
            &self.log[(from_id - 1) as usize..]
        }
    }
}
