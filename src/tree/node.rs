use crate::coord::Coord;

/// One statistic channel — direct playouts or AMAF playouts — for a tree
/// node (spec §3 "Move statistics").
///
/// `p_playouts`/`p_wins` is the snapshot taken at the last sync point,
/// used in both directions: incoming merges compare against it to find
/// what a peer contributed since last seen, and outgoing reports compare
/// against it to find what *this* slave accumulated since it last told
/// the master anything (spec §4.6, both paragraphs share one snapshot —
/// there is exactly one "last synced" instant per node, not one per
/// direction).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Channel {
    pub playouts: u64,
    pub wins: f64,
    pub p_playouts: u64,
    pub p_wins: f64,
}

impl Channel {
    pub fn value(&self) -> f64 {
        if self.playouts == 0 {
            0.0
        } else {
            self.wins / self.playouts as f64
        }
    }

    /// Adds a local playout result directly to this channel, outside of
    /// any merge (this slave's own search growing the tree).
    pub fn record(&mut self, win: f64) {
        self.playouts += 1;
        self.wins += win;
    }

    /// Folds a remote aggregate snapshot in: the wire carries only the
    /// peer's current cumulative `(playouts, value)`, not its own prior
    /// snapshot, so the disagreement check this channel can make is that
    /// the incoming total never regresses behind what was last folded in
    /// (see the tree module's merge-contract note for why).
    fn merge_from(&mut self, coord: &Coord, incoming_playouts: u64, incoming_value: f64) -> Result<(), crate::error::EngineError> {
        if incoming_playouts < self.p_playouts {
            return Err(crate::error::EngineError::Protocol {
                node: Some(coord.clone()),
                reason: format!(
                    "incoming playouts {incoming_playouts} precede last-synced snapshot {}",
                    self.p_playouts
                ),
            });
        }
        let incoming_wins = incoming_value * incoming_playouts as f64;
        let delta_playouts = incoming_playouts - self.p_playouts;
        let delta_wins = incoming_wins - self.p_wins;
        self.playouts += delta_playouts;
        self.wins += delta_wins;
        self.p_playouts = self.playouts;
        self.p_wins = self.wins;
        Ok(())
    }

    /// What this slave has accumulated since the snapshot was last taken,
    /// as `(playouts, value)` ready to go out on the wire; also advances
    /// the snapshot (spec §4.6 "sends only the delta since last report").
    pub fn report_delta(&mut self) -> (u64, f64) {
        let delta_playouts = self.playouts - self.p_playouts;
        let delta_wins = self.wins - self.p_wins;
        self.p_playouts = self.playouts;
        self.p_wins = self.wins;
        if delta_playouts == 0 {
            (0, 0.0)
        } else {
            (delta_playouts, delta_wins / delta_playouts as f64)
        }
    }
}

/// RAVE equivalence parameter (spec glossary "AMAF / RAVE"): the playout
/// count at which direct and AMAF value are weighted equally.
const RAVE_EQUIVALENCE: f64 = 3000.0;

/// One node of the local MCTS tree (spec §9 "strictly a tree").
pub struct Node {
    pub coord: Coord,
    pub direct: Channel,
    pub amaf: Channel,
    pub(super) children: Vec<(Coord, petgraph::graph::NodeIndex)>,
}

impl Node {
    pub fn root() -> Self {
        Node {
            coord: Coord::pass(),
            direct: Channel::default(),
            amaf: Channel::default(),
            children: Vec::new(),
        }
    }

    pub fn leaf(coord: Coord) -> Self {
        Node {
            coord,
            direct: Channel::default(),
            amaf: Channel::default(),
            children: Vec::new(),
        }
    }

    /// Direct/AMAF value mixed by the RAVE β(n) schedule — β→0 as direct
    /// playouts grow, so the heuristic AMAF estimate fades out in favor
    /// of ground-truth direct simulation (spec glossary).
    pub fn mixed_value(&self) -> f64 {
        let n = self.direct.playouts as f64;
        let beta = RAVE_EQUIVALENCE / (RAVE_EQUIVALENCE + n);
        (1.0 - beta) * self.direct.value() + beta * self.amaf.value()
    }

    pub(super) fn merge_child_stat(
        &mut self,
        incoming_playouts: u64,
        incoming_value: f64,
        incoming_playouts_amaf: u64,
        incoming_value_amaf: f64,
    ) -> Result<(), crate::error::EngineError> {
        let coord = self.coord.clone();
        self.direct.merge_from(&coord, incoming_playouts, incoming_value)?;
        self.amaf.merge_from(&coord, incoming_playouts_amaf, incoming_value_amaf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_idempotent_on_a_repeated_snapshot() {
        let mut node = Node::leaf(Coord::from("A1"));
        node.merge_child_stat(60, 0.60, 50, 0.55).unwrap();
        let after_first = (node.direct.playouts, node.direct.wins, node.amaf.playouts);
        // merging the exact same snapshot again contributes zero delta
        node.merge_child_stat(60, 0.60, 50, 0.55).unwrap();
        assert_eq!(after_first, (node.direct.playouts, node.direct.wins, node.amaf.playouts));
    }

    #[test]
    fn merge_rejects_a_regressing_snapshot() {
        let mut node = Node::leaf(Coord::from("A1"));
        node.merge_child_stat(60, 0.60, 50, 0.55).unwrap();
        let err = node.merge_child_stat(10, 0.10, 5, 0.10).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Protocol { .. }));
    }

    #[test]
    fn report_delta_resets_after_reading() {
        let mut channel = Channel::default();
        channel.record(1.0);
        channel.record(0.0);
        let (playouts, value) = channel.report_delta();
        assert_eq!(playouts, 2);
        assert!((value - 0.5).abs() < 1e-9);
        let (playouts_again, _) = channel.report_delta();
        assert_eq!(playouts_again, 0);
    }

    #[test]
    fn beta_schedule_decays_toward_direct_value_as_playouts_grow() {
        let mut node = Node::leaf(Coord::from("A1"));
        node.amaf.playouts = 1000;
        node.amaf.wins = 800.0; // amaf value 0.8
        node.direct.playouts = 0;
        node.direct.wins = 0.0;
        let early = node.mixed_value();
        node.direct.playouts = 1_000_000;
        node.direct.wins = 500_000.0; // direct value 0.5
        let late = node.mixed_value();
        assert!(early > late); // heavy amaf influence fades toward 0.5
    }
}
