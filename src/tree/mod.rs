//! The slave-side tree-merge contract (spec §4.6): a standalone MCTS
//! arena usable independently of networking, expressing the invariants a
//! conforming slave must honor rather than a full search engine (the
//! playout policy itself is out of scope).

mod node;

use std::cmp::Ordering;

use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;

use crate::coord::Coord;
use crate::error::EngineError;
use crate::wire::ChildStat;

pub use node::Channel;
pub use node::Node;

/// An arena-backed MCTS tree (spec §9): strictly a tree, no cycles, built
/// on a `petgraph::DiGraph` the way the teacher's CFR tree is, with an
/// explicit coord-sorted sibling list per node for the linear two-pointer
/// merge spec §4.6 requires.
pub struct Tree {
    graph: DiGraph<Node, ()>,
    root: NodeIndex,
}

impl Tree {
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(Node::root());
        Tree { graph, root }
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.graph[index]
    }

    pub fn child(&self, index: NodeIndex, coord: &Coord) -> Option<NodeIndex> {
        self.graph[index]
            .children
            .iter()
            .find(|(c, _)| c == coord)
            .map(|(_, idx)| *idx)
    }

    fn new_child(&mut self, parent: NodeIndex, coord: Coord) -> NodeIndex {
        let idx = self.graph.add_node(Node::leaf(coord));
        self.graph.add_edge(parent, idx, ());
        idx
    }

    /// Merges the master's per-child prior-stats payload into `parent`'s
    /// children (spec §4.6): a linear two-pointer walk over both sides'
    /// coord-sorted sibling lists, matching children by coord, linking in
    /// any the slave has never seen, and leaving any the slave has that
    /// the master didn't report untouched.
    pub fn merge_priors(&mut self, parent: NodeIndex, incoming: &[ChildStat]) -> Result<(), EngineError> {
        let mut incoming: Vec<&ChildStat> = incoming.iter().collect();
        incoming.sort_by(|a, b| a.coord.cmp(&b.coord));

        let existing = self.graph[parent].children.clone();
        let mut merged = Vec::with_capacity(existing.len().max(incoming.len()));

        let mut ei = 0;
        let mut ii = 0;
        while ei < existing.len() && ii < incoming.len() {
            let (ecoord, eidx) = &existing[ei];
            let src = incoming[ii];
            match ecoord.cmp(&src.coord) {
                Ordering::Less => {
                    merged.push((ecoord.clone(), *eidx));
                    ei += 1;
                }
                Ordering::Greater => {
                    let idx = self.new_child(parent, src.coord.clone());
                    self.apply(idx, src)?;
                    merged.push((src.coord.clone(), idx));
                    ii += 1;
                }
                Ordering::Equal => {
                    self.apply(*eidx, src)?;
                    merged.push((ecoord.clone(), *eidx));
                    ei += 1;
                    ii += 1;
                }
            }
        }
        while ei < existing.len() {
            merged.push(existing[ei].clone());
            ei += 1;
        }
        while ii < incoming.len() {
            let src = incoming[ii];
            let idx = self.new_child(parent, src.coord.clone());
            self.apply(idx, src)?;
            merged.push((src.coord.clone(), idx));
            ii += 1;
        }

        self.graph[parent].children = merged;
        Ok(())
    }

    fn apply(&mut self, index: NodeIndex, src: &ChildStat) -> Result<(), EngineError> {
        self.graph[index].merge_child_stat(src.playouts, src.value, src.playouts_amaf, src.value_amaf)
    }

    /// The outgoing report (spec §4.6 second paragraph): every child of
    /// `parent` with a nonzero delta-since-last-report, ready to ship as
    /// a `pachi-genmoves` reply's per-child stat lines.
    pub fn report_deltas(&mut self, parent: NodeIndex) -> Vec<ChildStat> {
        let children = self.graph[parent].children.clone();
        let mut out = Vec::new();
        for (coord, idx) in children {
            let node = &mut self.graph[idx];
            let (playouts, value) = node.direct.report_delta();
            let (playouts_amaf, value_amaf) = node.amaf.report_delta();
            if playouts > 0 || playouts_amaf > 0 {
                out.push(ChildStat {
                    coord,
                    playouts,
                    value,
                    playouts_amaf,
                    value_amaf,
                });
            }
        }
        out
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
