//! Mission dependency graph rules.
//!
//! The database is the source of truth for edges and statuses; this module
//! holds the rules evaluated over them. Unlocking looks at direct
//! prerequisites only: a mission whose prerequisite is completed is unlocked
//! even if that prerequisite's own prerequisites are not. Whether lock state
//! should propagate along deeper chains is a product decision that has not
//! been made.
//!
//! Cycles are admitted when edges are inserted (only self-loops are
//! rejected). Every mission on a cycle stays locked until a status on the
//! cycle is changed by hand; [`DependencyGraph::deadlocked`] reports them.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use uuid::Uuid;

use crate::models::{DependencyEdge, MissionStatus};

/// The unlock rule: a mission is unlocked iff every direct prerequisite is
/// completed. A mission without prerequisites is always unlocked.
pub fn is_unlocked<I>(required_statuses: I) -> bool
where
    I: IntoIterator<Item = MissionStatus>,
{
    required_statuses.into_iter().all(|s| s.is_completed())
}

/// In-memory view over a set of dependency edges, loaded from the store for
/// the algorithms SQL cannot express. Edges point from a mission to the
/// missions it requires.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<Uuid, ()>,
    nodes: HashMap<Uuid, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = DependencyEdge>,
    {
        let mut graph = Self::default();
        for edge in edges {
            graph.insert(edge);
        }
        graph
    }

    fn node(&mut self, id: Uuid) -> NodeIndex {
        let graph = &mut self.graph;
        *self.nodes.entry(id).or_insert_with(|| graph.add_node(id))
    }

    /// Insert an edge. Self-loops and duplicates are ignored.
    pub fn insert(&mut self, edge: DependencyEdge) {
        if edge.mission_id == edge.required_mission_id {
            return;
        }
        let from = self.node(edge.mission_id);
        let to = self.node(edge.required_mission_id);
        self.graph.update_edge(from, to, ());
    }

    fn neighbors(&self, mission_id: Uuid, direction: Direction) -> Vec<Uuid> {
        match self.nodes.get(&mission_id) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, direction)
                .map(|n| self.graph[n])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Direct prerequisites of a mission.
    pub fn required(&self, mission_id: Uuid) -> Vec<Uuid> {
        self.neighbors(mission_id, Direction::Outgoing)
    }

    /// Missions that directly require this one.
    pub fn dependents(&self, mission_id: Uuid) -> Vec<Uuid> {
        self.neighbors(mission_id, Direction::Incoming)
    }

    /// Evaluate the unlock rule for one mission against a status table.
    ///
    /// Prerequisites missing from `statuses` (for example deleted while the
    /// caller was reading) are ignored rather than treated as an error.
    pub fn is_unlocked(&self, mission_id: Uuid, statuses: &HashMap<Uuid, MissionStatus>) -> bool {
        is_unlocked(
            self.required(mission_id)
                .iter()
                .filter_map(|id| statuses.get(id).copied()),
        )
    }

    /// Missions that belong to a dependency cycle: the union of strongly
    /// connected components with more than one member, sorted.
    pub fn deadlocked(&self) -> Vec<Uuid> {
        let members: BTreeSet<Uuid> = algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .flatten()
            .map(|idx| self.graph[idx])
            .collect();
        members.into_iter().collect()
    }
}
