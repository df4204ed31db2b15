use std::collections::{BTreeSet, VecDeque};

use super::DependencyGraph;
use crate::model::descriptor::ModId;

/// Splits a graph into groups the search may only toggle as a whole.
pub trait Clusterer {
    fn clusters(&self, graph: &DependencyGraph) -> Vec<BTreeSet<ModId>>;
}

/// Connected components of the undirected closure: two mods share a
/// cluster when a chain of dependencies links them, whichever way the
/// edges point.
#[derive(Debug, Clone, Copy, Default)]
pub struct UndirectedReach;

impl Clusterer for UndirectedReach {
    fn clusters(&self, graph: &DependencyGraph) -> Vec<BTreeSet<ModId>> {
        let mut seen: BTreeSet<&ModId> = BTreeSet::new();
        let mut clusters = Vec::new();

        for start in graph.ids() {
            if !seen.insert(start) {
                continue;
            }

            let mut cluster = BTreeSet::new();
            let mut queue = VecDeque::from([start]);
            while let Some(id) = queue.pop_front() {
                cluster.insert(id.clone());
                for next in graph.neighbours(id) {
                    if seen.insert(next) {
                        queue.push_back(next);
                    }
                }
            }

            clusters.push(cluster);
        }

        clusters
    }
}
