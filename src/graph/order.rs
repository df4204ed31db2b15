use std::collections::{BTreeMap, BTreeSet};

use super::DependencyGraph;
use crate::model::descriptor::ModId;

/// Puts the members of one cluster into a reproducible order.
pub trait Orderer {
    fn order(&self, graph: &DependencyGraph, members: &BTreeSet<ModId>) -> Vec<ModId>;
}

/// Kahn's algorithm over the directed edges inside the cluster. A mod comes
/// before the mods it depends on; among mods that are ready at the same
/// time the smallest ID goes first.
///
/// Mutual dependencies leave no ready vertex. When that happens the smallest
/// ID heading a cycle (nothing outside its cycle still points at it) is
/// emitted anyway and the sort carries on, so the cycle degrades to ID order
/// instead of failing the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StableTopo;

impl Orderer for StableTopo {
    fn order(&self, graph: &DependencyGraph, members: &BTreeSet<ModId>) -> Vec<ModId> {
        let mut in_degree: BTreeMap<&ModId, usize> = members.iter().map(|id| (id, 0)).collect();
        for id in members {
            for target in graph.dependencies_of(id) {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree += 1;
                }
            }
        }

        let mut ready: BTreeSet<&ModId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(members.len());

        while let Some(&first) = in_degree.keys().next() {
            let next = match ready.pop_first() {
                Some(id) => id,
                None => {
                    let stuck = in_degree
                        .keys()
                        .copied()
                        .find(|id| heads_cycle(graph, &in_degree, id))
                        .unwrap_or(first);
                    tracing::warn!("dependency cycle through {stuck}, falling back to id order");
                    stuck
                }
            };

            in_degree.remove(next);
            order.push(next.clone());

            for target in graph.dependencies_of(next) {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(target);
                    }
                }
            }
        }

        order
    }
}

/// True when every remaining vertex pointing at `id` is reachable from `id`,
/// i.e. `id` sits in a cycle nothing else still waits on.
fn heads_cycle(graph: &DependencyGraph, remaining: &BTreeMap<&ModId, usize>, id: &ModId) -> bool {
    let mut reach: BTreeSet<&ModId> = BTreeSet::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
        for target in graph.dependencies_of(current) {
            if remaining.contains_key(target) && reach.insert(target) {
                stack.push(target);
            }
        }
    }

    remaining
        .keys()
        .filter(|other| graph.dependencies_of(other).any(|target| target == id))
        .all(|other| reach.contains(*other))
}
