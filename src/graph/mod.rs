//! Dependency graph over the loaded mods.
//!
//! Vertices are mod IDs. An edge `a -> b` means `a` declares a dependency
//! on `b`. The graph keeps both the directed adjacency (for ordering) and
//! its undirected closure (for clustering).

pub mod cluster;
pub mod order;

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::model::descriptor::{Component, ModId, PluginDescriptor};

pub use cluster::{Clusterer, UndirectedReach};
pub use order::{Orderer, StableTopo};

/// Dependency targets that name the game itself rather than a mod.
pub const VIRTUAL_IDS: [&str; 4] = ["game", "survival", "creative", "vanilla"];

pub fn is_virtual(id: &ModId) -> bool {
    VIRTUAL_IDS.contains(&id.as_str())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("mod id `{id}` is declared by both {first} and {second}")]
    DuplicateId {
        id: ModId,
        first: String,
        second: String,
    },
    #[error("{archive} ({id}) depends on `{dependency}`, which is not installed")]
    UnknownDependency {
        id: ModId,
        archive: String,
        dependency: ModId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DependencyEdge<'a> {
    pub from: &'a ModId,
    pub to: &'a ModId,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    descriptors: BTreeMap<ModId, PluginDescriptor>,
    directed: BTreeMap<ModId, BTreeSet<ModId>>,
    undirected: BTreeMap<ModId, BTreeSet<ModId>>,
}

impl DependencyGraph {
    pub fn build(
        descriptors: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::default();

        for descriptor in descriptors {
            if let Some(existing) = graph.descriptors.get(&descriptor.id) {
                return Err(GraphError::DuplicateId {
                    id: descriptor.id.clone(),
                    first: existing.source.clone(),
                    second: descriptor.source,
                });
            }
            graph.directed.insert(descriptor.id.clone(), BTreeSet::new());
            graph.undirected.insert(descriptor.id.clone(), BTreeSet::new());
            graph.descriptors.insert(descriptor.id.clone(), descriptor);
        }

        for descriptor in graph.descriptors.values() {
            for dependency in descriptor.dependencies.keys() {
                if is_virtual(dependency) {
                    continue;
                }
                if !graph.descriptors.contains_key(dependency) {
                    return Err(GraphError::UnknownDependency {
                        id: descriptor.id.clone(),
                        archive: descriptor.source.clone(),
                        dependency: dependency.clone(),
                    });
                }
                if dependency == &descriptor.id {
                    tracing::warn!("{} lists itself as a dependency, ignoring", descriptor.id);
                    continue;
                }

                tracing::debug!("edge {} -> {}", descriptor.id, dependency);
                if let Some(targets) = graph.directed.get_mut(&descriptor.id) {
                    targets.insert(dependency.clone());
                }
                if let Some(targets) = graph.undirected.get_mut(&descriptor.id) {
                    targets.insert(dependency.clone());
                }
                if let Some(targets) = graph.undirected.get_mut(dependency) {
                    targets.insert(descriptor.id.clone());
                }
            }
        }

        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Vertex IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &ModId> {
        self.descriptors.keys()
    }

    /// IDs `id` depends on directly.
    pub fn dependencies_of(&self, id: &ModId) -> impl Iterator<Item = &ModId> {
        self.directed.get(id).into_iter().flatten()
    }

    /// IDs sharing a dependency edge with `id` in either direction.
    pub fn neighbours(&self, id: &ModId) -> impl Iterator<Item = &ModId> {
        self.undirected.get(id).into_iter().flatten()
    }

    /// Every directed edge, sorted by `(from, to)`.
    pub fn edges(&self) -> Vec<DependencyEdge<'_>> {
        self.directed
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| DependencyEdge { from, to }))
            .collect()
    }

    /// Clusters the graph and orders each cluster. Components come out
    /// smallest first, ties broken by their smallest member ID.
    pub fn components(&self, clusterer: &dyn Clusterer, orderer: &dyn Orderer) -> Vec<Component> {
        let mut components: Vec<Component> = clusterer
            .clusters(self)
            .into_iter()
            .map(|members| {
                let ordered = orderer.order(self, &members);
                Component::new(
                    ordered
                        .iter()
                        .filter_map(|id| self.descriptors.get(id).cloned())
                        .collect(),
                )
            })
            .collect();

        components.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.min_id().cmp(&b.min_id())));
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn descriptor(id: &str) -> PluginDescriptor {
        PluginDescriptor::new(id, format!("{id}.zip"))
    }

    fn edge_pairs(graph: &DependencyGraph) -> Vec<(String, String)> {
        graph
            .edges()
            .into_iter()
            .map(|edge| (edge.from.0.clone(), edge.to.0.clone()))
            .collect()
    }

    fn component_ids(components: &[Component]) -> Vec<Vec<String>> {
        components
            .iter()
            .map(|component| component.ids().map(|id| id.0.clone()).collect())
            .collect()
    }

    #[test]
    fn builds_directed_and_undirected_edges() {
        let graph = DependencyGraph::build([
            descriptor("a").depends_on("b", "1.0"),
            descriptor("b"),
        ])
        .unwrap();

        assert_eq!(edge_pairs(&graph), vec![("a".into(), "b".into())]);
        let b = ModId::new("b");
        assert_eq!(graph.dependencies_of(&b).count(), 0);
        assert_eq!(
            graph.neighbours(&b).cloned().collect::<Vec<_>>(),
            vec![ModId::new("a")]
        );
    }

    #[test]
    fn virtual_dependencies_never_become_vertices() {
        let graph = DependencyGraph::build([descriptor("a")
            .depends_on("game", "1.19.0")
            .depends_on("survival", "")])
        .unwrap();

        assert!(graph.edges().is_empty());
        assert!(graph.ids().all(|id| id.as_str() == "a"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn unknown_dependency_fails_the_build() {
        let err = DependencyGraph::build([descriptor("a").depends_on("missing", "1.0")])
            .unwrap_err();

        assert_eq!(
            err,
            GraphError::UnknownDependency {
                id: ModId::new("a"),
                archive: "a.zip".into(),
                dependency: ModId::new("missing"),
            }
        );
    }

    #[test]
    fn duplicate_ids_fail_the_build() {
        let err = DependencyGraph::build([
            PluginDescriptor::new("a", "first.zip"),
            PluginDescriptor::new("a", "second.zip"),
        ])
        .unwrap_err();

        assert!(matches!(err, GraphError::DuplicateId { .. }));
        assert!(err.to_string().contains("first.zip"));
        assert!(err.to_string().contains("second.zip"));
    }

    #[test]
    fn self_dependency_adds_no_edge() {
        let graph = DependencyGraph::build([descriptor("a").depends_on("a", "1.0")]).unwrap();
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn rebuilding_yields_identical_edges() {
        let input = vec![
            descriptor("c").depends_on("d", ""),
            descriptor("a").depends_on("b", "").depends_on("d", ""),
            descriptor("b"),
            descriptor("d"),
        ];

        let first = DependencyGraph::build(input.clone()).unwrap();
        let mut reversed = input;
        reversed.reverse();
        let second = DependencyGraph::build(reversed).unwrap();

        assert_eq!(edge_pairs(&first), edge_pairs(&second));
    }

    #[test]
    fn five_mod_scenario_groups_into_three_components() {
        let graph = DependencyGraph::build([
            descriptor("A").depends_on("B", ""),
            descriptor("B"),
            descriptor("C").depends_on("D", ""),
            descriptor("D"),
            descriptor("E"),
        ])
        .unwrap();

        let components = graph.components(&UndirectedReach, &StableTopo);
        assert_eq!(
            component_ids(&components),
            vec![
                vec!["E".to_string()],
                vec!["A".to_string(), "B".to_string()],
                vec!["C".to_string(), "D".to_string()],
            ]
        );
    }

    #[test]
    fn empty_input_has_no_components() {
        let graph = DependencyGraph::build(Vec::new()).unwrap();
        assert!(graph.is_empty());
        assert!(graph.components(&UndirectedReach, &StableTopo).is_empty());
    }

    #[test]
    fn components_are_reproducible_across_input_orders() {
        let input = vec![
            descriptor("lib").depends_on("core", ""),
            descriptor("ui").depends_on("lib", ""),
            descriptor("core"),
            descriptor("solo"),
            descriptor("x").depends_on("y", ""),
            descriptor("y").depends_on("x", ""),
        ];

        let expected = component_ids(
            &DependencyGraph::build(input.clone())
                .unwrap()
                .components(&UndirectedReach, &StableTopo),
        );

        let mut shuffled = input;
        shuffled.rotate_left(3);
        shuffled.swap(0, 4);
        let again = component_ids(
            &DependencyGraph::build(shuffled)
                .unwrap()
                .components(&UndirectedReach, &StableTopo),
        );

        assert_eq!(expected, again);
        assert_eq!(
            expected,
            vec![
                vec!["solo".to_string()],
                vec!["x".to_string(), "y".to_string()],
                vec!["ui".to_string(), "lib".to_string(), "core".to_string()],
            ]
        );
    }
}
