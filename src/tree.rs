//! The topology of tracked branches, derived from persisted parent pointers.
//!
//! Each tracked branch has exactly one persisted edge, `child -> parent`. The [StackGraph] holds the
//! full edge set alongside the derived [ChildMap], which is rebuilt on every load and never persisted.

use crate::{errors::StResult, store::ConfigStore};
use std::collections::{BTreeMap, HashSet};

/// A map of child branch name to parent branch name.
pub type ParentEdges = BTreeMap<String, String>;

/// A map of parent branch name to its children, in the order they were found in the edge set.
pub type ChildMap = BTreeMap<String, Vec<String>>;

/// Groups `edges` by parent.
///
/// Children are listed in the iteration order of `edges`, which for a [ParentEdges] map is
/// lexicographic by child name.
pub fn derive_child_map(edges: &ParentEdges) -> ChildMap {
    let mut children = ChildMap::new();
    for (child, parent) in edges {
        children
            .entry(parent.clone())
            .or_default()
            .push(child.clone());
    }
    children
}

/// Returns every branch reachable from `start` through `child_map`, excluding `start` itself.
///
/// The traversal is an iterative depth-first search with an explicit frontier and a visited set
/// seeded with `start`, so each branch is emitted at most once, the first time it is discovered,
/// even if a corrupted edge set reaches it twice or contains a cycle.
///
/// The result is in discovery order. It is **not** a topological order; callers that need parents
/// before children must sort it themselves (see [StackGraph::parent_first]).
pub fn find_descendants(start: &str, child_map: &ChildMap) -> Vec<String> {
    let mut descendants = Vec::new();
    let mut visited = HashSet::from([start.to_string()]);
    let mut frontier = vec![start.to_string()];

    while let Some(branch) = frontier.pop() {
        let Some(children) = child_map.get(&branch) else {
            continue;
        };
        for child in children {
            if visited.insert(child.clone()) {
                descendants.push(child.clone());
                frontier.push(child.clone());
            }
        }
    }

    descendants
}

/// Resolves the full set of branches to submit for `chain`, ordered base to tip.
///
/// A chain with no branches beyond its base is returned unchanged alongside an empty graph; this
/// is a no-op signal for the caller. Otherwise every descendant of the chain's tip is appended to
/// the chain, which is preserved as a prefix, and the graph of all persisted edges is returned
/// for downstream use.
pub fn full_stack_for_submit<S: ConfigStore + ?Sized>(
    store: &S,
    chain: Vec<String>,
) -> StResult<(Vec<String>, StackGraph)> {
    if chain.len() <= 1 {
        return Ok((chain, StackGraph::default()));
    }

    let graph = StackGraph::load(store)?;
    let Some(tip) = chain.last() else {
        return Ok((chain, graph));
    };

    let mut seen = chain.iter().cloned().collect::<HashSet<_>>();
    let mut full = chain.clone();
    for descendant in graph.descendants(tip) {
        if seen.insert(descendant.clone()) {
            full.push(descendant);
        }
    }

    Ok((full, graph))
}

/// A forest of tracked branches.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct StackGraph {
    /// Every persisted `child -> parent` edge.
    pub edges: ParentEdges,
    /// The derived `parent -> children` map.
    pub children: ChildMap,
}

impl StackGraph {
    /// Creates a new [StackGraph] from a set of edges.
    pub fn from_edges(edges: ParentEdges) -> Self {
        let children = derive_child_map(&edges);
        Self { edges, children }
    }

    /// Loads every persisted parent pointer from `store`.
    pub fn load<S: ConfigStore + ?Sized>(store: &S) -> StResult<Self> {
        Ok(Self::from_edges(store.parent_edges()?))
    }

    /// Returns the parent of `branch`, if it is tracked.
    pub fn parent(&self, branch: &str) -> Option<&str> {
        self.edges.get(branch).map(String::as_str)
    }

    /// Returns the children of `branch`.
    pub fn children(&self, branch: &str) -> &[String] {
        self.children.get(branch).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `true` if `branch` has a parent or any children.
    pub fn contains(&self, branch: &str) -> bool {
        self.edges.contains_key(branch) || self.children.contains_key(branch)
    }

    /// Returns the descendants of `branch`, in discovery order.
    pub fn descendants(&self, branch: &str) -> Vec<String> {
        find_descendants(branch, &self.children)
    }

    /// Returns the branches that have children but no parent.
    pub fn roots(&self) -> Vec<&str> {
        self.children
            .keys()
            .filter(|b| !self.edges.contains_key(*b))
            .map(String::as_str)
            .collect()
    }

    /// Walks parent pointers up from `branch` and returns the chain ordered base to tip.
    ///
    /// The walk stops at the first branch without a parent, or at the first branch seen twice.
    pub fn chain_to(&self, branch: &str) -> Vec<String> {
        let mut chain = vec![branch.to_string()];
        let mut visited = HashSet::from([branch]);

        let mut current = branch;
        while let Some(parent) = self.parent(current) {
            if !visited.insert(parent) {
                break;
            }
            chain.push(parent.to_string());
            current = parent;
        }

        chain.reverse();
        chain
    }

    /// Returns `true` if making `parent` the parent of `branch` would introduce a cycle.
    pub fn would_cycle(&self, branch: &str, parent: &str) -> bool {
        branch == parent || self.chain_to(parent).iter().any(|b| b == branch)
    }

    /// Reorders `branches` so that every branch follows its parent whenever both are present.
    ///
    /// The relative order of `branches` is otherwise preserved. Branches caught in a cycle are
    /// appended in their original order.
    pub fn parent_first(&self, branches: &[String]) -> Vec<String> {
        let members = branches.iter().map(String::as_str).collect::<HashSet<_>>();
        let mut placed = HashSet::new();
        let mut ordered = Vec::with_capacity(branches.len());

        loop {
            let before = ordered.len();
            for branch in branches {
                if placed.contains(branch.as_str()) {
                    continue;
                }
                let ready = match self.parent(branch) {
                    Some(parent) => !members.contains(parent) || placed.contains(parent),
                    None => true,
                };
                if ready {
                    placed.insert(branch.as_str());
                    ordered.push(branch.clone());
                }
            }
            if ordered.len() == before {
                break;
            }
        }

        ordered.extend(
            branches
                .iter()
                .filter(|b| !placed.contains(b.as_str()))
                .cloned(),
        );
        ordered
    }
}
