//! The bidirectional instantiation graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use hdlmap_diagnostics::{codes, Diagnostic};
use hdlmap_scan::{Instantiation, Module};
use hdlmap_source::Span;
use petgraph::algo::{condensation, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

/// An instantiation whose child is not a declared module.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UnresolvedRef {
    /// Instantiating module.
    pub parent: String,
    /// Referenced name as written.
    pub child: String,
}

/// Forward and inverse adjacency over module names.
///
/// `b` is in `children(a)` exactly when `a` is in `parents(b)`. The graph is
/// immutable once built.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DependencyGraph {
    forward: BTreeMap<String, BTreeSet<String>>,
    inverse: BTreeMap<String, BTreeSet<String>>,
    #[serde(skip)]
    unresolved: BTreeSet<UnresolvedRef>,
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

impl DependencyGraph {
    /// Builds the graph from a project's modules and instantiations.
    ///
    /// Only resolved instantiations between known modules become edges;
    /// self-instantiation and repeated instantiation collapse away.
    pub fn build(modules: &[Module], instantiations: &[Instantiation]) -> Self {
        let mut graph = Self::default();
        for m in modules {
            graph.forward.entry(m.name.clone()).or_default();
            graph.inverse.entry(m.name.clone()).or_default();
        }

        for inst in instantiations {
            if !inst.resolved {
                graph.unresolved.insert(UnresolvedRef {
                    parent: inst.parent.clone(),
                    child: inst.child.clone(),
                });
                continue;
            }
            if inst.parent == inst.child
                || !graph.forward.contains_key(&inst.parent)
                || !graph.forward.contains_key(&inst.child)
            {
                continue;
            }
            if let Some(children) = graph.forward.get_mut(&inst.parent) {
                children.insert(inst.child.clone());
            }
            if let Some(parents) = graph.inverse.get_mut(&inst.child) {
                parents.insert(inst.parent.clone());
            }
        }

        tracing::debug!(
            nodes = graph.forward.len(),
            edges = graph.edge_count(),
            unresolved = graph.unresolved.len(),
            "built dependency graph"
        );
        graph
    }

    /// Returns `true` if `name` is a node.
    pub fn contains(&self, name: &str) -> bool {
        self.forward.contains_key(name)
    }

    /// Iterates over node names in sorted order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.forward.keys().map(String::as_str)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Distinct modules instantiated by `name`.
    pub fn children(&self, name: &str) -> &BTreeSet<String> {
        self.forward.get(name).unwrap_or(&EMPTY)
    }

    /// Distinct modules instantiating `name`.
    pub fn parents(&self, name: &str) -> &BTreeSet<String> {
        self.inverse.get(name).unwrap_or(&EMPTY)
    }

    /// Number of distinct parents.
    pub fn fan_in(&self, name: &str) -> usize {
        self.parents(name).len()
    }

    /// Number of distinct resolved children.
    pub fn fan_out(&self, name: &str) -> usize {
        self.children(name).len()
    }

    /// Nodes nobody instantiates, in sorted order.
    pub fn roots(&self) -> Vec<&str> {
        self.inverse
            .iter()
            .filter(|(_, parents)| parents.is_empty())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Instantiations that did not resolve to a declared module.
    pub fn unresolved(&self) -> &BTreeSet<UnresolvedRef> {
        &self.unresolved
    }

    /// Every node reachable from `start`, including `start`, in BFS order.
    ///
    /// Returns an empty list for unknown names.
    pub fn reachable_from(&self, start: &str) -> Vec<String> {
        if !self.contains(start) {
            return Vec::new();
        }
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen.insert(start);
        while let Some(name) = queue.pop_front() {
            order.push(name.to_string());
            for child in self.children(name) {
                if seen.insert(child.as_str()) {
                    queue.push_back(child.as_str());
                }
            }
        }
        order
    }

    fn to_petgraph(&self) -> (DiGraph<&str, ()>, BTreeMap<&str, NodeIndex>) {
        let mut g = DiGraph::new();
        let index: BTreeMap<&str, NodeIndex> = self
            .forward
            .keys()
            .map(|name| (name.as_str(), g.add_node(name.as_str())))
            .collect();
        for (parent, children) in &self.forward {
            for child in children {
                g.add_edge(index[parent.as_str()], index[child.as_str()], ());
            }
        }
        (g, index)
    }

    /// Instantiation cycles: strongly connected components with more than one
    /// module, each sorted, listed in order of their first member.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let (g, _) = self.to_petgraph();
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&g)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut names: Vec<String> = scc.iter().map(|&i| g[i].to_string()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// `W202` warnings, one per instantiation cycle.
    pub fn cycle_diagnostics(&self, modules: &[Module]) -> Vec<Diagnostic> {
        self.cycles()
            .into_iter()
            .map(|cycle| {
                let first = modules.iter().find(|m| m.name == cycle[0]);
                let span = first.map_or(Span::DUMMY, |m| m.span);
                let mut diag = Diagnostic::warning(
                    codes::INSTANTIATION_CYCLE,
                    format!("modules instantiate each other in a cycle: {}", cycle.join(" -> ")),
                    span,
                )
                .with_note("cycle members still count as each other's parents when scoring");
                if let Some(m) = first {
                    diag = diag.with_path(m.file.clone());
                }
                diag
            })
            .collect()
    }

    /// Longest instantiation chain below `start`, counting each cycle as one
    /// level. A leaf has depth 0; unknown names have depth 0.
    pub fn depth_from(&self, start: &str) -> usize {
        let (g, index) = self.to_petgraph();
        let Some(&start_idx) = index.get(start) else {
            return 0;
        };
        // Map each original node to its component in the condensed DAG.
        let condensed = condensation(g.clone(), true);
        let mut component = BTreeMap::new();
        for c in condensed.node_indices() {
            for name in &condensed[c] {
                component.insert(*name, c);
            }
        }
        let Some(&root) = component.get(&g[start_idx]) else {
            return 0;
        };

        let mut memo: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        // Post-order over the DAG without recursion.
        let mut stack = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if memo.contains_key(&node) {
                continue;
            }
            if expanded {
                let depth = condensed
                    .neighbors(node)
                    .filter_map(|n| memo.get(&n))
                    .map(|d| d + 1)
                    .max()
                    .unwrap_or(0);
                memo.insert(node, depth);
            } else {
                stack.push((node, true));
                for n in condensed.neighbors(node) {
                    if !memo.contains_key(&n) {
                        stack.push((n, false));
                    }
                }
            }
        }
        memo.get(&root).copied().unwrap_or(0)
    }
}
