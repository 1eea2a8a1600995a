//! Directed graph capability used by the event dependency graph.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// The graph operations the event checks need.
///
/// Nodes are identified by string ids; inserting an edge inserts missing
/// endpoints. Duplicate edges collapse into one.
pub trait DependencyGraph {
    fn add_node(&mut self, id: &str);
    fn add_edge(&mut self, from: &str, to: &str);
    fn contains(&self, id: &str) -> bool;
    /// Node ids in insertion order.
    fn node_ids(&self) -> Vec<String>;
    fn in_degree(&self, id: &str) -> usize;
    fn out_degree(&self, id: &str) -> usize;
    /// Directed cycles, each listed from its entry node around to the node
    /// that closes it.
    fn cycles(&self) -> Vec<Vec<String>>;
    /// Every node that can reach `id`.
    fn ancestors(&self, id: &str) -> Vec<String>;
    /// Every node reachable from `id`.
    fn descendants(&self, id: &str) -> Vec<String>;
    /// Over every root ancestor (in-degree 0) of `id`, the shortest path
    /// length to `id`; the largest of those. 0 when no root reaches it.
    fn root_depth(&self, id: &str) -> usize;
}

/// Index-based adjacency-list backend.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    ids: Vec<String>,
    index: FxHashMap<String, usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    fn intern(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    /// Iterative DFS over `edges` from `start`, excluding `start` itself.
    fn reach_indices(&self, start: usize, edges: &[Vec<usize>]) -> Vec<usize> {
        let mut seen = FxHashSet::default();
        let mut stack = edges[start].clone();
        let mut found = Vec::new();
        while let Some(node) = stack.pop() {
            if node == start || !seen.insert(node) {
                continue;
            }
            found.push(node);
            stack.extend(edges[node].iter().copied());
        }
        found.sort_unstable();
        found
    }

    fn reach(&self, start: usize, edges: &[Vec<usize>]) -> Vec<String> {
        self.reach_indices(start, edges)
            .into_iter()
            .map(|i| self.ids[i].clone())
            .collect()
    }

    /// Edge count of the shortest path `from` -> `to`, by BFS.
    fn shortest_distance(&self, from: usize, to: usize) -> Option<usize> {
        let mut dist: Vec<Option<usize>> = vec![None; self.ids.len()];
        let mut queue = VecDeque::from([from]);
        dist[from] = Some(0);
        while let Some(node) = queue.pop_front() {
            let d = dist[node]?;
            if node == to {
                return Some(d);
            }
            for &next in &self.outgoing[node] {
                if dist[next].is_none() {
                    dist[next] = Some(d + 1);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}

impl DependencyGraph for AdjacencyGraph {
    fn add_node(&mut self, id: &str) {
        self.intern(id);
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let a = self.intern(from);
        let b = self.intern(to);
        if !self.outgoing[a].contains(&b) {
            self.outgoing[a].push(b);
            self.incoming[b].push(a);
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    fn node_ids(&self) -> Vec<String> {
        self.ids.clone()
    }

    fn in_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&i| self.incoming[i].len())
    }

    fn out_degree(&self, id: &str) -> usize {
        self.index.get(id).map_or(0, |&i| self.outgoing[i].len())
    }

    fn cycles(&self) -> Vec<Vec<String>> {
        let n = self.ids.len();
        let mut color = vec![Color::White; n];
        let mut cycles = Vec::new();

        for root in 0..n {
            if color[root] != Color::White {
                continue;
            }
            // Explicit stack of (node, next edge to visit) plus the gray path.
            let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
            let mut path: Vec<usize> = vec![root];
            color[root] = Color::Gray;

            while let Some(&(node, next)) = stack.last() {
                if let Some(&succ) = self.outgoing[node].get(next) {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match color[succ] {
                        Color::White => {
                            color[succ] = Color::Gray;
                            stack.push((succ, 0));
                            path.push(succ);
                        }
                        Color::Gray => {
                            if let Some(pos) = path.iter().position(|&p| p == succ) {
                                cycles.push(
                                    path[pos..].iter().map(|&i| self.ids[i].clone()).collect(),
                                );
                            }
                        }
                        Color::Black => {}
                    }
                } else {
                    color[node] = Color::Black;
                    stack.pop();
                    path.pop();
                }
            }
        }
        cycles
    }

    fn ancestors(&self, id: &str) -> Vec<String> {
        match self.index.get(id) {
            Some(&i) => self.reach(i, &self.incoming),
            None => Vec::new(),
        }
    }

    fn descendants(&self, id: &str) -> Vec<String> {
        match self.index.get(id) {
            Some(&i) => self.reach(i, &self.outgoing),
            None => Vec::new(),
        }
    }

    fn root_depth(&self, id: &str) -> usize {
        let Some(&target) = self.index.get(id) else {
            return 0;
        };
        self.reach_indices(target, &self.incoming)
            .into_iter()
            .filter(|&a| self.incoming[a].is_empty())
            .filter_map(|root| self.shortest_distance(root, target))
            .max()
            .unwrap_or(0)
    }
}
