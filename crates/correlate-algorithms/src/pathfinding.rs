//! Pathfinding algorithms
//!
//! Breadth-first distance layering and a bounded, pruned depth-first chain
//! search between two nodes of an unweighted graph.

use super::common::GraphView;

/// One BFS layer: every node first discovered at `distance` hops from the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub distance: usize,
    pub nodes: Vec<usize>,
}

/// Breadth-first layering from `root`.
///
/// Layer 0 is the root itself. Each reachable node appears in exactly one
/// layer (first discovery wins). Within a layer nodes are ordered by count,
/// descending.
pub fn bfs_layers<K>(view: &GraphView<K>, root: usize) -> Vec<Layer> {
    if root >= view.node_count {
        return Vec::new();
    }

    let mut visited = vec![false; view.node_count];
    let mut layers = Vec::new();
    let mut frontier = vec![root];
    visited[root] = true;

    let mut distance = 0;
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &u in &frontier {
            for &v in view.neighbors(u) {
                if !visited[v] {
                    visited[v] = true;
                    next.push(v);
                }
            }
        }

        view.sort_by_count_desc(&mut frontier);
        layers.push(Layer {
            distance,
            nodes: frontier,
        });

        frontier = next;
        distance += 1;
    }

    layers
}

/// Limits for [`bounded_chain`]
#[derive(Debug, Clone, Copy)]
pub struct ChainLimits {
    /// Longest acceptable chain, in nodes (endpoints included)
    pub max_len: usize,
    /// Hard cap on the number of partial chains expanded
    pub max_expansions: usize,
}

/// A chain of `len` nodes whose last node is not adjacent to the target can
/// only complete by adding at least one more node and then the target.
pub fn budget_exhausted(len: usize, max_len: usize) -> bool {
    len + 2 > max_len
}

/// Whether a completion needing `extra` more nodes on top of `len` can still
/// be strictly shorter than the best chain found so far.
pub fn can_improve(len: usize, extra: usize, best: Option<usize>) -> bool {
    best.map_or(true, |best_len| len + extra < best_len)
}

/// Whether `candidate` touches an interior node of `chain` (anything but the
/// first and last node). Only applied once the chain has more than two nodes.
///
/// `on_chain[i]` must be true exactly for the nodes of `chain`, so the check
/// costs one pass over the candidate's neighbours rather than over the chain.
pub fn shortcuts_interior<K>(
    view: &GraphView<K>,
    chain: &[usize],
    on_chain: &[bool],
    candidate: usize,
) -> bool {
    let (Some(&first), Some(&last)) = (chain.first(), chain.last()) else {
        return false;
    };
    if chain.len() <= 2 {
        return false;
    }
    view.neighbors(candidate)
        .iter()
        .any(|&n| n != first && n != last && on_chain[n])
}

/// Candidates still to try below one chain node
struct Frame {
    candidates: Vec<usize>,
    next: usize,
}

struct ChainSearch<'v, K> {
    view: &'v GraphView<K>,
    target: usize,
    limits: ChainLimits,
    expansions: usize,
    best: Option<Vec<usize>>,
    chain: Vec<usize>,
    on_chain: Vec<bool>,
}

impl<'v, K> ChainSearch<'v, K> {
    fn best_len(&self) -> Option<usize> {
        self.best.as_ref().map(Vec::len)
    }

    fn offer(&mut self) {
        if can_improve(self.chain.len(), 0, self.best_len()) {
            self.best = Some(self.chain.clone());
        }
    }

    fn push(&mut self, node: usize) {
        self.chain.push(node);
        self.on_chain[node] = true;
    }

    fn pop(&mut self) {
        if let Some(node) = self.chain.pop() {
            self.on_chain[node] = false;
        }
    }

    /// Expand the chain's last node. Returns the frame of candidates to descend
    /// into, or `None` when this node is a dead end or completed the chain.
    fn expand(&mut self) -> Option<Frame> {
        if self.expansions >= self.limits.max_expansions {
            return None;
        }
        self.expansions += 1;

        let len = self.chain.len();
        let last = self.chain[len - 1];

        // Direct neighbour of the target: nothing through a sibling can be shorter
        if self.view.is_adjacent(last, self.target) {
            self.chain.push(self.target);
            self.offer();
            self.chain.pop();
            return None;
        }

        if budget_exhausted(len, self.limits.max_len) || !can_improve(len, 2, self.best_len()) {
            return None;
        }

        let mut candidates: Vec<usize> = self
            .view
            .neighbors(last)
            .iter()
            .copied()
            .filter(|&n| {
                !self.on_chain[n] && !shortcuts_interior(self.view, &self.chain, &self.on_chain, n)
            })
            .collect();
        self.view.sort_by_count_desc(&mut candidates);

        Some(Frame {
            candidates,
            next: 0,
        })
    }

    /// Next candidate of `frame` worth descending into, given the current best
    fn pick(&self, frame: &mut Frame) -> Option<usize> {
        let len = self.chain.len();
        while let Some(&n) = frame.candidates.get(frame.next) {
            frame.next += 1;
            // Cannot beat the best at all any more
            if !can_improve(len, 2, self.best_len()) {
                return None;
            }
            // Only a one-step completion can still win: do not descend further
            if !can_improve(len, 3, self.best_len()) && !self.view.is_adjacent(n, self.target) {
                continue;
            }
            return Some(n);
        }
        None
    }

    /// Depth-first walk on an explicit stack, one frame per chain node
    fn run(&mut self, source: usize) {
        self.push(source);
        let mut stack: Vec<Frame> = match self.expand() {
            Some(frame) => vec![frame],
            None => return,
        };

        while let Some(mut frame) = stack.pop() {
            let Some(n) = self.pick(&mut frame) else {
                self.pop();
                continue;
            };
            stack.push(frame);
            self.push(n);
            match self.expand() {
                Some(child) => stack.push(child),
                None => self.pop(),
            }
        }
    }
}

/// Bounded best-first chain search from `source` to `target`.
///
/// Returns a cycle-free chain `[source, .., target]` where consecutive nodes
/// are adjacent, or `None` when the endpoints are equal, out of range, or no
/// chain was found within `limits`. The search is a pruned depth-first walk,
/// so the chain is short but not guaranteed to be the shortest. When the
/// expansion cap is hit the best chain found so far is returned.
pub fn bounded_chain<K>(
    view: &GraphView<K>,
    source: usize,
    target: usize,
    limits: ChainLimits,
) -> Option<Vec<usize>> {
    if source == target || source >= view.node_count || target >= view.node_count {
        return None;
    }

    let mut search = ChainSearch {
        view,
        target,
        limits,
        expansions: 0,
        best: None,
        chain: Vec::new(),
        on_chain: vec![false; view.node_count],
    };
    search.run(source);
    search.best
}
