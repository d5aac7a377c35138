//! Backtracking lock-step BFS subgraph isomorphism search.
//!
//! The matcher walks the pattern graph and the subject graph in synchronized
//! BFS order from their output nodes. Each step pops the front of both
//! queues and asks the [`EquivalenceRegistry`] whether the node pair is
//! equivalent; every returned candidate forks the branch, records the
//! correspondence, and splices the candidate's resolved input nodes onto the
//! front of the subject queue to keep the walks aligned. A branch whose
//! pattern queue empties is a complete match; a branch whose query fails is
//! dropped.
//!
//! The search never mutates either graph: synthetic candidates are detached
//! values and all bookkeeping lives in per-branch [`GraphMatch`] clones.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use itertools::Itertools;

use graft_ir::{Graph, GraphId, OpNode, TensorInfo};

use crate::error::{ForeignGraphSnafu, Result};
use crate::morphism::Morphism;
use crate::registry::{Candidate, EquivalenceRegistry};

/// BFS over `graph` from the given seed nodes, following input edges,
/// visited-deduplicated. Returns node names in visit order.
pub fn bfs_queue(graph: &Graph, seeds: impl IntoIterator<Item = String>) -> Result<VecDeque<String>> {
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut pending: VecDeque<String> = VecDeque::new();
    let mut seen: HashSet<String> = HashSet::new();
    for seed in seeds {
        if seen.insert(seed.clone()) {
            pending.push_back(seed);
        }
    }
    while let Some(name) = pending.pop_front() {
        let op = graph.node(&name)?;
        for input in op.input_nodes(graph)? {
            if seen.insert(input.name().to_string()) {
                pending.push_back(input.name().to_string());
            }
        }
        queue.push_back(name);
    }
    Ok(queue)
}

/// The correspondence discovered by one accepted search branch.
///
/// Grown append-only while the branch advances: op names map to the matched
/// node on the other side, tensor names likewise, in both directions. Ops
/// matched through a morphism additionally record it under the pattern op's
/// name.
#[derive(Debug, Clone)]
pub struct GraphMatch {
    pattern_graph: GraphId,
    subject_graph: GraphId,
    pattern_to_subject_ops: BTreeMap<String, OpNode>,
    subject_to_pattern_ops: BTreeMap<String, OpNode>,
    pattern_to_subject_tensors: BTreeMap<String, TensorInfo>,
    subject_to_pattern_tensors: BTreeMap<String, TensorInfo>,
    morphisms: BTreeMap<String, Arc<dyn Morphism>>,
}

impl GraphMatch {
    fn new(pattern_graph: GraphId, subject_graph: GraphId) -> Self {
        Self {
            pattern_graph,
            subject_graph,
            pattern_to_subject_ops: BTreeMap::new(),
            subject_to_pattern_ops: BTreeMap::new(),
            pattern_to_subject_tensors: BTreeMap::new(),
            subject_to_pattern_tensors: BTreeMap::new(),
            morphisms: BTreeMap::new(),
        }
    }

    pub fn pattern_graph(&self) -> GraphId {
        self.pattern_graph
    }

    pub fn subject_graph(&self) -> GraphId {
        self.subject_graph
    }

    /// Number of matched pattern ops.
    pub fn len(&self) -> usize {
        self.pattern_to_subject_ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_to_subject_ops.is_empty()
    }

    /// The node matched for the named pattern op.
    pub fn subject_op(&self, pattern_op: &str) -> Option<&OpNode> {
        self.pattern_to_subject_ops.get(pattern_op)
    }

    /// The pattern op a subject node was matched to.
    pub fn pattern_op(&self, subject_op: &str) -> Option<&OpNode> {
        self.subject_to_pattern_ops.get(subject_op)
    }

    /// The tensor matched for the named pattern tensor.
    pub fn subject_tensor(&self, pattern_tensor: &str) -> Option<&TensorInfo> {
        self.pattern_to_subject_tensors.get(pattern_tensor)
    }

    /// The pattern tensor a subject tensor was matched to.
    pub fn pattern_tensor(&self, subject_tensor: &str) -> Option<&TensorInfo> {
        self.subject_to_pattern_tensors.get(subject_tensor)
    }

    /// The morphism that justified the pairing of the named pattern op, if
    /// the pairing was structural rather than exact.
    pub fn morphism_for(&self, pattern_op: &str) -> Option<&Arc<dyn Morphism>> {
        self.morphisms.get(pattern_op)
    }

    pub fn pattern_to_subject_ops(&self) -> &BTreeMap<String, OpNode> {
        &self.pattern_to_subject_ops
    }

    pub fn subject_to_pattern_ops(&self) -> &BTreeMap<String, OpNode> {
        &self.subject_to_pattern_ops
    }

    pub fn pattern_to_subject_tensors(&self) -> &BTreeMap<String, TensorInfo> {
        &self.pattern_to_subject_tensors
    }

    pub fn subject_to_pattern_tensors(&self) -> &BTreeMap<String, TensorInfo> {
        &self.subject_to_pattern_tensors
    }

    /// Record one accepted pairing: the op pair plus the pairwise zip of the
    /// two input tensor lists.
    fn record(&mut self, pattern_op: &OpNode, candidate: &Candidate) {
        let matched = candidate.op();
        self.pattern_to_subject_ops.insert(pattern_op.name().to_string(), matched.clone());
        self.subject_to_pattern_ops.insert(matched.name().to_string(), pattern_op.clone());
        for (p, s) in pattern_op.input_tensors().iter().zip(matched.input_tensors()) {
            self.pattern_to_subject_tensors.insert(p.name().to_string(), s.clone());
            self.subject_to_pattern_tensors.insert(s.name().to_string(), p.clone());
        }
        if let Some(morphism) = candidate.morphism() {
            self.morphisms.insert(pattern_op.name().to_string(), Arc::clone(morphism));
        }
    }
}

/// A queue entry: a node name plus the graph it lives in. Identity-candidate
/// branches walk pattern nodes through the subject queue, so entries must
/// remember which graph resolves them.
#[derive(Debug, Clone)]
struct NodeRef {
    graph: GraphId,
    name: String,
}

/// One in-flight search branch.
#[derive(Debug, Clone)]
struct MatchState {
    found: GraphMatch,
    subject_queue: VecDeque<NodeRef>,
    pattern_queue: VecDeque<String>,
}

impl MatchState {
    /// Complete when every pattern node has been consumed.
    fn is_done(&self) -> bool {
        self.pattern_queue.is_empty()
    }
}

/// Subgraph matcher for one pattern graph.
pub struct GraphMatcher<'r> {
    pattern: Graph,
    registry: &'r EquivalenceRegistry,
}

impl<'r> GraphMatcher<'r> {
    pub fn new(pattern: Graph, registry: &'r EquivalenceRegistry) -> Self {
        Self { pattern, registry }
    }

    pub fn pattern(&self) -> &Graph {
        &self.pattern
    }

    /// Lazily enumerate matches of the pattern inside `subject`.
    pub fn matches<'a>(&'a self, subject: &'a Graph) -> Matches<'a> {
        let mut init_error = None;
        let mut seeds = None;
        let mut pattern_queue = VecDeque::new();

        match self.seed_pools(subject) {
            Ok(Some(pools)) => {
                match bfs_queue(&self.pattern, self.pattern.output_nodes().to_vec()) {
                    Ok(queue) => {
                        pattern_queue = queue;
                        seeds = Some(pools.into_iter().multi_cartesian_product());
                    }
                    Err(e) => init_error = Some(e),
                }
            }
            // some pattern output type has no subject occurrence: no match
            Ok(None) => {}
            Err(e) => init_error = Some(e),
        }

        Matches {
            matcher: self,
            subject,
            pattern_queue,
            seeds,
            stack: Vec::new(),
            init_error,
        }
    }

    /// Up to `n` matches, searching no further than needed.
    pub fn match_n(&self, subject: &Graph, n: usize) -> Result<Vec<GraphMatch>> {
        self.matches(subject).take(n).collect()
    }

    /// Every match in `subject`.
    pub fn match_all(&self, subject: &Graph) -> Result<Vec<GraphMatch>> {
        self.matches(subject).collect()
    }

    /// Per-pattern-output candidate name pools from the subject's type
    /// index. `None` when some output type has no occurrence at all.
    fn seed_pools(&self, subject: &Graph) -> Result<Option<Vec<Vec<String>>>> {
        let mut pools = Vec::new();
        for op in self.pattern.output_ops()? {
            let candidates: Vec<String> =
                subject.get_ops_by_type(op.op_type()).iter().map(|c| c.name().to_string()).collect();
            if candidates.is_empty() {
                tracing::debug!(op_type = op.op_type(), "pattern output type absent from subject");
                return Ok(None);
            }
            pools.push(candidates);
        }
        Ok(Some(pools))
    }
}

/// Lazy match enumeration. Branches are expanded depth-first off a stack;
/// exhausted seeds pull the next output-node binding from the cartesian
/// product.
pub struct Matches<'a> {
    matcher: &'a GraphMatcher<'a>,
    subject: &'a Graph,
    pattern_queue: VecDeque<String>,
    seeds: Option<itertools::structs::MultiProduct<std::vec::IntoIter<String>>>,
    stack: Vec<MatchState>,
    init_error: Option<crate::error::Error>,
}

impl Matches<'_> {
    fn graph_of(&self, id: GraphId) -> Result<&Graph> {
        if id == self.matcher.pattern.id() {
            Ok(&self.matcher.pattern)
        } else if id == self.subject.id() {
            Ok(self.subject)
        } else {
            ForeignGraphSnafu { id }.fail()
        }
    }

    /// Advance one branch a single lock-step step, forking per candidate.
    fn visit(&self, mut state: MatchState) -> Result<Vec<MatchState>> {
        let Some(subject_ref) = state.subject_queue.pop_front() else {
            // subject side exhausted before the pattern: dead branch
            return Ok(Vec::new());
        };
        let Some(pattern_name) = state.pattern_queue.pop_front() else {
            return Ok(Vec::new());
        };

        let subject_op = self.graph_of(subject_ref.graph)?.node(&subject_ref.name)?;
        let pattern_op = self.matcher.pattern.node(&pattern_name)?;

        let Some(candidates) = self.matcher.registry.query(subject_op, pattern_op) else {
            tracing::trace!(subject = %subject_ref.name, pattern = %pattern_name, "not equivalent; branch dropped");
            return Ok(Vec::new());
        };

        let mut forks = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let candidate_graph = self.graph_of(candidate.op().graph())?;
            let inputs = candidate.input_nodes(candidate_graph)?;

            let mut found = state.found.clone();
            found.record(pattern_op, &candidate);

            // Splice: the candidate's resolved input nodes replace the next
            // BFS-discovered entries, keeping both walks aligned (and
            // applying the candidate's input order, e.g. a permutation).
            let mut subject_queue = state.subject_queue.clone();
            for _ in 0..inputs.len() {
                subject_queue.pop_front();
            }
            for input in inputs.iter().rev() {
                subject_queue.push_front(NodeRef { graph: candidate.op().graph(), name: input.name().to_string() });
            }

            forks.push(MatchState { found, subject_queue, pattern_queue: state.pattern_queue.clone() });
        }
        Ok(forks)
    }
}

impl Iterator for Matches<'_> {
    type Item = Result<GraphMatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.init_error.take() {
            return Some(Err(e));
        }
        loop {
            if let Some(state) = self.stack.pop() {
                if state.is_done() {
                    tracing::debug!(matched_ops = state.found.len(), "match accepted");
                    return Some(Ok(state.found));
                }
                match self.visit(state) {
                    Ok(forks) => self.stack.extend(forks),
                    Err(e) => return Some(Err(e)),
                }
                continue;
            }

            // Pull the next output-node binding and seed a fresh branch.
            let seed = self.seeds.as_mut()?.next()?;
            let subject_queue = match bfs_queue(self.subject, seed) {
                Ok(queue) => queue,
                Err(e) => return Some(Err(e)),
            };
            let subject_id = self.subject.id();
            self.stack.push(MatchState {
                found: GraphMatch::new(self.matcher.pattern.id(), subject_id),
                subject_queue: subject_queue
                    .into_iter()
                    .map(|name| NodeRef { graph: subject_id, name })
                    .collect(),
                pattern_queue: self.pattern_queue.clone(),
            });
        }
    }
}
