//! The equivalence registry: which op pairings count as a match.
//!
//! The registry is an explicit object built once at startup and passed by
//! reference into the matcher; it is read-only while a search runs. It holds
//! two tables: legal input permutations for associative/commutative op types,
//! and morphisms making one op type substitutable for another.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;
use snafu::ensure;

use graft_ir::{Graph, OpNode, PLACEHOLDER_OP_TYPE};

use crate::error::{
    DuplicateAssociationSnafu, DuplicateMorphismSnafu, EmptyPermutationSetSnafu, InvalidPermutationSnafu, Result,
};
use crate::morphism::{MetaOpInfo, Morphism};

type Permutation = SmallVec<[usize; 4]>;

/// One way a subject op can continue a match branch.
///
/// Plain candidates are ordinary nodes (the pattern node itself for exact
/// pairings, synthetic permuted clones for associative ones, the subject
/// node for free-input pairings); morphed candidates carry the morphism that
/// justified the pairing.
#[derive(Debug, Clone)]
pub enum Candidate {
    Node(OpNode),
    Morphed(MetaOpInfo),
}

impl Candidate {
    pub fn op(&self) -> &OpNode {
        match self {
            Candidate::Node(op) => op,
            Candidate::Morphed(meta) => meta.op(),
        }
    }

    pub fn morphism(&self) -> Option<&Arc<dyn Morphism>> {
        match self {
            Candidate::Node(_) => None,
            Candidate::Morphed(meta) => Some(meta.morphism()),
        }
    }

    /// Resolved input nodes, against the graph the candidate belongs to.
    pub fn input_nodes<'g>(&self, graph: &'g Graph) -> graft_ir::Result<Vec<&'g OpNode>> {
        self.op().input_nodes(graph)
    }
}

/// Registry of op-type equivalences.
#[derive(Debug, Default)]
pub struct EquivalenceRegistry {
    /// op_type -> legal input permutations.
    associations: HashMap<String, Vec<Permutation>>,
    /// op_type -> {other op_type -> morphism}.
    morphisms: HashMap<String, HashMap<String, Arc<dyn Morphism>>>,
}

impl EquivalenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the legal input reorderings of an associative/commutative op
    /// type. Registration is once per op type; each entry must be a true
    /// permutation of `0..k`.
    pub fn register_association(
        &mut self,
        op_type: impl Into<String>,
        permutations: impl IntoIterator<Item = Vec<usize>>,
    ) -> Result<&mut Self> {
        let op_type = op_type.into();
        ensure!(!self.associations.contains_key(&op_type), DuplicateAssociationSnafu { op_type });
        let permutations: Vec<Permutation> = permutations.into_iter().map(SmallVec::from_vec).collect();
        ensure!(!permutations.is_empty(), EmptyPermutationSetSnafu { op_type });
        for perm in &permutations {
            let mut sorted: Vec<usize> = perm.to_vec();
            sorted.sort_unstable();
            ensure!(
                sorted.iter().enumerate().all(|(i, &p)| i == p),
                InvalidPermutationSnafu { op_type, permutation: perm.to_vec(), arity: perm.len() }
            );
        }
        tracing::debug!(op_type = %op_type, permutations = permutations.len(), "associativity registered");
        self.associations.insert(op_type, permutations);
        Ok(self)
    }

    /// Declare that ops of `op_type` can stand in for `other_op_type`
    /// through the given morphism. One morphism per type pair.
    pub fn register_compatibility(
        &mut self,
        op_type: impl Into<String>,
        other_op_type: impl Into<String>,
        morphism: Arc<dyn Morphism>,
    ) -> Result<&mut Self> {
        let op_type = op_type.into();
        let other_op_type = other_op_type.into();
        let table = self.morphisms.entry(op_type.clone()).or_default();
        ensure!(!table.contains_key(&other_op_type), DuplicateMorphismSnafu { op_type, other_op_type });
        tracing::debug!(from = %op_type, to = %other_op_type, morphism = morphism.name(), "compatibility registered");
        table.insert(other_op_type, morphism);
        Ok(self)
    }

    pub fn permutations(&self, op_type: &str) -> Option<&[Permutation]> {
        self.associations.get(op_type).map(Vec::as_slice)
    }

    /// Decide whether `subject` can be matched against `pattern`.
    ///
    /// `None` means not equivalent. Otherwise each returned candidate seeds
    /// one search branch:
    /// - same type, no associativity: the pattern node itself, an identity
    ///   placeholder for the match bookkeeping;
    /// - same type, associativity: one synthetic subject clone per
    ///   registered permutation (entries whose length does not fit the
    ///   subject's arity are skipped);
    /// - pattern type in the subject type's compatibility table: the subject
    ///   wrapped with the registered morphism;
    /// - a free-input pattern node (placeholder without inputs) matches any
    ///   subject unchanged.
    pub fn query(&self, subject: &OpNode, pattern: &OpNode) -> Option<Vec<Candidate>> {
        if subject.op_type() == pattern.op_type() {
            let Some(permutations) = self.associations.get(subject.op_type()) else {
                return Some(vec![Candidate::Node(pattern.clone())]);
            };
            let mut candidates = Vec::with_capacity(permutations.len());
            for perm in permutations {
                match subject.with_permuted_inputs(perm) {
                    Ok(node) => candidates.push(Candidate::Node(node)),
                    Err(_) => {
                        tracing::warn!(
                            op_type = subject.op_type(),
                            permutation = ?perm,
                            arity = subject.input_tensors().len(),
                            "skipping permutation that does not fit the subject's arity"
                        );
                    }
                }
            }
            return Some(candidates);
        }

        if let Some(morphism) = self.morphisms.get(subject.op_type()).and_then(|t| t.get(pattern.op_type())) {
            let meta = MetaOpInfo::new(subject.clone(), Arc::clone(morphism));
            return Some(vec![Candidate::Morphed(meta)]);
        }

        if pattern.input_tensors().is_empty() && pattern.op_type() == PLACEHOLDER_OP_TYPE {
            return Some(vec![Candidate::Node(subject.clone())]);
        }

        None
    }
}
