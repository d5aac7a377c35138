use snafu::Snafu;

use graft_ir::GraphId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Matcher error kinds: registration-time validation and consistency
/// failures, plus IR errors surfaced while resolving graphs during a search.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Associativity may be registered once per op type.
    #[snafu(display("duplicate associativity definition for op type `{op_type}`"))]
    DuplicateAssociation { op_type: String },

    /// One morphism per (source, target) op-type pair.
    #[snafu(display("multiple morphisms from `{op_type}` to `{other_op_type}`"))]
    DuplicateMorphism { op_type: String, other_op_type: String },

    /// An associativity registration needs at least one permutation.
    #[snafu(display("empty permutation set for op type `{op_type}`"))]
    EmptyPermutationSet { op_type: String },

    /// Each entry must be a permutation of `0..k`.
    #[snafu(display("`{op_type}`: {permutation:?} is not a permutation of 0..{arity}"))]
    InvalidPermutation { op_type: String, permutation: Vec<usize>, arity: usize },

    /// A search queue entry referenced a graph the matcher does not hold.
    #[snafu(display("queue entry references unknown graph {id}"))]
    ForeignGraph { id: GraphId },

    /// IR-level failure while resolving nodes during the search.
    #[snafu(context(false), display("{source}"))]
    Ir { source: graft_ir::Error },
}
