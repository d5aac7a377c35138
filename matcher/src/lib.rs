//! Subgraph pattern matching over graft IR graphs.
//!
//! Finds occurrences of a pattern graph inside a subject graph by a
//! backtracking lock-step BFS isomorphism search, with op equivalence
//! decided by a registry of commutative-argument permutations and
//! structural morphisms.
//!
//! # Module Organization
//!
//! - [`registry`] - Equivalence registry and match candidates
//! - [`morphism`] - Structural-compatibility transforms
//! - [`search`] - The matcher, its branch state, and match results
//! - [`error`] - Error types and result handling
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = EquivalenceRegistry::new();
//! registry.register_association("Add", [vec![0, 1], vec![1, 0]])?;
//!
//! let matcher = GraphMatcher::new(pattern, &registry);
//! for found in matcher.match_all(&subject)? {
//!     // found.subject_op("p0") is the node bound to pattern op p0
//! }
//! ```

pub mod error;
pub mod morphism;
pub mod registry;
pub mod search;


pub use error::{Error, Result};
pub use morphism::{IdentityMorphism, MetaOpInfo, Morphism};
pub use registry::{Candidate, EquivalenceRegistry};
pub use search::{bfs_queue, GraphMatch, GraphMatcher, Matches};
