//! Pass framework: a generic dataflow solver and the lattices its
//! analyses are built from.
//!
//! Terminology note: a "pass" here is a readonly analysis of a
//! function body. It does not mutate code; it only traverses the code
//! in a certain order, possibly multiple times (to converge), in order
//! to compute some derived information. The transformations that
//! consume those facts live in `crate::passes`.

pub mod dataflow;
pub use dataflow::*;
pub mod lattice;
pub use lattice::*;
