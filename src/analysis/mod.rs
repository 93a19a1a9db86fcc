//! Analyses built on the dataflow solver.

pub mod consts;
pub mod copies;
pub mod dom;
pub mod liveness;

pub use consts::{ConstAnalysis, ConstFact};
pub use copies::{CopyAnalysis, ReachingCopies};
pub use dom::{DominatorAnalysis, Dominators};
pub use liveness::{LiveVars, Liveness};
