//! TACOPT: dataflow analyses and optimization passes over a
//! three-address-code control-flow graph.

pub mod analysis;
pub mod cfg;
pub mod entity;
mod errors;
mod ir;
pub mod ordmap;
pub mod pass;
pub mod passes;

pub use errors::*;
pub use ir::*;
pub use ordmap::{OrderedMap, OrderedSet};
pub use passes::{optimize, Fuel, OptOptions, OptStats};

#[cfg(feature = "fuzzing")]
pub mod fuzzing;
