//! Three-address-code intermediate representation.
//!
//! A function body is a control-flow graph of blocks. Each block owns
//! a doubly linked list of instructions; the instructions themselves
//! (and their links) live in one arena per function, so that lists can
//! be split, spliced and edited in place without moving anything.

use crate::declare_entity;

declare_entity!(Block, "block");
declare_entity!(Inst, "inst");
declare_entity!(Var, "v");

mod display;
pub use display::*;
mod func;
pub use func::*;
mod inst;
pub use inst::*;
mod list;
pub use list::*;
mod patch;
pub use patch::*;
