//! Error types.

use crate::ir::{Block, Inst};

/// A broken structural invariant of a function body.
///
/// These are only ever produced by bugs in whatever built the IR (or
/// in a pass that mutated it); a well-formed input program never
/// triggers one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IrError {
    /// The entry block does not name a block of the function.
    InvalidEntry,
    /// A block's cached instruction count disagrees with its list.
    ListLength {
        block: Block,
        cached: usize,
        actual: usize,
    },
    /// A `prev`/`next` link, or the list's head/tail, is inconsistent.
    BrokenLink { block: Block, inst: Inst },
    /// An instruction sits in one block's list but records another
    /// block as its parent.
    WrongParent {
        inst: Inst,
        expected: Block,
        actual: Block,
    },
    /// A goto/branch whose target was never backpatched.
    UnresolvedJump { inst: Inst },
    /// A goto/branch whose target is not a label.
    JumpToNonLabel { inst: Inst, target: Inst },
    /// An edge recorded on one side only.
    EdgeMismatch { from: Block, to: Block },
}

impl std::fmt::Display for IrError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            IrError::InvalidEntry => write!(f, "entry block is not a block of the function"),
            IrError::ListLength {
                block,
                cached,
                actual,
            } => write!(
                f,
                "{}: instruction list caches length {} but holds {}",
                block, cached, actual
            ),
            IrError::BrokenLink { block, inst } => {
                write!(f, "{}: broken list link at {}", block, inst)
            }
            IrError::WrongParent {
                inst,
                expected,
                actual,
            } => write!(
                f,
                "{} is listed in {} but records parent {}",
                inst, expected, actual
            ),
            IrError::UnresolvedJump { inst } => write!(f, "{} has no jump target", inst),
            IrError::JumpToNonLabel { inst, target } => {
                write!(f, "{} jumps to {}, which is not a label", inst, target)
            }
            IrError::EdgeMismatch { from, to } => {
                write!(f, "edge {} -> {} is not recorded on both ends", from, to)
            }
        }
    }
}

impl std::error::Error for IrError {}
