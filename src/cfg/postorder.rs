//! Fast postorder computation.

// Borrowed from regalloc2's postorder.rs, which is also Apache-2.0
// with LLVM-exception.

use crate::entity::PerEntity;
use crate::ir::Block;
use smallvec::SmallVec;

/// Postorder of the blocks reachable from `entry`. Successors are
/// visited in the order `succ_blocks` lists them. The DFS keeps an
/// explicit stack, so deep CFGs cannot overflow the call stack.
pub fn calculate<'a, SuccFn: Fn(Block) -> &'a [Block]>(
    entry: Block,
    succ_blocks: SuccFn,
) -> Vec<Block> {
    let mut ret = vec![];
    let mut visited: PerEntity<Block, bool> = PerEntity::default();

    // (block, its successors, index of the next successor to try)
    let mut stack: SmallVec<[(Block, &'a [Block], usize); 64]> = SmallVec::new();

    visited[entry] = true;
    stack.push((entry, succ_blocks(entry), 0));

    while let Some((block, succs, next)) = stack.last_mut() {
        match succs.get(*next) {
            Some(&succ) => {
                *next += 1;
                if !visited[succ] {
                    visited[succ] = true;
                    stack.push((succ, succ_blocks(succ), 0));
                }
            }
            None => {
                log::trace!("postorder: finished {}", block);
                ret.push(*block);
                stack.pop();
            }
        }
    }

    ret
}
