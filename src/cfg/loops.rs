//! Natural loops.

use crate::analysis::Dominators;
use crate::ir::{Block, FunctionBody};
use crate::ordmap::{OrderedMap, OrderedSet};

/// A natural loop: the header plus every block that reaches one of
/// its back edges without passing through the header. Loops sharing a
/// header are merged into one.
#[derive(Clone, Debug)]
pub struct Loop {
    pub header: Block,
    /// Sources of the back edges into `header`.
    pub latches: Vec<Block>,
    /// Every block of the loop, `header` included.
    pub blocks: OrderedSet<Block>,
}

impl Loop {
    pub fn contains(&self, block: Block) -> bool {
        self.blocks.contains(&block)
    }

    /// Edges `(inside, outside)` leaving the loop.
    pub fn exits(&self, body: &FunctionBody) -> Vec<(Block, Block)> {
        let mut exits = vec![];
        for &block in self.blocks.iter() {
            for &succ in &body.blocks[block].succs {
                if !self.contains(succ) {
                    exits.push((block, succ));
                }
            }
        }
        exits
    }

    /// The single block outside the loop that enters it, provided it
    /// flows only into the header. Code placed at its end runs exactly
    /// once before the loop is entered.
    pub fn preheader(&self, body: &FunctionBody) -> Option<Block> {
        let mut outside = body.blocks[self.header]
            .preds
            .iter()
            .copied()
            .filter(|&pred| !self.contains(pred));
        let pre = outside.next()?;
        if outside.any(|other| other != pre) {
            return None;
        }
        let succs = &body.blocks[pre].succs;
        if succs.iter().all(|&succ| succ == self.header) {
            Some(pre)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoopInfo {
    /// Innermost loops first.
    pub loops: Vec<Loop>,
}

impl LoopInfo {
    /// Find the back edges `latch -> header` (those whose target
    /// dominates their source) and grow each loop body backward from
    /// its latches. Unreachable blocks never join a loop.
    pub fn compute(body: &FunctionBody, doms: &Dominators) -> LoopInfo {
        let mut by_header: OrderedMap<Block, Loop> = OrderedMap::new();
        for &latch in doms.cfg().rpo.values() {
            for &header in &body.blocks[latch].succs {
                if !doms.dominates(header, latch) {
                    continue;
                }
                log::trace!("loops: back edge {} -> {}", latch, header);
                let mut lp = by_header.remove(&header).unwrap_or_else(|| Loop {
                    header,
                    latches: vec![],
                    blocks: std::iter::once(header).collect(),
                });
                lp.latches.push(latch);
                let mut stack = vec![latch];
                while let Some(block) = stack.pop() {
                    if !doms.is_reachable(block) || !lp.blocks.insert(block) {
                        continue;
                    }
                    stack.extend(body.blocks[block].preds.iter().copied());
                }
                by_header.insert(header, lp);
            }
        }

        let mut loops = by_header
            .into_iter()
            .map(|(_, lp)| lp)
            .collect::<Vec<_>>();
        // A loop nested in another has strictly fewer blocks.
        loops.sort_by_key(|lp| lp.blocks.len());
        LoopInfo { loops }
    }

    pub fn innermost_first(&self) -> impl Iterator<Item = &Loop> + '_ {
        self.loops.iter()
    }

    /// The innermost loop containing `block`.
    pub fn loop_of(&self, block: Block) -> Option<&Loop> {
        self.loops.iter().find(|lp| lp.contains(block))
    }
}
