//! Iterative dataflow analysis (forward and backward) over per-block
//! facts.

use crate::cfg::CFGInfo;
use crate::entity::EntityVec;
use crate::ir::*;
use fxhash::FxHashSet;
use std::collections::VecDeque;
use std::fmt::Debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Names the analysis a fact array was built for, so that facts of one
/// analysis are never fed to another analysis with the same fact type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FactTag(pub u32);

/// The parametrization of the solver: what a fact is, how facts
/// combine, and how instructions transform them.
///
/// `merge` must be monotone and `init()` must be its identity (the
/// "top" of the lattice): merging `init()` into any fact leaves it
/// unchanged. With a finite-height lattice the solver then terminates
/// at the greatest fixed point for intersection-like merges and the
/// least fixed point for union-like ones.
pub trait Analysis {
    type Fact: Clone + Debug + PartialEq;

    const DIRECTION: Direction;
    const TAG: FactTag;

    /// The fact every slot starts with; also the starting point of
    /// every merge.
    fn init(&self, body: &FunctionBody) -> Self::Fact;

    /// The fact entering the entry block (forward) or leaving an exit
    /// block (backward).
    fn boundary(&self, body: &FunctionBody) -> Self::Fact {
        self.init(body)
    }

    /// `into := into meet other`. Returns `true` if `into` changed.
    fn merge(&self, into: &mut Self::Fact, other: &Self::Fact) -> bool;

    fn equal(&self, a: &Self::Fact, b: &Self::Fact) -> bool {
        a == b
    }

    fn transfer_inst(&self, _fact: &mut Self::Fact, _body: &FunctionBody, _inst: Inst) {}

    /// Transform a block's input fact into its output fact. Defaults to
    /// `transfer_inst` over the block's instructions, last to first for
    /// backward analyses.
    fn transfer_block(&self, fact: &mut Self::Fact, body: &FunctionBody, block: Block) {
        match Self::DIRECTION {
            Direction::Forward => {
                for inst in body.block_insts(block) {
                    self.transfer_inst(fact, body, inst);
                }
            }
            Direction::Backward => {
                for inst in body.block_insts_rev(block) {
                    self.transfer_inst(fact, body, inst);
                }
            }
        }
    }
}

/// `IN` and `OUT` facts, one slot per block, tagged with the analysis
/// that owns them.
#[derive(Clone, Debug)]
pub struct BlockFacts<F: Clone + Debug> {
    tag: FactTag,
    pub block_in: EntityVec<Block, F>,
    pub block_out: EntityVec<Block, F>,
}

impl<F: Clone + Debug> BlockFacts<F> {
    pub fn new<A: Analysis<Fact = F>>(analysis: &A, body: &FunctionBody) -> Self {
        let init = analysis.init(body);
        BlockFacts {
            tag: A::TAG,
            block_in: EntityVec::filled(body.blocks.len(), init.clone()),
            block_out: EntityVec::filled(body.blocks.len(), init),
        }
    }

    pub fn tag(&self) -> FactTag {
        self.tag
    }

    pub fn fact_in(&self, block: Block) -> &F {
        &self.block_in[block]
    }

    pub fn fact_out(&self, block: Block) -> &F {
        &self.block_out[block]
    }

    fn check_tag<A: Analysis<Fact = F>>(&self) {
        assert_eq!(
            self.tag,
            A::TAG,
            "fact array built for a different analysis"
        );
    }

    fn check_size(&self, body: &FunctionBody) {
        assert!(
            self.block_in.len() == body.blocks.len() && self.block_out.len() == body.blocks.len(),
            "fact arrays hold {}/{} slots for {} blocks",
            self.block_in.len(),
            self.block_out.len(),
            body.blocks.len()
        );
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Blocks popped off the worklist.
    pub visits: usize,
    /// Visits that changed the block's output fact.
    pub updates: usize,
}

/// The worklist engine. Holds no analysis state between solves; one
/// solver may be reused across analyses and functions.
#[derive(Debug, Default)]
pub struct Solver {
    workqueue: VecDeque<Block>,
    workqueue_set: FxHashSet<Block>,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, block: Block) {
        if self.workqueue_set.insert(block) {
            self.workqueue.push_back(block);
        }
    }

    fn pop(&mut self) -> Option<Block> {
        let block = self.workqueue.pop_front()?;
        self.workqueue_set.remove(&block);
        Some(block)
    }

    /// Iterate `analysis` to a fixed point, starting from whatever
    /// `facts` already hold. Solving already-converged facts again
    /// performs no updates.
    pub fn solve<A: Analysis>(
        &mut self,
        analysis: &A,
        body: &FunctionBody,
        facts: &mut BlockFacts<A::Fact>,
    ) -> SolveStats {
        body.check();
        facts.check_tag::<A>();
        facts.check_size(body);

        let cfg = CFGInfo::new(body);
        self.workqueue.clear();
        self.workqueue_set.clear();
        match A::DIRECTION {
            Direction::Forward => {
                for &block in cfg.rpo.values() {
                    self.push(block);
                }
            }
            Direction::Backward => {
                for &block in &cfg.postorder {
                    self.push(block);
                }
            }
        }
        // Unreachable blocks still get facts.
        for block in body.blocks.iter() {
            if !cfg.is_reachable(block) {
                self.push(block);
            }
        }

        log::debug!(
            "solve: {:?} analysis {:?} over {} blocks of {}",
            A::DIRECTION,
            A::TAG,
            body.blocks.len(),
            body.name
        );

        let init = analysis.init(body);
        let mut stats = SolveStats::default();
        while let Some(block) = self.pop() {
            facts.check_tag::<A>();
            stats.visits += 1;
            let changed = match A::DIRECTION {
                Direction::Forward => {
                    let mut input = if block == body.entry {
                        analysis.boundary(body)
                    } else {
                        init.clone()
                    };
                    for &pred in &body.blocks[block].preds {
                        analysis.merge(&mut input, &facts.block_out[pred]);
                    }
                    let mut output = input.clone();
                    analysis.transfer_block(&mut output, body, block);
                    facts.block_in[block] = input;
                    if analysis.equal(&output, &facts.block_out[block]) {
                        false
                    } else {
                        facts.block_out[block] = output;
                        for &succ in &body.blocks[block].succs {
                            self.push(succ);
                        }
                        true
                    }
                }
                Direction::Backward => {
                    let mut output = if body.blocks[block].succs.is_empty() {
                        analysis.boundary(body)
                    } else {
                        init.clone()
                    };
                    for &succ in &body.blocks[block].succs {
                        analysis.merge(&mut output, &facts.block_in[succ]);
                    }
                    let mut input = output.clone();
                    analysis.transfer_block(&mut input, body, block);
                    facts.block_out[block] = output;
                    if analysis.equal(&input, &facts.block_in[block]) {
                        false
                    } else {
                        facts.block_in[block] = input;
                        for &pred in &body.blocks[block].preds {
                            self.push(pred);
                        }
                        true
                    }
                }
            };
            log::trace!("solve: visit {} changed {}", block, changed);
            if changed {
                stats.updates += 1;
            }
        }

        log::debug!(
            "solve: {:?} converged after {} visits, {} updates",
            A::TAG,
            stats.visits,
            stats.updates
        );
        stats
    }
}

/// Build fresh facts for `analysis` and solve them.
pub fn analyze<A: Analysis>(analysis: &A, body: &FunctionBody) -> BlockFacts<A::Fact> {
    let mut facts = BlockFacts::new(analysis, body);
    Solver::new().solve(analysis, body, &mut facts);
    facts
}
