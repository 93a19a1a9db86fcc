//! Reaching copies: which `dst := src` moves still hold at each point.

use crate::ir::{FunctionBody, Inst, Var};
use crate::ordmap::OrderedSet;
use crate::pass::{analyze, Analysis, BlockFacts, Direction, FactTag, Meet};
use fxhash::FxHashMap;
use smallvec::SmallVec;

/// A copy holds at a point if on every path reaching it the copy
/// executed and neither its destination nor its source was written
/// afterwards. Facts are sets of copy instructions joined by
/// intersection; every slot starts at the set of all copies, and
/// nothing holds on entry.
///
/// Stores and calls may write any variable living in memory, so they
/// kill every copy mentioning one.
pub struct CopyAnalysis {
    universe: OrderedSet<Inst>,
    /// Copy instruction to its (dst, src).
    copies: FxHashMap<Inst, (Var, Var)>,
    /// Copies mentioning each variable, on either side.
    by_var: FxHashMap<Var, SmallVec<[Inst; 4]>>,
    /// Copies mentioning a variable that lives in memory.
    in_memory: Vec<Inst>,
}

impl CopyAnalysis {
    pub fn new(body: &FunctionBody) -> Self {
        let address_taken = body.address_taken();
        let mut copies = FxHashMap::default();
        let mut by_var: FxHashMap<Var, SmallVec<[Inst; 4]>> = FxHashMap::default();
        let mut in_memory = vec![];
        let mut all = vec![];
        for block in body.blocks.iter() {
            for inst in body.block_insts(block) {
                if let Some((dst, src)) = body.insts[inst].kind.as_copy() {
                    copies.insert(inst, (dst, src));
                    by_var.entry(dst).or_default().push(inst);
                    by_var.entry(src).or_default().push(inst);
                    if address_taken.contains(&dst) || address_taken.contains(&src) {
                        in_memory.push(inst);
                    }
                    all.push(inst);
                }
            }
        }
        all.sort();
        log::trace!("copies: {} candidate copies in {}", all.len(), body.name);
        CopyAnalysis {
            universe: OrderedSet::from_sorted_vec(all),
            copies,
            by_var,
            in_memory,
        }
    }

    /// The `(dst, src)` of a tracked copy.
    pub fn copy(&self, inst: Inst) -> Option<(Var, Var)> {
        self.copies.get(&inst).copied()
    }

    /// The source to use in place of `var`, if a copy into `var` is
    /// among `holding`.
    pub fn source_of(&self, holding: &OrderedSet<Inst>, var: Var) -> Option<Var> {
        self.by_var.get(&var)?.iter().find_map(|&inst| {
            let (dst, src) = self.copies[&inst];
            (dst == var && holding.contains(&inst)).then(|| src)
        })
    }

    fn kill_var(&self, fact: &mut OrderedSet<Inst>, var: Var) {
        if let Some(insts) = self.by_var.get(&var) {
            for inst in insts {
                fact.remove(inst);
            }
        }
    }
}

impl Analysis for CopyAnalysis {
    type Fact = OrderedSet<Inst>;

    const DIRECTION: Direction = Direction::Forward;
    const TAG: FactTag = FactTag(0xc0_u32);

    fn init(&self, _body: &FunctionBody) -> OrderedSet<Inst> {
        self.universe.clone()
    }

    fn boundary(&self, _body: &FunctionBody) -> OrderedSet<Inst> {
        OrderedSet::new()
    }

    fn merge(&self, into: &mut OrderedSet<Inst>, other: &OrderedSet<Inst>) -> bool {
        Meet::Intersection.apply(into, other)
    }

    fn transfer_inst(&self, fact: &mut OrderedSet<Inst>, body: &FunctionBody, inst: Inst) {
        let kind = &body.insts[inst].kind;
        if let Some(def) = kind.def() {
            self.kill_var(fact, def);
        }
        if kind.clobbers_memory() {
            for inst in &self.in_memory {
                fact.remove(inst);
            }
        }
        if self.copies.contains_key(&inst) {
            fact.insert(inst);
        }
    }
}

/// Solved reaching-copy facts, with the analysis that produced them
/// for replaying the transfer within a block.
pub struct ReachingCopies {
    pub analysis: CopyAnalysis,
    pub facts: BlockFacts<OrderedSet<Inst>>,
}

impl ReachingCopies {
    pub fn compute(body: &FunctionBody) -> ReachingCopies {
        let analysis = CopyAnalysis::new(body);
        let facts = analyze(&analysis, body);
        ReachingCopies { analysis, facts }
    }
}
