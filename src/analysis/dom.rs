//! Dominators as a forward must-analysis over block sets.

use crate::cfg::CFGInfo;
use crate::ir::{Block, FunctionBody};
use crate::ordmap::OrderedSet;
use crate::pass::{analyze, Analysis, BlockFacts, Direction, FactTag, Meet};

/// `OUT[b]` is the set of blocks dominating `b`, `b` included.
///
/// Works purely at block granularity: the block transfer adds the
/// block itself, and joins intersect. Every slot starts at the
/// universe of blocks except the entry's input, which is `{entry}`.
pub struct DominatorAnalysis {
    universe: OrderedSet<Block>,
}

impl DominatorAnalysis {
    pub fn new(body: &FunctionBody) -> Self {
        DominatorAnalysis {
            universe: OrderedSet::from_sorted_vec(body.blocks.iter().collect()),
        }
    }
}

impl Analysis for DominatorAnalysis {
    type Fact = OrderedSet<Block>;

    const DIRECTION: Direction = Direction::Forward;
    const TAG: FactTag = FactTag(0xd0_u32);

    fn init(&self, _body: &FunctionBody) -> OrderedSet<Block> {
        self.universe.clone()
    }

    fn boundary(&self, body: &FunctionBody) -> OrderedSet<Block> {
        std::iter::once(body.entry).collect()
    }

    fn merge(&self, into: &mut OrderedSet<Block>, other: &OrderedSet<Block>) -> bool {
        Meet::Intersection.apply(into, other)
    }

    fn transfer_block(&self, fact: &mut OrderedSet<Block>, _body: &FunctionBody, block: Block) {
        fact.insert(block);
    }
}

/// Solved dominator sets.
#[derive(Clone, Debug)]
pub struct Dominators {
    facts: BlockFacts<OrderedSet<Block>>,
    cfg: CFGInfo,
}

impl Dominators {
    pub fn compute(body: &FunctionBody) -> Dominators {
        let facts = analyze(&DominatorAnalysis::new(body), body);
        Dominators {
            facts,
            cfg: CFGInfo::new(body),
        }
    }

    /// All blocks dominating `block`, itself included. For an
    /// unreachable block this is every block (vacuously, no path from
    /// the entry avoids any of them).
    pub fn dominators(&self, block: Block) -> &OrderedSet<Block> {
        self.facts.fact_out(block)
    }

    pub fn dominates(&self, a: Block, b: Block) -> bool {
        self.dominators(b).contains(&a)
    }

    pub fn is_reachable(&self, block: Block) -> bool {
        self.cfg.is_reachable(block)
    }

    pub fn cfg(&self) -> &CFGInfo {
        &self.cfg
    }

    /// Immediate dominator: the strict dominator closest to `block`.
    /// Strict dominators form a chain, so it is the one with the most
    /// dominators of its own. `None` for the entry and unreachable
    /// blocks.
    pub fn idom(&self, block: Block) -> Option<Block> {
        if !self.is_reachable(block) {
            return None;
        }
        self.dominators(block)
            .iter()
            .copied()
            .filter(|&d| d != block)
            .max_by_key(|&d| self.dominators(d).len())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn idom_of_loop() {
        // entry -> h -> body -> h, h -> exit
        let mut body = FunctionBody::new("f");
        let entry = body.entry;
        let h = body.add_block();
        let b = body.add_block();
        let exit = body.add_block();
        body.add_edge(entry, h);
        body.add_edge(h, b);
        body.add_edge(b, h);
        body.add_edge(h, exit);

        let doms = Dominators::compute(&body);
        assert_eq!(doms.dominators(h).to_sorted_vec(), vec![entry, h]);
        assert_eq!(doms.dominators(b).to_sorted_vec(), vec![entry, h, b]);
        assert_eq!(doms.idom(exit), Some(h));
        assert_eq!(doms.idom(b), Some(h));
        assert_eq!(doms.idom(entry), None);
        assert!(doms.dominates(h, b));
        assert!(!doms.dominates(b, h));
    }
}
