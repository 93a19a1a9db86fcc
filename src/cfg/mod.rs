//! Lightweight CFG analyses.

use crate::declare_entity;
use crate::entity::{EntityVec, PerEntity};
use crate::ir::{Block, FunctionBody};

pub mod loops;
pub mod postorder;

declare_entity!(RPOIndex, "rpo");

/// Auxiliary analyses of the control-flow graph.
#[derive(Clone, Debug)]
pub struct CFGInfo {
    /// Entry block.
    pub entry: Block,
    /// Reachable blocks without successors.
    pub exit_blocks: Vec<Block>,
    /// Postorder traversal of reachable blocks.
    pub postorder: Vec<Block>,
    /// Reverse-postorder traversal of reachable blocks.
    pub rpo: EntityVec<RPOIndex, Block>,
    /// Position of each block in RPO, if reachable.
    pub rpo_pos: PerEntity<Block, Option<RPOIndex>>,
}

impl CFGInfo {
    pub fn new(f: &FunctionBody) -> CFGInfo {
        let postorder = postorder::calculate(f.entry, |block| &f.blocks[block].succs[..]);

        let exit_blocks = postorder
            .iter()
            .copied()
            .filter(|&block| f.blocks[block].succs.is_empty())
            .collect();

        let mut rpo = postorder.clone();
        rpo.reverse();
        let rpo: EntityVec<RPOIndex, Block> = EntityVec::from(rpo);
        let mut rpo_pos = PerEntity::default();
        for (rpo, &block) in rpo.entries() {
            rpo_pos[block] = Some(rpo);
        }

        CFGInfo {
            entry: f.entry,
            exit_blocks,
            postorder,
            rpo,
            rpo_pos,
        }
    }

    pub fn is_reachable(&self, block: Block) -> bool {
        self.rpo_pos[block].is_some()
    }

    /// Whether the edge `from -> to` does not advance in RPO. Every
    /// loop back edge retreats; in an irreducible CFG some retreating
    /// edges are not back edges.
    pub fn is_retreating(&self, from: Block, to: Block) -> bool {
        match (self.rpo_pos[from], self.rpo_pos[to]) {
            (Some(from), Some(to)) => to <= from,
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rpo_of_diamond_with_dead_block() {
        let mut body = FunctionBody::new("f");
        let a = body.entry;
        let b = body.add_block();
        let c = body.add_block();
        let d = body.add_block();
        let dead = body.add_block();
        body.add_edge(a, b);
        body.add_edge(a, c);
        body.add_edge(b, d);
        body.add_edge(c, d);
        body.add_edge(dead, d);

        let cfg = CFGInfo::new(&body);
        let rpo = cfg.rpo.values().copied().collect::<Vec<_>>();
        assert_eq!(rpo.len(), 4);
        assert_eq!(rpo[0], a);
        assert_eq!(rpo[3], d);
        assert!(cfg.is_reachable(c));
        assert!(!cfg.is_reachable(dead));
        assert_eq!(cfg.exit_blocks, vec![d]);
        assert!(!cfg.is_retreating(a, b));
        assert!(cfg.is_retreating(d, a));
    }
}
