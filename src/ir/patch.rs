//! Backpatch lists: jumps emitted before their destination label
//! exists.

use super::{FunctionBody, Inst};
use smallvec::SmallVec;

/// Goto/branch instructions still waiting on a target. Code generators
/// typically hold one per open exit of a condition ("true list",
/// "false list"), merge them as conditions combine, and resolve them
/// once the destination label is placed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchList {
    jumps: SmallVec<[Inst; 4]>,
}

impl PatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(jump: Inst) -> Self {
        let mut list = Self::new();
        list.push(jump);
        list
    }

    pub fn push(&mut self, jump: Inst) {
        self.jumps.push(jump);
    }

    /// Absorb all of `other`'s pending jumps.
    pub fn merge(&mut self, other: PatchList) {
        self.jumps.extend(other.jumps);
    }

    pub fn len(&self) -> usize {
        self.jumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jumps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Inst> + '_ {
        self.jumps.iter().copied()
    }

    /// Point every pending jump at `label` and consume the list.
    /// Returns how many jumps were patched.
    pub fn resolve(self, body: &mut FunctionBody, label: Inst) -> usize {
        assert!(
            body.insts[label].kind.is_label(),
            "backpatch target {} is not a label",
            label
        );
        for &jump in &self.jumps {
            let patched = body.insts[jump].kind.set_jump_target(label);
            assert!(patched, "{} on a backpatch list is not a jump", jump);
            log::trace!("backpatch: {} -> {}", jump, label);
        }
        self.jumps.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entity::EntityRef;
    use crate::ir::{InstKind, Operand, RelOp};

    #[test]
    fn resolve_patches_every_member() {
        let mut body = FunctionBody::new("f");
        let entry = body.entry;
        let x = body.add_var("x");
        let br = body.add_inst(InstKind::Branch {
            op: RelOp::Lt,
            lhs: Operand::Var(x),
            rhs: Operand::Lit(10),
            target: Inst::invalid(),
        });
        body.append(entry, br);
        let goto = body.add_inst(InstKind::Goto {
            target: Inst::invalid(),
        });
        body.append(entry, goto);

        let mut exits = PatchList::single(br);
        exits.merge(PatchList::single(goto));
        assert_eq!(exits.len(), 2);
        assert_eq!(body.unresolved_jumps(), vec![br, goto]);
        assert!(body.validate().is_err());

        let label = body.add_inst(InstKind::Label);
        let target = body.add_block();
        body.append(target, label);
        body.add_edge(entry, target);

        assert_eq!(exits.resolve(&mut body, label), 2);
        assert_eq!(body.insts[br].kind.jump_target(), Some(label));
        assert_eq!(body.insts[goto].kind.jump_target(), Some(label));
        assert!(body.unresolved_jumps().is_empty());
        body.validate().unwrap();
    }

    #[test]
    #[should_panic(expected = "is not a label")]
    fn resolve_to_non_label_panics() {
        let mut body = FunctionBody::new("f");
        let goto = body.add_inst(InstKind::Goto {
            target: Inst::invalid(),
        });
        let ret = body.add_inst(InstKind::Return {
            src: Operand::Lit(0),
        });
        PatchList::single(goto).resolve(&mut body, ret);
    }
}
