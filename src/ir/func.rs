use super::{
    Block, FunctionBodyDisplay, Inst, InstArena, InstData, InstDisplay, InstIter, InstKind,
    InstList, Var,
};
use crate::entity::{EntityRef, EntityVec};
use crate::errors::IrError;
use fxhash::FxHashSet;
use smallvec::SmallVec;

#[derive(Clone, Debug)]
pub struct FunctionBody {
    pub name: String,
    /// Entry block.
    pub entry: Block,
    /// Block bodies.
    pub blocks: EntityVec<Block, BlockDef>,
    /// Every instruction ever created, placed or not. List links live
    /// here.
    pub insts: InstArena,
    pub vars: EntityVec<Var, VarData>,
}

#[derive(Clone, Debug, Default)]
pub struct BlockDef {
    /// Instructions in this block.
    pub insts: InstList,
    /// Successor blocks.
    pub succs: SmallVec<[Block; 4]>,
    /// Predecessor blocks.
    pub preds: SmallVec<[Block; 4]>,
}

#[derive(Clone, Debug, Default)]
pub struct VarData {
    /// Source-level name; compiler temporaries have none.
    pub name: Option<String>,
}

impl FunctionBody {
    pub fn new(name: &str) -> FunctionBody {
        let mut blocks = EntityVec::default();
        let entry = blocks.push(BlockDef::default());
        FunctionBody {
            name: name.to_owned(),
            entry,
            blocks,
            insts: EntityVec::default(),
            vars: EntityVec::default(),
        }
    }

    pub fn add_block(&mut self) -> Block {
        let id = self.blocks.push(BlockDef::default());
        log::trace!("add_block: block {}", id);
        id
    }

    pub fn add_edge(&mut self, from: Block, to: Block) {
        self.blocks[from].succs.push(to);
        self.blocks[to].preds.push(from);
        log::trace!("add_edge: from {} to {}", from, to);
    }

    pub fn add_var(&mut self, name: &str) -> Var {
        self.vars.push(VarData {
            name: Some(name.to_owned()),
        })
    }

    pub fn add_temp(&mut self) -> Var {
        self.vars.push(VarData::default())
    }

    /// Allocate an instruction without placing it in any block.
    pub fn add_inst(&mut self, kind: InstKind) -> Inst {
        log::trace!("add_inst: {:?}", kind);
        self.insts.push(InstData::new(kind))
    }

    pub fn append(&mut self, block: Block, inst: Inst) {
        self.blocks[block].insts.append(&mut self.insts, inst);
        self.insts[inst].block = block;
    }

    pub fn prepend(&mut self, block: Block, inst: Inst) {
        self.blocks[block].insts.prepend(&mut self.insts, inst);
        self.insts[inst].block = block;
    }

    /// Splice a detached list (built with `InstList` operations on
    /// `self.insts`) onto the end of `block`.
    pub fn append_list(&mut self, block: Block, list: InstList) {
        let members = list.iter(&self.insts).collect::<Vec<_>>();
        for inst in members {
            self.insts[inst].block = block;
        }
        self.blocks[block].insts.concat(&mut self.insts, list);
    }

    /// Place `inst` immediately before `before`, in `before`'s block.
    pub fn insert_before(&mut self, before: Inst, inst: Inst) {
        let block = self.insts[before].block;
        self.blocks[block]
            .insts
            .insert_before(&mut self.insts, before, inst);
        self.insts[inst].block = block;
    }

    /// Remove `inst` from its block. It stays allocated and may be
    /// placed again.
    pub fn unlink(&mut self, inst: Inst) {
        let block = self.insts[inst].block;
        self.blocks[block].insts.unlink(&mut self.insts, inst);
    }

    /// The block's closing goto/branch/return, if it has one.
    pub fn terminator(&self, block: Block) -> Option<Inst> {
        self.blocks[block]
            .insts
            .tail()
            .filter(|&tail| self.insts[tail].kind.is_terminator())
    }

    /// Move `inst` out of its current block to the end of `block`, but
    /// ahead of `block`'s terminator.
    pub fn move_before_terminator(&mut self, inst: Inst, block: Block) {
        self.unlink(inst);
        match self.terminator(block) {
            Some(term) => self.insert_before(term, inst),
            None => self.append(block, inst),
        }
        log::trace!("move_before_terminator: {} now in {}", inst, block);
    }

    pub fn block_insts(&self, block: Block) -> InstIter<'_> {
        self.blocks[block].insts.iter(&self.insts)
    }

    pub fn block_insts_rev(&self, block: Block) -> std::iter::Rev<InstIter<'_>> {
        self.blocks[block].insts.iter(&self.insts).rev()
    }

    /// Drop every marked instruction from every block.
    pub fn remove_marked(&mut self) -> usize {
        let mut removed = 0;
        for block in self.blocks.values_mut() {
            removed += block.insts.remove_marked(&mut self.insts);
        }
        removed
    }

    /// Variables that live in memory: those whose address is taken and
    /// those given storage by a declaration. Their values can change
    /// through any store or call.
    pub fn address_taken(&self) -> FxHashSet<Var> {
        let mut vars = FxHashSet::default();
        for block in self.blocks.iter() {
            for inst in self.block_insts(block) {
                match self.insts[inst].kind {
                    InstKind::AddrOf { var, .. } | InstKind::Dec { var, .. } => {
                        vars.insert(var);
                    }
                    _ => {}
                }
            }
        }
        vars
    }

    /// Placed jumps whose backpatch list was never resolved.
    pub fn unresolved_jumps(&self) -> Vec<Inst> {
        self.blocks
            .iter()
            .flat_map(|block| self.block_insts(block))
            .filter(|&inst| {
                self.insts[inst]
                    .kind
                    .jump_target()
                    .map_or(false, |target| target.is_invalid())
            })
            .collect()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.blocks.get(self.entry).is_none() {
            return Err(IrError::InvalidEntry.into());
        }
        for (block, def) in self.blocks.entries() {
            def.insts.validate(&self.insts, block)?;
            for inst in self.block_insts(block) {
                if let Some(target) = self.insts[inst].kind.jump_target() {
                    match self.insts.get(target) {
                        None => return Err(IrError::UnresolvedJump { inst }.into()),
                        Some(data) if !data.kind.is_label() => {
                            return Err(IrError::JumpToNonLabel { inst, target }.into())
                        }
                        Some(_) => {}
                    }
                }
            }
            for &succ in &def.succs {
                let there = self.blocks[succ].preds.iter().filter(|&&p| p == block);
                let here = def.succs.iter().filter(|&&s| s == succ);
                if there.count() != here.count() {
                    return Err(IrError::EdgeMismatch {
                        from: block,
                        to: succ,
                    }
                    .into());
                }
            }
            for &pred in &def.preds {
                if !self.blocks[pred].succs.contains(&block) {
                    return Err(IrError::EdgeMismatch {
                        from: pred,
                        to: block,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Like `validate`, but a violation is fatal.
    pub fn check(&self) {
        if let Err(e) = self.validate() {
            panic!("malformed function body `{}`: {}", self.name, e);
        }
    }

    pub fn display<'a>(&'a self, indent: &'a str) -> FunctionBodyDisplay<'a> {
        FunctionBodyDisplay(self, indent)
    }

    pub fn inst_display(&self, inst: Inst) -> InstDisplay<'_> {
        InstDisplay(self, inst)
    }
}
