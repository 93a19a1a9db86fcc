//! Copy propagation: rewrite uses through copies that still hold.

use crate::analysis::ReachingCopies;
use crate::cfg::CFGInfo;
use crate::ir::*;
use crate::pass::Analysis;
use crate::passes::Fuel;
use smallvec::SmallVec;

/// Replace each use of a copy's destination with its source wherever
/// the copy holds. Each block is replayed from its solved input fact,
/// so a copy made earlier in the same block is seen by later
/// instructions. Unreachable blocks are skipped: their input fact is
/// the top of the lattice, which no copy actually reaches.
///
/// Copy instructions keep their operands, so the solved facts stay
/// valid for the whole walk. Copies made dead by the rewrite are left
/// for `dce`. Returns the number of operands rewritten.
pub fn run(body: &mut FunctionBody, fuel: &mut Fuel) -> usize {
    let copies = ReachingCopies::compute(body);
    let cfg = CFGInfo::new(body);
    let mut rewrites = 0;

    let blocks = body.blocks.iter().collect::<Vec<_>>();
    for block in blocks {
        if !cfg.is_reachable(block) {
            continue;
        }
        let mut holding = copies.facts.fact_in(block).clone();
        let insts = body.block_insts(block).collect::<Vec<_>>();
        for inst in insts {
            if copies.analysis.copy(inst).is_none() {
                let mut subst: SmallVec<[(Var, Var); 2]> = SmallVec::new();
                body.insts[inst].kind.visit_uses(|op| {
                    if let Operand::Var(var) = op {
                        if let Some(src) = copies.analysis.source_of(&holding, var) {
                            subst.push((var, src));
                        }
                    }
                });
                if !subst.is_empty() {
                    body.insts[inst].kind.update_uses(|op| {
                        let var = match *op {
                            Operand::Var(var) => var,
                            Operand::Lit(_) => return,
                        };
                        if let Some(&(_, src)) = subst.iter().find(|&&(dst, _)| dst == var) {
                            if fuel.consume() {
                                *op = Operand::Var(src);
                                rewrites += 1;
                            }
                        }
                    });
                    log::trace!(
                        "copy_rewrite: {} now {}",
                        inst,
                        body.inst_display(inst)
                    );
                }
            }
            copies.analysis.transfer_inst(&mut holding, body, inst);
        }
    }

    log::debug!("copy_rewrite: {} operands rewritten in {}", rewrites, body.name);
    rewrites
}
