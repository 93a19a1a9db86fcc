//! Loop-invariant code motion.

use crate::analysis::{Dominators, Liveness};
use crate::cfg::loops::{Loop, LoopInfo};
use crate::ir::*;
use crate::passes::Fuel;
use fxhash::{FxHashMap, FxHashSet};

/// Hoist loop-invariant computations into loop preheaders, innermost
/// loops first. Loops without a preheader are skipped. Returns the
/// number of instructions moved.
pub fn run(body: &mut FunctionBody, fuel: &mut Fuel) -> usize {
    let doms = Dominators::compute(body);
    let loops = LoopInfo::compute(body, &doms);
    let in_memory = body.address_taken();

    let mut hoisted = 0;
    for lp in loops.innermost_first() {
        let pre = match lp.preheader(body) {
            Some(pre) => pre,
            None => {
                log::trace!("licm: loop at {} has no preheader", lp.header);
                continue;
            }
        };
        hoisted += hoist_loop(body, lp, pre, &doms, &in_memory, fuel);
    }

    log::debug!("licm: hoisted {} instructions in {}", hoisted, body.name);
    hoisted
}

fn hoist_loop(
    body: &mut FunctionBody,
    lp: &Loop,
    pre: Block,
    doms: &Dominators,
    in_memory: &FxHashSet<Var>,
    fuel: &mut Fuel,
) -> usize {
    let liveness = Liveness::compute(body);
    let exits = lp.exits(body);

    let mut defs: FxHashMap<Var, usize> = FxHashMap::default();
    for &block in lp.blocks.iter() {
        for inst in body.block_insts(block) {
            if let Some(dst) = body.insts[inst].kind.def() {
                *defs.entry(dst).or_default() += 1;
            }
        }
    }

    // Hoisting one instruction can make its users invariant; repeat
    // until nothing moves.
    let mut hoisted = 0;
    loop {
        let mut changed = false;
        for &block in lp.blocks.iter() {
            let insts = body.block_insts(block).collect::<Vec<_>>();
            for inst in insts {
                let kind = &body.insts[inst].kind;
                let dst = match kind.def() {
                    Some(dst) if is_hoistable(kind) => dst,
                    _ => continue,
                };

                let mut invariant = true;
                kind.visit_uses(|op| {
                    if let Operand::Var(var) = op {
                        invariant &= !defs.contains_key(&var) && !in_memory.contains(&var);
                    }
                });
                let safe = invariant
                    && defs.get(&dst) == Some(&1)
                    && !in_memory.contains(&dst)
                    && !liveness.live_in(lp.header).contains(&dst)
                    && exits.iter().all(|&(from, to)| {
                        !liveness.live_in(to).contains(&dst) || doms.dominates(block, from)
                    });
                if !safe || !fuel.consume() {
                    continue;
                }

                log::trace!(
                    "licm: hoisting {} from {} to {}",
                    body.inst_display(inst),
                    block,
                    pre
                );
                body.move_before_terminator(inst, pre);
                defs.remove(&dst);
                hoisted += 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    hoisted
}

/// Pure, cannot fault, and does not read memory.
fn is_hoistable(kind: &InstKind) -> bool {
    kind.is_pure() && !kind.can_trap() && !matches!(kind, InstKind::Load { .. })
}
