//! Dead code elimination.

use crate::analysis::{LiveVars, Liveness};
use crate::cfg::CFGInfo;
use crate::ir::*;
use crate::pass::Analysis;
use crate::passes::Fuel;

/// Remove pure, non-trapping instructions whose result is never read,
/// and every instruction but labels in unreachable blocks. Variables
/// living in memory are never considered dead. Returns the number of
/// instructions removed.
pub fn run(body: &mut FunctionBody, fuel: &mut Fuel) -> usize {
    let cfg = CFGInfo::new(body);
    let liveness = Liveness::compute(body);
    let in_memory = body.address_taken();

    let blocks = body.blocks.iter().collect::<Vec<_>>();
    for block in blocks {
        let insts = body.block_insts_rev(block).collect::<Vec<_>>();

        if !cfg.is_reachable(block) {
            for inst in insts {
                if !body.insts[inst].kind.is_label() && fuel.consume() {
                    log::trace!("dce: unreachable {}", body.inst_display(inst));
                    body.insts[inst].mark = true;
                }
            }
            continue;
        }

        // Walk backward keeping the live set exact, so a chain of dead
        // definitions within the block goes in one pass.
        let mut live = liveness.live_out(block).clone();
        for inst in insts {
            let kind = &body.insts[inst].kind;
            let dead = match kind.def() {
                Some(dst) => {
                    kind.is_pure()
                        && !kind.can_trap()
                        && !live.contains(&dst)
                        && !in_memory.contains(&dst)
                }
                None => false,
            };
            if dead && fuel.consume() {
                log::trace!("dce: dead {}", body.inst_display(inst));
                body.insts[inst].mark = true;
                continue;
            }
            LiveVars.transfer_inst(&mut live, body, inst);
        }
    }

    let removed = body.remove_marked();
    log::debug!("dce: removed {} instructions from {}", removed, body.name);
    removed
}
