//! Global constant propagation and folding.

use crate::analysis::ConstAnalysis;
use crate::ir::*;
use crate::pass::{analyze, Analysis};
use crate::passes::Fuel;

/// Replace uses of variables known to be constant with the literal,
/// then fold arithmetic whose operands are all literal into a plain
/// assignment. Branches are left in place even when their outcome is
/// known, since edges never change here. Returns the number of
/// rewrites (operands substituted plus instructions folded).
pub fn run(body: &mut FunctionBody, fuel: &mut Fuel) -> usize {
    let analysis = ConstAnalysis::new(body);
    let facts = analyze(&analysis, body);
    let mut rewrites = 0;

    let blocks = body.blocks.iter().collect::<Vec<_>>();
    for block in blocks {
        let mut fact = facts.fact_in(block).clone();
        if fact.is_top() {
            // Unreachable.
            continue;
        }
        let insts = body.block_insts(block).collect::<Vec<_>>();
        for inst in insts {
            body.insts[inst].kind.update_uses(|op| {
                if let Operand::Var(var) = *op {
                    if let Some(&value) = fact.get(&var) {
                        if fuel.consume() {
                            *op = Operand::Lit(value);
                            rewrites += 1;
                        }
                    }
                }
            });

            let kind = &body.insts[inst].kind;
            let folded = match *kind {
                InstKind::Binary { dst, .. } | InstKind::Unary { dst, .. } => {
                    ConstAnalysis::eval(&fact, kind).map(|value| (dst, value))
                }
                _ => None,
            };
            if let Some((dst, value)) = folded {
                if fuel.consume() {
                    body.insts[inst].kind = InstKind::Assign {
                        dst,
                        src: Operand::Lit(value),
                    };
                    rewrites += 1;
                    log::trace!("const_prop: folded {}", body.inst_display(inst));
                }
            }

            analysis.transfer_inst(&mut fact, body, inst);
        }
    }

    log::debug!("const_prop: {} rewrites in {}", rewrites, body.name);
    rewrites
}
