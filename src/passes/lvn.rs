//! Local value numbering: constant folding and redundant expression
//! elimination within each block.

use crate::entity::EntityRef;
use crate::ir::*;
use crate::passes::Fuel;
use fxhash::{FxHashMap, FxHashSet};

pub fn run(body: &mut FunctionBody, fuel: &mut Fuel) -> usize {
    let in_memory = body.address_taken();
    let mut rewrites = 0;
    let blocks = body.blocks.iter().collect::<Vec<_>>();
    for block in blocks {
        let mut pass = LvnPass {
            in_memory: &in_memory,
            consts: FxHashMap::default(),
            exprs: FxHashMap::default(),
        };
        rewrites += pass.optimize(block, body, fuel);
    }
    log::debug!("lvn: {} rewrites in {}", rewrites, body.name);
    rewrites
}

/// A pure computation, keyed by operator and operands. Commutative
/// operands are put in a canonical order so `a + b` and `b + a` meet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Expr {
    Binary(BinaryOp, Operand, Operand),
    Unary(UnaryOp, Operand),
}

fn operand_rank(op: Operand) -> (u8, i64) {
    match op {
        Operand::Lit(value) => (0, value),
        Operand::Var(var) => (1, var.index() as i64),
    }
}

impl Expr {
    fn of(kind: &InstKind) -> Option<Expr> {
        match *kind {
            InstKind::Binary { op, lhs, rhs, .. } => {
                let (lhs, rhs) = if op.is_commutative() && operand_rank(rhs) < operand_rank(lhs) {
                    (rhs, lhs)
                } else {
                    (lhs, rhs)
                };
                Some(Expr::Binary(op, lhs, rhs))
            }
            InstKind::Unary { op, src, .. } => Some(Expr::Unary(op, src)),
            _ => None,
        }
    }

    fn mentions(&self, var: Var) -> bool {
        let var = Operand::Var(var);
        match *self {
            Expr::Binary(_, lhs, rhs) => lhs == var || rhs == var,
            Expr::Unary(_, src) => src == var,
        }
    }
}

struct LvnPass<'a> {
    in_memory: &'a FxHashSet<Var>,
    /// Variables holding a known literal at this point of the block.
    consts: FxHashMap<Var, i64>,
    /// Expressions already computed into a variable that still holds
    /// the result.
    exprs: FxHashMap<Expr, Var>,
}

impl<'a> LvnPass<'a> {
    fn optimize(&mut self, block: Block, body: &mut FunctionBody, fuel: &mut Fuel) -> usize {
        let mut rewrites = 0;
        let insts = body.block_insts(block).collect::<Vec<_>>();
        for inst in insts {
            // Substitute known constants.
            let consts = &self.consts;
            body.insts[inst].kind.update_uses(|op| {
                if let Operand::Var(var) = *op {
                    if let Some(&value) = consts.get(&var) {
                        if fuel.consume() {
                            *op = Operand::Lit(value);
                            rewrites += 1;
                        }
                    }
                }
            });

            let kind = body.insts[inst].kind.clone();
            let new_kind = match kind {
                InstKind::Binary { dst, .. } | InstKind::Unary { dst, .. } => {
                    match (self.fold(&kind), Expr::of(&kind)) {
                        (Some(value), _) => Some(InstKind::Assign {
                            dst,
                            src: Operand::Lit(value),
                        }),
                        (None, Some(expr)) => match self.exprs.get(&expr) {
                            Some(&prev) if prev != dst => Some(InstKind::Assign {
                                dst,
                                src: Operand::Var(prev),
                            }),
                            _ => None,
                        },
                        (None, None) => None,
                    }
                }
                _ => None,
            };
            if let Some(new_kind) = new_kind {
                if fuel.consume() {
                    body.insts[inst].kind = new_kind;
                    rewrites += 1;
                    log::trace!("lvn: {} now {}", inst, body.inst_display(inst));
                }
            }

            self.update_tables(&body.insts[inst].kind);
        }
        rewrites
    }

    fn fold(&self, kind: &InstKind) -> Option<i64> {
        match *kind {
            InstKind::Binary { op, lhs, rhs, .. } => op.eval(lhs.as_lit()?, rhs.as_lit()?),
            InstKind::Unary { op, src, .. } => Some(op.eval(src.as_lit()?)),
            _ => None,
        }
    }

    fn forget(&mut self, var: Var) {
        self.consts.remove(&var);
        self.exprs
            .retain(|expr, &mut holder| holder != var && !expr.mentions(var));
    }

    fn update_tables(&mut self, kind: &InstKind) {
        if let Some(dst) = kind.def() {
            self.forget(dst);
            if !self.in_memory.contains(&dst) {
                match *kind {
                    InstKind::Assign {
                        src: Operand::Lit(value),
                        ..
                    } => {
                        self.consts.insert(dst, value);
                    }
                    InstKind::Binary { .. } | InstKind::Unary { .. } => {
                        if let Some(expr) = Expr::of(kind) {
                            if !expr.mentions(dst) {
                                self.exprs.insert(expr, dst);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        if kind.clobbers_memory() {
            let in_memory = self.in_memory;
            for &var in in_memory {
                self.forget(var);
            }
        }
    }
}
