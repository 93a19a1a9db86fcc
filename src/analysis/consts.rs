//! Constant facts: variables known to hold one literal value.

use crate::ir::*;
use crate::pass::*;
use fxhash::FxHashSet;

pub type ConstFact = MapFact<Var, i64>;

/// Forward must-analysis mapping variables to the constant they hold
/// on every incoming path. Joins keep only the bindings all incoming
/// paths agree on.
pub struct ConstAnalysis {
    address_taken: FxHashSet<Var>,
}

impl ConstAnalysis {
    pub fn new(body: &FunctionBody) -> Self {
        ConstAnalysis {
            address_taken: body.address_taken(),
        }
    }

    pub fn operand(fact: &ConstFact, op: Operand) -> Option<i64> {
        match op {
            Operand::Lit(value) => Some(value),
            Operand::Var(var) => fact.get(&var).copied(),
        }
    }

    /// The value `kind` writes to its destination, if it folds.
    pub fn eval(fact: &ConstFact, kind: &InstKind) -> Option<i64> {
        match *kind {
            InstKind::Assign { src, .. } => Self::operand(fact, src),
            InstKind::Binary { op, lhs, rhs, .. } => {
                op.eval(Self::operand(fact, lhs)?, Self::operand(fact, rhs)?)
            }
            InstKind::Unary { op, src, .. } => Some(op.eval(Self::operand(fact, src)?)),
            _ => None,
        }
    }
}

impl Analysis for ConstAnalysis {
    type Fact = ConstFact;

    const DIRECTION: Direction = Direction::Forward;
    const TAG: FactTag = FactTag(0xcc_u32);

    fn init(&self, _body: &FunctionBody) -> ConstFact {
        MapFact::Top
    }

    fn boundary(&self, _body: &FunctionBody) -> ConstFact {
        MapFact::empty()
    }

    fn merge(&self, into: &mut ConstFact, other: &ConstFact) -> bool {
        into.meet_with(other)
    }

    fn transfer_inst(&self, fact: &mut ConstFact, body: &FunctionBody, inst: Inst) {
        let kind = &body.insts[inst].kind;
        if let Some(dst) = kind.def() {
            let value = Self::eval(fact, kind);
            fact.set(dst, value);
        }
        if kind.clobbers_memory() {
            for &var in &self.address_taken {
                fact.set(var, None);
            }
        }
    }
}
