//! Liveness analysis.

use crate::ir::*;
use crate::ordmap::OrderedSet;
use crate::pass::*;

/// Backward may-analysis: a variable is live at a point if some path
/// from there reads it before writing it.
pub struct LiveVars;

impl Analysis for LiveVars {
    type Fact = OrderedSet<Var>;

    const DIRECTION: Direction = Direction::Backward;
    const TAG: FactTag = FactTag(0x1e_u32);

    fn init(&self, _body: &FunctionBody) -> OrderedSet<Var> {
        OrderedSet::new()
    }

    fn merge(&self, into: &mut OrderedSet<Var>, other: &OrderedSet<Var>) -> bool {
        Meet::Union.apply(into, other)
    }

    fn transfer_inst(&self, live: &mut OrderedSet<Var>, body: &FunctionBody, inst: Inst) {
        let kind = &body.insts[inst].kind;
        if let Some(def) = kind.def() {
            live.remove(&def);
        }
        kind.visit_uses(|op| {
            if let Operand::Var(var) = op {
                live.insert(var);
            }
        });
    }
}

#[derive(Clone, Debug)]
pub struct Liveness(BlockFacts<OrderedSet<Var>>);

impl Liveness {
    pub fn compute(body: &FunctionBody) -> Liveness {
        Liveness(analyze(&LiveVars, body))
    }

    pub fn live_in(&self, block: Block) -> &OrderedSet<Var> {
        self.0.fact_in(block)
    }

    pub fn live_out(&self, block: Block) -> &OrderedSet<Var> {
        self.0.fact_out(block)
    }
}
