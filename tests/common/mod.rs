//! CFG-building helpers shared by the integration tests.

#![allow(dead_code)]

use tacopt::entity::EntityRef;
use tacopt::*;

pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Append an instruction to `block`.
pub fn emit(body: &mut FunctionBody, block: Block, kind: InstKind) -> Inst {
    let inst = body.add_inst(kind);
    body.append(block, inst);
    inst
}

pub fn label(body: &mut FunctionBody, block: Block) -> Inst {
    emit(body, block, InstKind::Label)
}

pub fn copy(dst: Var, src: Var) -> InstKind {
    InstKind::Assign {
        dst,
        src: Operand::Var(src),
    }
}

pub fn write(src: Var) -> InstKind {
    InstKind::Write {
        src: Operand::Var(src),
    }
}

pub fn ret() -> InstKind {
    InstKind::Return {
        src: Operand::Lit(0),
    }
}

/// `n` blocks, each flowing into the next; the first is the entry.
pub fn chain(n: usize) -> (FunctionBody, Vec<Block>) {
    let mut body = FunctionBody::new("chain");
    let mut blocks = vec![body.entry];
    for _ in 1..n {
        let next = body.add_block();
        let prev = *blocks.last().unwrap();
        body.add_edge(prev, next);
        blocks.push(next);
    }
    (body, blocks)
}

/// Entry `a` branching to `b` and `c`, which rejoin at `d`. Edges
/// only; callers fill in instructions.
pub fn diamond() -> (FunctionBody, [Block; 4]) {
    let mut body = FunctionBody::new("diamond");
    let a = body.entry;
    let b = body.add_block();
    let c = body.add_block();
    let d = body.add_block();
    body.add_edge(a, b);
    body.add_edge(a, c);
    body.add_edge(b, d);
    body.add_edge(c, d);
    (body, [a, b, c, d])
}

/// Fill a `diamond()` with real control flow: `a` reads `x` and
/// branches on it to `c`, falling through to `b`; `b` jumps to `d`.
/// Returns the branch and goto so callers can find them.
pub fn diamond_jumps(body: &mut FunctionBody, blocks: [Block; 4], x: Var) -> (Inst, Inst) {
    let [a, b, c, d] = blocks;
    emit(body, a, InstKind::Read { dst: x });
    let br = emit(
        body,
        a,
        InstKind::Branch {
            op: RelOp::Lt,
            lhs: Operand::Var(x),
            rhs: Operand::Lit(0),
            target: Inst::invalid(),
        },
    );
    let goto = body.add_inst(InstKind::Goto {
        target: Inst::invalid(),
    });
    let to_c = label(body, c);
    let to_d = label(body, d);
    PatchList::single(br).resolve(body, to_c);
    PatchList::single(goto).resolve(body, to_d);
    // The goto closes `b`; callers append `b`'s body in front of it.
    body.append(b, goto);
    (br, goto)
}

pub fn insts_of(body: &FunctionBody, block: Block) -> Vec<String> {
    body.block_insts(block)
        .map(|inst| body.inst_display(inst).to_string())
        .collect()
}
