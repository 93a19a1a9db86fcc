//! Individual cleanup passes and the full pipeline.

mod common;

use common::*;
use tacopt::passes::{const_prop, dce, licm};
use tacopt::*;

#[test]
fn straight_line_folds_away() {
    init_logging();
    let mut body = FunctionBody::new("f");
    let entry = body.entry;
    let a = body.add_var("a");
    let b = body.add_var("b");
    emit(
        &mut body,
        entry,
        InstKind::Assign {
            dst: a,
            src: Operand::Lit(2),
        },
    );
    emit(
        &mut body,
        entry,
        InstKind::Binary {
            op: BinaryOp::Add,
            dst: b,
            lhs: Operand::Var(a),
            rhs: Operand::Lit(3),
        },
    );
    emit(&mut body, entry, write(b));
    emit(&mut body, entry, ret());

    let stats = optimize(&mut body, &OptOptions::default());
    assert_eq!(insts_of(&body, entry), vec!["WRITE #5", "RETURN #0"]);
    assert_eq!(stats.lvn, 3);
    assert_eq!(stats.dce, 2);
    body.validate().unwrap();
}

#[test]
fn copy_chain_cleanup_needs_the_mop_up_round() {
    init_logging();
    let build = || {
        let mut body = FunctionBody::new("f");
        let entry = body.entry;
        let x = body.add_var("x");
        let t1 = body.add_var("t1");
        let t2 = body.add_var("t2");
        emit(&mut body, entry, InstKind::Read { dst: x });
        emit(&mut body, entry, copy(t1, x));
        emit(&mut body, entry, copy(t2, t1));
        emit(&mut body, entry, write(t2));
        emit(&mut body, entry, ret());
        body
    };

    let mut body = build();
    let opts = OptOptions {
        rounds: 0,
        ..OptOptions::default()
    };
    let stats = optimize(&mut body, &opts);
    assert_eq!(stats.copy_rewrite, 1);
    assert_eq!(stats.dce, 0);
    assert_eq!(
        insts_of(&body, body.entry),
        vec!["READ x", "t1 := x", "t2 := t1", "WRITE t1", "RETURN #0"]
    );

    let mut body = build();
    let stats = optimize(&mut body, &OptOptions::default());
    assert_eq!(stats.copy_rewrite, 1);
    assert_eq!(stats.dce, 1);
    assert_eq!(
        insts_of(&body, body.entry),
        vec!["READ x", "t1 := x", "WRITE t1", "RETURN #0"]
    );
}

#[test]
fn disabled_pipeline_is_identity() {
    let (mut body, blocks) = diamond();
    let x = body.add_var("x");
    let y = body.add_var("y");
    diamond_jumps(&mut body, blocks, x);
    emit(&mut body, blocks[3], copy(y, x));
    emit(&mut body, blocks[3], ret());
    let before = body.display("").to_string();

    let stats = optimize(&mut body, &OptOptions::none());
    assert_eq!(stats, OptStats::default());
    assert_eq!(body.display("").to_string(), before);

    let opts = OptOptions {
        fuel: Fuel::limited(0),
        ..OptOptions::default()
    };
    let stats = optimize(&mut body, &opts);
    assert_eq!(stats.total(), 0);
    assert!(stats.fuel_consumed > 0);
    assert_eq!(body.display("").to_string(), before);
}

#[test]
fn constants_meet_at_join() {
    init_logging();
    let build = |other_arm: i64| {
        let (mut body, blocks) = diamond();
        let [_, _, c, d] = blocks;
        let x = body.add_var("x");
        let k = body.add_var("k");
        let (_, goto) = diamond_jumps(&mut body, blocks, x);
        let set_b = body.add_inst(InstKind::Assign {
            dst: k,
            src: Operand::Lit(7),
        });
        body.insert_before(goto, set_b);
        emit(
            &mut body,
            c,
            InstKind::Assign {
                dst: k,
                src: Operand::Lit(other_arm),
            },
        );
        let use_k = emit(&mut body, d, write(k));
        emit(&mut body, d, ret());
        (body, use_k, k)
    };

    let (mut body, use_k, _) = build(7);
    assert_eq!(const_prop::run(&mut body, &mut Fuel::infinite()), 1);
    assert_eq!(
        body.insts[use_k].kind,
        InstKind::Write {
            src: Operand::Lit(7)
        }
    );

    let (mut body, use_k, k) = build(8);
    assert_eq!(const_prop::run(&mut body, &mut Fuel::infinite()), 0);
    assert_eq!(body.insts[use_k].kind, write(k));
}

#[test]
fn dce_clears_unreachable_blocks_but_keeps_labels() {
    let (mut body, blocks) = chain(2);
    let x = body.add_var("x");
    let dead = body.add_block();
    body.add_edge(dead, blocks[1]);
    let landing = label(&mut body, blocks[1]);
    emit(&mut body, blocks[0], InstKind::Read { dst: x });
    emit(&mut body, blocks[1], write(x));
    emit(&mut body, blocks[1], ret());
    let dead_label = label(&mut body, dead);
    emit(&mut body, dead, InstKind::Read { dst: x });
    emit(&mut body, dead, InstKind::Goto { target: landing });

    assert_eq!(dce::run(&mut body, &mut Fuel::infinite()), 2);
    assert_eq!(body.block_insts(dead).collect::<Vec<_>>(), vec![dead_label]);
    assert_eq!(insts_of(&body, blocks[1]).len(), 3);
    body.validate().unwrap();
}

#[test]
fn dce_keeps_side_effects_and_memory() {
    let mut body = FunctionBody::new("f");
    let entry = body.entry;
    let x = body.add_var("x");
    let y = body.add_var("y");
    let m = body.add_var("m");
    let q = body.add_var("q");
    emit(&mut body, entry, InstKind::Read { dst: x });
    // Dead but may divide by zero.
    emit(
        &mut body,
        entry,
        InstKind::Binary {
            op: BinaryOp::Div,
            dst: y,
            lhs: Operand::Lit(1),
            rhs: Operand::Var(x),
        },
    );
    emit(&mut body, entry, InstKind::Dec { var: m, size: 8 });
    // Dead by liveness, but `m` lives in memory.
    emit(
        &mut body,
        entry,
        InstKind::Assign {
            dst: m,
            src: Operand::Var(x),
        },
    );
    // Truly dead.
    emit(
        &mut body,
        entry,
        InstKind::Binary {
            op: BinaryOp::Mul,
            dst: q,
            lhs: Operand::Var(x),
            rhs: Operand::Var(x),
        },
    );
    emit(&mut body, entry, ret());

    assert_eq!(dce::run(&mut body, &mut Fuel::infinite()), 1);
    assert_eq!(
        insts_of(&body, entry),
        vec!["READ x", "y := #1 / x", "DEC m 8", "m := x", "RETURN #0"]
    );
}

/// entry: READ n; i := #0; GOTO head
/// head:  LABEL; IF i >= n GOTO exit
/// body:  t := n * #4; i := i + #1; WRITE t; GOTO head
/// exit:  LABEL; RETURN #0
fn counted_loop() -> (FunctionBody, [Block; 4], Inst) {
    let mut body = FunctionBody::new("loop");
    let entry = body.entry;
    let head = body.add_block();
    let lbody = body.add_block();
    let exit = body.add_block();
    body.add_edge(entry, head);
    body.add_edge(head, lbody);
    body.add_edge(head, exit);
    body.add_edge(lbody, head);

    let n = body.add_var("n");
    let i = body.add_var("i");
    let t = body.add_var("t");
    let head_label = body.add_inst(InstKind::Label);
    let exit_label = body.add_inst(InstKind::Label);

    emit(&mut body, entry, InstKind::Read { dst: n });
    emit(
        &mut body,
        entry,
        InstKind::Assign {
            dst: i,
            src: Operand::Lit(0),
        },
    );
    emit(&mut body, entry, InstKind::Goto { target: head_label });

    body.append(head, head_label);
    emit(
        &mut body,
        head,
        InstKind::Branch {
            op: RelOp::Ge,
            lhs: Operand::Var(i),
            rhs: Operand::Var(n),
            target: exit_label,
        },
    );

    let invariant = emit(
        &mut body,
        lbody,
        InstKind::Binary {
            op: BinaryOp::Mul,
            dst: t,
            lhs: Operand::Var(n),
            rhs: Operand::Lit(4),
        },
    );
    emit(
        &mut body,
        lbody,
        InstKind::Binary {
            op: BinaryOp::Add,
            dst: i,
            lhs: Operand::Var(i),
            rhs: Operand::Lit(1),
        },
    );
    emit(&mut body, lbody, write(t));
    emit(&mut body, lbody, InstKind::Goto { target: head_label });

    body.append(exit, exit_label);
    emit(&mut body, exit, ret());

    (body, [entry, head, lbody, exit], invariant)
}

#[test]
fn licm_hoists_invariant_product() {
    init_logging();
    let (mut body, [entry, _, lbody, _], invariant) = counted_loop();
    assert_eq!(licm::run(&mut body, &mut Fuel::infinite()), 1);
    assert_eq!(body.insts[invariant].block(), entry);
    assert_eq!(
        insts_of(&body, entry),
        vec!["READ n", "i := #0", "t := n * #4", "GOTO label0"]
    );
    assert_eq!(
        insts_of(&body, lbody),
        vec!["i := i + #1", "WRITE t", "GOTO label0"]
    );
    body.validate().unwrap();

    // Nothing left to move.
    assert_eq!(licm::run(&mut body, &mut Fuel::infinite()), 0);
}

#[test]
fn licm_leaves_values_live_at_exit_alone() {
    let (mut body, [_, _, lbody, exit], invariant) = counted_loop();
    // `t` is now read after the loop, which it can leave without
    // running the body.
    let t = body.insts[invariant].kind.def().unwrap();
    let ret = body.terminator(exit).unwrap();
    let use_t = body.add_inst(write(t));
    body.insert_before(ret, use_t);

    assert_eq!(licm::run(&mut body, &mut Fuel::infinite()), 0);
    assert_eq!(body.insts[invariant].block(), lbody);
}
