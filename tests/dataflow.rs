//! The worklist solver and the analyses built on it.

mod common;

use common::*;
use tacopt::analysis::{DominatorAnalysis, Dominators, Liveness, ReachingCopies};
use tacopt::pass::{analyze, Analysis, BlockFacts, Direction, FactTag, Meet, Solver};
use tacopt::*;

fn doms_of(body: &FunctionBody, block: Block) -> Vec<Block> {
    Dominators::compute(body).dominators(block).to_sorted_vec()
}

#[test]
fn dominators_of_chain() {
    init_logging();
    let (body, blocks) = chain(3);
    let [a, b, c] = [blocks[0], blocks[1], blocks[2]];
    assert_eq!(doms_of(&body, a), vec![a]);
    assert_eq!(doms_of(&body, b), vec![a, b]);
    assert_eq!(doms_of(&body, c), vec![a, b, c]);
}

#[test]
fn dominators_of_diamond() {
    init_logging();
    let (body, [a, b, c, d]) = diamond();
    assert_eq!(doms_of(&body, d), vec![a, d]);
    assert_eq!(doms_of(&body, b), vec![a, b]);
    assert_eq!(doms_of(&body, c), vec![a, c]);
}

#[test]
fn dominators_with_loop_back_to_entry() {
    init_logging();
    let (mut body, blocks) = chain(3);
    body.add_edge(blocks[2], blocks[0]);
    assert_eq!(doms_of(&body, blocks[0]), vec![blocks[0]]);
    assert_eq!(doms_of(&body, blocks[2]), blocks);
}

#[test]
fn resolving_converged_facts_changes_nothing() {
    init_logging();
    let (mut body, [a, b, _, d]) = diamond();
    body.add_edge(d, a);
    body.add_edge(b, b);

    let analysis = DominatorAnalysis::new(&body);
    let mut facts = BlockFacts::new(&analysis, &body);
    let mut solver = Solver::new();
    let first = solver.solve(&analysis, &body, &mut facts);
    assert!(first.updates > 0);
    let snapshot = facts.block_out.clone().into_vec();

    let second = solver.solve(&analysis, &body, &mut facts);
    assert_eq!(second.updates, 0);
    assert_eq!(second.visits, body.blocks.len());
    assert_eq!(facts.block_out.into_vec(), snapshot);
}

#[test]
fn unreachable_block_is_dominated_by_everything() {
    let (mut body, [a, _, _, d]) = diamond();
    let dead = body.add_block();
    body.add_edge(dead, d);
    let doms = Dominators::compute(&body);
    assert_eq!(doms.dominators(d).to_sorted_vec(), vec![a, d]);
    assert_eq!(doms.dominators(dead).len(), body.blocks.len());
    assert_eq!(doms.idom(dead), None);
}

/// An analysis with the same fact type as dominators but its own tag.
struct Reachable;

impl Analysis for Reachable {
    type Fact = OrderedSet<Block>;
    const DIRECTION: Direction = Direction::Forward;
    const TAG: FactTag = FactTag(0x7e57);

    fn init(&self, _body: &FunctionBody) -> OrderedSet<Block> {
        OrderedSet::new()
    }

    fn merge(&self, into: &mut OrderedSet<Block>, other: &OrderedSet<Block>) -> bool {
        Meet::Union.apply(into, other)
    }

    fn transfer_block(&self, fact: &mut OrderedSet<Block>, _body: &FunctionBody, block: Block) {
        fact.insert(block);
    }
}

#[test]
fn custom_union_analysis() {
    let (body, [a, b, c, d]) = diamond();
    let facts = analyze(&Reachable, &body);
    // Blocks on some path from the entry to the end of `d`.
    assert_eq!(facts.fact_out(d).to_sorted_vec(), vec![a, b, c, d]);
    assert_eq!(facts.fact_in(b).to_sorted_vec(), vec![a]);
}

#[test]
#[should_panic(expected = "different analysis")]
fn tag_mismatch_is_fatal() {
    let (body, _) = diamond();
    let mut facts = BlockFacts::new(&DominatorAnalysis::new(&body), &body);
    Solver::new().solve(&Reachable, &body, &mut facts);
}

#[test]
#[should_panic(expected = "slots")]
fn stale_fact_arrays_are_fatal() {
    let (mut body, _) = diamond();
    let analysis = DominatorAnalysis::new(&body);
    let mut facts = BlockFacts::new(&analysis, &body);
    body.add_block();
    Solver::new().solve(&analysis, &body, &mut facts);
}

#[test]
#[should_panic(expected = "malformed function body")]
fn unresolved_jump_is_fatal() {
    let (mut body, [a, ..]) = diamond();
    emit(
        &mut body,
        a,
        InstKind::Goto {
            target: <Inst as tacopt::entity::EntityRef>::invalid(),
        },
    );
    Dominators::compute(&body);
}

#[test]
fn liveness_around_loop() {
    init_logging();
    // a: i := 0 ; b: IF i >= n GOTO d ; c: i := i + 1, back to b ; d: WRITE i
    let (mut body, blocks) = chain(2);
    let [a, b] = [blocks[0], blocks[1]];
    let c = body.add_block();
    let d = body.add_block();
    body.add_edge(b, c);
    body.add_edge(b, d);
    body.add_edge(c, b);

    let i = body.add_var("i");
    let n = body.add_var("n");
    emit(&mut body, a, InstKind::Read { dst: n });
    emit(
        &mut body,
        a,
        InstKind::Assign {
            dst: i,
            src: Operand::Lit(0),
        },
    );
    let head = label(&mut body, b);
    let exit = body.add_inst(InstKind::Label);
    emit(
        &mut body,
        b,
        InstKind::Branch {
            op: RelOp::Ge,
            lhs: Operand::Var(i),
            rhs: Operand::Var(n),
            target: exit,
        },
    );
    emit(
        &mut body,
        c,
        InstKind::Binary {
            op: BinaryOp::Add,
            dst: i,
            lhs: Operand::Var(i),
            rhs: Operand::Lit(1),
        },
    );
    emit(&mut body, c, InstKind::Goto { target: head });
    body.append(d, exit);
    emit(&mut body, d, write(i));

    let live = Liveness::compute(&body);
    assert!(live.live_in(a).is_empty());
    assert_eq!(live.live_in(b).to_sorted_vec(), vec![i, n]);
    assert_eq!(live.live_out(c).to_sorted_vec(), vec![i, n]);
    assert_eq!(live.live_in(d).to_sorted_vec(), vec![i]);
    assert!(live.live_out(d).is_empty());
}

#[test]
fn copies_reaching_a_join() {
    init_logging();
    let (mut body, blocks) = diamond();
    let [a, b, c, d] = blocks;
    let x = body.add_var("x");
    let y = body.add_var("y");
    let z = body.add_var("z");
    let (br, goto) = diamond_jumps(&mut body, blocks, x);

    // Made before the branch: holds at the join.
    let before = body.add_inst(copy(y, x));
    body.insert_before(br, before);
    // Made on one arm only: does not.
    let one_arm = body.add_inst(copy(z, x));
    body.insert_before(goto, one_arm);
    emit(&mut body, c, InstKind::Read { dst: z });
    emit(&mut body, d, write(y));
    emit(&mut body, d, write(z));
    emit(&mut body, d, ret());

    let copies = ReachingCopies::compute(&body);
    assert_eq!(copies.facts.fact_in(a).len(), 0);
    assert_eq!(copies.facts.fact_out(b).to_sorted_vec(), vec![before, one_arm]);
    assert_eq!(copies.facts.fact_in(d).to_sorted_vec(), vec![before]);
    assert_eq!(copies.analysis.copy(before), Some((y, x)));
    assert_eq!(
        copies.analysis.source_of(copies.facts.fact_in(d), y),
        Some(x)
    );
    assert_eq!(copies.analysis.source_of(copies.facts.fact_in(d), z), None);
}
