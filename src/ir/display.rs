//! Displaying IR as three-address code.

use super::{FunctionBody, Inst, InstKind, Operand, Var};
use crate::entity::EntityRef;

use std::fmt::{Display, Formatter, Result as FmtResult};

pub struct FunctionBodyDisplay<'a>(pub(crate) &'a FunctionBody, pub(crate) &'a str);

impl<'a> Display for FunctionBodyDisplay<'a> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        writeln!(f, "{}function {} {{", self.1, self.0.name)?;

        for (block_id, block) in self.0.blocks.entries() {
            let entry = if block_id == self.0.entry {
                " # entry"
            } else {
                ""
            };
            writeln!(f, "{}  {}:{}", self.1, block_id, entry)?;
            for &pred in &block.preds {
                writeln!(f, "{}    # pred: {}", self.1, pred)?;
            }
            for &succ in &block.succs {
                writeln!(f, "{}    # succ: {}", self.1, succ)?;
            }
            for inst in block.insts.iter(&self.0.insts) {
                let mark = if self.0.insts[inst].mark { " # marked" } else { "" };
                writeln!(
                    f,
                    "{}    {}{}",
                    self.1,
                    InstDisplay(self.0, inst),
                    mark
                )?;
            }
        }

        writeln!(f, "{}}}", self.1)?;

        Ok(())
    }
}

/// One instruction in its conventional textual form, e.g.
/// `x := y + #1` or `IF a < b GOTO label5`.
pub struct InstDisplay<'a>(pub(crate) &'a FunctionBody, pub(crate) Inst);

struct VarName<'a>(&'a FunctionBody, Var);

impl<'a> Display for VarName<'a> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self.0.vars.get(self.1).and_then(|data| data.name.as_deref()) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "t{}", self.1.index()),
        }
    }
}

struct OperandName<'a>(&'a FunctionBody, Operand);

impl<'a> Display for OperandName<'a> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self.1 {
            Operand::Lit(value) => write!(f, "#{}", value),
            Operand::Var(var) => write!(f, "{}", VarName(self.0, var)),
        }
    }
}

struct LabelName(Inst);

impl Display for LabelName {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self.0.maybe_index() {
            Some(index) => write!(f, "label{}", index),
            None => write!(f, "?"),
        }
    }
}

impl<'a> Display for InstDisplay<'a> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let body = self.0;
        let var = |v: Var| VarName(body, v);
        let op = |o: Operand| OperandName(body, o);
        match body.insts[self.1].kind {
            InstKind::Label => write!(f, "LABEL {} :", LabelName(self.1)),
            InstKind::Assign { dst, src } => write!(f, "{} := {}", var(dst), op(src)),
            InstKind::Binary {
                op: bop,
                dst,
                lhs,
                rhs,
            } => write!(
                f,
                "{} := {} {} {}",
                var(dst),
                op(lhs),
                bop.symbol(),
                op(rhs)
            ),
            InstKind::Unary { op: uop, dst, src } => {
                write!(f, "{} := {}{}", var(dst), uop.symbol(), op(src))
            }
            InstKind::AddrOf { dst, var: v } => write!(f, "{} := &{}", var(dst), var(v)),
            InstKind::Load { dst, addr } => write!(f, "{} := *{}", var(dst), op(addr)),
            InstKind::Store { addr, src } => write!(f, "*{} := {}", op(addr), op(src)),
            InstKind::Goto { target } => write!(f, "GOTO {}", LabelName(target)),
            InstKind::Branch {
                op: rop,
                lhs,
                rhs,
                target,
            } => write!(
                f,
                "IF {} {} {} GOTO {}",
                op(lhs),
                rop.symbol(),
                op(rhs),
                LabelName(target)
            ),
            InstKind::Return { src } => write!(f, "RETURN {}", op(src)),
            InstKind::Dec { var: v, size } => write!(f, "DEC {} {}", var(v), size),
            InstKind::Arg { src } => write!(f, "ARG {}", op(src)),
            InstKind::Call { dst, ref func } => write!(f, "{} := CALL {}", var(dst), func),
            InstKind::Param { dst } => write!(f, "PARAM {}", var(dst)),
            InstKind::Read { dst } => write!(f, "READ {}", var(dst)),
            InstKind::Write { src } => write!(f, "WRITE {}", op(src)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::{BinaryOp, RelOp};

    #[test]
    fn textual_forms() {
        let mut body = FunctionBody::new("f");
        let x = body.add_var("x");
        let t = body.add_temp();
        let label = body.add_inst(InstKind::Label);
        let add = body.add_inst(InstKind::Binary {
            op: BinaryOp::Add,
            dst: t,
            lhs: Operand::Var(x),
            rhs: Operand::Lit(1),
        });
        let br = body.add_inst(InstKind::Branch {
            op: RelOp::Lt,
            lhs: Operand::Var(t),
            rhs: Operand::Lit(10),
            target: label,
        });
        let store = body.add_inst(InstKind::Store {
            addr: Operand::Var(x),
            src: Operand::Var(t),
        });
        let call = body.add_inst(InstKind::Call {
            dst: t,
            func: "g".to_owned(),
        });
        assert_eq!(body.inst_display(label).to_string(), "LABEL label0 :");
        assert_eq!(body.inst_display(add).to_string(), "t1 := x + #1");
        assert_eq!(
            body.inst_display(br).to_string(),
            "IF t1 < #10 GOTO label0"
        );
        assert_eq!(body.inst_display(store).to_string(), "*x := t1");
        assert_eq!(body.inst_display(call).to_string(), "t1 := CALL g");

        let entry = body.entry;
        body.append(entry, label);
        body.append(entry, add);
        let text = body.display("").to_string();
        assert!(text.starts_with("function f {\n  block0: # entry\n"));
        assert!(text.contains("    t1 := x + #1\n"));
    }
}
