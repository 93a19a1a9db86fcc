use super::{Block, Inst, Var};
use crate::entity::EntityRef;

/// A source operand: a literal or a variable.
///
/// Operands deliberately do not implement `Ord`: only variables have a
/// meaningful order (allocation order), and literals never appear as
/// keys of an analysis fact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Lit(i64),
    Var(Var),
}

impl Operand {
    pub fn as_var(self) -> Option<Var> {
        match self {
            Operand::Var(var) => Some(var),
            Operand::Lit(_) => None,
        }
    }

    pub fn as_lit(self) -> Option<i64> {
        match self {
            Operand::Lit(value) => Some(value),
            Operand::Var(_) => None,
        }
    }
}

impl From<Var> for Operand {
    fn from(var: Var) -> Self {
        Operand::Var(var)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Lit(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    /// Constant-fold; `None` when the operation would trap.
    pub fn eval(self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            BinaryOp::Add => Some(lhs.wrapping_add(rhs)),
            BinaryOp::Sub => Some(lhs.wrapping_sub(rhs)),
            BinaryOp::Mul => Some(lhs.wrapping_mul(rhs)),
            BinaryOp::Div => lhs.checked_div(rhs),
        }
    }

    pub fn is_commutative(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Mul)
    }

    pub fn can_trap(self) -> bool {
        self == BinaryOp::Div
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn eval(self, lhs: i64, rhs: i64) -> bool {
        match self {
            RelOp::Eq => lhs == rhs,
            RelOp::Ne => lhs != rhs,
            RelOp::Lt => lhs < rhs,
            RelOp::Le => lhs <= rhs,
            RelOp::Gt => lhs > rhs,
            RelOp::Ge => lhs >= rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn eval(self, value: i64) -> i64 {
        match self {
            UnaryOp::Neg => value.wrapping_neg(),
            UnaryOp::Not => (value == 0) as i64,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

/// The instruction catalogue. Each variant carries exactly the fields
/// its kind needs; building a variant is the typed constructor.
///
/// Jump targets point at `Label` instructions. A target of
/// `Inst::invalid()` is a jump still waiting on a `PatchList`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstKind {
    Label,
    /// `dst := src`
    Assign { dst: Var, src: Operand },
    /// `dst := lhs op rhs`
    Binary {
        op: BinaryOp,
        dst: Var,
        lhs: Operand,
        rhs: Operand,
    },
    /// `dst := op src`
    Unary { op: UnaryOp, dst: Var, src: Operand },
    /// `dst := &var`
    AddrOf { dst: Var, var: Var },
    /// `dst := *addr`
    Load { dst: Var, addr: Operand },
    /// `*addr := src`
    Store { addr: Operand, src: Operand },
    Goto { target: Inst },
    /// `if lhs op rhs goto target`, falling through otherwise.
    Branch {
        op: RelOp,
        lhs: Operand,
        rhs: Operand,
        target: Inst,
    },
    Return { src: Operand },
    /// Reserve `size` bytes of storage named `var`.
    Dec { var: Var, size: u32 },
    /// Push an outgoing call argument.
    Arg { src: Operand },
    Call { dst: Var, func: String },
    /// Bind the next incoming parameter.
    Param { dst: Var },
    Read { dst: Var },
    Write { src: Operand },
}

impl InstKind {
    /// The variable this instruction writes, if any.
    pub fn def(&self) -> Option<Var> {
        match *self {
            InstKind::Assign { dst, .. }
            | InstKind::Binary { dst, .. }
            | InstKind::Unary { dst, .. }
            | InstKind::AddrOf { dst, .. }
            | InstKind::Load { dst, .. }
            | InstKind::Call { dst, .. }
            | InstKind::Param { dst }
            | InstKind::Read { dst } => Some(dst),
            InstKind::Label
            | InstKind::Store { .. }
            | InstKind::Goto { .. }
            | InstKind::Branch { .. }
            | InstKind::Return { .. }
            | InstKind::Dec { .. }
            | InstKind::Arg { .. }
            | InstKind::Write { .. } => None,
        }
    }

    /// Visit every source operand read by this instruction. The
    /// variable named by `AddrOf` is not a use: its address is taken,
    /// not its value.
    pub fn visit_uses<F: FnMut(Operand)>(&self, mut f: F) {
        match *self {
            InstKind::Assign { src, .. }
            | InstKind::Unary { src, .. }
            | InstKind::Return { src }
            | InstKind::Arg { src }
            | InstKind::Write { src } => f(src),
            InstKind::Binary { lhs, rhs, .. } | InstKind::Branch { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            InstKind::Load { addr, .. } => f(addr),
            InstKind::Store { addr, src } => {
                f(addr);
                f(src);
            }
            InstKind::Label
            | InstKind::AddrOf { .. }
            | InstKind::Goto { .. }
            | InstKind::Dec { .. }
            | InstKind::Call { .. }
            | InstKind::Param { .. }
            | InstKind::Read { .. } => {}
        }
    }

    pub fn update_uses<F: FnMut(&mut Operand)>(&mut self, mut f: F) {
        match self {
            InstKind::Assign { src, .. }
            | InstKind::Unary { src, .. }
            | InstKind::Return { src }
            | InstKind::Arg { src }
            | InstKind::Write { src } => f(src),
            InstKind::Binary { lhs, rhs, .. } | InstKind::Branch { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            InstKind::Load { addr, .. } => f(addr),
            InstKind::Store { addr, src } => {
                f(addr);
                f(src);
            }
            InstKind::Label
            | InstKind::AddrOf { .. }
            | InstKind::Goto { .. }
            | InstKind::Dec { .. }
            | InstKind::Call { .. }
            | InstKind::Param { .. }
            | InstKind::Read { .. } => {}
        }
    }

    /// `Some((dst, src))` for a plain variable-to-variable move.
    pub fn as_copy(&self) -> Option<(Var, Var)> {
        match *self {
            InstKind::Assign {
                dst,
                src: Operand::Var(src),
            } if dst != src => Some((dst, src)),
            _ => None,
        }
    }

    pub fn jump_target(&self) -> Option<Inst> {
        match *self {
            InstKind::Goto { target } | InstKind::Branch { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Backpatch a control transfer; returns `false` for any other
    /// kind.
    pub fn set_jump_target(&mut self, to: Inst) -> bool {
        match self {
            InstKind::Goto { target } | InstKind::Branch { target, .. } => {
                *target = to;
                true
            }
            _ => false,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, InstKind::Label)
    }

    /// Ends a block's straight-line run.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            InstKind::Goto { .. } | InstKind::Branch { .. } | InstKind::Return { .. }
        )
    }

    /// Free of side effects: removable when its result is unused.
    pub fn is_pure(&self) -> bool {
        matches!(
            self,
            InstKind::Assign { .. }
                | InstKind::Binary { .. }
                | InstKind::Unary { .. }
                | InstKind::AddrOf { .. }
                | InstKind::Load { .. }
        )
    }

    /// May fault at run time: a division whose divisor is not a known
    /// non-zero literal, or a memory access.
    pub fn can_trap(&self) -> bool {
        match *self {
            InstKind::Binary { op, rhs, .. } if op.can_trap() => {
                !matches!(rhs, Operand::Lit(value) if value != 0 && value != -1)
            }
            InstKind::Load { .. } | InstKind::Store { .. } => true,
            _ => false,
        }
    }

    /// May write memory that an address-taken variable lives in.
    pub fn clobbers_memory(&self) -> bool {
        matches!(self, InstKind::Store { .. } | InstKind::Call { .. })
    }
}

/// An instruction in the function's arena, with its list links.
#[derive(Clone, Debug)]
pub struct InstData {
    pub kind: InstKind,
    /// Staged for deletion by `InstList::remove_marked`.
    pub mark: bool,
    pub(crate) block: Block,
    pub(crate) prev: Inst,
    pub(crate) next: Inst,
}

impl InstData {
    pub fn new(kind: InstKind) -> Self {
        InstData {
            kind,
            mark: false,
            block: Block::invalid(),
            prev: Inst::invalid(),
            next: Inst::invalid(),
        }
    }

    /// The block whose list holds this instruction; invalid while the
    /// instruction is unplaced or lives in a detached list.
    pub fn block(&self) -> Block {
        self.block
    }

    pub fn prev(&self) -> Option<Inst> {
        self.prev.maybe_index().map(|_| self.prev)
    }

    pub fn next(&self) -> Option<Inst> {
        self.next.maybe_index().map(|_| self.next)
    }
}
