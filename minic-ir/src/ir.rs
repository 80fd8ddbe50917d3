//! The three-address intermediate representation.
//!
//! Each function is a control flow graph of basic blocks. Blocks are stored
//! in an arena (`Function::blocks`) and refer to their successors by dense
//! index, so ownership stays simple even though the graph has cycles of
//! references conceptually.

use std::fmt;


#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
}

/// A function together with its control flow graph.
///
/// `blocks[0]` is always the entry block. `symbol_count` is the number of
/// stack slots the function uses (named locals and temporaries); the
/// backends derive the frame size from it.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub blocks: Vec<Block>,
    pub symbol_count: u32,
}

impl Function {
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }
}

/// An index into `Function::blocks`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Copy, Clone)]
pub struct BlockId(pub u32);

/// A stack slot holding one 32-bit value. Named locals and temporaries
/// share the same dense index space within a function.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Copy, Clone)]
pub struct Slot(pub u32);

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "!{}", self.0)
    }
}

/// An instruction operand: either a stack slot or one of the incoming
/// arguments of the enclosing function. Argument operands appear only in
/// the parameter-binding copies emitted at function entry; the backend maps
/// them to the target's calling convention (a register for the first few,
/// an incoming stack slot beyond that).
#[derive(PartialEq, Eq, Debug, Hash, Copy, Clone)]
pub enum Operand {
    Slot(Slot),
    Arg(u8),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Operand::Slot(slot) => write!(f, "{}", slot),
            Operand::Arg(index) => write!(f, "arg{}", index),
        }
    }
}

#[derive(PartialEq, Eq, Debug, Hash, Copy, Clone)]
pub enum IntOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(PartialEq, Eq, Debug, Hash, Copy, Clone)]
pub enum BitOp {
    And,
    Or,
    Xor,
}

/// Comparison predicates; the result is always 0 or 1.
#[derive(PartialEq, Eq, Debug, Hash, Copy, Clone)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(PartialEq, Eq, Debug, Hash, Clone)]
pub enum Instruction {
    /// `dst <- constant`
    LdConst(Slot, i32),
    /// `dst <- a op b`, signed 32-bit arithmetic
    IntOp(Slot, IntOp, Operand, Operand),
    /// `dst <- a op b`, bitwise
    BitOp(Slot, BitOp, Operand, Operand),
    /// `dst <- 1` if the predicate holds, else `dst <- 0`
    Cmp(Slot, Cond, Operand, Operand),
    /// `dst <- 1` if the operand is zero, else `dst <- 0`
    Not(Slot, Operand),
    /// `dst <- a && b` as 0/1; the backend expands this into a branched
    /// sequence that skips the second test when the first operand is zero
    LogicalAnd(Slot, Operand, Operand),
    /// `dst <- a || b` as 0/1, mirrored form of `LogicalAnd`
    LogicalOr(Slot, Operand, Operand),
    /// memory read: `dst <- src`
    Rmem(Slot, Operand),
    /// memory write: `dst <- src`; same copy as `Rmem`, used in assignment
    /// and parameter-binding positions
    Wmem(Slot, Operand),
    /// `dst <- name(args...)` following the target calling convention
    Call(String, Slot, Vec<Operand>),
    /// return the value of the operand to the caller
    Ret(Operand),
}

impl Instruction {
    /// The slot this instruction writes, if any. The conditional-branch
    /// terminator tests the destination of the last such instruction in
    /// its block.
    pub fn dest(&self) -> Option<Slot> {
        match *self {
            Instruction::LdConst(dst, _) |
            Instruction::IntOp(dst, _, _, _) |
            Instruction::BitOp(dst, _, _, _) |
            Instruction::Cmp(dst, _, _, _) |
            Instruction::Not(dst, _) |
            Instruction::LogicalAnd(dst, _, _) |
            Instruction::LogicalOr(dst, _, _) |
            Instruction::Rmem(dst, _) |
            Instruction::Wmem(dst, _) |
            Instruction::Call(_, dst, _) => Some(dst),
            Instruction::Ret(_) => None,
        }
    }

    pub fn is_ret(&self) -> bool {
        match *self {
            Instruction::Ret(_) => true,
            _ => false,
        }
    }
}

/// A basic block: a label, straight-line instructions, and up to two exit
/// edges.
///
/// The edges encode the terminator:
///
/// * both `None`: the block ends with a `ret`, or control falls off the
///   function tail;
/// * `exit_true` only: an unconditional branch;
/// * both set: the result of the last computation is compared with zero,
///   branching to `exit_false` when it is zero and to `exit_true` otherwise.
#[derive(Debug, Clone)]
pub struct Block {
    pub label: String,
    pub ops: Vec<Instruction>,
    pub exit_true: Option<BlockId>,
    pub exit_false: Option<BlockId>,
}

impl Block {
    pub fn new(label: String) -> Block {
        Block {
            label,
            ops: Vec::new(),
            exit_true: None,
            exit_false: None,
        }
    }

    /// Whether this block ends in a `ret`. Instructions after a `ret` are
    /// never emitted, so the builder keeps `ret` last.
    pub fn returns(&self) -> bool {
        self.ops.last().map(Instruction::is_ret).unwrap_or(false)
    }

    /// The slot tested by a conditional terminator: the destination of the
    /// last value-producing instruction.
    pub fn condition_slot(&self) -> Option<Slot> {
        self.ops.iter().rev().filter_map(Instruction::dest).next()
    }
}
