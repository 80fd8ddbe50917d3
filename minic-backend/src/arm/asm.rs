//! A small typed model of the AArch64 instructions the emitter produces.

#[derive(PartialEq, Eq, Debug, Hash, Copy, Clone)]
pub enum Reg {
    W0,
    W1,
    W2,
    W3,
    W4,
    W5,
    W6,
    W7,
    W8,
    W9,
    W10,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::W0 => "w0",
            Reg::W1 => "w1",
            Reg::W2 => "w2",
            Reg::W3 => "w3",
            Reg::W4 => "w4",
            Reg::W5 => "w5",
            Reg::W6 => "w6",
            Reg::W7 => "w7",
            Reg::W8 => "w8",
            Reg::W9 => "w9",
            Reg::W10 => "w10",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl Cond {
    pub fn name(self) -> &'static str {
        match self {
            Cond::Eq => "eq",
            Cond::Ne => "ne",
            Cond::Lt => "lt",
            Cond::Gt => "gt",
            Cond::Le => "le",
            Cond::Ge => "ge",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Instruction {
    Label(String),
    /// `ldr reg, [sp, #offset]`
    Ldr(Reg, i32),
    /// `str reg, [sp, #offset]`
    Str(Reg, i32),
    /// `mov reg, #value` (a 16-bit move-wide immediate)
    MovImm(Reg, i32),
    /// `movk reg, #value, lsl #16`
    MovkImm(Reg, u16),
    Add(Reg, Reg, Reg),
    Sub(Reg, Reg, Reg),
    Mul(Reg, Reg, Reg),
    Sdiv(Reg, Reg, Reg),
    /// `msub d, a, b, c` computes `d = c - a*b`
    Msub(Reg, Reg, Reg, Reg),
    And(Reg, Reg, Reg),
    Orr(Reg, Reg, Reg),
    Eor(Reg, Reg, Reg),
    Cmp(Reg, Reg),
    CmpImm(Reg, i32),
    Cset(Reg, Cond),
    Cbz(Reg, String),
    Cbnz(Reg, String),
    B(String),
    Bl(String),
    /// `stp x29, x30, [sp, #-16]!`
    SaveFrame,
    /// `mov x29, sp`
    SetFrame,
    /// `sub sp, sp, #bytes`
    SubSp(i32),
    /// `add sp, sp, #bytes`
    AddSp(i32),
    /// `ldp x29, x30, [sp], #16`
    RestoreFrame,
    Ret,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
}
