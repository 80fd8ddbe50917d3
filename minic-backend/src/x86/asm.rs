//! A small typed model of the x86-64 instructions the emitter produces.

#[derive(PartialEq, Eq, Debug, Hash, Copy, Clone)]
pub enum Reg {
    Eax,
    Ecx,
    Edx,
    Esi,
    Edi,
    R8d,
    R9d,
    Rax,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    R8,
    R9,
    R10,
    R11,
    Rbp,
    Rsp,
}

impl Reg {
    pub fn name(self) -> &'static str {
        match self {
            Reg::Eax => "%eax",
            Reg::Ecx => "%ecx",
            Reg::Edx => "%edx",
            Reg::Esi => "%esi",
            Reg::Edi => "%edi",
            Reg::R8d => "%r8d",
            Reg::R9d => "%r9d",
            Reg::Rax => "%rax",
            Reg::Rcx => "%rcx",
            Reg::Rdx => "%rdx",
            Reg::Rsi => "%rsi",
            Reg::Rdi => "%rdi",
            Reg::R8 => "%r8",
            Reg::R9 => "%r9",
            Reg::R10 => "%r10",
            Reg::R11 => "%r11",
            Reg::Rbp => "%rbp",
            Reg::Rsp => "%rsp",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Operand {
    Imm(i32),
    Reg(Reg),
    /// `offset(%base)`
    Mem(Reg, i32),
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
    /// The AT&T condition suffix used by `set<cc>`.
    pub fn suffix(self) -> &'static str {
        match self {
            Cond::Eq => "e",
            Cond::Ne => "ne",
            Cond::Lt => "l",
            Cond::Gt => "g",
            Cond::Le => "le",
            Cond::Ge => "ge",
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Instruction {
    Label(String),
    Movl(Operand, Operand),
    Movq(Reg, Reg),
    Addl(Operand, Reg),
    Subl(Operand, Reg),
    Imull(Operand, Reg),
    Andl(Operand, Reg),
    Orl(Operand, Reg),
    Xorl(Operand, Reg),
    Cltd,
    Idivl(Operand),
    Cmpl(Operand, Reg),
    /// `set<cc> %al`
    Setcc(Cond),
    /// `movzbl %al, %eax`
    Movzbl,
    Jmp(String),
    Je(String),
    Jne(String),
    Call(String),
    Pushq(Operand),
    Popq(Reg),
    Subq(i32, Reg),
    Addq(i32, Reg),
    Leave,
    Ret,
}

#[derive(Debug, Clone)]
pub struct Function {
    /// Symbol name before platform decoration.
    pub name: String,
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub functions: Vec<Function>,
}
