//! AArch64 code generation.
//!
//! Slots live above the stack pointer at `[sp, #(16 + 8*N)]`; the frame is
//! deallocated in one step before the saved `x29`/`x30` pair is popped.
//! `w8`/`w9`/`w10` are the scratch registers, `w0..w7` carry arguments.

pub mod asm;
mod printer;

use minic_ir::analysis::reverse_post_order;
use minic_ir::ir::{self, BitOp, Instruction, IntOp, Operand, Slot};
use self::asm::{Cond, Reg};

pub use self::printer::print_program;

const ARG_REGS: [Reg; 8] = [
    Reg::W0,
    Reg::W1,
    Reg::W2,
    Reg::W3,
    Reg::W4,
    Reg::W5,
    Reg::W6,
    Reg::W7,
];

pub fn compile_program(program: &ir::Program) -> asm::Program {
    let functions = program.functions.iter().map(compile_function).collect();
    asm::Program { functions }
}

fn compile_function(function: &ir::Function) -> asm::Function {
    let mut compiler = Compiler {
        function,
        frame: frame_size(function.symbol_count),
        body: Vec::new(),
    };
    compiler.compile();
    asm::Function {
        name: function.name.clone(),
        body: compiler.body,
    }
}

struct Compiler<'a> {
    function: &'a ir::Function,
    frame: i32,
    body: Vec<asm::Instruction>,
}

impl<'a> Compiler<'a> {
    fn compile(&mut self) {
        self.push(asm::Instruction::SaveFrame);
        self.push(asm::Instruction::SetFrame);
        self.push(asm::Instruction::SubSp(self.frame));

        let order = reverse_post_order(self.function);
        let mut last_returns = false;
        for &id in &order {
            let block = self.function.block(id);
            self.push(asm::Instruction::Label(block.label.clone()));
            for op in &block.ops {
                self.compile_instruction(op);
                if op.is_ret() {
                    break;
                }
            }
            last_returns = block.returns();
            if !last_returns {
                match (block.exit_true, block.exit_false) {
                    (Some(on_true), Some(on_false)) => {
                        let slot = block
                            .condition_slot()
                            .expect("conditional block produced no value");
                        self.push(asm::Instruction::Ldr(Reg::W8, self.offset(slot)));
                        self.push(asm::Instruction::Cbz(Reg::W8, self.block_label(on_false)));
                        self.push(asm::Instruction::B(self.block_label(on_true)));
                    }
                    (Some(target), None) => {
                        self.push(asm::Instruction::B(self.block_label(target)));
                    }
                    _ => {}
                }
            }
        }
        if !last_returns {
            self.epilogue();
            self.push(asm::Instruction::Ret);
        }
    }

    fn epilogue(&mut self) {
        self.push(asm::Instruction::AddSp(self.frame));
        self.push(asm::Instruction::RestoreFrame);
    }

    fn block_label(&self, id: ir::BlockId) -> String {
        self.function.block(id).label.clone()
    }

    fn push(&mut self, op: asm::Instruction) {
        self.body.push(op);
    }

    fn offset(&self, slot: Slot) -> i32 {
        16 + 8 * slot.0 as i32
    }

    /// Load a slot operand into a scratch or argument register.
    fn load(&mut self, reg: Reg, operand: Operand) {
        match operand {
            Operand::Slot(slot) => self.push(asm::Instruction::Ldr(reg, self.offset(slot))),
            Operand::Arg(_) => panic!("argument operand outside parameter binding"),
        }
    }

    fn store(&mut self, reg: Reg, dst: Slot) {
        let offset = self.offset(dst);
        self.push(asm::Instruction::Str(reg, offset));
    }

    fn load_const(&mut self, reg: Reg, value: i32) {
        if value >= 0 && value <= 65535 {
            self.push(asm::Instruction::MovImm(reg, value));
        } else {
            let low = (value as u32 & 0xffff) as i32;
            let high = ((value as u32 >> 16) & 0xffff) as u16;
            self.push(asm::Instruction::MovImm(reg, low));
            if high != 0 {
                self.push(asm::Instruction::MovkImm(reg, high));
            }
        }
    }

    fn compile_instruction(&mut self, op: &Instruction) {
        match *op {
            Instruction::LdConst(dst, value) => {
                self.load_const(Reg::W8, value);
                self.store(Reg::W8, dst);
            }
            Instruction::IntOp(dst, op, a, b) => {
                self.load(Reg::W8, a);
                self.load(Reg::W9, b);
                match op {
                    IntOp::Add => self.push(asm::Instruction::Add(Reg::W8, Reg::W8, Reg::W9)),
                    IntOp::Sub => self.push(asm::Instruction::Sub(Reg::W8, Reg::W8, Reg::W9)),
                    IntOp::Mul => self.push(asm::Instruction::Mul(Reg::W8, Reg::W8, Reg::W9)),
                    IntOp::Div => self.push(asm::Instruction::Sdiv(Reg::W8, Reg::W8, Reg::W9)),
                    IntOp::Mod => {
                        // w8 - (w8 / w9) * w9, so the remainder keeps the
                        // sign of the dividend
                        self.push(asm::Instruction::Sdiv(Reg::W10, Reg::W8, Reg::W9));
                        self.push(asm::Instruction::Msub(Reg::W8, Reg::W10, Reg::W9, Reg::W8));
                    }
                }
                self.store(Reg::W8, dst);
            }
            Instruction::BitOp(dst, op, a, b) => {
                self.load(Reg::W8, a);
                self.load(Reg::W9, b);
                let op = match op {
                    BitOp::And => asm::Instruction::And(Reg::W8, Reg::W8, Reg::W9),
                    BitOp::Or => asm::Instruction::Orr(Reg::W8, Reg::W8, Reg::W9),
                    BitOp::Xor => asm::Instruction::Eor(Reg::W8, Reg::W8, Reg::W9),
                };
                self.push(op);
                self.store(Reg::W8, dst);
            }
            Instruction::Cmp(dst, cond, a, b) => {
                self.load(Reg::W8, a);
                self.load(Reg::W9, b);
                self.push(asm::Instruction::Cmp(Reg::W8, Reg::W9));
                self.push(asm::Instruction::Cset(Reg::W8, cond_of(cond)));
                self.store(Reg::W8, dst);
            }
            Instruction::Not(dst, a) => {
                self.load(Reg::W8, a);
                self.push(asm::Instruction::CmpImm(Reg::W8, 0));
                self.push(asm::Instruction::Cset(Reg::W8, Cond::Eq));
                self.store(Reg::W8, dst);
            }
            Instruction::LogicalAnd(dst, a, b) => self.compile_logical(dst, a, b, true),
            Instruction::LogicalOr(dst, a, b) => self.compile_logical(dst, a, b, false),
            Instruction::Rmem(dst, src) | Instruction::Wmem(dst, src) => {
                if src == Operand::Slot(dst) {
                    return;
                }
                match src {
                    Operand::Arg(index) => {
                        // parameter binding straight from the incoming
                        // argument register
                        let reg = ARG_REGS[index as usize];
                        self.store(reg, dst);
                    }
                    Operand::Slot(_) => {
                        self.load(Reg::W8, src);
                        self.store(Reg::W8, dst);
                    }
                }
            }
            Instruction::Call(ref name, dst, ref args) => {
                for (index, &arg) in args.iter().enumerate().take(ARG_REGS.len()) {
                    self.load(ARG_REGS[index], arg);
                }
                self.push(asm::Instruction::Bl(name.clone()));
                self.store(Reg::W0, dst);
            }
            Instruction::Ret(src) => {
                self.load(Reg::W0, src);
                self.epilogue();
                self.push(asm::Instruction::Ret);
            }
        }
    }

    fn compile_logical(&mut self, dst: Slot, a: Operand, b: Operand, is_and: bool) {
        let prefix = format!("label_{}_{}", self.function.name, dst.0);
        let end = format!("{}_end", prefix);
        if is_and {
            let on_false = format!("{}_false", prefix);
            self.load(Reg::W8, a);
            self.push(asm::Instruction::Cbz(Reg::W8, on_false.clone()));
            self.load(Reg::W8, b);
            self.push(asm::Instruction::Cbz(Reg::W8, on_false.clone()));
            self.push(asm::Instruction::MovImm(Reg::W8, 1));
            self.push(asm::Instruction::B(end.clone()));
            self.push(asm::Instruction::Label(on_false));
            self.push(asm::Instruction::MovImm(Reg::W8, 0));
        } else {
            let on_true = format!("{}_true", prefix);
            self.load(Reg::W8, a);
            self.push(asm::Instruction::Cbnz(Reg::W8, on_true.clone()));
            self.load(Reg::W8, b);
            self.push(asm::Instruction::Cbnz(Reg::W8, on_true.clone()));
            self.push(asm::Instruction::MovImm(Reg::W8, 0));
            self.push(asm::Instruction::B(end.clone()));
            self.push(asm::Instruction::Label(on_true));
            self.push(asm::Instruction::MovImm(Reg::W8, 1));
        }
        self.push(asm::Instruction::Label(end));
        self.store(Reg::W8, dst);
    }
}

fn cond_of(cond: ir::Cond) -> Cond {
    match cond {
        ir::Cond::Eq => Cond::Eq,
        ir::Cond::Ne => Cond::Ne,
        ir::Cond::Lt => Cond::Lt,
        ir::Cond::Gt => Cond::Gt,
        ir::Cond::Le => Cond::Le,
        ir::Cond::Ge => Cond::Ge,
    }
}

/// Frame bytes past the saved `x29`/`x30` pair: a 16-byte gap plus eight
/// bytes per slot, kept 16-byte aligned.
fn frame_size(symbol_count: u32) -> i32 {
    let bytes = 16 + 8 * symbol_count as i32;
    (bytes + 15) & !15
}
