//! x86-64 System V code generation.
//!
//! Every IR slot lives in the stack frame at `-4*(N+1)(%rbp)`. Values pass
//! through `%eax`; the only other scratch register is `%edx` for division.

pub mod asm;
mod printer;

use minic_ir::analysis::reverse_post_order;
use minic_ir::ir::{self, BitOp, Instruction, IntOp, Operand, Slot};
use self::asm::{Cond, Reg};
use Platform;

pub use self::printer::print_program;

const ARG_REGS: [Reg; 6] = [Reg::Edi, Reg::Esi, Reg::Edx, Reg::Ecx, Reg::R8d, Reg::R9d];
const CALLER_SAVED: [Reg; 9] = [
    Reg::Rax,
    Reg::Rcx,
    Reg::Rdx,
    Reg::Rsi,
    Reg::Rdi,
    Reg::R8,
    Reg::R9,
    Reg::R10,
    Reg::R11,
];

pub fn compile_program(program: &ir::Program, platform: Platform) -> asm::Program {
    let functions = program
        .functions
        .iter()
        .map(|f| compile_function(f, platform))
        .collect();
    asm::Program { functions }
}

fn compile_function(function: &ir::Function, platform: Platform) -> asm::Function {
    let mut compiler = Compiler {
        function,
        platform,
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
    platform: Platform,
    body: Vec<asm::Instruction>,
}

impl<'a> Compiler<'a> {
    fn compile(&mut self) {
        let frame = frame_size(self.function.symbol_count);
        self.push(asm::Instruction::Pushq(asm::Operand::Reg(Reg::Rbp)));
        self.push(asm::Instruction::Movq(Reg::Rsp, Reg::Rbp));
        self.push(asm::Instruction::Subq(frame, Reg::Rsp));

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
                        self.load(asm::Operand::Reg(Reg::Eax), Operand::Slot(slot));
                        self.push(asm::Instruction::Cmpl(asm::Operand::Imm(0), Reg::Eax));
                        self.push(asm::Instruction::Je(self.block_label(on_false)));
                        self.push(asm::Instruction::Jmp(self.block_label(on_true)));
                    }
                    (Some(target), None) => {
                        self.push(asm::Instruction::Jmp(self.block_label(target)));
                    }
                    _ => {}
                }
            }
        }
        // control can fall off the function tail when the last block has
        // neither a ret nor successors
        if !last_returns {
            self.push(asm::Instruction::Leave);
            self.push(asm::Instruction::Ret);
        }
    }

    fn block_label(&self, id: ir::BlockId) -> String {
        self.function.block(id).label.clone()
    }

    fn push(&mut self, op: asm::Instruction) {
        self.body.push(op);
    }

    fn slot(&self, slot: Slot) -> asm::Operand {
        asm::Operand::Mem(Reg::Rbp, -4 * (slot.0 as i32 + 1))
    }

    fn value(&self, operand: Operand) -> asm::Operand {
        match operand {
            Operand::Slot(slot) => self.slot(slot),
            Operand::Arg(index) => {
                if (index as usize) < ARG_REGS.len() {
                    asm::Operand::Reg(ARG_REGS[index as usize])
                } else {
                    // the seventh and eighth parameters arrive on the
                    // stack above the saved frame pointer
                    asm::Operand::Mem(Reg::Rbp, 16 + 8 * (index as i32 - 6))
                }
            }
        }
    }

    /// `movl` through `%eax` unless the source already is a register.
    fn copy(&mut self, dst: asm::Operand, src: asm::Operand) {
        match src {
            asm::Operand::Reg(_) => {
                self.push(asm::Instruction::Movl(src, dst));
            }
            _ => {
                self.push(asm::Instruction::Movl(src, asm::Operand::Reg(Reg::Eax)));
                self.push(asm::Instruction::Movl(asm::Operand::Reg(Reg::Eax), dst));
            }
        }
    }

    fn load(&mut self, dst: asm::Operand, src: Operand) {
        let src = self.value(src);
        self.push(asm::Instruction::Movl(src, dst));
    }

    fn store_eax(&mut self, dst: Slot) {
        let dst = self.slot(dst);
        self.push(asm::Instruction::Movl(asm::Operand::Reg(Reg::Eax), dst));
    }

    fn compile_instruction(&mut self, op: &Instruction) {
        match *op {
            Instruction::LdConst(dst, value) => {
                self.push(asm::Instruction::Movl(
                    asm::Operand::Imm(value),
                    asm::Operand::Reg(Reg::Eax),
                ));
                self.store_eax(dst);
            }
            Instruction::IntOp(dst, op, a, b) => self.compile_int_op(dst, op, a, b),
            Instruction::BitOp(dst, op, a, b) => {
                self.load(asm::Operand::Reg(Reg::Eax), a);
                let rhs = self.value(b);
                let op = match op {
                    BitOp::And => asm::Instruction::Andl(rhs, Reg::Eax),
                    BitOp::Or => asm::Instruction::Orl(rhs, Reg::Eax),
                    BitOp::Xor => asm::Instruction::Xorl(rhs, Reg::Eax),
                };
                self.push(op);
                self.store_eax(dst);
            }
            Instruction::Cmp(dst, cond, a, b) => {
                self.load(asm::Operand::Reg(Reg::Eax), a);
                let rhs = self.value(b);
                self.push(asm::Instruction::Cmpl(rhs, Reg::Eax));
                self.set_flag(cond_of(cond), dst);
            }
            Instruction::Not(dst, a) => {
                self.load(asm::Operand::Reg(Reg::Eax), a);
                self.push(asm::Instruction::Cmpl(asm::Operand::Imm(0), Reg::Eax));
                self.set_flag(Cond::Eq, dst);
            }
            Instruction::LogicalAnd(dst, a, b) => self.compile_logical(dst, a, b, true),
            Instruction::LogicalOr(dst, a, b) => self.compile_logical(dst, a, b, false),
            Instruction::Rmem(dst, src) => {
                let dst = self.slot(dst);
                let src = self.value(src);
                self.copy(dst, src);
            }
            Instruction::Wmem(dst, src) => {
                if src == Operand::Slot(dst) {
                    return;
                }
                let dst = self.slot(dst);
                let src = self.value(src);
                self.copy(dst, src);
            }
            Instruction::Call(ref name, dst, ref args) => self.compile_call(name, dst, args),
            Instruction::Ret(src) => {
                self.load(asm::Operand::Reg(Reg::Eax), src);
                self.push(asm::Instruction::Leave);
                self.push(asm::Instruction::Ret);
            }
        }
    }

    fn compile_int_op(&mut self, dst: Slot, op: IntOp, a: Operand, b: Operand) {
        self.load(asm::Operand::Reg(Reg::Eax), a);
        let rhs = self.value(b);
        match op {
            IntOp::Add => self.push(asm::Instruction::Addl(rhs, Reg::Eax)),
            IntOp::Sub => self.push(asm::Instruction::Subl(rhs, Reg::Eax)),
            IntOp::Mul => self.push(asm::Instruction::Imull(rhs, Reg::Eax)),
            IntOp::Div | IntOp::Mod => {
                self.push(asm::Instruction::Cltd);
                self.push(asm::Instruction::Idivl(rhs));
                if op == IntOp::Mod {
                    // the remainder comes back in %edx
                    let dst = self.slot(dst);
                    self.push(asm::Instruction::Movl(asm::Operand::Reg(Reg::Edx), dst));
                    return;
                }
            }
        }
        self.store_eax(dst);
    }

    fn set_flag(&mut self, cond: Cond, dst: Slot) {
        self.push(asm::Instruction::Setcc(cond));
        self.push(asm::Instruction::Movzbl);
        self.store_eax(dst);
    }

    fn compile_logical(&mut self, dst: Slot, a: Operand, b: Operand, is_and: bool) {
        let prefix = format!("label_{}_{}", self.function.name, dst.0);
        let end = format!("{}_end", prefix);
        if is_and {
            let on_false = format!("{}_false", prefix);
            self.load(asm::Operand::Reg(Reg::Eax), a);
            self.push(asm::Instruction::Cmpl(asm::Operand::Imm(0), Reg::Eax));
            self.push(asm::Instruction::Je(on_false.clone()));
            self.load(asm::Operand::Reg(Reg::Eax), b);
            self.push(asm::Instruction::Cmpl(asm::Operand::Imm(0), Reg::Eax));
            self.push(asm::Instruction::Je(on_false.clone()));
            self.push(asm::Instruction::Movl(
                asm::Operand::Imm(1),
                asm::Operand::Reg(Reg::Eax),
            ));
            self.push(asm::Instruction::Jmp(end.clone()));
            self.push(asm::Instruction::Label(on_false));
            self.push(asm::Instruction::Movl(
                asm::Operand::Imm(0),
                asm::Operand::Reg(Reg::Eax),
            ));
        } else {
            let on_true = format!("{}_true", prefix);
            self.load(asm::Operand::Reg(Reg::Eax), a);
            self.push(asm::Instruction::Cmpl(asm::Operand::Imm(0), Reg::Eax));
            self.push(asm::Instruction::Jne(on_true.clone()));
            self.load(asm::Operand::Reg(Reg::Eax), b);
            self.push(asm::Instruction::Cmpl(asm::Operand::Imm(0), Reg::Eax));
            self.push(asm::Instruction::Jne(on_true.clone()));
            self.push(asm::Instruction::Movl(
                asm::Operand::Imm(0),
                asm::Operand::Reg(Reg::Eax),
            ));
            self.push(asm::Instruction::Jmp(end.clone()));
            self.push(asm::Instruction::Label(on_true));
            self.push(asm::Instruction::Movl(
                asm::Operand::Imm(1),
                asm::Operand::Reg(Reg::Eax),
            ));
        }
        self.push(asm::Instruction::Label(end));
        self.store_eax(dst);
    }

    fn compile_call(&mut self, name: &str, dst: Slot, args: &[Operand]) {
        for &reg in &CALLER_SAVED {
            self.push(asm::Instruction::Pushq(asm::Operand::Reg(reg)));
        }
        for (index, &arg) in args.iter().enumerate().take(ARG_REGS.len()) {
            self.load(asm::Operand::Reg(ARG_REGS[index]), arg);
        }
        let extra = args.len().saturating_sub(ARG_REGS.len());
        for &arg in args.iter().skip(ARG_REGS.len()).rev() {
            let arg = self.value(arg);
            self.push(asm::Instruction::Pushq(arg));
        }
        self.push(asm::Instruction::Call(self.call_target(name)));
        self.store_eax(dst);
        if extra > 0 {
            self.push(asm::Instruction::Addq(8 * extra as i32, Reg::Rsp));
        }
        for &reg in CALLER_SAVED.iter().rev() {
            self.push(asm::Instruction::Popq(reg));
        }
    }

    fn call_target(&self, name: &str) -> String {
        match self.platform {
            Platform::MacOs if name == "putchar" || name == "getchar" => format!("_{}", name),
            _ => name.to_string(),
        }
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

/// Frame bytes: room for every slot plus the conceptual return slot,
/// rounded up to keep `%rsp` 16-byte aligned. At least 16 bytes even for
/// an empty frame.
fn frame_size(symbol_count: u32) -> i32 {
    let bytes = (symbol_count as i32 + 1) * 4;
    (bytes + 15) & !15
}
