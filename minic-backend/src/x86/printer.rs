//! AT&T-syntax output for the x86-64 emitter.

use std::io::{self, Write};
use super::asm::{Instruction, Operand, Program, Reg};
use Platform;


pub fn print_program<W: Write>(program: &Program, platform: Platform, mut out: W) -> io::Result<()> {
    if platform == Platform::Linux {
        writeln!(out, "\t.section\t.text")?;
    }
    for function in &program.functions {
        let label = function_label(&function.name, platform);
        writeln!(out, ".globl {}", label)?;
        if platform == Platform::Linux {
            writeln!(out, "\t.type\t{}, @function", label)?;
        }
        writeln!(out, "{}:", label)?;
        for op in &function.body {
            print_instruction(&mut out, op)?;
        }
        if platform == Platform::Linux {
            writeln!(out, "\t.size\t{}, .-{}", label, label)?;
        }
    }
    if platform == Platform::Linux {
        writeln!(out, "\t.section\t.note.GNU-stack,\"\",@progbits")?;
    }
    Ok(())
}

fn function_label(name: &str, platform: Platform) -> String {
    match platform {
        Platform::MacOs if name == "main" => "_main".to_string(),
        _ => name.to_string(),
    }
}

fn print_instruction<W: Write>(out: &mut W, op: &Instruction) -> io::Result<()> {
    match *op {
        Instruction::Label(ref label) => writeln!(out, "{}:", label),
        Instruction::Movl(ref src, ref dst) => {
            writeln!(out, "\tmovl\t{}, {}", operand(src), operand(dst))
        }
        Instruction::Movq(src, dst) => writeln!(out, "\tmovq\t{}, {}", src.name(), dst.name()),
        Instruction::Addl(ref src, dst) => writeln!(out, "\taddl\t{}, {}", operand(src), dst.name()),
        Instruction::Subl(ref src, dst) => writeln!(out, "\tsubl\t{}, {}", operand(src), dst.name()),
        Instruction::Imull(ref src, dst) => {
            writeln!(out, "\timull\t{}, {}", operand(src), dst.name())
        }
        Instruction::Andl(ref src, dst) => writeln!(out, "\tandl\t{}, {}", operand(src), dst.name()),
        Instruction::Orl(ref src, dst) => writeln!(out, "\torl\t{}, {}", operand(src), dst.name()),
        Instruction::Xorl(ref src, dst) => writeln!(out, "\txorl\t{}, {}", operand(src), dst.name()),
        Instruction::Cltd => writeln!(out, "\tcltd"),
        Instruction::Idivl(ref src) => writeln!(out, "\tidivl\t{}", operand(src)),
        Instruction::Cmpl(ref src, dst) => writeln!(out, "\tcmpl\t{}, {}", operand(src), dst.name()),
        Instruction::Setcc(cond) => writeln!(out, "\tset{}\t%al", cond.suffix()),
        Instruction::Movzbl => writeln!(out, "\tmovzbl\t%al, %eax"),
        Instruction::Jmp(ref label) => writeln!(out, "\tjmp\t{}", label),
        Instruction::Je(ref label) => writeln!(out, "\tje\t{}", label),
        Instruction::Jne(ref label) => writeln!(out, "\tjne\t{}", label),
        Instruction::Call(ref name) => writeln!(out, "\tcall\t{}", name),
        Instruction::Pushq(ref src) => writeln!(out, "\tpushq\t{}", operand(src)),
        Instruction::Popq(reg) => writeln!(out, "\tpopq\t{}", reg.name()),
        Instruction::Subq(value, reg) => writeln!(out, "\tsubq\t${}, {}", value, reg.name()),
        Instruction::Addq(value, reg) => writeln!(out, "\taddq\t${}, {}", value, reg.name()),
        Instruction::Leave => writeln!(out, "\tleave"),
        Instruction::Ret => writeln!(out, "\tret"),
    }
}

fn operand(op: &Operand) -> String {
    match *op {
        Operand::Imm(value) => format!("${}", value),
        Operand::Reg(reg) => reg.name().to_string(),
        Operand::Mem(base, offset) => format!("{}({})", offset, base.name()),
    }
}
