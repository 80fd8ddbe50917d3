//! GNU assembler output for the AArch64 emitter.

use std::io::{self, Write};
use super::asm::{Instruction, Program};


pub fn print_program<W: Write>(program: &Program, mut out: W) -> io::Result<()> {
    writeln!(out, "\t.arch armv8-a")?;
    writeln!(out, "\t.text")?;
    writeln!(out, "\t.align 2")?;
    for function in &program.functions {
        writeln!(out, "\t.global {}", function.name)?;
        writeln!(out, "\t.type {}, %function", function.name)?;
        writeln!(out, "{}:", function.name)?;
        for op in &function.body {
            print_instruction(&mut out, op)?;
        }
        writeln!(out, "\t.size {}, .-{}", function.name, function.name)?;
    }
    Ok(())
}

fn print_instruction<W: Write>(out: &mut W, op: &Instruction) -> io::Result<()> {
    match *op {
        Instruction::Label(ref label) => writeln!(out, "{}:", label),
        Instruction::Ldr(reg, offset) => writeln!(out, "\tldr\t{}, [sp, #{}]", reg.name(), offset),
        Instruction::Str(reg, offset) => writeln!(out, "\tstr\t{}, [sp, #{}]", reg.name(), offset),
        Instruction::MovImm(reg, value) => writeln!(out, "\tmov\t{}, #{}", reg.name(), value),
        Instruction::MovkImm(reg, value) => {
            writeln!(out, "\tmovk\t{}, #{}, lsl #16", reg.name(), value)
        }
        Instruction::Add(d, a, b) => {
            writeln!(out, "\tadd\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Sub(d, a, b) => {
            writeln!(out, "\tsub\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Mul(d, a, b) => {
            writeln!(out, "\tmul\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Sdiv(d, a, b) => {
            writeln!(out, "\tsdiv\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Msub(d, a, b, c) => writeln!(
            out,
            "\tmsub\t{}, {}, {}, {}",
            d.name(),
            a.name(),
            b.name(),
            c.name()
        ),
        Instruction::And(d, a, b) => {
            writeln!(out, "\tand\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Orr(d, a, b) => {
            writeln!(out, "\torr\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Eor(d, a, b) => {
            writeln!(out, "\teor\t{}, {}, {}", d.name(), a.name(), b.name())
        }
        Instruction::Cmp(a, b) => writeln!(out, "\tcmp\t{}, {}", a.name(), b.name()),
        Instruction::CmpImm(reg, value) => writeln!(out, "\tcmp\t{}, #{}", reg.name(), value),
        Instruction::Cset(reg, cond) => {
            writeln!(out, "\tcset\t{}, {}", reg.name(), cond.name())
        }
        Instruction::Cbz(reg, ref label) => writeln!(out, "\tcbz\t{}, {}", reg.name(), label),
        Instruction::Cbnz(reg, ref label) => writeln!(out, "\tcbnz\t{}, {}", reg.name(), label),
        Instruction::B(ref label) => writeln!(out, "\tb\t{}", label),
        Instruction::Bl(ref name) => writeln!(out, "\tbl\t{}", name),
        Instruction::SaveFrame => writeln!(out, "\tstp\tx29, x30, [sp, #-16]!"),
        Instruction::SetFrame => writeln!(out, "\tmov\tx29, sp"),
        Instruction::SubSp(bytes) => writeln!(out, "\tsub\tsp, sp, #{}", bytes),
        Instruction::AddSp(bytes) => writeln!(out, "\tadd\tsp, sp, #{}", bytes),
        Instruction::RestoreFrame => writeln!(out, "\tldp\tx29, x30, [sp], #16"),
        Instruction::Ret => writeln!(out, "\tret"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::asm::{self, Reg};

    fn print_one(op: Instruction) -> String {
        let mut out = Vec::new();
        print_instruction(&mut out, &op).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn loads_are_sp_relative() {
        assert_eq!(print_one(Instruction::Ldr(Reg::W8, 24)), "\tldr\tw8, [sp, #24]\n");
    }

    #[test]
    fn frame_instructions_match_the_armv8_idiom() {
        assert_eq!(print_one(Instruction::SaveFrame), "\tstp\tx29, x30, [sp, #-16]!\n");
        assert_eq!(print_one(Instruction::RestoreFrame), "\tldp\tx29, x30, [sp], #16\n");
    }

    #[test]
    fn framing_emits_armv8_boilerplate() {
        let program = Program {
            functions: vec![asm::Function {
                name: "main".into(),
                body: vec![Instruction::Ret],
            }],
        };
        let mut out = Vec::new();
        print_program(&program, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\t.arch armv8-a\n\t.text\n\t.align 2\n"));
        assert!(text.contains("\t.global main\n\t.type main, %function\nmain:\n"));
        assert!(text.ends_with("\t.size main, .-main\n"));
    }
}
