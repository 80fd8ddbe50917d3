//! Textual dump of the IR, used by the driver's `--emit-ir` flag.

use std::io::{self, Write};
use ir::{BitOp, Cond, Function, Instruction, IntOp, Program};


pub fn emit_program<W: Write>(program: &Program, mut out: W) -> io::Result<()> {
    for function in &program.functions {
        emit_function(function, &mut out)?;
        writeln!(out)?;
    }
    Ok(())
}

fn emit_function<W: Write>(function: &Function, out: &mut W) -> io::Result<()> {
    writeln!(out, "function {} (slots: {})", function.name, function.symbol_count)?;
    for block in &function.blocks {
        writeln!(out, "{}:", block.label)?;
        for op in &block.ops {
            emit_instruction(op, out)?;
        }
        match (block.exit_true, block.exit_false) {
            (Some(t), Some(f)) => {
                writeln!(
                    out,
                    "    branch {} {}",
                    function.block(t).label,
                    function.block(f).label
                )?;
            }
            (Some(t), None) => {
                writeln!(out, "    goto {}", function.block(t).label)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn emit_instruction<W: Write>(op: &Instruction, out: &mut W) -> io::Result<()> {
    match *op {
        Instruction::LdConst(dst, value) => writeln!(out, "    {} = ldconst {}", dst, value),
        Instruction::IntOp(dst, op, ref a, ref b) => {
            writeln!(out, "    {} = {} {} {}", dst, int_op_name(op), a, b)
        }
        Instruction::BitOp(dst, op, ref a, ref b) => {
            writeln!(out, "    {} = {} {} {}", dst, bit_op_name(op), a, b)
        }
        Instruction::Cmp(dst, cond, ref a, ref b) => {
            writeln!(out, "    {} = cmp_{} {} {}", dst, cond_name(cond), a, b)
        }
        Instruction::Not(dst, ref a) => writeln!(out, "    {} = not_op {}", dst, a),
        Instruction::LogicalAnd(dst, ref a, ref b) => {
            writeln!(out, "    {} = logical_and {} {}", dst, a, b)
        }
        Instruction::LogicalOr(dst, ref a, ref b) => {
            writeln!(out, "    {} = logical_or {} {}", dst, a, b)
        }
        Instruction::Rmem(dst, ref src) => writeln!(out, "    {} = rmem {}", dst, src),
        Instruction::Wmem(dst, ref src) => writeln!(out, "    {} = wmem {}", dst, src),
        Instruction::Call(ref name, dst, ref args) => {
            write!(out, "    {} = call {}", dst, name)?;
            for arg in args {
                write!(out, " {}", arg)?;
            }
            writeln!(out)
        }
        Instruction::Ret(ref src) => writeln!(out, "    ret {}", src),
    }
}

fn int_op_name(op: IntOp) -> &'static str {
    match op {
        IntOp::Add => "add",
        IntOp::Sub => "sub",
        IntOp::Mul => "mul",
        IntOp::Div => "div",
        IntOp::Mod => "mod",
    }
}

fn bit_op_name(op: BitOp) -> &'static str {
    match op {
        BitOp::And => "bit_and",
        BitOp::Or => "bit_or",
        BitOp::Xor => "bit_xor",
    }
}

fn cond_name(cond: Cond) -> &'static str {
    match cond {
        Cond::Eq => "eq",
        Cond::Ne => "ne",
        Cond::Lt => "lt",
        Cond::Gt => "gt",
        Cond::Le => "le",
        Cond::Ge => "ge",
    }
}
