extern crate minic_ir;

mod arm;
mod x86;

use std::io::{self, Write};
use minic_ir::Program;


/// Output flavour for the x86-64 emitter. Linux uses ELF directives;
/// macOS drops them and underscore-prefixes the external symbols.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Platform {
    Linux,
    MacOs,
}

impl Platform {
    /// The flavour of the machine this compiler was built on.
    pub fn host() -> Platform {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }
}

/// Compile the program to an x86-64 System V assembly listing.
pub fn emit_x86<W: Write>(program: &Program, platform: Platform, out: W) -> io::Result<()> {
    let asm = x86::compile_program(program, platform);
    x86::print_program(&asm, platform, out)
}

/// Compile the program to an AArch64 assembly listing.
pub fn emit_arm<W: Write>(program: &Program, out: W) -> io::Result<()> {
    let asm = arm::compile_program(program);
    arm::print_program(&asm, out)
}
