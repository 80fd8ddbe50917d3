extern crate minic_errors;
extern crate minic_ir;
extern crate minic_syntax;

mod build_ir;
pub mod semantic;

use minic_errors::Reporter;
use minic_syntax::ast::Program;
pub use semantic::{SymbolInfo, SymbolTable};


/// Run semantic analysis and, when it finds no errors, lower the program
/// to IR. Diagnostics go through the reporter; `Err(())` means the
/// reporter holds at least one error.
pub fn compile(program: &Program, reporter: Reporter) -> Result<minic_ir::Program, ()> {
    let table = semantic::analyze(program, reporter.clone());
    if reporter.has_errors() {
        return Err(());
    }
    Ok(build_ir::build_program(program, &table))
}
