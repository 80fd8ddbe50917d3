extern crate minic_backend;
extern crate minic_errors;
extern crate minic_frontend;
extern crate minic_ir;
extern crate minic_syntax;

use minic_errors::Reporter;

pub use minic_backend::Platform;


/// Front half of the pipeline: lex, parse, analyse, and lower to IR.
/// `Err(())` means the reporter holds at least one error; syntax errors
/// stop the pipeline before semantic analysis runs.
pub fn build_ir(source: &str, reporter: Reporter) -> Result<minic_ir::Program, ()> {
    let tokens = minic_syntax::lex(source, reporter.clone());
    let program = minic_syntax::parse(tokens, reporter.clone());
    if reporter.has_errors() {
        return Err(());
    }
    minic_frontend::compile(&program, reporter)
}

/// Compile source text to an x86-64 assembly listing.
pub fn compile_x86(source: &str, platform: Platform, reporter: Reporter) -> Result<String, ()> {
    let ir = build_ir(source, reporter)?;
    let mut out = Vec::new();
    minic_backend::emit_x86(&ir, platform, &mut out).expect("writing to a buffer cannot fail");
    Ok(String::from_utf8(out).expect("assembly listing is valid utf-8"))
}

/// Compile source text to an AArch64 assembly listing.
pub fn compile_arm(source: &str, reporter: Reporter) -> Result<String, ()> {
    let ir = build_ir(source, reporter)?;
    let mut out = Vec::new();
    minic_backend::emit_arm(&ir, &mut out).expect("writing to a buffer cannot fail");
    Ok(String::from_utf8(out).expect("assembly listing is valid utf-8"))
}
