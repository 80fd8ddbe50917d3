//! Semantic analysis: one pre-order traversal of the syntax tree that
//! builds the symbol tables and reports structural errors. The offsets
//! recorded here follow the frame layout conventions (locals below the
//! frame pointer, parameters above it); the IR builder allocates its own
//! slot numbering, so these offsets only feed diagnostics.

use std::collections::{HashMap, HashSet};
use minic_errors::Reporter;
use minic_syntax::ast::{self, Expr, Item, Program, Statement};
use minic_syntax::position::{Span, Spanned};


/// Functions may have at most this many parameters.
pub const MAX_PARAMS: usize = 8;

/// Value types. The language represents both `int` and `char` as 32-bit
/// signed integers.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Type {
    Int,
}

impl Type {
    pub fn size(&self) -> i32 {
        4
    }
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub typ: Type,
    pub offset: i32,
    pub is_param: bool,
    pub is_array: bool,
    pub array_size: u32,
    pub span: Span,
}

#[derive(Debug)]
pub struct SymbolTable {
    /// File-scope variables and their declaration sites.
    pub globals: HashMap<String, Span>,
    /// Every declared function, seeded with the host-provided builtins.
    pub functions: HashSet<String>,
    pub param_counts: HashMap<String, usize>,
    /// Functions containing at least one `return`.
    pub returning_functions: HashSet<String>,
    /// Per-function locals (parameters included).
    pub locals: HashMap<String, HashMap<String, SymbolInfo>>,
    /// Globals referenced in an expression anywhere in the program. Local
    /// references are tracked per function and never leak out of it.
    pub used_globals: HashSet<String>,
}

impl SymbolTable {
    fn new() -> SymbolTable {
        let mut functions = HashSet::new();
        let mut param_counts = HashMap::new();
        for &(name, arity) in &[("putchar", 1), ("getchar", 0)] {
            functions.insert(name.to_string());
            param_counts.insert(name.to_string(), arity);
        }
        SymbolTable {
            globals: HashMap::new(),
            functions,
            param_counts,
            returning_functions: HashSet::new(),
            locals: HashMap::new(),
            used_globals: HashSet::new(),
        }
    }

    pub fn is_global(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }
}

pub fn analyze(program: &Program, reporter: Reporter) -> SymbolTable {
    let mut analyzer = Analyzer {
        reporter,
        table: SymbolTable::new(),
        current_function: None,
        locals: HashMap::new(),
        used_locals: HashSet::new(),
        current_offset: 0,
    };
    for item in &program.items {
        analyzer.check_item(item);
    }
    analyzer.finish()
}

struct Analyzer {
    reporter: Reporter,
    table: SymbolTable,
    current_function: Option<String>,
    locals: HashMap<String, SymbolInfo>,
    used_locals: HashSet<String>,
    current_offset: i32,
}

impl Analyzer {
    fn check_item(&mut self, item: &Spanned<Item>) {
        match **item {
            Item::Global(_, ref name, ref value) => {
                if self.table.is_global(&name.0) {
                    self.reporter.error(
                        format!("redeclaration of global variable '{}'", name.0),
                        Spanned::span(name),
                    );
                } else {
                    self.table
                        .globals
                        .insert(name.0.clone(), Spanned::span(name));
                }
                if let Some(ref value) = *value {
                    self.check_expr(value);
                }
            }
            Item::Function(ref function) => self.check_function(function),
        }
    }

    fn check_function(&mut self, function: &ast::Function) {
        let name = function.name.0.clone();
        self.table.functions.insert(name.clone());
        self.table
            .param_counts
            .insert(name.clone(), function.params.len());
        if function.params.len() > MAX_PARAMS {
            self.reporter.error(
                format!(
                    "function '{}' has too many parameters (maximum is {})",
                    name, MAX_PARAMS
                ),
                Spanned::span(&function.name),
            );
        }
        self.current_function = Some(name.clone());
        self.locals.clear();
        self.used_locals.clear();
        self.current_offset = -8;
        for (index, param) in function.params.iter().enumerate() {
            if self.locals.contains_key(&param.name.0) {
                self.reporter.error(
                    format!("redeclaration of parameter '{}'", param.name.0),
                    Spanned::span(&param.name),
                );
                continue;
            }
            let info = SymbolInfo {
                typ: Type::Int,
                offset: 16 + 8 * index as i32,
                is_param: true,
                is_array: false,
                array_size: 0,
                span: Spanned::span(&param.name),
            };
            self.locals.insert(param.name.0.clone(), info);
        }
        for statement in &function.body {
            self.check_statement(statement);
        }
        // warn before the per-function use set is reset for the next one
        for (local, info) in &self.locals {
            if !self.used_locals.contains(local) {
                self.reporter.warning(
                    format!("variable '{}' declared but never used", local),
                    info.span,
                );
            }
        }
        let locals = ::std::mem::replace(&mut self.locals, HashMap::new());
        self.table.locals.insert(name, locals);
        self.current_function = None;
    }

    fn check_statement(&mut self, statement: &Spanned<Statement>) {
        match **statement {
            Statement::Block(ref statements) => {
                for statement in statements {
                    self.check_statement(statement);
                }
            }
            Statement::If(ref condition, ref then, ref else_branch) => {
                self.check_expr(condition);
                self.check_statement(then);
                if let Some(ref else_branch) = *else_branch {
                    self.check_statement(else_branch);
                }
            }
            Statement::Return(ref value) => {
                if let Some(name) = self.current_function.clone() {
                    self.table.returning_functions.insert(name);
                }
                if let Some(ref value) = *value {
                    self.check_expr(value);
                }
            }
            Statement::Decl(_, ref name, ref value) => {
                if self.locals.contains_key(&name.0) {
                    self.reporter.error(
                        format!("redeclaration of variable '{}'", name.0),
                        Spanned::span(name),
                    );
                } else {
                    let info = SymbolInfo {
                        typ: Type::Int,
                        offset: self.current_offset,
                        is_param: false,
                        is_array: false,
                        array_size: 0,
                        span: Spanned::span(name),
                    };
                    self.current_offset -= info.typ.size();
                    self.locals.insert(name.0.clone(), info);
                }
                if let Some(ref value) = *value {
                    self.check_expr(value);
                }
            }
            Statement::Expr(ref expr) => self.check_expr(expr),
            Statement::Error => {}
        }
    }

    fn check_expr(&mut self, expr: &Spanned<Expr>) {
        match **expr {
            Expr::Assign(ref target, ref value) => {
                // right side first; the target is not a use
                self.check_expr(value);
                self.check_assign_target(target);
            }
            Expr::Binary(ref lhs, _, ref rhs) => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            Expr::Unary(_, ref operand) => self.check_expr(operand),
            Expr::Parens(ref inner) => self.check_expr(inner),
            Expr::Call(ref name, ref args) => {
                if !self.table.functions.contains(&name.0) {
                    self.reporter.error(
                        format!("call to undeclared function '{}'", name.0),
                        Spanned::span(name),
                    );
                } else {
                    let expected = self.table.param_counts[&name.0];
                    if expected != args.len() {
                        self.reporter.error(
                            format!(
                                "function '{}' expects {} arguments, got {}",
                                name.0,
                                expected,
                                args.len()
                            ),
                            Spanned::span(name),
                        );
                    }
                }
                for arg in args {
                    self.check_expr(arg);
                }
            }
            Expr::Var(ref name) => {
                // a local shadows a global of the same name, so a
                // shadowed reference does not count as a use of the global
                if self.locals.contains_key(&name.0) {
                    self.used_locals.insert(name.0.clone());
                } else if self.table.is_global(&name.0) {
                    self.table.used_globals.insert(name.0.clone());
                } else {
                    self.reporter.error(
                        format!("variable '{}' used but not declared", name.0),
                        Spanned::span(expr),
                    );
                }
            }
            Expr::Number(_) | Expr::Char(_) | Expr::Error => {}
        }
    }

    fn check_assign_target(&mut self, target: &Spanned<Expr>) {
        match **target {
            Expr::Var(ref name) => {
                if !self.is_declared(&name.0) {
                    self.reporter.error(
                        format!("variable '{}' used but not declared", name.0),
                        Spanned::span(target),
                    );
                }
            }
            // chained assignment: the inner assignment is itself checked
            Expr::Assign(_, _) => self.check_expr(target),
            Expr::Error => {}
            _ => {
                self.reporter.error(
                    "left side of assignment must be a variable",
                    Spanned::span(target),
                );
            }
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.locals.contains_key(name) || self.table.is_global(name)
    }

    fn finish(self) -> SymbolTable {
        for (name, &span) in &self.table.globals {
            if !self.table.used_globals.contains(name) {
                self.reporter.warning(
                    format!("variable '{}' declared but never used", name),
                    span,
                );
            }
        }
        if !self.table.functions.contains("main") {
            self.reporter.global_error("function 'main' is not defined");
        }
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minic_errors::reporter::Severity;
    use minic_syntax::{lex, parse};

    fn analyze_source(source: &str) -> (SymbolTable, Reporter) {
        let reporter = Reporter::new();
        let tokens = lex(source, reporter.clone());
        let program = parse(tokens, reporter.clone());
        assert!(!reporter.has_errors(), "test source failed to parse");
        let table = analyze(&program, reporter.clone());
        (table, reporter)
    }

    fn error_messages(reporter: &Reporter) -> Vec<String> {
        reporter
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn accepts_well_formed_program() {
        let (table, reporter) = analyze_source(
            "int add(int a, int b) { return a + b; } int main() { return add(1, 2); }",
        );
        assert!(!reporter.has_errors());
        assert_eq!(table.param_counts["add"], 2);
        assert!(table.returning_functions.contains("add"));
        assert!(table.returning_functions.contains("main"));
    }

    #[test]
    fn local_offsets_descend_from_minus_eight() {
        let (table, _) = analyze_source("int main() { int a = 1; int b = 2; return a + b; }");
        let locals = &table.locals["main"];
        assert_eq!(locals["a"].offset, -8);
        assert_eq!(locals["b"].offset, -12);
    }

    #[test]
    fn param_offsets_ascend_from_sixteen() {
        let (table, _) = analyze_source("int f(int a, int b) { return a + b; } int main() { return f(1, 2); }");
        let locals = &table.locals["f"];
        assert_eq!(locals["a"].offset, 16);
        assert!(locals["a"].is_param);
        assert_eq!(locals["b"].offset, 24);
    }

    #[test]
    fn reports_redeclaration() {
        let (_, reporter) = analyze_source("int main() { int a = 1; int a = 2; return a; }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("redeclaration of variable 'a'")));
    }

    #[test]
    fn reports_undeclared_use() {
        let (_, reporter) = analyze_source("int main() { return x; }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("variable 'x' used but not declared")));
    }

    #[test]
    fn reports_undeclared_assignment_target() {
        let (_, reporter) = analyze_source("int main() { x = 1; return 0; }");
        assert!(reporter.has_errors());
    }

    #[test]
    fn reports_bad_assignment_target() {
        let (_, reporter) = analyze_source("int main() { int a = 1; 1 = a; return a; }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("left side of assignment")));
    }

    #[test]
    fn accepts_chained_assignment_target() {
        let (_, reporter) =
            analyze_source("int main() { int a = 0; int b = 0; a = b = 3; return a; }");
        assert!(!reporter.has_errors());
    }

    #[test]
    fn reports_arity_mismatch() {
        let (_, reporter) = analyze_source("int main() { return putchar(); }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("expects 1 arguments, got 0")));
    }

    #[test]
    fn reports_call_to_undeclared_function() {
        let (_, reporter) = analyze_source("int main() { return f(); }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("call to undeclared function 'f'")));
    }

    #[test]
    fn builtins_are_predeclared() {
        let (_, reporter) = analyze_source("int main() { putchar('x'); return getchar(); }");
        assert!(!reporter.has_errors());
    }

    #[test]
    fn reports_missing_main() {
        let (_, reporter) = analyze_source("int f() { return 0; }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("'main' is not defined")));
    }

    #[test]
    fn warns_about_unused_local() {
        let (_, reporter) = analyze_source("int main() { int a = 1; return 0; }");
        let warnings: Vec<_> = reporter
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("'a' declared but never used"));
        assert!(!reporter.has_errors());
    }

    #[test]
    fn assignment_alone_does_not_count_as_use() {
        let (_, reporter) = analyze_source("int main() { int a = 0; a = 1; return 0; }");
        let warnings = reporter
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn global_use_is_tracked_separately_from_locals() {
        let (table, reporter) = analyze_source("int g; int main() { return g; }");
        assert!(table.used_globals.contains("g"));
        assert!(reporter.get_diagnostics().is_empty());
    }

    #[test]
    fn shadowed_global_still_warns_when_unused() {
        let (table, reporter) =
            analyze_source("int g; int f(int g) { return g; } int main() { return 0; }");
        let warnings: Vec<_> = reporter
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        // f's parameter g is used, the global g it shadows is not
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("'g' declared but never used"));
        assert!(!table.used_globals.contains("g"));
    }

    #[test]
    fn local_use_does_not_leak_into_other_functions() {
        let (_, reporter) = analyze_source(
            "int f() { int x = 1; return x; }\nint main() { int x = 2; return 0; }",
        );
        let warnings: Vec<_> = reporter
            .get_diagnostics()
            .into_iter()
            .filter(|d| d.severity == Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].primary_span.unwrap().start.line, 1);
    }

    #[test]
    fn reports_too_many_parameters() {
        let (_, reporter) = analyze_source(
            "int f(int a, int b, int c, int d, int e, int g, int h, int i, int j) { return 0; } \
             int main() { return 0; }",
        );
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("too many parameters")));
    }

    #[test]
    fn reports_redeclared_global() {
        let (_, reporter) = analyze_source("int g; int g; int main() { return g; }");
        assert!(error_messages(&reporter)
            .iter()
            .any(|m| m.contains("redeclaration of global variable 'g'")));
    }
}
