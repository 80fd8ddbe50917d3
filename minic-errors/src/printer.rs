//! One-line diagnostic rendering.
//!
//! Diagnostics go to stderr, one per line, prefixed with `ERREUR:` for
//! errors and `AVERTISSEMENT:` for warnings.

use reporter::{Diagnostic, Severity};


/// Format a single diagnostic as its stderr line, without the trailing
/// newline.
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let prefix = match diagnostic.severity {
        Severity::Error => "ERREUR",
        Severity::Warning => "AVERTISSEMENT",
    };
    match diagnostic.primary_span {
        Some(span) => format!(
            "{}: line {}: {}",
            prefix,
            span.start.line + 1,
            diagnostic.message
        ),
        None => format!("{}: {}", prefix, diagnostic.message),
    }
}

/// Print a single diagnostic to stderr.
pub fn print_diagnostic(diagnostic: &Diagnostic) {
    eprintln!("{}", format_diagnostic(diagnostic));
}

/// Print all diagnostics to stderr, in the given order.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        print_diagnostic(diagnostic);
    }
}
