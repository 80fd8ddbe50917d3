//! Helpers to build and aggregate diagnostics.

use std::cell::RefCell;
use std::rc::Rc;
use position::Span;


/// Reporter aggregates and allows building diagnostics.
///
/// Note that reporters created by cloning will share the diagnostic list
/// with the original reporter, so every compilation phase can hold its own
/// handle.
#[derive(Default, Debug, Clone)]
pub struct Reporter {
    diagnostics: Rc<RefCell<Vec<Diagnostic>>>,
}

impl Reporter {
    /// Create a new reporter with no diagnostics.
    pub fn new() -> Reporter {
        Default::default()
    }

    /// Returns whether the reporter has any errors.
    ///
    /// This function returns false when the reporter only has warnings.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use minic_errors::reporter::Reporter;
    ///
    /// let reporter = Reporter::new();
    /// assert!(!reporter.has_errors());
    /// ```
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Return the list of diagnostics collected with this reporter.
    ///
    /// The diagnostics are returned in arbitrary order; sort them before
    /// displaying.
    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Record an error without an associated span.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use minic_errors::reporter::Reporter;
    ///
    /// let reporter = Reporter::new();
    /// reporter.global_error("fonction 'main' absente");
    /// assert!(reporter.has_errors());
    /// ```
    pub fn global_error<T: Into<String>>(&self, msg: T) {
        self.push(Severity::Error, msg.into(), None);
    }

    /// Record an error at the given span.
    pub fn error<T: Into<String>>(&self, msg: T, span: Span) {
        self.push(Severity::Error, msg.into(), Some(span));
    }

    /// Record a warning at the given span.
    pub fn warning<T: Into<String>>(&self, msg: T, span: Span) {
        self.push(Severity::Warning, msg.into(), Some(span));
    }

    /// Record a warning without an associated span.
    pub fn global_warning<T: Into<String>>(&self, msg: T) {
        self.push(Severity::Warning, msg.into(), None);
    }

    fn push(&self, severity: Severity, message: String, primary_span: Option<Span>) {
        let diagnostic = Diagnostic {
            message,
            primary_span,
            severity,
        };
        self.diagnostics.borrow_mut().push(diagnostic);
    }
}

/// Diagnostic severity.
#[derive(PartialEq, PartialOrd, Eq, Ord, Hash, Debug, Copy, Clone)]
pub enum Severity {
    /// A fatal error; compilation stops at the next phase boundary.
    Error,
    /// A warning; never changes the exit status.
    Warning,
}

#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub message: String,
    pub primary_span: Option<Span>,
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use position::{Position, Span};

    fn span() -> Span {
        Position::new(2, 0).to(Position::new(2, 5))
    }

    #[test]
    fn warnings_are_not_errors() {
        let reporter = Reporter::new();
        reporter.warning("variable 'x' declared but never used", span());
        assert!(!reporter.has_errors());
        assert_eq!(reporter.get_diagnostics().len(), 1);
    }

    #[test]
    fn cloned_reporters_share_diagnostics() {
        let reporter = Reporter::new();
        let clone = reporter.clone();
        clone.error("redeclaration of variable 'a'", span());
        assert!(reporter.has_errors());
        assert_eq!(reporter.get_diagnostics().len(), 1);
    }
}
