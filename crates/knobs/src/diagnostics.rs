use std::cell::RefCell;
use std::fmt;

use knobs_lexer::Span;
use knobs_syntax::{LineIndex, SourceLocation};

/// One non-fatal finding. Fatal conditions are errors (`NodeError`), not
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub node: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: warning: {}: {}",
            self.location, self.node, self.message
        )
    }
}

/// Collects warnings during build and refresh. Entries are retained for
/// callers (the interactive editor shows them; tests assert on them) and
/// mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn warn(
        &self,
        location: SourceLocation,
        node: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            location,
            node: node.into(),
            message: message.into(),
        };
        tracing::warn!("{diagnostic}");
        self.entries.borrow_mut().push(diagnostic);
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

/// Source-file context used by build-phase passes to turn spans into
/// locations.
#[derive(Debug)]
pub struct FileContext {
    pub file: String,
    index: LineIndex,
}

impl FileContext {
    pub fn new(file: impl Into<String>, source: &str) -> Self {
        FileContext {
            file: file.into(),
            index: LineIndex::new(source),
        }
    }

    pub fn location(&self, span: &Span) -> SourceLocation {
        let (line, column) = self.index.line_col(span.start);
        SourceLocation::new(self.file.as_str(), line, column)
    }
}
