// ==============================================================================
// Compilation Errors
// ==============================================================================
//
// Every failure during compilation is fatal. Errors are classified into a
// small taxonomy so callers (and tests) can tell a malformed document apart
// from a document that is well-formed but inconsistent. Multi-error reports
// (e.g., several unresolved references) carry the extra errors as `related`
// diagnostics, which miette renders beneath the primary one.

use std::fmt;

/// The class of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document is syntactically valid but uses a shape we cannot
    /// interpret: malformed `$ref`, `oneOf` without discriminator, array
    /// without items, unknown type, bad path template, and so on.
    Format,
    /// The document is well-formed but contradicts itself: unresolved
    /// references, duplicate type names, path parameter mismatches, a body on
    /// a GET, or a missing success response.
    Consistency,
    /// An inline enum collides with other names all the way up to the
    /// declaration that contains it.
    NamingExhaustion,
    /// A referenced document could not be read.
    Load,
    /// A fixpoint loop exceeded its bound. Unreachable for finite input.
    Internal,
}

impl ErrorKind {
    /// Stable diagnostic code for this kind.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Format => "openapi_typegen::format",
            ErrorKind::Consistency => "openapi_typegen::consistency",
            ErrorKind::NamingExhaustion => "openapi_typegen::naming",
            ErrorKind::Load => "openapi_typegen::load",
            ErrorKind::Internal => "openapi_typegen::internal",
        }
    }
}

/// A fatal compilation error.
#[derive(Debug)]
pub struct CompileError {
    kind: ErrorKind,
    message: String,
    help: Option<String>,
    related: Vec<CompileError>,
}

pub(crate) type Result<T, E = CompileError> = std::result::Result<T, E>;

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CompileError {
            kind,
            message: message.into(),
            help: None,
            related: Vec::new(),
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Format, message)
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Consistency, message)
    }

    pub fn naming(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NamingExhaustion, message)
    }

    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Load, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn with_related(mut self, related: Vec<CompileError>) -> Self {
        self.related = related;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn help_text(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub fn related_errors(&self) -> &[CompileError] {
        &self.related
    }

    /// Fold a list of errors into one: the first becomes the primary error,
    /// the rest are attached as related diagnostics. Returns `None` for an
    /// empty list.
    pub(crate) fn combine(errors: Vec<CompileError>) -> Option<CompileError> {
        let mut errors = errors.into_iter();
        let first = errors.next()?;
        let mut related = first.related;
        related.extend(errors);
        Some(CompileError { related, ..first })
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CompileError {}

impl miette::Diagnostic for CompileError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h.as_str()) as Box<dyn fmt::Display + 'a>)
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn miette::Diagnostic> + 'a>> {
        if self.related.is_empty() {
            return None;
        }
        Some(Box::new(
            self.related.iter().map(|e| e as &dyn miette::Diagnostic),
        ))
    }
}
