// ==============================================================================
// Shared Test Helpers
// ==============================================================================
//
// Each test file that imports this module compiles its own copy, so not every
// function is used in every binary. Suppress the resulting dead_code warnings.
#![allow(dead_code)]
// Import this module in each test file with:
//
//     mod common;
//     use common::{compile_error, memory, render_diagnostic};

use miette::{GraphicalReportHandler, GraphicalTheme};
use openapi_typegen::{CompileError, MemoryLoader};

/// Directory holding the multi-file fixture documents.
pub const FIXTURES: &str = "tests/fixtures";

/// Render a diagnostic to a deterministic string. Uses the non-unicode theme
/// at 80 columns.
pub fn render_diagnostic(report: &miette::Report) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, report.as_ref())
        .expect("render to String is infallible");
    buf
}

/// The `CompileError` carried by a report.
pub fn compile_error(report: &miette::Report) -> &CompileError {
    report
        .downcast_ref::<CompileError>()
        .unwrap_or_else(|| panic!("expected a CompileError, got: {report:?}"))
}

/// An in-memory loader over `(file name, text)` pairs.
pub fn memory<const N: usize>(files: [(&str, &str); N]) -> MemoryLoader {
    files.into_iter().collect()
}

/// Messages of an error and all its related errors, primary first.
pub fn all_messages(error: &CompileError) -> Vec<&str> {
    std::iter::once(error.message())
        .chain(error.related_errors().iter().map(CompileError::message))
        .collect()
}
