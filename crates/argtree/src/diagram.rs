//! Bracketed rendering of a parse result, for diagnostics.

use crate::result::{ParseResult, ResultRef};

impl ParseResult {
    /// Render the result tree, e.g. `[ outer [ inner <arg> ] ]   ???--> extra`.
    ///
    /// Implicit results are prefixed with `*`, results with errors with `!`.
    pub fn diagram(&self) -> String {
        let mut out = String::new();
        write_result(&mut out, self.root());
        if !self.unmatched.is_empty() {
            out.push_str("   ???-->");
            for token in &self.unmatched {
                out.push(' ');
                out.push_str(token.value());
            }
        }
        out
    }
}

fn write_result(out: &mut String, result: ResultRef<'_>) {
    if result.has_error() {
        out.push('!');
    }
    if result.is_implicit() {
        out.push('*');
    }
    out.push_str("[ ");
    out.push_str(result.token().value());

    if result.is_implicit() {
        if let Some(value) = result.value() {
            out.push_str(&format!(" <{value}>"));
        }
    } else {
        for token in result.tokens() {
            out.push_str(&format!(" <{}>", token.value()));
        }
    }

    for child in result.children() {
        out.push(' ');
        write_result(out, child);
    }
    out.push_str(" ]");
}
