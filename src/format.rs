//! Code formatting for generated output
//!
//! Formatting failure is the sole recoverable error in the pipeline: callers
//! log it and emit the raw buffer instead.

use crate::error::{Error, Result};

/// Format generated Rust code with prettyplease.
pub fn format_rust(code: &str) -> Result<String> {
    let syntax_tree = syn::parse_file(code).map_err(|e| Error::Format(e.to_string()))?;
    Ok(prettyplease::unparse(&syntax_tree))
}
