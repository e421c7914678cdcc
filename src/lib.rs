// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # colgen — collection-method generator for Rust sources
//!
//! colgen scans an annotated source file for `//colgen:` directive comments,
//! resolves the referenced struct definitions by parsing the surrounding
//! source tree, and emits a sibling `<file>_colgen.rs` module with
//! mechanically derivable collection types and methods.
//!
//! ## Directives
//!
//! ```text
//! //colgen:News,Category,Tag
//! //colgen:News:TagIds,UniqueTagIds,Map(db)
//! //colgen:Episode:ShowIds,MapP(db.SiteUser),Index(MovieId)
//! //colgen:Season:mapp(db)
//! ```
//!
//! Base generation, for every entity listed without custom rules:
//!
//! - collection newtype `pub struct NewsList(pub Vec<News>);`
//! - `ids()` and `index()` methods when the struct has an `id` field
//!
//! Custom rules attach extra methods to the collection type:
//!
//! - `<Field>` — collect all values of a field, input order preserved
//! - `Unique<Field>` — collect distinct values (order unspecified);
//!   `Vec`-typed fields are flattened first
//! - `Index(<Field>)` — index by an arbitrary field; the last record under
//!   a duplicate key wins
//! - `Map(arg)` / `MapP(arg)` — converter from a sequence of the argument
//!   type into the collection type, delegating to an external `map`/`map_p`
//!   helper and `new_<entity>` constructor; lowercase spelling makes the
//!   converter private
//!
//! ## Inline injection
//!
//! A second directive class replaces itself with a synthesized wrapper
//! struct and constructor, directly in the annotated file:
//!
//! ```text
//! //colgen@NewCall(db)
//! //colgen@newUserSummary(dating.User,full,json)
//! ```
//!
//! `full` copies all `pub` fields of the referenced struct; `json` adds
//! serde derives and camelCase rename attributes.
//!
//! ## Library surface
//!
//! The core is pure functions over strings and a [`TypeResolver`] handle:
//!
//! ```rust,ignore
//! use colgen::{parse_rules, Generator};
//!
//! let rules = parse_rules(&lines, false)?;
//! let mut gen = Generator::new("news", "", "");
//! gen.use_package_dir(dir)?;
//! let code = gen.generate(&rules)?;
//! let formatted = colgen::format_rust(&code).unwrap_or(code);
//! ```

pub mod error;
pub mod format;
pub mod generate;
pub mod naming;
pub mod replace;
pub mod resolve;
pub mod rules;
pub mod scan;
pub mod templates;

// Re-exports
pub use error::{Error, Result};
pub use format::format_rust;
pub use generate::Generator;
pub use naming::Entity;
pub use replace::{apply, parse_replace_rule, parse_replace_rules, ReplaceField, ReplaceRule, Replacer};
pub use resolve::{EntityField, FieldModel, TypeResolver};
pub use rules::{
    merge_rules, parse_rules, validate_rules, CustomRule, Rule, COLGEN_PREFIX, FIELD_ID,
    INJECTION_PREFIX,
};
pub use scan::{file_stem, read_file, ColgenLines};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
