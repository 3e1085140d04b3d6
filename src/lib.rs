//! # View Compiler
//!
//! Compiles `view` declarations embedded in ordinary JavaScript into calls
//! against a small runtime.
//!
//! ## Pipeline
//!
//! 1. **Validate**: a file that declares a view must not export anything
//!    (`V-ERR-EXPORT`). Checked before any rewriting.
//! 2. **Transform**: one walk over the tree. Inside a view:
//!    - `let` / `var` at view level → `view.declareState(name, init)`
//!    - writes to state → `view.setState(name, ...)`
//!    - `prop x = d` → `view.declareExternalProp("x", d)` plus an
//!      `view.onExternalInput` re-resolution callback
//!    - `<tag ...>` → `Runtime.createElement([... "tag", key], attrs, ...children)`
//!    - `$name = {...}` → static properties hoisted to the stylesheet,
//!      dynamic ones installed at `$["name"]`
//! 3. **Finalize**: per view, `Runtime.installStyles(...)` followed by
//!    `Runtime.registerView(name, function (view, $) {...})`.
//! 4. **Print**: the rewritten tree lowered to an oxc AST and printed by `oxc_codegen`.
//!
//! All per-compile state lives in a `FileContext` created for that compile, so
//! one `Session` may compile many files at once.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod ast;
pub mod codegen;
pub mod compile;
pub mod context;
pub mod element;
pub mod meta;
pub mod runtime;
pub mod scope;
pub mod state;
pub mod style;
pub mod stylesheet;
pub mod transform;
pub mod validate;
pub mod visitor;

#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod state_tests;
#[cfg(test)]
mod test_fixtures;

pub use ast::Program;
pub use compile::{compile_program, CompileOptions, CompileOutput, Session, WriteStyleCallback};
pub use meta::{Clock, ManualClock, MetaBatcher, MetaCallback, MetaTable, SystemClock, ViewMeta};
pub use stylesheet::{resolve_theme_keys, StyleSheetEntry};
pub use validate::{CompilerError, ErrorKind};

/// Node entry point: takes the program and options as JSON, returns the
/// compile output as JSON.
#[cfg(feature = "napi")]
#[napi]
pub fn compile_view_native(
    file_path: String,
    program_json: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    let options = match options_json {
        Some(json) => CompileOptions::from_json(&json)
            .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        None => CompileOptions::default(),
    };
    let program: Program = serde_json::from_str(&program_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let output = compile_program(&file_path, &program, options)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    serde_json::to_string(&output).map_err(|e| napi::Error::from_reason(e.to_string()))
}
