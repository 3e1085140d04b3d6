//! Compile entry points.
//!
//! A `Session` holds the options and host callbacks for a build and compiles
//! files with it. Each compile gets its own `FileContext`, so a session can
//! compile files in parallel. Metadata from every compile goes through the
//! session's batcher, which is flushed when the session finishes or drops.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::ast::{Program, Span};
use crate::codegen;
use crate::context::FileContext;
use crate::meta::{Clock, MetaBatcher, MetaCallback, SystemClock, ViewMeta};
use crate::stylesheet::StyleSheetEntry;
use crate::transform::Transformer;
use crate::validate::{validate_program, CompilerError};

/// `writeStyle(viewName, cssText)`
pub type WriteStyleCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Prepended to every generated selector.
    pub selector_prefix: Option<String>,
    /// Flatten `$<themeKey>` groups into per-theme groups.
    pub theme: bool,
    pub theme_key: String,
    /// Drops read instrumentation and the static/dynamic clash fingerprints.
    pub production: bool,
    /// Metadata file paths are made relative to this directory.
    pub base_path: Option<String>,
    /// Metadata batching window.
    pub meta_window_ms: u64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            selector_prefix: None,
            theme: true,
            theme_key: "theme".to_string(),
            production: false,
            base_path: None,
            meta_window_ms: 100,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn relative_path(&self, file: &str) -> String {
        let Some(base) = &self.base_path else {
            return file.to_string();
        };
        match Path::new(file).strip_prefix(base) {
            Ok(relative) => relative.to_string_lossy().into_owned(),
            Err(_) => file.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub program: Program,
    /// Printed JavaScript of `program`.
    pub code: String,
    pub stylesheets: Vec<StyleSheetEntry>,
    /// View name → CSS text.
    pub css: IndexMap<String, String>,
    /// View name → metadata.
    pub meta: IndexMap<String, ViewMeta>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SESSION
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Session {
    options: CompileOptions,
    write_style: Option<WriteStyleCallback>,
    clock: Arc<dyn Clock>,
    batcher: Mutex<MetaBatcher>,
}

impl Session {
    pub fn new(options: CompileOptions) -> Self {
        let window = Duration::from_millis(options.meta_window_ms);
        Self {
            options,
            write_style: None,
            clock: Arc::new(SystemClock),
            batcher: Mutex::new(MetaBatcher::new(window, None)),
        }
    }

    /// Delivers batched metadata to `callback`.
    pub fn with_meta_callback(mut self, callback: MetaCallback) -> Self {
        let window = Duration::from_millis(self.options.meta_window_ms);
        self.batcher = Mutex::new(MetaBatcher::new(window, Some(callback)));
        self
    }

    pub fn with_write_style(mut self, callback: WriteStyleCallback) -> Self {
        self.write_style = Some(callback);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles one file. On error nothing is recorded, no stylesheet is
    /// written and no output exists.
    pub fn compile(&self, file: &str, program: &Program) -> Result<CompileOutput, CompilerError> {
        validate_program(file, program)?;

        let mut program = program.clone();
        let context = FileContext::new(file.to_string(), self.options.relative_path(file));
        let mut transformer = Transformer::new(&self.options, context);
        transformer.run(&mut program)?;
        let context = transformer.into_context();

        let code = codegen::print_program(&program)
            .map_err(|err| CompilerError::codegen(file, &err, Span::default()))?;

        if let Some(write_style) = &self.write_style {
            for (view, css) in &context.css {
                write_style(view, css);
            }
        }
        self.record_meta(&context.meta);

        Ok(CompileOutput {
            program,
            code,
            stylesheets: context.stylesheets,
            css: context.css,
            meta: context.meta,
        })
    }

    /// Compiles independent files in parallel. Results keep the input order.
    pub fn compile_all(
        &self,
        files: &[(String, Program)],
    ) -> Vec<Result<CompileOutput, CompilerError>> {
        files
            .par_iter()
            .map(|(file, program)| self.compile(file, program))
            .collect()
    }

    fn record_meta(&self, metas: &IndexMap<String, ViewMeta>) {
        if metas.is_empty() {
            return;
        }
        let now = self.clock.now();
        if let Ok(mut batcher) = self.batcher.lock() {
            for (view, meta) in metas {
                batcher.record(view, meta.clone(), now);
            }
        }
    }

    /// Delivers the pending metadata batch if its window has elapsed.
    pub fn poll(&self) -> bool {
        let now = self.clock.now();
        self.batcher
            .lock()
            .map(|mut batcher| batcher.poll(now))
            .unwrap_or(false)
    }

    /// Delivers any pending metadata now.
    pub fn finish(&self) -> bool {
        self.batcher
            .lock()
            .map(|mut batcher| batcher.flush())
            .unwrap_or(false)
    }

    pub fn meta_deliveries(&self) -> usize {
        self.batcher
            .lock()
            .map(|batcher| batcher.deliveries())
            .unwrap_or(0)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Ok(batcher) = self.batcher.get_mut() {
            batcher.flush();
        }
    }
}

/// Compiles a single file with a throwaway session.
pub fn compile_program(
    file: &str,
    program: &Program,
    options: CompileOptions,
) -> Result<CompileOutput, CompilerError> {
    Session::new(options).compile(file, program)
}
