//! Compilation contexts.
//!
//! A `FileContext` lives for one compile of one file; a `ViewContext` lives
//! while a single view declaration is being compiled. Nothing here outlives the
//! compile call, so independent files can compile in parallel.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::ast::{Expression, Span};
use crate::meta::ViewMeta;
use crate::stylesheet::StyleSheetEntry;

/// Per-name occurrence counter used for element keys.
#[derive(Debug, Default, Clone)]
pub struct KeyCounter {
    counts: HashMap<String, u32>,
}

impl KeyCounter {
    /// First occurrence of a name gets 1, the next 2, and so on.
    pub fn next(&mut self, name: &str) -> u32 {
        let count = self.counts.entry(name.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// One property of a style group as written in source.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleProp {
    pub name: String,
    pub value: Expression,
    /// `value` as printed JavaScript.
    pub printed: String,
    pub is_static: bool,
}

#[derive(Debug)]
pub struct ViewContext {
    /// `Name` or `Name.SubName`
    pub full_name: String,
    pub span: Span,
    /// Tracked state: name → registration emitted.
    pub state: IndexMap<String, bool>,
    /// Style table: `$name` → properties, in source order.
    pub styles: IndexMap<String, Vec<StyleProp>>,
    /// Style names already assigned in this view.
    pub style_names: HashSet<String>,
    /// Display names of the elements rendered directly by the view body.
    pub root_elements: Vec<String>,
    pub keys: KeyCounter,
    pub has_child_with_class: bool,
    /// Uppercase names that refer to child views here: bindings in scope,
    /// views declared in the same file, and tags the view renders.
    pub child_views: HashSet<String>,
    /// Printed values of every static / dynamic style property, by property name.
    pub static_style_keys: IndexMap<String, String>,
    pub dynamic_style_keys: IndexMap<String, String>,
    pub meta: ViewMeta,
}

impl ViewContext {
    pub fn new(full_name: String, span: Span, file: String) -> Self {
        Self {
            full_name,
            span,
            state: IndexMap::new(),
            styles: IndexMap::new(),
            style_names: HashSet::new(),
            root_elements: Vec::new(),
            keys: KeyCounter::default(),
            has_child_with_class: false,
            child_views: HashSet::new(),
            static_style_keys: IndexMap::new(),
            dynamic_style_keys: IndexMap::new(),
            meta: ViewMeta {
                file,
                ..ViewMeta::default()
            },
        }
    }

    pub fn is_state(&self, name: &str) -> bool {
        self.state.contains_key(name)
    }

    pub fn mark_tracked(&mut self, name: &str) {
        self.state.insert(name.to_string(), true);
    }

    /// Whether the view's single root element carries the view's own name, so
    /// that tag styles apply to the view root itself.
    pub fn styles_tag_as_root(&self) -> bool {
        match self.root_elements.as_slice() {
            [] => true,
            [only] => *only == self.full_name.to_lowercase(),
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct FileContext {
    pub file: String,
    /// File path relative to the configured base path, for metadata.
    pub relative_file: String,
    pub view: Option<ViewContext>,
    /// Keys for elements written outside any view.
    pub loose_keys: KeyCounter,
    pub stylesheets: Vec<StyleSheetEntry>,
    pub css: IndexMap<String, String>,
    /// Finished views' metadata, in completion order.
    pub meta: IndexMap<String, ViewMeta>,
}

impl FileContext {
    pub fn new(file: String, relative_file: String) -> Self {
        Self {
            file,
            relative_file,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_counter_counts_per_name() {
        let mut keys = KeyCounter::default();
        assert_eq!(keys.next("div"), 1);
        assert_eq!(keys.next("span"), 1);
        assert_eq!(keys.next("div"), 2);
        assert_eq!(keys.next("div"), 3);
    }

    #[test]
    fn test_root_rule_uses_lowercased_view_name() {
        let mut view = ViewContext::new("Card".into(), Span::default(), "a.js".into());
        assert!(view.styles_tag_as_root());

        view.root_elements.push("card".into());
        assert!(view.styles_tag_as_root());

        view.root_elements[0] = "div".into();
        assert!(!view.styles_tag_as_root());

        view.root_elements = vec!["card".into(), "card".into()];
        assert!(!view.styles_tag_as_root());
    }
}
