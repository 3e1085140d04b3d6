//! View transformation.
//!
//! `Transformer` walks a program once. Entering a view opens a `ViewContext`;
//! while inside it, view-level declarations are registered as state, writes to
//! state are instrumented, style assignments are extracted and elements are
//! lowered. Leaving the view finalizes its stylesheet and replaces the
//! declaration with its registration.

use std::collections::HashSet;

use crate::ast::{
    ArrowBody, ArrowFunction, Attribute, Expression, Function, Program, Statement,
    ViewDeclaration,
};
use crate::compile::CompileOptions;
use crate::context::{FileContext, ViewContext};
use crate::element::{self, starts_uppercase, ElementSite};
use crate::runtime;
use crate::scope::{
    collect_declared_names, collect_param_names, collect_view_state, ScopeKind, ScopeStack,
};
use crate::state::{self, StateEnv};
use crate::style;
use crate::stylesheet;
use crate::validate::CompilerError;
use crate::visitor::{
    walk_arrow, walk_element, walk_expression, walk_function, walk_statement, walk_statements,
    walk_view, VisitMut, VisitResult,
};

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORMER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Transformer<'a> {
    options: &'a CompileOptions,
    file: FileContext,
    scopes: ScopeStack,
    /// Names of the views declared in this file.
    file_views: HashSet<String>,
    /// Elements currently open around the visited node.
    element_depth: usize,
    /// Open elements carrying a `repeat` attribute.
    repeat_depth: usize,
}

impl<'a> Transformer<'a> {
    pub fn new(options: &'a CompileOptions, file: FileContext) -> Self {
        Self {
            options,
            file,
            scopes: ScopeStack::new(),
            file_views: HashSet::new(),
            element_depth: 0,
            repeat_depth: 0,
        }
    }

    pub fn run(&mut self, program: &mut Program) -> VisitResult {
        self.file_views = program
            .body
            .iter()
            .filter_map(|statement| match statement {
                Statement::View(view) => Some(view.name.clone()),
                _ => None,
            })
            .collect();
        self.scopes
            .push(ScopeKind::File, collect_declared_names(&program.body));
        self.visit_program(program)?;
        self.scopes.pop();
        Ok(())
    }

    pub fn into_context(self) -> FileContext {
        self.file
    }

    fn state_env(&self) -> Option<StateEnv<'_>> {
        self.file.view.as_ref().map(|view| StateEnv {
            view,
            scopes: &self.scopes,
            production: self.options.production,
        })
    }

    fn enter_view(&mut self, view: &ViewDeclaration) -> VisitResult {
        let full_name = view.full_name();
        if let Some(outer) = &self.file.view {
            return Err(CompilerError::nested_view(
                &self.file.file,
                &outer.full_name,
                &full_name,
                view.span,
            ));
        }
        log::debug!("compiling view {} in {}", full_name, self.file.file);

        let mut context =
            ViewContext::new(full_name, view.span, self.file.relative_file.clone());
        for name in collect_view_state(&view.body) {
            context.state.entry(name).or_insert(false);
        }
        self.scopes
            .push(ScopeKind::View, collect_declared_names(&view.body));
        context.child_views = self
            .scopes
            .bound_names()
            .chain(&self.file_views)
            .filter(|name| starts_uppercase(name))
            .cloned()
            .collect();
        self.file.view = Some(context);
        Ok(())
    }

    /// Emits `installStyles` (when the view has styles) followed by the view
    /// registration, and files away the view's metadata.
    fn finish_view(&mut self, view: ViewDeclaration) -> Result<Vec<Statement>, CompilerError> {
        let Some(context) = self.file.view.take() else {
            return Ok(vec![Statement::View(view)]);
        };
        log::debug!(
            "finished view {}: {} state, {} style groups",
            context.full_name,
            context.state.len(),
            context.styles.len()
        );

        let mut statements = Vec::with_capacity(2);
        if let Some(styles) = stylesheet::finalize(&context, self.options) {
            self.file.css.insert(context.full_name.clone(), styles.css);
            self.file.stylesheets.extend(styles.entries);
            statements.push(styles.install);
        }
        statements.push(Statement::expression(runtime::register_view(
            &context.full_name,
            view.body,
        )));

        self.file.meta.insert(context.full_name, context.meta);
        Ok(statements)
    }

    fn transform_element(&mut self, expression: &mut Expression) -> VisitResult {
        let Expression::Element(node) = expression else {
            return Ok(());
        };

        let name = node.name.display();
        let root = name.split('.').next().unwrap_or(name.as_str());
        let is_variable = starts_uppercase(root) && self.scopes.is_bound(root);
        if starts_uppercase(root) {
            if let Some(view) = self.file.view.as_mut() {
                view.child_views.insert(root.to_string());
            }
        }
        let has_repeat = has_attribute(&node.attributes, "repeat");
        let in_repeat =
            has_repeat || self.repeat_depth > 0 || self.scopes.is_bound(runtime::INDEX);
        let is_root = self.element_depth == 0 && self.scopes.at_view_level();

        let site = ElementSite {
            view: self.file.view.as_mut(),
            loose_keys: &mut self.file.loose_keys,
            in_repeat,
            is_root,
            is_variable,
        };
        let mut plan = element::prepare(node, site);

        for control in [&mut plan.condition, &mut plan.route, &mut plan.repeat]
            .into_iter()
            .flatten()
        {
            self.visit_expression(control)?;
        }

        self.element_depth += 1;
        if has_repeat {
            self.repeat_depth += 1;
        }
        let walked = walk_element(self, node);
        self.element_depth -= 1;
        if has_repeat {
            self.repeat_depth -= 1;
        }
        walked?;

        if let Expression::Element(node) = expression.take() {
            *expression = element::lower(plan, *node);
        }
        Ok(())
    }

    fn instrument(&self, expression: &mut Expression) {
        let Some(env) = self.state_env() else {
            return;
        };
        match expression {
            Expression::Assignment { .. } => state::instrument_assignment(&env, expression),
            Expression::Update { .. } => state::instrument_update(&env, expression),
            Expression::Call { .. } => state::instrument_mutation(&env, expression),
            _ => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VISITOR
// ═══════════════════════════════════════════════════════════════════════════════

impl VisitMut for Transformer<'_> {
    fn visit_statement(&mut self, statement: &mut Statement) -> VisitResult {
        let names = match statement {
            Statement::For {
                init: Some(init), ..
            } => collect_declared_names(std::slice::from_ref(init.as_ref())),
            _ => return walk_statement(self, statement),
        };
        self.scopes.push(ScopeKind::Block, names);
        let result = walk_statement(self, statement);
        self.scopes.pop();
        result
    }

    fn exit_statement(&mut self, statement: Statement) -> Result<Vec<Statement>, CompilerError> {
        match statement {
            Statement::View(view) => self.finish_view(view),
            Statement::Variable(declaration) if self.scopes.at_view_level() => {
                match self.file.view.as_mut() {
                    Some(view) => Ok(state::instrument_declaration(view, declaration)),
                    None => Ok(vec![Statement::Variable(declaration)]),
                }
            }
            statement if style::style_name(&statement).is_some() => {
                let file = &self.file.file;
                match self.file.view.as_mut() {
                    Some(view) => style::extract(view, statement, file, self.options),
                    None => Ok(vec![statement]),
                }
            }
            statement if self.scopes.at_view_level() => match self.state_env() {
                Some(env) => Ok(state::track_destructuring_assignment(&env, statement)),
                None => Ok(vec![statement]),
            },
            statement => Ok(vec![statement]),
        }
    }

    fn visit_block(&mut self, body: &mut Vec<Statement>) -> VisitResult {
        self.scopes.push(ScopeKind::Block, collect_declared_names(body));
        let result = walk_statements(self, body);
        self.scopes.pop();
        result
    }

    fn visit_view(&mut self, view: &mut ViewDeclaration) -> VisitResult {
        self.enter_view(view)?;
        let depths = (self.element_depth, self.repeat_depth);
        self.element_depth = 0;
        self.repeat_depth = 0;

        walk_view(self, view)?;

        (self.element_depth, self.repeat_depth) = depths;
        self.scopes.pop();
        Ok(())
    }

    fn visit_function(&mut self, function: &mut Function) -> VisitResult {
        let mut names = collect_param_names(&function.params);
        names.extend(collect_declared_names(&function.body));
        self.scopes.push(ScopeKind::Function, names);
        let result = walk_function(self, function);
        self.scopes.pop();
        result
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) -> VisitResult {
        let mut names = collect_param_names(&arrow.params);
        if let ArrowBody::Block(body) = &arrow.body {
            names.extend(collect_declared_names(body));
        }
        self.scopes.push(ScopeKind::Function, names);
        let result = walk_arrow(self, arrow);
        self.scopes.pop();
        result
    }

    fn visit_expression(&mut self, expression: &mut Expression) -> VisitResult {
        if matches!(expression, Expression::Element(_)) {
            return self.transform_element(expression);
        }
        walk_expression(self, expression)?;
        self.instrument(expression);
        Ok(())
    }
}

fn has_attribute(attributes: &[Attribute], name: &str) -> bool {
    attributes.iter().any(|attribute| attribute.name() == Some(name))
}
