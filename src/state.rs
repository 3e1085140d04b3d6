//! Reactive state instrumentation.
//!
//! Mutable bindings declared directly in a view body are registered with the
//! runtime, and every write to them (assignment, update, mutating call) is
//! wrapped so the runtime is notified with the new value.

use lazy_static::lazy_static;
use std::collections::HashSet;

use crate::ast::{
    AssignmentOperator, Expression, MemberProperty, Pattern, Statement, VariableDeclaration,
    VariableKind,
};
use crate::context::ViewContext;
use crate::runtime;
use crate::scope::{pattern_names, ScopeStack};

lazy_static! {
    /// Array methods that mutate their receiver in place.
    static ref MUTATING_ARRAY_METHODS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("push");
        s.insert("pop");
        s.insert("shift");
        s.insert("unshift");
        s.insert("splice");
        s.insert("reverse");
        s.insert("sort");
        s
    };
}

/// What the instrumenter needs to know about the current position.
pub struct StateEnv<'a> {
    pub view: &'a ViewContext,
    pub scopes: &'a ScopeStack,
    pub production: bool,
}

impl StateEnv<'_> {
    /// Tracked in the view and not shadowed by a nested declaration.
    pub fn is_view_state(&self, name: &str) -> bool {
        self.view.is_state(name) && !self.scopes.is_shadowed(name)
    }
}

fn undefined() -> Expression {
    Expression::ident("undefined")
}

// ═══════════════════════════════════════════════════════════════════════════════
// WRITES
// ═══════════════════════════════════════════════════════════════════════════════

/// `count = 1` → `view.setState("count", count = view.readState("count", 1))`
/// `count += 1` → `view.setState("count", count += view.readState("count", 1))`
/// `user.name = n` → `view.setState("user", user.name = n, user)`
pub fn instrument_assignment(env: &StateEnv, expression: &mut Expression) {
    let Expression::Assignment {
        operator,
        left,
        right,
        ..
    } = expression
    else {
        return;
    };

    if !matches!(
        operator,
        AssignmentOperator::Assign | AssignmentOperator::Addition | AssignmentOperator::Subtraction
    ) {
        return;
    }

    let (name, capture) = match left.as_ref() {
        Pattern::Identifier { name, .. } => (name.clone(), None),
        Pattern::Expression { expression } => match expression.root_name() {
            Some(root) => (root.to_string(), Some(Expression::ident(root))),
            None => return,
        },
        // destructuring is tracked per statement
        _ => return,
    };

    if !env.is_view_state(&name) {
        return;
    }

    let reads_at_view_level = !env.production
        && capture.is_none()
        && env.scopes.at_view_level();
    if reads_at_view_level {
        let from_file = right
            .as_identifier()
            .map_or(false, |value| env.scopes.is_file_binding(value));
        let value = right.take();
        **right = runtime::read_state(&name, value, from_file);
    }

    let assignment = expression.take();
    *expression = runtime::set_state(&name, assignment, capture, false);
}

/// `count++` → `view.setState("count", count++, count, true)`; the runtime
/// stores the captured new value and hands back the old one.
pub fn instrument_update(env: &StateEnv, expression: &mut Expression) {
    let Expression::Update {
        prefix, argument, ..
    } = expression
    else {
        return;
    };

    let (name, is_member) = match argument.as_ref() {
        Expression::Identifier { name, .. } => (name.clone(), false),
        Expression::Member { .. } => match argument.root_name() {
            Some(root) => (root.to_string(), true),
            None => return,
        },
        _ => return,
    };

    if !env.is_view_state(&name) {
        return;
    }

    // a member update already yields the value the surrounding expression expects
    let is_postfix = !*prefix && !is_member;
    let capture = (is_postfix || is_member).then(|| Expression::ident(&name));
    let update = expression.take();
    *expression = runtime::set_state(&name, update, capture, is_postfix);
}

/// `items.push(x)` → `view.setState("items", items.push(x), items)`
/// `Object.assign(obj, patch)` → `view.setState("obj", Object.assign(obj, patch))`
pub fn instrument_mutation(env: &StateEnv, expression: &mut Expression) {
    let Expression::Call { callee, arguments } = expression else {
        return;
    };

    let Expression::Member {
        object,
        property: MemberProperty::Static(method),
    } = callee.as_ref()
    else {
        return;
    };

    let (name, capture) = if MUTATING_ARRAY_METHODS.contains(method.as_str()) {
        // `Object.keys(x).sort()` mutates a temporary
        if matches!(object.as_ref(), Expression::Call { .. }) {
            return;
        }
        match object.root_name() {
            Some(root) => (root.to_string(), true),
            None => return,
        }
    } else if method == "assign" && object.as_identifier() == Some("Object") {
        match arguments.first().and_then(Expression::as_identifier) {
            Some(target) => (target.to_string(), false),
            None => return,
        }
    } else {
        return;
    };

    if !env.is_view_state(&name) {
        return;
    }

    let call = expression.take();
    let capture = capture.then(|| Expression::ident(&name));
    *expression = runtime::set_state(&name, call, capture, false);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Registers the view-level declaration with the runtime. Destructured names
/// get one registration statement each after the declaration.
pub fn instrument_declaration(
    view: &mut ViewContext,
    mut declaration: VariableDeclaration,
) -> Vec<Statement> {
    match declaration.kind {
        VariableKind::Prop => return instrument_props(declaration),
        VariableKind::Const => return vec![Statement::Variable(declaration)],
        VariableKind::Let | VariableKind::Var => {}
    }

    let mut trackers = Vec::new();
    for declarator in &mut declaration.declarations {
        match &declarator.id {
            Pattern::Identifier { name, .. } => {
                let name = name.clone();
                let init = declarator.init.take().unwrap_or_else(undefined);
                declarator.init = Some(runtime::declare_state(&name, init));
                view.mark_tracked(&name);
            }
            pattern => {
                for name in pattern_names(pattern) {
                    trackers.push(Statement::expression(runtime::declare_state(
                        &name,
                        Expression::ident(&name),
                    )));
                    view.mark_tracked(&name);
                }
            }
        }
    }

    let mut statements = vec![Statement::Variable(declaration)];
    statements.extend(trackers);
    statements
}

/// `prop title = "x"` resolves from the view's external input, and is
/// re-resolved every time new input arrives.
pub fn instrument_props(mut declaration: VariableDeclaration) -> Vec<Statement> {
    declaration.kind = VariableKind::Let;

    let mut reassignments = Vec::new();
    for declarator in &mut declaration.declarations {
        let Some(name) = declarator.id.as_identifier().map(str::to_string) else {
            continue;
        };
        let default = declarator.init.take().unwrap_or_else(undefined);
        declarator.init = Some(runtime::declare_external_prop(&name, default.clone()));
        reassignments.push(Statement::expression(Expression::assign(
            Pattern::ident(&name),
            runtime::declare_external_prop(&name, default),
        )));
    }

    vec![
        Statement::Variable(declaration),
        Statement::expression(runtime::on_external_input(reassignments)),
    ]
}

/// `({ a, b } = next)` at view level keeps the assignment and notifies each
/// tracked name it wrote.
pub fn track_destructuring_assignment(env: &StateEnv, statement: Statement) -> Vec<Statement> {
    let names = match &statement {
        Statement::Expression {
            expression:
                Expression::Assignment {
                    operator: AssignmentOperator::Assign,
                    left,
                    ..
                },
            ..
        } if left.is_destructuring() => pattern_names(left),
        _ => return vec![statement],
    };

    let mut statements = vec![statement];
    for name in names.iter().filter(|name| env.is_view_state(name)) {
        statements.push(Statement::expression(runtime::set_state(
            name,
            Expression::ident(name),
            None,
            false,
        )));
    }
    statements
}
