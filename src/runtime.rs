//! The runtime surface compiled views call into.
//!
//! Namespace-level calls go through `Runtime`, per-view calls through the
//! `view` parameter of the registered factory, and style slots through `$`.

use crate::ast::{Expression, Pattern, Statement};

pub const RUNTIME: &str = "Runtime";
pub const VIEW: &str = "view";
pub const STYLES: &str = "$";
pub const STATIC_STYLES: &str = "_static";
/// Parameters of repeat callbacks and dynamic style functions.
pub const ITEM: &str = "_";
pub const INDEX: &str = "_index";
pub const FROM_FILE: &str = "fromFile";

fn runtime_call(method: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(
        Expression::member(Expression::ident(RUNTIME), method),
        arguments,
    )
}

fn view_call(method: &str, arguments: Vec<Expression>) -> Expression {
    Expression::call(Expression::member(Expression::ident(VIEW), method), arguments)
}

fn thunk(value: Expression) -> Expression {
    Expression::function(&[], vec![Statement::ret(value)])
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAMESPACE CALLS
// ═══════════════════════════════════════════════════════════════════════════════

/// `Runtime.registerView("Name", function (view, $) { body })`
pub fn register_view(full_name: &str, body: Vec<Statement>) -> Expression {
    runtime_call(
        "registerView",
        vec![
            Expression::string(full_name),
            Expression::function(&[VIEW, STYLES], body),
        ],
    )
}

pub fn create_element(
    descriptor: Vec<Expression>,
    attributes: Expression,
    children: Vec<Expression>,
) -> Expression {
    let mut arguments = vec![Expression::array(descriptor), attributes];
    arguments.extend(children);
    runtime_call("createElement", arguments)
}

pub fn route_matches(pattern: Expression) -> Expression {
    runtime_call("routeMatches", vec![pattern])
}

pub fn route_params(pattern: Expression) -> Expression {
    runtime_call("routeParams", vec![pattern])
}

/// `Runtime.repeatRange(n).map(function (_, _index) { return body; })`
pub fn repeat(count: Expression, body: Expression) -> Expression {
    Expression::call(
        Expression::member(runtime_call("repeatRange", vec![count]), "map"),
        vec![Expression::function(
            &[ITEM, INDEX],
            vec![Statement::ret(body)],
        )],
    )
}

pub fn install_styles(view_name: &str, class_names: Expression, raw: Expression) -> Expression {
    runtime_call(
        "installStyles",
        vec![Expression::string(view_name), class_names, raw],
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW CALLS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn declare_state(name: &str, initial: Expression) -> Expression {
    view_call("declareState", vec![Expression::string(name), initial])
}

/// `view.setState(name, value[, capture[, true]])`. The capture argument is
/// evaluated after `value`, so it observes the mutated binding.
pub fn set_state(
    name: &str,
    value: Expression,
    capture: Option<Expression>,
    is_postfix: bool,
) -> Expression {
    let mut arguments = vec![Expression::string(name), value];
    if let Some(capture) = capture {
        arguments.push(capture);
        if is_postfix {
            arguments.push(Expression::boolean(true));
        }
    }
    view_call("setState", arguments)
}

pub fn read_state(name: &str, value: Expression, from_file: bool) -> Expression {
    let mut arguments = vec![Expression::string(name), value];
    if from_file {
        arguments.push(Expression::string(FROM_FILE));
    }
    view_call("readState", arguments)
}

pub fn declare_external_prop(name: &str, default: Expression) -> Expression {
    view_call("declareExternalProp", vec![Expression::string(name), default])
}

pub fn on_external_input(body: Vec<Statement>) -> Expression {
    view_call("onExternalInput", vec![Expression::function(&[], body)])
}

pub fn register_render(element: Expression) -> Expression {
    view_call("registerRender", vec![thunk(element)])
}

// ═══════════════════════════════════════════════════════════════════════════════
// STYLE SLOTS
// ═══════════════════════════════════════════════════════════════════════════════

/// `$["slot"] = function (_, _index) { return value; };`
pub fn dynamic_style(slot: &str, value: Expression) -> Statement {
    let target = Expression::computed(Expression::ident(STYLES), Expression::string(slot));
    Statement::expression(Expression::assign(
        Pattern::Expression {
            expression: Box::new(target),
        },
        Expression::function(&[ITEM, INDEX], vec![Statement::ret(value)]),
    ))
}

/// `$._static["slot"] = false;`
pub fn static_style_marker(slot: &str) -> Statement {
    let target = Expression::computed(
        Expression::member(Expression::ident(STYLES), STATIC_STYLES),
        Expression::string(slot),
    );
    Statement::expression(Expression::assign(
        Pattern::Expression {
            expression: Box::new(target),
        },
        Expression::boolean(false),
    ))
}
