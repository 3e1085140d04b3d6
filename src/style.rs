//! Style extraction.
//!
//! `$name = value` inside a view declares a style group. Literal properties are
//! hoisted into the view's stylesheet; everything else stays in the view body
//! as a function of the render item and index installed at `$["name"]`.

use std::collections::HashSet;

use crate::ast::{AssignmentOperator, Expression, Pattern, Property, Span, Statement};
use crate::codegen::print_expression;
use crate::compile::CompileOptions;
use crate::context::{StyleProp, ViewContext};
use crate::runtime;
use crate::stylesheet::{clash_fingerprint, static_keys_fingerprint};
use crate::validate::CompilerError;

pub const STYLE_SIGIL: char = '$';

/// Name of the style group a statement assigns, if it is a style assignment.
pub fn style_name(statement: &Statement) -> Option<&str> {
    match statement {
        Statement::Expression {
            expression:
                Expression::Assignment {
                    operator: AssignmentOperator::Assign,
                    left,
                    ..
                },
            ..
        } => left
            .as_identifier()
            .filter(|name| name.starts_with(STYLE_SIGIL)),
        _ => None,
    }
}

/// `$box` → `box`; the root group `$` keeps its name.
pub fn slot_name(style_name: &str) -> &str {
    match style_name.strip_prefix(STYLE_SIGIL) {
        Some("") | None => style_name,
        Some(slot) => slot,
    }
}

/// Static iff a literal, or an array of literals.
pub fn is_static_value(value: &Expression) -> bool {
    match value {
        Expression::Literal { .. } => true,
        Expression::Array { elements } => elements.iter().all(Expression::is_literal),
        _ => false,
    }
}

struct StyleSite<'a> {
    file: &'a str,
    options: &'a CompileOptions,
    span: Span,
}

/// Static and dynamic halves of one style object.
#[derive(Default)]
struct Classified {
    statics: Vec<StyleProp>,
    dynamic_props: Vec<StyleProp>,
    dynamics: Vec<Property>,
}

impl Classified {
    fn absorb(&mut self, other: Classified) {
        self.statics.extend(other.statics);
        self.dynamic_props.extend(other.dynamic_props);
    }
}

fn printed(site: &StyleSite, value: &Expression) -> Result<String, CompilerError> {
    print_expression(value).map_err(|err| CompilerError::codegen(site.file, &err, site.span))
}

fn classify(
    view: &ViewContext,
    site: &StyleSite,
    name: &str,
    properties: Vec<Property>,
) -> Result<Classified, CompilerError> {
    let mut seen = HashSet::new();
    let mut classified = Classified::default();

    for property in properties {
        match property {
            Property::KeyValue { key, value, span } => {
                let key_name = key.static_name();
                if let Some(prop) = &key_name {
                    if !seen.insert(prop.clone()) {
                        return Err(CompilerError::duplicate_style_prop(
                            site.file,
                            &view.full_name,
                            name,
                            prop,
                            if span == Span::default() { site.span } else { span },
                        ));
                    }
                }
                match key_name {
                    Some(prop) if is_static_value(&value) => classified.statics.push(StyleProp {
                        printed: printed(site, &value)?,
                        name: prop,
                        value,
                        is_static: true,
                    }),
                    Some(prop) => {
                        classified.dynamic_props.push(StyleProp {
                            printed: printed(site, &value)?,
                            name: prop,
                            value: value.clone(),
                            is_static: false,
                        });
                        classified.dynamics.push(Property::KeyValue { key, value, span });
                    }
                    None => classified.dynamics.push(Property::KeyValue { key, value, span }),
                }
            }
            spread @ Property::Spread { .. } => classified.dynamics.push(spread),
        }
    }
    Ok(classified)
}

/// Adds the classified properties to the view's style table and returns the
/// fingerprint statements the group needs.
fn record(view: &mut ViewContext, site: &StyleSite, name: &str, classified: Classified) -> Vec<Statement> {
    let has_statics = !classified.statics.is_empty();

    for prop in &classified.statics {
        view.static_style_keys
            .insert(prop.name.clone(), prop.printed.clone());
    }
    for prop in &classified.dynamic_props {
        view.dynamic_style_keys
            .insert(prop.name.clone(), prop.printed.clone());
    }

    let group = view.styles.entry(name.to_string()).or_default();
    group.extend(classified.statics);
    group.extend(classified.dynamic_props);

    let mut statements = Vec::new();
    if !has_statics {
        return statements;
    }

    let targets_child_view = name
        .chars()
        .nth(1)
        .map_or(false, char::is_uppercase);
    if targets_child_view || (view.has_child_with_class && name != "$") {
        statements.push(Statement::expression(Expression::string(
            static_keys_fingerprint(&view.static_style_keys),
        )));
    }

    if !site.options.production {
        let clash = clash_fingerprint(&view.static_style_keys, &view.dynamic_style_keys);
        if !clash.is_empty() {
            statements.push(Statement::expression(Expression::string(clash)));
        }
    }
    statements
}

fn claim_name(view: &mut ViewContext, site: &StyleSite, name: &str) -> Result<(), CompilerError> {
    if !view.style_names.insert(name.to_string()) {
        return Err(CompilerError::duplicate_style(
            site.file,
            &view.full_name,
            name,
            site.span,
        ));
    }
    view.meta
        .styles
        .insert(slot_name(name).to_string(), site.span.start);
    Ok(())
}

fn extract_object(
    view: &mut ViewContext,
    site: &StyleSite,
    name: &str,
    properties: Vec<Property>,
) -> Result<Vec<Statement>, CompilerError> {
    let mut classified = classify(view, site, name, properties)?;
    let dynamics = std::mem::take(&mut classified.dynamics);
    let mut statements = record(view, site, name, classified);
    if !dynamics.is_empty() {
        statements.push(runtime::dynamic_style(
            slot_name(name),
            Expression::object(dynamics),
        ));
    }
    Ok(statements)
}

fn extract_array(
    view: &mut ViewContext,
    site: &StyleSite,
    name: &str,
    elements: Vec<Expression>,
) -> Result<Vec<Statement>, CompilerError> {
    if !elements
        .iter()
        .all(|element| matches!(element, Expression::Object { .. }))
    {
        view.styles.entry(name.to_string()).or_default();
        return Ok(vec![runtime::dynamic_style(
            slot_name(name),
            Expression::array(elements),
        )]);
    }

    let mut merged = Classified::default();
    let mut remaining = Vec::new();
    for element in elements {
        if let Expression::Object { properties } = element {
            let mut classified = classify(view, site, name, properties)?;
            if !classified.dynamics.is_empty() {
                remaining.push(Expression::object(std::mem::take(&mut classified.dynamics)));
            }
            merged.absorb(classified);
        }
    }

    let mut statements = record(view, site, name, merged);
    if !remaining.is_empty() {
        statements.push(runtime::dynamic_style(
            slot_name(name),
            Expression::array(remaining),
        ));
    }
    Ok(statements)
}

/// `$theme = { dark: { h1: {...} } }` declares one group per theme and tag,
/// named `$dark-h1`.
fn extract_themes(
    view: &mut ViewContext,
    site: &StyleSite,
    properties: Vec<Property>,
) -> Result<Vec<Statement>, CompilerError> {
    let mut statements = Vec::new();
    for property in properties {
        let (theme, tags) = match property {
            Property::KeyValue {
                key,
                value: Expression::Object { properties },
                ..
            } => match key.static_name() {
                Some(theme) => (theme, properties),
                None => continue,
            },
            Property::KeyValue { key, .. } => {
                log::warn!(
                    "themes must be objects, {:?} in view {} isn't an object",
                    key.static_name().unwrap_or_default(),
                    view.full_name
                );
                continue;
            }
            Property::Spread { .. } => continue,
        };

        for tag in tags {
            match tag {
                Property::KeyValue {
                    key,
                    value: Expression::Object { properties },
                    ..
                } => {
                    let Some(tag) = key.static_name() else {
                        continue;
                    };
                    let tag = tag.trim_start_matches(STYLE_SIGIL);
                    let name = if tag.is_empty() {
                        format!("{}{}", STYLE_SIGIL, theme)
                    } else {
                        format!("{}{}-{}", STYLE_SIGIL, theme, tag)
                    };
                    claim_name(view, site, &name)?;
                    statements.extend(extract_object(view, site, &name, properties)?);
                }
                Property::KeyValue { key, .. } => log::warn!(
                    "theme {} entry {:?} in view {} isn't an object",
                    theme,
                    key.static_name().unwrap_or_default(),
                    view.full_name
                ),
                Property::Spread { .. } => {}
            }
        }
    }
    Ok(statements)
}

/// Compiles one style assignment statement. Statements that are not style
/// assignments come back unchanged.
pub fn extract(
    view: &mut ViewContext,
    statement: Statement,
    file: &str,
    options: &CompileOptions,
) -> Result<Vec<Statement>, CompilerError> {
    let (name, value, span) = match statement {
        Statement::Expression {
            expression:
                Expression::Assignment {
                    operator: AssignmentOperator::Assign,
                    left,
                    right,
                    span,
                },
            span: statement_span,
        } => match *left {
            Pattern::Identifier { name, .. } if name.starts_with(STYLE_SIGIL) => {
                let span = if span == Span::default() { statement_span } else { span };
                (name, *right, span)
            }
            left => {
                return Ok(vec![Statement::Expression {
                    expression: Expression::Assignment {
                        operator: AssignmentOperator::Assign,
                        left: Box::new(left),
                        right,
                        span,
                    },
                    span: statement_span,
                }])
            }
        },
        other => return Ok(vec![other]),
    };

    let site = StyleSite {
        file,
        options,
        span,
    };
    log::debug!("style {} in view {}", name, view.full_name);

    let theme_group = format!("{}{}", STYLE_SIGIL, options.theme_key);
    if options.theme && name == theme_group {
        if let Expression::Object { properties } = value {
            claim_name(view, &site, &name)?;
            return extract_themes(view, &site, properties);
        }
        claim_name(view, &site, &name)?;
        return Ok(vec![runtime::dynamic_style(slot_name(&name), value)]);
    }

    claim_name(view, &site, &name)?;
    match value {
        Expression::Object { properties } => extract_object(view, &site, &name, properties),
        Expression::Array { elements } => extract_array(view, &site, &name, elements),
        value if value.is_false() => {
            view.styles.entry(name.clone()).or_default();
            Ok(vec![runtime::static_style_marker(slot_name(&name))])
        }
        value => {
            view.styles.entry(name.clone()).or_default();
            Ok(vec![runtime::dynamic_style(slot_name(&name), value)])
        }
    }
}
