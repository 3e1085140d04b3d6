//! Element lowering.
//!
//! Markup elements become `Runtime.createElement(descriptor, attrs, ...children)`
//! calls. The descriptor identifies the occurrence: an optional reference to a
//! child view, the display name, a per-view key, and the repeat item/index when
//! the element sits inside a repeat. Control attributes (`if`, `route`,
//! `repeat`) wrap the call; view-level elements are registered as renders.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::ast::{
    is_identifier_name, Attribute, Element, ElementChild, ElementName, Expression, Pattern,
    Property, Statement,
};
use crate::context::{KeyCounter, ViewContext};
use crate::runtime;

lazy_static! {
    /// HTML attribute names and the property names the runtime expects.
    static ref ATTRIBUTE_RENAMES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("class", "className");
        m.insert("for", "htmlFor");
        m.insert("srcset", "srcSet");
        m.insert("novalidate", "noValidate");
        m.insert("autoplay", "autoPlay");
        m.insert("frameborder", "frameBorder");
        m.insert("allowfullscreen", "allowFullScreen");
        m.insert("tabindex", "tabIndex");
        m
    };
}

pub const SYNC_VALUE: &str = "__value";
pub const SYNC_ON_CHANGE: &str = "__onChange";

/// Where an element occurs.
pub struct ElementSite<'a> {
    pub view: Option<&'a mut ViewContext>,
    pub loose_keys: &'a mut KeyCounter,
    /// Inside a repeat: the descriptor gains the item and index.
    pub in_repeat: bool,
    /// Directly in a view body, outside any other element.
    pub is_root: bool,
    /// The tag names a child view bound in scope.
    pub is_variable: bool,
}

/// Everything decided on entering an element, applied once its children
/// have been compiled.
#[derive(Debug)]
pub struct ElementPlan {
    pub descriptor: Vec<Expression>,
    pub condition: Option<Expression>,
    pub route: Option<Expression>,
    pub repeat: Option<Expression>,
    pub is_root: bool,
}

pub fn starts_uppercase(name: &str) -> bool {
    name.chars().next().map_or(false, char::is_uppercase)
}

fn html_attribute_name(name: &str) -> String {
    ATTRIBUTE_RENAMES
        .get(name)
        .map_or_else(|| name.to_string(), |renamed| renamed.to_string())
}

/// `<Modal.Footer>` refers to `Modal.Footer` in scope.
fn name_reference(name: &ElementName) -> Expression {
    match name {
        ElementName::Tag(tag) => Expression::ident(tag),
        ElementName::Member(parts) => {
            let mut parts = parts.iter();
            let root = parts.next().map_or_else(String::new, String::clone);
            parts.fold(Expression::ident(root), |object, part| {
                Expression::member(object, part.as_str())
            })
        }
    }
}

fn assignment_target(expression: &Expression) -> Option<Pattern> {
    match expression {
        Expression::Identifier { name, span } => Some(Pattern::Identifier {
            name: name.clone(),
            span: *span,
        }),
        Expression::Member { .. } => Some(Pattern::Expression {
            expression: Box::new(expression.clone()),
        }),
        _ => None,
    }
}

/// `sync={value}` → `__value={value} __onChange={function (e) { value = e.target.value; }}`
fn sync_attributes(target: Expression) -> Vec<Attribute> {
    let mut attributes = Vec::with_capacity(2);
    if let Some(pattern) = assignment_target(&target) {
        let event_value = Expression::member(
            Expression::member(Expression::ident("e"), "target"),
            "value",
        );
        attributes.push(Attribute::named(
            SYNC_ON_CHANGE,
            Expression::function(
                &["e"],
                vec![Statement::expression(Expression::assign(pattern, event_value))],
            ),
        ));
    }
    attributes.insert(0, Attribute::named(SYNC_VALUE, target));
    attributes
}

/// Allocates the element's key, records its metadata and pulls the control
/// attributes out of its attribute list.
pub fn prepare(element: &mut Element, site: ElementSite) -> ElementPlan {
    let name = element.name.display();

    let mut condition = None;
    let mut route = None;
    let mut repeat = None;
    let mut has_class = false;
    let mut attributes = Vec::with_capacity(element.attributes.len());

    for attribute in std::mem::take(&mut element.attributes) {
        match attribute {
            Attribute::Named { name: attr, value, span } => {
                let value_or_true = |value: Option<Expression>| {
                    value.unwrap_or_else(|| Expression::boolean(true))
                };
                match attr.as_str() {
                    "if" => condition = Some(value_or_true(value)),
                    "route" => route = Some(value_or_true(value)),
                    "repeat" => repeat = Some(value_or_true(value)),
                    "sync" => {
                        if let Some(target) = value {
                            attributes.extend(sync_attributes(target));
                        }
                    }
                    _ => {
                        has_class |= attr == "class";
                        attributes.push(Attribute::Named {
                            name: html_attribute_name(&attr),
                            value,
                            span,
                        });
                    }
                }
            }
            spread @ Attribute::Spread { .. } => attributes.push(spread),
        }
    }
    element.attributes = attributes;

    let key = match site.view {
        Some(view) => {
            let key = view.keys.next(&name);
            view.meta
                .els
                .insert(format!("{}{}", name, key), element.span.end);
            if site.is_root {
                view.root_elements.push(name.clone());
            }
            if has_class && starts_uppercase(&name) {
                view.has_child_with_class = true;
            }
            key
        }
        None => site.loose_keys.next(&name),
    };
    log::trace!("element {} key {}", name, key);

    let mut descriptor = Vec::with_capacity(5);
    if site.is_variable {
        descriptor.push(name_reference(&element.name));
    }
    descriptor.push(Expression::string(&name));
    descriptor.push(Expression::number(f64::from(key)));
    if site.in_repeat {
        descriptor.push(Expression::ident(runtime::ITEM));
        descriptor.push(Expression::ident(runtime::INDEX));
    }

    ElementPlan {
        descriptor,
        condition,
        route,
        repeat,
        is_root: site.is_root,
    }
}

fn attribute_property(name: String, value: Expression) -> Property {
    if is_identifier_name(&name) {
        Property::init(name, value)
    } else {
        Property::quoted(name, value)
    }
}

/// Builds the constructor call and applies the control wrappers, innermost
/// first: repeat, route, if, render registration.
pub fn lower(plan: ElementPlan, element: Element) -> Expression {
    let Element {
        attributes,
        children,
        ..
    } = element;

    let mut properties: Vec<Property> = attributes
        .into_iter()
        .map(|attribute| match attribute {
            Attribute::Named { name, value, .. } => {
                attribute_property(name, value.unwrap_or_else(|| Expression::boolean(true)))
            }
            Attribute::Spread { argument } => Property::Spread { argument },
        })
        .collect();

    if let Some(route) = &plan.route {
        properties.push(Property::Spread {
            argument: runtime::route_params(route.clone()),
        });
    }

    let attributes = if properties.is_empty() {
        Expression::null()
    } else {
        Expression::object(properties)
    };

    let children = children
        .into_iter()
        .filter_map(|child| match child {
            ElementChild::Text { value } => {
                let text = value.trim();
                (!text.is_empty()).then(|| Expression::string(text))
            }
            ElementChild::Expression { expression } => Some(expression),
        })
        .collect();

    let mut node = runtime::create_element(plan.descriptor, attributes, children);

    if let Some(count) = plan.repeat {
        node = runtime::repeat(count, node);
    }
    if let Some(pattern) = plan.route {
        node = Expression::and(runtime::route_matches(pattern), node);
    }
    if let Some(condition) = plan.condition {
        node = Expression::and(Expression::not(Expression::not(condition)), node);
    }
    if plan.is_root {
        node = runtime::register_render(node);
    }
    node
}
