//! Stylesheet finalization.
//!
//! Once a view has been compiled its accumulated style table is turned into
//! CSS rules, one per style group, each with a generated class name and a
//! fingerprint the runtime compares between compiles to decide whether styles
//! can be patched in place or the view has to be reset.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{format_number, is_identifier_name, Expression, Literal, Property, Statement};
use crate::compile::CompileOptions;
use crate::context::{StyleProp, ViewContext};
use crate::runtime;

lazy_static! {
    static ref CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();

    /// Numeric properties that take no `px` unit.
    static ref UNITLESS_PROPERTIES: HashSet<&'static str> = {
        let mut s = HashSet::new();
        s.insert("animationIterationCount");
        s.insert("boxFlex");
        s.insert("boxFlexGroup");
        s.insert("columnCount");
        s.insert("fillOpacity");
        s.insert("flex");
        s.insert("flexGrow");
        s.insert("flexShrink");
        s.insert("fontWeight");
        s.insert("lineClamp");
        s.insert("lineHeight");
        s.insert("opacity");
        s.insert("order");
        s.insert("orphans");
        s.insert("strokeOpacity");
        s.insert("tabSize");
        s.insert("widows");
        s.insert("zIndex");
        s.insert("zoom");
        s
    };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StyleSheetEntry {
    pub view: String,
    /// Style name as written, e.g. `$box`.
    pub name: String,
    pub class_name: String,
    pub selector: String,
    /// CSS property → value, after kebab-casing and unit handling.
    pub declarations: IndexMap<String, String>,
    pub fingerprint: String,
}

#[derive(Debug)]
pub struct FinalizedStyles {
    /// `Runtime.installStyles(...)`, placed before the view registration.
    pub install: Statement,
    pub entries: Vec<StyleSheetEntry>,
    pub css: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// HASHING
// ═══════════════════════════════════════════════════════════════════════════════

/// First 8 hex characters of the SHA-256 digest.
pub fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

/// Hash over every static property the view has declared so far.
pub fn static_keys_fingerprint(static_keys: &IndexMap<String, String>) -> String {
    let mut content = String::new();
    for (key, value) in static_keys {
        content.push_str(key);
        content.push(':');
        content.push_str(value);
        content.push(';');
    }
    short_hash(&content)
}

/// Cross-hash of every property name declared both statically and
/// dynamically. Empty when nothing collides.
pub fn clash_fingerprint(
    static_keys: &IndexMap<String, String>,
    dynamic_keys: &IndexMap<String, String>,
) -> String {
    let mut fingerprint = String::new();
    for (key, dynamic) in dynamic_keys {
        if let Some(stat) = static_keys.get(key) {
            fingerprint.push_str(&short_hash(&format!("{}{}", stat, dynamic)));
            fingerprint.push_str(&short_hash(key));
        }
    }
    fingerprint
}

// ═══════════════════════════════════════════════════════════════════════════════
// SELECTORS & DECLARATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Derives the CSS selector for style group `style_name` of `view_name`.
///
/// The unnamed group `$` and, when the view's root carries the view's own name,
/// the group named after the view select the view root. An uppercase group
/// naming a child view in scope selects that child view's root. Anything else
/// selects that tag inside the view.
pub fn selector_for(
    view_name: &str,
    style_name: &str,
    tag_is_root: bool,
    child_views: &HashSet<String>,
    prefix: &str,
) -> String {
    let clean = view_name.replace('.', "-");
    let tag = style_name.strip_prefix('$').unwrap_or(style_name);
    log::debug!("selector for view {} tag {:?}", view_name, tag);

    if tag.is_empty() || (tag_is_root && tag == view_name.to_lowercase()) {
        format!("{}.View{}", prefix, clean)
    } else if tag.chars().next().map_or(false, char::is_uppercase) && child_views.contains(tag) {
        format!("{}.View{} .View{}", prefix, clean, tag)
    } else {
        format!(
            "{p}{tag}.{clean}, {p}.{clean}.{tag}, {p}.View{clean}.{tag}, {p}.{clean} > .{tag}",
            p = prefix,
            tag = tag,
            clean = clean
        )
    }
}

/// `backgroundColor` → `background-color`, `WebkitTransition` → `-webkit-transition`.
pub fn css_property_name(name: &str) -> String {
    let kebab = CAMEL_BOUNDARY.replace_all(name, "$1-$2").to_lowercase();
    if name.chars().next().map_or(false, char::is_uppercase) {
        format!("-{}", kebab)
    } else {
        kebab
    }
}

pub fn css_value(property: &str, value: &Expression) -> Option<String> {
    match value {
        Expression::Literal { value, .. } => match value {
            Literal::String(s) => Some(s.clone()),
            Literal::Number(n) => {
                if *n == 0.0 || UNITLESS_PROPERTIES.contains(property) {
                    Some(format_number(*n))
                } else {
                    Some(format!("{}px", format_number(*n)))
                }
            }
            Literal::Boolean(_) | Literal::Null => None,
        },
        Expression::Array { elements } => {
            let parts: Vec<String> = elements
                .iter()
                .filter_map(|element| css_value(property, element))
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        }
        _ => None,
    }
}

/// Static properties of one group as CSS declarations; a later property of
/// the same name replaces an earlier one.
pub fn declarations(props: &[&StyleProp]) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for prop in props {
        if let Some(value) = css_value(&prop.name, &prop.value) {
            out.insert(css_property_name(&prop.name), value);
        }
    }
    out
}

pub fn render_rule(selector: &str, declarations: &IndexMap<String, String>) -> String {
    let mut rule = format!("{} {{\n", selector);
    for (property, value) in declarations {
        rule.push_str(&format!("  {}: {};\n", property, value));
    }
    rule.push_str("}\n");
    rule
}

pub fn class_name(view_name: &str, style_name: &str, declarations: &IndexMap<String, String>) -> String {
    let mut content = format!("{}|{}|", view_name, style_name);
    for (property, value) in declarations {
        content.push_str(&format!("{}:{};", property, value));
    }
    format!("_{}", short_hash(&content))
}

/// Hash over the group's own static properties and, outside production, the
/// view's dynamic values for the same property names.
fn group_fingerprint(view: &ViewContext, statics: &[&StyleProp], production: bool) -> String {
    let mut content = String::new();
    for prop in statics {
        content.push_str(&format!("{}:{};", prop.name, prop.printed));
    }
    if !production {
        for prop in statics {
            if let Some(dynamic) = view.dynamic_style_keys.get(&prop.name) {
                content.push_str(&format!("~{}:{};", prop.name, dynamic));
            }
        }
    }
    short_hash(&content)
}

fn keyed(name: &str, value: Expression) -> Property {
    if is_identifier_name(name) {
        Property::init(name, value)
    } else {
        Property::quoted(name, value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FINALIZE
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles the view's style table. `None` when the view declared no styles.
pub fn finalize(view: &ViewContext, options: &CompileOptions) -> Option<FinalizedStyles> {
    if view.styles.is_empty() {
        return None;
    }

    let prefix = options.selector_prefix.as_deref().unwrap_or("");
    let tag_is_root = view.styles_tag_as_root();
    log::debug!(
        "finalizing {} style groups for {}",
        view.styles.len(),
        view.full_name
    );

    let mut entries = Vec::with_capacity(view.styles.len());
    let mut css = String::new();
    let mut class_names = Vec::with_capacity(view.styles.len());
    let mut raw = Vec::with_capacity(view.styles.len());

    for (name, props) in &view.styles {
        let statics: Vec<&StyleProp> = props.iter().filter(|prop| prop.is_static).collect();
        let declarations = declarations(&statics);
        let selector = selector_for(&view.full_name, name, tag_is_root, &view.child_views, prefix);
        let class_name = class_name(&view.full_name, name, &declarations);

        if !declarations.is_empty() {
            css.push_str(&render_rule(&selector, &declarations));
        }

        class_names.push(Property::quoted(name.as_str(), Expression::string(&class_name)));
        raw.push(Property::quoted(
            name.as_str(),
            Expression::object(
                statics
                    .iter()
                    .map(|prop| keyed(&prop.name, prop.value.clone()))
                    .collect(),
            ),
        ));

        entries.push(StyleSheetEntry {
            view: view.full_name.clone(),
            name: name.clone(),
            class_name,
            selector,
            declarations,
            fingerprint: group_fingerprint(view, &statics, options.production),
        });
    }

    let install = Statement::expression(runtime::install_styles(
        &view.full_name,
        Expression::object(class_names),
        Expression::object(raw),
    ));

    Some(FinalizedStyles {
        install,
        entries,
        css,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// THEMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Style keys to apply, in application order (later wins), for a view with
/// the base keys `base`, an optional `theme` prop naming one theme, and
/// boolean theme flags in declared order. Flattened theme groups are named
/// `<theme>-<key>`.
pub fn resolve_theme_keys(base: &[&str], theme: Option<&str>, flags: &[(&str, bool)]) -> Vec<String> {
    let mut themes: Vec<&str> = Vec::new();
    if let Some(theme) = theme {
        themes.push(theme);
    }
    for (flag, enabled) in flags {
        if *enabled && !themes.contains(flag) {
            themes.push(*flag);
        }
    }

    let mut keys: Vec<String> = base.iter().map(|key| key.to_string()).collect();
    for theme in themes {
        keys.extend(base.iter().map(|key| format!("{}-{}", theme, key)));
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_property_names() {
        assert_eq!(css_property_name("color"), "color");
        assert_eq!(css_property_name("backgroundColor"), "background-color");
        assert_eq!(css_property_name("WebkitTransition"), "-webkit-transition");
        assert_eq!(css_property_name("font-size"), "font-size");
    }

    #[test]
    fn test_css_values_get_units() {
        assert_eq!(css_value("width", &Expression::number(10.0)), Some("10px".into()));
        assert_eq!(css_value("opacity", &Expression::number(0.5)), Some("0.5".into()));
        assert_eq!(css_value("margin", &Expression::number(0.0)), Some("0".into()));
        assert_eq!(
            css_value(
                "margin",
                &Expression::array(vec![Expression::number(1.0), Expression::string("auto")])
            ),
            Some("1px auto".into())
        );
        assert_eq!(css_value("color", &Expression::boolean(true)), None);
    }

    #[test]
    fn test_selectors() {
        let children: HashSet<String> = ["Title".to_string()].into_iter().collect();
        assert_eq!(selector_for("Card", "$", false, &children, ""), ".ViewCard");
        assert_eq!(selector_for("Card", "$card", true, &children, ""), ".ViewCard");
        assert_eq!(
            selector_for("Card", "$Title", false, &children, ""),
            ".ViewCard .ViewTitle"
        );
        assert_eq!(
            selector_for("Card", "$box", false, &children, ""),
            "box.Card, .Card.box, .ViewCard.box, .Card > .box"
        );
        assert_eq!(
            selector_for("Modal.Footer", "$", false, &children, "#app "),
            "#app .ViewModal-Footer"
        );
        assert_eq!(
            selector_for("Modal.Footer", "$row", false, &children, "#app "),
            "#app row.Modal-Footer, #app .Modal-Footer.row, #app .ViewModal-Footer.row, #app .Modal-Footer > .row"
        );
    }

    #[test]
    fn test_uppercase_tag_outside_scope_selects_the_tag() {
        let children = HashSet::new();
        assert_eq!(
            selector_for("Card", "$Title", false, &children, ""),
            "Title.Card, .Card.Title, .ViewCard.Title, .Card > .Title"
        );
    }

    #[test]
    fn test_short_hash_is_stable() {
        assert_eq!(short_hash("abc"), "ba7816bf");
        assert_eq!(short_hash("abc").len(), 8);
    }

    #[test]
    fn test_clash_fingerprint_only_for_shared_keys() {
        let mut stat = IndexMap::new();
        stat.insert("color".to_string(), "\"red\"".to_string());
        let mut dynamic = IndexMap::new();
        dynamic.insert("width".to_string(), "props.w".to_string());
        assert_eq!(clash_fingerprint(&stat, &dynamic), "");

        dynamic.insert("color".to_string(), "props.c".to_string());
        assert_eq!(clash_fingerprint(&stat, &dynamic).len(), 16);
    }

    #[test]
    fn test_theme_flags_apply_after_theme_prop() {
        let keys = resolve_theme_keys(&["h1"], Some("dark"), &[("big", true), ("small", false), ("loud", true)]);
        assert_eq!(keys, vec!["h1", "dark-h1", "big-h1", "loud-h1"]);

        let keys = resolve_theme_keys(&["h1"], Some("big"), &[("big", true)]);
        assert_eq!(keys, vec!["h1", "big-h1"]);

        let keys = resolve_theme_keys(&["h1"], None, &[]);
        assert_eq!(keys, vec!["h1"]);
    }
}
