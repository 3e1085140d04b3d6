//! Tree builders shared by the compiler tests.

use crate::ast::{
    Attribute, Element, ElementChild, ElementName, Expression, ImportDeclaration, ImportSpecifier,
    Pattern, Program, Property, SourceLocation, Span, Statement, UpdateOperator,
    VariableDeclaration, VariableDeclarator, VariableKind, ViewDeclaration,
};
use crate::compile::{CompileOptions, CompileOutput, Session};
use crate::validate::CompilerError;

pub const FILE: &str = "app/main.js";

pub fn span(line: u32, column: u32, end_line: u32, end_column: u32) -> Span {
    Span::new(
        SourceLocation::new(line, column),
        SourceLocation::new(end_line, end_column),
    )
}

pub fn view(name: &str, body: Vec<Statement>) -> Statement {
    Statement::View(ViewDeclaration {
        name: name.to_string(),
        sub_name: None,
        body,
        span: Span::default(),
    })
}

pub fn declare(kind: VariableKind, id: Pattern, init: Option<Expression>) -> Statement {
    Statement::Variable(VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator {
            id,
            init,
            span: Span::default(),
        }],
        span: Span::default(),
    })
}

pub fn let_(name: &str, init: Expression) -> Statement {
    declare(VariableKind::Let, Pattern::ident(name), Some(init))
}

pub fn const_(name: &str, init: Expression) -> Statement {
    declare(VariableKind::Const, Pattern::ident(name), Some(init))
}

pub fn import_default(local: &str, source: &str) -> Statement {
    Statement::Import(ImportDeclaration {
        source: source.to_string(),
        specifiers: vec![ImportSpecifier::Default {
            local: local.to_string(),
        }],
    })
}

pub fn expr(expression: Expression) -> Statement {
    Statement::expression(expression)
}

pub fn assign(name: &str, value: Expression) -> Statement {
    expr(Expression::assign(Pattern::ident(name), value))
}

pub fn style(name: &str, value: Expression, line: u32) -> Statement {
    Statement::Expression {
        expression: Expression::assign(Pattern::ident(name), value),
        span: span(line, 2, line, 30),
    }
}

pub fn object(entries: Vec<(&str, Expression)>) -> Expression {
    Expression::object(
        entries
            .into_iter()
            .map(|(key, value)| Property::init(key, value))
            .collect(),
    )
}

pub fn increment(name: &str, prefix: bool) -> Expression {
    Expression::Update {
        operator: UpdateOperator::Increment,
        prefix,
        argument: Box::new(Expression::ident(name)),
    }
}

pub fn handler(body: Vec<Statement>) -> Expression {
    Expression::function(&[], body)
}

pub fn el(tag: &str, attributes: Vec<Attribute>, children: Vec<ElementChild>) -> Expression {
    Expression::element(Element {
        name: ElementName::Tag(tag.to_string()),
        attributes,
        children,
        span: Span::default(),
    })
}

pub fn el_at(tag: &str, children: Vec<ElementChild>, at: Span) -> Expression {
    Expression::element(Element {
        name: ElementName::Tag(tag.to_string()),
        attributes: vec![],
        children,
        span: at,
    })
}

pub fn attr(name: &str, value: Expression) -> Attribute {
    Attribute::named(name, value)
}

pub fn text(value: &str) -> ElementChild {
    ElementChild::Text {
        value: value.to_string(),
    }
}

pub fn child(expression: Expression) -> ElementChild {
    ElementChild::Expression { expression }
}

pub fn compile_with(
    body: Vec<Statement>,
    options: CompileOptions,
) -> Result<CompileOutput, CompilerError> {
    Session::new(options).compile(FILE, &Program { body })
}

pub fn compile(body: Vec<Statement>) -> CompileOutput {
    compile_with(body, CompileOptions::default()).expect("program compiles")
}

pub fn production() -> CompileOptions {
    CompileOptions {
        production: true,
        ..CompileOptions::default()
    }
}

/// Code with all whitespace removed, for comparing output independent of
/// the printer's layout.
pub fn squash(code: &str) -> String {
    code.split_whitespace().collect()
}

/// Whether `code` contains `snippet`, ignoring whitespace.
pub fn contains_code(code: &str, snippet: &str) -> bool {
    squash(code).contains(&squash(snippet))
}

/// Hex strings emitted as bare statements (`"1a2b3c4d";`), in output order.
pub fn fingerprint_statements(code: &str) -> Vec<String> {
    let statement = regex::Regex::new(r#"^\(?"([0-9a-f]+)"\)?;$"#).unwrap();
    code.lines()
        .filter_map(|line| {
            statement
                .captures(&squash(line))
                .map(|captures| captures[1].to_string())
        })
        .collect()
}
