//! Syntax tree for the view compiler.
//!
//! The host parser produces this tree (usually handed over as JSON) and the
//! compiler hands a rewritten tree of the same type back. Every node kind is a
//! variant of a closed enum, so each pass matches exhaustively.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM & STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Statement {
    Expression {
        expression: Expression,
        #[serde(default)]
        span: Span,
    },
    Variable(VariableDeclaration),
    Function(Function),
    Return {
        #[serde(default)]
        argument: Option<Expression>,
    },
    If {
        test: Expression,
        consequent: Box<Statement>,
        #[serde(default)]
        alternate: Option<Box<Statement>>,
    },
    Block {
        body: Vec<Statement>,
    },
    For {
        #[serde(default)]
        init: Option<Box<Statement>>,
        #[serde(default)]
        test: Option<Expression>,
        #[serde(default)]
        update: Option<Expression>,
        body: Box<Statement>,
    },
    While {
        test: Expression,
        body: Box<Statement>,
    },
    Import(ImportDeclaration),
    Export {
        declaration: Box<Statement>,
        #[serde(default)]
        span: Span,
    },
    View(ViewDeclaration),
    Empty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
    /// `prop name = default`: a binding resolved from the view's external input.
    Prop,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
            VariableKind::Prop => "prop",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableDeclarator {
    pub id: Pattern,
    #[serde(default)]
    pub init: Option<Expression>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Function {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub params: Vec<Pattern>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArrowFunction {
    #[serde(default)]
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum ArrowBody {
    Block(Vec<Statement>),
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportDeclaration {
    pub source: String,
    #[serde(default)]
    pub specifiers: Vec<ImportSpecifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ImportSpecifier {
    Default { local: String },
    Named { imported: String, local: String },
    Namespace { local: String },
}

impl ImportSpecifier {
    pub fn local(&self) -> &str {
        match self {
            ImportSpecifier::Default { local }
            | ImportSpecifier::Named { local, .. }
            | ImportSpecifier::Namespace { local } => local,
        }
    }
}

/// `view Name.SubName { ... }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewDeclaration {
    pub name: String,
    #[serde(default)]
    pub sub_name: Option<String>,
    pub body: Vec<Statement>,
    #[serde(default)]
    pub span: Span,
}

impl ViewDeclaration {
    pub fn full_name(&self) -> String {
        match &self.sub_name {
            Some(sub) => format!("{}.{}", self.name, sub),
            None => self.name.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Expression {
    Identifier {
        name: String,
        #[serde(default)]
        span: Span,
    },
    Literal {
        value: Literal,
        #[serde(default)]
        span: Span,
    },
    Array {
        elements: Vec<Expression>,
    },
    Object {
        properties: Vec<Property>,
    },
    Member {
        object: Box<Expression>,
        property: MemberProperty,
    },
    Call {
        callee: Box<Expression>,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
    New {
        callee: Box<Expression>,
        #[serde(default)]
        arguments: Vec<Expression>,
    },
    Assignment {
        operator: AssignmentOperator,
        left: Box<Pattern>,
        right: Box<Expression>,
        #[serde(default)]
        span: Span,
    },
    Update {
        operator: UpdateOperator,
        prefix: bool,
        argument: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        argument: Box<Expression>,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical {
        operator: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    Function(Function),
    Arrow(ArrowFunction),
    Sequence {
        expressions: Vec<Expression>,
    },
    /// Spread element inside call arguments or array literals.
    Spread {
        argument: Box<Expression>,
    },
    Element(Box<Element>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum MemberProperty {
    Static(String),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Property {
    KeyValue {
        key: PropertyKey,
        value: Expression,
        #[serde(default)]
        span: Span,
    },
    Spread {
        argument: Expression,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum PropertyKey {
    Identifier(String),
    String(String),
    Number(f64),
    Computed(Box<Expression>),
}

impl PropertyKey {
    /// Name of a key that is known without evaluation.
    pub fn static_name(&self) -> Option<String> {
        match self {
            PropertyKey::Identifier(name) | PropertyKey::String(name) => Some(name.clone()),
            PropertyKey::Number(n) => Some(format_number(*n)),
            PropertyKey::Computed(_) => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATORS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssignmentOperator {
    #[serde(rename = "=")]
    Assign,
    #[serde(rename = "+=")]
    Addition,
    #[serde(rename = "-=")]
    Subtraction,
    #[serde(rename = "*=")]
    Multiplication,
    #[serde(rename = "/=")]
    Division,
    #[serde(rename = "%=")]
    Remainder,
    #[serde(rename = "||=")]
    LogicalOr,
    #[serde(rename = "&&=")]
    LogicalAnd,
    #[serde(rename = "??=")]
    Nullish,
}

impl AssignmentOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::Addition => "+=",
            AssignmentOperator::Subtraction => "-=",
            AssignmentOperator::Multiplication => "*=",
            AssignmentOperator::Division => "/=",
            AssignmentOperator::Remainder => "%=",
            AssignmentOperator::LogicalOr => "||=",
            AssignmentOperator::LogicalAnd => "&&=",
            AssignmentOperator::Nullish => "??=",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UpdateOperator {
    #[serde(rename = "++")]
    Increment,
    #[serde(rename = "--")]
    Decrement,
}

impl UpdateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UnaryOperator {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "~")]
    BitwiseNot,
    #[serde(rename = "typeof")]
    Typeof,
    #[serde(rename = "void")]
    Void,
    #[serde(rename = "delete")]
    Delete,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::Typeof => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
        }
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            UnaryOperator::Typeof | UnaryOperator::Void | UnaryOperator::Delete
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BinaryOperator {
    #[serde(rename = "==")]
    Equality,
    #[serde(rename = "!=")]
    Inequality,
    #[serde(rename = "===")]
    StrictEquality,
    #[serde(rename = "!==")]
    StrictInequality,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "+")]
    Addition,
    #[serde(rename = "-")]
    Subtraction,
    #[serde(rename = "*")]
    Multiplication,
    #[serde(rename = "/")]
    Division,
    #[serde(rename = "%")]
    Remainder,
    #[serde(rename = "**")]
    Exponential,
    #[serde(rename = "&")]
    BitwiseAnd,
    #[serde(rename = "|")]
    BitwiseOr,
    #[serde(rename = "^")]
    BitwiseXor,
    #[serde(rename = "<<")]
    ShiftLeft,
    #[serde(rename = ">>")]
    ShiftRight,
    #[serde(rename = ">>>")]
    ShiftRightZeroFill,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "instanceof")]
    Instanceof,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Equality => "==",
            BinaryOperator::Inequality => "!=",
            BinaryOperator::StrictEquality => "===",
            BinaryOperator::StrictInequality => "!==",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Addition => "+",
            BinaryOperator::Subtraction => "-",
            BinaryOperator::Multiplication => "*",
            BinaryOperator::Division => "/",
            BinaryOperator::Remainder => "%",
            BinaryOperator::Exponential => "**",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::ShiftRightZeroFill => ">>>",
            BinaryOperator::In => "in",
            BinaryOperator::Instanceof => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogicalOperator {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "??")]
    Coalesce,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
            LogicalOperator::Coalesce => "??",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATTERNS
// ═══════════════════════════════════════════════════════════════════════════════

/// Binding and assignment targets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Pattern {
    Identifier {
        name: String,
        #[serde(default)]
        span: Span,
    },
    Object {
        properties: Vec<PatternProperty>,
    },
    Array {
        elements: Vec<Option<Pattern>>,
    },
    /// `a = 1` inside a pattern.
    Assign {
        left: Box<Pattern>,
        right: Box<Expression>,
    },
    Rest {
        argument: Box<Pattern>,
    },
    /// A member expression used as an assignment target.
    Expression {
        expression: Box<Expression>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternProperty {
    pub key: String,
    pub value: Pattern,
}

impl Pattern {
    pub fn ident(name: impl Into<String>) -> Self {
        Pattern::Identifier {
            name: name.into(),
            span: Span::default(),
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Pattern::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_destructuring(&self) -> bool {
        matches!(self, Pattern::Object { .. } | Pattern::Array { .. })
    }

    /// Every name this pattern binds, in source order.
    pub fn bound_names(&self, out: &mut Vec<String>) {
        match self {
            Pattern::Identifier { name, .. } => out.push(name.clone()),
            Pattern::Object { properties } => {
                for property in properties {
                    property.value.bound_names(out);
                }
            }
            Pattern::Array { elements } => {
                for element in elements.iter().flatten() {
                    element.bound_names(out);
                }
            }
            Pattern::Assign { left, .. } => left.bound_names(out),
            Pattern::Rest { argument } => argument.bound_names(out),
            Pattern::Expression { .. } => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Element {
    pub name: ElementName,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub children: Vec<ElementChild>,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum ElementName {
    /// `<div>` or `<Card>`
    Tag(String),
    /// `<Modal.Footer>`
    Member(Vec<String>),
}

impl ElementName {
    /// Display name used for keys and metadata, e.g. `Modal.Footer`.
    pub fn display(&self) -> String {
        match self {
            ElementName::Tag(tag) => tag.clone(),
            ElementName::Member(parts) => parts.join("."),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Attribute {
    Named {
        name: String,
        #[serde(default)]
        value: Option<Expression>,
        #[serde(default)]
        span: Span,
    },
    Spread {
        argument: Expression,
    },
}

impl Attribute {
    pub fn named(name: impl Into<String>, value: Expression) -> Self {
        Attribute::Named {
            name: name.into(),
            value: Some(value),
            span: Span::default(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Named { name, .. } => Some(name),
            Attribute::Spread { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ElementChild {
    Text { value: String },
    Expression { expression: Expression },
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDERS
// ═══════════════════════════════════════════════════════════════════════════════

impl Expression {
    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier {
            name: name.into(),
            span: Span::default(),
        }
    }

    pub fn literal(value: Literal) -> Self {
        Expression::Literal {
            value,
            span: Span::default(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Self {
        Self::literal(Literal::Number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(Literal::Boolean(value))
    }

    pub fn null() -> Self {
        Self::literal(Literal::Null)
    }

    pub fn member(object: Expression, property: impl Into<String>) -> Self {
        Expression::Member {
            object: Box::new(object),
            property: MemberProperty::Static(property.into()),
        }
    }

    pub fn computed(object: Expression, property: Expression) -> Self {
        Expression::Member {
            object: Box::new(object),
            property: MemberProperty::Computed(Box::new(property)),
        }
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            arguments,
        }
    }

    pub fn array(elements: Vec<Expression>) -> Self {
        Expression::Array { elements }
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Expression::Object { properties }
    }

    pub fn assign(left: Pattern, right: Expression) -> Self {
        Expression::Assignment {
            operator: AssignmentOperator::Assign,
            left: Box::new(left),
            right: Box::new(right),
            span: Span::default(),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            operator: LogicalOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(argument: Expression) -> Self {
        Expression::Unary {
            operator: UnaryOperator::Not,
            argument: Box::new(argument),
        }
    }

    pub fn spread(argument: Expression) -> Self {
        Expression::Spread {
            argument: Box::new(argument),
        }
    }

    /// Anonymous `function (params) { body }`.
    pub fn function(params: &[&str], body: Vec<Statement>) -> Self {
        Expression::Function(Function {
            id: None,
            params: params.iter().map(|p| Pattern::ident(*p)).collect(),
            body,
        })
    }

    pub fn element(element: Element) -> Self {
        Expression::Element(Box::new(element))
    }

    /// Moves the expression out, leaving `null` in its place.
    pub fn take(&mut self) -> Expression {
        std::mem::replace(self, Expression::null())
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal { .. })
    }

    pub fn is_false(&self) -> bool {
        matches!(
            self,
            Expression::Literal {
                value: Literal::Boolean(false),
                ..
            }
        )
    }

    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier { span, .. }
            | Expression::Literal { span, .. }
            | Expression::Assignment { span, .. } => *span,
            Expression::Element(element) => element.span,
            _ => Span::default(),
        }
    }

    /// Root identifier of a member chain: `a` for `a.b[c].d`.
    pub fn root_name(&self) -> Option<&str> {
        match self {
            Expression::Identifier { name, .. } => Some(name),
            Expression::Member { object, .. } => object.root_name(),
            _ => None,
        }
    }
}

impl Statement {
    pub fn expression(expression: Expression) -> Self {
        Statement::Expression {
            expression,
            span: Span::default(),
        }
    }

    pub fn ret(argument: Expression) -> Self {
        Statement::Return {
            argument: Some(argument),
        }
    }
}

impl Property {
    pub fn init(key: impl Into<String>, value: Expression) -> Self {
        Property::KeyValue {
            key: PropertyKey::Identifier(key.into()),
            value,
            span: Span::default(),
        }
    }

    /// Property keyed by a quoted string, for names that are not identifiers.
    pub fn quoted(key: impl Into<String>, value: Expression) -> Self {
        Property::KeyValue {
            key: PropertyKey::String(key.into()),
            value,
            span: Span::default(),
        }
    }
}

/// Whether `name` can be written as a bare property key or identifier.
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// Number formatting shared by keys and the printer.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", n)
    }
}
