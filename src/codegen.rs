//! Codegen module for the view compiler
//!
//! Lowers the transformed tree into an oxc AST with `AstBuilder` and prints it
//! with `oxc_codegen`. Function, declaration and destructuring heads carry
//! binding patterns; those are parsed from a generated head in the same arena
//! and then given their lowered bodies and initializers.

use oxc_allocator::{Allocator, Box as ArenaBox, Vec as ArenaVec};
use oxc_ast::ast as js;
use oxc_ast::AstBuilder;
use oxc_codegen::Codegen;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{SourceType, SPAN};
use oxc_syntax::number::NumberBase;
use oxc_syntax::operator as op;

use crate::ast::{
    format_number, is_identifier_name, ArrowBody, ArrowFunction, AssignmentOperator,
    BinaryOperator, Expression, Function, ImportDeclaration, ImportSpecifier, Literal,
    LogicalOperator, MemberProperty, Pattern, Program, Property, PropertyKey, Statement,
    UnaryOperator, UpdateOperator, VariableDeclaration, VariableKind,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodegenError {
    /// A view or element reached the printer without being compiled.
    #[error("{0} must be compiled before it can be printed")]
    Uncompiled(String),
    #[error("{0} can't be printed in this position")]
    Misplaced(&'static str),
    #[error("generated {kind} `{text}` doesn't parse: {message}")]
    InvalidSyntax {
        kind: &'static str,
        text: String,
        message: String,
    },
}

type Lowered<T> = Result<T, CodegenError>;

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_program(program: &Program) -> Result<String, CodegenError> {
    let allocator = Allocator::default();
    let lowering = Lowering::new(&allocator);
    let body = lowering.statements(&program.body)?;
    Ok(lowering.print(body))
}

/// Prints a single expression without the trailing semicolon.
pub fn print_expression(expression: &Expression) -> Result<String, CodegenError> {
    let allocator = Allocator::default();
    let lowering = Lowering::new(&allocator);
    let statement = lowering
        .ast
        .statement_expression(SPAN, lowering.expression(expression)?);
    let code = lowering.print(lowering.ast.vec1(statement));
    Ok(code.trim_end().trim_end_matches(';').to_string())
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPERATORS
// ═══════════════════════════════════════════════════════════════════════════════

fn assignment_operator(operator: AssignmentOperator) -> op::AssignmentOperator {
    match operator {
        AssignmentOperator::Assign => op::AssignmentOperator::Assign,
        AssignmentOperator::Addition => op::AssignmentOperator::Addition,
        AssignmentOperator::Subtraction => op::AssignmentOperator::Subtraction,
        AssignmentOperator::Multiplication => op::AssignmentOperator::Multiplication,
        AssignmentOperator::Division => op::AssignmentOperator::Division,
        AssignmentOperator::Remainder => op::AssignmentOperator::Remainder,
        AssignmentOperator::LogicalOr => op::AssignmentOperator::LogicalOr,
        AssignmentOperator::LogicalAnd => op::AssignmentOperator::LogicalAnd,
        AssignmentOperator::Nullish => op::AssignmentOperator::LogicalNullish,
    }
}

fn update_operator(operator: UpdateOperator) -> op::UpdateOperator {
    match operator {
        UpdateOperator::Increment => op::UpdateOperator::Increment,
        UpdateOperator::Decrement => op::UpdateOperator::Decrement,
    }
}

fn unary_operator(operator: UnaryOperator) -> op::UnaryOperator {
    match operator {
        UnaryOperator::Not => op::UnaryOperator::LogicalNot,
        UnaryOperator::Minus => op::UnaryOperator::UnaryNegation,
        UnaryOperator::Plus => op::UnaryOperator::UnaryPlus,
        UnaryOperator::BitwiseNot => op::UnaryOperator::BitwiseNot,
        UnaryOperator::Typeof => op::UnaryOperator::Typeof,
        UnaryOperator::Void => op::UnaryOperator::Void,
        UnaryOperator::Delete => op::UnaryOperator::Delete,
    }
}

fn binary_operator(operator: BinaryOperator) -> op::BinaryOperator {
    match operator {
        BinaryOperator::Equality => op::BinaryOperator::Equality,
        BinaryOperator::Inequality => op::BinaryOperator::Inequality,
        BinaryOperator::StrictEquality => op::BinaryOperator::StrictEquality,
        BinaryOperator::StrictInequality => op::BinaryOperator::StrictInequality,
        BinaryOperator::LessThan => op::BinaryOperator::LessThan,
        BinaryOperator::LessEqual => op::BinaryOperator::LessEqualThan,
        BinaryOperator::GreaterThan => op::BinaryOperator::GreaterThan,
        BinaryOperator::GreaterEqual => op::BinaryOperator::GreaterEqualThan,
        BinaryOperator::Addition => op::BinaryOperator::Addition,
        BinaryOperator::Subtraction => op::BinaryOperator::Subtraction,
        BinaryOperator::Multiplication => op::BinaryOperator::Multiplication,
        BinaryOperator::Division => op::BinaryOperator::Division,
        BinaryOperator::Remainder => op::BinaryOperator::Remainder,
        BinaryOperator::Exponential => op::BinaryOperator::Exponential,
        BinaryOperator::BitwiseAnd => op::BinaryOperator::BitwiseAnd,
        BinaryOperator::BitwiseOr => op::BinaryOperator::BitwiseOR,
        BinaryOperator::BitwiseXor => op::BinaryOperator::BitwiseXOR,
        BinaryOperator::ShiftLeft => op::BinaryOperator::ShiftLeft,
        BinaryOperator::ShiftRight => op::BinaryOperator::ShiftRight,
        BinaryOperator::ShiftRightZeroFill => op::BinaryOperator::ShiftRightZeroFill,
        BinaryOperator::In => op::BinaryOperator::In,
        BinaryOperator::Instanceof => op::BinaryOperator::Instanceof,
    }
}

fn logical_operator(operator: LogicalOperator) -> op::LogicalOperator {
    match operator {
        LogicalOperator::And => op::LogicalOperator::And,
        LogicalOperator::Or => op::LogicalOperator::Or,
        LogicalOperator::Coalesce => op::LogicalOperator::Coalesce,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PATTERN HEADS
// ═══════════════════════════════════════════════════════════════════════════════

fn key_source(key: &str) -> String {
    if is_identifier_name(key) {
        key.to_string()
    } else {
        serde_json::Value::String(key.to_string()).to_string()
    }
}

/// Source text of a binding or assignment pattern.
fn pattern_source(pattern: &Pattern) -> Lowered<String> {
    Ok(match pattern {
        Pattern::Identifier { name, .. } => name.clone(),
        Pattern::Object { properties } => {
            let mut entries = Vec::with_capacity(properties.len());
            for property in properties {
                let entry = match &property.value {
                    Pattern::Identifier { name, .. } if *name == property.key => name.clone(),
                    value => format!("{}: {}", key_source(&property.key), pattern_source(value)?),
                };
                entries.push(entry);
            }
            if entries.is_empty() {
                "{}".to_string()
            } else {
                format!("{{ {} }}", entries.join(", "))
            }
        }
        Pattern::Array { elements } => {
            let mut entries = Vec::with_capacity(elements.len());
            for element in elements {
                entries.push(match element {
                    Some(element) => pattern_source(element)?,
                    None => String::new(),
                });
            }
            let trailing_hole = matches!(elements.last(), Some(None));
            format!("[{}{}]", entries.join(", "), if trailing_hole { "," } else { "" })
        }
        Pattern::Assign { left, right } => {
            format!("{} = ({})", pattern_source(left)?, print_expression(right)?)
        }
        Pattern::Rest { argument } => format!("...{}", pattern_source(argument)?),
        Pattern::Expression { expression } => print_expression(expression)?,
    })
}

fn params_source(params: &[Pattern]) -> Lowered<String> {
    let mut sources = Vec::with_capacity(params.len());
    for param in params {
        sources.push(pattern_source(param)?);
    }
    Ok(sources.join(", "))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOWERING
// ═══════════════════════════════════════════════════════════════════════════════

struct Lowering<'a> {
    ast: AstBuilder<'a>,
}

impl<'a> Lowering<'a> {
    fn new(allocator: &'a Allocator) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
        }
    }

    fn str(&self, s: &str) -> &'a str {
        self.ast.allocator.alloc_str(s)
    }

    fn print(&self, body: ArenaVec<'a, js::Statement<'a>>) -> String {
        Codegen::new()
            .build(&js::Program {
                span: SPAN,
                source_type: SourceType::mjs(),
                hashbang: None,
                directives: self.ast.vec(),
                body,
                source_text: "",
                comments: self.ast.vec(),
                scope_id: std::cell::Cell::new(None),
            })
            .code
    }

    /// Parses one generated statement into the arena.
    fn parse_statement(&self, kind: &'static str, text: &str) -> Lowered<js::Statement<'a>> {
        let invalid = |message: String| CodegenError::InvalidSyntax {
            kind,
            text: text.to_string(),
            message,
        };
        let source = self.str(text);
        let options = ParseOptions {
            preserve_parens: false,
            ..ParseOptions::default()
        };
        let parsed = Parser::new(self.ast.allocator, source, SourceType::mjs())
            .with_options(options)
            .parse();
        if let Some(error) = parsed.errors.first() {
            return Err(invalid(error.to_string()));
        }
        let mut statements = parsed.program.body.into_iter();
        match (statements.next(), statements.next()) {
            (Some(statement), None) => Ok(statement),
            _ => Err(invalid("expected exactly one statement".to_string())),
        }
    }

    fn parse_expression(&self, kind: &'static str, text: &str) -> Lowered<js::Expression<'a>> {
        match self.parse_statement(kind, text)? {
            js::Statement::ExpressionStatement(mut statement) => Ok(std::mem::replace(
                &mut statement.expression,
                self.ast.expression_null_literal(SPAN),
            )),
            _ => Err(CodegenError::InvalidSyntax {
                kind,
                text: text.to_string(),
                message: "expected an expression".to_string(),
            }),
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Statements
    // ───────────────────────────────────────────────────────────────────────────

    fn statements(&self, statements: &[Statement]) -> Lowered<ArenaVec<'a, js::Statement<'a>>> {
        let mut lowered = self.ast.vec_with_capacity(statements.len());
        for statement in statements {
            lowered.push(self.statement(statement)?);
        }
        Ok(lowered)
    }

    fn statement(&self, statement: &Statement) -> Lowered<js::Statement<'a>> {
        let ast = self.ast;
        Ok(match statement {
            Statement::Expression { expression, .. } => {
                ast.statement_expression(SPAN, self.expression(expression)?)
            }
            Statement::Variable(declaration) => {
                js::Statement::VariableDeclaration(self.variable_declaration(declaration)?)
            }
            Statement::Function(function) => {
                js::Statement::FunctionDeclaration(self.function(function, true)?)
            }
            Statement::Return { argument } => {
                ast.statement_return(SPAN, self.optional(argument.as_ref())?)
            }
            Statement::If {
                test,
                consequent,
                alternate,
            } => {
                let alternate = match alternate {
                    Some(alternate) => Some(self.statement(alternate)?),
                    None => None,
                };
                ast.statement_if(
                    SPAN,
                    self.expression(test)?,
                    self.statement(consequent)?,
                    alternate,
                )
            }
            Statement::Block { body } => ast.statement_block(SPAN, self.statements(body)?),
            Statement::For {
                init,
                test,
                update,
                body,
            } => {
                let init = match init.as_deref() {
                    None => None,
                    Some(Statement::Variable(declaration)) => Some(
                        js::ForStatementInit::VariableDeclaration(
                            self.variable_declaration(declaration)?,
                        ),
                    ),
                    Some(Statement::Expression { expression, .. }) => {
                        Some(js::ForStatementInit::from(self.expression(expression)?))
                    }
                    Some(_) => return Err(CodegenError::Misplaced("for loop initializer")),
                };
                ast.statement_for(
                    SPAN,
                    init,
                    self.optional(test.as_ref())?,
                    self.optional(update.as_ref())?,
                    self.statement(body)?,
                )
            }
            Statement::While { test, body } => {
                ast.statement_while(SPAN, self.expression(test)?, self.statement(body)?)
            }
            Statement::Import(import) => self.import(import),
            Statement::Export { declaration, .. } => self.export(declaration)?,
            Statement::View(view) => {
                return Err(CodegenError::Uncompiled(format!("view {}", view.full_name())))
            }
            Statement::Empty => ast.statement_empty(SPAN),
        })
    }

    /// `prop` declarations that survive outside a view print as `let`.
    fn variable_declaration(
        &self,
        declaration: &VariableDeclaration,
    ) -> Lowered<ArenaBox<'a, js::VariableDeclaration<'a>>> {
        let kind = match declaration.kind {
            VariableKind::Var => "var",
            VariableKind::Const => "const",
            VariableKind::Let | VariableKind::Prop => "let",
        };
        let mut heads = Vec::with_capacity(declaration.declarations.len());
        for declarator in &declaration.declarations {
            heads.push(format!("{} = 0", pattern_source(&declarator.id)?));
        }
        let text = format!("{} {};", kind, heads.join(", "));

        let mut lowered = match self.parse_statement("variable declaration", &text)? {
            js::Statement::VariableDeclaration(lowered) => lowered,
            _ => return Err(CodegenError::Misplaced("variable declaration")),
        };
        for (target, source) in lowered
            .declarations
            .iter_mut()
            .zip(&declaration.declarations)
        {
            target.init = self.optional(source.init.as_ref())?;
        }
        Ok(lowered)
    }

    fn function(
        &self,
        function: &Function,
        declaration: bool,
    ) -> Lowered<ArenaBox<'a, js::Function<'a>>> {
        let name = function.id.as_deref().unwrap_or("");
        let params = params_source(&function.params)?;
        let head = if declaration {
            format!("function {}({}) {{}}", name, params)
        } else {
            format!("(function {}({}) {{}});", name, params)
        };

        let mut lowered = match self.parse_statement("function", &head)? {
            js::Statement::FunctionDeclaration(lowered) => lowered,
            js::Statement::ExpressionStatement(mut statement) => match std::mem::replace(
                &mut statement.expression,
                self.ast.expression_null_literal(SPAN),
            ) {
                js::Expression::FunctionExpression(lowered) => lowered,
                _ => return Err(CodegenError::Misplaced("function")),
            },
            _ => return Err(CodegenError::Misplaced("function")),
        };
        lowered.body = Some(self.function_body(&function.body)?);
        Ok(lowered)
    }

    fn function_body(&self, body: &[Statement]) -> Lowered<ArenaBox<'a, js::FunctionBody<'a>>> {
        Ok(self
            .ast
            .alloc_function_body(SPAN, self.ast.vec(), self.statements(body)?))
    }

    fn import(&self, import: &ImportDeclaration) -> js::Statement<'a> {
        let ast = self.ast;
        let mut specifiers = ast.vec_with_capacity(import.specifiers.len());
        for specifier in &import.specifiers {
            let local = ast.binding_identifier(SPAN, self.str(specifier.local()));
            specifiers.push(match specifier {
                ImportSpecifier::Default { .. } => {
                    js::ImportDeclarationSpecifier::ImportDefaultSpecifier(
                        ast.alloc(ast.import_default_specifier(SPAN, local)),
                    )
                }
                ImportSpecifier::Named { imported, .. } => {
                    let imported = js::ModuleExportName::IdentifierName(
                        ast.identifier_name(SPAN, self.str(imported)),
                    );
                    js::ImportDeclarationSpecifier::ImportSpecifier(ast.alloc(
                        ast.import_specifier(SPAN, imported, local, js::ImportOrExportKind::Value),
                    ))
                }
                ImportSpecifier::Namespace { .. } => {
                    js::ImportDeclarationSpecifier::ImportNamespaceSpecifier(
                        ast.alloc(ast.import_namespace_specifier(SPAN, local)),
                    )
                }
            });
        }
        let specifiers = if specifiers.is_empty() {
            None
        } else {
            Some(specifiers)
        };

        js::Statement::from(ast.module_declaration_import_declaration(
            SPAN,
            specifiers,
            ast.string_literal(SPAN, self.str(&import.source), None),
            None,
            None::<ArenaBox<'_, js::WithClause<'_>>>,
            js::ImportOrExportKind::Value,
        ))
    }

    fn export(&self, declaration: &Statement) -> Lowered<js::Statement<'a>> {
        let lowered = match declaration {
            Statement::Variable(declaration) => {
                js::Declaration::VariableDeclaration(self.variable_declaration(declaration)?)
            }
            Statement::Function(function) => {
                js::Declaration::FunctionDeclaration(self.function(function, true)?)
            }
            _ => return Err(CodegenError::Misplaced("exported statement")),
        };
        let mut statement = self.parse_statement("export", "export const _ = 0;")?;
        match &mut statement {
            js::Statement::ExportNamedDeclaration(export) => export.declaration = Some(lowered),
            _ => return Err(CodegenError::Misplaced("exported statement")),
        }
        Ok(statement)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Expressions
    // ───────────────────────────────────────────────────────────────────────────

    fn optional(&self, expression: Option<&Expression>) -> Lowered<Option<js::Expression<'a>>> {
        expression.map(|expression| self.expression(expression)).transpose()
    }

    fn expression(&self, expression: &Expression) -> Lowered<js::Expression<'a>> {
        let ast = self.ast;
        Ok(match expression {
            Expression::Identifier { name, .. } => ast.expression_identifier(SPAN, self.str(name)),
            Expression::Literal { value, .. } => self.literal(value),
            Expression::Array { elements } => {
                let mut lowered = ast.vec_with_capacity(elements.len());
                for element in elements {
                    lowered.push(match element {
                        Expression::Spread { argument } => {
                            js::ArrayExpressionElement::SpreadElement(
                                ast.alloc_spread_element(SPAN, self.expression(argument)?),
                            )
                        }
                        element => js::ArrayExpressionElement::from(self.expression(element)?),
                    });
                }
                ast.expression_array(SPAN, lowered)
            }
            Expression::Object { properties } => {
                ast.expression_object(SPAN, self.properties(properties)?)
            }
            Expression::Member { object, property } => {
                js::Expression::from(self.member(object, property)?)
            }
            Expression::Call { callee, arguments } => ast.expression_call(
                SPAN,
                self.expression(callee)?,
                None::<ArenaBox<js::TSTypeParameterInstantiation>>,
                self.arguments(arguments)?,
                false,
            ),
            Expression::New { callee, arguments } => ast.expression_new(
                SPAN,
                self.expression(callee)?,
                None::<ArenaBox<js::TSTypeParameterInstantiation>>,
                self.arguments(arguments)?,
            ),
            Expression::Assignment {
                operator,
                left,
                right,
                ..
            } => self.assignment(*operator, left, right)?,
            Expression::Update {
                operator,
                prefix,
                argument,
            } => ast.expression_update(
                SPAN,
                update_operator(*operator),
                *prefix,
                self.simple_target(argument)?,
            ),
            Expression::Unary { operator, argument } => {
                ast.expression_unary(SPAN, unary_operator(*operator), self.expression(argument)?)
            }
            Expression::Binary {
                operator,
                left,
                right,
            } => ast.expression_binary(
                SPAN,
                self.expression(left)?,
                binary_operator(*operator),
                self.expression(right)?,
            ),
            Expression::Logical {
                operator,
                left,
                right,
            } => ast.expression_logical(
                SPAN,
                self.expression(left)?,
                logical_operator(*operator),
                self.expression(right)?,
            ),
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => ast.expression_conditional(
                SPAN,
                self.expression(test)?,
                self.expression(consequent)?,
                self.expression(alternate)?,
            ),
            Expression::Function(function) => {
                js::Expression::FunctionExpression(self.function(function, false)?)
            }
            Expression::Arrow(arrow) => self.arrow(arrow)?,
            Expression::Sequence { expressions } => {
                let mut lowered = ast.vec_with_capacity(expressions.len());
                for expression in expressions {
                    lowered.push(self.expression(expression)?);
                }
                ast.expression_sequence(SPAN, lowered)
            }
            Expression::Spread { .. } => return Err(CodegenError::Misplaced("spread element")),
            Expression::Element(element) => {
                return Err(CodegenError::Uncompiled(format!(
                    "element <{}>",
                    element.name.display()
                )))
            }
        })
    }

    fn literal(&self, literal: &Literal) -> js::Expression<'a> {
        match literal {
            Literal::Null => self.ast.expression_null_literal(SPAN),
            Literal::Boolean(value) => self.ast.expression_boolean_literal(SPAN, *value),
            Literal::String(value) => self.ast.expression_string_literal(SPAN, self.str(value), None),
            Literal::Number(value) => self.number(*value),
        }
    }

    /// Negative numbers become a negation of their magnitude.
    fn number(&self, value: f64) -> js::Expression<'a> {
        if value.is_nan() {
            return self.ast.expression_identifier(SPAN, "NaN");
        }
        if value < 0.0 {
            return self.ast.expression_unary(
                SPAN,
                op::UnaryOperator::UnaryNegation,
                self.number(-value),
            );
        }
        if value.is_infinite() {
            return self.ast.expression_identifier(SPAN, "Infinity");
        }
        let raw = self.str(&format_number(value));
        self.ast
            .expression_numeric_literal(SPAN, value, Some(raw.into()), NumberBase::Decimal)
    }

    fn arguments(&self, arguments: &[Expression]) -> Lowered<ArenaVec<'a, js::Argument<'a>>> {
        let mut lowered = self.ast.vec_with_capacity(arguments.len());
        for argument in arguments {
            lowered.push(match argument {
                Expression::Spread { argument } => js::Argument::SpreadElement(
                    self.ast
                        .alloc_spread_element(SPAN, self.expression(argument)?),
                ),
                argument => js::Argument::from(self.expression(argument)?),
            });
        }
        Ok(lowered)
    }

    fn properties(
        &self,
        properties: &[Property],
    ) -> Lowered<ArenaVec<'a, js::ObjectPropertyKind<'a>>> {
        let ast = self.ast;
        let mut lowered = ast.vec_with_capacity(properties.len());
        for property in properties {
            lowered.push(match property {
                Property::KeyValue { key, value, .. } => {
                    let computed = matches!(key, PropertyKey::Computed(_));
                    ast.object_property_kind_object_property(
                        SPAN,
                        js::PropertyKind::Init,
                        self.property_key(key)?,
                        self.expression(value)?,
                        false,
                        false,
                        computed,
                    )
                }
                Property::Spread { argument } => js::ObjectPropertyKind::SpreadProperty(
                    ast.alloc_spread_element(SPAN, self.expression(argument)?),
                ),
            });
        }
        Ok(lowered)
    }

    fn property_key(&self, key: &PropertyKey) -> Lowered<js::PropertyKey<'a>> {
        let ast = self.ast;
        Ok(match key {
            PropertyKey::Identifier(name) if is_identifier_name(name) => {
                ast.property_key_static_identifier(SPAN, self.str(name))
            }
            PropertyKey::Identifier(name) | PropertyKey::String(name) => js::PropertyKey::StringLiteral(
                ast.alloc(ast.string_literal(SPAN, self.str(name), None)),
            ),
            PropertyKey::Number(value) => js::PropertyKey::NumericLiteral(
                ast.alloc_numeric_literal(SPAN, *value, None, NumberBase::Decimal),
            ),
            PropertyKey::Computed(expression) => {
                js::PropertyKey::from(self.expression(expression)?)
            }
        })
    }

    fn member(
        &self,
        object: &Expression,
        property: &MemberProperty,
    ) -> Lowered<js::MemberExpression<'a>> {
        let ast = self.ast;
        let object = self.expression(object)?;
        Ok(match property {
            MemberProperty::Static(name) if is_identifier_name(name) => {
                ast.member_expression_static(SPAN, object, ast.identifier_name(SPAN, self.str(name)), false)
            }
            MemberProperty::Static(name) => ast.member_expression_computed(
                SPAN,
                object,
                ast.expression_string_literal(SPAN, self.str(name), None),
                false,
            ),
            MemberProperty::Computed(property) => {
                ast.member_expression_computed(SPAN, object, self.expression(property)?, false)
            }
        })
    }

    fn simple_target(&self, target: &Expression) -> Lowered<js::SimpleAssignmentTarget<'a>> {
        match target {
            Expression::Identifier { name, .. } => {
                Ok(js::SimpleAssignmentTarget::AssignmentTargetIdentifier(
                    self.ast.alloc_identifier_reference(SPAN, self.str(name)),
                ))
            }
            Expression::Member { object, property } => {
                Ok(js::SimpleAssignmentTarget::from(self.member(object, property)?))
            }
            _ => Err(CodegenError::Misplaced("assignment target")),
        }
    }

    fn assignment(
        &self,
        operator: AssignmentOperator,
        left: &Pattern,
        right: &Expression,
    ) -> Lowered<js::Expression<'a>> {
        let operator = assignment_operator(operator);
        let right = self.expression(right)?;
        let target = match left {
            Pattern::Identifier { name, .. } => self.simple_target(&Expression::ident(name.as_str()))?,
            Pattern::Expression { expression } => self.simple_target(expression)?,
            Pattern::Object { .. } | Pattern::Array { .. } => {
                let text = format!("({} = 0);", pattern_source(left)?);
                let mut lowered = self.parse_expression("destructuring assignment", &text)?;
                if let js::Expression::AssignmentExpression(assignment) = &mut lowered {
                    assignment.operator = operator;
                    assignment.right = right;
                }
                return Ok(lowered);
            }
            Pattern::Assign { .. } | Pattern::Rest { .. } => {
                return Err(CodegenError::Misplaced("assignment target"))
            }
        };
        Ok(self
            .ast
            .expression_assignment(SPAN, operator, js::AssignmentTarget::from(target), right))
    }

    fn arrow(&self, arrow: &ArrowFunction) -> Lowered<js::Expression<'a>> {
        let head = format!("(({}) => {{}});", params_source(&arrow.params)?);
        let mut lowered = self.parse_expression("arrow function", &head)?;
        let js::Expression::ArrowFunctionExpression(function) = &mut lowered else {
            return Err(CodegenError::Misplaced("arrow function"));
        };
        match &arrow.body {
            ArrowBody::Block(body) => {
                function.expression = false;
                function.body = self.function_body(body)?;
            }
            ArrowBody::Expression(value) => {
                let value = self.ast.statement_expression(SPAN, self.expression(value)?);
                function.expression = true;
                function.body = self
                    .ast
                    .alloc_function_body(SPAN, self.ast.vec(), self.ast.vec1(value));
            }
        }
        Ok(lowered)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Element, ElementName, PatternProperty, Span};
    use crate::test_fixtures::squash;

    fn program(body: Vec<Statement>) -> Program {
        Program { body }
    }

    #[test]
    fn test_precedence_parenthesizes_lower_children() {
        let sum = Expression::Binary {
            operator: BinaryOperator::Addition,
            left: Box::new(Expression::ident("a")),
            right: Box::new(Expression::ident("b")),
        };
        let product = Expression::Binary {
            operator: BinaryOperator::Multiplication,
            left: Box::new(sum),
            right: Box::new(Expression::number(2.0)),
        };
        assert_eq!(print_expression(&product).unwrap(), "(a + b) * 2");

        let guarded = Expression::and(
            Expression::not(Expression::not(Expression::ident("open"))),
            Expression::call(Expression::ident("f"), vec![]),
        );
        assert_eq!(print_expression(&guarded).unwrap(), "!!open && f()");
    }

    #[test]
    fn test_update_and_assignment() {
        let update = Expression::Update {
            operator: UpdateOperator::Increment,
            prefix: false,
            argument: Box::new(Expression::ident("count")),
        };
        assert_eq!(print_expression(&update).unwrap(), "count++");

        let assignment = Expression::Assignment {
            operator: AssignmentOperator::Addition,
            left: Box::new(Pattern::ident("x")),
            right: Box::new(Expression::number(1.0)),
            span: Default::default(),
        };
        assert_eq!(print_expression(&assignment).unwrap(), "x += 1");
    }

    #[test]
    fn test_negative_numbers_and_strings() {
        let values = Expression::array(vec![
            Expression::number(-2.5),
            Expression::string("two\nlines"),
        ]);
        assert_eq!(
            squash(&print_expression(&values).unwrap()),
            r#"[-2.5,"two\nlines"]"#
        );
    }

    #[test]
    fn test_function_body_is_lowered() {
        let code = print_program(&program(vec![Statement::expression(Expression::call(
            Expression::ident("run"),
            vec![Expression::function(
                &["a"],
                vec![Statement::ret(Expression::ident("a"))],
            )],
        ))]))
        .unwrap();
        assert_eq!(squash(&code), "run(function(a){returna;});");
    }

    #[test]
    fn test_statement_starting_with_function_is_wrapped() {
        let iife = Statement::expression(Expression::call(
            Expression::function(&[], vec![]),
            vec![],
        ));
        let code = squash(&print_program(&program(vec![iife])).unwrap());
        assert!(code.starts_with("(function(){}"), "{}", code);
        assert!(code.ends_with(");"), "{}", code);
    }

    #[test]
    fn test_destructuring_heads() {
        let props = Pattern::Object {
            properties: vec![
                PatternProperty {
                    key: "a".to_string(),
                    value: Pattern::ident("a"),
                },
                PatternProperty {
                    key: "b".to_string(),
                    value: Pattern::Assign {
                        left: Box::new(Pattern::ident("c")),
                        right: Box::new(Expression::number(1.0)),
                    },
                },
            ],
        };
        let declaration = Statement::Variable(VariableDeclaration {
            kind: VariableKind::Const,
            declarations: vec![crate::ast::VariableDeclarator {
                id: props.clone(),
                init: Some(Expression::ident("props")),
                span: Span::default(),
            }],
            span: Span::default(),
        });
        let swap = Statement::expression(Expression::assign(
            Pattern::Array {
                elements: vec![Some(Pattern::ident("x")), Some(Pattern::ident("y"))],
            },
            Expression::ident("pair"),
        ));

        let code = print_program(&program(vec![declaration, swap])).unwrap();
        assert_eq!(
            squash(&code),
            "const{a,b:c=1}=props;[x,y]=pair;"
        );
    }

    #[test]
    fn test_imports_and_exports() {
        let code = print_program(&program(vec![
            Statement::Import(ImportDeclaration {
                source: "./card".to_string(),
                specifiers: vec![
                    ImportSpecifier::Default {
                        local: "Card".to_string(),
                    },
                    ImportSpecifier::Named {
                        imported: "Title".to_string(),
                        local: "Heading".to_string(),
                    },
                ],
            }),
            Statement::Export {
                declaration: Box::new(Statement::Function(Function {
                    id: Some("helper".to_string()),
                    params: vec![],
                    body: vec![],
                })),
                span: Span::default(),
            },
        ]))
        .unwrap();
        assert_eq!(
            squash(&code),
            r#"importCard,{TitleasHeading}from"./card";exportfunctionhelper(){}"#
        );
    }

    #[test]
    fn test_uncompiled_nodes_are_errors() {
        let element = Expression::element(Element {
            name: ElementName::Tag("div".to_string()),
            attributes: vec![],
            children: vec![],
            span: Span::default(),
        });
        assert_eq!(
            print_expression(&element).unwrap_err(),
            CodegenError::Uncompiled("element <div>".to_string())
        );

        let stray = Expression::spread(Expression::ident("rest"));
        assert_eq!(
            print_expression(&stray).unwrap_err(),
            CodegenError::Misplaced("spread element")
        );
    }
}
