use crate::ast::{
    ArrowBody, ArrowFunction, Attribute, Element, ElementChild, Expression, Function,
    MemberProperty, Pattern, Program, Property, PropertyKey, Statement, VariableDeclaration,
    ViewDeclaration,
};
use crate::validate::CompilerError;

pub type VisitResult = Result<(), CompilerError>;

/// The VisitMut trait is the single traversal mechanism for the syntax tree.
///
/// Rules:
/// 1. Nodes are visited once, in document order. `visit_*` runs pre-order and
///    `exit_statement` runs post-order.
/// 2. Implementers override `visit_*` methods to add behavior and call the
///    matching `walk_*` function to continue into children.
/// 3. Statements returned from `exit_statement` are spliced into the parent list
///    and are never walked again.
/// 4. The first error aborts the traversal.
pub trait VisitMut {
    fn visit_program(&mut self, program: &mut Program) -> VisitResult {
        walk_program(self, program)
    }

    fn visit_statements(&mut self, statements: &mut Vec<Statement>) -> VisitResult {
        walk_statements(self, statements)
    }

    fn visit_statement(&mut self, statement: &mut Statement) -> VisitResult {
        walk_statement(self, statement)
    }

    /// Post-order hook for a statement; the result replaces it in its parent.
    fn exit_statement(&mut self, statement: Statement) -> Result<Vec<Statement>, CompilerError> {
        Ok(vec![statement])
    }

    fn visit_block(&mut self, body: &mut Vec<Statement>) -> VisitResult {
        self.visit_statements(body)
    }

    fn visit_view(&mut self, view: &mut ViewDeclaration) -> VisitResult {
        walk_view(self, view)
    }

    fn visit_variable_declaration(&mut self, declaration: &mut VariableDeclaration) -> VisitResult {
        walk_variable_declaration(self, declaration)
    }

    fn visit_function(&mut self, function: &mut Function) -> VisitResult {
        walk_function(self, function)
    }

    fn visit_arrow(&mut self, arrow: &mut ArrowFunction) -> VisitResult {
        walk_arrow(self, arrow)
    }

    fn visit_expression(&mut self, expression: &mut Expression) -> VisitResult {
        walk_expression(self, expression)
    }

    fn visit_element(&mut self, element: &mut Element) -> VisitResult {
        walk_element(self, element)
    }

    fn visit_pattern(&mut self, pattern: &mut Pattern) -> VisitResult {
        walk_pattern(self, pattern)
    }
}

pub fn walk_program<V: VisitMut + ?Sized>(visitor: &mut V, program: &mut Program) -> VisitResult {
    visitor.visit_statements(&mut program.body)
}

pub fn walk_statements<V: VisitMut + ?Sized>(
    visitor: &mut V,
    statements: &mut Vec<Statement>,
) -> VisitResult {
    let original = std::mem::take(statements);
    statements.reserve(original.len());
    for mut statement in original {
        visitor.visit_statement(&mut statement)?;
        statements.extend(visitor.exit_statement(statement)?);
    }
    Ok(())
}

/// Visits a statement that sits in a single-statement slot (`if` branches, loop
/// bodies). Multiple replacements are wrapped in a block.
pub fn walk_nested_statement<V: VisitMut + ?Sized>(
    visitor: &mut V,
    slot: &mut Box<Statement>,
) -> VisitResult {
    let mut statement = std::mem::replace(slot.as_mut(), Statement::Empty);
    visitor.visit_statement(&mut statement)?;
    let mut replaced = visitor.exit_statement(statement)?;
    **slot = match replaced.len() {
        0 => Statement::Empty,
        1 => replaced.remove(0),
        _ => Statement::Block { body: replaced },
    };
    Ok(())
}

pub fn walk_statement<V: VisitMut + ?Sized>(
    visitor: &mut V,
    statement: &mut Statement,
) -> VisitResult {
    match statement {
        Statement::Expression { expression, .. } => visitor.visit_expression(expression),
        Statement::Variable(declaration) => visitor.visit_variable_declaration(declaration),
        Statement::Function(function) => visitor.visit_function(function),
        Statement::Return { argument } => match argument {
            Some(argument) => visitor.visit_expression(argument),
            None => Ok(()),
        },
        Statement::If {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expression(test)?;
            walk_nested_statement(visitor, consequent)?;
            if let Some(alternate) = alternate {
                walk_nested_statement(visitor, alternate)?;
            }
            Ok(())
        }
        Statement::Block { body } => visitor.visit_block(body),
        Statement::For {
            init,
            test,
            update,
            body,
        } => {
            if let Some(init) = init {
                walk_nested_statement(visitor, init)?;
            }
            if let Some(test) = test {
                visitor.visit_expression(test)?;
            }
            if let Some(update) = update {
                visitor.visit_expression(update)?;
            }
            walk_nested_statement(visitor, body)
        }
        Statement::While { test, body } => {
            visitor.visit_expression(test)?;
            walk_nested_statement(visitor, body)
        }
        Statement::Export { declaration, .. } => walk_nested_statement(visitor, declaration),
        Statement::View(view) => visitor.visit_view(view),
        Statement::Import(_) | Statement::Empty => Ok(()),
    }
}

pub fn walk_view<V: VisitMut + ?Sized>(visitor: &mut V, view: &mut ViewDeclaration) -> VisitResult {
    visitor.visit_statements(&mut view.body)
}

pub fn walk_variable_declaration<V: VisitMut + ?Sized>(
    visitor: &mut V,
    declaration: &mut VariableDeclaration,
) -> VisitResult {
    for declarator in &mut declaration.declarations {
        visitor.visit_pattern(&mut declarator.id)?;
        if let Some(init) = &mut declarator.init {
            visitor.visit_expression(init)?;
        }
    }
    Ok(())
}

pub fn walk_function<V: VisitMut + ?Sized>(visitor: &mut V, function: &mut Function) -> VisitResult {
    for param in &mut function.params {
        visitor.visit_pattern(param)?;
    }
    visitor.visit_statements(&mut function.body)
}

pub fn walk_arrow<V: VisitMut + ?Sized>(visitor: &mut V, arrow: &mut ArrowFunction) -> VisitResult {
    for param in &mut arrow.params {
        visitor.visit_pattern(param)?;
    }
    match &mut arrow.body {
        ArrowBody::Block(body) => visitor.visit_statements(body),
        ArrowBody::Expression(expression) => visitor.visit_expression(expression),
    }
}

pub fn walk_expression<V: VisitMut + ?Sized>(
    visitor: &mut V,
    expression: &mut Expression,
) -> VisitResult {
    match expression {
        Expression::Identifier { .. } | Expression::Literal { .. } => Ok(()),
        Expression::Array { elements } | Expression::Sequence { expressions: elements } => {
            for element in elements {
                visitor.visit_expression(element)?;
            }
            Ok(())
        }
        Expression::Object { properties } => {
            for property in properties {
                match property {
                    Property::KeyValue { key, value, .. } => {
                        if let PropertyKey::Computed(key) = key {
                            visitor.visit_expression(key)?;
                        }
                        visitor.visit_expression(value)?;
                    }
                    Property::Spread { argument } => visitor.visit_expression(argument)?,
                }
            }
            Ok(())
        }
        Expression::Member { object, property } => {
            visitor.visit_expression(object)?;
            if let MemberProperty::Computed(property) = property {
                visitor.visit_expression(property)?;
            }
            Ok(())
        }
        Expression::Call { callee, arguments } | Expression::New { callee, arguments } => {
            visitor.visit_expression(callee)?;
            for argument in arguments {
                visitor.visit_expression(argument)?;
            }
            Ok(())
        }
        Expression::Assignment { left, right, .. } => {
            visitor.visit_pattern(left)?;
            visitor.visit_expression(right)
        }
        Expression::Update { argument, .. }
        | Expression::Unary { argument, .. }
        | Expression::Spread { argument } => visitor.visit_expression(argument),
        Expression::Binary { left, right, .. } | Expression::Logical { left, right, .. } => {
            visitor.visit_expression(left)?;
            visitor.visit_expression(right)
        }
        Expression::Conditional {
            test,
            consequent,
            alternate,
        } => {
            visitor.visit_expression(test)?;
            visitor.visit_expression(consequent)?;
            visitor.visit_expression(alternate)
        }
        Expression::Function(function) => visitor.visit_function(function),
        Expression::Arrow(arrow) => visitor.visit_arrow(arrow),
        Expression::Element(element) => visitor.visit_element(element),
    }
}

pub fn walk_element<V: VisitMut + ?Sized>(visitor: &mut V, element: &mut Element) -> VisitResult {
    for attribute in &mut element.attributes {
        match attribute {
            Attribute::Named {
                value: Some(value), ..
            } => visitor.visit_expression(value)?,
            Attribute::Named { value: None, .. } => {}
            Attribute::Spread { argument } => visitor.visit_expression(argument)?,
        }
    }
    for child in &mut element.children {
        if let ElementChild::Expression { expression } = child {
            visitor.visit_expression(expression)?;
        }
    }
    Ok(())
}

pub fn walk_pattern<V: VisitMut + ?Sized>(visitor: &mut V, pattern: &mut Pattern) -> VisitResult {
    match pattern {
        Pattern::Identifier { .. } => Ok(()),
        Pattern::Object { properties } => {
            for property in properties {
                visitor.visit_pattern(&mut property.value)?;
            }
            Ok(())
        }
        Pattern::Array { elements } => {
            for element in elements.iter_mut().flatten() {
                visitor.visit_pattern(element)?;
            }
            Ok(())
        }
        Pattern::Assign { left, right } => {
            visitor.visit_pattern(left)?;
            visitor.visit_expression(right)
        }
        Pattern::Rest { argument } => visitor.visit_pattern(argument),
        Pattern::Expression { expression } => visitor.visit_expression(expression),
    }
}
