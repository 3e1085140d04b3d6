//! Reactive state instrumentation tests.

#[cfg(test)]
mod tests {
    use crate::ast::{
        AssignmentOperator, Expression, Pattern, PatternProperty, Span, VariableKind,
    };
    use crate::test_fixtures::*;

    fn destructure(names: &[&str]) -> Pattern {
        Pattern::Object {
            properties: names
                .iter()
                .map(|name| PatternProperty {
                    key: name.to_string(),
                    value: Pattern::ident(*name),
                })
                .collect(),
        }
    }

    fn call(object: &str, method: &str, arguments: Vec<Expression>) -> Expression {
        Expression::call(Expression::member(Expression::ident(object), method), arguments)
    }

    #[test]
    fn test_counter_view() {
        let output = compile(vec![view(
            "Counter",
            vec![
                let_("count", Expression::number(0.0)),
                expr(el(
                    "button",
                    vec![attr(
                        "onClick",
                        handler(vec![expr(increment("count", false))]),
                    )],
                    vec![child(Expression::ident("count"))],
                )),
            ],
        )]);

        assert_eq!(
            squash(&output.code),
            squash(r#"Runtime.registerView("Counter", function (view, $) {
  let count = view.declareState("count", 0);
  view.registerRender(function () {
    return Runtime.createElement(["button", 1], { onClick: function () {
      view.setState("count", count++, count, true);
    } }, count);
  });
});
"#)
        );
    }

    #[test]
    fn test_view_level_assignment_reads_through_runtime() {
        let body = vec![view(
            "A",
            vec![
                let_("count", Expression::number(0.0)),
                assign("count", Expression::number(5.0)),
            ],
        )];

        let output = compile(body.clone());
        assert!(contains_code(
            &output.code,
            r#"view.setState("count", count = view.readState("count", 5));"#
        ));

        let output = compile_with(body, production()).unwrap();
        assert!(contains_code(&output.code, r#"view.setState("count", count = 5);"#));
        assert!(!output.code.contains("readState"));
    }

    #[test]
    fn test_view_level_compound_assignment_reads_through_runtime() {
        let add = |name: &str, value: f64| {
            expr(Expression::Assignment {
                operator: AssignmentOperator::Addition,
                left: Box::new(Pattern::ident(name)),
                right: Box::new(Expression::number(value)),
                span: Span::default(),
            })
        };
        let body = vec![view(
            "A",
            vec![let_("count", Expression::number(0.0)), add("count", 1.0)],
        )];

        let output = compile(body.clone());
        assert!(contains_code(
            &output.code,
            r#"view.setState("count", count += view.readState("count", 1));"#
        ));

        let output = compile_with(body, production()).unwrap();
        assert!(contains_code(&output.code, r#"view.setState("count", count += 1);"#));
    }

    #[test]
    fn test_read_of_file_binding_is_marked() {
        let output = compile(vec![
            const_("initial", Expression::number(1.0)),
            view(
                "A",
                vec![
                    let_("count", Expression::number(0.0)),
                    assign("count", Expression::ident("initial")),
                ],
            ),
        ]);
        assert!(contains_code(
            &output.code,
            r#"view.readState("count", initial, "fromFile")"#
        ));
    }

    #[test]
    fn test_writes_inside_handlers() {
        let compound = Expression::Assignment {
            operator: AssignmentOperator::Addition,
            left: Box::new(Pattern::ident("count")),
            right: Box::new(Expression::number(2.0)),
            span: Span::default(),
        };
        let member_write = Expression::assign(
            Pattern::Expression {
                expression: Box::new(Expression::member(Expression::ident("user"), "name")),
            },
            Expression::string("x"),
        );
        let member_update = Expression::Update {
            operator: crate::ast::UpdateOperator::Increment,
            prefix: false,
            argument: Box::new(Expression::member(Expression::ident("user"), "age")),
        };

        let output = compile(vec![view(
            "A",
            vec![
                let_("count", Expression::number(0.0)),
                let_("user", Expression::object(vec![])),
                let_("items", Expression::array(vec![])),
                let_("obj", Expression::object(vec![])),
                const_(
                    "onTap",
                    handler(vec![
                        expr(increment("count", true)),
                        expr(compound),
                        expr(member_write),
                        expr(member_update),
                        expr(call("items", "push", vec![Expression::number(1.0)])),
                        expr(call(
                            "Object",
                            "assign",
                            vec![Expression::ident("obj"), Expression::ident("patch")],
                        )),
                    ]),
                ),
            ],
        )]);

        let code = &output.code;
        assert!(contains_code(code, r#"let user = view.declareState("user", {});"#));
        assert!(contains_code(code, r#"view.setState("count", ++count);"#));
        assert!(contains_code(code, r#"view.setState("count", count += 2);"#));
        assert!(contains_code(code, r#"view.setState("user", user.name = "x", user);"#));
        assert!(contains_code(code, r#"view.setState("user", user.age++, user);"#));
        assert!(contains_code(code, r#"view.setState("items", items.push(1), items);"#));
        assert!(contains_code(code, r#"view.setState("obj", Object.assign(obj, patch));"#));
        assert!(contains_code(code, "const onTap = function () {"));
    }

    #[test]
    fn test_shadowed_and_local_names_are_left_alone() {
        let output = compile(vec![view(
            "A",
            vec![
                let_("count", Expression::number(0.0)),
                const_("max", Expression::number(3.0)),
                const_(
                    "reset",
                    Expression::function(
                        &["count"],
                        vec![
                            assign("count", Expression::number(1.0)),
                            let_("local", Expression::number(1.0)),
                            assign("local", Expression::number(2.0)),
                        ],
                    ),
                ),
            ],
        )]);

        let code = &output.code;
        assert!(contains_code(
            code,
            "function (count) { count = 1; let local = 1; local = 2; }"
        ));
        assert!(contains_code(code, "const max = 3;"));
        assert!(!code.contains(r#"setState("count""#));
        assert!(!code.contains(r#"declareState("max""#));
        assert!(!code.contains(r#"declareState("local""#));
    }

    #[test]
    fn test_code_outside_views_is_untouched() {
        let output = compile(vec![
            let_("count", Expression::number(0.0)),
            expr(increment("count", false)),
        ]);
        assert_eq!(squash(&output.code), "letcount=0;count++;");
    }

    #[test]
    fn test_handler_declared_before_state_is_instrumented() {
        let output = compile(vec![view(
            "A",
            vec![
                const_("inc", handler(vec![expr(increment("count", false))])),
                let_("count", Expression::number(0.0)),
            ],
        )]);
        assert!(contains_code(
            &output.code,
            r#"view.setState("count", count++, count, true);"#
        ));
    }

    #[test]
    fn test_redeclared_var_registers_again() {
        let output = compile(vec![view(
            "A",
            vec![
                declare(VariableKind::Var, Pattern::ident("x"), Some(Expression::number(1.0))),
                declare(VariableKind::Var, Pattern::ident("x"), Some(Expression::number(2.0))),
            ],
        )]);
        assert!(contains_code(
            &output.code,
            r#"var x = view.declareState("x", 1); var x = view.declareState("x", 2);"#
        ));
    }

    #[test]
    fn test_destructuring_registers_each_name() {
        let output = compile(vec![view(
            "A",
            vec![declare(
                VariableKind::Let,
                destructure(&["a", "b"]),
                Some(Expression::ident("props")),
            )],
        )]);
        assert!(contains_code(
            &output.code,
            r#"let { a, b } = props; view.declareState("a", a); view.declareState("b", b);"#
        ));
    }

    #[test]
    fn test_destructuring_assignment_notifies_each_name() {
        let output = compile(vec![view(
            "A",
            vec![
                let_("a", Expression::number(1.0)),
                let_("b", Expression::number(2.0)),
                expr(Expression::assign(
                    destructure(&["a", "b"]),
                    Expression::ident("next"),
                )),
            ],
        )]);
        assert!(contains_code(
            &output.code,
            r#"({ a, b } = next); view.setState("a", a); view.setState("b", b);"#
        ));
    }

    #[test]
    fn test_props_resolve_from_external_input() {
        let output = compile(vec![view(
            "A",
            vec![declare(
                VariableKind::Prop,
                Pattern::ident("title"),
                Some(Expression::string("Hi")),
            )],
        )]);
        assert!(contains_code(
            &output.code,
            r#"let title = view.declareExternalProp("title", "Hi");
  view.onExternalInput(function () {
    title = view.declareExternalProp("title", "Hi");
  });"#
        ));
    }
}
