//! End-to-end compile tests: validation, sessions, metadata delivery.

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::json;

    use crate::ast::{Expression, Program, Span, Statement, ViewDeclaration};
    use crate::compile::{compile_program, CompileOptions, Session};
    use crate::meta::{Clock, ManualClock, MetaCallback, MetaTable};
    use crate::test_fixtures::*;
    use crate::validate::{ErrorKind, ERR_EXPORT_WITH_VIEW, ERR_NESTED_VIEW};

    fn counter() -> Program {
        Program {
            body: vec![view(
                "Counter",
                vec![
                    let_("count", Expression::number(0.0)),
                    style("$", object(vec![("padding", Expression::number(4.0))]), 3),
                    expr(el_at(
                        "button",
                        vec![child(Expression::ident("count"))],
                        span(4, 2, 4, 30),
                    )),
                ],
            )],
        }
    }

    fn recording_session(
        options: CompileOptions,
    ) -> (Session, Arc<ManualClock>, Arc<Mutex<Vec<Vec<String>>>>) {
        let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();
        let callback: MetaCallback = Arc::new(move |table: &MetaTable| {
            sink.lock().unwrap().push(table.keys().cloned().collect());
        });
        let clock = Arc::new(ManualClock::new());
        let session = Session::new(options)
            .with_meta_callback(callback)
            .with_clock(clock.clone() as Arc<dyn Clock>);
        (session, clock, seen)
    }

    #[test]
    fn test_export_next_to_view_is_rejected_before_output() {
        let program = Program {
            body: vec![
                view("A", vec![]),
                Statement::Export {
                    declaration: Box::new(const_("x", Expression::number(1.0))),
                    span: span(7, 0, 7, 20),
                },
            ],
        };
        let (session, _clock, seen) = recording_session(CompileOptions::default());
        let err = session.compile(FILE, &program).unwrap_err();

        assert_eq!(err.code, ERR_EXPORT_WITH_VIEW);
        assert_eq!(err.kind, ErrorKind::Structural);
        assert_eq!(err.line, 7);
        assert!(err.to_string().starts_with("Views don't need to be exported!"));

        assert!(!session.finish());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_exports_without_views_are_fine() {
        let program = Program {
            body: vec![Statement::Export {
                declaration: Box::new(const_("x", Expression::number(1.0))),
                span: Span::default(),
            }],
        };
        let output = compile_program(FILE, &program, CompileOptions::default()).unwrap();
        assert_eq!(squash(&output.code), "exportconstx=1;");
        assert!(output.meta.is_empty());
    }

    #[test]
    fn test_nested_view_is_rejected() {
        let inner = Statement::View(ViewDeclaration {
            name: "Inner".to_string(),
            sub_name: None,
            body: vec![],
            span: span(3, 2, 3, 20),
        });
        let err = compile_with(vec![view("Outer", vec![inner])], CompileOptions::default())
            .unwrap_err();

        assert_eq!(err.code, ERR_NESTED_VIEW);
        assert_eq!(err.message, "Views can't be nested! view Outer { view Inner }");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_sub_named_view_registers_full_name() {
        let program = Program {
            body: vec![Statement::View(ViewDeclaration {
                name: "Modal".to_string(),
                sub_name: Some("Footer".to_string()),
                body: vec![style("$", object(vec![("color", Expression::string("red"))]), 2)],
                span: Span::default(),
            })],
        };
        let output = compile_program(FILE, &program, CompileOptions::default()).unwrap();

        assert!(contains_code(
            &output.code,
            r#"Runtime.registerView("Modal.Footer", function (view, $) {"#
        ));
        assert_eq!(output.stylesheets[0].selector, ".ViewModal-Footer");
        assert!(output.meta.contains_key("Modal.Footer"));
    }

    #[test]
    fn test_compiles_are_deterministic() {
        let session = Session::new(CompileOptions::default());
        let first = session.compile(FILE, &counter()).unwrap();
        let second = session.compile(FILE, &counter()).unwrap();

        assert_eq!(first.code, second.code);
        assert_eq!(first.stylesheets, second.stylesheets);
        assert_eq!(first.css, second.css);
    }

    #[test]
    fn test_metadata_shape() {
        let options = CompileOptions {
            base_path: Some("/repo".to_string()),
            ..CompileOptions::default()
        };
        let output = Session::new(options)
            .compile("/repo/app/counter.js", &counter())
            .unwrap();

        assert_eq!(
            serde_json::to_value(&output.meta).unwrap(),
            json!({
                "Counter": {
                    "file": "app/counter.js",
                    "els": { "button1": { "line": 4, "column": 30 } },
                    "styles": { "$": { "line": 3, "column": 2 } }
                }
            })
        );
    }

    #[test]
    fn test_metadata_batches_until_window_or_finish() {
        let (session, clock, seen) = recording_session(CompileOptions::default());
        session.compile("a.js", &counter()).unwrap();
        session
            .compile("b.js", &Program { body: vec![view("Other", vec![])] })
            .unwrap();

        assert!(!session.poll());
        assert_eq!(session.meta_deliveries(), 0);

        clock.advance(Duration::from_millis(100));
        assert!(session.poll());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![vec!["Counter".to_string(), "Other".to_string()]]
        );

        assert!(!session.finish());
        assert_eq!(session.meta_deliveries(), 1);
    }

    #[test]
    fn test_finish_delivers_pending_metadata() {
        let (session, _clock, seen) = recording_session(CompileOptions::default());
        session.compile(FILE, &counter()).unwrap();

        assert!(session.finish());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dropping_the_session_flushes_metadata() {
        let (session, _clock, seen) = recording_session(CompileOptions::default());
        session.compile(FILE, &counter()).unwrap();
        drop(session);

        assert_eq!(*seen.lock().unwrap(), vec![vec!["Counter".to_string()]]);
    }

    #[test]
    fn test_compile_all_matches_single_compiles() {
        let files = vec![
            ("a.js".to_string(), counter()),
            (
                "b.js".to_string(),
                Program {
                    body: vec![view("B", vec![expr(el("div", vec![], vec![]))])],
                },
            ),
            (
                "c.js".to_string(),
                Program {
                    body: vec![view("C", vec![view("D", vec![])])],
                },
            ),
        ];
        let session = Session::new(CompileOptions::default());
        let results = session.compile_all(&files);

        assert_eq!(results.len(), 3);
        for ((file, program), result) in files.iter().zip(&results) {
            let single = session.compile(file, program);
            match (result, single) {
                (Ok(parallel), Ok(single)) => assert_eq!(parallel.code, single.code),
                (Err(parallel), Err(single)) => assert_eq!(*parallel, single),
                _ => panic!("{} compiled differently in parallel", file),
            }
        }
        assert!(results[2].is_err());
    }

    #[test]
    fn test_options_from_json() {
        let options =
            CompileOptions::from_json(r##"{"selectorPrefix": "#root ", "production": true}"##)
                .unwrap();
        assert_eq!(options.selector_prefix.as_deref(), Some("#root "));
        assert!(options.production);
        assert!(options.theme);
        assert_eq!(options.theme_key, "theme");
        assert_eq!(options.meta_window_ms, 100);

        assert!(CompileOptions::from_json(r#"{"production": "yes"}"#).is_err());
    }

    #[test]
    fn test_relative_paths() {
        let options = CompileOptions {
            base_path: Some("/repo".to_string()),
            ..CompileOptions::default()
        };
        assert_eq!(options.relative_path("/repo/src/a.js"), "src/a.js");
        assert_eq!(options.relative_path("/elsewhere/a.js"), "/elsewhere/a.js");
        assert_eq!(CompileOptions::default().relative_path("src/a.js"), "src/a.js");
    }

    #[test]
    fn test_program_round_trips_through_json() {
        let json = json!({
            "body": [{
                "type": "view",
                "name": "A",
                "body": [{
                    "type": "variable",
                    "kind": "let",
                    "declarations": [{
                        "id": { "type": "identifier", "name": "n" },
                        "init": { "type": "literal", "value": 1.0 }
                    }]
                }]
            }]
        });
        let program: Program = serde_json::from_value(json).unwrap();
        let output = compile_program(FILE, &program, CompileOptions::default()).unwrap();
        assert_eq!(
            squash(&output.code),
            squash(r#"Runtime.registerView("A", function (view, $) { let n = view.declareState("n", 1); });"#)
        );
    }
}
