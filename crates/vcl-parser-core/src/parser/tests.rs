#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use super::*;
use pretty_assertions::assert_eq;
use vcl_ast::{Expression, SetOperator, Spanned, Statement};

fn parse_clean(src: &str) -> Program {
    let outcome = Parser::parse_source(src, None);
    assert_eq!(
        outcome.diagnostics,
        vec![],
        "expected a clean parse of {src:?}"
    );
    outcome.program
}

fn sub_body(program: &Program, index: usize) -> &Vec<Statement> {
    match &program.declarations[index] {
        Declaration::Sub { body, .. } => &body.statements,
        other => panic!("declaration {index} is not a sub: {other:?}"),
    }
}

#[test]
fn empty_input_yields_one_missing_version_diagnostic() {
    let outcome = Parser::parse_source("", None);
    assert!(outcome.program.declarations.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("version declaration"));
}

#[test]
fn version_without_semicolon_stops_the_parse() {
    let outcome = Parser::parse_source("vcl 4.0\nimport std;", None);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("';'"));
    assert!(outcome.program.declarations.is_empty());
}

#[test]
fn minimal_program_structure() {
    let program = parse_clean("vcl 4.0;\nimport std;\nsub vcl_recv { std.log(\"hi\"); return (hash); }");
    assert_eq!(&*program.version.as_ref().unwrap().version, "4.0");
    assert_eq!(program.declarations.len(), 2);

    match &program.declarations[0] {
        Declaration::Import { name, alias, .. } => {
            assert_eq!(&*name.name, "std");
            assert!(alias.is_none());
        }
        other => panic!("expected import, got {other:?}"),
    }

    let body = sub_body(&program, 1);
    assert_eq!(body.len(), 2);
    match &body[0] {
        Statement::Expression { expression, .. } => {
            let Expression::Call { callee, args, named_args, .. } = expression else {
                panic!("expected call, got {expression:?}");
            };
            assert_eq!(callee.dotted_path().as_deref(), Some("std.log"));
            assert_eq!(args.len(), 1);
            assert!(named_args.is_empty());
            assert!(matches!(&args[0], Expression::StringLiteral { value, .. } if &**value == "hi"));
        }
        other => panic!("expected expression statement, got {other:?}"),
    }
    match &body[1] {
        Statement::Return { action: Some(Expression::Identifier(ident)), .. } => {
            assert_eq!(&*ident.name, "hash");
        }
        other => panic!("expected return (hash), got {other:?}"),
    }
}

#[test]
fn import_with_alias() {
    let program = parse_clean("vcl 4.0;\nimport directors as lb;");
    match &program.declarations[0] {
        Declaration::Import { name, alias, .. } => {
            assert_eq!(&*name.name, "directors");
            assert_eq!(alias.as_ref().map(|a| &*a.name), Some("lb"));
        }
        other => panic!("expected import, got {other:?}"),
    }
}

#[test]
fn backend_with_inline_probe_literal() {
    let program = parse_clean(
        "vcl 4.0;\nbackend origin {\n  .host = \"origin.example.com\";\n  .port = \"8080\";\n  .probe = { .url = \"/\"; };\n}",
    );
    let Declaration::Backend { name, properties, .. } = &program.declarations[0] else {
        panic!("expected backend");
    };
    assert_eq!(&*name.name, "origin");
    assert_eq!(properties.len(), 3);

    let probe = &properties[2];
    assert_eq!(&*probe.name.name, "probe");
    let Expression::ObjectLiteral { properties: inner, .. } = &probe.value else {
        panic!("expected inline object literal, got {:?}", probe.value);
    };
    assert_eq!(inner.len(), 1);
    assert_eq!(&*inner[0].name.name, "url");
    assert!(matches!(&inner[0].value, Expression::StringLiteral { value, .. } if &**value == "/"));
}

#[test]
fn backend_probe_by_reference() {
    let program = parse_clean("vcl 4.0;\nprobe health { .url = \"/\"; }\nbackend b { .probe = health; }");
    let Declaration::Backend { properties, .. } = &program.declarations[1] else {
        panic!("expected backend");
    };
    assert!(matches!(&properties[0].value, Expression::Identifier(ident) if &*ident.name == "health"));
}

#[test]
fn acl_entries_with_negation_and_mask() {
    let program = parse_clean(
        "vcl 4.0;\nacl trusted {\n  \"10.0.0.0\"/8;\n  ! \"10.0.0.1\";\n  \"localhost\";\n}",
    );
    let Declaration::Acl { entries, .. } = &program.declarations[0] else {
        panic!("expected acl");
    };
    assert_eq!(entries.len(), 3);
    assert_eq!((&*entries[0].address, entries[0].mask, entries[0].negated), ("10.0.0.0", Some(8), false));
    assert_eq!((&*entries[1].address, entries[1].mask, entries[1].negated), ("10.0.0.1", None, true));
    assert_eq!((&*entries[2].address, entries[2].mask, entries[2].negated), ("localhost", None, false));
}

#[test]
fn duration_literal_spans_both_tokens() {
    let src = "vcl 4.0;\nsub vcl_recv { set req.grace = 30s; }";
    let program = parse_clean(src);
    let body = sub_body(&program, 0);
    let Statement::Set { value, .. } = &body[0] else {
        panic!("expected set");
    };
    let Expression::Duration { value: seconds, unit, span } = value else {
        panic!("expected duration, got {value:?}");
    };
    assert_eq!(*seconds, 30.0);
    assert_eq!(&**unit, "s");
    assert_eq!(&src[span.start.offset..span.end.offset], "30s");
}

#[test]
fn duration_requires_adjacency() {
    // `30 s` with a space is a numeral followed by an identifier, not a
    // duration.
    let outcome = Parser::parse_source("vcl 4.0;\nsub vcl_recv { set req.grace = 30 s; }", None);
    assert!(!outcome.diagnostics.is_empty());
}

#[test]
fn fractional_durations_parse() {
    let program = parse_clean("vcl 4.0;\nsub vcl_recv { set req.grace = 2.5h; }");
    let body = sub_body(&program, 0);
    let Statement::Set { value: Expression::Duration { value, unit, .. }, .. } = &body[0] else {
        panic!("expected duration set");
    };
    assert_eq!(*value, 2.5);
    assert_eq!(&**unit, "h");
}

#[test]
fn ipv4_literal_merges_dotted_quads() {
    let program = parse_clean("vcl 4.0;\nsub vcl_recv { if (client.ip == 192.168.0.1) { return (pass); } }");
    let body = sub_body(&program, 0);
    let Statement::If { condition, .. } = &body[0] else {
        panic!("expected if");
    };
    let Expression::Binary { right, .. } = condition else {
        panic!("expected comparison, got {condition:?}");
    };
    assert!(matches!(&**right, Expression::Ip { address, .. } if &**address == "192.168.0.1"));
}

#[test]
fn set_operators_all_parse() {
    let program = parse_clean(
        "vcl 4.0;\nsub vcl_backend_response {\n  set beresp.ttl = 1m;\n  set beresp.ttl += 10s;\n  set beresp.ttl -= 5s;\n  set beresp.ttl *= 2;\n  set beresp.ttl /= 4;\n}",
    );
    let body = sub_body(&program, 0);
    let operators: Vec<SetOperator> = body
        .iter()
        .map(|statement| match statement {
            Statement::Set { operator, .. } => *operator,
            other => panic!("expected set, got {other:?}"),
        })
        .collect();
    assert_eq!(
        operators,
        vec![
            SetOperator::Assign,
            SetOperator::Add,
            SetOperator::Subtract,
            SetOperator::Multiply,
            SetOperator::Divide,
        ]
    );
}

#[test]
fn named_arguments_are_kept_apart_from_positional() {
    let program = parse_clean(
        "vcl 4.1;\nsub vcl_deliver { set resp.http.x = utils.time_format(\"%Y\", time = std.real2time(-1, now)); }",
    );
    let body = sub_body(&program, 0);
    let Statement::Set { value: Expression::Call { args, named_args, .. }, .. } = &body[0] else {
        panic!("expected call on the right-hand side");
    };
    assert_eq!(args.len(), 1);
    assert_eq!(named_args.len(), 1);
    assert_eq!(&*named_args[0].name.name, "time");
}

#[test]
fn duplicate_named_argument_is_a_parse_diagnostic() {
    let outcome = Parser::parse_source(
        "vcl 4.0;\nsub vcl_recv { std.log(fmt = \"a\", fmt = \"b\"); }",
        None,
    );
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("duplicate named argument 'fmt'"));

    // The surviving mapping keeps the first binding; keys stay distinct.
    let body = sub_body(&outcome.program, 0);
    let Statement::Expression { expression: Expression::Call { named_args, .. }, .. } = &body[0]
    else {
        panic!("expected call statement");
    };
    assert_eq!(named_args.len(), 1);
}

#[test]
fn positional_after_named_is_rejected() {
    let outcome = Parser::parse_source(
        "vcl 4.0;\nsub vcl_recv { std.log(fmt = \"a\", \"b\"); }",
        None,
    );
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("positional argument"));
}

#[test]
fn return_requires_parentheses_by_default() {
    let outcome = Parser::parse_source("vcl 4.0;\nsub vcl_recv { return hash; }", None);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("parenthesized"));
}

#[test]
fn bare_return_action_allowed_when_configured() {
    let config = ParserConfig {
        require_parenthesized_return: false,
        ..ParserConfig::default()
    };
    let outcome = Parser::with_config("vcl 4.0;\nsub vcl_recv { return hash; }", None, config).parse();
    assert_eq!(outcome.diagnostics, vec![]);
}

#[test]
fn return_with_call_action() {
    let program = parse_clean("vcl 4.1;\nsub vcl_recv { return (synth(404, \"NF\")); }");
    let body = sub_body(&program, 0);
    let Statement::Return { action: Some(Expression::Call { callee, args, .. }), .. } = &body[0]
    else {
        panic!("expected return with call action");
    };
    assert!(matches!(&**callee, Expression::Identifier(ident) if &*ident.name == "synth"));
    assert_eq!(args.len(), 2);
}

#[test]
fn empty_return_parses() {
    let program = parse_clean("vcl 4.0;\nsub custom { return; }");
    let body = sub_body(&program, 0);
    assert!(matches!(&body[0], Statement::Return { action: None, .. }));
}

#[test]
fn else_if_chain_nests() {
    let program = parse_clean(
        "vcl 4.0;\nsub vcl_recv {\n  if (req.method == \"GET\") { return (hash); }\n  elseif (req.method == \"POST\") { return (pass); }\n  else { return (pipe); }\n}",
    );
    let body = sub_body(&program, 0);
    let Statement::If { else_branch: Some(nested), .. } = &body[0] else {
        panic!("expected if with else branch");
    };
    let Statement::If { else_branch: Some(tail), .. } = &**nested else {
        panic!("elseif should nest as an if, got {nested:?}");
    };
    assert!(matches!(&**tail, Statement::Block(_)));
}

#[test]
fn new_statement_requires_constructor_shape() {
    let program = parse_clean("vcl 4.0;\nimport directors;\nsub vcl_init { new lb = directors.round_robin(); }");
    let body = sub_body(&program, 1);
    let Statement::New { name, constructor, .. } = &body[0] else {
        panic!("expected new statement");
    };
    assert_eq!(&*name.name, "lb");
    let Expression::Call { callee, .. } = constructor else {
        panic!("constructor must be a call");
    };
    assert_eq!(callee.dotted_path().as_deref(), Some("directors.round_robin"));

    let outcome = Parser::parse_source("vcl 4.0;\nsub vcl_init { new x = 5; }", None);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("constructor call"));
}

#[test]
fn synthetic_and_error_statements() {
    let program = parse_clean(
        "vcl 4.0;\nsub vcl_synth { synthetic (\"body\"); }\nsub vcl_recv { error 503 \"down\"; }",
    );
    let synth_body = sub_body(&program, 0);
    assert!(matches!(&synth_body[0], Statement::Synthetic { .. }));

    let recv_body = sub_body(&program, 1);
    let Statement::Error { status: Some(status), body: Some(body), .. } = &recv_body[0] else {
        panic!("expected error with status and body");
    };
    assert!(matches!(status, Expression::Integer { value: 503, .. }));
    assert!(matches!(body, Expression::StringLiteral { value, .. } if &**value == "down"));
}

#[test]
fn inline_source_statement_keeps_inner_text() {
    let program = parse_clean("vcl 4.0;\nsub vcl_recv { C{ syslog(LOG_INFO, \"x\"); }C }");
    let body = sub_body(&program, 0);
    let Statement::InlineSource { source, .. } = &body[0] else {
        panic!("expected inline source statement");
    };
    assert_eq!(&**source, " syslog(LOG_INFO, \"x\"); ");
}

#[test]
fn inline_source_can_be_rejected() {
    let config = ParserConfig { reject_inline_source: true, ..ParserConfig::default() };
    let outcome = Parser::with_config("vcl 4.0;\nsub vcl_recv { C{ x }C }", None, config).parse();
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(outcome.diagnostics[0].message.contains("inline source"));
}

#[test]
fn action_keywords_demote_to_identifiers() {
    // `pass` and `pipe` are action keywords, still fine as backend names
    // and call targets.
    let program = parse_clean("vcl 4.0;\nbackend pass { .host = \"h\"; }\nsub vcl_recv { call pipe; }");
    assert_eq!(program.declarations.len(), 2);
    let body = sub_body(&program, 1);
    assert!(matches!(&body[0], Statement::Call { target, .. } if &*target.name == "pipe"));
}

#[test]
fn operator_precedence_binds_multiplication_tighter() {
    let program = parse_clean("vcl 4.0;\nsub vcl_recv { set req.ttl = 1 + 2 * 3; }");
    let body = sub_body(&program, 0);
    let Statement::Set { value: Expression::Binary { operator, right, .. }, .. } = &body[0] else {
        panic!("expected binary set value");
    };
    assert_eq!(*operator, vcl_ast::BinaryOperator::Add);
    assert!(matches!(
        &**right,
        Expression::Binary { operator: vcl_ast::BinaryOperator::Multiply, .. }
    ));
}

#[test]
fn logical_operators_and_regex_match() {
    let program = parse_clean(
        "vcl 4.0;\nsub vcl_recv { if (req.url ~ \"^/api\" && req.method == \"GET\" || !req.http.cookie) { return (pass); } }",
    );
    let body = sub_body(&program, 0);
    let Statement::If { condition, .. } = &body[0] else {
        panic!("expected if");
    };
    // Top level is ||, left side is &&.
    let Expression::Binary { operator: vcl_ast::BinaryOperator::Or, left, .. } = condition else {
        panic!("expected || at the top, got {condition:?}");
    };
    assert!(matches!(
        &**left,
        Expression::Binary { operator: vcl_ast::BinaryOperator::And, .. }
    ));
}

#[test]
fn max_errors_bounds_the_diagnostic_count() {
    // Each broken `sub ;` costs one diagnostic before resynchronizing on
    // the next declaration keyword.
    let src = format!("vcl 4.0;\n{}", "sub ;\n".repeat(20));
    let config = ParserConfig { max_errors: 3, ..ParserConfig::default() };
    let outcome = Parser::with_config(&src, None, config).parse();
    assert_eq!(outcome.diagnostics.len(), 3);

    let unlimited = ParserConfig { max_errors: 0, ..ParserConfig::default() };
    let outcome = Parser::with_config(&src, None, unlimited).parse();
    assert_eq!(outcome.diagnostics.len(), 20);
}

#[test]
fn unknown_top_level_token_resyncs_to_next_declaration() {
    let outcome = Parser::parse_source("vcl 4.0;\n12345;\nsub vcl_recv { return (hash); }", None);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.program.declarations.len(), 1);
    assert!(matches!(&outcome.program.declarations[0], Declaration::Sub { .. }));
}

#[test]
fn node_spans_relocate_in_source() {
    let src = "vcl 4.0;\nsub vcl_recv { set req.http.host = \"example.com\"; }";
    let program = parse_clean(src);
    let declaration = &program.declarations[0];
    let span = declaration.span();
    assert_eq!(
        &src[span.start.offset..span.end.offset],
        "sub vcl_recv { set req.http.host = \"example.com\"; }"
    );
    assert!(span.start.offset <= span.end.offset);
    assert!(span.end.offset <= src.len());
}

#[test]
fn comments_are_skipped_everywhere() {
    let program = parse_clean(
        "vcl 4.0;\n# leading comment\nsub vcl_recv { // trailing\n  /* inline */ return (hash);\n}",
    );
    assert_eq!(program.declarations.len(), 1);
    assert_eq!(sub_body(&program, 0).len(), 1);
}

#[test]
fn unterminated_string_surfaces_as_lex_diagnostic() {
    let outcome = Parser::parse_source("vcl 4.0;\nsub vcl_recv { std.log(\"oops); }", None);
    assert!(
        outcome
            .diagnostics
            .iter()
            .any(|d| d.stage == vcl_error::Stage::Lex && d.message.contains("unterminated string"))
    );
}
