//! A realistic configuration exercising the whole declaration and
//! statement grammar in one parse.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use pretty_assertions::assert_eq;
use vcl_ast::{Declaration, Expression, Spanned, Statement};
use vcl_parser_core::Parser;

const PROGRAM: &str = r#"vcl 4.1;

import std;
import directors as lb;

# Health probing for the origin pool.
probe health {
    .url = "/healthz";
    .interval = 5s;
    .timeout = 2s;
    .window = 5;
    .threshold = 3;
}

backend origin_a {
    .host = "a.origin.internal";
    .port = "8080";
    .probe = health;
}

backend origin_b {
    .host = "b.origin.internal";
    .port = "8080";
    .probe = { .url = "/"; .interval = 10s; };
}

acl purgers {
    "localhost";
    "10.0.0.0"/8;
    ! "10.0.0.13";
}

sub vcl_init {
    new pool = lb.round_robin();
    return (ok);
}

sub vcl_recv {
    if (req.method == "PURGE") {
        if (client.ip !~ purgers) {
            return (synth(405, "Not allowed"));
        }
        return (purge);
    } else if (req.method != "GET" && req.method != "HEAD") {
        return (pass);
    }

    unset req.http.cookie;
    set req.grace = 30s;
    set req.http.x-forwarded-proto = "https";
    std.log("recv " + req.url);
    return (hash);
}

sub vcl_backend_response {
    set beresp.ttl = 2h;
    set beresp.grace = 1h;
    if (beresp.status >= 500) {
        return (retry);
    }
    return (deliver);
}

sub vcl_deliver {
    set resp.http.x-cache-hits = obj.hits;
    unset resp.http.x-powered-by;
    return (deliver);
}
"#;

fn names(declarations: &[Declaration]) -> Vec<&str> {
    declarations
        .iter()
        .filter_map(|d| d.name().map(|n| &*n.name))
        .collect()
}

#[test]
fn the_whole_grammar_parses_cleanly() {
    let outcome = Parser::parse_source(PROGRAM, None);
    assert_eq!(outcome.diagnostics, vec![]);

    let program = outcome.program;
    assert_eq!(&*program.version.as_ref().unwrap().version, "4.1");
    assert_eq!(
        names(&program.declarations),
        vec![
            "std",
            "lb",
            "health",
            "origin_a",
            "origin_b",
            "purgers",
            "vcl_init",
            "vcl_recv",
            "vcl_backend_response",
            "vcl_deliver",
        ]
    );
}

#[test]
fn every_declaration_span_relocates_its_source_text() {
    let outcome = Parser::parse_source(PROGRAM, None);
    for declaration in &outcome.program.declarations {
        let span = declaration.span();
        assert!(span.start.offset < span.end.offset);
        assert!(span.end.offset <= PROGRAM.len());
        let slice = &PROGRAM[span.start.offset..span.end.offset];
        // Every declaration slice starts with its keyword.
        let keyword = slice.split_whitespace().next().unwrap();
        assert!(
            ["import", "probe", "backend", "acl", "sub"].contains(&keyword),
            "unexpected leading token {keyword:?}"
        );
    }
}

#[test]
fn statement_shapes_survive_in_order() {
    let outcome = Parser::parse_source(PROGRAM, None);
    let Declaration::Sub { body, .. } = &outcome.program.declarations[7] else {
        panic!("expected vcl_recv");
    };

    // if / unset / set / set / expression-call / return, in source order.
    assert_eq!(body.statements.len(), 6);
    assert!(matches!(&body.statements[0], Statement::If { .. }));
    assert!(matches!(&body.statements[1], Statement::Unset { .. }));
    assert!(matches!(&body.statements[2], Statement::Set { .. }));
    assert!(matches!(&body.statements[3], Statement::Set { .. }));
    assert!(matches!(&body.statements[4], Statement::Expression { .. }));
    assert!(matches!(
        &body.statements[5],
        Statement::Return { action: Some(Expression::Identifier(_)), .. }
    ));
}

#[test]
fn string_concatenation_parses_as_addition() {
    let outcome = Parser::parse_source(PROGRAM, None);
    let Declaration::Sub { body, .. } = &outcome.program.declarations[7] else {
        panic!("expected vcl_recv");
    };
    let Statement::Expression { expression: Expression::Call { args, .. }, .. } =
        &body.statements[4]
    else {
        panic!("expected std.log call");
    };
    assert!(matches!(
        &args[0],
        Expression::Binary { operator: vcl_ast::BinaryOperator::Add, .. }
    ));
}

#[test]
fn acl_regex_mismatch_against_an_acl_name() {
    // `client.ip !~ purgers` reads as a NotMatch binary over a member and
    // an identifier.
    let outcome = Parser::parse_source(PROGRAM, None);
    assert_eq!(outcome.diagnostics, vec![]);
    let Declaration::Sub { body, .. } = &outcome.program.declarations[7] else {
        panic!("expected vcl_recv");
    };
    let Statement::If { then_branch, .. } = &body.statements[0] else {
        panic!("expected if");
    };
    let Statement::If { condition, .. } = &then_branch.statements[0] else {
        panic!("expected nested if");
    };
    assert!(matches!(
        condition,
        Expression::Binary { operator: vcl_ast::BinaryOperator::NotMatch, .. }
    ));
}
