//! Integration tests for the combinator surface
//!
//! These tests exercise rules the way a grammar author writes them: built
//! through the prelude and the builder adapters, run against both push-fed
//! and reader-backed streams, and rendered to JSON where tree shape
//! matters.

use pegstream::prelude::*;
use std::io;

fn feed(text: &str) -> TextStream {
    let mut stream = TextStream::push_mode();
    stream.write_tail(text.as_bytes()).unwrap();
    stream
}

// ============================================================================
// Builder Adapters
// ============================================================================

#[test]
fn test_map_transforms_ast_only() {
    let number = digits(1).map(|token| token.text.parse::<i64>().unwrap());
    let mut input = feed("  1234 rest");

    let result = number.parse(&mut input).unwrap();
    assert_eq!(result.ast, 1234);
    // the span is the inner rule's span, untouched by the mapping
    assert_eq!(result.start, Position::new(1, 2));
    assert_eq!(result.end, Position::new(1, 5));
}

#[test]
fn test_opt_adapter_in_sequence() {
    let signed = seq(3, (lit(1, "-").opt(2), digits(4)));

    let mut negative = feed("-12");
    let result = signed.parse(&mut negative).unwrap();
    assert!(result.ast.items.0.value.is_some());
    assert_eq!(result.ast.items.1.text, "12");

    let mut plain = feed("12");
    let result = signed.parse(&mut plain).unwrap();
    assert!(result.ast.items.0.value.is_none());
    assert_eq!(result.start, Position::new(1, 0));
}

#[test]
fn test_star_and_plus_adapters() {
    let mut input = feed("1 2 3 stop");
    let result = digits(1).star(2).parse(&mut input).unwrap();
    assert_eq!(result.ast.items.len(), 3);

    let mut empty = feed("stop");
    assert!(digits(1).star(2).parse(&mut empty).is_ok());
    assert!(digits(1).plus(2).parse(&mut empty).is_err());
    assert_eq!(empty.outstanding_checkpoints(), 0);
}

#[test]
fn test_repeat_adapter_stops_at_max() {
    let mut input = feed("aaaa");
    let result = lit(1, "a").repeat(2, 1, Some(3)).parse(&mut input).unwrap();
    assert_eq!(result.ast.items.len(), 3);
    assert_eq!(input.position(), Position::new(1, 3));
}

// ============================================================================
// Lookahead Guards
// ============================================================================

#[test]
fn test_and_ahead_leaves_guard_unconsumed() {
    let quantity = digits(1).and_ahead(lit(2, "px"));
    let mut input = feed("42 px");

    let result = quantity.parse(&mut input).unwrap();
    assert_eq!(result.ast.text, "42");
    // the unit is still there for the next rule
    let unit = lit(2, "px").parse(&mut input).unwrap();
    assert_eq!(unit.ast.text, "px");
}

#[test]
fn test_and_ahead_failure_restores_everything() {
    let quantity = digits(1).and_ahead(lit(2, "px"));
    let mut input = feed("42 em");

    let failure = quantity.parse(&mut input).unwrap_err();
    assert_eq!(failure.start, Position::new(1, 3));
    assert_eq!(input.position(), Position::new(1, 0));
    assert_eq!(input.outstanding_checkpoints(), 0);
}

#[test]
fn test_not_ahead_blocks_on_guard() {
    let bare_name = identifier(1).not_ahead(lit(2, "("));

    let mut plain = feed("foo + bar");
    assert_eq!(bare_name.parse(&mut plain).unwrap().ast.text, "foo");

    let mut call = feed("foo (1)");
    assert!(bare_name.parse(&mut call).is_err());
    assert_eq!(call.position(), Position::new(1, 0));
}

// ============================================================================
// Positions Across Lines
// ============================================================================

#[test]
fn test_spans_track_lines_and_columns() {
    let rule = seq(3, (lit(1, "if"), digits(2)));
    let mut input = feed("if\n  42");

    let result = rule.parse(&mut input).unwrap();
    assert_eq!(result.start, Position::new(1, 0));
    assert_eq!(result.ast.items.1.start, Position::new(2, 2));
    assert_eq!(result.end, Position::new(2, 3));
}

#[test]
fn test_failure_position_is_printable() {
    let rule = lit(1, "end").complete();
    let mut input = feed("end end");
    let failure = rule.parse(&mut input).unwrap_err();
    assert_eq!(failure.start, Position::new(1, 4));
    assert_eq!(failure.to_string(), "parse failed at line 1, column 4");
}

// ============================================================================
// JSON Rendering
// ============================================================================

#[test]
fn test_nested_tree_dumps_to_json() {
    let list = seq(10, (lit(1, "["), digits(2).star(3), lit(4, "]")));
    let mut input = feed("[1 2 3]");

    let result = list.parse(&mut input).unwrap();
    let value = result.ast.to_json();

    assert_eq!(value["type"], "sequence");
    assert_eq!(value["ruleId"], 10);
    let items = value["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["type"], "repeat");
    assert_eq!(items[1]["items"][0]["text"], "1");
    assert_eq!(items[1]["items"][2]["text"], "3");
    assert_eq!(items[2]["text"], "]");
    assert_eq!(value["end"]["line"], 1);
    assert_eq!(value["end"]["column"], 6);
}

// ============================================================================
// Push-Fed and Reader-Backed Streams Agree
// ============================================================================

#[test]
fn test_push_and_pull_streams_agree() {
    let text = "if 1 2 3 end";
    let rule = || {
        seq(10, (lit(1, "if"), digits(2).star(3), lit(4, "end"))).complete()
    };

    let mut pushed = feed(text);
    let from_push = rule().parse(&mut pushed).unwrap();

    // a tiny buffer forces refills and growth mid-parse
    let reader = io::Cursor::new(text.as_bytes().to_vec());
    let mut pulled = TextStream::from_reader_with(reader, StreamConfig::new(4));
    let from_pull = rule().parse(&mut pulled).unwrap();

    assert_eq!(from_push.start, from_pull.start);
    assert_eq!(from_push.end, from_pull.end);
    assert_eq!(
        from_push.ast.items.1.items.len(),
        from_pull.ast.items.1.items.len()
    );
}
