//! Boundary behavior as seen by a host: only the JSON text is inspected

use equation_wasm::{evaluate_expression, probe_module, Adapter, EquationEngine, MemoryLog};
use serde_json::Value as Json;
use std::time::{Duration, Instant};

fn parse(json: &str) -> serde_json::Map<String, Json> {
    match serde_json::from_str::<Json>(json) {
        Ok(Json::Object(map)) => map,
        other => panic!("expected a JSON object, got {:?} from {}", other, json),
    }
}

fn assert_error(json: &str) -> String {
    let map = parse(json);
    assert_eq!(map.len(), 1, "error shape must have one key: {}", json);
    let message = map["error"].as_str().expect("error must be a string");
    assert!(!message.is_empty());
    message.to_string()
}

fn assert_success(json: &str) -> (String, String) {
    let map = parse(json);
    assert_eq!(map.len(), 2, "success shape must have two keys: {}", json);
    let val = map["val"].as_str().expect("val must be a string");
    let kind = map["type"].as_str().expect("type must be a string");
    assert_eq!(kind.chars().count(), 1);
    (val.to_string(), kind.to_string())
}

#[test]
fn test_simple_sum() {
    let (val, kind) = assert_success(&evaluate_expression("2 + 2"));
    assert_eq!(val, "4");
    assert_eq!(kind, "f");
}

#[test]
fn test_division_by_zero_is_an_error() {
    assert_eq!(assert_error(&evaluate_expression("1 / 0")), "Division by zero");
}

#[test]
fn test_empty_and_blank_input() {
    assert_eq!(assert_error(&evaluate_expression("")), "Expression is empty");
    assert_eq!(assert_error(&evaluate_expression("   ")), "Expression is empty");
}

#[test]
fn test_malformed_input_is_an_error() {
    for input in ["2 +", "(1 + 2", "1 + 2)", "@", "foo(1)", "sqrt(1, 2)", "\"open"] {
        assert_error(&evaluate_expression(input));
    }
}

#[test]
fn test_every_output_has_exactly_one_shape() {
    let inputs = [
        "2 + 2",
        "1 / 0",
        "",
        "sqrt(2)",
        "1 < 2",
        "\"a\" + \"b\"",
        "ln(-1)",
        "10 ^ 100000",
        "((((1))))",
        "not valid at all",
    ];
    for input in inputs {
        let map = parse(&evaluate_expression(input));
        let success = map.contains_key("val") && map.contains_key("type");
        let failure = map.contains_key("error");
        assert!(success != failure, "ambiguous output for {:?}: {:?}", input, map);
    }
}

#[test]
fn test_result_types() {
    assert_eq!(
        assert_success(&evaluate_expression("3 > 2")),
        ("true".to_string(), "b".to_string())
    );
    assert_eq!(
        assert_success(&evaluate_expression("\"ab\" + \"cd\"")),
        ("abcd".to_string(), "s".to_string())
    );
    assert_eq!(assert_success(&evaluate_expression("7 / 2")).0, "3.5");
}

#[test]
fn test_calls_are_independent() {
    let first = evaluate_expression("2 * (3 + 4)");
    let _ = evaluate_expression("1 / 0");
    let _ = evaluate_expression("(");
    assert_eq!(evaluate_expression("2 * (3 + 4)"), first);

    let adapter = Adapter::new();
    assert_eq!(adapter.evaluate("2 * (3 + 4)"), first);
}

#[test]
fn test_deep_nesting_is_reported_not_crashed() {
    let input = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
    assert_error(&evaluate_expression(&input));
}

#[test]
fn test_numbers_outside_f64_range_are_errors() {
    for input in ["10^400 + 1/2", "1e400 + 0.5", "1 / 10^400", "-(10^400) - 1/3"] {
        let message = assert_error(&evaluate_expression(input));
        assert!(message.starts_with("Result is too"), "{}: {}", input, message);
    }
}

#[test]
fn test_large_whole_numbers_keep_every_digit() {
    let (val, kind) = assert_success(&evaluate_expression("10^400"));
    assert_eq!(kind, "f");
    assert_eq!(val.len(), 401);
    assert!(val.starts_with('1') && val[1..].bytes().all(|b| b == b'0'));
}

#[test]
fn test_nested_powers_return_quickly() {
    let inputs = [
        "((10^100)^100)^100",
        "(10^1000)^1000",
        "(10^1000)^300",
        "((2^1000)^16)^16",
        "(10^100)^-100",
    ];
    for input in inputs {
        let started = Instant::now();
        let json = evaluate_expression(input);
        assert!(
            started.elapsed() < Duration::from_secs(2),
            "{} took {:?}",
            input,
            started.elapsed()
        );
        assert!(json.len() < 10_000, "{} produced {} bytes", input, json.len());
        assert_error(&json);
    }
}

#[test]
fn test_probe_sentinel() {
    assert_eq!(probe_module(), 42);
    assert_eq!(probe_module(), 42);
}

#[test]
fn test_diagnostics_are_emitted() {
    let log = MemoryLog::new();
    let adapter = Adapter::with_parts(EquationEngine::new(), &log);

    let json = adapter.evaluate("1 + 1");
    let lines = log.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("1 + 1"));
    assert!(lines[1].contains(&json));
}
