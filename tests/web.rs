//! Browser-side checks, run with `wasm-pack test --headless --chrome`

#![cfg(target_arch = "wasm32")]

use equation_wasm::{
    evaluate_expression, evaluate_expression_value, probe_module, ErrorPayload, EvaluationOutcome,
};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn evaluates_to_json_string() {
    assert_eq!(evaluate_expression("2 + 2"), r#"{"val":"4","type":"f"}"#);
    assert_eq!(evaluate_expression("1 / 0"), r#"{"error":"Division by zero"}"#);
}

#[wasm_bindgen_test]
fn evaluates_to_js_object() {
    let value = evaluate_expression_value("2 + 2");
    assert!(value.is_object());

    let outcome: EvaluationOutcome = serde_wasm_bindgen::from_value(value).unwrap();
    assert_eq!(outcome.into_result().unwrap().val, "4");
}

#[wasm_bindgen_test]
fn error_object_has_message() {
    let outcome: EvaluationOutcome =
        serde_wasm_bindgen::from_value(evaluate_expression_value("")).unwrap();
    assert_eq!(
        outcome,
        EvaluationOutcome::Failure(ErrorPayload::new("Expression is empty"))
    );
}

#[wasm_bindgen_test]
fn probe_reports_responsive() {
    assert_eq!(probe_module(), 42);
}
