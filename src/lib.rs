//! Equation WASM - fault-isolating evaluation boundary for browser hosts
//!
//! This crate provides:
//! - Expression evaluation returning a JSON string (`{"val", "type"}` or `{"error"}`)
//! - A liveness probe returning a fixed sentinel integer
//! - The equation engine behind both (text to bytecode, stack-based evaluation,
//!   exact rational arithmetic)
//!
//! No failure inside the engine crosses the boundary as a panic or exception.

use wasm_bindgen::prelude::*;

pub mod adapter;
pub mod bytecode;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod fraction;
pub mod log;
pub mod value;

// Re-export main types for convenience
pub use adapter::{Adapter, ErrorPayload, EvaluationOutcome, ProbeStatus};
pub use compiler::ExpressionCompiler;
pub use config::EngineConfig;
pub use engine::{Engine, EquationEngine, SuccessPayload};
pub use error::EngineError;
pub use evaluator::Evaluator;
pub use fraction::Fraction;
pub use log::{ConsoleLog, DiagnosticLog, MemoryLog, NullLog};
pub use value::Value;

/// Initialize the WASM module
/// Call this once when loading the module to set up panic hooks
#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages
    console_error_panic_hook::set_once();
}

/// Get the version of the equation-wasm library
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Evaluate an expression and return the result as a JSON string
///
/// Always returns exactly one of:
/// - `{"val": "<text>", "type": "<char>"}`
/// - `{"error": "<message>"}`
#[wasm_bindgen]
pub fn evaluate_expression(expression: &str) -> String {
    Adapter::new().evaluate(expression)
}

/// Evaluate an expression and return the result as a plain JS object
///
/// Same shapes as `evaluate_expression`, already parsed. Falls back to the
/// JSON string if the object cannot be built.
#[wasm_bindgen]
pub fn evaluate_expression_value(expression: &str) -> JsValue {
    let outcome = Adapter::new().evaluate_outcome(expression);
    serde_wasm_bindgen::to_value(&outcome)
        .unwrap_or_else(|_| JsValue::from_str(&outcome.to_json()))
}

/// Check that the engine is loaded and answers a trivial expression
///
/// Returns 42 when responsive, -1 otherwise.
#[wasm_bindgen]
pub fn probe_module() -> i32 {
    Adapter::new().probe().code()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_evaluate_expression() {
        assert_eq!(evaluate_expression("2 + 2"), r#"{"val":"4","type":"f"}"#);
        assert_eq!(
            evaluate_expression("1 / 0"),
            r#"{"error":"Division by zero"}"#
        );
    }

    #[test]
    fn test_probe_module() {
        assert_eq!(probe_module(), 42);
    }
}
