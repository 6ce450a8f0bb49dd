//! Equation engine
//!
//! The adapter talks to the engine only through the `Engine` trait, so the
//! boundary layer can be exercised with engines that fail or panic.

use crate::compiler::ExpressionCompiler;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::evaluator::Evaluator;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Successful evaluation as reported to the host: `{"val": "4", "type": "f"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessPayload {
    /// Value rendered as text
    pub val: String,
    /// Single-character type classifier ('f' number, 'b' boolean, 's' string)
    #[serde(rename = "type")]
    pub type_tag: char,
}

impl SuccessPayload {
    /// Describe a value, failing when its text would not be a faithful number
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        Ok(SuccessPayload {
            val: value.to_text()?,
            type_tag: value.type_tag(),
        })
    }
}

/// Something that can evaluate a textual expression
pub trait Engine {
    /// Evaluate `expression` and describe the result
    fn compute(&self, expression: &str) -> Result<SuccessPayload, EngineError>;
}

/// Bytecode-compiling equation engine
///
/// Holds only configuration; every call compiles and evaluates from scratch,
/// so one instance can be reused for any number of sequential calls.
#[derive(Debug, Clone, Default)]
pub struct EquationEngine {
    config: EngineConfig,
}

impl EquationEngine {
    pub fn new() -> Self {
        EquationEngine::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        EquationEngine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile and evaluate an expression
    pub fn calc(&self, expression: &str) -> Result<Value, EngineError> {
        let compiled = ExpressionCompiler::with_config(&self.config).compile(expression)?;
        Evaluator::with_config(&self.config).evaluate(&compiled.bytecode)
    }
}

impl Engine for EquationEngine {
    fn compute(&self, expression: &str) -> Result<SuccessPayload, EngineError> {
        let value = self.calc(expression)?;
        SuccessPayload::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_success_payload() {
        let engine = EquationEngine::new();
        let payload = engine.compute("2 + 2").unwrap();
        assert_eq!(
            payload,
            SuccessPayload {
                val: "4".to_string(),
                type_tag: 'f'
            }
        );
    }

    #[test]
    fn test_payload_serialization() {
        let payload = SuccessPayload {
            val: "3.5".to_string(),
            type_tag: 'f',
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"val":"3.5","type":"f"}"#
        );
    }

    #[test]
    fn test_compute_tags() {
        let engine = EquationEngine::new();
        assert_eq!(engine.compute("1 < 2").unwrap().type_tag, 'b');
        assert_eq!(engine.compute("\"a\" + \"b\"").unwrap().type_tag, 's');
    }

    #[test]
    fn test_unrepresentable_results_are_errors() {
        let engine = EquationEngine::new();
        assert_eq!(
            engine.compute("10^400 + 1/2").unwrap_err(),
            EngineError::ResultTooLarge
        );
        assert_eq!(
            engine.compute("1e400 + 0.5").unwrap_err(),
            EngineError::ResultTooLarge
        );
        assert_eq!(
            engine.compute("1 / 10^400").unwrap_err(),
            EngineError::ResultTooSmall
        );
        assert_eq!(engine.compute("10^400 / 10^399").unwrap().val, "10");
        assert_eq!(engine.compute("10^20").unwrap().val, "100000000000000000000");
    }

    #[test]
    fn test_config_is_applied() {
        let config = EngineConfig::default().with_max_nesting_depth(2);
        let engine = EquationEngine::with_config(config);
        assert_eq!(
            engine.calc("(((1)))").unwrap_err(),
            EngineError::NestingTooDeep { limit: 2 }
        );
        assert!(EquationEngine::new().calc("(((1)))").is_ok());
    }
}
