//! Evaluation adapter - the fault-isolation boundary
//!
//! Turns every engine outcome, including panics, into one of two JSON shapes:
//!
//! - `{"val": "<text>", "type": "<char>"}` on success
//! - `{"error": "<message>"}` on failure
//!
//! Typed engine failures pass their message through unchanged. Internal engine
//! errors and panics are reported with a fixed generic message.

use crate::engine::{Engine, EquationEngine, SuccessPayload};
use crate::error::EngineError;
use crate::log::{ConsoleLog, DiagnosticLog};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Message used for any failure the engine did not classify
pub const UNKNOWN_FAULT_MESSAGE: &str = "Unknown engine fault occurred";

/// Returned verbatim if serializing an outcome ever fails
const FALLBACK_ERROR_JSON: &str = r#"{"error":"Unknown engine fault occurred"}"#;

/// Fixed expression evaluated by the liveness probe
pub const PROBE_EXPRESSION: &str = "2 + 2";
const PROBE_EXPECTED: &str = "4";

/// Host-facing probe sentinels
pub const PROBE_OK: i32 = 42;
pub const PROBE_FAILED: i32 = -1;

/// Failed evaluation as reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorPayload {
            error: message.into(),
        }
    }

    /// Payload for failures the engine could not classify
    pub fn unknown_fault() -> Self {
        ErrorPayload::new(UNKNOWN_FAULT_MESSAGE)
    }
}

impl From<EngineError> for ErrorPayload {
    fn from(err: EngineError) -> Self {
        if err.is_internal() {
            ErrorPayload::unknown_fault()
        } else {
            ErrorPayload::new(err.to_string())
        }
    }
}

/// Result of one evaluation, serialized without a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationOutcome {
    Success(SuccessPayload),
    Failure(ErrorPayload),
}

impl EvaluationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EvaluationOutcome::Success(_))
    }

    /// Serialize to the host JSON format; never fails
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| FALLBACK_ERROR_JSON.to_string())
    }

    pub fn into_result(self) -> Result<SuccessPayload, ErrorPayload> {
        match self {
            EvaluationOutcome::Success(payload) => Ok(payload),
            EvaluationOutcome::Failure(payload) => Err(payload),
        }
    }
}

impl From<Result<SuccessPayload, ErrorPayload>> for EvaluationOutcome {
    fn from(result: Result<SuccessPayload, ErrorPayload>) -> Self {
        match result {
            Ok(payload) => EvaluationOutcome::Success(payload),
            Err(payload) => EvaluationOutcome::Failure(payload),
        }
    }
}

/// Coarse liveness status of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Responsive,
    Unresponsive,
}

impl ProbeStatus {
    /// Sentinel integer expected by existing hosts
    pub fn code(&self) -> i32 {
        match self {
            ProbeStatus::Responsive => PROBE_OK,
            ProbeStatus::Unresponsive => PROBE_FAILED,
        }
    }
}

/// Boundary between the host and an `Engine`
pub struct Adapter<E = EquationEngine, L = ConsoleLog> {
    engine: E,
    log: L,
}

impl Adapter {
    /// Default engine, logging to the host console
    pub fn new() -> Self {
        Adapter::with_parts(EquationEngine::new(), ConsoleLog)
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Adapter::new()
    }
}

impl<E: Engine, L: DiagnosticLog> Adapter<E, L> {
    pub fn with_parts(engine: E, log: L) -> Self {
        Adapter { engine, log }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Evaluate an expression and return the host JSON string
    pub fn evaluate(&self, expression: &str) -> String {
        self.evaluate_outcome(expression).to_json()
    }

    /// Evaluate an expression, keeping the typed result
    pub fn outcome(&self, expression: &str) -> Result<SuccessPayload, ErrorPayload> {
        self.evaluate_outcome(expression).into_result()
    }

    /// Evaluate an expression and log the input and the outcome
    pub fn evaluate_outcome(&self, expression: &str) -> EvaluationOutcome {
        self.note(&format!("Evaluating expression: {}", expression));

        let outcome = EvaluationOutcome::from(self.run(expression));
        if outcome.is_success() {
            self.note(&format!("Result: {}", outcome.to_json()));
        } else {
            self.warning(&format!("Evaluation failed: {}", outcome.to_json()));
        }
        outcome
    }

    /// Confirm the engine answers a fixed trivial expression
    pub fn probe(&self) -> ProbeStatus {
        self.note("Equation engine module loaded");

        match self.guarded_compute(PROBE_EXPRESSION) {
            Ok(payload) if payload.val == PROBE_EXPECTED => {
                self.note(&format!("Probe ({}) = {}", PROBE_EXPRESSION, payload.val));
                ProbeStatus::Responsive
            }
            Ok(payload) => {
                self.warning(&format!(
                    "Probe failed - ({}) returned {} instead of {}",
                    PROBE_EXPRESSION, payload.val, PROBE_EXPECTED
                ));
                ProbeStatus::Unresponsive
            }
            Err(_) => {
                self.warning("Probe failed - equation engine not working properly");
                ProbeStatus::Unresponsive
            }
        }
    }

    fn run(&self, expression: &str) -> Result<SuccessPayload, ErrorPayload> {
        self.guarded_compute(expression).map_err(|fault| match fault {
            Some(err) if !err.is_internal() => ErrorPayload::from(err),
            _ => {
                self.warning("Unknown engine fault caught");
                ErrorPayload::unknown_fault()
            }
        })
    }

    /// Call the engine with panics contained; `Err(None)` means it panicked
    fn guarded_compute(&self, expression: &str) -> Result<SuccessPayload, Option<EngineError>> {
        match catch_unwind(AssertUnwindSafe(|| self.engine.compute(expression))) {
            Ok(result) => result.map_err(Some),
            Err(_) => Err(None),
        }
    }

    fn note(&self, line: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.log.record(line)));
    }

    fn warning(&self, line: &str) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.log.warn(line)));
    }
}
