//! Diagnostic logging
//!
//! Diagnostics go through `DiagnosticLog` so callers decide where lines end
//! up. `ConsoleLog` writes to the browser console under wasm32 and to
//! stdout/stderr natively.

use std::cell::RefCell;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

/// Prefix identifying this module's lines in a shared console
pub const LOG_PREFIX: &str = "equation-wasm:";

/// Sink for line-oriented diagnostics
pub trait DiagnosticLog {
    /// Record one informational line
    fn record(&self, line: &str);

    /// Record one warning line
    fn warn(&self, line: &str) {
        self.record(line);
    }
}

impl<L: DiagnosticLog + ?Sized> DiagnosticLog for &L {
    fn record(&self, line: &str) {
        (**self).record(line);
    }

    fn warn(&self, line: &str) {
        (**self).warn(line);
    }
}

/// Host console logger
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLog;

impl DiagnosticLog for ConsoleLog {
    fn record(&self, line: &str) {
        let line = format!("{} {}", LOG_PREFIX, line);
        #[cfg(target_arch = "wasm32")]
        web_sys::console::log_1(&JsValue::from_str(&line));
        #[cfg(not(target_arch = "wasm32"))]
        println!("{}", line);
    }

    fn warn(&self, line: &str) {
        let line = format!("{} {}", LOG_PREFIX, line);
        #[cfg(target_arch = "wasm32")]
        web_sys::console::warn_1(&JsValue::from_str(&line));
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!("{}", line);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl DiagnosticLog for NullLog {
    fn record(&self, _line: &str) {}
}

/// Keeps lines in memory; warnings are stored with a `WARN ` prefix
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: RefCell<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        MemoryLog::default()
    }

    /// Snapshot of everything recorded so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter_map(|line| line.strip_prefix("WARN ").map(str::to_string))
            .collect()
    }
}

impl DiagnosticLog for MemoryLog {
    fn record(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }

    fn warn(&self, line: &str) {
        self.lines.borrow_mut().push(format!("WARN {}", line));
    }
}
