//! Engine limits
//!
//! The engine reads no files or environment variables. Hosts that need
//! different bounds build an `EngineConfig` and pass it to
//! `EquationEngine::with_config`.

/// Resource bounds applied to every evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of values on the evaluation stack
    pub max_stack_size: usize,
    /// Maximum nesting of parentheses, unary operators and function calls
    pub max_nesting_depth: usize,
    /// Largest integer exponent magnitude computed exactly; larger powers use f64
    pub max_exact_exponent: u64,
    /// Largest exact rational kept, in numerator plus denominator bits;
    /// larger results use f64
    pub max_exact_bits: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_stack_size: 1024,
            max_nesting_depth: 128,
            max_exact_exponent: 1024,
            max_exact_bits: 16_384,
        }
    }
}

impl EngineConfig {
    pub fn with_max_stack_size(mut self, max_stack_size: usize) -> Self {
        self.max_stack_size = max_stack_size;
        self
    }

    pub fn with_max_nesting_depth(mut self, max_nesting_depth: usize) -> Self {
        self.max_nesting_depth = max_nesting_depth;
        self
    }

    pub fn with_max_exact_bits(mut self, max_exact_bits: u64) -> Self {
        self.max_exact_bits = max_exact_bits;
        self
    }

    pub fn with_max_exact_exponent(mut self, max_exact_exponent: u64) -> Self {
        self.max_exact_exponent = max_exact_exponent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = EngineConfig::default()
            .with_max_stack_size(8)
            .with_max_nesting_depth(4)
            .with_max_exact_bits(64);

        assert_eq!(config.max_stack_size, 8);
        assert_eq!(config.max_nesting_depth, 4);
        assert_eq!(config.max_exact_bits, 64);
        assert_eq!(
            config.max_exact_exponent,
            EngineConfig::default().max_exact_exponent
        );
    }
}
