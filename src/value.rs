//! Runtime value type for the equation engine
//!
//! Numbers are held as an exact rational (Fraction) for as long as possible
//! and degrade to an f64 approximation once an operation cannot stay exact,
//! e.g. `2^(1/12)` or `sin(1)`. Booleans and strings come from comparison
//! operators and string literals.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fraction::Fraction;
use std::cmp::Ordering;
use std::fmt;

/// Whole numbers wider than this are not rendered as text (about 4900 digits)
pub const MAX_TEXT_BITS: u64 = 16_384;

/// Type tag reported to the host for numeric results
pub const TAG_NUMBER: char = 'f';
/// Type tag reported to the host for boolean results
pub const TAG_BOOL: char = 'b';
/// Type tag reported to the host for string results
pub const TAG_STRING: char = 's';

/// A value produced while evaluating an expression
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Exact rational number (no precision loss)
    Rational(Fraction),
    /// Irrational number (f64 approximation, always finite)
    Irrational(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Create an exact integer value
    pub fn from_int(n: i64) -> Value {
        Value::Rational(Fraction::from_int(n))
    }

    /// Wrap a float result, rejecting NaN and infinities
    pub fn float(v: f64, op: &'static str) -> Result<Value, EngineError> {
        if v.is_nan() {
            Err(EngineError::NotANumber { op })
        } else if v.is_infinite() {
            Err(EngineError::Overflow { op })
        } else {
            Ok(Value::Irrational(v))
        }
    }

    /// f64 approximation of an exact value that has grown too large to keep
    ///
    /// A nonzero value that rounds to zero is an underflow, not a zero.
    pub fn approximate(f: &Fraction, op: &'static str) -> Result<Value, EngineError> {
        let v = f.to_f64();
        if v == 0.0 && !f.is_zero() {
            return Err(EngineError::Underflow { op });
        }
        Value::float(v, op)
    }

    /// Check if this value is an exact rational
    pub fn is_rational(&self) -> bool {
        matches!(self, Value::Rational(_))
    }

    /// Check if this value is a float approximation
    pub fn is_irrational(&self) -> bool {
        matches!(self, Value::Irrational(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Rational(_) | Value::Irrational(_))
    }

    /// Human-readable kind, used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Rational(_) | Value::Irrational(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
        }
    }

    /// Single-character classifier reported alongside the value
    pub fn type_tag(&self) -> char {
        match self {
            Value::Rational(_) | Value::Irrational(_) => TAG_NUMBER,
            Value::Bool(_) => TAG_BOOL,
            Value::Str(_) => TAG_STRING,
        }
    }

    /// Text form reported to the host
    ///
    /// Whole rationals keep every digit up to `MAX_TEXT_BITS`; other numbers
    /// use the shortest f64 text that round-trips. Fails when that text would
    /// not be a faithful number: too many digits, outside the f64 range, or a
    /// nonzero value that rounds to zero.
    pub fn to_text(&self) -> Result<String, EngineError> {
        match self {
            Value::Rational(f) if f.is_integer() => {
                if f.bits() > MAX_TEXT_BITS {
                    return Err(EngineError::ResultTooLarge);
                }
                Ok(f.to_string_repr())
            }
            Value::Rational(f) => {
                let v = f.to_f64();
                if !v.is_finite() {
                    Err(EngineError::ResultTooLarge)
                } else if v == 0.0 {
                    Err(EngineError::ResultTooSmall)
                } else {
                    Ok(format!("{}", v))
                }
            }
            Value::Irrational(v) => Ok(format!("{}", v)),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Str(s) => Ok(s.clone()),
        }
    }

    /// Numeric view of this value, or a type error naming `op`
    pub fn as_f64(&self, op: &'static str) -> Result<f64, EngineError> {
        match self {
            Value::Rational(f) => Ok(f.to_f64()),
            Value::Irrational(v) => Ok(*v),
            other => Err(EngineError::TypeMismatch {
                op,
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Boolean view of this value, or a type error naming `op`
    pub fn as_bool(&self, op: &'static str) -> Result<bool, EngineError> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(EngineError::TypeMismatch {
                op,
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Add two values (concatenates two strings)
    pub fn add(&self, other: &Value) -> Result<Value, EngineError> {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => Ok(Value::Rational(a.add(b))),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
            // Any irrational operand makes the result irrational
            _ => {
                let (a, b) = numbers("+", self, other)?;
                Value::float(a + b, "+")
            }
        }
    }

    /// Subtract two values
    pub fn sub(&self, other: &Value) -> Result<Value, EngineError> {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => Ok(Value::Rational(a.sub(b))),
            _ => {
                let (a, b) = numbers("-", self, other)?;
                Value::float(a - b, "-")
            }
        }
    }

    /// Multiply two values
    pub fn mul(&self, other: &Value) -> Result<Value, EngineError> {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => Ok(Value::Rational(a.mul(b))),
            _ => {
                let (a, b) = numbers("*", self, other)?;
                Value::float(a * b, "*")
            }
        }
    }

    /// Divide two values
    pub fn div(&self, other: &Value) -> Result<Value, EngineError> {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => a
                .checked_div(b)
                .map(Value::Rational)
                .ok_or(EngineError::DivisionByZero),
            _ => {
                let (dividend, divisor) = numbers("/", self, other)?;
                if divisor == 0.0 {
                    return Err(EngineError::DivisionByZero);
                }
                Value::float(dividend / divisor, "/")
            }
        }
    }

    /// Remainder of truncating division
    pub fn rem(&self, other: &Value) -> Result<Value, EngineError> {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => a
                .checked_rem(b)
                .map(Value::Rational)
                .ok_or(EngineError::DivisionByZero),
            _ => {
                let (dividend, divisor) = numbers("%", self, other)?;
                if divisor == 0.0 {
                    return Err(EngineError::DivisionByZero);
                }
                Value::float(dividend % divisor, "%")
            }
        }
    }

    /// Negate the value
    pub fn neg(&self) -> Result<Value, EngineError> {
        match self {
            Value::Rational(f) => Ok(Value::Rational(f.neg())),
            Value::Irrational(v) => Ok(Value::Irrational(-v)),
            other => Err(EngineError::TypeMismatch {
                op: "unary -",
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Power operation
    ///
    /// Stays exact when possible:
    /// - 2^3 = 8 (rational)
    /// - 4^(1/2) = 2 (rational, perfect square root)
    /// - 2^(1/12) = irrational
    ///
    /// Exponents larger than `max_exact_exponent` in magnitude, and powers
    /// whose exact result could exceed `max_exact_bits`, are computed in
    /// floating point.
    pub fn pow(&self, exponent: &Value, config: &EngineConfig) -> Result<Value, EngineError> {
        if let (Value::Rational(base), Value::Rational(exp)) = (self, exponent) {
            if let Some(result) = try_rational_power(base, exp, config)? {
                return Ok(Value::Rational(result));
            }
        }

        let (base, exp) = numbers("^", self, exponent)?;
        if base == 0.0 && exp < 0.0 {
            return Err(EngineError::DivisionByZero);
        }
        let result = base.powf(exp);
        if result == 0.0 && base != 0.0 {
            return Err(EngineError::Underflow { op: "^" });
        }
        Value::float(result, "^")
    }

    /// Order two numbers or two strings
    pub fn compare(&self, other: &Value, op: &'static str) -> Result<Ordering, EngineError> {
        match (self, other) {
            (Value::Rational(a), Value::Rational(b)) => Ok(a.compare(b)),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            _ => {
                let (a, b) = numbers(op, self, other)?;
                Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
            }
        }
    }

    /// Equality between values of the same kind
    pub fn equals(&self, other: &Value, op: &'static str) -> Result<bool, EngineError> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            _ => Ok(self.compare(other, op)? == Ordering::Equal),
        }
    }
}

/// Numeric views of both operands of a binary operator
fn numbers(op: &'static str, left: &Value, right: &Value) -> Result<(f64, f64), EngineError> {
    match (left, right) {
        (
            Value::Rational(_) | Value::Irrational(_),
            Value::Rational(_) | Value::Irrational(_),
        ) => Ok((left.as_f64(op)?, right.as_f64(op)?)),
        _ => Err(EngineError::TypeMismatch {
            op,
            found: format!("{} and {}", left.type_name(), right.type_name()),
        }),
    }
}

/// Try to compute base^(num/den) as a rational
///
/// `Ok(None)` means the result is irrational or too large to compute exactly.
fn try_rational_power(
    base: &Fraction,
    exp: &Fraction,
    config: &EngineConfig,
) -> Result<Option<Fraction>, EngineError> {
    let (exp_num, exp_den) = match (exp.numer_i64(), exp.denom_i64()) {
        (Some(n), Some(d)) => (n, d),
        _ => return Ok(None),
    };

    let magnitude = exp_num.unsigned_abs();
    if magnitude > config.max_exact_exponent {
        return Ok(None);
    }
    // base^p needs at most bits(base) * |p| bits
    if base.bits().saturating_mul(magnitude) > config.max_exact_bits {
        return Ok(None);
    }

    // base^(p/q) = (base^p)^(1/q)
    let powered = base.pow_int(exp_num).ok_or(EngineError::DivisionByZero)?;
    if exp_den == 1 {
        return Ok(Some(powered));
    }

    let root = u32::try_from(exp_den).ok().and_then(|q| powered.nth_root(q));
    Ok(root)
}

impl Default for Value {
    fn default() -> Self {
        Value::from_int(0)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Rational(frac) => write!(f, "Rational({})", frac),
            Value::Irrational(v) => write!(f, "Irrational({})", v),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Str(s) => write!(f, "Str({:?})", s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Rational(frac) => write!(f, "{}", frac),
            Value::Irrational(v) => write!(f, "{}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<Fraction> for Value {
    fn from(f: Fraction) -> Self {
        Value::Rational(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> EngineConfig {
        EngineConfig::default()
    }

    fn text(value: &Value) -> String {
        value.to_text().unwrap()
    }

    fn rational(num: i64, den: i64) -> Value {
        Value::Rational(Fraction::ratio(num, den).unwrap())
    }

    #[test]
    fn test_rational_operations() {
        let a = rational(1, 2);
        let b = rational(1, 4);

        let sum = a.add(&b).unwrap();
        assert!(sum.is_rational());
        assert_eq!(text(&sum), "0.75");

        let prod = a.mul(&b).unwrap();
        assert!(prod.is_rational());
        assert_eq!(text(&prod), "0.125");
    }

    #[test]
    fn test_irrational_contamination() {
        let result = rational(2, 1).add(&Value::Irrational(std::f64::consts::PI)).unwrap();
        assert!(result.is_irrational());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            Value::from_int(1).div(&Value::from_int(0)),
            Err(EngineError::DivisionByZero)
        );
        assert_eq!(
            Value::Irrational(1.5).div(&Value::from_int(0)),
            Err(EngineError::DivisionByZero)
        );
        assert_eq!(
            Value::from_int(1).rem(&Value::from_int(0)),
            Err(EngineError::DivisionByZero)
        );
    }

    #[test]
    fn test_string_concat_and_mismatch() {
        let joined = Value::Str("ab".into()).add(&Value::Str("cd".into())).unwrap();
        assert_eq!(joined, Value::Str("abcd".into()));

        let err = Value::Str("ab".into()).add(&Value::from_int(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Operator '+' cannot be applied to string and number"
        );
        assert!(Value::Bool(true).neg().is_err());
    }

    #[test]
    fn test_integer_power() {
        let result = Value::from_int(2).pow(&Value::from_int(3), &limits()).unwrap();
        assert!(result.is_rational());
        assert_eq!(text(&result), "8");
    }

    #[test]
    fn test_perfect_roots_stay_rational() {
        let result = Value::from_int(4).pow(&rational(1, 2), &limits()).unwrap();
        assert!(result.is_rational());
        assert_eq!(text(&result), "2");

        let result = Value::from_int(-8).pow(&rational(1, 3), &limits()).unwrap();
        assert_eq!(text(&result), "-2");
    }

    #[test]
    fn test_imperfect_square_root() {
        let result = Value::from_int(2).pow(&rational(1, 2), &limits()).unwrap();
        assert!(result.is_irrational());
        assert!((result.as_f64("^").unwrap() - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_negative_base_fractional_exponent() {
        let err = Value::from_int(-4).pow(&rational(1, 2), &limits()).unwrap_err();
        assert_eq!(err, EngineError::NotANumber { op: "^" });
    }

    #[test]
    fn test_zero_to_negative_power() {
        assert_eq!(
            Value::from_int(0).pow(&Value::from_int(-1), &limits()),
            Err(EngineError::DivisionByZero)
        );
    }

    #[test]
    fn test_large_exponent_falls_back_to_float() {
        let result = Value::from_int(2).pow(&Value::from_int(2000), &limits());
        assert_eq!(result, Err(EngineError::Overflow { op: "^" }));

        let result = rational(1, 2).pow(&Value::from_int(2000), &limits());
        assert_eq!(result, Err(EngineError::Underflow { op: "^" }));

        let result = rational(1, 2).pow(&Value::from_int(1000), &limits()).unwrap();
        assert!(result.is_rational());
    }

    #[test]
    fn test_nested_power_size_is_bounded() {
        // (10^100)^100 would need about 33000 bits exactly
        let googol = Value::from_int(10).pow(&Value::from_int(100), &limits()).unwrap();
        assert!(googol.is_rational());
        assert_eq!(
            googol.pow(&Value::from_int(100), &limits()),
            Err(EngineError::Overflow { op: "^" })
        );
        assert_eq!(
            googol.pow(&Value::from_int(-100), &limits()),
            Err(EngineError::Underflow { op: "^" })
        );

        let tight = EngineConfig::default().with_max_exact_bits(64);
        let result = Value::from_int(3).pow(&Value::from_int(40), &tight).unwrap();
        assert!(result.is_irrational());
        let expected = 3f64.powi(40);
        assert!((result.as_f64("^").unwrap() - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_text_outside_f64_range_is_rejected() {
        let huge = Value::from_int(10).pow(&Value::from_int(400), &limits()).unwrap();
        assert_eq!(text(&huge).len(), 401);

        let huge_fraction = huge.add(&rational(1, 2)).unwrap();
        assert_eq!(huge_fraction.to_text(), Err(EngineError::ResultTooLarge));

        let tiny = Value::from_int(1).div(&huge).unwrap();
        assert!(tiny.is_rational());
        assert_eq!(tiny.to_text(), Err(EngineError::ResultTooSmall));

        let wide = Value::from_int(2).pow(&Value::from_int(1000), &limits()).unwrap();
        let widest = wide.pow(&Value::from_int(16), &limits()).unwrap();
        assert!(widest.is_rational());
        assert!(text(&widest).len() > 4800);
        let too_wide = widest.mul(&wide).unwrap();
        assert!(too_wide.is_rational());
        assert_eq!(too_wide.to_text(), Err(EngineError::ResultTooLarge));
    }

    #[test]
    fn test_approximate() {
        let third = Fraction::ratio(1, 3).unwrap();
        let approx = Value::approximate(&third, "*").unwrap();
        assert!((approx.as_f64("*").unwrap() - 1.0 / 3.0).abs() < 1e-15);

        let tiny = Fraction::from_int(10).pow_int(-400).unwrap();
        assert_eq!(
            Value::approximate(&tiny, "*"),
            Err(EngineError::Underflow { op: "*" })
        );
        assert_eq!(
            Value::approximate(&Fraction::from_int(0), "*").unwrap(),
            Value::Irrational(0.0)
        );
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            rational(1, 3).compare(&rational(1, 2), "<").unwrap(),
            Ordering::Less
        );
        assert!(Value::from_int(2)
            .equals(&Value::Irrational(2.0), "==")
            .unwrap());
        assert!(Value::Bool(true).equals(&Value::Bool(true), "==").unwrap());
        assert!(Value::Bool(true).compare(&Value::Bool(false), "<").is_err());
        assert!(Value::Str("a".into()).equals(&Value::from_int(1), "==").is_err());
    }

    #[test]
    fn test_text_and_tags() {
        assert_eq!(text(&Value::from_int(4)), "4");
        assert_eq!(text(&rational(1, 3)), "0.3333333333333333");
        assert_eq!(text(&Value::Irrational(2.5)), "2.5");
        assert_eq!(text(&Value::Bool(false)), "false");
        assert_eq!(text(&Value::Str("hi".into())), "hi");

        assert_eq!(Value::from_int(4).type_tag(), 'f');
        assert_eq!(Value::Irrational(0.1).type_tag(), 'f');
        assert_eq!(Value::Bool(true).type_tag(), 'b');
        assert_eq!(Value::Str(String::new()).type_tag(), 's');
    }

    #[test]
    fn test_float_rejects_non_finite() {
        assert_eq!(
            Value::float(f64::NAN, "sqrt"),
            Err(EngineError::NotANumber { op: "sqrt" })
        );
        assert_eq!(
            Value::float(f64::INFINITY, "exp"),
            Err(EngineError::Overflow { op: "exp" })
        );
    }
}
