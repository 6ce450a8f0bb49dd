//! Arbitrary-precision rational number arithmetic
//!
//! Exact arithmetic for numeric literals and everything derived from them
//! until an operation forces a float approximation.

use num_bigint::BigInt;
use num_integer::Roots;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;

/// Arbitrary-precision rational number
///
/// Wraps num-rational's BigRational. Always kept in lowest terms with a
/// positive denominator.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fraction {
    inner: BigRational,
}

impl Fraction {
    /// Create a Fraction from a single integer
    pub fn from_int(n: i64) -> Self {
        Fraction {
            inner: BigRational::from_integer(BigInt::from(n)),
        }
    }

    /// Create from numerator and denominator, `None` when the denominator is zero
    pub fn ratio(num: i64, den: i64) -> Option<Self> {
        Fraction::from_big_ints(BigInt::from(num), BigInt::from(den))
    }

    /// Create from BigInt numerator and denominator
    pub fn from_big_ints(num: BigInt, den: BigInt) -> Option<Self> {
        if den.is_zero() {
            return None;
        }
        Some(Fraction {
            inner: BigRational::new(num, den),
        })
    }

    /// Create from BigRational directly
    pub fn from_big_rational(r: BigRational) -> Self {
        Fraction { inner: r }
    }

    /// Get the underlying BigRational
    pub fn as_big_rational(&self) -> &BigRational {
        &self.inner
    }

    /// Parse an exact decimal literal such as `"12"`, `"1.25"`, `".5"` or `"3e-2"`.
    ///
    /// No sign, no surrounding whitespace. Returns `None` for anything else.
    pub fn from_decimal_str(text: &str) -> Option<Self> {
        let (mantissa, exponent) = match text.find(|c: char| c == 'e' || c == 'E') {
            Some(pos) => (&text[..pos], text[pos + 1..].parse::<i64>().ok()?),
            None => (text, 0),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return None;
        }

        let digits = format!("{}{}", int_part, frac_part);
        let numer: BigInt = digits.parse().ok()?;
        let scale = exponent.checked_sub(frac_part.len() as i64)?;
        let factor = num_traits::pow(BigInt::from(10), usize::try_from(scale.unsigned_abs()).ok()?);

        let inner = if scale >= 0 {
            BigRational::from_integer(numer * factor)
        } else {
            BigRational::new(numer, factor)
        };
        Some(Fraction { inner })
    }

    /// Add two fractions
    pub fn add(&self, other: &Fraction) -> Fraction {
        Fraction {
            inner: &self.inner + &other.inner,
        }
    }

    /// Subtract two fractions
    pub fn sub(&self, other: &Fraction) -> Fraction {
        Fraction {
            inner: &self.inner - &other.inner,
        }
    }

    /// Multiply two fractions
    pub fn mul(&self, other: &Fraction) -> Fraction {
        Fraction {
            inner: &self.inner * &other.inner,
        }
    }

    /// Divide two fractions, `None` on a zero divisor
    pub fn checked_div(&self, other: &Fraction) -> Option<Fraction> {
        if other.inner.is_zero() {
            return None;
        }
        Some(Fraction {
            inner: &self.inner / &other.inner,
        })
    }

    /// Remainder of truncating division (sign follows the dividend)
    pub fn checked_rem(&self, other: &Fraction) -> Option<Fraction> {
        let quotient = self.checked_div(other)?.trunc();
        Some(self.sub(&other.mul(&quotient)))
    }

    /// Negate the fraction
    pub fn neg(&self) -> Fraction {
        Fraction {
            inner: -&self.inner,
        }
    }

    /// Get the absolute value
    pub fn abs(&self) -> Fraction {
        Fraction {
            inner: self.inner.abs(),
        }
    }

    /// Get the reciprocal (1/x), `None` for zero
    pub fn checked_inverse(&self) -> Option<Fraction> {
        if self.inner.is_zero() {
            return None;
        }
        Some(Fraction {
            inner: self.inner.recip(),
        })
    }

    /// Compute self^n for integer n. `None` for zero raised to a negative power.
    pub fn pow_int(&self, n: i64) -> Option<Fraction> {
        if n == 0 {
            return Some(Fraction::from_int(1));
        }

        let mut result = Fraction::from_int(1);
        let mut current = self.clone();
        let mut remaining = n.unsigned_abs();

        // Repeated squaring
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.mul(&current);
            }
            remaining >>= 1;
            if remaining > 0 {
                current = current.mul(&current);
            }
        }

        if n < 0 {
            result.checked_inverse()
        } else {
            Some(result)
        }
    }

    /// Exact n-th root if the root is itself rational
    ///
    /// Even roots of negative numbers are not real and return `None`.
    pub fn nth_root(&self, n: u32) -> Option<Fraction> {
        if n == 0 {
            return None;
        }
        if n == 1 {
            return Some(self.clone());
        }
        if self.inner.is_negative() && n % 2 == 0 {
            return None;
        }

        let numer = self.inner.numer().magnitude();
        let denom = self.inner.denom().magnitude();
        let numer_root = numer.nth_root(n);
        let denom_root = denom.nth_root(n);

        let exact = num_traits::pow(numer_root.clone(), n as usize) == *numer
            && num_traits::pow(denom_root.clone(), n as usize) == *denom;
        if !exact {
            return None;
        }

        let mut root = BigRational::new(BigInt::from(numer_root), BigInt::from(denom_root));
        if self.inner.is_negative() {
            root = -root;
        }
        Some(Fraction { inner: root })
    }

    /// Round toward negative infinity
    pub fn floor(&self) -> Fraction {
        Fraction {
            inner: self.inner.floor(),
        }
    }

    /// Round toward positive infinity
    pub fn ceil(&self) -> Fraction {
        Fraction {
            inner: self.inner.ceil(),
        }
    }

    /// Round to the nearest integer, half-way cases away from zero
    pub fn round(&self) -> Fraction {
        Fraction {
            inner: self.inner.round(),
        }
    }

    /// Round toward zero
    pub fn trunc(&self) -> Fraction {
        Fraction {
            inner: self.inner.trunc(),
        }
    }

    /// Compare this fraction to another
    pub fn compare(&self, other: &Fraction) -> Ordering {
        self.inner.cmp(&other.inner)
    }

    /// Numerator as an i64 if it fits
    pub fn numer_i64(&self) -> Option<i64> {
        self.inner.numer().to_i64()
    }

    /// Denominator as an i64 if it fits
    pub fn denom_i64(&self) -> Option<i64> {
        self.inner.denom().to_i64()
    }

    /// Convert to f64
    pub fn to_f64(&self) -> f64 {
        self.inner.to_f64().unwrap_or(f64::NAN)
    }

    /// Storage size: numerator bits plus denominator bits
    pub fn bits(&self) -> u64 {
        self.inner.numer().bits() + self.inner.denom().bits()
    }

    /// Check if this is a whole number
    pub fn is_integer(&self) -> bool {
        self.inner.is_integer()
    }

    /// Check if this is zero
    pub fn is_zero(&self) -> bool {
        self.inner.is_zero()
    }

    /// Check if this is one
    pub fn is_one(&self) -> bool {
        self.inner.is_one()
    }

    /// Check if this is negative
    pub fn is_negative(&self) -> bool {
        self.inner.is_negative()
    }

    /// Convert to string representation "n/d" or "n" if d=1
    pub fn to_string_repr(&self) -> String {
        let numer = self.inner.numer();
        let denom = self.inner.denom();

        if denom.is_one() {
            numer.to_string()
        } else {
            format!("{}/{}", numer, denom)
        }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Fraction::from_int(0)
    }
}

impl fmt::Debug for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fraction({})", self.to_string_repr())
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_repr())
    }
}

impl From<i64> for Fraction {
    fn from(n: i64) -> Self {
        Fraction::from_int(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(num: i64, den: i64) -> Fraction {
        Fraction::ratio(num, den).unwrap()
    }

    #[test]
    fn test_basic_arithmetic() {
        let a = frac(1, 2);
        let b = frac(1, 4);

        assert_eq!(a.add(&b).to_string_repr(), "3/4");
        assert_eq!(a.sub(&b).to_string_repr(), "1/4");
        assert_eq!(a.mul(&b).to_string_repr(), "1/8");
        assert_eq!(a.checked_div(&b).unwrap().to_string_repr(), "2");
    }

    #[test]
    fn test_zero_denominator() {
        assert!(Fraction::ratio(1, 0).is_none());
        assert!(frac(1, 1).checked_div(&Fraction::default()).is_none());
        assert!(frac(1, 1).checked_rem(&Fraction::default()).is_none());
        assert!(Fraction::default().checked_inverse().is_none());
    }

    #[test]
    fn test_auto_reduction() {
        assert_eq!(frac(2, 4).to_string_repr(), "1/2");
        assert_eq!(frac(6, -9).to_string_repr(), "-2/3");
    }

    #[test]
    fn test_from_decimal_str() {
        assert_eq!(Fraction::from_decimal_str("12").unwrap(), frac(12, 1));
        assert_eq!(Fraction::from_decimal_str("1.25").unwrap(), frac(5, 4));
        assert_eq!(Fraction::from_decimal_str(".5").unwrap(), frac(1, 2));
        assert_eq!(Fraction::from_decimal_str("3.").unwrap(), frac(3, 1));
        assert_eq!(Fraction::from_decimal_str("3e-2").unwrap(), frac(3, 100));
        assert_eq!(Fraction::from_decimal_str("1.5E3").unwrap(), frac(1500, 1));
        assert_eq!(Fraction::from_decimal_str("0.1").unwrap(), frac(1, 10));

        assert!(Fraction::from_decimal_str("").is_none());
        assert!(Fraction::from_decimal_str(".").is_none());
        assert!(Fraction::from_decimal_str("1e").is_none());
        assert!(Fraction::from_decimal_str("-1").is_none());
        assert!(Fraction::from_decimal_str("1.2.3").is_none());
    }

    #[test]
    fn test_big_literal_is_exact() {
        let big = Fraction::from_decimal_str("123456789012345678901234567890").unwrap();
        assert!(big.is_integer());
        assert_eq!(big.to_string_repr(), "123456789012345678901234567890");
    }

    #[test]
    fn test_rem_truncates() {
        assert_eq!(frac(7, 1).checked_rem(&frac(3, 1)).unwrap(), frac(1, 1));
        assert_eq!(frac(-7, 1).checked_rem(&frac(3, 1)).unwrap(), frac(-1, 1));
        assert_eq!(frac(5, 2).checked_rem(&frac(1, 1)).unwrap(), frac(1, 2));
    }

    #[test]
    fn test_pow_int() {
        assert_eq!(frac(2, 1).pow_int(10).unwrap(), frac(1024, 1));
        assert_eq!(frac(2, 3).pow_int(3).unwrap(), frac(8, 27));
        assert_eq!(frac(2, 1).pow_int(-2).unwrap(), frac(1, 4));
        assert_eq!(frac(5, 7).pow_int(0).unwrap(), frac(1, 1));
        assert!(Fraction::default().pow_int(-1).is_none());
    }

    #[test]
    fn test_nth_root() {
        assert_eq!(frac(4, 9).nth_root(2).unwrap(), frac(2, 3));
        assert_eq!(frac(-8, 1).nth_root(3).unwrap(), frac(-2, 1));
        assert_eq!(frac(16, 1).nth_root(4).unwrap(), frac(2, 1));
        assert!(frac(2, 1).nth_root(2).is_none());
        assert!(frac(-4, 1).nth_root(2).is_none());
    }

    #[test]
    fn test_bits() {
        assert_eq!(frac(0, 1).bits(), 1);
        assert_eq!(frac(-255, 1).bits(), 9);
        assert_eq!(frac(3, 4).bits(), 5);
        assert_eq!(frac(2, 1).pow_int(100).unwrap().bits(), 102);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(frac(5, 2).round(), frac(3, 1));
        assert_eq!(frac(-5, 2).round(), frac(-3, 1));
        assert_eq!(frac(7, 3).floor(), frac(2, 1));
        assert_eq!(frac(-7, 3).floor(), frac(-3, 1));
        assert_eq!(frac(7, 3).ceil(), frac(3, 1));
        assert_eq!(frac(-7, 3).trunc(), frac(-2, 1));
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(frac(3, 4).to_f64(), 0.75);
        assert_eq!(frac(-3, 2).to_f64(), -1.5);
    }
}
