//! Stack-based Expression Evaluator
//!
//! Runs bytecode produced by the compiler on a bounded value stack.
//!
//! Values stay exact rationals until an operation forces an f64
//! approximation (see value.rs), or grows past `max_exact_bits` and is
//! replaced by its f64 approximation. Malformed bytecode is reported as
//! `EngineError::Internal`; it can only come from a compiler bug.

use crate::bytecode::{
    read_big_int_signed, read_big_int_unsigned, read_f64, read_i32, read_u16, Func, Op,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fraction::Fraction;
use crate::value::Value;
use std::cmp::Ordering;

fn internal(message: impl Into<String>) -> EngineError {
    EngineError::Internal(message.into())
}

/// Stack-based evaluator for compiled expressions
pub struct Evaluator {
    stack: Vec<Value>,
    /// Stack, exponent and precision limits
    config: EngineConfig,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

impl Evaluator {
    /// Create a new evaluator with default limits
    pub fn new() -> Evaluator {
        Evaluator::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Evaluator {
        Evaluator {
            stack: Vec::with_capacity(32),
            config: config.clone(),
        }
    }

    /// Get current stack size (for debugging)
    pub fn stack_size(&self) -> usize {
        self.stack.len()
    }

    /// Push a value onto the stack
    fn push(&mut self, value: Value) -> Result<(), EngineError> {
        if self.stack.len() >= self.config.max_stack_size {
            return Err(EngineError::StackOverflow {
                limit: self.config.max_stack_size,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    fn pop(&mut self) -> Result<Value, EngineError> {
        self.stack
            .pop()
            .ok_or_else(|| internal("Stack underflow in evaluator"))
    }

    /// Replace an exact result wider than `max_exact_bits` by its f64 value
    fn bounded(&self, value: Value, op: &'static str) -> Result<Value, EngineError> {
        match value {
            Value::Rational(f) if f.bits() > self.config.max_exact_bits => {
                Value::approximate(&f, op)
            }
            other => Ok(other),
        }
    }

    /// Pop two operands, apply `f`, push the bounded result
    fn binary(
        &mut self,
        op: Op,
        f: impl FnOnce(&Value, &Value) -> Result<Value, EngineError>,
    ) -> Result<(), EngineError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = self.bounded(f(&a, &b)?, op.symbol())?;
        self.push(result)
    }

    /// Evaluate a compiled expression
    ///
    /// # Returns
    /// The single value left on the stack
    pub fn evaluate(&mut self, bytecode: &[u8]) -> Result<Value, EngineError> {
        if bytecode.is_empty() {
            return Err(internal("Empty bytecode"));
        }

        self.stack.clear();
        let length = bytecode.len();
        let mut pc = 0;

        while pc < length {
            let op_byte = bytecode[pc];
            pc += 1;

            let op = Op::from_byte(op_byte).ok_or_else(|| {
                internal(format!("Unknown opcode: 0x{:02x} at pc={}", op_byte, pc - 1))
            })?;

            match op {
                Op::LoadConst => {
                    if pc + 8 > length {
                        return Err(internal("Unexpected end of bytecode in LOAD_CONST"));
                    }
                    let num = read_i32(bytecode, pc);
                    pc += 4;
                    let den = read_i32(bytecode, pc);
                    pc += 4;
                    let frac = Fraction::ratio(num as i64, den as i64)
                        .ok_or_else(|| internal("Zero denominator in LOAD_CONST"))?;
                    self.push(Value::Rational(frac))?;
                }

                Op::LoadConstBig => {
                    // Read signed numerator (variable length)
                    let (num, num_bytes) = read_big_int_signed(bytecode, pc)
                        .map_err(|e| internal(format!("Error reading big numerator: {}", e)))?;
                    pc += num_bytes;

                    // Read unsigned denominator (variable length)
                    let (den, den_bytes) = read_big_int_unsigned(bytecode, pc)
                        .map_err(|e| internal(format!("Error reading big denominator: {}", e)))?;
                    pc += den_bytes;

                    let frac = Fraction::from_big_ints(num, den)
                        .ok_or_else(|| internal("Zero denominator in LOAD_CONST_BIG"))?;
                    self.push(Value::Rational(frac))?;
                }

                Op::LoadFloat => {
                    if pc + 8 > length {
                        return Err(internal("Unexpected end of bytecode in LOAD_FLOAT"));
                    }
                    let value = read_f64(bytecode, pc);
                    pc += 8;
                    self.push(Value::Irrational(value))?;
                }

                Op::LoadBool => {
                    if pc + 1 > length {
                        return Err(internal("Unexpected end of bytecode in LOAD_BOOL"));
                    }
                    let value = bytecode[pc] != 0;
                    pc += 1;
                    self.push(Value::Bool(value))?;
                }

                Op::LoadStr => {
                    if pc + 2 > length {
                        return Err(internal("Unexpected end of bytecode in LOAD_STR"));
                    }
                    let len = read_u16(bytecode, pc) as usize;
                    pc += 2;
                    if pc + len > length {
                        return Err(internal("Unexpected end of bytecode in LOAD_STR"));
                    }
                    let text = String::from_utf8(bytecode[pc..pc + len].to_vec())
                        .map_err(|e| internal(format!("Invalid UTF-8 in LOAD_STR: {}", e)))?;
                    pc += len;
                    self.push(Value::Str(text))?;
                }

                Op::Add => self.binary(op, Value::add)?,
                Op::Sub => self.binary(op, Value::sub)?,
                Op::Mul => self.binary(op, Value::mul)?,
                Op::Div => self.binary(op, Value::div)?,
                Op::Mod => self.binary(op, Value::rem)?,

                Op::Pow => {
                    let config = self.config.clone();
                    self.binary(op, |base, exp| base.pow(exp, &config))?;
                }

                Op::Neg => {
                    let a = self.pop()?;
                    self.push(a.neg()?)?;
                }

                Op::Eq | Op::Ne => {
                    let symbol = op.symbol();
                    let negate = op == Op::Ne;
                    self.binary(op, |a, b| Ok(Value::Bool(a.equals(b, symbol)? != negate)))?;
                }

                Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                    let symbol = op.symbol();
                    self.binary(op, |a, b| {
                        let ordering = a.compare(b, symbol)?;
                        let holds = match op {
                            Op::Lt => ordering == Ordering::Less,
                            Op::Le => ordering != Ordering::Greater,
                            Op::Gt => ordering == Ordering::Greater,
                            _ => ordering != Ordering::Less,
                        };
                        Ok(Value::Bool(holds))
                    })?;
                }

                Op::Not => {
                    let a = self.pop()?;
                    self.push(Value::Bool(!a.as_bool("!")?))?;
                }

                Op::And | Op::Or => {
                    let symbol = op.symbol();
                    self.binary(op, |a, b| {
                        let (a, b) = (a.as_bool(symbol)?, b.as_bool(symbol)?);
                        Ok(Value::Bool(if op == Op::And { a && b } else { a || b }))
                    })?;
                }

                Op::Call => {
                    if pc + 2 > length {
                        return Err(internal("Unexpected end of bytecode in CALL"));
                    }
                    let func = Func::from_byte(bytecode[pc]).ok_or_else(|| {
                        internal(format!("Invalid function index: {}", bytecode[pc]))
                    })?;
                    let argc = bytecode[pc + 1] as usize;
                    pc += 2;

                    let result = self.call(func, argc)?;
                    let result = self.bounded(result, func.name())?;
                    self.push(result)?;
                }
            }
        }

        if self.stack.len() != 1 {
            return Err(internal(format!(
                "Evaluation left {} values on the stack",
                self.stack.len()
            )));
        }
        self.pop()
    }

    /// Pop `argc` arguments and apply a built-in function
    fn call(&mut self, func: Func, argc: usize) -> Result<Value, EngineError> {
        if !func.arity().accepts(argc) || argc > self.stack.len() {
            return Err(internal(format!(
                "Bad argument count {} for {}",
                argc,
                func.name()
            )));
        }
        let args = self.stack.split_off(self.stack.len() - argc);
        let name = func.name();
        let first = &args[0];

        match func {
            Func::Sin => Value::float(first.as_f64(name)?.sin(), name),
            Func::Cos => Value::float(first.as_f64(name)?.cos(), name),
            Func::Tan => Value::float(first.as_f64(name)?.tan(), name),
            Func::Asin => Value::float(first.as_f64(name)?.asin(), name),
            Func::Acos => Value::float(first.as_f64(name)?.acos(), name),
            Func::Atan => Value::float(first.as_f64(name)?.atan(), name),
            Func::Exp => Value::float(first.as_f64(name)?.exp(), name),
            Func::Ln => Value::float(first.as_f64(name)?.ln(), name),
            Func::Log10 => Value::float(first.as_f64(name)?.log10(), name),
            Func::Log2 => Value::float(first.as_f64(name)?.log2(), name),

            Func::Sqrt => match first {
                Value::Rational(f) => match f.nth_root(2) {
                    Some(root) => Ok(Value::Rational(root)),
                    None => Value::float(f.to_f64().sqrt(), name),
                },
                other => Value::float(other.as_f64(name)?.sqrt(), name),
            },

            Func::Abs => match first {
                Value::Rational(f) => Ok(Value::Rational(f.abs())),
                other => Value::float(other.as_f64(name)?.abs(), name),
            },
            Func::Floor => match first {
                Value::Rational(f) => Ok(Value::Rational(f.floor())),
                other => Value::float(other.as_f64(name)?.floor(), name),
            },
            Func::Ceil => match first {
                Value::Rational(f) => Ok(Value::Rational(f.ceil())),
                other => Value::float(other.as_f64(name)?.ceil(), name),
            },
            Func::Round => match first {
                Value::Rational(f) => Ok(Value::Rational(f.round())),
                other => Value::float(other.as_f64(name)?.round(), name),
            },

            Func::Min | Func::Max => {
                let keep = if func == Func::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let mut best = first.as_f64(name).map(|_| first.clone())?;
                for arg in &args[1..] {
                    arg.as_f64(name)?;
                    if arg.compare(&best, name)? == keep {
                        best = arg.clone();
                    }
                }
                Ok(best)
            }

            Func::Sum | Func::Avg => {
                let mut total = first.as_f64(name).map(|_| first.clone())?;
                for arg in &args[1..] {
                    arg.as_f64(name)?;
                    total = self.bounded(total.add(arg)?, name)?;
                }
                if func == Func::Avg {
                    total = total.div(&Value::from_int(args.len() as i64))?;
                }
                Ok(total)
            }

            Func::Pow => first.pow(&args[1], &self.config),

            Func::If => {
                let chosen = if first.as_bool(name)? { &args[1] } else { &args[2] };
                Ok(chosen.clone())
            }

            Func::StrLen => match first {
                Value::Str(s) => Ok(Value::from_int(s.chars().count() as i64)),
                other => Err(EngineError::TypeMismatch {
                    op: name,
                    found: other.type_name().to_string(),
                }),
            },
        }
    }
}
