//! Bytecode definitions for compiled expressions
//!
//! Opcodes, the built-in function table, and big-endian operand codecs
//! shared by the compiler and the evaluator.

use num_bigint::{BigInt, Sign};
use std::fmt;

/// Bytecode opcodes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // Load operations
    LoadConst = 0x01,    // Push small rational: [num(i32), den(i32)]
    // Push big rational: [sign(1), num_len(2), num_bytes(n), den_len(2), den_bytes(n)]
    LoadConstBig = 0x04,
    LoadFloat = 0x05,    // Push f64: [bits(8)]
    LoadBool = 0x06,     // Push boolean: [0|1]
    LoadStr = 0x07,      // Push string: [len(2), utf8(n)]

    // Arithmetic operations
    Add = 0x10, // Pop 2, push sum (or concatenation for strings)
    Sub = 0x11, // Pop 2, push difference
    Mul = 0x12, // Pop 2, push product
    Div = 0x13, // Pop 2, push quotient
    Neg = 0x14, // Pop 1, push negation
    Pow = 0x15, // Pop 2 (base, exponent), push base^exponent
    Mod = 0x16, // Pop 2, push truncated remainder

    // Comparison operations
    Eq = 0x20,
    Ne = 0x21,
    Lt = 0x22,
    Le = 0x23,
    Gt = 0x24,
    Ge = 0x25,

    // Logical operations
    Not = 0x28,
    And = 0x29,
    Or = 0x2A,

    // Function call: [func(1), argc(1)], pops argc values, pushes the result
    Call = 0x30,
}

impl Op {
    /// Convert a byte to an opcode, returning None for invalid bytes
    pub fn from_byte(byte: u8) -> Option<Op> {
        match byte {
            0x01 => Some(Op::LoadConst),
            0x04 => Some(Op::LoadConstBig),
            0x05 => Some(Op::LoadFloat),
            0x06 => Some(Op::LoadBool),
            0x07 => Some(Op::LoadStr),
            0x10 => Some(Op::Add),
            0x11 => Some(Op::Sub),
            0x12 => Some(Op::Mul),
            0x13 => Some(Op::Div),
            0x14 => Some(Op::Neg),
            0x15 => Some(Op::Pow),
            0x16 => Some(Op::Mod),
            0x20 => Some(Op::Eq),
            0x21 => Some(Op::Ne),
            0x22 => Some(Op::Lt),
            0x23 => Some(Op::Le),
            0x24 => Some(Op::Gt),
            0x25 => Some(Op::Ge),
            0x28 => Some(Op::Not),
            0x29 => Some(Op::And),
            0x2A => Some(Op::Or),
            0x30 => Some(Op::Call),
            _ => None,
        }
    }

    /// Operator symbol, used in type errors
    pub fn symbol(&self) -> &'static str {
        match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "*",
            Op::Div => "/",
            Op::Neg => "unary -",
            Op::Pow => "^",
            Op::Mod => "%",
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Not => "!",
            Op::And => "&&",
            Op::Or => "||",
            Op::LoadConst
            | Op::LoadConstBig
            | Op::LoadFloat
            | Op::LoadBool
            | Op::LoadStr
            | Op::Call => "load",
        }
    }
}

/// Number of arguments a built-in accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(u8),
    AtLeast(u8),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exactly(n) => count == n as usize,
            Arity::AtLeast(n) => count >= n as usize,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Built-in functions callable from expressions
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Sin = 0,
    Cos = 1,
    Tan = 2,
    Asin = 3,
    Acos = 4,
    Atan = 5,
    Sqrt = 6,
    Exp = 7,
    Ln = 8,
    Log10 = 9,
    Log2 = 10,
    Abs = 11,
    Floor = 12,
    Ceil = 13,
    Round = 14,
    Min = 15,
    Max = 16,
    Sum = 17,
    Avg = 18,
    Pow = 19,
    If = 20,
    StrLen = 21,
}

impl Func {
    const ALL: [Func; 22] = [
        Func::Sin,
        Func::Cos,
        Func::Tan,
        Func::Asin,
        Func::Acos,
        Func::Atan,
        Func::Sqrt,
        Func::Exp,
        Func::Ln,
        Func::Log10,
        Func::Log2,
        Func::Abs,
        Func::Floor,
        Func::Ceil,
        Func::Round,
        Func::Min,
        Func::Max,
        Func::Sum,
        Func::Avg,
        Func::Pow,
        Func::If,
        Func::StrLen,
    ];

    /// Convert a byte to a function, returning None for invalid bytes
    pub fn from_byte(byte: u8) -> Option<Func> {
        Func::ALL.get(byte as usize).copied()
    }

    /// Canonical function name
    pub fn name(&self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Asin => "asin",
            Func::Acos => "acos",
            Func::Atan => "atan",
            Func::Sqrt => "sqrt",
            Func::Exp => "exp",
            Func::Ln => "ln",
            Func::Log10 => "log10",
            Func::Log2 => "log2",
            Func::Abs => "abs",
            Func::Floor => "floor",
            Func::Ceil => "ceil",
            Func::Round => "round",
            Func::Min => "min",
            Func::Max => "max",
            Func::Sum => "sum",
            Func::Avg => "avg",
            Func::Pow => "pow",
            Func::If => "if",
            Func::StrLen => "strlen",
        }
    }

    /// Look up a function by name (`log` is an alias for `log10`)
    pub fn from_name(name: &str) -> Option<Func> {
        if name == "log" {
            return Some(Func::Log10);
        }
        Func::ALL.iter().copied().find(|func| func.name() == name)
    }

    pub fn arity(&self) -> Arity {
        match self {
            Func::Min | Func::Max | Func::Sum | Func::Avg => Arity::AtLeast(1),
            Func::Pow => Arity::Exactly(2),
            Func::If => Arity::Exactly(3),
            _ => Arity::Exactly(1),
        }
    }
}

/// Read a 16-bit unsigned integer from bytecode (big-endian)
#[inline]
pub fn read_u16(bytecode: &[u8], offset: usize) -> u16 {
    ((bytecode[offset] as u16) << 8) | (bytecode[offset + 1] as u16)
}

/// Read a 32-bit signed integer from bytecode (big-endian)
#[inline]
pub fn read_i32(bytecode: &[u8], offset: usize) -> i32 {
    ((bytecode[offset] as i32) << 24)
        | ((bytecode[offset + 1] as i32) << 16)
        | ((bytecode[offset + 2] as i32) << 8)
        | (bytecode[offset + 3] as i32)
}

/// Read a 64-bit float from bytecode (big-endian bit pattern)
#[inline]
pub fn read_f64(bytecode: &[u8], offset: usize) -> f64 {
    let mut bits = [0u8; 8];
    bits.copy_from_slice(&bytecode[offset..offset + 8]);
    f64::from_bits(u64::from_be_bytes(bits))
}

/// Write a 16-bit unsigned integer to a buffer (big-endian)
#[inline]
pub fn write_u16(buffer: &mut Vec<u8>, value: u16) {
    buffer.push((value >> 8) as u8);
    buffer.push(value as u8);
}

/// Write a 32-bit signed integer to a buffer (big-endian)
#[inline]
pub fn write_i32(buffer: &mut Vec<u8>, value: i32) {
    buffer.push((value >> 24) as u8);
    buffer.push((value >> 16) as u8);
    buffer.push((value >> 8) as u8);
    buffer.push(value as u8);
}

/// Write a 64-bit float to a buffer (big-endian bit pattern)
#[inline]
pub fn write_f64(buffer: &mut Vec<u8>, value: f64) {
    buffer.extend_from_slice(&value.to_bits().to_be_bytes());
}

/// Write a variable-length signed BigInt
/// Format: [sign(1)] [len(2)] [bytes(n)]
pub fn write_big_int_signed(buffer: &mut Vec<u8>, value: &BigInt) -> Result<(), String> {
    buffer.push(if value.sign() == Sign::Minus { 0x01 } else { 0x00 });
    write_big_int_unsigned(buffer, value)
}

/// Write the magnitude of a BigInt
/// Format: [len(2)] [bytes(n)]
pub fn write_big_int_unsigned(buffer: &mut Vec<u8>, value: &BigInt) -> Result<(), String> {
    let (_, bytes) = value.to_bytes_be();
    let len = u16::try_from(bytes.len())
        .map_err(|_| format!("Integer of {} bytes does not fit in bytecode", bytes.len()))?;
    write_u16(buffer, len);
    buffer.extend_from_slice(&bytes);
    Ok(())
}

/// Read a variable-length signed BigInt from bytecode
/// Format: [sign(1)] [len(2)] [bytes(n)]
/// Returns (BigInt, bytes_consumed) or error
pub fn read_big_int_signed(bytecode: &[u8], offset: usize) -> Result<(BigInt, usize), String> {
    if offset >= bytecode.len() {
        return Err("Unexpected end of bytecode reading sign byte".to_string());
    }
    let sign_byte = bytecode[offset];
    let (magnitude, mag_bytes) = read_big_int_unsigned(bytecode, offset + 1)?;
    let value = if sign_byte == 0x01 {
        -magnitude
    } else {
        magnitude
    };
    Ok((value, 1 + mag_bytes))
}

/// Read a variable-length unsigned BigInt from bytecode
/// Format: [len(2)] [bytes(n)]
/// Returns (BigInt, bytes_consumed) or error
pub fn read_big_int_unsigned(bytecode: &[u8], offset: usize) -> Result<(BigInt, usize), String> {
    if offset + 2 > bytecode.len() {
        return Err("Unexpected end of bytecode reading BigInt length".to_string());
    }
    let len = read_u16(bytecode, offset) as usize;
    if offset + 2 + len > bytecode.len() {
        return Err(format!(
            "Unexpected end of bytecode reading BigInt bytes: need {} bytes at offset {}, have {}",
            len,
            offset + 2,
            bytecode.len()
        ));
    }
    let bytes = &bytecode[offset + 2..offset + 2 + len];
    let value = BigInt::from_bytes_be(Sign::Plus, bytes);
    Ok((value, 2 + len))
}
