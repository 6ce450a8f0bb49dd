//! Expression Compiler: Text → Bytecode
//!
//! Tokenizes infix expressions and compiles them with a recursive-descent
//! parser straight into stack-machine bytecode (operands first, operator
//! last), so evaluation never touches the source text again.
//!
//! Precedence, lowest first:
//!
//! | level      | operators            |
//! |------------|----------------------|
//! | or         | `\|\|`               |
//! | and        | `&&`                 |
//! | equality   | `==` `!=`            |
//! | comparison | `<` `<=` `>` `>=`    |
//! | additive   | `+` `-`              |
//! | product    | `*` `/` `%`          |
//! | unary      | `-` `+` `!`          |
//! | power      | `^` (right-assoc.)   |

use crate::bytecode::{
    write_big_int_signed, write_big_int_unsigned, write_f64, write_i32, write_u16, Func, Op,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fraction::Fraction;
use num_traits::ToPrimitive;
use std::fmt;

/// Literal exponents (`1e400`) beyond this magnitude are rejected
const MAX_LITERAL_EXPONENT: i64 = 4096;

/// Compiled expression result
#[derive(Clone, Debug, Default)]
pub struct CompiledExpression {
    /// The compiled bytecode
    pub bytecode: Vec<u8>,
    /// Expression text as given
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(String),
    Ident(String),
    Str(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    Comma,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            TokenKind::Number(text) | TokenKind::Ident(text) => return f.write_str(text),
            TokenKind::Str(text) => return write!(f, "\"{}\"", text),
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Caret => "^",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Le => "<=",
            TokenKind::Gt => ">",
            TokenKind::Ge => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Bang => "!",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Character offset in the source text
    pos: usize,
}

/// Expression compiler
pub struct ExpressionCompiler {
    bytecode: Vec<u8>,
    tokens: Vec<Token>,
    index: usize,
    depth: usize,
    max_depth: usize,
}

impl Default for ExpressionCompiler {
    fn default() -> Self {
        ExpressionCompiler::new()
    }
}

impl ExpressionCompiler {
    /// Create a new compiler with default limits
    pub fn new() -> ExpressionCompiler {
        ExpressionCompiler::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> ExpressionCompiler {
        ExpressionCompiler {
            bytecode: Vec::new(),
            tokens: Vec::new(),
            index: 0,
            depth: 0,
            max_depth: config.max_nesting_depth,
        }
    }

    /// Compile a text expression to bytecode
    pub fn compile(&mut self, text_expr: &str) -> Result<CompiledExpression, EngineError> {
        // Reset state
        self.bytecode.clear();
        self.tokens = tokenize(text_expr)?;
        self.index = 0;
        self.depth = 0;

        if self.tokens.is_empty() {
            return Err(EngineError::EmptyExpression);
        }

        self.parse_expression()?;

        if let Some(token) = self.tokens.get(self.index) {
            return Err(match token.kind {
                TokenKind::RParen => EngineError::UnexpectedParenthesis { pos: token.pos },
                ref kind => EngineError::UnexpectedToken {
                    token: kind.to_string(),
                    pos: token.pos,
                },
            });
        }

        Ok(CompiledExpression {
            bytecode: std::mem::take(&mut self.bytecode),
            source_text: text_expr.to_string(),
        })
    }

    // === Token cursor ===

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index).map(|token| &token.kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect_closing(&mut self, open_pos: usize) -> Result<(), EngineError> {
        match self.tokens.get(self.index) {
            Some(Token {
                kind: TokenKind::RParen,
                ..
            }) => {
                self.index += 1;
                Ok(())
            }
            Some(token) => Err(EngineError::UnexpectedToken {
                token: token.kind.to_string(),
                pos: token.pos,
            }),
            None => Err(EngineError::MissingParenthesis { pos: open_pos }),
        }
    }

    /// Run `parse` one nesting level deeper, enforcing the depth limit
    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<(), EngineError>,
    ) -> Result<(), EngineError> {
        if self.depth >= self.max_depth {
            return Err(EngineError::NestingTooDeep {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // === Grammar ===

    fn parse_expression(&mut self) -> Result<(), EngineError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<(), EngineError> {
        self.parse_and()?;
        while self.eat(&TokenKind::OrOr) {
            self.parse_and()?;
            self.emit(Op::Or);
        }
        Ok(())
    }

    fn parse_and(&mut self) -> Result<(), EngineError> {
        self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd) {
            self.parse_equality()?;
            self.emit(Op::And);
        }
        Ok(())
    }

    fn parse_equality(&mut self) -> Result<(), EngineError> {
        self.parse_comparison()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::EqEq) => Op::Eq,
                Some(TokenKind::NotEq) => Op::Ne,
                _ => return Ok(()),
            };
            self.index += 1;
            self.parse_comparison()?;
            self.emit(op);
        }
    }

    fn parse_comparison(&mut self) -> Result<(), EngineError> {
        self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Lt) => Op::Lt,
                Some(TokenKind::Le) => Op::Le,
                Some(TokenKind::Gt) => Op::Gt,
                Some(TokenKind::Ge) => Op::Ge,
                _ => return Ok(()),
            };
            self.index += 1;
            self.parse_additive()?;
            self.emit(op);
        }
    }

    fn parse_additive(&mut self) -> Result<(), EngineError> {
        self.parse_product()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => Op::Add,
                Some(TokenKind::Minus) => Op::Sub,
                _ => return Ok(()),
            };
            self.index += 1;
            self.parse_product()?;
            self.emit(op);
        }
    }

    fn parse_product(&mut self) -> Result<(), EngineError> {
        self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => Op::Mul,
                Some(TokenKind::Slash) => Op::Div,
                Some(TokenKind::Percent) => Op::Mod,
                _ => return Ok(()),
            };
            self.index += 1;
            self.parse_unary()?;
            self.emit(op);
        }
    }

    fn parse_unary(&mut self) -> Result<(), EngineError> {
        match self.peek_kind() {
            Some(TokenKind::Minus) => {
                self.index += 1;
                self.nested(Self::parse_unary)?;
                self.emit(Op::Neg);
                Ok(())
            }
            Some(TokenKind::Plus) => {
                self.index += 1;
                self.nested(Self::parse_unary)
            }
            Some(TokenKind::Bang) => {
                self.index += 1;
                self.nested(Self::parse_unary)?;
                self.emit(Op::Not);
                Ok(())
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<(), EngineError> {
        self.parse_primary()?;
        if self.eat(&TokenKind::Caret) {
            // Exponent may carry its own sign: 2^-1
            self.nested(Self::parse_unary)?;
            self.emit(Op::Pow);
        }
        Ok(())
    }

    fn parse_primary(&mut self) -> Result<(), EngineError> {
        let token = self
            .tokens
            .get(self.index)
            .cloned()
            .ok_or(EngineError::UnexpectedEnd)?;
        self.index += 1;

        match token.kind {
            TokenKind::Number(text) => self.emit_number(&text),
            TokenKind::Str(text) => self.emit_string(&text),
            TokenKind::Ident(name) => {
                if self.peek_kind() == Some(&TokenKind::LParen) {
                    self.parse_call(&name, token.pos)
                } else {
                    self.emit_identifier(&name, token.pos)
                }
            }
            TokenKind::LParen => {
                self.nested(Self::parse_expression)?;
                self.expect_closing(token.pos)
            }
            TokenKind::RParen => Err(EngineError::UnexpectedParenthesis { pos: token.pos }),
            kind => Err(EngineError::UnexpectedToken {
                token: kind.to_string(),
                pos: token.pos,
            }),
        }
    }

    fn parse_call(&mut self, name: &str, pos: usize) -> Result<(), EngineError> {
        let func = Func::from_name(name).ok_or_else(|| EngineError::UnknownIdentifier {
            name: name.to_string(),
            pos,
        })?;

        let open_pos = self.tokens[self.index].pos;
        self.index += 1;

        let mut argc = 0usize;
        if !self.eat(&TokenKind::RParen) {
            loop {
                self.nested(Self::parse_expression)?;
                argc += 1;
                if !self.eat(&TokenKind::Comma) {
                    self.expect_closing(open_pos)?;
                    break;
                }
            }
        }

        // argc is encoded in one byte
        let argc_byte = u8::try_from(argc).map_err(|_| EngineError::TooManyArguments {
            function: func.name(),
            limit: u8::MAX as usize,
            found: argc,
        })?;
        let arity = func.arity();
        if !arity.accepts(argc) {
            return Err(EngineError::ArgumentCount {
                function: func.name(),
                expected: arity.to_string(),
                found: argc,
            });
        }

        self.emit(Op::Call);
        self.bytecode.push(func as u8);
        self.bytecode.push(argc_byte);
        Ok(())
    }

    // === Bytecode emission ===

    fn emit(&mut self, op: Op) {
        self.bytecode.push(op as u8);
    }

    fn emit_number(&mut self, text: &str) -> Result<(), EngineError> {
        let exponent_too_large = text
            .find(|c: char| c == 'e' || c == 'E')
            .and_then(|pos| text[pos + 1..].parse::<i64>().ok())
            .map_or(false, |exp| exp.abs() > MAX_LITERAL_EXPONENT);
        if exponent_too_large {
            return Err(EngineError::InvalidNumber(text.to_string()));
        }

        let value = Fraction::from_decimal_str(text)
            .ok_or_else(|| EngineError::InvalidNumber(text.to_string()))?;
        self.emit_constant(&value)
            .map_err(|_| EngineError::InvalidNumber(text.to_string()))
    }

    fn emit_constant(&mut self, value: &Fraction) -> Result<(), String> {
        let rational = value.as_big_rational();
        let small = rational
            .numer()
            .to_i32()
            .zip(rational.denom().to_i32());

        match small {
            Some((num, den)) => {
                self.emit(Op::LoadConst);
                write_i32(&mut self.bytecode, num);
                write_i32(&mut self.bytecode, den);
            }
            None => {
                self.emit(Op::LoadConstBig);
                write_big_int_signed(&mut self.bytecode, rational.numer())?;
                write_big_int_unsigned(&mut self.bytecode, rational.denom())?;
            }
        }
        Ok(())
    }

    fn emit_string(&mut self, text: &str) -> Result<(), EngineError> {
        let len = u16::try_from(text.len()).map_err(|_| EngineError::StringTooLong {
            len: text.len(),
            limit: u16::MAX as usize,
        })?;
        self.emit(Op::LoadStr);
        write_u16(&mut self.bytecode, len);
        self.bytecode.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn emit_identifier(&mut self, name: &str, pos: usize) -> Result<(), EngineError> {
        match name {
            "pi" => {
                self.emit(Op::LoadFloat);
                write_f64(&mut self.bytecode, std::f64::consts::PI);
            }
            "e" => {
                self.emit(Op::LoadFloat);
                write_f64(&mut self.bytecode, std::f64::consts::E);
            }
            "true" | "false" => {
                self.emit(Op::LoadBool);
                self.bytecode.push(u8::from(name == "true"));
            }
            // A function name without an argument list
            _ if Func::from_name(name).is_some() => {
                return Err(EngineError::UnexpectedToken {
                    token: name.to_string(),
                    pos,
                })
            }
            _ => {
                return Err(EngineError::UnknownIdentifier {
                    name: name.to_string(),
                    pos,
                })
            }
        }
        Ok(())
    }
}

// === Lexer ===

fn tokenize(text: &str) -> Result<Vec<Token>, EngineError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;

        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let starts_number = ch.is_ascii_digit()
            || (ch == '.' && chars.get(i + 1).map_or(false, |c| c.is_ascii_digit()));
        if starts_number {
            i = scan_number(&chars, i);
            tokens.push(Token {
                kind: TokenKind::Number(chars[start..i].iter().collect()),
                pos: start,
            });
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(chars[start..i].iter().collect()),
                pos: start,
            });
            continue;
        }

        if ch == '"' {
            let (literal, next) = scan_string(&chars, i)?;
            tokens.push(Token {
                kind: TokenKind::Str(literal),
                pos: start,
            });
            i = next;
            continue;
        }

        let (kind, width) = match (ch, chars.get(i + 1).copied()) {
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('^', _) => (TokenKind::Caret, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('!', _) => (TokenKind::Bang, 1),
            _ => return Err(EngineError::UnexpectedChar { ch, pos: i }),
        };
        tokens.push(Token { kind, pos: start });
        i += width;
    }

    Ok(tokens)
}

/// Scan `digits [. digits] [(e|E) [+|-] digits]`, returning the end offset
fn scan_number(chars: &[char], mut i: usize) -> usize {
    let is_digit = |i: usize| chars.get(i).map_or(false, |c| c.is_ascii_digit());

    while is_digit(i) {
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        while is_digit(i) {
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        // `2e` without digits leaves the `e` for the next token
        if is_digit(j) {
            i = j;
            while is_digit(i) {
                i += 1;
            }
        }
    }
    i
}

/// Scan a double-quoted string starting at `start`, returning its contents
/// and the offset just past the closing quote
fn scan_string(chars: &[char], start: usize) -> Result<(String, usize), EngineError> {
    let mut literal = String::new();
    let mut i = start + 1;

    while let Some(&ch) = chars.get(i) {
        match ch {
            '"' => return Ok((literal, i + 1)),
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .copied()
                    .ok_or(EngineError::UnterminatedString { pos: start })?;
                match escaped {
                    'n' => literal.push('\n'),
                    't' => literal.push('\t'),
                    other => literal.push(other),
                }
                i += 2;
            }
            _ => {
                literal.push(ch);
                i += 1;
            }
        }
    }

    Err(EngineError::UnterminatedString { pos: start })
}
