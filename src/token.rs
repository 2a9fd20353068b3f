use log::trace;
use serde::Serialize;
use std::f64::consts;
use std::fmt;
use std::mem;

use crate::value::Value;

/// The different kinds of tokens recognized by the HULK scanner.
///
/// Variants without data represent operator, punctuation or keyword tokens.
/// `STRING(String)` and `NUMBER(f64)` carry their literal values.
/// `IDENTIFIER` is used for variable, parameter and function names.
/// `EOF` marks the end of the line.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Serialize)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// ','
    COMMA,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '%'
    PERCENT,

    /// '*'
    STAR,

    /// '^'
    CARET,

    /// '@' string concatenation
    AT,

    /// '&'
    AMPERSAND,

    /// '|'
    PIPE,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// ':=' destructive assignment
    ASSIGN,

    /// '=>'
    ARROW,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal (contents without quotes, escapes resolved)
    STRING(String),

    /// A numeric literal
    NUMBER(f64),

    /// 'else'
    ELSE,

    /// 'false'
    FALSE,

    /// 'function'
    FUNCTION,

    /// 'if'
    IF,

    /// 'in'
    IN,

    /// 'let'
    LET,

    /// 'true'
    TRUE,

    /// 'PI'
    PI,

    /// 'E'
    EULER,

    /// End‑of‑line marker
    EOF,
}

impl TokenType {
    /// Upper‑case variant name without payload, as printed by `tokenize`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::COMMA => "COMMA",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::PERCENT => "PERCENT",
            TokenType::STAR => "STAR",
            TokenType::CARET => "CARET",
            TokenType::AT => "AT",
            TokenType::AMPERSAND => "AMPERSAND",
            TokenType::PIPE => "PIPE",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::ASSIGN => "ASSIGN",
            TokenType::ARROW => "ARROW",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING(_) => "STRING",
            TokenType::NUMBER(_) => "NUMBER",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUNCTION => "FUNCTION",
            TokenType::IF => "IF",
            TokenType::IN => "IN",
            TokenType::LET => "LET",
            TokenType::TRUE => "TRUE",
            TokenType::PI => "PI",
            TokenType::EULER => "EULER",
            TokenType::EOF => "EOF",
        }
    }
}

impl PartialEq for TokenType {
    /// Variant equality only: `NUMBER(1.0) == NUMBER(2.0)`, so the parser can
    /// ask "is this a number?" without inventing a payload.
    fn eq(&self, other: &Self) -> bool {
        let same: bool = mem::discriminant(self) == mem::discriminant(other);

        trace!("TokenType match: self={:?}, other={:?} => {}", self, other, same);

        same
    }
}

/// A scanned token: its type, the original lexeme, and the character offset
/// where it starts in the line.
///
/// Tokens own their lexeme because function bodies (and therefore their
/// tokens) outlive the line that declared them.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// 0‑based character offset in the source line.
    pub offset: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, and offset.
    pub fn new<S: Into<String>>(token_type: TokenType, lexeme: S, offset: usize) -> Self {
        let lexeme: String = lexeme.into();

        trace!(
            "Creating new token: type={:?}, lexeme={}, offset={}",
            token_type,
            lexeme,
            offset
        );

        Self {
            token_type,
            lexeme,
            offset,
        }
    }

    /// A copy of `self` that reads like `other` but keeps `self`'s offset.
    pub fn renamed_like(&self, other: &Token) -> Self {
        trace!(
            "Renaming token '{}' to '{}' at offset {}",
            self.lexeme, other.lexeme, self.offset
        );

        Self {
            token_type: other.token_type.clone(),
            lexeme: other.lexeme.clone(),
            offset: self.offset,
        }
    }

    /// The literal value carried by this token, if any.  `PI` and `E` are
    /// literal tokens for the constants π and e.
    pub fn literal(&self) -> Option<Value> {
        match &self.token_type {
            TokenType::NUMBER(n) => Some(Value::Number(*n)),
            TokenType::STRING(s) => Some(Value::Str(s.clone())),
            TokenType::TRUE => Some(Value::Bool(true)),
            TokenType::FALSE => Some(Value::Bool(false)),
            TokenType::PI => Some(Value::Number(consts::PI)),
            TokenType::EULER => Some(Value::Number(consts::E)),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant: &'static str = self.token_type.name();

        match &self.token_type {
            TokenType::STRING(s) => write!(f, "{} {} {}", variant, self.lexeme, s),

            TokenType::NUMBER(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                // 3 → "3.0", 3.14 → "3.14"
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{} {} {}.0", variant, self.lexeme, buf.format(*n as i64))
            }

            TokenType::NUMBER(n) => write!(f, "{} {} {}", variant, self.lexeme, n),

            _ => write!(f, "{} {} null", variant, self.lexeme),
        }
    }
}
