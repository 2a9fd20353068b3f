//! Lexer for one line of HULK.
//!
//! [`Scanner`] is a `FusedIterator` over `Result<Token>`: whitespace is
//! skipped, every lexical error is yielded in place (scanning resumes right
//! after the offending character) and exactly one `EOF` closes the stream.
//! [`scan`] collects a line and stops at the first error, which is what the
//! interpreter wants; the CLI `tokenize` command walks the iterator to
//! report every bad character.
//!
//! Recognised lexemes:
//!
//! | Kind        | Lexemes                                                   |
//! |-------------|-----------------------------------------------------------|
//! | punctuation | `( ) , ;`                                                 |
//! | operators   | `+ - * / % ^ @ & \| ! != = == => < <= > >= :=`            |
//! | strings     | `"..."` with `\"`, `\n`, `\t` escapes                     |
//! | numbers     | `12`, `3.14` (a trailing `.` is not part of the number)   |
//! | words       | identifiers, keywords, and the constants `PI` and `E`     |
//!
//! Offsets are *character* offsets so a front end can place a caret under
//! the offending character even after multi‑byte text inside a string.

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr2;
use phf::phf_map;

use crate::error::{HulkError, Result};
use crate::token::{Token, TokenType};

// ─────────────────────────────────────────────────────────────────────────────
// Reserved words (compile‑time perfect hash)
// ─────────────────────────────────────────────────────────────────────────────

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"else"     => TokenType::ELSE,
    b"E"        => TokenType::EULER,
    b"false"    => TokenType::FALSE,
    b"function" => TokenType::FUNCTION,
    b"if"       => TokenType::IF,
    b"in"       => TokenType::IN,
    b"let"      => TokenType::LET,
    b"PI"       => TokenType::PI,
    b"true"     => TokenType::TRUE,
};

pub struct Scanner<'a> {
    text: &'a str,  // the whole line, kept for error reports
    src: &'a [u8],  // `text` as bytes
    start: usize,   // first byte of the lexeme being scanned
    curr: usize,    // next byte to examine
    finished: bool, // EOF already yielded
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        info!("Scanner created over {} bytes", text.len());

        Self {
            text,
            src: text.as_bytes(),
            start: 0,
            curr: 0,
            finished: false,
        }
    }

    // ─────────────────────────────── cursor ────────────────────────────────

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    /// Byte `ahead` positions past the cursor, `0` beyond the line.
    #[inline(always)]
    fn peek_at(&self, ahead: usize) -> u8 {
        self.src.get(self.curr + ahead).copied().unwrap_or(0)
    }

    /// Consume the next byte if it is `expected`.
    #[inline(always)]
    fn eat(&mut self, expected: u8) -> bool {
        let hit: bool = !self.is_at_end() && self.peek_at(0) == expected;

        if hit {
            self.curr += 1;
        }

        hit
    }

    /// `long` if the next byte is `second`, otherwise `short`.
    #[inline(always)]
    fn either(&mut self, second: u8, long: TokenType, short: TokenType) -> TokenType {
        if self.eat(second) {
            long
        } else {
            short
        }
    }

    /// Advance while `pred` holds.
    #[inline(always)]
    fn skip_while(&mut self, pred: impl Fn(u8) -> bool) {
        let run: usize = self.src[self.curr..]
            .iter()
            .take_while(|b| pred(**b))
            .count();

        self.curr += run;
    }

    fn char_offset(&self, byte: usize) -> usize {
        self.text[..byte].chars().count()
    }

    fn error<S: Into<String>>(&self, byte: usize, message: S) -> HulkError {
        HulkError::lexical(self.text, self.char_offset(byte), message)
    }

    // ─────────────────────────────── lexemes ───────────────────────────────

    /// Scan the lexeme starting at `self.start`.  `Ok(None)` means it was
    /// whitespace.
    fn scan_token(&mut self) -> Result<Option<TokenType>> {
        let b: u8 = self.src[self.curr];
        self.curr += 1;

        let tt: TokenType = match b {
            b' ' | b'\r' | b'\t' | b'\n' => return Ok(None),

            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b',' => TokenType::COMMA,
            b';' => TokenType::SEMICOLON,
            b'+' => TokenType::PLUS,
            b'-' => TokenType::MINUS,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,
            b'%' => TokenType::PERCENT,
            b'^' => TokenType::CARET,
            b'@' => TokenType::AT,
            b'&' => TokenType::AMPERSAND,
            b'|' => TokenType::PIPE,

            b'!' => self.either(b'=', TokenType::BANG_EQUAL, TokenType::BANG),
            b'<' => self.either(b'=', TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.either(b'=', TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'=' => {
                if self.eat(b'>') {
                    TokenType::ARROW
                } else {
                    self.either(b'=', TokenType::EQUAL_EQUAL, TokenType::EQUAL)
                }
            }

            b':' => {
                if !self.eat(b'=') {
                    return Err(self.error(self.start, "Invalid token ':'. Perhaps you mean ':='."));
                }

                TokenType::ASSIGN
            }

            b'"' => self.string()?,

            b'0'..=b'9' => self.number()?,

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.word(),

            _ => {
                let c: char = self.text[self.start..].chars().next().unwrap_or('\u{FFFD}');

                // Resume after the whole character, not inside it.
                self.curr = (self.start + c.len_utf8()).min(self.src.len());

                return Err(self.error(self.start, format!("Invalid character '{}'.", c)));
            }
        };

        Ok(Some(tt))
    }

    /// The opening quote is consumed; on success the cursor is past the
    /// closing one.
    fn string(&mut self) -> Result<TokenType> {
        loop {
            let Some(pos) = memchr2(b'"', b'\\', &self.src[self.curr..]) else {
                self.curr = self.src.len();

                return Err(self.error(self.start, "Closing quote is missing."));
            };

            let hit: u8 = self.src[self.curr + pos];
            self.curr += pos + 1;

            if hit == b'"' {
                break;
            }

            // `\"` does not close the string.
            self.eat(b'"');
        }

        let raw: &str = &self.text[self.start + 1..self.curr - 1];

        debug!("Scanned string literal body: {:?}", raw);

        Ok(TokenType::STRING(unescape(raw)))
    }

    fn number(&mut self) -> Result<TokenType> {
        self.skip_while(|b| b.is_ascii_digit());

        if self.peek_at(0) == b'.' && self.peek_at(1).is_ascii_digit() {
            self.curr += 1;
            self.skip_while(|b| b.is_ascii_digit());
        }

        let s: &str = &self.text[self.start..self.curr];
        let n: f64 = s
            .parse::<f64>()
            .map_err(|e| self.error(self.start, format!("Invalid number '{}': {}", s, e)))?;

        Ok(TokenType::NUMBER(n))
    }

    /// Identifier, keyword or constant.
    fn word(&mut self) -> TokenType {
        self.skip_while(|b| b.is_ascii_alphanumeric() || b == b'_');

        KEYWORDS
            .get(&self.src[self.start..self.curr])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

/// Resolve the `\"`, `\n` and `\t` escapes.  Any other backslash is kept.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let resolved: Option<char> = match chars.peek() {
            Some('"') => Some('"'),
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            _ => None,
        };

        match resolved {
            Some(r) => {
                out.push(r);
                chars.next();
            }
            None => out.push('\\'),
        }
    }

    out
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_at_end() {
                if self.finished {
                    return None;
                }

                self.finished = true;

                let offset: usize = self.char_offset(self.src.len());

                return Some(Ok(Token::new(TokenType::EOF, "", offset)));
            }

            self.start = self.curr;

            match self.scan_token() {
                Err(e) => return Some(Err(e)),

                Ok(None) => continue,

                Ok(Some(tt)) => {
                    let lexeme: &str = &self.text[self.start..self.curr];
                    let offset: usize = self.char_offset(self.start);

                    debug!("Scanned token ({:?}) at offset {}", tt, offset);

                    return Some(Ok(Token::new(tt, lexeme, offset)));
                }
            }
        }
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

/// Scan a whole line, failing on the first lexical error.
pub fn scan(source: &str) -> Result<Vec<Token>> {
    let tokens: Vec<Token> = Scanner::new(source).collect::<Result<Vec<Token>>>()?;

    info!("Scanned {} tokens", tokens.len());

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_keeps_unknown_escapes() {
        assert_eq!(unescape(r"a\tb"), "a\tb");
        assert_eq!(unescape(r#"\"q\""#), "\"q\"");
        assert_eq!(unescape(r"C:\dir\"), "C:\\dir\\");
    }

    #[test]
    fn trailing_dot_is_not_a_fraction() {
        let results: Vec<_> = Scanner::new("7.").collect();

        assert!(matches!(
            &results[0],
            Ok(Token { token_type: TokenType::NUMBER(n), .. }) if *n == 7.0
        ));
        assert_eq!(results[1].as_ref().unwrap_err().offset(), Some(1));
    }
}
