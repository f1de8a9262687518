//! Character-driven scanner for SQL expression fragments.
//!
//! The scanner walks decoded code points with one character of lookahead,
//! plus a one-token lookahead buffer used to merge adjacent keyword pairs
//! (`IS NOT`, `NOT IN`, `NOT BETWEEN`, `NOT LIKE`) into compound tokens.
//! Comments and semicolons are scanned in full and surfaced as ILLEGAL
//! tokens: a bare `--`, `#`, or `/* */` anywhere outside a quoted literal is
//! a statement-escape attempt, never a token.

use std::sync::atomic::{AtomicU64, Ordering};

use sqlfence_token::{lookup_ident, Token, TokenKind};

// ---------------------------------------------------------------------------
// Scan metrics
// ---------------------------------------------------------------------------

/// Monotonic counter of tokens handed to callers.
static SQLFENCE_SCAN_TOKENS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Monotonic counter of ILLEGAL tokens handed to callers.
static SQLFENCE_SCAN_ILLEGAL_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time scan metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanMetricsSnapshot {
    /// Total tokens produced, EOF included.
    pub sqlfence_scan_tokens_total: u64,
    /// Total ILLEGAL tokens produced.
    pub sqlfence_scan_illegal_total: u64,
}

/// Take a point-in-time snapshot of scan metrics.
#[must_use]
pub fn scan_metrics_snapshot() -> ScanMetricsSnapshot {
    ScanMetricsSnapshot {
        sqlfence_scan_tokens_total: SQLFENCE_SCAN_TOKENS_TOTAL.load(Ordering::Relaxed),
        sqlfence_scan_illegal_total: SQLFENCE_SCAN_ILLEGAL_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset scan metrics (used by tests/diagnostics).
pub fn reset_scan_metrics() {
    SQLFENCE_SCAN_TOKENS_TOTAL.store(0, Ordering::Relaxed);
    SQLFENCE_SCAN_ILLEGAL_TOTAL.store(0, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

/// Pull-driven scanner over a single expression fragment.
pub struct Lexer {
    /// Decoded input.
    input: Vec<char>,
    /// Index of the current character.
    position: usize,
    /// Index of the next character to read.
    next_position: usize,
    /// Current character, `None` at end of input.
    ch: Option<char>,
    /// One-token buffer backing compound-keyword merging.
    buffered: Option<Token>,
}

impl Lexer {
    /// Create a scanner over the given input.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let mut lexer = Self {
            input: input.chars().collect(),
            position: 0,
            next_position: 0,
            ch: None,
            buffered: None,
        };
        lexer.read_char();
        lexer
    }

    /// Length of the original input in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Whether the original input was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Scan the entire input into a token vector, EOF included.
    #[must_use]
    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Self::new(input);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.is_eof();
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    /// Produce the next token, merging compound keyword pairs.
    pub fn next_token(&mut self) -> Token {
        let tok = self.merged_token();
        SQLFENCE_SCAN_TOKENS_TOTAL.fetch_add(1, Ordering::Relaxed);
        if tok.is_illegal() {
            SQLFENCE_SCAN_ILLEGAL_TOTAL.fetch_add(1, Ordering::Relaxed);
        }
        tok
    }

    fn merged_token(&mut self) -> Token {
        let tok = self.raw_token();
        match tok.kind {
            TokenKind::Is => {
                let next = self.raw_token();
                if next.kind == TokenKind::Not {
                    return Token::new(TokenKind::IsNot, "IS NOT");
                }
                self.buffered = Some(next);
                tok
            }
            TokenKind::Not => {
                let next = self.raw_token();
                let merged = match next.kind {
                    TokenKind::In => Some(Token::new(TokenKind::NotIn, "NOT IN")),
                    TokenKind::Between => Some(Token::new(TokenKind::NotBetween, "NOT BETWEEN")),
                    TokenKind::Like => Some(Token::new(TokenKind::NotLike, "NOT LIKE")),
                    _ => None,
                };
                match merged {
                    Some(compound) => compound,
                    None => {
                        self.buffered = Some(next);
                        tok
                    }
                }
            }
            _ => tok,
        }
    }

    /// Next raw token, draining the lookahead buffer first.
    fn raw_token(&mut self) -> Token {
        if let Some(tok) = self.buffered.take() {
            return tok;
        }
        self.scan_token()
    }

    // -----------------------------------------------------------------------
    // Cursor
    // -----------------------------------------------------------------------

    fn read_char(&mut self) {
        self.ch = self.input.get(self.next_position).copied();
        self.position = self.next_position;
        self.next_position += 1;
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.next_position).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, Some(' ' | '\t' | '\n' | '\r')) {
            self.read_char();
        }
    }

    /// Emit a single-character token and advance past it.
    fn single(&mut self, kind: TokenKind, ch: char) -> Token {
        self.read_char();
        Token::new(kind, ch.to_string())
    }

    /// Emit a token for an operator already fully consumed.
    fn multi(&self, kind: TokenKind) -> Token {
        Token::new(kind, kind.as_str())
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();

        let Some(ch) = self.ch else {
            return Token::eof();
        };

        match ch {
            '|' => {
                self.read_char();
                if self.ch == Some('|') {
                    self.read_char();
                    self.multi(TokenKind::Pipe2)
                } else {
                    Token::new(TokenKind::Pipe, "|")
                }
            }
            '&' => self.single(TokenKind::Amp, ch),
            '^' => self.single(TokenKind::Xor, ch),
            '~' => self.single(TokenKind::Tilde, ch),
            '%' => self.single(TokenKind::Mod, ch),
            '+' => self.single(TokenKind::Plus, ch),

            '*' => {
                if self.peek_char() == Some('/') {
                    self.read_char();
                    self.read_char();
                    Token::illegal("not support token `*/`")
                } else {
                    self.single(TokenKind::Asterisk, ch)
                }
            }

            '/' => {
                if self.peek_char() == Some('*') {
                    self.read_block_comment()
                } else {
                    self.single(TokenKind::Slash, ch)
                }
            }

            '-' => {
                if self.peek_char() == Some('-') {
                    self.read_line_comment()
                } else if self.peek_char() == Some('>') {
                    self.read_char();
                    self.read_char();
                    if self.ch == Some('>') {
                        self.read_char();
                        self.multi(TokenKind::Prt2)
                    } else {
                        self.multi(TokenKind::Prt)
                    }
                } else {
                    self.single(TokenKind::Minus, ch)
                }
            }

            '#' => self.read_line_comment(),

            ';' => {
                self.read_char();
                Token::illegal("not support token `;`")
            }

            '=' => self.single(TokenKind::Eq, ch),

            '!' => {
                self.read_char();
                match self.ch {
                    Some('=') => {
                        self.read_char();
                        self.multi(TokenKind::BangEq)
                    }
                    Some('<') => {
                        self.read_char();
                        self.multi(TokenKind::BangLt)
                    }
                    Some('>') => {
                        self.read_char();
                        self.multi(TokenKind::BangGt)
                    }
                    _ => Token::new(TokenKind::Bang, "!"),
                }
            }

            '<' => {
                self.read_char();
                match self.ch {
                    Some('=') => {
                        self.read_char();
                        if self.ch == Some('>') {
                            self.read_char();
                            self.multi(TokenKind::LtEqGt)
                        } else {
                            self.multi(TokenKind::LtEq)
                        }
                    }
                    Some('>') => {
                        self.read_char();
                        self.multi(TokenKind::NotEq)
                    }
                    Some('<') => {
                        self.read_char();
                        self.multi(TokenKind::Lt2)
                    }
                    _ => Token::new(TokenKind::Lt, "<"),
                }
            }

            '>' => {
                self.read_char();
                match self.ch {
                    Some('=') => {
                        self.read_char();
                        self.multi(TokenKind::GtEq)
                    }
                    Some('>') => {
                        self.read_char();
                        self.multi(TokenKind::Rt2)
                    }
                    _ => Token::new(TokenKind::Gt, ">"),
                }
            }

            '(' => self.single(TokenKind::LParen, ch),
            ')' => self.single(TokenKind::RParen, ch),
            '[' => self.single(TokenKind::LBracket, ch),
            ']' => self.single(TokenKind::RBracket, ch),
            ',' => self.single(TokenKind::Comma, ch),

            '?' => self.single(TokenKind::Question, ch),
            ':' => {
                self.read_char();
                if self.ch == Some(':') {
                    self.read_char();
                    self.multi(TokenKind::Colon2)
                } else {
                    Token::new(TokenKind::Colon, ":")
                }
            }

            '\'' => self.read_string(),
            '`' => self.read_quoted_ident('`', TokenKind::BackQuoteIdent),
            '"' => self.read_quoted_ident('"', TokenKind::DoubleQuoteIdent),

            '.' => {
                if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.read_decimal()
                } else {
                    self.single(TokenKind::Period, ch)
                }
            }

            c if c.is_ascii_digit() => self.read_number(),

            c if c == '_' || c.is_alphabetic() => self.read_identifier(),

            other => {
                self.read_char();
                Token::illegal(other.to_string())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Identifiers
    // -----------------------------------------------------------------------

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(c) = self.ch {
            if c == '_' || c.is_alphanumeric() {
                ident.push(c);
                self.read_char();
            } else {
                break;
            }
        }
        lookup_ident(&ident)
    }

    // -----------------------------------------------------------------------
    // Quoted literals
    // -----------------------------------------------------------------------

    /// Scan a `'...'` string literal, delimiters preserved.
    ///
    /// Two escape forms close over the quote character: a backslash-escaped
    /// quote (`\'`) and a doubled quote (`''`). Two one-character flags are
    /// enough to decide whether a quote closes the literal.
    fn read_string(&mut self) -> Token {
        self.read_delimited('\'', TokenKind::String)
    }

    /// Scan a back-quoted or double-quoted identifier with the same escape
    /// discipline as strings.
    fn read_quoted_ident(&mut self, quote: char, kind: TokenKind) -> Token {
        self.read_delimited(quote, kind)
    }

    fn read_delimited(&mut self, quote: char, kind: TokenKind) -> Token {
        let mut literal = String::new();
        literal.push(quote);

        // True when the previous character was an unescaped backslash.
        let mut escaped = false;
        loop {
            self.read_char();
            let Some(c) = self.ch else {
                return Token::illegal(format!("unexpected EOF: {literal}"));
            };
            literal.push(c);

            if escaped {
                escaped = false;
                continue;
            }

            if c == '\\' {
                escaped = true;
            } else if c == quote {
                if self.peek_char() == Some(quote) {
                    // First quote of a doubled pair.
                    self.read_char();
                    literal.push(quote);
                } else {
                    self.read_char();
                    return Token::new(kind, literal);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Scan a `--` or `#` comment to end-of-line and reject it whole, so
    /// the caller sees the entire comment body in the error.
    fn read_line_comment(&mut self) -> Token {
        let mut body = String::new();
        while let Some(c) = self.ch {
            if c == '\n' {
                break;
            }
            body.push(c);
            self.read_char();
        }
        Token::illegal(format!("not support SQL comment: \"{body}\""))
    }

    /// Scan a `/* ... */` comment, delimiters included.
    fn read_block_comment(&mut self) -> Token {
        let mut body = String::from("/*");
        self.read_char();
        self.read_char();
        loop {
            match self.ch {
                None => return Token::illegal(format!("unexpected EOF: \"{body}\"")),
                Some('*') if self.peek_char() == Some('/') => {
                    body.push_str("*/");
                    self.read_char();
                    self.read_char();
                    return Token::illegal(format!("not support SQL comment: \"{body}\""));
                }
                Some(c) => {
                    body.push(c);
                    self.read_char();
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Numbers
    // -----------------------------------------------------------------------

    /// Scan a numeric literal; the prefix chooses the sub-scanner.
    fn read_number(&mut self) -> Token {
        if self.ch == Some('0') {
            match self.peek_char() {
                Some('b' | 'B') => return self.read_radix(Radix::Binary),
                Some('x' | 'X') => return self.read_radix(Radix::Hexadecimal),
                Some(c) if c.is_ascii_digit() => return self.read_radix(Radix::Octal),
                _ => {}
            }
        }
        self.read_decimal()
    }

    /// Scan a binary, octal, or hexadecimal literal.
    ///
    /// The whole alphanumeric run is consumed first so that the error
    /// message can quote the complete offending literal.
    fn read_radix(&mut self, radix: Radix) -> Token {
        let mut raw = String::new();
        raw.push('0');
        self.read_char();
        if radix != Radix::Octal {
            // Consume the base marker (`b`/`B`/`x`/`X`).
            if let Some(marker) = self.ch {
                raw.push(marker);
            }
            self.read_char();
        }
        while let Some(c) = self.ch {
            if c.is_ascii_alphanumeric() {
                raw.push(c);
                self.read_char();
            } else {
                break;
            }
        }

        let digits = &raw[radix.prefix_len()..];
        let valid = !digits.is_empty() && digits.chars().all(|c| radix.is_digit(c));
        if valid {
            Token::new(TokenKind::Number, raw)
        } else {
            Token::illegal(format!("invalid {} number literal: \"{raw}\"", radix.name()))
        }
    }

    /// Scan a decimal literal with optional fraction and exponent.
    ///
    /// A `+`/`-` is part of the literal only immediately after the exponent
    /// marker, so `0e+3+3` scans as NUMBER `0e+3`, PLUS, NUMBER `3`.
    fn read_decimal(&mut self) -> Token {
        let mut raw = String::new();
        while let Some(c) = self.ch {
            let take = match c {
                '0'..='9' | '.' => true,
                c if c.is_ascii_alphabetic() => true,
                '+' | '-' => matches!(raw.chars().last(), Some('e' | 'E')),
                _ => false,
            };
            if !take {
                break;
            }
            raw.push(c);
            self.read_char();
        }

        if is_valid_decimal(&raw) {
            Token::new(TokenKind::Number, raw)
        } else {
            Token::illegal(format!("invalid number literal: \"{raw}\""))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Radix {
    Binary,
    Octal,
    Hexadecimal,
}

impl Radix {
    const fn name(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Octal => "octal",
            Self::Hexadecimal => "hexadecimal",
        }
    }

    /// Length of the literal prefix that is not a digit (`0b`, `0`, `0x`).
    const fn prefix_len(self) -> usize {
        match self {
            Self::Octal => 1,
            Self::Binary | Self::Hexadecimal => 2,
        }
    }

    fn is_digit(self, c: char) -> bool {
        match self {
            Self::Binary => matches!(c, '0' | '1'),
            Self::Octal => matches!(c, '0'..='7'),
            Self::Hexadecimal => c.is_ascii_hexdigit(),
        }
    }
}

/// Validate a consumed decimal run against
/// `(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?`.
fn is_valid_decimal(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    let mut digits = 0;

    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return false;
    }

    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let mut exp_digits = 0;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
            exp_digits += 1;
        }
        if exp_digits == 0 {
            return false;
        }
    }

    i == b.len()
}
