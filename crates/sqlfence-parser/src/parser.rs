//! Pratt expression parser.
//!
//! The driver climbs the precedence ladder: each token kind may have a
//! prefix handler (it can start an expression) and an infix handler (it can
//! extend one). Tokens that legitimately terminate an expression sit at the
//! bottom of the ladder; a token with no precedence entry at all is a
//! diagnostic, not a terminator, which is how stray keywords surface as
//! errors instead of being silently ignored.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use sqlfence_ast::{
    BetweenExpression, BooleanLiteral, CallExpression, CaseWhenExpression, Expr, Identifier,
    InfixExpression, NotBetweenExpression, NullLiteral, NumberLiteral, PrefixExpression,
    StringLiteral, TupleExpression, WhenClause,
};
use sqlfence_token::{Token, TokenKind};

use crate::lexer::Lexer;

// ---------------------------------------------------------------------------
// Parse metrics
// ---------------------------------------------------------------------------

/// Monotonic counter of successfully parsed expressions.
static SQLFENCE_PARSE_EXPRESSIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Monotonic counter of rejected expressions.
static SQLFENCE_PARSE_ERRORS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time parse metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMetricsSnapshot {
    /// Total expressions successfully parsed.
    pub sqlfence_parse_expressions_total: u64,
    /// Total expressions rejected with an error.
    pub sqlfence_parse_errors_total: u64,
}

/// Take a point-in-time snapshot of parse metrics.
#[must_use]
pub fn parse_metrics_snapshot() -> ParseMetricsSnapshot {
    ParseMetricsSnapshot {
        sqlfence_parse_expressions_total: SQLFENCE_PARSE_EXPRESSIONS_TOTAL.load(Ordering::Relaxed),
        sqlfence_parse_errors_total: SQLFENCE_PARSE_ERRORS_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset parse metrics (used by tests/diagnostics).
pub fn reset_parse_metrics() {
    SQLFENCE_PARSE_EXPRESSIONS_TOTAL.store(0, Ordering::Relaxed);
    SQLFENCE_PARSE_ERRORS_TOTAL.store(0, Ordering::Relaxed);
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Nesting bound for hostile or degenerate input.
pub const MAX_PARSE_DEPTH: u32 = 1000;

/// First-error-wins parse failure. There is no recovery and no error list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The scanner produced an ILLEGAL token; its literal is the message.
    #[error("{0}")]
    Scan(String),

    /// The current token cannot start an expression.
    #[error("no prefix parse function for {0} found")]
    NoPrefixFn(TokenKind),

    /// The current token cannot extend an expression.
    #[error("no infix parse function for {0} found")]
    NoInfixFn(TokenKind),

    /// The next token has no precedence entry at all.
    #[error("no precedence for {0} found")]
    NoPrecedence(TokenKind),

    /// A specific token was required next.
    #[error("expected next token to be {expected}, got {got} instead")]
    UnexpectedToken { expected: TokenKind, got: TokenKind },

    /// The input ended in the middle of an expression.
    #[error("unexpected EOF")]
    UnexpectedEof,

    /// `()` with nothing inside.
    #[error("empty `()` is not supported")]
    EmptyParens,

    /// The callee of a call was not a plain identifier.
    #[error("expected identifier, got {0}")]
    CalleeNotIdentifier(String),

    /// The BETWEEN range did not come out `lo AND hi` shaped.
    #[error("expected AND expression in BETWEEN, got {0}")]
    MalformedBetweenRange(String),

    /// A complete expression was followed by more input.
    #[error("unexpected token {0} after expression")]
    TrailingToken(TokenKind),

    /// The expression nests deeper than [`MAX_PARSE_DEPTH`].
    #[error("expression tree is too deep (maximum depth {})", MAX_PARSE_DEPTH)]
    TooDeep,
}

// ---------------------------------------------------------------------------
// Precedence ladder
// ---------------------------------------------------------------------------

/// Operator precedence, low to high. Larger binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    As,
    In,
    Cond,
    Not,
    Is,
    Equals,
    LessGreater,
    Sum,
    Product,
    Mod,
    Prefix,
    Call,
    Highest,
}

impl Precedence {
    /// Precedence entry for a token kind.
    ///
    /// Expression terminators map to `Lowest` so the climbing loop halts on
    /// them; kinds with no entry return `None` and become a diagnostic.
    #[must_use]
    pub fn of(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Eof
            | TokenKind::Comma
            | TokenKind::RParen
            | TokenKind::When
            | TokenKind::Then
            | TokenKind::Else
            | TokenKind::End => Some(Self::Lowest),

            TokenKind::As => Some(Self::As),

            TokenKind::In
            | TokenKind::NotIn
            | TokenKind::Like
            | TokenKind::NotLike
            | TokenKind::Between
            | TokenKind::NotBetween => Some(Self::In),

            TokenKind::And | TokenKind::Or => Some(Self::Cond),

            TokenKind::Not => Some(Self::Not),

            TokenKind::Is | TokenKind::IsNot => Some(Self::Is),

            TokenKind::Eq | TokenKind::BangEq | TokenKind::NotEq | TokenKind::LtEqGt => {
                Some(Self::Equals)
            }

            TokenKind::Lt | TokenKind::LtEq | TokenKind::Gt | TokenKind::GtEq => {
                Some(Self::LessGreater)
            }

            TokenKind::Plus | TokenKind::Minus => Some(Self::Sum),
            TokenKind::Asterisk | TokenKind::Slash => Some(Self::Product),
            TokenKind::Mod => Some(Self::Mod),
            TokenKind::Tilde => Some(Self::Prefix),
            TokenKind::LParen => Some(Self::Call),

            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Pull-driven Pratt parser over a [`Lexer`].
///
/// One parser per input: construct, call [`Parser::parse_expression`] once,
/// discard. The two-token window (`cur`, `peek`) is the only parse state
/// besides the recursion depth.
pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    depth: u32,
}

impl Parser {
    #[must_use]
    pub fn new(mut lexer: Lexer) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            cur,
            peek,
            depth: 0,
        }
    }

    #[must_use]
    pub fn from_input(input: &str) -> Self {
        Self::new(Lexer::new(input))
    }

    /// Parse the whole input as one expression.
    ///
    /// Empty input is a distinguished absence (`Ok(None)`), not an error.
    /// Anything left over after a complete expression is a diagnostic.
    pub fn parse_expression(&mut self) -> Result<Option<Expr>, ParseError> {
        let span = tracing::debug_span!(
            target: "sqlfence.parse",
            "parse_expression",
            input_chars = self.lexer.len() as u64,
            outcome = tracing::field::Empty,
        );
        let _guard = span.enter();

        match self.parse_expression_inner() {
            Ok(expr) => {
                SQLFENCE_PARSE_EXPRESSIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
                span.record("outcome", "ok");
                Ok(expr)
            }
            Err(err) => {
                SQLFENCE_PARSE_ERRORS_TOTAL.fetch_add(1, Ordering::Relaxed);
                span.record("outcome", "rejected");
                tracing::debug!(target: "sqlfence.parse", error = %err, "expression rejected");
                Err(err)
            }
        }
    }

    fn parse_expression_inner(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.lexer.is_empty() {
            return Ok(None);
        }
        let expr = self.parse_expr(Precedence::Lowest)?;
        match self.peek.kind {
            TokenKind::Eof => Ok(Some(expr)),
            TokenKind::Illegal => Err(ParseError::Scan(self.peek.literal.clone())),
            kind => Err(ParseError::TrailingToken(kind)),
        }
    }

    // -----------------------------------------------------------------------
    // Driver
    // -----------------------------------------------------------------------

    fn parse_expr(&mut self, precedence: Precedence) -> Result<Expr, ParseError> {
        self.enter_recursion()?;
        let result = self.parse_expr_at(precedence);
        self.leave_recursion();
        result
    }

    fn parse_expr_at(&mut self, precedence: Precedence) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;
        loop {
            let peek_precedence = self.peek_precedence()?;
            if peek_precedence <= precedence {
                break;
            }
            self.next_token();
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn enter_recursion(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(ParseError::TooDeep);
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // -----------------------------------------------------------------------
    // Token window
    // -----------------------------------------------------------------------

    fn next_token(&mut self) {
        self.cur = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn peek_precedence(&self) -> Result<Precedence, ParseError> {
        if self.peek.is_illegal() {
            return Err(ParseError::Scan(self.peek.literal.clone()));
        }
        Precedence::of(self.peek.kind).ok_or(ParseError::NoPrecedence(self.peek.kind))
    }

    fn cur_precedence(&self) -> Precedence {
        Precedence::of(self.cur.kind).unwrap_or(Precedence::Lowest)
    }

    fn expect_peek(&mut self, expected: TokenKind) -> Result<(), ParseError> {
        if self.peek_is(expected) {
            self.next_token();
            return Ok(());
        }
        if self.peek.is_illegal() {
            return Err(ParseError::Scan(self.peek.literal.clone()));
        }
        Err(ParseError::UnexpectedToken {
            expected,
            got: self.peek.kind,
        })
    }

    // -----------------------------------------------------------------------
    // Prefix dispatch
    // -----------------------------------------------------------------------

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        match self.cur.kind {
            TokenKind::Illegal => Err(ParseError::Scan(self.cur.literal.clone())),
            TokenKind::Eof => Err(ParseError::UnexpectedEof),

            TokenKind::Ident | TokenKind::BackQuoteIdent | TokenKind::DoubleQuoteIdent => {
                Ok(Expr::Identifier(self.parse_identifier()))
            }
            TokenKind::Number => Ok(Expr::Number(NumberLiteral {
                token: self.cur.clone(),
            })),
            TokenKind::String => Ok(Expr::String(StringLiteral {
                token: self.cur.clone(),
            })),
            TokenKind::True | TokenKind::False => Ok(Expr::Boolean(BooleanLiteral {
                token: self.cur.clone(),
            })),
            TokenKind::Null => Ok(Expr::Null(NullLiteral {
                token: self.cur.clone(),
            })),

            TokenKind::Minus | TokenKind::Plus | TokenKind::Tilde | TokenKind::Distinct => {
                self.parse_prefix_expression()
            }
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::Case => self.parse_case_when_expression(),

            kind => Err(ParseError::NoPrefixFn(kind)),
        }
    }

    fn parse_identifier(&self) -> Identifier {
        Identifier {
            token: self.cur.clone(),
            value: self.cur.literal.clone(),
        }
    }

    /// `-x`, `+x`, `~x`, `DISTINCT x`. The operand is parsed at PREFIX
    /// precedence, so `-x + y` is `(-x) + y`.
    fn parse_prefix_expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.cur.clone();
        self.next_token();
        let operand = self.parse_expr(Precedence::Prefix)?;
        Ok(Expr::Prefix(PrefixExpression {
            token,
            operand: Box::new(operand),
        }))
    }

    /// `(expr)` grouping or `(e0, e1, …)` tuple.
    ///
    /// A single parenthesised expression decays to the inner expression;
    /// two or more become a tuple; zero is rejected outright.
    fn parse_grouped_expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.cur.clone();
        if self.peek_is(TokenKind::RParen) {
            return Err(ParseError::EmptyParens);
        }

        self.next_token();
        let first = self.parse_expr(Precedence::Lowest)?;

        let mut elements = vec![first];
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            elements.push(self.parse_expr(Precedence::Lowest)?);
        }
        self.expect_peek(TokenKind::RParen)?;

        if elements.len() == 1 {
            Ok(elements.remove(0))
        } else {
            Ok(Expr::Tuple(TupleExpression { token, elements }))
        }
    }

    /// `CASE WHEN … THEN … [WHEN …]* [ELSE …] END`, at least one arm.
    fn parse_case_when_expression(&mut self) -> Result<Expr, ParseError> {
        let token = self.cur.clone();
        self.expect_peek(TokenKind::When)?;

        let mut whens = Vec::new();
        loop {
            // cur is WHEN here.
            self.next_token();
            let cond = self.parse_expr(Precedence::Lowest)?;
            self.expect_peek(TokenKind::Then)?;
            self.next_token();
            let then = self.parse_expr(Precedence::Lowest)?;
            whens.push(WhenClause { cond, then });

            if self.peek_is(TokenKind::When) {
                self.next_token();
            } else {
                break;
            }
        }

        let else_expr = if self.peek_is(TokenKind::Else) {
            self.next_token();
            self.next_token();
            Some(Box::new(self.parse_expr(Precedence::Lowest)?))
        } else {
            None
        };

        self.expect_peek(TokenKind::End)?;
        Ok(Expr::CaseWhen(CaseWhenExpression {
            token,
            whens,
            else_expr,
        }))
    }

    // -----------------------------------------------------------------------
    // Infix dispatch
    // -----------------------------------------------------------------------

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ParseError> {
        match self.cur.kind {
            TokenKind::LParen => self.parse_call_expression(left),
            TokenKind::Between => self.parse_between_expression(left, false),
            TokenKind::NotBetween => self.parse_between_expression(left, true),

            TokenKind::In
            | TokenKind::NotIn
            | TokenKind::Is
            | TokenKind::IsNot
            | TokenKind::Like
            | TokenKind::NotLike
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Mod
            | TokenKind::Eq
            | TokenKind::BangEq
            | TokenKind::NotEq
            | TokenKind::LtEqGt
            | TokenKind::Lt
            | TokenKind::LtEq
            | TokenKind::Gt
            | TokenKind::GtEq => self.parse_infix_expression(left),

            kind => Err(ParseError::NoInfixFn(kind)),
        }
    }

    fn parse_infix_expression(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let token = self.cur.clone();
        let precedence = self.cur_precedence();
        self.next_token();
        let right = self.parse_expr(precedence)?;
        Ok(Expr::Infix(InfixExpression {
            token,
            left: Box::new(left),
            right: Box::new(right),
        }))
    }

    /// `left BETWEEN lo AND hi` / `left NOT BETWEEN lo AND hi`.
    ///
    /// The range is parsed as one expression at the bottom of the ladder;
    /// AND binds tighter than BETWEEN, so a well-formed range comes out as
    /// an AND infix node. Any other shape is rejected here, in one place.
    fn parse_between_expression(&mut self, left: Expr, negated: bool) -> Result<Expr, ParseError> {
        let token = self.cur.clone();
        self.next_token();
        let range = self.parse_expr(Precedence::Lowest)?;

        let range = match range {
            Expr::Infix(infix) if infix.token.kind == TokenKind::And => Box::new(infix),
            other => return Err(ParseError::MalformedBetweenRange(other.to_string())),
        };

        if negated {
            Ok(Expr::NotBetween(NotBetweenExpression {
                token,
                left: Box::new(left),
                range,
            }))
        } else {
            Ok(Expr::Between(BetweenExpression {
                token,
                left: Box::new(left),
                range,
            }))
        }
    }

    /// `callee(arg, …)`. Only identifiers are callable.
    fn parse_call_expression(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let token = self.cur.clone();
        let Expr::Identifier(callee) = left else {
            return Err(ParseError::CalleeNotIdentifier(
                left.token_literal().to_owned(),
            ));
        };
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Ok(Expr::Call(CallExpression {
            token,
            callee,
            arguments,
        }))
    }

    /// Comma-separated, possibly empty expression list ending at `end`.
    fn parse_expression_list(&mut self, end: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Ok(list);
        }

        self.next_token();
        list.push(self.parse_expr(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expr(Precedence::Lowest)?);
        }
        self.expect_peek(end)?;
        Ok(list)
    }
}
