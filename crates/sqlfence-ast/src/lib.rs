//! Expression tree node types for sqlfence.
//!
//! The parser produces a tree of these nodes from a single SQL expression
//! fragment. The tree is a closed sum type: every consumer (the stringifier,
//! downstream validators and dialect rewriters) matches exhaustively over
//! [`Expr`]. Nodes are immutable once built and each carries the token it
//! originated from, so diagnostics can always point at concrete source text.

mod display;

use sqlfence_token::{Token, TokenKind};

/// A parsed SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(Identifier),
    Number(NumberLiteral),
    String(StringLiteral),
    Boolean(BooleanLiteral),
    Null(NullLiteral),
    Prefix(PrefixExpression),
    Infix(InfixExpression),
    Call(CallExpression),
    CaseWhen(CaseWhenExpression),
    Between(BetweenExpression),
    NotBetween(NotBetweenExpression),
    Tuple(TupleExpression),
}

impl Expr {
    /// The literal text of the token this node originated from.
    #[must_use]
    pub fn token_literal(&self) -> &str {
        match self {
            Self::Identifier(n) => &n.token.literal,
            Self::Number(n) => &n.token.literal,
            Self::String(n) => &n.token.literal,
            Self::Boolean(n) => &n.token.literal,
            Self::Null(n) => &n.token.literal,
            Self::Prefix(n) => &n.token.literal,
            Self::Infix(n) => &n.token.literal,
            Self::Call(n) => &n.token.literal,
            Self::CaseWhen(n) => &n.token.literal,
            Self::Between(n) => &n.token.literal,
            Self::NotBetween(n) => &n.token.literal,
            Self::Tuple(n) => &n.token.literal,
        }
    }
}

/// An unquoted, back-quoted, or double-quoted name.
///
/// Quoted forms keep their quoting characters in `value`, so stringify
/// reproduces the source form exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

/// A numeric literal in any of the supported bases.
///
/// The lexical form is preserved (`"0x1af"`, `"12.e-3"`, `"0b01010"`);
/// deciding the numeric type is the consumer's business.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub token: Token,
}

/// A `'...'` string literal, delimiters and escapes preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub token: Token,
}

/// `TRUE` or `FALSE` in any capitalization.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanLiteral {
    pub token: Token,
}

impl BooleanLiteral {
    /// The boolean value, carried by the token kind rather than the spelling.
    #[must_use]
    pub fn value(&self) -> bool {
        self.token.kind == TokenKind::True
    }
}

/// `NULL` in any capitalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NullLiteral {
    pub token: Token,
}

/// A unary operator (`+`, `-`, `~`, `DISTINCT`) applied to one operand.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    /// The operator token.
    pub token: Token,
    pub operand: Box<Expr>,
}

impl PrefixExpression {
    /// Canonical spelling of the operator.
    #[must_use]
    pub fn operator(&self) -> &'static str {
        self.token.kind.as_str()
    }
}

/// A binary operator applied to two operands.
///
/// The operator token distinguishes arithmetic, comparison, logical,
/// membership, pattern-matching, and null-test operators; both sides are
/// always present.
#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    /// The operator token.
    pub token: Token,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

impl InfixExpression {
    /// Canonical spelling of the operator (`AND`, `IS NOT`, `<=`, …).
    #[must_use]
    pub fn operator(&self) -> &'static str {
        self.token.kind.as_str()
    }
}

/// A function call. The callee is always an identifier; lambdas, subscripts,
/// and method chains are not expressions in this grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The `(` token that opened the argument list.
    pub token: Token,
    pub callee: Identifier,
    pub arguments: Vec<Expr>,
}

/// One `WHEN <cond> THEN <then>` arm of a CASE expression.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenClause {
    pub cond: Expr,
    pub then: Expr,
}

/// `CASE WHEN … THEN … [WHEN …]* [ELSE …] END`. At least one arm.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseWhenExpression {
    /// The `CASE` token.
    pub token: Token,
    pub whens: Vec<WhenClause>,
    pub else_expr: Option<Box<Expr>>,
}

/// `<left> BETWEEN <lo> AND <hi>`.
///
/// The range is the `lo AND hi` sub-tree; the type guarantees it is an
/// infix node and the parser guarantees its operator is `AND`.
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenExpression {
    /// The `BETWEEN` token.
    pub token: Token,
    pub left: Box<Expr>,
    pub range: Box<InfixExpression>,
}

/// `<left> NOT BETWEEN <lo> AND <hi>`.
#[derive(Debug, Clone, PartialEq)]
pub struct NotBetweenExpression {
    /// The `NOT BETWEEN` token.
    pub token: Token,
    pub left: Box<Expr>,
    pub range: Box<InfixExpression>,
}

/// A parenthesised, comma-separated list of two or more expressions.
///
/// A single parenthesised expression decays to the inner expression and
/// never produces a tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleExpression {
    /// The `(` token.
    pub token: Token,
    pub elements: Vec<Expr>,
}
