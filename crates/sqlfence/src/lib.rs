//! Public API facade for sqlfence.
//!
//! sqlfence accepts a single SQL *expression* fragment — the kind that
//! appears after `SELECT`, inside a `WHERE` predicate, or as a column
//! projection — and produces a typed syntax tree suitable for rewriting,
//! validation, or translation across dialects (MySQL, PostgreSQL,
//! ClickHouse, SQLite, Oracle, SparkSQL, MSSQL). It deliberately rejects
//! statement-level SQL: comments, semicolons, and keywords like `SELECT` or
//! `INSERT` fail in the scanner, before parsing even starts, which makes
//! the parser double as an injection guard for expression inputs.
//!
//! ```
//! let expr = sqlfence::parse_expression("price BETWEEN 10 AND 20")
//!     .expect("valid expression")
//!     .expect("non-empty input");
//! assert_eq!(sqlfence::stringify(&expr), "(price BETWEEN (10 AND 20))");
//!
//! assert!(sqlfence::parse_expression("1; DROP TABLE users --").is_err());
//! ```

pub use sqlfence_ast::{
    BetweenExpression, BooleanLiteral, CallExpression, CaseWhenExpression, Expr, Identifier,
    InfixExpression, NotBetweenExpression, NullLiteral, NumberLiteral, PrefixExpression,
    StringLiteral, TupleExpression, WhenClause,
};
pub use sqlfence_parser::{Lexer, ParseError, Parser, Precedence, MAX_PARSE_DEPTH};
pub use sqlfence_token::{lookup_ident, Token, TokenKind};

/// Parse one SQL expression fragment.
///
/// Returns `Ok(None)` for empty input (a distinguished absence, not an
/// error) and the first scan or parse error otherwise.
pub fn parse_expression(input: &str) -> Result<Option<Expr>, ParseError> {
    Parser::from_input(input).parse_expression()
}

/// Canonical textual form of an expression tree.
#[must_use]
pub fn stringify(expr: &Expr) -> String {
    expr.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &str) -> String {
        match parse_expression(input) {
            Ok(Some(expr)) => stringify(&expr),
            Ok(None) => unreachable!("no expression for {input:?}"),
            Err(err) => unreachable!("parse error for {input:?}: {err}"),
        }
    }

    fn rejection(input: &str) -> String {
        match parse_expression(input) {
            Ok(expr) => unreachable!("expected rejection for {input:?}, got {expr:?}"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(roundtrip("1 + 2 * 3"), "(1 + (2 * 3))");
    }

    #[test]
    fn test_between_range_shape() {
        let expr = parse_expression("x BETWEEN 1 AND 10")
            .expect("parses")
            .expect("non-empty");
        match &expr {
            Expr::Between(between) => {
                assert_eq!(between.left.to_string(), "x");
                assert_eq!(between.range.to_string(), "(1 AND 10)");
            }
            other => unreachable!("expected BETWEEN, got {other:?}"),
        }
        assert_eq!(stringify(&expr), "(x BETWEEN (1 AND 10))");
    }

    #[test]
    fn test_not_in_tuple() {
        assert_eq!(roundtrip("x NOT IN (1, 2, 3)"), "(x NOT IN (1, 2, 3))");
    }

    #[test]
    fn test_case_when() {
        assert_eq!(
            roundtrip("CASE WHEN x > 0 THEN 1 WHEN x < 0 THEN -1 ELSE 0 END"),
            "CASE WHEN (x > 0) THEN 1 WHEN (x < 0) THEN (-1) ELSE 0 END"
        );
    }

    #[test]
    fn test_distinct_prefix() {
        assert_eq!(roundtrip("DISTINCT col"), "(DISTINCT col)");
    }

    #[test]
    fn test_call_with_predicate_argument() {
        assert_eq!(roundtrip("sumIf(a, b > 0)"), "sumIf(a, (b > 0))");
    }

    #[test]
    fn test_injection_after_string_literal() {
        assert_eq!(
            rejection("'hello'; DROP TABLE t --'"),
            "not support token `;`"
        );
    }

    #[test]
    fn test_is_not_null() {
        assert_eq!(roundtrip("x IS NOT NULL"), "(x IS NOT NULL)");
    }

    #[test]
    fn test_empty_parens_rejected() {
        assert_eq!(rejection("()"), "empty `()` is not supported");
    }

    #[test]
    fn test_empty_input_is_absence() {
        assert_eq!(parse_expression(""), Ok(None));
    }

    #[test]
    fn test_statement_keywords_rejected() {
        for input in [
            "SELECT a",
            "a union b",
            "Insert into t",
            "x WHERE y",
            "drop(1)",
        ] {
            let message = rejection(input);
            assert!(
                message.starts_with("not support keyword: "),
                "{input:?} rejected with {message:?}"
            );
        }
    }

    #[test]
    fn test_comments_rejected_outside_literals() {
        assert_eq!(
            rejection("1 -- drop"),
            "not support SQL comment: \"-- drop\""
        );
        assert_eq!(
            rejection("1 /* drop */ + 2"),
            "not support SQL comment: \"/* drop */\""
        );
        assert_eq!(rejection("1 # drop"), "not support SQL comment: \"# drop\"");
        // Inside a string literal the same bytes are data, not a comment.
        assert_eq!(roundtrip("'a -- b'"), "'a -- b'");
    }

    #[test]
    fn test_unicode_passthrough() {
        assert_eq!(roundtrip("name = ' 你好世界! '"), "(name = ' 你好世界! ')");
        assert_eq!(roundtrip("`поле` > 1"), "(`поле` > 1)");
    }

    #[test]
    fn test_stringify_of_reparsed_output_is_stable() {
        let inputs = [
            "sumIf(a, b > 0) + countIf(c < 0)",
            "x NOT BETWEEN lo AND hi",
            "(a, 'b', 3.5, `d`)",
            "CASE WHEN ok THEN 'yes' END",
        ];
        for input in inputs {
            let once = roundtrip(input);
            assert_eq!(roundtrip(&once), once, "{input:?}");
        }
    }
}
