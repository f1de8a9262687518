//! Canonical textual form for every expression node.
//!
//! The string form doubles as the primary test oracle: parsing the output
//! of `Display` yields a tree whose own output is identical (round-trip
//! idempotence). Operator spellings are canonicalized from the token kind;
//! literal nodes reproduce their source text verbatim.

use std::fmt;

use crate::{
    BetweenExpression, BooleanLiteral, CallExpression, CaseWhenExpression, Expr, Identifier,
    InfixExpression, NotBetweenExpression, NullLiteral, NumberLiteral, PrefixExpression,
    StringLiteral, TupleExpression,
};
use sqlfence_token::TokenKind;

// ---------------------------------------------------------------------------
// Helper: write a comma-separated list
// ---------------------------------------------------------------------------

fn comma_list(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Expr
// ---------------------------------------------------------------------------

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(n) => write!(f, "{n}"),
            Self::Boolean(n) => write!(f, "{n}"),
            Self::Null(n) => write!(f, "{n}"),
            Self::Prefix(n) => write!(f, "{n}"),
            Self::Infix(n) => write!(f, "{n}"),
            Self::Call(n) => write!(f, "{n}"),
            Self::CaseWhen(n) => write!(f, "{n}"),
            Self::Between(n) => write!(f, "{n}"),
            Self::NotBetween(n) => write!(f, "{n}"),
            Self::Tuple(n) => write!(f, "{n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token.literal)
    }
}

impl fmt::Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token.literal)
    }
}

impl fmt::Display for BooleanLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token.literal)
    }
}

impl fmt::Display for NullLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token.literal)
    }
}

// ---------------------------------------------------------------------------
// Compound nodes
// ---------------------------------------------------------------------------

impl fmt::Display for PrefixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // DISTINCT is a word, the sign operators are not.
        if self.token.kind == TokenKind::Distinct {
            write!(f, "({} {})", self.operator(), self.operand)
        } else {
            write!(f, "({}{})", self.operator(), self.operand)
        }
    }
}

impl fmt::Display for InfixExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.left, self.operator(), self.right)
    }
}

impl fmt::Display for CallExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.callee)?;
        comma_list(f, &self.arguments)?;
        f.write_str(")")
    }
}

impl fmt::Display for CaseWhenExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CASE")?;
        for when in &self.whens {
            write!(f, " WHEN {} THEN {}", when.cond, when.then)?;
        }
        if let Some(else_expr) = &self.else_expr {
            write!(f, " ELSE {else_expr}")?;
        }
        f.write_str(" END")
    }
}

impl fmt::Display for BetweenExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} BETWEEN {})", self.left, self.range)
    }
}

impl fmt::Display for NotBetweenExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} NOT BETWEEN {})", self.left, self.range)
    }
}

impl fmt::Display for TupleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        comma_list(f, &self.elements)?;
        f.write_str(")")
    }
}
