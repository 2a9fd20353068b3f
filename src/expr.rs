use serde::Serialize;

use crate::token::Token;
use crate::value::Value;

/// One `identifier = value` pair of a `let` list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub identifier: Token,
    pub value: Expr,
}

/// `function NAME(params) => body`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub identifier: Token,
    pub parameters: Vec<Token>,
    pub body: Box<Expr>,

    /// Whether a later declaration with the same name and arity may replace
    /// this one.
    pub overwritable: bool,
}

impl FunctionDecl {
    pub fn name(&self) -> &str {
        &self.identifier.lexeme
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// **Abstract‑Syntax‑Tree node** for every HULK expression.  Nodes are never
/// mutated once built; see [`crate::replacer`] for rewriting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Number, string or boolean constant (including `PI` and `E`).
    Literal { value: Value, offset: usize },

    /// Prefix `!` or `-`.
    Unary {
        operator: Token,
        operand: Box<Expr>,
    },

    /// Infix operator expression, e.g. `a + b`, `x <= y`, `s @ t`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `if (condition) then_branch else else_branch`
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,

        /// Offset of the `if` keyword.
        then_offset: usize,

        /// Offset of the `else` keyword.
        else_offset: usize,
    },

    /// `let a = 1, b = a + 1 in body`
    Let {
        bindings: Vec<Binding>,
        body: Box<Expr>,
    },

    /// Reference to a `let`-bound name or parameter.
    Variable { identifier: Token },

    /// Top-level function declaration.
    Function(FunctionDecl),

    /// `name(arg, ...)`
    Call {
        identifier: Token,
        arguments: Vec<Expr>,
    },
}

impl Expr {
    /// Best-effort source offset of the expression, used for carets.
    pub fn offset(&self) -> usize {
        match self {
            Expr::Literal { offset, .. } => *offset,

            Expr::Unary { operator, .. } => operator.offset,

            Expr::Binary { left, .. } => left.offset(),

            Expr::Conditional { then_offset, .. } => *then_offset,

            Expr::Let { bindings, body } => bindings
                .first()
                .map(|b| b.identifier.offset)
                .unwrap_or_else(|| body.offset()),

            Expr::Variable { identifier } => identifier.offset,

            Expr::Function(decl) => decl.identifier.offset,

            Expr::Call { identifier, .. } => identifier.offset,
        }
    }
}
