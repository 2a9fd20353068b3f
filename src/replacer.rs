//! Identifier substitution over an AST subtree.
//!
//! A function parameter may share its name with a function that is declared
//! later in the session:
//!
//! ```text
//! function thisIsFun(sum) => "ja ja ja";
//! thisIsFun(2);                 // ja ja ja
//! function sum(a, b) => a + b;
//! thisIsFun(2);                 // still ja ja ja
//! ```
//!
//! The interpreter renames every parameter to a name no source text can
//! spell when the function is declared, so stored bodies never start
//! resolving a parameter against a newer function.

use log::debug;

use crate::expr::{Binding, Expr, FunctionDecl};
use crate::token::Token;

/// Rewrites every occurrence of `old` into `new`, keeping each occurrence's
/// own offset.
pub struct Replacer<'t> {
    old: &'t Token,
    new: &'t Token,
}

impl<'t> Replacer<'t> {
    pub fn new(old: &'t Token, new: &'t Token) -> Self {
        debug!("Replacer '{}' -> '{}'", old.lexeme, new.lexeme);

        Self { old, new }
    }

    /// Build a structurally new tree; `expr` is left untouched.
    pub fn replace(&self, expr: &Expr) -> Expr {
        match expr {
            Expr::Literal { .. } => expr.clone(),

            Expr::Unary { operator, operand } => Expr::Unary {
                operator: operator.clone(),
                operand: Box::new(self.replace(operand)),
            },

            Expr::Binary {
                left,
                operator,
                right,
            } => Expr::Binary {
                left: Box::new(self.replace(left)),
                operator: operator.clone(),
                right: Box::new(self.replace(right)),
            },

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                then_offset,
                else_offset,
            } => Expr::Conditional {
                condition: Box::new(self.replace(condition)),
                then_branch: Box::new(self.replace(then_branch)),
                else_branch: Box::new(self.replace(else_branch)),
                then_offset: *then_offset,
                else_offset: *else_offset,
            },

            Expr::Let { bindings, body } => Expr::Let {
                bindings: bindings
                    .iter()
                    .map(|b| Binding {
                        identifier: self.token(&b.identifier),
                        value: self.replace(&b.value),
                    })
                    .collect(),
                body: Box::new(self.replace(body)),
            },

            Expr::Variable { identifier } => Expr::Variable {
                identifier: self.token(identifier),
            },

            Expr::Function(decl) => Expr::Function(self.replace_function(decl)),

            Expr::Call {
                identifier,
                arguments,
            } => Expr::Call {
                identifier: self.token(identifier),
                arguments: arguments.iter().map(|a| self.replace(a)).collect(),
            },
        }
    }

    pub fn replace_function(&self, decl: &FunctionDecl) -> FunctionDecl {
        FunctionDecl {
            identifier: self.token(&decl.identifier),
            parameters: decl.parameters.iter().map(|p| self.token(p)).collect(),
            body: Box::new(self.replace(&decl.body)),
            overwritable: decl.overwritable,
        }
    }

    fn token(&self, actual: &Token) -> Token {
        if actual.lexeme == self.old.lexeme {
            actual.renamed_like(self.new)
        } else {
            actual.clone()
        }
    }
}

/// Shorthand for `Replacer::new(old, new).replace(expr)`.
pub fn substitute(expr: &Expr, old: &Token, new: &Token) -> Expr {
    Replacer::new(old, new).replace(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::scan;
    use crate::token::TokenType;

    fn parse(source: &str) -> Expr {
        let tokens = scan(source).expect("scan");
        Parser::new(&tokens).parse().expect("parse")
    }

    #[test]
    fn renames_every_occurrence_and_keeps_offsets() {
        let expr = parse("if (x < 0) -x else let x = x in f(x);");
        let old = Token::new(TokenType::IDENTIFIER, "x", 0);
        let new = Token::new(TokenType::IDENTIFIER, "y", 99);

        let replaced = substitute(&expr, &old, &new);

        let Expr::Conditional {
            condition,
            then_branch,
            else_branch,
            ..
        } = &replaced
        else {
            panic!("expected a conditional, got {:?}", replaced);
        };

        let Expr::Binary { left, .. } = condition.as_ref() else {
            panic!("expected a comparison");
        };
        assert_eq!(
            **left,
            Expr::Variable {
                identifier: Token::new(TokenType::IDENTIFIER, "y", 4)
            }
        );

        let Expr::Unary { operand, .. } = then_branch.as_ref() else {
            panic!("expected a negation");
        };
        assert_eq!(operand.offset(), 12);

        let Expr::Let { bindings, body } = else_branch.as_ref() else {
            panic!("expected a let");
        };
        assert_eq!(bindings[0].identifier.lexeme, "y");
        assert_eq!(bindings[0].identifier.offset, 23);

        let Expr::Call { arguments, .. } = body.as_ref() else {
            panic!("expected a call");
        };
        assert_eq!(arguments[0].offset(), 34);
    }

    #[test]
    fn leaves_the_original_tree_alone() {
        let expr = parse("a + b;");
        let old = Token::new(TokenType::IDENTIFIER, "a", 0);
        let new = Token::new(TokenType::IDENTIFIER, "z", 0);

        let replaced = substitute(&expr, &old, &new);

        assert_ne!(replaced, expr);
        assert_eq!(expr, parse("a + b;"));
    }
}
