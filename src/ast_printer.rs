use crate::expr::{Expr, FunctionDecl};
use crate::value::Value;

/// Converts an expression to a parenthesised prefix form, e.g.
/// `2 + 3 * 4` → `(+ 2 (* 3 4))`.  Parentheses in the source leave no trace,
/// so the output shows exactly how the parser grouped the operators.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal { value, .. } => match value {
                Value::Str(s) => format!("{:?}", s),

                Value::Bool(true) => "true".into(),

                Value::Bool(false) => "false".into(),

                Value::Number(_) => value.to_string(),
            },

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, operand } => {
                format!("({} {})", operator.lexeme, Self::print(operand))
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── control ─────────────────────────────────────────────────
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(if {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Let { bindings, body } => {
                let pairs: Vec<String> = bindings
                    .iter()
                    .map(|b| format!("({} {})", b.identifier.lexeme, Self::print(&b.value)))
                    .collect();

                format!("(let ({}) {})", pairs.join(" "), Self::print(body))
            }

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { identifier } => identifier.lexeme.clone(),

            Expr::Call {
                identifier,
                arguments,
            } => {
                let mut s = format!("(call {}", identifier.lexeme);
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Function(decl) => Self::print_function(decl),
        }
    }

    fn print_function(decl: &FunctionDecl) -> String {
        let params: Vec<&str> = decl.parameters.iter().map(|p| p.lexeme.as_str()).collect();

        format!(
            "(function {} ({}) {})",
            decl.name(),
            params.join(" "),
            Self::print(&decl.body)
        )
    }
}
