use std::fmt;
use std::io::{self, Stdout, Write};

use log::{debug, info};

use crate::builtin::Builtin;
use crate::environment::Environment;
use crate::error::{HulkError, Result, SemanticKind};
use crate::expr::{Expr, FunctionDecl};
use crate::parser::Parser;
use crate::replacer::Replacer;
use crate::scanner::scan;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Default ceiling on nested user function calls.
pub const MAX_CALL_DEPTH: usize = 3500;

/// Below this much free host stack, `evaluate` continues on a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each host stack segment allocated on demand.
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

/// Session policy knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Nested user function calls allowed before `StackLimitExceeded`.
    pub max_call_depth: usize,

    /// Whether functions declared in this session may later be redeclared
    /// with the same name and arity.  Stamped on every declaration as its
    /// `overwritable` flag.
    pub allow_redefinition: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: MAX_CALL_DEPTH,
            allow_redefinition: true,
        }
    }
}

/// Which operand failed a type check.
#[derive(Debug, Clone, Copy)]
enum Operand {
    Left,
    Right,
    Only,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Left => write!(f, " left "),
            Operand::Right => write!(f, " right "),
            Operand::Only => write!(f, " "),
        }
    }
}

/// Tree-walking evaluator.  One instance is one REPL session: the function
/// table persists across [`Interpreter::run`] calls, variables never do.
///
/// `print` writes to `W` (stdout unless built with [`Interpreter::with_output`]).
pub struct Interpreter<W: Write = Stdout> {
    environment: Environment,
    config: InterpreterConfig,
    nested_calls: usize,
    output: W,
}

impl Interpreter<Stdout> {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self::with_output(io::stdout(), config)
    }
}

impl Default for Interpreter<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W, config: InterpreterConfig) -> Self {
        info!("Initializing Interpreter with {:?}", config);

        Self {
            environment: Environment::new(),
            config,
            nested_calls: 0,
            output,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Scan, parse and interpret one line.
    pub fn run(&mut self, source: &str) -> Result<Option<String>> {
        info!("Running line: {}", source);

        let tokens: Vec<Token> = scan(source)?;
        let expr: Expr = Parser::new(&tokens).parse()?;

        self.interpret(&expr)
    }

    /// Interpret one parsed statement.  `None` means the statement has no
    /// value (a function declaration).
    pub fn interpret(&mut self, expr: &Expr) -> Result<Option<String>> {
        self.nested_calls = 0;

        match expr {
            Expr::Function(decl) => {
                self.declare(decl)?;

                Ok(None)
            }

            _ => {
                let value: Value = self.evaluate(expr)?;

                info!("Statement evaluated to: {}", value);

                Ok(Some(value.to_string()))
            }
        }
    }

    /// Rename the parameters to names no source text can spell, then
    /// register the function.
    fn declare(&mut self, decl: &FunctionDecl) -> Result<()> {
        debug!("Declaring function '{}/{}'", decl.name(), decl.arity());

        let mut body: Expr = decl.body.as_ref().clone();
        let mut parameters: Vec<Token> = Vec::with_capacity(decl.arity());

        for param in &decl.parameters {
            let hidden = Token::new(
                TokenType::IDENTIFIER,
                format!("{}/{}::{}", decl.name(), decl.arity(), param.lexeme),
                param.offset,
            );
            let replacer = Replacer::new(param, &hidden);

            body = replacer.replace(&body);
            parameters.push(param.renamed_like(&hidden));
        }

        self.environment.register_function(FunctionDecl {
            identifier: decl.identifier.clone(),
            parameters,
            body: Box::new(body),
            overwritable: self.config.allow_redefinition,
        })
    }

    /// Evaluates an expression and returns a Value.
    ///
    /// Every nested evaluation passes through here, so the host stack is
    /// grown on demand and any ceiling in [`InterpreterConfig`] is reachable
    /// from an ordinary thread.
    fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.evaluate_node(expr))
    }

    fn evaluate_node(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(value.clone()),

            Expr::Unary { operator, operand } => self.evaluate_unary(operator, operand),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.evaluate_conditional(condition, then_branch, else_branch),

            Expr::Let { bindings, body } => self.evaluate_let(
                bindings.iter().map(|b| (&b.identifier, &b.value)),
                body,
            ),

            Expr::Variable { identifier } => self.environment.get(identifier),

            Expr::Call {
                identifier,
                arguments,
            } => self.evaluate_call(identifier, arguments),

            Expr::Function(decl) => Err(HulkError::internal(format!(
                "declaration of '{}' reached the evaluator inside an expression",
                decl.name()
            ))),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, operand: &Expr) -> Result<Value> {
        debug!("Evaluating unary operation: {}", operator.lexeme);

        let value: Value = self.evaluate(operand)?;

        match operator.token_type {
            TokenType::BANG => {
                let b = expect_bool(operator, Operand::Only, &value)?;

                Ok(Value::Bool(!b))
            }

            TokenType::MINUS => {
                let n = expect_number(operator, Operand::Only, &value)?;

                Ok(Value::Number(-n))
            }

            _ => Err(HulkError::internal(format!(
                "invalid unary operator '{}'",
                operator.lexeme
            ))),
        }
    }

    /// Both operands are evaluated, left first, before the operator applies.
    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        debug!("Evaluating binary operation: {}", operator.lexeme);

        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            TokenType::AT => {
                let a = expect_str(operator, Operand::Left, &left_val)?;
                let b = expect_str(operator, Operand::Right, &right_val)?;

                Ok(Value::Str(format!("{}{}", a, b)))
            }

            TokenType::AMPERSAND => {
                let a = expect_bool(operator, Operand::Left, &left_val)?;
                let b = expect_bool(operator, Operand::Right, &right_val)?;

                Ok(Value::Bool(a && b))
            }

            TokenType::PIPE => {
                let a = expect_bool(operator, Operand::Left, &left_val)?;
                let b = expect_bool(operator, Operand::Right, &right_val)?;

                Ok(Value::Bool(a || b))
            }

            _ => {
                let a = expect_number(operator, Operand::Left, &left_val)?;
                let b = expect_number(operator, Operand::Right, &right_val)?;

                arithmetic(operator, a, b)
            }
        }
    }

    /// Only the selected branch is evaluated.
    fn evaluate_conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Result<Value> {
        let value: Value = self.evaluate(condition)?;

        let Some(truth) = value.as_bool() else {
            return Err(HulkError::semantic(
                SemanticKind::Type,
                Some(condition.offset()),
                format!(
                    "Boolean expected but the 'if' condition is of type {} and evaluates to {}.",
                    value.type_name(),
                    value.describe()
                ),
            ));
        };

        debug!("If condition is {}", truth);

        if truth {
            self.evaluate(then_branch)
        } else {
            self.evaluate(else_branch)
        }
    }

    /// `let` evaluation shared by user `let`s and function calls.  Whatever
    /// happens, every binding pushed here is popped before returning.
    fn evaluate_let<'e, I>(&mut self, bindings: I, body: &Expr) -> Result<Value>
    where
        I: IntoIterator<Item = (&'e Token, &'e Expr)>,
    {
        let mut bound: Vec<&'e str> = Vec::new();

        let result: Result<Value> = self.bind_and_evaluate(bindings, body, &mut bound);

        for name in bound.iter().rev() {
            self.environment.remove(name);
        }

        if result.is_err() {
            debug!("Rolled back {} binding(s) after failure", bound.len());
        }

        result
    }

    /// Each right-hand side sees the bindings pushed before it.
    fn bind_and_evaluate<'e, I>(
        &mut self,
        bindings: I,
        body: &Expr,
        bound: &mut Vec<&'e str>,
    ) -> Result<Value>
    where
        I: IntoIterator<Item = (&'e Token, &'e Expr)>,
    {
        for (identifier, value_expr) in bindings {
            let value: Value = self.evaluate(value_expr)?;

            self.environment.set(&identifier.lexeme, value);
            bound.push(&identifier.lexeme);
        }

        self.evaluate(body)
    }

    fn evaluate_call(&mut self, identifier: &Token, arguments: &[Expr]) -> Result<Value> {
        let name: &str = &identifier.lexeme;
        let arity: usize = arguments.len();

        debug!("Evaluating call to '{}' with {} argument(s)", name, arity);

        if let Some(builtin) = Builtin::lookup(name, arity) {
            return self.call_builtin(builtin, arguments);
        }

        if !self.environment.is_function(name) {
            return Err(HulkError::semantic(
                SemanticKind::NotAFunction,
                Some(identifier.offset),
                format!("'{}' is not a function.", source_name(name)),
            ));
        }

        let Some(decl) = self.environment.function(name, arity) else {
            return Err(HulkError::semantic(
                SemanticKind::WrongArity,
                Some(identifier.offset),
                format!(
                    "'{}' has the incorrect number of parameters. Expected {} parameter(s), but {} were passed.",
                    name,
                    enumerate(&self.environment.arities(name)),
                    arity
                ),
            ));
        };

        if self.nested_calls >= self.config.max_call_depth {
            return Err(HulkError::semantic(
                SemanticKind::StackLimitExceeded,
                Some(identifier.offset),
                format!(
                    "Stack overflow on call to function '{}': more than {} nested calls.",
                    name, self.config.max_call_depth
                ),
            ));
        }

        // A call is the `let` that binds each parameter to its argument
        // expression, with the function body as its body.
        self.nested_calls += 1;

        let result: Result<Value> =
            self.evaluate_let(decl.parameters.iter().zip(arguments.iter()), &decl.body);

        self.nested_calls -= 1;

        result
    }

    fn call_builtin(&mut self, builtin: Builtin, arguments: &[Expr]) -> Result<Value> {
        let mut values: Vec<Value> = Vec::with_capacity(arguments.len());

        for (position, argument) in arguments.iter().enumerate() {
            let value: Value = self.evaluate(argument)?;

            if builtin.numeric() && value.as_number().is_none() {
                return Err(HulkError::semantic(
                    SemanticKind::Type,
                    Some(argument.offset()),
                    format!(
                        "Incorrect type for argument {} of '{}'. Number expected but {} {} was found.",
                        position + 1,
                        builtin.name(),
                        value.type_name(),
                        value.describe()
                    ),
                ));
            }

            values.push(value);
        }

        let result: Value = builtin.apply(&values);

        if builtin == Builtin::Print {
            writeln!(self.output, "{}", result)?;
        }

        debug!("Builtin '{}' returned: {}", builtin.name(), result);

        Ok(result)
    }
}

fn arithmetic(operator: &Token, a: f64, b: f64) -> Result<Value> {
    let value: Value = match operator.token_type {
        TokenType::PLUS => Value::Number(a + b),
        TokenType::MINUS => Value::Number(a - b),
        TokenType::STAR => Value::Number(a * b),
        TokenType::SLASH => Value::Number(a / b),
        TokenType::PERCENT => Value::Number(a % b),
        TokenType::CARET => Value::Number(a.powf(b)),
        TokenType::LESS => Value::Bool(a < b),
        TokenType::LESS_EQUAL => Value::Bool(a <= b),
        TokenType::GREATER => Value::Bool(a > b),
        TokenType::GREATER_EQUAL => Value::Bool(a >= b),
        _ => {
            return Err(HulkError::internal(format!(
                "invalid binary operator '{}'",
                operator.lexeme
            )));
        }
    };

    Ok(value)
}

fn type_error(operator: &Token, position: Operand, expected: &str, value: &Value) -> HulkError {
    HulkError::semantic(
        SemanticKind::Type,
        Some(operator.offset),
        format!(
            "Incorrect{}operand type for '{}' operator. {} expected but {} {} was found.",
            position,
            operator.lexeme,
            expected,
            value.type_name(),
            value.describe()
        ),
    )
}

fn expect_number(operator: &Token, position: Operand, value: &Value) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| type_error(operator, position, "Number", value))
}

fn expect_bool(operator: &Token, position: Operand, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| type_error(operator, position, "Boolean", value))
}

fn expect_str<'v>(operator: &Token, position: Operand, value: &'v Value) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| type_error(operator, position, "String", value))
}

/// `[1]` → "1", `[1, 2]` → "1 or 2", `[1, 2, 3]` → "1, 2 or 3".
fn enumerate(arities: &[usize]) -> String {
    let mut out = String::new();

    for (i, arity) in arities.iter().enumerate() {
        if i > 0 {
            out.push_str(if i == arities.len() - 1 { " or " } else { ", " });
        }

        out.push_str(&arity.to_string());
    }

    out
}

/// Parameters are stored as `function/arity::name`; show only `name`.
fn source_name(lexeme: &str) -> &str {
    lexeme.rsplit("::").next().unwrap_or(lexeme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_arities() {
        assert_eq!(enumerate(&[2]), "2");
        assert_eq!(enumerate(&[2, 3]), "2 or 3");
        assert_eq!(enumerate(&[0, 1, 3]), "0, 1 or 3");
    }

    #[test]
    fn strips_hidden_parameter_prefix() {
        assert_eq!(source_name("f/1::g"), "g");
        assert_eq!(source_name("plain"), "plain");
    }
}
