/*!
Recursive‑descent parser for one HULK statement.

Time & Space
------------
Each token is consumed once via `advance()`; every production does O(1) work
per token, so a parse is **Θ(n)** in the number of tokens.  The AST owns
clones of the tokens it keeps, so it can outlive the scanned line (function
bodies are stored in the environment for the whole session).

### Logging Policy

| Location                       | Level   | Purpose                                   |
|--------------------------------|---------|-------------------------------------------|
| `Parser::new`, `parse`         | `info`  | Lifecycle milestones.                     |
| `statement`, `let`, `if`, call | `debug` | High‑level descent into grammar branches. |
| Error paths                    | `debug` | Context before returning structured error.|

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
statement      → ( funDecl | expression ) ";" EOF ;
funDecl        → "function" IDENT "(" parameters? ")" "=>" expression ;
parameters     → IDENT ( "," IDENT )* ;
expression     → letIn ;
letIn          → "let" binding ( "," binding )* "in" expression | conditional ;
binding        → IDENT "=" expression ;
conditional    → "if" "(" expression ")" expression "else" expression | logic_or ;
logic_or       → logic_and ( "|" logic_and )* ;
logic_and      → equality ( "&" equality )* ;
equality       → relational ( ( "!=" | "==" ) relational )? ;
relational     → additive ( ( ">" | ">=" | "<" | "<=" ) additive )? ;
additive       → multiplicative ( ( "-" | "+" | "@" ) multiplicative )* ;
multiplicative → power ( ( "/" | "*" | "%" ) power )* ;
power          → unary ( "^" power )? ;
unary          → ( "!" | "-" ) unary | primary ;
primary        → NUMBER | STRING | "true" | "false" | "PI" | "E"
               | IDENT "(" arguments? ")" | IDENT
               | "(" expression ")"
               | letIn | conditional ;
arguments      → expression ( "," expression )* ;
```

Equality and relational operators are deliberately **not** chainable:
`1 < 2 < 3` is rejected instead of silently comparing a boolean.
*/

use crate::error::{HulkError, Result};
use crate::expr::{Binding, Expr, FunctionDecl};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Parser over the token slice of a single line.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser.
    pub fn new(tokens: &'a [Token]) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self { tokens, current: 0 }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse exactly one statement terminated by `;`.
    pub fn parse(&mut self) -> Result<Expr> {
        info!("Beginning parse phase");

        if !matches!(
            self.tokens.last().map(|t| &t.token_type),
            Some(TokenType::EOF)
        ) {
            return Err(HulkError::internal("token stream does not end with EOF"));
        }

        let expr: Expr = self.statement()?;

        self.finish_statement()?;

        info!("Parse phase completed");

        Ok(expr)
    }

    // ──────────────────────── statement rules ─────────────────────

    fn statement(&mut self) -> Result<Expr> {
        debug!("Entering statement");

        if self.is_at_end() || self.check(TokenType::SEMICOLON) {
            return Err(self.error_at(
                self.peek(),
                "Empty statement. Expected an expression before ';'.",
            ));
        }

        if self.matches(TokenType::FUNCTION) {
            self.function_declaration()
        } else {
            self.expression()
        }
    }

    /// After the statement: exactly one `;` and then the end of the line.
    fn finish_statement(&mut self) -> Result<()> {
        let token: &Token = self.peek();

        let message: String = match token.token_type {
            TokenType::SEMICOLON => {
                self.advance();

                if self.is_at_end() {
                    return Ok(());
                }

                "Unexpected tokens after ';'. Only one statement per line is allowed.".into()
            }

            TokenType::EOF => "Missing ';' at the end of the statement.".into(),

            TokenType::RIGHT_PAREN => "Unmatched ')'.".into(),

            TokenType::EQUAL | TokenType::ASSIGN => format!(
                "Unexpected '{}'. Variables are bound with 'let ... in' and compared with '=='.",
                token.lexeme
            ),

            TokenType::ELSE => "Unexpected 'else' without a matching 'if'.".into(),

            TokenType::IN => "Unexpected 'in' outside of a 'let' expression.".into(),

            _ => format!(
                "Expected ';' after the expression but found {}.",
                describe(token)
            ),
        };

        Err(self.error_at(self.peek(), message))
    }

    fn function_declaration(&mut self) -> Result<Expr> {
        debug!("Entering function declaration");

        let name: &Token = self.peek();
        let identifier: Token = match name.token_type {
            TokenType::IDENTIFIER => self.advance().clone(),

            TokenType::PI | TokenType::EULER => {
                return Err(self.error_at(
                    name,
                    format!("'{}' is a constant and can not name a function.", name.lexeme),
                ));
            }

            _ => {
                return Err(self.error_at(
                    name,
                    format!(
                        "Expected a function name after 'function' but found {}.",
                        describe(name)
                    ),
                ));
            }
        };

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after the function name '{}'.", identifier.lexeme),
        )?;

        let mut parameters: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                let param: &Token = self.peek();

                if param.token_type != TokenType::IDENTIFIER {
                    return Err(self.error_at(
                        param,
                        format!("Expected a parameter name but found {}.", describe(param)),
                    ));
                }

                if parameters.iter().any(|p| p.lexeme == param.lexeme) {
                    return Err(self.error_at(
                        param,
                        format!(
                            "Duplicate parameter '{}' in the declaration of '{}'.",
                            param.lexeme, identifier.lexeme
                        ),
                    ));
                }

                parameters.push(self.advance().clone());

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(
            TokenType::RIGHT_PAREN,
            &format!("Expected ')' after the parameters of '{}'.", identifier.lexeme),
        )?;

        self.consume(
            TokenType::ARROW,
            &format!(
                "Expected '=>' after the parameter list of '{}'.",
                identifier.lexeme
            ),
        )?;

        if self.at_expression_end() {
            return Err(self.error_at(
                self.peek(),
                format!("Missing body in the declaration of '{}'.", identifier.lexeme),
            ));
        }

        let body: Expr = self.expression()?;

        Ok(Expr::Function(FunctionDecl {
            identifier,
            parameters,
            body: Box::new(body),
            overwritable: true,
        }))
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.let_in()
    }

    fn let_in(&mut self) -> Result<Expr> {
        if self.matches(TokenType::LET) {
            return self.let_body();
        }

        self.conditional()
    }

    /// Everything after the `let` keyword.
    fn let_body(&mut self) -> Result<Expr> {
        debug!("Entering let-in expression");

        let mut bindings: Vec<Binding> = Vec::new();

        loop {
            let identifier: Token = self.binding_target()?;

            if self.check(TokenType::ASSIGN) {
                return Err(self.error_at(
                    self.peek(),
                    format!(
                        "Use '=' to bind '{}' in a 'let' expression. ':=' is the destructive assignment operator.",
                        identifier.lexeme
                    ),
                ));
            }

            if !self.matches(TokenType::EQUAL) {
                return Err(self.error_at(
                    self.peek(),
                    format!(
                        "Expected '=' after '{}' in 'let' binding.",
                        identifier.lexeme
                    ),
                ));
            }

            if self.at_expression_end() || self.check(TokenType::IN) {
                return Err(self.error_at(
                    self.peek(),
                    format!("Missing value for '{}' in 'let' binding.", identifier.lexeme),
                ));
            }

            let value: Expr = self.expression()?;

            bindings.push(Binding { identifier, value });

            if !self.matches(TokenType::COMMA) {
                break;
            }
        }

        if !self.matches(TokenType::IN) {
            return Err(self.error_at(self.peek(), "Missing 'in' after the 'let' bindings."));
        }

        if self.at_expression_end() {
            return Err(self.error_at(self.peek(), "Missing expression after 'in'."));
        }

        let body: Expr = self.expression()?;

        Ok(Expr::Let {
            bindings,
            body: Box::new(body),
        })
    }

    /// The name on the left of `=` in a `let` list.
    fn binding_target(&mut self) -> Result<Token> {
        let token: &Token = self.peek();

        match token.token_type {
            TokenType::IDENTIFIER => Ok(self.advance().clone()),

            TokenType::PI | TokenType::EULER => Err(self.error_at(
                token,
                format!("Can not assign a value to the constant '{}'.", token.lexeme),
            )),

            TokenType::NUMBER(_) | TokenType::STRING(_) | TokenType::TRUE | TokenType::FALSE => {
                Err(self.error_at(
                    token,
                    format!("Can not assign a value to the literal {}.", token.lexeme),
                ))
            }

            _ => Err(self.error_at(
                token,
                format!(
                    "Expected a variable name in 'let' binding but found {}.",
                    describe(token)
                ),
            )),
        }
    }

    fn conditional(&mut self) -> Result<Expr> {
        if self.matches(TokenType::IF) {
            return self.conditional_body();
        }

        self.logic_or()
    }

    /// Everything after the `if` keyword.
    fn conditional_body(&mut self) -> Result<Expr> {
        debug!("Entering if-else expression");

        let if_token: &Token = self.previous();

        if !self.matches(TokenType::LEFT_PAREN) {
            return Err(self.error_at(self.peek(), "Expected '(' after 'if'."));
        }

        if self.check(TokenType::RIGHT_PAREN) {
            return Err(self.error_at(self.peek(), "Empty condition in 'if' expression."));
        }

        let condition: Expr = self.expression()?;

        if !self.matches(TokenType::RIGHT_PAREN) {
            return Err(self.error_at(self.peek(), "Expected ')' after the 'if' condition."));
        }

        if self.at_expression_end() || self.check(TokenType::ELSE) {
            return Err(self.error_at(self.peek(), "Missing expression for the 'if' branch."));
        }

        let then_branch: Expr = self.expression()?;

        if !self.matches(TokenType::ELSE) {
            return Err(self.error_at(self.peek(), "Missing 'else' branch in 'if' expression."));
        }

        let else_token: &Token = self.previous();

        if self.at_expression_end() {
            return Err(self.error_at(
                self.peek(),
                "Missing expression for the 'else' branch.",
            ));
        }

        let else_branch: Expr = self.expression()?;

        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            then_offset: if_token.offset,
            else_offset: else_token.offset,
        })
    }

    fn logic_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logic_and()?;

        while self.matches(TokenType::PIPE) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logic_and()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logic_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AMPERSAND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        let expr: Expr = self.relational()?;

        if !self.check_equality() {
            return Ok(expr);
        }

        let operator: Token = self.advance().clone();
        let right: Expr = self.relational()?;

        if self.check_equality() {
            return Err(self.error_at(
                self.peek(),
                "Equality operators can not be chained. Use parentheses to group the comparisons.",
            ));
        }

        Ok(Expr::Binary {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        })
    }

    fn relational(&mut self) -> Result<Expr> {
        let expr: Expr = self.additive()?;

        if !self.check_relational() {
            return Ok(expr);
        }

        let operator: Token = self.advance().clone();
        let right: Expr = self.additive()?;

        if self.check_relational() {
            return Err(self.error_at(
                self.peek(),
                "Relational operators can not be chained. Use parentheses to group the comparisons.",
            ));
        }

        Ok(Expr::Binary {
            left: Box::new(expr),
            operator,
            right: Box::new(right),
        })
    }

    fn additive(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.multiplicative()?;

        while self.matches(TokenType::MINUS)
            || self.matches(TokenType::PLUS)
            || self.matches(TokenType::AT)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.multiplicative()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.power()?;

        while self.matches(TokenType::STAR)
            || self.matches(TokenType::SLASH)
            || self.matches(TokenType::PERCENT)
        {
            let operator: Token = self.previous().clone();
            let right: Expr = self.power()?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// `a ^ b ^ c` is `a ^ (b ^ c)`.
    fn power(&mut self) -> Result<Expr> {
        let expr: Expr = self.unary()?;

        if self.matches(TokenType::CARET) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.power()?;

            return Ok(Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let operand: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr> {
        let token: &'a Token = self.peek();

        match token.token_type {
            TokenType::NUMBER(_)
            | TokenType::STRING(_)
            | TokenType::TRUE
            | TokenType::FALSE
            | TokenType::PI
            | TokenType::EULER => {
                self.advance();

                let value = token.literal().ok_or_else(|| {
                    HulkError::internal(format!("literal token without value: {:?}", token))
                })?;

                Ok(Expr::Literal {
                    value,
                    offset: token.offset,
                })
            }

            TokenType::IDENTIFIER => {
                self.advance();

                if self.matches(TokenType::LEFT_PAREN) {
                    return self.finish_call(token);
                }

                Ok(Expr::Variable {
                    identifier: token.clone(),
                })
            }

            TokenType::LEFT_PAREN => {
                self.advance();

                if self.check(TokenType::RIGHT_PAREN) {
                    return Err(self.error_at(
                        self.peek(),
                        "Empty parentheses. Expected an expression between '(' and ')'.",
                    ));
                }

                let expr: Expr = self.expression()?;

                if !self.matches(TokenType::RIGHT_PAREN) {
                    return Err(self.error_at(
                        self.peek(),
                        format!(
                            "Expected ')' to close the '(' at offset {} but found {}.",
                            token.offset,
                            describe(self.peek())
                        ),
                    ));
                }

                Ok(expr)
            }

            TokenType::IF => {
                self.advance();
                self.conditional_body()
            }

            TokenType::LET => {
                self.advance();
                self.let_body()
            }

            TokenType::FUNCTION => Err(self.error_at(
                token,
                "Function declarations are only allowed at the beginning of a statement.",
            )),

            TokenType::ELSE => Err(self.error_at(token, "Unexpected 'else' without a matching 'if'.")),

            TokenType::IN => Err(self.error_at(
                token,
                "Unexpected 'in' outside of a 'let' expression.",
            )),

            TokenType::SEMICOLON | TokenType::EOF => Err(self.error_at(
                token,
                "Expected an expression but reached the end of the statement.",
            )),

            _ => Err(self.error_at(
                token,
                format!("Expected an expression but found {}.", describe(token)),
            )),
        }
    }

    /// Arguments of a call; the `(` is already consumed.
    fn finish_call(&mut self, identifier: &Token) -> Result<Expr> {
        debug!("Parsing call to '{}'", identifier.lexeme);

        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if self.check(TokenType::COMMA) || self.check(TokenType::RIGHT_PAREN) {
                    return Err(self.error_at(
                        self.peek(),
                        format!("Missing argument in call to '{}'.", identifier.lexeme),
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        if !self.matches(TokenType::RIGHT_PAREN) {
            return Err(self.error_at(
                self.peek(),
                format!(
                    "Expected ')' after the arguments of '{}' but found {}.",
                    identifier.lexeme,
                    describe(self.peek())
                ),
            ));
        }

        Ok(Expr::Call {
            identifier: identifier.clone(),
            arguments,
        })
    }

    // ────────────────────── utility helpers ───────────────────────

    fn error_at<S: Into<String>>(&self, token: &Token, message: S) -> HulkError {
        let message: String = message.into();

        debug!("Syntax error at offset {}: {}", token.offset, message);

        HulkError::syntax(Some(token.offset), message)
    }

    /// Nothing left that could start or continue an expression.
    fn at_expression_end(&self) -> bool {
        self.is_at_end()
            || self.check(TokenType::SEMICOLON)
            || self.check(TokenType::RIGHT_PAREN)
            || self.check(TokenType::COMMA)
    }

    fn check_equality(&self) -> bool {
        self.check(TokenType::EQUAL_EQUAL) || self.check(TokenType::BANG_EQUAL)
    }

    fn check_relational(&self) -> bool {
        self.check(TokenType::LESS)
            || self.check(TokenType::LESS_EQUAL)
            || self.check(TokenType::GREATER)
            || self.check(TokenType::GREATER_EQUAL)
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(self.error_at(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        &self.tokens[self.current - 1]
    }
}

/// How a token is named inside a diagnostic.
fn describe(token: &Token) -> String {
    match token.token_type {
        TokenType::EOF => "the end of the statement".to_string(),
        _ => format!("'{}'", token.lexeme),
    }
}
