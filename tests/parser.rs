#[cfg(test)]
mod parser_tests {
    use hulk::ast_printer::AstPrinter;
    use hulk::error::{HulkError, Result};
    use hulk::expr::Expr;
    use hulk::parser::Parser;
    use hulk::scanner::scan;

    use rstest::rstest;

    fn parse(source: &str) -> Result<Expr> {
        let tokens = scan(source)?;
        Parser::new(&tokens).parse()
    }

    fn print(source: &str) -> String {
        match parse(source) {
            Ok(expr) => AstPrinter::print(&expr),
            Err(e) => panic!("'{}' failed to parse: {}", source, e),
        }
    }

    fn syntax_error(source: &str) -> HulkError {
        let err = parse(source).expect_err("expected a syntax error");

        assert_eq!(err.category(), "SYNTAX ERROR", "{}: {}", source, err);

        err
    }

    #[rstest]
    #[case("2 + 3 * 4;", "(+ 2 (* 3 4))")]
    #[case("(2 + 3) * 4;", "(* (+ 2 3) 4)")]
    #[case("1 - 2 - 3;", "(- (- 1 2) 3)")]
    #[case("4 ^ 3 ^ 2;", "(^ 4 (^ 3 2))")]
    #[case("-3 ^ 4;", "(^ (- 3) 4)")]
    #[case("!true | false & true;", "(| (! true) (& false true))")]
    #[case("1 + 2 < 4 == true;", "(== (< (+ 1 2) 4) true)")]
    #[case("\"a\" @ 1 + 2;", "(+ (@ \"a\" 1) 2)")]
    #[case("10 % 3 * 2 / 5;", "(/ (* (% 10 3) 2) 5)")]
    #[case("PI * E;", "(* 3.141592653589793 2.718281828459045)")]
    fn operator_precedence(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(print(source), expected);
    }

    #[rstest]
    #[case("if (a < b) a else b;", "(if (< a b) a b)")]
    #[case(
        "if (n == 0) 1 else if (n == 1) 1 else 2;",
        "(if (== n 0) 1 (if (== n 1) 1 2))"
    )]
    #[case("let a = 1, b = a + 1 in a * b;", "(let ((a 1) (b (+ a 1))) (* a b))")]
    #[case("let a = let b = 2 in b in a;", "(let ((a (let ((b 2)) b))) a)")]
    #[case("1 + let x = 2 in x * 3;", "(+ 1 (let ((x 2)) (* x 3)))")]
    #[case("2 * if (true) 3 else 4 + 1;", "(* 2 (if true 3 (+ 4 1)))")]
    #[case("f();", "(call f)")]
    #[case("Max(1, g(2), 3);", "(call Max 1 (call g 2) 3)")]
    #[case(
        "function Max(a, b) => if (a >= b) a else b;",
        "(function Max (a b) (if (>= a b) a b))"
    )]
    #[case("function answer() => 42;", "(function answer () 42)")]
    fn compound_expressions(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(print(source), expected);
    }

    #[test]
    fn chained_comparisons_are_rejected() {
        let err = syntax_error("2 == 3 == 4;");
        assert_eq!(err.offset(), Some(7));
        assert!(err.to_string().contains("can not be chained"));

        let err = syntax_error("1 < 2 < 3;");
        assert_eq!(err.offset(), Some(6));
    }

    #[rstest]
    #[case("1 + 2", "Missing ';' at the end of the statement.", 5)]
    #[case("1 + 2;;", "Unexpected tokens after ';'. Only one statement per line is allowed.", 6)]
    #[case(";", "Empty statement. Expected an expression before ';'.", 0)]
    #[case("(1 + 2));", "Unmatched ')'.", 7)]
    #[case("let x = 1 x;", "Missing 'in' after the 'let' bindings.", 10)]
    #[case("let x := 1 in x;", "Use '=' to bind 'x' in a 'let' expression. ':=' is the destructive assignment operator.", 6)]
    #[case("let PI = 3 in PI;", "Can not assign a value to the constant 'PI'.", 4)]
    #[case("let 5 = 3 in 5;", "Can not assign a value to the literal 5.", 4)]
    #[case("let x = in x;", "Missing value for 'x' in 'let' binding.", 8)]
    #[case("let x = 1 in ;", "Missing expression after 'in'.", 13)]
    #[case("if (true) 1;", "Missing 'else' branch in 'if' expression.", 11)]
    #[case("if () 1 else 2;", "Empty condition in 'if' expression.", 4)]
    #[case("if true 1 else 2;", "Expected '(' after 'if'.", 3)]
    #[case("f(1,);", "Missing argument in call to 'f'.", 4)]
    #[case("();", "Empty parentheses. Expected an expression between '(' and ')'.", 1)]
    #[case("1 else 2;", "Unexpected 'else' without a matching 'if'.", 2)]
    #[case("x = 2;", "Unexpected '='. Variables are bound with 'let ... in' and compared with '=='.", 2)]
    #[case("function f(a, a) => a;", "Duplicate parameter 'a' in the declaration of 'f'.", 14)]
    #[case("function f(a) a;", "Expected '=>' after the parameter list of 'f'.", 14)]
    #[case("function f(a) => ;", "Missing body in the declaration of 'f'.", 17)]
    #[case("function PI() => 3;", "'PI' is a constant and can not name a function.", 9)]
    #[case("1 + function f() => 1;", "Function declarations are only allowed at the beginning of a statement.", 4)]
    fn syntax_diagnostics(#[case] source: &str, #[case] message: &str, #[case] offset: usize) {
        let err = syntax_error(source);

        assert_eq!(err.to_string(), message);
        assert_eq!(err.offset(), Some(offset));
    }

    #[test]
    fn lexical_errors_surface_before_parsing() {
        let err = parse("1 + $;").unwrap_err();

        assert_eq!(err.category(), "LEXICAL ERROR");
        assert_eq!(err.offset(), Some(4));
    }

    #[test]
    fn conditional_records_keyword_offsets() {
        let expr = parse("if (x) 1 else 2;").unwrap();

        let Expr::Conditional {
            then_offset,
            else_offset,
            ..
        } = &expr
        else {
            panic!("expected a conditional, got {:?}", expr);
        };

        assert_eq!(*then_offset, 0);
        assert_eq!(*else_offset, 9);
    }

    #[test]
    fn ast_serializes_to_json() {
        let expr = parse("let a = 1 in a;").unwrap();
        let json = serde_json::to_value(&expr).unwrap();

        assert_eq!(json["Let"]["bindings"][0]["identifier"]["lexeme"], "a");
        assert_eq!(json["Let"]["body"]["Variable"]["identifier"]["offset"], 13);
    }
}
