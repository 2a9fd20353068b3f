use hulk::error::SemanticKind;
use hulk::interpreter::{Interpreter, InterpreterConfig, MAX_CALL_DEPTH};

// These run on the default test thread: the call ceiling has to be
// reachable without a hand-sized stack.

fn session() -> Interpreter<Vec<u8>> {
    Interpreter::with_output(Vec::new(), InterpreterConfig::default())
}

#[test]
fn default_ceiling_allows_deep_recursion() {
    let mut interpreter = session();

    interpreter
        .run("function count(n) => if (n == 0) 0 else 1 + count(n - 1);")
        .unwrap();

    let depth = MAX_CALL_DEPTH - 1;
    let result = interpreter.run(&format!("count({});", depth)).unwrap();

    assert_eq!(result, Some(depth.to_string()));
}

#[test]
fn runaway_recursion_stops_at_the_ceiling() {
    let mut interpreter = session();

    interpreter
        .run("function forever(n) => forever(n + 1);")
        .unwrap();

    let err = interpreter.run("forever(0);").unwrap_err();

    assert_eq!(err.semantic_kind(), Some(SemanticKind::StackLimitExceeded));
    assert_eq!(
        err.to_string(),
        format!(
            "Stack overflow on call to function 'forever': more than {} nested calls.",
            MAX_CALL_DEPTH
        )
    );
    assert!(!interpreter.environment().is_bound("forever/1::n"));

    // The session survives and the counter starts over on the next line.
    assert_eq!(interpreter.run("1 + 1;").unwrap(), Some("2".to_string()));
}

#[test]
fn raised_ceiling_is_reachable_on_an_ordinary_thread() {
    let config = InterpreterConfig {
        max_call_depth: 20_000,
        ..InterpreterConfig::default()
    };
    let mut interpreter = Interpreter::with_output(Vec::new(), config);

    interpreter
        .run("function down(n) => if (n == 0) \"done\" else down(n - 1);")
        .unwrap();

    assert_eq!(interpreter.run("down(19999);").unwrap(), Some("done".to_string()));

    let err = interpreter.run("down(20000);").unwrap_err();
    assert_eq!(err.semantic_kind(), Some(SemanticKind::StackLimitExceeded));
}
