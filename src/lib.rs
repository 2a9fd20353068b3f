pub mod ast_printer;
pub mod builtin;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod replacer;
pub mod scanner;
pub mod token;
pub mod value;

pub use error::{HulkError, Result, SemanticKind};
pub use interpreter::{Interpreter, InterpreterConfig, MAX_CALL_DEPTH};
pub use value::Value;
