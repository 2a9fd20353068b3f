//! The reserved built-in functions.  They are resolved by name *and* arity
//! before any user function, and can never be redeclared.

use rand::Rng;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Rand,
    Cos,
    Exp,
    Print,
    Sin,
    Sqrt,
    Log,
}

/// Every builtin, in the order they are listed to users.
pub const BUILTINS: [Builtin; 7] = [
    Builtin::Rand,
    Builtin::Cos,
    Builtin::Exp,
    Builtin::Print,
    Builtin::Sin,
    Builtin::Sqrt,
    Builtin::Log,
];

impl Builtin {
    pub fn lookup(name: &str, arity: usize) -> Option<Builtin> {
        BUILTINS
            .iter()
            .copied()
            .find(|b| b.name() == name && b.arity() == arity)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Rand => "rand",
            Builtin::Cos => "cos",
            Builtin::Exp => "exp",
            Builtin::Print => "print",
            Builtin::Sin => "sin",
            Builtin::Sqrt => "sqrt",
            Builtin::Log => "log",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Rand => 0,
            Builtin::Log => 2,
            _ => 1,
        }
    }

    /// Whether every argument must be a number.  `print` takes anything.
    pub fn numeric(self) -> bool {
        self != Builtin::Print
    }

    /// Apply a builtin to already evaluated (and type checked) numbers.
    /// `print` is the identity here; the interpreter does the writing.
    pub fn apply(self, args: &[Value]) -> Value {
        let num = |i: usize| args.get(i).and_then(Value::as_number).unwrap_or(f64::NAN);

        match self {
            Builtin::Rand => Value::Number(rand::thread_rng().gen::<f64>()),
            Builtin::Cos => Value::Number(num(0).cos()),
            Builtin::Exp => Value::Number(num(0).exp()),
            Builtin::Sin => Value::Number(num(0).sin()),
            Builtin::Sqrt => Value::Number(num(0).sqrt()),
            // log(base, x)
            Builtin::Log => Value::Number(num(1).log(num(0))),
            Builtin::Print => args.first().cloned().unwrap_or(Value::Bool(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_name_and_arity() {
        assert_eq!(Builtin::lookup("log", 2), Some(Builtin::Log));
        assert_eq!(Builtin::lookup("log", 1), None);
        assert_eq!(Builtin::lookup("rand", 0), Some(Builtin::Rand));
        assert_eq!(Builtin::lookup("Print", 1), None);
    }

    #[test]
    fn math() {
        let log = Builtin::Log.apply(&[Value::Number(2.0), Value::Number(8.0)]);
        assert!((log.as_number().unwrap() - 3.0).abs() < 1e-12);

        assert_eq!(Builtin::Sqrt.apply(&[Value::Number(16.0)]), Value::Number(4.0));
        assert_eq!(Builtin::Cos.apply(&[Value::Number(0.0)]), Value::Number(1.0));

        let r = Builtin::Rand.apply(&[]).as_number().unwrap();
        assert!((0.0..1.0).contains(&r));
    }
}
