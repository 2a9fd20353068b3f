use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use log::{debug, info};

use crate::builtin::Builtin;
use crate::error::{HulkError, Result, SemanticKind};
use crate::expr::{Expr, FunctionDecl};
use crate::token::Token;
use crate::value::Value;

/// Name resolution for one session.
///
/// Variables live in a stack per name: `let` pushes, leaving the scope pops,
/// so nested scopes and recursive calls always get the exact outer value
/// back.  Functions are global and keyed by name and arity:
///
/// ```text
/// Max ── 2 ── if (a >= b) a else b
///     └─ 3 ── let m = Max(a, b) in if (m >= c) m else c
/// ```
#[derive(Debug, Default)]
pub struct Environment {
    bindings: HashMap<String, Vec<Value>>,
    functions: HashMap<String, BTreeMap<usize, Rc<FunctionDecl>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    // ───────────────────────────── variables ──────────────────────────────

    /// Current value of `identifier`.
    pub fn get(&self, identifier: &Token) -> Result<Value> {
        self.bindings
            .get(&identifier.lexeme)
            .and_then(|stack| stack.last())
            .cloned()
            .ok_or_else(|| {
                HulkError::semantic(
                    SemanticKind::UndeclaredVariable,
                    Some(identifier.offset),
                    format!(
                        "Variable '{}' is used but not declared.",
                        identifier.lexeme
                    ),
                )
            })
    }

    /// Push a new binding, shadowing any previous one.
    pub fn set(&mut self, name: &str, value: Value) {
        debug!("Binding '{}' = {}", name, value);

        self.bindings.entry(name.to_string()).or_default().push(value);
    }

    /// Pop the most recent binding of `name`.
    pub fn remove(&mut self, name: &str) {
        let Some(stack) = self.bindings.get_mut(name) else {
            debug!("Remove of unbound '{}' ignored", name);
            return;
        };

        stack.pop();

        if stack.is_empty() {
            self.bindings.remove(name);
        }

        debug!("Unbound '{}'", name);
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    // ───────────────────────────── functions ──────────────────────────────

    /// Register a declaration.  Replacing an existing (name, arity) pair is
    /// only allowed when the stored declaration is overwritable; builtins
    /// never are.
    pub fn register_function(&mut self, decl: FunctionDecl) -> Result<()> {
        let name: String = decl.name().to_string();
        let arity: usize = decl.arity();

        if self.is_builtin(&name, arity) {
            return Err(HulkError::semantic(
                SemanticKind::Redefinition,
                Some(decl.identifier.offset),
                format!(
                    "'{}' with {} parameter(s) is a builtin function and can not be redefined.",
                    name, arity
                ),
            ));
        }

        let arity_table = self.functions.entry(name.clone()).or_default();

        if let Some(existing) = arity_table.get(&arity) {
            if !existing.overwritable {
                return Err(HulkError::semantic(
                    SemanticKind::Redefinition,
                    Some(decl.identifier.offset),
                    format!("Function '{}' can not be redefined.", name),
                ));
            }

            info!("Redefining function '{}' with arity {}", name, arity);
        } else {
            info!("Registering function '{}' with arity {}", name, arity);
        }

        arity_table.insert(arity, Rc::new(decl));

        Ok(())
    }

    /// Is `name` a user function of any arity?
    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn is_function_with_arity(&self, name: &str, arity: usize) -> bool {
        self.functions
            .get(name)
            .is_some_and(|table| table.contains_key(&arity))
    }

    pub fn is_builtin(&self, name: &str, arity: usize) -> bool {
        Builtin::lookup(name, arity).is_some()
    }

    /// Declared arities of `name`, ascending.
    pub fn arities(&self, name: &str) -> Vec<usize> {
        self.functions
            .get(name)
            .map(|table| table.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn function(&self, name: &str, arity: usize) -> Option<Rc<FunctionDecl>> {
        self.functions.get(name)?.get(&arity).cloned()
    }

    pub fn arguments(&self, name: &str, arity: usize) -> Option<&[Token]> {
        self.functions
            .get(name)?
            .get(&arity)
            .map(|decl| decl.parameters.as_slice())
    }

    pub fn body(&self, name: &str, arity: usize) -> Option<&Expr> {
        self.functions
            .get(name)?
            .get(&arity)
            .map(|decl| decl.body.as_ref())
    }
}
