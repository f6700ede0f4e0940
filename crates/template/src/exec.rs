use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::{Result, TemplateError};
use crate::parser::{Expr, Func, IfNode, Node};

/// Flat key/value data a template is executed against
pub trait Context {
    fn lookup(&self, key: &str) -> Option<&str>;
}

impl Context for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

impl<S: BuildHasher> Context for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(String::as_str)
    }
}

/// What a field reference to an undefined key evaluates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Fail execution with [`TemplateError::UndefinedKey`]
    #[default]
    Error,
    /// Evaluate to the empty string (falsy in conditions)
    Zero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value<'a> {
    Str(Cow<'a, str>),
    Bool(bool),
}

impl Value<'_> {
    fn truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
        }
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Str(s) => out.push_str(s),
            Self::Bool(true) => out.push_str("true"),
            Self::Bool(false) => out.push_str("false"),
        }
    }
}

pub(crate) struct Executor<'a, C: Context + ?Sized> {
    pub name: &'a str,
    pub ctx: &'a C,
    pub missing: MissingKey,
}

impl<'a, C: Context + ?Sized> Executor<'a, C> {
    pub(crate) fn run(&self, nodes: &'a [Node], out: &mut String) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(expr) => self.eval(expr)?.write_to(out),
                Node::If(if_node) => self.run_if(if_node, out)?,
            }
        }
        Ok(())
    }

    fn run_if(&self, if_node: &'a IfNode, out: &mut String) -> Result<()> {
        for branch in &if_node.branches {
            if self.eval(&branch.cond)?.truthy() {
                return self.run(&branch.body, out);
            }
        }
        self.run(&if_node.otherwise, out)
    }

    fn eval(&self, expr: &'a Expr) -> Result<Value<'a>> {
        match expr {
            Expr::Field(key) => match self.ctx.lookup(key) {
                Some(value) => Ok(Value::Str(Cow::Borrowed(value))),
                None => match self.missing {
                    MissingKey::Zero => Ok(Value::Str(Cow::Borrowed(""))),
                    MissingKey::Error => Err(TemplateError::UndefinedKey {
                        name: self.name.to_string(),
                        key: key.clone(),
                    }),
                },
            },
            Expr::Dot => Ok(Value::Str(Cow::Borrowed(""))),
            Expr::Str(value) => Ok(Value::Str(Cow::Borrowed(value.as_str()))),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Call(func, args) => self.call(*func, args),
        }
    }

    fn call(&self, func: Func, args: &'a [Expr]) -> Result<Value<'a>> {
        match func {
            Func::Not => Ok(Value::Bool(!self.eval(&args[0])?.truthy())),
            Func::And => {
                let mut last = Value::Bool(true);
                for arg in args {
                    last = self.eval(arg)?;
                    if !last.truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Func::Or => {
                let mut last = Value::Bool(false);
                for arg in args {
                    last = self.eval(arg)?;
                    if last.truthy() {
                        break;
                    }
                }
                Ok(last)
            }
            Func::Eq | Func::Ne => {
                let left = self.eval(&args[0])?;
                let right = self.eval(&args[1])?;
                let equal = match (&left, &right) {
                    (Value::Str(a), Value::Str(b)) => a == b,
                    (Value::Bool(a), Value::Bool(b)) => a == b,
                    _ => {
                        return Err(TemplateError::exec(
                            self.name,
                            format!("error calling {}: incompatible types for comparison", func.name()),
                        ));
                    }
                };
                Ok(Value::Bool(if func == Func::Eq { equal } else { !equal }))
            }
        }
    }
}
