//! Syntax tree for NIT scripts.

use std::collections::BTreeMap;

use serde_json::{Number as JsonNumber, Value};

use crate::token::Number;

/// Literal value written directly in a script.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted string.
    String(String),
    /// Integer or float.
    Number(Number),
}

impl Literal {
    /// Converts the literal into the runtime value passed to tools.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::String(value) => Value::String(value.clone()),
            Self::Number(Number::Integer(value)) => Value::from(*value),
            Self::Number(Number::Float(value)) => {
                JsonNumber::from_f64(*value).map_or(Value::Null, Value::Number)
            }
        }
    }

    fn to_plain_string(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            Self::Number(value) => value.to_string(),
        }
    }
}

/// Argument value expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    /// Literal value.
    Literal(Literal),
    /// Reference to a variable bound earlier in the script.
    VariableRef(String),
    /// List of values. The grammar does not produce lists yet; the evaluator
    /// accepts them so trees built programmatically still run.
    List(Vec<ValueNode>),
}

/// Tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Tool name as written.
    pub tool_name: String,
    /// Named arguments; a repeated name keeps the last value.
    pub args: BTreeMap<String, ValueNode>,
    /// Whether the call was prefixed with `async`. Metadata only.
    pub is_async: bool,
    /// Value of a literal `callback` argument, if one was supplied.
    pub callback: Option<String>,
}

impl Call {
    /// Creates a call node, deriving `callback` from the arguments.
    #[must_use]
    pub fn new(
        tool_name: impl Into<String>,
        args: BTreeMap<String, ValueNode>,
        is_async: bool,
    ) -> Self {
        let callback = match args.get("callback") {
            Some(ValueNode::Literal(literal)) => Some(literal.to_plain_string()),
            _ => None,
        };
        Self {
            tool_name: tool_name.into(),
            args,
            is_async,
            callback,
        }
    }
}

/// `$target = call(...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Variable name without the `$`.
    pub target: String,
    /// Call whose result is bound.
    pub call: Call,
}

/// Top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Assignment of a call result.
    Assignment(Assignment),
    /// Bare call.
    Call(Call),
}

impl Statement {
    /// Returns the call carried by the statement.
    #[must_use]
    pub fn call(&self) -> &Call {
        match self {
            Self::Assignment(assignment) => &assignment.call,
            Self::Call(call) => call,
        }
    }
}

/// Ordered list of statements forming one script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    /// Statements in source order.
    pub statements: Vec<Statement>,
}
