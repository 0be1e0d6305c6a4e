//! Sequential evaluator for parsed pipelines.

use std::future::Future;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::ast::{Call, Pipeline, Statement, ValueNode};
use crate::error::{RuntimeResult, ScriptError};
use crate::lexer::tokenize;
use crate::parser::Parser;
use crate::scope::{Scope, ScopeLimits};

/// Executes tool calls on behalf of the runtime.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Runs `name` with the evaluated named arguments.
    async fn execute(&self, name: &str, params: Map<String, Value>) -> RuntimeResult<Value>;
}

#[async_trait]
impl<F, Fut> ToolExecutor for F
where
    F: Send + Sync + Fn(String, Map<String, Value>) -> Fut,
    Fut: Future<Output = RuntimeResult<Value>> + Send,
{
    async fn execute(&self, name: &str, params: Map<String, Value>) -> RuntimeResult<Value> {
        (self)(name.to_owned(), params).await
    }
}

/// Evaluates statements in order against a fresh [`Scope`].
pub struct Runtime<'e> {
    executor: &'e dyn ToolExecutor,
    scope: Scope,
}

impl std::fmt::Debug for Runtime<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl<'e> Runtime<'e> {
    /// Creates a runtime with default scope limits.
    #[must_use]
    pub fn new(executor: &'e dyn ToolExecutor) -> Self {
        Self::with_limits(executor, ScopeLimits::default())
    }

    /// Creates a runtime with explicit scope limits.
    #[must_use]
    pub fn with_limits(executor: &'e dyn ToolExecutor, limits: ScopeLimits) -> Self {
        Self {
            executor,
            scope: Scope::new(limits),
        }
    }

    /// Executes every statement, returning the value of the last one, or
    /// `null` for an empty pipeline.
    ///
    /// # Errors
    ///
    /// Stops at the first failing call and returns its error; bindings made
    /// before the failure remain visible through [`Runtime::scope`].
    pub async fn execute(&mut self, pipeline: &Pipeline) -> RuntimeResult<Value> {
        let mut last = Value::Null;
        for statement in &pipeline.statements {
            last = match statement {
                Statement::Assignment(assignment) => {
                    let value = self.call(&assignment.call).await?;
                    self.scope.bind(&assignment.target, value)
                }
                Statement::Call(call) => self.call(call).await?,
            };
        }
        Ok(last)
    }

    async fn call(&self, call: &Call) -> RuntimeResult<Value> {
        let params: Map<String, Value> = call
            .args
            .iter()
            .map(|(name, node)| (name.clone(), self.evaluate(node)))
            .collect();

        debug!(
            tool = %call.tool_name,
            args = params.len(),
            is_async = call.is_async,
            "invoking tool"
        );
        self.executor.execute(&call.tool_name, params).await
    }

    fn evaluate(&self, node: &ValueNode) -> Value {
        match node {
            ValueNode::Literal(literal) => literal.to_value(),
            ValueNode::VariableRef(name) => self.scope.get(name).cloned().unwrap_or_else(|| {
                trace!(variable = %name, "unbound variable evaluates to null");
                Value::Null
            }),
            ValueNode::List(items) => {
                Value::Array(items.iter().map(|item| self.evaluate(item)).collect())
            }
        }
    }

    /// Returns the scope, including bindings from a partially failed run.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

/// Tokenizes, parses, and runs `source` in a fresh scope.
///
/// # Errors
///
/// Returns [`ScriptError`] for syntax errors or the first failing call.
pub async fn execute_script(
    source: &str,
    executor: &dyn ToolExecutor,
    limits: ScopeLimits,
) -> Result<Value, ScriptError> {
    let tokens = tokenize(source)?;
    let pipeline = Parser::new(tokens).with_source(source).parse()?;
    let mut runtime = Runtime::with_limits(executor, limits);
    Ok(runtime.execute(&pipeline).await?)
}
