//! Sandboxed evaluation of programmatic structured-config.
//!
//! The payload runs as the body of a CommonJS-style function receiving
//! `exports`, `require`, `module` and `__mpx_mode__`. Nothing from the host
//! process is reachable: each evaluation gets a fresh Boa realm, `require`
//! always throws, and the exported value comes back as 2-space indented
//! JSON text.
//!
//! Evaluation is bounded by Boa's loop-iteration and recursion limits and
//! by a wall-clock timeout.

use std::time::Duration;

use async_trait::async_trait;
use boa_engine::{Context, Source};
use mpx_config::{Mode, SandboxOptions};

use crate::error::{LoaderError, Result};

/// Evaluates module-shaped program text and returns its export as JSON text.
#[async_trait]
pub trait Sandbox: Send + Sync + std::fmt::Debug {
    async fn evaluate(&self, source: &str, mode: Mode) -> Result<String>;
}

/// [`Sandbox`] backed by the Boa JavaScript engine.
#[derive(Debug, Clone, Default)]
pub struct BoaSandbox {
    limits: SandboxOptions,
}

impl BoaSandbox {
    pub fn new(limits: SandboxOptions) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SandboxOptions {
        &self.limits
    }
}

#[async_trait]
impl Sandbox for BoaSandbox {
    async fn evaluate(&self, source: &str, mode: Mode) -> Result<String> {
        let program = wrap_program(source, mode)?;
        let limits = self.limits.clone();
        let timeout = Duration::from_millis(limits.timeout_ms);

        // Boa contexts are !Send, so the whole evaluation lives on one
        // blocking thread.
        let task = tokio::task::spawn_blocking(move || run_program(&program, &limits));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| LoaderError::Evaluation(format!("Task join error: {e}")))?,
            Err(_) => {
                tracing::warn!(
                    "Programmatic config evaluation exceeded {}ms",
                    timeout.as_millis()
                );
                Err(LoaderError::EvaluationTimeout(timeout))
            }
        }
    }
}

/// Embed `source` as a string literal so it is parsed by `new Function`
/// and never spliced into the wrapper's own syntax.
fn wrap_program(source: &str, mode: Mode) -> Result<String> {
    let body = serde_json::to_string(source)
        .map_err(|e| LoaderError::Evaluation(format!("Failed to embed config source: {e}")))?;
    let mode = serde_json::to_string(mode.as_str())
        .map_err(|e| LoaderError::Evaluation(format!("Failed to embed mode: {e}")))?;

    Ok(format!(
        r#"(function () {{
  var module = {{ exports: {{}} }};
  var require = function (id) {{
    throw new Error("require('" + id + "') is not available while evaluating config");
  }};
  var factory = new Function("exports", "require", "module", "__mpx_mode__", {body});
  factory(module.exports, require, module, {mode});
  var text = JSON.stringify(module.exports, null, 2);
  if (typeof text !== "string") {{
    throw new TypeError("module.exports is not JSON-serializable");
  }}
  return text;
}})()"#
    ))
}

fn run_program(program: &str, limits: &SandboxOptions) -> Result<String> {
    let mut context = Context::default();
    context
        .runtime_limits_mut()
        .set_loop_iteration_limit(limits.loop_iteration_limit);
    context
        .runtime_limits_mut()
        .set_recursion_limit(limits.recursion_limit);

    let value = context
        .eval(Source::from_bytes(program.as_bytes()))
        .map_err(|e| LoaderError::Evaluation(e.to_string()))?;

    value
        .as_string()
        .map(|text| text.to_std_string_escaped())
        .ok_or_else(|| {
            LoaderError::Evaluation("Config evaluation did not produce text".to_string())
        })
}
