// src/dispatch.rs

//! Name-to-handler dispatch for packaged functions
//!
//! A decoded package never runs by itself. Calling one of its functions goes
//! through a `DispatchTable` built from the package manifest and an
//! explicitly supplied `Evaluator`; names outside the manifest are rejected
//! before anything executes.

use crate::container::DecodedPackage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Module entry points that are never exposed as callable functions
pub const ENTRY_POINTS: [&str; 2] = ["main", "__main__"];

/// Default bound on a single evaluation
pub const DEFAULT_EVAL_TIMEOUT: Duration = Duration::from_secs(10);

pub fn is_entry_point(name: &str) -> bool {
    ENTRY_POINTS.contains(&name)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Unknown function '{name}'; available: {}", .available.join(", "))]
    UnknownFunction { name: String, available: Vec<String> },

    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

/// Runs one function of a guest source with JSON arguments
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, source: &str, function: &str, args: &[Value])
    -> Result<Value, DispatchError>;
}

type Handler = Box<dyn Fn(&[Value]) -> Result<Value, DispatchError> + Send + Sync>;

/// Allow-list of callable functions
#[derive(Default)]
pub struct DispatchTable {
    handlers: BTreeMap<String, Handler>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// One handler per manifest name, each evaluating the package source
    pub fn from_package(package: &DecodedPackage, evaluator: Arc<dyn Evaluator>) -> Self {
        let source: Arc<str> = Arc::from(package.source.as_str());
        let mut table = Self::new();

        for name in package.functions.names() {
            let source = Arc::clone(&source);
            let evaluator = Arc::clone(&evaluator);
            let function = name.clone();
            table = table.with_handler(name, move |args| {
                evaluator.evaluate(&source, &function, args)
            });
        }

        debug!("Dispatch table holds {} function(s)", table.len());
        table
    }

    /// Register a precompiled handler
    pub fn with_handler<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, DispatchError> + Send + Sync + 'static,
    {
        if is_entry_point(name) {
            debug!("Not registering entry point '{}'", name);
            return self;
        }
        self.handlers.insert(name.to_string(), Box::new(handler));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, DispatchError> {
        let Some(handler) = self.handlers.get(name) else {
            return Err(DispatchError::UnknownFunction {
                name: name.to_string(),
                available: self.names(),
            });
        };

        info!("Calling {} with {} argument(s)", name, args.len());
        handler(args)
    }
}

#[derive(Serialize)]
struct EvalRequest<'a> {
    source: &'a str,
    function: &'a str,
    args: &'a [Value],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EvalResponse {
    Ok { ok: Value },
    Err { error: String },
}

/// Read a child pipe to the end on its own thread
///
/// Every piped stream must be drained while the child is waited on; a full
/// pipe blocks the child until the timeout fires.
pub(crate) fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Evaluator that hands each call to an external sandbox process
///
/// The process receives `{"source", "function", "args"}` as JSON on stdin and
/// must print `{"ok": value}` or `{"error": message}` on stdout.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_EVAL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parse_response(stdout: &[u8]) -> Result<Value, DispatchError> {
        match serde_json::from_slice::<EvalResponse>(stdout) {
            Ok(EvalResponse::Ok { ok }) => Ok(ok),
            Ok(EvalResponse::Err { error }) => Err(DispatchError::Evaluation(error)),
            Err(e) => Err(DispatchError::Evaluation(format!(
                "Unreadable evaluator reply: {}",
                e
            ))),
        }
    }
}

impl Evaluator for CommandEvaluator {
    fn evaluate(
        &self,
        source: &str,
        function: &str,
        args: &[Value],
    ) -> Result<Value, DispatchError> {
        let request = serde_json::to_vec(&EvalRequest {
            source,
            function,
            args,
        })
        .map_err(|e| DispatchError::Evaluation(format!("Failed to encode request: {}", e)))?;

        debug!("Executing: {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DispatchError::Evaluation(format!("Failed to spawn '{}': {}", self.program, e))
            })?;

        let stdin = child.stdin.take();
        let writer = std::thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(&request) {
                    debug!("Evaluator closed stdin early: {}", e);
                }
            }
        });
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = child
            .wait_timeout(self.timeout)
            .map_err(|e| DispatchError::Evaluation(format!("Failed to wait on evaluator: {}", e)))?;

        let Some(status) = status else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DispatchError::Evaluation(format!(
                "'{}' timed out after {} seconds",
                self.program,
                self.timeout.as_secs()
            )));
        };

        let _ = writer.join();
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();
        let stderr = String::from_utf8_lossy(&stderr);
        for line in stderr.lines() {
            warn!("[{}] {}", self.program, line);
        }

        if !status.success() && stdout.is_empty() {
            let code = status.code().unwrap_or(-1);
            return Err(DispatchError::Evaluation(format!(
                "'{}' failed with exit code {}: {}",
                self.program,
                code,
                stderr.trim()
            )));
        }

        Self::parse_response(&stdout)
    }
}
