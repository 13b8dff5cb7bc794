//! Rich errors: message, captured stack trace and structured context
//!
//! A [`RichError`] is created by [`Logger::new_error`](crate::Logger::new_error)
//! or [`Logger::add_context`](crate::Logger::add_context). Clones share one
//! logical error: context added through any clone is visible to every holder.
//! Concurrent enrichment of the same error is memory-safe but has no ordering
//! guarantee beyond last-writer-wins per key.

use crate::{ErrorValue, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct RichError {
    inner: Arc<RichErrorInner>,
}

struct RichErrorInner {
    message: String,
    stack_trace: String,
    context: RwLock<HashMap<String, Value>>,
}

impl RichError {
    /// Context keys must already be sanitized.
    pub(crate) fn new(
        message: impl Into<String>,
        stack_trace: String,
        context: HashMap<String, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(RichErrorInner {
                message: message.into(),
                stack_trace,
                context: RwLock::new(context),
            }),
        }
    }

    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Stack trace captured when the error was created
    pub fn stack_trace(&self) -> &str {
        &self.inner.stack_trace
    }

    /// Snapshot of the context
    pub fn context(&self) -> HashMap<String, Value> {
        self.inner.context.read().clone()
    }

    pub fn context_value(&self, key: &str) -> Option<Value> {
        self.inner.context.read().get(key).cloned()
    }

    pub fn context_len(&self) -> usize {
        self.inner.context.read().len()
    }

    /// Whether both handles refer to the same logical error
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Merge sanitized entries in place; later entries win.
    ///
    /// A rich error that is, or transitively contains, `self` is stored as
    /// its message only, so contexts never form a cycle.
    pub(crate) fn merge_context(&self, entries: HashMap<String, Value>) {
        if entries.is_empty() {
            return;
        }
        let entries: Vec<_> = entries
            .into_iter()
            .map(|(key, value)| match value.as_rich_error() {
                Some(err) if err.ptr_eq(self) || err.contains(self) => {
                    let flattened = Value::Error(ErrorValue::opaque(err.message()));
                    (key, flattened)
                }
                _ => (key, value),
            })
            .collect();
        self.inner.context.write().extend(entries);
    }

    /// Whether `target` is reachable through this error's context
    fn contains(&self, target: &RichError) -> bool {
        self.inner.context.read().values().any(|value| {
            value
                .as_rich_error()
                .is_some_and(|err| err.ptr_eq(target) || err.contains(target))
        })
    }
}

impl fmt::Display for RichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.message)
    }
}

impl fmt::Debug for RichError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichError")
            .field("message", &self.inner.message)
            .field("context", &*self.inner.context.read())
            .field("stack_trace", &self.inner.stack_trace)
            .finish()
    }
}

impl PartialEq for RichError {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl std::error::Error for RichError {}
