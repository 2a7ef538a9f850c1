//! Progress reporting
//!
//! The resolver and the diff engine report each table they process through a
//! [`ProgressSink`] handed to them by the caller. They never print directly.

use std::cell::RefCell;

/// Receives one message per resolved or compared table
pub trait ProgressSink {
    fn report(&self, message: &str);
}

/// Forwards progress to `tracing` at info level
#[derive(Debug, Clone)]
pub struct TracingProgress {
    category: &'static str,
}

impl TracingProgress {
    pub fn new(category: &'static str) -> Self {
        Self { category }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new("schema_evolve")
    }
}

impl ProgressSink for TracingProgress {
    fn report(&self, message: &str) {
        tracing::info!(category = self.category, "{}", message);
    }
}

/// Discards every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _message: &str) {}
}

/// Keeps every message in memory, in order
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: RefCell<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
