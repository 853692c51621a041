//! Diagnostics for unmapped columns and members.
//!
//! Matching never fails: anything it cannot pair is reported to an injected
//! `DiagnosticSink` and left unset. `DiagnosticsStream` is a multicast sink
//! with terminal-state replay: subscribers added after `complete()` receive
//! an immediate `Notice::Completed` instead of future messages.

use crate::metadata::column::TypeTag;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A target member found no compatible column
    UnmappedMember,
    /// A column was not consumed by any member
    UnmappedColumn,
}

/// One unmapped item discovered while matching a shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Target type name
    pub target: String,
    /// Member or column name
    pub name: String,
    pub type_tag: TypeTag,
    /// Removable prefix in effect, if any
    pub prefix: Option<String>,
    /// Name of a column that matched by name but had an incompatible type
    pub incompatible_with: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::UnmappedMember => write!(
                f,
                "{}: member '{}' ({}) was not mapped",
                self.target, self.name, self.type_tag
            )?,
            DiagnosticKind::UnmappedColumn => write!(
                f,
                "{}: column '{}' ({}) was not mapped",
                self.target, self.name, self.type_tag
            )?,
        }
        if let Some(other) = &self.incompatible_with {
            write!(f, "; '{}' matched by name but its type is incompatible", other)?;
        }
        if let Some(prefix) = &self.prefix {
            write!(f, " [prefix '{}']", prefix)?;
        }
        Ok(())
    }
}

/// Receiver of matching diagnostics
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn emit(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}

/// Level used by `TracingSink`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl Default for DiagnosticLevel {
    fn default() -> Self {
        DiagnosticLevel::Debug
    }
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    level: DiagnosticLevel,
}

impl TracingSink {
    pub fn new(level: DiagnosticLevel) -> Self {
        Self { level }
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        let target = diagnostic.target.as_str();
        match self.level {
            DiagnosticLevel::Trace => tracing::trace!(target_type = target, "{}", diagnostic),
            DiagnosticLevel::Debug => tracing::debug!(target_type = target, "{}", diagnostic),
            DiagnosticLevel::Info => tracing::info!(target_type = target, "{}", diagnostic),
            DiagnosticLevel::Warn => tracing::warn!(target_type = target, "{}", diagnostic),
        }
    }
}

/// Item delivered to a stream subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Message(String),
    Completed,
}

/// Receiving end of a `DiagnosticsStream` subscription
#[derive(Debug)]
pub struct Subscription {
    rx: UnboundedReceiver<Notice>,
}

impl Subscription {
    /// Wait for the next notice; `None` once the stream is completed and drained
    pub async fn next(&mut self) -> Option<Notice> {
        self.rx.recv().await
    }

    /// Next notice if one is already queued
    pub fn try_next(&mut self) -> Option<Notice> {
        self.rx.try_recv().ok()
    }

    /// Everything queued right now
    pub fn drain(&mut self) -> Vec<Notice> {
        let mut out = Vec::new();
        while let Ok(notice) = self.rx.try_recv() {
            out.push(notice);
        }
        out
    }
}

#[derive(Default)]
struct StreamState {
    subscribers: Vec<UnboundedSender<Notice>>,
    completed: bool,
}

/// Multicast diagnostics channel with terminal-state replay
#[derive(Default)]
pub struct DiagnosticsStream {
    state: Mutex<StreamState>,
}

impl DiagnosticsStream {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StreamState> {
        // State stays consistent even if a holder panicked: every mutation is a single push/clear
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe to future messages
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();
        if state.completed {
            let _ = tx.send(Notice::Completed);
        } else {
            state.subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Send a message to every live subscriber; dropped after completion
    pub fn publish(&self, message: impl Into<String>) {
        let mut state = self.state();
        if state.completed {
            return;
        }
        let message = message.into();
        state
            .subscribers
            .retain(|tx| tx.send(Notice::Message(message.clone())).is_ok());
    }

    /// Permanently close the stream
    pub fn complete(&self) {
        let mut state = self.state();
        if state.completed {
            return;
        }
        state.completed = true;
        for tx in state.subscribers.drain(..) {
            let _ = tx.send(Notice::Completed);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state().completed
    }

    pub fn subscriber_count(&self) -> usize {
        self.state().subscribers.len()
    }
}

impl DiagnosticSink for DiagnosticsStream {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.publish(diagnostic.to_string());
    }
}
