use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    /// Short, stable category such as `"imagery"` or `"tileset"`.
    pub kind: &'static str,
    pub message: String,
}

/// Diagnostic channel for non-fatal failures and notable scene events.
///
/// Every emit is forwarded to `tracing` and also retained, so callers (and
/// tests) can inspect what happened without scraping logs.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBus {
    events: Rc<RefCell<Vec<Diagnostic>>>,
}

impl DiagnosticBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, level: Level, kind: &'static str, message: impl Into<String>) {
        let message = message.into();
        match level {
            Level::Debug => tracing::debug!(kind, "{message}"),
            Level::Info => tracing::info!(kind, "{message}"),
            Level::Warn => tracing::warn!(kind, "{message}"),
            Level::Error => tracing::error!(kind, "{message}"),
        }
        self.events.borrow_mut().push(Diagnostic {
            level,
            kind,
            message,
        });
    }

    pub fn debug(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Debug, kind, message);
    }

    pub fn info(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Info, kind, message);
    }

    pub fn warn(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Warn, kind, message);
    }

    pub fn error(&self, kind: &'static str, message: impl Into<String>) {
        self.emit(Level::Error, kind, message);
    }

    pub fn events(&self) -> Vec<Diagnostic> {
        self.events.borrow().clone()
    }

    /// Number of retained records at or above `level`.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.level >= level)
            .count()
    }

    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.borrow_mut())
    }
}
