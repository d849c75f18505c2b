//! Output sinks for the console API.
//!
//! Every console call made by script ends up in the *current sink* of the
//! thread the engine runs on. Capture strategies swap a sink in with
//! [`install_sink`] and the returned [`SinkGuard`] puts the previous one back
//! when it is dropped.

use crate::console::LogLevel;
use std::cell::RefCell;
use std::rc::Rc;

/// Destination for formatted console output.
pub trait OutputSink {
    /// Write one console line.
    fn write(&self, level: LogLevel, message: &str);
}

/// Default sink: forwards console output to `tracing` (the developer tools
/// view of a headless engine).
#[derive(Clone, Debug)]
pub struct DevToolsSink {
    /// Which execution context the output came from.
    label: &'static str,
}

impl DevToolsSink {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for DevToolsSink {
    fn default() -> Self {
        Self::new("page")
    }
}

impl OutputSink for DevToolsSink {
    fn write(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "devtools", context = self.label, "{}", message),
            LogLevel::Warn => tracing::warn!(target: "devtools", context = self.label, "{}", message),
            LogLevel::Info => tracing::info!(target: "devtools", context = self.label, "{}", message),
            LogLevel::Log => tracing::debug!(target: "devtools", context = self.label, "{}", message),
        }
    }
}

thread_local! {
    static CURRENT_SINK: RefCell<Rc<dyn OutputSink>> = RefCell::new(Rc::new(DevToolsSink::default()));
}

/// Get the sink console output is currently routed to.
pub fn current_sink() -> Rc<dyn OutputSink> {
    CURRENT_SINK.with(|sink| sink.borrow().clone())
}

/// Replace the thread's default sink without a guard.
///
/// Used once when a dedicated engine thread starts up.
pub fn set_default_sink(sink: Rc<dyn OutputSink>) {
    CURRENT_SINK.with(|current| *current.borrow_mut() = sink);
}

/// Route console output to `sink` until the returned guard is dropped.
#[must_use = "the previous sink is restored as soon as the guard is dropped"]
pub fn install_sink(sink: Rc<dyn OutputSink>) -> SinkGuard {
    let previous = CURRENT_SINK.with(|current| std::mem::replace(&mut *current.borrow_mut(), sink));
    SinkGuard {
        previous: Some(previous),
    }
}

/// Write a line to the current sink.
pub(crate) fn emit(level: LogLevel, message: &str) {
    // Clone out first so a sink may itself call back into the console.
    let sink = current_sink();
    sink.write(level, message);
}

/// Restores the previously installed sink on drop.
pub struct SinkGuard {
    previous: Option<Rc<dyn OutputSink>>,
}

impl Drop for SinkGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CURRENT_SINK.with(|current| *current.borrow_mut() = previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        lines: RefCell<Vec<(LogLevel, String)>>,
    }

    impl OutputSink for Recorder {
        fn write(&self, level: LogLevel, message: &str) {
            self.lines.borrow_mut().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_guard_restores_previous_sink() {
        let before = current_sink();
        let recorder = Rc::new(Recorder::default());

        {
            let _guard = install_sink(recorder.clone());
            emit(LogLevel::Warn, "captured");
        }

        emit(LogLevel::Log, "not captured");
        assert!(Rc::ptr_eq(&before, &current_sink()));
        assert_eq!(
            recorder.lines.borrow().as_slice(),
            &[(LogLevel::Warn, "captured".to_string())]
        );
    }

    #[test]
    fn test_guard_restores_on_panic() {
        let before = current_sink();
        let recorder = Rc::new(Recorder::default());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = install_sink(recorder.clone());
            panic!("evaluation blew up");
        }));

        assert!(result.is_err());
        assert!(Rc::ptr_eq(&before, &current_sink()));
    }

    #[test]
    fn test_nested_guards_unwind_in_order() {
        let outer = Rc::new(Recorder::default());
        let inner = Rc::new(Recorder::default());

        let outer_guard = install_sink(outer.clone());
        {
            let _inner_guard = install_sink(inner.clone());
            emit(LogLevel::Info, "inner");
        }
        emit(LogLevel::Info, "outer");
        drop(outer_guard);

        assert_eq!(inner.lines.borrow().len(), 1);
        assert_eq!(outer.lines.borrow()[0].1, "outer");
    }
}
