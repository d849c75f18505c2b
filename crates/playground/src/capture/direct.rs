//! Same-context capture.
//!
//! The user's source is evaluated in the host page's own engine while a
//! capture sink sits in front of the page console. The sink forwards each
//! line to whatever was installed before (so the developer tools still see
//! it) and records it. User code shares the page's global scope.

use crate::log::LogLine;
use js_engine::sink::{self, OutputSink};
use js_engine::{install_sink, JsEngine, LogLevel};
use std::cell::RefCell;
use std::rc::Rc;

/// Sink that records every line and passes it on to the previous sink.
struct CaptureSink {
    previous: Rc<dyn OutputSink>,
    lines: RefCell<Vec<LogLine>>,
}

impl CaptureSink {
    fn new(previous: Rc<dyn OutputSink>) -> Self {
        Self {
            previous,
            lines: RefCell::new(Vec::new()),
        }
    }

    fn take_lines(&self) -> Vec<LogLine> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }
}

impl OutputSink for CaptureSink {
    fn write(&self, level: LogLevel, message: &str) {
        self.previous.write(level, message);
        self.lines.borrow_mut().push(LogLine::new(level, message));
    }
}

/// Evaluate `source` in `page`, returning every console line it emitted in
/// order, followed by one ERROR line if it threw.
pub fn capture(page: &mut JsEngine, source: &str) -> Vec<LogLine> {
    let capture = Rc::new(CaptureSink::new(sink::current_sink()));

    let outcome = {
        let _guard = install_sink(capture.clone());
        page.evaluate(source)
    };

    let mut lines = capture.take_lines();
    if let Err(e) = outcome {
        let failure = page.describe(&e);
        tracing::debug!(error = %failure.message, "user code threw");
        lines.push(LogLine::new(LogLevel::Error, failure.message));
    }

    // Promise callbacks run after the console is restored, as they would
    // once the run handler returned.
    page.run_pending_jobs();

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(lines: &[LogLine]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_default_source_output() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(&mut page, crate::config::DEFAULT_SOURCE);
        assert_eq!(render(&lines), vec!["[LOG] Hello, World!"]);
    }

    #[test]
    fn test_levels_in_emission_order() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(
            &mut page,
            "console.warn('w'); console.log('a', 1); console.error('e'); console.info('i');",
        );
        assert_eq!(
            render(&lines),
            vec!["[WARN] w", "[LOG] a 1", "[ERROR] e", "[INFO] i"]
        );
    }

    #[test]
    fn test_throw_yields_single_error_line() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(&mut page, "throw new Error('boom')");
        assert_eq!(render(&lines), vec!["[ERROR] boom"]);
    }

    #[test]
    fn test_output_before_throw_is_kept() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(&mut page, "console.log('before'); throw 'plain';");
        assert_eq!(render(&lines), vec!["[LOG] before", "[ERROR] plain"]);
    }

    #[test]
    fn test_thrown_non_error_object_is_coerced() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(&mut page, "throw { message: 'x' }");
        assert_eq!(render(&lines), vec!["[ERROR] [object Object]"]);
    }

    #[test]
    fn test_objects_render_as_json() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(&mut page, "console.log({a:1})");
        assert_eq!(render(&lines), vec![r#"[LOG] {"a":1}"#]);
    }

    #[test]
    fn test_sink_restored_after_throw() {
        let mut page = JsEngine::new().unwrap();
        let before = sink::current_sink();
        capture(&mut page, "throw new Error('boom')");
        assert!(Rc::ptr_eq(&before, &sink::current_sink()));
    }

    #[test]
    fn test_page_globals_persist_between_runs() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(&mut page, "var later = function () { console.log('late'); };");
        assert!(lines.is_empty());

        let next = capture(&mut page, "later(); console.log('now');");
        assert_eq!(render(&next), vec!["[LOG] late", "[LOG] now"]);
    }

    #[test]
    fn test_promise_jobs_run_after_restore() {
        let mut page = JsEngine::new().unwrap();
        let lines = capture(
            &mut page,
            "Promise.resolve().then(function () { console.log('async'); }); console.log('sync');",
        );
        assert_eq!(render(&lines), vec!["[LOG] sync"]);
    }
}
