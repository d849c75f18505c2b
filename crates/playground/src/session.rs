//! Editor session: source text, output buffer, and the Run/Clear/Reset
//! actions.

use crate::capture::{direct, IsolatedCapture};
use crate::config::{CaptureMode, PlaygroundConfig};
use crate::log::{LogBuffer, LogLine};
use crate::notify::{Notification, Notifier, TracingNotifier};
use common::{PlaygroundError, PlaygroundResult};
use js_engine::{JsEngine, LogLevel};

/// One playground session.
pub struct Playground {
    config: PlaygroundConfig,
    /// The editor document.
    source: String,
    /// Output of the most recent run.
    output: LogBuffer,
    /// The hosting page's engine. Direct runs evaluate here.
    page: JsEngine,
    /// Created on the first isolated run and kept for the session.
    isolated: Option<IsolatedCapture>,
    notifier: Box<dyn Notifier>,
    running: bool,
    runs: u64,
}

impl Playground {
    /// Create a session with the configured default source.
    pub fn new(config: PlaygroundConfig) -> PlaygroundResult<Self> {
        let page = JsEngine::new().map_err(|e| PlaygroundError::js(e.to_string()))?;

        Ok(Self {
            source: config.default_source.clone(),
            config,
            output: LogBuffer::new(),
            page,
            isolated: None,
            notifier: Box::new(TracingNotifier),
            running: false,
            runs: 0,
        })
    }

    /// Route notifications to `notifier`.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Editor change callback. An absent value clears the document.
    pub fn on_editor_change(&mut self, value: Option<&str>) {
        self.source = value.unwrap_or_default().to_string();
    }

    pub fn output(&self) -> &LogBuffer {
        &self.output
    }

    pub fn mode(&self) -> CaptureMode {
        self.config.mode
    }

    pub fn set_mode(&mut self, mode: CaptureMode) {
        self.config.mode = mode;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of runs triggered in this session.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// The hosting page's engine.
    pub fn page_mut(&mut self) -> &mut JsEngine {
        &mut self.page
    }

    /// Run the current source with the configured capture mode.
    ///
    /// Never fails: errors thrown by the source become ERROR lines, and a
    /// frame that cannot be set up produces a notification plus an ERROR
    /// line.
    pub async fn run(&mut self) {
        if self.running && self.isolated.take().is_some() {
            // The previous run was cancelled while its document was running.
            tracing::warn!(run = self.runs, "previous run did not finish, replacing the frame");
        }
        self.running = true;
        self.runs += 1;
        self.output.clear();

        let source = self.source.clone();
        let mode = self.config.mode;
        tracing::debug!(run = self.runs, ?mode, bytes = source.len(), "running source");

        let result = match mode {
            CaptureMode::Direct => {
                let lines = direct::capture(&mut self.page, &source);
                self.output.extend(lines);
                Ok(())
            }
            CaptureMode::Isolated => self.run_isolated(&source).await,
        };

        if let Err(e) = result {
            tracing::error!(error = %e, "execution setup failed");
            if matches!(e, PlaygroundError::FrameUnavailable(_)) {
                // Rebuilt on the next run.
                self.isolated = None;
            }
            self.notify(Notification::execution_failed(&e));
            self.output.push(LogLine::new(LogLevel::Error, e.to_string()));
        }

        self.running = false;
        tracing::debug!(run = self.runs, lines = self.output.len(), "run finished");
    }

    async fn run_isolated(&mut self, source: &str) -> PlaygroundResult<()> {
        let capture = match self.isolated.take() {
            Some(capture) => capture,
            None => IsolatedCapture::create(&self.config)?,
        };
        let capture = self.isolated.insert(capture);
        capture.run(source, &mut self.output).await
    }

    /// Deliver frame messages that arrived after the last run completed.
    pub fn poll_messages(&mut self) -> usize {
        match self.isolated.as_mut() {
            Some(capture) => capture.pump(&mut self.output),
            None => 0,
        }
    }

    /// Empty the output, keeping the source.
    pub fn clear_console(&mut self) {
        self.output.clear();
        self.notify(Notification::console_cleared());
    }

    /// Restore the default source and empty the output.
    pub fn reset_code(&mut self) {
        self.source = self.config.default_source.clone();
        self.output.clear();
        self.notify(Notification::code_reset());
    }

    fn notify(&self, notification: Notification) {
        if self.config.notifications {
            self.notifier.notify(&notification);
        }
    }
}
