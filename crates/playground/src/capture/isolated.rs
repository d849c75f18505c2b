//! Frame-isolated capture.
//!
//! Each run writes a fresh document into the nested frame. The document's
//! first script replaces the frame's console with functions that call the
//! original and post `{type: "console", level, message}` to the parent; the
//! second script runs the user's source inside a `try` block. The host side
//! [`MessageListener`] turns those messages back into log lines.

use crate::config::PlaygroundConfig;
use crate::log::{LogBuffer, LogLine};
use common::{PlaygroundError, PlaygroundResult};
use js_engine::{FrameConfig, FrameDocument, FrameEvent, FrameHost, LogLevel};
use serde::Deserialize;
use tokio::sync::mpsc;

/// Message `type` of console messages.
pub const CONSOLE_MESSAGE_TYPE: &str = "console";

/// Prefix of errors thrown by the user's source.
pub const RUNTIME_ERROR_PREFIX: &str = "Runtime Error: ";

/// Installs the posting console and the error handler inside the frame.
const CONSOLE_BRIDGE: &str = r#"(function () {
  var original = {
    log: console.log,
    warn: console.warn,
    error: console.error,
    info: console.info
  };

  function coerce(value) {
    try {
      return String(value);
    } catch (err) {
      return Object.prototype.toString.call(value);
    }
  }

  function format(args) {
    var parts = [];
    for (var i = 0; i < args.length; i++) {
      var arg = args[i];
      if (typeof arg === 'object') {
        try {
          var json = JSON.stringify(arg);
          parts.push(json === undefined ? coerce(arg) : json);
        } catch (err) {
          parts.push(coerce(arg));
        }
      } else {
        parts.push(coerce(arg));
      }
    }
    return parts.join(' ');
  }

  ['log', 'warn', 'error', 'info'].forEach(function (level) {
    console[level] = function () {
      original[level].apply(console, arguments);
      parent.postMessage({ type: 'console', level: level, message: format(arguments) }, '*');
    };
  });

  window.onerror = function (message, source, lineno) {
    console.error('Line ' + lineno + ': ' + message);
    return true;
  };
})();
"#;

/// Build the document a run writes into the frame.
pub fn build_document(source: &str) -> FrameDocument {
    FrameDocument::new()
        .with_script(CONSOLE_BRIDGE)
        .with_script(guard_source(source))
}

/// Wrap the user's source so a throw is reported instead of escaping.
///
/// The source starts on the first line of the script so reported line
/// numbers match the editor.
fn guard_source(source: &str) -> String {
    format!(
        "try {{ {}\n}} catch (e) {{\n  console.error('{}' + (e instanceof Error ? e.message : String(e)));\n}}\n",
        source, RUNTIME_ERROR_PREFIX
    )
}

#[derive(Debug, Deserialize)]
struct ConsoleMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    message: serde_json::Value,
}

/// Decode a posted payload into a log line.
///
/// Returns `None` for anything that is not a console message. Unknown level
/// tags are shown as INFO.
pub fn console_line(data: &serde_json::Value) -> Option<LogLine> {
    let message = ConsoleMessage::deserialize(data).ok()?;
    if message.kind != CONSOLE_MESSAGE_TYPE {
        return None;
    }

    let level = message
        .level
        .as_deref()
        .and_then(LogLevel::from_tag)
        .unwrap_or(LogLevel::Info);
    let text = match message.message {
        serde_json::Value::String(text) => text,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    };

    Some(LogLine::new(level, text))
}

/// Standing listener for frame events.
///
/// Only events stamped with the current run identifier reach the buffer;
/// anything older is dropped.
pub struct MessageListener {
    events: mpsc::UnboundedReceiver<FrameEvent>,
    current_run: u64,
    discarded: u64,
}

impl MessageListener {
    pub fn new(events: mpsc::UnboundedReceiver<FrameEvent>) -> Self {
        Self {
            events,
            current_run: 0,
            discarded: 0,
        }
    }

    /// Start accepting events for `run_id`.
    pub fn begin_run(&mut self, run_id: u64) {
        self.current_run = run_id;
    }

    pub fn current_run(&self) -> u64 {
        self.current_run
    }

    /// Number of stale events dropped so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Apply one event to the buffer. Returns `true` when it is the current
    /// run's `Loaded` event.
    pub fn handle(&mut self, event: FrameEvent, buffer: &mut LogBuffer) -> bool {
        if event.run_id() != self.current_run {
            self.discarded += 1;
            tracing::debug!(
                run_id = event.run_id(),
                current = self.current_run,
                "discarding frame event from a stale run"
            );
            return false;
        }

        match event {
            FrameEvent::Message(message) => {
                match console_line(&message.data) {
                    Some(line) => buffer.push(line),
                    None => tracing::trace!(data = %message.data, "ignoring non-console message"),
                }
                false
            }
            FrameEvent::Loaded { scripts_run, .. } => {
                tracing::debug!(run_id = self.current_run, scripts_run, "frame document loaded");
                true
            }
        }
    }

    /// Wait until the current run's document has loaded, appending its
    /// console output as it arrives.
    pub async fn receive_run(&mut self, buffer: &mut LogBuffer) -> PlaygroundResult<()> {
        while let Some(event) = self.events.recv().await {
            if self.handle(event, buffer) {
                return Ok(());
            }
        }

        Err(PlaygroundError::frame_unavailable(
            "frame stopped before the document finished loading",
        ))
    }

    /// Apply every event that has already arrived, without waiting.
    /// Returns how many events were taken off the channel.
    pub fn pump(&mut self, buffer: &mut LogBuffer) -> usize {
        let mut received = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event, buffer);
            received += 1;
        }
        received
    }
}

/// The nested frame plus its listener.
pub struct IsolatedCapture {
    frame: FrameHost,
    listener: MessageListener,
    next_run_id: u64,
}

impl IsolatedCapture {
    /// Create the frame described by `config`.
    pub fn create(config: &PlaygroundConfig) -> PlaygroundResult<Self> {
        let frame_config = FrameConfig::new(
            config.frame_name.clone(),
            config.frame_sandbox(),
            config.parent_origin()?,
        );
        let (frame, events) = FrameHost::spawn(frame_config)
            .map_err(|e| PlaygroundError::frame_unavailable(e.to_string()))?;

        Ok(Self {
            frame,
            listener: MessageListener::new(events),
            next_run_id: 1,
        })
    }

    /// Run `source` in a freshly written frame document.
    pub async fn run(&mut self, source: &str, buffer: &mut LogBuffer) -> PlaygroundResult<()> {
        if !self.frame.sandbox().allows_scripts() {
            return Err(PlaygroundError::sandbox(format!(
                "frame sandbox '{}' does not allow scripts",
                self.frame.sandbox()
            )));
        }

        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.listener.begin_run(run_id);

        self.frame
            .load(run_id, build_document(source))
            .map_err(|e| PlaygroundError::frame_unavailable(e.to_string()))?;

        self.listener.receive_run(buffer).await
    }

    /// Deliver late messages for the current run.
    pub fn pump(&mut self, buffer: &mut LogBuffer) -> usize {
        self.listener.pump(buffer)
    }

    pub fn frame(&self) -> &FrameHost {
        &self.frame
    }

    pub fn listener(&self) -> &MessageListener {
        &self.listener
    }
}
