//! Nested browsing contexts.
//!
//! A [`FrameHost`] plays the part of an `<iframe>` element: it owns a
//! dedicated thread on which documents are loaded. Every load tears the
//! previous document down and builds a brand new engine, so nothing a script
//! defines survives into the next document. Scripts reach the embedding page
//! through `parent.postMessage`, which arrives on the host side as
//! [`FrameEvent::Message`].

use crate::console;
use crate::engine::JsEngine;
use crate::sink::{self, DevToolsSink};
use boa_engine::{
    js_string, object::ObjectInitializer, property::Attribute, Context, JsArgs, JsError,
    JsNativeError, JsResult, JsString, JsValue, NativeFunction,
};
use parking_lot::Mutex;
use playground_security::{Origin, Sandbox, TargetOrigin};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;

/// URL reported to `onerror` as the source of inline document scripts.
pub const SRCDOC_URL: &str = "about:srcdoc";

/// A document to be written into a frame: its inline scripts, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameDocument {
    scripts: Vec<String>,
}

impl FrameDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an inline script block.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.scripts.push(script.into());
        self
    }

    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }
}

/// Frame configuration.
#[derive(Clone, Debug)]
pub struct FrameConfig {
    /// Frame name, used for the thread name and in logs.
    pub name: String,
    /// Sandbox the frame is created with.
    pub sandbox: Sandbox,
    /// Origin of the embedding page.
    pub parent_origin: Origin,
}

impl FrameConfig {
    pub fn new(name: impl Into<String>, sandbox: Sandbox, parent_origin: Origin) -> Self {
        Self {
            name: name.into(),
            sandbox,
            parent_origin,
        }
    }

    /// Origin of documents loaded into the frame.
    ///
    /// `srcdoc` documents inherit the parent's origin unless the sandbox
    /// forces an opaque one.
    pub fn document_origin(&self) -> Option<Origin> {
        self.sandbox
            .allows_same_origin()
            .then(|| self.parent_origin.clone())
    }
}

/// A message posted by a frame document to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct PostedMessage {
    /// Load the message was posted from.
    pub run_id: u64,
    /// Sender origin; `None` when opaque.
    pub origin: Option<Origin>,
    /// Structured-cloned payload.
    pub data: serde_json::Value,
}

/// Events a frame reports to its host.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameEvent {
    /// A document called `parent.postMessage`.
    Message(PostedMessage),
    /// A document finished loading. Every message it posted was sent before this.
    Loaded { run_id: u64, scripts_run: usize },
}

impl FrameEvent {
    pub fn run_id(&self) -> u64 {
        match self {
            FrameEvent::Message(message) => message.run_id,
            FrameEvent::Loaded { run_id, .. } => *run_id,
        }
    }
}

/// Frame error.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("failed to spawn frame thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("frame '{0}' is no longer running")]
    Unavailable(String),
}

enum FrameCommand {
    Load { run_id: u64, document: FrameDocument },
    Shutdown,
}

#[derive(Debug, Default)]
struct FrameState {
    documents_loaded: u64,
    last_run_id: Option<u64>,
}

/// The embedding side of a nested browsing context.
pub struct FrameHost {
    config: FrameConfig,
    commands: mpsc::UnboundedSender<FrameCommand>,
    state: Arc<Mutex<FrameState>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl FrameHost {
    /// Create the frame and start its thread.
    ///
    /// Returns the host handle and the receiving end of the frame's event
    /// channel.
    pub fn spawn(config: FrameConfig) -> Result<(Self, mpsc::UnboundedReceiver<FrameEvent>), FrameError> {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(FrameState::default()));

        let thread = {
            let config = config.clone();
            let state = state.clone();
            thread::Builder::new()
                .name(format!("frame-{}", config.name))
                .spawn(move || frame_main(config, command_rx, event_tx, state))?
        };

        tracing::debug!(frame = %config.name, sandbox = %config.sandbox, "frame created");

        Ok((
            Self {
                config,
                commands: command_tx,
                state,
                thread: Some(thread),
            },
            event_rx,
        ))
    }

    /// Discard the current document and load `document` in its place.
    pub fn load(&self, run_id: u64, document: FrameDocument) -> Result<(), FrameError> {
        self.commands
            .send(FrameCommand::Load { run_id, document })
            .map_err(|_| FrameError::Unavailable(self.config.name.clone()))
    }

    /// Whether the frame thread is still accepting documents.
    pub fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.config.sandbox
    }

    /// Number of documents the frame has finished loading.
    pub fn documents_loaded(&self) -> u64 {
        self.state.lock().documents_loaded
    }

    /// Run identifier of the most recently loaded document.
    pub fn last_run_id(&self) -> Option<u64> {
        self.state.lock().last_run_id
    }
}

impl Drop for FrameHost {
    /// Tears the frame down without waiting on a document that is still
    /// running. A busy thread is detached and exits once its script returns.
    fn drop(&mut self) {
        let _ = self.commands.send(FrameCommand::Shutdown);
        let Some(thread) = self.thread.take() else {
            return;
        };

        if !thread.is_finished() {
            tracing::debug!(frame = %self.config.name, "frame still busy, detaching its thread");
            return;
        }
        if thread.join().is_err() {
            tracing::error!(frame = %self.config.name, "frame thread panicked");
        }
    }
}

/// Delivery endpoint for `parent.postMessage` during one load.
struct Port {
    run_id: u64,
    events: mpsc::UnboundedSender<FrameEvent>,
    sender_origin: Option<Origin>,
    parent_origin: Origin,
}

impl Port {
    fn deliver(&self, target: &TargetOrigin, data: serde_json::Value) {
        if !target.allows(self.sender_origin.as_ref(), Some(&self.parent_origin)) {
            tracing::debug!(?target, "postMessage target origin does not match parent, dropped");
            return;
        }

        let message = PostedMessage {
            run_id: self.run_id,
            origin: self.sender_origin.clone(),
            data,
        };
        if self.events.send(FrameEvent::Message(message)).is_err() {
            tracing::debug!(run_id = self.run_id, "parent stopped listening, message dropped");
        }
    }
}

thread_local! {
    static PORT: RefCell<Option<Port>> = const { RefCell::new(None) };
}

/// Clears the thread's port when the document is torn down.
struct PortGuard;

impl PortGuard {
    fn open(port: Port) -> Self {
        PORT.with(|slot| *slot.borrow_mut() = Some(port));
        PortGuard
    }
}

impl Drop for PortGuard {
    fn drop(&mut self) {
        PORT.with(|slot| *slot.borrow_mut() = None);
    }
}

fn frame_main(
    config: FrameConfig,
    mut commands: mpsc::UnboundedReceiver<FrameCommand>,
    events: mpsc::UnboundedSender<FrameEvent>,
    state: Arc<Mutex<FrameState>>,
) {
    sink::set_default_sink(Rc::new(DevToolsSink::new("frame")));

    while let Some(command) = commands.blocking_recv() {
        match command {
            FrameCommand::Load { run_id, document } => {
                let scripts_run = load_document(&config, run_id, &document, &events);

                {
                    let mut state = state.lock();
                    state.documents_loaded += 1;
                    state.last_run_id = Some(run_id);
                }

                if events.send(FrameEvent::Loaded { run_id, scripts_run }).is_err() {
                    tracing::debug!(frame = %config.name, "event channel closed, stopping frame");
                    break;
                }
            }
            FrameCommand::Shutdown => break,
        }
    }

    tracing::debug!(frame = %config.name, "frame thread exiting");
}

/// Build a fresh document and run its scripts. Returns how many ran.
fn load_document(
    config: &FrameConfig,
    run_id: u64,
    document: &FrameDocument,
    events: &mpsc::UnboundedSender<FrameEvent>,
) -> usize {
    if !config.sandbox.allows_scripts() {
        tracing::warn!(
            target: "devtools",
            context = "frame",
            "Blocked script execution in '{}' because the document's frame is sandboxed and the 'allow-scripts' permission is not set.",
            SRCDOC_URL
        );
        return 0;
    }

    let mut engine = match JsEngine::new() {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(frame = %config.name, error = %e, "could not create frame document");
            return 0;
        }
    };

    if let Err(e) = register_parent(engine.context_mut()) {
        let failure = engine.describe(&e);
        tracing::error!(frame = %config.name, error = %failure.message, "could not expose parent window");
        return 0;
    }

    let _port = PortGuard::open(Port {
        run_id,
        events: events.clone(),
        sender_origin: config.document_origin(),
        parent_origin: config.parent_origin.clone(),
    });

    let mut scripts_run = 0;
    for script in document.scripts() {
        if let Err(e) = engine.evaluate(script) {
            report_uncaught(&mut engine, &e);
        }
        engine.run_pending_jobs();
        scripts_run += 1;
    }

    tracing::trace!(frame = %config.name, run_id, scripts_run, "document loaded");
    scripts_run
}

/// Dispatch an uncaught error to `window.onerror`, falling back to the
/// developer tools when no handler claims it.
///
/// Runtime errors carry no position, so they are reported at the start of
/// the script.
fn report_uncaught(engine: &mut JsEngine, error: &JsError) {
    let failure = engine.describe(error);

    let handled = match engine.get_global("onerror") {
        Ok(handler) if handler.is_callable() => {
            let args = [
                JsValue::from(JsString::from(failure.message.as_str())),
                JsValue::from(JsString::from(SRCDOC_URL)),
                JsValue::from(failure.line.unwrap_or(1) as i32),
                JsValue::from(failure.column.unwrap_or(1) as i32),
                failure.value.clone(),
            ];
            match engine.call_function("onerror", &args) {
                Ok(result) => result.to_boolean(),
                Err(e) => {
                    tracing::error!(target: "devtools", context = "frame", "Uncaught error in onerror handler: {}", e);
                    false
                }
            }
        }
        _ => false,
    };

    if !handled {
        tracing::error!(target: "devtools", context = "frame", "Uncaught {}", failure.message);
    }
}

/// Expose `parent` (and `top`) with a `postMessage` method.
fn register_parent(context: &mut Context) -> JsResult<()> {
    let parent = ObjectInitializer::new(context)
        .function(
            NativeFunction::from_fn_ptr(parent_post_message),
            js_string!("postMessage"),
            2,
        )
        .build();

    context.register_global_property(js_string!("parent"), parent.clone(), Attribute::all())?;
    context.register_global_property(js_string!("top"), parent, Attribute::all())
}

/// parent.postMessage(message, targetOrigin)
fn parent_post_message(_: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let target = args
        .get_or_undefined(1)
        .to_string(context)?
        .to_std_string_escaped();
    let target = TargetOrigin::parse(&target)
        .map_err(|e| JsNativeError::syntax().with_message(e.to_string()))?;

    let data = clone_message(args.get_or_undefined(0), context)?;

    PORT.with(|port| match port.borrow().as_ref() {
        Some(port) => port.deliver(&target, data),
        None => tracing::debug!("postMessage called outside of a loaded document"),
    });

    Ok(JsValue::undefined())
}

/// Structured clone of a message payload.
fn clone_message(value: &JsValue, context: &mut Context) -> JsResult<serde_json::Value> {
    let Some(text) = console::json_stringify(value, context)? else {
        return Ok(serde_json::Value::Null);
    };

    serde_json::from_str(&text).map_err(|e| {
        JsNativeError::typ()
            .with_message(format!("DataCloneError: {}", e))
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(sandbox: &str) -> (FrameHost, mpsc::UnboundedReceiver<FrameEvent>) {
        let origin = Origin::parse("http://localhost:3000").unwrap();
        FrameHost::spawn(FrameConfig::new("test", Sandbox::parse(sandbox), origin)).unwrap()
    }

    async fn collect(events: &mut mpsc::UnboundedReceiver<FrameEvent>) -> (Vec<PostedMessage>, usize) {
        let mut messages = Vec::new();
        while let Some(event) = events.recv().await {
            match event {
                FrameEvent::Message(message) => messages.push(message),
                FrameEvent::Loaded { scripts_run, .. } => return (messages, scripts_run),
            }
        }
        panic!("frame closed before the document loaded");
    }

    #[tokio::test]
    async fn test_post_message_reaches_parent() {
        let (host, mut events) = frame("allow-scripts allow-same-origin");
        let doc = FrameDocument::new().with_script("parent.postMessage({ type: 'ping', n: 1 }, '*');");
        host.load(7, doc).unwrap();

        let (messages, scripts_run) = collect(&mut events).await;
        assert_eq!(scripts_run, 1);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].run_id, 7);
        assert_eq!(messages[0].data, serde_json::json!({ "type": "ping", "n": 1 }));
        assert_eq!(messages[0].origin, Origin::parse("http://localhost:3000"));
        assert_eq!(host.documents_loaded(), 1);
        assert_eq!(host.last_run_id(), Some(7));
    }

    #[tokio::test]
    async fn test_each_load_gets_fresh_globals() {
        let (host, mut events) = frame("allow-scripts allow-same-origin");
        host.load(1, FrameDocument::new().with_script("var leftover = 1;")).unwrap();
        collect(&mut events).await;

        host.load(2, FrameDocument::new().with_script("parent.postMessage(typeof leftover, '*');"))
            .unwrap();
        let (messages, _) = collect(&mut events).await;
        assert_eq!(messages[0].data, serde_json::json!("undefined"));
    }

    #[tokio::test]
    async fn test_syntax_error_goes_to_onerror() {
        let (host, mut events) = frame("allow-scripts allow-same-origin");
        let doc = FrameDocument::new()
            .with_script(
                "window.onerror = function (msg, src, line) { parent.postMessage({ src: src, line: line }, '*'); return true; };",
            )
            .with_script("var ok = 1;\nvar broken = ;");
        host.load(1, doc).unwrap();

        let (messages, scripts_run) = collect(&mut events).await;
        assert_eq!(scripts_run, 2);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data["src"], serde_json::json!(SRCDOC_URL));
        assert_eq!(messages[0].data["line"], serde_json::json!(2));
    }

    #[tokio::test]
    async fn test_runtime_error_reported_at_script_start() {
        let (host, mut events) = frame("allow-scripts allow-same-origin");
        let doc = FrameDocument::new()
            .with_script(
                "window.onerror = function (msg, src, line, col) { parent.postMessage({ line: line, col: col }, '*'); return true; };",
            )
            .with_script("var ok = 1;\nthrow 'late';");
        host.load(1, doc).unwrap();

        let (messages, _) = collect(&mut events).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].data, serde_json::json!({ "line": 1, "col": 1 }));
    }

    #[test]
    fn test_drop_does_not_wait_for_busy_document() {
        let (host, mut events) = frame("allow-scripts allow-same-origin");
        let doc = FrameDocument::new()
            .with_script("parent.postMessage('started', '*');")
            .with_script("while (true) {}");
        host.load(1, doc).unwrap();

        // Wait until the frame is inside the endless script.
        assert!(matches!(events.blocking_recv(), Some(FrameEvent::Message(_))));

        let started = std::time::Instant::now();
        drop(host);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_scripts_blocked_without_allow_scripts() {
        let (host, mut events) = frame("allow-same-origin");
        host.load(1, FrameDocument::new().with_script("parent.postMessage('hi', '*');"))
            .unwrap();

        let (messages, scripts_run) = collect(&mut events).await;
        assert!(messages.is_empty());
        assert_eq!(scripts_run, 0);
    }

    #[tokio::test]
    async fn test_target_origin_filtering() {
        let (host, mut events) = frame("allow-scripts");
        let doc = FrameDocument::new().with_script(
            "parent.postMessage('exact', 'http://localhost:3000');\n\
             parent.postMessage('elsewhere', 'https://example.com');\n\
             parent.postMessage('same', '/');\n\
             parent.postMessage('any', '*');",
        );
        host.load(1, doc).unwrap();

        let (messages, _) = collect(&mut events).await;
        let delivered: Vec<_> = messages.iter().map(|m| m.data.clone()).collect();
        // Opaque sender: '/' never matches.
        assert_eq!(delivered, vec![serde_json::json!("exact"), serde_json::json!("any")]);
        assert!(messages.iter().all(|m| m.origin.is_none()));
    }

    #[tokio::test]
    async fn test_invalid_target_origin_throws_in_frame() {
        let (host, mut events) = frame("allow-scripts allow-same-origin");
        let doc = FrameDocument::new().with_script(
            "try { parent.postMessage('x', 'nonsense'); } catch (e) { parent.postMessage(e.name, '*'); }",
        );
        host.load(1, doc).unwrap();

        let (messages, _) = collect(&mut events).await;
        assert_eq!(messages[0].data, serde_json::json!("SyntaxError"));
    }

    #[test]
    fn test_load_after_frame_stopped_is_unavailable() {
        let (host, events) = frame("allow-scripts");
        drop(events);
        host.load(1, FrameDocument::new()).unwrap();

        // Sending Loaded fails once the receiver is gone, which stops the thread.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while host.is_alive() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(matches!(host.load(2, FrameDocument::new()), Err(FrameError::Unavailable(_))));
    }
}
