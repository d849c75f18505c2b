//! JavaScript engine integration using Boa.
//!
//! This crate provides JavaScript execution for the playground: the engine
//! wrapper, a console whose output goes to a swappable sink, and nested
//! frames that run documents on their own thread.

pub mod console;
pub mod engine;
pub mod frame;
pub mod sink;

pub use console::LogLevel;
pub use engine::{JsEngine, JsEngineError, ScriptFailure};
pub use frame::{FrameConfig, FrameDocument, FrameError, FrameEvent, FrameHost, PostedMessage};
pub use sink::{install_sink, OutputSink, SinkGuard};
