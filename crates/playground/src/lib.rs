//! Code playground: run user JavaScript and capture its console output.
//!
//! This crate ties the pieces together:
//! - Log lines and the output buffer
//! - Direct and frame-isolated capture strategies
//! - The editor session with its Run, Clear and Reset actions
//! - Notifications and configuration

pub mod capture;
pub mod config;
pub mod log;
pub mod notify;
pub mod session;

pub use capture::{IsolatedCapture, MessageListener};
pub use config::{CaptureMode, PlaygroundConfig, DEFAULT_SOURCE};
pub use log::{LogBuffer, LogLine};
pub use notify::{MemoryNotifier, Notification, NotificationColor, Notifier, TracingNotifier};
pub use session::Playground;

/// Playground version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
