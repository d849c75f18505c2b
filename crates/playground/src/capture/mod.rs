//! Console capture strategies.
//!
//! - [`direct`]: evaluate in the host page with the console intercepted.
//! - [`isolated`]: evaluate in a sandboxed nested frame that posts its
//!   console output back to the host.

pub mod direct;
pub mod isolated;

pub use isolated::{IsolatedCapture, MessageListener};
