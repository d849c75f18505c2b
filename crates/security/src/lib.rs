//! Playground security features.
//!
//! This crate implements the isolation primitives used by the nested frame:
//! - Iframe sandbox flags
//! - Origins and `postMessage` target origin matching

pub mod origin;
pub mod sandbox;

pub use origin::{serialize_origin, Origin, OriginError, TargetOrigin};
pub use sandbox::{Sandbox, SandboxFlags, PLAYGROUND_SANDBOX};
