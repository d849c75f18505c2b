//! Common types shared across the playground crates.

pub mod error;

pub use error::{PlaygroundError, PlaygroundResult};
