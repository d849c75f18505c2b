//! Playground configuration.

use common::{PlaygroundError, PlaygroundResult};
use playground_security::{Origin, Sandbox, PLAYGROUND_SANDBOX};

/// Source text the editor starts with and returns to on reset.
pub const DEFAULT_SOURCE: &str = "\nconsole.log(\"Hello, World!\");\n";

/// Origin the hosting page is served from.
pub const DEFAULT_HOST_ORIGIN: &str = "http://localhost:3000";

/// How user code is executed and its console output captured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CaptureMode {
    /// Evaluate in the host page with the console intercepted for the run.
    #[default]
    Direct,
    /// Evaluate inside a sandboxed nested frame that posts its console output.
    Isolated,
}

/// Playground configuration.
#[derive(Clone, Debug)]
pub struct PlaygroundConfig {
    /// Capture strategy used by Run.
    pub mode: CaptureMode,
    /// Sandbox attribute of the nested frame.
    pub sandbox: String,
    /// Origin of the hosting page.
    pub host_origin: String,
    /// Name of the nested frame.
    pub frame_name: String,
    /// Source restored by Reset.
    pub default_source: String,
    /// Whether clear/reset/failure notifications are emitted.
    pub notifications: bool,
}

impl PlaygroundConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration for iframe-isolated execution.
    pub fn isolated() -> Self {
        Self {
            mode: CaptureMode::Isolated,
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: CaptureMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_sandbox(mut self, sandbox: &str) -> Self {
        self.sandbox = sandbox.to_string();
        self
    }

    pub fn with_host_origin(mut self, origin: &str) -> Self {
        self.host_origin = origin.to_string();
        self
    }

    pub fn with_default_source(mut self, source: &str) -> Self {
        self.default_source = source.to_string();
        self
    }

    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notifications = enabled;
        self
    }

    /// Parsed sandbox flags.
    pub fn frame_sandbox(&self) -> Sandbox {
        Sandbox::parse(&self.sandbox)
    }

    /// Parsed host origin.
    pub fn parent_origin(&self) -> PlaygroundResult<Origin> {
        Origin::parse(&self.host_origin).ok_or_else(|| PlaygroundError::origin(self.host_origin.clone()))
    }
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            mode: CaptureMode::Direct,
            sandbox: PLAYGROUND_SANDBOX.to_string(),
            host_origin: DEFAULT_HOST_ORIGIN.to_string(),
            frame_name: "playground".to_string(),
            default_source: DEFAULT_SOURCE.to_string(),
            notifications: true,
        }
    }
}
