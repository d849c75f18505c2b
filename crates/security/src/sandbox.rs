//! Iframe sandboxing implementation.

use std::fmt;

/// Sandbox attribute the playground frame is created with.
pub const PLAYGROUND_SANDBOX: &str = "allow-scripts allow-same-origin";

/// Sandbox for iframe and document restrictions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sandbox {
    /// Active sandbox flags. A set flag means the capability is blocked.
    flags: SandboxFlags,
}

impl Sandbox {
    /// Create a new sandbox with all restrictions enabled.
    pub fn new() -> Self {
        Self {
            flags: SandboxFlags::all(),
        }
    }

    /// Parse sandbox attribute value.
    pub fn parse(attribute: &str) -> Self {
        let mut sandbox = Self::new();

        for token in attribute.split_whitespace() {
            if let Some(flag) = SandboxFlags::from_token(token) {
                sandbox.flags.remove(flag);
            }
            // Unknown tokens are ignored
        }

        sandbox
    }

    /// Sandbox used for the playground's nested frame.
    pub fn playground() -> Self {
        Self::parse(PLAYGROUND_SANDBOX)
    }

    /// Check if forms are allowed.
    pub fn allows_forms(&self) -> bool {
        !self.flags.contains(SandboxFlags::FORMS)
    }

    /// Check if modals (alert, confirm, prompt) are allowed.
    pub fn allows_modals(&self) -> bool {
        !self.flags.contains(SandboxFlags::MODALS)
    }

    /// Check if popups are allowed.
    pub fn allows_popups(&self) -> bool {
        !self.flags.contains(SandboxFlags::POPUPS)
    }

    /// Check if same-origin is preserved.
    pub fn allows_same_origin(&self) -> bool {
        !self.flags.contains(SandboxFlags::SAME_ORIGIN)
    }

    /// Check if scripts are allowed.
    pub fn allows_scripts(&self) -> bool {
        !self.flags.contains(SandboxFlags::SCRIPTS)
    }

    /// Check if top-level navigation is allowed.
    pub fn allows_top_navigation(&self) -> bool {
        !self.flags.contains(SandboxFlags::TOP_NAVIGATION)
    }

    /// Get the sandbox flags.
    pub fn flags(&self) -> SandboxFlags {
        self.flags
    }

    /// Check if sandboxed.
    pub fn is_sandboxed(&self) -> bool {
        !self.flags.is_empty()
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self {
            flags: SandboxFlags::empty(),
        }
    }
}

impl fmt::Display for Sandbox {
    /// Render the sandbox back into attribute form (the allowed tokens).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = SandboxFlags::TOKENS
            .iter()
            .filter(|(_, flag)| !self.flags.contains(*flag))
            .map(|(token, _)| *token)
            .collect();
        write!(f, "{}", tokens.join(" "))
    }
}

bitflags::bitflags! {
    /// Sandbox flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SandboxFlags: u32 {
        /// Block form submissions.
        const FORMS = 1 << 0;
        /// Block modals (alert, confirm, prompt).
        const MODALS = 1 << 1;
        /// Block popups.
        const POPUPS = 1 << 2;
        /// Treat as unique origin.
        const SAME_ORIGIN = 1 << 3;
        /// Block scripts.
        const SCRIPTS = 1 << 4;
        /// Block top-level navigation.
        const TOP_NAVIGATION = 1 << 5;
        /// Block downloads.
        const DOWNLOADS = 1 << 6;
    }
}

impl SandboxFlags {
    const TOKENS: [(&'static str, SandboxFlags); 7] = [
        ("allow-forms", SandboxFlags::FORMS),
        ("allow-modals", SandboxFlags::MODALS),
        ("allow-popups", SandboxFlags::POPUPS),
        ("allow-same-origin", SandboxFlags::SAME_ORIGIN),
        ("allow-scripts", SandboxFlags::SCRIPTS),
        ("allow-top-navigation", SandboxFlags::TOP_NAVIGATION),
        ("allow-downloads", SandboxFlags::DOWNLOADS),
    ];

    fn from_token(token: &str) -> Option<Self> {
        Self::TOKENS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, flag)| *flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandbox_parse_empty() {
        let sandbox = Sandbox::parse("");
        assert!(sandbox.is_sandboxed());
        assert!(!sandbox.allows_scripts());
        assert!(!sandbox.allows_same_origin());
        assert!(!sandbox.allows_forms());
    }

    #[test]
    fn test_sandbox_parse_allow_scripts() {
        let sandbox = Sandbox::parse("allow-scripts");
        assert!(sandbox.is_sandboxed());
        assert!(sandbox.allows_scripts());
        assert!(!sandbox.allows_same_origin());
    }

    #[test]
    fn test_playground_sandbox_is_narrow() {
        let sandbox = Sandbox::playground();
        assert!(sandbox.allows_scripts());
        assert!(sandbox.allows_same_origin());
        assert!(!sandbox.allows_popups());
        assert!(!sandbox.allows_top_navigation());
        assert!(!sandbox.allows_modals());
    }

    #[test]
    fn test_sandbox_attribute_round_trip() {
        let sandbox = Sandbox::parse("allow-same-origin bogus allow-scripts");
        assert_eq!(sandbox.to_string(), "allow-same-origin allow-scripts");
        assert_eq!(Sandbox::new().to_string(), "");
    }
}
