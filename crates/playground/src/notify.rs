//! User-visible notifications.
//!
//! The toast surface itself lives outside the playground; the session only
//! hands it three-field payloads through a [`Notifier`].

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Notification severity color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationColor {
    Blue,
    Green,
    Red,
    Yellow,
    Gray,
}

impl fmt::Display for NotificationColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NotificationColor::Blue => "blue",
            NotificationColor::Green => "green",
            NotificationColor::Red => "red",
            NotificationColor::Yellow => "yellow",
            NotificationColor::Gray => "gray",
        };
        f.write_str(name)
    }
}

/// A transient notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub color: NotificationColor,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>, color: NotificationColor) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            color,
        }
    }

    pub fn console_cleared() -> Self {
        Self::new("Console Cleared", "Output has been cleared", NotificationColor::Blue)
    }

    pub fn code_reset() -> Self {
        Self::new(
            "Code Reset",
            "Editor has been reset to default code",
            NotificationColor::Blue,
        )
    }

    pub fn execution_failed(error: &impl fmt::Display) -> Self {
        Self::new("Execution Failed", error.to_string(), NotificationColor::Red)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Receiver of notifications (the toast component).
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        match notification.color {
            NotificationColor::Red => tracing::error!(title = %notification.title, "{}", notification.message),
            NotificationColor::Yellow => tracing::warn!(title = %notification.title, "{}", notification.message),
            _ => tracing::info!(title = %notification.title, "{}", notification.message),
        }
    }
}

/// Keeps every notification in memory. Clones share the same list.
#[derive(Clone, Debug, Default)]
pub struct MemoryNotifier {
    received: Rc<RefCell<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far.
    pub fn received(&self) -> Vec<Notification> {
        self.received.borrow().clone()
    }

    /// Remove and return the notifications received so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.borrow_mut())
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: &Notification) {
        self.received.borrow_mut().push(notification.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_notifier_shares_between_clones() {
        let notifier = MemoryNotifier::new();
        let handle = notifier.clone();

        notifier.notify(&Notification::console_cleared());
        assert_eq!(handle.received(), vec![Notification::console_cleared()]);

        assert_eq!(handle.drain().len(), 1);
        assert!(notifier.received().is_empty());
    }

    #[test]
    fn test_execution_failed_is_red() {
        let n = Notification::execution_failed(&"frame gone");
        assert_eq!(n.title, "Execution Failed");
        assert_eq!(n.message, "frame gone");
        assert_eq!(n.color, NotificationColor::Red);
        assert_eq!(n.color.to_string(), "red");
    }
}
