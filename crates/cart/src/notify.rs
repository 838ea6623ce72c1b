//! Fire-and-forget delivery of cart notices.
//!
//! Notifiers must never block the cart operation that raised the notice.

use tokio::sync::mpsc;

use crate::error::Notice;

/// Receives notices about failed cart operations.
pub trait Notifier: Send + Sync {
    /// Deliver a notice. Must return promptly.
    fn notify(&self, notice: Notice);
}

/// Logs notices through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        let error = notice.error();
        tracing::warn!(
            product_id = %error.product_id(),
            error = %error,
            "{}",
            notice.message()
        );
    }
}

/// Forwards notices into an unbounded channel.
///
/// A UI drains the receiver to show toasts; tests drain it to assert on the
/// error kind. Notices sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver its notices arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(mpsc::error::SendError(notice)) = self.sender.send(notice) {
            tracing::debug!(message = notice.message(), "Notice receiver dropped");
        }
    }
}
