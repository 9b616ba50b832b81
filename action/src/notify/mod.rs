//! Chat notification module

pub mod dingtalk;
pub mod messages;

/// Fire-and-forget sink for terminal notifications
///
/// Implementations must not block the caller on delivery.
pub trait Notifier: Send + Sync {
    fn notify(&self, content: String);

    /// Whether notifications go anywhere at all
    fn is_enabled(&self) -> bool {
        true
    }
}
