mod dispatcher;
mod error;
mod message;
mod target;
#[cfg(test)]
pub mod testing;

pub use dispatcher::{ChannelNotifier, Dispatcher};
pub use error::NotifyError;
pub use message::Notification;

/// Sink for triggered alerts. `notify` must not block on delivery.
pub trait Notifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}
