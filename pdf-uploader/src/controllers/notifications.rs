use crate::models::Notification;
use tokio::sync::mpsc;

/// Sending half handed to the controllers.
#[derive(Clone)]
pub struct Notifier(mpsc::UnboundedSender<Notification>);

impl Notifier {
    pub fn push(&self, notification: Notification) {
        if self.0.send(notification).is_err() {
            tracing::debug!("Notification dropped, page already closed");
        }
    }
}

/// Receiving half owned by the page; drained on every render.
pub struct NotificationInbox(mpsc::UnboundedReceiver<Notification>);

impl NotificationInbox {
    /// Everything queued since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut drained = Vec::new();
        while let Ok(notification) = self.0.try_recv() {
            drained.push(notification);
        }
        drained
    }
}

pub fn notification_channel() -> (Notifier, NotificationInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier(tx), NotificationInbox(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_in_order_and_empties_queue() {
        let (notifier, mut inbox) = notification_channel();
        notifier.push(Notification::success("first"));
        notifier.push(Notification::error("second"));

        let drained = inbox.drain();
        assert_eq!(
            drained,
            vec![Notification::success("first"), Notification::error("second")]
        );
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn push_after_inbox_dropped_is_harmless() {
        let (notifier, inbox) = notification_channel();
        drop(inbox);
        notifier.push(Notification::success("nobody listening"));
    }
}
