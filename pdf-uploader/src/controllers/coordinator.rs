use std::sync::Arc;
use tokio::sync::watch;

/// Owns the reload signal between the upload and listing controllers.
///
/// The signal is a generation counter on a watch channel: the upload side
/// bumps it, the listing side refetches on every change. The counter value
/// itself carries no meaning.
pub struct PageCoordinator {
    sender: Arc<watch::Sender<u64>>,
}

impl PageCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(0);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn trigger(&self) -> ReloadTrigger {
        ReloadTrigger(self.sender.clone())
    }

    pub fn listener(&self) -> ReloadListener {
        ReloadListener(self.sender.subscribe())
    }
}

impl Default for PageCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fires the reload edge.
#[derive(Clone)]
pub struct ReloadTrigger(Arc<watch::Sender<u64>>);

impl ReloadTrigger {
    pub fn fire(&self) {
        self.0.send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

/// Observes reload edges.
pub struct ReloadListener(watch::Receiver<u64>);

impl ReloadListener {
    /// Wait for the next edge. Edges fired while nobody was waiting collapse
    /// into one. Returns `false` once every trigger is gone.
    pub async fn next_edge(&mut self) -> bool {
        self.0.changed().await.is_ok()
    }

    /// Whether an edge is pending, without consuming it.
    fn has_pending_edge(&self) -> bool {
        self.0.has_changed().unwrap_or(false)
    }

    /// Consume a pending edge, if any, without waiting.
    pub fn take_pending_edge(&mut self) -> bool {
        let pending = self.has_pending_edge();
        if pending {
            self.0.borrow_and_update();
        }
        pending
    }

    /// Number of times the signal has fired.
    pub fn generation(&self) -> u64 {
        *self.0.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_sees_each_fire_as_an_edge() {
        let coordinator = PageCoordinator::new();
        let trigger = coordinator.trigger();
        let mut listener = coordinator.listener();

        assert!(!listener.has_pending_edge());
        trigger.fire();
        assert!(listener.has_pending_edge());
        assert!(listener.next_edge().await);
        assert!(!listener.has_pending_edge());
        assert_eq!(listener.generation(), 1);
    }

    #[tokio::test]
    async fn burst_of_fires_collapses_into_one_edge() {
        let coordinator = PageCoordinator::new();
        let trigger = coordinator.trigger();
        let mut listener = coordinator.listener();

        trigger.fire();
        trigger.fire();
        trigger.fire();

        assert!(listener.next_edge().await);
        assert!(!listener.has_pending_edge());
        assert_eq!(listener.generation(), 3);
    }

    #[tokio::test]
    async fn take_pending_edge_consumes_without_waiting() {
        let coordinator = PageCoordinator::new();
        let trigger = coordinator.trigger();
        let mut listener = coordinator.listener();

        assert!(!listener.take_pending_edge());
        trigger.fire();
        trigger.fire();
        assert!(listener.take_pending_edge());
        assert!(!listener.take_pending_edge());
    }

    #[tokio::test]
    async fn listener_stops_when_coordinator_and_triggers_are_gone() {
        let coordinator = PageCoordinator::new();
        let mut listener = coordinator.listener();
        drop(coordinator);

        assert!(!listener.next_edge().await);
    }
}
