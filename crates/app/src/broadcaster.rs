//! In-process transition broadcaster backed by a tokio broadcast channel.

use std::future::Future;

use tokio::sync::broadcast;

use shems_domain::error::ShemsError;
use shems_domain::transition::TransitionEvent;

use crate::ports::Notifier;

/// Fans [`TransitionEvent`]s out to in-process subscribers (live streams).
///
/// Delivery succeeds even when there are no active subscribers
/// (the event is simply dropped). Clones share the same channel.
#[derive(Clone)]
pub struct TransitionBroadcaster {
    sender: broadcast::Sender<TransitionEvent>,
}

impl TransitionBroadcaster {
    /// Create a new broadcaster with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to transitions.
    ///
    /// Returns a receiver that will get all transitions broadcast *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.sender.subscribe()
    }
}

impl Notifier for TransitionBroadcaster {
    fn notify(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        // send only fails without receivers
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}
