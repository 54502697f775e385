//! Notifier port: delivery of appliance condition changes.

use std::future::Future;
use std::sync::Arc;

use shems_domain::error::ShemsError;
use shems_domain::transition::TransitionEvent;

/// Delivers [`TransitionEvent`]s to the owner of the appliance.
///
/// Delivery is best effort: the control loop logs failures and never retries.
pub trait Notifier: Send + Sync {
    /// Deliver one transition.
    fn notify(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send;
}

impl<T: Notifier> Notifier for Arc<T> {
    fn notify(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        (**self).notify(event)
    }
}

/// A missing notifier silently accepts every event.
impl<N: Notifier> Notifier for Option<N> {
    async fn notify(&self, event: TransitionEvent) -> Result<(), ShemsError> {
        match self {
            Some(inner) => inner.notify(event).await,
            None => Ok(()),
        }
    }
}

/// Fan-out to two notifiers. Both are always attempted; the first error wins.
impl<A: Notifier, B: Notifier> Notifier for (A, B) {
    async fn notify(&self, event: TransitionEvent) -> Result<(), ShemsError> {
        let first = self.0.notify(event.clone()).await;
        let second = self.1.notify(event).await;
        first.and(second)
    }
}
