//! Shared application state for axum handlers.

use std::sync::Arc;

use shems_app::broadcaster::TransitionBroadcaster;
use shems_app::ports::{Notifier, Store};
use shems_app::scheduler::Scheduler;
use shems_app::services::appliance_service::ApplianceService;
use shems_app::services::home_service::HomeService;

/// Application state shared across all axum handlers.
///
/// Generic over the store and the notifier to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<S, N> {
    /// Home registration and lookup.
    pub home_service: Arc<HomeService<S>>,
    /// Appliance management, history and energy totals.
    pub appliance_service: Arc<ApplianceService<S>>,
    /// Scheduler shared with the periodic loop; on-demand ticks go through it.
    pub scheduler: Arc<Scheduler<S, N>>,
    /// Source of the live transition stream.
    pub transitions: TransitionBroadcaster,
}

impl<S, N> Clone for AppState<S, N> {
    fn clone(&self) -> Self {
        Self {
            home_service: Arc::clone(&self.home_service),
            appliance_service: Arc::clone(&self.appliance_service),
            scheduler: Arc::clone(&self.scheduler),
            transitions: self.transitions.clone(),
        }
    }
}

impl<S, N> AppState<S, N>
where
    S: Store + Clone + 'static,
    N: Notifier + 'static,
{
    /// Create a new application state.
    ///
    /// `scheduler` is expected to be the same instance that drives the
    /// periodic loop.
    pub fn new(
        store: S,
        scheduler: Arc<Scheduler<S, N>>,
        transitions: TransitionBroadcaster,
    ) -> Self {
        Self {
            home_service: Arc::new(HomeService::new(store.clone())),
            appliance_service: Arc::new(ApplianceService::new(store)),
            scheduler,
            transitions,
        }
    }
}
