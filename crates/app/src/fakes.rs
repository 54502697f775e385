//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use shems_domain::appliance::{ApplianceConfig, Condition};
use shems_domain::error::{ConflictError, NotFoundError, ShemsError};
use shems_domain::home::Home;
use shems_domain::id::{ApplianceId, HomeId};
use shems_domain::observation::Observation;
use shems_domain::time::now;
use shems_domain::transition::TransitionEvent;

use crate::ports::{
    ApplianceRepository, ApplianceStore, ConditionChange, HomeRepository, Notifier,
    ObservationRepository,
};

pub(crate) fn home(id: u32) -> Home {
    Home::builder()
        .id(HomeId::new(id).unwrap())
        .name(format!("Home {id}"))
        .notify_address(format!("owner{id}@example.com"))
        .build()
        .unwrap()
}

pub(crate) fn appliance(home_id: u32, class: u16, condition: Condition) -> ApplianceConfig {
    ApplianceConfig::builder()
        .home_id(HomeId::new(home_id).unwrap())
        .appliance_id(ApplianceId::new(class).unwrap())
        .name(format!("Appliance {class}"))
        .condition(condition)
        .thresholds(15.0, -15.0)
        .build()
        .unwrap()
}

pub(crate) fn sample_event() -> TransitionEvent {
    TransitionEvent::new(&appliance(1, 1, Condition::Off), Condition::On, now())
}

#[derive(Default)]
struct State {
    homes: BTreeMap<HomeId, Home>,
    appliances: BTreeMap<(HomeId, ApplianceId), ApplianceConfig>,
    observations: Vec<Observation>,
}

/// Store keeping everything in maps, with knobs to inject failures and latency.
#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
    failing: Mutex<HashSet<(HomeId, ApplianceId)>>,
    list_delay: Mutex<Option<Duration>>,
    read_delay: Mutex<Option<Duration>>,
    condition_write_delay: Mutex<Option<Duration>>,
    list_entries: Mutex<Vec<Instant>>,
    append_exits: Mutex<Vec<Instant>>,
}

impl InMemoryStore {
    pub(crate) fn with(homes: &[Home], appliances: &[ApplianceConfig]) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for home in homes {
                state.homes.insert(home.id, home.clone());
            }
            for config in appliances {
                state
                    .appliances
                    .insert((config.home_id, config.appliance_id), config.clone());
            }
        }
        store
    }

    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub(crate) fn fail_appliance(&self, home_id: u32, class: u16) {
        self.failing.lock().unwrap().insert((
            HomeId::new(home_id).unwrap(),
            ApplianceId::new(class).unwrap(),
        ));
    }

    pub(crate) fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    /// Delay every `last_observation` call.
    pub(crate) fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    /// Delay every tick condition write; the write lands once the delay elapsed.
    pub(crate) fn set_condition_write_delay(&self, delay: Duration) {
        *self.condition_write_delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn push_observation(&self, observation: Observation) {
        self.state.lock().unwrap().observations.push(observation);
    }

    pub(crate) fn observation_count(&self) -> usize {
        self.state.lock().unwrap().observations.len()
    }

    pub(crate) fn observations_of(&self, home_id: u32, class: u16) -> Vec<Observation> {
        let key = (HomeId::new(home_id).unwrap(), ApplianceId::new(class).unwrap());
        self.state
            .lock()
            .unwrap()
            .observations
            .iter()
            .filter(|obs| (obs.home_id, obs.appliance_id) == key)
            .cloned()
            .collect()
    }

    pub(crate) fn condition_of(&self, home_id: u32, class: u16) -> Condition {
        let key = (HomeId::new(home_id).unwrap(), ApplianceId::new(class).unwrap());
        self.state.lock().unwrap().appliances[&key].condition
    }

    /// `(start of list, end of last append)` pairs, one per tick.
    pub(crate) fn tick_windows(&self) -> Vec<(Instant, Instant)> {
        let entries = self.list_entries.lock().unwrap().clone();
        let exits = self.append_exits.lock().unwrap().clone();
        entries.into_iter().zip(exits).collect()
    }

    fn check_available(&self) -> Result<(), ShemsError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ShemsError::StoreUnavailable("connection refused".into()));
        }
        Ok(())
    }

    fn check_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<(), ShemsError> {
        self.check_available()?;
        if self.failing.lock().unwrap().contains(&(home_id, appliance_id)) {
            return Err(ShemsError::Storage("disk I/O error".into()));
        }
        Ok(())
    }

    fn latest_observation(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> Result<Option<Observation>, ShemsError> {
        self.check_appliance(home_id, appliance_id)?;
        let last = self
            .state
            .lock()
            .unwrap()
            .observations
            .iter()
            .rev()
            .find(|obs| obs.home_id == home_id && obs.appliance_id == appliance_id)
            .cloned();
        Ok(last)
    }

    fn swap_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        change: ConditionChange,
    ) -> Result<(), ShemsError> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();
        match state.appliances.get_mut(&(home_id, appliance_id)) {
            Some(config) if config.condition == change.from => {
                config.condition = change.to;
                Ok(())
            }
            _ => Err(ConflictError {
                entity: "Appliance",
                id: format!("{home_id}/{appliance_id}"),
            }
            .into()),
        }
    }

    fn modify_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        change: impl FnOnce(&mut ApplianceConfig),
    ) -> Result<ApplianceConfig, ShemsError> {
        let mut state = self.state.lock().unwrap();
        let config = state
            .appliances
            .get_mut(&(home_id, appliance_id))
            .ok_or_else(|| NotFoundError {
                entity: "Appliance",
                id: format!("{home_id}/{appliance_id}"),
            })?;
        change(config);
        Ok(config.clone())
    }
}

impl ApplianceStore for InMemoryStore {
    async fn list_appliance_configs(&self) -> Result<Vec<ApplianceConfig>, ShemsError> {
        self.list_entries.lock().unwrap().push(Instant::now());
        self.check_available()?;
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let configs = self.state.lock().unwrap().appliances.values().cloned().collect();
        Ok(configs)
    }

    fn last_observation(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<Option<Observation>, ShemsError>> + Send {
        let delay = *self.read_delay.lock().unwrap();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.latest_observation(home_id, appliance_id)
        }
    }

    fn update_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        change: ConditionChange,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        let delay = *self.condition_write_delay.lock().unwrap();
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.swap_condition(home_id, appliance_id, change)
        }
    }

    fn append_observation(
        &self,
        observation: Observation,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        let result = self.check_available().map(|()| {
            self.state.lock().unwrap().observations.push(observation);
            self.append_exits.lock().unwrap().push(Instant::now());
        });
        async { result }
    }

    fn home_notify_address(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Option<String>, ShemsError>> + Send {
        let result = self.check_available().map(|()| {
            self.state
                .lock()
                .unwrap()
                .homes
                .get(&home_id)
                .map(|home| home.notify_address.clone())
        });
        async { result }
    }
}

impl HomeRepository for InMemoryStore {
    fn create_home(&self, home: Home) -> impl Future<Output = Result<Home, ShemsError>> + Send {
        self.state.lock().unwrap().homes.insert(home.id, home.clone());
        async { Ok(home) }
    }

    fn get_home(
        &self,
        id: HomeId,
    ) -> impl Future<Output = Result<Option<Home>, ShemsError>> + Send {
        let result = self.state.lock().unwrap().homes.get(&id).cloned();
        async { Ok(result) }
    }

    fn list_homes(&self) -> impl Future<Output = Result<Vec<Home>, ShemsError>> + Send {
        let result = self.state.lock().unwrap().homes.values().cloned().collect();
        async { Ok(result) }
    }
}

impl ApplianceRepository for InMemoryStore {
    fn create_appliance(
        &self,
        config: ApplianceConfig,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send {
        self.state
            .lock()
            .unwrap()
            .appliances
            .insert((config.home_id, config.appliance_id), config.clone());
        async { Ok(config) }
    }

    fn get_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<Option<ApplianceConfig>, ShemsError>> + Send {
        let result = self
            .state
            .lock()
            .unwrap()
            .appliances
            .get(&(home_id, appliance_id))
            .cloned();
        async { Ok(result) }
    }

    fn find_by_home(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<Vec<ApplianceConfig>, ShemsError>> + Send {
        let result = self
            .state
            .lock()
            .unwrap()
            .appliances
            .values()
            .filter(|config| config.home_id == home_id)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update_thresholds(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        start_value: f64,
        stop_value: f64,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send {
        let result = self.modify_appliance(home_id, appliance_id, |config| {
            config.start_value = start_value;
            config.stop_value = stop_value;
        });
        async { result }
    }

    fn override_condition(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        condition: Condition,
    ) -> impl Future<Output = Result<ApplianceConfig, ShemsError>> + Send {
        let result = self.modify_appliance(home_id, appliance_id, |config| {
            config.condition = condition;
        });
        async { result }
    }

    fn delete_appliance(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.appliances.remove(&(home_id, appliance_id));
        state
            .observations
            .retain(|obs| (obs.home_id, obs.appliance_id) != (home_id, appliance_id));
        async { Ok(()) }
    }
}

impl ObservationRepository for InMemoryStore {
    fn recent_observations(
        &self,
        home_id: HomeId,
        appliance_id: ApplianceId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Observation>, ShemsError>> + Send {
        let result = self
            .state
            .lock()
            .unwrap()
            .observations
            .iter()
            .rev()
            .filter(|obs| obs.home_id == home_id && obs.appliance_id == appliance_id)
            .take(limit)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn home_energy_total(
        &self,
        home_id: HomeId,
    ) -> impl Future<Output = Result<f64, ShemsError>> + Send {
        let total = self
            .state
            .lock()
            .unwrap()
            .observations
            .iter()
            .filter(|obs| obs.home_id == home_id)
            .map(|obs| obs.energy_consumed)
            .sum();
        async move { Ok(total) }
    }
}

/// Notifier remembering every event it was handed.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    events: Mutex<Vec<TransitionEvent>>,
}

impl RecordingNotifier {
    pub(crate) fn events(&self) -> Vec<TransitionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}

/// Notifier that rejects every event.
pub(crate) struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn notify(
        &self,
        _event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        async { Err(ShemsError::Notify("mail server refused the message".into())) }
    }
}

/// Notifier that never completes.
pub(crate) struct StuckNotifier;

impl Notifier for StuckNotifier {
    fn notify(
        &self,
        _event: TransitionEvent,
    ) -> impl Future<Output = Result<(), ShemsError>> + Send {
        std::future::pending()
    }
}
