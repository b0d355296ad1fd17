//! Per-persona body coordinator.
//!
//! `BodySystem` owns everything one persona needs to advance its body: the
//! config, the decay engine, the store, and the clock. Each record is updated
//! inside the store's per-key guard, and guards are never nested.

use crate::cycle::CycleState;
use crate::decay::NeedDynamics;
use crate::lifecycle::LifecycleState;
use crate::relief::ReliefAction;
use serde::de::DeserializeOwned;
use soma_core::{
    load_record, store_record, Clock, FinanceState, Loaded, NeedsVector, PersonaRecord,
    RecordKeys, SocialState, SomaConfig, StateStore, StoreError,
};
use std::sync::Arc;

/// What changed during one [`BodySystem::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub aged: bool,
    pub cycle_advanced: bool,
    pub decayed: bool,
    /// Record keys that were missing or broken and got fresh defaults.
    pub initialized: Vec<String>,
    pub needs: NeedsVector,
}

/// A read-only view of every record, with provenance.
#[derive(Debug, Clone)]
pub struct BodySnapshot {
    pub needs: Loaded<PersonaRecord>,
    pub cycle: Option<Loaded<CycleState>>,
    pub lifecycle: Loaded<LifecycleState>,
    pub finance: Option<FinanceState>,
    pub social: Option<SocialState>,
}

/// Result of [`BodySystem::satisfy`].
#[derive(Debug, Clone, PartialEq)]
pub enum Relief {
    Applied {
        action: ReliefAction,
        needs: NeedsVector,
    },
    /// The name is not a relief action, or the action needs a disabled module.
    Unavailable,
}

pub struct BodySystem {
    persona: String,
    keys: RecordKeys,
    config: SomaConfig,
    dynamics: NeedDynamics,
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl BodySystem {
    pub fn new(config: SomaConfig, store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        let persona = config.storage.persona.clone();
        let dynamics = NeedDynamics::new(config.needs.rates.clone(), config.modules);
        Self {
            keys: RecordKeys::for_persona(&persona),
            persona,
            config,
            dynamics,
            store,
            clock,
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn config(&self) -> &SomaConfig {
        &self.config
    }

    pub fn keys(&self) -> &RecordKeys {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // =========================================================================
    // Advancing
    // =========================================================================

    /// Advance lifecycle, cycle and needs to the current instant.
    pub async fn tick(&self) -> Result<TickReport, StoreError> {
        let now = self.clock.now();
        let mut report = TickReport::default();

        let lifecycle = {
            let _guard = self.store.lock(&self.keys.lifecycle).await?;
            let (mut state, fresh) = self
                .load_or_init(&self.keys.lifecycle, || {
                    LifecycleState::create(&self.config.lifecycle, now)
                })
                .await;
            state.normalize();
            report.aged = state.advance(now);
            if fresh {
                report.initialized.push(self.keys.lifecycle.clone());
            }
            if fresh || report.aged {
                store_record(self.store.as_ref(), &self.keys.lifecycle, &state).await?;
            }
            state
        };

        let cycle = if self.config.modules.cycle {
            let _guard = self.store.lock(&self.keys.cycle).await?;
            let (mut state, fresh) = self
                .load_or_init(&self.keys.cycle, || CycleState::fresh(now))
                .await;
            state.normalize();
            report.cycle_advanced = state.advance_day(now);
            if fresh {
                report.initialized.push(self.keys.cycle.clone());
            }
            if fresh || report.cycle_advanced {
                store_record(self.store.as_ref(), &self.keys.cycle, &state).await?;
            }
            Some(state)
        } else {
            None
        };

        {
            let _guard = self.store.lock(&self.keys.needs).await?;
            let (mut record, fresh) = self
                .load_or_init(&self.keys.needs, || PersonaRecord::fresh(now))
                .await;
            record.needs.normalize();
            report.decayed = self
                .dynamics
                .advance(&mut record, now, cycle.as_ref(), Some(&lifecycle));
            if fresh {
                report.initialized.push(self.keys.needs.clone());
            }
            if fresh || report.decayed {
                store_record(self.store.as_ref(), &self.keys.needs, &record).await?;
            }
            report.needs = record.needs;
        }

        tracing::debug!(
            "Tick for '{}': aged={} cycle={} decayed={}",
            self.persona,
            report.aged,
            report.cycle_advanced,
            report.decayed
        );
        Ok(report)
    }

    /// Bring the body up to date, then apply the relief action named `action`.
    pub async fn satisfy(&self, action: &str) -> Result<Relief, StoreError> {
        let Some(relief) = ReliefAction::from_action_name(action) else {
            tracing::debug!("'{}' is not a relief action", action);
            return Ok(Relief::Unavailable);
        };
        self.tick().await?;

        let _guard = self.store.lock(&self.keys.needs).await?;
        let now = self.clock.now();
        let (mut record, _) = self
            .load_or_init(&self.keys.needs, || PersonaRecord::fresh(now))
            .await;
        if !relief.apply(&mut record.needs, &self.config.modules) {
            tracing::info!(
                "Relief '{}' unavailable with current modules",
                relief.prefix()
            );
            return Ok(Relief::Unavailable);
        }
        store_record(self.store.as_ref(), &self.keys.needs, &record).await?;
        tracing::info!("'{}' relieved via {}", self.persona, relief.prefix());
        Ok(Relief::Applied {
            action: relief,
            needs: record.needs,
        })
    }

    // =========================================================================
    // Cycle simulator
    // =========================================================================

    pub async fn simulate_cycle_day(&self, day: u32) -> Result<CycleState, StoreError> {
        self.update_cycle(|cycle| cycle.simulate_day(day)).await
    }

    pub async fn set_simulation_intensity(&self, intensity: f64) -> Result<CycleState, StoreError> {
        self.update_cycle(|cycle| cycle.set_intensity(intensity)).await
    }

    pub async fn stop_cycle_simulation(&self) -> Result<CycleState, StoreError> {
        self.update_cycle(CycleState::stop_simulation).await
    }

    async fn update_cycle<F>(&self, mutate: F) -> Result<CycleState, StoreError>
    where
        F: FnOnce(&mut CycleState),
    {
        if !self.config.modules.cycle {
            tracing::warn!("Cycle module is disabled; simulator changes have no effect on decay");
        }
        let _guard = self.store.lock(&self.keys.cycle).await?;
        let now = self.clock.now();
        let (mut state, _) = self
            .load_or_init(&self.keys.cycle, || CycleState::fresh(now))
            .await;
        state.normalize();
        mutate(&mut state);
        store_record(self.store.as_ref(), &self.keys.cycle, &state).await?;
        Ok(state)
    }

    // =========================================================================
    // Reading
    // =========================================================================

    /// Read every record without advancing or writing anything.
    pub async fn snapshot(&self) -> BodySnapshot {
        let now = self.clock.now();
        let store = self.store.as_ref();

        let mut needs = load_record(store, &self.keys.needs, || PersonaRecord::fresh(now)).await;
        loaded_mut(&mut needs).needs.normalize();

        let cycle = if self.config.modules.cycle {
            let mut cycle = load_record(store, &self.keys.cycle, || CycleState::fresh(now)).await;
            loaded_mut(&mut cycle).normalize();
            Some(cycle)
        } else {
            None
        };

        let mut lifecycle = load_record(store, &self.keys.lifecycle, || {
            LifecycleState::create(&self.config.lifecycle, now)
        })
        .await;
        loaded_mut(&mut lifecycle).normalize();

        BodySnapshot {
            needs,
            cycle,
            lifecycle,
            finance: self.load_external(&self.keys.finance).await,
            social: self.load_external(&self.keys.social).await,
        }
    }

    /// Records owned by other collaborators: only a stored value counts.
    async fn load_external<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match load_record(self.store.as_ref(), key, || None).await {
            Loaded::Stored(value) => value,
            _ => None,
        }
    }

    /// Load a record, reporting whether it had to be freshly initialized.
    async fn load_or_init<T, F>(&self, key: &str, default: F) -> (T, bool)
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match load_record(self.store.as_ref(), key, default).await {
            Loaded::Stored(value) => (value, false),
            Loaded::Missing(value) => {
                tracing::info!("Initializing record '{}' with defaults", key);
                (value, true)
            }
            Loaded::Recovered { value, error } => {
                tracing::info!("Re-initializing record '{}' after error: {}", key, error);
                (value, true)
            }
        }
    }
}

fn loaded_mut<T>(loaded: &mut Loaded<T>) -> &mut T {
    match loaded {
        Loaded::Stored(v) | Loaded::Missing(v) => v,
        Loaded::Recovered { value, .. } => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::Phase;
    use crate::lifecycle::LifeStage;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use soma_core::{ManualClock, ModuleSet};
    use soma_memory::InMemoryStore;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    fn body_with(modules: ModuleSet) -> (BodySystem, Arc<ManualClock>, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let config = SomaConfig {
            modules,
            ..Default::default()
        };
        let body = BodySystem::new(config, store.clone(), clock.clone());
        (body, clock, store)
    }

    #[tokio::test]
    async fn test_first_tick_initializes_all_records() {
        let (body, _clock, store) = body_with(ModuleSet {
            cycle: true,
            ..Default::default()
        });
        let report = body.tick().await.unwrap();
        assert_eq!(report.initialized.len(), 3);
        assert!(!report.decayed);
        assert_eq!(report.needs, NeedsVector::default());
        assert!(store.read("default.needs").await.unwrap().is_some());
        assert!(store.read("default.cycle").await.unwrap().is_some());
        assert!(store.read("default.lifecycle").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_tick_decays_with_elapsed_time() {
        let (body, clock, _store) = body_with(ModuleSet::default());
        body.tick().await.unwrap();
        clock.advance(Duration::hours(2));

        let report = body.tick().await.unwrap();
        assert!(report.decayed);
        assert!(report.initialized.is_empty());
        assert!((report.needs.hunger - 30.0).abs() < 1e-9);
        assert!((report.needs.energy - 72.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_stored_needs_are_integers() {
        let (body, clock, store) = body_with(ModuleSet::default());
        body.tick().await.unwrap();
        clock.advance(Duration::minutes(7));
        let report = body.tick().await.unwrap();
        assert!(report.decayed);

        let raw = store.read("default.needs").await.unwrap().unwrap();
        let needs = raw["needs"].as_object().unwrap();
        assert_eq!(needs.len(), 9);
        for (name, value) in needs {
            assert!(value.is_u64(), "{} stored as {}", name, value);
        }
        assert!(raw["carry"]["bowel"].is_f64());
    }

    #[tokio::test]
    async fn test_short_ticks_accumulate_through_carry() {
        let (body, clock, _store) = body_with(ModuleSet::default());
        body.tick().await.unwrap();
        // 20 ticks of 3 minutes: 0.125 hygiene points each, one hour in total.
        for _ in 0..20 {
            clock.advance(Duration::minutes(3));
            body.tick().await.unwrap();
        }
        let needs = body.snapshot().await.needs.into_inner().needs;
        assert!((needs.hygiene - 12.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_rapid_ticks_are_noops() {
        let (body, clock, _store) = body_with(ModuleSet::default());
        body.tick().await.unwrap();
        clock.advance(Duration::seconds(5));
        let report = body.tick().await.unwrap();
        assert!(!report.decayed);
        assert_eq!(report.needs, NeedsVector::default());
    }

    #[tokio::test]
    async fn test_cycle_record_untouched_when_module_off() {
        let (body, clock, store) = body_with(ModuleSet::default());
        body.tick().await.unwrap();
        clock.advance(Duration::days(2));
        let report = body.tick().await.unwrap();
        assert!(!report.cycle_advanced);
        assert!(report.aged);
        assert!(store.read("default.cycle").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cycle_and_lifecycle_advance_by_days() {
        let (body, clock, _store) = body_with(ModuleSet {
            cycle: true,
            ..Default::default()
        });
        body.tick().await.unwrap();
        clock.advance(Duration::hours(48));
        let report = body.tick().await.unwrap();
        assert!(report.cycle_advanced);
        assert!(report.aged);

        let snapshot = body.snapshot().await;
        let cycle = snapshot.cycle.unwrap();
        assert_eq!(cycle.value().current_day, 3);
        assert_eq!(
            snapshot.lifecycle.value().biological_age_days,
            soma_core::config::DEFAULT_INITIAL_AGE_DAYS + 2
        );
        assert_eq!(snapshot.lifecycle.value().life_stage, LifeStage::Adult);
    }

    #[tokio::test]
    async fn test_corrupt_needs_record_is_reinitialized() {
        let (body, _clock, store) = body_with(ModuleSet::default());
        store
            .write("default.needs", serde_json::json!("not a record"))
            .await
            .unwrap();

        let snapshot = body.snapshot().await;
        assert!(snapshot.needs.is_recovered());

        let report = body.tick().await.unwrap();
        assert!(report.initialized.contains(&"default.needs".to_string()));
        assert!(body.snapshot().await.needs.is_stored());
    }

    #[tokio::test]
    async fn test_satisfy_applies_relief_after_decay() {
        let (body, clock, _store) = body_with(ModuleSet::default());
        body.tick().await.unwrap();
        clock.advance(Duration::hours(5));

        let relief = body.satisfy("toilet_flush").await.unwrap();
        match relief {
            Relief::Applied { action, needs } => {
                assert_eq!(action, ReliefAction::Toilet);
                assert_eq!(needs.bladder, 0.0);
                assert!(needs.hunger > 40.0);
            }
            Relief::Unavailable => panic!("toilet should be available"),
        }
    }

    #[tokio::test]
    async fn test_satisfy_unknown_or_disabled_action() {
        let (body, _clock, _store) = body_with(ModuleSet::default());
        assert_eq!(body.satisfy("shop_buy").await.unwrap(), Relief::Unavailable);
        assert_eq!(body.satisfy("intimacy").await.unwrap(), Relief::Unavailable);
    }

    #[tokio::test]
    async fn test_simulator_round_trip() {
        let (body, _clock, _store) = body_with(ModuleSet {
            cycle: true,
            ..Default::default()
        });
        let state = body.simulate_cycle_day(14).await.unwrap();
        assert!(state.simulator.active);
        assert_eq!(state.phase, Phase::Ovulation);

        let state = body.set_simulation_intensity(9.0).await.unwrap();
        assert_eq!(state.simulator.custom_modifiers.intensity, 5.0);

        let state = body.stop_cycle_simulation().await.unwrap();
        assert!(!state.simulator.active);
        assert_eq!(state.phase, Phase::Menstruation);
    }

    #[tokio::test]
    async fn test_external_records_in_snapshot() {
        let (body, _clock, store) = body_with(ModuleSet::default());
        assert!(body.snapshot().await.finance.is_none());

        store
            .write(
                "default.finance",
                serde_json::json!({"balance": -50.0, "monthly_expenses": 1200.0}),
            )
            .await
            .unwrap();
        let finance = body.snapshot().await.finance.unwrap();
        assert_eq!(finance.balance, -50.0);
    }

    #[tokio::test]
    async fn test_concurrent_ticks_do_not_double_decay() {
        let (body, clock, _store) = body_with(ModuleSet::default());
        let body = Arc::new(body);
        body.tick().await.unwrap();
        clock.advance(Duration::hours(1));

        let (a, b) = tokio::join!(body.tick(), body.tick());
        let decayed = [a.unwrap().decayed, b.unwrap().decayed];
        assert_eq!(decayed.iter().filter(|d| **d).count(), 1);

        let needs = body.snapshot().await.needs.into_inner().needs;
        assert!((needs.hunger - 25.0).abs() < 1e-9);
    }
}
