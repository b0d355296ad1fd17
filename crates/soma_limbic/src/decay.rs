//! Need decay engine.
//!
//! Each need drifts toward its unsatisfied extreme in proportion to elapsed
//! hours: energy falls, everything else rises. Base rates are scaled by the
//! life-stage multipliers, and the cycle phase layers additive modifiers on top.

use crate::cycle::{derive_phase, phase_modifiers, CycleState, PHASE_MODIFIER_SCALE};
use crate::lifecycle::{stage_multipliers, LifeStageMultipliers, LifecycleState};
use chrono::{DateTime, Utc};
use soma_core::{
    hours_between, DecayRates, ModuleSet, Need, NeedsVector, PersonaRecord, MIN_TICK_HOURS,
};

/// Bladder level above which arousal gets a fixed bump.
pub const BLADDER_AROUSAL_THRESHOLD: f64 = 70.0;
pub const BLADDER_AROUSAL_BUMP: f64 = 2.0;
/// Libido level above which arousal gets a smaller fixed bump.
pub const LIBIDO_AROUSAL_THRESHOLD: f64 = 70.0;
pub const LIBIDO_AROUSAL_BUMP: f64 = 1.0;

/// Configured decay behaviour for one persona.
#[derive(Debug, Clone, Default)]
pub struct NeedDynamics {
    pub rates: DecayRates,
    pub modules: ModuleSet,
}

impl NeedDynamics {
    pub fn new(rates: DecayRates, modules: ModuleSet) -> Self {
        Self { rates, modules }
    }

    /// Advance the record to `now`. Returns false (and leaves the record
    /// untouched) when less than 18 seconds passed or the clock is unusable.
    pub fn advance(
        &self,
        record: &mut PersonaRecord,
        now: DateTime<Utc>,
        cycle: Option<&CycleState>,
        lifecycle: Option<&LifecycleState>,
    ) -> bool {
        let hours = hours_between(record.last_tick, now);
        if !hours.is_finite() || hours < MIN_TICK_HOURS {
            tracing::debug!("Skipping decay: {:.4}h since last tick", hours);
            return false;
        }
        self.step(&mut record.needs, hours, cycle, lifecycle);
        record.last_tick = now;
        true
    }

    /// Apply `hours` of decay to `needs`. Pure arithmetic, always clamped.
    pub fn step(
        &self,
        needs: &mut NeedsVector,
        hours: f64,
        cycle: Option<&CycleState>,
        lifecycle: Option<&LifecycleState>,
    ) {
        if !hours.is_finite() || hours <= 0.0 {
            return;
        }
        let multipliers = lifecycle
            .map(|l| stage_multipliers(l.life_stage))
            .unwrap_or(LifeStageMultipliers::NEUTRAL);

        for need in Need::ALL {
            if !need.is_enabled(&self.modules) {
                continue;
            }
            let sign = if need == Need::Energy { -1.0 } else { 1.0 };
            let delta = sign * self.rates.rate(need) * multipliers.factor(need) * hours;
            needs.adjust(need, delta);
        }

        if self.modules.eros {
            if needs.bladder > BLADDER_AROUSAL_THRESHOLD {
                needs.adjust(Need::Arousal, BLADDER_AROUSAL_BUMP);
            }
            if needs.libido > LIBIDO_AROUSAL_THRESHOLD {
                needs.adjust(Need::Arousal, LIBIDO_AROUSAL_BUMP);
            }
        }

        if self.modules.cycle {
            if let Some(cycle) = cycle {
                self.apply_cycle(needs, cycle, hours);
            }
        }

        tracing::trace!(
            "Decayed {:.3}h: E={:.1} H={:.1} T={:.1} B={:.1} S={:.1}",
            hours,
            needs.energy,
            needs.hunger,
            needs.thirst,
            needs.bladder,
            needs.stress
        );
    }

    fn apply_cycle(&self, needs: &mut NeedsVector, cycle: &CycleState, hours: f64) {
        let phase = derive_phase(cycle.active_day());
        let scale = hours * PHASE_MODIFIER_SCALE * cycle.modifier_intensity();
        for (need, modifier) in phase_modifiers(phase) {
            if !need.is_enabled(&self.modules) {
                continue;
            }
            needs.adjust(*need, modifier * scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifeStage;
    use chrono::{Duration, TimeZone};
    use soma_core::config::LifecycleConfig;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn lifecycle_at(age_days: u32) -> LifecycleState {
        LifecycleState::create(
            &LifecycleConfig {
                birth_date: None,
                initial_age_days: Some(age_days),
            },
            t0(),
        )
    }

    #[test]
    fn test_one_hour_adult_decay() {
        let dynamics = NeedDynamics::default();
        let mut record = PersonaRecord::fresh(t0());
        assert!(dynamics.advance(&mut record, t0() + Duration::hours(1), None, None));

        assert!((record.needs.energy - 76.0).abs() < 1e-9);
        assert!((record.needs.hunger - 25.0).abs() < 1e-9);
        assert!((record.needs.thirst - 27.0).abs() < 1e-9);
        assert!((record.needs.bladder - 19.0).abs() < 1e-9);
        assert_eq!(record.last_tick, t0() + Duration::hours(1));
    }

    #[test]
    fn test_below_floor_is_noop() {
        let dynamics = NeedDynamics::default();
        let mut record = PersonaRecord::fresh(t0());
        let before = record.clone();
        assert!(!dynamics.advance(&mut record, t0() + Duration::seconds(17), None, None));
        assert_eq!(record, before);
    }

    #[test]
    fn test_clock_skew_is_noop() {
        let dynamics = NeedDynamics::default();
        let mut record = PersonaRecord::fresh(t0());
        let before = record.clone();
        assert!(!dynamics.advance(&mut record, t0() - Duration::hours(5), None, None));
        assert_eq!(record, before);
    }

    #[test]
    fn test_long_absence_clamps() {
        let dynamics = NeedDynamics::default();
        let mut record = PersonaRecord::fresh(t0());
        assert!(dynamics.advance(&mut record, t0() + Duration::days(30), None, None));
        assert_eq!(record.needs.energy, 0.0);
        assert_eq!(record.needs.hunger, 100.0);
        assert_eq!(record.needs.bladder, 100.0);
    }

    #[test]
    fn test_eros_disabled_leaves_arousal_alone() {
        let dynamics = NeedDynamics::default();
        let mut needs = NeedsVector {
            bladder: 95.0,
            ..Default::default()
        };
        dynamics.step(&mut needs, 2.0, None, None);
        assert_eq!(needs.arousal, 0.0);
        assert_eq!(needs.libido, 20.0);
    }

    #[test]
    fn test_eros_couplings() {
        let dynamics = NeedDynamics::new(
            DecayRates::default(),
            ModuleSet {
                eros: true,
                ..Default::default()
            },
        );
        let mut needs = NeedsVector {
            bladder: 80.0,
            libido: 80.0,
            arousal: 10.0,
            ..Default::default()
        };
        dynamics.step(&mut needs, 1.0, None, None);
        // own rate 2.0 + bladder bump 2.0 + libido bump 1.0
        assert!((needs.arousal - 15.0).abs() < 1e-9);
        assert!((needs.libido - 81.0).abs() < 1e-9);
    }

    #[test]
    fn test_infant_gets_hungry_faster() {
        let dynamics = NeedDynamics::default();
        let infant = lifecycle_at(100);
        assert_eq!(infant.life_stage, LifeStage::Infant);

        let mut baby = NeedsVector::default();
        let mut adult = NeedsVector::default();
        dynamics.step(&mut baby, 1.0, None, Some(&infant));
        dynamics.step(&mut adult, 1.0, None, Some(&lifecycle_at(9000)));

        assert!((baby.hunger - 27.5).abs() < 1e-9);
        assert!((adult.hunger - 25.0).abs() < 1e-9);
        assert!(baby.stress < adult.stress);
    }

    #[test]
    fn test_menstruation_modifiers_applied() {
        let dynamics = NeedDynamics::new(
            DecayRates::default(),
            ModuleSet {
                cycle: true,
                ..Default::default()
            },
        );
        let cycle = CycleState::fresh(t0());
        let mut with_cycle = NeedsVector::default();
        let mut without = NeedsVector::default();
        dynamics.step(&mut with_cycle, 2.0, Some(&cycle), None);
        NeedDynamics::default().step(&mut without, 2.0, None, None);

        // energy -12 * 2h * 0.1
        assert!((with_cycle.energy - (without.energy - 2.4)).abs() < 1e-9);
        assert!((with_cycle.stress - (without.stress + 1.6)).abs() < 1e-9);
        // libido modifier skipped without eros
        assert_eq!(with_cycle.libido, without.libido);
    }

    #[test]
    fn test_cycle_ignored_when_module_off() {
        let dynamics = NeedDynamics::default();
        let cycle = CycleState::fresh(t0());
        let mut a = NeedsVector::default();
        let mut b = NeedsVector::default();
        dynamics.step(&mut a, 1.0, Some(&cycle), None);
        dynamics.step(&mut b, 1.0, None, None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_simulator_day_and_intensity_drive_modifiers() {
        let dynamics = NeedDynamics::new(
            DecayRates::default(),
            ModuleSet {
                cycle: true,
                eros: true,
                ..Default::default()
            },
        );
        let mut cycle = CycleState::fresh(t0());
        cycle.simulate_day(14);
        cycle.set_intensity(2.0);

        let mut needs = NeedsVector::default();
        dynamics.step(&mut needs, 1.0, Some(&cycle), None);
        // libido: 20 + 1.0 (rate) + 10 * 0.1 * 2.0
        assert!((needs.libido - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_rates() {
        let rates = DecayRates {
            thirst: Some(20.0),
            ..Default::default()
        };
        let dynamics = NeedDynamics::new(rates, ModuleSet::default());
        let mut needs = NeedsVector::default();
        dynamics.step(&mut needs, 0.5, None, None);
        assert!((needs.thirst - 30.0).abs() < 1e-9);
    }
}
