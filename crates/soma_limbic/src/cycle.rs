//! Cycle state machine: a fixed 28-day hormonal cycle.
//!
//! Phase and hormone levels are pure lookups on the active day. The active
//! day is the real `current_day`, or `simulator.simulated_day` while the
//! what-if simulator is switched on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soma_core::config::CYCLE_LENGTH;
use soma_core::{hours_between, Need};

/// Minimum real hours before the cycle may advance at all.
pub const ADVANCE_MIN_HOURS: f64 = 20.0;
/// Real hours per simulated cycle day.
pub const HOURS_PER_DAY: f64 = 24.0;
/// Phase modifiers are per-hour values scaled down by this factor.
pub const PHASE_MODIFIER_SCALE: f64 = 0.1;
pub const MAX_SIMULATION_INTENSITY: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstruation,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Menstruation => "menstruation",
            Phase::Follicular => "follicular",
            Phase::Ovulation => "ovulation",
            Phase::Luteal => "luteal",
        }
    }
}

pub fn derive_phase(day: u32) -> Phase {
    match day {
        0..=5 => Phase::Menstruation,
        6..=13 => Phase::Follicular,
        14..=15 => Phase::Ovulation,
        _ => Phase::Luteal,
    }
}

// =============================================================================
// Hormone curves (0 - 100), indexed by day - 1
// =============================================================================

const ESTROGEN: [u8; 28] = [
    20, 22, 25, 28, 32, 38, 45, //
    52, 60, 68, 76, 85, 93, 100, //
    80, 55, 50, 55, 60, 65, 68, //
    65, 60, 50, 40, 32, 26, 22,
];

const PROGESTERONE: [u8; 28] = [
    5, 4, 3, 3, 3, 3, 3, //
    3, 4, 4, 5, 5, 6, 8, //
    15, 25, 40, 55, 70, 85, 95, //
    100, 92, 80, 62, 45, 28, 14,
];

const LH: [u8; 28] = [
    10, 10, 10, 10, 12, 12, 14, //
    15, 16, 18, 22, 35, 70, 100, //
    45, 20, 15, 12, 10, 10, 9, //
    9, 8, 8, 8, 9, 9, 10,
];

const FSH: [u8; 28] = [
    35, 40, 45, 45, 42, 38, 35, //
    30, 28, 26, 25, 30, 55, 80, //
    40, 20, 15, 12, 10, 10, 10, //
    12, 14, 18, 22, 26, 30, 34,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hormones {
    pub estrogen: u8,
    pub progesterone: u8,
    pub lh: u8,
    pub fsh: u8,
}

pub fn derive_hormones(day: u32) -> Hormones {
    let idx = (day as usize).saturating_sub(1).min(ESTROGEN.len() - 1);
    Hormones {
        estrogen: ESTROGEN[idx],
        progesterone: PROGESTERONE[idx],
        lh: LH[idx],
        fsh: FSH[idx],
    }
}

// =============================================================================
// Phase need modifiers (additive, per hour before scaling)
// =============================================================================

const MENSTRUATION_MODIFIERS: &[(Need, f64)] = &[
    (Need::Energy, -12.0),
    (Need::Hunger, 5.0),
    (Need::Stress, 8.0),
    (Need::Libido, -3.0),
];

const FOLLICULAR_MODIFIERS: &[(Need, f64)] = &[
    (Need::Energy, 6.0),
    (Need::Stress, -4.0),
    (Need::Libido, 2.0),
];

const OVULATION_MODIFIERS: &[(Need, f64)] = &[
    (Need::Energy, 8.0),
    (Need::Stress, -2.0),
    (Need::Arousal, 6.0),
    (Need::Libido, 10.0),
];

const LUTEAL_MODIFIERS: &[(Need, f64)] = &[
    (Need::Energy, -6.0),
    (Need::Hunger, 8.0),
    (Need::Thirst, 2.0),
    (Need::Stress, 6.0),
    (Need::Libido, -1.0),
];

pub fn phase_modifiers(phase: Phase) -> &'static [(Need, f64)] {
    match phase {
        Phase::Menstruation => MENSTRUATION_MODIFIERS,
        Phase::Follicular => FOLLICULAR_MODIFIERS,
        Phase::Ovulation => OVULATION_MODIFIERS,
        Phase::Luteal => LUTEAL_MODIFIERS,
    }
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorModifiers {
    /// Global multiplier on phase modifiers while simulating.
    pub intensity: f64,
}

impl Default for SimulatorModifiers {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

/// What-if simulator: pins a day independently of the real clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleSimulator {
    pub active: bool,
    pub simulated_day: u32,
    pub custom_modifiers: SimulatorModifiers,
}

impl Default for CycleSimulator {
    fn default() -> Self {
        Self {
            active: false,
            simulated_day: 1,
            custom_modifiers: SimulatorModifiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    pub cycle_length: u32,
    pub current_day: u32,
    pub phase: Phase,
    pub hormones: Hormones,
    pub last_advance: DateTime<Utc>,
    #[serde(default)]
    pub simulator: CycleSimulator,
}

fn clamp_day(day: u32) -> u32 {
    day.clamp(1, CYCLE_LENGTH)
}

impl CycleState {
    /// Day 1 of a new cycle.
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            cycle_length: CYCLE_LENGTH,
            current_day: 1,
            phase: derive_phase(1),
            hormones: derive_hormones(1),
            last_advance: now,
            simulator: CycleSimulator::default(),
        }
    }

    /// The day every downstream consumer reads.
    pub fn active_day(&self) -> u32 {
        if self.simulator.active {
            self.simulator.simulated_day
        } else {
            self.current_day
        }
    }

    /// Multiplier applied on top of phase modifiers; 1.0 unless simulating.
    pub fn modifier_intensity(&self) -> f64 {
        if self.simulator.active {
            self.simulator.custom_modifiers.intensity
        } else {
            1.0
        }
    }

    fn refresh(&mut self) {
        let day = self.active_day();
        self.phase = derive_phase(day);
        self.hormones = derive_hormones(day);
    }

    /// Advance one cycle day per full 24 h, once at least 20 h have passed.
    pub fn advance_day(&mut self, now: DateTime<Utc>) -> bool {
        let hours = hours_between(self.last_advance, now);
        if !hours.is_finite() || hours < ADVANCE_MIN_HOURS {
            return false;
        }
        if self.cycle_length != CYCLE_LENGTH {
            tracing::debug!(
                "Cycle length {} corrected to {}",
                self.cycle_length,
                CYCLE_LENGTH
            );
            self.cycle_length = CYCLE_LENGTH;
        }
        let days = (hours / HOURS_PER_DAY).floor() as u64;
        let day = (clamp_day(self.current_day) as u64 - 1 + days) % CYCLE_LENGTH as u64 + 1;
        let previous = self.phase;
        self.current_day = day as u32;
        self.refresh();
        self.last_advance = now;

        if previous != self.phase {
            tracing::info!(
                "Cycle phase changed: {} -> {} (day {})",
                previous.as_str(),
                self.phase.as_str(),
                self.active_day()
            );
        }
        true
    }

    /// Pin the simulator to `day` and switch it on.
    pub fn simulate_day(&mut self, day: u32) {
        self.simulator.active = true;
        self.simulator.simulated_day = clamp_day(day);
        self.refresh();
    }

    pub fn set_intensity(&mut self, intensity: f64) {
        let intensity = if intensity.is_finite() {
            intensity.clamp(0.0, MAX_SIMULATION_INTENSITY)
        } else {
            1.0
        };
        self.simulator.custom_modifiers.intensity = intensity;
    }

    pub fn stop_simulation(&mut self) {
        self.simulator.active = false;
        self.refresh();
    }

    /// Repair a loaded record: fixed length, valid days, derived fields.
    pub fn normalize(&mut self) {
        self.cycle_length = CYCLE_LENGTH;
        self.current_day = clamp_day(self.current_day);
        self.simulator.simulated_day = clamp_day(self.simulator.simulated_day);
        let intensity = self.simulator.custom_modifiers.intensity;
        self.set_intensity(intensity);
        self.refresh();
    }
}
