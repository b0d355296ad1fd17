//! Lifecycle state machine: biological age in days and the life stage it implies.
//!
//! The stage is never stored independently of the age; every mutation goes
//! through [`derive_stage`].

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use soma_core::config::{LifecycleConfig, DEFAULT_INITIAL_AGE_DAYS};
use soma_core::{hours_between, Need};

/// Hours of real time that make one biological day.
pub const AGING_INTERVAL_HOURS: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Infant,
    Child,
    Teen,
    Adult,
    MiddleAdult,
    Senior,
}

impl LifeStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifeStage::Infant => "infant",
            LifeStage::Child => "child",
            LifeStage::Teen => "teen",
            LifeStage::Adult => "adult",
            LifeStage::MiddleAdult => "middle_adult",
            LifeStage::Senior => "senior",
        }
    }
}

/// Exclusive upper bound in days for each stage; anything beyond is senior.
pub const STAGE_THRESHOLDS: [(u32, LifeStage); 5] = [
    (730, LifeStage::Infant),
    (4380, LifeStage::Child),
    (6570, LifeStage::Teen),
    (21900, LifeStage::Adult),
    (25550, LifeStage::MiddleAdult),
];

pub fn derive_stage(age_days: u32) -> LifeStage {
    STAGE_THRESHOLDS
        .iter()
        .find(|(limit, _)| age_days < *limit)
        .map(|(_, stage)| *stage)
        .unwrap_or(LifeStage::Senior)
}

// =============================================================================
// Stage multipliers
// =============================================================================

/// Multiplicative factors applied to base decay rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LifeStageMultipliers {
    pub energy: f64,
    pub hunger: f64,
    pub thirst: f64,
    pub hygiene: f64,
    pub stress: f64,
    pub bladder: f64,
    pub bowel: f64,
    pub arousal: f64,
    pub libido: f64,
}

impl LifeStageMultipliers {
    pub const NEUTRAL: LifeStageMultipliers = LifeStageMultipliers {
        energy: 1.0,
        hunger: 1.0,
        thirst: 1.0,
        hygiene: 1.0,
        stress: 1.0,
        bladder: 1.0,
        bowel: 1.0,
        arousal: 1.0,
        libido: 1.0,
    };

    pub fn factor(&self, need: Need) -> f64 {
        match need {
            Need::Energy => self.energy,
            Need::Hunger => self.hunger,
            Need::Thirst => self.thirst,
            Need::Hygiene => self.hygiene,
            Need::Stress => self.stress,
            Need::Bladder => self.bladder,
            Need::Bowel => self.bowel,
            Need::Arousal => self.arousal,
            Need::Libido => self.libido,
        }
    }
}

const INFANT: LifeStageMultipliers = LifeStageMultipliers {
    energy: 1.4,
    hunger: 1.5,
    thirst: 1.2,
    hygiene: 1.3,
    stress: 0.5,
    bladder: 1.6,
    bowel: 1.4,
    arousal: 0.0,
    libido: 0.0,
};

const CHILD: LifeStageMultipliers = LifeStageMultipliers {
    energy: 1.2,
    hunger: 1.2,
    thirst: 1.1,
    hygiene: 1.2,
    stress: 0.7,
    bladder: 1.2,
    bowel: 1.1,
    arousal: 0.0,
    libido: 0.0,
};

const TEEN: LifeStageMultipliers = LifeStageMultipliers {
    energy: 1.0,
    hunger: 1.3,
    thirst: 1.1,
    hygiene: 1.1,
    stress: 1.2,
    bladder: 1.0,
    bowel: 1.0,
    arousal: 1.3,
    libido: 1.4,
};

const MIDDLE_ADULT: LifeStageMultipliers = LifeStageMultipliers {
    energy: 1.15,
    hunger: 0.95,
    thirst: 1.0,
    hygiene: 1.0,
    stress: 1.05,
    bladder: 1.1,
    bowel: 1.0,
    arousal: 0.8,
    libido: 0.8,
};

const SENIOR: LifeStageMultipliers = LifeStageMultipliers {
    energy: 0.7,
    hunger: 0.85,
    thirst: 0.9,
    hygiene: 1.1,
    stress: 0.9,
    bladder: 1.3,
    bowel: 1.2,
    arousal: 0.5,
    libido: 0.5,
};

pub fn stage_multipliers(stage: LifeStage) -> LifeStageMultipliers {
    match stage {
        LifeStage::Infant => INFANT,
        LifeStage::Child => CHILD,
        LifeStage::Teen => TEEN,
        LifeStage::Adult => LifeStageMultipliers::NEUTRAL,
        LifeStage::MiddleAdult => MIDDLE_ADULT,
        LifeStage::Senior => SENIOR,
    }
}

// =============================================================================
// Lifecycle state
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleState {
    pub birth_date: NaiveDate,
    pub biological_age_days: u32,
    pub life_stage: LifeStage,
    pub last_aging_check: DateTime<Utc>,
}

impl LifecycleState {
    /// Build from the configured birth date, else the configured initial age,
    /// else a 25-year-old adult.
    pub fn create(config: &LifecycleConfig, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let (birth_date, age_days) = match (config.birth_date, config.initial_age_days) {
            (Some(birth), _) => {
                let days = (today - birth).num_days().clamp(0, u32::MAX as i64) as u32;
                (birth.min(today), days)
            }
            (None, age) => {
                let days = age.unwrap_or(DEFAULT_INITIAL_AGE_DAYS);
                let birth = today
                    .checked_sub_signed(Duration::days(days as i64))
                    .unwrap_or(NaiveDate::MIN);
                (birth, days)
            }
        };
        Self {
            birth_date,
            biological_age_days: age_days,
            life_stage: derive_stage(age_days),
            last_aging_check: now,
        }
    }

    /// Add one day per full 24 h since the last check. Returns true if aged.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        let hours = hours_between(self.last_aging_check, now);
        if !hours.is_finite() || hours < AGING_INTERVAL_HOURS {
            return false;
        }
        let days = (hours / AGING_INTERVAL_HOURS).floor() as u32;
        let previous = self.life_stage;
        self.biological_age_days = self.biological_age_days.saturating_add(days);
        self.life_stage = derive_stage(self.biological_age_days);
        self.last_aging_check = now;

        if previous != self.life_stage {
            tracing::info!(
                "Life stage changed: {} -> {} at {} days",
                previous.as_str(),
                self.life_stage.as_str(),
                self.biological_age_days
            );
        }
        true
    }

    pub fn age_years(&self) -> u32 {
        self.biological_age_days / 365
    }

    /// Re-derive the stage from the age (used after loading a record).
    pub fn normalize(&mut self) {
        self.life_stage = derive_stage(self.biological_age_days);
    }
}
