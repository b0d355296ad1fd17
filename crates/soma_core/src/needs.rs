//! Biological need vector.
//!
//! Every field lives in the closed interval [0, 100]. Energy is the only need
//! whose critical side is *low*; every other need becomes pressing as it rises.
//!
//! Values are tracked as `f64` so short ticks still move the body, but they
//! always serialize as integer levels. The fraction below a whole point is
//! persisted separately by [`PersonaRecord`](crate::PersonaRecord).

use crate::modules::ModuleSet;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

pub const NEED_MIN: f64 = 0.0;
pub const NEED_MAX: f64 = 100.0;

/// Guard against NaN and Infinity in need values.
#[inline]
fn sanitize(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("Non-finite need value detected, resetting to {}", fallback);
        fallback
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Need {
    Energy,
    Hunger,
    Thirst,
    Hygiene,
    Bladder,
    Bowel,
    Stress,
    Arousal,
    Libido,
}

impl Need {
    /// Declaration order. Urgency ties and narration follow it.
    pub const ALL: [Need; 9] = [
        Need::Energy,
        Need::Hunger,
        Need::Thirst,
        Need::Hygiene,
        Need::Bladder,
        Need::Bowel,
        Need::Stress,
        Need::Arousal,
        Need::Libido,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Need::Energy => "energy",
            Need::Hunger => "hunger",
            Need::Thirst => "thirst",
            Need::Hygiene => "hygiene",
            Need::Bladder => "bladder",
            Need::Bowel => "bowel",
            Need::Stress => "stress",
            Need::Arousal => "arousal",
            Need::Libido => "libido",
        }
    }

    /// Arousal and libido only exist while the eros module is on.
    pub fn is_eros(&self) -> bool {
        matches!(self, Need::Arousal | Need::Libido)
    }

    pub fn is_enabled(&self, modules: &ModuleSet) -> bool {
        !self.is_eros() || modules.eros
    }

    /// Value a freshly initialized persona starts with.
    pub fn default_level(&self) -> f64 {
        match self {
            Need::Energy => 80.0,
            Need::Hunger | Need::Thirst => 20.0,
            Need::Hygiene | Need::Bladder | Need::Bowel | Need::Stress => 10.0,
            Need::Arousal => 0.0,
            Need::Libido => 20.0,
        }
    }
}

impl fmt::Display for Need {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persona's bodily drives.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeedsVector {
    pub energy: f64,
    pub hunger: f64,
    pub thirst: f64,
    pub hygiene: f64,
    pub bladder: f64,
    pub bowel: f64,
    pub stress: f64,
    pub arousal: f64,
    pub libido: f64,
}

impl Default for NeedsVector {
    fn default() -> Self {
        Self {
            energy: Need::Energy.default_level(),
            hunger: Need::Hunger.default_level(),
            thirst: Need::Thirst.default_level(),
            hygiene: Need::Hygiene.default_level(),
            bladder: Need::Bladder.default_level(),
            bowel: Need::Bowel.default_level(),
            stress: Need::Stress.default_level(),
            arousal: Need::Arousal.default_level(),
            libido: Need::Libido.default_level(),
        }
    }
}

impl Serialize for NeedsVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("NeedsVector", Need::ALL.len())?;
        for need in Need::ALL {
            state.serialize_field(need.as_str(), &self.level(need))?;
        }
        state.end()
    }
}

impl NeedsVector {
    /// Every need at the same level. Handy for neutral fixtures.
    pub fn uniform(level: f64) -> Self {
        let mut needs = Self::default();
        for need in Need::ALL {
            needs.set(need, level);
        }
        needs
    }

    pub fn get(&self, need: Need) -> f64 {
        match need {
            Need::Energy => self.energy,
            Need::Hunger => self.hunger,
            Need::Thirst => self.thirst,
            Need::Hygiene => self.hygiene,
            Need::Bladder => self.bladder,
            Need::Bowel => self.bowel,
            Need::Stress => self.stress,
            Need::Arousal => self.arousal,
            Need::Libido => self.libido,
        }
    }

    fn slot(&mut self, need: Need) -> &mut f64 {
        match need {
            Need::Energy => &mut self.energy,
            Need::Hunger => &mut self.hunger,
            Need::Thirst => &mut self.thirst,
            Need::Hygiene => &mut self.hygiene,
            Need::Bladder => &mut self.bladder,
            Need::Bowel => &mut self.bowel,
            Need::Stress => &mut self.stress,
            Need::Arousal => &mut self.arousal,
            Need::Libido => &mut self.libido,
        }
    }

    /// Store a value, clamped into [0, 100]. Non-finite input resets to the default.
    pub fn set(&mut self, need: Need, value: f64) {
        *self.slot(need) = sanitize(value, need.default_level()).clamp(NEED_MIN, NEED_MAX);
    }

    /// Add a delta and clamp.
    pub fn adjust(&mut self, need: Need, delta: f64) {
        let current = self.get(need);
        self.set(need, current + delta);
    }

    /// Integer reading used by the gate and by narration.
    pub fn level(&self, need: Need) -> u8 {
        self.get(need).round().clamp(NEED_MIN, NEED_MAX) as u8
    }

    /// Progress past the integer level, in `[-0.5, 0.5)`.
    pub fn fraction(&self, need: Need) -> f64 {
        self.get(need) - f64::from(self.level(need))
    }

    /// Needs that exist under the given module set, in declaration order.
    pub fn active(&self, modules: &ModuleSet) -> Vec<(Need, f64)> {
        Need::ALL
            .iter()
            .filter(|n| n.is_enabled(modules))
            .map(|n| (*n, self.get(*n)))
            .collect()
    }

    /// Sanitize and clamp every field.
    pub fn normalize(&mut self) {
        for need in Need::ALL {
            let v = self.get(need);
            self.set(need, v);
        }
    }
}
