//! Persona state record: the need vector plus the instant it was last advanced.
//!
//! On disk the needs are integer levels. Whatever decay has accumulated below
//! a whole point travels in a separate `carry` map, so frequent short ticks
//! still add up instead of rounding away.

use crate::needs::{Need, NeedsVector};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Below this many hours (18 seconds) decay is a no-op.
pub const MIN_TICK_HOURS: f64 = 0.005;

/// Remainders smaller than this are not worth persisting.
const CARRY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub struct PersonaRecord {
    pub needs: NeedsVector,
    /// When `needs` was last advanced. Never moves backwards.
    pub last_tick: DateTime<Utc>,
}

impl PersonaRecord {
    pub fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            needs: NeedsVector::default(),
            last_tick: now,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    needs: NeedsVector,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    carry: BTreeMap<Need, f64>,
    last_tick: DateTime<Utc>,
}

impl From<PersonaRecord> for StoredRecord {
    fn from(record: PersonaRecord) -> Self {
        let carry = Need::ALL
            .iter()
            .map(|need| (*need, record.needs.fraction(*need)))
            .filter(|(_, rest)| rest.abs() > CARRY_EPSILON)
            .collect();
        Self {
            needs: record.needs,
            carry,
            last_tick: record.last_tick,
        }
    }
}

impl From<StoredRecord> for PersonaRecord {
    /// The stored level is authoritative: a carry that would move it (for
    /// instance after an outside edit of `needs`) is dropped.
    fn from(stored: StoredRecord) -> Self {
        let mut needs = stored.needs;
        needs.normalize();
        for need in Need::ALL {
            let level = needs.level(need);
            let whole = f64::from(level);
            let rest = stored
                .carry
                .get(&need)
                .copied()
                .filter(|c| c.is_finite())
                .unwrap_or(0.0);
            needs.set(need, whole + rest);
            if needs.level(need) != level {
                needs.set(need, whole);
            }
        }
        Self {
            needs,
            last_tick: stored.last_tick,
        }
    }
}
