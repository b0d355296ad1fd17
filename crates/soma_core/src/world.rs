//! Read-only inputs owned by outside collaborators: money and relationships.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceState {
    pub balance: f64,
    pub monthly_expenses: f64,
}

/// One bonded entity (friend, partner, pet ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub name: String,
    /// Bond strength, 0 - 100.
    pub bond: f64,
    pub last_interaction: Option<DateTime<Utc>>,
}

impl Bond {
    /// Time since the last interaction. `None` if they never met.
    pub fn time_since_contact(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_interaction.map(|ts| now - ts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialState {
    pub bonds: Vec<Bond>,
}
