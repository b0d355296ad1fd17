//! Cross-domain urgency ranking.
//!
//! Each scorer looks at one domain (body, money, relationships) and emits
//! zero or more entries. The aggregator merges them and sorts by score; ties
//! keep declaration order (needs table order, then finance, then social).

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use soma_core::{FinanceState, Need, NeedsVector, SocialState};
use soma_limbic::{LifeStage, LifecycleState};

/// One ranked concern. Recomputed on every evaluation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrgencyEntry {
    pub dimension: String,
    pub score: u32,
    pub reason: String,
}

impl UrgencyEntry {
    fn new(dimension: &str, score: u32, reason: impl Into<String>) -> Self {
        Self {
            dimension: dimension.to_string(),
            score,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Threshold tables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Fires when the level is strictly below the bound.
    Below(u8),
    /// Fires when the level is strictly above the bound.
    Above(u8),
}

impl Trigger {
    pub fn fires(&self, level: u8) -> bool {
        match *self {
            Trigger::Below(bound) => level < bound,
            Trigger::Above(bound) => level > bound,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NeedRule {
    pub need: Need,
    pub trigger: Trigger,
    pub score: u32,
    pub reason: &'static str,
    pub infant_reason: &'static str,
}

/// Body rules, in tie-break order.
pub const NEED_RULES: [NeedRule; 7] = [
    NeedRule {
        need: Need::Energy,
        trigger: Trigger::Below(15),
        score: 100,
        reason: "Exhausted, can barely keep eyes open",
        infant_reason: "Baby is overtired and fussy, needs a nap",
    },
    NeedRule {
        need: Need::Hunger,
        trigger: Trigger::Above(85),
        score: 95,
        reason: "Starving, stomach is growling",
        infant_reason: "Baby is crying for a feed",
    },
    NeedRule {
        need: Need::Thirst,
        trigger: Trigger::Above(85),
        score: 90,
        reason: "Parched, mouth is dry",
        infant_reason: "Baby is thirsty and restless",
    },
    NeedRule {
        need: Need::Bladder,
        trigger: Trigger::Above(90),
        score: 98,
        reason: "Bladder about to burst, need a toilet now",
        infant_reason: "Baby needs a diaper change",
    },
    NeedRule {
        need: Need::Bowel,
        trigger: Trigger::Above(90),
        score: 97,
        reason: "Bowels cramping, need a toilet now",
        infant_reason: "Baby needs a diaper change",
    },
    // Hygiene accumulates like the other needs and a shower resets it to 0,
    // so this low-side rule fires on a freshly washed body. The wording
    // reports the reading instead of claiming the persona is dirty.
    NeedRule {
        need: Need::Hygiene,
        trigger: Trigger::Below(10),
        score: 60,
        reason: "Hygiene reading has bottomed out, the grooming routine needs a look",
        infant_reason: "Baby's hygiene reading has bottomed out, check the bath routine",
    },
    NeedRule {
        need: Need::Stress,
        trigger: Trigger::Above(90),
        score: 70,
        reason: "Overwhelmed, on the edge of breaking down",
        infant_reason: "Baby is inconsolable and needs soothing",
    },
];

pub const FINANCE_DEBT_SCORE: u32 = 85;
pub const FINANCE_LOW_SCORE: u32 = 50;
/// Balances in `[0, FINANCE_LOW_BALANCE)` count as running low.
pub const FINANCE_LOW_BALANCE: f64 = 100.0;

pub const SOCIAL_NEGLECT_SCORE: u32 = 40;
/// Only bonds stronger than this are missed.
pub const SOCIAL_BOND_MIN: f64 = 30.0;
pub const SOCIAL_NEGLECT_DAYS: i64 = 14;
pub const SOCIAL_NEGLECT_COUNT: usize = 3;

// ============================================================================
// Domain scorers
// ============================================================================

/// Everything a scorer may look at for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct UrgencyInputs<'a> {
    pub needs: &'a NeedsVector,
    pub finance: Option<&'a FinanceState>,
    pub social: Option<&'a SocialState>,
    pub lifecycle: Option<&'a LifecycleState>,
    pub now: DateTime<Utc>,
}

impl<'a> UrgencyInputs<'a> {
    pub fn needs_only(needs: &'a NeedsVector, now: DateTime<Utc>) -> Self {
        Self {
            needs,
            finance: None,
            social: None,
            lifecycle: None,
            now,
        }
    }
}

pub trait UrgencyScorer: Send + Sync {
    fn score(&self, inputs: &UrgencyInputs<'_>) -> Vec<UrgencyEntry>;

    /// Name for logging.
    fn name(&self) -> &str;
}

pub fn score_needs(needs: &NeedsVector, lifecycle: Option<&LifecycleState>) -> Vec<UrgencyEntry> {
    let infant = lifecycle.is_some_and(|l| l.life_stage == LifeStage::Infant);
    NEED_RULES
        .iter()
        .filter(|rule| rule.trigger.fires(needs.level(rule.need)))
        .map(|rule| {
            let reason = if infant {
                rule.infant_reason
            } else {
                rule.reason
            };
            UrgencyEntry::new(rule.need.as_str(), rule.score, reason)
        })
        .collect()
}

pub fn score_finance(finance: &FinanceState) -> Vec<UrgencyEntry> {
    let balance = finance.balance;
    if !balance.is_finite() {
        return Vec::new();
    }
    if balance < 0.0 {
        vec![UrgencyEntry::new(
            "finance",
            FINANCE_DEBT_SCORE,
            format!("In debt ({:.2}), money must come first", balance),
        )]
    } else if balance < FINANCE_LOW_BALANCE {
        vec![UrgencyEntry::new(
            "finance",
            FINANCE_LOW_SCORE,
            format!("Money is running low ({:.2} left)", balance),
        )]
    } else {
        Vec::new()
    }
}

/// Bonds worth keeping that have gone quiet for more than
/// [`SOCIAL_NEGLECT_DAYS`]. Never-met bonds count as neglected.
pub fn neglected_bonds(social: &SocialState, now: DateTime<Utc>) -> Vec<&str> {
    let limit = Duration::days(SOCIAL_NEGLECT_DAYS);
    social
        .bonds
        .iter()
        .filter(|b| b.bond > SOCIAL_BOND_MIN)
        .filter(|b| b.time_since_contact(now).map_or(true, |elapsed| elapsed > limit))
        .map(|b| b.name.as_str())
        .collect()
}

pub fn score_social(social: &SocialState, now: DateTime<Utc>) -> Vec<UrgencyEntry> {
    let neglected = neglected_bonds(social, now);
    if neglected.len() < SOCIAL_NEGLECT_COUNT {
        return Vec::new();
    }
    vec![UrgencyEntry::new(
        "social",
        SOCIAL_NEGLECT_SCORE,
        format!(
            "Haven't seen {} people in over {} days: {}",
            neglected.len(),
            SOCIAL_NEGLECT_DAYS,
            neglected.join(", ")
        ),
    )]
}

pub struct NeedsScorer;

impl UrgencyScorer for NeedsScorer {
    fn score(&self, inputs: &UrgencyInputs<'_>) -> Vec<UrgencyEntry> {
        score_needs(inputs.needs, inputs.lifecycle)
    }

    fn name(&self) -> &str {
        "needs"
    }
}

pub struct FinanceScorer;

impl UrgencyScorer for FinanceScorer {
    fn score(&self, inputs: &UrgencyInputs<'_>) -> Vec<UrgencyEntry> {
        inputs.finance.map(score_finance).unwrap_or_default()
    }

    fn name(&self) -> &str {
        "finance"
    }
}

pub struct SocialScorer;

impl UrgencyScorer for SocialScorer {
    fn score(&self, inputs: &UrgencyInputs<'_>) -> Vec<UrgencyEntry> {
        inputs
            .social
            .map(|s| score_social(s, inputs.now))
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "social"
    }
}

// ============================================================================
// Aggregator
// ============================================================================

pub struct UrgencyAggregator {
    scorers: Vec<Box<dyn UrgencyScorer>>,
}

impl Default for UrgencyAggregator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl UrgencyAggregator {
    pub fn new() -> Self {
        Self {
            scorers: Vec::new(),
        }
    }

    /// Needs, finance and social scorers, in that order.
    pub fn with_defaults() -> Self {
        let mut aggregator = Self::new();
        aggregator.add_scorer(Box::new(NeedsScorer));
        aggregator.add_scorer(Box::new(FinanceScorer));
        aggregator.add_scorer(Box::new(SocialScorer));
        aggregator
    }

    pub fn add_scorer(&mut self, scorer: Box<dyn UrgencyScorer>) {
        self.scorers.push(scorer);
    }

    /// All entries, most urgent first. Equal scores keep scorer order.
    pub fn evaluate(&self, inputs: &UrgencyInputs<'_>) -> Vec<UrgencyEntry> {
        let mut entries: Vec<UrgencyEntry> = self
            .scorers
            .iter()
            .flat_map(|scorer| {
                let entries = scorer.score(inputs);
                if !entries.is_empty() {
                    tracing::debug!("Scorer '{}' raised {} entries", scorer.name(), entries.len());
                }
                entries
            })
            .collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }

    pub fn current_priority(&self, inputs: &UrgencyInputs<'_>) -> Option<UrgencyEntry> {
        self.evaluate(inputs).into_iter().next()
    }
}

/// Evaluate with the default scorers.
pub fn aggregate(inputs: &UrgencyInputs<'_>) -> Vec<UrgencyEntry> {
    UrgencyAggregator::with_defaults().evaluate(inputs)
}

pub fn current_priority(inputs: &UrgencyInputs<'_>) -> Option<UrgencyEntry> {
    aggregate(inputs).into_iter().next()
}
