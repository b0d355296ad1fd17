//! Reflex lock: blocks unrelated actions while a bodily need is critical.
//!
//! The gate is stateless. Every call looks at the needs fresh and answers
//! Allowed or Blocked. Relief and diagnostic actions always pass, otherwise
//! the persona could never clear the condition that locked it.

use serde::Serialize;
use soma_core::config::DEFAULT_REFLEX_THRESHOLD;
use soma_core::{
    load_record, Loaded, ModuleSet, Need, NeedsVector, PersonaRecord, SomaConfig, StateStore,
};
use soma_limbic::relief::matches_prefix;
use soma_limbic::ReliefAction;

/// Low energy locks at or below this level, independent of the threshold.
pub const ENERGY_CRITICAL_LEVEL: u8 = 5;

/// Action prefixes that are never blocked besides the relief actions.
pub const DIAGNOSTIC_PREFIXES: [&str; 4] = ["diagnostic", "self_test", "selftest", "health_check"];

/// Needs checked against the threshold, in report order.
const MONITORED: [Need; 6] = [
    Need::Bladder,
    Need::Bowel,
    Need::Hygiene,
    Need::Stress,
    Need::Arousal,
    Need::Libido,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Allowed,
    Blocked { dimensions: Vec<Need>, reason: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Relief actions and diagnostics bypass the gate.
pub fn is_exempt(action: &str) -> bool {
    ReliefAction::from_action_name(action).is_some()
        || DIAGNOSTIC_PREFIXES
            .iter()
            .any(|prefix| matches_prefix(action, prefix))
}

#[derive(Debug, Clone, Copy)]
pub struct ReflexGate {
    pub threshold: u8,
    pub modules: ModuleSet,
}

impl Default for ReflexGate {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REFLEX_THRESHOLD,
            modules: ModuleSet::default(),
        }
    }
}

impl ReflexGate {
    pub fn new(threshold: u8, modules: ModuleSet) -> Self {
        Self { threshold, modules }
    }

    pub fn from_config(config: &SomaConfig) -> Self {
        Self::new(config.reflex.threshold, config.modules)
    }

    /// Needs currently past their critical line.
    pub fn critical_needs(&self, needs: &NeedsVector) -> Vec<Need> {
        let mut critical = Vec::new();
        if needs.level(Need::Energy) <= ENERGY_CRITICAL_LEVEL {
            critical.push(Need::Energy);
        }
        critical.extend(
            MONITORED
                .iter()
                .filter(|need| need.is_enabled(&self.modules))
                .filter(|need| needs.level(**need) >= self.threshold)
                .copied(),
        );
        critical
    }

    pub fn check(&self, action: &str, needs: &NeedsVector) -> GateDecision {
        if is_exempt(action) {
            return GateDecision::Allowed;
        }
        let critical = self.critical_needs(needs);
        if critical.is_empty() {
            return GateDecision::Allowed;
        }
        let reason = self.block_reason(&critical, needs);
        tracing::info!("Reflex lock blocked '{}': {}", action, reason);
        GateDecision::Blocked {
            dimensions: critical,
            reason,
        }
    }

    fn block_reason(&self, critical: &[Need], needs: &NeedsVector) -> String {
        let readings: Vec<String> = critical
            .iter()
            .map(|n| format!("{} {}", n, needs.level(*n)))
            .collect();
        let mut reliefs: Vec<&str> = Vec::new();
        for need in critical {
            let prefix = ReliefAction::for_need(*need).prefix();
            if !reliefs.contains(&prefix) {
                reliefs.push(prefix);
            }
        }
        format!(
            "Reflex lock: {} critical. Deal with it first ({}).",
            readings.join(", "),
            reliefs.join(" / ")
        )
    }

    /// Check against the stored needs record. A broken record fails open.
    pub async fn evaluate_with_store(
        &self,
        store: &dyn StateStore,
        needs_key: &str,
        action: &str,
    ) -> GateDecision {
        if is_exempt(action) {
            return GateDecision::Allowed;
        }
        match load_record(store, needs_key, || PersonaRecord::fresh(chrono::Utc::now())).await {
            Loaded::Stored(record) | Loaded::Missing(record) => {
                let mut needs = record.needs;
                needs.normalize();
                self.check(action, &needs)
            }
            Loaded::Recovered { error, .. } => {
                tracing::warn!(
                    "Reflex gate failing open for '{}', needs unreadable: {}",
                    action,
                    error
                );
                GateDecision::Allowed
            }
        }
    }
}
