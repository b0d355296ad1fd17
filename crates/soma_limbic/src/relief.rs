//! Need-satisfying actions.
//!
//! Each relief action resets one or more needs to a fixed value. Actions are
//! matched by name prefix, so `toilet_flush` and `sleep:nap` both resolve.

use soma_core::{ModuleSet, Need, NeedsVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReliefAction {
    Toilet,
    Sleep,
    Eat,
    Drink,
    Shower,
    Relax,
    Intimacy,
}

impl ReliefAction {
    pub const ALL: [ReliefAction; 7] = [
        ReliefAction::Toilet,
        ReliefAction::Sleep,
        ReliefAction::Eat,
        ReliefAction::Drink,
        ReliefAction::Shower,
        ReliefAction::Relax,
        ReliefAction::Intimacy,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            ReliefAction::Toilet => "toilet",
            ReliefAction::Sleep => "sleep",
            ReliefAction::Eat => "eat",
            ReliefAction::Drink => "drink",
            ReliefAction::Shower => "shower",
            ReliefAction::Relax => "relax",
            ReliefAction::Intimacy => "intimacy",
        }
    }

    /// Resolve an action name such as `toilet_flush`.
    pub fn from_action_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| matches_prefix(name, action.prefix()))
    }

    /// The action that relieves a given need.
    pub fn for_need(need: Need) -> Self {
        match need {
            Need::Bladder | Need::Bowel => ReliefAction::Toilet,
            Need::Energy => ReliefAction::Sleep,
            Need::Hunger => ReliefAction::Eat,
            Need::Thirst => ReliefAction::Drink,
            Need::Hygiene => ReliefAction::Shower,
            Need::Stress => ReliefAction::Relax,
            Need::Arousal | Need::Libido => ReliefAction::Intimacy,
        }
    }

    /// Apply the relief. Returns false when the action doesn't exist under
    /// the current modules (intimacy without eros).
    pub fn apply(&self, needs: &mut NeedsVector, modules: &ModuleSet) -> bool {
        match self {
            ReliefAction::Toilet => {
                needs.set(Need::Bladder, 0.0);
                needs.set(Need::Bowel, 0.0);
            }
            ReliefAction::Sleep => {
                needs.set(Need::Energy, 100.0);
                needs.set(Need::Stress, (needs.stress - 30.0).max(0.0));
            }
            ReliefAction::Eat => needs.set(Need::Hunger, 0.0),
            ReliefAction::Drink => needs.set(Need::Thirst, 0.0),
            ReliefAction::Shower => needs.set(Need::Hygiene, 0.0),
            ReliefAction::Relax => needs.set(Need::Stress, (needs.stress - 20.0).max(0.0)),
            ReliefAction::Intimacy => {
                if !modules.eros {
                    return false;
                }
                needs.set(Need::Arousal, 0.0);
                needs.set(Need::Libido, (needs.libido - 40.0).max(0.0));
            }
        }
        true
    }
}

/// `name` equals `prefix`, or starts with it followed by a separator.
pub fn matches_prefix(name: &str, prefix: &str) -> bool {
    let name = name.trim().to_ascii_lowercase();
    match name.strip_prefix(prefix) {
        Some("") => true,
        Some(rest) => rest.starts_with(|c: char| !c.is_ascii_alphanumeric()),
        None => false,
    }
}
