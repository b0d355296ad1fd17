//! Deliberation over the body: what matters most right now, and whether an
//! action may go ahead.

pub mod reflex;
pub mod urgency;

pub use reflex::{is_exempt, GateDecision, ReflexGate};
pub use urgency::{
    aggregate, current_priority, score_finance, score_needs, score_social, UrgencyAggregator,
    UrgencyEntry, UrgencyInputs, UrgencyScorer,
};
