//! # Soma Limbic
//!
//! The body of a persona, advanced by elapsed real time:
//!
//! - **Decay**: needs drift toward their unsatisfied extreme, hour by hour
//! - **Cycle**: a 28-day hormonal cycle with per-phase need modifiers
//! - **Lifecycle**: biological age and the stage-dependent decay multipliers
//! - **Relief**: named actions that reset needs
//!
//! ## Time Scales
//!
//! - Seconds: decay is a no-op below 18 s
//! - Hours: the cycle may advance once 20 h have passed
//! - Days: aging and cycle days move in whole 24 h steps
//!
//! [`BodySystem`] ties these together for one persona over a
//! [`soma_core::StateStore`].

pub mod cycle;
pub mod decay;
pub mod lifecycle;
pub mod relief;
mod system;

pub use cycle::{derive_hormones, derive_phase, phase_modifiers, CycleState, Hormones, Phase};
pub use decay::NeedDynamics;
pub use lifecycle::{
    derive_stage, stage_multipliers, LifeStage, LifeStageMultipliers, LifecycleState,
};
pub use relief::ReliefAction;
pub use system::{BodySnapshot, BodySystem, Relief, TickReport};
