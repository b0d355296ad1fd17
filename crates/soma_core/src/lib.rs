//! # Soma Core
//!
//! Shared vocabulary for the needs engine: the need vector, module flags,
//! configuration, the clock, read-only world inputs and the persistence
//! contract every other crate talks through.

pub mod clock;
pub mod config;
pub mod modules;
pub mod needs;
pub mod state;
pub mod store;
pub mod world;

pub use clock::{hours_between, Clock, ManualClock, SystemClock};
pub use config::{CycleProfile, DecayRates, SomaConfig};
pub use modules::ModuleSet;
pub use needs::{Need, NeedsVector};
pub use state::{PersonaRecord, MIN_TICK_HOURS};
pub use store::{
    load_record, store_record, Loaded, RecordGuard, RecordKeys, StateStore, StoreError,
};
pub use world::{Bond, FinanceState, SocialState};
