//! Narration: how the body feels, put into words.

mod age;
pub mod sensations;
mod sensory;

pub use age::age_sensation;
pub use sensations::{bodily_sensations, sensation};
pub use sensory::{
    compose, Section, SensoryContext, SensoryInputs, DREAM_BANNER, SELF_DEVELOPMENT,
};
