//! Sensory context composer.
//!
//! Turns the body state plus a few outside narration strings into one block of
//! text, injected before each interaction. Sections always appear in
//! [`Section::ORDER`]; a section without data is left out entirely.

use crate::age::age_sensation;
use crate::sensations::bodily_sensations;
use serde::Serialize;
use soma_core::config::DEFAULT_GROWTH_LIMIT;
use soma_core::{CycleProfile, ModuleSet, NeedsVector};
use soma_limbic::{CycleState, LifecycleState, Phase};
use soma_reasoning::UrgencyEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    SocialContact,
    Identity,
    Mood,
    Desire,
    BodilyPerception,
    StateOfBeing,
    CycleDirective,
    DreamBanner,
    HobbySuggestion,
    GrowthTail,
    SelfDevelopment,
}

impl Section {
    pub const ORDER: [Section; 11] = [
        Section::SocialContact,
        Section::Identity,
        Section::Mood,
        Section::Desire,
        Section::BodilyPerception,
        Section::StateOfBeing,
        Section::CycleDirective,
        Section::DreamBanner,
        Section::HobbySuggestion,
        Section::GrowthTail,
        Section::SelfDevelopment,
    ];
}

pub const DREAM_BANNER: &str =
    "[Dreaming] You are asleep and dreaming. Thoughts drift loosely; nothing here is quite real.";
pub const SELF_DEVELOPMENT: &str =
    "Keep growing: notice what you learn about yourself today and hold on to it.";

/// Everything the composer reads. Text fields are supplied by outside
/// collaborators; `None` or blank text drops the section.
#[derive(Debug, Clone)]
pub struct SensoryInputs<'a> {
    pub modules: ModuleSet,
    pub needs: &'a NeedsVector,
    pub cycle: Option<&'a CycleState>,
    pub cycle_profile: Option<&'a CycleProfile>,
    pub lifecycle: Option<&'a LifecycleState>,
    pub priority: Option<&'a UrgencyEntry>,
    pub social_event: Option<&'a str>,
    pub identity: Option<&'a str>,
    pub mood: Option<&'a str>,
    pub desire: Option<&'a str>,
    pub dreaming: bool,
    pub idle: bool,
    pub hobby: Option<&'a str>,
    pub growth: &'a [String],
    pub growth_limit: usize,
}

impl<'a> SensoryInputs<'a> {
    /// Body only, every optional input absent.
    pub fn new(modules: ModuleSet, needs: &'a NeedsVector) -> Self {
        Self {
            modules,
            needs,
            cycle: None,
            cycle_profile: None,
            lifecycle: None,
            priority: None,
            social_event: None,
            identity: None,
            mood: None,
            desire: None,
            dreaming: false,
            idle: false,
            hobby: None,
            growth: &[],
            growth_limit: DEFAULT_GROWTH_LIMIT,
        }
    }
}

/// The composed fragments, in section order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensoryContext {
    pub sections: Vec<(Section, String)>,
}

impl SensoryContext {
    pub fn get(&self, section: Section) -> Option<&str> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, text)| text.as_str())
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn present(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

fn directive_for<'p>(profile: &'p CycleProfile, phase: Phase) -> Option<&'p str> {
    let directive = match phase {
        Phase::Menstruation => &profile.menstruation,
        Phase::Follicular => &profile.follicular,
        Phase::Ovulation => &profile.ovulation,
        Phase::Luteal => &profile.luteal,
    };
    present(directive.as_deref())
}

fn render_section(section: Section, inputs: &SensoryInputs<'_>) -> Option<String> {
    match section {
        Section::SocialContact => present(inputs.social_event).map(str::to_string),
        Section::Identity => present(inputs.identity).map(str::to_string),
        Section::Mood => present(inputs.mood).map(|m| format!("Mood: {}", m)),
        Section::Desire => {
            if !inputs.modules.eros {
                return None;
            }
            present(inputs.desire).map(|d| format!("Desire: {}", d))
        }
        Section::BodilyPerception => {
            let mut lines: Vec<&str> = Vec::new();
            if let Some(lifecycle) = inputs.lifecycle {
                lines.extend(age_sensation(lifecycle.life_stage, lifecycle.age_years()));
            }
            lines.extend(bodily_sensations(inputs.needs, &inputs.modules));
            if lines.is_empty() {
                return None;
            }
            let body: Vec<String> = lines.iter().map(|l| format!("- {}", l)).collect();
            Some(format!("Body:\n{}", body.join("\n")))
        }
        Section::StateOfBeing => inputs.priority.map(|p| {
            format!(
                "Most pressing right now: {} ({} {}).",
                p.reason, p.dimension, p.score
            )
        }),
        Section::CycleDirective => {
            if !inputs.modules.cycle {
                return None;
            }
            let cycle = inputs.cycle?;
            let phase = soma_limbic::derive_phase(cycle.active_day());
            let directive = directive_for(inputs.cycle_profile?, phase)?;
            Some(format!(
                "Cycle: {} (day {}). {}",
                phase.as_str(),
                cycle.active_day(),
                directive
            ))
        }
        Section::DreamBanner => {
            (inputs.modules.dreams && inputs.dreaming).then(|| DREAM_BANNER.to_string())
        }
        Section::HobbySuggestion => {
            if !(inputs.modules.hobbies && inputs.idle) {
                return None;
            }
            present(inputs.hobby).map(|h| format!("With nothing else to do, you feel like: {}", h))
        }
        Section::GrowthTail => {
            let entries: Vec<&str> = inputs
                .growth
                .iter()
                .map(|g| g.trim())
                .filter(|g| !g.is_empty())
                .collect();
            let tail = &entries[entries.len().saturating_sub(inputs.growth_limit)..];
            if tail.is_empty() {
                return None;
            }
            let items: Vec<String> = tail.iter().map(|g| format!("- {}", g)).collect();
            Some(format!("Recent growth:\n{}", items.join("\n")))
        }
        Section::SelfDevelopment => Some(SELF_DEVELOPMENT.to_string()),
    }
}

/// Build the context, one fragment per section that has data.
pub fn compose(inputs: &SensoryInputs<'_>) -> SensoryContext {
    let sections: Vec<(Section, String)> = Section::ORDER
        .into_iter()
        .filter_map(|section| render_section(section, inputs).map(|text| (section, text)))
        .collect();
    tracing::debug!("Composed sensory context with {} sections", sections.len());
    SensoryContext { sections }
}
