use serde::Deserialize;

/// Optional subsystems a persona can switch on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModuleSet {
    /// Arousal/libido needs, desire narration, intimacy relief.
    pub eros: bool,
    /// 28-day hormonal cycle.
    pub cycle: bool,
    /// Dream-mode banner.
    pub dreams: bool,
    /// Idle hobby suggestions.
    pub hobbies: bool,
}

impl ModuleSet {
    /// Parse a comma separated list such as `"eros, cycle"`.
    /// Unknown names are ignored with a debug log.
    pub fn from_list(list: &str) -> Self {
        let mut modules = Self::default();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "eros" => modules.eros = true,
                "cycle" => modules.cycle = true,
                "dreams" => modules.dreams = true,
                "hobbies" => modules.hobbies = true,
                other => tracing::debug!("Ignoring unknown module '{}'", other),
            }
        }
        modules
    }
}
