use crate::modules::ModuleSet;
use crate::needs::Need;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// The hormone tables are fixed-size; any other length is corrected to this.
pub const CYCLE_LENGTH: u32 = 28;
pub const DEFAULT_REFLEX_THRESHOLD: u8 = 95;
pub const DEFAULT_GROWTH_LIMIT: usize = 5;
/// 25 years, used when neither a birth date nor an initial age is configured.
pub const DEFAULT_INITIAL_AGE_DAYS: u32 = 9125;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SomaConfig {
    pub modules: ModuleSet,
    pub needs: NeedsConfig,
    pub reflex: ReflexConfig,
    pub lifecycle: LifecycleConfig,
    pub cycle: CycleConfig,
    pub context: ContextConfig,
    pub storage: StorageConfig,
}

impl SomaConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: SomaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        config.sanitize();
        Ok(config)
    }

    /// Try to load from path; if the file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg.sanitize();
                cfg
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SOMA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SOMA_PERSONA") {
            self.storage.persona = v;
        }
        if let Ok(v) = std::env::var("SOMA_REFLEX_THRESHOLD") {
            if let Ok(n) = v.parse() {
                self.reflex.threshold = n;
            }
        }
        if let Ok(v) = std::env::var("SOMA_MODULES") {
            self.modules = ModuleSet::from_list(&v);
        }
    }

    /// Silently correct inconsistent values instead of rejecting the config.
    pub fn sanitize(&mut self) {
        if self.cycle.length != CYCLE_LENGTH {
            tracing::debug!(
                "Cycle length {} is not supported, forcing {}",
                self.cycle.length,
                CYCLE_LENGTH
            );
            self.cycle.length = CYCLE_LENGTH;
        }
        if !(1..=100).contains(&self.reflex.threshold) {
            tracing::debug!(
                "Reflex threshold {} out of range, using {}",
                self.reflex.threshold,
                DEFAULT_REFLEX_THRESHOLD
            );
            self.reflex.threshold = DEFAULT_REFLEX_THRESHOLD;
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    pub rates: DecayRates,
}

/// Per-need base rates in points per hour. Unset entries use the built-in table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecayRates {
    pub energy: Option<f64>,
    pub hunger: Option<f64>,
    pub thirst: Option<f64>,
    pub hygiene: Option<f64>,
    pub bladder: Option<f64>,
    pub bowel: Option<f64>,
    pub stress: Option<f64>,
    pub arousal: Option<f64>,
    pub libido: Option<f64>,
}

impl DecayRates {
    pub fn default_rate(need: Need) -> f64 {
        match need {
            Need::Energy => 4.0,
            Need::Hunger => 5.0,
            Need::Thirst => 7.0,
            Need::Hygiene => 2.5,
            Need::Bladder => 9.0,
            Need::Bowel => 3.5,
            Need::Stress => 1.5,
            Need::Arousal => 2.0,
            Need::Libido => 1.0,
        }
    }

    fn configured(&self, need: Need) -> Option<f64> {
        match need {
            Need::Energy => self.energy,
            Need::Hunger => self.hunger,
            Need::Thirst => self.thirst,
            Need::Hygiene => self.hygiene,
            Need::Bladder => self.bladder,
            Need::Bowel => self.bowel,
            Need::Stress => self.stress,
            Need::Arousal => self.arousal,
            Need::Libido => self.libido,
        }
    }

    /// Effective rate. Negative or non-finite overrides fall back to the default.
    pub fn rate(&self, need: Need) -> f64 {
        match self.configured(need) {
            Some(r) if r.is_finite() && r >= 0.0 => r,
            Some(r) => {
                tracing::debug!("Ignoring invalid {} rate {}", need, r);
                Self::default_rate(need)
            }
            None => Self::default_rate(need),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReflexConfig {
    pub threshold: u8,
}

impl Default for ReflexConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_REFLEX_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub birth_date: Option<NaiveDate>,
    pub initial_age_days: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub length: u32,
    /// Personality directive per phase. Without it the directive section is skipped.
    pub profile: Option<CycleProfile>,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            length: CYCLE_LENGTH,
            profile: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CycleProfile {
    pub menstruation: Option<String>,
    pub follicular: Option<String>,
    pub ovulation: Option<String>,
    pub luteal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// How many growth entries the context tail keeps.
    pub growth_limit: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            growth_limit: DEFAULT_GROWTH_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub persona: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("soma_data"),
            persona: "default".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = SomaConfig::default();
        assert_eq!(cfg.reflex.threshold, 95);
        assert_eq!(cfg.cycle.length, 28);
        assert_eq!(cfg.context.growth_limit, 5);
        assert!(!cfg.modules.eros);
        assert!(cfg.cycle.profile.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[modules]
cycle = true
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.modules.cycle);
        assert!(!cfg.modules.eros);
        assert_eq!(cfg.reflex.threshold, 95);
        assert_eq!(cfg.needs.rates.rate(Need::Hunger), 5.0);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[modules]
eros = true
cycle = true
dreams = true
hobbies = false

[needs.rates]
hunger = 8.5
bladder = 12.0

[reflex]
threshold = 90

[lifecycle]
birth_date = "1999-04-12"

[cycle]
length = 28

[cycle.profile]
menstruation = "Be gentle with yourself."
luteal = "Irritability runs high; pick your battles."

[context]
growth_limit = 3

[storage]
data_dir = "/tmp/soma"
persona = "ava"
"#;
        let cfg: SomaConfig = toml::from_str(toml_str).unwrap();
        assert!(cfg.modules.eros && cfg.modules.cycle && cfg.modules.dreams);
        assert_eq!(cfg.needs.rates.rate(Need::Hunger), 8.5);
        assert_eq!(cfg.needs.rates.rate(Need::Bladder), 12.0);
        assert_eq!(cfg.needs.rates.rate(Need::Thirst), 7.0);
        assert_eq!(cfg.reflex.threshold, 90);
        assert_eq!(
            cfg.lifecycle.birth_date,
            Some(NaiveDate::from_ymd_opt(1999, 4, 12).unwrap())
        );
        let profile = cfg.cycle.profile.unwrap();
        assert!(profile.menstruation.is_some());
        assert!(profile.follicular.is_none());
        assert_eq!(cfg.context.growth_limit, 3);
        assert_eq!(cfg.storage.persona, "ava");
    }

    #[test]
    fn test_sanitize_corrects_cycle_length_and_threshold() {
        let mut cfg: SomaConfig = toml::from_str(
            r#"
[cycle]
length = 31
[reflex]
threshold = 0
"#,
        )
        .unwrap();
        cfg.sanitize();
        assert_eq!(cfg.cycle.length, CYCLE_LENGTH);
        assert_eq!(cfg.reflex.threshold, DEFAULT_REFLEX_THRESHOLD);
    }

    #[test]
    fn test_invalid_rate_falls_back() {
        let rates = DecayRates {
            energy: Some(-2.0),
            stress: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(rates.rate(Need::Energy), 4.0);
        assert_eq!(rates.rate(Need::Stress), 1.5);
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        std::env::set_var("SOMA_PERSONA", "env-persona");
        std::env::set_var("SOMA_MODULES", "eros,dreams");

        let mut cfg = SomaConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.storage.persona, "env-persona");
        assert!(cfg.modules.eros && cfg.modules.dreams);
        assert!(!cfg.modules.cycle);

        std::env::remove_var("SOMA_PERSONA");
        std::env::remove_var("SOMA_MODULES");

        let cfg = SomaConfig::load_or_default("/nonexistent/soma.toml");
        assert_eq!(cfg.storage.persona, "default");
    }
}
