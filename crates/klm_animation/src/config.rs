//! Motion configuration
//!
//! Every timing constant of the landing page lives here so a host can tune
//! the motion from a `motion.toml` without recompiling. All fields default to
//! the shipped values, so an empty file (or no file) is a valid config:
//!
//! ```toml
//! [counter]
//! duration_ms = 1500.0
//!
//! [sections.steps]
//! stagger_ms = 150.0
//! ```

use crate::ambient::{DriftMotion, OrbitMotion};
use crate::enter::EnterTransition;
use crate::press::PressConfig;
use crate::spring::SpringConfig;
use crate::stagger::StaggerConfig;
use klm_core::{Millis, MotionError, Result, Threshold};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// =============================================================================
// Top level
// =============================================================================

/// Landing page motion settings
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MotionConfig {
    pub header: HeaderSettings,
    pub hero: HeroSettings,
    pub counter: CounterSettings,
    pub sections: SectionsSettings,
    pub ambient: AmbientSettings,
    pub press: PressSettings,
}

impl MotionConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: MotionConfig =
            toml::from_str(source).map_err(|e| MotionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!("MotionConfig: loaded {}", path.display());
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MotionError::Config(e.to_string()))
    }

    /// Reject values no animation can run with
    pub fn validate(&self) -> Result<()> {
        Threshold::new(self.counter.threshold)?;
        Threshold::new(self.sections.threshold)?;

        check_duration("header.duration_ms", self.header.duration_ms)?;
        check_duration("hero.duration_ms", self.hero.duration_ms)?;
        check_non_negative("hero.base_delay_ms", self.hero.base_delay_ms)?;
        check_non_negative("hero.step_ms", self.hero.step_ms)?;
        check_duration("counter.duration_ms", self.counter.duration_ms)?;
        check_duration("sections.duration_ms", self.sections.duration_ms)?;

        for (name, section) in [
            ("categories", &self.sections.categories),
            ("steps", &self.sections.steps),
            ("benefits", &self.sections.benefits),
        ] {
            check_non_negative(&format!("sections.{name}.stagger_ms"), section.stagger_ms)?;
        }

        for (i, dot) in self.ambient.dots.iter().enumerate() {
            check_duration(&format!("ambient.dots[{i}].period_ms"), dot.period_ms)?;
        }
        check_duration("ambient.logo_period_ms", self.ambient.logo_period_ms)?;
        for (i, orbit) in self.ambient.orbits.iter().enumerate() {
            check_duration(&format!("ambient.orbits[{i}].period_ms"), orbit.period_ms)?;
        }

        if !(self.press.stiffness > 0.0 && self.press.mass > 0.0 && self.press.damping >= 0.0) {
            return Err(MotionError::Config(
                "press spring needs positive stiffness and mass".to_string(),
            ));
        }
        let press = &self.press;
        for (name, value) in [
            ("hover_scale", press.hover_scale),
            ("tap_scale", press.tap_scale),
            ("nav_hover_scale", press.nav_hover_scale),
            ("card_lift", press.card_lift),
        ] {
            if !value.is_finite() {
                return Err(MotionError::Config(format!(
                    "press.{name} must be finite, got {value}"
                )));
            }
        }

        Ok(())
    }
}

fn check_duration(field: &str, value: Millis) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MotionError::Config(format!("{field} must be positive, got {value}")))
    }
}

fn check_non_negative(field: &str, value: Millis) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MotionError::Config(format!("{field} must not be negative, got {value}")))
    }
}

// =============================================================================
// Mount-time reveals
// =============================================================================

/// Header slide-down on mount
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderSettings {
    pub distance: f64,
    pub duration_ms: Millis,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            distance: 100.0,
            duration_ms: EnterTransition::DEFAULT_DURATION_MS,
        }
    }
}

impl HeaderSettings {
    pub fn transition(&self) -> EnterTransition {
        EnterTransition::slide_down(self.distance).duration(self.duration_ms)
    }
}

/// Hero sequence played on mount
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeroSettings {
    pub base_delay_ms: Millis,
    pub step_ms: Millis,
    pub distance: f64,
    pub duration_ms: Millis,
}

impl Default for HeroSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: 200.0,
            step_ms: 200.0,
            distance: 20.0,
            duration_ms: EnterTransition::DEFAULT_DURATION_MS,
        }
    }
}

impl HeroSettings {
    pub fn stagger(&self) -> StaggerConfig {
        StaggerConfig::new(self.step_ms).base_delay(self.base_delay_ms)
    }

    pub fn transition(&self) -> EnterTransition {
        EnterTransition::fade_in_up(self.distance).duration(self.duration_ms)
    }
}

// =============================================================================
// Counters
// =============================================================================

/// Statistic counters
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CounterSettings {
    pub duration_ms: Millis,
    pub threshold: f64,
    pub stats: Vec<StatSettings>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StatSettings {
    pub target: f64,
    #[serde(default)]
    pub suffix: String,
}

impl StatSettings {
    pub fn new(target: f64, suffix: &str) -> Self {
        Self {
            target,
            suffix: suffix.to_string(),
        }
    }
}

impl Default for CounterSettings {
    fn default() -> Self {
        Self {
            duration_ms: 2000.0,
            threshold: Threshold::DEFAULT.value(),
            stats: vec![
                StatSettings::new(100.0, "h/mês"),
                StatSettings::new(80.0, "%"),
                StatSettings::new(400.0, "+"),
            ],
        }
    }
}

// =============================================================================
// Viewport-revealed sections
// =============================================================================

/// Which side a revealed item slides in from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideFrom {
    #[default]
    Below,
    Left,
    Right,
    None,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SectionMotion {
    pub stagger_ms: Millis,
    pub distance: f64,
    pub from: SlideFrom,
}

impl Default for SectionMotion {
    fn default() -> Self {
        Self {
            stagger_ms: 100.0,
            distance: 50.0,
            from: SlideFrom::Below,
        }
    }
}

impl SectionMotion {
    pub fn stagger(&self) -> StaggerConfig {
        StaggerConfig::new(self.stagger_ms)
    }

    pub fn transition(&self, duration_ms: Millis) -> EnterTransition {
        let transition = match self.from {
            SlideFrom::Below => EnterTransition::fade_in_up(self.distance),
            SlideFrom::Left => EnterTransition::fade_in_left(self.distance),
            SlideFrom::Right => EnterTransition::fade_in_right(self.distance),
            SlideFrom::None => EnterTransition::fade_in(),
        };
        transition.duration(duration_ms)
    }
}

/// Section groups revealed once on scroll
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SectionsSettings {
    pub duration_ms: Millis,
    pub threshold: f64,
    pub categories: SectionMotion,
    pub steps: SectionMotion,
    pub benefits: SectionMotion,
}

impl Default for SectionsSettings {
    fn default() -> Self {
        Self {
            duration_ms: EnterTransition::DEFAULT_DURATION_MS,
            threshold: Threshold::DEFAULT.value(),
            categories: SectionMotion::default(),
            steps: SectionMotion {
                stagger_ms: 200.0,
                ..SectionMotion::default()
            },
            benefits: SectionMotion {
                stagger_ms: 100.0,
                distance: 20.0,
                from: SlideFrom::Left,
            },
        }
    }
}

impl SectionsSettings {
    /// Look a section up by its layout name
    pub fn get(&self, name: &str) -> Option<&SectionMotion> {
        match name {
            "categories" => Some(&self.categories),
            "steps" => Some(&self.steps),
            "benefits" => Some(&self.benefits),
            _ => None,
        }
    }
}

// =============================================================================
// Ambient motion
// =============================================================================

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DotSettings {
    pub period_ms: Millis,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub phase_offset_ms: Millis,
}

impl DotSettings {
    pub fn motion(&self) -> DriftMotion {
        DriftMotion::float(self.period_ms, self.x, self.y, self.phase_offset_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct OrbitSettings {
    pub radius: f64,
    pub period_ms: Millis,
    pub slots: usize,
    #[serde(default)]
    pub reverse: bool,
}

impl OrbitSettings {
    pub fn motion(&self) -> OrbitMotion {
        OrbitMotion::new(self.radius, self.period_ms, self.slots).reverse(self.reverse)
    }
}

/// Decorative loops that run for the lifetime of the page
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AmbientSettings {
    pub logo_period_ms: Millis,
    pub logo_amplitude: f64,
    pub dots: Vec<DotSettings>,
    pub orbits: Vec<OrbitSettings>,
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self {
            logo_period_ms: 3000.0,
            logo_amplitude: -10.0,
            dots: vec![
                DotSettings {
                    period_ms: 4000.0,
                    x: 10.0,
                    y: -20.0,
                    phase_offset_ms: 0.0,
                },
                DotSettings {
                    period_ms: 5000.0,
                    x: -15.0,
                    y: 15.0,
                    phase_offset_ms: 1000.0,
                },
                DotSettings {
                    period_ms: 6000.0,
                    x: 20.0,
                    y: -25.0,
                    phase_offset_ms: 2000.0,
                },
            ],
            orbits: vec![
                OrbitSettings {
                    radius: 80.0,
                    period_ms: 20_000.0,
                    slots: 2,
                    reverse: false,
                },
                OrbitSettings {
                    radius: 140.0,
                    period_ms: 30_000.0,
                    slots: 3,
                    reverse: true,
                },
            ],
        }
    }
}

impl AmbientSettings {
    pub fn logo_motion(&self) -> DriftMotion {
        DriftMotion::bob(self.logo_period_ms, self.logo_amplitude)
    }
}

// =============================================================================
// Press feedback
// =============================================================================

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PressSettings {
    pub hover_scale: f64,
    pub tap_scale: f64,
    /// Hover scale for header navigation links
    pub nav_hover_scale: f64,
    /// Hover offset for cards, negative lifts
    pub card_lift: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl Default for PressSettings {
    fn default() -> Self {
        let spring = SpringConfig::press();
        Self {
            hover_scale: 1.05,
            tap_scale: 0.95,
            nav_hover_scale: 1.1,
            card_lift: -10.0,
            stiffness: spring.stiffness,
            damping: spring.damping,
            mass: spring.mass,
        }
    }
}

impl PressSettings {
    fn spring(&self) -> SpringConfig {
        SpringConfig::new(self.stiffness, self.damping, self.mass)
    }

    pub fn press_config(&self) -> PressConfig {
        PressConfig {
            hover_scale: self.hover_scale,
            tap_scale: self.tap_scale,
            hover_lift: 0.0,
            spring: self.spring(),
        }
    }

    pub fn nav_config(&self) -> PressConfig {
        PressConfig {
            hover_scale: self.nav_hover_scale,
            tap_scale: self.nav_hover_scale,
            hover_lift: 0.0,
            spring: self.spring(),
        }
    }

    pub fn card_config(&self) -> PressConfig {
        PressConfig {
            hover_scale: 1.0,
            tap_scale: 1.0,
            hover_lift: self.card_lift,
            spring: self.spring(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = MotionConfig::from_toml_str("").unwrap();
        assert_eq!(config, MotionConfig::default());
        assert_eq!(config.counter.stats.len(), 3);
        assert_eq!(config.counter.stats[0].suffix, "h/mês");
        assert_eq!(config.sections.steps.stagger_ms, 200.0);
        assert_eq!(config.sections.benefits.from, SlideFrom::Left);
    }

    #[test]
    fn test_partial_override() {
        let config = MotionConfig::from_toml_str(
            r#"
            [counter]
            duration_ms = 1500.0

            [sections.categories]
            stagger_ms = 50.0
            from = "right"
            "#,
        )
        .unwrap();

        assert_eq!(config.counter.duration_ms, 1500.0);
        assert_eq!(config.counter.threshold, 0.1);
        assert_eq!(config.sections.categories.stagger_ms, 50.0);
        assert_eq!(config.sections.categories.from, SlideFrom::Right);
        assert_eq!(config.sections.categories.distance, 50.0);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = MotionConfig::from_toml_str("[counter]\nthreshold = 0.0\n").unwrap_err();
        assert!(matches!(err, MotionError::InvalidThreshold(_)));
    }

    #[test]
    fn test_rejects_negative_stagger() {
        let err = MotionConfig::from_toml_str("[sections.steps]\nstagger_ms = -5.0\n").unwrap_err();
        assert!(matches!(err, MotionError::Config(msg) if msg.contains("sections.steps")));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = MotionConfig::from_toml_str("[counter\n").unwrap_err();
        assert!(matches!(err, MotionError::Config(_)));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = MotionConfig::load("/nonexistent/motion.toml").unwrap_err();
        assert!(matches!(err, MotionError::Io(_)));
    }

    #[test]
    fn test_serialized_config_reloads() {
        let mut config = MotionConfig::default();
        config.ambient.orbits.pop();
        let text = config.to_toml_string().unwrap();
        assert_eq!(MotionConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_press_presets_follow_settings() {
        let config = MotionConfig::default();
        assert_eq!(config.press.press_config(), PressConfig::button());
        assert_eq!(config.press.nav_config(), PressConfig::nav_link());
        assert_eq!(config.press.card_config(), PressConfig::card());

        let config = MotionConfig::from_toml_str("[press]\ncard_lift = -4.0\n").unwrap();
        assert_eq!(config.press.card_config().hover_lift, -4.0);
    }

    #[test]
    fn test_rejects_infinite_card_lift() {
        let err = MotionConfig::from_toml_str("[press]\ncard_lift = -inf\n").unwrap_err();
        assert!(matches!(err, MotionError::Config(msg) if msg.contains("press.card_lift")));
    }
}
