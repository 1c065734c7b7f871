//! Site configuration: timing constants, section content, remote endpoints.
//!
//! Every field has a default matching the shipped site, so a config file only
//! needs to spell out what it overrides. [`SiteConfig::bundled`] returns the
//! full content set that ships inside the binary.

mod duration;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const BUNDLED: &str = include_str!("../site.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialise(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    pub version: u32,
    #[serde(default)]
    pub intro: IntroConfig,
    #[serde(default)]
    pub glow: GlowConfig,
    #[serde(default)]
    pub hero: HeroConfig,
    #[serde(default)]
    pub parallax: ParallaxConfig,
    #[serde(default)]
    pub nav: NavConfig,
    #[serde(default)]
    pub carousel: CarouselConfig,
    #[serde(default)]
    pub contact: ContactConfig,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default)]
    pub scenes: BTreeMap<String, SceneEntry>,
}

/// Offsets are measured from the moment the intro renderer reports ready.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IntroConfig {
    #[serde(default = "default_ready_after", with = "duration")]
    pub ready_after: Duration,
    #[serde(default = "default_glitch_after", with = "duration")]
    pub glitch_after: Duration,
    #[serde(default = "default_burst_after", with = "duration")]
    pub burst_after: Duration,
    #[serde(default = "default_done_after", with = "duration")]
    pub done_after: Duration,
    /// Upper bound on waiting for the renderer. Once it lapses the sequence
    /// proceeds as if the renderer had reported ready.
    #[serde(default = "default_readiness_timeout", with = "duration")]
    pub readiness_timeout: Duration,
    #[serde(default = "default_burst_fade", with = "duration")]
    pub burst_fade: Duration,
    #[serde(default = "default_burst_fade_delay", with = "duration")]
    pub burst_fade_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlowConfig {
    /// Share of the gradient's own anchor kept when blending toward the pointer.
    #[serde(default = "default_anchor_weight")]
    pub anchor_weight: f64,
    #[serde(default = "default_opacity_fade", with = "duration")]
    pub opacity_fade: Duration,
    #[serde(default = "default_background_fade", with = "duration")]
    pub background_fade: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HeroConfig {
    #[serde(default = "default_hero_tilt")]
    pub tilt_degrees: f32,
    #[serde(default = "default_hero_spring")]
    pub spring: SpringConfig,
    #[serde(default = "default_content_delay", with = "duration")]
    pub content_delay: Duration,
    #[serde(default = "default_settle_after", with = "duration")]
    pub settle_after: Duration,
    #[serde(default = "default_reentry_shader_delay", with = "duration")]
    pub reentry_shader_delay: Duration,
    #[serde(default = "default_content_delay", with = "duration")]
    pub reentry_content_delay: Duration,
    /// Fraction of the hero that must be visible to count as a re-entry.
    #[serde(default = "default_in_view_amount")]
    pub in_view_amount: f64,
}

/// Tilt applied to the transition and testimonial scenes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParallaxConfig {
    #[serde(default = "default_scene_tilt")]
    pub tilt_degrees: f32,
    #[serde(default = "default_scene_spring")]
    pub spring: SpringConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NavAnchor {
    pub name: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NavConfig {
    /// Fraction of the viewport height added to the scroll offset when
    /// picking the active section.
    #[serde(default = "default_lookahead")]
    pub lookahead: f64,
    #[serde(default = "default_scrolled_threshold")]
    pub scrolled_threshold: f64,
    #[serde(default = "default_anchors")]
    pub anchors: Vec<NavAnchor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CarouselConfig {
    #[serde(default = "default_carousel_interval", with = "duration")]
    pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContactConfig {
    #[serde(default = "default_contact_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default = "default_contact_subject")]
    pub subject: String,
    #[serde(default = "default_contact_reset", with = "duration")]
    pub reset_after: Duration,
    #[serde(default = "default_contact_timeout", with = "duration")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExperienceEntry {
    pub role: String,
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub summary: String,
    /// Hex colour used for the card border and timeline dot when focused.
    #[serde(default)]
    pub accent: String,
    #[serde(default)]
    pub stack: Vec<String>,
    /// Gradient layers in CSS `radial-gradient(...)` notation, topmost first.
    #[serde(default)]
    pub glow: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Testimonial {
    pub quote: String,
    pub name: String,
    pub role: String,
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneEntry {
    pub url: String,
}

impl SiteConfig {
    /// Content set compiled into the binary.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUNDLED)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn scene_url(&self, id: &str) -> Option<&str> {
        self.scenes.get(id).map(|entry| entry.url.as_str())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }

        let intro = &self.intro;
        let offsets = [
            ("ready_after", intro.ready_after),
            ("glitch_after", intro.glitch_after),
            ("burst_after", intro.burst_after),
            ("done_after", intro.done_after),
        ];
        for pair in offsets.windows(2) {
            let (prev_name, prev) = pair[0];
            let (name, value) = pair[1];
            if value <= prev {
                return Err(ConfigError::Invalid(format!(
                    "intro.{name} must be later than intro.{prev_name}"
                )));
            }
        }
        if intro.readiness_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "intro.readiness_timeout must be greater than zero".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.glow.anchor_weight) {
            return Err(ConfigError::Invalid(format!(
                "glow.anchor_weight {} must be within [0, 1]",
                self.glow.anchor_weight
            )));
        }

        validate_spring("hero.spring", self.hero.spring)?;
        validate_spring("parallax.spring", self.parallax.spring)?;
        for (name, tilt) in [
            ("hero.tilt_degrees", self.hero.tilt_degrees),
            ("parallax.tilt_degrees", self.parallax.tilt_degrees),
        ] {
            if !tilt.is_finite() || tilt < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if !(self.hero.in_view_amount > 0.0 && self.hero.in_view_amount <= 1.0) {
            return Err(ConfigError::Invalid(
                "hero.in_view_amount must be within (0, 1]".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.nav.lookahead) {
            return Err(ConfigError::Invalid(
                "nav.lookahead must be within [0, 1]".into(),
            ));
        }
        if self.nav.anchors.is_empty() {
            return Err(ConfigError::Invalid(
                "nav.anchors must contain at least one entry".into(),
            ));
        }
        let mut seen = HashSet::new();
        for anchor in &self.nav.anchors {
            if !seen.insert(anchor.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "nav anchor '{}' is listed twice",
                    anchor.name
                )));
            }
            if !anchor.target.starts_with('#') {
                return Err(ConfigError::Invalid(format!(
                    "nav anchor '{}' target '{}' must start with '#'",
                    anchor.name, anchor.target
                )));
            }
        }

        if self.carousel.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "carousel.interval must be greater than zero".into(),
            ));
        }

        validate_url("contact.endpoint", &self.contact.endpoint)?;

        for (index, entry) in self.experience.iter().enumerate() {
            if entry.role.trim().is_empty() || entry.company.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "experience[{index}] requires role and company"
                )));
            }
            if let Some(url) = &entry.url {
                validate_url(&format!("experience[{index}].url"), url)?;
            }
        }

        for (id, scene) in &self.scenes {
            validate_url(&format!("scenes.{id}.url"), &scene.url)?;
        }

        Ok(())
    }
}

fn validate_spring(name: &str, spring: SpringConfig) -> Result<(), ConfigError> {
    if !(spring.stiffness.is_finite() && spring.stiffness > 0.0) {
        return Err(ConfigError::Invalid(format!(
            "{name}.stiffness must be greater than zero"
        )));
    }
    if !(spring.damping.is_finite() && spring.damping >= 0.0) {
        return Err(ConfigError::Invalid(format!(
            "{name}.damping must be non-negative"
        )));
    }
    Ok(())
}

fn validate_url(name: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} '{url}' must be an http(s) URL"
        )))
    }
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            ready_after: default_ready_after(),
            glitch_after: default_glitch_after(),
            burst_after: default_burst_after(),
            done_after: default_done_after(),
            readiness_timeout: default_readiness_timeout(),
            burst_fade: default_burst_fade(),
            burst_fade_delay: default_burst_fade_delay(),
        }
    }
}

impl Default for GlowConfig {
    fn default() -> Self {
        Self {
            anchor_weight: default_anchor_weight(),
            opacity_fade: default_opacity_fade(),
            background_fade: default_background_fade(),
        }
    }
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            tilt_degrees: default_hero_tilt(),
            spring: default_hero_spring(),
            content_delay: default_content_delay(),
            settle_after: default_settle_after(),
            reentry_shader_delay: default_reentry_shader_delay(),
            reentry_content_delay: default_content_delay(),
            in_view_amount: default_in_view_amount(),
        }
    }
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            tilt_degrees: default_scene_tilt(),
            spring: default_scene_spring(),
        }
    }
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            lookahead: default_lookahead(),
            scrolled_threshold: default_scrolled_threshold(),
            anchors: default_anchors(),
        }
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            interval: default_carousel_interval(),
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            endpoint: default_contact_endpoint(),
            access_key: String::new(),
            subject: default_contact_subject(),
            reset_after: default_contact_reset(),
            request_timeout: default_contact_timeout(),
        }
    }
}

fn default_ready_after() -> Duration {
    Duration::from_millis(200)
}

fn default_glitch_after() -> Duration {
    Duration::from_millis(600)
}

fn default_burst_after() -> Duration {
    Duration::from_millis(1000)
}

fn default_done_after() -> Duration {
    Duration::from_millis(1800)
}

fn default_readiness_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_burst_fade() -> Duration {
    Duration::from_millis(600)
}

fn default_burst_fade_delay() -> Duration {
    Duration::from_millis(150)
}

fn default_anchor_weight() -> f64 {
    0.3
}

fn default_opacity_fade() -> Duration {
    Duration::from_secs(1)
}

fn default_background_fade() -> Duration {
    Duration::from_millis(1200)
}

fn default_hero_tilt() -> f32 {
    15.0
}

fn default_hero_spring() -> SpringConfig {
    SpringConfig {
        stiffness: 100.0,
        damping: 20.0,
    }
}

fn default_scene_tilt() -> f32 {
    10.0
}

fn default_scene_spring() -> SpringConfig {
    SpringConfig {
        stiffness: 40.0,
        damping: 20.0,
    }
}

fn default_content_delay() -> Duration {
    Duration::from_millis(150)
}

fn default_settle_after() -> Duration {
    Duration::from_millis(1500)
}

fn default_reentry_shader_delay() -> Duration {
    Duration::from_millis(30)
}

fn default_in_view_amount() -> f64 {
    0.4
}

fn default_lookahead() -> f64 {
    0.35
}

fn default_scrolled_threshold() -> f64 {
    50.0
}

fn default_anchors() -> Vec<NavAnchor> {
    [
        ("Home", "#hero"),
        ("Experience", "#experience"),
        ("Testimonials", "#testimonials"),
        ("Contact", "#contact"),
    ]
    .into_iter()
    .map(|(name, target)| NavAnchor {
        name: name.to_string(),
        target: target.to_string(),
    })
    .collect()
}

fn default_carousel_interval() -> Duration {
    Duration::from_secs(6)
}

fn default_contact_endpoint() -> String {
    "https://api.web3forms.com/submit".to_string()
}

fn default_contact_subject() -> String {
    "New message from portfolio".to_string()
}

fn default_contact_reset() -> Duration {
    Duration::from_secs(4)
}

fn default_contact_timeout() -> Duration {
    Duration::from_secs(15)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[intro]
ready_after = "250ms"
glitch_after = 0.7
burst_after = "1.1s"
done_after = 2
readiness_timeout = "5s"

[glow]
anchor_weight = 0.5

[nav]
lookahead = 0.4
anchors = [
  { name = "Home", target = "#hero" },
  { name = "Contact", target = "#contact" },
]

[carousel]
interval = "3s"

[[experience]]
role = "Engineer"
company = "Acme"
glow = ["radial-gradient(ellipse 80% 60% at 30% 40%, rgba(255, 0, 0, 0.2), transparent 70%)"]

[scenes.transition]
url = "https://example.com/scene.splinecode"
"##;

    #[test]
    fn parse_sample_config() {
        let config = SiteConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.intro.ready_after, Duration::from_millis(250));
        assert_eq!(config.intro.glitch_after, Duration::from_millis(700));
        assert_eq!(config.intro.burst_after, Duration::from_millis(1100));
        assert_eq!(config.intro.done_after, Duration::from_secs(2));
        assert_eq!(config.intro.readiness_timeout, Duration::from_secs(5));
        assert_eq!(config.glow.anchor_weight, 0.5);
        assert_eq!(config.glow.opacity_fade, Duration::from_secs(1));
        assert_eq!(config.nav.anchors.len(), 2);
        assert_eq!(config.nav.anchors[1].target, "#contact");
        assert_eq!(config.carousel.interval, Duration::from_secs(3));
        assert_eq!(config.experience[0].glow.len(), 1);
        assert_eq!(
            config.scene_url("transition"),
            Some("https://example.com/scene.splinecode")
        );
        assert_eq!(config.scene_url("missing"), None);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = SiteConfig::from_toml_str("version = 1").unwrap();
        assert_eq!(config.intro, IntroConfig::default());
        assert_eq!(config.intro.done_after, Duration::from_millis(1800));
        assert_eq!(config.hero.spring.stiffness, 100.0);
        assert_eq!(config.parallax.spring.stiffness, 40.0);
        assert_eq!(config.parallax.tilt_degrees, 10.0);
        assert_eq!(config.nav.anchors.len(), 4);
        assert_eq!(config.contact.reset_after, Duration::from_secs(4));
        assert!(config.experience.is_empty());
    }

    #[test]
    fn bundled_config_is_valid() {
        let config = SiteConfig::bundled().unwrap();
        assert_eq!(config.testimonials.len(), 5);
        assert!(config.experience.len() >= 4);
        assert!(config.experience.iter().all(|entry| !entry.glow.is_empty()));
        assert!(config.scene_url("transition").is_some());
        assert!(config.scene_url("testimonials").is_some());
    }

    #[test]
    fn reject_unsupported_version() {
        let err = SiteConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("version")));
    }

    #[test]
    fn reject_out_of_order_intro_offsets() {
        let input = r#"
version = 1
[intro]
glitch_after = "1.5s"
"#;
        let err = SiteConfig::from_toml_str(input).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("burst_after")));
    }

    #[test]
    fn reject_negative_duration() {
        let input = r#"
version = 1
[carousel]
interval = -1
"#;
        assert!(matches!(
            SiteConfig::from_toml_str(input),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn reject_duplicate_anchor() {
        let input = r##"
version = 1
[nav]
anchors = [
  { name = "Home", target = "#hero" },
  { name = "Home", target = "#contact" },
]
"##;
        let err = SiteConfig::from_toml_str(input).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("twice")));
    }

    #[test]
    fn reject_non_http_scene() {
        let input = r#"
version = 1
[scenes.hero]
url = "ftp://example.com/scene"
"#;
        assert!(matches!(
            SiteConfig::from_toml_str(input),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = SiteConfig::bundled().unwrap();
        let text = config.to_toml_string().unwrap();
        let reparsed = SiteConfig::from_toml_str(&text).unwrap();
        assert_eq!(reparsed.intro, config.intro);
        assert_eq!(reparsed.testimonials, config.testimonials);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SiteConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        fs::write(&path, SAMPLE).unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.nav.lookahead, 0.4);
    }
}
