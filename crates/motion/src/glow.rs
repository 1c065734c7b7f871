//! Cursor-reactive radial glow.
//!
//! A [`GlowSpec`] is the declarative gradient stack bound to a hoverable entry.
//! [`GlowCompositor`] pulls each layer's centre toward the pointer, and
//! [`GlowLayer`] is the page-wide overlay that fades the result in and out.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::easing::{CubicBezier, Easing, FadeEnvelope, Tween};
use crate::listeners::ListenerRegistry;
use crate::pointer::{ConsumerId, PointerSample, PointerTracker};

pub const DEFAULT_ANCHOR_WEIGHT: f64 = 0.3;

const GLOW_CONSUMER: ConsumerId = ConsumerId("glow");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GlowParseError {
    #[error("expected radial-gradient(...), got '{0}'")]
    NotRadialGradient(String),
    #[error("gradient '{0}' has no 'at X% Y%' centre")]
    MissingCenter(String),
    #[error("invalid length '{0}'")]
    BadLength(String),
    #[error("unknown gradient shape '{0}'")]
    BadShape(String),
    #[error("invalid colour '{0}'")]
    BadColor(String),
    #[error("gradient '{0}' needs a colour stop and a closing stop with a percentage")]
    MissingStops(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientShape {
    Ellipse,
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Length {
    Percent(f64),
    Px(f64),
}

impl FromStr for Length {
    type Err = GlowParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let bad = || GlowParseError::BadLength(input.to_string());
        if let Some(value) = input.strip_suffix('%') {
            return value.parse().map(Length::Percent).map_err(|_| bad());
        }
        if let Some(value) = input.strip_suffix("px") {
            return value.parse().map(Length::Px).map_err(|_| bad());
        }
        Err(bad())
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Percent(value) => write!(f, "{value}%"),
            Length::Px(value) => write!(f, "{value}px"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };
}

impl FromStr for Rgba {
    type Err = GlowParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let bad = || GlowParseError::BadColor(trimmed.to_string());
        if trimmed == "transparent" {
            return Ok(Rgba::TRANSPARENT);
        }
        if let Some(hex) = trimmed.strip_prefix('#') {
            if hex.len() != 6 {
                return Err(bad());
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16).map_err(|_| bad())
            };
            return Ok(Rgba {
                r: channel(0..2)?,
                g: channel(2..4)?,
                b: channel(4..6)?,
                a: 1.0,
            });
        }
        let (body, expects_alpha) = if let Some(rest) = trimmed.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = trimmed.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(bad());
        };
        let body = body.strip_suffix(')').ok_or_else(bad)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != if expects_alpha { 4 } else { 3 } {
            return Err(bad());
        }
        let channel = |text: &str| text.parse::<u8>().map_err(|_| bad());
        let a = if expects_alpha {
            let alpha: f64 = parts[3].parse().map_err(|_| bad())?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(bad());
            }
            alpha
        } else {
            1.0
        };
        Ok(Rgba {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        })
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Rgba::TRANSPARENT {
            return f.write_str("transparent");
        }
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// One `radial-gradient(...)` layer: a coloured blob fading to transparent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientLayer {
    pub shape: GradientShape,
    pub size: Vec<Length>,
    /// Declared centre, in percent of the layer box.
    pub center: (f64, f64),
    pub color: Rgba,
    /// Percentage at which the gradient reaches transparent.
    pub falloff: f64,
}

impl GradientLayer {
    /// CSS for this layer with its centre replaced.
    pub fn to_css_at(&self, center: (i64, i64)) -> String {
        let mut out = String::from("radial-gradient(");
        out.push_str(match self.shape {
            GradientShape::Ellipse => "ellipse",
            GradientShape::Circle => "circle",
        });
        for length in &self.size {
            out.push(' ');
            out.push_str(&length.to_string());
        }
        out.push_str(&format!(
            " at {}% {}%, {}, transparent {}%)",
            center.0, center.1, self.color, self.falloff
        ));
        out
    }
}

impl FromStr for GradientLayer {
    type Err = GlowParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("radial-gradient(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| GlowParseError::NotRadialGradient(trimmed.to_string()))?;

        let parts = split_top_level(body);
        if parts.len() < 3 {
            return Err(GlowParseError::MissingStops(trimmed.to_string()));
        }

        let tokens: Vec<&str> = parts[0].split_whitespace().collect();
        let at = tokens
            .iter()
            .position(|token| *token == "at")
            .ok_or_else(|| GlowParseError::MissingCenter(trimmed.to_string()))?;
        let (shape, size_tokens) = match tokens.first() {
            Some(&"ellipse") => (GradientShape::Ellipse, &tokens[1..at]),
            Some(&"circle") => (GradientShape::Circle, &tokens[1..at]),
            Some(token) if at > 0 && token.parse::<Length>().is_err() => {
                return Err(GlowParseError::BadShape(token.to_string()))
            }
            _ => (GradientShape::Ellipse, &tokens[..at]),
        };
        let size = size_tokens
            .iter()
            .map(|token| token.parse::<Length>())
            .collect::<Result<Vec<_>, _>>()?;

        let position = &tokens[at + 1..];
        if position.len() != 2 {
            return Err(GlowParseError::MissingCenter(trimmed.to_string()));
        }
        let percent = |token: &str| -> Result<f64, GlowParseError> {
            match token.parse::<Length>()? {
                Length::Percent(value) => Ok(value),
                Length::Px(_) => Err(GlowParseError::BadLength(token.to_string())),
            }
        };
        let center = (percent(position[0])?, percent(position[1])?);

        let color = stop_color(parts[1])?;
        let last = parts[parts.len() - 1];
        let falloff = last
            .split_whitespace()
            .last()
            .and_then(|token| token.strip_suffix('%'))
            .and_then(|value| value.parse::<f64>().ok())
            .ok_or_else(|| GlowParseError::MissingStops(trimmed.to_string()))?;

        Ok(GradientLayer {
            shape,
            size,
            center,
            color,
            falloff,
        })
    }
}

impl fmt::Display for GradientLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let center = (self.center.0.round() as i64, self.center.1.round() as i64);
        f.write_str(&self.to_css_at(center))
    }
}

/// Colour part of a stop, ignoring any trailing position.
fn stop_color(stop: &str) -> Result<Rgba, GlowParseError> {
    let stop = stop.trim();
    match stop.rfind(')') {
        Some(end) => stop[..=end].parse(),
        None => stop
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .parse(),
    }
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(body[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts
}

/// Ordered gradient stack bound to one hoverable entry. The first layer is
/// drawn on top.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlowSpec {
    layers: Vec<GradientLayer>,
}

impl GlowSpec {
    pub fn new(layers: Vec<GradientLayer>) -> Self {
        Self { layers }
    }

    pub fn parse<S: AsRef<str>>(layers: &[S]) -> Result<Self, GlowParseError> {
        let layers = layers
            .iter()
            .map(|layer| layer.as_ref().parse())
            .collect::<Result<Vec<GradientLayer>, _>>()?;
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[GradientLayer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Round half away from zero on the positive side, matching `Math.round` for
/// the percentages that show up here.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// A gradient layer placed at a concrete centre.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLayer {
    pub layer: GradientLayer,
    pub origin: (i64, i64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Background {
    Transparent,
    Layers(Vec<PlacedLayer>),
}

impl Background {
    pub fn origins(&self) -> Vec<(i64, i64)> {
        match self {
            Background::Transparent => Vec::new(),
            Background::Layers(layers) => layers.iter().map(|placed| placed.origin).collect(),
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Transparent => f.write_str("transparent"),
            Background::Layers(layers) => {
                let css: Vec<String> = layers
                    .iter()
                    .map(|placed| placed.layer.to_css_at(placed.origin))
                    .collect();
                f.write_str(&css.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowCompositor {
    anchor_weight: f64,
}

impl Default for GlowCompositor {
    fn default() -> Self {
        Self {
            anchor_weight: DEFAULT_ANCHOR_WEIGHT,
        }
    }
}

impl GlowCompositor {
    /// `anchor_weight` is clamped into `[0, 1]`.
    pub fn new(anchor_weight: f64) -> Self {
        let anchor_weight = if anchor_weight.is_finite() {
            anchor_weight.clamp(0.0, 1.0)
        } else {
            DEFAULT_ANCHOR_WEIGHT
        };
        Self { anchor_weight }
    }

    pub fn anchor_weight(&self) -> f64 {
        self.anchor_weight
    }

    pub fn blend(&self, origin: (f64, f64), pointer: (f64, f64)) -> (i64, i64) {
        let pointer_weight = 1.0 - self.anchor_weight;
        (
            round_half_up(origin.0 * self.anchor_weight + pointer.0 * pointer_weight),
            round_half_up(origin.1 * self.anchor_weight + pointer.1 * pointer_weight),
        )
    }

    /// Places every layer of the active spec, or of `last` when nothing is
    /// active. With neither, the background is transparent.
    pub fn composite(
        &self,
        spec: Option<&GlowSpec>,
        last: Option<&GlowSpec>,
        pointer: PointerSample,
    ) -> Background {
        let Some(spec) = spec.or(last).filter(|spec| !spec.is_empty()) else {
            return Background::Transparent;
        };
        Background::Layers(
            spec.layers
                .iter()
                .map(|layer| PlacedLayer {
                    layer: layer.clone(),
                    origin: self.blend(layer.center, pointer.percent),
                })
                .collect(),
        )
    }
}

/// Composites with the default 30/70 anchor/pointer blend.
pub fn composite(
    spec: Option<&GlowSpec>,
    last: Option<&GlowSpec>,
    pointer: PointerSample,
) -> Background {
    GlowCompositor::default().composite(spec, last, pointer)
}

#[derive(Debug, Clone, Serialize)]
pub struct GlowFrame {
    pub opacity: f32,
    pub background: Background,
    /// Background being faded out, while a background change is in flight.
    pub previous: Option<Background>,
    /// Weight of `background` against `previous`.
    pub mix: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct GlowTimings {
    pub opacity_fade: Duration,
    pub background_fade: Duration,
}

impl Default for GlowTimings {
    fn default() -> Self {
        Self {
            opacity_fade: Duration::from_secs(1),
            background_fade: Duration::from_millis(1200),
        }
    }
}

/// The page-wide glow overlay.
///
/// Opacity follows whether a spec is active; the background keeps drawing the
/// last spec while it fades out. On deactivation the pointer sample is pinned,
/// so the fading glow stays where the pointer left it even when other
/// consumers keep the tracker listening.
#[derive(Debug)]
pub struct GlowLayer {
    compositor: GlowCompositor,
    timings: GlowTimings,
    active: Option<GlowSpec>,
    last: Option<GlowSpec>,
    frozen: Option<PointerSample>,
    opacity: Tween,
    previous: Option<Background>,
    fade: Option<FadeEnvelope>,
}

impl GlowLayer {
    pub fn new(compositor: GlowCompositor, timings: GlowTimings, now: Instant) -> Self {
        let easing = Easing::Bezier(CubicBezier::EASE_IN_OUT);
        Self {
            compositor,
            timings,
            active: None,
            last: None,
            frozen: None,
            opacity: Tween::settled(0.0, timings.opacity_fade, easing, now),
            previous: None,
            fade: None,
        }
    }

    pub fn active(&self) -> Option<&GlowSpec> {
        self.active.as_ref()
    }

    pub fn last_known(&self) -> Option<&GlowSpec> {
        self.last.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn set_active(
        &mut self,
        spec: Option<GlowSpec>,
        now: Instant,
        tracker: &mut PointerTracker,
        registry: &mut ListenerRegistry,
    ) {
        if spec == self.active {
            return;
        }
        let outgoing = self.background(self.pointer(tracker.sample()));
        if let Some(spec) = &spec {
            self.last = Some(spec.clone());
        }
        let activating = spec.is_some();
        self.active = spec;

        if activating {
            self.frozen = None;
            tracker.acquire(GLOW_CONSUMER, registry);
            self.opacity.retarget(1.0, now);
        } else {
            self.frozen = Some(tracker.sample());
            tracker.release(GLOW_CONSUMER, registry);
            self.opacity.retarget(0.0, now);
        }

        let incoming = self.background(self.pointer(tracker.sample()));
        if incoming != outgoing {
            self.previous = Some(outgoing);
            self.fade = FadeEnvelope::new(
                self.timings.background_fade,
                Easing::Bezier(CubicBezier::EASE_IN_OUT),
                now,
            );
        }
        debug!(active = activating, "glow target changed");
    }

    /// The pinned sample while inactive, the live one otherwise.
    fn pointer(&self, live: PointerSample) -> PointerSample {
        match (&self.active, self.frozen) {
            (None, Some(frozen)) => frozen,
            _ => live,
        }
    }

    fn background(&self, pointer: PointerSample) -> Background {
        self.compositor
            .composite(self.active.as_ref(), self.last.as_ref(), pointer)
    }

    pub fn frame(&mut self, now: Instant, pointer: PointerSample) -> GlowFrame {
        let background = self.background(self.pointer(pointer));
        let mut mix = 1.0;
        if let Some(fade) = &self.fade {
            let (_, current, finished) = fade.mixes(now);
            if finished {
                self.fade = None;
                self.previous = None;
            } else {
                mix = current;
            }
        }
        GlowFrame {
            opacity: self.opacity.value(now),
            background,
            previous: self.previous.clone(),
            mix,
        }
    }

    /// Drops pointer interest. Idempotent.
    pub fn dispose(&mut self, tracker: &mut PointerTracker, registry: &mut ListenerRegistry) {
        tracker.release(GLOW_CONSUMER, registry);
    }
}
