use std::time::{Duration, Instant};

use motion::{ElementBox, Parallax, PointerSample, SpringParams, Tilt, Viewport};
use sequencer::TimerSet;
use serde::Serialize;
use siteconfig::HeroConfig;
use tracing::debug;

use crate::PageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealCue {
    ShowShader,
    ShowContent,
    InitialDone,
}

/// What the hero draws at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeroFrame {
    pub shader_visible: bool,
    pub content_visible: bool,
    pub in_view: bool,
    pub tilt: Tilt,
}

/// Hero reveal choreography and content tilt.
///
/// The first reveal runs once after the intro completes. After it has
/// settled, scrolling the hero back into view replays a short reveal, and
/// scrolling it out hides everything and cancels pending reveal steps.
#[derive(Debug)]
pub struct HeroSection {
    content_delay: Duration,
    settle_after: Duration,
    reentry_shader_delay: Duration,
    reentry_content_delay: Duration,
    in_view_amount: f64,
    parallax: Parallax,
    timers: Option<TimerSet<RevealCue>>,
    played_initial: bool,
    initial_done: bool,
    shader_visible: bool,
    content_visible: bool,
    in_view: bool,
}

impl HeroSection {
    pub fn new(config: &HeroConfig) -> Result<Self, PageError> {
        let spring = SpringParams::new(config.spring.stiffness, config.spring.damping)?;
        Ok(Self {
            content_delay: config.content_delay,
            settle_after: config.settle_after,
            reentry_shader_delay: config.reentry_shader_delay,
            reentry_content_delay: config.reentry_content_delay,
            in_view_amount: config.in_view_amount,
            parallax: Parallax::new(config.tilt_degrees, spring)?,
            timers: None,
            played_initial: false,
            initial_done: false,
            shader_visible: false,
            content_visible: false,
            in_view: true,
        })
    }

    pub fn is_initial_reveal_done(&self) -> bool {
        self.initial_done
    }

    /// Starts the first reveal. Only the first call has any effect.
    pub fn on_intro_complete(&mut self, now: Instant) {
        if self.played_initial {
            return;
        }
        self.played_initial = true;
        self.shader_visible = true;
        self.timers = Some(TimerSet::arm(
            now,
            [
                (self.content_delay, RevealCue::ShowContent),
                (self.settle_after, RevealCue::InitialDone),
            ],
        ));
        debug!("hero initial reveal started");
    }

    /// Re-evaluates visibility of the hero box for the current scroll.
    pub fn on_scroll(&mut self, element: ElementBox, scroll_y: f64, viewport: Viewport, now: Instant) {
        let in_view = element.visible_fraction(scroll_y, viewport) >= self.in_view_amount;
        if in_view == self.in_view {
            return;
        }
        self.in_view = in_view;
        if !self.initial_done {
            return;
        }
        self.shader_visible = false;
        self.content_visible = false;
        self.cancel_timers();
        if in_view {
            self.timers = Some(TimerSet::arm(
                now,
                [
                    (self.reentry_shader_delay, RevealCue::ShowShader),
                    (self.reentry_content_delay, RevealCue::ShowContent),
                ],
            ));
            debug!("hero re-entered view");
        } else {
            debug!("hero left view");
        }
    }

    pub fn pointer_moved(&mut self, sample: PointerSample) {
        self.parallax.set_pointer(sample);
    }

    pub fn tick(&mut self, now: Instant) {
        let Some(timers) = self.timers.as_mut() else {
            return;
        };
        for cue in timers.due(now) {
            match cue {
                RevealCue::ShowShader => self.shader_visible = true,
                RevealCue::ShowContent => self.content_visible = true,
                RevealCue::InitialDone => self.initial_done = true,
            }
        }
        if timers.is_empty() {
            self.timers = None;
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.as_ref().and_then(TimerSet::next_deadline)
    }

    pub fn frame(&mut self, now: Instant) -> HeroFrame {
        HeroFrame {
            shader_visible: self.shader_visible,
            content_visible: self.content_visible,
            in_view: self.in_view,
            tilt: self.parallax.advance(now),
        }
    }

    pub fn teardown(&mut self) {
        self.cancel_timers();
    }

    fn cancel_timers(&mut self) {
        if let Some(mut timers) = self.timers.take() {
            timers.cancel();
        }
    }
}
