use std::time::{Duration, Instant};

use motion::{CubicBezier, Easing};
use sequencer::{IntroPhase, IntroSequencer, IntroTimings, SequencerEvent};
use serde::Serialize;
use siteconfig::IntroConfig;

use crate::PageError;

/// What the loader overlay shows at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverlayFrame {
    pub phase: IntroPhase,
    pub heading: &'static str,
    pub caption: &'static str,
    pub opacity: f32,
    /// Whether the loading bar sweep is drawn.
    pub loading_bar: bool,
}

/// The full-screen intro: the phase sequencer plus its overlay fade.
#[derive(Debug)]
pub struct IntroOverlay {
    sequencer: IntroSequencer,
    burst_fade: Duration,
    burst_fade_delay: Duration,
    burst_started: Option<Instant>,
}

impl IntroOverlay {
    pub fn new(config: &IntroConfig) -> Result<Self, PageError> {
        Ok(Self {
            sequencer: IntroSequencer::new(IntroTimings::from(config))?,
            burst_fade: config.burst_fade,
            burst_fade_delay: config.burst_fade_delay,
            burst_started: None,
        })
    }

    pub fn sequencer(&self) -> &IntroSequencer {
        &self.sequencer
    }

    pub fn phase(&self) -> IntroPhase {
        self.sequencer.phase()
    }

    pub fn is_done(&self) -> bool {
        self.sequencer.is_done()
    }

    pub fn mount(&mut self, now: Instant) {
        self.sequencer.mount(now);
    }

    pub fn renderer_ready(&mut self, now: Instant) -> bool {
        self.sequencer.renderer_ready(now)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.sequencer.next_deadline()
    }

    pub fn tick(&mut self, now: Instant) -> Vec<SequencerEvent> {
        let events = self.sequencer.tick(now);
        if events.contains(&SequencerEvent::Phase(IntroPhase::Burst)) {
            let origin = self.sequencer.readiness_origin().unwrap_or(now);
            self.burst_started = Some(origin + self.sequencer.timings().burst_after);
        }
        events
    }

    pub fn teardown(&mut self) -> bool {
        self.sequencer.teardown()
    }

    /// `None` once the intro is done and the overlay is unmounted.
    pub fn frame(&self, now: Instant) -> Option<OverlayFrame> {
        let phase = self.sequencer.phase();
        if phase == IntroPhase::Done {
            return None;
        }
        let (heading, caption) = phase.captions();
        Some(OverlayFrame {
            phase,
            heading,
            caption,
            opacity: self.opacity(now),
            loading_bar: phase == IntroPhase::Loading,
        })
    }

    fn opacity(&self, now: Instant) -> f32 {
        let Some(started) = self.burst_started else {
            return 1.0;
        };
        let fade_start = started + self.burst_fade_delay;
        let elapsed = now.saturating_duration_since(fade_start);
        if now <= fade_start {
            return 1.0;
        }
        if self.burst_fade.is_zero() || elapsed >= self.burst_fade {
            return 0.0;
        }
        let t = elapsed.as_secs_f32() / self.burst_fade.as_secs_f32();
        1.0 - Easing::Bezier(CubicBezier::EXPO_OUT).sample(t)
    }
}
