use std::cmp::Ordering;
use std::time::{Duration, Instant};

use motion::{Parallax, PointerSample, SpringParams, Tilt};
use sequencer::Interval;
use serde::Serialize;
use siteconfig::Testimonial;
use tracing::debug;

use crate::remote_panel::RemotePanel;

/// Slide direction of the last page change: `1` forward, `-1` back, `0` none.
pub type Direction = i8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselFrame {
    pub index: usize,
    pub direction: Direction,
    pub counter: String,
    pub paused: bool,
    pub tilt: Tilt,
}

/// Auto-advancing testimonial carousel over a 3D scene backdrop.
///
/// The interval is measured from when it was last armed; hovering clears it
/// and leaving re-arms it from that instant.
#[derive(Debug)]
pub struct TestimonialCarousel {
    items: Vec<Testimonial>,
    current: usize,
    direction: Direction,
    paused: bool,
    interval: Interval,
    parallax: Parallax,
    panel: RemotePanel,
}

impl TestimonialCarousel {
    pub fn new(
        items: Vec<Testimonial>,
        period: Duration,
        parallax: Parallax,
        panel: RemotePanel,
    ) -> Self {
        Self {
            items,
            current: 0,
            direction: 0,
            paused: false,
            interval: Interval::new(period),
            parallax,
            panel,
        }
    }

    pub fn with_spring(
        items: Vec<Testimonial>,
        period: Duration,
        tilt_degrees: f32,
        spring: SpringParams,
        panel: RemotePanel,
    ) -> Result<Self, motion::MotionError> {
        Ok(Self::new(
            items,
            period,
            Parallax::new(tilt_degrees, spring)?,
            panel,
        ))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<&Testimonial> {
        self.items.get(self.current)
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn panel(&self) -> &RemotePanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut RemotePanel {
        &mut self.panel
    }

    /// Starts auto-advance and the backdrop load.
    pub fn mount(&mut self, now: Instant) {
        if !self.paused && !self.interval.is_armed() {
            self.interval.arm(now);
        }
        self.panel.mount();
    }

    pub fn teardown(&mut self) {
        self.interval.clear();
    }

    /// Steps by `step` pages, wrapping at both ends.
    pub fn paginate(&mut self, step: i32) {
        let len = self.items.len();
        if len == 0 || step == 0 {
            return;
        }
        self.direction = if step > 0 { 1 } else { -1 };
        let next = (self.current as i64 + i64::from(step)).rem_euclid(len as i64);
        self.current = next as usize;
        debug!(index = self.current, "testimonial changed");
    }

    /// Jumps to `index`; the slide direction follows the comparison with the
    /// current page.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.direction = match index.cmp(&self.current) {
            Ordering::Greater => 1,
            Ordering::Less => -1,
            Ordering::Equal => 0,
        };
        self.current = index;
        true
    }

    pub fn hover_enter(&mut self) {
        self.paused = true;
        self.interval.clear();
    }

    pub fn hover_leave(&mut self, now: Instant) {
        self.paused = false;
        self.interval.arm(now);
    }

    pub fn pointer_moved(&mut self, sample: PointerSample) {
        self.parallax.set_pointer(sample);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.interval.next_deadline()
    }

    /// Advances once per elapsed period.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let fired = self.interval.poll(now);
        for _ in 0..fired {
            self.paginate(1);
        }
        fired
    }

    /// `"03 / 05"` style position.
    pub fn counter(&self) -> String {
        format!("{:02} / {:02}", self.current + 1, self.items.len())
    }

    pub fn frame(&mut self, now: Instant) -> CarouselFrame {
        CarouselFrame {
            index: self.current,
            direction: self.direction,
            counter: self.counter(),
            paused: self.paused,
            tilt: self.parallax.advance(now),
        }
    }
}
