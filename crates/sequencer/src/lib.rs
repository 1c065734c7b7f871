mod timers;

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use siteconfig::IntroConfig;
use tracing::{debug, info, warn};

pub use timers::{Interval, TimerSet};

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("intro offset {name} ({value:?}) must be later than {previous} ({previous_value:?})")]
    OffsetOrder {
        name: &'static str,
        value: Duration,
        previous: &'static str,
        previous_value: Duration,
    },
    #[error("readiness timeout must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntroPhase {
    Loading,
    Ready,
    Glitch,
    Burst,
    Done,
}

impl IntroPhase {
    /// Overlay heading and sub-caption shown while in this phase.
    pub fn captions(self) -> (&'static str, &'static str) {
        match self {
            IntroPhase::Loading => ("CALIBRATING", "RENDERING LIGHT SOURCES"),
            _ => ("LET THERE BE LIGHT", "INITIALIZING"),
        }
    }
}

impl fmt::Display for IntroPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntroPhase::Loading => "loading",
            IntroPhase::Ready => "ready",
            IntroPhase::Glitch => "glitch",
            IntroPhase::Burst => "burst",
            IntroPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// The renderer never reported ready; timers were armed at the deadline.
    ReadinessTimedOut,
    Phase(IntroPhase),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroTimings {
    pub ready_after: Duration,
    pub glitch_after: Duration,
    pub burst_after: Duration,
    pub done_after: Duration,
    pub readiness_timeout: Duration,
}

impl IntroTimings {
    pub fn validate(&self) -> Result<(), SequencerError> {
        let offsets = [
            ("ready_after", self.ready_after),
            ("glitch_after", self.glitch_after),
            ("burst_after", self.burst_after),
            ("done_after", self.done_after),
        ];
        for pair in offsets.windows(2) {
            let (previous, previous_value) = pair[0];
            let (name, value) = pair[1];
            if value <= previous_value {
                return Err(SequencerError::OffsetOrder {
                    name,
                    value,
                    previous,
                    previous_value,
                });
            }
        }
        if self.readiness_timeout.is_zero() {
            return Err(SequencerError::ZeroTimeout);
        }
        Ok(())
    }

    fn schedule(&self) -> [(Duration, IntroPhase); 4] {
        [
            (self.ready_after, IntroPhase::Ready),
            (self.glitch_after, IntroPhase::Glitch),
            (self.burst_after, IntroPhase::Burst),
            (self.done_after, IntroPhase::Done),
        ]
    }
}

impl Default for IntroTimings {
    fn default() -> Self {
        IntroTimings::from(&IntroConfig::default())
    }
}

impl From<&IntroConfig> for IntroTimings {
    fn from(config: &IntroConfig) -> Self {
        Self {
            ready_after: config.ready_after,
            glitch_after: config.glitch_after,
            burst_after: config.burst_after,
            done_after: config.done_after,
            readiness_timeout: config.readiness_timeout,
        }
    }
}

type CompletionCallback = Box<dyn FnOnce()>;

/// Gates the page behind the intro animation.
///
/// Waits in `Loading` for the background renderer's first frame, then walks
/// through the remaining phases at fixed offsets from that instant. The
/// completion callback runs exactly once, on the transition to `Done`.
pub struct IntroSequencer {
    timings: IntroTimings,
    phase: IntroPhase,
    mounted_at: Option<Instant>,
    timers: Option<TimerSet<IntroPhase>>,
    timed_out: bool,
    completed: bool,
    torn_down: bool,
    on_complete: Option<CompletionCallback>,
}

impl IntroSequencer {
    pub fn new(timings: IntroTimings) -> Result<Self, SequencerError> {
        timings.validate()?;
        Ok(Self {
            timings,
            phase: IntroPhase::Loading,
            mounted_at: None,
            timers: None,
            timed_out: false,
            completed: false,
            torn_down: false,
            on_complete: None,
        })
    }

    pub fn timings(&self) -> &IntroTimings {
        &self.timings
    }

    pub fn phase(&self) -> IntroPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == IntroPhase::Done
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Primary page scroll stays pinned until the intro has finished.
    pub fn scroll_locked(&self) -> bool {
        !self.is_done()
    }

    /// Instant the phase timers were armed at, if they have been.
    pub fn readiness_origin(&self) -> Option<Instant> {
        self.timers.as_ref().map(TimerSet::origin)
    }

    pub fn set_on_complete(&mut self, callback: impl FnOnce() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Starts the readiness timeout clock. Repeated mounts keep the first instant.
    pub fn mount(&mut self, now: Instant) {
        if self.torn_down || self.mounted_at.is_some() {
            return;
        }
        self.mounted_at = Some(now);
        debug!(timeout = ?self.timings.readiness_timeout, "intro mounted");
    }

    /// Records the renderer's first frame. Returns `false` when the signal is
    /// ignored (already armed, timed out, or torn down).
    pub fn renderer_ready(&mut self, now: Instant) -> bool {
        if self.torn_down || self.timers.is_some() {
            debug!("ignoring duplicate readiness signal");
            return false;
        }
        info!("renderer ready; arming intro timers");
        self.arm(now);
        true
    }

    fn arm(&mut self, origin: Instant) {
        self.timers = Some(TimerSet::arm(origin, self.timings.schedule()));
    }

    /// Earliest instant at which `tick` could produce an event.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.torn_down {
            return None;
        }
        match &self.timers {
            Some(timers) => timers.next_deadline(),
            None => self
                .mounted_at
                .map(|mounted| mounted + self.timings.readiness_timeout),
        }
    }

    pub fn tick(&mut self, now: Instant) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        if self.timers.is_none() {
            let Some(mounted) = self.mounted_at else {
                return events;
            };
            let deadline = mounted + self.timings.readiness_timeout;
            if now < deadline {
                return events;
            }
            warn!(
                timeout_ms = self.timings.readiness_timeout.as_millis() as u64,
                "renderer never reported ready; continuing intro without it"
            );
            self.timed_out = true;
            self.arm(deadline);
            events.push(SequencerEvent::ReadinessTimedOut);
        }

        let Some(timers) = self.timers.as_mut() else {
            return events;
        };
        let origin = timers.origin();
        for phase in timers.due(now) {
            self.phase = phase;
            info!(
                %phase,
                elapsed_ms = now.saturating_duration_since(origin).as_millis() as u64,
                "intro phase"
            );
            events.push(SequencerEvent::Phase(phase));
            if phase == IntroPhase::Done && !self.completed {
                self.completed = true;
                events.push(SequencerEvent::Completed);
                if let Some(callback) = self.on_complete.take() {
                    callback();
                }
            }
        }
        events
    }

    /// Cancels every pending timer. Safe to call more than once; returns
    /// `true` only the first time.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;
        let cancelled = self.timers.as_mut().map(TimerSet::cancel).unwrap_or(0);
        self.on_complete = None;
        debug!(cancelled, "intro torn down");
        true
    }
}

impl fmt::Debug for IntroSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntroSequencer")
            .field("phase", &self.phase)
            .field("mounted_at", &self.mounted_at)
            .field("armed", &self.timers.is_some())
            .field("timed_out", &self.timed_out)
            .field("completed", &self.completed)
            .field("torn_down", &self.torn_down)
            .finish()
    }
}
