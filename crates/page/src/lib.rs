//! The portfolio page as a headless, tick-driven model.
//!
//! A host owns the clock and input devices and pushes events into [`Page`]:
//!
//! ```text
//!   host loop ── tick(now) ──▶ Page ──▶ hero RenderAdapter ── first frame ──┐
//!       │                       │                                           │
//!       ├─ scroll_to / pointer  │◀── IntroOverlay (phases, scroll lock) ◀───┘
//!       └─ hover / click / submit
//!                               └──▶ frame(now) -> PageFrame
//! ```
//!
//! Nothing past the hero is mounted until the intro reports completion,
//! including the transition renderer and the contact form.

mod contact;
mod experience;
mod hero;
mod intro;
mod layout;
mod navbar;
mod remote_panel;
mod site;
mod testimonials;
mod transition;
mod warp;

pub use contact::{ContactForm, ContactStatus};
pub use experience::{EntryState, ExperienceTimeline, GlowRequest, TimelineEntry};
pub use hero::{HeroFrame, HeroSection};
pub use intro::{IntroOverlay, OverlayFrame};
pub use layout::{Layout, SectionId};
pub use navbar::{NavItem, Navbar, ScrollRequest};
pub use remote_panel::{PanelState, PanelView, RemotePanel};
pub use site::{HeroBackground, Page, PageEvent, PageFrame, ShaderBackgrounds};
pub use testimonials::{CarouselFrame, TestimonialCarousel};
pub use transition::{ChromaticFilter, TransitionFrame, TransitionSection};
pub use warp::{WarpDivider, WarpFrame, WARP_HEIGHT};

use motion::{GlowParseError, MotionError};
use sequencer::SequencerError;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    #[error(transparent)]
    Motion(#[from] MotionError),
    #[error("invalid glow for {entry}: {source}")]
    Glow {
        entry: String,
        #[source]
        source: GlowParseError,
    },
    #[error("nav anchor '{0}' does not name a section")]
    UnknownAnchor(String),
    #[error("scene '{0}' is not configured")]
    UnknownScene(String),
    #[error("invalid contact form: {0}")]
    InvalidForm(String),
    #[error("a contact submission is already in flight")]
    SubmissionInFlight,
    #[error("page content is not mounted until the intro completes")]
    ContentNotMounted,
}
