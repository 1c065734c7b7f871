use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use motion::{
    ConsumerId, ElementBox, GlowCompositor, GlowFrame, GlowLayer, GlowTimings, ListenerRegistry,
    Parallax, PointerTracker, ScrollProgressDriver, SpringParams, Viewport,
};
use remote::{ContactMessage, ContactTransport, SceneSource};
use renderer::{RenderAdapter, SurfaceSize};
use sequencer::{IntroPhase, SequencerEvent};
use serde::Serialize;
use siteconfig::{SiteConfig, SpringConfig};
use tracing::{debug, info, warn};

use crate::contact::{ContactForm, ContactStatus};
use crate::experience::{EntryState, ExperienceTimeline, GlowRequest};
use crate::hero::{HeroFrame, HeroSection};
use crate::intro::{IntroOverlay, OverlayFrame};
use crate::layout::{Layout, SectionId};
use crate::navbar::{Navbar, ScrollRequest};
use crate::remote_panel::{PanelView, RemotePanel};
use crate::testimonials::{CarouselFrame, TestimonialCarousel};
use crate::transition::{TransitionFrame, TransitionSection};
use crate::warp::{WarpDivider, WarpFrame, WARP_HEIGHT};
use crate::PageError;

const HERO_CONSUMER: ConsumerId = ConsumerId("hero");
const TRANSITION_CONSUMER: ConsumerId = ConsumerId("transition");
const TESTIMONIALS_CONSUMER: ConsumerId = ConsumerId("testimonials");

const TRANSITION_SCENE: &str = "transition";
const TESTIMONIALS_SCENE: &str = "testimonials";
/// Carousel card plus heading, before it is stretched to the viewport.
const TESTIMONIALS_MIN_HEIGHT: f64 = 900.0;

/// What is drawn behind the hero content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeroBackground {
    Shader,
    /// The shader never produced a frame in time.
    StaticFallback,
}

/// The two shader renderers the page owns. Each is an independent adapter
/// instance; only the hero's readiness gates the intro.
pub struct ShaderBackgrounds {
    pub hero: Box<dyn RenderAdapter>,
    /// Started when content mounts, behind the transition section.
    pub transition: Box<dyn RenderAdapter>,
}

/// Notable things that happened during one call into the page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Intro(SequencerEvent),
    BackgroundFallback,
    ContentMounted,
    ActiveSection(SectionId),
    GlowChanged { active: bool },
    TestimonialAdvanced { index: usize },
    Contact(ContactStatus),
}

/// Everything the page draws at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PageFrame {
    pub scroll_y: f64,
    pub scroll_locked: bool,
    pub scroll_restoration: &'static str,
    pub overlay: Option<OverlayFrame>,
    pub background: HeroBackground,
    pub hero: HeroFrame,
    pub content_mounted: bool,
    pub transition: TransitionFrame,
    pub transition_panel: PanelView,
    pub experience: Vec<EntryState>,
    pub dividers: Vec<WarpFrame>,
    pub testimonials: CarouselFrame,
    pub testimonials_panel: PanelView,
    pub glow: GlowFrame,
    pub nav_active: Option<String>,
    pub nav_scrolled: bool,
    pub contact: ContactStatus,
}

/// A warp divider pinned to one edge of a section.
#[derive(Debug)]
struct PlacedDivider {
    section: SectionId,
    divider: WarpDivider,
    driver: ScrollProgressDriver,
}

impl PlacedDivider {
    fn new(section: SectionId, flipped: bool, layout: &Layout) -> Result<Self, PageError> {
        let element = Self::element(section, flipped, layout);
        Ok(Self {
            section,
            divider: WarpDivider::new(flipped)?,
            driver: ScrollProgressDriver::new(
                format!("warp-{section}"),
                element,
                layout.viewport(),
            ),
        })
    }

    fn element(section: SectionId, flipped: bool, layout: &Layout) -> ElementBox {
        let host = layout.section(section);
        let height = f64::from(WARP_HEIGHT);
        if flipped {
            ElementBox::new(host.top, height)
        } else {
            ElementBox::new(host.bottom() - height, height)
        }
    }

    fn relayout(&mut self, layout: &Layout) {
        let element = Self::element(self.section, self.divider.is_flipped(), layout);
        self.driver.on_resize(layout.viewport(), element);
    }
}

fn spring(config: SpringConfig) -> Result<SpringParams, PageError> {
    Ok(SpringParams::new(config.stiffness, config.damping)?)
}

/// The whole page: intro gate, sections, glow overlay and input routing.
pub struct Page {
    layout: Layout,
    registry: ListenerRegistry,
    pointer: PointerTracker,
    intro: IntroOverlay,
    hero_surface: Option<Box<dyn RenderAdapter>>,
    transition_surface: Option<Box<dyn RenderAdapter>>,
    ready_signal: Arc<AtomicBool>,
    background: HeroBackground,
    hero: HeroSection,
    transition: TransitionSection,
    experience: ExperienceTimeline,
    dividers: Vec<PlacedDivider>,
    testimonials: TestimonialCarousel,
    contact: ContactForm,
    navbar: Navbar,
    glow: GlowLayer,
    content_mounted: bool,
    scroll_y: f64,
    torn_down: bool,
}

impl Page {
    /// Builds every section from `config` and mounts the intro and hero.
    ///
    /// The hero surface is started immediately; its first frame is the
    /// readiness signal the intro waits for. The transition surface waits
    /// for content to mount.
    pub fn new(
        config: &SiteConfig,
        viewport: Viewport,
        backgrounds: ShaderBackgrounds,
        now: Instant,
    ) -> Result<Self, PageError> {
        let ShaderBackgrounds {
            hero: mut hero_surface,
            transition: transition_surface,
        } = backgrounds;
        let layout = Layout::new(viewport, config.experience.len(), TESTIMONIALS_MIN_HEIGHT);
        let mut registry = ListenerRegistry::new();
        let mut pointer = PointerTracker::new(viewport);

        let mut intro = IntroOverlay::new(&config.intro)?;
        intro.mount(now);

        let ready_signal = Arc::new(AtomicBool::new(false));
        let signal = Arc::clone(&ready_signal);
        hero_surface.on_ready(Box::new(move || signal.store(true, Ordering::SeqCst)));
        hero_surface.start();
        pointer.acquire(HERO_CONSUMER, &mut registry);

        let scene = |id: &str| -> Result<RemotePanel, PageError> {
            let url = config
                .scene_url(id)
                .ok_or_else(|| PageError::UnknownScene(id.to_string()))?;
            Ok(RemotePanel::new(id, url))
        };
        let parallax_spring = spring(config.parallax.spring)?;
        let transition = TransitionSection::new(
            layout.section(SectionId::Transition),
            viewport,
            config.parallax.tilt_degrees,
            parallax_spring,
            scene(TRANSITION_SCENE)?,
        )?;
        let testimonials = TestimonialCarousel::new(
            config.testimonials.clone(),
            config.carousel.interval,
            Parallax::new(config.parallax.tilt_degrees, parallax_spring)?,
            scene(TESTIMONIALS_SCENE)?,
        );
        let dividers = vec![
            PlacedDivider::new(SectionId::Experience, false, &layout)?,
            PlacedDivider::new(SectionId::Testimonials, false, &layout)?,
            PlacedDivider::new(SectionId::Contact, true, &layout)?,
        ];
        let glow = GlowLayer::new(
            GlowCompositor::new(config.glow.anchor_weight),
            GlowTimings {
                opacity_fade: config.glow.opacity_fade,
                background_fade: config.glow.background_fade,
            },
            now,
        );

        info!(
            viewport_width = viewport.width,
            viewport_height = viewport.height,
            hero = %hero_surface.program(),
            transition = %transition_surface.program(),
            "page mounted"
        );
        Ok(Self {
            hero: HeroSection::new(&config.hero)?,
            experience: ExperienceTimeline::new(&config.experience)?,
            contact: ContactForm::new(config.contact.reset_after),
            navbar: Navbar::new(&config.nav)?,
            layout,
            registry,
            pointer,
            intro,
            hero_surface: Some(hero_surface),
            transition_surface: Some(transition_surface),
            ready_signal,
            background: HeroBackground::Shader,
            transition,
            dividers,
            testimonials,
            glow,
            content_mounted: false,
            scroll_y: 0.0,
            torn_down: false,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn registry(&self) -> &ListenerRegistry {
        &self.registry
    }

    pub fn intro_phase(&self) -> IntroPhase {
        self.intro.phase()
    }

    pub fn is_intro_complete(&self) -> bool {
        self.intro.is_done()
    }

    pub fn scroll_locked(&self) -> bool {
        !self.intro.is_done()
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn is_content_mounted(&self) -> bool {
        self.content_mounted
    }

    pub fn background(&self) -> HeroBackground {
        self.background
    }

    pub fn hero_surface(&self) -> Option<&dyn RenderAdapter> {
        self.hero_surface.as_deref()
    }

    pub fn transition_surface(&self) -> Option<&dyn RenderAdapter> {
        self.transition_surface.as_deref()
    }

    pub fn experience(&self) -> &ExperienceTimeline {
        &self.experience
    }

    pub fn testimonials(&self) -> &TestimonialCarousel {
        &self.testimonials
    }

    pub fn navbar(&self) -> &Navbar {
        &self.navbar
    }

    pub fn glow(&self) -> &GlowLayer {
        &self.glow
    }

    pub fn contact(&self) -> &ContactForm {
        &self.contact
    }

    /// Fills the contact form. Ignored before content mounts or while a
    /// submission is in flight.
    pub fn edit_contact(&mut self, fields: ContactMessage) -> bool {
        if !self.content_mounted || self.torn_down {
            return false;
        }
        self.contact.set_fields(fields)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Earliest instant at which a timer-driven change is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.intro.next_deadline(),
            self.hero.next_deadline(),
            self.testimonials.next_deadline(),
            self.contact.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Renders the hero background and fires every timer due at `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<PageEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }

        if let Some(surface) = self.hero_surface.as_mut() {
            if let Err(err) = surface.frame(now) {
                warn!(error = %format!("{err:#}"), "hero frame failed");
            }
        }
        if self.ready_signal.swap(false, Ordering::SeqCst) {
            self.intro.renderer_ready(now);
        }

        for event in self.intro.tick(now) {
            events.push(PageEvent::Intro(event));
            match event {
                SequencerEvent::ReadinessTimedOut => {
                    self.fall_back_to_static_background();
                    events.push(PageEvent::BackgroundFallback);
                }
                SequencerEvent::Completed => {
                    self.mount_content(now);
                    events.push(PageEvent::ContentMounted);
                }
                SequencerEvent::Phase(_) => {}
            }
        }

        self.hero.tick(now);
        if self.content_mounted {
            if let Some(surface) = self.transition_surface.as_mut() {
                if let Err(err) = surface.frame(now) {
                    warn!(error = %format!("{err:#}"), "transition frame failed");
                }
            }
            let before = self.testimonials.index();
            if self.testimonials.tick(now) > 0 {
                events.push(PageEvent::TestimonialAdvanced {
                    index: self.testimonials.index(),
                });
                debug!(from = before, to = self.testimonials.index(), "carousel advanced");
            }
        }
        let status = self.contact.status();
        self.contact.tick(now);
        if self.contact.status() != status {
            events.push(PageEvent::Contact(self.contact.status()));
        }
        events
    }

    fn fall_back_to_static_background(&mut self) {
        if let Some(mut surface) = self.hero_surface.take() {
            surface.dispose();
        }
        self.background = HeroBackground::StaticFallback;
    }

    fn mount_content(&mut self, now: Instant) {
        if self.content_mounted {
            return;
        }
        self.content_mounted = true;
        self.hero.on_intro_complete(now);
        self.pointer.acquire(TRANSITION_CONSUMER, &mut self.registry);
        self.pointer.acquire(TESTIMONIALS_CONSUMER, &mut self.registry);
        self.transition.mount(&mut self.registry);
        if let Some(surface) = self.transition_surface.as_mut() {
            surface.start();
        }
        for placed in &mut self.dividers {
            placed.driver.attach(&mut self.registry);
            placed.driver.on_scroll(self.scroll_y);
        }
        self.testimonials.mount(now);
        self.navbar.mount(&mut self.registry, self.scroll_y, &self.layout);
        info!("intro complete; page content mounted");
    }

    /// Loads the embedded scenes once their panels are mounted.
    pub fn resolve_scenes(&mut self, source: &dyn SceneSource) {
        self.transition.panel_mut().resolve(source);
        self.testimonials.panel_mut().resolve(source);
    }

    /// Applies a scroll position. Ignored, and pinned at the top, while the
    /// intro holds the scroll lock.
    pub fn scroll_to(&mut self, scroll_y: f64, now: Instant) -> Vec<PageEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }
        if self.scroll_locked() {
            self.scroll_y = 0.0;
            return events;
        }
        self.scroll_y = self.layout.clamp_scroll(scroll_y);
        let viewport = self.layout.viewport();
        self.hero.on_scroll(
            self.layout.section(SectionId::Hero),
            self.scroll_y,
            viewport,
            now,
        );
        self.transition.on_scroll(self.scroll_y);
        for placed in &mut self.dividers {
            placed.driver.on_scroll(self.scroll_y);
        }
        let active = self.navbar.active().section;
        self.navbar.on_scroll(self.scroll_y, &self.layout);
        if self.navbar.active().section != active {
            events.push(PageEvent::ActiveSection(self.navbar.active().section));
        }
        events
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if self.torn_down {
            return;
        }
        self.layout = Layout::new(viewport, self.experience.entries().len(), TESTIMONIALS_MIN_HEIGHT);
        self.pointer.resize(viewport);
        self.transition
            .on_resize(viewport, self.layout.section(SectionId::Transition));
        for placed in &mut self.dividers {
            placed.relayout(&self.layout);
        }
        let size = SurfaceSize::new(
            viewport.width.max(1.0) as u32,
            viewport.height.max(1.0) as u32,
        );
        for surface in [&mut self.hero_surface, &mut self.transition_surface]
            .into_iter()
            .flatten()
        {
            surface.resize(size);
        }
        self.scroll_y = self.layout.clamp_scroll(self.scroll_y);
        self.navbar.on_scroll(self.scroll_y, &self.layout);
    }

    /// Routes a client-space pointer move to every interested consumer.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if self.torn_down || !self.pointer.on_pointer_move(x, y) {
            return;
        }
        let sample = self.pointer.sample();
        self.hero.pointer_moved(sample);
        if let Some(surface) = self.hero_surface.as_mut() {
            surface.pointer_moved(
                (sample.percent.0 / 100.0) as f32,
                (sample.percent.1 / 100.0) as f32,
            );
        }
        if self.content_mounted {
            self.transition.pointer_moved(sample);
            self.testimonials.pointer_moved(sample);
            if let Some(surface) = self.transition_surface.as_mut() {
                surface.pointer_moved(
                    (sample.percent.0 / 100.0) as f32,
                    (sample.percent.1 / 100.0) as f32,
                );
            }
        }
    }

    /// Hovering an experience entry lights the glow with its spec.
    pub fn hover_experience(&mut self, index: usize, now: Instant) -> Vec<PageEvent> {
        if !self.content_mounted || self.torn_down {
            return Vec::new();
        }
        match self.experience.hover_enter(index) {
            Some(request) => self.apply_glow(request, now),
            None => Vec::new(),
        }
    }

    pub fn leave_experience(&mut self, now: Instant) -> Vec<PageEvent> {
        if !self.content_mounted || self.torn_down {
            return Vec::new();
        }
        let request = self.experience.hover_leave();
        self.apply_glow(request, now)
    }

    fn apply_glow(&mut self, request: GlowRequest, now: Instant) -> Vec<PageEvent> {
        let was_active = self.glow.is_active();
        let spec = match request {
            GlowRequest::Activate(spec) => Some(spec),
            GlowRequest::Clear => None,
        };
        self.glow
            .set_active(spec, now, &mut self.pointer, &mut self.registry);
        let active = self.glow.is_active();
        if active != was_active {
            vec![PageEvent::GlowChanged { active }]
        } else {
            Vec::new()
        }
    }

    pub fn hover_testimonials(&mut self, hovering: bool, now: Instant) {
        if !self.content_mounted || self.torn_down {
            return;
        }
        if hovering {
            self.testimonials.hover_enter();
        } else {
            self.testimonials.hover_leave(now);
        }
    }

    pub fn paginate_testimonials(&mut self, step: i32) {
        if self.content_mounted {
            self.testimonials.paginate(step);
        }
    }

    /// `None` before the navbar is mounted or for an unknown item.
    pub fn click_nav(&mut self, name: &str) -> Option<ScrollRequest> {
        if !self.navbar.is_mounted() {
            return None;
        }
        self.navbar.click(name, &self.layout)
    }

    pub fn submit_contact(
        &mut self,
        transport: &dyn ContactTransport,
        now: Instant,
    ) -> Result<ContactStatus, PageError> {
        if !self.content_mounted || self.torn_down {
            return Err(PageError::ContentNotMounted);
        }
        self.contact.submit(transport, now)
    }

    pub fn frame(&mut self, now: Instant) -> PageFrame {
        let pointer = self.pointer.sample();
        PageFrame {
            scroll_y: self.scroll_y,
            scroll_locked: self.scroll_locked(),
            scroll_restoration: "manual",
            overlay: self.intro.frame(now),
            background: self.background,
            hero: self.hero.frame(now),
            content_mounted: self.content_mounted,
            transition: self.transition.frame(now),
            transition_panel: self.transition.panel().view(),
            experience: self.experience.states(),
            dividers: self
                .dividers
                .iter()
                .map(|placed| placed.divider.sample(placed.driver.progress()))
                .collect(),
            testimonials: self.testimonials.frame(now),
            testimonials_panel: self.testimonials.panel().view(),
            glow: self.glow.frame(now, pointer),
            nav_active: self
                .navbar
                .is_mounted()
                .then(|| self.navbar.active().name.clone()),
            nav_scrolled: self.navbar.is_scrolled(),
            contact: self.contact.status(),
        }
    }

    /// Cancels timers, detaches every listener and releases the renderer.
    /// Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.intro.teardown();
        self.hero.teardown();
        self.transition.teardown(&mut self.registry);
        for placed in &mut self.dividers {
            placed.driver.detach(&mut self.registry);
        }
        self.testimonials.teardown();
        self.navbar.teardown(&mut self.registry);
        self.glow.dispose(&mut self.pointer, &mut self.registry);
        self.pointer.dispose(&mut self.registry);
        self.contact.teardown();
        for mut surface in [self.hero_surface.take(), self.transition_surface.take()]
            .into_iter()
            .flatten()
        {
            surface.dispose();
        }
        debug!(listeners = self.registry.total(), "page torn down");
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use anyhow::Result;

    use motion::{Background, EventKind};
    use remote::TransportError;
    use renderer::{FrameReport, ShaderProgram, SimulatedSurface};

    use crate::remote_panel::tests::FakeScenes;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn viewport() -> Viewport {
        Viewport::new(1000.0, 500.0)
    }

    fn surface(program: ShaderProgram) -> SimulatedSurface {
        SimulatedSurface::mount(program, SurfaceSize::new(1000, 500))
    }

    fn backgrounds(
        hero: impl RenderAdapter + 'static,
        transition: impl RenderAdapter + 'static,
    ) -> ShaderBackgrounds {
        ShaderBackgrounds {
            hero: Box::new(hero),
            transition: Box::new(transition),
        }
    }

    fn page_with(hero: SimulatedSurface, now: Instant) -> Page {
        let config = SiteConfig::bundled().unwrap();
        let transition = surface(ShaderProgram::RadialRings);
        Page::new(&config, viewport(), backgrounds(hero, transition), now).unwrap()
    }

    fn page(now: Instant) -> Page {
        page_with(surface(ShaderProgram::HeroWaves), now)
    }

    /// Wraps a simulated surface and counts what the page asks of it.
    #[derive(Default, Clone)]
    struct Counts {
        starts: Arc<AtomicUsize>,
        frames: Arc<AtomicUsize>,
        resizes: Arc<AtomicUsize>,
        disposes: Arc<AtomicUsize>,
    }

    impl Counts {
        fn get(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    struct CountingSurface {
        inner: SimulatedSurface,
        counts: Counts,
    }

    impl CountingSurface {
        fn new(inner: SimulatedSurface) -> (Self, Counts) {
            let counts = Counts::default();
            (
                Self {
                    inner,
                    counts: counts.clone(),
                },
                counts,
            )
        }
    }

    impl RenderAdapter for CountingSurface {
        fn program(&self) -> ShaderProgram {
            self.inner.program()
        }

        fn on_ready(&mut self, callback: Box<dyn FnOnce() + Send>) {
            self.inner.on_ready(callback);
        }

        fn start(&mut self) {
            self.counts.starts.fetch_add(1, Ordering::SeqCst);
            self.inner.start();
        }

        fn resize(&mut self, size: SurfaceSize) {
            self.counts.resizes.fetch_add(1, Ordering::SeqCst);
            self.inner.resize(size);
        }

        fn pointer_moved(&mut self, x: f32, y: f32) {
            self.inner.pointer_moved(x, y);
        }

        fn frame(&mut self, now: Instant) -> Result<Option<FrameReport>> {
            let report = self.inner.frame(now)?;
            if report.is_some() {
                self.counts.frames.fetch_add(1, Ordering::SeqCst);
            }
            Ok(report)
        }

        fn dispose(&mut self) {
            self.counts.disposes.fetch_add(1, Ordering::SeqCst);
            self.inner.dispose();
        }

        fn is_ready(&self) -> bool {
            self.inner.is_ready()
        }

        fn is_running(&self) -> bool {
            self.inner.is_running()
        }
    }

    /// Drives the page through a normal intro and returns the completion time.
    fn complete_intro(page: &mut Page, start: Instant) -> Instant {
        page.tick(start);
        let done = start + ms(1800);
        page.tick(done);
        assert!(page.is_intro_complete());
        done
    }

    struct RecordingTransport {
        outcome: Result<(), TransportError>,
        sent: RefCell<Vec<ContactMessage>>,
    }

    impl RecordingTransport {
        fn new(outcome: Result<(), TransportError>) -> Self {
            Self {
                outcome,
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    impl ContactTransport for RecordingTransport {
        fn submit(&self, message: &ContactMessage) -> Result<(), TransportError> {
            self.sent.borrow_mut().push(message.clone());
            self.outcome.clone()
        }
    }

    fn filled() -> ContactMessage {
        ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            message: "Hello there".into(),
        }
    }

    #[test]
    fn intro_completes_exactly_1800ms_after_first_frame() {
        let start = Instant::now();
        let mut page = page(start);
        assert!(page.scroll_locked());

        let events = page.tick(start);
        assert!(events.is_empty());
        assert_eq!(page.intro_phase(), IntroPhase::Loading);

        let events = page.tick(start + ms(200));
        assert_eq!(events, vec![PageEvent::Intro(SequencerEvent::Phase(IntroPhase::Ready))]);
        page.tick(start + ms(1000));
        assert_eq!(page.intro_phase(), IntroPhase::Burst);

        page.tick(start + ms(1799));
        assert!(!page.is_intro_complete());
        assert!(!page.is_content_mounted());
        assert!(page.scroll_locked());

        let events = page.tick(start + ms(1800));
        assert!(events.contains(&PageEvent::Intro(SequencerEvent::Completed)));
        assert!(events.contains(&PageEvent::ContentMounted));
        assert!(page.is_intro_complete());
        assert!(!page.scroll_locked());
        assert_eq!(page.background(), HeroBackground::Shader);
        assert!(page.frame(start + ms(1800)).overlay.is_none());
    }

    #[test]
    fn scroll_is_pinned_until_intro_completes() {
        let start = Instant::now();
        let mut page = page(start);
        page.tick(start);
        page.scroll_to(600.0, start + ms(10));
        assert_eq!(page.scroll_y(), 0.0);

        let done = complete_intro(&mut page, start);
        let events = page.scroll_to(page.layout().section(SectionId::Experience).top, done);
        assert!(page.scroll_y() > 0.0);
        assert_eq!(events, vec![PageEvent::ActiveSection(SectionId::Experience)]);
        assert!(page.frame(done).nav_scrolled);
    }

    #[test]
    fn readiness_timeout_switches_to_static_background() {
        let start = Instant::now();
        let surface = SimulatedSurface::mount(ShaderProgram::HeroWaves, SurfaceSize::new(1000, 500))
            .with_failing_frames(u32::MAX);
        let mut page = page_with(surface, start);

        page.tick(start + ms(7999));
        assert_eq!(page.intro_phase(), IntroPhase::Loading);

        let deadline = start + ms(8000);
        let events = page.tick(deadline);
        assert_eq!(
            events,
            vec![
                PageEvent::Intro(SequencerEvent::ReadinessTimedOut),
                PageEvent::BackgroundFallback,
            ]
        );
        assert_eq!(page.background(), HeroBackground::StaticFallback);
        assert!(page.hero_surface().is_none());

        page.tick(deadline + ms(1799));
        assert!(!page.is_intro_complete());
        page.tick(deadline + ms(1800));
        assert!(page.is_intro_complete());
        assert!(page.is_content_mounted());
    }

    #[test]
    fn glow_follows_pointer_with_anchor_blend() {
        let start = Instant::now();
        let mut page = page(start);
        let done = complete_intro(&mut page, start);

        page.pointer_moved(800.0, 100.0);
        let events = page.hover_experience(0, done);
        assert_eq!(events, vec![PageEvent::GlowChanged { active: true }]);
        assert_eq!(page.experience().state(0), EntryState::Focused);
        assert_eq!(page.experience().state(1), EntryState::Dimmed);

        let frame = page.frame(done + ms(1200));
        assert_eq!(frame.glow.background.origins()[0], (71, 26));
        assert!((frame.glow.opacity - 1.0).abs() < 1e-6);

        let events = page.leave_experience(done + ms(1200));
        assert_eq!(events, vec![PageEvent::GlowChanged { active: false }]);
        page.pointer_moved(0.0, 0.0);
        let frame = page.frame(done + ms(1300));
        assert_eq!(frame.glow.background.origins()[0], (71, 26));
        assert!(frame.glow.opacity < 1.0);
        assert!(frame.glow.opacity > 0.0);
    }

    #[test]
    fn glow_without_hover_is_transparent() {
        let start = Instant::now();
        let mut page = page(start);
        let done = complete_intro(&mut page, start);
        assert_eq!(page.frame(done).glow.background, Background::Transparent);
        assert!(page.hover_experience(99, done).is_empty());
    }

    #[test]
    fn contact_is_unavailable_during_intro() {
        let start = Instant::now();
        let mut page = page(start);
        page.tick(start);
        assert!(!page.edit_contact(filled()));
        let transport = RecordingTransport::new(Ok(()));
        assert!(matches!(
            page.submit_contact(&transport, start + ms(100)),
            Err(PageError::ContentNotMounted)
        ));
        assert!(transport.sent.borrow().is_empty());
        assert_eq!(page.contact().history(), &[ContactStatus::Idle]);

        let done = complete_intro(&mut page, start);
        assert!(page.edit_contact(filled()));
        assert_eq!(page.submit_contact(&transport, done).unwrap(), ContactStatus::Sent);
        assert_eq!(transport.sent.borrow().len(), 1);
    }

    #[test]
    fn failed_contact_submission_reports_error() {
        let start = Instant::now();
        let mut page = page(start);
        let done = complete_intro(&mut page, start);
        assert!(page.edit_contact(filled()));
        let transport = RecordingTransport::new(Err(TransportError::Status { status: 500 }));

        let status = page.submit_contact(&transport, done).unwrap();
        assert_eq!(status, ContactStatus::Error);
        assert_eq!(
            page.contact().history(),
            &[ContactStatus::Idle, ContactStatus::Sending, ContactStatus::Error]
        );
        assert_eq!(page.contact().fields(), &filled());
        assert_eq!(transport.sent.borrow().len(), 1);
    }

    #[test]
    fn successful_contact_submission_resets_after_delay() {
        let start = Instant::now();
        let mut page = page(start);
        let done = complete_intro(&mut page, start);
        assert!(page.edit_contact(filled()));
        let transport = RecordingTransport::new(Ok(()));

        let status = page.submit_contact(&transport, done).unwrap();
        assert_eq!(status, ContactStatus::Sent);
        assert_eq!(page.contact().fields(), &ContactMessage::default());

        let reset_at = page.contact().next_deadline().unwrap();
        assert!(reset_at >= done + ms(4000));
        let events = page.tick(reset_at - ms(1));
        assert!(!events.contains(&PageEvent::Contact(ContactStatus::Idle)));
        let events = page.tick(reset_at);
        assert!(events.contains(&PageEvent::Contact(ContactStatus::Idle)));
        assert_eq!(page.contact().status(), ContactStatus::Idle);
    }

    #[test]
    fn carousel_advances_only_after_content_mounts() {
        let start = Instant::now();
        let mut page = page(start);
        let done = complete_intro(&mut page, start);
        assert_eq!(page.testimonials().index(), 0);

        let events = page.tick(done + Duration::from_secs(6));
        assert!(events.contains(&PageEvent::TestimonialAdvanced { index: 1 }));

        page.hover_testimonials(true, done + Duration::from_secs(7));
        page.tick(done + Duration::from_secs(13));
        assert_eq!(page.testimonials().index(), 1);
    }

    #[test]
    fn nav_clicks_resolve_once_mounted() {
        let start = Instant::now();
        let mut page = page(start);
        assert!(page.click_nav("Contact").is_none());
        complete_intro(&mut page, start);
        let request = page.click_nav("Contact").unwrap();
        assert_eq!(request.section, SectionId::Contact);
        assert!(request.smooth);
        assert!(page.click_nav("Blog").is_none());
    }

    #[test]
    fn scenes_resolve_into_panels() {
        let start = Instant::now();
        let mut page = page(start);
        complete_intro(&mut page, start);
        let scenes = FakeScenes::default();
        page.resolve_scenes(&scenes);
        let frame = page.frame(start + ms(1900));
        assert!(matches!(frame.transition_panel, PanelView::Scene { .. }));
        assert!(matches!(frame.testimonials_panel, PanelView::Scene { .. }));
        assert_eq!(frame.dividers.len(), 3);
        assert!(frame.dividers[2].flipped);
    }

    #[test]
    fn teardown_detaches_every_listener() {
        let start = Instant::now();
        let mut page = page(start);
        complete_intro(&mut page, start);
        page.hover_experience(1, start + ms(1900));
        assert!(page.registry().count(EventKind::PointerMove) > 0);
        assert!(page.registry().total() > 1);

        page.teardown();
        page.teardown();
        assert!(page.is_torn_down());
        assert_eq!(page.registry().total(), 0);
        assert!(page.hero_surface().is_none());
        assert!(page.tick(start + Duration::from_secs(30)).is_empty());
        assert_eq!(page.next_deadline(), None);
    }

    #[test]
    fn transition_surface_runs_after_mount_and_is_disposed_once() {
        let start = Instant::now();
        let (transition, counts) = CountingSurface::new(surface(ShaderProgram::RadialRings));
        let config = SiteConfig::bundled().unwrap();
        let mut page = Page::new(
            &config,
            viewport(),
            backgrounds(surface(ShaderProgram::HeroWaves), transition),
            start,
        )
        .unwrap();
        assert_eq!(
            page.transition_surface().map(|surface| surface.program()),
            Some(ShaderProgram::RadialRings)
        );

        page.tick(start);
        page.tick(start + ms(1000));
        assert_eq!(Counts::get(&counts.starts), 0);
        assert_eq!(Counts::get(&counts.frames), 0);

        let done = complete_intro(&mut page, start);
        assert_eq!(Counts::get(&counts.starts), 1);
        page.tick(done + ms(16));
        assert!(Counts::get(&counts.frames) >= 1);
        page.resize(Viewport::new(800.0, 600.0));
        assert_eq!(Counts::get(&counts.resizes), 1);

        page.teardown();
        page.teardown();
        assert!(page.transition_surface().is_none());
        drop(page);
        assert_eq!(Counts::get(&counts.disposes), 1);
    }

    #[test]
    fn transition_readiness_does_not_gate_intro() {
        let start = Instant::now();
        let hero = surface(ShaderProgram::HeroWaves).with_failing_frames(u32::MAX);
        let mut transition = surface(ShaderProgram::RadialRings);
        transition.start();
        transition.frame(start).unwrap();
        assert!(transition.is_ready());
        let config = SiteConfig::bundled().unwrap();
        let mut page =
            Page::new(&config, viewport(), backgrounds(hero, transition), start).unwrap();

        page.tick(start + ms(1800));
        assert_eq!(page.intro_phase(), IntroPhase::Loading);
        let events = page.tick(start + ms(8000));
        assert!(events.contains(&PageEvent::Intro(SequencerEvent::ReadinessTimedOut)));
        assert!(page.transition_surface().is_some());
    }

    #[test]
    fn unknown_scene_is_rejected() {
        let mut config = SiteConfig::bundled().unwrap();
        config.scenes.remove("testimonials");
        let pair = backgrounds(
            surface(ShaderProgram::HeroWaves),
            surface(ShaderProgram::RadialRings),
        );
        let err = Page::new(&config, viewport(), pair, Instant::now())
            .err()
            .unwrap();
        assert!(matches!(err, PageError::UnknownScene(id) if id == "testimonials"));
    }

    #[test]
    fn loading_frame_shows_overlay_and_locks_scroll() {
        let start = Instant::now();
        let mut page = page(start);
        page.tick(start);
        let frame = page.frame(start + ms(100));
        assert_eq!(frame.scroll_restoration, "manual");
        assert!(frame.scroll_locked);
        assert!(frame.overlay.map(|overlay| overlay.loading_bar).unwrap_or(false));
        assert_eq!(frame.nav_active, None);
    }
}
