use motion::{EventKind, ListenerId, ListenerRegistry};
use serde::Serialize;
use siteconfig::NavConfig;
use tracing::debug;

use crate::layout::{Layout, SectionId};
use crate::PageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: String,
    pub section: SectionId,
}

/// A smooth-scroll request emitted by a nav click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollRequest {
    pub section: SectionId,
    pub top: f64,
    pub smooth: bool,
}

/// Fixed nav with a passively tracked active section.
#[derive(Debug)]
pub struct Navbar {
    items: Vec<NavItem>,
    active: usize,
    scrolled: bool,
    lookahead: f64,
    scrolled_threshold: f64,
    listener: Option<ListenerId>,
}

impl Navbar {
    pub fn new(config: &NavConfig) -> Result<Self, PageError> {
        let items = config
            .anchors
            .iter()
            .map(|anchor| {
                SectionId::from_anchor(&anchor.target)
                    .map(|section| NavItem {
                        name: anchor.name.clone(),
                        section,
                    })
                    .ok_or_else(|| PageError::UnknownAnchor(anchor.target.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if items.is_empty() {
            return Err(PageError::UnknownAnchor("<none>".into()));
        }
        Ok(Self {
            items,
            active: 0,
            scrolled: false,
            lookahead: config.lookahead,
            scrolled_threshold: config.scrolled_threshold,
            listener: None,
        })
    }

    pub fn items(&self) -> &[NavItem] {
        &self.items
    }

    pub fn active(&self) -> &NavItem {
        &self.items[self.active]
    }

    pub fn is_scrolled(&self) -> bool {
        self.scrolled
    }

    pub fn is_mounted(&self) -> bool {
        self.listener.is_some()
    }

    /// Attaches the scroll listener and runs the initial check.
    pub fn mount(&mut self, registry: &mut ListenerRegistry, scroll_y: f64, layout: &Layout) {
        if self.listener.is_none() {
            self.listener = Some(registry.attach(EventKind::Scroll, "navbar"));
        }
        self.on_scroll(scroll_y, layout);
    }

    pub fn teardown(&mut self, registry: &mut ListenerRegistry) {
        if let Some(id) = self.listener.take() {
            registry.detach(id);
        }
    }

    /// The active item is the last one whose section top is at or above
    /// `scroll_y + lookahead * viewport height`.
    pub fn on_scroll(&mut self, scroll_y: f64, layout: &Layout) {
        if self.listener.is_none() {
            return;
        }
        self.scrolled = scroll_y > self.scrolled_threshold;
        let trigger = scroll_y + layout.viewport().height * self.lookahead;
        let active = self
            .items
            .iter()
            .rposition(|item| layout.section(item.section).top <= trigger)
            .unwrap_or(0);
        if active != self.active {
            self.active = active;
            debug!(section = %self.items[active].section, "active section changed");
        }
    }

    /// Marks `name` active and asks for a smooth scroll to its section.
    pub fn click(&mut self, name: &str, layout: &Layout) -> Option<ScrollRequest> {
        let index = self.items.iter().position(|item| item.name == name)?;
        self.active = index;
        let section = self.items[index].section;
        Some(ScrollRequest {
            section,
            top: layout.section(section).top,
            smooth: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion::Viewport;

    fn setup() -> (Navbar, Layout, ListenerRegistry) {
        let navbar = Navbar::new(&NavConfig::default()).unwrap();
        let layout = Layout::new(Viewport::new(1440.0, 1000.0), 4, 1000.0);
        (navbar, layout, ListenerRegistry::new())
    }

    #[test]
    fn tracks_active_section_with_lookahead() {
        let (mut navbar, layout, mut registry) = setup();
        navbar.mount(&mut registry, 0.0, &layout);
        assert_eq!(navbar.active().name, "Home");
        assert!(!navbar.is_scrolled());

        let experience_top = layout.section(SectionId::Experience).top;
        // trigger = scroll + 350 reaches the section top
        navbar.on_scroll(experience_top - 350.0, &layout);
        assert_eq!(navbar.active().name, "Experience");
        navbar.on_scroll(experience_top - 351.0, &layout);
        assert_eq!(navbar.active().name, "Home");
        assert!(navbar.is_scrolled());

        navbar.on_scroll(layout.max_scroll(), &layout);
        assert_eq!(navbar.active().name, "Contact");
    }

    #[test]
    fn click_activates_and_requests_scroll() {
        let (mut navbar, layout, mut registry) = setup();
        navbar.mount(&mut registry, 0.0, &layout);
        let request = navbar.click("Testimonials", &layout).unwrap();
        assert_eq!(navbar.active().name, "Testimonials");
        assert_eq!(request.top, layout.section(SectionId::Testimonials).top);
        assert!(request.smooth);
        assert!(navbar.click("Blog", &layout).is_none());
    }

    #[test]
    fn teardown_is_idempotent() {
        let (mut navbar, layout, mut registry) = setup();
        navbar.mount(&mut registry, 0.0, &layout);
        navbar.mount(&mut registry, 0.0, &layout);
        assert_eq!(registry.count(EventKind::Scroll), 1);
        navbar.teardown(&mut registry);
        navbar.teardown(&mut registry);
        assert_eq!(registry.total(), 0);
        navbar.on_scroll(5000.0, &layout);
        assert!(!navbar.is_scrolled());
    }
}
