use serde::Serialize;

use crate::listeners::{EventKind, ListenerId, ListenerRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementBox {
    pub top: f64,
    pub height: f64,
}

impl ElementBox {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Fraction of the element currently inside the viewport.
    pub fn visible_fraction(&self, scroll_y: f64, viewport: Viewport) -> f64 {
        if self.height <= 0.0 {
            return 0.0;
        }
        let top = self.top.max(scroll_y);
        let bottom = self.bottom().min(scroll_y + viewport.height);
        ((bottom - top) / self.height).clamp(0.0, 1.0)
    }
}

/// Progress of `element` through the viewport: 0 while its top edge is at or
/// below the viewport bottom, 1 once its bottom edge has passed the viewport top.
pub fn scroll_progress(element: ElementBox, scroll_y: f64, viewport_height: f64) -> f64 {
    let span = viewport_height + element.height;
    if span <= 0.0 || !span.is_finite() {
        return 0.0;
    }
    let travelled = scroll_y + viewport_height - element.top;
    let progress = travelled / span;
    if progress.is_nan() {
        return 0.0;
    }
    progress.clamp(0.0, 1.0)
}

/// Scroll progress for one tracked section, recomputed on scroll and resize.
#[derive(Debug)]
pub struct ScrollProgressDriver {
    owner: String,
    element: ElementBox,
    scroll_y: f64,
    viewport: Viewport,
    progress: f64,
    listeners: Option<(ListenerId, ListenerId)>,
}

impl ScrollProgressDriver {
    pub fn new(owner: impl Into<String>, element: ElementBox, viewport: Viewport) -> Self {
        let mut driver = Self {
            owner: owner.into(),
            element,
            scroll_y: 0.0,
            viewport,
            progress: 0.0,
            listeners: None,
        };
        driver.recompute();
        driver
    }

    pub fn attach(&mut self, registry: &mut ListenerRegistry) {
        if self.listeners.is_some() {
            return;
        }
        let scroll = registry.attach(EventKind::Scroll, &self.owner);
        let resize = registry.attach(EventKind::Resize, &self.owner);
        self.listeners = Some((scroll, resize));
    }

    /// Detaches both listeners. Safe to call repeatedly.
    pub fn detach(&mut self, registry: &mut ListenerRegistry) {
        if let Some((scroll, resize)) = self.listeners.take() {
            registry.detach(scroll);
            registry.detach(resize);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.listeners.is_some()
    }

    pub fn on_scroll(&mut self, scroll_y: f64) -> f64 {
        if self.is_attached() {
            self.scroll_y = scroll_y;
            self.recompute();
        }
        self.progress
    }

    pub fn on_resize(&mut self, viewport: Viewport, element: ElementBox) -> f64 {
        if self.is_attached() {
            self.viewport = viewport;
            self.element = element;
            self.recompute();
        }
        self.progress
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn element(&self) -> ElementBox {
        self.element
    }

    fn recompute(&mut self) {
        self.progress = scroll_progress(self.element, self.scroll_y, self.viewport.height);
    }
}
