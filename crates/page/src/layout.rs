use std::fmt;

use motion::{ElementBox, Viewport};
use serde::Serialize;

const FOOTER_HEIGHT: f64 = 128.0;
/// Vertical space one experience card takes, including the gap.
const EXPERIENCE_CARD_HEIGHT: f64 = 420.0;
const CONTACT_MIN_HEIGHT: f64 = 900.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SectionId {
    Hero,
    Transition,
    Experience,
    Testimonials,
    Contact,
    Footer,
}

impl SectionId {
    pub const ALL: [SectionId; 6] = [
        SectionId::Hero,
        SectionId::Transition,
        SectionId::Experience,
        SectionId::Testimonials,
        SectionId::Contact,
        SectionId::Footer,
    ];

    /// DOM-style id used by nav anchors.
    pub fn anchor(self) -> &'static str {
        match self {
            SectionId::Hero => "hero",
            SectionId::Transition => "transition",
            SectionId::Experience => "experience",
            SectionId::Testimonials => "testimonials",
            SectionId::Contact => "contact",
            SectionId::Footer => "footer",
        }
    }

    /// Resolves `#name` or `name`.
    pub fn from_anchor(target: &str) -> Option<Self> {
        let name = target.trim().trim_start_matches('#');
        SectionId::ALL
            .into_iter()
            .find(|section| section.anchor() == name)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor())
    }
}

/// Document geometry of the sections for a given viewport.
///
/// Hero fills the viewport, the transition is 150vh, and the experience
/// timeline slides 50vh up underneath the end of the transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    viewport: Viewport,
    boxes: Vec<(SectionId, ElementBox)>,
}

impl Layout {
    pub fn new(viewport: Viewport, experience_entries: usize, testimonial_height: f64) -> Self {
        let vh = viewport.height.max(0.0);
        let hero = ElementBox::new(0.0, vh);
        let transition = ElementBox::new(hero.bottom(), 1.5 * vh);
        let experience_height = (0.15 * vh + experience_entries as f64 * EXPERIENCE_CARD_HEIGHT).max(vh);
        let experience = ElementBox::new(transition.bottom() - 0.5 * vh, experience_height);
        let testimonials = ElementBox::new(experience.bottom(), testimonial_height.max(vh));
        let contact = ElementBox::new(testimonials.bottom(), CONTACT_MIN_HEIGHT.max(vh));
        let footer = ElementBox::new(contact.bottom(), FOOTER_HEIGHT);
        Self {
            viewport,
            boxes: vec![
                (SectionId::Hero, hero),
                (SectionId::Transition, transition),
                (SectionId::Experience, experience),
                (SectionId::Testimonials, testimonials),
                (SectionId::Contact, contact),
                (SectionId::Footer, footer),
            ],
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn section(&self, id: SectionId) -> ElementBox {
        self.boxes
            .iter()
            .find(|(section, _)| *section == id)
            .map(|(_, element)| *element)
            .unwrap_or(ElementBox::new(0.0, 0.0))
    }

    pub fn document_height(&self) -> f64 {
        self.section(SectionId::Footer).bottom()
    }

    pub fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport.height).max(0.0)
    }

    pub fn clamp_scroll(&self, scroll_y: f64) -> f64 {
        if !scroll_y.is_finite() {
            return 0.0;
        }
        scroll_y.clamp(0.0, self.max_scroll())
    }
}
