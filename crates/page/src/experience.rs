use motion::GlowSpec;
use serde::Serialize;
use siteconfig::ExperienceEntry;
use tracing::debug;

use crate::PageError;

/// Visual emphasis of one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryState {
    Focused,
    /// Another entry is hovered.
    Dimmed,
    Rest,
}

impl EntryState {
    pub fn opacity(self) -> f32 {
        match self {
            EntryState::Dimmed => 0.6,
            EntryState::Focused | EntryState::Rest => 1.0,
        }
    }

    pub fn scale(self) -> f32 {
        match self {
            EntryState::Dimmed => 0.98,
            EntryState::Focused | EntryState::Rest => 1.0,
        }
    }
}

/// A timeline entry with its glow parsed.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub entry: ExperienceEntry,
    pub glow: GlowSpec,
}

/// What a hover change asks the glow overlay to show.
#[derive(Debug, Clone, PartialEq)]
pub enum GlowRequest {
    Activate(GlowSpec),
    Clear,
}

/// The "Mission Log": hovering an entry focuses it and lights the page glow.
#[derive(Debug, Clone)]
pub struct ExperienceTimeline {
    entries: Vec<TimelineEntry>,
    hovered: Option<usize>,
}

impl ExperienceTimeline {
    /// Parses every entry's glow layers up front.
    pub fn new(entries: &[ExperienceEntry]) -> Result<Self, PageError> {
        let entries = entries
            .iter()
            .map(|entry| {
                let glow = GlowSpec::parse(&entry.glow).map_err(|source| PageError::Glow {
                    entry: entry.company.clone(),
                    source,
                })?;
                Ok(TimelineEntry {
                    entry: entry.clone(),
                    glow,
                })
            })
            .collect::<Result<Vec<_>, PageError>>()?;
        Ok(Self {
            entries,
            hovered: None,
        })
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    /// `None` for an index outside the timeline.
    pub fn hover_enter(&mut self, index: usize) -> Option<GlowRequest> {
        let entry = self.entries.get(index)?;
        self.hovered = Some(index);
        debug!(index, company = %entry.entry.company, "experience hovered");
        Some(GlowRequest::Activate(entry.glow.clone()))
    }

    pub fn hover_leave(&mut self) -> GlowRequest {
        self.hovered = None;
        GlowRequest::Clear
    }

    pub fn state(&self, index: usize) -> EntryState {
        match self.hovered {
            Some(hovered) if hovered == index => EntryState::Focused,
            Some(_) => EntryState::Dimmed,
            None => EntryState::Rest,
        }
    }

    pub fn states(&self) -> Vec<EntryState> {
        (0..self.entries.len()).map(|index| self.state(index)).collect()
    }
}
