use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PointerMove,
    Scroll,
    Resize,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventKind::PointerMove => "pointermove",
            EventKind::Scroll => "scroll",
            EventKind::Resize => "resize",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
struct Registration {
    kind: EventKind,
    owner: String,
}

/// Book of global input listeners currently attached.
///
/// Components own the [`ListenerId`] they were handed and must detach it on
/// teardown; detaching an id twice is a no-op.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    next: u64,
    active: BTreeMap<ListenerId, Registration>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, kind: EventKind, owner: &str) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.active.insert(
            id,
            Registration {
                kind,
                owner: owner.to_string(),
            },
        );
        debug!(%kind, owner, "listener attached");
        id
    }

    /// Returns `false` if the listener was already detached.
    pub fn detach(&mut self, id: ListenerId) -> bool {
        match self.active.remove(&id) {
            Some(registration) => {
                debug!(kind = %registration.kind, owner = %registration.owner, "listener detached");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, id: ListenerId) -> bool {
        self.active.contains_key(&id)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.active
            .values()
            .filter(|registration| registration.kind == kind)
            .count()
    }

    pub fn total(&self) -> usize {
        self.active.len()
    }

    /// Owners still holding a listener, for leak reports.
    pub fn owners(&self) -> Vec<(EventKind, &str)> {
        self.active
            .values()
            .map(|registration| (registration.kind, registration.owner.as_str()))
            .collect()
    }
}
