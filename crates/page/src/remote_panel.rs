use remote::{SceneAsset, SceneSource};
use serde::Serialize;
use tracing::{debug, warn};

/// Load state of an embedded 3D scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    Idle,
    Loading,
    Ready(SceneAsset),
    Failed { reason: String },
}

/// What the panel occupies its region with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PanelView {
    /// Nothing: not mounted yet, or the viewer failed.
    Empty,
    Placeholder,
    Scene { bytes: usize },
}

/// Lazy wrapper around the third-party scene viewer.
///
/// Nothing is fetched until the panel is mounted, and any failure degrades to
/// an empty region instead of propagating.
#[derive(Debug, Clone)]
pub struct RemotePanel {
    scene_id: String,
    url: String,
    state: PanelState,
}

impl RemotePanel {
    pub fn new(scene_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            scene_id: scene_id.into(),
            url: url.into(),
            state: PanelState::Idle,
        }
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    /// Enters `Loading`. Returns `false` unless the panel was idle.
    pub fn mount(&mut self) -> bool {
        if self.state != PanelState::Idle {
            return false;
        }
        debug!(scene = %self.scene_id, "remote panel loading");
        self.state = PanelState::Loading;
        true
    }

    /// Resolves a pending load through `source`.
    pub fn resolve(&mut self, source: &dyn SceneSource) -> &PanelState {
        if self.state == PanelState::Loading {
            self.state = match source.load(&self.scene_id, &self.url) {
                Ok(asset) => PanelState::Ready(asset),
                Err(err) => {
                    let reason = format!("{err:#}");
                    warn!(scene = %self.scene_id, error = %reason, "scene viewer failed; leaving region empty");
                    PanelState::Failed { reason }
                }
            };
        }
        &self.state
    }

    pub fn view(&self) -> PanelView {
        match &self.state {
            PanelState::Idle | PanelState::Failed { .. } => PanelView::Empty,
            PanelState::Loading => PanelView::Placeholder,
            PanelState::Ready(asset) => PanelView::Scene {
                bytes: asset.bytes.len(),
            },
        }
    }
}
