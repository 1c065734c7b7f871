use std::time::Instant;

use motion::{
    ElementBox, Keyframes, ListenerRegistry, MotionError, Parallax, PointerSample,
    ScrollProgressDriver, SpringParams, Tilt, Viewport,
};
use serde::Serialize;

use crate::remote_panel::RemotePanel;

const FILTER_STOPS: [f32; 4] = [0.0, 0.3, 0.7, 1.0];

/// Blur plus red/green drop shadows that fake chromatic aberration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChromaticFilter {
    pub blur_px: f32,
    pub shadow_px: f32,
    pub shadow_alpha: f32,
}

impl ChromaticFilter {
    pub fn to_css(&self) -> String {
        // avoid printing "-0px" for the mirrored shadow
        let mirrored = if self.shadow_px == 0.0 { 0.0 } else { -self.shadow_px };
        format!(
            "blur({blur}px) drop-shadow({x}px 0 0 rgba(255,0,0,{a})) drop-shadow({nx}px 0 0 rgba(0,255,0,{a}))",
            blur = self.blur_px,
            x = self.shadow_px,
            nx = mirrored,
            a = self.shadow_alpha,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransitionFrame {
    pub progress: f64,
    pub scale_x: f32,
    pub filter: ChromaticFilter,
    pub tilt: Tilt,
}

/// The 150vh section between hero and experience: a 3D scene that stretches
/// and fringes at the edges of its scroll range and tilts with the pointer.
#[derive(Debug)]
pub struct TransitionSection {
    driver: ScrollProgressDriver,
    scale_x: Keyframes,
    blur: Keyframes,
    shadow: Keyframes,
    shadow_alpha: Keyframes,
    parallax: Parallax,
    panel: RemotePanel,
}

impl TransitionSection {
    pub fn new(
        element: ElementBox,
        viewport: Viewport,
        tilt_degrees: f32,
        spring: SpringParams,
        panel: RemotePanel,
    ) -> Result<Self, MotionError> {
        Ok(Self {
            driver: ScrollProgressDriver::new("transition", element, viewport),
            scale_x: Keyframes::new([(0.0, 1.1), (0.5, 1.0), (1.0, 1.1)])?,
            blur: Keyframes::from_stops(&FILTER_STOPS, &[8.0, 0.0, 0.0, 8.0])?,
            shadow: Keyframes::from_stops(&FILTER_STOPS, &[10.0, 0.0, 0.0, 10.0])?,
            shadow_alpha: Keyframes::from_stops(&FILTER_STOPS, &[0.5, 0.0, 0.0, 0.5])?,
            parallax: Parallax::new(tilt_degrees, spring)?,
            panel,
        })
    }

    pub fn mount(&mut self, registry: &mut ListenerRegistry) {
        self.driver.attach(registry);
        self.panel.mount();
    }

    pub fn teardown(&mut self, registry: &mut ListenerRegistry) {
        self.driver.detach(registry);
    }

    pub fn panel(&self) -> &RemotePanel {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut RemotePanel {
        &mut self.panel
    }

    pub fn on_scroll(&mut self, scroll_y: f64) {
        self.driver.on_scroll(scroll_y);
    }

    pub fn on_resize(&mut self, viewport: Viewport, element: ElementBox) {
        self.driver.on_resize(viewport, element);
    }

    pub fn pointer_moved(&mut self, sample: PointerSample) {
        self.parallax.set_pointer(sample);
    }

    pub fn frame(&mut self, now: Instant) -> TransitionFrame {
        let progress = self.driver.progress();
        let p = progress as f32;
        TransitionFrame {
            progress,
            scale_x: self.scale_x.sample(p),
            filter: ChromaticFilter {
                blur_px: self.blur.sample(p),
                shadow_px: self.shadow.sample(p),
                shadow_alpha: self.shadow_alpha.sample(p),
            },
            tilt: self.parallax.advance(now),
        }
    }
}
