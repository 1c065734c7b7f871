//! Outbound HTTP for the site: the contact form submission and the remote 3D
//! scenes shown in the transition and testimonials sections.

mod contact;
mod scene;

pub use contact::{ContactMessage, ContactTransport, HttpContactTransport, TransportError};
pub use scene::{CachedScene, HttpSceneSource, SceneAsset, SceneCache, SceneSource};
