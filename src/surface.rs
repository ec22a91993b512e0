//! Rendering-surface seam
//!
//! The rendering surface is the external collaborator that displays
//! annotation state and reports edits. The core talks to it through two
//! fire-and-forget commands; its replies come back asynchronously as
//! [`SurfaceEvent`]s on the session's event channel, which marshals them
//! onto the session executor.

use async_trait::async_trait;

use crate::annotations::AnnotationState;

/// Commands the core issues to the rendering surface.
///
/// Implementations must eventually answer each command with the matching
/// [`SurfaceEvent`]; there is no synchronous reply.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Ask for the full current annotation state. Answered later with
    /// [`SurfaceEvent::CurrentState`].
    async fn request_current_state(&self);

    /// Apply a historical state visually. Answered later with
    /// [`SurfaceEvent::LoadConfirmed`] carrying the index the surface
    /// actually finished loading.
    async fn load_state(&self, target: u64, state: AnnotationState);
}

/// Asynchronous replies from the rendering surface
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// The full current state, answering a `request_current_state`
    CurrentState(AnnotationState),
    /// A historical load finished being applied
    LoadConfirmed { index: u64 },
}
