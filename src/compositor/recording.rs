use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::compositor::{Compositor, OverlayHandle};
use crate::foundation::core::Pose;
use crate::foundation::error::{NotifyError, NotifyResult};

/// One call observed by a [`RecordingCompositor`].
#[derive(Clone, Debug, PartialEq)]
pub enum CompositorCall {
    /// `create_overlay` succeeded.
    Create {
        /// Handle that was issued.
        overlay: OverlayHandle,
        /// Overlay key.
        key: String,
        /// Overlay title.
        title: String,
        /// Initial transform.
        transform: Pose,
        /// Initial width.
        width: f32,
    },
    /// `destroy_overlay`.
    Destroy(OverlayHandle),
    /// `set_visibility`.
    Visibility(OverlayHandle, bool),
    /// `set_transform` with pose and origin device.
    Transform(OverlayHandle, Pose, Option<u32>),
    /// `set_alpha`.
    Alpha(OverlayHandle, f32),
    /// `set_width`.
    Width(OverlayHandle, f32),
    /// `head_pose` query.
    HeadPose,
}

impl CompositorCall {
    /// Overlay the call targeted, if any.
    pub fn overlay(&self) -> Option<OverlayHandle> {
        match self {
            Self::Create { overlay, .. } => Some(*overlay),
            Self::Destroy(h)
            | Self::Visibility(h, _)
            | Self::Transform(h, _, _)
            | Self::Alpha(h, _)
            | Self::Width(h, _) => Some(*h),
            Self::HeadPose => None,
        }
    }
}

#[derive(Debug)]
struct Inner {
    calls: Vec<CompositorCall>,
    live: BTreeMap<OverlayHandle, String>,
    next_handle: u64,
    head_pose: Pose,
    fail_create: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            live: BTreeMap::new(),
            next_handle: 1,
            head_pose: Pose::IDENTITY,
            fail_create: false,
        }
    }
}

impl Inner {
    fn require_live(&self, overlay: OverlayHandle) -> NotifyResult<()> {
        if self.live.contains_key(&overlay) {
            Ok(())
        } else {
            Err(NotifyError::compositor(format!(
                "unknown overlay handle {}",
                overlay.0
            )))
        }
    }
}

/// In-memory compositor for tests, headless runs and debugging.
///
/// Every call is appended to a shared log; clones observe the same log. Mutations on handles that
/// were never created (or already destroyed) are rejected the way a real runtime would.
#[derive(Clone, Debug, Default)]
pub struct RecordingCompositor {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingCompositor {
    /// Create an empty compositor with an identity head pose.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder variant of [`RecordingCompositor::set_head_pose`].
    pub fn with_head_pose(self, pose: Pose) -> Self {
        self.set_head_pose(pose);
        self
    }

    /// Pose returned by subsequent `head_pose` queries.
    pub fn set_head_pose(&self, pose: Pose) {
        self.inner.lock().head_pose = pose;
    }

    /// Make `create_overlay` fail, simulating a runtime that refuses new overlays.
    pub fn set_fail_create(&self, fail: bool) {
        self.inner.lock().fail_create = fail;
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<CompositorCall> {
        self.inner.lock().calls.clone()
    }

    /// Drain the call log.
    pub fn take_calls(&self) -> Vec<CompositorCall> {
        std::mem::take(&mut self.inner.lock().calls)
    }

    /// Handles created and not yet destroyed.
    pub fn live_overlays(&self) -> Vec<OverlayHandle> {
        self.inner.lock().live.keys().copied().collect()
    }

    fn mutate(&self, call: CompositorCall) -> NotifyResult<()> {
        let mut inner = self.inner.lock();
        if let Some(overlay) = call.overlay() {
            inner.require_live(overlay)?;
        }
        tracing::trace!(?call, "compositor call");
        inner.calls.push(call);
        Ok(())
    }
}

impl Compositor for RecordingCompositor {
    fn create_overlay(
        &self,
        key: &str,
        title: &str,
        transform: &Pose,
        width: f32,
    ) -> NotifyResult<OverlayHandle> {
        let mut inner = self.inner.lock();
        if inner.fail_create {
            return Err(NotifyError::resource(format!(
                "overlay '{key}' could not be created"
            )));
        }
        if inner.live.values().any(|k| k == key) {
            return Err(NotifyError::resource(format!(
                "overlay key '{key}' is already in use"
            )));
        }

        let overlay = OverlayHandle(inner.next_handle);
        inner.next_handle += 1;
        inner.live.insert(overlay, key.to_string());
        tracing::debug!(overlay = overlay.0, key, "overlay created");
        inner.calls.push(CompositorCall::Create {
            overlay,
            key: key.to_string(),
            title: title.to_string(),
            transform: *transform,
            width,
        });
        Ok(overlay)
    }

    fn destroy_overlay(&self, overlay: OverlayHandle) -> NotifyResult<()> {
        let mut inner = self.inner.lock();
        inner.require_live(overlay)?;
        inner.live.remove(&overlay);
        tracing::debug!(overlay = overlay.0, "overlay destroyed");
        inner.calls.push(CompositorCall::Destroy(overlay));
        Ok(())
    }

    fn set_visibility(&self, overlay: OverlayHandle, visible: bool) -> NotifyResult<()> {
        self.mutate(CompositorCall::Visibility(overlay, visible))
    }

    fn set_transform(
        &self,
        overlay: OverlayHandle,
        transform: &Pose,
        origin: Option<u32>,
    ) -> NotifyResult<()> {
        self.mutate(CompositorCall::Transform(overlay, *transform, origin))
    }

    fn set_alpha(&self, overlay: OverlayHandle, alpha: f32) -> NotifyResult<()> {
        self.mutate(CompositorCall::Alpha(overlay, alpha))
    }

    fn set_width(&self, overlay: OverlayHandle, width: f32) -> NotifyResult<()> {
        self.mutate(CompositorCall::Width(overlay, width))
    }

    fn head_pose(&self) -> Pose {
        let mut inner = self.inner.lock();
        inner.calls.push(CompositorCall::HeadPose);
        inner.head_pose
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/recording.rs"]
mod tests;
