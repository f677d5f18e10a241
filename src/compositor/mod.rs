use crate::foundation::core::Pose;
use crate::foundation::error::NotifyResult;

pub(crate) mod recording;

/// Native overlay handle issued by a [`Compositor`]. Zero is never a valid handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OverlayHandle(pub u64);

/// Overlay surface of a VR compositor runtime.
///
/// Implementations wrap a process-global runtime, so every method takes `&self` and the trait
/// is shared between the channel (create) and the engine thread (everything else) through an
/// `Arc<dyn Compositor>`.
///
/// Ordering contract: for a given handle the engine thread is the only caller of the mutation
/// methods, so calls arrive in frame order.
pub trait Compositor: Send + Sync {
    /// Create a hidden overlay identified by the unique `key`.
    fn create_overlay(
        &self,
        key: &str,
        title: &str,
        transform: &Pose,
        width: f32,
    ) -> NotifyResult<OverlayHandle>;

    /// Destroy an overlay. The handle is invalid afterwards.
    fn destroy_overlay(&self, overlay: OverlayHandle) -> NotifyResult<()>;

    /// Show or hide the overlay.
    fn set_visibility(&self, overlay: OverlayHandle, visible: bool) -> NotifyResult<()>;

    /// Place the overlay. `origin` is a tracked device index the pose is relative to, or `None`
    /// for the absolute tracking space.
    fn set_transform(
        &self,
        overlay: OverlayHandle,
        transform: &Pose,
        origin: Option<u32>,
    ) -> NotifyResult<()>;

    /// Set overlay opacity in `[0, 1]`.
    fn set_alpha(&self, overlay: OverlayHandle, alpha: f32) -> NotifyResult<()>;

    /// Set overlay width in meters.
    fn set_width(&self, overlay: OverlayHandle, width: f32) -> NotifyResult<()>;

    /// Current headset pose in the absolute tracking space.
    fn head_pose(&self) -> Pose;
}
