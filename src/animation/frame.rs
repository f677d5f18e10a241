use crate::foundation::core::{HEADSET_DEVICE_INDEX, Pose, PoseExt, Vec3};
use crate::payload::model::{Properties, Transition};

/// Everything pushed to the compositor for one animated frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayFrame {
    /// Overlay pose relative to `origin`.
    pub transform: Pose,
    /// Tracked device the pose is relative to; `None` is absolute tracking space.
    pub origin: Option<u32>,
    /// Opacity.
    pub alpha: f32,
    /// Width in meters.
    pub width: f32,
}

/// Compose the overlay state for an interpolated reverse ratio `reverse` (1 far, 0 at rest).
///
/// Headset-locked notifications are placed relative to the headset device from an identity
/// base; world-placed ones start from `head_pose`, the pose captured when the cycle began.
pub fn compose_frame(
    properties: &Properties,
    transition: &Transition,
    head_pose: &Pose,
    base_width: f32,
    reverse: f32,
) -> OverlayFrame {
    let ratio = 1.0 - reverse;
    let (base, origin) = if properties.headset {
        (Pose::IDENTITY, Some(HEADSET_DEVICE_INDEX))
    } else {
        (*head_pose, None)
    };

    let transform = base
        .rotate_y(-properties.yaw)
        .rotate_x(properties.pitch)
        .translate(Vec3::new(
            transition.horizontal * reverse,
            transition.vertical * reverse,
            -properties.distance - transition.distance * reverse,
        ))
        .rotate_z(transition.spin * reverse);

    OverlayFrame {
        transform,
        origin,
        alpha: transition.opacity + ratio * (1.0 - transition.opacity),
        width: base_width * (transition.scale + ratio * (1.0 - transition.scale)),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/frame.rs"]
mod tests;
