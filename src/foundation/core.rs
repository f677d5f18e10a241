use std::time::Duration;

use crate::foundation::error::{NotifyError, NotifyResult};

pub use glam::{Affine3A, Vec3};

/// Rigid overlay pose (rotation + translation), the 3x4 matrix VR runtimes consume.
pub type Pose = Affine3A;

/// Tracked device index of the headset; transforms pushed relative to it follow the head.
pub const HEADSET_DEVICE_INDEX: u32 = 0;

/// Left-to-right pose composition helpers.
///
/// Every operation post-multiplies, so `pose.rotate_y(a).translate(v)` first rotates the local
/// frame and then moves along the rotated axes. Angles are in degrees.
pub trait PoseExt: Sized {
    /// Rotate about the local X (horizontal) axis.
    fn rotate_x(self, degrees: f32) -> Self;
    /// Rotate about the local Y (vertical) axis.
    fn rotate_y(self, degrees: f32) -> Self;
    /// Rotate about the local Z (view) axis.
    fn rotate_z(self, degrees: f32) -> Self;
    /// Translate along the local axes.
    fn translate(self, offset: Vec3) -> Self;
    /// Row-major 3x4 matrix, the layout of `HmdMatrix34_t`.
    fn to_rows(self) -> [[f32; 4]; 3];
}

impl PoseExt for Pose {
    fn rotate_x(self, degrees: f32) -> Self {
        self * Affine3A::from_rotation_x(degrees.to_radians())
    }

    fn rotate_y(self, degrees: f32) -> Self {
        self * Affine3A::from_rotation_y(degrees.to_radians())
    }

    fn rotate_z(self, degrees: f32) -> Self {
        self * Affine3A::from_rotation_z(degrees.to_radians())
    }

    fn translate(self, offset: Vec3) -> Self {
        self * Affine3A::from_translation(offset)
    }

    fn to_rows(self) -> [[f32; 4]; 3] {
        let m = self.matrix3;
        let t = self.translation;
        [
            [m.x_axis.x, m.y_axis.x, m.z_axis.x, t.x],
            [m.x_axis.y, m.y_axis.y, m.z_axis.y, t.y],
            [m.x_axis.z, m.y_axis.z, m.z_axis.z, t.z],
        ]
    }
}

/// Animation frame rate in Hz, always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameRate(u32);

impl FrameRate {
    /// Engine default when neither payload nor configuration specify a rate.
    pub const DEFAULT: Self = Self(60);

    /// Validate and wrap a rate.
    pub fn new(hz: u32) -> NotifyResult<Self> {
        if hz == 0 {
            return Err(NotifyError::validation("frame rate must be > 0"));
        }
        Ok(Self(hz))
    }

    /// Pick `requested` when it is set, otherwise `fallback`. Zero means "unset".
    pub fn resolve(requested: u32, fallback: Self) -> Self {
        if requested > 0 {
            Self(requested)
        } else {
            fallback
        }
    }

    /// Rate in Hz.
    pub fn hz(self) -> u32 {
        self.0
    }

    /// Whole milliseconds per frame. Rates above 1000 Hz clamp to 1 ms.
    pub fn ms_per_frame(self) -> u32 {
        (1000 / self.0).max(1)
    }

    /// Nominal frame period used for pacing.
    pub fn frame_period(self) -> Duration {
        Duration::from_millis(u64::from(self.ms_per_frame()))
    }

    /// Whole frames that fit in `ms` milliseconds (floor).
    pub fn frames_in(self, ms: u32) -> u32 {
        ms / self.ms_per_frame()
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
