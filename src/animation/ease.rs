use std::f32::consts::PI;

/// Interpolation curves selectable by numeric id on a transition profile.
///
/// Curves are applied to the reverse ratio (1 at the far end of a transition, 0 at rest), so the
/// ease-in shapes below decelerate the overlay as it settles and accelerate it as it leaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Interpolation {
    /// Identity mapping (id 0). Also the fallback for unknown ids.
    #[default]
    Linear,
    /// Sine ease-in (id 1).
    Sine,
    /// Quadratic ease-in (id 2).
    Quadratic,
    /// Cubic ease-in (id 3).
    Cubic,
    /// Quartic ease-in (id 4).
    Quartic,
    /// Quintic ease-in (id 5).
    Quintic,
    /// Circular ease-in (id 6).
    Circular,
    /// Exponential ease-in (id 7).
    Exponential,
    /// Bounce ease-in (id 8).
    Bounce,
}

impl Interpolation {
    /// Every curve, ordered by id.
    pub const ALL: [Self; 9] = [
        Self::Linear,
        Self::Sine,
        Self::Quadratic,
        Self::Cubic,
        Self::Quartic,
        Self::Quintic,
        Self::Circular,
        Self::Exponential,
        Self::Bounce,
    ];

    /// Resolve a wire id. Unknown ids map to [`Interpolation::Linear`].
    pub fn from_id(id: u32) -> Self {
        match Self::ALL.get(id as usize) {
            Some(curve) => *curve,
            None => {
                tracing::debug!(id, "unknown interpolation id, using linear");
                Self::Linear
            }
        }
    }

    /// Wire id of this curve.
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Map normalized progress `t` in `[0, 1]`; out-of-range input is clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::Sine => 1.0 - (t * PI / 2.0).cos(),
            Self::Quadratic => t * t,
            Self::Cubic => t * t * t,
            Self::Quartic => t.powi(4),
            Self::Quintic => t.powi(5),
            Self::Circular => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Self::Exponential => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            Self::Bounce => 1.0 - bounce_out(1.0 - t),
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
