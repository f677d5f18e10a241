use crate::foundation::core::FrameRate;
use crate::payload::model::Payload;

/// Lifecycle stage of one overlay's animation cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Stage {
    /// No active payload.
    #[default]
    Idle,
    /// Moving from the transition offsets towards rest.
    EasingIn,
    /// At rest; the overlay is left exactly as last set.
    Staying,
    /// Moving from rest back out to the (ease-out) transition offsets.
    EasingOut,
    /// Cycle complete; overlay hidden and texture released.
    Finished,
}

impl Stage {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::EasingIn => 1,
            Self::Staying => 2,
            Self::EasingOut => 3,
            Self::Finished => 4,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::EasingIn,
            2 => Self::Staying,
            3 => Self::EasingOut,
            4 => Self::Finished,
            _ => Self::Idle,
        }
    }
}

/// Phase boundaries of one cycle, in frames at the cycle's rate.
///
/// Invariant: `ease_in_limit + stay_frames + ease_out_frames == ease_out_limit`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct PhasePlan {
    /// Effective rate of the cycle.
    pub hz: u32,
    /// Whole milliseconds per frame.
    pub ms_per_frame: u32,
    /// Frames spent easing in.
    pub ease_in_frames: u32,
    /// Frames spent at rest.
    pub stay_frames: u32,
    /// Frames spent easing out.
    pub ease_out_frames: u32,
    /// First frame after easing in.
    pub ease_in_limit: u32,
    /// First frame of easing out.
    pub stay_limit: u32,
    /// Frame count at which the cycle is finished.
    pub ease_out_limit: u32,
}

impl PhasePlan {
    /// Split millisecond durations into frame counts at `rate` (floor division).
    pub fn new(rate: FrameRate, ease_in_ms: u32, stay_ms: u32, ease_out_ms: u32) -> Self {
        let ease_in_frames = rate.frames_in(ease_in_ms);
        let stay_frames = rate.frames_in(stay_ms);
        let ease_out_frames = rate.frames_in(ease_out_ms);

        let ease_in_limit = ease_in_frames;
        let stay_limit = ease_in_limit.saturating_add(stay_frames);
        let ease_out_limit = stay_limit.saturating_add(ease_out_frames);

        Self {
            hz: rate.hz(),
            ms_per_frame: rate.ms_per_frame(),
            ease_in_frames,
            stay_frames,
            ease_out_frames,
            ease_in_limit,
            stay_limit,
            ease_out_limit,
        }
    }

    /// Plan for `payload`, falling back to `default_rate` when the payload leaves `hz` unset.
    pub fn for_payload(payload: &Payload, default_rate: FrameRate) -> Self {
        let rate = payload.properties.frame_rate(default_rate);
        Self::new(
            rate,
            payload.transition.duration,
            payload.properties.duration,
            payload.ease_out_transition().duration,
        )
    }

    /// Frames in the whole cycle.
    pub fn total_frames(&self) -> u32 {
        self.ease_out_limit
    }

    /// Phase animated on `frame`. Frames past the easing-in and holding windows are easing out.
    pub fn phase_at(&self, frame: u32) -> Stage {
        if frame < self.ease_in_limit {
            Stage::EasingIn
        } else if frame >= self.stay_limit {
            Stage::EasingOut
        } else {
            Stage::Staying
        }
    }

    /// `true` once `frames_done` frames have been animated.
    pub fn is_complete(&self, frames_done: u32) -> bool {
        frames_done >= self.ease_out_limit
    }

    /// Reverse progress on `frame` before interpolation: 1 far from rest, 0 at rest.
    ///
    /// Easing out samples one frame ahead (`frame - stay_limit + 1`) because the last
    /// easing-out frame must reach the far end.
    pub fn reverse_ratio(&self, stage: Stage, frame: u32) -> f32 {
        match stage {
            Stage::EasingIn => {
                if self.ease_in_frames == 0 {
                    return 1.0;
                }
                1.0 - frame as f32 / self.ease_in_frames as f32
            }
            Stage::EasingOut => {
                if self.ease_out_frames == 0 {
                    return 1.0;
                }
                let into = frame.saturating_sub(self.stay_limit) + 1;
                into as f32 / self.ease_out_frames as f32
            }
            Stage::Idle | Stage::Staying | Stage::Finished => 0.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/plan.rs"]
mod tests;
