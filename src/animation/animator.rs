use std::sync::Arc;
use std::time::Duration;

use crate::animation::ease::Interpolation;
use crate::animation::frame::{OverlayFrame, compose_frame};
use crate::animation::plan::{PhasePlan, Stage};
use crate::compositor::{Compositor, OverlayHandle};
use crate::foundation::core::{FrameRate, Pose};
use crate::foundation::error::{NotifyError, NotifyResult};
use crate::payload::model::{Payload, Properties, Transition};
use crate::texture::TextureLoader;

#[derive(Clone, Debug, Default)]
struct AnimationState {
    stage: Stage,
    frame: u32,
    plan: PhasePlan,
    properties: Properties,
    transition: Transition,
    curve: Interpolation,
    width: f32,
    height: f32,
    head_pose: Pose,
    last_frame: Option<OverlayFrame>,
}

impl AnimationState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of one [`Animator::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame index that was animated.
    pub frame: u32,
    /// Phase the frame belonged to.
    pub stage: Stage,
    /// Whether transform/alpha/width were pushed to the compositor.
    pub pushed: bool,
    /// Whether this frame completed the cycle (the animator is idle again).
    pub completed: bool,
}

/// Per-overlay animation state machine.
///
/// Owns the overlay handle and its texture; [`Animator::release`] (or drop) unloads the texture
/// and destroys the overlay exactly once. Compositor failures during a cycle are logged and the
/// cycle continues.
pub struct Animator {
    compositor: Arc<dyn Compositor>,
    overlay: OverlayHandle,
    texture: Box<dyn TextureLoader>,
    payload: Option<Payload>,
    state: AnimationState,
    released: bool,
}

impl std::fmt::Debug for Animator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animator")
            .field("overlay", &self.overlay)
            .field("active", &self.payload.is_some())
            .field("state", &self.state)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl Animator {
    /// Take ownership of `overlay` and its texture loader.
    pub fn new(
        compositor: Arc<dyn Compositor>,
        overlay: OverlayHandle,
        texture: Box<dyn TextureLoader>,
    ) -> Self {
        Self {
            compositor,
            overlay,
            texture,
            payload: None,
            state: AnimationState::default(),
            released: false,
        }
    }

    /// Start a cycle for `payload`.
    ///
    /// Loads the texture, sizes the overlay from its aspect ratio and snapshots the head pose.
    /// On texture failure nothing is started and the animator stays idle.
    pub fn begin(&mut self, payload: Payload, default_rate: FrameRate) -> NotifyResult<PhasePlan> {
        if self.released {
            return Err(NotifyError::resource("overlay has been released"));
        }
        if self.payload.is_some() {
            return Err(NotifyError::validation("a cycle is already active"));
        }

        let size = match self.texture.load(&payload.image) {
            Ok(size) => size,
            Err(err) => {
                self.texture.unload();
                return Err(err);
            }
        };

        let plan = PhasePlan::for_payload(&payload, default_rate);
        let width = payload.properties.width;
        self.state = AnimationState {
            stage: Stage::Idle,
            frame: 0,
            plan,
            properties: payload.properties,
            transition: payload.transition,
            curve: payload.transition.curve(),
            width,
            height: width * size.aspect(),
            head_pose: self.compositor.head_pose(),
            last_frame: None,
        };
        tracing::debug!(
            overlay = self.overlay.0,
            hz = plan.hz,
            ease_in = plan.ease_in_frames,
            stay = plan.stay_frames,
            ease_out = plan.ease_out_frames,
            "cycle started"
        );
        self.payload = Some(payload);
        Ok(plan)
    }

    /// Animate one frame of the active cycle. Returns `None` when idle.
    pub fn step(&mut self) -> Option<FrameReport> {
        let payload = self.payload.as_ref()?;
        let frame = self.state.frame;
        let plan = self.state.plan;
        let stage = plan.phase_at(frame);

        if frame == 0 {
            self.state.transition = payload.transition;
            self.state.curve = payload.transition.curve();
        }
        if stage == Stage::EasingOut
            && frame == plan.stay_limit
            && let Some(t2) = payload.transition2
        {
            self.state.transition = t2;
            self.state.curve = t2.curve();
        }

        let pushed = stage != Stage::Staying || frame == plan.ease_in_limit;
        if pushed {
            let reverse = match stage {
                Stage::EasingIn | Stage::EasingOut => {
                    self.state.curve.apply(plan.reverse_ratio(stage, frame))
                }
                Stage::Idle | Stage::Staying | Stage::Finished => 0.0,
            };
            let composed = compose_frame(
                &self.state.properties,
                &self.state.transition,
                &self.state.head_pose,
                self.state.width,
                reverse,
            );
            self.push(&composed);
            self.state.last_frame = Some(composed);
        }
        if frame == 0 {
            let res = self.compositor.set_visibility(self.overlay, true);
            self.log_failure("show overlay", res);
        }

        self.state.stage = stage;
        self.state.frame = frame + 1;
        let completed = plan.is_complete(self.state.frame);
        if completed {
            self.finish();
        }

        Some(FrameReport {
            frame,
            stage,
            pushed,
            completed,
        })
    }

    fn push(&self, composed: &OverlayFrame) {
        let res = self
            .compositor
            .set_transform(self.overlay, &composed.transform, composed.origin);
        self.log_failure("set transform", res);
        let res = self.compositor.set_alpha(self.overlay, composed.alpha);
        self.log_failure("set alpha", res);
        let res = self.compositor.set_width(self.overlay, composed.width);
        self.log_failure("set width", res);
    }

    fn finish(&mut self) {
        self.state.stage = Stage::Finished;
        let res = self.compositor.set_visibility(self.overlay, false);
        self.log_failure("hide overlay", res);
        self.texture.unload();
        self.payload = None;
        tracing::debug!(
            overlay = self.overlay.0,
            frames = self.state.frame,
            "cycle finished"
        );
        self.state.reset();
    }

    fn log_failure(&self, what: &str, res: NotifyResult<()>) {
        if let Err(err) = res {
            tracing::warn!(overlay = self.overlay.0, error = %err, "{what} failed");
        }
    }

    /// Unload the texture and destroy the overlay. Later calls do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.texture.unload();
        self.payload = None;
        self.state.reset();
        let res = self.compositor.destroy_overlay(self.overlay);
        self.log_failure("destroy overlay", res);
    }

    /// Overlay driven by this animator.
    pub fn overlay(&self) -> OverlayHandle {
        self.overlay
    }

    /// Stage of the most recently animated frame; `Idle` between cycles.
    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    /// Frames animated so far in the active cycle.
    pub fn frame(&self) -> u32 {
        self.state.frame
    }

    /// Phase plan of the active cycle, `None` when idle.
    pub fn plan(&self) -> Option<&PhasePlan> {
        self.payload.as_ref().map(|_| &self.state.plan)
    }

    /// Overlay height derived from the texture aspect ratio, `None` when idle.
    pub fn height(&self) -> Option<f32> {
        self.payload.as_ref().map(|_| self.state.height)
    }

    /// `true` when no cycle is active.
    pub fn is_idle(&self) -> bool {
        self.payload.is_none()
    }

    /// Last state pushed to the compositor in the active cycle.
    pub fn last_frame(&self) -> Option<&OverlayFrame> {
        self.state.last_frame.as_ref()
    }

    /// Frame period of the active cycle, `None` when idle.
    pub fn frame_period(&self) -> Option<Duration> {
        self.plan()
            .map(|plan| Duration::from_millis(u64::from(plan.ms_per_frame)))
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/animator.rs"]
mod tests;
