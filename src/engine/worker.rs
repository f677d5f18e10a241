use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::animation::animator::Animator;
use crate::animation::plan::Stage;
use crate::engine::EngineShared;
use crate::engine::pacing::frame_sleep;
use crate::foundation::core::FrameRate;
use crate::payload::model::Payload;

/// Body of the engine thread. Owns the animator; dropping the worker releases the overlay and only
/// then marks the engine as stopped, on every exit path including unwinding.
pub(crate) struct Worker<F> {
    pub(crate) animator: Animator,
    pub(crate) fetch: F,
    pub(crate) shared: Arc<EngineShared>,
    pub(crate) idle_poll: Duration,
    pub(crate) min_frame_sleep: Duration,
}

impl<F> Drop for Worker<F> {
    fn drop(&mut self) {
        self.animator.release();
        self.shared.stage.store(Stage::Idle.to_u8(), Ordering::Release);
        self.shared.running.store(false, Ordering::Release);
    }
}

impl<F> Worker<F>
where
    F: FnMut() -> Option<Payload>,
{
    pub(crate) fn run(mut self) {
        let span = tracing::debug_span!("engine", overlay = self.animator.overlay().0);
        let _enter = span.enter();
        tracing::debug!("engine started");

        loop {
            if self.shared.signal.is_requested() {
                break;
            }
            let started = Instant::now();

            if self.animator.is_idle() {
                let Some(payload) = self.next_payload() else {
                    self.shared.signal.sleep(self.idle_poll);
                    continue;
                };
                if !self.start(payload) {
                    self.shared.signal.sleep(self.idle_poll);
                    continue;
                }
            }

            let period = self.animator.frame_period();
            let Some(report) = self.animator.step() else {
                continue;
            };
            if report.completed {
                self.shared.stage.store(Stage::Idle.to_u8(), Ordering::Release);
                self.shared.completed.fetch_add(1, Ordering::AcqRel);
            } else {
                self.shared.stage.store(report.stage.to_u8(), Ordering::Release);
            }

            if let Some(period) = period {
                self.shared
                    .signal
                    .sleep(frame_sleep(period, started.elapsed(), self.min_frame_sleep));
            }
        }

        tracing::debug!("engine stopping");
    }

    fn next_payload(&mut self) -> Option<Payload> {
        let provided = self.shared.handoff.lock().take();
        provided.or_else(|| (self.fetch)())
    }

    fn start(&mut self, payload: Payload) -> bool {
        let rate = FrameRate::resolve(
            self.shared.default_hz.load(Ordering::Acquire),
            FrameRate::DEFAULT,
        );
        match self.animator.begin(payload, rate) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "payload dropped");
                false
            }
        }
    }
}
