use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;

use crate::animation::animator::Animator;
use crate::animation::plan::Stage;
use crate::compositor::{Compositor, OverlayHandle};
use crate::engine::pacing::ShutdownSignal;
use crate::engine::worker::Worker;
use crate::foundation::core::FrameRate;
use crate::foundation::error::{NotifyError, NotifyResult};
use crate::payload::model::Payload;
use crate::texture::TextureLoader;

pub(crate) mod pacing;
pub(crate) mod worker;

/// Tuning knobs for an [`AnimationEngine`].
#[derive(Clone, Debug)]
pub struct EngineOpts {
    /// Rate used by payloads that leave `hz` at 0.
    pub default_hz: FrameRate,
    /// Sleep between fetch attempts while idle.
    pub idle_poll: Duration,
    /// Lower bound on the sleep after each animated frame.
    pub min_frame_sleep: Duration,
    /// Name of the worker thread.
    pub thread_name: String,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            default_hz: FrameRate::DEFAULT,
            idle_poll: Duration::from_millis(100),
            min_frame_sleep: Duration::from_millis(1),
            thread_name: "vrnotify-engine".to_string(),
        }
    }
}

/// State shared between the engine handle and its worker thread.
#[derive(Debug)]
pub(crate) struct EngineShared {
    pub(crate) signal: ShutdownSignal,
    pub(crate) default_hz: AtomicU32,
    pub(crate) handoff: Mutex<Option<Payload>>,
    pub(crate) stage: AtomicU8,
    pub(crate) completed: AtomicU64,
    pub(crate) running: AtomicBool,
}

/// Handle to one overlay's animation thread.
///
/// The thread pulls payloads through the fetch callback whenever it is idle, animates them one at
/// a time and destroys the overlay when it stops. Dropping the handle requests shutdown and joins
/// the thread.
#[derive(Debug)]
pub struct AnimationEngine {
    shared: Arc<EngineShared>,
    overlay: OverlayHandle,
    worker: Option<JoinHandle<()>>,
}

impl AnimationEngine {
    /// Start the engine thread for `overlay`, which it owns from now on.
    ///
    /// `fetch` is called from the engine thread whenever it is idle and nothing was provided
    /// through [`AnimationEngine::provide_new_payload`]. If the thread cannot be spawned the
    /// overlay is destroyed and a resource error is returned.
    pub fn spawn<F>(
        compositor: Arc<dyn Compositor>,
        overlay: OverlayHandle,
        texture: Box<dyn TextureLoader>,
        fetch: F,
        opts: EngineOpts,
    ) -> NotifyResult<Self>
    where
        F: FnMut() -> Option<Payload> + Send + 'static,
    {
        let shared = Arc::new(EngineShared {
            signal: ShutdownSignal::new(),
            default_hz: AtomicU32::new(opts.default_hz.hz()),
            handoff: Mutex::new(None),
            stage: AtomicU8::new(Stage::Idle.to_u8()),
            completed: AtomicU64::new(0),
            running: AtomicBool::new(true),
        });

        let worker = Worker {
            animator: Animator::new(compositor, overlay, texture),
            fetch,
            shared: shared.clone(),
            idle_poll: opts.idle_poll,
            min_frame_sleep: opts.min_frame_sleep,
        };

        let handle = std::thread::Builder::new()
            .name(opts.thread_name)
            .spawn(move || worker.run())
            .map_err(|e| {
                shared.running.store(false, Ordering::Release);
                NotifyError::resource(format!("spawn engine thread: {e}"))
            })?;

        Ok(Self {
            shared,
            overlay,
            worker: Some(handle),
        })
    }

    /// Hand a payload directly to the engine.
    ///
    /// It is picked up the next time the engine is idle, ahead of the fetch callback. A payload
    /// provided while another one is still waiting replaces it.
    pub fn provide_new_payload(&self, payload: Payload) {
        if self.shared.handoff.lock().replace(payload).is_some() {
            tracing::debug!(overlay = self.overlay.0, "waiting payload replaced");
        }
    }

    /// Default rate for cycles that start from now on. Zero is ignored.
    pub fn set_frame_rate(&self, hz: u32) {
        if hz == 0 {
            tracing::warn!(overlay = self.overlay.0, "ignoring frame rate of 0 Hz");
            return;
        }
        self.shared.default_hz.store(hz, Ordering::Release);
    }

    /// Current default rate.
    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::resolve(
            self.shared.default_hz.load(Ordering::Acquire),
            FrameRate::DEFAULT,
        )
    }

    /// Ask the engine thread to stop. Returns immediately; idempotent.
    pub fn shutdown(&self) {
        if !self.shared.signal.is_requested() {
            tracing::debug!(overlay = self.overlay.0, "engine shutdown requested");
        }
        self.shared.signal.request();
    }

    /// Stage of the most recently animated frame.
    pub fn stage(&self) -> Stage {
        Stage::from_u8(self.shared.stage.load(Ordering::Acquire))
    }

    /// Cycles that ran to completion.
    pub fn completed_cycles(&self) -> u64 {
        self.shared.completed.load(Ordering::Acquire)
    }

    /// `false` once the engine thread has exited.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Overlay owned by the engine.
    pub fn overlay(&self) -> OverlayHandle {
        self.overlay
    }

    /// Request shutdown and wait for the engine thread to exit.
    pub fn join(mut self) -> NotifyResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> NotifyResult<()> {
        self.shutdown();
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        handle
            .join()
            .map_err(|_| NotifyError::resource("engine thread panicked"))
    }
}

impl Drop for AnimationEngine {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(overlay = self.overlay.0, error = %err, "engine stopped abnormally");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/engine.rs"]
mod tests;
