use std::sync::Arc;

use crate::compositor::{Compositor, OverlayHandle};
use crate::engine::{AnimationEngine, EngineOpts};
use crate::foundation::core::Pose;
use crate::foundation::error::NotifyResult;
use crate::payload::model::Payload;
use crate::payload::queue::PayloadQueue;
use crate::texture::TextureLoader;
use crate::texture::image_loader::ImageTextureLoader;

/// Configuration of one numbered notification channel.
#[derive(Clone, Debug)]
pub struct ChannelOpts {
    /// Channel number, appended to the overlay key.
    pub channel: u32,
    /// Overlay title shown by the compositor.
    pub title: String,
    /// Overlay key prefix; the key is `"{key_prefix}.{channel}"`.
    pub key_prefix: String,
    /// Width the overlay is created with before the first payload sizes it.
    pub initial_width: f32,
    /// Engine configuration.
    pub engine: EngineOpts,
}

impl Default for ChannelOpts {
    fn default() -> Self {
        Self {
            channel: 0,
            title: "vrnotify".to_string(),
            key_prefix: "vrnotify.overlay.texture".to_string(),
            initial_width: 1.0,
            engine: EngineOpts::default(),
        }
    }
}

type LoaderFactory = Box<dyn Fn() -> Box<dyn TextureLoader> + Send + Sync>;

/// One overlay plus the queue and engine that feed it.
///
/// Payloads enqueued on the channel play in order, one at a time, on the channel's engine thread.
pub struct OverlayChannel {
    compositor: Arc<dyn Compositor>,
    opts: ChannelOpts,
    queue: Arc<PayloadQueue>,
    loader_factory: LoaderFactory,
    engine: Option<AnimationEngine>,
}

impl std::fmt::Debug for OverlayChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayChannel")
            .field("opts", &self.opts)
            .field("queue", &self.queue)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl OverlayChannel {
    /// Create the channel overlay and start its engine, decoding images with
    /// [`ImageTextureLoader`].
    pub fn open(compositor: Arc<dyn Compositor>, opts: ChannelOpts) -> NotifyResult<Self> {
        Self::open_with_loader(compositor, opts, || Box::new(ImageTextureLoader::new()))
    }

    /// Like [`OverlayChannel::open`] with a custom texture loader, built anew for every engine.
    pub fn open_with_loader<L>(
        compositor: Arc<dyn Compositor>,
        opts: ChannelOpts,
        loader: L,
    ) -> NotifyResult<Self>
    where
        L: Fn() -> Box<dyn TextureLoader> + Send + Sync + 'static,
    {
        let mut channel = Self {
            compositor,
            opts,
            queue: Arc::new(PayloadQueue::new()),
            loader_factory: Box::new(loader),
            engine: None,
        };
        channel.start()?;
        Ok(channel)
    }

    /// Overlay key of this channel.
    pub fn overlay_key(&self) -> String {
        format!("{}.{}", self.opts.key_prefix, self.opts.channel)
    }

    fn start(&mut self) -> NotifyResult<()> {
        let key = self.overlay_key();
        let overlay = self.compositor.create_overlay(
            &key,
            &self.opts.title,
            &Pose::IDENTITY,
            self.opts.initial_width,
        )?;
        if let Err(err) = self.compositor.set_visibility(overlay, false) {
            tracing::warn!(key, error = %err, "hide new overlay failed");
        }

        let queue = self.queue.clone();
        let engine = AnimationEngine::spawn(
            self.compositor.clone(),
            overlay,
            (self.loader_factory)(),
            move || queue.dequeue(),
            self.opts.engine.clone(),
        )?;
        tracing::debug!(key, overlay = overlay.0, "channel initialized");
        self.engine = Some(engine);
        Ok(())
    }

    /// Queue a payload for playback.
    pub fn enqueue(&self, payload: Payload) {
        self.queue.enqueue(payload);
    }

    /// `true` while an engine is attached.
    pub fn is_initialized(&self) -> bool {
        self.engine.is_some()
    }

    /// Engine driving the overlay, if initialized.
    pub fn engine(&self) -> Option<&AnimationEngine> {
        self.engine.as_ref()
    }

    /// Overlay currently owned by the channel's engine.
    pub fn overlay(&self) -> Option<OverlayHandle> {
        self.engine.as_ref().map(AnimationEngine::overlay)
    }

    /// Pending payloads.
    pub fn queue(&self) -> &Arc<PayloadQueue> {
        &self.queue
    }

    /// Stop the current engine (destroying its overlay) and start over with a fresh overlay.
    /// Queued payloads are kept.
    pub fn reinit(&mut self) -> NotifyResult<()> {
        self.deinit()?;
        self.start()
    }

    /// Stop the engine and wait for it to release the overlay.
    pub fn deinit(&mut self) -> NotifyResult<()> {
        match self.engine.take() {
            Some(engine) => {
                tracing::debug!(key = self.overlay_key(), "channel deinitialized");
                engine.join()
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/channel.rs"]
mod tests;
