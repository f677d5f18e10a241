//! vrnotify animates notification overlays inside a VR compositor.
//!
//! Each overlay gets its own frame-paced engine thread that pulls payloads one at a time and moves
//! a textured quad through ease-in, hold and ease-out:
//!
//! - Open an [`OverlayChannel`] against a [`Compositor`]
//! - [`OverlayChannel::enqueue`] [`Payload`]s; they play in order
//! - Drop the channel (or call [`OverlayChannel::deinit`]) to destroy the overlay
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod channel;
pub(crate) mod compositor;
pub(crate) mod engine;
pub(crate) mod payload;
pub(crate) mod texture;

pub use crate::foundation::core::{FrameRate, HEADSET_DEVICE_INDEX, Pose, PoseExt, Vec3};
pub use crate::foundation::error::{NotifyError, NotifyResult};

pub use crate::animation::animator::{Animator, FrameReport};
pub use crate::animation::ease::Interpolation;
pub use crate::animation::frame::{OverlayFrame, compose_frame};
pub use crate::animation::plan::{PhasePlan, Stage};
pub use crate::channel::{ChannelOpts, OverlayChannel};
pub use crate::compositor::recording::{CompositorCall, RecordingCompositor};
pub use crate::compositor::{Compositor, OverlayHandle};
pub use crate::engine::{AnimationEngine, EngineOpts};
pub use crate::payload::model::{Payload, Properties, Transition};
pub use crate::payload::queue::PayloadQueue;
pub use crate::texture::image_loader::{ImageTextureLoader, PreparedTexture, decode_texture};
pub use crate::texture::{TextureLoader, TextureSize};
