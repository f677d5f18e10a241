use std::path::Path;

use anyhow::Context as _;

use crate::animation::ease::Interpolation;
use crate::foundation::core::FrameRate;
use crate::foundation::error::{NotifyError, NotifyResult};

/// One notification to animate. Never mutated once handed to a queue or engine.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Payload {
    /// Encoded image bytes (PNG/JPEG), base64 in JSON.
    #[serde(rename = "imageData", with = "base64_bytes")]
    pub image: Vec<u8>,
    /// Image file to read when `image` is empty, relative to the payload document.
    #[serde(rename = "imagePath", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Placement and timing of the whole notification.
    pub properties: Properties,
    /// Ease-in profile.
    pub transition: Transition,
    /// Optional ease-out profile; the ease-in profile is reused when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition2: Option<Transition>,
}

impl Default for Payload {
    fn default() -> Self {
        Self {
            image: Vec::new(),
            image_path: None,
            properties: Properties::default(),
            transition: Transition::default(),
            transition2: None,
        }
    }
}

/// Placement and timing of a notification.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Properties {
    /// Overlay width in meters; height follows the texture aspect ratio.
    pub width: f32,
    /// Distance in front of the origin, meters.
    pub distance: f32,
    /// Horizontal angle in degrees, positive to the right.
    pub yaw: f32,
    /// Vertical angle in degrees, positive upwards.
    pub pitch: f32,
    /// Follow the headset every frame instead of staying where it appeared.
    pub headset: bool,
    /// Hold duration in milliseconds.
    pub duration: u32,
    /// Animation rate; 0 uses the engine default.
    pub hz: u32,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            width: 1.0,
            distance: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            headset: false,
            duration: 1000,
            hz: 0,
        }
    }
}

impl Properties {
    /// Effective frame rate for a cycle driven by these properties.
    pub fn frame_rate(&self, default: FrameRate) -> FrameRate {
        FrameRate::resolve(self.hz, default)
    }
}

/// Motion, opacity and scale parameters for one easing phase.
///
/// Offsets describe where the overlay is when the phase is furthest from rest; they shrink to
/// zero as the overlay settles.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Transition {
    /// Phase duration in milliseconds.
    pub duration: u32,
    /// Interpolation id, see [`Interpolation::from_id`].
    pub interpolation: u32,
    /// Horizontal offset, meters.
    pub horizontal: f32,
    /// Vertical offset, meters.
    pub vertical: f32,
    /// Extra distance away from the viewer, meters.
    pub distance: f32,
    /// Roll about the view axis, degrees.
    pub spin: f32,
    /// Opacity at the far end, `[0, 1]`.
    pub opacity: f32,
    /// Width factor at the far end, `[0, 1]`.
    pub scale: f32,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            duration: 250,
            interpolation: 0,
            horizontal: 0.0,
            vertical: 0.0,
            distance: 0.0,
            spin: 0.0,
            opacity: 0.0,
            scale: 1.0,
        }
    }
}

impl Transition {
    /// Resolved interpolation curve.
    pub fn curve(&self) -> Interpolation {
        Interpolation::from_id(self.interpolation)
    }

    fn validate(&self, label: &str) -> NotifyResult<()> {
        let floats = [
            self.horizontal,
            self.vertical,
            self.distance,
            self.spin,
            self.opacity,
            self.scale,
        ];
        if floats.iter().any(|v| !v.is_finite()) {
            return Err(NotifyError::validation(format!(
                "{label} values must be finite"
            )));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(NotifyError::validation(format!(
                "{label}.opacity must be within [0, 1]"
            )));
        }
        if !(0.0..=1.0).contains(&self.scale) {
            return Err(NotifyError::validation(format!(
                "{label}.scale must be within [0, 1]"
            )));
        }
        Ok(())
    }
}

impl Payload {
    /// Parse a single payload document.
    pub fn from_json(s: &str) -> NotifyResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse either one payload object or an array of them.
    pub fn list_from_json(s: &str) -> NotifyResult<Vec<Self>> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<Payload>),
            One(Box<Payload>),
        }

        match serde_json::from_str(s)? {
            OneOrMany::Many(list) => Ok(list),
            OneOrMany::One(one) => Ok(vec![*one]),
        }
    }

    /// Profile used while easing out.
    pub fn ease_out_transition(&self) -> &Transition {
        self.transition2.as_ref().unwrap_or(&self.transition)
    }

    /// Fill `image` from `image_path` (relative to `root`) when no inline data is present.
    pub fn resolve_image(mut self, root: &Path) -> NotifyResult<Self> {
        if !self.image.is_empty() {
            return Ok(self);
        }
        if let Some(rel) = self.image_path.as_deref() {
            let path = root.join(rel);
            self.image = std::fs::read(&path)
                .with_context(|| format!("read payload image '{}'", path.display()))?;
        }
        Ok(self)
    }

    /// Check ranges the animation math relies on.
    pub fn validate(&self) -> NotifyResult<()> {
        let p = &self.properties;
        if !(p.width.is_finite() && p.width > 0.0) {
            return Err(NotifyError::validation(
                "properties.width must be finite and > 0",
            ));
        }
        if ![p.distance, p.yaw, p.pitch].iter().all(|v| v.is_finite()) {
            return Err(NotifyError::validation(
                "properties distance/yaw/pitch must be finite",
            ));
        }
        self.transition.validate("transition")?;
        if let Some(t2) = &self.transition2 {
            t2.validate("transition2")?;
        }
        Ok(())
    }
}

mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    pub(super) fn serialize<S: serde::Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let encoded = <String as serde::Deserialize>::deserialize(d)?;
        STANDARD
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/payload/model.rs"]
mod tests;
