/// Convenience result type used across vrnotify.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Top-level error taxonomy used by engine and channel APIs.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    /// Invalid user-provided payload or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A native resource (overlay handle, worker thread) could not be acquired.
    #[error("resource error: {0}")]
    Resource(String),

    /// A compositor call was rejected by the runtime.
    #[error("compositor error: {0}")]
    Compositor(String),

    /// Texture decoding or upload failed.
    #[error("texture error: {0}")]
    Texture(String),

    /// Errors when serializing or deserializing payloads.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NotifyError {
    /// Build a [`NotifyError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`NotifyError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`NotifyError::Compositor`] value.
    pub fn compositor(msg: impl Into<String>) -> Self {
        Self::Compositor(msg.into())
    }

    /// Build a [`NotifyError::Texture`] value.
    pub fn texture(msg: impl Into<String>) -> Self {
        Self::Texture(msg.into())
    }

    /// Build a [`NotifyError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
