/// Convenience result type used across revlapse.
pub type RevlapseResult<T> = Result<T, RevlapseError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum RevlapseError {
    /// Invalid user-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A document revision whose extension has no converter.
    #[error("unsupported file type '{ext}'. Must be one of: {supported}")]
    UnsupportedFormat {
        /// Offending extension, including the leading dot.
        ext: String,
        /// Comma separated list of supported extensions.
        supported: String,
    },

    /// A timestamp that could not be parsed as ISO-8601.
    #[error("timestamp error: {0}")]
    Timestamp(String),

    /// Network or remote API failures.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Errors while converting, compositing or encoding.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RevlapseError {
    /// Build a [`RevlapseError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RevlapseError::Timestamp`] value.
    pub fn timestamp(msg: impl Into<String>) -> Self {
        Self::Timestamp(msg.into())
    }

    /// Build a [`RevlapseError::Fetch`] value.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Build a [`RevlapseError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`RevlapseError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`RevlapseError::UnsupportedFormat`] value from the supported extension set.
    pub fn unsupported_format<'a>(
        ext: impl Into<String>,
        supported: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut supported = supported.into_iter().collect::<Vec<_>>();
        supported.sort_unstable();
        Self::UnsupportedFormat {
            ext: ext.into(),
            supported: supported.join(", "),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
