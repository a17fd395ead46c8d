//! Error types for the BucketStack core.

/// Error raised while loading configuration or building a stack.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// Invalid AWS account ID format.
    #[error("invalid AWS account ID: {0} (must be 12-digit numeric string)")]
    InvalidAccountId(String),

    /// A required setting is absent.
    #[error("missing required configuration value: {key}")]
    MissingConfig {
        /// Fully qualified `namespace:key` of the setting.
        key: String,
    },

    /// A setting is present but cannot be interpreted.
    #[error("invalid configuration value for {key}: {value:?} ({reason})")]
    InvalidConfig {
        /// Fully qualified `namespace:key` of the setting.
        key: String,
        /// The raw value that failed to parse.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The resolved bucket name violates S3 naming rules.
    #[error("invalid bucket name: {name}: {reason}")]
    InvalidBucketName {
        /// The invalid bucket name.
        name: String,
        /// The reason for the error.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for stack construction.
pub type StackResult<T> = Result<T, StackError>;
