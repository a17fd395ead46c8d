//! Engine error types.

use bucketstack_core::StackError;
use bucketstack_model::PlanError;

/// Error raised while resolving identity, building, or applying a stack.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The provider rejected an operation.
    #[error("{operation} failed for resource {resource}: {message}")]
    Provider {
        /// The provider operation, e.g. `PutBucketVersioning`.
        operation: &'static str,
        /// Logical name of the resource being applied.
        resource: String,
        /// The provider's error, rendered with its full source chain.
        message: String,
    },

    /// The caller identity could not be resolved.
    #[error("failed to resolve caller identity: {0}")]
    Identity(String),

    /// A sub-configuration was applied before its bucket.
    #[error("resource {resource} requires bucket {bucket}, which has not been applied")]
    MissingBucket {
        /// The referring resource.
        resource: String,
        /// The bucket's logical name.
        bucket: String,
    },

    /// The plan is structurally invalid or its outputs cannot be resolved.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The stack could not be built.
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Convenience result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
