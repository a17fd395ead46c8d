//! Declarative resource model for BucketStack.
//!
//! A stack definition produces a [`StackPlan`]: the provider it targets, an
//! ordered list of [`ResourceDeclaration`]s, and the named [`OutputValue`]
//! expressions to export once the plan has been applied. Nothing in this
//! crate talks to the cloud; engines consume these types.

pub mod output;
pub mod plan;
pub mod resource;
pub mod validation;

pub use output::{BucketAttribute, OutputValue};
pub use plan::{PlanError, ProviderSpec, StackPlan};
pub use resource::{
    BucketSpec, EncryptionSpec, LifecycleAction, LifecycleRule, LifecycleSpec, PublicAccessBlockSpec,
    ResourceDeclaration, ResourceKind, ResourceSpec, SseAlgorithm, VersioningSpec,
    VersioningStatus,
};
