//! The [`Stack`] trait.

use bucketstack_core::{AccountId, StackResult};
use bucketstack_model::{ProviderSpec, StackPlan};

/// A named, independently applied unit of declared infrastructure.
///
/// The provider is available before the plan so an engine can be connected
/// (and the caller's account resolved) ahead of [`Stack::build`].
pub trait Stack {
    /// Stack name.
    fn name(&self) -> &str;

    /// Provider the stack's resources are created with.
    fn provider(&self) -> ProviderSpec;

    /// Build the desired resource graph for `account`.
    fn build(&self, account: &AccountId) -> StackResult<StackPlan>;
}
