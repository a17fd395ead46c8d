//! The [`ProvisioningEngine`] trait and the records it produces.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bucketstack_core::{AccountId, AwsRegion};
use bucketstack_model::{BucketAttribute, ProviderSpec, ResourceDeclaration, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// The identity the engine acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// The caller's account.
    pub account_id: AccountId,
    /// The caller's ARN, when the provider reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
}

/// A declaration after the engine has applied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResource {
    /// Logical name from the declaration.
    pub logical_name: String,
    /// Resource kind.
    pub kind: ResourceKind,
    /// Physical identity. Bucket sub-configurations share the bucket's name.
    pub id: String,
    /// Provider-computed attributes, keyed by [`BucketAttribute::key`].
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl AppliedResource {
    /// Read an attribute; [`BucketAttribute::Id`] is the physical identity.
    #[must_use]
    pub fn attribute(&self, attribute: BucketAttribute) -> Option<String> {
        match attribute {
            BucketAttribute::Id => Some(self.id.clone()),
            other => self.attributes.get(other.key()).cloned(),
        }
    }
}

/// Attributes S3 computes for a bucket named `bucket` in `region`.
#[must_use]
pub fn bucket_attributes(bucket: &str, region: &AwsRegion) -> BTreeMap<String, String> {
    [
        (BucketAttribute::Arn, format!("arn:aws:s3:::{bucket}")),
        (BucketAttribute::Region, region.to_string()),
        (
            BucketAttribute::BucketDomainName,
            format!("{bucket}.s3.amazonaws.com"),
        ),
        (
            BucketAttribute::BucketRegionalDomainName,
            format!("{bucket}.s3.{region}.amazonaws.com"),
        ),
    ]
    .into_iter()
    .map(|(attribute, value)| (attribute.key().to_owned(), value))
    .collect()
}

/// Reconciles declared resources against a cloud account.
///
/// Implementations apply exactly one declaration per call and never reorder
/// work; ordering is owned by [`deploy`](crate::deploy).
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Resolve the account the engine acts in.
    async fn caller_identity(&self) -> EngineResult<CallerIdentity>;

    /// Apply `resource` with `provider`'s settings.
    ///
    /// `bucket` is the already applied bucket a sub-configuration refers to,
    /// and `None` for buckets themselves.
    async fn apply(
        &self,
        provider: &ProviderSpec,
        resource: &ResourceDeclaration,
        bucket: Option<&AppliedResource>,
    ) -> EngineResult<AppliedResource>;
}
