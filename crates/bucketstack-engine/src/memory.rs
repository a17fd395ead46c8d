//! In-memory provisioning engine.
//!
//! [`InMemoryEngine`] records every applied configuration per bucket instead
//! of calling a cloud API. It backs the unit tests and lets callers inspect
//! what a plan would converge to.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bucketstack_core::{AccountId, AwsRegion};
use bucketstack_model::{
    EncryptionSpec, LifecycleRule, ProviderSpec, PublicAccessBlockSpec, ResourceDeclaration,
    ResourceSpec, VersioningStatus,
};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use crate::engine::{AppliedResource, CallerIdentity, ProvisioningEngine, bucket_attributes};
use crate::error::{EngineError, EngineResult};

/// Everything applied to one bucket.
#[derive(Debug, Clone, Default)]
pub struct BucketRecord {
    /// Region the bucket was created in.
    pub region: AwsRegion,
    /// Tags from the provider's defaults.
    pub tags: BTreeMap<String, String>,
    /// Versioning status, once configured.
    pub versioning: Option<VersioningStatus>,
    /// Default encryption, once configured.
    pub encryption: Option<EncryptionSpec>,
    /// Lifecycle rules, once configured.
    pub lifecycle: Vec<LifecycleRule>,
    /// Public access block, once configured.
    pub public_access_block: Option<PublicAccessBlockSpec>,
}

/// A provisioning engine that keeps state in memory.
#[derive(Debug)]
pub struct InMemoryEngine {
    account: AccountId,
    buckets: DashMap<String, BucketRecord>,
    applied: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl InMemoryEngine {
    /// Create an engine acting as `account`.
    #[must_use]
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            buckets: DashMap::new(),
            applied: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Fail when the resource named `logical_name` is applied.
    #[must_use]
    pub fn with_failure(mut self, logical_name: impl Into<String>) -> Self {
        self.fail_on = Some(logical_name.into());
        self
    }

    /// A snapshot of the bucket with physical name `name`.
    #[must_use]
    pub fn bucket(&self, name: &str) -> Option<BucketRecord> {
        self.buckets.get(name).map(|b| b.clone())
    }

    /// Logical names applied so far, in order.
    #[must_use]
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().clone()
    }

    /// Forget all buckets and applied resources.
    pub fn reset(&self) {
        self.buckets.clear();
        self.applied.lock().clear();
    }
}

#[async_trait]
impl ProvisioningEngine for InMemoryEngine {
    async fn caller_identity(&self) -> EngineResult<CallerIdentity> {
        Ok(CallerIdentity {
            account_id: self.account.clone(),
            arn: Some(format!("arn:aws:iam::{}:root", self.account)),
        })
    }

    async fn apply(
        &self,
        provider: &ProviderSpec,
        resource: &ResourceDeclaration,
        bucket: Option<&AppliedResource>,
    ) -> EngineResult<AppliedResource> {
        if self.fail_on.as_deref() == Some(resource.logical_name.as_str()) {
            return Err(EngineError::Provider {
                operation: "Apply",
                resource: resource.logical_name.clone(),
                message: "injected failure".to_owned(),
            });
        }

        let id = match &resource.spec {
            ResourceSpec::Bucket(spec) => {
                let mut record = self.buckets.entry(spec.bucket.clone()).or_default();
                record.region = provider.region.clone();
                record.tags.clone_from(&provider.default_tags);
                spec.bucket.clone()
            }
            spec => {
                let bucket_id = bucket
                    .map(|b| b.id.clone())
                    .ok_or_else(|| EngineError::MissingBucket {
                        resource: resource.logical_name.clone(),
                        bucket: spec.bucket_ref().unwrap_or_default().to_owned(),
                    })?;
                let mut record = self.buckets.get_mut(&bucket_id).ok_or_else(|| {
                    EngineError::MissingBucket {
                        resource: resource.logical_name.clone(),
                        bucket: bucket_id.clone(),
                    }
                })?;
                match spec {
                    ResourceSpec::Versioning(v) => record.versioning = Some(v.status),
                    ResourceSpec::Encryption(e) => record.encryption = Some(e.clone()),
                    ResourceSpec::Lifecycle(l) => record.lifecycle.clone_from(&l.rules),
                    ResourceSpec::PublicAccessBlock(p) => {
                        record.public_access_block = Some(p.clone());
                    }
                    ResourceSpec::Bucket(_) => unreachable!("buckets are handled above"),
                }
                drop(record);
                bucket_id
            }
        };

        debug!(resource = %resource.logical_name, kind = %resource.kind(), %id, "recorded resource");
        self.applied.lock().push(resource.logical_name.clone());

        let attributes = match resource.spec {
            ResourceSpec::Bucket(_) => bucket_attributes(&id, &provider.region),
            _ => BTreeMap::new(),
        };
        Ok(AppliedResource {
            logical_name: resource.logical_name.clone(),
            kind: resource.kind(),
            id,
            attributes,
        })
    }
}
