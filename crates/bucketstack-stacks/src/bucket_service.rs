//! The bucket service stack.
//!
//! Declares one account-scoped bucket whose optional configurations are
//! driven by [`BucketServiceConfig`]. Each optional resource is computed as an
//! `Option<ResourceSpec>` and appended in a fixed order: bucket, versioning,
//! encryption, lifecycle, public access block.

use bucketstack_core::{AccountId, StackResult};
use bucketstack_model::validation::validate_bucket_name;
use bucketstack_model::{
    BucketAttribute, BucketSpec, EncryptionSpec, LifecycleAction, LifecycleRule, LifecycleSpec,
    OutputValue, ProviderSpec, PublicAccessBlockSpec, ResourceSpec, StackPlan, VersioningSpec,
    VersioningStatus,
};
use tracing::{debug, warn};

use crate::config::{BucketServiceConfig, Encryption};
use crate::stack::Stack;

const BUCKET: &str = "bucket";
const VERSIONING: &str = "bucket-versioning";
const ENCRYPTION: &str = "bucket-encryption";
const LIFECYCLE: &str = "bucket-lifecycle";
const PUBLIC_ACCESS_BLOCK: &str = "bucket-public-access-block";

/// Storage class noncurrent versions transition to.
pub const TRANSITION_STORAGE_CLASS: &str = "STANDARD_IA";

/// The configurable bucket service stack.
#[derive(Debug, Clone)]
pub struct BucketServiceStack {
    config: BucketServiceConfig,
}

impl BucketServiceStack {
    /// Create the stack from its configuration.
    #[must_use]
    pub fn new(config: BucketServiceConfig) -> Self {
        Self { config }
    }

    /// The stack configuration.
    #[must_use]
    pub fn config(&self) -> &BucketServiceConfig {
        &self.config
    }

    fn versioning(&self) -> Option<ResourceSpec> {
        self.config.versioning.then(|| {
            ResourceSpec::Versioning(VersioningSpec {
                bucket: BUCKET.to_owned(),
                status: VersioningStatus::Enabled,
            })
        })
    }

    fn encryption(&self) -> Option<ResourceSpec> {
        match self.config.effective_encryption() {
            Encryption::Supported(sse_algorithm) => Some(ResourceSpec::Encryption(EncryptionSpec {
                bucket: BUCKET.to_owned(),
                sse_algorithm,
                kms_master_key_id: None,
                bucket_key_enabled: true,
            })),
            Encryption::Unsupported(value) => {
                warn!(
                    encryption = %value,
                    "unsupported encryption algorithm, bucket keeps the account default encryption"
                );
                None
            }
        }
    }

    fn lifecycle(&self) -> Option<ResourceSpec> {
        if !self.config.lifecycle_eligible() {
            return None;
        }

        let mut rules = Vec::new();

        let transition_days = self.config.effective_lifecycle_days();
        if transition_days > 0 {
            rules.push(LifecycleRule::enabled(
                "transition-old-versions",
                LifecycleAction::TransitionNoncurrent {
                    noncurrent_days: transition_days,
                    storage_class: TRANSITION_STORAGE_CLASS.to_owned(),
                },
            ));
        }

        if self.config.expiration_days > 0 {
            rules.push(LifecycleRule::enabled(
                "expire-old-versions",
                LifecycleAction::ExpireNoncurrent {
                    noncurrent_days: self.config.expiration_days,
                },
            ));
        }

        (!rules.is_empty()).then(|| {
            ResourceSpec::Lifecycle(LifecycleSpec {
                bucket: BUCKET.to_owned(),
                rules,
            })
        })
    }
}

impl Stack for BucketServiceStack {
    fn name(&self) -> &str {
        "bucket-service"
    }

    fn provider(&self) -> ProviderSpec {
        ProviderSpec::new("aws-provider", self.config.region.clone())
            .with_tag("created_with", "bucketstack")
            .with_tag("service", "bucket-service")
            .with_tag("managed_by", "bucketstack")
    }

    fn build(&self, account: &AccountId) -> StackResult<StackPlan> {
        let bucket_name = account.scoped_name(&self.config.bucket_name);
        validate_bucket_name(&bucket_name)?;

        let mut plan = StackPlan::new(self.name(), self.provider());

        plan.declare(
            BUCKET,
            ResourceSpec::Bucket(BucketSpec {
                bucket: bucket_name.clone(),
            }),
        );
        plan.declare_optional(VERSIONING, self.versioning());
        plan.declare_optional(ENCRYPTION, self.encryption());
        plan.declare_optional(LIFECYCLE, self.lifecycle());
        plan.declare(
            PUBLIC_ACCESS_BLOCK,
            ResourceSpec::PublicAccessBlock(PublicAccessBlockSpec::block_all(BUCKET)),
        );

        plan.export("bucketName", OutputValue::attribute(BUCKET, BucketAttribute::Id));
        plan.export("bucketArn", OutputValue::attribute(BUCKET, BucketAttribute::Arn));
        plan.export(
            "bucketRegion",
            OutputValue::literal(self.config.region.as_str()),
        );
        plan.export("bucketUrl", OutputValue::s3_url(BUCKET));
        plan.export(
            "bucketDomainName",
            OutputValue::attribute(BUCKET, BucketAttribute::BucketDomainName),
        );
        plan.export(
            "bucketRegionalDomainName",
            OutputValue::attribute(BUCKET, BucketAttribute::BucketRegionalDomainName),
        );
        plan.export(
            "config",
            OutputValue::map([
                ("versioning", OutputValue::literal(self.config.versioning)),
                (
                    "encryption",
                    OutputValue::literal(self.config.effective_encryption().as_str()),
                ),
                (
                    "lifecycleEnabled",
                    OutputValue::literal(self.config.lifecycle_enabled),
                ),
                ("publicAccess", OutputValue::literal(false)),
            ]),
        );

        debug!(
            stack = %plan.stack,
            bucket = %bucket_name,
            resources = plan.resources.len(),
            "built bucket service plan"
        );
        Ok(plan)
    }
}
