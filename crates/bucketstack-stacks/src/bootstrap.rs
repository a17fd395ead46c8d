//! The bootstrap stack.
//!
//! Declares the bucket that stores the provisioning tool's own state. It has
//! no configuration surface: the bucket is always versioned, encrypted with
//! `AES256` and a bucket key, and closed to public access.

use bucketstack_core::{AccountId, AwsRegion, StackResult};
use bucketstack_model::validation::validate_bucket_name;
use bucketstack_model::{
    BucketAttribute, BucketSpec, EncryptionSpec, OutputValue, ProviderSpec,
    PublicAccessBlockSpec, ResourceSpec, SseAlgorithm, StackPlan, VersioningSpec,
    VersioningStatus,
};
use tracing::debug;

use crate::stack::Stack;

/// State bucket name prefix; the account id is appended.
pub const STATE_BUCKET_PREFIX: &str = "kro-platform-pulumi-state";

/// Region the state bucket lives in.
pub const STATE_REGION: &str = "eu-north-1";

const BUCKET: &str = "pulumi-state-bucket";
const VERSIONING: &str = "pulumi-state-versioning";
const ENCRYPTION: &str = "pulumi-state-encryption";
const PUBLIC_ACCESS_BLOCK: &str = "pulumi-state-public-access-block";

/// The state-bucket bootstrap stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct BootstrapStack;

impl Stack for BootstrapStack {
    fn name(&self) -> &str {
        "bootstrap"
    }

    fn provider(&self) -> ProviderSpec {
        ProviderSpec::new(STATE_REGION, AwsRegion::new(STATE_REGION))
            .with_tag("created_with", "bucketstack")
            .with_tag("purpose", "iac-state")
    }

    fn build(&self, account: &AccountId) -> StackResult<StackPlan> {
        let bucket_name = account.scoped_name(STATE_BUCKET_PREFIX);
        validate_bucket_name(&bucket_name)?;

        let provider = self.provider();
        let region = provider.region.to_string();
        let mut plan = StackPlan::new(self.name(), provider);

        plan.declare(
            BUCKET,
            ResourceSpec::Bucket(BucketSpec {
                bucket: bucket_name.clone(),
            }),
        );
        plan.declare(
            VERSIONING,
            ResourceSpec::Versioning(VersioningSpec {
                bucket: BUCKET.to_owned(),
                status: VersioningStatus::Enabled,
            }),
        );
        plan.declare(
            ENCRYPTION,
            ResourceSpec::Encryption(EncryptionSpec {
                bucket: BUCKET.to_owned(),
                sse_algorithm: SseAlgorithm::Aes256,
                kms_master_key_id: None,
                bucket_key_enabled: true,
            }),
        );
        plan.declare(
            PUBLIC_ACCESS_BLOCK,
            ResourceSpec::PublicAccessBlock(PublicAccessBlockSpec::block_all(BUCKET)),
        );

        plan.export("bucketName", OutputValue::attribute(BUCKET, BucketAttribute::Id));
        plan.export("region", OutputValue::literal(region));
        plan.export("stateBackendUrl", OutputValue::s3_url(BUCKET));

        debug!(stack = %plan.stack, bucket = %bucket_name, "built bootstrap plan");
        Ok(plan)
    }
}
