//! AWS provisioning engine.
//!
//! [`S3Engine`] applies declarations with the AWS SDK for Rust. Every
//! operation is an idempotent `Put*` call, so re-running a plan converges the
//! bucket to the declared state. Buckets are created only when `HeadBucket`
//! reports them missing.
//!
//! | Resource | S3 operation |
//! |----------|--------------|
//! | bucket | `HeadBucket`, `CreateBucket`, `PutBucketTagging` |
//! | versioning | `PutBucketVersioning` |
//! | encryption | `PutBucketEncryption` |
//! | lifecycle | `PutBucketLifecycleConfiguration` |
//! | public access block | `PutPublicAccessBlock` |

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types as s3;
use bucketstack_core::{AccountId, EngineConfig};
use bucketstack_model::{
    BucketSpec, EncryptionSpec, LifecycleAction, LifecycleRule, LifecycleSpec, ProviderSpec,
    PublicAccessBlockSpec, ResourceDeclaration, ResourceSpec, VersioningSpec,
};
use tracing::{debug, info};

use crate::engine::{AppliedResource, CallerIdentity, ProvisioningEngine, bucket_attributes};
use crate::error::{EngineError, EngineResult};

/// A provisioning engine backed by S3 and STS clients.
#[derive(Debug, Clone)]
pub struct S3Engine {
    s3: aws_sdk_s3::Client,
    sts: aws_sdk_sts::Client,
}

impl S3Engine {
    /// Create an engine from existing clients.
    #[must_use]
    pub fn from_clients(s3: aws_sdk_s3::Client, sts: aws_sdk_sts::Client) -> Self {
        Self { s3, sts }
    }

    /// Load AWS credentials from the environment and build clients for
    /// `provider`'s region, honoring the endpoint override in `config`.
    pub async fn connect(provider: &ProviderSpec, config: &EngineConfig) -> Self {
        let sdk = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(provider.region.to_string()))
            .load()
            .await;

        let mut s3_config =
            aws_sdk_s3::config::Builder::from(&sdk).force_path_style(config.force_path_style);
        let mut sts_config = aws_sdk_sts::config::Builder::from(&sdk);
        if let Some(url) = &config.endpoint_url {
            s3_config = s3_config.endpoint_url(url);
            sts_config = sts_config.endpoint_url(url);
        }

        info!(
            provider = %provider.name,
            region = %provider.region,
            endpoint_url = config.endpoint_url.as_deref().unwrap_or("default"),
            "connected AWS provider"
        );

        Self::from_clients(
            aws_sdk_s3::Client::from_conf(s3_config.build()),
            aws_sdk_sts::Client::from_conf(sts_config.build()),
        )
    }

    async fn apply_bucket(
        &self,
        provider: &ProviderSpec,
        logical_name: &str,
        spec: &BucketSpec,
    ) -> EngineResult<()> {
        match self.s3.head_bucket().bucket(&spec.bucket).send().await {
            Ok(_) => debug!(bucket = %spec.bucket, "bucket already exists"),
            Err(err) if err.as_service_error().is_some_and(HeadBucketError::is_not_found) => {
                let mut req = self.s3.create_bucket().bucket(&spec.bucket);
                if !provider.region.is_us_east_1() {
                    req = req.create_bucket_configuration(
                        s3::CreateBucketConfiguration::builder()
                            .location_constraint(s3::BucketLocationConstraint::from(
                                provider.region.as_str(),
                            ))
                            .build(),
                    );
                }
                req.send()
                    .await
                    .map_err(|e| provider_error("CreateBucket", logical_name, e))?;
                info!(bucket = %spec.bucket, region = %provider.region, "created bucket");
            }
            Err(err) => return Err(provider_error("HeadBucket", logical_name, err)),
        }

        if provider.default_tags.is_empty() {
            return Ok(());
        }

        let tags = provider
            .default_tags
            .iter()
            .map(|(k, v)| s3::Tag::builder().key(k).value(v).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| provider_error("PutBucketTagging", logical_name, e))?;
        let tagging = s3::Tagging::builder()
            .set_tag_set(Some(tags))
            .build()
            .map_err(|e| provider_error("PutBucketTagging", logical_name, e))?;

        self.s3
            .put_bucket_tagging()
            .bucket(&spec.bucket)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| provider_error("PutBucketTagging", logical_name, e))?;
        Ok(())
    }

    async fn apply_versioning(
        &self,
        bucket: &str,
        logical_name: &str,
        spec: &VersioningSpec,
    ) -> EngineResult<()> {
        self.s3
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(
                s3::VersioningConfiguration::builder()
                    .status(s3::BucketVersioningStatus::from(spec.status.as_str()))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| provider_error("PutBucketVersioning", logical_name, e))?;
        Ok(())
    }

    async fn apply_encryption(
        &self,
        bucket: &str,
        logical_name: &str,
        spec: &EncryptionSpec,
    ) -> EngineResult<()> {
        let by_default = s3::ServerSideEncryptionByDefault::builder()
            .sse_algorithm(s3::ServerSideEncryption::from(spec.sse_algorithm.as_str()))
            .set_kms_master_key_id(spec.kms_master_key_id.clone())
            .build()
            .map_err(|e| provider_error("PutBucketEncryption", logical_name, e))?;
        let configuration = s3::ServerSideEncryptionConfiguration::builder()
            .rules(
                s3::ServerSideEncryptionRule::builder()
                    .apply_server_side_encryption_by_default(by_default)
                    .bucket_key_enabled(spec.bucket_key_enabled)
                    .build(),
            )
            .build()
            .map_err(|e| provider_error("PutBucketEncryption", logical_name, e))?;

        self.s3
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(configuration)
            .send()
            .await
            .map_err(|e| provider_error("PutBucketEncryption", logical_name, e))?;
        Ok(())
    }

    async fn apply_lifecycle(
        &self,
        bucket: &str,
        logical_name: &str,
        spec: &LifecycleSpec,
    ) -> EngineResult<()> {
        let rules = spec
            .rules
            .iter()
            .map(lifecycle_rule)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| provider_error("PutBucketLifecycleConfiguration", logical_name, e))?;
        let configuration = s3::BucketLifecycleConfiguration::builder()
            .set_rules(Some(rules))
            .build()
            .map_err(|e| provider_error("PutBucketLifecycleConfiguration", logical_name, e))?;

        self.s3
            .put_bucket_lifecycle_configuration()
            .bucket(bucket)
            .lifecycle_configuration(configuration)
            .send()
            .await
            .map_err(|e| provider_error("PutBucketLifecycleConfiguration", logical_name, e))?;
        Ok(())
    }

    async fn apply_public_access_block(
        &self,
        bucket: &str,
        logical_name: &str,
        spec: &PublicAccessBlockSpec,
    ) -> EngineResult<()> {
        self.s3
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(
                s3::PublicAccessBlockConfiguration::builder()
                    .block_public_acls(spec.block_public_acls)
                    .ignore_public_acls(spec.ignore_public_acls)
                    .block_public_policy(spec.block_public_policy)
                    .restrict_public_buckets(spec.restrict_public_buckets)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| provider_error("PutPublicAccessBlock", logical_name, e))?;
        Ok(())
    }
}

#[async_trait]
impl ProvisioningEngine for S3Engine {
    async fn caller_identity(&self) -> EngineResult<CallerIdentity> {
        let output = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| EngineError::Identity(DisplayErrorContext(e).to_string()))?;

        let account = output
            .account()
            .ok_or_else(|| EngineError::Identity("response carried no account".to_owned()))?;

        Ok(CallerIdentity {
            account_id: AccountId::new(account)?,
            arn: output.arn().map(ToOwned::to_owned),
        })
    }

    async fn apply(
        &self,
        provider: &ProviderSpec,
        resource: &ResourceDeclaration,
        bucket: Option<&AppliedResource>,
    ) -> EngineResult<AppliedResource> {
        let logical_name = resource.logical_name.as_str();

        if let ResourceSpec::Bucket(spec) = &resource.spec {
            self.apply_bucket(provider, logical_name, spec).await?;
            return Ok(AppliedResource {
                logical_name: logical_name.to_owned(),
                kind: resource.kind(),
                id: spec.bucket.clone(),
                attributes: bucket_attributes(&spec.bucket, &provider.region),
            });
        }

        let bucket_id = bucket.map(|b| b.id.as_str()).ok_or_else(|| EngineError::MissingBucket {
            resource: logical_name.to_owned(),
            bucket: resource.spec.bucket_ref().unwrap_or_default().to_owned(),
        })?;

        match &resource.spec {
            ResourceSpec::Versioning(spec) => {
                self.apply_versioning(bucket_id, logical_name, spec).await?;
            }
            ResourceSpec::Encryption(spec) => {
                self.apply_encryption(bucket_id, logical_name, spec).await?;
            }
            ResourceSpec::Lifecycle(spec) => {
                self.apply_lifecycle(bucket_id, logical_name, spec).await?;
            }
            ResourceSpec::PublicAccessBlock(spec) => {
                self.apply_public_access_block(bucket_id, logical_name, spec)
                    .await?;
            }
            ResourceSpec::Bucket(_) => unreachable!("buckets are handled above"),
        }

        Ok(AppliedResource {
            logical_name: logical_name.to_owned(),
            kind: resource.kind(),
            id: bucket_id.to_owned(),
            attributes: BTreeMap::new(),
        })
    }
}

/// Translate a lifecycle rule into its SDK form.
fn lifecycle_rule(rule: &LifecycleRule) -> Result<s3::LifecycleRule, aws_sdk_s3::error::BuildError> {
    let status = if rule.enabled {
        s3::ExpirationStatus::Enabled
    } else {
        s3::ExpirationStatus::Disabled
    };
    let builder = s3::LifecycleRule::builder()
        .id(&rule.id)
        .status(status)
        .filter(s3::LifecycleRuleFilter::builder().prefix(&rule.prefix).build());

    let builder = match &rule.action {
        LifecycleAction::TransitionNoncurrent {
            noncurrent_days,
            storage_class,
        } => builder.noncurrent_version_transitions(
            s3::NoncurrentVersionTransition::builder()
                .noncurrent_days(*noncurrent_days)
                .storage_class(s3::TransitionStorageClass::from(storage_class.as_str()))
                .build(),
        ),
        LifecycleAction::ExpireNoncurrent { noncurrent_days } => builder
            .noncurrent_version_expiration(
                s3::NoncurrentVersionExpiration::builder()
                    .noncurrent_days(*noncurrent_days)
                    .build(),
            ),
    };

    builder.build()
}

/// Wrap an SDK error, keeping its full source chain in the message.
fn provider_error<E>(operation: &'static str, resource: &str, err: E) -> EngineError
where
    E: std::error::Error,
{
    EngineError::Provider {
        operation,
        resource: resource.to_owned(),
        message: DisplayErrorContext(err).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_translate_transition_rule() {
        let rule = LifecycleRule::enabled(
            "transition-old-versions",
            LifecycleAction::TransitionNoncurrent {
                noncurrent_days: 30,
                storage_class: "STANDARD_IA".to_owned(),
            },
        );

        let sdk_rule = lifecycle_rule(&rule).expect("valid rule");

        assert_eq!(sdk_rule.id(), Some("transition-old-versions"));
        assert_eq!(sdk_rule.status(), &s3::ExpirationStatus::Enabled);
        let transitions = sdk_rule.noncurrent_version_transitions();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].noncurrent_days(), Some(30));
        assert_eq!(
            transitions[0].storage_class(),
            Some(&s3::TransitionStorageClass::StandardIa)
        );
        assert!(sdk_rule.noncurrent_version_expiration().is_none());
    }

    #[test]
    fn test_should_translate_expiration_rule() {
        let rule = LifecycleRule::enabled(
            "expire-old-versions",
            LifecycleAction::ExpireNoncurrent {
                noncurrent_days: 365,
            },
        );

        let sdk_rule = lifecycle_rule(&rule).expect("valid rule");

        assert_eq!(
            sdk_rule
                .noncurrent_version_expiration()
                .and_then(s3::NoncurrentVersionExpiration::noncurrent_days),
            Some(365)
        );
        assert!(sdk_rule.noncurrent_version_transitions().is_empty());
    }

    #[test]
    fn test_should_name_operation_in_provider_error() {
        let err = provider_error(
            "PutBucketVersioning",
            "bucket-versioning",
            std::io::Error::other("AccessDenied"),
        );
        assert!(
            err.to_string()
                .starts_with("PutBucketVersioning failed for resource bucket-versioning: AccessDenied")
        );
    }
}
