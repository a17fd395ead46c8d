//! Plan orchestration: preview, deploy, and the program entry point.

use std::collections::BTreeMap;

use bucketstack_core::{AccountId, StackResult};
use bucketstack_model::StackPlan;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::engine::{AppliedResource, ProvisioningEngine};
use crate::error::{EngineError, EngineResult};

/// Whether a run applies the plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Build and validate the plan only.
    Preview,
    /// Build, validate, and apply the plan.
    #[default]
    Apply,
}

/// The outcome of a successful deploy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackState {
    /// Stack name.
    pub stack: String,
    /// Applied resources, in apply order.
    pub resources: Vec<AppliedResource>,
    /// Resolved outputs.
    pub outputs: BTreeMap<String, Value>,
    /// When the deploy finished.
    pub deployed_at: DateTime<Utc>,
}

/// The outcome of [`run`].
#[derive(Debug, Clone)]
pub enum RunReport {
    /// The validated plan, not applied.
    Preview(StackPlan),
    /// The deployed stack.
    Applied(StackState),
}

/// Validate a plan without applying it.
pub fn preview(plan: StackPlan) -> EngineResult<StackPlan> {
    plan.validate()?;
    info!(
        stack = %plan.stack,
        resources = plan.resources.len(),
        region = %plan.provider.region,
        "previewed stack"
    );
    Ok(plan)
}

/// Apply `plan` with `engine`, one resource at a time.
///
/// The first failure aborts the deploy; resources after it are not applied.
pub async fn deploy<E>(engine: &E, plan: &StackPlan) -> EngineResult<StackState>
where
    E: ProvisioningEngine + ?Sized,
{
    plan.validate()?;

    info!(
        stack = %plan.stack,
        resources = plan.resources.len(),
        region = %plan.provider.region,
        "deploying stack"
    );

    let mut applied: Vec<AppliedResource> = Vec::with_capacity(plan.resources.len());
    for decl in &plan.resources {
        let bucket = match decl.spec.bucket_ref() {
            Some(target) => Some(
                applied
                    .iter()
                    .find(|r| r.logical_name == target)
                    .ok_or_else(|| EngineError::MissingBucket {
                        resource: decl.logical_name.clone(),
                        bucket: target.to_owned(),
                    })?,
            ),
            None => None,
        };

        let resource = match engine.apply(&plan.provider, decl, bucket).await {
            Ok(resource) => resource,
            Err(e) => {
                error!(
                    stack = %plan.stack,
                    resource = %decl.logical_name,
                    kind = %decl.kind(),
                    error = %e,
                    "apply failed, aborting"
                );
                return Err(e);
            }
        };

        debug!(
            resource = %resource.logical_name,
            kind = %resource.kind,
            id = %resource.id,
            "applied resource"
        );
        applied.push(resource);
    }

    let lookup = |name: &str, attribute| {
        applied
            .iter()
            .find(|r| r.logical_name == name)
            .and_then(|r| r.attribute(attribute))
    };
    let outputs = plan
        .outputs
        .iter()
        .map(|(name, output)| output.resolve(&lookup).map(|v| (name.clone(), v)))
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    info!(stack = %plan.stack, outputs = outputs.len(), "stack deployed");

    Ok(StackState {
        stack: plan.stack.clone(),
        resources: applied,
        outputs,
        deployed_at: Utc::now(),
    })
}

/// Resolve the caller's account, build the plan with `build`, then preview or
/// deploy it.
pub async fn run<E, F>(engine: &E, mode: RunMode, build: F) -> EngineResult<RunReport>
where
    E: ProvisioningEngine + ?Sized,
    F: FnOnce(&AccountId) -> StackResult<StackPlan>,
{
    let identity = engine.caller_identity().await?;
    info!(account = %identity.account_id, "resolved caller identity");

    let plan = build(&identity.account_id)?;

    match mode {
        RunMode::Preview => preview(plan).map(RunReport::Preview),
        RunMode::Apply => deploy(engine, &plan).await.map(RunReport::Applied),
    }
}

#[cfg(test)]
mod tests {
    use bucketstack_model::{BucketSpec, ProviderSpec, PublicAccessBlockSpec, ResourceSpec};
    use bucketstack_stacks::{BootstrapStack, BucketServiceConfig, BucketServiceStack, Stack};

    use super::*;
    use crate::memory::InMemoryEngine;

    fn account() -> AccountId {
        AccountId::new("123456789012").unwrap()
    }

    fn service(config: BucketServiceConfig) -> BucketServiceStack {
        BucketServiceStack::new(config)
    }

    #[tokio::test]
    async fn test_should_deploy_bootstrap_stack() {
        let engine = InMemoryEngine::new(account());
        let plan = BootstrapStack.build(&account()).unwrap();

        let state = deploy(&engine, &plan).await.expect("deploy");

        assert_eq!(state.resources.len(), 4);
        assert_eq!(
            state.outputs["bucketName"],
            "kro-platform-pulumi-state-123456789012"
        );
        assert_eq!(state.outputs["region"], "eu-north-1");
        assert_eq!(
            state.outputs["stateBackendUrl"],
            "s3://kro-platform-pulumi-state-123456789012"
        );

        let bucket = engine
            .bucket("kro-platform-pulumi-state-123456789012")
            .expect("bucket recorded");
        assert!(bucket.versioning.is_some());
        assert!(bucket.encryption.is_some());
        assert!(bucket.public_access_block.is_some_and(|p| p.blocks_everything()));
        assert_eq!(bucket.tags["purpose"], "iac-state");
    }

    #[tokio::test]
    async fn test_should_resolve_service_outputs() {
        let engine = InMemoryEngine::new(account());
        let config = BucketServiceConfig::builder()
            .bucket_name("logs".into())
            .versioning(true)
            .encryption("aws:kms".into())
            .build();
        let plan = service(config).build(&account()).unwrap();

        let state = deploy(&engine, &plan).await.expect("deploy");

        assert_eq!(state.outputs["bucketName"], "logs-123456789012");
        assert_eq!(state.outputs["bucketArn"], "arn:aws:s3:::logs-123456789012");
        assert_eq!(state.outputs["bucketRegion"], "eu-north-1");
        assert_eq!(state.outputs["bucketUrl"], "s3://logs-123456789012");
        assert_eq!(
            state.outputs["bucketDomainName"],
            "logs-123456789012.s3.amazonaws.com"
        );
        assert_eq!(
            state.outputs["bucketRegionalDomainName"],
            "logs-123456789012.s3.eu-north-1.amazonaws.com"
        );
        assert_eq!(
            state.outputs["config"],
            serde_json::json!({
                "versioning": true,
                "encryption": "aws:kms",
                "lifecycleEnabled": false,
                "publicAccess": false,
            })
        );
    }

    #[tokio::test]
    async fn test_should_apply_in_declaration_order() {
        let engine = InMemoryEngine::new(account());
        let config = BucketServiceConfig::builder()
            .bucket_name("logs".into())
            .versioning(true)
            .lifecycle_enabled(true)
            .build();
        let plan = service(config).build(&account()).unwrap();

        deploy(&engine, &plan).await.expect("deploy");

        assert_eq!(
            engine.applied(),
            vec![
                "bucket",
                "bucket-versioning",
                "bucket-encryption",
                "bucket-lifecycle",
                "bucket-public-access-block",
            ]
        );
    }

    #[tokio::test]
    async fn test_should_abort_after_first_failure() {
        let engine = InMemoryEngine::new(account()).with_failure("bucket-encryption");
        let config = BucketServiceConfig::builder()
            .bucket_name("logs".into())
            .versioning(true)
            .build();
        let plan = service(config).build(&account()).unwrap();

        let err = deploy(&engine, &plan).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Provider { ref resource, .. } if resource == "bucket-encryption"
        ));
        assert_eq!(engine.applied(), vec!["bucket", "bucket-versioning"]);
        let bucket = engine.bucket("logs-123456789012").expect("bucket recorded");
        assert!(bucket.public_access_block.is_none());
    }

    #[tokio::test]
    async fn test_should_reject_invalid_plan_before_applying() {
        let engine = InMemoryEngine::new(account());
        let mut plan = StackPlan::new("broken", ProviderSpec::new("aws", Default::default()));
        plan.declare(
            "pab",
            ResourceSpec::PublicAccessBlock(PublicAccessBlockSpec::block_all("bucket")),
        );
        plan.declare(
            "bucket",
            ResourceSpec::Bucket(BucketSpec {
                bucket: "data-123456789012".to_owned(),
            }),
        );

        let err = deploy(&engine, &plan).await.unwrap_err();

        assert!(matches!(err, EngineError::Plan(_)));
        assert!(engine.applied().is_empty());
    }

    #[tokio::test]
    async fn test_should_preview_without_applying() {
        let engine = InMemoryEngine::new(account());
        let stack = service(BucketServiceConfig::builder().bucket_name("logs".into()).build());

        let report = run(&engine, RunMode::Preview, |account| stack.build(account))
            .await
            .expect("preview");

        let RunReport::Preview(plan) = report else {
            panic!("expected a preview");
        };
        assert_eq!(plan.stack, "bucket-service");
        assert!(engine.applied().is_empty());
    }

    #[tokio::test]
    async fn test_should_run_with_engine_account() {
        let engine = InMemoryEngine::new(AccountId::new("210987654321").unwrap());
        let stack = service(BucketServiceConfig::builder().bucket_name("logs".into()).build());

        let report = run(&engine, RunMode::Apply, |account| stack.build(account))
            .await
            .expect("apply");

        let RunReport::Applied(state) = report else {
            panic!("expected an applied stack");
        };
        assert_eq!(state.outputs["bucketName"], "logs-210987654321");
    }

    #[tokio::test]
    async fn test_should_propagate_build_errors() {
        let engine = InMemoryEngine::new(account());
        let stack = service(BucketServiceConfig::builder().bucket_name("Bad_Name".into()).build());

        let err = run(&engine, RunMode::Apply, |account| stack.build(account))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Stack(_)));
        assert!(engine.applied().is_empty());
    }
}
