//! Bootstrap stack integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::{BucketVersioningStatus, ServerSideEncryption};
    use bucketstack_core::AwsRegion;
    use bucketstack_engine::{RunMode, RunReport, run};
    use bucketstack_stacks::bootstrap::STATE_REGION;
    use bucketstack_stacks::{BootstrapStack, Stack};

    use crate::{cleanup_bucket, engine, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_deploy_state_bucket() {
        let region = AwsRegion::new(STATE_REGION);
        let client = s3_client(&region);
        let engine = engine(&region);

        let report = run(&engine, RunMode::Apply, |account| BootstrapStack.build(account))
            .await
            .expect("deploy bootstrap");
        let RunReport::Applied(state) = report else {
            panic!("expected an applied stack");
        };

        let bucket = state.outputs["bucketName"]
            .as_str()
            .expect("bucketName output")
            .to_owned();
        assert!(bucket.starts_with("kro-platform-pulumi-state-"));
        assert_eq!(state.outputs["region"], STATE_REGION);
        assert_eq!(state.outputs["stateBackendUrl"], format!("s3://{bucket}"));

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get versioning");
        assert_eq!(versioning.status(), Some(&BucketVersioningStatus::Enabled));

        let encryption = client
            .get_bucket_encryption()
            .bucket(&bucket)
            .send()
            .await
            .expect("get encryption");
        let algorithm = encryption
            .server_side_encryption_configuration()
            .and_then(|c| c.rules().first())
            .and_then(|r| r.apply_server_side_encryption_by_default())
            .map(|d| d.sse_algorithm().clone());
        assert_eq!(algorithm, Some(ServerSideEncryption::Aes256));

        let pab = client
            .get_public_access_block()
            .bucket(&bucket)
            .send()
            .await
            .expect("get public access block");
        let pab = pab
            .public_access_block_configuration()
            .expect("public access block configuration");
        assert_eq!(pab.block_public_acls(), Some(true));
        assert_eq!(pab.ignore_public_acls(), Some(true));
        assert_eq!(pab.block_public_policy(), Some(true));
        assert_eq!(pab.restrict_public_buckets(), Some(true));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_redeploy_existing_state_bucket() {
        let region = AwsRegion::new(STATE_REGION);
        let client = s3_client(&region);
        let engine = engine(&region);

        let first = run(&engine, RunMode::Apply, |account| BootstrapStack.build(account))
            .await
            .expect("first deploy");
        let second = run(&engine, RunMode::Apply, |account| BootstrapStack.build(account))
            .await
            .expect("second deploy");

        let (RunReport::Applied(first), RunReport::Applied(second)) = (first, second) else {
            panic!("expected applied stacks");
        };
        assert_eq!(first.outputs, second.outputs);

        let bucket = first.outputs["bucketName"].as_str().expect("bucketName");
        cleanup_bucket(&client, bucket).await;
    }
}
