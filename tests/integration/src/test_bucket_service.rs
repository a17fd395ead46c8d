//! Bucket service stack integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::{BucketVersioningStatus, ServerSideEncryption, TransitionStorageClass};
    use bucketstack_core::AwsRegion;
    use bucketstack_engine::{RunMode, RunReport, StackState, run};
    use bucketstack_stacks::{BucketServiceConfig, BucketServiceStack, Stack};

    use crate::{cleanup_bucket, engine, s3_client, test_bucket_base};

    async fn deploy(config: BucketServiceConfig) -> StackState {
        let engine = engine(&config.region);
        let stack = BucketServiceStack::new(config);
        match run(&engine, RunMode::Apply, |account| stack.build(account))
            .await
            .expect("deploy bucket service")
        {
            RunReport::Applied(state) => state,
            RunReport::Preview(_) => panic!("expected an applied stack"),
        }
    }

    fn bucket_name(state: &StackState) -> String {
        state.outputs["bucketName"]
            .as_str()
            .expect("bucketName output")
            .to_owned()
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_deploy_minimal_bucket() {
        let base = test_bucket_base("min");
        let config = BucketServiceConfig::builder().bucket_name(base.clone()).build();
        let client = s3_client(&config.region);

        let state = deploy(config).await;
        let bucket = bucket_name(&state);

        assert!(bucket.starts_with(&format!("{base}-")));
        assert_eq!(state.outputs["bucketUrl"], format!("s3://{bucket}"));
        assert_eq!(state.outputs["bucketArn"], format!("arn:aws:s3:::{bucket}"));
        assert_eq!(state.outputs["config"]["publicAccess"], false);

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get versioning");
        assert_ne!(versioning.status(), Some(&BucketVersioningStatus::Enabled));

        let pab = client
            .get_public_access_block()
            .bucket(&bucket)
            .send()
            .await
            .expect("get public access block");
        assert_eq!(
            pab.public_access_block_configuration()
                .and_then(|c| c.block_public_policy()),
            Some(true)
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_apply_versioning_and_lifecycle() {
        let config = BucketServiceConfig::builder()
            .bucket_name(test_bucket_base("lc"))
            .versioning(true)
            .lifecycle_enabled(true)
            .lifecycle_days(30)
            .expiration_days(365)
            .build();
        let client = s3_client(&config.region);

        let state = deploy(config).await;
        let bucket = bucket_name(&state);

        let versioning = client
            .get_bucket_versioning()
            .bucket(&bucket)
            .send()
            .await
            .expect("get versioning");
        assert_eq!(versioning.status(), Some(&BucketVersioningStatus::Enabled));

        let lifecycle = client
            .get_bucket_lifecycle_configuration()
            .bucket(&bucket)
            .send()
            .await
            .expect("get lifecycle");
        let rules = lifecycle.rules();
        assert_eq!(rules.len(), 2);

        let transition = rules
            .iter()
            .find(|r| r.id() == Some("transition-old-versions"))
            .expect("transition rule");
        let step = transition
            .noncurrent_version_transitions()
            .first()
            .expect("noncurrent transition");
        assert_eq!(step.noncurrent_days(), Some(30));
        assert_eq!(
            step.storage_class(),
            Some(&TransitionStorageClass::StandardIa)
        );

        let expiration = rules
            .iter()
            .find(|r| r.id() == Some("expire-old-versions"))
            .and_then(|r| r.noncurrent_version_expiration())
            .expect("noncurrent expiration");
        assert_eq!(expiration.noncurrent_days(), Some(365));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_apply_kms_encryption() {
        let config = BucketServiceConfig::builder()
            .bucket_name(test_bucket_base("kms"))
            .encryption("aws:kms".into())
            .region(AwsRegion::new("us-east-1"))
            .build();
        let client = s3_client(&config.region);

        let state = deploy(config).await;
        let bucket = bucket_name(&state);
        assert_eq!(state.outputs["bucketRegion"], "us-east-1");
        assert_eq!(state.outputs["config"]["encryption"], "aws:kms");

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
        assert_eq!(algorithm, Some(ServerSideEncryption::AwsKms));

        cleanup_bucket(&client, &bucket).await;
    }
}
