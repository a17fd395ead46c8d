//! Bucket service configuration.
//!
//! Provides [`BucketServiceConfig`], read from namespaced [`Settings`]:
//!
//! | Setting | Environment | Default |
//! |---------|-------------|---------|
//! | `bucket-service:bucketName` | `BUCKET_NAME` | *(required)* |
//! | `bucket-service:versioning` | `VERSIONING` | `false` |
//! | `bucket-service:encryption` | `ENCRYPTION` | `AES256` |
//! | `bucket-service:lifecycleEnabled` | `LIFECYCLE_ENABLED` | `false` |
//! | `bucket-service:lifecycleDays` | `LIFECYCLE_DAYS` | `90` |
//! | `bucket-service:expirationDays` | `EXPIRATION_DAYS` | `0` (disabled) |
//! | `aws:region` | `AWS_REGION` | `eu-north-1` |

use std::path::Path;

use bucketstack_core::{AwsRegion, Settings, StackResult};
use bucketstack_model::SseAlgorithm;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Settings namespace of the bucket service.
pub const NAMESPACE: &str = "bucket-service";

/// Settings namespace of the AWS provider.
pub const AWS_NAMESPACE: &str = "aws";

/// Transition threshold used when `lifecycleDays` is unset or zero.
pub const DEFAULT_LIFECYCLE_DAYS: i32 = 90;

/// Environment overrides for the service namespace.
const SERVICE_ENV: &[(&str, &str)] = &[
    ("bucketName", "BUCKET_NAME"),
    ("versioning", "VERSIONING"),
    ("encryption", "ENCRYPTION"),
    ("lifecycleEnabled", "LIFECYCLE_ENABLED"),
    ("lifecycleDays", "LIFECYCLE_DAYS"),
    ("expirationDays", "EXPIRATION_DAYS"),
];

/// Environment overrides for the AWS namespace.
const AWS_ENV: &[(&str, &str)] = &[("region", "AWS_REGION")];

/// The encryption requested for the bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encryption {
    /// A supported algorithm.
    Supported(SseAlgorithm),
    /// A value no encryption rule exists for.
    Unsupported(String),
}

impl Encryption {
    /// The configured value as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Supported(alg) => alg.as_str(),
            Self::Unsupported(raw) => raw,
        }
    }
}

/// Bucket service stack configuration.
///
/// # Examples
///
/// ```
/// use bucketstack_stacks::BucketServiceConfig;
///
/// let config = BucketServiceConfig::builder()
///     .bucket_name("logs".into())
///     .versioning(true)
///     .build();
/// assert_eq!(config.encryption, "AES256");
/// assert_eq!(config.region.as_str(), "eu-north-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct BucketServiceConfig {
    /// Base bucket name; the account id is appended.
    pub bucket_name: String,

    /// Whether versioning is enabled.
    #[builder(default = false)]
    pub versioning: bool,

    /// Encryption algorithm (`AES256` or `aws:kms`).
    #[builder(default = String::from("AES256"))]
    pub encryption: String,

    /// Whether lifecycle rules are requested. Only honored with versioning.
    #[builder(default = false)]
    pub lifecycle_enabled: bool,

    /// Days before noncurrent versions move to `STANDARD_IA`.
    #[builder(default = DEFAULT_LIFECYCLE_DAYS)]
    pub lifecycle_days: i32,

    /// Days before noncurrent versions expire; zero disables expiration.
    #[builder(default = 0)]
    pub expiration_days: i32,

    /// Region to deploy to.
    #[builder(default)]
    pub region: AwsRegion,
}

impl BucketServiceConfig {
    /// Read the configuration from namespaced settings.
    pub fn from_settings(settings: &Settings) -> StackResult<Self> {
        let bucket_name = settings.require(NAMESPACE, "bucketName")?.to_owned();
        let encryption = settings
            .get(NAMESPACE, "encryption")
            .unwrap_or(SseAlgorithm::Aes256.as_str())
            .to_owned();
        let lifecycle_days = match settings.get_int(NAMESPACE, "lifecycleDays")? {
            None | Some(0) => DEFAULT_LIFECYCLE_DAYS,
            Some(days) => days,
        };
        let region = settings
            .get(AWS_NAMESPACE, "region")
            .map(AwsRegion::new)
            .unwrap_or_default();

        Ok(Self {
            bucket_name,
            versioning: settings.get_bool(NAMESPACE, "versioning")?.unwrap_or(false),
            encryption,
            lifecycle_enabled: settings
                .get_bool(NAMESPACE, "lifecycleEnabled")?
                .unwrap_or(false),
            lifecycle_days,
            expiration_days: settings.get_int(NAMESPACE, "expirationDays")?.unwrap_or(0),
            region,
        })
    }

    /// Load settings from an optional JSON file, overlay the environment, and
    /// read the configuration.
    pub fn load(path: Option<&Path>) -> StackResult<Self> {
        let mut settings = match path {
            Some(path) => Settings::from_file(path)?,
            None => Settings::new(),
        };
        settings.overlay_env(NAMESPACE, SERVICE_ENV);
        settings.overlay_env(AWS_NAMESPACE, AWS_ENV);
        Self::from_settings(&settings)
    }

    /// The effective encryption; empty means `AES256`.
    #[must_use]
    pub fn effective_encryption(&self) -> Encryption {
        if self.encryption.is_empty() {
            return Encryption::Supported(SseAlgorithm::Aes256);
        }
        SseAlgorithm::parse(&self.encryption)
            .map_or_else(|| Encryption::Unsupported(self.encryption.clone()), Encryption::Supported)
    }

    /// The effective transition threshold; zero means the default.
    #[must_use]
    pub fn effective_lifecycle_days(&self) -> i32 {
        if self.lifecycle_days == 0 {
            DEFAULT_LIFECYCLE_DAYS
        } else {
            self.lifecycle_days
        }
    }

    /// Whether lifecycle rules may be declared at all.
    #[must_use]
    pub fn lifecycle_eligible(&self) -> bool {
        self.lifecycle_enabled && self.versioning
    }
}
