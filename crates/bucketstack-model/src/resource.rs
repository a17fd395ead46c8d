//! Resource declarations.
//!
//! Each [`ResourceDeclaration`] pairs a stable logical name with a typed
//! [`ResourceSpec`]. Sub-configurations refer to their bucket by the bucket's
//! logical name; engines resolve that reference to the physical bucket name
//! when applying.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Supporting configuration types
// ---------------------------------------------------------------------------

/// Bucket versioning status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersioningStatus {
    /// Versioning is enabled.
    #[default]
    Enabled,
    /// Versioning was previously enabled but is now suspended.
    Suspended,
}

impl VersioningStatus {
    /// The S3 wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "Enabled",
            Self::Suspended => "Suspended",
        }
    }
}

/// Server-side encryption algorithm applied by default to new objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SseAlgorithm {
    /// SSE-S3, Amazon S3 managed keys.
    #[serde(rename = "AES256")]
    Aes256,
    /// SSE-KMS, AWS KMS managed keys.
    #[serde(rename = "aws:kms")]
    AwsKms,
}

impl SseAlgorithm {
    /// The S3 wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aes256 => "AES256",
            Self::AwsKms => "aws:kms",
        }
    }

    /// Parse an S3 wire value. Returns `None` for anything unsupported.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "AES256" => Some(Self::Aes256),
            "aws:kms" => Some(Self::AwsKms),
            _ => None,
        }
    }
}

impl fmt::Display for SseAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Resource specs
// ---------------------------------------------------------------------------

/// An S3 bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSpec {
    /// Physical bucket name.
    pub bucket: String,
}

/// Versioning configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersioningSpec {
    /// Logical name of the bucket this applies to.
    pub bucket: String,
    /// Desired versioning status.
    pub status: VersioningStatus,
}

/// Default server-side encryption configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionSpec {
    /// Logical name of the bucket this applies to.
    pub bucket: String,
    /// The encryption algorithm.
    pub sse_algorithm: SseAlgorithm,
    /// KMS key to use with `aws:kms`; the AWS managed key when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<String>,
    /// Whether an S3 Bucket Key is enabled.
    pub bucket_key_enabled: bool,
}

/// What a lifecycle rule does to noncurrent object versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LifecycleAction {
    /// Move noncurrent versions to another storage class.
    #[serde(rename_all = "camelCase")]
    TransitionNoncurrent {
        /// Days after becoming noncurrent.
        noncurrent_days: i32,
        /// Target storage class, e.g. `STANDARD_IA`.
        storage_class: String,
    },
    /// Permanently delete noncurrent versions.
    #[serde(rename_all = "camelCase")]
    ExpireNoncurrent {
        /// Days after becoming noncurrent.
        noncurrent_days: i32,
    },
}

/// A single lifecycle rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRule {
    /// Rule identifier.
    pub id: String,
    /// Whether the rule is enabled.
    pub enabled: bool,
    /// Key prefix filter; empty matches every object.
    #[serde(default)]
    pub prefix: String,
    /// The rule's action.
    pub action: LifecycleAction,
}

impl LifecycleRule {
    /// An enabled, bucket-wide rule.
    #[must_use]
    pub fn enabled(id: impl Into<String>, action: LifecycleAction) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            prefix: String::new(),
            action,
        }
    }
}

/// Lifecycle configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleSpec {
    /// Logical name of the bucket this applies to.
    pub bucket: String,
    /// Rules, in declaration order. Never empty in a valid plan.
    pub rules: Vec<LifecycleRule>,
}

/// Public access block configuration for a bucket.
///
/// AWS defines exactly four boolean fields for this configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct PublicAccessBlockSpec {
    /// Logical name of the bucket this applies to.
    pub bucket: String,
    /// Whether Amazon S3 should block public ACLs for this bucket.
    pub block_public_acls: bool,
    /// Whether Amazon S3 should ignore public ACLs for this bucket.
    pub ignore_public_acls: bool,
    /// Whether Amazon S3 should block public bucket policies.
    pub block_public_policy: bool,
    /// Whether Amazon S3 should restrict public bucket policies.
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockSpec {
    /// Block every form of public access to `bucket`.
    #[must_use]
    pub fn block_all(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            block_public_acls: true,
            ignore_public_acls: true,
            block_public_policy: true,
            restrict_public_buckets: true,
        }
    }

    /// Whether all four flags are set.
    #[must_use]
    pub fn blocks_everything(&self) -> bool {
        self.block_public_acls
            && self.ignore_public_acls
            && self.block_public_policy
            && self.restrict_public_buckets
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// The kind of a declared resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// `aws:s3:Bucket`.
    Bucket,
    /// `aws:s3:BucketVersioning`.
    Versioning,
    /// `aws:s3:BucketServerSideEncryptionConfiguration`.
    Encryption,
    /// `aws:s3:BucketLifecycleConfiguration`.
    Lifecycle,
    /// `aws:s3:BucketPublicAccessBlock`.
    PublicAccessBlock,
}

impl ResourceKind {
    /// Fully qualified resource type token.
    #[must_use]
    pub fn type_token(self) -> &'static str {
        match self {
            Self::Bucket => "aws:s3:Bucket",
            Self::Versioning => "aws:s3:BucketVersioning",
            Self::Encryption => "aws:s3:BucketServerSideEncryptionConfiguration",
            Self::Lifecycle => "aws:s3:BucketLifecycleConfiguration",
            Self::PublicAccessBlock => "aws:s3:BucketPublicAccessBlock",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_token())
    }
}

/// The typed body of a resource declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "camelCase")]
pub enum ResourceSpec {
    /// An S3 bucket.
    Bucket(BucketSpec),
    /// Bucket versioning.
    Versioning(VersioningSpec),
    /// Default server-side encryption.
    Encryption(EncryptionSpec),
    /// Lifecycle rules.
    Lifecycle(LifecycleSpec),
    /// Public access block.
    PublicAccessBlock(PublicAccessBlockSpec),
}

impl ResourceSpec {
    /// The resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Bucket(_) => ResourceKind::Bucket,
            Self::Versioning(_) => ResourceKind::Versioning,
            Self::Encryption(_) => ResourceKind::Encryption,
            Self::Lifecycle(_) => ResourceKind::Lifecycle,
            Self::PublicAccessBlock(_) => ResourceKind::PublicAccessBlock,
        }
    }

    /// Logical name of the bucket a sub-configuration attaches to.
    #[must_use]
    pub fn bucket_ref(&self) -> Option<&str> {
        match self {
            Self::Bucket(_) => None,
            Self::Versioning(s) => Some(&s.bucket),
            Self::Encryption(s) => Some(&s.bucket),
            Self::Lifecycle(s) => Some(&s.bucket),
            Self::PublicAccessBlock(s) => Some(&s.bucket),
        }
    }
}

/// A resource with its stable logical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDeclaration {
    /// Logical name, unique within a stack.
    pub logical_name: String,
    /// Desired properties.
    #[serde(flatten)]
    pub spec: ResourceSpec,
}

impl ResourceDeclaration {
    /// Create a declaration.
    #[must_use]
    pub fn new(logical_name: impl Into<String>, spec: ResourceSpec) -> Self {
        Self {
            logical_name: logical_name.into(),
            spec,
        }
    }

    /// The resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }
}
