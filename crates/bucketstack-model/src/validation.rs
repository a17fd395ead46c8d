//! Bucket name validation.
//!
//! Account-scoped names are assembled from user configuration, so they are
//! checked against the
//! [S3 naming rules](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html)
//! before a plan is handed to an engine.

use std::net::Ipv4Addr;

use bucketstack_core::{StackError, StackResult};

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Prefixes S3 reserves.
const RESERVED_PREFIXES: &[&str] = &["xn--", "sthree-"];

/// Suffixes S3 reserves.
const RESERVED_SUFFIXES: &[&str] = &["-s3alias", "--ol-s3"];

/// Validate an S3 bucket name.
///
/// # Examples
///
/// ```
/// use bucketstack_model::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("logs-123456789012").is_ok());
/// assert!(validate_bucket_name("Logs").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> StackResult<()> {
    let invalid = |reason: String| StackError::InvalidBucketName {
        name: name.to_owned(),
        reason,
    };

    let len = name.len();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(format!(
            "must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
        )));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            "must only contain lowercase letters, numbers, hyphens, and dots".to_owned(),
        ));
    }

    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = name.as_bytes();
    if !alnum(bytes[0]) || !alnum(bytes[len - 1]) {
        return Err(invalid("must start and end with a letter or number".to_owned()));
    }

    if name.contains("..") {
        return Err(invalid("must not contain consecutive dots".to_owned()));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid("must not be formatted as an IP address".to_owned()));
    }

    if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| name.starts_with(*p)) {
        return Err(invalid(format!("must not start with '{prefix}'")));
    }

    if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| name.ends_with(*s)) {
        return Err(invalid(format!("must not end with '{suffix}'")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_accept_account_scoped_names() {
        assert!(validate_bucket_name("logs-123456789012").is_ok());
        assert!(validate_bucket_name("kro-platform-pulumi-state-123456789012").is_ok());
        assert!(validate_bucket_name("my.dotted.bucket").is_ok());
    }

    #[test]
    fn test_should_reject_bad_length() {
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_should_reject_uppercase_and_underscores() {
        assert!(validate_bucket_name("My-Bucket").is_err());
        assert!(validate_bucket_name("my_bucket").is_err());
    }

    #[test]
    fn test_should_reject_bad_edges_and_dots() {
        assert!(validate_bucket_name("-bucket").is_err());
        assert!(validate_bucket_name("bucket.").is_err());
        assert!(validate_bucket_name("my..bucket").is_err());
        assert!(validate_bucket_name("192.168.0.1").is_err());
    }

    #[test]
    fn test_should_reject_reserved_affixes() {
        assert!(validate_bucket_name("xn--bucket").is_err());
        assert!(validate_bucket_name("sthree-bucket").is_err());
        assert!(validate_bucket_name("bucket-s3alias").is_err());
    }

    #[test]
    fn test_should_name_reason_in_error() {
        let err = validate_bucket_name("my..bucket").unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid bucket name: my..bucket: must not contain consecutive dots"
        );
    }
}
