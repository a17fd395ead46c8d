//! Common AWS type definitions shared across stacks and engines.

use std::fmt;

/// AWS Account ID (12-digit string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Account ID reported by LocalStack-compatible emulators.
    pub const DEFAULT: &str = "000000000000";

    /// Create a new account ID from a string.
    ///
    /// # Errors
    /// Returns an error if the account ID is not a 12-digit numeric string.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::StackError> {
        let id = id.into();
        if id.len() != 12 || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(crate::StackError::InvalidAccountId(id));
        }
        Ok(Self(id))
    }

    /// Get the account ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append this account ID to `base`, producing a globally unique name.
    ///
    /// ```
    /// use bucketstack_core::AccountId;
    ///
    /// let account = AccountId::new("123456789012").unwrap();
    /// assert_eq!(account.scoped_name("logs"), "logs-123456789012");
    /// ```
    #[must_use]
    pub fn scoped_name(&self, base: &str) -> String {
        format!("{base}-{}", self.0)
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AWS Region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region both stacks deploy to unless told otherwise.
    pub const DEFAULT: &str = "eu-north-1";

    /// The region where S3 rejects an explicit location constraint.
    pub const US_EAST_1: &str = "us-east-1";

    /// Create a new region.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }

    /// Get the region as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is `us-east-1`.
    #[must_use]
    pub fn is_us_east_1(&self) -> bool {
        self.0 == Self::US_EAST_1
    }
}

impl Default for AwsRegion {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
