//! Stack output expressions.
//!
//! Outputs are declared before any resource exists, so most of them refer to
//! attributes of an applied bucket. An engine resolves them once the plan has
//! been applied.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::plan::PlanError;

/// Attributes an applied bucket exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BucketAttribute {
    /// Physical bucket name.
    Id,
    /// `arn:aws:s3:::<bucket>`.
    Arn,
    /// Region the bucket lives in.
    Region,
    /// Global virtual-hosted domain name.
    BucketDomainName,
    /// Regional virtual-hosted domain name.
    BucketRegionalDomainName,
}

impl BucketAttribute {
    /// Attribute key as stored on applied resources.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Arn => "arn",
            Self::Region => "region",
            Self::BucketDomainName => "bucketDomainName",
            Self::BucketRegionalDomainName => "bucketRegionalDomainName",
        }
    }
}

/// A value exported by a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputValue {
    /// A value known at declaration time.
    Literal {
        /// The value.
        value: Value,
    },
    /// An attribute of an applied resource.
    Attribute {
        /// Logical name of the resource.
        resource: String,
        /// The attribute to read.
        attribute: BucketAttribute,
    },
    /// `prefix` followed by an attribute of an applied resource.
    Interpolate {
        /// Literal prefix, e.g. `s3://`.
        prefix: String,
        /// Logical name of the resource.
        resource: String,
        /// The attribute to append.
        attribute: BucketAttribute,
    },
    /// A nested record of outputs.
    Map {
        /// Entries of the record.
        entries: BTreeMap<String, OutputValue>,
    },
}

impl OutputValue {
    /// A literal output.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// An attribute of `resource`.
    #[must_use]
    pub fn attribute(resource: impl Into<String>, attribute: BucketAttribute) -> Self {
        Self::Attribute {
            resource: resource.into(),
            attribute,
        }
    }

    /// `s3://<bucket id>` for the bucket named `resource`.
    #[must_use]
    pub fn s3_url(resource: impl Into<String>) -> Self {
        Self::Interpolate {
            prefix: "s3://".to_owned(),
            resource: resource.into(),
            attribute: BucketAttribute::Id,
        }
    }

    /// A record built from `(key, value)` pairs.
    #[must_use]
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, OutputValue)>) -> Self {
        Self::Map {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Logical names of every resource this output reads from.
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Literal { .. } => Vec::new(),
            Self::Attribute { resource, .. } | Self::Interpolate { resource, .. } => {
                vec![resource.as_str()]
            }
            Self::Map { entries } => entries.values().flat_map(OutputValue::references).collect(),
        }
    }

    /// Resolve to a JSON value using `lookup` for resource attributes.
    pub fn resolve<F>(&self, lookup: &F) -> Result<Value, PlanError>
    where
        F: Fn(&str, BucketAttribute) -> Option<String>,
    {
        let read = |resource: &str, attribute: BucketAttribute| {
            lookup(resource, attribute).ok_or_else(|| PlanError::UnresolvedOutput {
                resource: resource.to_owned(),
                attribute: attribute.key(),
            })
        };

        match self {
            Self::Literal { value } => Ok(value.clone()),
            Self::Attribute {
                resource,
                attribute,
            } => read(resource, *attribute).map(Value::String),
            Self::Interpolate {
                prefix,
                resource,
                attribute,
            } => read(resource, *attribute).map(|v| Value::String(format!("{prefix}{v}"))),
            Self::Map { entries } => entries
                .iter()
                .map(|(k, v)| v.resolve(lookup).map(|v| (k.clone(), v)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Value::Object),
        }
    }
}
