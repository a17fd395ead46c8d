//! Stack plans.
//!
//! A [`StackPlan`] is the complete desired state a stack hands to an engine:
//! the provider it targets, resources in apply order, and exported outputs.

use std::collections::{BTreeMap, HashSet};

use bucketstack_core::AwsRegion;
use serde::{Deserialize, Serialize};

use crate::output::OutputValue;
use crate::resource::{ResourceDeclaration, ResourceKind, ResourceSpec};

/// Errors detected while validating or resolving a plan.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// Two resources share a logical name.
    #[error("duplicate logical name: {0}")]
    DuplicateLogicalName(String),

    /// A sub-configuration refers to a bucket not declared before it.
    #[error("resource {resource} references undeclared bucket {target}")]
    DanglingReference {
        /// The referring resource.
        resource: String,
        /// The missing bucket's logical name.
        target: String,
    },

    /// A lifecycle configuration without rules.
    #[error("lifecycle configuration {0} has no rules")]
    EmptyLifecycle(String),

    /// An output reads from a resource that is not declared.
    #[error("output {output} references undeclared resource {resource}")]
    UnknownOutputResource {
        /// The output name.
        output: String,
        /// The missing resource's logical name.
        resource: String,
    },

    /// An output attribute has no value after apply.
    #[error("attribute {attribute} of resource {resource} is not available")]
    UnresolvedOutput {
        /// The resource's logical name.
        resource: String,
        /// The attribute key.
        attribute: &'static str,
    },
}

/// The provider configuration a stack targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSpec {
    /// Logical provider name.
    pub name: String,
    /// Region every resource is created in.
    pub region: AwsRegion,
    /// Tags applied to every taggable resource.
    #[serde(default)]
    pub default_tags: BTreeMap<String, String>,
}

impl ProviderSpec {
    /// Create a provider without default tags.
    #[must_use]
    pub fn new(name: impl Into<String>, region: AwsRegion) -> Self {
        Self {
            name: name.into(),
            region,
            default_tags: BTreeMap::new(),
        }
    }

    /// Add a default tag.
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_tags.insert(key.into(), value.into());
        self
    }
}

/// The desired state of one stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackPlan {
    /// Stack name.
    pub stack: String,
    /// Target provider.
    pub provider: ProviderSpec,
    /// Resources in apply order.
    pub resources: Vec<ResourceDeclaration>,
    /// Named outputs.
    pub outputs: BTreeMap<String, OutputValue>,
}

impl StackPlan {
    /// Create an empty plan.
    #[must_use]
    pub fn new(stack: impl Into<String>, provider: ProviderSpec) -> Self {
        Self {
            stack: stack.into(),
            provider,
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Append a resource.
    pub fn declare(&mut self, logical_name: impl Into<String>, spec: ResourceSpec) {
        self.resources
            .push(ResourceDeclaration::new(logical_name, spec));
    }

    /// Append a resource when `spec` is present.
    pub fn declare_optional(&mut self, logical_name: impl Into<String>, spec: Option<ResourceSpec>) {
        if let Some(spec) = spec {
            self.declare(logical_name, spec);
        }
    }

    /// Export a named output.
    pub fn export(&mut self, name: impl Into<String>, value: OutputValue) {
        self.outputs.insert(name.into(), value);
    }

    /// Look up a declaration by logical name.
    #[must_use]
    pub fn get(&self, logical_name: &str) -> Option<&ResourceDeclaration> {
        self.resources
            .iter()
            .find(|r| r.logical_name == logical_name)
    }

    /// All declarations of one kind, in order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ResourceDeclaration> {
        self.resources.iter().filter(move |r| r.kind() == kind)
    }

    /// Check structural invariants.
    ///
    /// Logical names are unique, every sub-configuration references a bucket
    /// declared earlier, lifecycle configurations carry at least one rule,
    /// and outputs only read from declared resources.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut seen = HashSet::new();
        let mut buckets = HashSet::new();

        for decl in &self.resources {
            if !seen.insert(decl.logical_name.as_str()) {
                return Err(PlanError::DuplicateLogicalName(decl.logical_name.clone()));
            }

            if let Some(target) = decl.spec.bucket_ref() {
                if !buckets.contains(target) {
                    return Err(PlanError::DanglingReference {
                        resource: decl.logical_name.clone(),
                        target: target.to_owned(),
                    });
                }
            }

            match &decl.spec {
                ResourceSpec::Bucket(_) => {
                    buckets.insert(decl.logical_name.as_str());
                }
                ResourceSpec::Lifecycle(spec) if spec.rules.is_empty() => {
                    return Err(PlanError::EmptyLifecycle(decl.logical_name.clone()));
                }
                _ => {}
            }
        }

        for (name, output) in &self.outputs {
            for resource in output.references() {
                if !seen.contains(resource) {
                    return Err(PlanError::UnknownOutputResource {
                        output: name.clone(),
                        resource: resource.to_owned(),
                    });
                }
            }
        }

        Ok(())
    }
}
