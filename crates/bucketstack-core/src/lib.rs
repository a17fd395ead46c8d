//! Core types, errors, and configuration for BucketStack.
//!
//! This crate provides the building blocks shared by the stack definitions
//! and the provisioning engine: validated AWS identifiers, the common error
//! type, engine configuration, and namespaced stack settings.

mod config;
mod error;
mod settings;
mod types;

pub use config::EngineConfig;
pub use error::{StackError, StackResult};
pub use settings::Settings;
pub use types::{AccountId, AwsRegion};
