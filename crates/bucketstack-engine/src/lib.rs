//! Provisioning engines for BucketStack plans.
//!
//! A [`ProvisioningEngine`] resolves the caller's identity and applies one
//! resource declaration at a time. [`deploy`] drives an engine through a
//! whole [`StackPlan`](bucketstack_model::StackPlan), strictly in order, and
//! resolves the stack's outputs.
//!
//! # Architecture
//!
//! ```text
//! run(engine, mode, build)
//!        |
//!        v
//!   caller_identity() -> AccountId -> build(account) -> StackPlan
//!        |
//!        v
//!   preview(plan) | deploy(engine, plan)
//!                        |
//!                        v
//!              apply(provider, declaration, bucket)   (S3Engine | InMemoryEngine)
//! ```

pub mod aws;
mod deploy;
mod engine;
pub mod error;
pub mod memory;

pub use aws::S3Engine;
pub use deploy::{RunMode, RunReport, StackState, deploy, preview, run};
pub use engine::{AppliedResource, CallerIdentity, ProvisioningEngine, bucket_attributes};
pub use error::{EngineError, EngineResult};
pub use memory::InMemoryEngine;
