//! Stack definitions for BucketStack.
//!
//! Each stack is a pure function from configuration and the caller's account
//! id to a [`StackPlan`](bucketstack_model::StackPlan):
//!
//! ```text
//! BucketServiceConfig ──┐
//!                       ├─> Stack::build(account) ─> StackPlan ─> engine
//! AccountId ────────────┘
//! ```
//!
//! - [`BootstrapStack`] declares the state bucket for the tooling itself.
//! - [`BucketServiceStack`] declares a configurable general-purpose bucket.

pub mod bootstrap;
pub mod bucket_service;
pub mod config;
mod stack;

pub use bootstrap::BootstrapStack;
pub use bucket_service::BucketServiceStack;
pub use config::{BucketServiceConfig, Encryption};
pub use stack::Stack;
