//! Shared and per-route policy context.
//!
//! [`ClientContext`] owns the filter config and the policy client for the
//! whole process. [`ServiceContext`] resolves what a single route does: which
//! calls are enabled and which static attributes it contributes.

pub mod client;
pub mod service;

pub use client::ClientContext;
pub use service::ServiceContext;
