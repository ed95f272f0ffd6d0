//! mixgate core: attribute model, status codes, and the referenced-attribute
//! signature engine.
//!
//! This crate defines the data shared by the policy client, the request
//! contexts, and any response cache sitting in front of the remote policy
//! service. It carries no runtime or transport dependencies so a cache layer
//! can depend on it alone.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed server hints surface as `MixError` so a bad response can only
//! disable caching, never crash the proxy.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod attributes;
pub mod dictionary;
pub mod error;
pub mod referenced;
pub mod status;

pub use attributes::{AttributeValue, Attributes, AttributesBuilder};
pub use error::{MixError, Result};
pub use referenced::{AttributeMatch, Condition, Referenced, ReferencedAttributes, Signature};
pub use status::{Code, Status};
