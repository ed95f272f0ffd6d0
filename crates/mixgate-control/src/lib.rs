//! mixgate control library entry.
//!
//! This crate wires the policy client, the filter config, and the per-route
//! and per-request contexts into the surface a proxy filter talks to. It is
//! consumed by the config checker binary (`main.rs`) and by integration tests.

pub mod adapter;
pub mod attribute_names;
pub mod client;
pub mod config;
pub mod context;
pub mod controller;
pub mod forward;
pub mod handler;
pub mod obs;

pub use controller::{Controller, ControllerOptions};
