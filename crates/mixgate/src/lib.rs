//! Top-level facade crate for mixgate.
//!
//! Re-exports the attribute/signature core and the policy control layer so
//! proxies can depend on a single crate.

pub mod core {
    pub use mixgate_core::*;
}

pub mod control {
    pub use mixgate_control::*;
}
