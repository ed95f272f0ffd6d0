//! Per-request orchestration of Check and Report.
//!
//! A handler accumulates one attribute bag across the lifetime of a request
//! or connection. Check fills it from static and request attributes; Report
//! adds response data to the same bag, so the two calls describe one request.

pub mod http;
pub mod tcp;

use std::net::IpAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use bytes::Bytes;

use mixgate_core::{AttributesBuilder, Status};

use crate::client::DoneFunc;

pub use http::HttpRequestHandler;
pub use tcp::TcpRequestHandler;

/// Code of the last completed Check, 0 until one finishes.
#[derive(Debug, Clone, Default)]
pub(crate) struct CheckCode(Arc<AtomicI32>);

impl CheckCode {
    pub(crate) fn get(&self) -> i32 {
        self.0.load(Ordering::Acquire)
    }

    /// Wraps `on_done` so the outcome is recorded before the caller sees it.
    pub(crate) fn recording(&self, on_done: DoneFunc) -> DoneFunc {
        let slot = Arc::clone(&self.0);
        Box::new(move |status: Status| {
            slot.store(status.code.as_i32(), Ordering::Release);
            on_done(status);
        })
    }
}

/// IP literals as network-order octets, anything else as raw bytes.
fn ip_bytes(ip: &str) -> Bytes {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => Bytes::copy_from_slice(&v4.octets()),
        Ok(IpAddr::V6(v6)) => Bytes::copy_from_slice(&v6.octets()),
        Err(_) => Bytes::copy_from_slice(ip.as_bytes()),
    }
}

fn add_endpoint(
    builder: &mut AttributesBuilder<'_>,
    ip_key: &str,
    port_key: &str,
    (ip, port): (String, u16),
) {
    builder
        .add_bytes(ip_key, ip_bytes(&ip))
        .add_int64(port_key, i64::from(port));
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
