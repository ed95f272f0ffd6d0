//! Proxy-side data providers consumed by the request handlers.

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;

/// Request headers with a dedicated attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderType {
    Path,
    Host,
    Scheme,
    UserAgent,
    Method,
    Referer,
}

/// Traffic snapshot taken when a request or connection ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportInfo {
    pub sent_bytes: u64,
    pub received_bytes: u64,
    pub duration: Duration,
    pub response_code: i32,
}

pub trait HttpCheckData: Send {
    fn request_headers(&self) -> BTreeMap<String, String>;
    fn find_header(&self, header: HeaderType) -> Option<String>;
    fn source_ip_port(&self) -> Option<(String, u16)>;
    fn source_user(&self) -> Option<String>;

    /// Removes and returns the blob forwarded by the previous hop.
    fn extract_forwarded_attributes(&mut self) -> Option<Bytes>;
    /// Attaches a blob for the next hop.
    fn add_forwarded_attributes(&mut self, data: Bytes);
}

pub trait HttpReportData: Send {
    fn report_info(&self) -> ReportInfo;
    fn response_headers(&self) -> BTreeMap<String, String>;
}

pub trait TcpCheckData: Send {
    fn source_ip_port(&self) -> Option<(String, u16)>;
    fn source_user(&self) -> Option<String>;
}

pub trait TcpReportData: Send {
    fn report_info(&self) -> ReportInfo;
    fn destination_ip_port(&self) -> Option<(String, u16)>;
}
