//! Fake transports and adapters shared by integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};

use mixgate_control::adapter::{
    HeaderType, HttpCheckData, HttpReportData, ReportInfo, TcpCheckData, TcpReportData,
};
use mixgate_control::client::{
    CheckRequest, CheckResponse, CheckTransport, DoneFunc, QuotaRequest, QuotaResponse,
    QuotaTransport, ReportRequest, ReportResponse, ReportTransport,
};
use mixgate_core::Status;

/// Callback that forwards the status into a channel.
pub fn done() -> (DoneFunc, oneshot::Receiver<Status>) {
    let (tx, rx) = oneshot::channel();
    let f: DoneFunc = Box::new(move |s| {
        let _ = tx.send(s);
    });
    (f, rx)
}

pub struct FakeCheck {
    pub result: Result<CheckResponse, Status>,
    pub requests: Mutex<Vec<CheckRequest>>,
    /// Never resolves when set.
    pub hang: bool,
}

impl FakeCheck {
    pub fn ok(precondition: Status) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(CheckResponse {
                precondition,
                ..Default::default()
            }),
            requests: Mutex::new(Vec::new()),
            hang: false,
        })
    }

    pub fn err(status: Status) -> Arc<Self> {
        Arc::new(Self {
            result: Err(status),
            requests: Mutex::new(Vec::new()),
            hang: false,
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            result: Ok(CheckResponse::default()),
            requests: Mutex::new(Vec::new()),
            hang: true,
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> CheckRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl CheckTransport for FakeCheck {
    async fn check(&self, request: CheckRequest) -> Result<CheckResponse, Status> {
        self.requests.lock().unwrap().push(request);
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.result.clone()
    }
}

pub struct FakeReport {
    pub result: Result<ReportResponse, Status>,
    pub tx: mpsc::UnboundedSender<ReportRequest>,
}

impl FakeReport {
    pub fn new(result: Result<ReportResponse, Status>) -> (Arc<Self>, mpsc::UnboundedReceiver<ReportRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { result, tx }), rx)
    }
}

#[async_trait]
impl ReportTransport for FakeReport {
    async fn report(&self, request: ReportRequest) -> Result<ReportResponse, Status> {
        let _ = self.tx.send(request);
        self.result.clone()
    }
}

pub struct FakeQuota {
    pub result: Result<QuotaResponse, Status>,
    pub requests: Mutex<Vec<QuotaRequest>>,
}

impl FakeQuota {
    pub fn new(result: Result<QuotaResponse, Status>) -> Arc<Self> {
        Arc::new(Self {
            result,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<QuotaRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuotaTransport for FakeQuota {
    async fn quota(&self, request: QuotaRequest) -> Result<QuotaResponse, Status> {
        self.requests.lock().unwrap().push(request);
        self.result.clone()
    }
}

#[derive(Default)]
pub struct FakeHttp {
    pub headers: BTreeMap<String, String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub method: Option<String>,
    pub source: Option<(String, u16)>,
    pub user: Option<String>,
    pub forwarded_in: Option<Bytes>,
    pub forwarded_out: Vec<Bytes>,
    pub extract_calls: usize,
    pub header_reads: AtomicUsize,
}

impl FakeHttp {
    pub fn header_reads(&self) -> usize {
        self.header_reads.load(Ordering::Relaxed)
    }
}

impl HttpCheckData for FakeHttp {
    fn request_headers(&self) -> BTreeMap<String, String> {
        self.header_reads.fetch_add(1, Ordering::Relaxed);
        self.headers.clone()
    }

    fn find_header(&self, header: HeaderType) -> Option<String> {
        match header {
            HeaderType::Path => self.path.clone(),
            HeaderType::Host => self.host.clone(),
            HeaderType::Method => self.method.clone(),
            _ => None,
        }
    }

    fn source_ip_port(&self) -> Option<(String, u16)> {
        self.source.clone()
    }

    fn source_user(&self) -> Option<String> {
        self.user.clone()
    }

    fn extract_forwarded_attributes(&mut self) -> Option<Bytes> {
        self.extract_calls += 1;
        self.forwarded_in.take()
    }

    fn add_forwarded_attributes(&mut self, data: Bytes) {
        self.forwarded_out.push(data);
    }
}

pub struct FakeHttpReport {
    pub info: ReportInfo,
    pub headers: BTreeMap<String, String>,
}

impl FakeHttpReport {
    pub fn with_code(response_code: i32) -> Self {
        Self {
            info: ReportInfo {
                sent_bytes: 512,
                received_bytes: 128,
                duration: Duration::from_millis(15),
                response_code,
            },
            headers: BTreeMap::from([("content-type".to_string(), "text/plain".to_string())]),
        }
    }
}

impl HttpReportData for FakeHttpReport {
    fn report_info(&self) -> ReportInfo {
        self.info
    }

    fn response_headers(&self) -> BTreeMap<String, String> {
        self.headers.clone()
    }
}

#[derive(Default)]
pub struct FakeTcp {
    pub source: Option<(String, u16)>,
    pub destination: Option<(String, u16)>,
    pub user: Option<String>,
    pub info: ReportInfo,
}

impl TcpCheckData for FakeTcp {
    fn source_ip_port(&self) -> Option<(String, u16)> {
        self.source.clone()
    }

    fn source_user(&self) -> Option<String> {
        self.user.clone()
    }
}

impl TcpReportData for FakeTcp {
    fn report_info(&self) -> ReportInfo {
        self.info
    }

    fn destination_ip_port(&self) -> Option<(String, u16)> {
        self.destination.clone()
    }
}
