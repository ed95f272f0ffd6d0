use std::sync::Arc;
use std::time::SystemTime;

use mixgate_core::{Attributes, Code, Status};

use crate::adapter::{HeaderType, HttpCheckData, HttpReportData};
use crate::attribute_names as names;
use crate::client::{CancelHandle, CheckTransport, DoneFunc};
use crate::context::ServiceContext;
use crate::forward;

use super::{add_endpoint, saturating_i64, CheckCode};

/// Header-backed request attributes and their defaults.
const HEADER_ATTRIBUTES: [(HeaderType, &str, Option<&str>); 6] = [
    (HeaderType::Path, names::REQUEST_PATH, Some("")),
    (HeaderType::Host, names::REQUEST_HOST, Some("")),
    (HeaderType::Scheme, names::REQUEST_SCHEME, Some("http")),
    (HeaderType::UserAgent, names::REQUEST_USER_AGENT, None),
    (HeaderType::Method, names::REQUEST_METHOD, None),
    (HeaderType::Referer, names::REQUEST_REFERER, None),
];

pub struct HttpRequestHandler {
    service: Arc<ServiceContext>,
    attributes: Attributes,
    check_code: CheckCode,
}

impl HttpRequestHandler {
    pub fn new(service: Arc<ServiceContext>) -> Self {
        Self {
            service,
            attributes: Attributes::new(),
            check_code: CheckCode::default(),
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Code of the completed Check, 0 when none ran or it succeeded.
    pub fn check_status_code(&self) -> i32 {
        self.check_code.get()
    }

    pub fn check(
        &mut self,
        data: &mut dyn HttpCheckData,
        transport: Option<Arc<dyn CheckTransport>>,
        on_done: DoneFunc,
    ) -> CancelHandle {
        let forwarded = data.extract_forwarded_attributes();

        if self.service.enable_check() || self.service.enable_report() {
            self.attributes.merge(self.service.attributes());
            if let Some(blob) = forwarded {
                if let Err(e) = forward::merge_into(&mut self.attributes, &blob) {
                    tracing::warn!(error = %e, "ignoring forwarded attributes");
                }
            }
            self.extract_check_attributes(data);
        }

        self.forward_attributes(data);

        if !self.service.enable_check() {
            self.service.client().skip("check", "disabled");
            on_done(Status::ok());
            return CancelHandle::noop();
        }

        self.service.client().send_check(
            &self.attributes,
            transport,
            self.check_code.recording(on_done),
        )
    }

    pub fn report(&mut self, data: &dyn HttpReportData) {
        if !self.service.enable_report() {
            self.service.client().skip("report", "disabled");
            return;
        }
        if self.attributes.is_empty() {
            tracing::debug!("report skipped, no attributes collected");
            self.service.client().skip("report", "empty");
            return;
        }
        self.extract_report_attributes(data);
        self.service.client().send_report(&self.attributes);
    }

    fn extract_check_attributes(&mut self, data: &dyn HttpCheckData) {
        let mut b = self.attributes.builder();
        b.add_string_map(names::REQUEST_HEADERS, data.request_headers());

        for (header, name, default) in HEADER_ATTRIBUTES {
            match (data.find_header(header), default) {
                (Some(v), _) => {
                    b.add_string(name, v);
                }
                (None, Some(d)) => {
                    b.add_string(name, d);
                }
                (None, None) => {}
            }
        }

        if let Some(ep) = data.source_ip_port() {
            add_endpoint(&mut b, names::SOURCE_IP, names::SOURCE_PORT, ep);
        }
        if let Some(user) = data.source_user() {
            b.add_string(names::SOURCE_USER, user);
        }
        b.add_timestamp(names::REQUEST_TIME, SystemTime::now())
            .add_string(names::CONTEXT_PROTOCOL, "http");
    }

    fn forward_attributes(&self, data: &mut dyn HttpCheckData) {
        let fwd = self.service.forward_attributes();
        if fwd.is_empty() {
            return;
        }
        match forward::encode(fwd) {
            Ok(blob) => data.add_forwarded_attributes(blob),
            Err(e) => tracing::warn!(error = %e, "forward attributes not sent"),
        }
    }

    fn extract_report_attributes(&mut self, data: &dyn HttpReportData) {
        let info = data.report_info();
        let code = self.check_code.get();
        let response_code = if code != 0 {
            Code::from_i32(code).http_code()
        } else {
            i64::from(info.response_code)
        };

        self.attributes
            .builder()
            .add_string_map(names::RESPONSE_HEADERS, data.response_headers())
            .add_timestamp(names::RESPONSE_TIME, SystemTime::now())
            .add_int64(names::REQUEST_SIZE, saturating_i64(info.received_bytes))
            .add_int64(names::RESPONSE_SIZE, saturating_i64(info.sent_bytes))
            .add_duration(names::RESPONSE_DURATION, info.duration)
            .add_int64(names::RESPONSE_CODE, response_code);
    }
}
