//! Well-known attribute names produced by the request handlers.

pub const SOURCE_USER: &str = "source.user";
pub const SOURCE_IP: &str = "source.ip";
pub const SOURCE_PORT: &str = "source.port";

pub const REQUEST_HEADERS: &str = "request.headers";
pub const REQUEST_HOST: &str = "request.host";
pub const REQUEST_METHOD: &str = "request.method";
pub const REQUEST_PATH: &str = "request.path";
pub const REQUEST_REFERER: &str = "request.referer";
pub const REQUEST_SCHEME: &str = "request.scheme";
pub const REQUEST_SIZE: &str = "request.size";
pub const REQUEST_TIME: &str = "request.time";
pub const REQUEST_USER_AGENT: &str = "request.useragent";

pub const RESPONSE_CODE: &str = "response.code";
pub const RESPONSE_DURATION: &str = "response.duration";
pub const RESPONSE_HEADERS: &str = "response.headers";
pub const RESPONSE_SIZE: &str = "response.size";
pub const RESPONSE_TIME: &str = "response.time";

// upstream side of a tcp connection
pub const DESTINATION_IP: &str = "destination.ip";
pub const DESTINATION_PORT: &str = "destination.port";

pub const CONNECTION_RECEIVED_BYTES: &str = "connection.received.bytes";
pub const CONNECTION_RECEIVED_TOTAL_BYTES: &str = "connection.received.bytes_total";
pub const CONNECTION_SENT_BYTES: &str = "connection.sent.bytes";
pub const CONNECTION_SENT_TOTAL_BYTES: &str = "connection.sent.bytes_total";
pub const CONNECTION_DURATION: &str = "connection.duration";

pub const CONTEXT_PROTOCOL: &str = "context.protocol";
pub const CONTEXT_TIME: &str = "context.time";

pub const CHECK_STATUS: &str = "check.status";
