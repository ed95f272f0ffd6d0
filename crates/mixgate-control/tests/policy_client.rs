#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod support;

use std::sync::Arc;

use mixgate_control::client::{
    CheckOptions, CheckTransport, ClientOptions, DedupCounter, PolicyClient, QuotaResponse,
    ReportResponse,
};
use mixgate_core::{AttributeValue, Attributes, Code, Status};

use support::{done, FakeCheck, FakeQuota, FakeReport};

fn bag() -> Attributes {
    let mut a = Attributes::new();
    a.builder()
        .add_string("request.path", "/orders")
        .add_int64("source.port", 443);
    a
}

fn check_client(transport: Arc<FakeCheck>, fail_open: bool) -> PolicyClient {
    PolicyClient::new(ClientOptions {
        check_transport: Some(transport),
        check_options: CheckOptions {
            network_fail_open: fail_open,
        },
        ..Default::default()
    })
}

#[tokio::test]
async fn check_returns_precondition_status() {
    let t = FakeCheck::ok(Status::new(Code::PermissionDenied, "denied by rule"));
    let client = check_client(t.clone(), true);

    let (f, rx) = done();
    let handle = client.check(&bag(), None, f);
    assert!(!handle.is_noop());

    let status = rx.await.unwrap();
    assert_eq!(status.code, Code::PermissionDenied);
    assert_eq!(t.calls(), 1);
    assert_eq!(t.last().attributes, bag());
}

#[tokio::test]
async fn unavailable_check_fails_open() {
    let client = check_client(FakeCheck::err(Status::unavailable("connect refused")), true);

    let (f, rx) = done();
    client.check(&bag(), None, f);
    assert!(rx.await.unwrap().is_ok());
    assert_eq!(client.metrics().fail_open.get(&[("call", "check")]), 1);
    assert_eq!(
        client.metrics().calls.get(&[("call", "check"), ("code", "OK")]),
        1
    );
}

#[tokio::test]
async fn unavailable_check_fails_closed() {
    let client = check_client(FakeCheck::err(Status::unavailable("connect refused")), false);

    let (f, rx) = done();
    client.check(&bag(), None, f);
    assert_eq!(rx.await.unwrap().code, Code::Unavailable);
    assert_eq!(client.metrics().fail_open.get(&[("call", "check")]), 0);
}

#[tokio::test]
async fn other_check_errors_pass_through_even_when_failing_open() {
    let client = check_client(FakeCheck::err(Status::new(Code::DeadlineExceeded, "slow")), true);

    let (f, rx) = done();
    client.check(&bag(), None, f);
    let status = rx.await.unwrap();
    assert_eq!(status.code, Code::DeadlineExceeded);
    assert_eq!(status.message, "slow");
}

#[tokio::test]
async fn missing_transport_is_invalid_argument() {
    let client = PolicyClient::new(ClientOptions::default());

    let (f, mut rx) = done();
    let handle = client.check(&bag(), None, f);
    assert!(handle.is_noop());
    // delivered before check() returned
    assert_eq!(rx.try_recv().unwrap().code, Code::InvalidArgument);

    let (f, mut rx) = done();
    client.report(&bag(), f);
    assert_eq!(rx.try_recv().unwrap().code, Code::InvalidArgument);

    let (f, mut rx) = done();
    client.quota(&bag(), f);
    assert_eq!(rx.try_recv().unwrap().code, Code::InvalidArgument);
}

#[tokio::test]
async fn per_call_transport_overrides_default() {
    let default_t = FakeCheck::ok(Status::ok());
    let override_t = FakeCheck::ok(Status::new(Code::Unauthenticated, "no token"));
    let client = check_client(default_t.clone(), true);

    let (f, rx) = done();
    let t: Arc<dyn CheckTransport> = override_t.clone();
    client.check(&bag(), Some(t), f);
    assert_eq!(rx.await.unwrap().code, Code::Unauthenticated);
    assert_eq!(default_t.calls(), 0);
    assert_eq!(override_t.calls(), 1);
}

#[tokio::test]
async fn cancelled_check_never_completes() {
    let t = FakeCheck::hanging();
    let client = check_client(t, true);

    let (f, rx) = done();
    let handle = client.check(&bag(), None, f);
    handle.cancel();

    // the callback is dropped with the aborted task
    assert!(rx.await.is_err());
    tokio::task::yield_now().await;
    assert_eq!(client.metrics().in_flight.get(&[("call", "check")]), 0);
}

#[tokio::test]
async fn cancel_after_completion_is_noop() {
    let client = check_client(FakeCheck::ok(Status::ok()), true);

    let (f, rx) = done();
    let handle = client.check(&bag(), None, f);
    assert!(rx.await.unwrap().is_ok());
    handle.cancel();
    handle.cancel();
}

#[tokio::test]
async fn report_failure_is_surfaced() {
    let (t, mut reqs) = FakeReport::new(Err(Status::unavailable("down")));
    let client = PolicyClient::new(ClientOptions {
        report_transport: Some(t),
        ..Default::default()
    });

    let (f, rx) = done();
    client.report(&bag(), f);
    assert_eq!(rx.await.unwrap().code, Code::Unavailable);

    let sent = reqs.recv().await.unwrap();
    assert_eq!(sent.attributes, vec![bag()]);
}

#[tokio::test]
async fn report_success() {
    let (t, _reqs) = FakeReport::new(Ok(ReportResponse));
    let client = PolicyClient::new(ClientOptions {
        report_transport: Some(t),
        ..Default::default()
    });

    let (f, rx) = done();
    client.report(&bag(), f);
    assert!(rx.await.unwrap().is_ok());
}

fn quota_client(t: Arc<FakeQuota>, dedup: DedupCounter) -> PolicyClient {
    PolicyClient::new(ClientOptions {
        quota_transport: Some(t),
        check_options: CheckOptions {
            network_fail_open: false,
        },
        dedup,
        ..Default::default()
    })
}

#[tokio::test]
async fn quota_moves_name_and_amount_into_request() {
    let t = FakeQuota::new(Ok(QuotaResponse::default()));
    let client = quota_client(t.clone(), DedupCounter::default());

    let mut a = bag();
    a.builder()
        .add_string("quota.name", "requests")
        .add_int64("quota.amount", 5);

    for _ in 0..2 {
        let (f, rx) = done();
        client.quota(&a, f);
        assert!(rx.await.unwrap().is_ok());
    }

    let reqs = t.requests();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].quota, "requests");
    assert_eq!(reqs[0].amount, 5);
    assert!(!reqs[0].best_effort);
    assert_eq!(reqs[0].attributes, bag());
    assert_eq!(reqs[0].deduplication_id, "0");
    assert_eq!(reqs[1].deduplication_id, "1");
}

#[tokio::test]
async fn quota_keys_with_wrong_type_stay_in_bag() {
    let t = FakeQuota::new(Ok(QuotaResponse::default()));
    let client = quota_client(t.clone(), DedupCounter::starting_at(41));

    let mut a = Attributes::new();
    a.builder()
        .add_int64("quota.name", 3)
        .add_string("quota.amount", "five");

    let (f, rx) = done();
    client.quota(&a, f);
    rx.await.unwrap();

    let req = &t.requests()[0];
    assert_eq!(req.quota, "");
    assert_eq!(req.amount, 0);
    assert_eq!(req.attributes.get("quota.name"), Some(&AttributeValue::Int64(3)));
    assert_eq!(req.deduplication_id, "41");
}

#[tokio::test]
async fn quota_unavailable_is_success_regardless_of_policy() {
    let t = FakeQuota::new(Err(Status::unavailable("down")));
    let client = quota_client(t, DedupCounter::default());

    let (f, rx) = done();
    client.quota(&bag(), f);
    assert!(rx.await.unwrap().is_ok());
}

#[tokio::test]
async fn quota_other_errors_surface() {
    let t = FakeQuota::new(Err(Status::new(Code::ResourceExhausted, "over limit")));
    let client = quota_client(t, DedupCounter::default());

    let (f, rx) = done();
    client.quota(&bag(), f);
    assert_eq!(rx.await.unwrap().code, Code::ResourceExhausted);
}

#[tokio::test]
async fn dedup_ids_are_shared_across_clients() {
    let dedup = DedupCounter::starting_at(100);
    let t = FakeQuota::new(Ok(QuotaResponse::default()));
    let a = quota_client(t.clone(), dedup.clone());
    let b = quota_client(t.clone(), dedup);

    for client in [&a, &b, &a] {
        let (f, rx) = done();
        client.quota(&bag(), f);
        rx.await.unwrap();
    }

    let ids: Vec<String> = t.requests().into_iter().map(|r| r.deduplication_id).collect();
    assert_eq!(ids, vec!["100", "101", "102"]);
}
