//! Synchronous backend

mod common;

use std::sync::atomic::Ordering;

use common::StubTransport;
use http::StatusCode;
use strand_client::prelude::*;

#[test]
fn blocking_send_returns_a_finished_exchange() {
    let transport = StubTransport::fixed(StatusCode::OK, &[("content-type", "text/plain")], b"ok");
    let releases = transport.releases();
    let backend = BlockingBackend::new(transport).expect("runtime");

    let response = backend
        .send(Request::new().get("http://example.test/").response(as_string_always()))
        .expect("response");

    assert_eq!(response.body, "ok");
    assert_eq!(response.content_type(), Some("text/plain"));
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn blocking_backend_rejects_streaming_requests() {
    let backend = BlockingBackend::new(StubTransport::fixed(StatusCode::OK, &[], b"")).expect("runtime");

    let err = backend
        .send_checked(Request::new().get("http://example.test/").response(as_stream()))
        .expect_err("no streaming without an async caller");
    assert!(err.is_capability_mismatch());
    assert!(backend.transport().seen().lock().expect("lock").is_empty());
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let config = BackendConfig::default().with_decoders(Vec::new());
    let err = BlockingBackend::with_config(StubTransport::fixed(StatusCode::OK, &[], b""), config)
        .expect_err("decompression without decoders");
    assert!(err.is_builder());
}
