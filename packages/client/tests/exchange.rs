//! End-to-end exchanges through the coordinator with a scripted transport

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use common::{StubTransport, gzip, header_map, init_tracing, streamed, temp_path, wait_for};
use futures::StreamExt;
use http::{StatusCode, Version};
use strand_client::backend::TransportResponse;
use strand_client::error::BoxError;
use strand_client::prelude::*;
use strand_client::{NoCapabilities, StreamingAndWebSockets};

#[tokio::test]
async fn ignore_consumes_the_body_and_releases_before_returning() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"never surfaced");
    let releases = transport.releases();
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .response(ignore())
        .send(&backend)
        .await
        .expect("response");

    assert_eq!(response.code, StatusCode::OK);
    assert_eq!(response.body, ());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn body_length_limit_is_inclusive() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"0123456789");
    let releases = transport.releases();
    let backend = HttpBackend::new(transport);

    let exact = Request::new()
        .get("http://example.test/")
        .max_response_body_length(10)
        .response(as_bytes())
        .send(&backend)
        .await
        .expect("body of exactly the limit");
    assert_eq!(exact.body, b"0123456789");

    let over = Request::new()
        .get("http://example.test/")
        .max_response_body_length(9)
        .response(as_bytes())
        .send(&backend)
        .await
        .expect_err("one byte over");
    assert!(over.is_body_length_exceeded());
    assert_eq!(releases.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn backend_wide_length_limit_applies_when_request_sets_none() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"0123456789");
    let config = BackendConfig::default().with_max_response_body_length(4);
    let backend = HttpBackend::with_config(transport, config).expect("valid config");

    let err = Request::new()
        .get("http://example.test/")
        .response(as_bytes())
        .send(&backend)
        .await
        .expect_err("over the backend limit");
    assert!(err.is_body_length_exceeded());
}

#[tokio::test]
async fn gzip_bodies_are_decoded() {
    let compressed = Bytes::from(gzip(b"hello"));
    let transport = StubTransport::new(move |_| {
        Ok(TransportResponse::new(
            StatusCode::OK,
            header_map(&[("content-encoding", "gzip")]),
            compressed.clone(),
        ))
    });
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .response(as_bytes())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.code, StatusCode::OK);
    assert_eq!(response.body, b"hello");
}

#[tokio::test]
async fn decompression_can_be_switched_off_per_request() {
    let compressed = Bytes::from(gzip(b"hello"));
    let expected = compressed.clone();
    let transport = StubTransport::new(move |_| {
        Ok(TransportResponse::new(
            StatusCode::OK,
            header_map(&[("content-encoding", "gzip")]),
            compressed.clone(),
        ))
    });
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .decompress_response(false)
        .response(as_bytes())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.body, expected.as_ref());
}

#[tokio::test]
async fn stream_strategy_returns_before_the_body_is_produced() {
    let (tx, rx) = futures::channel::mpsc::unbounded::<std::result::Result<Bytes, BoxError>>();
    let rx = Mutex::new(Some(rx));
    let transport = StubTransport::new(move |_| {
        let rx = rx.lock().expect("lock").take().ok_or("body already taken")?;
        Ok(streamed(StatusCode::OK, rx))
    });
    let releases = transport.releases();
    let backend = HttpBackend::new(transport);

    tx.unbounded_send(Ok(Bytes::from_static(b"first ")))
        .expect("queued");
    let response = Request::new()
        .get("http://example.test/stream")
        .response(as_stream())
        .send(&backend)
        .await
        .expect("response head");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(releases.load(Ordering::SeqCst), 0);

    tx.unbounded_send(Ok(Bytes::from_static(b"second")))
        .expect("queued");
    drop(tx);

    let mut body = response.body;
    let mut collected = Vec::new();
    while let Some(chunk) = body.next().await {
        collected.extend_from_slice(&chunk.expect("chunk"));
    }
    assert_eq!(collected, b"first second");

    wait_for(&releases, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropping_a_stream_releases_the_connection() {
    let transport = StubTransport::new(|_| {
        Ok(streamed(StatusCode::OK, futures::stream::pending()))
    });
    let releases = transport.releases();
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/stream")
        .response(as_stream())
        .send(&backend)
        .await
        .expect("response head");
    assert_eq!(releases.load(Ordering::SeqCst), 0);

    drop(response);
    wait_for(&releases, 1).await;
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn as_file_writes_the_body() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"file contents");
    let backend = HttpBackend::new(transport);
    let path = temp_path("nested/out.txt");

    let response = Request::new()
        .get("http://example.test/download")
        .response(as_file(&path))
        .send(&backend)
        .await
        .expect("response");

    assert_eq!(response.body, path);
    let written = tokio::fs::read(&path).await.expect("file exists");
    assert_eq!(written, b"file contents");

    if let Some(root) = path.parent().and_then(|p| p.parent()) {
        let _ = tokio::fs::remove_dir_all(root).await;
    }
}

#[tokio::test]
async fn body_received_fires_once_on_success_only() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"0123456789");
    let backend = HttpBackend::new(transport);
    let fired = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&fired);
    Request::new()
        .get("http://example.test/")
        .on_body_received(move |meta| {
            assert_eq!(meta.code, StatusCode::OK);
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .response(as_bytes())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let counter = Arc::clone(&fired);
    let _ = Request::new()
        .get("http://example.test/")
        .max_response_body_length(3)
        .on_body_received(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .response(as_bytes())
        .send(&backend)
        .await
        .expect_err("too long");
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn capabilities_are_checked_before_any_io() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"x").with_capabilities::<NoCapabilities>();
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);

    let err = backend
        .execute(Request::new().get("http://example.test/").response(as_stream()))
        .await
        .expect_err("streaming unsupported");
    assert!(err.is_capability_mismatch());

    let err = backend
        .execute(
            Request::new()
                .get("ws://example.test/socket")
                .response(as_websocket_stream()),
        )
        .await
        .expect_err("websockets unsupported");
    assert!(err.is_capability_mismatch());
    assert!(seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn refused_connections_become_connect_errors() {
    init_tracing();
    let backend = HttpBackend::new(StubTransport::failing(std::io::ErrorKind::ConnectionRefused));

    let err = Request::new()
        .get("http://example.test/")
        .send(&backend)
        .await
        .expect_err("refused");
    assert!(err.is_connect());
    assert_eq!(
        err.uri().map(ToString::to_string).as_deref(),
        Some("http://example.test/")
    );
}

#[derive(Debug)]
struct ProprietaryFailure;

impl std::fmt::Display for ProprietaryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("proprietary failure")
    }
}

impl std::error::Error for ProprietaryFailure {}

#[tokio::test]
async fn unrecognized_failures_pass_through() {
    let backend = HttpBackend::new(StubTransport::new(|_| {
        Err(Box::new(ProprietaryFailure) as BoxError)
    }));

    let err = Request::new()
        .get("http://example.test/")
        .send(&backend)
        .await
        .expect_err("fails");
    assert!(err.is_unknown());
    let source = err.into_source().expect("source kept");
    assert!(source.downcast::<ProprietaryFailure>().is_ok());
}

#[tokio::test(start_paused = true)]
async fn stalled_bodies_time_out() {
    init_tracing();
    let transport = StubTransport::new(|_| Ok(streamed(StatusCode::OK, futures::stream::pending())));
    let releases = transport.releases();
    let backend = HttpBackend::new(transport);

    let err = Request::new()
        .get("http://example.test/slow")
        .read_timeout(Duration::from_millis(50))
        .response(as_bytes())
        .send(&backend)
        .await
        .expect_err("stalls");
    assert!(err.is_timeout());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn deferred_builder_errors_surface_without_io() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"");
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);

    let err = Request::new()
        .get("http://exa mple.test/")
        .send(&backend)
        .await
        .expect_err("bad uri");
    assert!(err.is_builder());
    assert!(seen.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn wire_request_carries_body_headers_and_version() {
    let transport = StubTransport::fixed(StatusCode::CREATED, &[], b"");
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .header("X-Trace", "abc")
        .body("héllo")
        .http_version(Version::HTTP_2)
        .post("http://example.test/items")
        .response(ignore())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.code, StatusCode::CREATED);
    assert_eq!(response.request.to_string(), "POST http://example.test/items");

    let seen = seen.lock().expect("lock");
    let request = &seen[0];
    assert_eq!(request.version, Some(Version::HTTP_2));
    assert_eq!(request.body.as_ref(), "héllo".as_bytes());
    assert_eq!(request.headers["x-trace"], "abc");
    assert_eq!(request.headers["content-length"], "6");
    assert_eq!(request.headers["content-type"], "text/plain; charset=utf-8");
}

#[tokio::test]
async fn declared_request_encoding_compresses_the_body() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"");
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);
    let text = "hello hello hello hello hello hello";

    Request::new()
        .header("Content-Encoding", "gzip")
        .body(text)
        .put("http://example.test/doc")
        .response(ignore())
        .send(&backend)
        .await
        .expect("response");

    let seen = seen.lock().expect("lock");
    let request = &seen[0];
    let mut decoded = String::new();
    std::io::Read::read_to_string(
        &mut flate2::read::GzDecoder::new(request.body.as_ref()),
        &mut decoded,
    )
    .expect("gzip body");
    assert_eq!(decoded, text);
    assert_eq!(
        request.headers["content-length"],
        request.body.len().to_string().as_str()
    );
}

#[tokio::test]
async fn streamed_request_bodies_reach_the_transport() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"");
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);

    let chunks = futures::stream::iter(vec![
        Ok::<_, std::io::Error>(Bytes::from_static(b"ab")),
        Ok(Bytes::from_static(b"cd")),
    ]);
    Request::new()
        .stream_body(chunks)
        .post("http://example.test/upload")
        .response(ignore())
        .send(&backend)
        .await
        .expect("response");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen[0].body.as_ref(), b"abcd");
    assert!(seen[0].headers.get("content-length").is_none());
}

#[tokio::test]
async fn text_responses_honour_the_declared_charset() {
    let transport = StubTransport::fixed(
        StatusCode::OK,
        &[("content-type", "text/plain; charset=ISO-8859-1")],
        b"caf\xe9",
    );
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.body, Ok("café".to_owned()));
}

#[tokio::test]
async fn error_statuses_land_in_the_left_arm() {
    let transport = StubTransport::fixed(StatusCode::NOT_FOUND, &[], b"missing");
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .response(as_string().map_ok(|body| body.len()))
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.code, StatusCode::NOT_FOUND);
    assert_eq!(response.body, Err("missing".to_owned()));
}

#[tokio::test]
async fn streaming_transports_accept_every_plain_strategy() {
    let transport =
        StubTransport::fixed(StatusCode::OK, &[], b"abc").with_capabilities::<StreamingAndWebSockets>();
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .response(as_string_always())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.body, "abc");
}

#[tokio::test]
async fn zero_redirect_ceiling_in_replaced_options_still_sends() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"ok");
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .with_options(RequestOptions {
            max_redirects: 0,
            ..RequestOptions::default()
        })
        .get("http://example.test/")
        .response(ignore())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.code, StatusCode::OK);
    assert_eq!(seen.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn zlib_wrapped_deflate_bodies_are_decoded() {
    use std::io::Write;

    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(b"hello").expect("zlib write");
    let compressed = Bytes::from(encoder.finish().expect("zlib finish"));
    let transport = StubTransport::new(move |_| {
        Ok(TransportResponse::new(
            StatusCode::OK,
            header_map(&[("content-encoding", "deflate")]),
            compressed.clone(),
        ))
    });
    let backend = HttpBackend::new(transport);

    let response = Request::new()
        .get("http://example.test/")
        .response(as_bytes())
        .send(&backend)
        .await
        .expect("response");
    assert_eq!(response.body, b"hello");
}

#[tokio::test]
async fn replaced_bodies_reach_the_wire_with_their_own_length() {
    let transport = StubTransport::fixed(StatusCode::OK, &[], b"");
    let seen = transport.seen();
    let backend = HttpBackend::new(transport);

    Request::new()
        .body("hello")
        .bytes_body(vec![0u8; 100])
        .post("http://example.test/upload")
        .response(ignore())
        .send(&backend)
        .await
        .expect("response");

    let seen = seen.lock().expect("lock");
    assert_eq!(seen[0].body.len(), 100);
    assert_eq!(seen[0].headers["content-length"], "100");
    assert_eq!(seen[0].headers["content-type"], "application/octet-stream");
}
