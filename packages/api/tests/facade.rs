//! Facade requests sent through a scripted transport

use std::sync::{Arc, Mutex};

use http::{HeaderMap, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use strand::{AuthExt, FormExt, HeaderExt, JsonExt, ResponseError, as_json, as_json_always};
use strand_client::backend::{TransportResponse, WireBody, WireRequest};
use strand_client::error::BoxError;

/// Answers every request with a fixed JSON document and remembers the last request.
struct JsonTransport {
    status: StatusCode,
    body: &'static str,
    last: Arc<Mutex<Option<(HeaderMap, Vec<u8>)>>>,
}

impl JsonTransport {
    fn new(status: StatusCode, body: &'static str) -> Self {
        JsonTransport {
            status,
            body,
            last: Arc::new(Mutex::new(None)),
        }
    }
}

impl strand::Transport for JsonTransport {
    type Capabilities = strand::NoCapabilities;

    async fn execute(&self, request: WireRequest) -> Result<TransportResponse, BoxError> {
        let body = match request.body {
            WireBody::Bytes(bytes) => bytes.to_vec(),
            WireBody::Empty => Vec::new(),
            WireBody::Stream(_) => return Err("unexpected stream".into()),
        };
        *self.last.lock().expect("lock") = Some((request.headers, body));

        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        Ok(TransportResponse::new(self.status, headers, self.body))
    }
}

#[derive(Debug, Serialize)]
struct NewItem<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u64,
    name: String,
}

#[tokio::test]
async fn json_round_trip_through_a_backend() {
    env_logger::try_init().ok();
    let transport = JsonTransport::new(StatusCode::CREATED, r#"{"id":7,"name":"widget"}"#);
    let last = Arc::clone(&transport.last);
    let backend = strand::HttpBackend::new(transport);

    let response = strand::post("http://api.test/items")
        .bearer_auth("t0k3n")
        .accept(strand::ContentType::ApplicationJson)
        .json_body(&NewItem { name: "widget" })
        .response(as_json::<Item>())
        .send(&backend)
        .await
        .expect("exchange");

    assert_eq!(response.code, StatusCode::CREATED);
    assert_eq!(
        response.body.expect("json"),
        Item {
            id: 7,
            name: "widget".to_owned()
        }
    );

    let (headers, body) = last.lock().expect("lock").take().expect("request seen");
    assert_eq!(headers["authorization"], "Bearer t0k3n");
    assert_eq!(headers["accept"], "application/json");
    assert_eq!(headers["accept-encoding"], "gzip, deflate");
    assert_eq!(body, br#"{"name":"widget"}"#);
}

#[tokio::test]
async fn error_statuses_are_reported_with_their_body() {
    let backend = strand::HttpBackend::new(JsonTransport::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"error":"name taken"}"#,
    ));

    let response = strand::get("http://api.test/items/1")
        .response(as_json::<Item>())
        .send(&backend)
        .await
        .expect("exchange");

    match response.body {
        Err(ResponseError::Http { code, body }) => {
            assert_eq!(code, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(body, r#"{"error":"name taken"}"#);
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_deserialization_error() {
    let backend = strand::HttpBackend::new(JsonTransport::new(StatusCode::OK, "not json"));

    let response = strand::get("http://api.test/items/1")
        .response(as_json::<Item>())
        .send(&backend)
        .await
        .expect("exchange");
    assert!(matches!(
        response.body,
        Err(ResponseError::Deserialization { .. })
    ));

    let err = strand::get("http://api.test/items/1")
        .response(as_json_always::<Item>())
        .send(&backend)
        .await
        .expect_err("not json");
    assert!(err.is_read());
}

#[tokio::test]
async fn forms_are_sent_urlencoded() {
    let transport = JsonTransport::new(StatusCode::OK, "{}");
    let last = Arc::clone(&transport.last);
    let backend = strand::HttpBackend::new(transport);

    #[derive(Serialize)]
    struct Login<'a> {
        user: &'a str,
        remember: bool,
    }

    strand::post("http://api.test/login")
        .form(&Login {
            user: "ana b",
            remember: true,
        })
        .response(strand::ignore())
        .send(&backend)
        .await
        .expect("exchange");

    let (headers, body) = last.lock().expect("lock").take().expect("request seen");
    assert_eq!(headers["content-type"], "application/x-www-form-urlencoded");
    assert_eq!(body, b"user=ana+b&remember=true");
}

#[test]
fn blocking_backends_serve_facade_requests() {
    let backend = strand::BlockingBackend::new(JsonTransport::new(
        StatusCode::OK,
        r#"{"id":1,"name":"one"}"#,
    ))
    .expect("runtime");

    let response = backend
        .send(strand::get("http://api.test/items/1").response(as_json_always::<Item>()))
        .expect("exchange");
    assert_eq!(response.body.id, 1);

    let err = backend
        .send(strand::get("http://api.test/items/1").response(as_json_always::<Vec<Item>>()))
        .expect_err("wrong shape");
    assert!(err.is_read());
}
