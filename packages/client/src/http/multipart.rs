//! `multipart/form-data` encoding
//!
//! Parts are rendered in order, each introduced by the boundary line and a
//! `Content-Disposition` header. File parts are read when the request is
//! sent, never while it is built.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{self, HttpError};
use crate::http::body::{Multipart, Part, PartBody};
use crate::http::header::{media, names};

const CRLF: &[u8] = b"\r\n";

/// Escapes a disposition parameter the way browsers do for form fields.
fn quote(value: &str) -> String {
    value
        .replace('\r', "%0D")
        .replace('\n', "%0A")
        .replace('"', "%22")
}

fn disposition(part: &Part) -> String {
    let mut value = format!("form-data; name=\"{}\"", quote(&part.name));
    if let Some(file_name) = &part.file_name {
        value.push_str(&format!("; filename=\"{}\"", quote(file_name)));
    }
    value
}

async fn part_bytes(body: &PartBody) -> Result<Bytes, HttpError> {
    match body {
        PartBody::Text(text, encoding) => encoding
            .encode(text)
            .map(Bytes::from)
            .map_err(error::builder),
        PartBody::Bytes(bytes) => Ok(bytes.clone()),
        PartBody::File(path) => tokio::fs::read(path)
            .await
            .map(Bytes::from)
            .map_err(|e| {
                tracing::debug!(
                    target: "strand::multipart",
                    path = %path.display(),
                    error = %e,
                    "Failed to read multipart file part"
                );
                error::builder(e)
            }),
    }
}

fn default_part_type(body: &PartBody) -> Option<String> {
    match body {
        PartBody::Text(_, encoding) if *encoding != crate::http::body::Encoding::Utf8 => Some(
            format!("{}; charset={}", media::TEXT_PLAIN, encoding.label()),
        ),
        PartBody::Text(..) => None,
        PartBody::Bytes(_) | PartBody::File(_) => Some(media::APPLICATION_OCTET_STREAM.to_owned()),
    }
}

/// Renders `multipart` into one buffer.
///
/// # Errors
///
/// Returns a builder error when a file part cannot be read or a text part
/// cannot be encoded.
pub async fn encode(multipart: &Multipart) -> Result<Bytes, HttpError> {
    let mut out = BytesMut::new();
    for part in &multipart.parts {
        let content = part_bytes(&part.body).await?;

        out.put_slice(b"--");
        out.put_slice(multipart.boundary.as_bytes());
        out.put_slice(CRLF);

        out.put_slice(format!("Content-Disposition: {}", disposition(part)).as_bytes());
        out.put_slice(CRLF);

        let content_type = part
            .content_type
            .clone()
            .or_else(|| default_part_type(&part.body));
        if let Some(content_type) = content_type {
            out.put_slice(format!("{}: {content_type}", names::CONTENT_TYPE).as_bytes());
            out.put_slice(CRLF);
        }
        for header in &part.headers {
            out.put_slice(format!("{}: {}", header.name(), header.value()).as_bytes());
            out.put_slice(CRLF);
        }

        out.put_slice(CRLF);
        out.put_slice(&content);
        out.put_slice(CRLF);
    }
    out.put_slice(b"--");
    out.put_slice(multipart.boundary.as_bytes());
    out.put_slice(b"--");
    out.put_slice(CRLF);
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(parts: Vec<Part>) -> Multipart {
        Multipart {
            boundary: "XyZ".to_owned(),
            parts,
        }
    }

    #[tokio::test]
    async fn renders_fields_in_order() {
        let multipart = fixed(vec![
            Part::text("title", "Hello"),
            Part::bytes("blob", &b"\x00\x01"[..])
                .file_name("a \"b\".bin")
                .header("X-Extra", "1"),
        ]);
        let encoded = encode(&multipart).await.expect("encoded");
        let expected = concat!(
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"title\"\r\n",
            "\r\n",
            "Hello\r\n",
            "--XyZ\r\n",
            "Content-Disposition: form-data; name=\"blob\"; filename=\"a %22b%22.bin\"\r\n",
            "Content-Type: application/octet-stream\r\n",
            "X-Extra: 1\r\n",
            "\r\n",
            "\x00\x01\r\n",
            "--XyZ--\r\n",
        );
        assert_eq!(encoded.as_ref(), expected.as_bytes());
    }

    #[tokio::test]
    async fn missing_files_fail_at_encode_time() {
        let multipart = fixed(vec![Part::file("f", "/definitely/not/here.bin")]);
        assert!(encode(&multipart).await.expect_err("missing").is_builder());
    }

    #[test]
    fn non_utf8_text_parts_declare_their_charset() {
        let multipart = fixed(vec![Part {
            body: PartBody::Text("café".to_owned(), crate::http::body::Encoding::Iso8859_1),
            ..Part::text("note", "")
        }]);
        let encoded = tokio_test::block_on(encode(&multipart)).expect("encoded");
        let text = String::from_utf8_lossy(&encoded);
        assert!(text.contains("Content-Type: text/plain; charset=iso-8859-1\r\n"));
        assert!(encoded.windows(4).any(|w| w == b"caf\xe9"));
    }
}
