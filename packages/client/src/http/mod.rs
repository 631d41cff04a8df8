//! HTTP value types and helpers
//!
//! This module provides the header and body value types, URI conversion,
//! response types, multipart encoding and the compression collaborators.

pub mod body;
pub mod compression;
pub mod header;
pub mod into_uri;
pub mod multipart;
pub mod response;

pub use body::{ByteReader, ByteStream, Encoding, Multipart, Part, PartBody, RequestBody, StreamBody};
pub use compression::{Codec, Decompressor, Transcoder, compress_if_needed, decompress_if_possible};
pub use header::Header;
pub use into_uri::IntoUri;
pub use response::{RequestMetadata, Response, ResponseMetadata};
