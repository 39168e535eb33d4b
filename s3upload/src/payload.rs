//! What gets written to the bucket, and under which key.

use axum::http::HeaderMap;
use bytes::Bytes;

use crate::errors::{Error, Result};

/// The example commerce-order document written for every upload in `fixed` payload mode.
///
/// The bytes are served exactly as stored in `example_order.json`, with no trailing newline.
pub const EXAMPLE_ORDER: &str = include_str!("example_order.json");

/// Body of the object written when the uploaded file is not forwarded.
pub fn example_order() -> Bytes {
    Bytes::from_static(EXAMPLE_ORDER.as_bytes())
}

/// Pick the object key for a request.
///
/// Uses the value of `header_name` when it is present and non-empty, and `default_key`
/// otherwise. The value is used verbatim (no trimming or normalisation), including non-ASCII
/// UTF-8. A value that is not UTF-8 cannot name an object and is rejected rather than silently
/// replaced by the default key.
pub fn object_key(headers: &HeaderMap, header_name: &str, default_key: &str) -> Result<String> {
    let Some(value) = headers.get(header_name) else {
        return Ok(default_key.to_string());
    };

    let value = std::str::from_utf8(value.as_bytes()).map_err(|_| Error::BadRequest {
        message: format!("The {header_name} header must be valid UTF-8"),
    })?;

    if value.is_empty() {
        Ok(default_key.to_string())
    } else {
        Ok(value.to_string())
    }
}
