use crate::AppState;
use crate::config::{PayloadMode, UploadConfig};
use crate::errors::{Error, Result};
use crate::payload;
use axum::{
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::HeaderMap,
};
use bytes::Bytes;
use tracing::{debug, info};

/// Accept a multipart form upload and write an object to the configured bucket.
///
/// The whole form is read so malformed or oversized bodies are rejected before anything is
/// written. In `fixed` payload mode (the default) the uploaded content is discarded and the
/// example order document is stored instead; in `forward` mode the bytes of the configured file
/// field are stored.
///
/// The object key comes from the configured key header, falling back to the default key.
#[tracing::instrument(skip_all, fields(bucket = %state.config.storage.bucket, key = tracing::field::Empty))]
pub async fn upload_object(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<String> {
    let upload = &state.config.upload;

    let multipart = multipart.map_err(|e| {
        debug!(error = %e, "Request is not a multipart form");
        bad_request()
    })?;
    let file = read_form(multipart, upload).await?;

    let key = payload::object_key(&headers, &upload.key_header, &upload.default_key)?;
    tracing::Span::current().record("key", key.as_str());

    let body = match upload.payload {
        PayloadMode::Fixed => payload::example_order(),
        PayloadMode::Forward => file.ok_or_else(|| {
            debug!(field = %upload.file_field, "Multipart form has no file field to forward");
            bad_request()
        })?,
    };
    let size = body.len();

    let output = match state.storage.put_object(&state.config.storage.bucket, &key, body).await {
        Ok(output) => {
            metrics::counter!("s3upload_uploads_total", "outcome" => "success").increment(1);
            output
        }
        Err(e) => {
            metrics::counter!("s3upload_uploads_total", "outcome" => "storage_error").increment(1);
            return Err(e.into());
        }
    };

    let e_tag = output.e_tag.unwrap_or_default();
    info!(size, e_tag = %e_tag, "Object uploaded");

    Ok(format!("File uploaded successfully to S3. ETag: {e_tag}"))
}

/// Drain every field of the form, keeping the file field's bytes when they will be forwarded.
async fn read_form(mut multipart: Multipart, upload: &UploadConfig) -> Result<Option<Bytes>> {
    let mut file = None;
    let mut fields = 0usize;
    let mut discarded = 0usize;

    while let Some(mut field) = multipart.next_field().await.map_err(form_error)? {
        fields += 1;

        let forward = upload.payload == PayloadMode::Forward
            && file.is_none()
            && field.name() == Some(upload.file_field.as_str());

        if forward {
            file = Some(field.bytes().await.map_err(form_error)?);
        } else {
            while let Some(chunk) = field.chunk().await.map_err(form_error)? {
                discarded += chunk.len();
            }
        }
    }

    debug!(fields, discarded, "Parsed multipart form");
    Ok(file)
}

fn form_error(e: MultipartError) -> Error {
    debug!(error = %e, status = %e.status(), "Failed to parse multipart data");
    bad_request()
}

fn bad_request() -> Error {
    metrics::counter!("s3upload_uploads_total", "outcome" => "bad_request").increment(1);
    Error::unparseable_form()
}
