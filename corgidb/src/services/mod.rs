//! HTTP driver around the reconciler.
//!
//! Handlers validate what they can up front and hand database work to the
//! blocking pool, either inline (`web::block`) for read-only planning or as a
//! background job for anything that writes.

pub mod jobs;
pub mod schema;
pub mod tables;

use crate::config::Settings;
use crate::db::Connector;
use crate::error::{IngestError, InputError};
use crate::tabular::FileFormat;
use actix_multipart::Field;
use actix_web::HttpResponse;
use futures_util::StreamExt;
use md5::Context;
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// What handlers need besides the job table.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub connector: Arc<dyn Connector>,
}

// `<md5>.<ext>` as handed out by the upload endpoint.
static REQUEST_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{32}\.(csv|tsv|xls|xlsx|ods)$").expect("request id regex")
});

/// Path of an uploaded change request. Ids that were not produced by the
/// upload endpoint, or whose file is gone, are rejected.
pub fn request_path(upload_dir: &Path, request_id: &str) -> Result<PathBuf, InputError> {
    if !REQUEST_ID_RE.is_match(request_id) {
        return Err(InputError::UnknownRequest(request_id.to_string()));
    }
    let path = upload_dir.join(request_id);
    if !path.is_file() {
        return Err(InputError::UnknownRequest(request_id.to_string()));
    }
    Ok(path)
}

/// Lowercased extension of the uploaded file name, if it is a supported format.
pub(crate) fn field_extension(field: &Field) -> Result<String, InputError> {
    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
        .unwrap_or_default();
    let ext = Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    FileFormat::from_extension(&ext)?;
    Ok(ext)
}

/// Streams a multipart field into `out`; returns the md5 of its bytes.
pub(crate) async fn write_field(
    field: &mut Field,
    out: &mut impl Write,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut hasher = Context::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        hasher.consume(&chunk);
        out.write_all(&chunk)?;
    }
    out.flush()?;
    Ok(format!("{:x}", hasher.finalize()))
}

pub(crate) async fn read_field(field: &mut Field) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}

/// `400` for problems with the request, `500` for everything else.
pub(crate) fn error_response(err: &IngestError) -> HttpResponse {
    match err {
        IngestError::Input(_) | IngestError::SchemaMismatch { .. } => {
            HttpResponse::BadRequest().body(format!("Error: {}", err))
        }
        _ => HttpResponse::InternalServerError().body(format!("Error: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_cannot_escape_the_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            request_path(dir.path(), "../secrets.csv"),
            Err(InputError::UnknownRequest(_))
        ));

        let id = "0123456789abcdef0123456789abcdef.csv";
        assert!(request_path(dir.path(), id).is_err());
        std::fs::write(dir.path().join(id), "MY_COLNAME\n").unwrap();
        assert_eq!(request_path(dir.path(), id).unwrap(), dir.path().join(id));
    }
}
