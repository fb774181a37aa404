use crate::error::{IngestError, InputError};
use crate::reconcile::request::parse_column_requests;
use crate::services::{field_extension, write_field, AppContext};
use crate::tabular::read_table;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::requests::UploadResponse;
use futures_util::StreamExt;
use log::info;
use std::fs;

/// - On success: `200 OK` with the request id and its row count.
/// - On failure: `400 Bad Request` with the error message. Nothing is kept.
pub async fn process(ctx: web::Data<AppContext>, payload: Multipart) -> impl Responder {
    match upload_change_request(&ctx, payload).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => HttpResponse::BadRequest().body(format!("Error: {}", e)),
    }
}

async fn upload_change_request(
    ctx: &AppContext,
    mut payload: Multipart,
) -> Result<UploadResponse, Box<dyn std::error::Error>> {
    let upload_dir = ctx.settings.upload_dir.clone();
    fs::create_dir_all(&upload_dir)?;

    let mut upload = None;
    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let ext = field_extension(&field)?;
        // Keep the extension so the reader picks the right format.
        let mut tmp = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile_in(&upload_dir)?;
        let md5 = write_field(&mut field, &mut tmp).await?;
        upload = Some((tmp, format!("{}.{}", md5, ext)));
    }
    let (tmp, request_id) = upload.ok_or(InputError::MissingPart("file"))?;

    let marker = ctx.settings.ingest.comment_marker;
    let target = upload_dir.join(&request_id);
    let rows = web::block(move || -> Result<usize, IngestError> {
        let raw = read_table(tmp.path(), marker)?;
        let requests = parse_column_requests(&raw)?;
        tmp.persist(&target).map_err(|e| InputError::Unreadable {
            path: target.clone(),
            reason: e.to_string(),
        })?;
        Ok(requests.len())
    })
    .await??;

    info!("Accepted change request {} with {} row(s)", request_id, rows);
    Ok(UploadResponse { request_id, rows })
}
