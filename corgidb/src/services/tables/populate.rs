use crate::error::{IngestError, InputError};
use crate::job_controller::state::{schedule_blocking_job, JobsState};
use crate::reconcile::{populate_from_files, PopulateReport};
use crate::services::{field_extension, read_field, write_field, AppContext};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::sql::Identifier;
use common::requests::PopulateRequest;
use futures_util::StreamExt;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Files of one populate upload. The directory lives until the job ends.
struct PopulateUpload {
    _dir: TempDir,
    table: Identifier,
    data: PathBuf,
    schema: PathBuf,
}

pub async fn process(
    ctx: web::Data<AppContext>,
    state: web::Data<JobsState>,
    payload: Multipart,
) -> impl Responder {
    let upload = match receive(payload).await {
        Ok(upload) => upload,
        Err(e) => return HttpResponse::BadRequest().body(format!("Error: {}", e)),
    };
    let ctx = ctx.into_inner();
    let job_id = schedule_blocking_job(&state, move |_| {
        populate_blocking(&ctx, &upload)
            .map(|report| summary(&upload.table, &report))
            .map_err(|e| e.to_string())
    })
    .await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

async fn receive(mut payload: Multipart) -> Result<PopulateUpload, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut table = None;
    let mut data = None;
    let mut schema = None;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("json") => {
                let request: PopulateRequest = serde_json::from_slice(&read_field(&mut field).await?)?;
                table = Some(Identifier::parse(&request.table_name)?);
            }
            Some(part @ ("data" | "schema")) => {
                let ext = field_extension(&field)?;
                let path = dir.path().join(format!("{}.{}", part, ext));
                let mut file = File::create(&path)?;
                write_field(&mut field, &mut file).await?;
                if part == "data" {
                    data = Some(path);
                } else {
                    schema = Some(path);
                }
            }
            _ => {}
        }
    }

    Ok(PopulateUpload {
        table: table.ok_or(InputError::MissingPart("json"))?,
        data: data.ok_or(InputError::MissingPart("data"))?,
        schema: schema.ok_or(InputError::MissingPart("schema"))?,
        _dir: dir,
    })
}

fn populate_blocking(ctx: &Arc<AppContext>, upload: &PopulateUpload) -> Result<PopulateReport, IngestError> {
    let mut conn = ctx.connector.connect()?;
    populate_from_files(
        &upload.table,
        &upload.data,
        &upload.schema,
        &mut *conn,
        &ctx.settings.ingest,
    )
}

fn summary(table: &Identifier, report: &PopulateReport) -> String {
    format!(
        "Loaded {} row(s) into {}; {} statement(s), {} warning(s)",
        report.rows,
        table,
        report.reconcile.statements.len(),
        report.reconcile.warnings.len()
    )
}
