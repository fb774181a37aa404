use crate::error::IngestError;
use crate::job_controller::state::{schedule_blocking_job, JobReporter, JobsState};
use crate::reconcile::{plan_column_request, MigrationReport};
use crate::services::{error_response, request_path, AppContext};
use actix_web::{web, HttpResponse, Responder};
use common::requests::ChangeRequestRef;
use std::path::Path;
use std::sync::Arc;

/// Returns `{ "job_id" }` once the request file is known to exist.
pub async fn process(
    ctx: web::Data<AppContext>,
    state: web::Data<JobsState>,
    req: web::Json<ChangeRequestRef>,
) -> impl Responder {
    let path = match request_path(&ctx.settings.upload_dir, &req.request_id) {
        Ok(path) => path,
        Err(e) => return error_response(&IngestError::from(e)),
    };
    let ctx = ctx.into_inner();
    let job_id = schedule_blocking_job(&state, move |reporter| {
        apply_blocking(&ctx, &path, &reporter)
            .map(|report| report.summary())
            .map_err(|e| e.to_string())
    })
    .await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

fn apply_blocking(
    ctx: &Arc<AppContext>,
    path: &Path,
    reporter: &JobReporter,
) -> Result<MigrationReport, IngestError> {
    let mut conn = ctx.connector.connect()?;
    let plan = plan_column_request(path, &mut *conn, &ctx.settings.ingest)?;
    plan.apply_with_progress(&mut *conn, |done, _| {
        reporter.progress(done as u32);
    })
}
