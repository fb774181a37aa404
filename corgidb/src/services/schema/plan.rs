use crate::ddl::Statement;
use crate::error::IngestError;
use crate::reconcile::plan_column_request;
use crate::services::{error_response, request_path, AppContext};
use actix_web::{web, HttpResponse, Responder};
use common::requests::{ChangeRequestRef, PlanResponse};

pub async fn process(ctx: web::Data<AppContext>, req: web::Json<ChangeRequestRef>) -> impl Responder {
    let ctx = ctx.into_inner();
    let result = web::block(move || plan_request(&ctx, &req.request_id)).await;
    match result {
        Ok(Ok(statements)) => HttpResponse::Ok().json(PlanResponse { statements }),
        Ok(Err(e)) => error_response(&e),
        Err(e) => HttpResponse::InternalServerError().body(format!("Error: {}", e)),
    }
}

fn plan_request(ctx: &AppContext, request_id: &str) -> Result<Vec<String>, IngestError> {
    let path = request_path(&ctx.settings.upload_dir, request_id)?;
    let mut conn = ctx.connector.connect()?;
    let plan = plan_column_request(&path, &mut *conn, &ctx.settings.ingest)?;
    Ok(plan.statements().iter().map(Statement::to_sql).collect())
}
