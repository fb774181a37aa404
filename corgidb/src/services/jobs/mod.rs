//! `GET /api/jobs/status/{job_id}`: the current `JobStatus` of a background
//! job, or `404` for an unknown id.

mod get_status;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/jobs";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/status/{job_id}", get().to(get_status::process))
}
