//! Change-request endpoints.
//!
//! - `POST /api/schema/requests/upload`: multipart `file` field holding a
//!   change request (csv, tsv, xls, xlsx or ods). The file is validated and
//!   stored as `<md5>.<ext>` in the upload directory; that name is the
//!   request id.
//! - `POST /api/schema/requests/plan`: `{ "request_id" }` to the statements
//!   the request would issue. Reads the database, writes nothing.
//! - `POST /api/schema/requests/apply`: `{ "request_id" }` to a job id. The
//!   migration runs in the background; poll `/api/jobs/status/{job_id}`.

mod apply;
mod plan;
mod upload;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/schema/requests";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/plan", post().to(plan::process))
        .route("/apply", post().to(apply::process))
}
