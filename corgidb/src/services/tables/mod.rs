//! `POST /api/tables/populate`: replace a table's contents and reconcile its
//! schema. Multipart parts, in any order:
//! - `json`: `{ "table_name": "..." }`
//! - `data`: the rows to load
//! - `schema`: the table's schema description
//!
//! Returns `{ "job_id" }`; the load runs in the background.

mod populate;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/tables";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/populate", post().to(populate::process))
}
