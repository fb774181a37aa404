use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use common::jobs::JobStatus;
use common::requests::{PlanResponse, UploadResponse};
use corgidb::config::Settings;
use corgidb::db::memory::MemoryConnection;
use corgidb::job_controller::state::{start_job_updater, JobsState};
use corgidb::services::{self, AppContext};
use std::sync::Arc;
use std::time::Duration;

const BOUNDARY: &str = "corgidb-test-boundary";

const REQUEST: &str = "MY_COLNAME,DB_COLNAME,UNITS,NEW_KEY,DESCRIPTION,TABLE\n\
mass,st_mass,\"DOUBLE, solMass\",1,Stellar mass,Stars\n\
pl_name,,STRING,1,Planet name,Planets\n";

fn multipart(parts: &[(&str, Option<&str>, &str)]) -> Vec<u8> {
    let mut body = String::new();
    for (name, filename, content) in parts {
        body.push_str(&format!("--{}\r\n", BOUNDARY));
        match filename {
            Some(f) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                name, f
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                name
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));
    body.into_bytes()
}

fn multipart_request(uri: &str, parts: &[(&str, Option<&str>, &str)]) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart(parts))
}

fn context(upload_dir: &std::path::Path) -> AppContext {
    let db = MemoryConnection::new().with_table("Stars", &[("st_id", "int NOT NULL")]);
    AppContext {
        settings: Settings {
            upload_dir: upload_dir.to_path_buf(),
            ..Settings::default()
        },
        connector: Arc::new(db),
    }
}

async fn wait_for_end(state: &JobsState, job_id: &str) -> JobStatus {
    for _ in 0..200 {
        match state.status(job_id).await {
            Some(JobStatus::Completed(s)) => return JobStatus::Completed(s),
            Some(JobStatus::Failed(s)) => return JobStatus::Failed(s),
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }
    panic!("job {} did not finish", job_id);
}

#[actix_web::test]
async fn upload_plan_and_apply() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, rx) = JobsState::new(16);
    tokio::spawn(start_job_updater(jobs.clone(), rx));

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(jobs.clone()))
            .app_data(web::Data::new(context(dir.path())))
            .service(services::schema::configure_routes())
            .service(services::jobs::configure_routes()),
    )
    .await;

    let req = multipart_request(
        "/api/schema/requests/upload",
        &[("file", Some("request.csv"), REQUEST)],
    )
    .to_request();
    let uploaded: UploadResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(uploaded.rows, 2);
    assert!(uploaded.request_id.ends_with(".csv"));
    assert!(dir.path().join(&uploaded.request_id).is_file());

    let req = test::TestRequest::post()
        .uri("/api/schema/requests/plan")
        .set_json(serde_json::json!({ "request_id": uploaded.request_id }))
        .to_request();
    let plan: PlanResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        plan.statements,
        vec![
            "ALTER TABLE `Stars` ADD COLUMN `st_mass` DOUBLE COMMENT 'Stellar mass'".to_string(),
            "CREATE TABLE `Planets` (`pl_name` TEXT COMMENT 'Planet name')".to_string(),
        ]
    );

    let req = test::TestRequest::post()
        .uri("/api/schema/requests/apply")
        .set_json(serde_json::json!({ "request_id": uploaded.request_id }))
        .to_request();
    let started: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let job_id = started["job_id"].as_str().unwrap().to_string();

    match wait_for_end(&jobs, &job_id).await {
        JobStatus::Completed(summary) => assert!(summary.starts_with("2 statement(s)")),
        other => panic!("unexpected status {:?}", other),
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/jobs/status/{}", job_id))
        .to_request();
    let status: JobStatus = test::call_and_read_body_json(&app, req).await;
    assert!(matches!(status, JobStatus::Completed(_)));
}

#[actix_web::test]
async fn bad_uploads_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, _rx) = JobsState::new(16);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(jobs))
            .app_data(web::Data::new(context(dir.path())))
            .service(services::schema::configure_routes()),
    )
    .await;

    let req = multipart_request(
        "/api/schema/requests/upload",
        &[("file", Some("request.json"), "{}")],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let missing_units = "MY_COLNAME,DB_COLNAME,NEW_KEY,DESCRIPTION,TABLE\na,a,1,x,Stars\n";
    let req = multipart_request(
        "/api/schema/requests/upload",
        &[("file", Some("request.csv"), missing_units)],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let req = test::TestRequest::post()
        .uri("/api/schema/requests/plan")
        .set_json(serde_json::json!({ "request_id": "../../etc/passwd" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_job_is_not_found() {
    let (jobs, _rx) = JobsState::new(1);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(jobs))
            .service(services::jobs::configure_routes()),
    )
    .await;
    let req = test::TestRequest::get()
        .uri("/api/jobs/status/nope")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn populate_needs_all_parts() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, rx) = JobsState::new(16);
    tokio::spawn(start_job_updater(jobs.clone(), rx));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(jobs.clone()))
            .app_data(web::Data::new(context(dir.path())))
            .service(services::tables::configure_routes()),
    )
    .await;

    let req = multipart_request(
        "/api/tables/populate",
        &[("json", None, "{\"table_name\": \"Planets\"}")],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = multipart_request(
        "/api/tables/populate",
        &[
            ("json", None, "{\"table_name\": \"Planets\"}"),
            ("data", Some("planets.csv"), "pl_name,pl_orbper\n47 UMa b,1078\n"),
            ("schema", Some("schema.csv"), "COLUMN_NAME,COMMENT\npl_name,Name\npl_orbper,Period\n"),
        ],
    )
    .to_request();
    let started: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let job_id = started["job_id"].as_str().unwrap().to_string();
    assert_eq!(
        wait_for_end(&jobs, &job_id).await,
        JobStatus::Completed(
            "Loaded 1 row(s) into Planets; 2 statement(s), 0 warning(s)".to_string()
        )
    );
}
