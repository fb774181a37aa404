use serde::{Deserialize, Serialize};

/// Names a change-request file previously accepted by the upload endpoint.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChangeRequestRef {
    pub request_id: String,
}

/// Returned by the upload endpoint once the file has been validated.
#[derive(Debug, Deserialize, Serialize)]
pub struct UploadResponse {
    pub request_id: String,
    pub rows: usize,
}

/// Statements a change request would issue, without executing them.
#[derive(Debug, Deserialize, Serialize)]
pub struct PlanResponse {
    pub statements: Vec<String>,
}

/// JSON part of a populate upload.
#[derive(Debug, Deserialize, Serialize)]
pub struct PopulateRequest {
    pub table_name: String,
}
