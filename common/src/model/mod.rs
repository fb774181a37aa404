pub mod column_request;
pub mod scenario;
pub mod schema_description;
pub mod sql;
pub mod table;
