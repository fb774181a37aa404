//! Data model shared by the `corgidb` reconciler, its HTTP driver and the
//! curve generator.

pub mod jobs;
pub mod model;
pub mod requests;
