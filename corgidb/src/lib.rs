//! Schema reconciliation and table loading for the coronagraph planning
//! database, plus the scenario and saturation-curve generator that feeds it.

pub mod cli;
pub mod config;
pub mod db;
pub mod ddl;
pub mod error;
pub mod generator;
pub mod job_controller;
pub mod reconcile;
pub mod secrets;
pub mod services;
pub mod tabular;
pub mod units;
