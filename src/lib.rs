//! Employee performance dashboard core: upload normalization, aggregate
//! statistics, dataset and filter stores, and the heuristic scoring service.

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod report;
pub mod scoring;
pub mod server;
pub mod settings;
