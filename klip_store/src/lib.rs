//! Klip storage: SQLite schema for crags, sectors, routes, pitches and maintenance
//! reports, the spreadsheet importer that fills it, and the topo read/write layer.

#![deny(missing_docs)]

pub mod db;
pub mod import;
pub mod models;
#[allow(missing_docs)]
pub mod schema;
pub mod store;
pub mod topo;
