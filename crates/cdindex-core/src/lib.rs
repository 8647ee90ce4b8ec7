#![forbid(unsafe_code)]
//! cdindex-core library.
//!
//! Computes the disruption (CD) index of every node in a directed influence
//! or citation graph:
//!
//! ```text
//! edges ──► graph::AdjacencyIndex ──► disruption::compute ──► table::ResultTable
//! ```
//!
//! # Conventions
//!
//! - **Errors**: boundary failures are `thiserror` enums carrying an
//!   [`error::ErrorCode`]; configuration loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).

pub mod config;
pub mod dataset;
pub mod disruption;
pub mod error;
pub mod graph;
pub mod table;
pub mod timing;

pub use disruption::{ComputeOptions, DisruptionRecord, DisruptionReport, Outcome, compute};
pub use error::ErrorCode;
pub use graph::{AdjacencyIndex, GraphStats};
pub use table::{ResultTable, TableFormat};
