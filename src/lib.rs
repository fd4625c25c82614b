//! Temporal regularization of sparse lake monitoring data.
//!
//! Field samples (nutrients, toxins, algae counts, weather) arrive at
//! irregular times per site. This crate projects each series onto a shared
//! daily grid keyed by decimal year, masks values held across unsampled
//! winters, and exports the result as dense tensors.

pub mod analysis;
pub mod calendar;
pub mod config;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod sites;
pub mod variables;
