/// Temporal regularization of sparse field series.
///
/// Submodules:
/// - `interpolate`: "previous" step fill onto the dense grid
/// - `gaps`: year-boundary gap detection and masking
/// - `integrate`: one-sided bin reduction (mean/max/min)
/// - `repeats`: stale-hold suppression for count-style variables
/// - `builder`: per-combination orchestration into output tensors

pub mod builder;
pub mod gaps;
pub mod integrate;
pub mod interpolate;
pub mod repeats;
