#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// image cropping module.
pub mod crop;

/// image filtering module.
pub mod filter;

/// utilities for interpolation.
pub mod interpolation;

/// block dissimilarity metrics module.
pub mod metrics;

/// module containing parallization utilities.
pub mod parallel;

/// Pyramid operations
pub mod pyramid;
