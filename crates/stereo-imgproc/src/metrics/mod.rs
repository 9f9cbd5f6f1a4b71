//! Block dissimilarity metrics.
//!
//! This module provides the scores used to compare two equally sized sample
//! windows while searching for stereo correspondences.
//!
//! # Available Metrics
//!
//! - **SSD** (Sum of Squared Differences)
//! - **SAD** (Sum of Absolute Differences)
//!
//! Windows are passed as a [`BlockWindow`], a closed set of the sample
//! encodings the matchers work with: 8-bit gray, 32-bit float and packed
//! dual 16-bit.

mod block;

pub use block::{sad, ssd, BlockMetric, BlockWindow};
