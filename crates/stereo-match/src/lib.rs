#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// pyramidal block matching module.
pub mod block_matching;

mod correspondence;
pub use correspondence::Correspondence;

/// dense stereo solver module.
pub mod dense;
pub use dense::{DenseStereoSolver, DisparityMap};

/// correspondences to disparity module.
pub mod disparity;

mod error;
pub use error::StereoError;

/// horizontally constrained pyramidal Lucas-Kanade module.
pub mod optical_flow;
