#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// pinhole camera model and rigid transforms.
pub mod camera;

/// disparity and depth conversions.
pub mod conversion;

mod error;
pub use error::DepthError;

/// registered depth hole filling module.
pub mod hole_filling;

/// depth registration between camera frames.
pub mod registration;

/// depth from stereo correspondences and images.
pub mod stereo;
