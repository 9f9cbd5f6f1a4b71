use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::DepthError;

/// Represents the intrinsic parameters of a pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsic {
    /// Focal length in x direction
    pub fx: f32,
    /// Focal length in y direction
    pub fy: f32,
    /// Principal point x coordinate
    pub cx: f32,
    /// Principal point y coordinate
    pub cy: f32,
}

impl CameraIntrinsic {
    /// Create camera intrinsics from focal lengths and principal point.
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Create camera intrinsics from a 3x3 row-major intrinsics matrix.
    ///
    /// The matrix must have the form `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`
    /// with positive focal lengths.
    pub fn from_matrix(k: &[[f32; 3]; 3]) -> Result<Self, DepthError> {
        if k[0][1] != 0.0 || k[1][0] != 0.0 || k[2] != [0.0, 0.0, 1.0] {
            return Err(DepthError::InvalidIntrinsics(
                "matrix must have form [[fx, 0, cx], [0, fy, cy], [0, 0, 1]]".to_string(),
            ));
        }

        if k[0][0] <= 0.0 || k[1][1] <= 0.0 {
            return Err(DepthError::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={} fy={}",
                k[0][0], k[1][1]
            )));
        }

        Ok(Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
        })
    }

    /// Convert to a 3x3 row-major intrinsics matrix.
    pub fn to_matrix(&self) -> [[f32; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Back-project a pixel with a depth to a 3d point in the camera frame.
    pub fn unproject(&self, u: f32, v: f32, z: f32) -> Vec3 {
        Vec3::new((u - self.cx) * z / self.fx, (v - self.cy) * z / self.fy, z)
    }

    /// Project a 3d point of the camera frame onto the image plane.
    ///
    /// Returns `None` for points with `z <= 0`.
    pub fn project(&self, p: Vec3) -> Option<[f32; 2]> {
        if p.z <= 0.0 {
            return None;
        }
        let inv_z = 1.0 / p.z;
        Some([
            self.fx * p.x * inv_z + self.cx,
            self.fy * p.y * inv_z + self.cy,
        ])
    }
}

/// A rigid transform mapping points from one camera frame to another.
///
/// The rotation is stored row-major.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// The 3x3 rotation matrix.
    pub rotation: [[f32; 3]; 3],
    /// The translation vector.
    pub translation: [f32; 3],
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            rotation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            translation: [0.0, 0.0, 0.0],
        }
    }

    /// A transform with a rotation and a translation.
    pub fn new(rotation: [[f32; 3]; 3], translation: [f32; 3]) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// A pure translation.
    pub fn from_translation(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// The rotation as a glam matrix.
    pub fn rotation_matrix(&self) -> Mat3 {
        // row-major to glam column-major
        let r = &self.rotation;
        Mat3::from_cols(
            Vec3::new(r[0][0], r[1][0], r[2][0]),
            Vec3::new(r[0][1], r[1][1], r[2][1]),
            Vec3::new(r[0][2], r[1][2], r[2][2]),
        )
    }

    /// Apply the transform to a point: `R * p + t`.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation_matrix() * p + Vec3::from_array(self.translation)
    }
}
