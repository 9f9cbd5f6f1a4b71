/// Create the 1d binomial kernel used to build gaussian pyramids.
///
/// The separable 2D kernel is the outer product of this kernel with itself:
///
/// ```text
/// [1, 4, 6, 4, 1] x [1, 4, 6, 4, 1] / 256
/// ```
pub fn pyramid_gaussian_kernel_1d() -> [f32; 5] {
    [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0]
}

/// Create the 3x3 Scharr kernels.
///
/// # Returns
///
/// The (derivative, smoothing) pair of 1d kernels. The horizontal derivative
/// kernel is the derivative kernel along x times the smoothing kernel along y,
/// and the vertical derivative kernel is its transpose.
pub fn scharr_kernel_1d() -> ([i32; 3], [i32; 3]) {
    ([-1, 0, 1], [3, 10, 3])
}
