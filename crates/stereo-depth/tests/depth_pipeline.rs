use approx::assert_relative_eq;
use stereo_depth::{
    camera::{CameraIntrinsic, RigidTransform},
    conversion::{depth_from_disparity, depth_to_meters, get_depth, DepthEncoding, DepthImage},
    hole_filling::{fill_registered_depth_holes, HoleFillingConfig},
    registration::register_depth,
    stereo::depth_from_stereo_images,
    DepthError,
};
use stereo_image::Image;
use stereo_match::{
    block_matching::{calc_stereo_correspondences, BlockMatchingParams},
    disparity::disparity_from_stereo_correspondences,
    optical_flow::LkStereoParams,
    DisparityMap,
};

const FX: f32 = 500.0;
const BASELINE: f32 = 0.1;
const POINTS: [[f32; 2]; 3] = [[40.0, 20.0], [50.0, 24.0], [60.0, 30.0]];

// rectified pair where right(x, y) = left(x + disparity, y)
fn stereo_pair(disparity: f32) -> Result<(Image<u8, 1>, Image<u8, 1>), DepthError> {
    let (width, height) = (96, 48);
    let render = |shift: f32| -> Result<Image<u8, 1>, DepthError> {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let u = x as f32 + shift;
                let v = y as f32;
                let val = 128.0
                    + 50.0 * (0.21 * u + 0.05 * v).sin()
                    + 40.0 * (0.13 * v - 0.07 * u).sin()
                    + 30.0 * (0.047 * u * u / 8.0 + 0.3 * v).sin();
                data.push(val.round().clamp(0.0, 255.0) as u8);
            }
        }
        Ok(Image::new([width, height].into(), data)?)
    };
    Ok((render(0.0)?, render(disparity)?))
}

fn interior_zeros(depth: &Image<u16, 1>) -> usize {
    let (cols, rows) = (depth.cols(), depth.rows());
    (2..rows - 2)
        .flat_map(|y| (2..cols - 2).map(move |x| (x, y)))
        .filter(|&(x, y)| depth.as_slice()[y * cols + x] == 0)
        .count()
}

#[test]
fn depth_from_tracked_points() -> Result<(), DepthError> {
    let (left, right) = stereo_pair(5.25)?;
    let params = LkStereoParams::default()
        .with_win_size([15, 15].into())
        .with_max_level(2);

    let depth = depth_from_stereo_images(&left, &right, &POINTS, FX, BASELINE, &params)?;

    for p in POINTS.iter() {
        let z = *depth.get_pixel(p[0] as usize, p[1] as usize, 0)?;
        assert_relative_eq!(z, FX * BASELINE / 5.25, epsilon = 0.1);
        assert_relative_eq!(get_depth(&depth, p[0], p[1], false, 0.0)?, z);
    }
    assert_eq!(
        depth.as_slice().iter().filter(|&&d| d != 0.0).count(),
        POINTS.len()
    );

    Ok(())
}

#[test]
fn block_matching_disparity_to_millimeters() -> Result<(), DepthError> {
    let (left, right) = stereo_pair(6.0)?;
    let params = BlockMatchingParams::default()
        .with_win_size([9, 9].into())
        .with_max_level(2)
        .with_disparity_range(0, 32);

    let matches = calc_stereo_correspondences(&left, &right, &POINTS, &params)?;
    let disparity = disparity_from_stereo_correspondences(left.size(), &matches)?;

    let DepthImage::Millimeters(depth_mm) = depth_from_disparity(
        &DisparityMap::Float(disparity),
        FX,
        BASELINE,
        DepthEncoding::Millimeters,
    )?
    else {
        panic!("expected a millimeters depth image");
    };

    for p in POINTS.iter() {
        assert_eq!(*depth_mm.get_pixel(p[0] as usize, p[1] as usize, 0)?, 8333);
    }

    let mut depth_m = Image::<f32, 1>::from_size_val(depth_mm.size(), 0.0)?;
    depth_to_meters(&depth_mm, &mut depth_m)?;
    assert_relative_eq!(
        get_depth(&depth_m, POINTS[0][0], POINTS[0][1], true, 0.05)?,
        8.333,
        epsilon = 1e-3
    );

    Ok(())
}

#[test]
fn register_and_fill_plane() -> Result<(), DepthError> {
    // the target camera has a longer focal, leaving gaps once registered
    let depth_k = CameraIntrinsic::new(40.0, 40.0, 19.5, 14.5);
    let color_k = CameraIntrinsic::new(44.0, 44.0, 19.5, 14.5);

    let depth = Image::<u16, 1>::from_size_val([40, 30].into(), 2000)?;
    let mut registered = Image::<u16, 1>::from_size_val(depth.size(), 0)?;

    let overflow = register_depth(
        &depth,
        &depth_k,
        &color_k,
        &RigidTransform::identity(),
        &mut registered,
    )?;
    assert_eq!(overflow, 0);

    let holes = interior_zeros(&registered);
    assert!(holes > 100);

    fill_registered_depth_holes(&mut registered, &HoleFillingConfig::default());

    assert!(interior_zeros(&registered) < holes / 10);
    assert!(registered
        .as_slice()
        .iter()
        .all(|&d| d == 0 || d == 2000));

    Ok(())
}
