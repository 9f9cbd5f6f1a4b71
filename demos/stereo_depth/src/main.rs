use argh::FromArgs;

use stereo::depth::{
    camera::{CameraIntrinsic, RigidTransform},
    conversion::{depth_from_disparity, DepthEncoding, DepthImage},
    hole_filling::{fill_registered_depth_holes, HoleFillingConfig},
    registration::register_depth,
    stereo::depth_from_stereo_images,
};
use stereo::image::Image;
use stereo::matching::{
    block_matching::{calc_stereo_correspondences, BlockMatchingParams},
    disparity::disparity_from_stereo_correspondences,
    optical_flow::{calc_optical_flow_pyr_lk_stereo, LkStereoParams},
    Correspondence, DisparityMap,
};

#[derive(FromArgs)]
/// Compute sparse depth from a synthetic rectified stereo pair
struct Args {
    /// the width of the synthetic images
    #[argh(option, default = "320")]
    width: usize,

    /// the height of the synthetic images
    #[argh(option, default = "240")]
    height: usize,

    /// the disparity between the two images in pixels
    #[argh(option, short = 'd', default = "7.5")]
    disparity: f32,

    /// the focal length in pixels
    #[argh(option, default = "525.0")]
    fx: f32,

    /// the stereo baseline in meters
    #[argh(option, short = 'b', default = "0.075")]
    baseline: f32,

    /// the spacing of the tracked points grid in pixels
    #[argh(option, default = "8")]
    step: usize,
}

// smooth texture so that both engines can lock on it
fn render(width: usize, height: usize, shift: f32) -> Result<Image<u8, 1>, Box<dyn std::error::Error>> {
    let data = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let u = x as f32 + shift;
                let v = y as f32;
                let val = 128.0
                    + 50.0 * (0.21 * u + 0.05 * v).sin()
                    + 40.0 * (0.13 * v - 0.07 * u).sin()
                    + 30.0 * (0.011 * u * v).cos();
                val.round().clamp(0.0, 255.0) as u8
            })
        })
        .collect();
    Ok(Image::new([width, height].into(), data)?)
}

fn summarize(name: &str, correspondences: &[Correspondence]) {
    let valid = correspondences.iter().filter(|c| c.valid).collect::<Vec<_>>();
    let mean = valid.iter().map(|c| c.disparity()).sum::<f32>() / valid.len().max(1) as f32;
    log::info!(
        "{name}: {} / {} valid, mean disparity {mean:.3} px",
        valid.len(),
        correspondences.len()
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let left = render(args.width, args.height, 0.0)?;
    let right = render(args.width, args.height, args.disparity)?;

    // keep the points away from the borders
    let margin = 24;
    let points = (margin..args.height.saturating_sub(margin))
        .step_by(args.step.max(1))
        .flat_map(|y| {
            (margin..args.width.saturating_sub(margin))
                .step_by(args.step.max(1))
                .map(move |x| [x as f32, y as f32])
        })
        .collect::<Vec<_>>();

    log::info!("tracking {} points", points.len());

    let bm_params = BlockMatchingParams::default()
        .with_win_size([9, 9].into())
        .with_disparity_range(0, 32);
    let bm = calc_stereo_correspondences(&left, &right, &points, &bm_params)?;
    summarize("block matching", &bm);

    let lk_params = LkStereoParams::default().with_win_size([15, 15].into());
    let lk = calc_optical_flow_pyr_lk_stereo(&left, &right, &points, None, &lk_params)?;
    summarize("lucas-kanade", &lk);

    let sparse_depth = depth_from_stereo_images(
        &left,
        &right,
        &points,
        args.fx,
        args.baseline,
        &lk_params,
    )?;
    log::info!(
        "{} sparse depth values, expected {:.3} m",
        sparse_depth.as_slice().iter().filter(|&&d| d > 0.0).count(),
        args.fx * args.baseline / args.disparity
    );

    let disparity = disparity_from_stereo_correspondences(left.size(), &bm)?;
    let DepthImage::Millimeters(depth) = depth_from_disparity(
        &DisparityMap::Float(disparity),
        args.fx,
        args.baseline,
        DepthEncoding::Millimeters,
    )?
    else {
        return Err("unexpected depth encoding".into());
    };

    // register the left depth into a color camera next to it
    let depth_k = CameraIntrinsic::new(
        args.fx,
        args.fx,
        args.width as f32 / 2.0,
        args.height as f32 / 2.0,
    );
    let color_k = CameraIntrinsic::new(
        args.fx * 0.5,
        args.fx * 0.5,
        args.width as f32 / 4.0,
        args.height as f32 / 4.0,
    );
    let transform = RigidTransform::from_translation([-0.025, 0.0, 0.0]);

    let mut registered = Image::<u16, 1>::from_size_val([args.width / 2, args.height / 2].into(), 0)?;
    let overflow = register_depth(&depth, &depth_k, &color_k, &transform, &mut registered)?;

    let count = |d: &Image<u16, 1>| d.as_slice().iter().filter(|&&v| v > 0).count();
    log::info!(
        "registered {} depth values ({overflow} over range)",
        count(&registered)
    );

    fill_registered_depth_holes(&mut registered, &HoleFillingConfig::default().with_double_holes(true));
    log::info!("{} depth values after hole filling", count(&registered));

    Ok(())
}
