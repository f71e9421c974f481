//! Tests that rendering is deterministic across repeated invocations.

use photo_mosaic_core::{SourceImage, TileSpec};
use photo_mosaic_render::{RenderOptions, render_mosaic};

fn gradient_image(width: u32, height: u32) -> SourceImage {
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, 255]);
        }
    }
    SourceImage::new(width, height, rgba).expect("image fixture should be valid")
}

#[test]
fn render_determinism_tests_same_inputs_produce_identical_digests() {
    let image = gradient_image(100, 100);
    let spec = TileSpec::new(16, 16);
    let options = RenderOptions::default();

    let first = render_mosaic(&image, spec, &options).expect("first render should succeed");
    let second = render_mosaic(&image, spec, &options).expect("second render should succeed");

    assert_eq!(first.digest, second.digest);
    assert_eq!(first.rgba, second.rgba);
}

#[test]
fn render_determinism_tests_output_geometry_matches_grid() {
    let image = gradient_image(100, 100);
    let mosaic = render_mosaic(&image, TileSpec::new(16, 16), &RenderOptions::default())
        .expect("render should succeed");

    assert_eq!(mosaic.width, 96);
    assert_eq!(mosaic.height, 96);
    assert_eq!(mosaic.rgba.len(), 96 * 96 * 4);
}
