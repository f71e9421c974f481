//! Shared fixtures for app integration tests.

use photo_mosaic_core::SourceImage;
use photo_mosaic_session::SessionState;

/// Creates a deterministic gradient image fixture.
#[allow(dead_code)]
pub fn gradient_image(width: u32, height: u32) -> SourceImage {
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 64, 255]);
        }
    }
    SourceImage::new(width, height, rgba).expect("image fixture should be valid")
}

/// Creates a session already holding a gradient image.
#[allow(dead_code)]
pub fn session_with_image(width: u32, height: u32) -> SessionState {
    let mut session = SessionState::new("0.1.0");
    session.accept_image(gradient_image(width, height));
    session
}
