//! Integration tests for regenerate gating and output replacement.

mod common;

use photo_mosaic_app::{AppError, regenerate, upload_and_render};
use photo_mosaic_core::TileSpec;
use photo_mosaic_decode::{DecodeBackend, SyntheticDecodeBackend};
use photo_mosaic_present::{MemoryDisplaySink, PresentationMode};
use photo_mosaic_render::{RenderOptions, render_mosaic};
use photo_mosaic_session::SessionState;

#[test]
fn regenerate_lifecycle_tests_requires_a_completed_first_render() {
    let mut session = SessionState::new("0.1.0");
    let mut sink = MemoryDisplaySink::new(96, 96);

    let result = regenerate(
        &mut session,
        TileSpec::new(16, 16),
        &RenderOptions::default(),
        PresentationMode::Immediate,
        &mut sink,
    );

    assert!(matches!(result, Err(AppError::RegenerateUnavailable)));

    // An accepted image alone is not enough either.
    session.accept_image(common::gradient_image(100, 100));
    let result = regenerate(
        &mut session,
        TileSpec::new(16, 16),
        &RenderOptions::default(),
        PresentationMode::Immediate,
        &mut sink,
    );
    assert!(matches!(result, Err(AppError::RegenerateUnavailable)));
}

#[test]
fn regenerate_lifecycle_tests_replaces_output_entirely() {
    let backend = SyntheticDecodeBackend::new(100, 100);
    let mut session = SessionState::new("0.1.0");

    let mut first_sink = MemoryDisplaySink::new(96, 96);
    let first = upload_and_render(
        &mut session,
        &backend,
        b"photo",
        TileSpec::new(16, 16),
        &RenderOptions::default(),
        PresentationMode::Immediate,
        &mut first_sink,
    )
    .expect("first render should complete");

    // Regenerate against the retained image with a new tile size. The new
    // surface has new geometry; a fresh sink models the replaced region.
    let mut second_sink = MemoryDisplaySink::new(100, 100);
    let second = regenerate(
        &mut session,
        TileSpec::new(10, 10),
        &RenderOptions::default(),
        PresentationMode::Immediate,
        &mut second_sink,
    )
    .expect("regenerate should complete");

    assert_eq!(second.columns, 10);
    assert_eq!(second.output_width, 100);
    assert_ne!(first.surface_digest, second.surface_digest);
    assert_eq!(session.presented_digest(), Some(second.surface_digest.as_str()));

    // No residual pixels: the displayed buffer equals a fresh render of the
    // new spec alone.
    let image = backend.decode(b"photo").expect("fixture should decode");
    let expected = render_mosaic(&image, TileSpec::new(10, 10), &RenderOptions::default())
        .expect("reference render should succeed");
    assert_eq!(second_sink.rgba(), expected.rgba.as_slice());
}
