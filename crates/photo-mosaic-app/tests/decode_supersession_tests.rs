//! Integration tests for latest-generation decode semantics.

use std::sync::Arc;

use photo_mosaic_decode::{DecodeController, DecodeOutcome, SyntheticDecodeBackend};

#[test]
fn decode_supersession_tests_discards_the_stale_completion() {
    let mut controller = DecodeController::spawn(Arc::new(SyntheticDecodeBackend::new(8, 8)));

    // Two uploads before any completion is consumed: the first resolves
    // first but belongs to a superseded generation.
    controller.begin_decode(b"first".to_vec());
    controller.begin_decode(b"second".to_vec());

    match controller.wait_outcome() {
        DecodeOutcome::Decoded(image) => {
            // The synthetic backend seeds the blue channel with the first
            // upload byte, so the surviving image must come from "second".
            assert_eq!(image.pixel(0, 0), Some([0, 0, b's', 255]));
        }
        DecodeOutcome::Failed(error) => panic!("decode should succeed, got {error}"),
    }

    // The stale completion was drained, not left behind.
    assert!(controller.poll().is_none());
    controller.shutdown();
}

#[test]
fn decode_supersession_tests_stale_failure_does_not_shadow_the_new_upload() {
    let mut controller = DecodeController::spawn(Arc::new(SyntheticDecodeBackend::new(8, 8)));

    controller.begin_decode(b"unreadable".to_vec());
    controller.begin_decode(b"good".to_vec());

    assert!(matches!(
        controller.wait_outcome(),
        DecodeOutcome::Decoded(_)
    ));
    controller.shutdown();
}

#[test]
fn decode_supersession_tests_single_upload_resolves_normally() {
    let mut controller = DecodeController::spawn(Arc::new(SyntheticDecodeBackend::new(4, 4)));

    let generation = controller.begin_decode(b"only".to_vec());
    assert_eq!(generation, 1);

    match controller.wait_outcome() {
        DecodeOutcome::Decoded(image) => {
            assert_eq!(image.width, 4);
            assert_eq!(image.height, 4);
        }
        DecodeOutcome::Failed(error) => panic!("decode should succeed, got {error}"),
    }
    controller.shutdown();
}
