//! Tests the render report JSON codec.

use photo_mosaic_core::{REPORT_SCHEMA_VERSION_V1, RenderReport};

#[test]
fn render_report_codec_tests_preserves_fields_through_json() {
    let report = RenderReport {
        schema_version: REPORT_SCHEMA_VERSION_V1.to_string(),
        source_width: 100,
        source_height: 100,
        tile_width: 16,
        tile_height: 16,
        columns: 6,
        rows: 6,
        output_width: 96,
        output_height: 96,
        presentation: "immediate".to_string(),
        surface_digest: "ab".repeat(32),
    };

    let bytes = report.to_json_bytes().expect("report should encode");
    let decoded = RenderReport::from_json_bytes(&bytes).expect("report should decode");
    assert_eq!(decoded, report);
}

#[test]
fn render_report_codec_tests_rejects_truncated_document() {
    let result = RenderReport::from_json_bytes(b"{\"schema_version\":\"v1\"");
    assert!(result.is_err());
}
