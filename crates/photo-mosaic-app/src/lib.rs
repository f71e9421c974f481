#![warn(missing_docs)]
//! # photo-mosaic-app
//!
//! ## Purpose
//! Orchestrates decode, validation, rendering, presentation, and session
//! state for `photo-mosaic`.
//!
//! ## Responsibilities
//! - Run the upload-to-presentation pipeline over an explicit session.
//! - Gate regeneration on a completed first render.
//! - Fold subsystem failures into one error type with user-visible text.
//! - Load render presets and build render reports.
//!
//! ## Data flow
//! Upload bytes -> decode -> session image -> validate -> render ->
//! present -> [`RenderReport`] for tooling.
//!
//! ## Ownership and lifetimes
//! Orchestration passes owned images and sealed mosaics between stages, so
//! no stage aliases another stage's buffers.
//!
//! ## Error model
//! Subsystem failures are wrapped in [`AppError`]; [`user_message`]
//! converts any of them into the text shown in the error region, so no
//! failure escapes the top-level handler.

use photo_mosaic_core::{
    GridGeometry, REPORT_SCHEMA_VERSION_V1, RenderReport, SourceImage, TileSpec, ValidationError,
    validate_tile_spec,
};
use photo_mosaic_decode::{DecodeBackend, DecodeError};
use photo_mosaic_present::{
    DisplaySink, PresentError, PresentationMode, ProgressiveReveal, RevealStep, present_immediate,
};
use photo_mosaic_render::{
    CompositeRule, PresentedMosaic, RenderError, RenderOptions, TileShape, render_mosaic,
};
use photo_mosaic_session::SessionState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("PHOTO_MOSAIC_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Checks the runtime animation override env var.
///
/// Semantics:
/// - Unset => progressive presentation permitted.
/// - `0`, `false`, `off` (case-insensitive) => progressive degrades to
///   immediate.
/// - Any other value => progressive presentation permitted.
pub fn animation_enabled_from_env() -> bool {
    match std::env::var("PHOTO_MOSAIC_ANIMATE") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Resolves the presentation mode actually used for a render.
pub fn effective_mode(requested: PresentationMode) -> PresentationMode {
    if requested == PresentationMode::Progressive && !animation_enabled_from_env() {
        PresentationMode::Immediate
    } else {
        requested
    }
}

/// Stable label for a presentation mode, as used in render reports.
pub fn presentation_label(mode: PresentationMode) -> &'static str {
    match mode {
        PresentationMode::Immediate => "immediate",
        PresentationMode::Progressive => "progressive",
    }
}

/// Render preset document bundling a tile spec with render options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPreset {
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    /// Tile shape to stamp.
    #[serde(default)]
    pub shape: TileShape,
    /// Color transfer rule.
    #[serde(default)]
    pub composite: CompositeRule,
    /// Presentation policy.
    #[serde(default)]
    pub presentation: PresentationMode,
}

impl RenderPreset {
    /// Parses a preset from JSON bytes.
    ///
    /// # Errors
    /// Returns [`AppError::Preset`] when the document does not match the
    /// preset contract.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(raw).map_err(AppError::Preset)
    }

    /// Tile specification carried by the preset.
    pub fn tile_spec(&self) -> TileSpec {
        TileSpec::new(self.tile_width, self.tile_height)
    }

    /// Render options carried by the preset.
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            shape: self.shape,
            composite: self.composite,
        }
    }
}

/// Decodes an upload, stores it as the session image, then renders.
///
/// On decode failure the session shows the error and prior output stays
/// hidden; the upload buffer is released either way.
///
/// # Errors
/// Returns [`AppError`] for decode, validation, render, or presentation
/// failures.
pub fn upload_and_render(
    session: &mut SessionState,
    backend: &dyn DecodeBackend,
    bytes: &[u8],
    spec: TileSpec,
    options: &RenderOptions,
    mode: PresentationMode,
    sink: &mut dyn DisplaySink,
) -> Result<RenderReport, AppError> {
    match backend.decode(bytes) {
        Ok(image) => session.accept_image(image),
        Err(error) => {
            session.decode_failed(error.to_string());
            return Err(AppError::Decode(error));
        }
    }

    render_current(session, spec, options, mode, sink)
}

/// Renders the session's current image with the given spec and options.
///
/// Drives the full phase machine: validation, surface passes, and
/// presentation, leaving the session either `Presented` or `Failed`.
///
/// # Errors
/// Returns [`AppError::NoSourceImage`] when no upload has been accepted
/// yet, otherwise any pipeline failure.
pub fn render_current(
    session: &mut SessionState,
    spec: TileSpec,
    options: &RenderOptions,
    mode: PresentationMode,
    sink: &mut dyn DisplaySink,
) -> Result<RenderReport, AppError> {
    let image = match session.current_image() {
        Some(image) => image.clone(),
        None => {
            session.render_failed(AppError::NoSourceImage.to_string());
            return Err(AppError::NoSourceImage);
        }
    };

    session.begin_validation();
    if let Err(error) = validate_tile_spec(&image, spec) {
        session.validation_failed(error.to_string());
        return Err(AppError::Validation(error));
    }
    let grid = GridGeometry::derive(&image, spec).map_err(AppError::Validation)?;

    session.begin_render();
    let mosaic = match render_mosaic(&image, spec, options) {
        Ok(mosaic) => mosaic,
        Err(error) => {
            session.render_failed(error.to_string());
            return Err(AppError::Render(error));
        }
    };

    let mode = effective_mode(mode);
    if let Err(error) = present(session, &mosaic, spec, mode, sink) {
        if !matches!(error, AppError::Superseded) {
            session.render_failed(error.to_string());
        }
        return Err(error);
    }

    session.presented(mosaic.digest.clone());
    Ok(build_report(&image, spec, &grid, mode, &mosaic.digest))
}

/// Re-renders the retained image with a new tile spec.
///
/// # Errors
/// Returns [`AppError::RegenerateUnavailable`] before the first completed
/// render, otherwise any pipeline failure.
pub fn regenerate(
    session: &mut SessionState,
    spec: TileSpec,
    options: &RenderOptions,
    mode: PresentationMode,
    sink: &mut dyn DisplaySink,
) -> Result<RenderReport, AppError> {
    if !session.can_regenerate() {
        return Err(AppError::RegenerateUnavailable);
    }

    render_current(session, spec, options, mode, sink)
}

fn present(
    session: &mut SessionState,
    mosaic: &PresentedMosaic,
    spec: TileSpec,
    mode: PresentationMode,
    sink: &mut dyn DisplaySink,
) -> Result<(), AppError> {
    match mode {
        PresentationMode::Immediate => {
            present_immediate(mosaic, sink)?;
        }
        PresentationMode::Progressive => {
            let mut reveal = ProgressiveReveal::new(mosaic.clone(), spec.tile_height)?;
            session.attach_reveal(reveal.token());

            // Append-then-reveal: the region becomes visible before the
            // first band lands, and each advance is one cooperative step.
            sink.hide();
            sink.show();
            loop {
                match reveal.advance(sink)? {
                    RevealStep::Revealed(_) => continue,
                    RevealStep::Complete => break,
                    RevealStep::Cancelled => return Err(AppError::Superseded),
                }
            }
        }
    }

    Ok(())
}

fn build_report(
    image: &SourceImage,
    spec: TileSpec,
    grid: &GridGeometry,
    mode: PresentationMode,
    digest: &str,
) -> RenderReport {
    RenderReport {
        schema_version: REPORT_SCHEMA_VERSION_V1.to_string(),
        source_width: image.width,
        source_height: image.height,
        tile_width: spec.tile_width,
        tile_height: spec.tile_height,
        columns: grid.columns,
        rows: grid.rows,
        output_width: grid.output_width,
        output_height: grid.output_height,
        presentation: presentation_label(mode).to_string(),
        surface_digest: digest.to_string(),
    }
}

/// Converts any pipeline failure into the text shown in the error region.
///
/// This is the top-level recovery point: callers display the returned
/// string and wait for corrected input instead of retrying.
pub fn user_message(error: &AppError) -> String {
    match error {
        AppError::Decode(inner) => inner.to_string(),
        AppError::Validation(inner) => inner.to_string(),
        AppError::Render(RenderError::Validation(inner)) => inner.to_string(),
        AppError::Render(inner) => inner.to_string(),
        AppError::Present(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Upload could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Tile spec rejected before drawing.
    #[error("validation error: {0}")]
    Validation(ValidationError),
    /// Surface pass failure.
    #[error("render error: {0}")]
    Render(RenderError),
    /// Presentation failure.
    #[error("present error: {0}")]
    Present(#[from] PresentError),
    /// Preset document could not be parsed.
    #[error("preset codec failure: {0}")]
    Preset(serde_json::Error),
    /// Report document could not be produced.
    #[error("report error: {0}")]
    Report(#[from] photo_mosaic_core::CoreError),
    /// File read/write failure in the CLI shell.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    /// Output image could not be encoded.
    #[error("could not write output image: {0}")]
    OutputWrite(String),
    /// Render was requested before any upload was accepted.
    #[error("no image has been uploaded yet")]
    NoSourceImage,
    /// Regenerate was requested before the first completed render.
    #[error("regenerate requires a completed first render")]
    RegenerateUnavailable,
    /// A newer request invalidated this render mid-presentation.
    #[error("render superseded by a newer request")]
    Superseded,
}
