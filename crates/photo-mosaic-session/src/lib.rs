#![warn(missing_docs)]
//! # photo-mosaic-session
//!
//! ## Purpose
//! Defines the explicit render-session state model for `photo-mosaic`.
//!
//! ## Responsibilities
//! - Hold the current decoded image between renders.
//! - Track the render phase machine and the visible-output flag.
//! - Gate regeneration on a completed first render.
//! - Invalidate the previous reveal before a new render starts.
//!
//! ## Data flow
//! Orchestration events mutate [`SessionState`], which drives what the host
//! shell shows: the output region, the error text, or neither.
//!
//! ## Ownership and lifetimes
//! The session owns its image and status strings outright; render
//! operations receive clones, so no ambient lookups or shared globals are
//! involved.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors. Invalid
//! combinations are prevented by guard methods.

use photo_mosaic_core::SourceImage;
use photo_mosaic_present::RevealToken;

/// Render phase machine:
/// `Idle -> Validating -> {Failed | Rendering} -> Presented`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// No render requested yet.
    Idle,
    /// Tile spec is being checked against the current image.
    Validating,
    /// Surface passes are running.
    Rendering,
    /// Output is on screen.
    Presented,
    /// The last request failed; the error text explains why.
    Failed,
}

/// Aggregate session state.
///
/// One value of this type stands in for any ambient globals: the current
/// image, the output visibility, and the error region all live here and
/// are passed explicitly to each operation.
#[derive(Debug, Clone)]
pub struct SessionState {
    version: String,
    phase: RenderPhase,
    current_image: Option<SourceImage>,
    error_text: Option<String>,
    output_visible: bool,
    regenerate_enabled: bool,
    presented_digest: Option<String>,
    active_reveal: Option<RevealToken>,
}

impl SessionState {
    /// Creates an idle session.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            phase: RenderPhase::Idle,
            current_image: None,
            error_text: None,
            output_visible: false,
            regenerate_enabled: false,
            presented_digest: None,
            active_reveal: None,
        }
    }

    /// App version string sourced from root `VERSION`.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Current render phase.
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    /// Image accepted by the most recent successful decode.
    pub fn current_image(&self) -> Option<&SourceImage> {
        self.current_image.as_ref()
    }

    /// Error text for the message region, if the last request failed.
    pub fn error_text(&self) -> Option<&str> {
        self.error_text.as_deref()
    }

    /// Whether the output region is currently shown.
    pub fn output_visible(&self) -> bool {
        self.output_visible
    }

    /// Digest of the mosaic currently on screen.
    pub fn presented_digest(&self) -> Option<&str> {
        self.presented_digest.as_deref()
    }

    /// Returns `true` when a regenerate request may run.
    ///
    /// Regeneration requires a retained image and one completed render.
    pub fn can_regenerate(&self) -> bool {
        self.regenerate_enabled && self.current_image.is_some()
    }

    /// Stores a freshly decoded image as the session's current image.
    ///
    /// The previous image, if any, is dropped; renders against it can no
    /// longer be requested.
    pub fn accept_image(&mut self, image: SourceImage) {
        self.current_image = Some(image);
    }

    /// Records a decode failure; prior output stays hidden.
    pub fn decode_failed(&mut self, message: impl Into<String>) {
        self.phase = RenderPhase::Failed;
        self.error_text = Some(message.into());
        self.output_visible = false;
    }

    /// Enters the validation phase for a new render request.
    pub fn begin_validation(&mut self) {
        self.phase = RenderPhase::Validating;
        self.error_text = None;
    }

    /// Records a tile spec rejection; no drawing happened.
    pub fn validation_failed(&mut self, message: impl Into<String>) {
        self.phase = RenderPhase::Failed;
        self.error_text = Some(message.into());
        self.output_visible = false;
    }

    /// Enters the rendering phase.
    ///
    /// Invariant:
    /// - At most one reveal may own the display region, so any in-flight
    ///   reveal is cancelled before the new render takes over.
    pub fn begin_render(&mut self) {
        if let Some(token) = self.active_reveal.take() {
            token.cancel();
        }
        self.phase = RenderPhase::Rendering;
    }

    /// Registers the reveal belonging to the render in progress.
    pub fn attach_reveal(&mut self, token: RevealToken) {
        if let Some(previous) = self.active_reveal.replace(token) {
            previous.cancel();
        }
    }

    /// Records a completed presentation.
    pub fn presented(&mut self, digest: impl Into<String>) {
        self.phase = RenderPhase::Presented;
        self.output_visible = true;
        self.regenerate_enabled = true;
        self.error_text = None;
        self.presented_digest = Some(digest.into());
    }

    /// Records a render or presentation failure; output stays hidden.
    pub fn render_failed(&mut self, message: impl Into<String>) {
        self.phase = RenderPhase::Failed;
        self.error_text = Some(message.into());
        self.output_visible = false;
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for session phase transitions and gates.

    use photo_mosaic_core::SourceImage;

    use super::*;

    fn image() -> SourceImage {
        SourceImage::new(2, 2, vec![0; 16]).expect("image fixture should be valid")
    }

    #[test]
    fn regenerate_gate_requires_image_and_completed_render() {
        let mut state = SessionState::new("0.1.0");
        assert!(!state.can_regenerate());

        state.accept_image(image());
        assert!(!state.can_regenerate());

        state.begin_validation();
        state.begin_render();
        state.presented("digest");
        assert!(state.can_regenerate());
        assert!(state.output_visible());
        assert_eq!(state.phase(), RenderPhase::Presented);
    }

    #[test]
    fn failures_hide_output_and_keep_the_message() {
        let mut state = SessionState::new("0.1.0");
        state.accept_image(image());
        state.begin_validation();
        state.begin_render();
        state.presented("digest");

        state.begin_validation();
        state.validation_failed("tiles must be positive size");

        assert_eq!(state.phase(), RenderPhase::Failed);
        assert!(!state.output_visible());
        assert_eq!(state.error_text(), Some("tiles must be positive size"));
        // The image survives the failure, so a corrected request can rerun.
        assert!(state.can_regenerate());
    }

    #[test]
    fn begin_render_cancels_the_previous_reveal() {
        let mut state = SessionState::new("0.1.0");
        let token = photo_mosaic_present::RevealToken::new();
        state.attach_reveal(token.clone());
        assert!(!token.is_cancelled());

        state.begin_render();
        assert!(token.is_cancelled());
    }
}
