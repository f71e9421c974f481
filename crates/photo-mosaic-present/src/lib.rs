#![warn(missing_docs)]
//! # photo-mosaic-present
//!
//! ## Purpose
//! Moves sealed mosaics onto the visible output region.
//!
//! ## Responsibilities
//! - Define a sink-agnostic display trait with show/hide semantics.
//! - Copy whole surfaces in one step (immediate presentation).
//! - Reveal surfaces one row band per cooperative step, with cancellation.
//!
//! ## Data flow
//! [`PresentedMosaic`] -> [`present_immediate`] or [`ProgressiveReveal`]
//! -> [`DisplaySink`] owned by the host shell.
//!
//! ## Ownership and lifetimes
//! A reveal owns its mosaic for its whole lifetime, so the pixel source
//! cannot change underneath an in-flight reveal. Exactly one reveal may own
//! the display region; starting a new render cancels the previous token.
//!
//! ## Error model
//! Sink/mosaic geometry disagreements and out-of-range bands are reported
//! as [`PresentError`]; cancellation is a normal [`RevealStep`], not an
//! error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use photo_mosaic_render::PresentedMosaic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Presentation policy for one render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresentationMode {
    /// Copy the completed surface to the sink in one step.
    #[default]
    Immediate,
    /// Reveal the surface one row band per cooperative step.
    Progressive,
}

/// One horizontal strip of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBand {
    /// First row of the band.
    pub y: u32,
    /// Band height in rows.
    pub height: u32,
}

/// Event emitted for each revealed band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRevealed {
    /// The band that was just copied to the sink.
    pub band: RowBand,
    /// Zero-based band index.
    pub index: u32,
    /// Bands still below the current offset.
    pub remaining: u32,
}

/// Visible output region of the host shell.
pub trait DisplaySink {
    /// Clears the region and hides it.
    fn hide(&mut self);

    /// Copies one band of the mosaic into the region.
    ///
    /// # Errors
    /// Returns [`PresentError`] when the band falls outside the surface or
    /// the sink geometry does not match the mosaic.
    fn blit_band(&mut self, mosaic: &PresentedMosaic, band: RowBand) -> Result<(), PresentError>;

    /// Makes the region visible.
    fn show(&mut self);
}

/// In-memory display sink used by the CLI shell and tests.
#[derive(Debug, Clone)]
pub struct MemoryDisplaySink {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    visible: bool,
    bands_applied: u32,
}

impl MemoryDisplaySink {
    /// Creates a hidden sink of fixed geometry.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
            visible: false,
            bands_applied: 0,
        }
    }

    /// Returns `true` while the region is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Raw RGBA bytes currently displayed.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    /// Number of band copies applied since the last clear.
    pub fn bands_applied(&self) -> u32 {
        self.bands_applied
    }
}

impl DisplaySink for MemoryDisplaySink {
    fn hide(&mut self) {
        self.visible = false;
        self.bands_applied = 0;
        self.rgba.fill(0);
    }

    fn blit_band(&mut self, mosaic: &PresentedMosaic, band: RowBand) -> Result<(), PresentError> {
        if mosaic.width != self.width || mosaic.height != self.height {
            return Err(PresentError::SinkGeometryMismatch {
                sink_width: self.width,
                sink_height: self.height,
                mosaic_width: mosaic.width,
                mosaic_height: mosaic.height,
            });
        }

        let rows = mosaic
            .rows(band.y, band.height)
            .ok_or(PresentError::BandOutOfBounds {
                y: band.y,
                height: band.height,
                surface_height: mosaic.height,
            })?;

        let row_len = self.width as usize * 4;
        let start = band.y as usize * row_len;
        self.rgba[start..start + rows.len()].copy_from_slice(rows);
        self.bands_applied += 1;
        Ok(())
    }

    fn show(&mut self) {
        self.visible = true;
    }
}

/// Cancellation handle shared between a reveal and its owner.
///
/// Cancelling is idempotent and permanent for the token's reveal.
#[derive(Debug, Clone, Default)]
pub struct RevealToken {
    cancelled: Arc<AtomicBool>,
}

impl RevealToken {
    /// Creates an active token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidates the reveal owning this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of one cooperative reveal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealStep {
    /// One band was copied to the sink.
    Revealed(BandRevealed),
    /// The reveal was superseded; the sink was not touched.
    Cancelled,
    /// All bands below the offset have been revealed.
    Complete,
}

/// Finite, restartable row-band reveal over one sealed mosaic.
///
/// Each [`ProgressiveReveal::advance`] call is the cooperative-yield unit:
/// the host's frame scheduler decides when the next band appears.
#[derive(Debug)]
pub struct ProgressiveReveal {
    mosaic: PresentedMosaic,
    band_height: u32,
    next_y: u32,
    token: RevealToken,
}

impl ProgressiveReveal {
    /// Creates a reveal stepping `band_height` rows per advance.
    ///
    /// # Errors
    /// Returns [`PresentError::InvalidBandHeight`] when `band_height == 0`.
    pub fn new(mosaic: PresentedMosaic, band_height: u32) -> Result<Self, PresentError> {
        if band_height == 0 {
            return Err(PresentError::InvalidBandHeight);
        }

        Ok(Self {
            mosaic,
            band_height,
            next_y: 0,
            token: RevealToken::new(),
        })
    }

    /// Returns a handle that can invalidate this reveal.
    pub fn token(&self) -> RevealToken {
        self.token.clone()
    }

    /// Copies the next band to the sink, or reports why it did not.
    ///
    /// # Errors
    /// Propagates sink failures; cancellation and completion are ordinary
    /// [`RevealStep`] values.
    pub fn advance(&mut self, sink: &mut dyn DisplaySink) -> Result<RevealStep, PresentError> {
        if self.token.is_cancelled() {
            return Ok(RevealStep::Cancelled);
        }
        if self.next_y >= self.mosaic.height {
            return Ok(RevealStep::Complete);
        }

        let height = self.band_height.min(self.mosaic.height - self.next_y);
        let band = RowBand {
            y: self.next_y,
            height,
        };
        sink.blit_band(&self.mosaic, band)?;

        let index = self.next_y / self.band_height;
        self.next_y += height;
        let remaining = (self.mosaic.height - self.next_y).div_ceil(self.band_height);

        Ok(RevealStep::Revealed(BandRevealed {
            band,
            index,
            remaining,
        }))
    }
}

/// Copies the completed surface to the sink in one step.
///
/// # Errors
/// Propagates sink geometry failures.
pub fn present_immediate(
    mosaic: &PresentedMosaic,
    sink: &mut dyn DisplaySink,
) -> Result<(), PresentError> {
    sink.hide();
    sink.blit_band(
        mosaic,
        RowBand {
            y: 0,
            height: mosaic.height,
        },
    )?;
    sink.show();
    Ok(())
}

/// Presentation layer error type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresentError {
    /// Reveal band height must be positive.
    #[error("band height must be positive")]
    InvalidBandHeight,
    /// Requested band lies outside the surface.
    #[error("band at row {y} with height {height} exceeds {surface_height} surface rows")]
    BandOutOfBounds {
        /// First requested row.
        y: u32,
        /// Requested band height.
        height: u32,
        /// Total surface rows.
        surface_height: u32,
    },
    /// Sink and mosaic geometry disagree.
    #[error(
        "sink geometry {sink_width}x{sink_height} does not match mosaic {mosaic_width}x{mosaic_height}"
    )]
    SinkGeometryMismatch {
        /// Sink width in pixels.
        sink_width: u32,
        /// Sink height in pixels.
        sink_height: u32,
        /// Mosaic width in pixels.
        mosaic_width: u32,
        /// Mosaic height in pixels.
        mosaic_height: u32,
    },
}
