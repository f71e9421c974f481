#![warn(missing_docs)]
//! # photo-mosaic-core
//!
//! ## Purpose
//! Defines the pure data model used across the `photo-mosaic` workspace.
//!
//! ## Responsibilities
//! - Represent decoded source images and user-supplied tile specifications.
//! - Validate tile specifications against source image bounds.
//! - Derive mosaic grid geometry from a validated specification.
//! - Encode/decode versioned render reports for tooling.
//!
//! ## Data flow
//! Decode code emits [`SourceImage`] objects. The renderer validates a
//! [`TileSpec`] against the image, derives [`GridGeometry`], and callers
//! summarize a finished render as a [`RenderReport`].
//!
//! ## Ownership and lifetimes
//! Images and reports own their backing buffers (`Vec<u8>`, `String`) to
//! avoid hidden borrow/lifetime coupling between pipeline stages.
//!
//! ## Error model
//! Malformed pixel buffers return [`CoreError`]; tile specifications that do
//! not fit the image return [`ValidationError`] with user-facing messages.
//!
//! ## Security and privacy notes
//! Render reports carry geometry and digests only, never pixel data.
//!
//! ## Example
//! ```rust
//! use photo_mosaic_core::{GridGeometry, SourceImage, TileSpec};
//!
//! let image = SourceImage::new(100, 100, vec![255; 100 * 100 * 4]).unwrap();
//! let grid = GridGeometry::derive(&image, TileSpec::new(16, 16)).unwrap();
//! assert_eq!((grid.columns, grid.rows), (6, 6));
//! assert_eq!((grid.output_width, grid.output_height), (96, 96));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical schema tag for v1 render reports.
pub const REPORT_SCHEMA_VERSION_V1: &str = "v1";

/// Immutable decoded raster image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Raw RGBA pixel buffer (`width * height * 4` bytes, row-major).
    pub rgba: Vec<u8>,
}

impl SourceImage {
    /// Constructs a validated source image.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidImageShape`] when the pixel buffer length
    /// is not exactly `width * height * 4`.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, CoreError> {
        let expected_len = required_rgba_len(width, height)?;
        if rgba.len() != expected_len {
            return Err(CoreError::InvalidImageShape {
                expected: expected_len,
                actual: rgba.len(),
            });
        }

        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Returns the RGBA bytes of one pixel, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = &self.rgba[offset..offset + 4];
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// User-supplied tile dimensions for one render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
}

impl TileSpec {
    /// Creates a tile specification. Bounds are checked by
    /// [`validate_tile_spec`], not here, so the validator stays total.
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            tile_width,
            tile_height,
        }
    }
}

/// Validates a tile specification against a source image.
///
/// Pure and side-effect free: callers must not draw anything when this
/// returns an error.
///
/// # Errors
/// Returns [`ValidationError::NonPositiveTileSize`] when either tile
/// dimension is zero.
/// Returns [`ValidationError::TileExceedsImageBounds`] when a tile dimension
/// exceeds the matching image dimension.
pub fn validate_tile_spec(image: &SourceImage, spec: TileSpec) -> Result<(), ValidationError> {
    if spec.tile_width == 0 || spec.tile_height == 0 {
        return Err(ValidationError::NonPositiveTileSize);
    }

    if spec.tile_width > image.width || spec.tile_height > image.height {
        return Err(ValidationError::TileExceedsImageBounds);
    }

    Ok(())
}

/// Mosaic grid derived from a validated image/spec pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Number of whole tiles per row.
    pub columns: u32,
    /// Number of whole tiles per column.
    pub rows: u32,
    /// Output surface width (`columns * tile_width`).
    pub output_width: u32,
    /// Output surface height (`rows * tile_height`).
    pub output_height: u32,
}

impl GridGeometry {
    /// Derives grid geometry, validating the spec first.
    ///
    /// Invariant:
    /// - Output dimensions are exact multiples of the tile dimensions and
    ///   never exceed the source dimensions.
    ///
    /// # Errors
    /// Returns the underlying [`ValidationError`] when the spec does not fit
    /// the image, so geometry for an invalid spec is unrepresentable.
    pub fn derive(image: &SourceImage, spec: TileSpec) -> Result<Self, ValidationError> {
        validate_tile_spec(image, spec)?;

        let columns = image.width / spec.tile_width;
        let rows = image.height / spec.tile_height;

        Ok(Self {
            columns,
            rows,
            output_width: columns * spec.tile_width,
            output_height: rows * spec.tile_height,
        })
    }

    /// Returns total tile count for the grid.
    pub fn tile_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}

/// Versioned summary of one completed render, for reports and tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderReport {
    /// Report schema version for contract negotiation.
    pub schema_version: String,
    /// Source image width in pixels.
    pub source_width: u32,
    /// Source image height in pixels.
    pub source_height: u32,
    /// Tile width used for the render.
    pub tile_width: u32,
    /// Tile height used for the render.
    pub tile_height: u32,
    /// Grid columns.
    pub columns: u32,
    /// Grid rows.
    pub rows: u32,
    /// Output surface width.
    pub output_width: u32,
    /// Output surface height.
    pub output_height: u32,
    /// Presentation mode used (`immediate` or `progressive`).
    pub presentation: String,
    /// Hex SHA-256 digest of the presented surface pixels.
    pub surface_digest: String,
}

impl RenderReport {
    /// Serializes the report to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes a report from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// Error type for core model validation and codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Pixel buffer shape does not match declared geometry.
    #[error("invalid image shape: expected {expected} bytes, got {actual}")]
    InvalidImageShape {
        /// Expected RGBA byte count.
        expected: usize,
        /// Actual RGBA byte count.
        actual: usize,
    },
    /// Image dimensions overflow addressable buffer space.
    #[error("image dimension overflow")]
    DimensionOverflow,
    /// JSON encoding/decoding error.
    #[error("report codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Tile specification rejection reasons, with user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Either tile dimension is zero.
    #[error("tiles must be positive size")]
    NonPositiveTileSize,
    /// A tile dimension exceeds the matching image dimension.
    #[error("tile larger than image")]
    TileExceedsImageBounds,
}

fn required_rgba_len(width: u32, height: u32) -> Result<usize, CoreError> {
    let pixels = (width as usize)
        .checked_mul(height as usize)
        .ok_or(CoreError::DimensionOverflow)?;

    pixels.checked_mul(4).ok_or(CoreError::DimensionOverflow)
}
