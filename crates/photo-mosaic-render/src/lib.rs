#![warn(missing_docs)]
//! # photo-mosaic-render
//!
//! ## Purpose
//! Renders tile mosaics from decoded source images.
//!
//! ## Responsibilities
//! - Rasterize the repeating tile stencil (ellipse or rectangle).
//! - Stamp the stencil across the derived grid on an off-screen surface.
//! - Tint stamped tiles from an area-averaged downscale of the source image.
//! - Seal finished surfaces with a deterministic pixel digest.
//!
//! ## Data flow
//! [`SourceImage`] + [`TileSpec`] -> [`render_mosaic`] -> [`PresentedMosaic`]
//! consumed by presentation.
//!
//! ## Ownership and lifetimes
//! Each render owns its [`MosaicSurface`] exclusively; a new render produces
//! a new surface and never mutates a previously sealed mosaic.
//!
//! ## Error model
//! Invalid tile specs are rejected before any drawing; surfaces whose byte
//! size overflows host limits fail with [`RenderError::SurfaceOverflow`].

use image::{RgbaImage, imageops, imageops::FilterType};
use photo_mosaic_core::{GridGeometry, SourceImage, TileSpec, ValidationError, validate_tile_spec};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Subsamples per pixel axis used for stencil coverage.
const SUPERSAMPLE: u32 = 4;

/// Repeating tile shape stamped across the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileShape {
    /// Ellipse inscribed in the tile box.
    #[default]
    Ellipse,
    /// Full tile box, no gaps between tiles.
    Rect,
}

/// Rule used to transfer per-tile color onto the stamped surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeRule {
    /// Keep destination coverage, replace destination color. Tiles take the
    /// per-tile average color; gaps between stencils stay transparent.
    #[default]
    SourceIn,
    /// Copy the enlarged color buffer verbatim, ignoring stencil coverage.
    Replace,
}

/// Render configuration. Shape and compositing rule are configuration, not
/// separate renderer variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Tile shape to stamp.
    #[serde(default)]
    pub shape: TileShape,
    /// Color transfer rule.
    #[serde(default)]
    pub composite: CompositeRule,
}

/// Pre-rasterized single-tile stamp, stored as per-pixel alpha coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileStencil {
    width: u32,
    height: u32,
    coverage: Vec<u8>,
}

impl TileStencil {
    /// Rasterizes the stencil for one tile box.
    ///
    /// Pure function of `(spec, shape)`: identical inputs produce
    /// bit-identical coverage. Ellipse coverage comes from deterministic
    /// 4x4 supersampling of the inscribed-ellipse equation.
    pub fn build(spec: TileSpec, shape: TileShape) -> Self {
        let width = spec.tile_width;
        let height = spec.tile_height;
        let len = width as usize * height as usize;

        let coverage = match shape {
            TileShape::Rect => vec![255; len],
            TileShape::Ellipse => {
                let mut coverage = vec![0; len];
                let radius_x = width as f64 / 2.0;
                let radius_y = height as f64 / 2.0;
                let samples = SUPERSAMPLE * SUPERSAMPLE;

                for y in 0..height {
                    for x in 0..width {
                        let mut inside = 0_u32;
                        for sub_y in 0..SUPERSAMPLE {
                            for sub_x in 0..SUPERSAMPLE {
                                let sample_x =
                                    x as f64 + (sub_x as f64 + 0.5) / SUPERSAMPLE as f64;
                                let sample_y =
                                    y as f64 + (sub_y as f64 + 0.5) / SUPERSAMPLE as f64;
                                let norm_x = (sample_x - radius_x) / radius_x;
                                let norm_y = (sample_y - radius_y) / radius_y;
                                if norm_x * norm_x + norm_y * norm_y <= 1.0 {
                                    inside += 1;
                                }
                            }
                        }

                        coverage[y as usize * width as usize + x as usize] =
                            (inside * 255 / samples) as u8;
                    }
                }

                coverage
            }
        };

        Self {
            width,
            height,
            coverage,
        }
    }

    /// Stencil width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Stencil height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Alpha coverage at one stencil pixel.
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.coverage[y as usize * self.width as usize + x as usize]
    }
}

/// Off-screen RGBA drawing surface owned by one render operation.
#[derive(Debug, Clone)]
pub struct MosaicSurface {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl MosaicSurface {
    /// Allocates a transparent surface.
    ///
    /// # Errors
    /// Returns [`RenderError::SurfaceOverflow`] when the byte size of the
    /// surface overflows addressable memory.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or(RenderError::SurfaceOverflow)?;

        Ok(Self {
            width,
            height,
            rgba: vec![0; len],
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Stamps the stencil at every grid cell in row-major order.
    ///
    /// Cells do not overlap, so stamping order cannot affect the result.
    /// The stamp is a flat opaque-black fill scaled by stencil coverage,
    /// matching an unstyled vector tile.
    pub fn stamp_grid(&mut self, stencil: &TileStencil, grid: &GridGeometry) {
        for row in 0..grid.rows {
            for col in 0..grid.columns {
                let origin_x = col * stencil.width();
                let origin_y = row * stencil.height();

                for y in 0..stencil.height() {
                    for x in 0..stencil.width() {
                        let alpha = stencil.coverage_at(x, y);
                        if alpha == 0 {
                            continue;
                        }

                        let dest_x = (origin_x + x) as usize;
                        let dest_y = (origin_y + y) as usize;
                        let offset = (dest_y * self.width as usize + dest_x) * 4;
                        self.rgba[offset..offset + 4].copy_from_slice(&[0, 0, 0, alpha]);
                    }
                }
            }
        }
    }

    /// Composites the enlarged per-tile color buffer onto the surface.
    pub fn composite(&mut self, tint: &RgbaImage, rule: CompositeRule) {
        for (index, tint_pixel) in tint.pixels().enumerate() {
            let offset = index * 4;
            let pixel = &mut self.rgba[offset..offset + 4];

            match rule {
                CompositeRule::SourceIn => {
                    // Destination alpha gates the result; source color wins
                    // wherever any coverage exists.
                    let alpha = (tint_pixel[3] as u16 * pixel[3] as u16 / 255) as u8;
                    if alpha == 0 {
                        pixel.copy_from_slice(&[0, 0, 0, 0]);
                    } else {
                        pixel.copy_from_slice(&[tint_pixel[0], tint_pixel[1], tint_pixel[2], alpha]);
                    }
                }
                CompositeRule::Replace => {
                    pixel.copy_from_slice(&[
                        tint_pixel[0],
                        tint_pixel[1],
                        tint_pixel[2],
                        tint_pixel[3],
                    ]);
                }
            }
        }
    }

    /// Seals the surface into an immutable presented mosaic.
    pub fn seal(self) -> PresentedMosaic {
        let digest = surface_digest(&self.rgba);
        PresentedMosaic {
            width: self.width,
            height: self.height,
            rgba: self.rgba,
            digest,
        }
    }

    /// Raw RGBA bytes of the surface.
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Completed mosaic ready for presentation. Immutable once sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedMosaic {
    /// Mosaic width in pixels.
    pub width: u32,
    /// Mosaic height in pixels.
    pub height: u32,
    /// RGBA bytes in row-major order.
    pub rgba: Vec<u8>,
    /// Hex SHA-256 digest of the RGBA bytes.
    pub digest: String,
}

impl PresentedMosaic {
    /// Returns the byte slice covering `height` rows starting at row `y`,
    /// or `None` when the range falls outside the mosaic.
    pub fn rows(&self, y: u32, height: u32) -> Option<&[u8]> {
        let end = y.checked_add(height)?;
        if end > self.height {
            return None;
        }

        let row_len = self.width as usize * 4;
        let start = y as usize * row_len;
        let stop = end as usize * row_len;
        Some(&self.rgba[start..stop])
    }
}

/// Renders one mosaic from a source image and tile specification.
///
/// Validation runs before any allocation or drawing; an invalid spec
/// produces no surface.
///
/// # Errors
/// Returns [`RenderError::Validation`] when the spec does not fit the image.
/// Returns [`RenderError::SurfaceOverflow`] when the output surface cannot
/// be allocated on this host.
pub fn render_mosaic(
    image: &SourceImage,
    spec: TileSpec,
    options: &RenderOptions,
) -> Result<PresentedMosaic, RenderError> {
    validate_tile_spec(image, spec)?;
    let grid = GridGeometry::derive(image, spec)?;

    let stencil = TileStencil::build(spec, options.shape);
    let mut surface = MosaicSurface::new(grid.output_width, grid.output_height)?;
    surface.stamp_grid(&stencil, &grid);

    let tint = tile_color_layer(image, &grid)?;
    surface.composite(&tint, options.composite);

    Ok(surface.seal())
}

/// Builds the enlarged per-tile color layer.
///
/// The full source image is area-averaged down to one pixel per tile, then
/// scaled back to output size with nearest-neighbor sampling (image
/// smoothing disabled), so each tile box carries one flat color.
fn tile_color_layer(image: &SourceImage, grid: &GridGeometry) -> Result<RgbaImage, RenderError> {
    let source = RgbaImage::from_raw(image.width, image.height, image.rgba.clone())
        .ok_or(RenderError::SourceBufferMismatch)?;

    let small = imageops::thumbnail(&source, grid.columns, grid.rows);
    Ok(imageops::resize(
        &small,
        grid.output_width,
        grid.output_height,
        FilterType::Nearest,
    ))
}

/// Computes the hex SHA-256 digest of a pixel buffer.
///
/// Used to assert render determinism and to detect superseded output.
pub fn surface_digest(rgba: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(rgba);
    hex::encode(hasher.finalize())
}

/// Error type for mosaic rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tile spec rejected before drawing.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// Output surface byte size overflows host limits.
    #[error("mosaic surface dimensions overflow host limits")]
    SurfaceOverflow,
    /// Source pixel buffer does not match its declared geometry.
    #[error("source pixel buffer does not match its declared geometry")]
    SourceBufferMismatch,
}

#[cfg(test)]
mod tests {
    //! Unit tests for stencil rasterization and surface passes.

    use super::*;

    fn uniform_image(width: u32, height: u32, color: [u8; 4]) -> SourceImage {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            rgba.extend_from_slice(&color);
        }
        SourceImage::new(width, height, rgba).expect("image fixture should be valid")
    }

    #[test]
    fn stencil_build_is_idempotent() {
        let spec = TileSpec::new(16, 12);
        let first = TileStencil::build(spec, TileShape::Ellipse);
        let second = TileStencil::build(spec, TileShape::Ellipse);
        assert_eq!(first, second);
    }

    #[test]
    fn ellipse_stencil_covers_center_and_clears_corners() {
        let stencil = TileStencil::build(TileSpec::new(16, 16), TileShape::Ellipse);
        assert_eq!(stencil.coverage_at(8, 8), 255);
        assert_eq!(stencil.coverage_at(0, 0), 0);
        assert_eq!(stencil.coverage_at(15, 0), 0);
        assert_eq!(stencil.coverage_at(0, 15), 0);
        assert_eq!(stencil.coverage_at(15, 15), 0);
    }

    #[test]
    fn rect_stencil_is_fully_opaque() {
        let stencil = TileStencil::build(TileSpec::new(5, 3), TileShape::Rect);
        for y in 0..3 {
            for x in 0..5 {
                assert_eq!(stencil.coverage_at(x, y), 255);
            }
        }
    }

    #[test]
    fn stamping_places_every_grid_cell() {
        let image = uniform_image(100, 100, [255, 255, 255, 255]);
        let spec = TileSpec::new(16, 16);
        let grid = GridGeometry::derive(&image, spec).expect("grid should derive");
        let stencil = TileStencil::build(spec, TileShape::Ellipse);
        let mut surface = MosaicSurface::new(grid.output_width, grid.output_height)
            .expect("surface should allocate");
        surface.stamp_grid(&stencil, &grid);

        for row in 0..grid.rows {
            for col in 0..grid.columns {
                let center_x = (col * 16 + 8) as usize;
                let center_y = (row * 16 + 8) as usize;
                let center = (center_y * 96 + center_x) * 4 + 3;
                assert_eq!(surface.rgba()[center], 255, "cell ({col},{row}) center");

                let corner = ((row * 16) as usize * 96 + (col * 16) as usize) * 4 + 3;
                assert_eq!(surface.rgba()[corner], 0, "cell ({col},{row}) corner");
            }
        }
    }

    #[test]
    fn source_in_tints_tiles_and_keeps_cutouts() {
        let color = [10, 20, 30, 255];
        let image = uniform_image(32, 32, color);
        let mosaic = render_mosaic(&image, TileSpec::new(8, 8), &RenderOptions::default())
            .expect("render should succeed");

        // Tile centers carry the per-tile average color at full coverage.
        let center = (4 * 32 + 4) * 4;
        assert_eq!(&mosaic.rgba[center..center + 4], &color);

        // Gaps between ellipses stay transparent.
        assert_eq!(&mosaic.rgba[0..4], &[0, 0, 0, 0]);
    }

    #[test]
    fn replace_rule_covers_the_whole_surface() {
        let color = [200, 100, 50, 255];
        let image = uniform_image(32, 32, color);
        let options = RenderOptions {
            shape: TileShape::Ellipse,
            composite: CompositeRule::Replace,
        };
        let mosaic =
            render_mosaic(&image, TileSpec::new(8, 8), &options).expect("render should succeed");

        assert_eq!(&mosaic.rgba[0..4], &color);
    }

    #[test]
    fn invalid_spec_renders_nothing() {
        let image = uniform_image(50, 50, [0, 0, 0, 255]);
        let result = render_mosaic(&image, TileSpec::new(60, 60), &RenderOptions::default());
        assert!(matches!(
            result,
            Err(RenderError::Validation(
                ValidationError::TileExceedsImageBounds
            ))
        ));
    }
}
