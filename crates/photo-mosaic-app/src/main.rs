#![warn(missing_docs)]
//! # photo-mosaic-app binary
//!
//! CLI shell around the upload-to-presentation pipeline: decodes an input
//! image on the worker thread, renders the mosaic into an in-memory display
//! sink, and persists what the sink shows as a PNG.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{debug, info};
use photo_mosaic_app::{
    AppError, RenderPreset, app_version, presentation_label, render_current, user_message,
};
use photo_mosaic_core::{GridGeometry, TileSpec};
use photo_mosaic_decode::{DecodeController, DecodeOutcome, NativeDecodeBackend};
use photo_mosaic_present::{MemoryDisplaySink, PresentationMode};
use photo_mosaic_render::{CompositeRule, RenderOptions, TileShape};
use photo_mosaic_session::SessionState;

#[derive(Parser, Debug)]
#[command(about = "Renders a tiled ellipse mosaic from a raster image", version)]
struct Args {
    /// Input image file (any format enabled in the image crate build)
    input: PathBuf,

    /// Tile width in pixels
    #[arg(long, default_value_t = 16)]
    tile_width: u32,

    /// Tile height in pixels
    #[arg(long, default_value_t = 16)]
    tile_height: u32,

    /// Output PNG path
    #[arg(long, default_value = "mosaic.png")]
    output: PathBuf,

    /// JSON preset with tile spec and render options; overrides the tile
    /// and shape flags when given
    #[arg(long)]
    preset: Option<PathBuf>,

    /// When set, write the JSON render report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Reveal the mosaic one row band per step instead of all at once
    #[arg(long)]
    progressive: bool,

    /// Stamp full square tiles instead of ellipses
    #[arg(long)]
    rect_tiles: bool,

    /// Skip the stencil cut-outs and emit flat pixelation
    #[arg(long)]
    flat: bool,
}

fn main() {
    env_logger::init();

    if let Err(error) = run(Args::parse()) {
        log::error!("mosaic render failed: {error}");
        eprintln!("{}", user_message(&error));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    info!("photo-mosaic {} starting", app_version());

    let (spec, options, requested_mode) = resolve_request(&args)?;
    let bytes = std::fs::read(&args.input)?;
    debug!("read {} upload bytes from {}", bytes.len(), args.input.display());

    let mut session = SessionState::new(app_version());

    // The decode runs on the worker thread; the CLI submits exactly one
    // upload, so the wait resolves the live generation directly.
    let mut controller = DecodeController::spawn(Arc::new(NativeDecodeBackend));
    controller.begin_decode(bytes);
    let outcome = controller.wait_outcome();
    controller.shutdown();

    let image = match outcome {
        DecodeOutcome::Decoded(image) => image,
        DecodeOutcome::Failed(error) => {
            session.decode_failed(error.to_string());
            return Err(error.into());
        }
    };
    info!("decoded {}x{} source image", image.width, image.height);

    let grid = match GridGeometry::derive(&image, spec) {
        Ok(grid) => grid,
        Err(error) => {
            session.begin_validation();
            session.validation_failed(error.to_string());
            return Err(AppError::Validation(error));
        }
    };
    session.accept_image(image);

    let mut sink = MemoryDisplaySink::new(grid.output_width, grid.output_height);
    let report = render_current(&mut session, spec, &options, requested_mode, &mut sink)?;
    info!(
        "presented {} tiles ({}x{} grid) as {}x{} surface via {} presentation",
        grid.tile_count(),
        report.columns,
        report.rows,
        report.output_width,
        report.output_height,
        report.presentation,
    );
    debug!("surface digest {}", report.surface_digest);

    let output = image::RgbaImage::from_raw(
        grid.output_width,
        grid.output_height,
        sink.rgba().to_vec(),
    )
    .ok_or_else(|| AppError::OutputWrite("sink buffer does not match surface".to_string()))?;
    output
        .save(&args.output)
        .map_err(|error| AppError::OutputWrite(error.to_string()))?;
    info!("wrote {}", args.output.display());

    if let Some(report_path) = &args.report {
        std::fs::write(report_path, report.to_json_bytes()?)?;
        info!("wrote {}", report_path.display());
    }

    Ok(())
}

fn resolve_request(args: &Args) -> Result<(TileSpec, RenderOptions, PresentationMode), AppError> {
    if let Some(preset_path) = &args.preset {
        let raw = std::fs::read(preset_path)?;
        let preset = RenderPreset::from_json_bytes(&raw)?;
        debug!(
            "preset {}: {}x{} tiles, {} presentation",
            preset_path.display(),
            preset.tile_width,
            preset.tile_height,
            presentation_label(preset.presentation),
        );
        return Ok((preset.tile_spec(), preset.options(), preset.presentation));
    }

    let spec = TileSpec::new(args.tile_width, args.tile_height);
    let options = RenderOptions {
        shape: if args.rect_tiles {
            TileShape::Rect
        } else {
            TileShape::Ellipse
        },
        composite: if args.flat {
            CompositeRule::Replace
        } else {
            CompositeRule::SourceIn
        },
    };
    let mode = if args.progressive {
        PresentationMode::Progressive
    } else {
        PresentationMode::Immediate
    };

    Ok((spec, options, mode))
}
