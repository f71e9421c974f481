#![warn(missing_docs)]
//! # photo-mosaic-decode
//!
//! ## Purpose
//! Turns uploaded byte buffers into decoded [`SourceImage`] values.
//!
//! ## Responsibilities
//! - Define a backend-agnostic decode trait.
//! - Expose the native decoder backed by the `image` crate.
//! - Expose deterministic synthetic decoding for CI and unit tests.
//! - Run decodes on a worker thread with generation-based supersession.
//!
//! ## Data flow
//! Upload event -> [`DecodeController::begin_decode`] -> worker decodes via
//! [`DecodeBackend`] -> latest-generation [`DecodeOutcome`] consumed by the
//! session; stale completions are discarded.
//!
//! ## Ownership and lifetimes
//! The worker takes ownership of each upload buffer and drops it after the
//! decode resolves, on success and failure alike, so no temporary upload
//! resource outlives its decode attempt.
//!
//! ## Error model
//! Unreadable inputs and worker teardown are reported as [`DecodeError`].
//!
//! ## Security and privacy notes
//! Upload bytes and decoded pixels stay in process memory; this crate
//! persists and logs nothing.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;

use photo_mosaic_core::{CoreError, SourceImage};
use thiserror::Error;

/// Trait implemented by concrete decode providers.
pub trait DecodeBackend: Send + Sync {
    /// Decodes one uploaded byte buffer.
    ///
    /// # Errors
    /// Returns [`DecodeError::UnreadableImage`] when the bytes are not a
    /// decodable image.
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, DecodeError>;
}

/// Native decoder delegating format support to the `image` crate.
///
/// Any format enabled in the crate build (png, jpeg, gif, bmp, webp) is
/// accepted; everything else fails the upload attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDecodeBackend;

impl DecodeBackend for NativeDecodeBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, DecodeError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|error| DecodeError::UnreadableImage(error.to_string()))?;

        let rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(SourceImage::new(width, height, rgba.into_raw())?)
    }
}

/// Deterministic synthetic decoder for test and CI usage.
///
/// Produces a gradient image of configured dimensions seeded by the first
/// input byte, so distinct uploads decode to distinct pixels. Empty input
/// and the literal marker `unreadable` fail like a corrupt file would.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticDecodeBackend {
    width: u32,
    height: u32,
}

impl SyntheticDecodeBackend {
    /// Creates a synthetic backend producing `width x height` images.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for SyntheticDecodeBackend {
    fn default() -> Self {
        Self::new(64, 64)
    }
}

impl DecodeBackend for SyntheticDecodeBackend {
    fn decode(&self, bytes: &[u8]) -> Result<SourceImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::UnreadableImage(
                "upload buffer is empty".to_string(),
            ));
        }
        if bytes.starts_with(b"unreadable") {
            return Err(DecodeError::UnreadableImage(
                "synthetic backend was asked to fail".to_string(),
            ));
        }

        let seed = bytes[0];
        let mut rgba =
            Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            for x in 0..self.width {
                rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, seed, 255]);
            }
        }

        Ok(SourceImage::new(self.width, self.height, rgba)?)
    }
}

enum DecodeCommand {
    Decode { generation: u64, bytes: Vec<u8> },
    Shutdown,
}

enum DecodeEvent {
    Decoded {
        generation: u64,
        image: SourceImage,
    },
    Failed {
        generation: u64,
        error: DecodeError,
    },
}

impl DecodeEvent {
    fn generation(&self) -> u64 {
        match self {
            DecodeEvent::Decoded { generation, .. } => *generation,
            DecodeEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// Resolution of the latest in-flight decode.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// Upload decoded successfully.
    Decoded(SourceImage),
    /// Upload failed to decode.
    Failed(DecodeError),
}

/// Worker-thread decode runtime with latest-generation semantics.
///
/// Each [`DecodeController::begin_decode`] bumps the live generation; the
/// eventual completion of a superseded upload is discarded instead of
/// racing the newer one.
pub struct DecodeController {
    command_tx: Sender<DecodeCommand>,
    event_rx: Receiver<DecodeEvent>,
    worker_join: JoinHandle<()>,
    generation: u64,
}

impl DecodeController {
    /// Spawns the decode worker over the given backend.
    pub fn spawn(backend: Arc<dyn DecodeBackend>) -> Self {
        let (command_tx, command_rx) = mpsc::channel::<DecodeCommand>();
        let (event_tx, event_rx) = mpsc::channel::<DecodeEvent>();

        let worker_join = std::thread::spawn(move || {
            while let Ok(command) = command_rx.recv() {
                match command {
                    DecodeCommand::Decode { generation, bytes } => {
                        let event = match backend.decode(&bytes) {
                            Ok(image) => DecodeEvent::Decoded { generation, image },
                            Err(error) => DecodeEvent::Failed { generation, error },
                        };
                        drop(bytes);

                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    DecodeCommand::Shutdown => break,
                }
            }
        });

        Self {
            command_tx,
            event_rx,
            worker_join,
            generation: 0,
        }
    }

    /// Submits one upload buffer and returns its generation.
    ///
    /// # Side effects
    /// Any previously submitted decode that has not resolved yet becomes
    /// stale; its completion will be ignored.
    pub fn begin_decode(&mut self, bytes: Vec<u8>) -> u64 {
        self.generation += 1;
        let _ = self.command_tx.send(DecodeCommand::Decode {
            generation: self.generation,
            bytes,
        });
        self.generation
    }

    /// Returns the live generation counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Polls for the latest-generation outcome without blocking.
    ///
    /// Stale completions are drained and dropped.
    pub fn poll(&mut self) -> Option<DecodeOutcome> {
        loop {
            match self.event_rx.try_recv() {
                Ok(event) if event.generation() == self.generation => {
                    return Some(outcome_from(event));
                }
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    return Some(DecodeOutcome::Failed(DecodeError::WorkerStopped));
                }
            }
        }
    }

    /// Blocks until the latest-generation outcome arrives.
    ///
    /// Stale completions are drained and dropped along the way.
    pub fn wait_outcome(&mut self) -> DecodeOutcome {
        loop {
            match self.event_rx.recv() {
                Ok(event) if event.generation() == self.generation => {
                    return outcome_from(event);
                }
                Ok(_) => continue,
                Err(_) => return DecodeOutcome::Failed(DecodeError::WorkerStopped),
            }
        }
    }

    /// Stops the worker and joins its thread.
    pub fn shutdown(self) {
        let _ = self.command_tx.send(DecodeCommand::Shutdown);
        let _ = self.worker_join.join();
    }
}

fn outcome_from(event: DecodeEvent) -> DecodeOutcome {
    match event {
        DecodeEvent::Decoded { image, .. } => DecodeOutcome::Decoded(image),
        DecodeEvent::Failed { error, .. } => DecodeOutcome::Failed(error),
    }
}

/// Decode layer error type.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input bytes are not a decodable image.
    #[error("file is not a readable image: {0}")]
    UnreadableImage(String),
    /// Decoded pixels violated the core image shape invariant.
    #[error("decoded image is malformed: {0}")]
    Malformed(#[from] CoreError),
    /// Decode worker terminated before resolving the upload.
    #[error("decode worker stopped unexpectedly")]
    WorkerStopped,
}

#[cfg(test)]
mod tests {
    //! Unit tests for decode backends.

    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    use super::*;

    #[test]
    fn synthetic_backend_is_deterministic_per_seed() {
        let backend = SyntheticDecodeBackend::new(4, 4);
        let first = backend.decode(b"a").expect("decode should work");
        let second = backend.decode(b"a").expect("decode should work");
        let other = backend.decode(b"b").expect("decode should work");

        assert_eq!(first, second);
        assert_ne!(first.rgba, other.rgba);
        assert_eq!(first.width, 4);
        assert_eq!(first.height, 4);
    }

    #[test]
    fn synthetic_backend_fails_on_marked_input() {
        let backend = SyntheticDecodeBackend::new(4, 4);
        assert!(matches!(
            backend.decode(b"unreadable"),
            Err(DecodeError::UnreadableImage(_))
        ));
        assert!(matches!(
            backend.decode(b""),
            Err(DecodeError::UnreadableImage(_))
        ));
    }

    #[test]
    fn native_backend_decodes_png_bytes() {
        let pixels: Vec<u8> = vec![
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 255, 255, //
            255, 255, 255, 255,
        ];
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&pixels, 2, 2, ExtendedColorType::Rgba8)
            .expect("png fixture should encode");

        let image = NativeDecodeBackend
            .decode(&png)
            .expect("png should decode");
        assert_eq!(image.width, 2);
        assert_eq!(image.height, 2);
        assert_eq!(image.pixel(0, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn native_backend_rejects_garbage() {
        assert!(matches!(
            NativeDecodeBackend.decode(b"definitely not an image"),
            Err(DecodeError::UnreadableImage(_))
        ));
    }
}
