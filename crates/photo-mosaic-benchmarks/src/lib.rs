#![warn(missing_docs)]
//! # photo-mosaic-benchmarks
//!
//! Holds no runtime code: the `tests/` directory runs bounded-latency smoke
//! benchmarks over the render pipeline.
