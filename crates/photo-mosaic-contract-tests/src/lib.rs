#![warn(missing_docs)]
//! # photo-mosaic-contract-tests
//!
//! Holds no runtime code: the `tests/` directory validates frozen JSON
//! contracts (render report, render preset) against their fixtures.
