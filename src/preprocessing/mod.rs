//! Image preprocessing module for OCR enhancement
//!
//! A fixed linear pipeline (normalize, optional invert, optional binarize)
//! driven by per-request options.

pub mod pipeline;
pub mod steps;

pub use pipeline::{Pipeline, PreprocessOptions, StepTiming};
