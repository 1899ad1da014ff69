//! Individual preprocessing steps

pub mod binarize;
pub mod invert;
pub mod normalize;
