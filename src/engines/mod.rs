//! OCR engine implementations

pub mod tesseract;
