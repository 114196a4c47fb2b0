//! autoverify - OCR verification of vehicle inspection photos.
//!
//! Inspections whose odometer readings imply implausibly low usage since the
//! previous inspection have their odometer and plate photos read by OCR, and
//! the recognized text is scored against the claimed values.

pub mod config;
pub mod logging;
pub mod matching;
pub mod models;
pub mod ocr;
pub mod repository;
pub mod schema;
pub mod services;
