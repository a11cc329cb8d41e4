//! PDF OCR Server Library
//!
//! Extracts text from uploaded PDFs by driving the Azure Computer Vision
//! Read API. The server binary in main.rs only wires these modules up.
//!
//! # Modules
//!
//! - `ocr`: Page-range selection, submit/poll cycle and result assembly
//! - `pdf`: Page counting via MuPDF
//! - `routes`: HTTP endpoints

pub mod config;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod routes;
pub mod state;
