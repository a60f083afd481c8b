//! Mesh file export
//!
//! Debug/interchange surface only; the extractor itself never touches
//! the filesystem.
//!
//! Author: Moroya Sakamoto

pub mod obj;

pub use obj::export_obj;

use thiserror::Error;

/// File I/O errors
#[derive(Error, Debug)]
pub enum IoError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}
