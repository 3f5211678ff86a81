//! Error type for configuring, rendering and saving images.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while setting up a render or persisting its output.
///
/// Geometric degeneracies (parallel rays, grazing hits) are not errors; they
/// are reported as misses by the intersection code.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid camera configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not allocate an image buffer of {pixels} pixels")]
    Allocation { pixels: usize },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),
}

pub type RenderResult<T> = Result<T, RenderError>;
