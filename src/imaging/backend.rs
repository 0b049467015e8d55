//! Image processing backend trait and shared types.
//!
//! The [`CaptionBackend`] trait defines the two operations every backend must
//! support: identify (read dimensions from encoded bytes) and compose
//! (resize, overlay the caption layers, encode).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust, built on
//! `image` and `resvg`.

use super::params::ComposeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    /// The source bytes could not be read as an image.
    #[error("decode failed: {0}")]
    Decode(String),
    /// Rasterizing or encoding the composite failed.
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Decoded facts about a source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub dimensions: Dimensions,
    /// Detected container format, e.g. `"jpeg"`, when known.
    pub format: Option<String>,
}

/// Trait for image processing backends.
///
/// Implementations must be `Sync`: one backend is shared by every concurrent
/// composition, so neither operation may rely on interior mutable state.
pub trait CaptionBackend: Sync {
    /// Read format and natural dimensions from encoded bytes.
    fn identify(&self, bytes: &[u8]) -> Result<SourceInfo, BackendError>;

    /// Resize the source to the target dimensions, draw the overlays in order
    /// and return the encoded JPEG.
    fn compose(&self, params: &ComposeParams<'_>) -> Result<Vec<u8>, BackendError>;
}
