//! Caption composition: the one operation the rest of a service calls.
//!
//! ```text
//! CaptionRequest (untrusted, serde)
//!     └─ validate ──► CompositionRequest
//! CaptionSource::Url ──► Fetcher ──┐
//! CaptionSource::Bytes ────────────┴─► SourceImage ─► CaptionPlan ─► backend ─► CompositionResult
//! ```
//!
//! Every call is independent: no cache, no shared mutable state, no retry.
//! Failures are terminal and typed ([`ComposeError`]); substituting a
//! placeholder image is left to the caller.

use crate::config::{CaptionConfig, MAX_TARGET_WIDTH, OutputConfig};
use crate::fetch::{FetchError, Fetcher};
use crate::imaging::{
    BackendError, CaptionBackend, CaptionStyle, CompositionResult, DEFAULT_TARGET_WIDTH, Quality,
    RustBackend, SourceImage, create_captioned_image, split_single_caption,
};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    #[error("encode failed: {0}")]
    EncodeFailed(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The composer itself could not be built (e.g. a bad user agent).
    #[error("setup failed: {0}")]
    Setup(#[source] FetchError),
}

impl From<BackendError> for ComposeError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => ComposeError::DecodeFailed(msg),
            BackendError::Encode(msg) => ComposeError::EncodeFailed(msg),
        }
    }
}

/// Where the source image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionSource {
    Url(String),
    Bytes(Vec<u8>),
}

impl CaptionSource {
    /// Read a local file into a [`CaptionSource::Bytes`].
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        std::fs::read(path).map(CaptionSource::Bytes)
    }
}

/// Caption request as it arrives from the outside (JSON body, batch file).
///
/// Nothing here is trusted; turn it into a [`CompositionRequest`] with
/// [`CompositionRequest::resolve`] before composing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionRequest {
    pub top_text: Option<String>,
    pub bottom_text: Option<String>,
    /// Single combined caption, used only when both top and bottom are empty.
    pub text: Option<String>,
    pub width: Option<u32>,
    pub quality: Option<u32>,
}

/// A validated composition request.
///
/// Invariants: `0 < target_width <= MAX_TARGET_WIDTH`, quality in `1..=100`.
/// Either caption may be empty; both empty means "resize and re-encode".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionRequest {
    top_text: String,
    bottom_text: String,
    target_width: u32,
    quality: Quality,
}

impl CompositionRequest {
    /// Validate an explicit request.
    pub fn new(
        top_text: impl Into<String>,
        bottom_text: impl Into<String>,
        target_width: u32,
        quality: u32,
    ) -> Result<Self, ComposeError> {
        if target_width == 0 || target_width > MAX_TARGET_WIDTH {
            return Err(ComposeError::InvalidRequest(format!(
                "width must be 1-{MAX_TARGET_WIDTH}, got {target_width}"
            )));
        }
        if !(1..=100).contains(&quality) {
            return Err(ComposeError::InvalidRequest(format!(
                "quality must be 1-100, got {quality}"
            )));
        }

        Ok(Self {
            top_text: top_text.into(),
            bottom_text: bottom_text.into(),
            target_width,
            quality: Quality::new(quality),
        })
    }

    /// Request with default width and quality.
    pub fn captions(top_text: impl Into<String>, bottom_text: impl Into<String>) -> Self {
        Self {
            top_text: top_text.into(),
            bottom_text: bottom_text.into(),
            target_width: DEFAULT_TARGET_WIDTH,
            quality: Quality::default(),
        }
    }

    /// Validate an outside request, filling gaps from `defaults`.
    ///
    /// When both captions are absent or empty and `text` is non-empty, `text`
    /// is split at its character midpoint into top and bottom. A caption of
    /// only whitespace counts as given and suppresses the split.
    pub fn resolve(raw: CaptionRequest, defaults: &OutputConfig) -> Result<Self, ComposeError> {
        let mut top = raw.top_text.unwrap_or_default();
        let mut bottom = raw.bottom_text.unwrap_or_default();

        if top.is_empty() && bottom.is_empty() {
            if let Some(text) = raw.text.filter(|t| !t.is_empty()) {
                (top, bottom) = split_single_caption(&text);
            }
        }

        Self::new(
            top,
            bottom,
            raw.width.unwrap_or(defaults.width),
            raw.quality.unwrap_or(defaults.quality),
        )
    }

    pub fn top_text(&self) -> &str {
        &self.top_text
    }

    pub fn bottom_text(&self) -> &str {
        &self.bottom_text
    }

    pub fn target_width(&self) -> u32 {
        self.target_width
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }
}

impl TryFrom<CaptionRequest> for CompositionRequest {
    type Error = ComposeError;

    fn try_from(raw: CaptionRequest) -> Result<Self, Self::Error> {
        Self::resolve(raw, &OutputConfig::default())
    }
}

/// Fetches sources and composes captions with one backend and style.
///
/// `Composer` is `Sync` when its backend is, so a single instance can serve
/// concurrent requests.
pub struct Composer<B: CaptionBackend = RustBackend> {
    backend: B,
    fetcher: Fetcher,
    style: CaptionStyle,
}

impl Composer<RustBackend> {
    /// Production composer: system fonts plus `[fonts] dirs`, HTTP settings
    /// from `[fetch]`, look from `[style]`.
    pub fn from_config(config: &CaptionConfig) -> Result<Self, ComposeError> {
        let fetcher = Fetcher::new(&config.fetch).map_err(ComposeError::Setup)?;
        Ok(Self::with_backend(
            RustBackend::with_font_dirs(&config.fonts.dirs),
            fetcher,
            config.style.clone(),
        ))
    }
}

impl<B: CaptionBackend> Composer<B> {
    pub fn with_backend(backend: B, fetcher: Fetcher, style: CaptionStyle) -> Self {
        Self {
            backend,
            fetcher,
            style,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Compose `request` onto `source`.
    pub fn compose(
        &self,
        source: CaptionSource,
        request: &CompositionRequest,
    ) -> Result<CompositionResult, ComposeError> {
        let bytes = match source {
            CaptionSource::Url(url) => self.fetcher.fetch(&url)?,
            CaptionSource::Bytes(bytes) => bytes,
        };

        let source = SourceImage::identify(&self.backend, bytes)?;
        tracing::debug!(
            width = source.width,
            height = source.height,
            format = source.format.as_deref().unwrap_or("unknown"),
            "decoded source"
        );

        let result = create_captioned_image(
            &self.backend,
            &source,
            &request.top_text,
            &request.bottom_text,
            request.target_width,
            request.quality,
            &self.style,
        )?;

        tracing::info!(
            width = result.width,
            height = result.height,
            bytes = result.bytes.len(),
            "composed caption"
        );
        Ok(result)
    }
}

/// Compose with stock configuration.
///
/// Builds a fresh [`Composer`] (and font database) per call; services should
/// keep a [`Composer`] around instead.
pub fn compose_caption(
    source: CaptionSource,
    request: &CompositionRequest,
) -> Result<CompositionResult, ComposeError> {
    Composer::from_config(&CaptionConfig::default())?.compose(source, request)
}
