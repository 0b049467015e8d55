//! # Meme Caption
//!
//! Deterministic meme compositing: take any image, scale it to a fixed width,
//! and draw the classic white, black-outlined, all-caps caption at the top
//! and bottom.
//!
//! # Architecture: Pure Stages Around One Backend Call
//!
//! ```text
//! 1. Acquire   URL / bytes  →  SourceImage     (fetch + identify)
//! 2. Plan      SourceImage  →  CaptionPlan     (canvas size, font size, wrapped lines, baselines)
//! 3. Render    CaptionPlan  →  SVG overlays    (one document per caption block)
//! 4. Compose   overlays     →  JPEG            (resize, rasterize, composite, encode)
//! ```
//!
//! Stages 2 and 3 are pure functions: layout can be checked in a unit test
//! without decoding or encoding a single pixel. Stage 4 sits behind the
//! [`imaging::CaptionBackend`] trait so the orchestration is tested against
//! a recording mock.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`compose`] | Entry point: validated requests, [`compose::Composer`], error taxonomy |
//! | [`fetch`] | Source acquisition over HTTP with timeout and size cap |
//! | [`imaging`] | Layout math, word wrap, SVG text layers, `resvg` + `image` backend |
//! | [`templates`] | Popular template directory (Imgflip `get_memes` shape) |
//! | [`batch`] | JSON job files composed in parallel into content-addressed outputs |
//! | [`config`] | `meme-caption.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Determinism
//!
//! The same source bytes, captions, width and quality produce byte-identical
//! JPEGs. Nothing in the pipeline reads the clock, a random source or shared
//! mutable state; the font database is built once per backend and only read
//! afterwards.
//!
//! ## Character-Count Wrapping
//!
//! Lines are wrapped by counting characters against a budget derived from the
//! font size (`width / (font_size * 0.6)`), not by measuring glyphs. This keeps
//! layout a pure function of the text and the canvas width, independent of
//! which fonts happen to be installed. Words are never split; a word longer
//! than the budget gets a line of its own.
//!
//! ## SVG Text Layers
//!
//! Captions are rendered as SVG `<text>` with `paint-order="stroke fill"`, so
//! the outline sits under the fill instead of eating into the letters. `resvg`
//! rasterizes each layer at canvas size and the layers are alpha-composited
//! over the resized source. Caption text is escaped before it enters markup.
//!
//! ## Typed Failures, No Fallback Image
//!
//! A composition either returns a JPEG or a [`compose::ComposeError`]
//! (`FetchFailed`, `DecodeFailed`, `EncodeFailed`, `InvalidRequest`).
//! Whether to show a placeholder is the caller's decision.

pub mod batch;
pub mod compose;
pub mod config;
pub mod fetch;
pub mod imaging;
pub mod output;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;
