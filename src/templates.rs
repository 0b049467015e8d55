//! Template directory client.
//!
//! Fetches the list of popular meme templates from an Imgflip-compatible
//! `get_memes` endpoint:
//!
//! ```json
//! {"success": true, "data": {"memes": [
//!   {"id": "181913649", "name": "Drake Hotline Bling", "url": "https://i.imgflip.com/30b1gx.jpg",
//!    "width": 1200, "height": 1200, "box_count": 2}
//! ]}}
//! ```
//!
//! Choosing a template is the caller's business; this module only lists them
//! and looks one up by id or name.

use crate::fetch::{FetchError, Fetcher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many templates to list when the caller does not say.
pub const DEFAULT_TEMPLATE_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template directory fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("template directory returned invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no template matches '{0}'")]
    NotFound(String),
}

/// One template record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeTemplate {
    pub id: String,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<DirectoryData>,
}

#[derive(Debug, Deserialize)]
struct DirectoryData {
    #[serde(default)]
    memes: Vec<MemeTemplate>,
}

/// Parse a directory response, keeping at most `limit` templates in the
/// order the directory returned them.
///
/// An unsuccessful or empty response is an empty list, not an error.
pub fn parse_templates(json: &[u8], limit: usize) -> Result<Vec<MemeTemplate>, TemplateError> {
    let response: DirectoryResponse = serde_json::from_slice(json)?;
    if !response.success {
        tracing::warn!("template directory reported success=false");
        return Ok(Vec::new());
    }

    Ok(response
        .data
        .map(|d| d.memes.into_iter().take(limit).collect())
        .unwrap_or_default())
}

/// Find a template by exact id, or by case-insensitive name.
pub fn find_template<'a>(templates: &'a [MemeTemplate], key: &str) -> Option<&'a MemeTemplate> {
    let key = key.trim();
    templates
        .iter()
        .find(|t| t.id == key)
        .or_else(|| templates.iter().find(|t| t.name.eq_ignore_ascii_case(key)))
}

/// Template directory at a fixed endpoint.
pub struct TemplateDirectory<'a> {
    fetcher: &'a Fetcher,
    url: String,
}

impl<'a> TemplateDirectory<'a> {
    pub fn new(fetcher: &'a Fetcher, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    /// The first `limit` templates of the directory.
    pub fn top_templates(&self, limit: usize) -> Result<Vec<MemeTemplate>, TemplateError> {
        let body = self.fetcher.fetch(&self.url)?;
        let templates = parse_templates(&body, limit)?;
        tracing::info!(count = templates.len(), url = %self.url, "loaded template directory");
        Ok(templates)
    }

    /// Resolve `key` (id or name) against the full directory.
    pub fn lookup(&self, key: &str) -> Result<MemeTemplate, TemplateError> {
        let templates = self.top_templates(usize::MAX)?;
        find_template(&templates, key)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(key.to_string()))
    }
}
