//! Swap the preview-banner placeholder for the banner markup in rendered pages.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use labdoc_shared::{LabdocError, Result, markup};

/// Swaps one placeholder token for the changed-page banner.
#[derive(Debug, Clone)]
pub struct PlaceholderExpander {
    placeholder: String,
    paragraph: Regex,
    banner: String,
}

impl PlaceholderExpander {
    pub fn new(placeholder: &str) -> Result<Self> {
        if placeholder.trim().is_empty() {
            return Err(LabdocError::validation("banner placeholder must not be empty"));
        }
        let paragraph = Regex::new(&format!(r"<p>\s*{}\s*</p>", regex::escape(placeholder)))
            .map_err(|e| LabdocError::validation(format!("invalid banner placeholder: {e}")))?;
        Ok(Self {
            placeholder: placeholder.to_string(),
            paragraph,
            banner: markup::changed_page_banner(),
        })
    }

    /// Replace the placeholder paragraph (or a bare occurrence) with the banner.
    /// `None` when `html` does not contain the placeholder.
    pub fn expand(&self, html: &str) -> Option<String> {
        if !html.contains(&self.placeholder) {
            return None;
        }
        let replaced = self
            .paragraph
            .replace_all(html, regex::NoExpand(&self.banner));
        Some(replaced.replace(&self.placeholder, &self.banner))
    }
}

/// Every `.html` file under `html_dir`, sorted.
pub fn html_pages(html_dir: &Path) -> Vec<PathBuf> {
    let mut pages: Vec<PathBuf> = WalkDir::new(html_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect();
    pages.sort();
    pages
}

/// Expand the placeholder in `pages`, or in every page of `html_dir` when `None`.
/// Returns the pages rewritten.
#[instrument(skip(html_dir, pages), fields(html_dir = %html_dir.display()))]
pub fn expand_banners(
    html_dir: &Path,
    placeholder: &str,
    pages: Option<&[PathBuf]>,
) -> Result<Vec<PathBuf>> {
    let expander = PlaceholderExpander::new(placeholder)?;
    let candidates = match pages {
        Some(pages) => pages.iter().map(|p| html_dir.join(p)).collect(),
        None => html_pages(html_dir),
    };

    let mut expanded = Vec::new();
    for page in candidates {
        if !page.is_file() {
            debug!(page = %page.display(), "page not found");
            continue;
        }
        let html = std::fs::read_to_string(&page).map_err(|e| LabdocError::io(&page, e))?;
        if let Some(updated) = expander.expand(&html) {
            std::fs::write(&page, updated).map_err(|e| LabdocError::io(&page, e))?;
            expanded.push(page);
        }
    }

    info!(pages = expanded.len(), "expanded preview banners");
    Ok(expanded)
}
