//! Home-page banner linking every chapter changed in the preview.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use labdoc_shared::markup::{HOME_BANNER_CLASS, escape_html};
use labdoc_shared::{CHANGED_CHAPTERS_FILE, ChangedChapters, LabdocError, Result};

/// What [`add_home_banner`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeBannerOutcome {
    /// Banner inserted, linking this many chapters.
    Added(usize),
    /// The site has no `index.html`.
    NoIndex,
    /// No `changed-chapters.json` next to the index.
    NoManifest,
    /// The manifest lists no chapters.
    NoChanges,
    /// `index.html` has no `<main>` element to anchor the banner.
    NoMainElement,
}

/// Insert the changed-chapters banner into `html_dir/index.html`.
#[instrument(skip_all, fields(html_dir = %html_dir.display()))]
pub fn add_home_banner(html_dir: &Path) -> Result<HomeBannerOutcome> {
    let index_path = html_dir.join("index.html");
    if !index_path.is_file() {
        info!("index.html does not exist");
        return Ok(HomeBannerOutcome::NoIndex);
    }

    let manifest_path = html_dir.join(CHANGED_CHAPTERS_FILE);
    if !manifest_path.is_file() {
        info!("no changed chapters file found");
        return Ok(HomeBannerOutcome::NoManifest);
    }

    let manifest = std::fs::read_to_string(&manifest_path)
        .map_err(|e| LabdocError::io(&manifest_path, e))?;
    let manifest: ChangedChapters = serde_json::from_str(&manifest)?;
    if manifest.changed_chapters.is_empty() {
        info!("no changed chapters to display on home page");
        return Ok(HomeBannerOutcome::NoChanges);
    }

    let links: Vec<(String, String)> = manifest
        .changed_chapters
        .iter()
        .map(|id| (id.clone(), chapter_title_for(html_dir, id)))
        .collect();

    let index = std::fs::read_to_string(&index_path).map_err(|e| LabdocError::io(&index_path, e))?;
    let Some(updated) = insert_after_main(&index, &home_banner_html(&links)) else {
        warn!("could not find insertion point for home page banner");
        return Ok(HomeBannerOutcome::NoMainElement);
    };

    std::fs::write(&index_path, updated).map_err(|e| LabdocError::io(&index_path, e))?;
    info!(chapters = links.len(), "added home page banner");
    Ok(HomeBannerOutcome::Added(links.len()))
}

/// Display title of chapter `id`, falling back to the id itself.
fn chapter_title_for(html_dir: &Path, id: &str) -> String {
    let page = html_dir.join(format!("{id}.html"));
    std::fs::read_to_string(&page)
        .ok()
        .and_then(|html| chapter_title(&html))
        .unwrap_or_else(|| {
            debug!(id, "no chapter heading found, using id as title");
            id.to_string()
        })
}

/// `"<number>. <title>"` from the first `h1` carrying a chapter number.
pub fn chapter_title(html: &str) -> Option<String> {
    let h1_sel = Selector::parse("h1").expect("valid selector");
    let number_sel = Selector::parse("span.chapter-number").expect("valid selector");
    let title_sel = Selector::parse("span.chapter-title").expect("valid selector");

    let doc = Html::parse_document(html);
    doc.select(&h1_sel).find_map(|h1| {
        let number = collapse_text(h1.select(&number_sel).next()?);
        let title = match h1.select(&title_sel).next() {
            Some(span) => collapse_text(span),
            None => {
                let full = collapse_text(h1);
                full.strip_prefix(number.as_str())
                    .unwrap_or(&full)
                    .trim()
                    .to_string()
            }
        };
        (!number.is_empty() && !title.is_empty()).then(|| format!("{number}. {title}"))
    })
}

fn collapse_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Banner markup linking each `(chapter id, title)` pair.
pub fn home_banner_html(chapters: &[(String, String)]) -> String {
    let links = chapters
        .iter()
        .map(|(id, title)| {
            format!(
                r#"<a href="{}.html">{}</a>"#,
                escape_html(id),
                escape_html(title)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"
<div class="{HOME_BANNER_CLASS}">
    <p style="margin: 0;">
        <strong>📋 Changes in this PR:</strong> The following chapters have been modified: {links}
    </p>
</div>
"#
    )
}

/// Insert `snippet` right after the opening `<main>` tag; `None` without one.
pub fn insert_after_main(html: &str, snippet: &str) -> Option<String> {
    static MAIN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<main[^>]*>").expect("valid regex"));

    let at = MAIN_RE.find(html)?.end();
    Some(format!("{}{snippet}{}", &html[..at], &html[at..]))
}
