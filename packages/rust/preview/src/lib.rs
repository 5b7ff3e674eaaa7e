//! Post-processing for pull-request previews of the rendered manual.
//!
//! Runs around the render step:
//! - before rendering, [`frontmatter`] flags changed sources so the preview
//!   banner filter can see them;
//! - after rendering, [`home`] lists changed chapters on the home page,
//!   [`highlight`] annotates pages that differ from the published site, and
//!   [`expand`] turns banner placeholders into markup.

pub mod expand;
pub mod frontmatter;
pub mod highlight;
pub mod home;

use std::path::{Path, PathBuf};

use labdoc_shared::ChangeSet;

pub use expand::{PlaceholderExpander, expand_banners, html_pages};
pub use frontmatter::{MarkReport, mark_changed, mark_changed_files};
pub use highlight::{
    HighlightReport, checkout_published_html, compare_pages, highlight_changed_pages,
    inject_change_notice,
};
pub use home::{HomeBannerOutcome, add_home_banner, chapter_title};

/// Rendered page (relative to the HTML directory) for each changed source.
pub fn rendered_pages(set: &ChangeSet) -> Vec<PathBuf> {
    set.files
        .iter()
        .map(|source| Path::new(source).with_extension("html"))
        .collect()
}
